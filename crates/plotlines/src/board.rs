//! The board: a laid-out story graph ready for rendering.
//!
//! A [`Board`] owns the [`Graph`] of one run together with the registry of
//! glyph shapes its nodes refer to. It derives the drawing frame from the
//! extent of positioned nodes, computes an exact scale factor for a target
//! size, and assigns each node a square glyph from the registry.
//!
//! Boards round-trip through a TOML document:
//!
//! ```toml
//! [board]
//! title = "Plotlines"
//!
//! [board.shapes]
//! "sq2.00x2.00-1" = [[-1.0, -1.0], [1.0, -1.0], [1.0, 1.0], [-1.0, 1.0]]
//!
//! [[board.nodes]]
//! uid = 1
//!
//! [[board.edges]]
//! uid = 2
//! ```

use std::fmt;

use indexmap::IndexMap;
use log::{debug, info, warn};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use plotlines_core::{
    geometry::{Coordinates, Size},
    graph::Graph,
    identifier::Uid,
    record::{EdgeRecord, NodeRecord},
};

use crate::PlotlinesError;

/// Default fraction of the span added around a frame.
pub const DEFAULT_MARGIN: f64 = 0.05;

/// Frame used when the extent of a board has no area.
pub const UNIT_FRAME: Frame = Frame {
    min: Coordinates::from_array([0.0, 0.0]),
    max: Coordinates::from_array([120.0, 120.0]),
};

/// Axis-aligned drawing frame given by its two corners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub min: Coordinates,
    pub max: Coordinates,
}

impl Frame {
    pub fn new(min: Coordinates, max: Coordinates) -> Self {
        Self { min, max }
    }

    pub fn width(&self) -> f64 {
        self.max.x() - self.min.x()
    }

    pub fn height(&self) -> f64 {
        self.max.y() - self.min.y()
    }

    /// Returns true when either side has no length.
    pub fn is_degenerate(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }
}

/// An exact scale factor as a reduced fraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScaleFactor {
    numer: i64,
    denom: i64,
}

impl ScaleFactor {
    pub const ONE: ScaleFactor = ScaleFactor { numer: 1, denom: 1 };

    /// Creates a reduced fraction. Returns `None` for a zero denominator.
    pub fn new(numer: i64, denom: i64) -> Option<Self> {
        if denom == 0 {
            return None;
        }
        let divisor = gcd(numer.unsigned_abs(), denom.unsigned_abs()).max(1) as i64;
        let sign = denom.signum();
        Some(Self {
            numer: sign * numer / divisor,
            denom: sign * denom / divisor,
        })
    }

    fn from_decimal(value: Decimal) -> Option<Self> {
        let denom = 10_i128.checked_pow(value.scale())?;
        let mantissa = value.mantissa();
        let divisor = gcd128(mantissa.unsigned_abs(), denom.unsigned_abs()).max(1) as i128;
        Self::new(
            i64::try_from(mantissa / divisor).ok()?,
            i64::try_from(denom / divisor).ok()?,
        )
    }

    pub fn numer(&self) -> i64 {
        self.numer
    }

    pub fn denom(&self) -> i64 {
        self.denom
    }

    pub fn to_f64(self) -> f64 {
        self.numer as f64 / self.denom as f64
    }
}

impl fmt::Display for ScaleFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.denom == 1 {
            write!(f, "{}", self.numer)
        } else {
            write!(f, "{}/{}", self.numer, self.denom)
        }
    }
}

fn gcd(a: u64, b: u64) -> u64 {
    if b == 0 { a } else { gcd(b, a % b) }
}

fn gcd128(a: u128, b: u128) -> u128 {
    if b == 0 { a } else { gcd128(b, a % b) }
}

/// Frame and scale a board is drawn with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct View {
    pub frame: Frame,
    pub scale: ScaleFactor,
}

/// A story graph with its glyph registry.
#[derive(Debug, Clone, Default)]
pub struct Board {
    graph: Graph,
    shapes: IndexMap<String, Vec<Coordinates>>,
    title: String,
}

impl Board {
    pub fn new(graph: Graph, title: impl Into<String>) -> Self {
        Self {
            graph,
            shapes: IndexMap::new(),
            title: title.into(),
        }
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut Graph {
        &mut self.graph
    }

    pub fn into_graph(self) -> Graph {
        self.graph
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Registered glyph polygons keyed by shape key.
    pub fn shapes(&self) -> &IndexMap<String, Vec<Coordinates>> {
        &self.shapes
    }

    /// Nodes with no incoming edges.
    pub fn initial(&self) -> Vec<Uid> {
        self.graph.initial()
    }

    /// Nodes with no outgoing edges.
    pub fn terminal(&self) -> Vec<Uid> {
        self.graph.terminal()
    }

    /// Minimum and maximum corner over every positioned node and node port.
    pub fn extent(&self) -> Option<(Coordinates, Coordinates)> {
        let points: Vec<Coordinates> = self
            .graph
            .nodes()
            .flat_map(|node| {
                std::iter::once(node.pos).chain(
                    node.ports()
                        .values()
                        .map(|id| self.graph.port(*id).and_then(|port| port.pos)),
                )
            })
            .flatten()
            .collect();

        let first = points.first()?;
        let (min, max) = points.iter().fold((*first, *first), |(min, max), pos| {
            (
                Coordinates::new(min.x().min(pos.x()), min.y().min(pos.y())),
                Coordinates::new(max.x().max(pos.x()), max.y().max(pos.y())),
            )
        });
        Some((min, max))
    }

    /// Frames `points` with a margin proportional to their span.
    ///
    /// An axis with no span borrows the span of the other axis. A `square`
    /// frame uses the smaller minimum and larger maximum on both axes.
    ///
    /// # Examples
    ///
    /// ```
    /// use plotlines::board::{Board, DEFAULT_MARGIN};
    /// use plotlines_core::geometry::Coordinates;
    ///
    /// let frame = Board::frame(
    ///     &[Coordinates::new(0.0, 0.0), Coordinates::new(10.0, 10.0)],
    ///     DEFAULT_MARGIN,
    ///     false,
    /// )
    /// .unwrap();
    /// assert_eq!(frame.min, Coordinates::new(-0.5, -0.5));
    /// assert_eq!(frame.max, Coordinates::new(10.5, 10.5));
    /// ```
    pub fn frame(points: &[Coordinates], margin: f64, square: bool) -> Option<Frame> {
        let mut xs: Vec<f64> = points.iter().map(|pos| pos.x()).collect();
        let mut ys: Vec<f64> = points.iter().map(|pos| pos.y()).collect();
        xs.sort_by(f64::total_cmp);
        ys.sort_by(f64::total_cmp);

        let (min_x, max_x) = (*xs.first()?, *xs.last()?);
        let (min_y, max_y) = (*ys.first()?, *ys.last()?);

        let mut span_x = max_x - min_x;
        let mut span_y = max_y - min_y;
        if span_x == 0.0 {
            span_x = span_y;
        }
        if span_y == 0.0 {
            span_y = span_x;
        }

        let min = Coordinates::new(min_x - margin * span_x, min_y - margin * span_y);
        let max = Coordinates::new(max_x + margin * span_x, max_y + margin * span_y);
        if square {
            let low = min.x().min(min.y());
            let high = max.x().max(max.y());
            Some(Frame::new(Coordinates::new(low, low), Coordinates::new(high, high)))
        } else {
            Some(Frame::new(min, max))
        }
    }

    /// The largest scale at which `frame` fits in `geom`, rounded half-even
    /// to two decimal places and returned as an exact fraction.
    ///
    /// Returns `None` when the frame has no area.
    ///
    /// # Examples
    ///
    /// ```
    /// use plotlines::board::{Board, Frame};
    /// use plotlines_core::geometry::{Coordinates, Size};
    ///
    /// let frame = Frame::new(Coordinates::new(1.5, 1.5), Coordinates::new(12.5, 2.5));
    /// let scale = Board::scale_factor(Size::new(400.0, 300.0), &frame).unwrap();
    /// assert_eq!(scale.to_string(), "909/25");
    /// ```
    pub fn scale_factor(geom: Size, frame: &Frame) -> Option<ScaleFactor> {
        let ratio = |length: f64, span: f64| -> Option<Decimal> {
            Decimal::try_from(length)
                .ok()?
                .checked_div(Decimal::try_from(span).ok()?)
        };
        let scale = ratio(geom.width(), frame.width())?.min(ratio(geom.height(), frame.height())?);
        ScaleFactor::from_decimal(scale.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven))
    }

    /// The frame and scale this board is drawn with at `geom`.
    ///
    /// Falls back to [`UNIT_FRAME`] when nothing is positioned or the extent
    /// has no area.
    pub fn view(&self, geom: Size) -> View {
        let frame = self
            .extent()
            .and_then(|(min, max)| Self::frame(&[min, max], DEFAULT_MARGIN, true))
            .filter(|frame| !frame.is_degenerate())
            .unwrap_or_else(|| {
                warn!(title = self.title; "Degenerate extent, using unit frame");
                UNIT_FRAME
            });
        let scale = Self::scale_factor(geom, &frame).unwrap_or(ScaleFactor::ONE);
        View { frame, scale }
    }

    /// Registers a square glyph of side `size` at `scale` and returns its key.
    pub fn build_shape(&mut self, size: f64, scale: ScaleFactor) -> String {
        let key = format!("sq{size:.2}x{size:.2}-{scale}");
        self.shapes.entry(key.clone()).or_insert_with(|| {
            let unit = scale.to_f64() * size / 2.0;
            vec![
                Coordinates::new(-unit, -unit),
                Coordinates::new(unit, -unit),
                Coordinates::new(unit, unit),
                Coordinates::new(-unit, unit),
            ]
        });
        key
    }

    /// Assigns every node a glyph sized to its footprint.
    pub fn style_items(&mut self, geom: Size) -> View {
        let view = self.view(geom);
        let sizes: Vec<(Uid, f64)> = self
            .graph
            .nodes()
            .map(|node| {
                let side = node.size.max_side();
                let side = if side > 0.0 { side } else { node.glyph_size() };
                (node.uid().clone(), side)
            })
            .collect();

        for (uid, side) in sizes {
            let key = self.build_shape(side, view.scale);
            if let Some(node) = self.graph.node_mut(&uid) {
                node.shape = key;
            }
        }
        debug!(shapes = self.shapes.len(), scale:% = view.scale; "Styled board");
        view
    }

    // -------------------------------------------------------------------------
    // Documents
    // -------------------------------------------------------------------------

    /// Captures the whole board as a document.
    pub fn to_document(&self) -> BoardDocument {
        BoardDocument {
            board: BoardSection {
                title: self.title.clone(),
                shapes: self.shapes.clone(),
                nodes: self
                    .graph
                    .nodes()
                    .filter_map(|node| self.graph.node_record(node.uid()))
                    .collect(),
                edges: self
                    .graph
                    .edges()
                    .filter_map(|edge| self.graph.edge_record(edge.uid()))
                    .collect(),
            },
        }
    }

    /// Restores a board from a document.
    ///
    /// Edges are built first so that every node port finds the edge port it
    /// shares.
    pub fn build(document: BoardDocument) -> Result<Self, plotlines_core::Error> {
        let BoardSection {
            title,
            shapes,
            nodes,
            edges,
        } = document.board;

        let mut graph = Graph::new();
        for record in edges {
            graph.build_edge(record)?;
        }
        for record in nodes {
            graph.build_node(record)?;
        }
        info!(nodes = graph.node_count(), edges = graph.edge_count(); "Board loaded");
        Ok(Self {
            graph,
            shapes,
            title,
        })
    }

    /// Serializes the board document as TOML.
    pub fn to_toml(&self) -> Result<String, PlotlinesError> {
        toml::to_string(&self.to_document())
            .map_err(|err| PlotlinesError::Graph(plotlines_core::Error::Serialize(err)))
    }

    /// Parses and restores a board from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`PlotlinesError::Parse`] with the source text when the text
    /// is not a valid board document.
    pub fn from_toml(source: &str) -> Result<Self, PlotlinesError> {
        let document: BoardDocument = toml::from_str(source)
            .map_err(|err| PlotlinesError::new_parse_error(err, source))?;
        Ok(Self::build(document)?)
    }
}

/// Serialized form of a whole [`Board`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardDocument {
    pub board: BoardSection,
}

/// The `[board]` table of a [`BoardDocument`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardSection {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub shapes: IndexMap<String, Vec<Coordinates>>,
    #[serde(default)]
    pub nodes: Vec<NodeRecord>,
    #[serde(default)]
    pub edges: Vec<EdgeRecord>,
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use super::*;

    fn chain() -> Board {
        let mut graph = Graph::new();
        let a = graph.add_node().set_pos(Coordinates::new(2.0, 3.0)).uid().clone();
        let b = graph.add_node().set_pos(Coordinates::new(8.0, 9.0)).uid().clone();
        let c = graph.add_node().set_pos(Coordinates::new(14.0, 3.0)).uid().clone();
        graph
            .connect(&a, &b, &[Coordinates::new(3.0, 3.0), Coordinates::new(7.0, 9.0)], None)
            .unwrap();
        graph.connect(&b, &c, &[], None).unwrap();
        Board::new(graph, "Chain")
    }

    #[test]
    fn test_initial_and_terminal() {
        let board = chain();
        assert_eq!(board.initial(), vec![Uid::Serial(1)]);
        assert_eq!(board.terminal(), vec![Uid::Serial(3)]);
    }

    #[test]
    fn test_extent_covers_nodes_and_ports() {
        let board = chain();
        let (min, max) = board.extent().unwrap();
        assert_eq!(min, Coordinates::new(2.0, 3.0));
        assert_eq!(max, Coordinates::new(14.0, 9.0));
    }

    #[test]
    fn test_extent_of_unplaced_board() {
        let mut graph = Graph::new();
        graph.add_node();
        assert_eq!(Board::new(graph, "").extent(), None);
    }

    #[test]
    fn test_frame() {
        let frame = Board::frame(
            &[Coordinates::new(0.0, 0.0), Coordinates::new(10.0, 10.0)],
            DEFAULT_MARGIN,
            false,
        )
        .unwrap();
        assert_approx_eq!(f64, frame.min.x(), -0.5);
        assert_approx_eq!(f64, frame.min.y(), -0.5);
        assert_approx_eq!(f64, frame.max.x(), 10.5);
        assert_approx_eq!(f64, frame.max.y(), 10.5);
    }

    #[test]
    fn test_frame_borrows_span_of_other_axis() {
        let frame = Board::frame(
            &[Coordinates::new(0.0, 5.0), Coordinates::new(20.0, 5.0)],
            0.1,
            false,
        )
        .unwrap();
        assert_approx_eq!(f64, frame.min.y(), 3.0);
        assert_approx_eq!(f64, frame.max.y(), 7.0);
    }

    #[test]
    fn test_square_frame() {
        let frame = Board::frame(
            &[Coordinates::new(0.0, 0.0), Coordinates::new(20.0, 10.0)],
            0.0,
            true,
        )
        .unwrap();
        assert_eq!(frame.min, Coordinates::new(0.0, 0.0));
        assert_eq!(frame.max, Coordinates::new(20.0, 20.0));
    }

    #[test]
    fn test_frame_of_nothing() {
        assert_eq!(Board::frame(&[], DEFAULT_MARGIN, true), None);
    }

    #[test]
    fn test_scale_factor() {
        let frame = Frame::new(Coordinates::new(1.5, 1.5), Coordinates::new(12.5, 2.5));
        let scale = Board::scale_factor(Size::new(400.0, 300.0), &frame).unwrap();
        assert_eq!((scale.numer(), scale.denom()), (909, 25));
    }

    #[test]
    fn test_scale_factor_of_degenerate_frame() {
        let frame = Frame::new(Coordinates::new(1.0, 1.0), Coordinates::new(1.0, 4.0));
        assert_eq!(Board::scale_factor(Size::new(400.0, 300.0), &frame), None);
    }

    #[test]
    fn test_scale_factor_display() {
        assert_eq!(ScaleFactor::new(6, 2).unwrap().to_string(), "3");
        assert_eq!(ScaleFactor::new(3, -6).unwrap().to_string(), "-1/2");
        assert_eq!(ScaleFactor::new(1, 0), None);
    }

    #[test]
    fn test_view_falls_back_to_unit_frame() {
        let mut graph = Graph::new();
        graph.add_node().set_pos(Coordinates::new(4.0, 4.0));
        let board = Board::new(graph, "");
        let view = board.view(Size::new(240.0, 240.0));
        assert_eq!(view.frame, UNIT_FRAME);
        assert_eq!(view.scale, ScaleFactor::new(2, 1).unwrap());
    }

    #[test]
    fn test_build_shape_registers_once() {
        let mut board = Board::default();
        let scale = ScaleFactor::new(2727, 100).unwrap();
        let key = board.build_shape(2.0, scale);
        assert_eq!(key, "sq2.00x2.00-2727/100");
        assert_eq!(board.build_shape(2.0, scale), key);
        assert_eq!(board.shapes().len(), 1);

        let points = &board.shapes()[&key];
        assert_approx_eq!(f64, points[2].x(), 27.27);
    }

    #[test]
    fn test_style_items_assigns_shapes() {
        let mut board = chain();
        board.style_items(Size::new(400.0, 300.0));
        for node in board.graph().nodes() {
            assert!(node.shape.starts_with("sq2.00x2.00-"), "{}", node.shape);
            assert!(board.shapes().contains_key(&node.shape));
        }
        assert_eq!(board.shapes().len(), 1);
    }

    #[test]
    fn test_document_round_trip() {
        let mut board = chain();
        board.style_items(Size::new(400.0, 300.0));
        let text = board.to_toml().unwrap();
        assert!(text.contains("[board]"), "{text}");
        assert!(text.contains("[board.shapes]"), "{text}");
        assert!(text.contains("[[board.nodes]]"), "{text}");
        assert!(text.contains("[[board.edges]]"), "{text}");

        let loaded = Board::from_toml(&text).unwrap();
        assert_eq!(loaded.title(), "Chain");
        assert_eq!(loaded.to_document(), board.to_document());
        assert_eq!(loaded.initial(), board.initial());
        assert_eq!(loaded.graph().nearby(&Uid::Serial(2)).len(), 2);
    }

    #[test]
    fn test_from_toml_reports_parse_error() {
        let source = "[board\ntitle = 1";
        match Board::from_toml(source) {
            Err(PlotlinesError::Parse { src, .. }) => assert_eq!(src, source),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
