//! SVG rendering of a styled board.
//!
//! Board coordinates are mapped into the document by subtracting the view
//! frame's minimum corner and multiplying by the exact scale factor, so the
//! glyph polygons registered by [`Board::style_items`] line up with node
//! positions without a transform.

use std::{
    fs::File,
    io::Write,
    path::{Path, PathBuf},
};

use log::{debug, error, info};
use svg::{
    Document, Node as _,
    node::{Text, element as svg_element},
};

use plotlines_core::{color::Rgb, geometry::Size, graph::Node, style::Style};

use crate::{
    board::{Board, View},
    config::StyleConfig,
    export::{self, Exporter},
};

/// Makes a shape key usable as an XML id.
fn shape_id(key: &str) -> String {
    let safe: String = key
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("shape-{safe}")
}

/// Builder for [`Svg`] exporters.
///
/// # Examples
///
/// ```
/// use plotlines::{config::StyleConfig, export::svg::SvgBuilder};
/// use plotlines_core::geometry::Size;
///
/// let svg = SvgBuilder::new("story.svg")
///     .with_style(&StyleConfig::default())
///     .with_size(Size::new(320.0, 240.0))
///     .build()
///     .unwrap();
/// assert_eq!(svg.size(), Size::new(320.0, 240.0));
/// ```
#[derive(Debug, Clone)]
pub struct SvgBuilder {
    file_name: PathBuf,
    style: StyleConfig,
    size: Size,
}

impl SvgBuilder {
    pub fn new(file_name: impl AsRef<Path>) -> Self {
        Self {
            file_name: file_name.as_ref().to_path_buf(),
            style: StyleConfig::default(),
            size: Size::new(640.0, 480.0),
        }
    }

    pub fn with_style(mut self, style: &StyleConfig) -> Self {
        self.style = style.clone();
        self
    }

    /// Target drawing size the board is scaled to.
    pub fn with_size(mut self, size: Size) -> Self {
        self.size = size;
        self
    }

    /// Resolves the configured colors.
    ///
    /// # Errors
    ///
    /// Returns [`export::Error::Render`] if a configured color cannot be
    /// parsed.
    pub fn build(self) -> Result<Svg, export::Error> {
        let background = self.style.background_color().map_err(export::Error::Render)?;
        let style = self.style.entity_style().map_err(export::Error::Render)?;
        Ok(Svg {
            file_name: self.file_name,
            size: self.size,
            style,
            background,
        })
    }
}

/// SVG exporter for boards.
#[derive(Debug, Clone)]
pub struct Svg {
    file_name: PathBuf,
    size: Size,
    style: Style,
    background: Option<Rgb>,
}

impl Svg {
    pub fn size(&self) -> Size {
        self.size
    }

    /// Renders the board into an SVG document.
    pub fn render_board(&self, board: &Board) -> Document {
        let view = board.view(self.size);
        let scale = view.scale.to_f64();
        let width = view.frame.width() * scale;
        let height = view.frame.height() * scale;
        debug!(width, height, scale:% = view.scale; "Rendering board");

        let mut doc = Document::new()
            .set("viewBox", format!("0 0 {width} {height}"))
            .set("width", width)
            .set("height", height);

        if !board.title().is_empty() {
            let mut title = svg_element::Element::new("title");
            title.append(Text::new(board.title()));
            doc = doc.add(title);
        }

        if let Some(color) = self.background {
            doc = doc.add(
                svg_element::Rectangle::new()
                    .set("x", 0)
                    .set("y", 0)
                    .set("width", width)
                    .set("height", height)
                    .set("fill", color.to_string()),
            );
        }

        let mut defs = svg_element::Definitions::new();
        for (key, points) in board.shapes() {
            let points = points
                .iter()
                .map(|pos| format!("{},{}", pos.x(), pos.y()))
                .collect::<Vec<_>>()
                .join(" ");
            defs = defs.add(
                svg_element::Polygon::new()
                    .set("id", shape_id(key))
                    .set("points", points),
            );
        }
        doc = doc.add(defs);

        let mut edges = svg_element::Group::new().set("class", "edges");
        for edge in board.graph().edges() {
            let Some(ports) = board.graph().edge_ports(edge.uid()) else {
                continue;
            };
            let (Some(tail), Some(head)) = (ports[0].pos, ports[1].pos) else {
                continue;
            };
            let (tail, head) = (project(&view, tail), project(&view, head));
            let style = self.resolve(edge.style);
            let mut line = svg_element::Line::new()
                .set("id", format!("edge-{}", edge.uid()))
                .set("x1", tail.0)
                .set("y1", tail.1)
                .set("x2", head.0)
                .set("y2", head.1)
                .set("stroke", style.stroke.to_string())
                .set("stroke-width", ports[0].thickness() * scale);
            if !edge.trail.is_empty() {
                line = line.set("class", edge.trail.clone());
            }
            edges = edges.add(line);
        }
        doc = doc.add(edges);

        let mut nodes = svg_element::Group::new().set("class", "nodes");
        for node in board.graph().nodes() {
            if let Some(glyph) = self.render_node(&view, node) {
                nodes = nodes.add(glyph);
            }
        }
        doc.add(nodes)
    }

    fn render_node(&self, view: &View, node: &Node) -> Option<svg_element::Use> {
        let pos = node.pos?;
        if node.shape.is_empty() {
            return None;
        }
        let (x, y) = project(view, pos);
        let style = self.resolve(node.style);
        let mut glyph = svg_element::Use::new()
            .set("id", format!("node-{}", node.uid()))
            .set("href", format!("#{}", shape_id(&node.shape)))
            .set("x", x)
            .set("y", y)
            .set("class", format!("node {}", style.fill.to_id_safe_string()))
            .set("fill", style.fill.to_string())
            .set("stroke", style.stroke.to_string())
            .set("stroke-width", style.weight);
        if !node.label.is_empty() {
            let mut title = svg_element::Element::new("title");
            title.append(Text::new(node.label.as_str()));
            glyph.append(title);
        }
        Some(glyph)
    }

    /// Entities left at the default style take the configured style.
    fn resolve(&self, style: Style) -> Style {
        if style == Style::default() {
            self.style
        } else {
            style
        }
    }

    /// Writes an SVG document to the configured file.
    pub fn write_document(&self, doc: &Document) -> Result<(), export::Error> {
        info!(file_name:? = self.file_name; "Creating SVG file");
        let f = match File::create(&self.file_name) {
            Ok(file) => file,
            Err(err) => {
                error!(file_name:? = self.file_name, err:err; "Failed to create SVG file");
                return Err(export::Error::Io(err));
            }
        };

        if let Err(err) = write!(&f, "{doc}") {
            error!(file_name:? = self.file_name, err:err; "Failed to write SVG content");
            return Err(export::Error::Io(err));
        }

        Ok(())
    }
}

fn project(view: &View, pos: plotlines_core::geometry::Coordinates) -> (f64, f64) {
    let scale = view.scale.to_f64();
    let offset = (pos - view.frame.min) * scale;
    (offset.x(), offset.y())
}

impl Exporter for Svg {
    fn export_board(&mut self, board: &Board) -> Result<(), export::Error> {
        let doc = self.render_board(board);
        debug!("SVG document rendered");
        self.write_document(&doc)
    }
}

#[cfg(test)]
mod tests {
    use plotlines_core::{geometry::Coordinates, graph::Graph};

    use super::*;

    fn styled_board() -> Board {
        let mut graph = Graph::new();
        let a = graph
            .add_node()
            .set_label("start")
            .set_pos(Coordinates::new(0.0, 0.0))
            .uid()
            .clone();
        let b = graph
            .add_node()
            .set_pos(Coordinates::new(100.0, 100.0))
            .uid()
            .clone();
        graph
            .connect(
                &a,
                &b,
                &[Coordinates::new(1.0, 0.0), Coordinates::new(99.0, 100.0)],
                None,
            )
            .unwrap();
        let mut board = Board::new(graph, "Demo");
        board.style_items(Size::new(640.0, 480.0));
        board
    }

    #[test]
    fn test_shape_id_is_xml_safe() {
        assert_eq!(shape_id("sq2.00x2.00-909/25"), "shape-sq2_00x2_00-909_25");
    }

    #[test]
    fn test_render_board_contents() {
        let board = styled_board();
        let svg = SvgBuilder::new("unused.svg").build().unwrap();
        let text = svg.render_board(&board).to_string();

        assert_eq!(text.matches("<title>").count(), 2);
        assert!(text.contains("Demo"));
        assert!(text.contains("start"));
        assert_eq!(text.matches("<use").count(), 2);
        assert_eq!(text.matches("<line").count(), 1);
        assert_eq!(text.matches("<polygon").count(), board.shapes().len());
        assert!(!text.contains("<rect"));
    }

    #[test]
    fn test_background_is_drawn() {
        let board = styled_board();
        let style: StyleConfig = toml::from_str("background_color = \"red\"").unwrap();
        let svg = SvgBuilder::new("unused.svg")
            .with_style(&style)
            .build()
            .unwrap();
        let text = svg.render_board(&board).to_string();
        assert!(text.contains("<rect"));
        assert!(text.contains("rgb(255, 0, 0)"));
    }

    #[test]
    fn test_bad_color_is_render_error() {
        let style: StyleConfig = toml::from_str("stroke = \"no-such-color\"").unwrap();
        let err = SvgBuilder::new("unused.svg")
            .with_style(&style)
            .build()
            .unwrap_err();
        assert!(matches!(err, export::Error::Render(_)));
    }

    #[test]
    fn test_unpositioned_edges_are_skipped() {
        let mut graph = Graph::new();
        let a = graph.add_node().uid().clone();
        let b = graph.add_node().uid().clone();
        graph.connect(&a, &b, &[], None).unwrap();
        let board = Board::new(graph, "");

        let svg = SvgBuilder::new("unused.svg").build().unwrap();
        let text = svg.render_board(&board).to_string();
        assert!(!text.contains("<line"));
        assert!(!text.contains("<use"));
        assert!(!text.contains("<title"));
    }

    #[test]
    fn test_export_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("board.svg");
        let mut svg = SvgBuilder::new(&path).build().unwrap();
        svg.export_board(&styled_board()).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("<svg"));
    }
}
