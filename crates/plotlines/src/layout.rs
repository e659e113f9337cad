//! Zone-column layout with crowding relaxation.
//!
//! Layout runs in two phases. [`place_items`] puts every node in the column
//! of its zone, stacks the nodes of a column vertically and spreads the
//! edge ports of each node along its left (incoming) and right (outgoing)
//! faces. [`Engine::run`] then repeatedly measures how crowded each zone is
//! and nudges the members of the most crowded zone apart, until the median
//! crowding score reaches the threshold or the step ceiling is hit.
//!
//! Relaxation is greedy and makes no promise of an overlap-free result.

use std::collections::BTreeMap;

use float_cmp::approx_eq;
use log::{debug, info, trace, warn};

use plotlines_core::{
    geometry::{Coordinates, Size},
    graph::{Graph, ItemRef},
    identifier::Uid,
};

/// Nodes of each zone in placement order.
pub type Zones = BTreeMap<i64, Vec<Uid>>;

/// Rendered height of a node: the larger of the summed thicknesses of its
/// incoming and outgoing edges, and never less than its own glyph.
pub fn node_size(graph: &Graph, uid: &Uid) -> f64 {
    let Some(node) = graph.node(uid) else {
        return 0.0;
    };
    let (incoming, outgoing) = graph.connections(uid);
    let thickness = |edges: &[Uid], end: usize| -> f64 {
        edges
            .iter()
            .filter_map(|edge| graph.edge_ports(edge))
            .map(|ports| ports[end].thickness())
            .sum()
    };
    thickness(&incoming, 1)
        .max(thickness(&outgoing, 0))
        .max(node.glyph_size())
}

/// Indexes of a sequence of `length` items from the middle outwards.
///
/// # Examples
///
/// ```
/// use plotlines::layout::expandex;
///
/// assert_eq!(expandex(5), vec![2, 1, 3, 0, 4]);
/// assert_eq!(expandex(6), vec![3, 2, 4, 1, 5, 0]);
/// ```
pub fn expandex(length: usize) -> Vec<usize> {
    let mid = length / 2;
    let mut up = mid..length;
    let mut down = (0..mid).rev();
    let mut rv = Vec::with_capacity(length);
    loop {
        let (next_up, next_down) = (up.next(), down.next());
        if next_up.is_none() && next_down.is_none() {
            return rv;
        }
        rv.extend(next_up);
        rv.extend(next_down);
    }
}

/// Assigns positions to nodes and their edge ports, column by column.
///
/// Zones are processed in ascending order from the left edge of the
/// boundary. Each column is as wide as its widest node and is followed by a
/// gap of twice that width. Within a column the vertical gap is the free
/// height divided by `2n + 1` for `n` nodes.
pub fn place_items(graph: &mut Graph, origin: Coordinates, size: Size) -> Zones {
    let mut zones = Zones::new();
    for node in graph.nodes() {
        zones.entry(node.zone).or_default().push(node.uid().clone());
    }

    let mut offset = 0.0;
    for (zone, nodes) in &zones {
        let heights: Vec<f64> = nodes.iter().map(|uid| node_size(graph, uid)).collect();
        let space = (size.height() - heights.iter().sum::<f64>()) / (2 * nodes.len() + 1) as f64;

        let mut column_width: f64 = 0.0;
        for (n, (uid, height)) in nodes.iter().zip(heights).enumerate() {
            let Some(node) = graph.node(uid) else {
                continue;
            };
            let width = height.max(node.glyph_size());
            column_width = column_width.max(width);

            let pos = Coordinates::new(
                origin.x() + offset + width / 2.0,
                origin.y() + n as f64 * space + height / 2.0,
            );
            if let Some(node) = graph.node_mut(uid) {
                node.pos = Some(pos);
                node.size = Size::new(width, height);
            }
            place_ports(graph, uid, pos, width);
        }
        trace!(zone, nodes = nodes.len(), offset; "Placed zone");

        offset += column_width + 2.0 * column_width;
    }
    zones
}

/// Stacks incoming edge heads down the left face of a node and outgoing
/// edge tails down its right face, each taking its own thickness.
fn place_ports(graph: &mut Graph, uid: &Uid, pos: Coordinates, width: f64) {
    let (incoming, outgoing) = graph.connections(uid);
    for (edges, end, side) in [(incoming, 1, -1.0), (outgoing, 0, 1.0)] {
        let ends: Vec<_> = edges
            .iter()
            .filter_map(|edge| graph.edge(edge))
            .map(|edge| edge.ports()[end])
            .collect();
        let sizes: Vec<f64> = ends
            .iter()
            .map(|id| graph.port(*id).map_or(0.0, |port| port.thickness()))
            .collect();

        let mut cursor = pos.y() - sizes.iter().sum::<f64>() / 2.0;
        let x = pos.x() + side * width / 2.0;
        for (id, size) in ends.into_iter().zip(sizes) {
            if let Some(port) = graph.port_mut(id) {
                port.pos = Some(Coordinates::new(x, cursor + size / 2.0));
            }
            cursor += size;
        }
    }
}

/// Distances this close to zero are points meeting, not crowding.
const COINCIDENT: f64 = 1e-9;

/// Smallest nonzero distance between any node of a zone and the neighbours
/// or edges of any node of the same zone. Infinite when nothing is measured.
pub fn crowding(graph: &Graph, zone: &[Uid]) -> f64 {
    let mut rv = f64::INFINITY;
    for node in zone {
        for other in zone {
            let nearby = graph.nearby(other);
            let edges = graph.edges_of(other);
            let items = nearby
                .iter()
                .map(ItemRef::Node)
                .chain(edges.iter().map(ItemRef::Edge));
            for item in items {
                for space in graph.spacing(node, item).into_values() {
                    if !approx_eq!(f64, space, 0.0, epsilon = COINCIDENT) {
                        rv = rv.min(space);
                    }
                }
            }
        }
    }
    rv
}

fn median(values: impl IntoIterator<Item = f64>) -> f64 {
    let mut values: Vec<f64> = values.into_iter().collect();
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        values[mid]
    } else {
        (values[mid - 1] + values[mid]) / 2.0
    }
}

/// Result of a layout run.
#[derive(Debug, Clone, Default)]
pub struct Layout {
    zones: Zones,
    crowding: BTreeMap<i64, f64>,
    steps: usize,
}

impl Layout {
    pub fn zones(&self) -> &Zones {
        &self.zones
    }

    /// Crowding score of each zone at the last relaxation step.
    pub fn crowding(&self) -> &BTreeMap<i64, f64> {
        &self.crowding
    }

    pub fn steps(&self) -> usize {
        self.steps
    }
}

/// Layout engine: initial placement followed by crowding relaxation.
///
/// # Examples
///
/// ```
/// use plotlines::layout::Engine;
/// use plotlines_core::{geometry::Size, graph::Graph};
///
/// let mut graph = Graph::new();
/// let a = graph.add_node().set_zone(0).uid().clone();
/// let b = graph.add_node().set_zone(1).uid().clone();
/// graph.connect(&a, &b, &[], None).unwrap();
///
/// let mut engine = Engine::new();
/// engine.set_threshold(0.1);
/// let layout = engine.run(&mut graph, Size::new(640.0, 480.0));
///
/// assert_eq!(layout.zones().len(), 2);
/// assert!(graph.nodes().all(|node| node.pos.is_some()));
/// ```
#[derive(Debug, Clone)]
pub struct Engine {
    threshold: f64,
    step_limit: Option<usize>,
    origin: Coordinates,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        Self {
            threshold: 0.1,
            step_limit: None,
            origin: Coordinates::default(),
        }
    }

    /// Set the median crowding score at which relaxation stops.
    pub fn set_threshold(&mut self, threshold: f64) -> &mut Self {
        self.threshold = threshold;
        self
    }

    /// Set the relaxation step ceiling. Without one the ceiling is twice the
    /// number of entities in the graph.
    pub fn set_step_limit(&mut self, limit: usize) -> &mut Self {
        self.step_limit = Some(limit);
        self
    }

    /// Set the top-left corner of the layout area.
    pub fn set_origin(&mut self, origin: Coordinates) -> &mut Self {
        self.origin = origin;
        self
    }

    /// Places every node of `graph` within `size` and relaxes crowded zones.
    pub fn run(&self, graph: &mut Graph, size: Size) -> Layout {
        let zones = place_items(graph, self.origin, size);
        let limit = self.step_limit.unwrap_or(2 * graph.len());
        if zones.is_empty() {
            return Layout {
                zones,
                ..Layout::default()
            };
        }

        let mut step = 0;
        let mut scores = BTreeMap::from([(0, 0.0)]);
        while step < limit && median(scores.values().copied()) < self.threshold {
            step += 1;
            scores = zones
                .iter()
                .map(|(zone, nodes)| (*zone, crowding(graph, nodes)))
                .collect();

            let Some((crowded, score)) = scores
                .iter()
                .min_by(|a, b| a.1.total_cmp(b.1))
                .map(|(zone, score)| (*zone, *score))
            else {
                break;
            };
            debug!(step, zone = crowded, score; "Relaxing crowded zone");

            let members = &zones[&crowded];
            for (n, index) in expandex(members.len()).into_iter().enumerate() {
                let uid = &members[index];
                let height = graph.node(uid).map_or(0.0, |node| node.size.height());
                let hop = if n % 2 == 0 { height } else { -height };
                graph.translate(uid, Coordinates::new(0.0, hop));
            }
        }

        if step >= limit {
            warn!(steps = step; "Crowding relaxation stopped at the step ceiling");
        }
        info!(zones = zones.len(), steps = step; "Layout finished");
        Layout {
            zones,
            crowding: scores,
            steps: step,
        }
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use super::*;

    fn fan(graph: &mut Graph, leaves: usize) -> (Uid, Vec<Uid>) {
        let root = graph.add_node().set_zone(0).uid().clone();
        let leaves: Vec<Uid> = (0..leaves)
            .map(|_| graph.add_node().set_zone(1).uid().clone())
            .collect();
        for leaf in &leaves {
            graph.connect(&root, leaf, &[], None).unwrap();
        }
        (root, leaves)
    }

    #[test]
    fn test_expandex() {
        assert_eq!(expandex(5), vec![2, 1, 3, 0, 4]);
        assert_eq!(expandex(6), vec![3, 2, 4, 1, 5, 0]);
        assert_eq!(expandex(1), vec![0]);
        assert!(expandex(0).is_empty());
    }

    #[test]
    fn test_node_size_isolated_uses_glyph() {
        let mut graph = Graph::new();
        let uid = graph.add_node().set_area(9.0).uid().clone();
        assert_approx_eq!(f64, node_size(&graph, &uid), 3.0);
    }

    #[test]
    fn test_node_size_sums_thickness() {
        let mut graph = Graph::new();
        let (root, leaves) = fan(&mut graph, 3);
        assert_approx_eq!(f64, node_size(&graph, &root), 6.0);
        assert_approx_eq!(f64, node_size(&graph, &leaves[0]), 2.0);
    }

    #[test]
    fn test_place_items_columns() {
        let mut graph = Graph::new();
        let (root, leaves) = fan(&mut graph, 3);
        let zones = place_items(&mut graph, Coordinates::default(), Size::new(640.0, 480.0));

        assert_eq!(zones[&0], vec![root.clone()]);
        assert_eq!(zones[&1], leaves);

        let node = graph.node(&root).unwrap();
        assert_eq!(node.size, Size::new(6.0, 6.0));
        let pos = node.pos.unwrap();
        assert_approx_eq!(f64, pos.x(), 3.0);
        assert_approx_eq!(f64, pos.y(), 3.0);

        // Second column starts after the first column and its gap.
        let leaf = graph.node(&leaves[1]).unwrap().pos.unwrap();
        assert_approx_eq!(f64, leaf.x(), 18.0 + 1.0);
        let space = (480.0 - 6.0) / 7.0;
        assert_approx_eq!(f64, leaf.y(), space + 1.0);
    }

    #[test]
    fn test_place_items_ports_on_faces() {
        let mut graph = Graph::new();
        let (root, leaves) = fan(&mut graph, 3);
        place_items(&mut graph, Coordinates::default(), Size::new(640.0, 480.0));

        let ys: Vec<f64> = graph
            .connections(&root)
            .1
            .iter()
            .map(|edge| graph.edge_ports(edge).unwrap()[0].pos.unwrap())
            .inspect(|pos| assert_approx_eq!(f64, pos.x(), 6.0))
            .map(|pos| pos.y())
            .collect();
        assert_eq!(ys.len(), 3);
        assert_approx_eq!(f64, ys[0], 1.0);
        assert_approx_eq!(f64, ys[1], 3.0);
        assert_approx_eq!(f64, ys[2], 5.0);

        let leaf = graph.node(&leaves[0]).unwrap().pos.unwrap();
        let edge = &graph.connections(&leaves[0]).0[0];
        let head = graph.edge_ports(edge).unwrap()[1].pos.unwrap();
        assert_approx_eq!(f64, head.x(), leaf.x() - 1.0);
        assert_approx_eq!(f64, head.y(), leaf.y());
    }

    #[test]
    fn test_crowding_of_single_node_zone() {
        let mut graph = Graph::new();
        let uid = graph.add_node().set_pos(Coordinates::new(0.0, 0.0)).uid().clone();
        assert_eq!(crowding(&graph, &[uid]), f64::INFINITY);
    }

    #[test]
    fn test_crowding_measures_neighbours() {
        let mut graph = Graph::new();
        let a = graph.add_node().set_pos(Coordinates::new(0.0, 0.0)).uid().clone();
        let b = graph.add_node().set_pos(Coordinates::new(3.0, 4.0)).uid().clone();
        graph.connect(&a, &b, &[], None).unwrap();
        assert_approx_eq!(f64, crowding(&graph, &[a]), 5.0);
    }

    #[test]
    fn test_crowding_ignores_own_diagonal_edge_end() {
        let mut graph = Graph::new();
        let a = graph.add_node().set_pos(Coordinates::new(0.0, 0.0)).uid().clone();
        let b = graph.add_node().set_pos(Coordinates::new(30.0, 70.0)).uid().clone();
        graph
            .connect(
                &a,
                &b,
                &[Coordinates::new(1.0, 0.0), Coordinates::new(29.0, 68.7)],
                None,
            )
            .unwrap();

        // The head port meets the edge's own end; the closest real gap is
        // from the node centre to the edge line.
        assert_approx_eq!(f64, crowding(&graph, &[b]), 0.435387, epsilon = 1e-6);
    }

    #[test]
    fn test_median() {
        assert_eq!(median([3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median([4.0, 1.0, 2.0, 3.0]), 2.5);
        assert_eq!(median([]), 0.0);
    }

    #[test]
    fn test_run_stops_once_uncrowded() {
        let mut graph = Graph::new();
        fan(&mut graph, 3);
        let layout = Engine::new().run(&mut graph, Size::new(640.0, 480.0));
        assert_eq!(layout.steps(), 1);
        assert_eq!(layout.crowding().len(), 2);
        assert!(median(layout.crowding().values().copied()) >= 0.1);
        assert!(layout.crowding().values().all(|score| *score > 1e-9));
    }

    #[test]
    fn test_run_respects_step_limit() {
        let mut graph = Graph::new();
        fan(&mut graph, 4);
        let layout = Engine::new()
            .set_threshold(f64::INFINITY)
            .set_step_limit(3)
            .run(&mut graph, Size::new(640.0, 480.0));
        assert_eq!(layout.steps(), 3);
    }

    #[test]
    fn test_relaxation_moves_ports_with_nodes() {
        let mut graph = Graph::new();
        let (root, _) = fan(&mut graph, 2);
        Engine::new()
            .set_threshold(f64::INFINITY)
            .set_step_limit(1)
            .run(&mut graph, Size::new(640.0, 480.0));

        let node = graph.node(&root).unwrap();
        let pos = node.pos.unwrap();
        for edge in graph.connections(&root).1 {
            let tail = graph.edge_ports(&edge).unwrap()[0].pos.unwrap();
            assert_approx_eq!(f64, tail.x(), pos.x() + node.size.width() / 2.0);
        }
    }

    #[test]
    fn test_run_on_empty_graph() {
        let mut graph = Graph::new();
        let layout = Engine::new().run(&mut graph, Size::new(10.0, 10.0));
        assert!(layout.zones().is_empty());
        assert_eq!(layout.steps(), 0);
    }
}
