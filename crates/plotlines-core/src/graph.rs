//! Graph entities and the arena that owns them.
//!
//! A story graph is bipartite: [`Node`]s (story beats) and [`Edge`]s
//! (transitions) meet at [`Port`]s. A port is shared between the node and
//! the edge it connects, and records both of their identifiers in its
//! `joins` set. Every view of adjacency (`nearby`, `edges_of`,
//! `connections`) is derived from port contents on each call, so a change to
//! a port is immediately visible everywhere.
//!
//! # Architecture
//!
//! - [`Graph`]: single owning store of nodes, edges and ports
//! - [`PortId`]: plain key of a port in the arena
//! - [`PortKey`]: handle of a port slot on a node
//! - [`ItemRef`]: tagged reference used by [`Graph::spacing`]
//!
//! Entities leave the arena only through [`Graph::remove`].

use std::{collections::BTreeSet, fmt};

use indexmap::IndexMap;
use log::{trace, warn};
use uuid::Uuid;

use crate::{
    error::Error,
    geometry::{Coordinates, Size},
    identifier::{IdScheme, Uid},
    style::Style,
};

/// Default glyph area of nodes and ports.
pub const DEFAULT_AREA: f64 = 4.0;

// =============================================================================
// Ports
// =============================================================================

/// Key of a port inside the [`Graph`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PortId(usize);

/// Handle of a port slot on a node: sequential, or named when the node was
/// built from data with string keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PortKey {
    Index(usize),
    Name(String),
}

impl fmt::Display for PortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(n) => write!(f, "{n}"),
            Self::Name(name) => write!(f, "{name}"),
        }
    }
}

impl From<&str> for PortKey {
    fn from(value: &str) -> Self {
        match value.parse::<usize>() {
            Ok(n) => Self::Index(n),
            Err(_) => Self::Name(value.to_string()),
        }
    }
}

/// A connection endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct Port {
    pub pos: Option<Coordinates>,
    pub area: f64,
    pub shape: String,
    pub label: String,
    pub style: Style,
    joins: BTreeSet<Uid>,
}

impl Default for Port {
    fn default() -> Self {
        Self {
            pos: None,
            area: DEFAULT_AREA,
            shape: String::new(),
            label: String::new(),
            style: Style::default(),
            joins: BTreeSet::new(),
        }
    }
}

impl Port {
    /// Identifiers of the entities meeting at this port.
    pub fn joins(&self) -> &BTreeSet<Uid> {
        &self.joins
    }

    /// Returns true when `uid` meets at this port.
    pub fn joins_with(&self, uid: &Uid) -> bool {
        self.joins.contains(uid)
    }

    /// Rendered thickness of a trail through this port.
    pub fn thickness(&self) -> f64 {
        self.area.sqrt()
    }
}

// =============================================================================
// Nodes and edges
// =============================================================================

/// A story beat.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    uid: Uid,
    pub style: Style,
    pub contents: Vec<String>,
    pub pos: Option<Coordinates>,
    pub area: f64,
    pub shape: String,
    pub label: String,
    /// Generation index, used as the layout column.
    pub zone: i64,
    /// Rendered footprint, assigned during layout.
    pub size: Size,
    ports: IndexMap<PortKey, PortId>,
}

impl Node {
    fn new(uid: Uid) -> Self {
        Self {
            uid,
            style: Style::default(),
            contents: Vec::new(),
            pos: None,
            area: DEFAULT_AREA,
            shape: String::new(),
            label: String::new(),
            zone: 0,
            size: Size::default(),
            ports: IndexMap::new(),
        }
    }

    pub fn uid(&self) -> &Uid {
        &self.uid
    }

    /// Port slots of this node, in insertion order.
    pub fn ports(&self) -> &IndexMap<PortKey, PortId> {
        &self.ports
    }

    pub fn set_label(&mut self, label: impl Into<String>) -> &mut Self {
        self.label = label.into();
        self
    }

    pub fn set_zone(&mut self, zone: i64) -> &mut Self {
        self.zone = zone;
        self
    }

    pub fn set_pos(&mut self, pos: Coordinates) -> &mut Self {
        self.pos = Some(pos);
        self
    }

    pub fn set_area(&mut self, area: f64) -> &mut Self {
        self.area = area;
        self
    }

    /// Side of the square glyph drawn for this node.
    pub fn glyph_size(&self) -> f64 {
        self.area.sqrt()
    }

    fn next_port_key(&self) -> PortKey {
        let mut n = self.ports.len();
        while self.ports.contains_key(&PortKey::Index(n)) {
            n += 1;
        }
        PortKey::Index(n)
    }
}

/// A transition between two nodes.
///
/// `ports()[0]` is the tail (exit) side and `ports()[1]` the head (entry)
/// side.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    uid: Uid,
    pub style: Style,
    pub contents: Vec<String>,
    pub label: String,
    /// Narrative thread this edge belongs to.
    pub trail: String,
    ports: [PortId; 2],
}

impl Edge {
    pub fn uid(&self) -> &Uid {
        &self.uid
    }

    pub fn ports(&self) -> [PortId; 2] {
        self.ports
    }

    pub fn tail(&self) -> PortId {
        self.ports[0]
    }

    pub fn head(&self) -> PortId {
        self.ports[1]
    }
}

/// Concrete type of an entity in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Node,
    Edge,
}

/// Reference to an entity tagged with its type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemRef<'a> {
    Node(&'a Uid),
    Edge(&'a Uid),
}

/// An entity taken out of the arena by [`Graph::remove`].
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Node(Node),
    Edge(Edge),
}

/// A point taking part in a [`Graph::spacing`] measurement.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Anchor {
    /// The position of a node itself.
    Node(Uid),
    /// The position of a port.
    Port(PortId),
    /// The foot of the normal from the n-th measured point onto an edge.
    Intercept(usize),
}

/// Pairwise distances keyed by (my point, their point).
pub type Spacing = IndexMap<(Anchor, Anchor), f64>;

// =============================================================================
// Arena
// =============================================================================

/// Owning store of every node, edge and port of one story graph.
///
/// Nodes and edges live in separate registries keyed by [`Uid`]; iteration
/// follows insertion order.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    scheme: IdScheme,
    next_serial: u64,
    next_port: usize,
    nodes: IndexMap<Uid, Node>,
    edges: IndexMap<Uid, Edge>,
    ports: IndexMap<PortId, Port>,
}

impl Graph {
    /// Creates an empty graph allocating serial identifiers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty graph allocating identifiers with `scheme`.
    pub fn with_scheme(scheme: IdScheme) -> Self {
        Self {
            scheme,
            ..Self::default()
        }
    }

    /// Allocates a fresh identifier.
    pub fn allocate_uid(&mut self) -> Uid {
        match self.scheme {
            IdScheme::Serial => {
                self.next_serial += 1;
                Uid::Serial(self.next_serial)
            }
            IdScheme::Uuid => Uid::Uuid(Uuid::new_v4()),
        }
    }

    /// Keeps the serial counter ahead of an identifier that arrived from data.
    fn observe_uid(&mut self, uid: &Uid) {
        if let Uid::Serial(n) = uid {
            self.next_serial = self.next_serial.max(*n);
        }
    }

    fn contains(&self, uid: &Uid) -> bool {
        self.nodes.contains_key(uid) || self.edges.contains_key(uid)
    }

    fn add_port(&mut self, port: Port) -> PortId {
        let id = PortId(self.next_port);
        self.next_port += 1;
        self.ports.insert(id, port);
        id
    }

    /// Adds a new node and returns it for further setup.
    pub fn add_node(&mut self) -> &mut Node {
        let uid = self.allocate_uid();
        self.nodes.entry(uid.clone()).or_insert(Node::new(uid))
    }

    /// Adds a node with a given identifier.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateUid`] when the identifier is taken.
    pub fn add_node_with_uid(&mut self, uid: Uid) -> Result<&mut Node, Error> {
        if self.contains(&uid) {
            return Err(Error::DuplicateUid(uid));
        }
        self.observe_uid(&uid);
        Ok(self.nodes.entry(uid.clone()).or_insert(Node::new(uid)))
    }

    /// Adds a new edge with two ports.
    ///
    /// With one position both ports start there; with two or more the first
    /// and last are used.
    pub fn add_edge(&mut self, pos: &[Coordinates]) -> Uid {
        let uid = self.allocate_uid();
        self.insert_edge(uid.clone(), pos);
        uid
    }

    fn insert_edge(&mut self, uid: Uid, pos: &[Coordinates]) -> &mut Edge {
        let mut ends = [pos.first().copied(), pos.last().copied()];
        if pos.is_empty() {
            ends = [None, None];
        }
        let ports = ends.map(|pos| {
            self.add_port(Port {
                pos,
                joins: BTreeSet::from([uid.clone()]),
                ..Port::default()
            })
        });
        self.edges.entry(uid.clone()).or_insert(Edge {
            uid,
            style: Style::default(),
            contents: Vec::new(),
            label: String::new(),
            trail: String::new(),
            ports,
        })
    }

    /// Connects `from` to `to` with an edge flowing from `from` into `to`.
    ///
    /// `from` is wired into the edge's tail port and `to` into its head port;
    /// each node gains a new port slot sharing that port. Explicit positions
    /// (first and last of `pos`) are set on the edge ports. An existing
    /// `edge` is reused instead of allocating a new one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownItem`] if either node or the reused edge is
    /// not in this graph.
    pub fn connect(
        &mut self,
        from: &Uid,
        to: &Uid,
        pos: &[Coordinates],
        edge: Option<&Uid>,
    ) -> Result<Uid, Error> {
        for uid in [from, to] {
            if !self.nodes.contains_key(uid) {
                return Err(Error::UnknownItem(uid.clone()));
            }
        }

        let edge_uid = match edge {
            Some(uid) if self.edges.contains_key(uid) => uid.clone(),
            Some(uid) => return Err(Error::UnknownItem(uid.clone())),
            None => self.add_edge(&[]),
        };
        let [tail, head] = self.edges[&edge_uid].ports;

        for (node_uid, port_id) in [(from, tail), (to, head)] {
            if let Some(port) = self.ports.get_mut(&port_id) {
                port.joins.insert(node_uid.clone());
            }
            if let Some(node) = self.nodes.get_mut(node_uid) {
                let key = node.next_port_key();
                node.ports.insert(key, port_id);
            }
        }

        if let (Some(first), Some(last)) = (pos.first(), pos.last()) {
            if let Some(port) = self.ports.get_mut(&tail) {
                port.pos = Some(*first);
            }
            if let Some(port) = self.ports.get_mut(&head) {
                port.pos = Some(*last);
            }
        }

        trace!(from:% = from, to:% = to, edge:% = edge_uid; "Connected nodes");
        Ok(edge_uid)
    }

    /// Removes an entity, detaching it from every port it meets at.
    ///
    /// Removing an edge also removes the port slots nodes held on it.
    pub fn remove(&mut self, uid: &Uid) -> Option<Item> {
        if let Some(edge) = self.edges.shift_remove(uid) {
            for port_id in edge.ports {
                self.ports.shift_remove(&port_id);
                for node in self.nodes.values_mut() {
                    node.ports.retain(|_, id| *id != port_id);
                }
            }
            return Some(Item::Edge(edge));
        }

        let node = self.nodes.shift_remove(uid)?;
        for port_id in node.ports.values() {
            let Some(port) = self.ports.get_mut(port_id) else {
                continue;
            };
            port.joins.remove(uid);
            let shared = port
                .joins
                .iter()
                .any(|other| self.edges.contains_key(other));
            if !shared {
                self.ports.shift_remove(port_id);
            }
        }
        Some(Item::Node(node))
    }

    // -------------------------------------------------------------------------
    // Access
    // -------------------------------------------------------------------------

    pub fn node(&self, uid: &Uid) -> Option<&Node> {
        self.nodes.get(uid)
    }

    pub fn node_mut(&mut self, uid: &Uid) -> Option<&mut Node> {
        self.nodes.get_mut(uid)
    }

    pub fn edge(&self, uid: &Uid) -> Option<&Edge> {
        self.edges.get(uid)
    }

    pub fn edge_mut(&mut self, uid: &Uid) -> Option<&mut Edge> {
        self.edges.get_mut(uid)
    }

    pub fn port(&self, id: PortId) -> Option<&Port> {
        self.ports.get(&id)
    }

    pub fn port_mut(&mut self, id: PortId) -> Option<&mut Port> {
        self.ports.get_mut(&id)
    }

    /// Resolves an identifier to its entity type.
    pub fn kind_of(&self, uid: &Uid) -> Option<ItemKind> {
        if self.nodes.contains_key(uid) {
            Some(ItemKind::Node)
        } else if self.edges.contains_key(uid) {
            Some(ItemKind::Edge)
        } else {
            None
        }
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Total number of nodes and edges.
    pub fn len(&self) -> usize {
        self.nodes.len() + self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    /// Ports of an edge as `[tail, head]`.
    pub fn edge_ports(&self, uid: &Uid) -> Option<[&Port; 2]> {
        let [tail, head] = self.edges.get(uid)?.ports;
        Some([self.ports.get(&tail)?, self.ports.get(&head)?])
    }

    // -------------------------------------------------------------------------
    // Derived adjacency
    // -------------------------------------------------------------------------

    /// Every edge meeting at any port of the node.
    pub fn edges_of(&self, node: &Uid) -> Vec<Uid> {
        let Some(node) = self.nodes.get(node) else {
            return Vec::new();
        };
        node.ports
            .values()
            .filter_map(|id| self.ports.get(id))
            .flat_map(|port| port.joins.iter())
            .filter(|uid| self.edges.contains_key(*uid))
            .cloned()
            .collect()
    }

    /// Nodes adjacent to `node` across its edges, never including `node`.
    pub fn nearby(&self, node: &Uid) -> Vec<Uid> {
        self.edges_of(node)
            .iter()
            .filter_map(|uid| self.edges.get(uid))
            .flat_map(|edge| edge.ports.iter())
            .filter_map(|id| self.ports.get(id))
            .flat_map(|port| port.joins.iter())
            .filter(|uid| *uid != node && self.nodes.contains_key(*uid))
            .cloned()
            .collect()
    }

    /// Edges of `node` split into (incoming, outgoing) by the port slot the
    /// node occupies on each edge.
    pub fn connections(&self, node: &Uid) -> (Vec<Uid>, Vec<Uid>) {
        let mut incoming = Vec::new();
        let mut outgoing = Vec::new();
        for uid in self.edges_of(node) {
            let Some([tail, head]) = self.edge_ports(&uid) else {
                continue;
            };
            if head.joins_with(node) && !incoming.contains(&uid) {
                incoming.push(uid.clone());
            }
            if tail.joins_with(node) && !outgoing.contains(&uid) {
                outgoing.push(uid);
            }
        }
        (incoming, outgoing)
    }

    /// Nodes with outgoing edges and no incoming ones.
    pub fn initial(&self) -> Vec<Uid> {
        self.nodes
            .keys()
            .filter(|uid| {
                let (incoming, outgoing) = self.connections(uid);
                incoming.is_empty() && !outgoing.is_empty()
            })
            .cloned()
            .collect()
    }

    /// Nodes with incoming edges and no outgoing ones.
    pub fn terminal(&self) -> Vec<Uid> {
        self.nodes
            .keys()
            .filter(|uid| {
                let (incoming, outgoing) = self.connections(uid);
                !incoming.is_empty() && outgoing.is_empty()
            })
            .cloned()
            .collect()
    }

    // -------------------------------------------------------------------------
    // Geometry
    // -------------------------------------------------------------------------

    /// The node's own position followed by each of its port positions.
    fn points_of(&self, node: &Node) -> Vec<(Anchor, Option<Coordinates>)> {
        std::iter::once((Anchor::Node(node.uid.clone()), node.pos))
            .chain(node.ports.values().map(|id| {
                (
                    Anchor::Port(*id),
                    self.ports.get(id).and_then(|port| port.pos),
                )
            }))
            .collect()
    }

    /// Distances from every point of `node` to every point of `other`.
    ///
    /// Against another node, both sides contribute the node position and its
    /// port positions. Against an edge, the other side is the edge's two
    /// ports plus the normal intercept of each of this node's points on the
    /// edge's line. Pairs with an unset position are left out.
    pub fn spacing(&self, node: &Uid, other: ItemRef<'_>) -> Spacing {
        let mut rv = Spacing::new();
        let Some(node) = self.nodes.get(node) else {
            return rv;
        };
        let mine = self.points_of(node);

        let theirs: Vec<(Anchor, Option<Coordinates>)> = match other {
            ItemRef::Node(uid) => match self.nodes.get(uid) {
                Some(other) => self.points_of(other),
                None => return rv,
            },
            ItemRef::Edge(uid) => {
                let Some(edge) = self.edges.get(uid) else {
                    return rv;
                };
                let ends = edge.ports.map(|id| self.ports.get(&id).and_then(|port| port.pos));
                let mut points: Vec<_> = edge
                    .ports
                    .iter()
                    .zip(ends)
                    .map(|(id, pos)| (Anchor::Port(*id), pos))
                    .collect();
                if let [Some(origin), Some(transit)] = ends {
                    points.extend(mine.iter().enumerate().map(|(n, (_, pos))| {
                        (
                            Anchor::Intercept(n),
                            pos.map(|pos| Coordinates::intercept(origin, transit, pos)),
                        )
                    }));
                }
                points
            }
        };

        for (my_anchor, my_pos) in &mine {
            let Some(my_pos) = my_pos else { continue };
            for (their_anchor, their_pos) in &theirs {
                let Some(their_pos) = their_pos else { continue };
                rv.insert(
                    (my_anchor.clone(), their_anchor.clone()),
                    (*their_pos - *my_pos).magnitude(),
                );
            }
        }
        rv
    }

    /// Moves a node and every port it holds by `offset`.
    pub fn translate(&mut self, uid: &Uid, offset: Coordinates) {
        let Some(node) = self.nodes.get_mut(uid) else {
            warn!(uid:% = uid; "Cannot translate unknown node");
            return;
        };
        node.pos = node.pos.map(|pos| pos + offset);
        for id in node.ports.values() {
            if let Some(port) = self.ports.get_mut(id) {
                port.pos = port.pos.map(|pos| pos + offset);
            }
        }
    }

    // -------------------------------------------------------------------------
    // Record support
    // -------------------------------------------------------------------------

    /// Inserts an edge with explicit ports, sharing any port a named node
    /// already holds with the same joins.
    pub(crate) fn insert_edge_with_ports(
        &mut self,
        uid: Uid,
        ports: [(Option<Coordinates>, BTreeSet<Uid>); 2],
    ) -> Result<&mut Edge, Error> {
        if self.contains(&uid) {
            return Err(Error::DuplicateUid(uid));
        }
        self.observe_uid(&uid);

        let ids = ports.map(|(pos, mut joins)| {
            joins.insert(uid.clone());
            self.shared_port(&joins, pos)
                .unwrap_or_else(|| self.add_port(Port { pos, joins, ..Port::default() }))
        });
        Ok(self.edges.entry(uid.clone()).or_insert(Edge {
            uid,
            style: Style::default(),
            contents: Vec::new(),
            label: String::new(),
            trail: String::new(),
            ports: ids,
        }))
    }

    /// Attaches a port slot to a node, sharing the matching edge port when one
    /// exists.
    pub(crate) fn attach_port(
        &mut self,
        node: &Uid,
        key: PortKey,
        pos: Option<Coordinates>,
        mut joins: BTreeSet<Uid>,
    ) -> Result<PortId, Error> {
        if !self.nodes.contains_key(node) {
            return Err(Error::UnknownItem(node.clone()));
        }
        joins.insert(node.clone());
        let id = self
            .shared_port(&joins, pos)
            .unwrap_or_else(|| self.add_port(Port { pos, joins, ..Port::default() }));
        if let Some(node) = self.nodes.get_mut(node) {
            node.ports.insert(key, id);
        }
        Ok(id)
    }

    /// Finds an existing port with exactly these joins, filling in its
    /// position when it has none.
    fn shared_port(&mut self, joins: &BTreeSet<Uid>, pos: Option<Coordinates>) -> Option<PortId> {
        let id = self
            .ports
            .iter()
            .find(|(_, port)| port.joins == *joins)
            .map(|(id, _)| *id)?;
        if let Some(port) = self.ports.get_mut(&id) {
            port.pos = port.pos.or(pos);
        }
        Some(id)
    }
}
