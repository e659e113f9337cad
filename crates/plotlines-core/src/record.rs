//! Structured records for graph entities.
//!
//! A record is the plain-data form of a [`Node`](crate::graph::Node) or
//! [`Edge`](crate::graph::Edge): every field is owned, identifiers are kept
//! in their serialized shape and port joins are listed in sorted order. The
//! [`Graph`] converts entities to records (`node_record`, `edge_record`,
//! `item_toml`) and builds entities back from them (`build_node`,
//! `build_edge`). Building re-types every join identifier through
//! [`RawUid::resolve`](crate::identifier::RawUid::resolve) and shares a port
//! between a node and an edge whenever both name the same joins.

use std::collections::BTreeSet;

use indexmap::IndexMap;
use log::{trace, warn};
use serde::{Deserialize, Serialize};

use crate::{
    error::Error,
    geometry::Coordinates,
    graph::{DEFAULT_AREA, Graph, PortId, PortKey},
    identifier::Uid,
    style::Style,
};

fn default_area() -> f64 {
    DEFAULT_AREA
}

fn is_default_area(area: &f64) -> bool {
    *area == DEFAULT_AREA
}

/// One endpoint in a record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pos: Option<Coordinates>,
    #[serde(default)]
    pub joins: Vec<Uid>,
}

/// Plain-data form of a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub uid: Uid,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub label: String,
    #[serde(default)]
    pub zone: i64,
    #[serde(default = "default_area", skip_serializing_if = "is_default_area")]
    pub area: f64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub shape: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pos: Option<Coordinates>,
    #[serde(default)]
    pub contents: Vec<String>,
    #[serde(default)]
    pub style: Style,
    #[serde(default)]
    pub ports: IndexMap<String, PortRecord>,
}

/// Plain-data form of an edge. `ports` must hold exactly two entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub uid: Uid,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub label: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub trail: String,
    #[serde(default)]
    pub contents: Vec<String>,
    #[serde(default)]
    pub style: Style,
    #[serde(default)]
    pub ports: Vec<PortRecord>,
}

impl NodeRecord {
    pub fn to_toml(&self) -> Result<String, Error> {
        Ok(toml::to_string(self)?)
    }

    pub fn from_toml(text: &str) -> Result<Self, Error> {
        Ok(toml::from_str(text)?)
    }
}

impl EdgeRecord {
    pub fn to_toml(&self) -> Result<String, Error> {
        Ok(toml::to_string(self)?)
    }

    pub fn from_toml(text: &str) -> Result<Self, Error> {
        Ok(toml::from_str(text)?)
    }
}

/// Joins as they are restored into the arena.
fn resolve_joins(owner: &Uid, joins: &[Uid]) -> BTreeSet<Uid> {
    for uid in joins.iter().filter(|uid| uid.is_name()) {
        warn!(owner:% = owner, join:% = uid; "Join kept as an external reference");
    }
    joins.iter().cloned().collect()
}

impl Graph {
    fn port_record(&self, id: PortId) -> PortRecord {
        match self.port(id) {
            Some(port) => PortRecord {
                pos: port.pos,
                joins: port.joins().iter().cloned().collect(),
            },
            None => PortRecord::default(),
        }
    }

    /// Captures a node as a record.
    pub fn node_record(&self, uid: &Uid) -> Option<NodeRecord> {
        let node = self.node(uid)?;
        Some(NodeRecord {
            uid: node.uid().clone(),
            label: node.label.clone(),
            zone: node.zone,
            area: node.area,
            shape: node.shape.clone(),
            pos: node.pos,
            contents: node.contents.clone(),
            style: node.style,
            ports: node
                .ports()
                .iter()
                .map(|(key, id)| (key.to_string(), self.port_record(*id)))
                .collect(),
        })
    }

    /// Captures an edge as a record.
    pub fn edge_record(&self, uid: &Uid) -> Option<EdgeRecord> {
        let edge = self.edge(uid)?;
        Some(EdgeRecord {
            uid: edge.uid().clone(),
            label: edge.label.clone(),
            trail: edge.trail.clone(),
            contents: edge.contents.clone(),
            style: edge.style,
            ports: edge.ports().iter().map(|id| self.port_record(*id)).collect(),
        })
    }

    /// Serializes any entity as TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownItem`] when the identifier is not in the
    /// arena.
    pub fn item_toml(&self, uid: &Uid) -> Result<String, Error> {
        if let Some(record) = self.node_record(uid) {
            record.to_toml()
        } else if let Some(record) = self.edge_record(uid) {
            record.to_toml()
        } else {
            Err(Error::UnknownItem(uid.clone()))
        }
    }

    /// Restores a node from its record.
    pub fn build_node(&mut self, record: NodeRecord) -> Result<Uid, Error> {
        let NodeRecord {
            uid,
            label,
            zone,
            area,
            shape,
            pos,
            contents,
            style,
            ports,
        } = record;

        let node = self.add_node_with_uid(uid.clone())?;
        node.label = label;
        node.zone = zone;
        node.area = area;
        node.shape = shape;
        node.pos = pos;
        node.contents = contents;
        node.style = style;

        for (key, port) in ports {
            let joins = resolve_joins(&uid, &port.joins);
            self.attach_port(&uid, PortKey::from(key.as_str()), port.pos, joins)?;
        }
        trace!(uid:% = uid; "Built node");
        Ok(uid)
    }

    /// Restores an edge from its record.
    pub fn build_edge(&mut self, record: EdgeRecord) -> Result<Uid, Error> {
        let EdgeRecord {
            uid,
            label,
            trail,
            contents,
            style,
            ports,
        } = record;

        let [tail, head]: [PortRecord; 2] =
            ports.try_into().map_err(|ports: Vec<PortRecord>| Error::EdgePorts {
                uid: uid.clone(),
                count: ports.len(),
            })?;
        let ends = [tail, head].map(|port| (port.pos, resolve_joins(&uid, &port.joins)));

        let edge = self.insert_edge_with_ports(uid.clone(), ends)?;
        edge.label = label;
        edge.trail = trail;
        edge.contents = contents;
        edge.style = style;
        trace!(uid:% = uid; "Built edge");
        Ok(uid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{color::Rgb, graph::ItemRef};

    fn sample() -> (Graph, Uid, Uid, Uid) {
        let mut graph = Graph::new();
        let a = graph
            .add_node()
            .set_label("gate")
            .set_zone(2)
            .set_pos(Coordinates::new(1.0, 3.0))
            .uid()
            .clone();
        let b = graph.add_node().uid().clone();
        let edge = graph
            .connect(&a, &b, &[Coordinates::new(2.0, 3.0), Coordinates::new(8.0, 3.0)], None)
            .unwrap();
        if let Some(node) = graph.node_mut(&a) {
            node.style = Style::default().with_stroke(Rgb::new(200, 0, 0)).with_weight(3);
            node.contents.push("A gate in the hills.".to_string());
        }
        if let Some(edge) = graph.edge_mut(&edge) {
            edge.trail = "west road".to_string();
        }
        (graph, a, b, edge)
    }

    #[test]
    fn test_node_toml_text() {
        let (graph, a, ..) = sample();
        let text = graph.item_toml(&a).unwrap();
        assert!(text.contains("uid = 1"), "{text}");
        assert!(text.contains("label = \"gate\""), "{text}");
        assert!(text.contains("[style]"), "{text}");
        assert!(text.contains("[ports.0]"), "{text}");
    }

    #[test]
    fn test_node_round_trip() {
        let (graph, a, ..) = sample();
        let record = graph.node_record(&a).unwrap();
        let parsed = NodeRecord::from_toml(&record.to_toml().unwrap()).unwrap();

        let mut rebuilt = Graph::new();
        let uid = rebuilt.build_node(parsed).unwrap();
        assert_eq!(uid, a);
        assert_eq!(rebuilt.node_record(&uid).unwrap(), record);
    }

    #[test]
    fn test_edge_round_trip() {
        let (graph, _, _, edge) = sample();
        let record = graph.edge_record(&edge).unwrap();
        let parsed = EdgeRecord::from_toml(&record.to_toml().unwrap()).unwrap();

        let mut rebuilt = Graph::new();
        let uid = rebuilt.build_edge(parsed).unwrap();
        assert_eq!(rebuilt.edge_record(&uid).unwrap(), record);
        assert_eq!(rebuilt.edge(&uid).unwrap().trail, "west road");
    }

    #[test]
    fn test_rebuilt_graph_shares_ports() {
        let (graph, a, b, edge) = sample();
        let mut rebuilt = Graph::new();
        rebuilt.build_edge(graph.edge_record(&edge).unwrap()).unwrap();
        rebuilt.build_node(graph.node_record(&a).unwrap()).unwrap();
        rebuilt.build_node(graph.node_record(&b).unwrap()).unwrap();

        assert_eq!(rebuilt.nearby(&a), vec![b.clone()]);
        assert_eq!(rebuilt.connections(&b).0, vec![edge.clone()]);
        assert_eq!(
            rebuilt.spacing(&a, ItemRef::Node(&a)).len(),
            graph.spacing(&a, ItemRef::Node(&a)).len()
        );
    }

    #[test]
    fn test_nodes_first_also_share_ports() {
        let (graph, a, b, edge) = sample();
        let mut rebuilt = Graph::new();
        rebuilt.build_node(graph.node_record(&a).unwrap()).unwrap();
        rebuilt.build_node(graph.node_record(&b).unwrap()).unwrap();
        rebuilt.build_edge(graph.edge_record(&edge).unwrap()).unwrap();

        let [tail, head] = rebuilt.edge(&edge).unwrap().ports();
        assert!(rebuilt.node(&a).unwrap().ports().values().any(|id| *id == tail));
        assert!(rebuilt.node(&b).unwrap().ports().values().any(|id| *id == head));
    }

    #[test]
    fn test_build_from_raw_text() {
        let text = r#"
            uid = "ending_01"
            label = "ending_01"
            pos = [10, 20]

            [style]
            stroke = [0, 0, 255]

            [ports.exit]
            pos = [12, 20]
            joins = ["ending_01", 7]
        "#;
        let mut graph = Graph::new();
        let uid = graph.build_node(NodeRecord::from_toml(text).unwrap()).unwrap();
        assert_eq!(uid, Uid::Name("ending_01".to_string()));

        let node = graph.node(&uid).unwrap();
        assert_eq!(node.style.stroke, Rgb::new(0, 0, 255));
        assert_eq!(node.area, DEFAULT_AREA);
        let id = node.ports()[&PortKey::Name("exit".to_string())];
        let port = graph.port(id).unwrap();
        assert!(port.joins_with(&Uid::Serial(7)));
        assert_eq!(port.pos, Some(Coordinates::new(12.0, 20.0)));
    }

    #[test]
    fn test_build_edge_with_wrong_port_count() {
        let record = EdgeRecord {
            uid: Uid::Serial(3),
            label: String::new(),
            trail: String::new(),
            contents: Vec::new(),
            style: Style::default(),
            ports: vec![PortRecord::default()],
        };
        let mut graph = Graph::new();
        assert!(matches!(
            graph.build_edge(record),
            Err(Error::EdgePorts { count: 1, .. })
        ));
    }

    #[test]
    fn test_build_duplicate_uid() {
        let (mut graph, a, ..) = sample();
        let record = graph.node_record(&a).unwrap();
        assert!(matches!(graph.build_node(record), Err(Error::DuplicateUid(_))));
    }

    #[test]
    fn test_serial_counter_follows_built_ids() {
        let mut graph = Graph::new();
        let text = "uid = 41";
        graph.build_node(NodeRecord::from_toml(text).unwrap()).unwrap();
        assert_eq!(graph.add_node().uid(), &Uid::Serial(42));
    }

    #[test]
    fn test_unknown_item_toml() {
        let graph = Graph::new();
        assert!(matches!(
            graph.item_toml(&Uid::Serial(9)),
            Err(Error::UnknownItem(_))
        ));
    }
}
