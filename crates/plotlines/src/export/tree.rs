//! A directory of TOML pages for static-site processing.
//!
//! The tree holds an `index.toml` listing every node and edge as a card,
//! plus one page per entity named after its identifier. Node pages link to
//! each outgoing edge, classed by the edge's trail; edge pages link to the
//! node they lead into. Page bodies carry the entity's text contents.

use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::Serialize;

use plotlines_core::{
    graph::{Edge, Graph, Node},
    identifier::Uid,
};

use crate::{
    board::Board,
    export::{self, Exporter},
};

#[derive(Debug, Serialize)]
struct Page {
    metadata: Metadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    base: Option<Section>,
    doc: Section,
}

#[derive(Debug, Serialize)]
struct Metadata {
    title: String,
}

#[derive(Debug, Default, Serialize)]
struct Section {
    html: Html,
}

#[derive(Debug, Default, Serialize)]
struct Html {
    body: Body,
}

#[derive(Debug, Default, Serialize)]
struct Body {
    #[serde(skip_serializing_if = "Option::is_none")]
    header: Option<Nav>,
    #[serde(skip_serializing_if = "Option::is_none")]
    main: Option<Main>,
    #[serde(skip_serializing_if = "Option::is_none")]
    footer: Option<Nav>,
}

#[derive(Debug, Serialize)]
struct Main {
    blocks: String,
}

#[derive(Debug, Serialize)]
struct Nav {
    nav: NavList,
}

#[derive(Debug, Serialize)]
struct NavList {
    ul: Items,
}

#[derive(Debug, Serialize)]
struct Items {
    li: Vec<Link>,
}

#[derive(Debug, Serialize)]
struct Link {
    attrib: Attrib,
    a: String,
}

#[derive(Debug, Serialize)]
struct Attrib {
    class: String,
    href: String,
}

impl Nav {
    fn new(li: Vec<Link>) -> Self {
        Self {
            nav: NavList { ul: Items { li } },
        }
    }
}

impl Link {
    fn new(class: &str, uid: &Uid, text: &str) -> Self {
        Self {
            attrib: Attrib {
                class: class.to_string(),
                href: format!("{uid}.html"),
            },
            a: text.to_string(),
        }
    }
}

fn text_or<'a>(text: &'a str, fallback: &'a str) -> &'a str {
    if text.is_empty() { fallback } else { text }
}

/// Page body for an entity, left out when it has no contents.
fn blocks(contents: &[String]) -> Option<Main> {
    (!contents.is_empty()).then(|| Main {
        blocks: contents.join("\n"),
    })
}

/// Writes a board as a tree of TOML pages.
#[derive(Debug, Clone)]
pub struct Tree {
    parent: PathBuf,
}

impl Tree {
    /// Creates a tree exporter writing into the directory `parent`.
    pub fn new(parent: impl AsRef<Path>) -> Self {
        Self {
            parent: parent.as_ref().to_path_buf(),
        }
    }

    /// Renders every page of the tree as `(path, text)` pairs, index first.
    ///
    /// # Errors
    ///
    /// Returns [`export::Error::Render`] if a page cannot be serialized.
    pub fn pages(&self, board: &Board) -> Result<Vec<(PathBuf, String)>, export::Error> {
        let graph = board.graph();
        let mut rv = vec![(self.parent.join("index.toml"), render(&index(board))?)];

        for node in graph.nodes() {
            let page = node_page(graph, node);
            rv.push((self.page_path(node.uid()), render(&page)?));
        }
        for edge in graph.edges() {
            let page = edge_page(graph, edge);
            rv.push((self.page_path(edge.uid()), render(&page)?));
        }
        debug!(pages = rv.len(); "Rendered page tree");
        Ok(rv)
    }

    fn page_path(&self, uid: &Uid) -> PathBuf {
        self.parent.join(format!("{uid}.toml"))
    }
}

fn render(page: &Page) -> Result<String, export::Error> {
    toml::to_string(page).map_err(|err| export::Error::Render(err.to_string()))
}

fn index(board: &Board) -> Page {
    let graph = board.graph();
    let cards = graph
        .nodes()
        .map(|node| Link::new("card", node.uid(), text_or(&node.label, "Node")))
        .chain(
            graph
                .edges()
                .map(|edge| Link::new("card", edge.uid(), text_or(&edge.label, "Edge"))),
        )
        .collect();

    let mut start = board.initial();
    if start.is_empty() {
        start.extend(graph.nodes().next().map(|node| node.uid().clone()));
    }
    let start = start
        .iter()
        .map(|uid| {
            let label = graph.node(uid).map_or("", |node| node.label.as_str());
            Link::new("next", uid, text_or(label, "Start"))
        })
        .collect();

    Page {
        metadata: Metadata {
            title: board.title().to_string(),
        },
        base: Some(Section {
            html: Html {
                body: Body {
                    header: Some(Nav::new(cards)),
                    ..Body::default()
                },
            },
        }),
        doc: Section {
            html: Html {
                body: Body {
                    footer: Some(Nav::new(start)),
                    ..Body::default()
                },
            },
        },
    }
}

fn node_page(graph: &Graph, node: &Node) -> Page {
    let (_, outgoing) = graph.connections(node.uid());
    let links = outgoing
        .iter()
        .filter_map(|uid| graph.edge(uid))
        .map(|edge| {
            Link::new(
                text_or(&edge.trail, "next"),
                edge.uid(),
                text_or(&edge.label, "Next"),
            )
        })
        .collect();

    Page {
        metadata: Metadata {
            title: text_or(&node.label, &node.uid().to_string()).to_string(),
        },
        base: None,
        doc: Section {
            html: Html {
                body: Body {
                    header: None,
                    main: blocks(&node.contents),
                    footer: Some(Nav::new(links)),
                },
            },
        },
    }
}

fn edge_page(graph: &Graph, edge: &Edge) -> Page {
    let links = graph
        .port(edge.head())
        .into_iter()
        .flat_map(|port| port.joins().iter())
        .filter_map(|uid| graph.node(uid))
        .map(|node| Link::new("next", node.uid(), text_or(&node.label, "Next")))
        .collect();

    Page {
        metadata: Metadata {
            title: text_or(&edge.label, &edge.uid().to_string()).to_string(),
        },
        base: None,
        doc: Section {
            html: Html {
                body: Body {
                    header: None,
                    main: blocks(&edge.contents),
                    footer: Some(Nav::new(links)),
                },
            },
        },
    }
}

impl Exporter for Tree {
    fn export_board(&mut self, board: &Board) -> Result<(), export::Error> {
        std::fs::create_dir_all(&self.parent).map_err(export::Error::Io)?;
        let pages = self.pages(board)?;
        for (path, text) in &pages {
            export::write_text(path, text)?;
        }
        info!(parent:? = self.parent, pages = pages.len(); "Page tree written");
        Ok(())
    }
}
