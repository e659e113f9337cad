//! Graph-growth motifs and the operator scheduler.
//!
//! A [`Motif`] is one narrative-branching pattern applied to a [`Graph`]:
//! it inspects the current frontier, adds new nodes and edges in place and
//! returns their identifiers in creation order. Every motif respects the
//! entity `limit` of its [`Growth`] parameters exactly, so the caller can
//! hand it the remaining budget.
//!
//! The [`Scheduler`] maps the completion ratio of a build to a weighted set
//! of motifs. Early buckets favour expansion, middle buckets wander and the
//! last bucket converges.

use std::fmt;

use log::{debug, trace, warn};
use rand::{
    Rng,
    distr::{Distribution, weighted::WeightedIndex},
    seq::{IndexedRandom, SliceRandom},
};

use plotlines_core::{graph::Graph, identifier::Uid};

/// Parameters shared by every motif invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Growth {
    /// Maximum number of new entities this invocation may add.
    pub limit: usize,
    /// Grow forwards (edges leave the frontier) or backwards (edges enter it).
    pub fwd: bool,
    /// Per-node budget of connections on the growth side.
    pub exits: usize,
}

impl Growth {
    pub fn new(limit: usize, fwd: bool, exits: usize) -> Self {
        Self { limit, fwd, exits }
    }
}

/// A named graph-growth operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Motif {
    Fork,
    Join,
    Link,
    Loop,
}

impl fmt::Display for Motif {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Fork => "fork",
            Self::Join => "join",
            Self::Link => "link",
            Self::Loop => "loop",
        };
        write!(f, "{name}")
    }
}

/// Number of connections `uid` has on the growth side.
fn growth_degree(graph: &Graph, uid: &Uid, fwd: bool) -> usize {
    let (incoming, outgoing) = graph.connections(uid);
    if fwd { outgoing.len() } else { incoming.len() }
}

/// Nodes with no connection on the growth side.
fn frontier(graph: &Graph, fwd: bool) -> Vec<Uid> {
    graph
        .nodes()
        .map(|node| node.uid())
        .filter(|uid| growth_degree(graph, uid, fwd) == 0)
        .cloned()
        .collect()
}

fn zone_of(graph: &Graph, uid: &Uid) -> i64 {
    graph.node(uid).map(|node| node.zone).unwrap_or_default()
}

fn next_zone(zone: i64, fwd: bool) -> i64 {
    if fwd { zone + 1 } else { zone - 1 }
}

/// Connects `from` to `to` and returns the new edge, logging the failure
/// when either end has left the graph.
fn wire(graph: &mut Graph, from: &Uid, to: &Uid) -> Option<Uid> {
    match graph.connect(from, to, &[], None) {
        Ok(edge) => Some(edge),
        Err(err) => {
            warn!(from:% = from, to:% = to, err:%; "Skipping connection");
            None
        }
    }
}

/// Connects a frontier `anchor` with a node grown beyond it.
fn grow(graph: &mut Graph, anchor: &Uid, grown: &Uid, fwd: bool) -> Option<Uid> {
    if fwd {
        wire(graph, anchor, grown)
    } else {
        wire(graph, grown, anchor)
    }
}

impl Motif {
    /// Applies this motif and returns the new entities.
    pub fn apply<R: Rng + ?Sized>(self, graph: &mut Graph, rng: &mut R, growth: Growth) -> Vec<Uid> {
        match self {
            Self::Fork => Self::fork(graph, rng, growth),
            Self::Join => Self::join(graph, rng, growth),
            Self::Link => Self::link(graph, rng, growth),
            Self::Loop => Self::close_loop(graph, rng, growth),
        }
    }

    /// Gives every frontier node `exits` new leaves.
    ///
    /// Frontier nodes are visited in random order. Each leaf costs two
    /// entities, a node and its edge, and is placed one zone beyond its
    /// anchor.
    pub fn fork<R: Rng + ?Sized>(graph: &mut Graph, rng: &mut R, growth: Growth) -> Vec<Uid> {
        let Growth { limit, fwd, exits } = growth;
        let mut open = frontier(graph, fwd);
        open.shuffle(rng);

        let mut rv = Vec::new();
        for anchor in open {
            let zone = next_zone(zone_of(graph, &anchor), fwd);
            for _ in 0..exits {
                if rv.len() + 2 > limit {
                    return rv;
                }
                let leaf = graph.add_node().set_zone(zone).uid().clone();
                rv.push(leaf.clone());
                rv.extend(grow(graph, &anchor, &leaf, fwd));
            }
        }
        rv
    }

    /// Merges pairs of frontier nodes into fresh nodes.
    ///
    /// Once fewer than two candidates remain, the last merged node takes on
    /// leftovers up to its exit budget.
    pub fn join<R: Rng + ?Sized>(graph: &mut Graph, rng: &mut R, growth: Growth) -> Vec<Uid> {
        let Growth { limit, fwd, exits } = growth;
        let mut candidates = frontier(graph, fwd);
        candidates.shuffle(rng);

        let mut rv = Vec::new();
        let mut last: Option<(Uid, usize)> = None;
        while candidates.len() >= 2 && rv.len() + 3 <= limit {
            let picked: Vec<Uid> = candidates.drain(..2).collect();
            let zones = picked.iter().map(|uid| zone_of(graph, uid));
            let extreme = if fwd { zones.max() } else { zones.min() };
            let zone = next_zone(extreme.unwrap_or_default(), fwd);

            let node = graph.add_node().set_zone(zone).uid().clone();
            rv.push(node.clone());
            for member in &picked {
                rv.extend(grow(graph, member, &node, fwd));
            }
            last = Some((node, picked.len()));
        }

        if let Some((node, joined)) = last {
            for member in candidates.iter().take(exits.saturating_sub(joined)) {
                if rv.len() + 1 > limit {
                    break;
                }
                rv.extend(grow(graph, member, &node, fwd));
            }
        }
        rv
    }

    /// Inserts detours: a connected node gains a new neighbour which leads
    /// on to one of the node's existing neighbours.
    pub fn link<R: Rng + ?Sized>(graph: &mut Graph, rng: &mut R, growth: Growth) -> Vec<Uid> {
        let Growth { limit, fwd, .. } = growth;
        let connected: Vec<Uid> = graph
            .nodes()
            .map(|node| node.uid())
            .filter(|uid| growth_degree(graph, uid, fwd) > 0)
            .cloned()
            .collect();

        let mut rv = Vec::new();
        for _ in 0..connected.len() {
            if rv.len() + 3 > limit {
                break;
            }
            let Some(node) = connected.choose(rng) else {
                break;
            };
            let nearby = graph.nearby(node);
            let Some(other) = nearby.choose(rng) else {
                continue;
            };

            let zone = next_zone(zone_of(graph, node), fwd);
            let detour = graph.add_node().set_zone(zone).uid().clone();
            rv.push(detour.clone());
            rv.extend(grow(graph, node, &detour, fwd));
            rv.extend(grow(graph, &detour, other, fwd));
        }
        rv
    }

    /// Connects one frontier node back to one of its neighbours, closing a
    /// cycle without adding nodes.
    pub fn close_loop<R: Rng + ?Sized>(graph: &mut Graph, rng: &mut R, growth: Growth) -> Vec<Uid> {
        if growth.limit == 0 {
            return Vec::new();
        }
        let leaves: Vec<Uid> = frontier(graph, growth.fwd)
            .into_iter()
            .filter(|uid| !graph.nearby(uid).is_empty())
            .collect();
        let Some(leaf) = leaves.choose(rng) else {
            return Vec::new();
        };
        let nearby = graph.nearby(leaf);
        let Some(other) = nearby.choose(rng) else {
            return Vec::new();
        };
        grow(graph, leaf, other, growth.fwd).into_iter().collect()
    }

    /// Adds the fixed five-node diamond: a start, a split into two branches
    /// and a merge into one end. Returns the nodes followed by the edges.
    pub fn diamond(graph: &mut Graph, zone: i64) -> Vec<Uid> {
        let nodes: Vec<Uid> = (0..5)
            .map(|n| graph.add_node().set_zone(zone + n).uid().clone())
            .collect();
        let edges: Vec<Uid> = [(0, 1), (1, 2), (1, 3), (2, 4), (3, 4)]
            .into_iter()
            .filter_map(|(a, b)| wire(graph, &nodes[a], &nodes[b]))
            .collect();
        nodes.into_iter().chain(edges).collect()
    }
}

/// One row of the scheduler table.
#[derive(Debug, Clone, PartialEq)]
pub struct Bucket {
    /// Highest completion ratio this bucket serves.
    pub threshold: f64,
    /// Eligible motifs and their relative weights.
    pub motifs: Vec<(Motif, u32)>,
}

impl Bucket {
    pub fn new(threshold: f64, motifs: impl Into<Vec<(Motif, u32)>>) -> Self {
        Self {
            threshold,
            motifs: motifs.into(),
        }
    }
}

/// Picks a motif from the completion ratio and keeps a history of what it
/// ran.
///
/// # Examples
///
/// ```
/// use plotlines::motif::{Motif, Scheduler};
///
/// let scheduler = Scheduler::default();
/// assert_eq!(scheduler.bucket(0.1).unwrap().motifs, vec![(Motif::Fork, 1)]);
/// assert_eq!(scheduler.bucket(0.9).unwrap().motifs, vec![(Motif::Join, 1)]);
/// assert_eq!(scheduler.bucket(4.0).unwrap().motifs, vec![(Motif::Join, 1)]);
/// ```
#[derive(Debug, Clone)]
pub struct Scheduler {
    table: Vec<Bucket>,
    history: Vec<(Motif, usize)>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(vec![
            Bucket::new(0.2, [(Motif::Fork, 1)]),
            Bucket::new(0.6, [(Motif::Fork, 2), (Motif::Link, 1), (Motif::Loop, 1)]),
            Bucket::new(1.0, [(Motif::Join, 1)]),
        ])
    }
}

impl Scheduler {
    /// Creates a scheduler over `table`, ordered by threshold.
    pub fn new(mut table: Vec<Bucket>) -> Self {
        table.sort_by(|a, b| a.threshold.total_cmp(&b.threshold));
        Self {
            table,
            history: Vec::new(),
        }
    }

    /// The bucket with the smallest threshold not below `ratio`, saturating
    /// at the last bucket.
    pub fn bucket(&self, ratio: f64) -> Option<&Bucket> {
        self.table
            .iter()
            .find(|bucket| bucket.threshold >= ratio)
            .or_else(|| self.table.last())
    }

    /// Samples a motif from the bucket serving `ratio`.
    pub fn choose<R: Rng + ?Sized>(&self, ratio: f64, rng: &mut R) -> Option<Motif> {
        let bucket = self.bucket(ratio)?;
        let weights = WeightedIndex::new(bucket.motifs.iter().map(|(_, weight)| *weight)).ok()?;
        Some(bucket.motifs[weights.sample(rng)].0)
    }

    /// Runs one scheduler step and records it in the history.
    pub fn apply<R: Rng + ?Sized>(
        &mut self,
        graph: &mut Graph,
        rng: &mut R,
        ratio: f64,
        growth: Growth,
    ) -> Vec<Uid> {
        let Some(motif) = self.choose(ratio, rng) else {
            warn!(ratio; "No motif eligible");
            return Vec::new();
        };
        let rv = motif.apply(graph, rng, growth);
        debug!(motif:% = motif, ratio, limit = growth.limit, count = rv.len(); "Applied motif");
        trace!(items:? = rv; "Motif output");
        self.history.push((motif, rv.len()));
        rv
    }

    /// Every motif run so far with the number of entities it produced.
    pub fn history(&self) -> &[(Motif, usize)] {
        &self.history
    }
}
