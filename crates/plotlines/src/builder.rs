//! Incremental story-graph generation.
//!
//! [`GraphBuilder`] seeds a set of ending nodes and then drives the
//! [`Scheduler`] one step at a time until the node and edge budget is spent
//! or the step ceiling is reached. It is an [`Iterator`] over the
//! identifiers of new entities: each step runs one motif to completion
//! before any of its output is handed out, so the graph is consistent at
//! every point where the caller may stop pulling.

use std::collections::{BTreeMap, VecDeque};

use log::{debug, info, trace};
use rand::{SeedableRng, rngs::StdRng};

use plotlines_core::{
    graph::{Graph, ItemKind},
    identifier::Uid,
};

use crate::{
    config::GraphConfig,
    motif::{Growth, Scheduler},
};

/// Iterator growing a [`Graph`] under a budget.
///
/// # Examples
///
/// ```
/// use plotlines::{builder::GraphBuilder, config::GraphConfig};
///
/// let config = GraphConfig::new(7, 3, 3, 1).with_seed(1);
/// let mut builder = GraphBuilder::new(&config);
/// let items: Vec<_> = builder.by_ref().collect();
///
/// let graph = builder.into_graph();
/// assert_eq!(items.len(), 7);
/// assert_eq!(graph.node_count(), 4);
/// assert_eq!(graph.terminal().len(), 3);
/// ```
#[derive(Debug)]
pub struct GraphBuilder {
    graph: Graph,
    rng: StdRng,
    scheduler: Scheduler,
    limit: usize,
    exits: usize,
    steps: usize,
    fwd: bool,
    step: usize,
    zone: i64,
    zones: BTreeMap<i64, Vec<Uid>>,
    pending: VecDeque<Uid>,
}

impl GraphBuilder {
    /// Creates a builder and seeds its ending nodes.
    ///
    /// The random generator is seeded from the config when a seed is set,
    /// otherwise from the operating system.
    pub fn new(config: &GraphConfig) -> Self {
        let rng = match config.seed() {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self::with_rng(config, rng)
    }

    /// Creates a builder drawing from `rng`.
    pub fn with_rng(config: &GraphConfig, rng: StdRng) -> Self {
        let fwd = config.mode().is_forward();
        let zone = if fwd {
            0
        } else {
            i64::try_from(config.limit()).unwrap_or(i64::MAX)
        };

        let mut builder = Self {
            graph: Graph::with_scheme(config.ids()),
            rng,
            scheduler: Scheduler::default(),
            limit: config.limit(),
            exits: config.exits(),
            steps: config.steps(),
            fwd,
            step: 0,
            zone,
            zones: BTreeMap::new(),
            pending: VecDeque::new(),
        };

        for n in 0..config.ending() {
            let uid = builder
                .graph
                .add_node()
                .set_label(format!("ending_{:02}", n + 1))
                .set_zone(zone)
                .uid()
                .clone();
            builder.zones.entry(zone).or_default().push(uid.clone());
            builder.pending.push_back(uid);
        }

        info!(
            limit = builder.limit,
            ending = config.ending(),
            exits = builder.exits,
            steps = builder.steps,
            fwd;
            "Graph generation started"
        );
        builder
    }

    /// Replaces the motif scheduler.
    pub fn with_scheduler(mut self, scheduler: Scheduler) -> Self {
        self.scheduler = scheduler;
        self
    }

    /// Remaining node and edge budget.
    pub fn spare(&self) -> usize {
        self.limit.saturating_sub(self.graph.len())
    }

    /// Fraction of the budget, less one exit allowance, used so far.
    pub fn ratio(&self) -> f64 {
        let target = self.limit.saturating_sub(self.exits);
        if target == 0 {
            return 1.0;
        }
        self.graph.len() as f64 / target as f64
    }

    /// Number of scheduler steps taken.
    pub fn step(&self) -> usize {
        self.step
    }

    /// Entities filed under each zone.
    pub fn zones(&self) -> &BTreeMap<i64, Vec<Uid>> {
        &self.zones
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn into_graph(self) -> Graph {
        self.graph
    }

    fn is_finished(&self) -> bool {
        self.spare() == 0 || self.step >= self.steps
    }

    /// Runs one scheduler step and queues its output.
    fn advance(&mut self) {
        self.step += 1;
        let ratio = self.ratio();
        let growth = Growth::new(self.spare(), self.fwd, self.exits);
        let items = self
            .scheduler
            .apply(&mut self.graph, &mut self.rng, ratio, growth);

        for uid in items {
            let zone = match self.graph.kind_of(&uid) {
                Some(ItemKind::Node) => {
                    let zone = self.graph.node(&uid).map_or(self.zone, |node| node.zone);
                    self.zone = if self.fwd {
                        self.zone.max(zone)
                    } else {
                        self.zone.min(zone)
                    };
                    zone
                }
                _ => self.zone,
            };
            trace!(uid:% = uid, zone; "Filed item");
            self.zones.entry(zone).or_default().push(uid.clone());
            self.pending.push_back(uid);
        }
        debug!(step = self.step, spare = self.spare(), frontier = self.zone; "Builder step");

        if self.is_finished() {
            info!(
                nodes = self.graph.node_count(),
                edges = self.graph.edge_count(),
                steps = self.step;
                "Graph generation finished"
            );
        }
    }
}

impl Iterator for GraphBuilder {
    type Item = Uid;

    fn next(&mut self) -> Option<Uid> {
        loop {
            if let Some(uid) = self.pending.pop_front() {
                return Some(uid);
            }
            if self.is_finished() {
                return None;
            }
            self.advance();
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::config::Mode;

    #[test]
    fn test_seeds_are_yielded_first() {
        let config = GraphConfig::new(20, 3, 2, 0).with_seed(1);
        let builder = GraphBuilder::new(&config);
        let graph_labels: Vec<String> = builder
            .graph()
            .nodes()
            .map(|node| node.label.clone())
            .collect();
        assert_eq!(graph_labels, ["ending_01", "ending_02", "ending_03"]);

        let items: Vec<Uid> = builder.collect();
        assert_eq!(items.len(), 3);
    }

    #[test]
    fn test_minimal_build() {
        let config = GraphConfig::new(7, 3, 3, 1).with_seed(5);
        let mut builder = GraphBuilder::new(&config);
        let items: Vec<Uid> = builder.by_ref().collect();

        assert_eq!(items.len(), 7);
        let graph = builder.graph();
        assert_eq!(graph.node_count(), 4);
        assert_eq!(graph.edge_count(), 3);
        assert_eq!(graph.initial().len(), 1);
        assert_eq!(graph.terminal().len(), 3);
        assert_eq!(builder.spare(), 0);
    }

    #[test]
    fn test_rtl_zones_descend() {
        let config = GraphConfig::new(7, 3, 3, 1).with_seed(2);
        let mut builder = GraphBuilder::new(&config);
        builder.by_ref().for_each(drop);

        let zones: Vec<i64> = builder.zones().keys().copied().collect();
        assert_eq!(zones, vec![6, 7]);
        let initial = &builder.graph().initial()[0];
        assert_eq!(builder.graph().node(initial).unwrap().zone, 6);
    }

    #[test]
    fn test_ltr_starts_at_zero() {
        let config = GraphConfig::new(30, 2, 2, 3)
            .with_mode(Mode::Ltr)
            .with_seed(3);
        let mut builder = GraphBuilder::new(&config);
        builder.by_ref().for_each(drop);

        assert!(builder.zones().keys().all(|zone| *zone >= 0));
        assert!(builder.zones().contains_key(&0));
    }

    #[test]
    fn test_stops_on_step_ceiling() {
        let config = GraphConfig::new(1000, 4, 3, 2).with_seed(4);
        let mut builder = GraphBuilder::new(&config);
        builder.by_ref().for_each(drop);
        assert_eq!(builder.step(), 2);
        assert_eq!(builder.scheduler().history().len(), 2);
    }

    #[test]
    fn test_extended_build() {
        let config = GraphConfig::new(100, 4, 3, 10).with_seed(6);
        let mut builder = GraphBuilder::new(&config);
        let items: Vec<Uid> = builder.by_ref().collect();

        let graph = builder.graph();
        assert!(graph.node_count() > 6);
        assert!(graph.edge_count() > 4);
        assert!(items.len() <= 100);
        assert!(graph.terminal().len() <= 4);
    }

    #[test]
    fn test_partial_pull_leaves_consistent_graph() {
        let config = GraphConfig::new(60, 3, 3, 10).with_seed(7);
        let mut builder = GraphBuilder::new(&config);
        let taken: Vec<Uid> = builder.by_ref().take(5).collect();
        assert_eq!(taken.len(), 5);

        let graph = builder.graph();
        for edge in graph.edges() {
            for id in edge.ports() {
                assert!(graph.port(id).unwrap().joins_with(edge.uid()));
            }
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_budget_termination(
            limit in 1usize..80,
            ending in 1usize..5,
            exits in 1usize..4,
            steps in 0usize..12,
            seed in any::<u64>(),
            ltr in any::<bool>(),
        ) {
            let mode = if ltr { Mode::Ltr } else { Mode::Rtl };
            let config = GraphConfig::new(limit, ending, exits, steps)
                .with_mode(mode)
                .with_seed(seed);
            let mut builder = GraphBuilder::new(&config);
            let items: Vec<Uid> = builder.by_ref().collect();

            prop_assert!(items.len() <= limit.max(ending));
            prop_assert!(builder.step() <= steps);
            for node in builder.graph().nodes() {
                prop_assert!(!builder.graph().nearby(node.uid()).contains(node.uid()));
            }
        }
    }
}
