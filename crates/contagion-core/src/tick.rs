//! Tick cycle: the four-step engine loop that drives the diffusion model.
//!
//! Each tick runs through these steps:
//!
//! 1. **News** -- advance every news item, so the decayed sensationalism is
//!    what agents see this tick.
//! 2. **Decision** -- evaluate [`decide`] for every agent against the
//!    committed state. No decision observes another decision of the same
//!    tick. On a multi-worker engine this runs on a dedicated rayon pool.
//! 3. **Commit** -- apply all state deltas at once.
//! 4. **Clock** -- advance the tick counter.
//!
//! Steps 1 to 4 run inside [`InfluenceNetwork::apply_tick`], so a rejected
//! commit or a clock overflow leaves news, agent states, and the clock as
//! they were.
//!
//! The tick cycle is deterministic: deltas are sorted by agent id before
//! the commit, whatever order the workers finished in.
//!
//! [`decide`]: crate::diffusion::decide

use std::collections::BTreeMap;

use contagion_network::{Agent, InfluenceNetwork, NetworkError, StateDelta, TickCommit};
use contagion_types::{Census, NewsId};
use rayon::prelude::*;
use tracing::debug;

use crate::diffusion;

/// Errors that can occur during tick execution.
#[derive(Debug, thiserror::Error)]
pub enum TickError {
    /// Committing deltas or advancing the clock failed.
    #[error("network error: {source}")]
    Network {
        /// The underlying network error.
        #[from]
        source: NetworkError,
    },
}

/// Summary of a single tick's execution.
#[derive(Debug, Clone, PartialEq)]
pub struct TickSummary {
    /// The tick number that was executed.
    pub tick: u64,
    /// Number of agents whose state vector changed.
    pub changed: usize,
    /// Census of the network after the commit.
    pub census: Census,
    /// Sensationalism of every news item during this tick.
    pub sensationalism: BTreeMap<NewsId, f64>,
}

impl TickSummary {
    /// Whether the tick reached a fixed point.
    pub const fn is_fixed_point(&self) -> bool {
        self.changed == 0
    }
}

/// Runs ticks of the diffusion model against an [`InfluenceNetwork`].
#[derive(Debug, Default)]
pub struct DiffusionEngine {
    /// Pool for the decision phase; `None` runs it on the calling thread.
    pool: Option<rayon::ThreadPool>,
}

impl DiffusionEngine {
    /// Create a sequential engine.
    pub const fn new() -> Self {
        Self { pool: None }
    }

    /// Create an engine whose decision phase runs on `worker_threads`
    /// threads. One thread (or a pool that fails to start) means the
    /// sequential path.
    pub fn with_workers(worker_threads: usize) -> Self {
        let pool = if worker_threads > 1 {
            rayon::ThreadPoolBuilder::new()
                .num_threads(worker_threads)
                .build()
                .ok()
        } else {
            None
        };
        Self { pool }
    }

    /// Number of threads used by the decision phase.
    pub fn worker_threads(&self) -> usize {
        self.pool
            .as_ref()
            .map_or(1, rayon::ThreadPool::current_num_threads)
    }

    /// Compute the deltas of every agent that would change this tick.
    ///
    /// Read-only over the network; the result is sorted by agent id.
    pub fn compute_deltas(&self, network: &InfluenceNetwork) -> Vec<StateDelta> {
        let agents: Vec<&Agent> = network.agents().collect();
        let mut deltas = match &self.pool {
            Some(pool) if agents.len() > 1 => pool.install(|| {
                agents
                    .into_par_iter()
                    .filter_map(|agent| diffusion::delta_for(agent, network))
                    .collect::<Vec<_>>()
            }),
            _ => agents
                .into_iter()
                .filter_map(|agent| diffusion::delta_for(agent, network))
                .collect::<Vec<_>>(),
        };
        deltas.sort_by_key(|delta| delta.agent);
        deltas
    }

    /// Execute one complete tick.
    ///
    /// # Errors
    ///
    /// Returns [`TickError::Network`] if the commit is rejected or the clock
    /// overflows. Either way the network is left untouched.
    pub fn step(&self, network: &mut InfluenceNetwork) -> Result<TickSummary, TickError> {
        // News advance, decisions, commit, and clock as one transaction.
        let TickCommit { tick, changed } =
            network.apply_tick(|network| self.compute_deltas(network))?;

        // Decayed values, as the decisions saw them.
        let sensationalism: BTreeMap<NewsId, f64> = network
            .news()
            .map(|item| (item.id(), item.sensationalism()))
            .collect();

        let census = network.census();
        debug!(
            tick,
            changed,
            active = census.total_active(),
            inactive = census.inactive,
            ignorant = census.ignorant,
            "Tick committed"
        );

        Ok(TickSummary {
            tick,
            changed,
            census,
            sensationalism,
        })
    }
}

/// Execute one tick on a sequential engine and return the changed count.
///
/// # Errors
///
/// Same conditions as [`DiffusionEngine::step`].
pub fn step(network: &mut InfluenceNetwork) -> Result<usize, TickError> {
    DiffusionEngine::new().step(network).map(|summary| summary.changed)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use contagion_network::{GraphSource, NewsItem, TrustEdge, TrustGraph};
    use contagion_types::{AgentId, BeliefState};

    use super::*;

    fn id(raw: u32) -> AgentId {
        AgentId::new(raw)
    }

    fn line_network() -> InfluenceNetwork {
        let graph = TrustGraph::new(
            3,
            [
                TrustEdge::new(id(0), id(1), 1.0),
                TrustEdge::new(id(1), id(2), 1.0),
            ],
        )
        .unwrap();
        let news = [NewsItem::new(NewsId::new(0), 0.9, 0.1).unwrap()];
        InfluenceNetwork::with_constant_parameters(3, 0.1, 0.0, news, GraphSource::Prebuilt(graph))
            .unwrap()
    }

    fn active(network: &InfluenceNetwork, raw: u32) -> bool {
        network.agent(id(raw)).unwrap().is_active()
    }

    #[test]
    fn line_propagates_one_hop_per_tick() {
        let mut network = line_network();
        network.activate(id(0), NewsId::new(0)).unwrap();
        let engine = DiffusionEngine::new();

        let first = engine.step(&mut network).unwrap();
        assert_eq!(first.tick, 1);
        assert!(active(&network, 1));
        assert!(!active(&network, 2));

        let second = engine.step(&mut network).unwrap();
        assert_eq!(second.tick, 2);
        assert!(active(&network, 2));
    }

    #[test]
    fn decisions_use_start_of_tick_state() {
        let mut network = line_network();
        network.activate(id(0), NewsId::new(0)).unwrap();
        DiffusionEngine::new().step(&mut network).unwrap();
        // C only sees B's activation one tick later.
        assert!(network.agent(id(2)).unwrap().is_ignorant());
    }

    #[test]
    fn summary_reports_changes_and_census() {
        let mut network = line_network();
        network.activate(id(0), NewsId::new(0)).unwrap();
        let summary = DiffusionEngine::new().step(&mut network).unwrap();
        // A reverts, B activates.
        assert_eq!(summary.changed, 2);
        assert_eq!(summary.census.active_for(NewsId::new(0)), 1);
        assert_eq!(summary.census.inactive, 1);
        assert_eq!(summary.census.ignorant, 1);
        assert!((summary.sensationalism.get(&NewsId::new(0)).copied().unwrap() - 0.9).abs() < 1e-12);
    }

    #[test]
    fn quiet_network_is_a_fixed_point() {
        let mut network = line_network();
        let summary = DiffusionEngine::new().step(&mut network).unwrap();
        assert!(summary.is_fixed_point());
        assert_eq!(network.tick(), 1);
        assert_eq!(step(&mut network).unwrap(), 0);
    }

    #[test]
    fn news_decays_before_decisions() {
        let mut network = line_network();
        let engine = DiffusionEngine::new();
        engine.step(&mut network).unwrap();
        let summary = engine.step(&mut network).unwrap();
        let expected = 0.9 * (-0.1_f64).exp();
        assert!((summary.sensationalism.get(&NewsId::new(0)).copied().unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn parallel_engine_matches_sequential() {
        let edges: Vec<_> = (1..40).map(|raw| TrustEdge::new(id(raw - 1), id(raw), 1.0)).collect();
        let build = || {
            let graph = TrustGraph::new(40, edges.clone()).unwrap();
            let news = [NewsItem::new(NewsId::new(0), 0.9, 0.05).unwrap()];
            let mut network =
                InfluenceNetwork::with_constant_parameters(40, 0.1, 0.0, news, GraphSource::Prebuilt(graph))
                    .unwrap();
            network.activate(id(0), NewsId::new(0)).unwrap();
            network
        };

        let mut sequential = build();
        let mut parallel = build();
        let seq_engine = DiffusionEngine::new();
        let par_engine = DiffusionEngine::with_workers(4);
        for _ in 0..10 {
            let a = seq_engine.step(&mut sequential).unwrap();
            let b = par_engine.step(&mut parallel).unwrap();
            assert_eq!(a.changed, b.changed);
        }
        assert_eq!(sequential.snapshot(None), parallel.snapshot(None));
        assert_eq!(
            parallel.agent(id(10)).unwrap().state(NewsId::new(0)),
            BeliefState::Active
        );
    }

    #[test]
    fn compute_deltas_is_sorted_and_read_only() {
        let mut network = line_network();
        network.activate(id(0), NewsId::new(0)).unwrap();
        let before = network.snapshot(None);
        let deltas = DiffusionEngine::with_workers(2).compute_deltas(&network);
        assert_eq!(network.snapshot(None), before);
        let ids: Vec<_> = deltas.iter().map(|delta| delta.agent).collect();
        assert_eq!(ids, vec![id(0), id(1)]);
    }
}
