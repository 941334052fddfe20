//! Full-run driver with scheduled seeding and cooperative cancellation.
//!
//! This module provides [`run`], which drives the tick loop with support for:
//!
//! - **Bounded runs**: stop after `max_ticks`
//! - **Convergence**: optionally stop at the first tick that changes nothing
//! - **Scheduled seeding**: activations keyed by tick, applied before that
//!   tick executes
//! - **Clean stop**: a stop request is honoured between ticks, so an
//!   in-flight tick is never partially committed
//!
//! [`run_for`] and [`run_until_convergence`] are sequential shorthands.

use std::collections::BTreeMap;

use contagion_network::{InfluenceNetwork, NetworkError};
use contagion_types::{AgentId, Census, NetworkSnapshot, NewsId, RunId};
use tracing::{info, warn};

use crate::control::RunControl;
use crate::history::CascadeHistory;
use crate::tick::{DiffusionEngine, TickError, TickSummary};

/// Errors that can occur during a run.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// A tick execution failed.
    #[error("tick error: {source}")]
    Tick {
        /// The underlying tick error.
        #[from]
        source: TickError,
    },

    /// A scheduled activation was rejected.
    #[error("seeding error: {source}")]
    Seeding {
        /// The underlying network error.
        #[from]
        source: NetworkError,
    },

    /// The run hit its tick limit without reaching a fixed point.
    #[error("no fixed point after {ticks} ticks")]
    NotConverged {
        /// Ticks executed.
        ticks: u64,
    },
}

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// A tick changed no agent and no seeding was pending.
    Converged,
    /// The tick limit was reached while still waiting for a fixed point.
    NotConverged,
    /// The requested number of ticks ran (convergence not requested).
    Completed,
    /// A stop was requested.
    Stopped,
}

/// Activations to apply before given ticks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedSchedule {
    /// Tick number -> activations applied when the network is at that tick.
    entries: BTreeMap<u64, Vec<(AgentId, NewsId)>>,
}

impl SeedSchedule {
    /// Create an empty schedule.
    pub const fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Schedule `agents` to become active for `news` before tick `tick`
    /// executes (tick 0 means before the first tick).
    pub fn add(&mut self, tick: u64, news: NewsId, agents: impl IntoIterator<Item = AgentId>) {
        self.entries
            .entry(tick)
            .or_default()
            .extend(agents.into_iter().map(|agent| (agent, news)));
    }

    /// Builder form of [`SeedSchedule::add`].
    #[must_use]
    pub fn with(mut self, tick: u64, news: NewsId, agents: impl IntoIterator<Item = AgentId>) -> Self {
        self.add(tick, news, agents);
        self
    }

    /// Whether nothing remains scheduled.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every activation scheduled for `tick`.
    pub fn at(&self, tick: u64) -> &[(AgentId, NewsId)] {
        self.entries
            .get(&tick)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Remove and return every activation due at or before `tick`, oldest
    /// first.
    pub fn take_due(&mut self, tick: u64) -> Vec<(AgentId, NewsId)> {
        let later = tick
            .checked_add(1)
            .map(|next| self.entries.split_off(&next))
            .unwrap_or_default();
        let due = std::mem::replace(&mut self.entries, later);
        due.into_values().flatten().collect()
    }
}

/// Result of a run.
#[derive(Debug, Clone)]
pub struct RunResult {
    /// Identifier of the run.
    pub run_id: RunId,
    /// Why the run ended.
    pub outcome: RunOutcome,
    /// Ticks executed by this run.
    pub ticks: u64,
    /// Tick counter of the network at the end of the run.
    pub final_tick: u64,
    /// Census at the end of the run.
    pub census: Census,
    /// The last tick summary, if any tick ran.
    pub final_summary: Option<TickSummary>,
    /// Per-tick cascade history.
    pub history: CascadeHistory,
}

impl RunResult {
    /// Whether the run reached a fixed point.
    pub fn converged(&self) -> bool {
        self.outcome == RunOutcome::Converged
    }

    /// Turn a non-converged run into an error.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::NotConverged`] unless the outcome is
    /// [`RunOutcome::Converged`].
    pub fn require_convergence(self) -> Result<Self, RunnerError> {
        if self.converged() {
            Ok(self)
        } else {
            Err(RunnerError::NotConverged { ticks: self.ticks })
        }
    }
}

/// Callback invoked after each committed tick.
///
/// Rendering collaborators use it to pull a frame per tick; the network is
/// handed over read-only.
pub trait TickObserver {
    /// Called after a tick commits.
    fn on_tick(&mut self, summary: &TickSummary, network: &InfluenceNetwork);
}

/// An observer that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpObserver;

impl TickObserver for NoOpObserver {
    fn on_tick(&mut self, _summary: &TickSummary, _network: &InfluenceNetwork) {}
}

/// An observer that keeps a snapshot of every tick.
#[derive(Debug, Clone, Default)]
pub struct SnapshotRecorder {
    /// Run the frames belong to.
    run_id: Option<RunId>,
    /// One snapshot per observed tick.
    frames: Vec<NetworkSnapshot>,
}

impl SnapshotRecorder {
    /// Create a recorder tagging frames with `run_id`.
    pub const fn new(run_id: Option<RunId>) -> Self {
        Self {
            run_id,
            frames: Vec::new(),
        }
    }

    /// Recorded frames in tick order.
    pub fn frames(&self) -> &[NetworkSnapshot] {
        &self.frames
    }

    /// Take the recorded frames.
    pub fn into_frames(self) -> Vec<NetworkSnapshot> {
        self.frames
    }
}

impl TickObserver for SnapshotRecorder {
    fn on_tick(&mut self, _summary: &TickSummary, network: &InfluenceNetwork) {
        self.frames.push(network.snapshot(self.run_id));
    }
}

/// Run the tick loop until a termination condition is met.
///
/// Before every tick, activations scheduled at or before the network's
/// current tick are applied. A tick with no changes ends the run only when
/// the control asks for convergence and the schedule is exhausted.
///
/// # Errors
///
/// Returns [`RunnerError`] if a tick or a scheduled activation fails.
/// Reaching the tick limit is not an error; see
/// [`RunResult::require_convergence`].
pub fn run(
    network: &mut InfluenceNetwork,
    engine: &DiffusionEngine,
    control: &RunControl,
    mut schedule: SeedSchedule,
    observer: &mut dyn TickObserver,
) -> Result<RunResult, RunnerError> {
    let run_id = RunId::new();
    let mut history = CascadeHistory::new();
    let mut final_summary: Option<TickSummary> = None;
    let mut ticks: u64 = 0;

    info!(
        %run_id,
        agents = network.agent_count(),
        edges = network.graph().edge_count(),
        max_ticks = control.max_ticks(),
        stop_at_convergence = control.stop_at_convergence(),
        workers = engine.worker_threads(),
        "Run starting"
    );

    let outcome = loop {
        // --- Check stop request (before tick) ---
        if control.is_stop_requested() {
            info!(%run_id, ticks, "Stop requested");
            break RunOutcome::Stopped;
        }

        // --- Check tick limit (before tick) ---
        if control.tick_limit_reached(ticks) {
            break if control.stop_at_convergence() {
                RunOutcome::NotConverged
            } else {
                RunOutcome::Completed
            };
        }

        // --- Scheduled seeding ---
        let due = schedule.take_due(network.tick());
        if !due.is_empty() {
            network.activate_all(&due)?;
            info!(tick = network.tick(), seeds = due.len(), "Scheduled seeds applied");
        }

        // --- Execute tick ---
        let summary = engine.step(network)?;
        ticks = ticks.saturating_add(1);
        history.record(&summary);
        observer.on_tick(&summary, network);

        let fixed_point = summary.is_fixed_point() && schedule.is_empty();
        final_summary = Some(summary);

        if control.stop_at_convergence() && fixed_point {
            break RunOutcome::Converged;
        }
    };

    Ok(RunResult {
        run_id,
        outcome,
        ticks,
        final_tick: network.tick(),
        census: network.census(),
        final_summary,
        history,
    })
}

/// Run exactly `ticks` ticks on a sequential engine.
///
/// # Errors
///
/// Returns [`RunnerError`] if a tick fails.
pub fn run_for(network: &mut InfluenceNetwork, ticks: u64) -> Result<RunResult, RunnerError> {
    run(
        network,
        &DiffusionEngine::new(),
        &RunControl::new(ticks, false),
        SeedSchedule::new(),
        &mut NoOpObserver,
    )
}

/// Run on a sequential engine until a fixed point or `max_ticks`.
///
/// # Errors
///
/// Returns [`RunnerError`] if a tick fails. Hitting `max_ticks` yields
/// [`RunOutcome::NotConverged`], not an error.
pub fn run_until_convergence(
    network: &mut InfluenceNetwork,
    max_ticks: u64,
) -> Result<RunResult, RunnerError> {
    run(
        network,
        &DiffusionEngine::new(),
        &RunControl::new(max_ticks, true),
        SeedSchedule::new(),
        &mut NoOpObserver,
    )
}

/// Log the end of a run.
pub fn log_run_end(result: &RunResult) {
    info!(
        run_id = %result.run_id,
        outcome = ?result.outcome,
        ticks = result.ticks,
        final_tick = result.final_tick,
        active = result.census.total_active(),
        inactive = result.census.inactive,
        ignorant = result.census.ignorant,
        "Run ended"
    );

    for (news, count) in &result.census.active_by_news {
        info!(%news, active = count, "Final cascade size");
    }

    match result.outcome {
        RunOutcome::NotConverged => {
            warn!(ticks = result.ticks, "Run reached its tick limit without a fixed point");
        }
        _ if result.final_summary.is_none() => warn!("Run ended with no ticks executed"),
        _ => {}
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use contagion_network::{GraphSource, NewsItem, TrustEdge, TrustGraph};

    use super::*;

    fn id(raw: u32) -> AgentId {
        AgentId::new(raw)
    }

    /// A line of `n` agents, optionally closed into a ring.
    fn chain(n: u32, ring: bool) -> InfluenceNetwork {
        let mut edges: Vec<_> = (1..n).map(|raw| TrustEdge::new(id(raw - 1), id(raw), 1.0)).collect();
        if ring {
            edges.push(TrustEdge::new(id(n - 1), id(0), 1.0));
        }
        let graph = TrustGraph::new(n, edges).unwrap();
        let news = [
            NewsItem::new(NewsId::new(0), 0.9, 0.0).unwrap(),
            NewsItem::new(NewsId::new(1), 0.9, 0.0).unwrap(),
        ];
        InfluenceNetwork::with_constant_parameters(n, 0.1, 0.0, news, GraphSource::Prebuilt(graph))
            .unwrap()
    }

    #[test]
    fn line_converges_after_the_wave_passes() {
        let mut network = chain(3, false);
        network.activate(id(0), NewsId::new(0)).unwrap();
        let result = run_until_convergence(&mut network, 50).unwrap();
        // Tick 1: A reverts, B activates. Tick 2: B reverts, C activates.
        // Tick 3: C reverts. Tick 4: nothing changes.
        assert_eq!(result.outcome, RunOutcome::Converged);
        assert_eq!(result.ticks, 4);
        assert_eq!(result.census.total_active(), 0);
        assert_eq!(result.census.inactive, 3);
        assert_eq!(result.history.active_series(NewsId::new(0)), vec![1, 1, 0, 0]);
        assert!(result.require_convergence().is_ok());
    }

    #[test]
    fn ring_never_converges() {
        let mut network = chain(4, true);
        network.activate(id(0), NewsId::new(0)).unwrap();
        let result = run_until_convergence(&mut network, 10).unwrap();
        assert_eq!(result.outcome, RunOutcome::NotConverged);
        assert_eq!(result.ticks, 10);
        assert_eq!(result.census.active_for(NewsId::new(0)), 1);
        assert!(matches!(
            result.require_convergence(),
            Err(RunnerError::NotConverged { ticks: 10 })
        ));
    }

    #[test]
    fn run_for_ignores_fixed_points() {
        let mut network = chain(3, false);
        let result = run_for(&mut network, 5).unwrap();
        assert_eq!(result.outcome, RunOutcome::Completed);
        assert_eq!(result.ticks, 5);
        assert_eq!(network.tick(), 5);
    }

    #[test]
    fn stop_before_first_tick() {
        let mut network = chain(3, false);
        let control = RunControl::new(10, true);
        control.request_stop();
        let result = run(
            &mut network,
            &DiffusionEngine::new(),
            &control,
            SeedSchedule::new(),
            &mut NoOpObserver,
        )
        .unwrap();
        assert_eq!(result.outcome, RunOutcome::Stopped);
        assert_eq!(result.ticks, 0);
        assert!(result.final_summary.is_none());
        assert_eq!(network.tick(), 0);
    }

    #[test]
    fn observer_stops_run_between_ticks() {
        struct StopAfter<'a> {
            control: &'a RunControl,
            seen: u64,
        }
        impl TickObserver for StopAfter<'_> {
            fn on_tick(&mut self, _summary: &TickSummary, _network: &InfluenceNetwork) {
                self.seen = self.seen.saturating_add(1);
                if self.seen == 2 {
                    self.control.request_stop();
                }
            }
        }

        let mut network = chain(4, true);
        network.activate(id(0), NewsId::new(0)).unwrap();
        let control = RunControl::new(100, true);
        let mut observer = StopAfter {
            control: &control,
            seen: 0,
        };
        let result = run(
            &mut network,
            &DiffusionEngine::new(),
            &control,
            SeedSchedule::new(),
            &mut observer,
        )
        .unwrap();
        assert_eq!(result.outcome, RunOutcome::Stopped);
        assert_eq!(result.ticks, 2);
        assert_eq!(network.tick(), 2);
    }

    #[test]
    fn scheduled_seeds_fire_at_their_tick() {
        let mut network = chain(6, false);
        let schedule = SeedSchedule::new()
            .with(0, NewsId::new(0), [id(0)])
            .with(3, NewsId::new(1), [id(0)]);
        let mut recorder = SnapshotRecorder::new(None);
        let result = run(
            &mut network,
            &DiffusionEngine::new(),
            &RunControl::new(50, true),
            schedule,
            &mut recorder,
        )
        .unwrap();

        assert_eq!(result.outcome, RunOutcome::Converged);
        let frames = recorder.frames();
        // Counter news is planted before tick 4, so agent 1 believes it after tick 4.
        let after_fourth = frames.get(3).unwrap();
        assert_eq!(after_fourth.tick, 4);
        assert_eq!(
            after_fourth.agents.get(1).unwrap().active_news,
            Some(NewsId::new(1))
        );
        // Both cascades reach the end of the line.
        let last = network.agent(id(5)).unwrap();
        assert!(last.state(NewsId::new(0)).is_aware());
        assert!(last.state(NewsId::new(1)).is_aware());
    }

    #[test]
    fn pending_schedule_blocks_convergence() {
        let mut network = chain(3, false);
        let schedule = SeedSchedule::new().with(5, NewsId::new(0), [id(0)]);
        let result = run(
            &mut network,
            &DiffusionEngine::new(),
            &RunControl::new(50, true),
            schedule,
            &mut NoOpObserver,
        )
        .unwrap();
        assert_eq!(result.outcome, RunOutcome::Converged);
        // Seeds land before tick 6; the wave then needs four more ticks.
        assert_eq!(result.ticks, 9);
    }

    #[test]
    fn unknown_scheduled_agent_is_an_error() {
        let mut network = chain(3, false);
        let schedule = SeedSchedule::new().with(0, NewsId::new(0), [id(7)]);
        let result = run(
            &mut network,
            &DiffusionEngine::new(),
            &RunControl::new(5, true),
            schedule,
            &mut NoOpObserver,
        );
        assert!(matches!(result, Err(RunnerError::Seeding { .. })));
    }

    #[test]
    fn take_due_drains_past_entries() {
        let mut schedule = SeedSchedule::new()
            .with(0, NewsId::new(0), [id(1)])
            .with(2, NewsId::new(1), [id(2)])
            .with(4, NewsId::new(0), [id(3)]);
        assert_eq!(schedule.at(2), &[(id(2), NewsId::new(1))]);
        assert_eq!(
            schedule.take_due(3),
            vec![(id(1), NewsId::new(0)), (id(2), NewsId::new(1))]
        );
        assert!(schedule.at(0).is_empty());
        assert!(!schedule.is_empty());
        assert_eq!(schedule.take_due(u64::MAX).len(), 1);
        assert!(schedule.is_empty());
    }
}
