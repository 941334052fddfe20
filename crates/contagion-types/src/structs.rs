//! Read-only views of network state handed to rendering collaborators.
//!
//! These structs are produced by the network once per rendered frame (or
//! once per tick) and never flow back into the simulation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::BeliefState;
use crate::ids::{AgentId, NewsId, RunId};

/// The belief state of one agent across every news item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct AgentStateView {
    /// The agent described by this view.
    pub agent_id: AgentId,
    /// State per news item.
    pub states: BTreeMap<NewsId, BeliefState>,
    /// The news item the agent is active for, if any (the node colour).
    pub active_news: Option<NewsId>,
}

/// Full snapshot of the network at the end of a tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct NetworkSnapshot {
    /// The run this snapshot belongs to, when taken inside a run.
    pub run_id: Option<RunId>,
    /// Number of ticks committed so far.
    pub tick: u64,
    /// Current sensationalism of every news item.
    pub sensationalism: BTreeMap<NewsId, f64>,
    /// Per-agent state, ordered by agent id.
    pub agents: Vec<AgentStateView>,
}

/// Aggregate state counters over the whole population.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Census {
    /// Number of agents active for each news item.
    pub active_by_news: BTreeMap<NewsId, u32>,
    /// Agents aware of at least one item but active for none.
    pub inactive: u32,
    /// Agents ignorant of every news item.
    pub ignorant: u32,
}

impl Census {
    /// Total number of active agents across all news items.
    pub fn total_active(&self) -> u32 {
        self.active_by_news
            .values()
            .fold(0_u32, |acc, count| acc.saturating_add(*count))
    }

    /// Number of agents active for `news`.
    pub fn active_for(&self, news: NewsId) -> u32 {
        self.active_by_news.get(&news).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn census_totals() {
        let mut census = Census::default();
        census.active_by_news.insert(NewsId::new(0), 4);
        census.active_by_news.insert(NewsId::new(1), 2);
        assert_eq!(census.total_active(), 6);
        assert_eq!(census.active_for(NewsId::new(1)), 2);
        assert_eq!(census.active_for(NewsId::new(9)), 0);
    }

    #[test]
    fn snapshot_serializes() {
        let mut states = BTreeMap::new();
        states.insert(NewsId::new(0), BeliefState::Active);
        let snapshot = NetworkSnapshot {
            run_id: None,
            tick: 3,
            sensationalism: BTreeMap::new(),
            agents: vec![AgentStateView {
                agent_id: AgentId::new(0),
                states,
                active_news: Some(NewsId::new(0)),
            }],
        };
        let json = serde_json::to_string(&snapshot);
        assert!(json.is_ok());
    }
}
