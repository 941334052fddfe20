//! Per-tick record of competing cascades.
//!
//! [`CascadeHistory`] keeps, for every committed tick, how many agents were
//! active for each news item, how many agents changed, and the
//! sensationalism of every item. Plotting collaborators read it after a run.

use std::collections::BTreeMap;

use contagion_types::NewsId;
use serde::Serialize;

use crate::tick::TickSummary;

/// One tick of cascade history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CascadeRecord {
    /// Tick number.
    pub tick: u64,
    /// Agents that changed state during the tick.
    pub changed: usize,
    /// Active agents per news item after the tick.
    pub active_by_news: BTreeMap<NewsId, u32>,
    /// Sensationalism per news item during the tick.
    pub sensationalism: BTreeMap<NewsId, f64>,
}

/// Ordered history of every tick of a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CascadeHistory {
    /// One record per committed tick.
    records: Vec<CascadeRecord>,
}

impl CascadeHistory {
    /// Create an empty history.
    pub const fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Append the outcome of one tick.
    pub fn record(&mut self, summary: &TickSummary) {
        self.records.push(CascadeRecord {
            tick: summary.tick,
            changed: summary.changed,
            active_by_news: summary.census.active_by_news.clone(),
            sensationalism: summary.sensationalism.clone(),
        });
    }

    /// All records in tick order.
    pub fn records(&self) -> &[CascadeRecord] {
        &self.records
    }

    /// Number of recorded ticks.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no tick has been recorded.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Active count of `news` at every recorded tick.
    pub fn active_series(&self, news: NewsId) -> Vec<u32> {
        self.records
            .iter()
            .map(|record| record.active_by_news.get(&news).copied().unwrap_or(0))
            .collect()
    }

    /// Tick and size of the largest cascade of `news`; earliest tick on ties.
    pub fn peak(&self, news: NewsId) -> Option<(u64, u32)> {
        self.records
            .iter()
            .map(|record| {
                (
                    record.tick,
                    record.active_by_news.get(&news).copied().unwrap_or(0),
                )
            })
            .fold(None, |best: Option<(u64, u32)>, (tick, count)| match best {
                Some((_, top)) if top >= count => best,
                _ => Some((tick, count)),
            })
    }

    /// Serialize the history as JSON for plotting tools.
    ///
    /// # Errors
    ///
    /// Returns a [`serde_json::Error`] if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
