//! Resolution of configured seeding entries into a [`SeedSchedule`].
//!
//! Entries are resolved in file order. Agents picked by earlier entries
//! are excluded from the degree and influence strategies of later ones, so
//! a counter-news item is never planted on the spreaders of the item it
//! competes with.

use std::collections::BTreeSet;

use contagion_core::config::{SeedStrategy, SeedingConfig, SimulationConfig};
use contagion_core::runner::SeedSchedule;
use contagion_influence::{InfluenceError, InfluenceMaximizer, degree_seeds};
use contagion_network::InfluenceNetwork;
use contagion_types::AgentId;
use tracing::info;

use crate::error::EngineError;

/// Build the seed schedule of `config` against `network`.
///
/// The network is only read; activations happen when the run applies the
/// schedule.
///
/// # Errors
///
/// Returns [`EngineError::Influence`] if a degree or influence strategy
/// cannot pick the requested number of agents.
pub fn resolve_schedule(
    config: &SimulationConfig,
    network: &InfluenceNetwork,
) -> Result<SeedSchedule, EngineError> {
    let maximizer = InfluenceMaximizer::new(config.influence.trials, config.influence_seed())
        .with_workers(if config.influence.parallel { 0 } else { 1 });

    let mut schedule = SeedSchedule::new();
    let mut taken: BTreeSet<AgentId> = BTreeSet::new();

    for entry in &config.seeding {
        let agents = pick_agents(entry, network, &maximizer, &taken)?;
        info!(
            tick = entry.tick,
            news = %entry.news_id(),
            strategy = ?entry.strategy,
            agents = ?agents,
            "Seeding entry resolved"
        );
        taken.extend(agents.iter().copied());
        schedule.add(entry.tick, entry.news_id(), agents);
    }
    Ok(schedule)
}

fn pick_agents(
    entry: &SeedingConfig,
    network: &InfluenceNetwork,
    maximizer: &InfluenceMaximizer,
    taken: &BTreeSet<AgentId>,
) -> Result<Vec<AgentId>, InfluenceError> {
    let count = usize::try_from(entry.count).unwrap_or(usize::MAX);
    match entry.strategy {
        SeedStrategy::Explicit => Ok(entry.agents.iter().copied().map(AgentId::new).collect()),
        SeedStrategy::Degree => degree_seeds(network.graph(), count, taken),
        SeedStrategy::Influence => {
            let selection = maximizer.select_seeds_excluding(network, count, taken)?;
            info!(
                news = %entry.news_id(),
                expected_reach = selection.expected_reach(),
                "Influence seeds selected"
            );
            Ok(selection.seeds)
        }
    }
}
