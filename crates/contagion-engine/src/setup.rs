//! Network construction from configuration.
//!
//! Turns the `population`, `news`, and `network` sections of a validated
//! [`SimulationConfig`] into an [`InfluenceNetwork`]. The trust graph is
//! produced through the [`GraphGenerator`] seam by [`ConfiguredGraph`], so
//! a synthetic topology source can replace it without touching the rest of
//! startup.

use contagion_core::config::{NetworkConfig, PopulationConfig, SimulationConfig};
use contagion_network::{
    EdgeWeighting, GraphGenerator, GraphSource, InfluenceNetwork, NetworkError, NewsItem,
    Personality, Population, TrustGraph,
};
use contagion_types::AgentId;
use tracing::{debug, info};

/// Graph generator backed by the edge list of the configuration.
#[derive(Debug, Clone)]
pub struct ConfiguredGraph {
    /// `(provider, receiver, raw weight)` triples.
    edges: Vec<(AgentId, AgentId, f64)>,
    /// Weighting applied before normalization.
    weighting: EdgeWeighting,
}

impl ConfiguredGraph {
    /// Capture the edges and weighting of a network section.
    pub fn new(config: &NetworkConfig) -> Self {
        Self {
            edges: config.raw_edges(),
            weighting: config.weighting,
        }
    }
}

impl GraphGenerator for ConfiguredGraph {
    fn generate(&mut self, agent_count: u32) -> Result<TrustGraph, NetworkError> {
        let graph = TrustGraph::from_raw_edges(agent_count, &self.edges, self.weighting)?;
        debug!(
            agents = agent_count,
            edges = graph.edge_count(),
            weighting = ?self.weighting,
            "Trust graph generated"
        );
        Ok(graph)
    }
}

/// Build the population with per-agent overrides applied.
///
/// # Errors
///
/// Returns [`NetworkError`] if a parameter is out of range or an override
/// names an unknown agent.
pub fn build_population(config: &PopulationConfig) -> Result<Population, NetworkError> {
    let mut population = Population::uniform(config.agents, config.threshold, config.independence)?;
    for entry in &config.overrides {
        let personality = Personality::new(
            entry.threshold.unwrap_or(config.threshold),
            entry.independence.unwrap_or(config.independence),
        )?;
        population = population.with_override(entry.agent_id(), personality)?;
    }
    Ok(population)
}

/// Build the news items of the configuration.
///
/// # Errors
///
/// Returns [`NetworkError::InvalidArgument`] if a sensationalism or decay
/// rate is out of range.
pub fn build_news(config: &SimulationConfig) -> Result<Vec<NewsItem>, NetworkError> {
    config
        .news
        .iter()
        .map(|item| NewsItem::new(item.news_id(), item.sensationalism, item.decay_rate))
        .collect()
}

/// Build the full network described by `config`.
///
/// # Errors
///
/// Returns [`NetworkError`] if any part of the network is invalid.
pub fn build_network(config: &SimulationConfig) -> Result<InfluenceNetwork, NetworkError> {
    let population = build_population(&config.population)?;
    let news = build_news(config)?;
    let mut generator = ConfiguredGraph::new(&config.network);
    let network = InfluenceNetwork::new(&population, news, GraphSource::Generated(&mut generator))?;

    info!(
        agents = network.agent_count(),
        edges = network.graph().edge_count(),
        news = network.news_ids().len(),
        overrides = config.population.overrides.len(),
        "Network built"
    );
    Ok(network)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use contagion_types::NewsId;

    use super::*;

    const YAML: &str = r"
population:
  agents: 3
  threshold: 0.1
  independence: 0.0
  overrides:
    - agent: 2
      threshold: 0.9
news:
  - id: 0
    sensationalism: 0.9
    decay_rate: 0.0
  - id: 4
    sensationalism: 0.2
    decay_rate: 0.5
network:
  weighting: uniform
  edges:
    - [0, 1]
    - [1, 2]
    - [0, 2]
";

    #[test]
    fn builds_network_from_yaml() {
        let config = SimulationConfig::parse(YAML).unwrap();
        let network = build_network(&config).unwrap();
        assert_eq!(network.agent_count(), 3);
        assert_eq!(network.graph().edge_count(), 3);
        assert_eq!(network.news_ids(), vec![NewsId::new(0), NewsId::new(4)]);

        let weight = network.graph().weight(AgentId::new(1), AgentId::new(2)).unwrap();
        assert!((weight - 0.5).abs() < 1e-12);

        let overridden = network.agent(AgentId::new(2)).unwrap();
        assert!((overridden.threshold() - 0.9).abs() < 1e-12);
        assert!(overridden.independence().abs() < 1e-12);
    }

    #[test]
    fn self_loop_in_config_is_rejected() {
        let mut config = SimulationConfig::parse(YAML).unwrap();
        config.network.edges.push(contagion_core::config::EdgeConfig::Plain(1, 1));
        assert!(matches!(
            build_network(&config),
            Err(NetworkError::InconsistentTopology { .. })
        ));
    }

    #[test]
    fn default_config_builds_an_edgeless_network() {
        let network = build_network(&SimulationConfig::default()).unwrap();
        assert_eq!(network.agent_count(), 100);
        assert_eq!(network.graph().edge_count(), 0);
    }
}
