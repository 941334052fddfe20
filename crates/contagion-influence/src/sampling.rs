//! Live-edge sampling.
//!
//! In one Monte Carlo trial every agent keeps at most one inbound edge. The
//! kept edge is a categorical draw over the agent's providers plus a "none"
//! outcome:
//!
//! ```text
//! P(provider p) = (1 - independence) * trust(p)
//! P(none)       = 1 - sum of the above
//! ```
//!
//! The categorical distribution of each agent is built once in
//! [`LiveEdgeModel`]; a [`LiveEdgeSample`] is one draw for every agent.
//! Samples are owned values, so parallel trials never share mutable state.

use contagion_network::InfluenceNetwork;
use contagion_types::AgentId;
use rand::Rng;
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;

use crate::error::InfluenceError;

/// Outcome of the live-edge draw for one agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ProviderChoice {
    /// The edge from this provider is live.
    Provider(AgentId),
    /// No inbound edge is live.
    None,
}

/// Categorical distribution over the outcomes of one agent.
#[derive(Debug, Clone)]
struct AgentDraw {
    /// Outcomes in provider id order, `None` last.
    choices: Vec<ProviderChoice>,
    /// Distribution over `choices`.
    distribution: WeightedIndex<f64>,
}

/// Per-agent live-edge distributions of a network.
///
/// Only topology, trust weights, and independence are read; belief states
/// play no part.
#[derive(Debug, Clone)]
pub struct LiveEdgeModel {
    /// One entry per agent index; `None` for agents without providers.
    draws: Vec<Option<AgentDraw>>,
}

impl LiveEdgeModel {
    /// Build the distributions for every agent of `network`.
    ///
    /// # Errors
    ///
    /// Returns [`InfluenceError::InvalidArgument`] if some agent's outcome
    /// weights cannot form a distribution.
    pub fn new(network: &InfluenceNetwork) -> Result<Self, InfluenceError> {
        let mut draws = Vec::with_capacity(network.agent_count());
        for agent in network.agents() {
            if agent.inbound_weights().is_empty() {
                draws.push(None);
                continue;
            }

            let susceptibility = agent.personality().susceptibility();
            let mut choices = Vec::with_capacity(agent.inbound_weights().len().saturating_add(1));
            let mut weights = Vec::with_capacity(choices.capacity());
            for (provider, trust) in agent.inbound_weights() {
                choices.push(ProviderChoice::Provider(*provider));
                weights.push(susceptibility * trust);
            }
            let kept: f64 = weights.iter().sum();
            choices.push(ProviderChoice::None);
            weights.push((1.0 - kept).max(0.0));

            let distribution = WeightedIndex::new(&weights).map_err(|err| {
                InfluenceError::invalid(format!(
                    "live-edge weights of agent {} are not a distribution: {err}",
                    agent.id()
                ))
            })?;
            draws.push(Some(AgentDraw {
                choices,
                distribution,
            }));
        }
        Ok(Self { draws })
    }

    /// Number of agents covered by the model.
    pub fn agent_count(&self) -> usize {
        self.draws.len()
    }

    /// Draw one live-edge subgraph.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> LiveEdgeSample {
        let parents: Vec<ProviderChoice> = self
            .draws
            .iter()
            .map(|draw| match draw {
                Some(draw) => draw
                    .choices
                    .get(draw.distribution.sample(rng))
                    .copied()
                    .unwrap_or(ProviderChoice::None),
                None => ProviderChoice::None,
            })
            .collect();
        LiveEdgeSample::from_parents(parents)
    }
}

/// One sampled live-edge subgraph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveEdgeSample {
    /// Live provider of each agent, by agent index.
    parents: Vec<ProviderChoice>,
    /// Agents whose live edge comes from each agent, by agent index.
    children: Vec<Vec<AgentId>>,
}

impl LiveEdgeSample {
    /// Build a sample from the live provider of every agent.
    ///
    /// Providers outside `0..parents.len()` are treated as `None`.
    pub fn from_parents(parents: Vec<ProviderChoice>) -> Self {
        let mut children: Vec<Vec<AgentId>> = vec![Vec::new(); parents.len()];
        for (index, parent) in parents.iter().enumerate() {
            let (ProviderChoice::Provider(provider), Some(receiver)) =
                (parent, AgentId::from_index(index))
            else {
                continue;
            };
            if let Some(list) = children.get_mut(provider.index()) {
                list.push(receiver);
            }
        }
        Self { parents, children }
    }

    /// Number of agents in the sample.
    pub fn agent_count(&self) -> usize {
        self.parents.len()
    }

    /// Live provider of `agent`.
    pub fn parent(&self, agent: AgentId) -> ProviderChoice {
        self.parents
            .get(agent.index())
            .copied()
            .unwrap_or(ProviderChoice::None)
    }

    /// Agents reached directly from `agent` over live edges.
    pub fn children(&self, agent: AgentId) -> &[AgentId] {
        self.children
            .get(agent.index())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Number of live edges.
    pub fn live_edge_count(&self) -> usize {
        self.parents
            .iter()
            .filter(|parent| matches!(parent, ProviderChoice::Provider(_)))
            .count()
    }
}
