//! The influence network: owner of agents, news items, graph, and clock.
//!
//! [`InfluenceNetwork`] is the unit of mutation per simulation tick. Its
//! topology is fixed at construction; only news sensationalism, agent belief
//! states, and the tick counter change afterwards. The trust graph sits
//! behind an [`Arc`] so the diffusion engine and the influence maximizer can
//! both read it without copying, and neither can mutate it.
//!
//! State changes go through [`InfluenceNetwork::commit`], which validates a
//! whole batch of deltas before applying any of them.
//! [`InfluenceNetwork::apply_tick`] extends that to a full tick: news
//! advance, deltas, and the clock either all land or none do.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use contagion_types::{AgentId, AgentStateView, BeliefState, Census, NetworkSnapshot, NewsId, RunId};
use tracing::debug;

use crate::agent::{Agent, Personality};
use crate::clock::TickClock;
use crate::error::NetworkError;
use crate::graph::{GraphGenerator, TrustGraph};
use crate::news::NewsItem;

/// Personalities of every agent, indexed by agent number.
#[derive(Debug, Clone, PartialEq)]
pub struct Population {
    /// One personality per agent, agent `i` at position `i`.
    personalities: Vec<Personality>,
}

impl Population {
    /// Every agent gets the same threshold and independence.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::InvalidArgument`] if a parameter is outside
    /// `[0, 1]`.
    pub fn uniform(agent_count: u32, threshold: f64, independence: f64) -> Result<Self, NetworkError> {
        let personality = Personality::new(threshold, independence)?;
        let count = usize::try_from(agent_count)
            .map_err(|_err| NetworkError::invalid("agent count exceeds usize range"))?;
        Ok(Self {
            personalities: vec![personality; count],
        })
    }

    /// Per-agent thresholds and independence values.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::InvalidArgument`] if the slices differ in
    /// length, hold more than `u32::MAX` entries, or contain a value outside
    /// `[0, 1]`.
    pub fn from_parameters(thresholds: &[f64], independence: &[f64]) -> Result<Self, NetworkError> {
        if thresholds.len() != independence.len() {
            return Err(NetworkError::invalid(format!(
                "{} thresholds but {} independence values",
                thresholds.len(),
                independence.len()
            )));
        }
        let personalities = thresholds
            .iter()
            .zip(independence)
            .map(|(&threshold, &independence)| Personality::new(threshold, independence))
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_personalities(personalities)
    }

    /// Use an explicit personality list.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::InvalidArgument`] if there are more than
    /// `u32::MAX` agents.
    pub fn from_personalities(personalities: Vec<Personality>) -> Result<Self, NetworkError> {
        if u32::try_from(personalities.len()).is_err() {
            return Err(NetworkError::invalid("more than u32::MAX agents"));
        }
        Ok(Self { personalities })
    }

    /// Replace the personality of one agent.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::UnknownAgent`] if `agent` is out of range.
    pub fn with_override(mut self, agent: AgentId, personality: Personality) -> Result<Self, NetworkError> {
        let slot = self
            .personalities
            .get_mut(agent.index())
            .ok_or(NetworkError::UnknownAgent(agent))?;
        *slot = personality;
        Ok(self)
    }

    /// Number of agents.
    pub fn len(&self) -> u32 {
        u32::try_from(self.personalities.len()).unwrap_or(u32::MAX)
    }

    /// Whether the population is empty.
    pub fn is_empty(&self) -> bool {
        self.personalities.is_empty()
    }

    /// Personality of one agent.
    pub fn personality(&self, agent: AgentId) -> Option<&Personality> {
        self.personalities.get(agent.index())
    }
}

/// Where the trust graph of a new network comes from.
pub enum GraphSource<'a> {
    /// A graph built by the caller.
    Prebuilt(TrustGraph),
    /// A graph synthesized on demand for the population size.
    Generated(&'a mut dyn GraphGenerator),
}

impl core::fmt::Debug for GraphSource<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Prebuilt(graph) => f.debug_tuple("Prebuilt").field(graph).finish(),
            Self::Generated(_) => f.write_str("Generated(..)"),
        }
    }
}

/// The proposed next state vector of one agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateDelta {
    /// The agent whose states change.
    pub agent: AgentId,
    /// The complete new state vector (one entry per news item).
    pub states: BTreeMap<NewsId, BeliefState>,
}

/// Outcome of [`InfluenceNetwork::apply_tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickCommit {
    /// The tick number that was committed.
    pub tick: u64,
    /// Number of agents whose state vector changed.
    pub changed: usize,
}

/// Agents, news items, and the trust graph connecting them.
#[derive(Debug, Clone)]
pub struct InfluenceNetwork {
    /// All agents indexed by identifier.
    agents: BTreeMap<AgentId, Agent>,
    /// All news items indexed by identifier.
    news: BTreeMap<NewsId, NewsItem>,
    /// Shared, read-only trust graph.
    graph: Arc<TrustGraph>,
    /// Number of committed ticks.
    clock: TickClock,
}

impl InfluenceNetwork {
    /// Build a network from a population, a set of news items, and a graph.
    ///
    /// Every agent starts ignorant of every news item.
    ///
    /// # Errors
    ///
    /// - [`NetworkError::InvalidArgument`] if two news items share an id.
    /// - [`NetworkError::InconsistentTopology`] if the graph does not span
    ///   exactly the population.
    /// - Any error raised by a [`GraphGenerator`].
    pub fn new(
        population: &Population,
        news: impl IntoIterator<Item = NewsItem>,
        source: GraphSource<'_>,
    ) -> Result<Self, NetworkError> {
        let mut news_map = BTreeMap::new();
        for item in news {
            let id = item.id();
            if news_map.insert(id, item).is_some() {
                return Err(NetworkError::invalid(format!("duplicate news id {id}")));
            }
        }

        let graph = match source {
            GraphSource::Prebuilt(graph) => graph,
            GraphSource::Generated(generator) => generator.generate(population.len())?,
        };
        if graph.agent_count() != population.len() {
            return Err(NetworkError::topology(format!(
                "graph spans {} agents but the population has {}",
                graph.agent_count(),
                population.len()
            )));
        }

        let mut agents = BTreeMap::new();
        for (index, personality) in population.personalities.iter().enumerate() {
            let id = AgentId::from_index(index)
                .ok_or_else(|| NetworkError::invalid("agent index exceeds u32 range"))?;
            let inbound = graph.inbound_weights(id).cloned().unwrap_or_default();
            let outbound = graph.outbound_neighbors(id).cloned().unwrap_or_default();
            let agent = Agent::new(id, *personality, news_map.keys().copied(), inbound, outbound);
            agents.insert(id, agent);
        }

        debug!(
            agents = agents.len(),
            edges = graph.edge_count(),
            news = news_map.len(),
            "Influence network built"
        );

        Ok(Self {
            agents,
            news: news_map,
            graph: Arc::new(graph),
            clock: TickClock::new(),
        })
    }

    /// Build a network where every agent shares the same personality.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Population::uniform`] and [`InfluenceNetwork::new`].
    pub fn with_constant_parameters(
        agent_count: u32,
        threshold: f64,
        independence: f64,
        news: impl IntoIterator<Item = NewsItem>,
        source: GraphSource<'_>,
    ) -> Result<Self, NetworkError> {
        let population = Population::uniform(agent_count, threshold, independence)?;
        Self::new(&population, news, source)
    }

    // -------------------------------------------------------------------
    // Read access
    // -------------------------------------------------------------------

    /// Return the trust graph.
    pub fn graph(&self) -> &TrustGraph {
        &self.graph
    }

    /// Return a shared handle to the trust graph.
    pub fn shared_graph(&self) -> Arc<TrustGraph> {
        Arc::clone(&self.graph)
    }

    /// Return the number of committed ticks.
    pub const fn tick(&self) -> u64 {
        self.clock.tick()
    }

    /// Return the number of agents.
    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    /// Return one agent.
    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.agents.get(&id)
    }

    /// Iterate over all agents in id order.
    pub fn agents(&self) -> impl Iterator<Item = &Agent> {
        self.agents.values()
    }

    /// Return one news item.
    pub fn news_item(&self, id: NewsId) -> Option<&NewsItem> {
        self.news.get(&id)
    }

    /// Iterate over all news items in id order.
    pub fn news(&self) -> impl Iterator<Item = &NewsItem> {
        self.news.values()
    }

    /// Return all news ids in ascending order.
    pub fn news_ids(&self) -> Vec<NewsId> {
        self.news.keys().copied().collect()
    }

    /// Read-only per-agent state accessor used by renderers.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::UnknownAgent`] if the agent does not exist.
    pub fn states_of(&self, id: AgentId) -> Result<&BTreeMap<NewsId, BeliefState>, NetworkError> {
        self.agents
            .get(&id)
            .map(Agent::states)
            .ok_or(NetworkError::UnknownAgent(id))
    }

    /// Read-only view of one agent.
    pub fn agent_view(&self, id: AgentId) -> Option<AgentStateView> {
        self.agents.get(&id).map(Agent::view)
    }

    /// Snapshot of every agent's state and every item's sensationalism.
    pub fn snapshot(&self, run_id: Option<RunId>) -> NetworkSnapshot {
        NetworkSnapshot {
            run_id,
            tick: self.clock.tick(),
            sensationalism: self
                .news
                .iter()
                .map(|(id, item)| (*id, item.sensationalism()))
                .collect(),
            agents: self.agents.values().map(Agent::view).collect(),
        }
    }

    /// Count agents active per news item, inactive, and ignorant.
    pub fn census(&self) -> Census {
        let mut census = Census {
            active_by_news: self.news.keys().map(|id| (*id, 0)).collect(),
            inactive: 0,
            ignorant: 0,
        };
        for agent in self.agents.values() {
            if let Some(news) = agent.active_news() {
                let count = census.active_by_news.entry(news).or_insert(0);
                *count = count.saturating_add(1);
            } else if agent.is_ignorant() {
                census.ignorant = census.ignorant.saturating_add(1);
            } else {
                census.inactive = census.inactive.saturating_add(1);
            }
        }
        census
    }

    // -------------------------------------------------------------------
    // Mutation
    // -------------------------------------------------------------------

    /// Seed `agent` as active for `news`, demoting any other active item.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::UnknownAgent`] or [`NetworkError::UnknownNews`]
    /// without touching the network.
    pub fn activate(&mut self, agent: AgentId, news: NewsId) -> Result<(), NetworkError> {
        self.activate_all(&[(agent, news)])
    }

    /// Seed several agents at once. Later pairs win for a repeated agent.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::UnknownAgent`] or [`NetworkError::UnknownNews`]
    /// for the first bad pair; no agent is activated in that case.
    pub fn activate_all(&mut self, seeds: &[(AgentId, NewsId)]) -> Result<(), NetworkError> {
        for &(agent, news) in seeds {
            if !self.agents.contains_key(&agent) {
                return Err(NetworkError::UnknownAgent(agent));
            }
            if !self.news.contains_key(&news) {
                return Err(NetworkError::UnknownNews(news));
            }
        }
        for &(agent, news) in seeds {
            if let Some(target) = self.agents.get_mut(&agent) {
                target.force_active(news);
            }
        }
        debug!(seeds = seeds.len(), tick = self.clock.tick(), "Agents seeded");
        Ok(())
    }

    /// Advance every news item by one tick.
    pub fn advance_news(&mut self) {
        for item in self.news.values_mut() {
            item.update();
        }
    }

    /// Apply a batch of state deltas atomically.
    ///
    /// Every delta is validated first: the agent must exist, appear once,
    /// carry one state per news item, keep at most one item active, and never
    /// move a state back to `Ignorant`. Only when the whole batch is valid is
    /// anything written. Returns the number of agents whose states changed.
    ///
    /// # Errors
    ///
    /// Returns the first validation failure; the network is unchanged.
    pub fn commit(&mut self, deltas: Vec<StateDelta>) -> Result<usize, NetworkError> {
        self.validate_batch(&deltas)?;
        Ok(self.apply_deltas(deltas))
    }

    /// Run one full tick as a single transaction.
    ///
    /// Every news item is advanced, `decide` computes the deltas against the
    /// advanced news and the unchanged agent states, the deltas are committed,
    /// and the clock moves forward.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::Clock`] if the tick counter would overflow, or
    /// the first validation failure of the deltas. In both cases news, agent
    /// states, and the clock are left as they were.
    pub fn apply_tick<F>(&mut self, decide: F) -> Result<TickCommit, NetworkError>
    where
        F: FnOnce(&Self) -> Vec<StateDelta>,
    {
        let mut clock = self.clock;
        let tick = clock.advance()?;

        let previous_news = self.news.clone();
        self.advance_news();
        let deltas = decide(self);
        if let Err(err) = self.validate_batch(&deltas) {
            self.news = previous_news;
            return Err(err);
        }

        let changed = self.apply_deltas(deltas);
        self.clock = clock;
        Ok(TickCommit { tick, changed })
    }

    /// Validate a whole batch of deltas without writing anything.
    fn validate_batch(&self, deltas: &[StateDelta]) -> Result<(), NetworkError> {
        let mut seen = BTreeSet::new();
        for delta in deltas {
            if !seen.insert(delta.agent) {
                return Err(NetworkError::invalid(format!(
                    "agent {} appears twice in one commit",
                    delta.agent
                )));
            }
            self.validate_delta(delta)?;
        }
        Ok(())
    }

    /// Write validated deltas; returns how many agents actually changed.
    fn apply_deltas(&mut self, deltas: Vec<StateDelta>) -> usize {
        let mut changed: usize = 0;
        for delta in deltas {
            if let Some(agent) = self.agents.get_mut(&delta.agent) {
                if *agent.states() != delta.states {
                    agent.replace_states(delta.states);
                    changed = changed.saturating_add(1);
                }
            }
        }
        changed
    }

    /// Check one delta against the committed state.
    fn validate_delta(&self, delta: &StateDelta) -> Result<(), NetworkError> {
        let agent = self
            .agents
            .get(&delta.agent)
            .ok_or(NetworkError::UnknownAgent(delta.agent))?;

        if delta.states.len() != self.news.len() {
            return Err(NetworkError::invalid(format!(
                "delta for agent {} has {} states for {} news items",
                delta.agent,
                delta.states.len(),
                self.news.len()
            )));
        }

        let mut active: usize = 0;
        for (&news, &to) in &delta.states {
            if !self.news.contains_key(&news) {
                return Err(NetworkError::UnknownNews(news));
            }
            let from = agent.state(news);
            if from.is_aware() && !to.is_aware() {
                return Err(NetworkError::IllegalTransition {
                    agent: delta.agent,
                    news,
                    from,
                    to,
                });
            }
            if to.is_active() {
                active = active.saturating_add(1);
            }
        }
        if active > 1 {
            return Err(NetworkError::MultipleActive {
                agent: delta.agent,
                count: active,
            });
        }
        Ok(())
    }

    /// Advance the tick counter. Returns the new tick number.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::Clock`] if the counter would overflow.
    pub fn advance_clock(&mut self) -> Result<u64, NetworkError> {
        Ok(self.clock.advance()?)
    }
}
