//! Agents: fixed personality, cached neighborhood, and belief states.
//!
//! An [`Agent`] holds one [`BeliefState`] per news item. Its personality
//! (activation threshold and independence) and its neighborhood are fixed
//! at construction. States change only through
//! [`InfluenceNetwork::commit`](crate::InfluenceNetwork::commit) and
//! [`InfluenceNetwork::activate`](crate::InfluenceNetwork::activate).
//!
//! # Invariants
//!
//! - At most one news item is `Active` at any time.
//! - The state map always has exactly one entry per news item of the
//!   owning network.

use std::collections::{BTreeMap, BTreeSet};

use contagion_types::{AgentId, AgentStateView, BeliefState, NewsId};
use serde::{Deserialize, Serialize};

use crate::error::NetworkError;

/// Fixed personality parameters of an agent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Personality {
    /// Excitement needed before the agent shares a news item, in `[0, 1]`.
    pub threshold: f64,
    /// How little the agent is swayed by its providers, in `[0, 1]`.
    /// A fully independent agent (1.0) ignores every provider.
    pub independence: f64,
}

impl Personality {
    /// Create a validated personality.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::InvalidArgument`] if either parameter is
    /// outside `[0, 1]`.
    pub fn new(threshold: f64, independence: f64) -> Result<Self, NetworkError> {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(NetworkError::invalid(format!(
                "threshold must be in [0, 1], got {threshold}"
            )));
        }
        if !(0.0..=1.0).contains(&independence) {
            return Err(NetworkError::invalid(format!(
                "independence must be in [0, 1], got {independence}"
            )));
        }
        Ok(Self {
            threshold,
            independence,
        })
    }

    /// Fraction of a provider's trust weight that reaches this agent.
    pub const fn susceptibility(&self) -> f64 {
        1.0 - self.independence
    }
}

/// A participant of the network.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Agent {
    /// Identifier of the agent.
    id: AgentId,
    /// Fixed personality.
    personality: Personality,
    /// State per news item.
    states: BTreeMap<NewsId, BeliefState>,
    /// Normalized trust in each provider.
    inbound: BTreeMap<AgentId, f64>,
    /// Agents this one passes information to.
    outbound: BTreeSet<AgentId>,
}

impl Agent {
    /// Create an agent ignorant of every news item in `news`.
    pub fn new(
        id: AgentId,
        personality: Personality,
        news: impl IntoIterator<Item = NewsId>,
        inbound: BTreeMap<AgentId, f64>,
        outbound: BTreeSet<AgentId>,
    ) -> Self {
        let states = news
            .into_iter()
            .map(|news_id| (news_id, BeliefState::Ignorant))
            .collect();
        Self {
            id,
            personality,
            states,
            inbound,
            outbound,
        }
    }

    /// Return the identifier.
    pub const fn id(&self) -> AgentId {
        self.id
    }

    /// Return the personality.
    pub const fn personality(&self) -> &Personality {
        &self.personality
    }

    /// Return the activation threshold.
    pub const fn threshold(&self) -> f64 {
        self.personality.threshold
    }

    /// Return the independence.
    pub const fn independence(&self) -> f64 {
        self.personality.independence
    }

    /// Return the trust placed in each provider.
    pub const fn inbound_weights(&self) -> &BTreeMap<AgentId, f64> {
        &self.inbound
    }

    /// Return the receivers of this agent.
    pub const fn outbound_neighbors(&self) -> &BTreeSet<AgentId> {
        &self.outbound
    }

    /// Return the state for every news item.
    pub const fn states(&self) -> &BTreeMap<NewsId, BeliefState> {
        &self.states
    }

    /// Return the state for one news item (`Ignorant` if unknown).
    pub fn state(&self, news: NewsId) -> BeliefState {
        self.states.get(&news).copied().unwrap_or_default()
    }

    /// Return the news item the agent is active for, if any.
    pub fn active_news(&self) -> Option<NewsId> {
        self.states
            .iter()
            .find(|(_, state)| state.is_active())
            .map(|(news, _)| *news)
    }

    /// Whether the agent is active for some news item.
    pub fn is_active(&self) -> bool {
        self.active_news().is_some()
    }

    /// Whether the agent is aware of some item but active for none.
    pub fn is_inactive(&self) -> bool {
        !self.is_active() && self.states.values().any(|state| state.is_aware())
    }

    /// Whether the agent is ignorant of every news item.
    pub fn is_ignorant(&self) -> bool {
        self.states.values().all(|state| !state.is_aware())
    }

    /// Build the read-only view handed to renderers.
    pub fn view(&self) -> AgentStateView {
        AgentStateView {
            agent_id: self.id,
            states: self.states.clone(),
            active_news: self.active_news(),
        }
    }

    /// Replace the full state vector. Callers validate beforehand.
    pub(crate) fn replace_states(&mut self, states: BTreeMap<NewsId, BeliefState>) {
        self.states = states;
    }

    /// Make the agent active for `news`, demoting any other active item.
    pub(crate) fn force_active(&mut self, news: NewsId) {
        for (news_id, state) in &mut self.states {
            if *news_id == news {
                *state = BeliefState::Active;
            } else if state.is_active() {
                *state = BeliefState::Inactive;
            }
        }
    }
}

impl core::fmt::Display for Agent {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "agent {}: threshold {}, independence {}, {} providers, {} receivers",
            self.id,
            self.personality.threshold,
            self.personality.independence,
            self.inbound.len(),
            self.outbound.len()
        )
    }
}
