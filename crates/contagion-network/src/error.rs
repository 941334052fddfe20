//! Error types for the `contagion-network` crate.
//!
//! All fallible operations in this crate return [`NetworkError`]. Every
//! check runs before any mutation, so an error always leaves the network
//! exactly as it was.

use contagion_types::{AgentId, BeliefState, NewsId};

use crate::clock::ClockError;

/// Errors that can occur while building or mutating an influence network.
#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
    /// A parameter is outside its allowed range.
    #[error("invalid argument: {reason}")]
    InvalidArgument {
        /// Explanation of which parameter is wrong and why.
        reason: String,
    },

    /// The graph does not describe a consistent trust topology.
    #[error("inconsistent topology: {reason}")]
    InconsistentTopology {
        /// Explanation of the inconsistency.
        reason: String,
    },

    /// An agent was not found in the network.
    #[error("agent not found: {0}")]
    UnknownAgent(AgentId),

    /// A news item was not found in the network.
    #[error("news item not found: {0}")]
    UnknownNews(NewsId),

    /// A state delta would move an agent backwards to `Ignorant`.
    #[error("illegal transition for agent {agent} on news {news}: {from:?} -> {to:?}")]
    IllegalTransition {
        /// The agent whose state would change.
        agent: AgentId,
        /// The news item concerned.
        news: NewsId,
        /// The committed state.
        from: BeliefState,
        /// The proposed state.
        to: BeliefState,
    },

    /// A state delta would leave an agent active for more than one item.
    #[error("agent {agent} would be active for {count} news items")]
    MultipleActive {
        /// The offending agent.
        agent: AgentId,
        /// How many items the delta marks active.
        count: usize,
    },

    /// The tick clock failed.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },
}

impl NetworkError {
    /// Shorthand for an [`NetworkError::InvalidArgument`] error.
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            reason: reason.into(),
        }
    }

    /// Shorthand for an [`NetworkError::InconsistentTopology`] error.
    pub fn topology(reason: impl Into<String>) -> Self {
        Self::InconsistentTopology {
            reason: reason.into(),
        }
    }
}
