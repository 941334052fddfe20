//! Error types for influence maximization.

use contagion_types::AgentId;

/// Errors that can occur while sampling or selecting seeds.
#[derive(Debug, thiserror::Error)]
pub enum InfluenceError {
    /// A caller-supplied argument is out of range.
    #[error("invalid argument: {reason}")]
    InvalidArgument {
        /// What is wrong with the argument.
        reason: String,
    },

    /// A seed names an agent outside the network.
    #[error("unknown agent {0}")]
    UnknownAgent(AgentId),

    /// The worker pool for parallel trials could not be created.
    #[error("failed to build worker pool: {source}")]
    ThreadPool {
        /// The underlying rayon error.
        #[from]
        source: rayon::ThreadPoolBuildError,
    },
}

impl InfluenceError {
    /// Shorthand for [`InfluenceError::InvalidArgument`].
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            reason: reason.into(),
        }
    }
}
