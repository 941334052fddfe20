//! Error types for the engine binary.
//!
//! [`EngineError`] is the top-level error type that wraps all possible
//! failure modes during engine startup and the run itself.

/// Top-level error for the engine binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading or validation failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: contagion_core::config::ConfigError,
    },

    /// Population, news, or graph construction failed.
    #[error("network error: {source}")]
    Network {
        /// The underlying network error.
        #[from]
        source: contagion_network::NetworkError,
    },

    /// Seed selection failed.
    #[error("influence error: {source}")]
    Influence {
        /// The underlying influence error.
        #[from]
        source: contagion_influence::InfluenceError,
    },

    /// The run failed.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: contagion_core::runner::RunnerError,
    },

    /// The cascade history could not be written.
    #[error("history export error: {message}")]
    History {
        /// Description of the export failure.
        message: String,
    },
}
