//! Influence maximization over the Contagion trust graph.
//!
//! Chooses which agents to seed so that a news item reaches as many agents
//! as possible. Reach is estimated by Monte Carlo over live-edge samples of
//! the linear threshold model, and seeds are picked greedily by marginal
//! gain. The network's belief states are never read or changed.
//!
//! # Modules
//!
//! - [`centrality`] -- Out-degree heuristic for cheap seed choices.
//! - [`error`] -- [`InfluenceError`].
//! - [`estimator`] -- [`ReachEstimator`], a fixed bank of samples shared by
//!   every seed set it evaluates.
//! - [`greedy`] -- [`InfluenceMaximizer`] and its [`SeedSelection`].
//! - [`reach`] -- Reachability from a seed set within one sample.
//! - [`sampling`] -- [`LiveEdgeModel`] and [`LiveEdgeSample`].

pub mod centrality;
pub mod error;
pub mod estimator;
pub mod greedy;
pub mod reach;
pub mod sampling;

// Re-export primary types at crate root.
pub use centrality::degree_seeds;
pub use error::InfluenceError;
pub use estimator::{ReachEstimator, expected_reach, trial_seed};
pub use greedy::{InfluenceMaximizer, SeedSelection};
pub use reach::reach;
pub use sampling::{LiveEdgeModel, LiveEdgeSample, ProviderChoice};
