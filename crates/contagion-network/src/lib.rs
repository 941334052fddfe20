//! Agents, news items, and the trust graph for the Contagion simulation.
//!
//! This crate models the population: a fixed directed graph whose edges
//! carry normalized trust weights from information providers to receivers,
//! the agents sitting on its nodes with their per-news belief states, and
//! the news items whose sensationalism decays as they age.
//!
//! # Modules
//!
//! - [`agent`] -- [`Agent`] personality, cached neighbors, and belief states.
//! - [`clock`] -- [`TickClock`], the monotonic tick counter.
//! - [`error`] -- Error types for construction and state commits.
//! - [`graph`] -- [`TrustGraph`], edge weighting schemes, and the
//!   [`GraphGenerator`] seam for externally synthesized topologies.
//! - [`network`] -- [`InfluenceNetwork`], the owner of agents, news, and
//!   graph, with construction entry points, seeding, snapshots, and the
//!   atomic commit of state deltas.
//! - [`news`] -- [`NewsItem`] with exponential sensationalism decay.

pub mod agent;
pub mod clock;
pub mod error;
pub mod graph;
pub mod network;
pub mod news;

// Re-export primary types at crate root.
pub use agent::{Agent, Personality};
pub use clock::{ClockError, TickClock};
pub use error::NetworkError;
pub use graph::{EdgeWeighting, GraphGenerator, TrustEdge, TrustGraph, WEIGHT_TOLERANCE};
pub use network::{GraphSource, InfluenceNetwork, Population, StateDelta, TickCommit};
pub use news::NewsItem;
