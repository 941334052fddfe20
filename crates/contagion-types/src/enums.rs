//! Enumeration types for the Contagion simulation.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// The state of one agent with respect to one news item.
///
/// Transitions run `Ignorant -> Inactive -> Active`, and `Active ->
/// Inactive` when a believer lapses. Awareness is permanent: no state ever
/// returns to `Ignorant`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export, export_to = "bindings/")]
pub enum BeliefState {
    /// The agent has never heard of the news item.
    #[default]
    Ignorant,
    /// The agent is aware of the news item but does not share it.
    Inactive,
    /// The agent believes and shares the news item.
    Active,
}

impl BeliefState {
    /// Whether the agent has heard of the news item.
    pub const fn is_aware(self) -> bool {
        !matches!(self, Self::Ignorant)
    }

    /// Whether the agent currently shares the news item.
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }
}
