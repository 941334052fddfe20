//! Shared type definitions for the Contagion simulation.
//!
//! This crate is the single source of truth for the identifiers, belief
//! states, and read-only snapshot structures used across the Contagion
//! workspace. Snapshot types flow downstream to `TypeScript` via `ts-rs`
//! so rendering frontends can consume them without a hand-written schema.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe identifiers for agents, news items, and runs
//! - [`enums`] -- The per-(agent, news) [`BeliefState`]
//! - [`structs`] -- Per-agent state views, network snapshots, and census

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::BeliefState;
pub use ids::{AgentId, NewsId, RunId};
pub use structs::{AgentStateView, Census, NetworkSnapshot};

#[cfg(test)]
mod tests {
    //! Binding generation for the exported snapshot types.

    #[test]
    fn export_bindings() {
        // ts-rs writes TypeScript bindings into `bindings/` relative to
        // the crate root when `export_all` is called.
        use ts_rs::TS;

        let _ = crate::ids::AgentId::export_all();
        let _ = crate::ids::NewsId::export_all();
        let _ = crate::ids::RunId::export_all();
        let _ = crate::enums::BeliefState::export_all();
        let _ = crate::structs::AgentStateView::export_all();
        let _ = crate::structs::NetworkSnapshot::export_all();
        let _ = crate::structs::Census::export_all();
    }
}
