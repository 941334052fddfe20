//! Diffusion rule, tick cycle, and run driver for the Contagion simulation.
//!
//! This crate owns the synchronous compute-then-commit tick that moves
//! belief states through an [`InfluenceNetwork`]: news decay, per-agent
//! decisions against the start-of-tick state, one atomic commit, and the
//! clock advance.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `contagion-config.yaml` into
//!   strongly-typed structs.
//! - [`control`] -- [`RunControl`] tick limit, convergence policy, and stop flag.
//! - [`diffusion`] -- The pure per-agent decision rule.
//! - [`history`] -- [`CascadeHistory`], active counts per news item per tick.
//! - [`runner`] -- The full-run driver with scheduled seeding and observers.
//! - [`tick`] -- [`DiffusionEngine`] and the four-step tick cycle.
//!
//! [`InfluenceNetwork`]: contagion_network::InfluenceNetwork
//! [`RunControl`]: control::RunControl
//! [`CascadeHistory`]: history::CascadeHistory
//! [`DiffusionEngine`]: tick::DiffusionEngine

pub mod config;
pub mod control;
pub mod diffusion;
pub mod history;
pub mod runner;
pub mod tick;
