//! Run control state shared between the run loop and its caller.
//!
//! [`RunControl`] carries the tick limit, the convergence policy, and a
//! stop flag. The flag is an [`AtomicBool`] so another thread holding the
//! control behind an [`Arc`](std::sync::Arc) can cancel a run; the loop
//! checks it between ticks, never inside one.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::config::RunConfig;

/// Limits and cancellation for one run.
#[derive(Debug)]
pub struct RunControl {
    /// Whether a stop has been requested.
    stop_requested: AtomicBool,

    /// Maximum number of ticks to execute in this run.
    max_ticks: u64,

    /// Whether a fixed point ends the run.
    stop_at_convergence: bool,
}

impl RunControl {
    /// Create run control state.
    pub const fn new(max_ticks: u64, stop_at_convergence: bool) -> Self {
        Self {
            stop_requested: AtomicBool::new(false),
            max_ticks,
            stop_at_convergence,
        }
    }

    /// Create run control state from the `run` configuration section.
    pub const fn from_config(config: &RunConfig) -> Self {
        Self::new(config.max_ticks, config.stop_at_convergence)
    }

    // -----------------------------------------------------------------------
    // Stop
    // -----------------------------------------------------------------------

    /// Request a clean stop before the next tick.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
    }

    /// Check whether a stop has been requested.
    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    // -----------------------------------------------------------------------
    // Limits
    // -----------------------------------------------------------------------

    /// Maximum number of ticks.
    pub const fn max_ticks(&self) -> u64 {
        self.max_ticks
    }

    /// Whether a fixed point ends the run.
    pub const fn stop_at_convergence(&self) -> bool {
        self.stop_at_convergence
    }

    /// Whether `ticks_run` ticks exhaust the limit.
    pub const fn tick_limit_reached(&self, ticks_run: u64) -> bool {
        ticks_run >= self.max_ticks
    }
}
