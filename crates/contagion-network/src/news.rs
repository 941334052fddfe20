//! News items and their sensationalism decay.
//!
//! A news item starts with a sensationalism score in `[0, 1]` that
//! attenuates exponentially as the item ages. The engine calls
//! [`NewsItem::update`] exactly once per tick, before any agent is
//! evaluated, so agents always see the decayed value of the current tick.

use contagion_types::NewsId;
use serde::Serialize;

use crate::error::NetworkError;

/// A unit of content spreading through the network.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewsItem {
    /// Identifier of the item.
    id: NewsId,
    /// How eye-catching the item currently is, in `[0, 1]`.
    sensationalism: f64,
    /// Exponential decay parameter, `>= 0`.
    decay_rate: f64,
    /// Number of ticks the item has been out.
    age_ticks: u64,
}

impl NewsItem {
    /// Create a fresh news item at age 0.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::InvalidArgument`] if `sensationalism` is not
    /// in `[0, 1]` or `decay_rate` is negative or not finite.
    pub fn new(id: NewsId, sensationalism: f64, decay_rate: f64) -> Result<Self, NetworkError> {
        if !(0.0..=1.0).contains(&sensationalism) {
            return Err(NetworkError::invalid(format!(
                "sensationalism of news {id} must be in [0, 1], got {sensationalism}"
            )));
        }
        if !decay_rate.is_finite() || decay_rate < 0.0 {
            return Err(NetworkError::invalid(format!(
                "decay rate of news {id} must be finite and >= 0, got {decay_rate}"
            )));
        }
        Ok(Self {
            id,
            sensationalism,
            decay_rate,
            age_ticks: 0,
        })
    }

    /// Advance the item by one tick.
    ///
    /// Sets `sensationalism <- sensationalism * exp(-decay_rate * age_ticks)`
    /// and then increments the age. The first update leaves the score
    /// unchanged because the age is still 0 when it is applied.
    pub fn update(&mut self) {
        #[allow(clippy::cast_precision_loss)]
        let age = self.age_ticks as f64;
        self.sensationalism *= (-self.decay_rate * age).exp();
        self.age_ticks = self.age_ticks.saturating_add(1);
    }

    /// Return the identifier.
    pub const fn id(&self) -> NewsId {
        self.id
    }

    /// Return the current sensationalism.
    pub const fn sensationalism(&self) -> f64 {
        self.sensationalism
    }

    /// Return the decay parameter.
    pub const fn decay_rate(&self) -> f64 {
        self.decay_rate
    }

    /// Return the number of ticks the item has been out.
    pub const fn age_ticks(&self) -> u64 {
        self.age_ticks
    }
}

impl core::fmt::Display for NewsItem {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "news {}: sensationalism {:.4}, decay rate {}",
            self.id, self.sensationalism, self.decay_rate
        )
    }
}
