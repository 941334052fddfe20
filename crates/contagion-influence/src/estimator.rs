//! Expected-reachability estimation by Monte Carlo.
//!
//! A [`ReachEstimator`] draws `N` live-edge samples once, each from its own
//! [`SmallRng`] seeded with [`trial_seed`]`(base_seed, trial)`, and averages
//! the reach of a seed set over them. Every seed set is therefore evaluated
//! on the same samples (common random numbers), which keeps greedy
//! comparisons between candidates free of sampling noise between them and
//! makes results independent of thread scheduling.

use contagion_network::InfluenceNetwork;
use contagion_types::AgentId;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use rayon::prelude::*;

use crate::error::InfluenceError;
use crate::reach::reach;
use crate::sampling::{LiveEdgeModel, LiveEdgeSample};

/// Derive the RNG seed of one trial from the base seed.
///
/// A `SplitMix64` finalizer over the base seed and the trial index, so
/// neighbouring trials get unrelated streams.
pub fn trial_seed(base_seed: u64, trial: u32) -> u64 {
    let mut z = base_seed ^ u64::from(trial).wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// A fixed bank of live-edge samples and the estimator over it.
#[derive(Debug)]
pub struct ReachEstimator<'pool> {
    /// One sample per trial, in trial order.
    samples: Vec<LiveEdgeSample>,
    /// Number of agents in the network.
    agent_count: usize,
    /// Pool for parallel trials; `None` runs on the calling thread.
    pool: Option<&'pool rayon::ThreadPool>,
}

impl<'pool> ReachEstimator<'pool> {
    /// Draw `trials` samples of `network` starting from `base_seed`.
    ///
    /// # Errors
    ///
    /// Returns [`InfluenceError::InvalidArgument`] if `trials` is 0 or the
    /// network's live-edge distributions are malformed.
    pub fn new(
        network: &InfluenceNetwork,
        trials: u32,
        base_seed: u64,
        pool: Option<&'pool rayon::ThreadPool>,
    ) -> Result<Self, InfluenceError> {
        if trials == 0 {
            return Err(InfluenceError::invalid("at least one trial is required"));
        }
        let model = LiveEdgeModel::new(network)?;
        let draw = |trial: u32| model.sample(&mut SmallRng::seed_from_u64(trial_seed(base_seed, trial)));

        let samples = match pool {
            Some(pool) => pool.install(|| (0..trials).into_par_iter().map(draw).collect::<Vec<_>>()),
            None => (0..trials).map(draw).collect::<Vec<_>>(),
        };

        Ok(Self {
            samples,
            agent_count: model.agent_count(),
            pool,
        })
    }

    /// Number of trials.
    pub fn trials(&self) -> usize {
        self.samples.len()
    }

    /// The drawn samples in trial order.
    pub fn samples(&self) -> &[LiveEdgeSample] {
        &self.samples
    }

    /// Mean reach of `seeds` over all trials.
    ///
    /// # Errors
    ///
    /// Returns [`InfluenceError::UnknownAgent`] if a seed is not in the
    /// network.
    pub fn estimate(&self, seeds: &[AgentId]) -> Result<f64, InfluenceError> {
        if let Some(unknown) = seeds.iter().find(|seed| seed.index() >= self.agent_count) {
            return Err(InfluenceError::UnknownAgent(*unknown));
        }

        let total: usize = match self.pool {
            Some(pool) => pool.install(|| {
                self.samples
                    .par_iter()
                    .map(|sample| reach(sample, seeds))
                    .sum()
            }),
            None => self.samples.iter().map(|sample| reach(sample, seeds)).sum(),
        };

        #[allow(clippy::cast_precision_loss)]
        let mean = total as f64 / self.samples.len() as f64;
        Ok(mean)
    }
}

/// Estimate the expected reach of `seeds` with `trials` sequential trials.
///
/// # Errors
///
/// Same conditions as [`ReachEstimator::new`] and [`ReachEstimator::estimate`].
pub fn expected_reach(
    network: &InfluenceNetwork,
    seeds: &[AgentId],
    trials: u32,
    base_seed: u64,
) -> Result<f64, InfluenceError> {
    ReachEstimator::new(network, trials, base_seed, None)?.estimate(seeds)
}
