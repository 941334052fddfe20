//! Greedy seed selection.
//!
//! For `i = 1..k` every agent not yet selected is evaluated by the expected
//! reach of `selected ∪ {candidate}`, and the candidate with the strictly
//! largest estimate is added. Candidates are visited in ascending id order,
//! so ties go to the lowest id and a fixed seed gives a fixed selection.
//!
//! The outer loop is sequential; the trials behind each estimate run on a
//! rayon pool when the maximizer has more than one worker.

use std::collections::BTreeSet;

use contagion_network::InfluenceNetwork;
use contagion_types::AgentId;
use tracing::{debug, info};

use crate::error::InfluenceError;
use crate::estimator::ReachEstimator;

/// Ordered seeds with the estimated expected reach of every prefix.
#[derive(Debug, Clone, PartialEq)]
pub struct SeedSelection {
    /// Seeds in the order they were selected.
    pub seeds: Vec<AgentId>,
    /// `prefix_reach[i]` is the estimated reach of `seeds[..=i]`.
    pub prefix_reach: Vec<f64>,
}

impl SeedSelection {
    /// Number of selected seeds.
    pub fn len(&self) -> usize {
        self.seeds.len()
    }

    /// Whether no seed was selected.
    pub fn is_empty(&self) -> bool {
        self.seeds.is_empty()
    }

    /// Estimated reach of the full seed set (0 when empty).
    pub fn expected_reach(&self) -> f64 {
        self.prefix_reach.last().copied().unwrap_or(0.0)
    }

    /// Marginal gain of every seed over the prefix before it.
    pub fn marginal_gains(&self) -> Vec<f64> {
        let mut previous = 0.0;
        self.prefix_reach
            .iter()
            .map(|reach| {
                let gain = reach - previous;
                previous = *reach;
                gain
            })
            .collect()
    }
}

/// Greedy influence maximizer with Monte Carlo reach estimation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InfluenceMaximizer {
    /// Trials per reach estimate.
    trials: u32,
    /// Base seed of the per-trial RNGs.
    seed: u64,
    /// Worker threads; 1 is sequential, 0 lets rayon pick.
    workers: usize,
}

impl InfluenceMaximizer {
    /// Create a sequential maximizer.
    pub const fn new(trials: u32, seed: u64) -> Self {
        Self {
            trials,
            seed,
            workers: 1,
        }
    }

    /// Run trials on `workers` threads (0 lets rayon pick the count).
    #[must_use]
    pub const fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Trials per reach estimate.
    pub const fn trials(&self) -> u32 {
        self.trials
    }

    /// Base seed.
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Select `k` seeds among all agents.
    ///
    /// # Errors
    ///
    /// Returns [`InfluenceError::InvalidArgument`] if `k` exceeds the number
    /// of agents or the maximizer has zero trials, and
    /// [`InfluenceError::ThreadPool`] if the worker pool cannot start.
    pub fn select_seeds(
        &self,
        network: &InfluenceNetwork,
        k: usize,
    ) -> Result<SeedSelection, InfluenceError> {
        self.select_seeds_excluding(network, k, &BTreeSet::new())
    }

    /// Select `k` seeds, never picking an agent in `excluded`.
    ///
    /// Excluded agents are still part of every sampled subgraph; they are
    /// only skipped as candidates.
    ///
    /// # Errors
    ///
    /// Same conditions as [`InfluenceMaximizer::select_seeds`], with `k`
    /// checked against the agents left after exclusion.
    pub fn select_seeds_excluding(
        &self,
        network: &InfluenceNetwork,
        k: usize,
        excluded: &BTreeSet<AgentId>,
    ) -> Result<SeedSelection, InfluenceError> {
        if self.trials == 0 {
            return Err(InfluenceError::invalid("at least one trial is required"));
        }
        let candidates: Vec<AgentId> = network
            .agents()
            .map(contagion_network::Agent::id)
            .filter(|agent| !excluded.contains(agent))
            .collect();
        if k > candidates.len() {
            return Err(InfluenceError::invalid(format!(
                "cannot select {k} seeds from {} candidate agents",
                candidates.len()
            )));
        }

        let pool = if self.workers == 1 {
            None
        } else {
            Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(self.workers)
                    .build()?,
            )
        };

        info!(
            k,
            candidates = candidates.len(),
            trials = self.trials,
            seed = self.seed,
            workers = pool.as_ref().map_or(1, rayon::ThreadPool::current_num_threads),
            "Seed selection starting"
        );

        let estimator = ReachEstimator::new(network, self.trials, self.seed, pool.as_ref())?;
        let mut seeds: Vec<AgentId> = Vec::with_capacity(k);
        let mut prefix_reach: Vec<f64> = Vec::with_capacity(k);
        let mut selected: BTreeSet<AgentId> = BTreeSet::new();

        for round in 1..=k {
            let mut best: Option<(AgentId, f64)> = None;
            let mut trial_set = seeds.clone();

            for candidate in &candidates {
                if selected.contains(candidate) {
                    continue;
                }
                trial_set.push(*candidate);
                let value = estimator.estimate(&trial_set);
                trial_set.pop();
                let value = value?;
                if best.is_none_or(|(_, top)| value > top) {
                    best = Some((*candidate, value));
                }
            }

            let Some((agent, value)) = best else {
                break;
            };
            debug!(round, %agent, estimate = value, "Seed selected");
            selected.insert(agent);
            seeds.push(agent);
            prefix_reach.push(value);
        }

        info!(
            seeds = seeds.len(),
            expected_reach = prefix_reach.last().copied().unwrap_or(0.0),
            "Seed selection finished"
        );

        Ok(SeedSelection {
            seeds,
            prefix_reach,
        })
    }
}
