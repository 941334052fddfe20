//! Configuration loading and typed config structures for the Contagion simulation.
//!
//! The canonical configuration lives in `contagion-config.yaml` at the project
//! root; the `CONTAGION_CONFIG` environment variable points the loader at a
//! different file. This module defines strongly-typed structs that mirror the
//! YAML structure, a loader, and [`SimulationConfig::validate`] for the
//! cross-field checks that serde cannot express.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use contagion_network::EdgeWeighting;
use contagion_types::{AgentId, NewsId};
use serde::Deserialize;

/// Environment variable overriding the configuration file path.
pub const CONFIG_PATH_ENV: &str = "CONTAGION_CONFIG";

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "contagion-config.yaml";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The configuration parsed but is semantically invalid.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// What is wrong.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

impl ConfigError {
    fn invalid(reason: impl Into<String>) -> Self {
        Self::Invalid {
            reason: reason.into(),
        }
    }
}

/// Top-level simulation configuration.
///
/// Mirrors the structure of `contagion-config.yaml`. All fields have
/// defaults, so an empty file is a valid (if small) simulation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SimulationConfig {
    /// Run-level settings (name, seed, tick limits, workers).
    #[serde(default)]
    pub run: RunConfig,

    /// Agent count and personality parameters.
    #[serde(default)]
    pub population: PopulationConfig,

    /// News items competing in the network.
    #[serde(default = "default_news")]
    pub news: Vec<NewsConfig>,

    /// Trust graph edges and weighting scheme.
    #[serde(default)]
    pub network: NetworkConfig,

    /// Initial and scheduled activations.
    #[serde(default)]
    pub seeding: Vec<SeedingConfig>,

    /// Influence maximization parameters.
    #[serde(default)]
    pub influence: InfluenceConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            run: RunConfig::default(),
            population: PopulationConfig::default(),
            news: default_news(),
            network: NetworkConfig::default(),
            seeding: Vec::new(),
            influence: InfluenceConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl SimulationConfig {
    /// Resolve the configuration path: `CONTAGION_CONFIG` if set, else
    /// `contagion-config.yaml` in the working directory.
    pub fn config_path() -> PathBuf {
        std::env::var_os(CONFIG_PATH_ENV)
            .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE), PathBuf::from)
    }

    /// Load configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yml::from_str(yaml)?)
    }

    /// Check cross-field consistency before any network is built.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.run.validate()?;
        self.population.validate()?;

        let mut news_ids = BTreeSet::new();
        for item in &self.news {
            if !news_ids.insert(item.id) {
                return Err(ConfigError::invalid(format!("duplicate news id {}", item.id)));
            }
            item.validate()?;
        }

        let agents = self.population.agents;
        self.network.validate(agents)?;

        for (index, seeding) in self.seeding.iter().enumerate() {
            if !news_ids.contains(&seeding.news) {
                return Err(ConfigError::invalid(format!(
                    "seeding entry {index} references unknown news {}",
                    seeding.news
                )));
            }
            seeding.validate(index, agents)?;
        }

        let uses_influence = self
            .seeding
            .iter()
            .any(|seeding| seeding.strategy == SeedStrategy::Influence);
        if uses_influence && self.influence.trials == 0 {
            return Err(ConfigError::invalid(
                "influence seeding requires influence.trials > 0",
            ));
        }
        Ok(())
    }

    /// Seed used by the influence maximizer (its own or the run seed).
    pub fn influence_seed(&self) -> u64 {
        self.influence.seed.unwrap_or(self.run.seed)
    }
}

/// Run-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RunConfig {
    /// Human-readable run name.
    #[serde(default = "default_run_name")]
    pub name: String,

    /// Random seed for reproducibility.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Maximum number of ticks to execute.
    #[serde(default = "default_max_ticks")]
    pub max_ticks: u64,

    /// Stop as soon as a tick changes no agent.
    #[serde(default = "default_true")]
    pub stop_at_convergence: bool,

    /// Threads for the decision phase; 1 runs it sequentially.
    #[serde(default = "default_worker_threads")]
    pub worker_threads: usize,

    /// Where to write the cascade history as JSON after the run.
    #[serde(default)]
    pub history_path: Option<PathBuf>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            name: default_run_name(),
            seed: default_seed(),
            max_ticks: default_max_ticks(),
            stop_at_convergence: true,
            worker_threads: default_worker_threads(),
            history_path: None,
        }
    }
}

impl RunConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.worker_threads == 0 {
            return Err(ConfigError::invalid("run.worker_threads must be at least 1"));
        }
        Ok(())
    }
}

/// Population configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PopulationConfig {
    /// Number of agents.
    #[serde(default = "default_agents")]
    pub agents: u32,

    /// Activation threshold shared by every agent without an override.
    #[serde(default = "default_threshold")]
    pub threshold: f64,

    /// Independence shared by every agent without an override.
    #[serde(default = "default_independence")]
    pub independence: f64,

    /// Per-agent personality overrides.
    #[serde(default)]
    pub overrides: Vec<AgentOverrideConfig>,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            agents: default_agents(),
            threshold: default_threshold(),
            independence: default_independence(),
            overrides: Vec::new(),
        }
    }
}

impl PopulationConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.agents == 0 {
            return Err(ConfigError::invalid("population.agents must be at least 1"));
        }
        check_unit("population.threshold", self.threshold)?;
        check_unit("population.independence", self.independence)?;
        for entry in &self.overrides {
            if entry.agent >= self.agents {
                return Err(ConfigError::invalid(format!(
                    "override for agent {} outside 0..{}",
                    entry.agent, self.agents
                )));
            }
            if let Some(threshold) = entry.threshold {
                check_unit("override threshold", threshold)?;
            }
            if let Some(independence) = entry.independence {
                check_unit("override independence", independence)?;
            }
        }
        Ok(())
    }
}

/// Personality override for one agent.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct AgentOverrideConfig {
    /// Agent index.
    pub agent: u32,
    /// Replacement threshold, if any.
    #[serde(default)]
    pub threshold: Option<f64>,
    /// Replacement independence, if any.
    #[serde(default)]
    pub independence: Option<f64>,
}

impl AgentOverrideConfig {
    /// Agent identifier of the override.
    pub const fn agent_id(&self) -> AgentId {
        AgentId::new(self.agent)
    }
}

/// One news item.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct NewsConfig {
    /// News identifier.
    pub id: u32,
    /// Initial sensationalism in `[0, 1]`.
    #[serde(default = "default_sensationalism")]
    pub sensationalism: f64,
    /// Exponential decay parameter.
    #[serde(default = "default_decay_rate")]
    pub decay_rate: f64,
}

impl NewsConfig {
    /// News identifier as a typed id.
    pub const fn news_id(&self) -> NewsId {
        NewsId::new(self.id)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        check_unit("news sensationalism", self.sensationalism)?;
        if !self.decay_rate.is_finite() || self.decay_rate < 0.0 {
            return Err(ConfigError::invalid(format!(
                "decay rate of news {} must be finite and >= 0",
                self.id
            )));
        }
        Ok(())
    }
}

/// One edge as written in YAML: `[from, to]` or `[from, to, weight]`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum EdgeConfig {
    /// Edge with an explicit raw weight.
    Weighted(u32, u32, f64),
    /// Edge without a weight.
    Plain(u32, u32),
}

impl EdgeConfig {
    /// Provider, receiver, and raw weight (1.0 when none is given).
    pub const fn to_raw(self) -> (AgentId, AgentId, f64) {
        match self {
            Self::Weighted(from, to, weight) => (AgentId::new(from), AgentId::new(to), weight),
            Self::Plain(from, to) => (AgentId::new(from), AgentId::new(to), 1.0),
        }
    }
}

/// Trust graph configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct NetworkConfig {
    /// Provider-to-receiver edges.
    #[serde(default)]
    pub edges: Vec<EdgeConfig>,

    /// How raw weights are assigned before normalization.
    #[serde(default)]
    pub weighting: EdgeWeighting,
}

impl NetworkConfig {
    fn validate(&self, agents: u32) -> Result<(), ConfigError> {
        for edge in &self.edges {
            let (from, to, weight) = edge.to_raw();
            if from.into_inner() >= agents || to.into_inner() >= agents {
                return Err(ConfigError::invalid(format!(
                    "edge {from} -> {to} outside 0..{agents}"
                )));
            }
            if self.weighting == EdgeWeighting::Explicit {
                if matches!(edge, EdgeConfig::Plain(..)) {
                    return Err(ConfigError::invalid(format!(
                        "edge {from} -> {to} needs a weight under explicit weighting"
                    )));
                }
                if !(weight.is_finite() && weight > 0.0) {
                    return Err(ConfigError::invalid(format!(
                        "edge {from} -> {to} has non-positive weight {weight}"
                    )));
                }
            }
        }
        Ok(())
    }

    /// All edges as `(provider, receiver, raw weight)` triples.
    pub fn raw_edges(&self) -> Vec<(AgentId, AgentId, f64)> {
        self.edges.iter().map(|edge| edge.to_raw()).collect()
    }
}

/// How the agents of a seeding entry are chosen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedStrategy {
    /// Use the listed agents.
    #[default]
    Explicit,
    /// Pick the `count` agents with the largest out-degree.
    Degree,
    /// Pick `count` agents by greedy influence maximization.
    Influence,
}

/// One seeding entry: activate agents for a news item at a tick.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SeedingConfig {
    /// Tick before which the activation is applied.
    #[serde(default)]
    pub tick: u64,

    /// News item to activate.
    pub news: u32,

    /// Selection strategy.
    #[serde(default)]
    pub strategy: SeedStrategy,

    /// Agents for the explicit strategy.
    #[serde(default)]
    pub agents: Vec<u32>,

    /// Number of agents for the degree and influence strategies.
    #[serde(default)]
    pub count: u32,
}

impl SeedingConfig {
    /// News identifier as a typed id.
    pub const fn news_id(&self) -> NewsId {
        NewsId::new(self.news)
    }

    fn validate(&self, index: usize, agents: u32) -> Result<(), ConfigError> {
        match self.strategy {
            SeedStrategy::Explicit => {
                if let Some(agent) = self.agents.iter().find(|agent| **agent >= agents) {
                    return Err(ConfigError::invalid(format!(
                        "seeding entry {index} names agent {agent} outside 0..{agents}"
                    )));
                }
            }
            SeedStrategy::Degree | SeedStrategy::Influence => {
                if self.count > agents {
                    return Err(ConfigError::invalid(format!(
                        "seeding entry {index} asks for {} agents out of {agents}",
                        self.count
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Influence maximization configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct InfluenceConfig {
    /// Monte Carlo trials per reach estimate.
    #[serde(default = "default_trials")]
    pub trials: u32,

    /// Sampling seed; falls back to `run.seed`.
    #[serde(default)]
    pub seed: Option<u64>,

    /// Run trials on the rayon pool.
    #[serde(default)]
    pub parallel: bool,
}

impl Default for InfluenceConfig {
    fn default() -> Self {
        Self {
            trials: default_trials(),
            seed: None,
            parallel: false,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (`trace`, `debug`, `info`, `warn`, `error`).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn check_unit(name: &str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::invalid(format!(
            "{name} must be in [0, 1], got {value}"
        )))
    }
}

// ---------------------------------------------------------------------------
// Default value functions
// ---------------------------------------------------------------------------

fn default_run_name() -> String {
    "Contagion".to_owned()
}

const fn default_seed() -> u64 {
    42
}

const fn default_max_ticks() -> u64 {
    100
}

const fn default_worker_threads() -> usize {
    1
}

const fn default_agents() -> u32 {
    100
}

const fn default_threshold() -> f64 {
    0.5
}

const fn default_independence() -> f64 {
    0.1
}

fn default_news() -> Vec<NewsConfig> {
    vec![NewsConfig {
        id: 0,
        sensationalism: default_sensationalism(),
        decay_rate: default_decay_rate(),
    }]
}

const fn default_sensationalism() -> f64 {
    0.5
}

const fn default_decay_rate() -> f64 {
    0.1
}

const fn default_trials() -> u32 {
    200
}

fn default_log_level() -> String {
    "info".to_owned()
}

const fn default_true() -> bool {
    true
}
