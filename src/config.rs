//! Configuration management for multipartite community detection

use serde::{Deserialize, Serialize};

/// Smallest modularity improvement that still counts as progress
pub const MIN_MODULARITY_GAIN: f64 = 1e-7;

/// How edge weights arriving at a node are grouped by neighbor community.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum IncomingWeights {
    /// Sum every predecessor edge into its community's bucket
    #[default]
    Accumulate,

    /// Rank moves with the historical aggregation, where each predecessor
    /// edge overwrites its bucket with `outgoing[c] + w` instead of
    /// accumulating. Community aggregates and recorded modularity stay exact.
    /// Only useful to compare against results produced that way.
    Legacy,
}

/// Parameters of one community detection run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LouvainConfig {
    /// Multiplies the degree term; larger values favor smaller communities
    pub resolution: f64,

    /// Per-type penalty on same-type concentration; zeros when absent
    pub beta_penalty: Option<Vec<f64>>,

    /// Seed of the run's random generator
    pub seed: u64,

    /// Edge attribute holding the weight
    pub weight_key: String,

    /// Node attribute holding the type vector
    pub nodetype_key: String,

    /// Incoming neighbor aggregation mode
    pub incoming: IncomingWeights,

    /// Stop after this many accepted levels (at least 1)
    pub max_levels: Option<usize>,

    /// Stop each local search after this many sweeps (at least 1)
    pub max_sweeps: Option<usize>,
}

impl Default for LouvainConfig {
    fn default() -> Self {
        Self {
            resolution: 1.0,
            beta_penalty: None,
            seed: 42,
            weight_key: "weight".to_string(),
            nodetype_key: "type".to_string(),
            incoming: IncomingWeights::Accumulate,
            max_levels: None,
            max_sweeps: None,
        }
    }
}

impl LouvainConfig {
    /// Create a new configuration with custom core values
    pub fn new(resolution: f64, beta_penalty: Option<Vec<f64>>, seed: u64) -> Self {
        Self {
            resolution,
            beta_penalty,
            seed,
            ..Self::default()
        }
    }
}
