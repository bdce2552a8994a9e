use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusteringConfig {
    /// Upper bound for the default cluster count: k = min(max_clusters, n)
    #[serde(default = "default_max_clusters")]
    pub max_clusters: usize,
    /// Seed for k-means++ initialisation
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    /// Relative to the mean per-feature variance of the batch
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    /// Independent restarts; the lowest-inertia run wins
    #[serde(default = "default_n_init")]
    pub n_init: usize,
}

fn default_max_clusters() -> usize {
    3
}
fn default_seed() -> u64 {
    42
}
fn default_max_iterations() -> usize {
    300
}
fn default_tolerance() -> f64 {
    1e-4
}
fn default_n_init() -> usize {
    1
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            max_clusters: default_max_clusters(),
            seed: default_seed(),
            max_iterations: default_max_iterations(),
            tolerance: default_tolerance(),
            n_init: default_n_init(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingConfig {
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    #[serde(default = "default_dislike_weight")]
    pub dislike_weight: f64,
}

fn default_top_n() -> usize {
    30
}
fn default_dislike_weight() -> f64 {
    1.0
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
            dislike_weight: default_dislike_weight(),
        }
    }
}
