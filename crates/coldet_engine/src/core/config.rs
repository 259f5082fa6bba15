//! # Collision Engine Configuration
//!
//! Tunables shared by model builders and the collision system. Every field
//! has a default, so a config file only needs to list what it changes.
//!
//! ```toml
//! split_heuristic = "BestBalance"
//! min_queue_capacity = 128
//! sphere_pretest = false
//! ```

use serde::{Deserialize, Serialize};

pub use crate::config::{Config, ConfigError, ConfigFormat};
use crate::physics::collision::DEFAULT_MIN_QUEUE_CAPACITY;
use crate::spatial::SplitHeuristic;

/// Settings for building and querying collision models
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColdetConfig {
    /// Axis selection rule for new box trees
    pub split_heuristic: SplitHeuristic,
    /// Lower bound for the initial size of the per-query work queue
    pub min_queue_capacity: usize,
    /// Reject model pairs whose bounding spheres are apart before walking
    /// their trees
    pub sphere_pretest: bool,
}

impl Default for ColdetConfig {
    fn default() -> Self {
        Self {
            split_heuristic: SplitHeuristic::LargestSpread,
            min_queue_capacity: DEFAULT_MIN_QUEUE_CAPACITY,
            sphere_pretest: true,
        }
    }
}

impl Config for ColdetConfig {}
