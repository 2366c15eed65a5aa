//! Engine configuration
//!
//! Defaults reproduce the behavior operators expect out of the box: ten rows
//! minimum, a 100-tree forest and a 100-stage boosted ensemble, both seeded
//! with 42. Any subset of fields can be overridden from JSON.
//!
//! ```rust
//! use trueno_grid::config::EngineConfig;
//!
//! let config = EngineConfig::from_json(r#"{ "training": { "forest": { "n_trees": 20 } } }"#)?;
//! assert_eq!(config.training.forest.n_trees, 20);
//! assert_eq!(config.training.forest.seed, 42);
//! assert_eq!(config.training.min_rows, 10);
//! # Ok::<(), trueno_grid::Error>(())
//! ```

use serde::{Deserialize, Serialize};

use crate::Result;

/// Random forest hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    /// Number of bootstrap trees
    pub n_trees: usize,
    /// Seed for bootstrap sampling and feature order
    pub seed: u64,
    /// Depth limit, `None` grows until leaves are pure
    pub max_depth: Option<usize>,
    /// Minimum rows for a node to be split
    pub min_samples_split: usize,
    /// Minimum rows on each side of a split
    pub min_samples_leaf: usize,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            seed: 42,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }
}

/// Gradient boosting hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoostingConfig {
    /// Number of boosting stages
    pub n_stages: usize,
    /// Shrinkage applied to every stage
    pub learning_rate: f64,
    /// Depth of each stage tree
    pub max_depth: usize,
    /// Seed for feature order
    pub seed: u64,
    /// Minimum rows for a node to be split
    pub min_samples_split: usize,
    /// Minimum rows on each side of a split
    pub min_samples_leaf: usize,
}

impl Default for BoostingConfig {
    fn default() -> Self {
        Self {
            n_stages: 100,
            learning_rate: 0.1,
            max_depth: 3,
            seed: 42,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }
}

/// Training pipeline settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Fewer stored records than this fails with `InsufficientData`
    pub min_rows: usize,
    /// Random forest settings
    pub forest: ForestConfig,
    /// Gradient boosting settings
    pub boosting: BoostingConfig,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            min_rows: 10,
            forest: ForestConfig::default(),
            boosting: BoostingConfig::default(),
        }
    }
}

/// Top-level engine settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Training pipeline settings
    pub training: TrainingConfig,
    /// Records sampled when a schema has to be inferred from the store
    pub schema_sample_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            training: TrainingConfig::default(),
            schema_sample_limit: 200,
        }
    }
}

impl EngineConfig {
    /// Parse a (possibly partial) JSON document over the defaults.
    ///
    /// # Errors
    ///
    /// Returns a JSON error on malformed input or unknown value types.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.training.min_rows, 10);
        assert_eq!(config.training.forest.n_trees, 100);
        assert_eq!(config.training.forest.seed, 42);
        assert_eq!(config.training.boosting.n_stages, 100);
        assert_eq!(config.training.boosting.max_depth, 3);
        assert!((config.training.boosting.learning_rate - 0.1).abs() < f64::EPSILON);
        assert_eq!(config.schema_sample_limit, 200);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config =
            EngineConfig::from_json(r#"{ "training": { "min_rows": 5 }, "schema_sample_limit": 50 }"#)
                .unwrap();
        assert_eq!(config.training.min_rows, 5);
        assert_eq!(config.training.forest, ForestConfig::default());
        assert_eq!(config.schema_sample_limit, 50);
    }

    #[test]
    fn test_malformed_json() {
        assert!(EngineConfig::from_json("{ not json").is_err());
    }
}
