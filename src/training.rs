//! Training pipeline
//!
//! Fits every [`Algorithm`] against the same design matrix and scores each
//! one in-sample. The pipeline is synchronous and CPU bound; the engine runs
//! it on a blocking worker.
//!
//! Preconditions are checked in a fixed order so callers always see the
//! first failing one:
//!
//! 1. no schema → `Validation(NoSchema)`
//! 2. fewer than `min_rows` records → `Validation(InsufficientData)`
//! 3. no target or no features → `Validation(NoTargetOrFeatures)`
//! 4. fewer than `min_rows` complete rows → `Validation(InsufficientData)`

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::config::TrainingConfig;
use crate::error::ValidationError;
use crate::frame::DesignFrame;
use crate::metrics::RegressionMetrics;
use crate::model::Algorithm;
use crate::record::Record;
use crate::registry::TrainedModel;
use crate::schema::DatasetSchema;
use crate::Result;

/// Scores for one fitted algorithm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingResult {
    /// Algorithm key
    pub algorithm: Algorithm,
    /// Display name
    pub name: String,
    /// In-sample metrics
    pub metrics: RegressionMetrics,
    /// Feature name → importance, one entry per feature
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feature_importance: Option<BTreeMap<String, f64>>,
}

/// What a training run reports back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    /// Per-algorithm results
    pub models: BTreeMap<Algorithm, TrainingResult>,
    /// Complete rows the models were fit on
    pub samples: usize,
    /// Schema the run was trained against
    pub schema: DatasetSchema,
    /// When the run finished
    pub trained_at: DateTime<Utc>,
}

/// Report plus the fitted models, ready to install in a registry.
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    /// Caller-facing report
    pub report: TrainingReport,
    /// Fitted models, one per algorithm
    pub models: Vec<TrainedModel>,
}

/// Fits and scores all algorithms with a fixed configuration.
#[derive(Debug, Clone, Default)]
pub struct TrainingPipeline {
    config: TrainingConfig,
}

impl TrainingPipeline {
    /// Pipeline with the given settings.
    #[must_use]
    pub const fn new(config: TrainingConfig) -> Self {
        Self { config }
    }

    /// Active settings.
    #[must_use]
    pub const fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Train every algorithm against `records` using `schema`'s split.
    ///
    /// # Errors
    ///
    /// Returns a `Validation` error for the first unmet precondition (see the
    /// module docs), or an Arrow error if the design matrix cannot be built.
    pub fn train(&self, schema: Option<&DatasetSchema>, records: &[Record]) -> Result<TrainingOutcome> {
        let schema = schema.ok_or(ValidationError::NoSchema)?;
        let required = self.config.min_rows;
        if records.len() < required {
            return Err(ValidationError::InsufficientData {
                required,
                found: records.len(),
            }
            .into());
        }
        let (Some(target), false) = (schema.target(), schema.feature_columns().is_empty()) else {
            return Err(ValidationError::NoTargetOrFeatures.into());
        };
        let features = schema.feature_columns();

        let frame = DesignFrame::from_records(records, features, target)?;
        if frame.dropped_rows() > 0 {
            tracing::warn!(
                dropped = frame.dropped_rows(),
                kept = frame.num_rows(),
                "Skipping rows with missing or non-numeric values"
            );
        }
        if frame.num_rows() < required {
            return Err(ValidationError::InsufficientData {
                required,
                found: frame.num_rows(),
            }
            .into());
        }

        let x = frame.features()?;
        let y = frame.target()?;
        tracing::info!(
            rows = x.nrows(),
            features = x.ncols(),
            label = target,
            "Training models"
        );

        let mut results = BTreeMap::new();
        let mut models = Vec::with_capacity(Algorithm::ALL.len());
        for algorithm in Algorithm::ALL {
            let fitted = algorithm.fit(x.view(), y.view(), &self.config);
            let predictions = fitted.predict(x.view());
            let metrics = RegressionMetrics::compute(y.view(), predictions.view());
            let feature_importance = fitted
                .importance()
                .map(|values| importance_map(features, &values));

            tracing::info!(
                algorithm = algorithm.id(),
                r2 = metrics.r2,
                rmse = metrics.rmse,
                "Model trained"
            );

            results.insert(
                algorithm,
                TrainingResult {
                    algorithm,
                    name: algorithm.display_name().to_string(),
                    metrics,
                    feature_importance,
                },
            );
            models.push(TrainedModel::new(fitted, features.to_vec(), target));
        }

        Ok(TrainingOutcome {
            report: TrainingReport {
                models: results,
                samples: frame.num_rows(),
                schema: schema.clone(),
                trained_at: Utc::now(),
            },
            models,
        })
    }
}

fn importance_map(features: &[String], values: &Array1<f64>) -> BTreeMap<String, f64> {
    features
        .iter()
        .cloned()
        .zip(values.iter().copied())
        .collect()
}
