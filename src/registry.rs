//! Model registry
//!
//! Holds the most recent [`TrainedModel`] per algorithm. A registry value is
//! part of an immutable snapshot: installing models produces a new registry
//! and leaves the old one untouched for readers still holding it.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use ndarray::ArrayView1;

use crate::model::{Algorithm, FittedModel};

/// A fitted model plus the column layout it was trained on.
#[derive(Debug, Clone)]
pub struct TrainedModel {
    model: FittedModel,
    feature_columns: Vec<String>,
    target: String,
    trained_at: DateTime<Utc>,
}

impl TrainedModel {
    /// Wrap a fitted model with its training layout.
    #[must_use]
    pub fn new(model: FittedModel, feature_columns: Vec<String>, target: impl Into<String>) -> Self {
        Self {
            model,
            feature_columns,
            target: target.into(),
            trained_at: Utc::now(),
        }
    }

    /// Algorithm key.
    #[must_use]
    pub const fn algorithm(&self) -> Algorithm {
        self.model.algorithm()
    }

    /// Fitted parameters.
    #[must_use]
    pub const fn model(&self) -> &FittedModel {
        &self.model
    }

    /// Feature order frozen at training time.
    #[must_use]
    pub fn feature_columns(&self) -> &[String] {
        &self.feature_columns
    }

    /// Target column at training time.
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// When the model was fit.
    #[must_use]
    pub const fn trained_at(&self) -> DateTime<Utc> {
        self.trained_at
    }

    /// Run inference on one already-ordered feature row.
    #[must_use]
    pub fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        self.model.predict_row(row)
    }
}

/// Most recent model per algorithm.
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    models: BTreeMap<Algorithm, Arc<TrainedModel>>,
}

impl ModelRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Model for `algorithm`, if trained.
    #[must_use]
    pub fn get(&self, algorithm: Algorithm) -> Option<&Arc<TrainedModel>> {
        self.models.get(&algorithm)
    }

    /// Whether `algorithm` has a model.
    #[must_use]
    pub fn contains(&self, algorithm: Algorithm) -> bool {
        self.models.contains_key(&algorithm)
    }

    /// Trained algorithms in order.
    pub fn algorithms(&self) -> impl Iterator<Item = Algorithm> + '_ {
        self.models.keys().copied()
    }

    /// Number of trained models.
    #[must_use]
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// `true` when nothing is trained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Next registry with `models` installed, overwriting any entry with the
    /// same algorithm key.
    #[must_use]
    pub fn with_models(&self, models: impl IntoIterator<Item = TrainedModel>) -> Self {
        let mut next = self.clone();
        for model in models {
            next.models.insert(model.algorithm(), Arc::new(model));
        }
        next
    }
}
