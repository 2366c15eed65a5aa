//! Regression models
//!
//! Three algorithms, all fit against the same design matrix. [`FittedModel`]
//! is a closed enum so capabilities such as feature importance are resolved
//! by matching on the variant, not by probing the model at runtime.

mod boosting;
mod forest;
mod linear;
mod tree;

pub use boosting::GradientBoosting;
pub use forest::RandomForest;
pub use linear::LinearRegression;
pub use tree::{RegressionTree, TreeParams};

use std::fmt;
use std::str::FromStr;

use ndarray::{Array1, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::config::TrainingConfig;
use crate::error::Resource;
use crate::Error;

/// Algorithm identifier, the key into the model registry.
///
/// Ordering follows the order algorithms are trained and reported in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    /// Ordinary least squares
    Linear,
    /// Bagged regression trees
    RandomForest,
    /// Boosted regression trees
    GradientBoosting,
}

impl Algorithm {
    /// Every algorithm, in training order.
    pub const ALL: [Self; 3] = [Self::Linear, Self::RandomForest, Self::GradientBoosting];

    /// Registry key (`linear`, `random_forest`, `gradient_boosting`).
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::RandomForest => "random_forest",
            Self::GradientBoosting => "gradient_boosting",
        }
    }

    /// Human-readable name for reports.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Linear => "Linear Regression",
            Self::RandomForest => "Random Forest",
            Self::GradientBoosting => "Gradient Boosting",
        }
    }

    /// Fit this algorithm.
    #[must_use]
    pub fn fit(
        self,
        x: ArrayView2<'_, f64>,
        y: ArrayView1<'_, f64>,
        config: &TrainingConfig,
    ) -> FittedModel {
        match self {
            Self::Linear => FittedModel::Linear(LinearRegression::fit(x, y)),
            Self::RandomForest => FittedModel::RandomForest(RandomForest::fit(x, y, &config.forest)),
            Self::GradientBoosting => {
                FittedModel::GradientBoosting(GradientBoosting::fit(x, y, &config.boosting))
            }
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Algorithm {
    type Err = Error;

    /// Unknown identifiers can never have a trained model, so they fail the
    /// same way an untrained one does.
    fn from_str(s: &str) -> Result<Self, Error> {
        Self::ALL
            .into_iter()
            .find(|a| a.id() == s)
            .ok_or_else(|| Resource::Model(s.to_string()).into())
    }
}

/// A fitted model of one of the supported kinds.
#[derive(Debug, Clone)]
pub enum FittedModel {
    /// Fitted linear regression
    Linear(LinearRegression),
    /// Fitted random forest
    RandomForest(RandomForest),
    /// Fitted gradient-boosted ensemble
    GradientBoosting(GradientBoosting),
}

impl FittedModel {
    /// Which algorithm produced this model.
    #[must_use]
    pub const fn algorithm(&self) -> Algorithm {
        match self {
            Self::Linear(_) => Algorithm::Linear,
            Self::RandomForest(_) => Algorithm::RandomForest,
            Self::GradientBoosting(_) => Algorithm::GradientBoosting,
        }
    }

    /// Predict every row of `x`.
    #[must_use]
    pub fn predict(&self, x: ArrayView2<'_, f64>) -> Array1<f64> {
        match self {
            Self::Linear(m) => m.predict(x),
            Self::RandomForest(m) => m.predict(x),
            Self::GradientBoosting(m) => m.predict(x),
        }
    }

    /// Predict a single row.
    #[must_use]
    pub fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        match self {
            Self::Linear(m) => m.predict_row(row),
            Self::RandomForest(m) => m.predict_row(row),
            Self::GradientBoosting(m) => m.predict_row(row),
        }
    }

    /// Per-feature importance in training column order.
    ///
    /// Tree ensembles report their impurity-based importances; the linear
    /// model reports absolute coefficients.
    #[must_use]
    pub fn importance(&self) -> Option<Array1<f64>> {
        match self {
            Self::Linear(m) => Some(m.coefficients().mapv(f64::abs)),
            Self::RandomForest(m) => Some(m.feature_importances().clone()),
            Self::GradientBoosting(m) => Some(m.feature_importances().clone()),
        }
    }
}
