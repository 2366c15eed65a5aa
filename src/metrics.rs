//! Regression metrics
//!
//! All metrics are in-sample: they score a model on the rows it was fit on.

use ndarray::{ArrayView1, Zip};
use serde::{Deserialize, Serialize};

/// Accuracy of one fitted model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionMetrics {
    /// Coefficient of determination
    pub r2: f64,
    /// Mean absolute error
    pub mae: f64,
    /// Mean squared error
    pub mse: f64,
    /// Root mean squared error, always `mse.sqrt()`
    pub rmse: f64,
}

impl RegressionMetrics {
    /// Score predictions against labels.
    ///
    /// Empty input scores zero error and zero R².
    #[must_use]
    pub fn compute(labels: ArrayView1<'_, f64>, predictions: ArrayView1<'_, f64>) -> Self {
        let mse = mean_squared_error(labels, predictions);
        Self {
            r2: r2_score(labels, predictions),
            mae: mean_absolute_error(labels, predictions),
            mse,
            rmse: mse.sqrt(),
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn mean(sum: f64, n: usize) -> f64 {
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}

/// Mean squared error.
#[must_use]
pub fn mean_squared_error(labels: ArrayView1<'_, f64>, predictions: ArrayView1<'_, f64>) -> f64 {
    let sum = Zip::from(labels)
        .and(predictions)
        .fold(0.0, |acc, &l, &p| acc + (l - p) * (l - p));
    mean(sum, labels.len())
}

/// Mean absolute error.
#[must_use]
pub fn mean_absolute_error(labels: ArrayView1<'_, f64>, predictions: ArrayView1<'_, f64>) -> f64 {
    let sum = Zip::from(labels)
        .and(predictions)
        .fold(0.0, |acc, &l, &p| acc + (l - p).abs());
    mean(sum, labels.len())
}

/// Coefficient of determination.
///
/// A constant label vector has no variance to explain: the score is 1.0 for
/// a perfect fit and 0.0 otherwise.
#[must_use]
pub fn r2_score(labels: ArrayView1<'_, f64>, predictions: ArrayView1<'_, f64>) -> f64 {
    if labels.is_empty() {
        return 0.0;
    }
    let label_mean = mean(labels.sum(), labels.len());
    let ss_res = Zip::from(labels)
        .and(predictions)
        .fold(0.0, |acc, &l, &p| acc + (l - p) * (l - p));
    let ss_tot = labels.fold(0.0, |acc, &l| acc + (l - label_mean) * (l - label_mean));

    if ss_tot == 0.0 {
        if ss_res == 0.0 {
            1.0
        } else {
            0.0
        }
    } else {
        1.0 - ss_res / ss_tot
    }
}
