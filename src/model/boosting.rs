//! Gradient-boosted regression trees
//!
//! Squared-error loss: every stage fits a shallow tree to the current
//! residuals and adds it, shrunk by the learning rate, to the running
//! prediction. The ensemble starts from the label mean.

use ndarray::{Array1, ArrayView1, ArrayView2, Zip};
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::tree::{normalize, RegressionTree, TreeParams};
use crate::config::BoostingConfig;

/// Fitted gradient-boosted ensemble.
#[derive(Debug, Clone)]
pub struct GradientBoosting {
    init: f64,
    learning_rate: f64,
    stages: Vec<RegressionTree>,
    importances: Array1<f64>,
}

impl GradientBoosting {
    /// Fit `config.n_stages` trees sequentially.
    #[must_use]
    pub fn fit(x: ArrayView2<'_, f64>, y: ArrayView1<'_, f64>, config: &BoostingConfig) -> Self {
        let n_rows = x.nrows();
        let params = TreeParams {
            max_depth: Some(config.max_depth),
            min_samples_split: config.min_samples_split,
            min_samples_leaf: config.min_samples_leaf,
        };
        let mut rng = StdRng::seed_from_u64(config.seed);

        let init = y.mean().unwrap_or(0.0);
        let mut current = Array1::from_elem(n_rows, init);
        let mut stages = Vec::with_capacity(config.n_stages);

        for _ in 0..config.n_stages {
            let residuals = &y - &current;
            let tree = RegressionTree::fit(x, residuals.view(), (0..n_rows).collect(), &params, &mut rng);
            let step = tree.predict(x);
            Zip::from(&mut current)
                .and(&step)
                .for_each(|c, &s| *c += config.learning_rate * s);
            stages.push(tree);
        }

        let importances = Self::mean_importances(&stages, x.ncols());
        Self {
            init,
            learning_rate: config.learning_rate,
            stages,
            importances,
        }
    }

    /// Mean of the raw (row-scaled) stage importances, normalized.
    fn mean_importances(stages: &[RegressionTree], n_features: usize) -> Array1<f64> {
        let informative: Vec<&RegressionTree> =
            stages.iter().filter(|t| t.node_count() > 1).collect();
        if informative.is_empty() {
            return Array1::zeros(n_features);
        }
        let mut total: Array1<f64> = Array1::zeros(n_features);
        for tree in &informative {
            total += &tree.importances();
        }
        #[allow(clippy::cast_precision_loss)]
        let count = informative.len() as f64;
        normalize(total / count)
    }

    /// Predict every row of `x`.
    #[must_use]
    pub fn predict(&self, x: ArrayView2<'_, f64>) -> Array1<f64> {
        x.rows().into_iter().map(|row| self.predict_row(row)).collect()
    }

    /// Predict one row.
    #[must_use]
    pub fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        self.stages
            .iter()
            .fold(self.init, |acc, tree| acc + self.learning_rate * tree.predict_row(row))
    }

    /// Normalized impurity-based importances, one per feature.
    #[must_use]
    pub const fn feature_importances(&self) -> &Array1<f64> {
        &self.importances
    }

    /// Number of fitted stages.
    #[must_use]
    pub fn n_stages(&self) -> usize {
        self.stages.len()
    }
}
