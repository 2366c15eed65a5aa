//! Random forest regression
//!
//! Bootstrap-aggregated CART trees. Per-tree seeds are drawn from the
//! master seed before any tree is grown, so the fitted forest does not depend
//! on how rayon schedules the work.

use ndarray::{Array1, ArrayView1, ArrayView2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use super::tree::{normalize, RegressionTree, TreeParams};
use crate::config::ForestConfig;

/// Fitted random forest.
#[derive(Debug, Clone)]
pub struct RandomForest {
    trees: Vec<RegressionTree>,
    importances: Array1<f64>,
}

impl RandomForest {
    /// Fit `config.n_trees` trees, each on its own bootstrap sample.
    #[must_use]
    pub fn fit(x: ArrayView2<'_, f64>, y: ArrayView1<'_, f64>, config: &ForestConfig) -> Self {
        let n_rows = x.nrows();
        let params = TreeParams {
            max_depth: config.max_depth,
            min_samples_split: config.min_samples_split,
            min_samples_leaf: config.min_samples_leaf,
        };

        let mut master = StdRng::seed_from_u64(config.seed);
        let seeds: Vec<u64> = (0..config.n_trees).map(|_| master.gen()).collect();

        let trees: Vec<RegressionTree> = seeds
            .par_iter()
            .map(|&seed| {
                let mut rng = StdRng::seed_from_u64(seed);
                let samples: Vec<usize> = (0..n_rows).map(|_| rng.gen_range(0..n_rows)).collect();
                RegressionTree::fit(x, y, samples, &params, &mut rng)
            })
            .collect();

        let importances = Self::mean_importances(&trees, x.ncols());
        Self { trees, importances }
    }

    /// Mean of per-tree normalized importances, renormalized.
    ///
    /// Single-leaf trees carry no split information and are left out.
    fn mean_importances(trees: &[RegressionTree], n_features: usize) -> Array1<f64> {
        let informative: Vec<&RegressionTree> =
            trees.iter().filter(|t| t.node_count() > 1).collect();
        if informative.is_empty() {
            return Array1::zeros(n_features);
        }
        let mut total: Array1<f64> = Array1::zeros(n_features);
        for tree in &informative {
            total += &tree.normalized_importances();
        }
        #[allow(clippy::cast_precision_loss)]
        let count = informative.len() as f64;
        normalize(total / count)
    }

    /// Average of the tree predictions for every row.
    #[must_use]
    pub fn predict(&self, x: ArrayView2<'_, f64>) -> Array1<f64> {
        x.rows().into_iter().map(|row| self.predict_row(row)).collect()
    }

    /// Average of the tree predictions for one row.
    #[must_use]
    pub fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.trees.iter().map(|t| t.predict_row(row)).sum();
        #[allow(clippy::cast_precision_loss)]
        let n = self.trees.len() as f64;
        sum / n
    }

    /// Normalized impurity-based importances, one per feature.
    #[must_use]
    pub const fn feature_importances(&self) -> &Array1<f64> {
        &self.importances
    }

    /// Number of trees.
    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn dataset() -> (Array2<f64>, Array1<f64>) {
        let x = Array2::from_shape_fn((40, 2), |(i, j)| {
            if j == 0 {
                i as f64
            } else {
                ((i * 13) % 7) as f64
            }
        });
        let y = x.column(0).mapv(|v| 3.0 * v + 1.0);
        (x, y)
    }

    fn small_config() -> ForestConfig {
        ForestConfig {
            n_trees: 16,
            ..ForestConfig::default()
        }
    }

    #[test]
    fn test_forest_is_deterministic() {
        let (x, y) = dataset();
        let a = RandomForest::fit(x.view(), y.view(), &small_config());
        let b = RandomForest::fit(x.view(), y.view(), &small_config());

        assert_eq!(a.predict(x.view()), b.predict(x.view()));
        assert_eq!(a.feature_importances(), b.feature_importances());
    }

    #[test]
    fn test_forest_fits_linear_trend() {
        let (x, y) = dataset();
        let forest = RandomForest::fit(x.view(), y.view(), &small_config());
        let predictions = forest.predict(x.view());

        assert_eq!(forest.n_trees(), 16);
        let mae = (&predictions - &y).mapv(f64::abs).mean().unwrap();
        assert!(mae < 5.0, "mae {mae}");
    }

    #[test]
    fn test_forest_importances_are_normalized() {
        let (x, y) = dataset();
        let forest = RandomForest::fit(x.view(), y.view(), &small_config());
        let importances = forest.feature_importances();

        assert_eq!(importances.len(), 2);
        assert!(importances.iter().all(|&v| v >= 0.0));
        assert!((importances.sum() - 1.0).abs() < 1e-9);
        assert!(importances[0] > importances[1]);
    }
}
