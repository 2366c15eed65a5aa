//! CART regression tree (squared-error criterion)
//!
//! Shared by the random forest and the boosted ensemble. Nodes live in a
//! flat arena; the root is node 0. Splits are exact: each candidate feature
//! is sorted and every boundary between distinct values is scored.

use ndarray::{Array1, ArrayView1, ArrayView2};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// Values closer than this are treated as equal when placing a threshold.
const FEATURE_THRESHOLD: f64 = 1e-7;

/// Node impurity at or below this makes a leaf.
const MIN_IMPURITY: f64 = f64::EPSILON;

/// Growth limits for one tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeParams {
    /// Depth limit, `None` for unlimited
    pub max_depth: Option<usize>,
    /// Minimum rows for a node to be split
    pub min_samples_split: usize,
    /// Minimum rows on each side of a split
    pub min_samples_leaf: usize,
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// Fitted regression tree.
#[derive(Debug, Clone)]
pub struct RegressionTree {
    nodes: Vec<Node>,
    /// Weighted impurity decrease per feature, not normalized
    impurity_decrease: Vec<f64>,
    n_samples: usize,
}

struct Split {
    feature: usize,
    threshold: f64,
    /// Rows sorted by `feature`; the first `position` go left
    sorted: Vec<usize>,
    position: usize,
    proxy: f64,
}

struct Pending {
    node: usize,
    rows: Vec<usize>,
    depth: usize,
}

impl RegressionTree {
    /// Grow a tree on the rows listed in `samples`.
    ///
    /// `samples` may repeat rows (bootstrap draws). `rng` only decides the
    /// order features are visited in, which settles ties between equally
    /// good splits.
    #[must_use]
    pub fn fit(
        x: ArrayView2<'_, f64>,
        y: ArrayView1<'_, f64>,
        samples: Vec<usize>,
        params: &TreeParams,
        rng: &mut StdRng,
    ) -> Self {
        let n_features = x.ncols();
        let mut tree = Self {
            nodes: vec![Node::Leaf { value: 0.0 }],
            impurity_decrease: vec![0.0; n_features],
            n_samples: samples.len(),
        };
        let mut features: Vec<usize> = (0..n_features).collect();

        let mut stack = vec![Pending {
            node: 0,
            rows: samples,
            depth: 0,
        }];
        while let Some(Pending { node, rows, depth }) = stack.pop() {
            let (sum, impurity) = sum_and_impurity(y, &rows);
            #[allow(clippy::cast_precision_loss)]
            let n = rows.len() as f64;
            let value = if rows.is_empty() { 0.0 } else { sum / n };

            let can_split = rows.len() >= params.min_samples_split.max(2)
                && params.max_depth.map_or(true, |d| depth < d)
                && impurity > MIN_IMPURITY;
            if !can_split {
                tree.nodes[node] = Node::Leaf { value };
                continue;
            }

            features.shuffle(rng);
            let Some(split) = best_split(x, y, &rows, &features, sum, params.min_samples_leaf)
            else {
                tree.nodes[node] = Node::Leaf { value };
                continue;
            };

            let Split {
                feature,
                threshold,
                mut sorted,
                position,
                ..
            } = split;
            let right_rows = sorted.split_off(position);
            let left_rows = sorted;

            let (_, left_impurity) = sum_and_impurity(y, &left_rows);
            let (_, right_impurity) = sum_and_impurity(y, &right_rows);
            #[allow(clippy::cast_precision_loss)]
            let decrease = n * impurity
                - left_rows.len() as f64 * left_impurity
                - right_rows.len() as f64 * right_impurity;
            tree.impurity_decrease[feature] += decrease.max(0.0);

            let left = tree.nodes.len();
            let right = left + 1;
            tree.nodes.push(Node::Leaf { value: 0.0 });
            tree.nodes.push(Node::Leaf { value: 0.0 });
            tree.nodes[node] = Node::Split {
                feature,
                threshold,
                left,
                right,
            };

            stack.push(Pending {
                node: right,
                rows: right_rows,
                depth: depth + 1,
            });
            stack.push(Pending {
                node: left,
                rows: left_rows,
                depth: depth + 1,
            });
        }

        tree
    }

    /// Predict one row given as a feature slice in training order.
    #[must_use]
    pub fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        let mut index = 0;
        loop {
            match self.nodes[index] {
                Node::Leaf { value } => return value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    index = if row[feature] <= threshold { left } else { right };
                }
            }
        }
    }

    /// Predict every row of `x`.
    #[must_use]
    pub fn predict(&self, x: ArrayView2<'_, f64>) -> Array1<f64> {
        x.rows().into_iter().map(|row| self.predict_row(row)).collect()
    }

    /// Number of nodes, leaves included.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Impurity decrease per feature, scaled by the training row count.
    #[must_use]
    pub fn importances(&self) -> Array1<f64> {
        let mut raw = Array1::from(self.impurity_decrease.clone());
        if self.n_samples > 0 {
            #[allow(clippy::cast_precision_loss)]
            let n = self.n_samples as f64;
            raw.mapv_inplace(|v| v / n);
        }
        raw
    }

    /// Importances normalized to sum to one (all zero for a single leaf).
    #[must_use]
    pub fn normalized_importances(&self) -> Array1<f64> {
        normalize(self.importances())
    }
}

/// Scale `values` to sum to one; an all-zero vector is returned unchanged.
pub(crate) fn normalize(mut values: Array1<f64>) -> Array1<f64> {
    let total = values.sum();
    if total > 0.0 {
        values.mapv_inplace(|v| v / total);
    }
    values
}

/// Label sum and mean squared deviation over `rows`.
fn sum_and_impurity(y: ArrayView1<'_, f64>, rows: &[usize]) -> (f64, f64) {
    if rows.is_empty() {
        return (0.0, 0.0);
    }
    let (sum, sum_sq) = rows
        .iter()
        .fold((0.0, 0.0), |(s, sq), &i| (s + y[i], sq + y[i] * y[i]));
    #[allow(clippy::cast_precision_loss)]
    let n = rows.len() as f64;
    let mean = sum / n;
    (sum, (sum_sq / n - mean * mean).max(0.0))
}

/// Best exact split over `features`, maximizing
/// `sum_left² / n_left + sum_right² / n_right`.
fn best_split(
    x: ArrayView2<'_, f64>,
    y: ArrayView1<'_, f64>,
    rows: &[usize],
    features: &[usize],
    total: f64,
    min_samples_leaf: usize,
) -> Option<Split> {
    let n = rows.len();
    let min_leaf = min_samples_leaf.max(1);
    let mut best: Option<Split> = None;

    for &feature in features {
        let mut sorted = rows.to_vec();
        sorted.sort_by(|&a, &b| x[[a, feature]].total_cmp(&x[[b, feature]]));

        let mut best_here: Option<(usize, f64)> = None;
        let mut left_sum = 0.0;
        for position in 1..n {
            left_sum += y[sorted[position - 1]];
            if position < min_leaf || n - position < min_leaf {
                continue;
            }
            let lo = x[[sorted[position - 1], feature]];
            let hi = x[[sorted[position], feature]];
            if hi <= lo + FEATURE_THRESHOLD {
                continue;
            }
            #[allow(clippy::cast_precision_loss)]
            let proxy = left_sum * left_sum / position as f64
                + (total - left_sum) * (total - left_sum) / (n - position) as f64;
            if best_here.map_or(true, |(_, p)| proxy > p) {
                best_here = Some((position, proxy));
            }
        }

        let Some((position, proxy)) = best_here else {
            continue;
        };
        if best.as_ref().map_or(true, |b| proxy > b.proxy) {
            let lo = x[[sorted[position - 1], feature]];
            let hi = x[[sorted[position], feature]];
            let mut threshold = lo / 2.0 + hi / 2.0;
            if threshold >= hi || !threshold.is_finite() {
                threshold = lo;
            }
            best = Some(Split {
                feature,
                threshold,
                sorted,
                position,
                proxy,
            });
        }
    }

    best
}
