//! Ordinary least-squares linear regression
//!
//! Fits an intercept by centering, then solves the normal equations with
//! Gaussian elimination (partial pivoting). Columns that are linearly
//! dependent on earlier ones get a zero coefficient instead of blowing up.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

/// Relative pivot size below which a column counts as dependent.
const RANK_TOLERANCE: f64 = 1e-10;

/// Fitted linear model `y = intercept + x · coefficients`.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearRegression {
    coefficients: Array1<f64>,
    intercept: f64,
}

impl LinearRegression {
    /// Fit by least squares.
    #[must_use]
    pub fn fit(x: ArrayView2<'_, f64>, y: ArrayView1<'_, f64>) -> Self {
        let n_features = x.ncols();
        let (Some(x_mean), Some(y_mean)) = (x.mean_axis(Axis(0)), y.mean()) else {
            return Self {
                coefficients: Array1::zeros(n_features),
                intercept: 0.0,
            };
        };

        let xc = &x - &x_mean;
        let yc = &y - y_mean;
        let gram = xc.t().dot(&xc);
        let rhs = xc.t().dot(&yc);

        let coefficients = solve(gram, rhs);
        let intercept = y_mean - x_mean.dot(&coefficients);
        Self {
            coefficients,
            intercept,
        }
    }

    /// Predict every row of `x`.
    #[must_use]
    pub fn predict(&self, x: ArrayView2<'_, f64>) -> Array1<f64> {
        x.dot(&self.coefficients) + self.intercept
    }

    /// Predict one row.
    #[must_use]
    pub fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        row.dot(&self.coefficients) + self.intercept
    }

    /// Fitted slope per feature.
    #[must_use]
    pub const fn coefficients(&self) -> &Array1<f64> {
        &self.coefficients
    }

    /// Fitted intercept.
    #[must_use]
    pub const fn intercept(&self) -> f64 {
        self.intercept
    }
}

/// Solve `a · x = b` for square `a`, zeroing unknowns with no usable pivot.
fn solve(mut a: Array2<f64>, mut b: Array1<f64>) -> Array1<f64> {
    let n = b.len();
    let scale = a.diag().iter().fold(0.0_f64, |m, v| m.max(v.abs()));
    let tolerance = scale * RANK_TOLERANCE;

    let mut pivots: Vec<(usize, usize)> = Vec::with_capacity(n);
    let mut row = 0;
    for col in 0..n {
        if row == n {
            break;
        }
        let (pivot_row, magnitude) = (row..n)
            .map(|r| (r, a[[r, col]].abs()))
            .fold((row, -1.0), |best, cur| if cur.1 > best.1 { cur } else { best });
        if magnitude <= tolerance {
            continue;
        }

        if pivot_row != row {
            for c in 0..n {
                a.swap([row, c], [pivot_row, c]);
            }
            b.swap(row, pivot_row);
        }

        for r in (row + 1)..n {
            let factor = a[[r, col]] / a[[row, col]];
            if factor != 0.0 {
                for c in col..n {
                    a[[r, c]] -= factor * a[[row, c]];
                }
                b[r] -= factor * b[row];
            }
        }
        pivots.push((row, col));
        row += 1;
    }

    let mut x = Array1::zeros(n);
    for &(r, c) in pivots.iter().rev() {
        let tail: f64 = ((c + 1)..n).map(|k| a[[r, k]] * x[k]).sum();
        x[c] = (b[r] - tail) / a[[r, c]];
    }
    x
}
