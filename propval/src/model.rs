// BSD 3-Clause License
//
// Copyright (c) 2025, Propval Contributors
//
// Redistribution and use in source and binary forms, with or without
// modification, are permitted provided that the following conditions are met:
//
// 1. Redistributions of source code must retain the above copyright notice, this
//    list of conditions and the following disclaimer.
//
// 2. Redistributions in binary form must reproduce the above copyright notice,
//    this list of conditions and the following disclaimer in the documentation
//    and/or other materials provided with the distribution.
//
// 3. Neither the name of the copyright holder nor the names of its
//    contributors may be used to endorse or promote products derived from
//    this software without specific prior written permission.
//
// THIS SOFTWARE IS PROVIDED BY THE COPYRIGHT HOLDERS AND CONTRIBUTORS "AS IS"
// AND ANY EXPRESS OR IMPLIED WARRANTIES, INCLUDING, BUT NOT LIMITED TO, THE
// IMPLIED WARRANTIES OF MERCHANTABILITY AND FITNESS FOR A PARTICULAR PURPOSE ARE
// DISCLAIMED. IN NO EVENT SHALL THE COPYRIGHT HOLDER OR CONTRIBUTORS BE LIABLE
// FOR ANY DIRECT, INDIRECT, INCIDENTAL, SPECIAL, EXEMPLARY, OR CONSEQUENTIAL
// DAMAGES (INCLUDING, BUT NOT LIMITED TO, PROCUREMENT OF SUBSTITUTE GOODS OR
// SERVICES; LOSS OF USE, DATA, OR PROFITS; OR BUSINESS INTERRUPTION) HOWEVER
// CAUSED AND ON ANY THEORY OF LIABILITY, WHETHER IN CONTRACT, STRICT LIABILITY,
// OR TORT (INCLUDING NEGLIGENCE OR OTHERWISE) ARISING IN ANY WAY OUT OF THE USE
// OF THIS SOFTWARE, EVEN IF ADVISED OF THE POSSIBILITY OF SUCH DAMAGE.

use chrono::NaiveDate;
use ndarray::{arr2, Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{thread_rng, SeedableRng};

use crate::data::Sale;
use crate::errors::ModelError;

/// Minimum rows the training partition must hold before a fit is attempted.
pub const MIN_TRAINING_ROWS: usize = 2;

/// Days since 1970-01-01; negative for earlier dates.
pub fn day_offset(date: NaiveDate) -> i64 {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).expect("valid calendar date");
    date.signed_duration_since(epoch).num_days()
}

/// Feature matrix (latitude, longitude, day-offset) and price target vector
/// for a labelled subset. Produces fresh arrays; the subset is untouched.
pub fn design_matrix(sales: &[Sale]) -> (Array2<f64>, Array1<f64>) {
    let mut features = Array2::zeros((sales.len(), 3));
    let mut targets = Array1::zeros(sales.len());
    for (i, sale) in sales.iter().enumerate() {
        features[[i, 0]] = sale.latitude;
        features[[i, 1]] = sale.longitude;
        features[[i, 2]] = day_offset(sale.date_of_transfer) as f64;
        targets[i] = sale.price as f64;
    }
    (features, targets)
}

/// Single-row feature matrix for a query point, using the same day-offset
/// convention as the training features.
pub fn query_features(latitude: f64, longitude: f64, date: NaiveDate) -> Array2<f64> {
    arr2(&[[latitude, longitude, day_offset(date) as f64]])
}

/// How one learning set is partitioned.
#[derive(Debug, Clone)]
pub struct SplitConfig {
    /// Fraction of rows that go to the training partition.
    pub train_fraction: f64,
    /// Randomize row order before partitioning. Off by default: the split
    /// is positional, in whatever order the filter produced.
    pub shuffle: bool,
    /// Seed for the shuffle; a fresh thread RNG is used when unset.
    pub seed: Option<u64>,
}

impl Default for SplitConfig {
    fn default() -> Self {
        SplitConfig { train_fraction: 0.8, shuffle: false, seed: None }
    }
}

/// Training and validation partitions of one learning set.
#[derive(Debug)]
pub struct DataSplit {
    pub train_features: Array2<f64>,
    pub train_targets: Array1<f64>,
    pub validation_features: Array2<f64>,
    pub validation_targets: Array1<f64>,
}

/// Partitions rows: the first ⌊fraction × N⌋ rows of the (possibly
/// shuffled) order train, the remainder validate.
pub fn split_rows(
    features: &Array2<f64>,
    targets: &Array1<f64>,
    config: &SplitConfig,
) -> Result<DataSplit, ModelError> {
    if features.nrows() != targets.len() {
        return Err(ModelError::DimensionMismatch {
            expected: features.nrows(),
            actual: targets.len(),
        });
    }
    if !(config.train_fraction > 0.0 && config.train_fraction < 1.0) {
        return Err(ModelError::InvalidTrainFraction { fraction: config.train_fraction });
    }

    let n = features.nrows();
    let mut order: Vec<usize> = (0..n).collect();
    if config.shuffle {
        match config.seed {
            Some(seed) => order.shuffle(&mut StdRng::seed_from_u64(seed)),
            None => order.shuffle(&mut thread_rng()),
        }
    }
    let split_at = (config.train_fraction * n as f64).floor() as usize;
    let (train_idx, validation_idx) = order.split_at(split_at);

    Ok(DataSplit {
        train_features: features.select(Axis(0), train_idx),
        train_targets: targets.select(Axis(0), train_idx),
        validation_features: features.select(Axis(0), validation_idx),
        validation_targets: targets.select(Axis(0), validation_idx),
    })
}

/// Ordinary least squares fitted in closed form: the normal equations are
/// assembled on mean-centered features and solved exactly, with the
/// intercept recovered from the means. No iteration, no learning rate.
pub struct OlsRegression {
    coefficients: Option<Array1<f64>>,
    intercept: f64,
}

impl OlsRegression {
    pub fn new() -> Self {
        OlsRegression { coefficients: None, intercept: 0.0 }
    }

    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<(), ModelError> {
        if x.nrows() != y.len() {
            return Err(ModelError::DimensionMismatch { expected: x.nrows(), actual: y.len() });
        }
        if x.ncols() == 0 {
            return Err(ModelError::EmptyInput);
        }
        if x.nrows() < MIN_TRAINING_ROWS {
            return Err(ModelError::InsufficientData {
                rows: x.nrows(),
                required: MIN_TRAINING_ROWS,
            });
        }
        if x.iter().any(|v| !v.is_finite()) || y.iter().any(|v| !v.is_finite()) {
            return Err(ModelError::NonFiniteValue);
        }
        // A feature column with no variation at all makes the centered
        // system singular regardless of tolerance; report it directly.
        for (column, values) in x.axis_iter(Axis(1)).enumerate() {
            let first = values[0];
            if values.iter().all(|v| *v == first) {
                return Err(ModelError::SingularMatrix { column });
            }
        }

        let x_mean = x.mean_axis(Axis(0)).expect("at least one row");
        let y_mean = y.mean().expect("at least one row");
        let x_centered = x - &x_mean;
        let y_centered = y - y_mean;

        let scatter = x_centered.t().dot(&x_centered);
        let moment = x_centered.t().dot(&y_centered);
        let coefficients = solve_normal_equations(scatter, moment)?;

        self.intercept = y_mean - coefficients.dot(&x_mean);
        self.coefficients = Some(coefficients);
        Ok(())
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>, ModelError> {
        let coefficients = self.coefficients.as_ref().ok_or(ModelError::NotFitted)?;
        if x.ncols() != coefficients.len() {
            return Err(ModelError::DimensionMismatch {
                expected: coefficients.len(),
                actual: x.ncols(),
            });
        }
        Ok(x.dot(coefficients) + self.intercept)
    }

    /// Coefficient of determination on held-out data: 1 − SS_res / SS_tot.
    /// A zero-variance target scores 1.0 for an exact fit and 0.0 otherwise.
    pub fn r_squared(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<f64, ModelError> {
        if x.nrows() != y.len() {
            return Err(ModelError::DimensionMismatch { expected: x.nrows(), actual: y.len() });
        }
        if y.is_empty() {
            return Err(ModelError::EmptyInput);
        }

        let predictions = self.predict(x)?;
        let residual: f64 =
            predictions.iter().zip(y.iter()).map(|(p, t)| (t - p) * (t - p)).sum();
        let mean = y.mean().expect("non-empty target");
        let total: f64 = y.iter().map(|t| (t - mean) * (t - mean)).sum();
        if total == 0.0 {
            return Ok(if residual == 0.0 { 1.0 } else { 0.0 });
        }
        Ok(1.0 - residual / total)
    }

    pub fn coefficients(&self) -> Option<&Array1<f64>> {
        self.coefficients.as_ref()
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }
}

impl Default for OlsRegression {
    fn default() -> Self {
        OlsRegression::new()
    }
}

/// Gaussian elimination with partial pivoting on the normal-equations
/// system. A pivot below tolerance means a feature column carries no
/// independent variation, so the system has no unique solution.
fn solve_normal_equations(
    mut a: Array2<f64>,
    mut b: Array1<f64>,
) -> Result<Array1<f64>, ModelError> {
    let n = a.nrows();
    let scale = a.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
    let tolerance = scale * n as f64 * f64::EPSILON;

    for col in 0..n {
        let mut pivot_row = col;
        for row in col + 1..n {
            if a[[row, col]].abs() > a[[pivot_row, col]].abs() {
                pivot_row = row;
            }
        }
        if a[[pivot_row, col]].abs() <= tolerance {
            return Err(ModelError::SingularMatrix { column: col });
        }
        if pivot_row != col {
            for k in 0..n {
                a.swap([col, k], [pivot_row, k]);
            }
            b.swap(col, pivot_row);
        }
        for row in col + 1..n {
            let factor = a[[row, col]] / a[[col, col]];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[[row, k]] -= factor * a[[col, k]];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut solution = Array1::zeros(n);
    for col in (0..n).rev() {
        let mut accum = b[col];
        for k in col + 1..n {
            accum -= a[[col, k]] * solution[k];
        }
        solution[col] = accum / a[[col, col]];
    }
    Ok(solution)
}
