//! Principal Component Analysis.
//!
//! Standardize by column, form the covariance matrix, eigendecompose it with
//! the classic Jacobi rotation algorithm, and project onto the top
//! eigenvectors. Axis counts here are small (tens), so Jacobi's simplicity
//! wins over a full LAPACK-style factorization.
//!
//! Jacobi is an approximate iterative method: each sweep zeroes the largest
//! off-diagonal element with a plane rotation until all off-diagonal mass
//! falls below a tolerance or the iteration cap is reached. Hitting the cap
//! is not an error; the best values so far are returned and output precision
//! is best-effort.

use tracing::{debug, trace};

use super::Projection;
use crate::error::{Error, Result};

const JACOBI_MAX_ITERATIONS: usize = 100;
const JACOBI_TOLERANCE: f64 = 1e-10;

/// PCA projection engine.
#[derive(Debug, Clone)]
pub struct Pca {
    n_components: usize,
}

/// Full output of a PCA run.
#[derive(Debug, Clone)]
pub struct PcaProjection {
    /// Projected coordinates: one row per input row, `n_components` columns.
    pub scores: Vec<Vec<f64>>,
    /// Eigenvalues of the retained components, descending.
    pub eigenvalues: Vec<f64>,
    /// Fraction of total variance explained by each retained component.
    pub explained_variance_ratio: Vec<f64>,
}

impl Pca {
    /// Create a PCA engine retaining `n_components` components (1–3 for
    /// display use, but any count up to the column count is accepted).
    pub fn new(n_components: usize) -> Self {
        Self { n_components }
    }

    /// Run PCA on an N×P matrix (rows are styles, columns are axes).
    ///
    /// Fails with [`Error::InsufficientData`] when there are fewer than 2
    /// rows, zero columns, or fewer columns than requested components.
    pub fn fit(&self, data: &[Vec<f64>]) -> Result<PcaProjection> {
        if self.n_components == 0 {
            return Err(Error::InvalidParameter {
                name: "n_components",
                message: "must be at least 1",
            });
        }

        let n = data.len();
        if n < 2 {
            return Err(Error::InsufficientData {
                what: "rows",
                required: 2,
                actual: n,
            });
        }

        let p = data[0].len();
        if p == 0 {
            return Err(Error::InsufficientData {
                what: "columns",
                required: 1,
                actual: 0,
            });
        }
        if p < self.n_components {
            return Err(Error::InsufficientData {
                what: "columns",
                required: self.n_components,
                actual: p,
            });
        }
        for row in data.iter().skip(1) {
            if row.len() != p {
                return Err(Error::DimensionMismatch {
                    expected: p,
                    found: row.len(),
                });
            }
        }

        let standardized = standardize(data, n, p);
        let cov = covariance(&standardized, n, p);
        let (eigenvalues, eigenvectors) = jacobi(cov, JACOBI_MAX_ITERATIONS, JACOBI_TOLERANCE);

        // Pair each eigenvalue with its eigenvector (column of V), sort
        // descending by eigenvalue, keep the top components.
        let mut pairs: Vec<(f64, Vec<f64>)> = eigenvalues
            .iter()
            .enumerate()
            .map(|(j, &val)| (val, (0..p).map(|k| eigenvectors[k][j]).collect()))
            .collect();
        pairs.sort_by(|a, b| b.0.total_cmp(&a.0));
        pairs.truncate(self.n_components);

        let total: f64 = eigenvalues.iter().map(|&v| v.max(0.0)).sum();
        let (retained_values, components): (Vec<f64>, Vec<Vec<f64>>) = pairs.into_iter().unzip();
        let explained_variance_ratio = retained_values
            .iter()
            .map(|&v| if total > 0.0 { v.max(0.0) / total } else { 0.0 })
            .collect();

        // Project the standardized data onto the retained components.
        let scores = standardized
            .iter()
            .map(|row| components.iter().map(|c| dot(row, c)).collect())
            .collect();

        debug!(
            rows = n,
            columns = p,
            components = self.n_components,
            "pca projection complete"
        );

        Ok(PcaProjection {
            scores,
            eigenvalues: retained_values,
            explained_variance_ratio,
        })
    }
}

impl Projection for Pca {
    fn project(&self, data: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        self.fit(data).map(|p| p.scores)
    }

    fn output_dims(&self) -> usize {
        self.n_components
    }
}

#[inline]
fn dot(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Z-score standardize each column (sample standard deviation, N−1).
///
/// A constant column has zero standard deviation; the divisor is substituted
/// with 1 so the column standardizes to all zeros instead of dividing by zero.
fn standardize(data: &[Vec<f64>], n: usize, p: usize) -> Vec<Vec<f64>> {
    let mut means = vec![0.0; p];
    let mut stds = vec![0.0; p];

    for j in 0..p {
        let mean = data.iter().map(|row| row[j]).sum::<f64>() / n as f64;
        let variance = data
            .iter()
            .map(|row| (row[j] - mean).powi(2))
            .sum::<f64>()
            / (n - 1) as f64;
        let std = variance.sqrt();
        means[j] = mean;
        stds[j] = if std == 0.0 { 1.0 } else { std };
    }

    data.iter()
        .map(|row| {
            row.iter()
                .enumerate()
                .map(|(j, &v)| (v - means[j]) / stds[j])
                .collect()
        })
        .collect()
}

/// Covariance matrix (N−1 denominator) of already-standardized data.
///
/// Symmetric by construction: only the upper triangle is computed, then
/// mirrored.
fn covariance(standardized: &[Vec<f64>], n: usize, p: usize) -> Vec<Vec<f64>> {
    let mut cov = vec![vec![0.0; p]; p];
    for i in 0..p {
        for j in i..p {
            let c = standardized
                .iter()
                .map(|row| row[i] * row[j])
                .sum::<f64>()
                / (n - 1) as f64;
            cov[i][j] = c;
            cov[j][i] = c;
        }
    }
    cov
}

/// Classic Jacobi eigenvalue decomposition for a real symmetric matrix.
///
/// Returns `(eigenvalues, V)` where column `j` of `V` is the eigenvector for
/// `eigenvalues[j]`. Runs until the largest off-diagonal magnitude drops
/// below `tolerance` or `max_iterations` rotations have been applied.
fn jacobi(
    mut a: Vec<Vec<f64>>,
    max_iterations: usize,
    tolerance: f64,
) -> (Vec<f64>, Vec<Vec<f64>>) {
    let n = a.len();
    let mut v: Vec<Vec<f64>> = (0..n)
        .map(|i| (0..n).map(|j| if i == j { 1.0 } else { 0.0 }).collect())
        .collect();

    if n < 2 {
        let eigenvalues = (0..n).map(|i| a[i][i]).collect();
        return (eigenvalues, v);
    }

    for iteration in 0..max_iterations {
        // Locate the largest-magnitude off-diagonal element.
        let mut max_val = 0.0;
        let (mut p, mut q) = (0, 1);
        for i in 0..n {
            for j in (i + 1)..n {
                if a[i][j].abs() > max_val {
                    max_val = a[i][j].abs();
                    p = i;
                    q = j;
                }
            }
        }

        if max_val < tolerance {
            trace!(iteration, "jacobi converged");
            break;
        }

        // Plane rotation zeroing a[p][q].
        let app = a[p][p];
        let aqq = a[q][q];
        let apq = a[p][q];

        let phi = 0.5 * (2.0 * apq).atan2(aqq - app);
        let c = phi.cos();
        let s = phi.sin();

        a[p][p] = c * c * app + s * s * aqq - 2.0 * s * c * apq;
        a[q][q] = s * s * app + c * c * aqq + 2.0 * s * c * apq;
        a[p][q] = 0.0;
        a[q][p] = 0.0;

        for k in 0..n {
            if k != p && k != q {
                let akp = a[k][p];
                let akq = a[k][q];
                a[k][p] = c * akp - s * akq;
                a[p][k] = a[k][p];
                a[k][q] = s * akp + c * akq;
                a[q][k] = a[k][q];
            }
        }

        // Accumulate the rotation into the eigenvector matrix.
        for row in v.iter_mut() {
            let vkp = row[p];
            let vkq = row[q];
            row[p] = c * vkp - s * vkq;
            row[q] = s * vkp + c * vkq;
        }
    }

    let eigenvalues = (0..n).map(|i| a[i][i]).collect();
    (eigenvalues, v)
}
