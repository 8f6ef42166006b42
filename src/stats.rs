//! Pairwise Pearson correlation over sparsely-scored observation columns.
//!
//! Scores are optional per observation: a style may simply not be scored on
//! an axis yet. Correlation is therefore computed over the index positions
//! where *both* columns carry a value, and is undefined (`None`) when fewer
//! than two such pairs exist.

/// Pearson correlation coefficient between two aligned optional-value columns.
///
/// Only index positions where both values are present contribute. Returns:
///
/// - `None` when fewer than 2 valid pairs exist (undefined, not an error)
/// - `Some(0.0)` when one variable has no variation (zero denominator)
/// - `Some(r)` with `r` in `[-1, 1]` otherwise
pub fn pearson(x: &[Option<f64>], y: &[Option<f64>]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y.iter())
        .filter_map(|(a, b)| a.zip(*b))
        .collect();

    if pairs.len() < 2 {
        return None;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;

    let mut numerator = 0.0;
    let mut sum_sq_x = 0.0;
    let mut sum_sq_y = 0.0;
    for &(a, b) in &pairs {
        let dx = a - mean_x;
        let dy = b - mean_y;
        numerator += dx * dy;
        sum_sq_x += dx * dx;
        sum_sq_y += dy * dy;
    }

    let denominator = (sum_sq_x * sum_sq_y).sqrt();
    if denominator == 0.0 {
        return Some(0.0);
    }

    Some(numerator / denominator)
}

/// Full correlation matrix over a set of observation columns.
///
/// Returns a square, symmetric grid with the diagonal pinned to `Some(1.0)`.
/// The diagonal is fixed by definition rather than computed: the formula is
/// unstable for a variable against itself with a single observation.
pub fn correlation_matrix(columns: &[Vec<Option<f64>>]) -> Vec<Vec<Option<f64>>> {
    let p = columns.len();
    let mut matrix = vec![vec![None; p]; p];

    for i in 0..p {
        matrix[i][i] = Some(1.0);
        for j in (i + 1)..p {
            let r = pearson(&columns[i], &columns[j]);
            matrix[i][j] = r;
            matrix[j][i] = r;
        }
    }

    matrix
}
