//! Data model shared with the store collaborator: styles scored along
//! user-defined axes, and the dense-matrix extraction that feeds the
//! projection engines.
//!
//! Scores live in a fixed closed interval (the application scores on
//! `[1, 10]`). Not every style is scored on every axis; when a dense matrix
//! is needed, a missing score is replaced by the interval midpoint so every
//! style yields a complete numeric vector.

use std::collections::HashMap;

use crate::stats;

/// The fixed scoring interval.
///
/// Passed explicitly into everything that needs it; there is no process-wide
/// scoring configuration in this crate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreBounds {
    /// Smallest assignable score.
    pub min: f64,
    /// Largest assignable score.
    pub max: f64,
}

impl ScoreBounds {
    /// Create bounds for the closed interval `[min, max]`.
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// The interval midpoint, substituted for missing scores.
    pub fn midpoint(&self) -> f64 {
        (self.min + self.max) / 2.0
    }

    /// Clamp a raw score into the interval.
    pub fn clamp(&self, score: f64) -> f64 {
        score.clamp(self.min, self.max)
    }
}

impl Default for ScoreBounds {
    fn default() -> Self {
        Self::new(1.0, 10.0)
    }
}

/// A style as supplied by the data store: an identity plus a sparse map of
/// per-axis scores.
#[derive(Debug, Clone)]
pub struct StyleRecord {
    /// Stable identifier, used to re-associate projected coordinates.
    pub id: String,
    /// Display name (carried through, not used numerically).
    pub name: String,
    /// Axis id -> score. Axes the style has not been scored on are absent.
    pub scores: HashMap<String, f64>,
}

impl StyleRecord {
    /// Convenience constructor.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        scores: HashMap<String, f64>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            scores,
        }
    }
}

/// Per-axis observation columns aligned by style order.
///
/// Each inner vector has one entry per style; `None` where the style has no
/// score for that axis. This is the shape [`stats::pearson`] consumes.
pub fn axis_columns(styles: &[StyleRecord], axis_ids: &[String]) -> Vec<Vec<Option<f64>>> {
    axis_ids
        .iter()
        .map(|axis_id| {
            styles
                .iter()
                .map(|style| style.scores.get(axis_id).copied())
                .collect()
        })
        .collect()
}

/// Correlation matrix over axes, keyed by axis id on both levels.
///
/// Diagonal entries are `Some(1.0)`; off-diagonal entries are `None` when
/// fewer than two styles are scored on both axes.
pub fn correlation_by_axis(
    axis_ids: &[String],
    styles: &[StyleRecord],
) -> HashMap<String, HashMap<String, Option<f64>>> {
    let columns = axis_columns(styles, axis_ids);
    let grid = stats::correlation_matrix(&columns);

    axis_ids
        .iter()
        .enumerate()
        .map(|(i, row_id)| {
            let row = axis_ids
                .iter()
                .enumerate()
                .map(|(j, col_id)| (col_id.clone(), grid[i][j]))
                .collect();
            (row_id.clone(), row)
        })
        .collect()
}

/// Build the dense N×P score matrix for a projection run.
///
/// Rows follow the order of `styles`, columns the caller-supplied order of
/// `axis_ids`; both orders are preserved exactly so projected coordinates can
/// be re-associated with style ids afterward. Missing scores become the
/// interval midpoint; present scores are clamped into the interval.
pub fn build_matrix(
    styles: &[StyleRecord],
    axis_ids: &[String],
    bounds: ScoreBounds,
) -> Vec<Vec<f64>> {
    let midpoint = bounds.midpoint();
    styles
        .iter()
        .map(|style| {
            axis_ids
                .iter()
                .map(|axis_id| {
                    style
                        .scores
                        .get(axis_id)
                        .map(|&s| bounds.clamp(s))
                        .unwrap_or(midpoint)
                })
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn style(id: &str, scores: &[(&str, f64)]) -> StyleRecord {
        StyleRecord::new(
            id,
            id.to_uppercase(),
            scores
                .iter()
                .map(|(axis, v)| (axis.to_string(), *v))
                .collect(),
        )
    }

    fn ids(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn midpoint_of_default_interval() {
        assert_eq!(ScoreBounds::default().midpoint(), 5.5);
    }

    #[test]
    fn missing_score_gets_midpoint() {
        // Style s1 has no score for axis "a"; column must carry 5.5.
        let styles = vec![style("s1", &[("b", 2.0)]), style("s2", &[("a", 7.0), ("b", 3.0)])];
        let matrix = build_matrix(&styles, &ids(&["a", "b"]), ScoreBounds::default());

        assert_eq!(matrix, vec![vec![5.5, 2.0], vec![7.0, 3.0]]);
    }

    #[test]
    fn row_and_column_order_follow_input() {
        let styles = vec![
            style("s1", &[("a", 1.0), ("b", 2.0)]),
            style("s2", &[("a", 3.0), ("b", 4.0)]),
        ];

        let forward = build_matrix(&styles, &ids(&["a", "b"]), ScoreBounds::default());
        let reversed = build_matrix(&styles, &ids(&["b", "a"]), ScoreBounds::default());

        assert_eq!(forward[0], vec![1.0, 2.0]);
        assert_eq!(reversed[0], vec![2.0, 1.0]);
        assert_eq!(forward[1], vec![3.0, 4.0]);
    }

    #[test]
    fn out_of_range_scores_are_clamped() {
        let styles = vec![style("s1", &[("a", 42.0), ("b", -3.0)])];
        let matrix = build_matrix(&styles, &ids(&["a", "b"]), ScoreBounds::default());
        assert_eq!(matrix, vec![vec![10.0, 1.0]]);
    }

    #[test]
    fn correlation_keyed_by_axis_id() {
        let styles = vec![
            style("s1", &[("a", 1.0), ("b", 10.0)]),
            style("s2", &[("a", 5.0), ("b", 6.0)]),
            style("s3", &[("a", 9.0), ("b", 2.0)]),
        ];
        let matrix = correlation_by_axis(&ids(&["a", "b"]), &styles);

        assert_eq!(matrix["a"]["a"], Some(1.0));
        assert_eq!(matrix["b"]["b"], Some(1.0));
        let r = matrix["a"]["b"].unwrap();
        assert!((r + 1.0).abs() < 1e-12);
        assert_eq!(matrix["a"]["b"], matrix["b"]["a"]);
    }

    #[test]
    fn sparse_axis_is_undefined_against_others() {
        // Axis "a" scored for a single style overall.
        let styles = vec![
            style("s1", &[("a", 4.0), ("b", 1.0)]),
            style("s2", &[("b", 2.0)]),
            style("s3", &[("b", 3.0)]),
        ];
        let matrix = correlation_by_axis(&ids(&["a", "b"]), &styles);

        assert_eq!(matrix["a"]["b"], None);
        assert_eq!(matrix["a"]["a"], Some(1.0));
    }
}
