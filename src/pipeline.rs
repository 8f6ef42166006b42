//! Orchestration: from sparse per-style scores to screen-ready coordinates
//! and cluster labels.
//!
//! A [`ProjectionJob`] captures one projection run: the selected axes (in
//! caller order), the target dimension (1–3), and the projection method.
//! Running it builds the dense score matrix (midpoint substitution for
//! missing scores), invokes the engine, and hands back coordinates that are
//! index-aligned with the input styles. Clustering is a separate, optional
//! step over the projected points, with an automatic cluster-count mode
//! backed by the silhouette search.
//!
//! Every run is a pure function of its inputs plus internal randomness;
//! nothing is cached or shared between runs. Outcomes are meant to be
//! discarded and recomputed whenever the style set, axis selection, method,
//! or dimension changes.

use std::collections::HashMap;

use tracing::debug;

use crate::cluster::{Kmeans, OptimalK};
use crate::error::{Error, Result};
use crate::projection::{Pca, Projection, Umap, UmapParams};
use crate::space::{build_matrix, ScoreBounds, StyleRecord};

/// How score vectors become display coordinates.
#[derive(Debug, Clone)]
pub enum ProjectionMethod {
    /// The first 1–3 selected axes are used directly as coordinates.
    Manual,
    /// Principal Component Analysis over all selected axes.
    Pca,
    /// UMAP-style non-linear embedding over all selected axes.
    Umap(UmapParams),
}

/// One projection run over a set of styles.
#[derive(Debug, Clone)]
pub struct ProjectionJob {
    /// Selected axis ids, in display order.
    pub axis_ids: Vec<String>,
    /// Output dimensionality (1–3).
    pub dims: usize,
    /// Projection method.
    pub method: ProjectionMethod,
    /// Scoring interval (for midpoint substitution and clamping).
    pub bounds: ScoreBounds,
}

impl ProjectionJob {
    /// Create a job with the default `[1, 10]` scoring interval.
    pub fn new(axis_ids: Vec<String>, dims: usize, method: ProjectionMethod) -> Self {
        Self {
            axis_ids,
            dims,
            method,
            bounds: ScoreBounds::default(),
        }
    }

    /// Override the scoring interval.
    pub fn with_bounds(mut self, bounds: ScoreBounds) -> Self {
        self.bounds = bounds;
        self
    }

    /// Run the projection.
    ///
    /// Yields to the executor once before the numeric work starts. Caller
    /// input problems (no axes selected, bad dimension, too few axes for
    /// manual mode) surface as errors before any engine is invoked.
    pub async fn run(&self, styles: &[StyleRecord]) -> Result<ProjectionOutcome> {
        if self.axis_ids.is_empty() {
            return Err(Error::InvalidParameter {
                name: "axis_ids",
                message: "select at least one axis",
            });
        }
        if !(1..=3).contains(&self.dims) {
            return Err(Error::InvalidParameter {
                name: "dims",
                message: "must be 1, 2, or 3",
            });
        }

        tokio::task::yield_now().await;

        let coords = match &self.method {
            ProjectionMethod::Manual => {
                if self.axis_ids.len() < self.dims {
                    return Err(Error::InsufficientData {
                        what: "selected axes",
                        required: self.dims,
                        actual: self.axis_ids.len(),
                    });
                }
                build_matrix(styles, &self.axis_ids[..self.dims], self.bounds)
            }
            ProjectionMethod::Pca => {
                let matrix = build_matrix(styles, &self.axis_ids, self.bounds);
                Pca::new(self.dims).project(&matrix)?
            }
            ProjectionMethod::Umap(params) => {
                let matrix = build_matrix(styles, &self.axis_ids, self.bounds);
                Umap::new(self.dims)
                    .with_params(params.clone())
                    .project(&matrix)?
            }
        };

        debug!(
            styles = styles.len(),
            axes = self.axis_ids.len(),
            dims = self.dims,
            "projection run complete"
        );

        Ok(ProjectionOutcome {
            ids: styles.iter().map(|s| s.id.clone()).collect(),
            coords,
        })
    }
}

/// Projected coordinates for one run.
///
/// `ids[i]` owns `coords[i]`; row order equals the input style order.
#[derive(Debug, Clone)]
pub struct ProjectionOutcome {
    /// Style ids, in input order.
    pub ids: Vec<String>,
    /// One coordinate vector (length `dims`) per style.
    pub coords: Vec<Vec<f64>>,
}

impl ProjectionOutcome {
    /// Coordinates keyed by style id (what the rendering layer consumes).
    pub fn coordinate_map(&self) -> HashMap<String, Vec<f64>> {
        self.ids
            .iter()
            .cloned()
            .zip(self.coords.iter().cloned())
            .collect()
    }
}

/// Options for the optional clustering step.
#[derive(Debug, Clone)]
pub struct ClusterOptions {
    /// Fixed cluster count; `None` selects automatically via silhouette.
    pub k: Option<usize>,
    /// Inclusive candidate range for automatic selection.
    pub auto_range: (usize, usize),
    /// Iteration cap for each k-means run.
    pub max_iter: usize,
    /// Optional seed for deterministic runs.
    pub seed: Option<u64>,
}

impl Default for ClusterOptions {
    fn default() -> Self {
        Self {
            k: None,
            auto_range: (2, 8),
            max_iter: 100,
            seed: None,
        }
    }
}

/// Clustering result over projected points, index-aligned with the
/// projection outcome's rows.
#[derive(Debug, Clone)]
pub struct ClusterOutcome {
    /// Cluster count used.
    pub k: usize,
    /// Label per projected point, in `{0, ..., k-1}`.
    pub labels: Vec<usize>,
    /// Final centroids (empty in the degenerate single-cluster fallback).
    pub centroids: Vec<Vec<f64>>,
    /// Sum of squared point-to-centroid distances.
    pub inertia: f64,
}

/// Cluster the projected points.
///
/// Returns `Ok(None)` when clustering is skipped: there must be strictly
/// more points than clusters requested. In automatic mode the silhouette
/// search runs first (yielding between candidates) and its recommendation
/// feeds the final k-means fit.
pub async fn cluster_points(
    points: &[Vec<f64>],
    opts: &ClusterOptions,
) -> Result<Option<ClusterOutcome>> {
    let n = points.len();

    let k = match opts.k {
        Some(k) => {
            if k == 0 {
                return Err(Error::InvalidParameter {
                    name: "k",
                    message: "must be at least 1",
                });
            }
            k
        }
        None => {
            let (min_k, max_k) = opts.auto_range;
            if min_k == 0 || min_k > max_k {
                return Err(Error::InvalidParameter {
                    name: "auto_range",
                    message: "must satisfy 1 <= min_k <= max_k",
                });
            }
            let mut search = OptimalK::new(min_k, max_k).with_max_iter(opts.max_iter);
            if let Some(seed) = opts.seed {
                search = search.with_seed(seed);
            }
            let k = search.search(points).await?;
            debug!(k, "silhouette search recommended cluster count");
            k
        }
    };

    if n <= k {
        debug!(points = n, k, "clustering skipped, not enough points");
        return Ok(None);
    }

    let mut model = Kmeans::new(k).with_max_iter(opts.max_iter);
    if let Some(seed) = opts.seed {
        model = model.with_seed(seed);
    }
    let fit = model.fit(points)?;

    Ok(Some(ClusterOutcome {
        k,
        labels: fit.labels,
        centroids: fit.centroids,
        inertia: fit.inertia,
    }))
}

/// Map cluster labels back onto a full style list.
///
/// Styles that were part of the projection get `Some(label)`; styles
/// excluded upstream (filtered out) get `None` — the "unassigned" sentinel.
pub fn assignment_map(
    outcome: &ProjectionOutcome,
    clusters: &ClusterOutcome,
    all_styles: &[StyleRecord],
) -> HashMap<String, Option<usize>> {
    let labeled: HashMap<&str, usize> = outcome
        .ids
        .iter()
        .zip(clusters.labels.iter())
        .map(|(id, &label)| (id.as_str(), label))
        .collect();

    all_styles
        .iter()
        .map(|style| (style.id.clone(), labeled.get(style.id.as_str()).copied()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn style(id: &str, scores: &[(&str, f64)]) -> StyleRecord {
        StyleRecord::new(
            id,
            id,
            scores
                .iter()
                .map(|(axis, v)| (axis.to_string(), *v))
                .collect(),
        )
    }

    fn ids(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn four_corner_styles() -> Vec<StyleRecord> {
        vec![
            style("s1", &[("a", 1.0), ("b", 1.0)]),
            style("s2", &[("a", 1.0), ("b", 1.0)]),
            style("s3", &[("a", 10.0), ("b", 10.0)]),
            style("s4", &[("a", 10.0), ("b", 10.0)]),
        ]
    }

    #[tokio::test]
    async fn manual_projection_uses_raw_scores() {
        let styles = vec![
            style("s1", &[("b", 2.0)]), // no score for "a": midpoint
            style("s2", &[("a", 7.0), ("b", 3.0)]),
        ];
        let job = ProjectionJob::new(ids(&["a", "b"]), 2, ProjectionMethod::Manual);
        let outcome = job.run(&styles).await.unwrap();

        assert_eq!(outcome.coords[0], vec![5.5, 2.0]);
        assert_eq!(outcome.coords[1], vec![7.0, 3.0]);
        assert_eq!(outcome.coordinate_map()["s1"], vec![5.5, 2.0]);
    }

    #[tokio::test]
    async fn pca_then_kmeans_separates_groups() {
        let styles = four_corner_styles();
        let job = ProjectionJob::new(ids(&["a", "b"]), 1, ProjectionMethod::Pca);
        let outcome = job.run(&styles).await.unwrap();

        // First component splits the two score groups with opposite signs.
        assert!(outcome.coords[0][0] * outcome.coords[2][0] < 0.0);

        let opts = ClusterOptions {
            k: Some(2),
            seed: Some(42),
            ..ClusterOptions::default()
        };
        let clusters = cluster_points(&outcome.coords, &opts).await.unwrap().unwrap();

        assert_eq!(clusters.labels[0], clusters.labels[1]);
        assert_eq!(clusters.labels[2], clusters.labels[3]);
        assert_ne!(clusters.labels[0], clusters.labels[2]);
    }

    #[tokio::test]
    async fn rejects_empty_axis_selection() {
        let styles = four_corner_styles();
        let job = ProjectionJob::new(vec![], 2, ProjectionMethod::Pca);
        assert!(matches!(
            job.run(&styles).await,
            Err(Error::InvalidParameter { name: "axis_ids", .. })
        ));
    }

    #[tokio::test]
    async fn manual_needs_enough_axes() {
        let styles = four_corner_styles();
        let job = ProjectionJob::new(ids(&["a"]), 3, ProjectionMethod::Manual);
        assert!(matches!(
            job.run(&styles).await,
            Err(Error::InsufficientData { .. })
        ));
    }

    #[tokio::test]
    async fn clustering_skipped_without_enough_points() {
        let points = vec![vec![0.0, 0.0], vec![1.0, 1.0], vec![2.0, 2.0]];
        let opts = ClusterOptions {
            k: Some(3),
            ..ClusterOptions::default()
        };
        assert!(cluster_points(&points, &opts).await.unwrap().is_none());

        let opts = ClusterOptions {
            k: Some(2),
            ..ClusterOptions::default()
        };
        assert!(cluster_points(&points, &opts).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn auto_mode_picks_a_count_in_range() {
        let mut points = Vec::new();
        for &(cx, cy) in &[(0.0, 0.0), (20.0, 20.0)] {
            for i in 0..6 {
                points.push(vec![cx + i as f64 * 0.1, cy - i as f64 * 0.1]);
            }
        }
        let opts = ClusterOptions {
            seed: Some(7),
            ..ClusterOptions::default()
        };
        let outcome = cluster_points(&points, &opts).await.unwrap().unwrap();
        assert_eq!(outcome.k, 2);
        assert!(outcome.labels.iter().all(|&l| l < 2));
    }

    #[tokio::test]
    async fn assignment_map_marks_filtered_styles_unassigned() {
        let styles = four_corner_styles();
        // "s4" filtered out upstream: only three styles projected.
        let projected = &styles[..3];
        let job = ProjectionJob::new(ids(&["a", "b"]), 2, ProjectionMethod::Manual);
        let outcome = job.run(projected).await.unwrap();

        let opts = ClusterOptions {
            k: Some(2),
            seed: Some(1),
            ..ClusterOptions::default()
        };
        let clusters = cluster_points(&outcome.coords, &opts).await.unwrap().unwrap();
        let map = assignment_map(&outcome, &clusters, &styles);

        assert_eq!(map.len(), 4);
        assert!(map["s1"].is_some());
        assert_eq!(map["s4"], None);
    }
}
