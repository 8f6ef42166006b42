//! K-means clustering (Lloyd's algorithm).
//!
//! Centroids are seeded by sampling k *distinct* data points without
//! replacement; iterations alternate nearest-centroid assignment and
//! centroid recomputation until assignments stop changing or the iteration
//! cap is reached.
//!
//! Degeneracy handling follows the interactive-use contract of this crate:
//! fewer distinct points than requested clusters is an expected input (a
//! user with three identical styles asking for two clusters), so it
//! soft-fails to a single all-zero labeling instead of erroring. A cluster
//! whose membership empties mid-run has its centroid reseeded to a random
//! distinct point, so the label count stays exactly k across iterations.
//!
//! Initialization is randomized: repeated unseeded runs may produce
//! different, equally valid partitions (modulo label permutation). Tests
//! should compare co-membership structure, not literal label values.

use rand::prelude::*;
use std::collections::HashSet;
use tracing::debug;

use super::traits::Clustering;
use super::util::{euclidean, squared_euclidean};
use crate::error::{Error, Result};

/// K-means clusterer.
#[derive(Debug, Clone)]
pub struct Kmeans {
    k: usize,
    max_iter: usize,
    seed: Option<u64>,
}

/// Full output of a k-means run.
#[derive(Debug, Clone)]
pub struct KmeansFit {
    /// One label per input point, in `{0, ..., k-1}`.
    pub labels: Vec<usize>,
    /// Final centroid per cluster. Empty in the single-cluster fallback.
    pub centroids: Vec<Vec<f64>>,
    /// Sum of squared distances from each point to its assigned centroid.
    ///
    /// A compactness diagnostic for callers (elbow plots, model selection);
    /// nothing inside k-means consumes it.
    pub inertia: f64,
}

impl Kmeans {
    /// Create a k-means clusterer targeting `k` clusters.
    pub fn new(k: usize) -> Self {
        Self {
            k,
            max_iter: 100,
            seed: None,
        }
    }

    /// Set the iteration cap (default 100).
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set the RNG seed for deterministic centroid initialization.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Run Lloyd's algorithm and return labels, centroids, and inertia.
    ///
    /// Fewer than `k` distinct points yields the single-cluster fallback:
    /// every label 0, no centroids, zero inertia.
    pub fn fit(&self, data: &[Vec<f64>]) -> Result<KmeansFit> {
        let n = data.len();
        if n == 0 {
            return Err(Error::EmptyInput);
        }
        if self.k == 0 {
            return Err(Error::InvalidParameter {
                name: "k",
                message: "must be at least 1",
            });
        }

        let dim = data[0].len();
        for point in data.iter().skip(1) {
            if point.len() != dim {
                return Err(Error::DimensionMismatch {
                    expected: dim,
                    found: point.len(),
                });
            }
        }

        // Candidate seed pool: points deduplicated by exact coordinate
        // equality (bit patterns, mirroring exact float comparison).
        let distinct = distinct_points(data);
        if distinct.len() < self.k {
            debug!(
                distinct = distinct.len(),
                k = self.k,
                "fewer distinct points than clusters, single-cluster fallback"
            );
            return Ok(KmeansFit {
                labels: vec![0; n],
                centroids: Vec::new(),
                inertia: 0.0,
            });
        }

        let mut rng: Box<dyn RngCore> = match self.seed {
            Some(s) => Box::new(StdRng::seed_from_u64(s)),
            None => Box::new(rand::rng()),
        };

        // Sample k distinct seed points without replacement.
        let mut centroids: Vec<Vec<f64>> = rand::seq::index::sample(&mut rng, distinct.len(), self.k)
            .into_iter()
            .map(|idx| distinct[idx].clone())
            .collect();

        let mut labels: Vec<usize> = vec![usize::MAX; n];

        // At least one assignment pass always runs so every label is set.
        for iteration in 0..self.max_iter.max(1) {
            // Assignment step: nearest centroid, ties to the lowest index.
            let mut changed = false;
            for (i, point) in data.iter().enumerate() {
                let mut best = 0;
                let mut best_dist = f64::INFINITY;
                for (j, centroid) in centroids.iter().enumerate() {
                    let d = euclidean(point, centroid);
                    if d < best_dist {
                        best_dist = d;
                        best = j;
                    }
                }
                if labels[i] != best {
                    labels[i] = best;
                    changed = true;
                }
            }

            if !changed {
                debug!(iteration, k = self.k, "kmeans converged");
                break;
            }

            // Update step: coordinate-wise mean of each cluster's members.
            let mut sums = vec![vec![0.0; dim]; self.k];
            let mut counts = vec![0usize; self.k];
            for (point, &label) in data.iter().zip(labels.iter()) {
                for (d, &v) in point.iter().enumerate() {
                    sums[label][d] += v;
                }
                counts[label] += 1;
            }

            for j in 0..self.k {
                if counts[j] > 0 {
                    centroids[j] = sums[j].iter().map(|&s| s / counts[j] as f64).collect();
                } else {
                    // Empty cluster: reseed so the cluster count never drops.
                    let idx = rng.random_range(0..distinct.len());
                    centroids[j] = distinct[idx].clone();
                }
            }
        }

        let inertia = data
            .iter()
            .zip(labels.iter())
            .map(|(point, &label)| squared_euclidean(point, &centroids[label]))
            .sum();

        Ok(KmeansFit {
            labels,
            centroids,
            inertia,
        })
    }
}

impl Clustering for Kmeans {
    fn fit_predict(&self, data: &[Vec<f64>]) -> Result<Vec<usize>> {
        self.fit(data).map(|fit| fit.labels)
    }

    fn n_clusters(&self) -> usize {
        self.k
    }
}

/// Deduplicate points by exact coordinate equality, preserving first-seen
/// order.
fn distinct_points(data: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let mut seen: HashSet<Vec<u64>> = HashSet::with_capacity(data.len());
    let mut distinct = Vec::new();
    for point in data {
        let key: Vec<u64> = point.iter().map(|v| v.to_bits()).collect();
        if seen.insert(key) {
            distinct.push(point.clone());
        }
    }
    distinct
}

#[cfg(test)]
mod tests {
    use super::*;

    fn co_membership(labels: &[usize]) -> Vec<Vec<bool>> {
        let n = labels.len();
        (0..n)
            .map(|i| (0..n).map(|j| labels[i] == labels[j]).collect())
            .collect()
    }

    #[test]
    fn separates_two_obvious_groups() {
        let data = vec![
            vec![0.0, 0.0],
            vec![0.1, 0.1],
            vec![0.2, 0.0],
            vec![10.0, 10.0],
            vec![10.1, 10.1],
            vec![9.9, 10.2],
        ];
        let fit = Kmeans::new(2).with_seed(42).fit(&data).unwrap();

        let members = co_membership(&fit.labels);
        for i in 0..3 {
            for j in 0..3 {
                assert!(members[i][j]);
                assert!(members[i + 3][j + 3]);
                assert!(!members[i][j + 3]);
            }
        }
        assert_eq!(fit.centroids.len(), 2);
    }

    #[test]
    fn labels_stay_in_range() {
        let data: Vec<Vec<f64>> = (0..20).map(|i| vec![i as f64, (i * 3 % 7) as f64]).collect();
        let fit = Kmeans::new(4).with_seed(1).fit(&data).unwrap();

        assert_eq!(fit.labels.len(), 20);
        assert!(fit.labels.iter().all(|&l| l < 4));
        let used: HashSet<usize> = fit.labels.iter().copied().collect();
        assert!(used.len() >= 2);
    }

    #[test]
    fn identical_points_fall_back_to_single_cluster() {
        let data = vec![vec![2.0, 2.0], vec![2.0, 2.0], vec![2.0, 2.0]];
        let fit = Kmeans::new(2).with_seed(5).fit(&data).unwrap();

        assert_eq!(fit.labels, vec![0, 0, 0]);
        assert!(fit.centroids.is_empty());
        assert_eq!(fit.inertia, 0.0);
    }

    #[test]
    fn k_of_one_inertia_is_total_squared_deviation() {
        let data = vec![vec![1.0], vec![3.0], vec![5.0], vec![7.0]];
        let fit = Kmeans::new(1).with_seed(9).fit(&data).unwrap();

        // Single centroid converges to the global mean (4.0).
        assert!((fit.centroids[0][0] - 4.0).abs() < 1e-12);
        let expected: f64 = data.iter().map(|p| (p[0] - 4.0).powi(2)).sum();
        assert!((fit.inertia - expected).abs() < 1e-12);
    }

    #[test]
    fn inertia_beats_random_assignment_baseline() {
        let data: Vec<Vec<f64>> = (0..12)
            .map(|i| vec![(i % 4) as f64 * 5.0, (i / 4) as f64 * 5.0])
            .collect();
        let fit = Kmeans::new(3).with_seed(3).fit(&data).unwrap();

        // Baseline: every point charged against the global mean.
        let dim = data[0].len();
        let mut mean = vec![0.0; dim];
        for p in &data {
            for (d, &v) in p.iter().enumerate() {
                mean[d] += v / data.len() as f64;
            }
        }
        let baseline: f64 = data.iter().map(|p| squared_euclidean(p, &mean)).sum();
        assert!(fit.inertia <= baseline);
    }

    #[test]
    fn rejects_invalid_input() {
        let data: Vec<Vec<f64>> = vec![];
        assert!(matches!(
            Kmeans::new(2).fit(&data),
            Err(Error::EmptyInput)
        ));

        let data = vec![vec![1.0], vec![2.0]];
        assert!(matches!(
            Kmeans::new(0).fit(&data),
            Err(Error::InvalidParameter { .. })
        ));

        let ragged = vec![vec![1.0, 2.0], vec![3.0]];
        assert!(matches!(
            Kmeans::new(1).fit(&ragged),
            Err(Error::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn seeded_runs_are_reproducible() {
        let data: Vec<Vec<f64>> = (0..15).map(|i| vec![(i * 7 % 13) as f64, i as f64]).collect();
        let first = Kmeans::new(3).with_seed(11).fit(&data).unwrap();
        let second = Kmeans::new(3).with_seed(11).fit(&data).unwrap();
        assert_eq!(first.labels, second.labels);
        assert_eq!(first.centroids, second.centroids);
    }
}
