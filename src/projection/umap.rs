//! UMAP-style non-linear embedding.
//!
//! A lightweight, pure-Rust take on the UMAP family: build a fuzzy kNN graph
//! over the input rows, then lay the points out in 1–3 dimensions with
//! stochastic gradient descent (attraction along graph edges, repulsion via
//! negative sampling). Nearby rows in the source space tend to land near
//! each other in the embedding; global distances are not meaningful.
//!
//! This is a functional stand-in, not a port of any particular UMAP
//! implementation; only neighborhood preservation is promised, and repeated
//! unseeded runs produce different (equally valid) layouts.

use rand::prelude::*;
use std::collections::HashMap;
use tracing::debug;

use super::Projection;
use crate::error::{Error, Result};

/// Gradients are clipped to this magnitude per coordinate.
const GRAD_CLIP: f64 = 4.0;

/// Embedding hyperparameters.
#[derive(Debug, Clone)]
pub struct UmapParams {
    /// Neighborhood size for the kNN graph (clamped to N−1).
    pub n_neighbors: usize,
    /// Desired minimum spacing between embedded points.
    pub min_dist: f64,
    /// Scale at which embedded similarity decays to ~0.5.
    pub spread: f64,
    /// Number of SGD epochs.
    pub n_epochs: usize,
    /// Initial learning rate (decays linearly to zero).
    pub learning_rate: f64,
    /// Negative samples drawn per positive edge update.
    pub negative_sample_rate: usize,
    /// Optional RNG seed for reproducibility.
    pub seed: Option<u64>,
}

impl Default for UmapParams {
    fn default() -> Self {
        Self {
            n_neighbors: 15,
            min_dist: 0.1,
            spread: 1.0,
            n_epochs: 200,
            learning_rate: 1.0,
            negative_sample_rate: 5,
            seed: None,
        }
    }
}

/// UMAP-style embedding engine.
#[derive(Debug, Clone)]
pub struct Umap {
    dims: usize,
    params: UmapParams,
}

impl Umap {
    /// Create an embedding engine targeting `dims` output dimensions (1–3).
    pub fn new(dims: usize) -> Self {
        Self {
            dims,
            params: UmapParams::default(),
        }
    }

    /// Replace the hyperparameters.
    pub fn with_params(mut self, params: UmapParams) -> Self {
        self.params = params;
        self
    }

    /// Set the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.params.seed = Some(seed);
        self
    }

    fn validate(&self, data: &[Vec<f64>]) -> Result<(usize, usize)> {
        if !(1..=3).contains(&self.dims) {
            return Err(Error::InvalidParameter {
                name: "dims",
                message: "must be 1, 2, or 3",
            });
        }

        let n = data.len();
        if n < 3 {
            return Err(Error::InsufficientData {
                what: "rows",
                required: 3,
                actual: n,
            });
        }

        let p = data[0].len();
        if p < 2 {
            return Err(Error::InsufficientData {
                what: "columns",
                required: 2,
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

        Ok((n, p))
    }
}

impl Projection for Umap {
    fn project(&self, data: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        let (n, _p) = self.validate(data)?;

        let mut rng: Box<dyn RngCore> = match self.params.seed {
            Some(s) => Box::new(StdRng::seed_from_u64(s)),
            None => Box::new(rand::rng()),
        };

        let k = self.params.n_neighbors.clamp(1, n - 1);
        let graph = fuzzy_graph(data, k);
        debug!(rows = n, neighbors = k, edges = graph.edges.len(), "fuzzy graph built");

        let mut embedding = init_embedding(&graph, n, self.dims, &mut rng);
        let (a, b) = curve_params(self.params.min_dist, self.params.spread);
        optimize(&mut embedding, &graph, &self.params, self.dims, a, b, &mut rng);

        Ok(embedding)
    }

    fn output_dims(&self) -> usize {
        self.dims
    }
}

struct FuzzyGraph {
    /// Undirected edges `(i, j, weight)` with `i < j`.
    edges: Vec<(usize, usize, f64)>,
    /// kNN adjacency per point (directed, before symmetrization).
    neighbors: Vec<Vec<usize>>,
}

#[inline]
fn squared_euclidean(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

/// Brute-force kNN plus fuzzy membership weights.
///
/// Membership of neighbor `j` for point `i` is `exp(-(d - rho_i)/sigma_i)`
/// (1 within `rho_i`, the distance to the nearest neighbor). `sigma_i` is
/// found by binary search so memberships sum to `log2(k)`. Directed
/// memberships are symmetrized with `w = w1 + w2 - w1*w2`.
fn fuzzy_graph(data: &[Vec<f64>], k: usize) -> FuzzyGraph {
    let n = data.len();
    let mut neighbors: Vec<Vec<usize>> = Vec::with_capacity(n);
    let mut knn_distances: Vec<Vec<f64>> = Vec::with_capacity(n);

    for i in 0..n {
        let mut dists: Vec<(usize, f64)> = (0..n)
            .filter(|&j| j != i)
            .map(|j| (j, squared_euclidean(&data[i], &data[j]).sqrt()))
            .collect();
        dists.sort_by(|a, b| a.1.total_cmp(&b.1));
        dists.truncate(k);

        neighbors.push(dists.iter().map(|&(j, _)| j).collect());
        knn_distances.push(dists.iter().map(|&(_, d)| d).collect());
    }

    let target = (k as f64).log2().max(f64::MIN_POSITIVE);
    let mut directed: HashMap<(usize, usize), (f64, f64)> = HashMap::new();

    for i in 0..n {
        let rho = knn_distances[i].first().copied().unwrap_or(0.0);
        let sigma = find_sigma(&knn_distances[i], rho, target);

        for (slot, &j) in neighbors[i].iter().enumerate() {
            let d = knn_distances[i][slot];
            let membership = if d <= rho {
                1.0
            } else {
                (-(d - rho) / sigma).exp()
            };
            if membership <= 1e-10 {
                continue;
            }

            let key = if i < j { (i, j) } else { (j, i) };
            let entry = directed.entry(key).or_insert((0.0, 0.0));
            if i < j {
                entry.0 = membership;
            } else {
                entry.1 = membership;
            }
        }
    }

    let mut edges: Vec<(usize, usize, f64)> = directed
        .into_iter()
        .filter_map(|((i, j), (w1, w2))| {
            let w = w1 + w2 - w1 * w2;
            (w > 1e-10).then_some((i, j, w))
        })
        .collect();
    // Stable order keeps seeded runs reproducible (HashMap iteration is not).
    edges.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));

    FuzzyGraph { edges, neighbors }
}

/// Binary search for the smoothing bandwidth sigma.
fn find_sigma(distances: &[f64], rho: f64, target: f64) -> f64 {
    let mut lo = 1e-10;
    let mut hi = 1e10;
    let mut sigma = 1.0;

    for _ in 0..64 {
        let sum: f64 = distances
            .iter()
            .map(|&d| if d <= rho { 1.0 } else { (-(d - rho) / sigma).exp() })
            .sum();

        if (sum - target).abs() < 1e-5 {
            break;
        }
        if sum > target {
            hi = sigma;
        } else {
            lo = sigma;
        }
        sigma = (lo + hi) / 2.0;
    }

    sigma
}

/// Parameters of the low-dimensional similarity curve `1/(1 + a d^{2b})`,
/// chosen so similarity is ~1 inside `min_dist` and ~0.5 at `spread`.
fn curve_params(min_dist: f64, spread: f64) -> (f64, f64) {
    let b = 1.0;
    let min_dist = min_dist.max(1e-3);
    let a = ((spread / min_dist).powf(b) - 1.0) / spread.powf(2.0 * b);
    (a.max(1e-3), b)
}

/// Random initialization followed by a few rounds of neighbor-average
/// smoothing, which pulls graph neighbors together before SGD starts.
fn init_embedding(
    graph: &FuzzyGraph,
    n: usize,
    dims: usize,
    rng: &mut Box<dyn RngCore>,
) -> Vec<Vec<f64>> {
    let mut embedding: Vec<Vec<f64>> = (0..n)
        .map(|_| (0..dims).map(|_| rng.random::<f64>() * 20.0 - 10.0).collect())
        .collect();

    for _ in 0..10 {
        let previous = embedding.clone();
        for i in 0..n {
            let nbrs = &graph.neighbors[i];
            if nbrs.is_empty() {
                continue;
            }
            for d in 0..dims {
                let avg: f64 =
                    nbrs.iter().map(|&j| previous[j][d]).sum::<f64>() / nbrs.len() as f64;
                embedding[i][d] = 0.5 * previous[i][d] + 0.5 * avg;
            }
        }
    }

    embedding
}

/// Negative-sampling SGD over the fuzzy graph.
///
/// Heavier edges are sampled more often via an epochs-per-sample schedule;
/// the learning rate decays linearly to zero.
fn optimize(
    embedding: &mut [Vec<f64>],
    graph: &FuzzyGraph,
    params: &UmapParams,
    dims: usize,
    a: f64,
    b: f64,
    rng: &mut Box<dyn RngCore>,
) {
    let n = embedding.len();
    if graph.edges.is_empty() {
        return;
    }

    let max_weight = graph
        .edges
        .iter()
        .map(|e| e.2)
        .fold(f64::MIN_POSITIVE, f64::max);
    let epochs_per_sample: Vec<f64> = graph.edges.iter().map(|e| max_weight / e.2).collect();
    let epochs_per_negative: Vec<f64> = epochs_per_sample
        .iter()
        .map(|&e| e / params.negative_sample_rate.max(1) as f64)
        .collect();

    let mut next_sample = epochs_per_sample.clone();
    let mut next_negative = epochs_per_negative.clone();

    for epoch in 0..params.n_epochs {
        let alpha =
            params.learning_rate * (1.0 - epoch as f64 / params.n_epochs.max(1) as f64);

        for (edge_idx, &(i, j, _)) in graph.edges.iter().enumerate() {
            if next_sample[edge_idx] > epoch as f64 {
                continue;
            }
            next_sample[edge_idx] += epochs_per_sample[edge_idx];

            // Attraction along the edge.
            let d2 = squared_euclidean(&embedding[i], &embedding[j]);
            let grad_coeff = if d2 > 0.0 {
                (-2.0 * a * b * d2.powf(b - 1.0)) / (1.0 + a * d2.powf(b))
            } else {
                0.0
            };
            for d in 0..dims {
                let grad =
                    (grad_coeff * (embedding[i][d] - embedding[j][d])).clamp(-GRAD_CLIP, GRAD_CLIP);
                embedding[i][d] += alpha * grad;
                embedding[j][d] -= alpha * grad;
            }

            // Repulsion from random negative samples.
            for _ in 0..params.negative_sample_rate {
                if next_negative[edge_idx] > epoch as f64 {
                    break;
                }
                next_negative[edge_idx] += epochs_per_negative[edge_idx];

                let other = rng.random_range(0..n);
                if other == i {
                    continue;
                }
                let d2 = squared_euclidean(&embedding[i], &embedding[other]);
                let grad_coeff = (2.0 * b) / ((1e-3 + d2) * (1.0 + a * d2.powf(b)));
                for d in 0..dims {
                    let grad = (grad_coeff * (embedding[i][d] - embedding[other][d]))
                        .clamp(-GRAD_CLIP, GRAD_CLIP);
                    embedding[i][d] += alpha * grad;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_groups() -> Vec<Vec<f64>> {
        let mut data = Vec::new();
        for i in 0..5 {
            let jitter = i as f64 * 0.05;
            data.push(vec![jitter, 0.1 + jitter, 0.2, 0.0]);
        }
        for i in 0..5 {
            let jitter = i as f64 * 0.05;
            data.push(vec![10.0 + jitter, 9.9, 10.1 + jitter, 10.0]);
        }
        data
    }

    fn mean_pairwise(embedding: &[Vec<f64>], left: &[usize], right: &[usize]) -> f64 {
        let mut total = 0.0;
        let mut count = 0usize;
        for &i in left {
            for &j in right {
                if i == j {
                    continue;
                }
                total += squared_euclidean(&embedding[i], &embedding[j]).sqrt();
                count += 1;
            }
        }
        total / count as f64
    }

    #[test]
    fn preserves_neighborhoods() {
        let data = two_groups();
        let umap = Umap::new(2)
            .with_params(UmapParams {
                n_neighbors: 4,
                n_epochs: 300,
                ..UmapParams::default()
            })
            .with_seed(42);
        let embedding = umap.project(&data).unwrap();

        let group_a: Vec<usize> = (0..5).collect();
        let group_b: Vec<usize> = (5..10).collect();
        let intra = mean_pairwise(&embedding, &group_a, &group_a)
            .max(mean_pairwise(&embedding, &group_b, &group_b));
        let inter = mean_pairwise(&embedding, &group_a, &group_b);

        assert!(
            intra < inter,
            "intra-group distance {intra} should be below inter-group {inter}"
        );
    }

    #[test]
    fn output_shape_matches_dims() {
        let data = two_groups();
        for dims in 1..=3 {
            let embedding = Umap::new(dims).with_seed(7).project(&data).unwrap();
            assert_eq!(embedding.len(), data.len());
            assert!(embedding.iter().all(|row| row.len() == dims));
            assert!(embedding.iter().flatten().all(|v| v.is_finite()));
        }
    }

    #[test]
    fn seeded_runs_are_reproducible() {
        let data = two_groups();
        let first = Umap::new(2).with_seed(99).project(&data).unwrap();
        let second = Umap::new(2).with_seed(99).project(&data).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn rejects_insufficient_input() {
        // Too few rows.
        let data = vec![vec![1.0, 2.0], vec![3.0, 4.0]];
        assert!(matches!(
            Umap::new(2).project(&data),
            Err(Error::InsufficientData { .. })
        ));

        // Too few columns.
        let data = vec![vec![1.0], vec![2.0], vec![3.0]];
        assert!(matches!(
            Umap::new(2).project(&data),
            Err(Error::InsufficientData { .. })
        ));
    }

    #[test]
    fn rejects_bad_dims() {
        let data = two_groups();
        assert!(Umap::new(0).project(&data).is_err());
        assert!(Umap::new(4).project(&data).is_err());
    }
}
