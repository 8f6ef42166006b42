//! Silhouette scoring and optimal-k search.
//!
//! The silhouette coefficient measures, per point, how well it sits in its
//! own cluster versus the best alternative: `s = (b - a) / max(a, b)` with
//! `a` the mean distance to the point's own cluster and `b` the smallest
//! mean distance to any other cluster. Values lie in `[-1, 1]`.
//!
//! [`OptimalK`] runs one k-means fit per candidate k and keeps the k with
//! the highest mean silhouette. The distance work is O(range × N²), so the
//! search yields to the caller's executor between candidate evaluations;
//! correctness never depends on whether the runtime actually reschedules.
//!
//! Each candidate k gets a single fresh k-means run (a new random
//! initialization), so an unseeded search carries run-to-run variance. That
//! mirrors how the recommendation is used interactively: re-invoking is a
//! legitimate way to explore other local minima.

use tracing::debug;

use super::kmeans::Kmeans;
use super::util::euclidean;
use crate::error::Result;

/// Mean silhouette coefficient over all scoreable points.
///
/// `labels` holds one cluster label per point. Points whose cluster is the
/// only non-empty one cannot be scored and are excluded from the mean (not
/// counted as zero). Returns `None` when no point can be scored, e.g. a
/// single-cluster labeling.
pub fn silhouette_score(data: &[Vec<f64>], labels: &[usize]) -> Option<f64> {
    debug_assert_eq!(data.len(), labels.len());
    let n = data.len();
    if n == 0 {
        return None;
    }

    let k = labels.iter().copied().max().map_or(0, |m| m + 1);
    let mut members: Vec<Vec<usize>> = vec![Vec::new(); k];
    for (i, &label) in labels.iter().enumerate() {
        members[label].push(i);
    }

    let mut total = 0.0;
    let mut scored = 0usize;

    for (i, point) in data.iter().enumerate() {
        let own = labels[i];

        // a(i): mean distance to the other members of the own cluster.
        let own_others = members[own].len().saturating_sub(1);
        let a = if own_others == 0 {
            0.0
        } else {
            members[own]
                .iter()
                .filter(|&&j| j != i)
                .map(|&j| euclidean(point, &data[j]))
                .sum::<f64>()
                / own_others as f64
        };

        // b(i): smallest mean distance to any other non-empty cluster.
        let b = members
            .iter()
            .enumerate()
            .filter(|(c, m)| *c != own && !m.is_empty())
            .map(|(_, m)| {
                m.iter().map(|&j| euclidean(point, &data[j])).sum::<f64>() / m.len() as f64
            })
            .min_by(|x, y| x.total_cmp(y));

        // Undefined without an alternative cluster: exclude, don't zero.
        let Some(b) = b else { continue };

        let denom = a.max(b);
        let s = if denom == 0.0 { 0.0 } else { (b - a) / denom };
        total += s;
        scored += 1;
    }

    (scored > 0).then(|| total / scored as f64)
}

/// Silhouette-guided search for a cluster count.
#[derive(Debug, Clone)]
pub struct OptimalK {
    min_k: usize,
    max_k: usize,
    max_iter: usize,
    seed: Option<u64>,
}

impl OptimalK {
    /// Search the inclusive range `[min_k, max_k]`.
    pub fn new(min_k: usize, max_k: usize) -> Self {
        Self {
            min_k,
            max_k,
            max_iter: 100,
            seed: None,
        }
    }

    /// Iteration cap for each inner k-means run.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Base seed for deterministic searches. Each candidate k derives its
    /// own stream from it, so every k still gets a fresh initialization.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Return the k in range with the highest mean silhouette.
    ///
    /// Candidates are evaluated ascending; ties keep the smallest k, and any
    /// k exceeding the point count is skipped. With fewer than 2 points the
    /// search returns `min_k` immediately without clustering anything. The
    /// result is always within `[min_k, max_k]`.
    pub async fn search(&self, data: &[Vec<f64>]) -> Result<usize> {
        let n = data.len();
        if n < 2 {
            return Ok(self.min_k);
        }

        let mut best_k = self.min_k;
        let mut best_score = f64::NEG_INFINITY;

        for k in self.min_k..=self.max_k {
            if k > n {
                continue;
            }

            // Suspension point: keep an interactive caller responsive
            // through the O(N²) distance work below.
            tokio::task::yield_now().await;

            let mut model = Kmeans::new(k).with_max_iter(self.max_iter);
            if let Some(seed) = self.seed {
                model = model.with_seed(seed.wrapping_add(k as u64));
            }
            let fit = model.fit(data)?;

            let Some(score) = silhouette_score(data, &fit.labels) else {
                continue;
            };
            debug!(k, score, "silhouette candidate evaluated");

            // Strictly greater: earlier (smaller) k wins ties.
            if score > best_score {
                best_score = score;
                best_k = k;
            }
        }

        Ok(best_k)
    }
}

/// One-shot search with default settings; see [`OptimalK::search`].
pub async fn find_optimal_k(data: &[Vec<f64>], min_k: usize, max_k: usize) -> Result<usize> {
    OptimalK::new(min_k, max_k).search(data).await
}
