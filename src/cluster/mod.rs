//! Clustering of projected style points.
//!
//! ## K-means
//!
//! The classic algorithm: assign each point to the nearest centroid, then
//! update centroids to the mean of their points. Repeat.
//!
//! **Objective**: Minimize within-cluster sum of squares:
//!
//! ```text
//! J = Σ_k Σ_{x ∈ C_k} ||x - μ_k||²
//! ```
//!
//! K-means needs `k` in advance. When the caller does not know it, the
//! [`OptimalK`] search runs k-means across a candidate range and scores each
//! partition with the mean silhouette coefficient, recommending the best k.
//!
//! ## Usage
//!
//! ```rust
//! use stylespace::cluster::{Clustering, Kmeans};
//!
//! let points = vec![
//!     vec![0.0, 0.0],
//!     vec![0.1, 0.1],
//!     vec![10.0, 10.0],
//!     vec![10.1, 10.1],
//! ];
//!
//! let labels = Kmeans::new(2).with_seed(42).fit_predict(&points).unwrap();
//! assert_eq!(labels[0], labels[1]);  // First two together
//! assert_ne!(labels[0], labels[2]);  // Separate from last two
//! ```

mod kmeans;
mod silhouette;
mod traits;
mod util;

pub use kmeans::{Kmeans, KmeansFit};
pub use silhouette::{find_optimal_k, silhouette_score, OptimalK};
pub use traits::Clustering;
