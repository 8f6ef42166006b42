//! Dimensionality reduction: projecting N×P score matrices down to 1–3
//! display coordinates.
//!
//! Two engines sit behind the [`Projection`] trait:
//!
//! - [`Pca`]: exact linear projection onto the directions of maximum
//!   variance (covariance eigendecomposition via the Jacobi algorithm).
//! - [`Umap`]: approximate non-linear embedding that preserves local
//!   neighborhood structure (kNN graph + stochastic gradient layout).
//!
//! PCA is deterministic and keeps global distances meaningful along the
//! retained components; the embedding is randomized and only neighborhood
//! relations survive. Callers pick per run; outputs are recomputed from
//! scratch whenever the input set, axis selection, or dimension changes.

mod pca;
mod umap;

pub use pca::{Pca, PcaProjection};
pub use umap::{Umap, UmapParams};

use crate::error::Result;

/// Common interface for projection engines (matrix in, matrix out).
///
/// Implementations are pure: the input is never mutated, and every call
/// works on its own copies of any intermediate matrices.
pub trait Projection {
    /// Project an N×P matrix to N×`output_dims` coordinates.
    fn project(&self, data: &[Vec<f64>]) -> Result<Vec<Vec<f64>>>;

    /// The configured number of output dimensions.
    fn output_dims(&self) -> usize;
}
