//! Projection and clustering core for style-space exploration.
//!
//! `stylespace` is the numerical subsystem behind an interactive tool that
//! visualizes named entities ("styles") scored along user-defined axes. It
//! turns sparse high-dimensional score maps into 1–3D display coordinates
//! and optional cluster labels:
//!
//! - [`stats`]: pairwise Pearson correlation over axes
//! - [`space`]: the score data model and dense-matrix extraction
//! - [`projection`]: PCA (Jacobi eigendecomposition) and a UMAP-style
//!   non-linear embedding behind one [`projection::Projection`] trait
//! - [`cluster`]: k-means (Lloyd's algorithm) plus a silhouette-scored
//!   search for the cluster count
//! - [`pipeline`]: orchestration tying the above together
//!
//! Heavy operations are `async` and yield to the caller's executor at
//! defined suspension points, so a UI event loop driving them stays
//! responsive. Everything is a pure function of its inputs plus injectable
//! randomness; seedable RNGs make tests deterministic.

#![forbid(unsafe_code)]

pub mod cluster;
pub mod error;
pub mod pipeline;
pub mod projection;
pub mod space;
pub mod stats;

pub use cluster::{find_optimal_k, silhouette_score, Clustering, Kmeans, KmeansFit, OptimalK};
pub use error::{Error, Result};
pub use pipeline::{
    assignment_map, cluster_points, ClusterOptions, ClusterOutcome, ProjectionJob,
    ProjectionMethod, ProjectionOutcome,
};
pub use projection::{Pca, PcaProjection, Projection, Umap, UmapParams};
pub use space::{build_matrix, correlation_by_axis, ScoreBounds, StyleRecord};
