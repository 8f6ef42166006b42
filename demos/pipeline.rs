//! Project a small style space with PCA and cluster the result.

use std::collections::HashMap;

use stylespace::{
    cluster_points, ClusterOptions, ProjectionJob, ProjectionMethod, StyleRecord,
};

fn style(id: &str, name: &str, scores: &[(&str, f64)]) -> StyleRecord {
    let scores: HashMap<String, f64> = scores
        .iter()
        .map(|(axis, v)| (axis.to_string(), *v))
        .collect();
    StyleRecord::new(id, name, scores)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> stylespace::Result<()> {
    // Six styles scored on three axes; "minimal" has no saturation score,
    // so the midpoint (5.5) is substituted when the matrix is built.
    let styles = vec![
        style("s1", "Pixel Art", &[("detail", 2.0), ("colors", 3.0), ("saturation", 6.0)]),
        style("s2", "ASCII Art", &[("detail", 1.0), ("colors", 1.0), ("saturation", 1.0)]),
        style("s3", "Minimal", &[("detail", 1.0), ("colors", 2.0)]),
        style("s4", "Baroque", &[("detail", 10.0), ("colors", 8.0), ("saturation", 7.0)]),
        style("s5", "Photoreal", &[("detail", 10.0), ("colors", 9.0), ("saturation", 6.0)]),
        style("s6", "Maximalism", &[("detail", 9.0), ("colors", 10.0), ("saturation", 10.0)]),
    ];

    let axis_ids: Vec<String> = ["detail", "colors", "saturation"]
        .iter()
        .map(|s| s.to_string())
        .collect();

    // --- PCA to 2D ---
    let job = ProjectionJob::new(axis_ids, 2, ProjectionMethod::Pca);
    let outcome = job.run(&styles).await?;
    println!("=== PCA (2D) ===");
    for (style, coords) in styles.iter().zip(outcome.coords.iter()) {
        println!("  {:12} => ({:6.2}, {:6.2})", style.name, coords[0], coords[1]);
    }

    // --- Cluster with an automatically selected k ---
    let opts = ClusterOptions {
        seed: Some(42),
        ..ClusterOptions::default()
    };
    match cluster_points(&outcome.coords, &opts).await? {
        Some(clusters) => {
            println!("\n=== K-means (auto k = {}) ===", clusters.k);
            for (style, label) in styles.iter().zip(clusters.labels.iter()) {
                println!("  {:12} => cluster {}", style.name, label);
            }
            println!("  inertia: {:.3}", clusters.inertia);
        }
        None => println!("\nclustering skipped: too few points"),
    }

    Ok(())
}
