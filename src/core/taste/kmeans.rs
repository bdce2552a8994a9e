//! Seeded k-means (k-means++ initialisation, Lloyd iterations).
//!
//! The same samples, cluster count and seed always yield the same centroids.
//! Distances and means are accumulated in f64; centroids are stored as f32.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, warn};

use crate::config::ClusteringConfig;
use crate::error::ClusteringError;

use super::types::Embedding;

#[derive(Debug, Clone)]
pub struct KMeans {
    pub n_clusters: usize,
    pub max_iterations: usize,
    /// Relative tolerance, scaled by the mean per-feature variance of the batch
    pub tolerance: f64,
    pub seed: u64,
    /// Restarts from different seeds drawn from `seed`; lowest inertia wins
    pub n_init: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct KMeansFit {
    pub centroids: Vec<Embedding>,
    /// Sum of squared distances of samples to their assigned centroid
    pub inertia: f64,
    pub iterations: usize,
    pub labels: Vec<usize>,
}

impl KMeans {
    pub fn new(n_clusters: usize) -> Self {
        let defaults = ClusteringConfig::default();
        Self {
            n_clusters,
            max_iterations: defaults.max_iterations,
            tolerance: defaults.tolerance,
            seed: defaults.seed,
            n_init: defaults.n_init,
        }
    }

    pub fn from_config(n_clusters: usize, config: &ClusteringConfig) -> Self {
        Self {
            n_clusters,
            max_iterations: config.max_iterations,
            tolerance: config.tolerance,
            seed: config.seed,
            n_init: config.n_init,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn fit(&self, samples: &[Embedding]) -> Result<KMeansFit, ClusteringError> {
        let dim = validate_samples(samples)?;
        let n = samples.len();
        let k = self.n_clusters;
        if k == 0 || k > n {
            return Err(ClusteringError::InvalidClusterCount { k, samples: n });
        }

        let data: Vec<Vec<f64>> = samples
            .iter()
            .map(|s| s.iter().map(|x| f64::from(*x)).collect())
            .collect();
        let threshold = self.tolerance * mean_feature_variance(&data, dim);

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut best: Option<KMeansFit> = None;
        for run in 0..self.n_init.max(1) {
            let fit = self.single_run(&data, dim, threshold, &mut rng, run);
            let better = best
                .as_ref()
                .is_none_or(|current| fit.inertia < current.inertia);
            if better {
                best = Some(fit);
            }
        }

        best.ok_or(ClusteringError::EmptyBatch)
    }

    fn single_run(
        &self,
        data: &[Vec<f64>],
        dim: usize,
        threshold: f64,
        rng: &mut StdRng,
        run: usize,
    ) -> KMeansFit {
        let n = data.len();
        let k = self.n_clusters;
        let mut centroids = kmeans_plusplus_init(data, k, rng);
        let mut labels = vec![usize::MAX; n];
        let mut iterations = 0;
        let mut converged = false;

        while iterations < self.max_iterations {
            iterations += 1;

            // E-step: nearest centroid, ties to the lowest index
            let mut changed = false;
            for (i, point) in data.iter().enumerate() {
                let nearest = nearest_centroid(point, &centroids).0;
                if labels[i] != nearest {
                    labels[i] = nearest;
                    changed = true;
                }
            }

            // M-step
            let mut sums = vec![vec![0.0_f64; dim]; k];
            let mut counts = vec![0usize; k];
            for (point, &label) in data.iter().zip(labels.iter()) {
                counts[label] += 1;
                for (acc, v) in sums[label].iter_mut().zip(point.iter()) {
                    *acc += v;
                }
            }

            let mut shift = 0.0_f64;
            for j in 0..k {
                let next: Vec<f64> = if counts[j] > 0 {
                    #[allow(clippy::cast_precision_loss)]
                    let divisor = counts[j] as f64;
                    sums[j].iter().map(|s| s / divisor).collect()
                } else {
                    // Empty cluster: move it onto the point farthest from its centroid
                    let far = farthest_point(data, &centroids, &labels);
                    debug!(cluster = j, point = far, "Relocating empty k-means cluster");
                    labels[far] = j;
                    data[far].clone()
                };
                shift += sq_dist(&centroids[j], &next);
                centroids[j] = next;
            }

            if !changed || shift <= threshold {
                converged = true;
                break;
            }
        }

        // Final assignment against the settled centroids
        let mut inertia = 0.0;
        for (i, point) in data.iter().enumerate() {
            let (nearest, dist) = nearest_centroid(point, &centroids);
            labels[i] = nearest;
            inertia += dist;
        }

        if converged {
            debug!(run, iterations, inertia, "K-means converged");
        } else {
            warn!(
                run,
                iterations,
                max_iterations = self.max_iterations,
                "K-means did not fully converge, using last centroids"
            );
        }

        #[allow(clippy::cast_possible_truncation)]
        let centroids = centroids
            .into_iter()
            .map(|c| c.into_iter().map(|v| v as f32).collect())
            .collect();

        KMeansFit {
            centroids,
            inertia,
            iterations,
            labels,
        }
    }
}

fn validate_samples(samples: &[Embedding]) -> Result<usize, ClusteringError> {
    let first = samples.first().ok_or(ClusteringError::EmptyBatch)?;
    let dim = first.len();
    if dim == 0 {
        return Err(ClusteringError::ZeroDimension);
    }
    for (index, sample) in samples.iter().enumerate() {
        if sample.len() != dim {
            return Err(ClusteringError::DimensionMismatch {
                index,
                expected: dim,
                found: sample.len(),
            });
        }
        if sample.iter().any(|v| !v.is_finite()) {
            return Err(ClusteringError::NonFinite { index });
        }
    }
    Ok(dim)
}

fn mean_feature_variance(data: &[Vec<f64>], dim: usize) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let n = data.len() as f64;
    let mut total = 0.0;
    for d in 0..dim {
        let mean = data.iter().map(|p| p[d]).sum::<f64>() / n;
        total += data.iter().map(|p| (p[d] - mean).powi(2)).sum::<f64>() / n;
    }
    #[allow(clippy::cast_precision_loss)]
    let dims = dim as f64;
    total / dims
}

fn kmeans_plusplus_init(data: &[Vec<f64>], k: usize, rng: &mut StdRng) -> Vec<Vec<f64>> {
    let n = data.len();
    let mut centroids = Vec::with_capacity(k);
    centroids.push(data[rng.random_range(0..n)].clone());

    let mut distances = vec![f64::MAX; n];
    while centroids.len() < k {
        if let Some(last) = centroids.last() {
            for (slot, point) in distances.iter_mut().zip(data.iter()) {
                *slot = slot.min(sq_dist(point, last));
            }
        }

        let total: f64 = distances.iter().sum();
        if total <= 0.0 {
            // Every point already coincides with a centroid
            centroids.push(data[rng.random_range(0..n)].clone());
            continue;
        }

        let target = rng.random::<f64>() * total;
        let mut cumulative = 0.0;
        let mut chosen = distances.iter().rposition(|d| *d > 0.0).unwrap_or(n - 1);
        for (i, d) in distances.iter().enumerate() {
            cumulative += d;
            if cumulative >= target && *d > 0.0 {
                chosen = i;
                break;
            }
        }
        centroids.push(data[chosen].clone());
    }
    centroids
}

fn nearest_centroid(point: &[f64], centroids: &[Vec<f64>]) -> (usize, f64) {
    let mut best = (0, f64::INFINITY);
    for (j, c) in centroids.iter().enumerate() {
        let d = sq_dist(point, c);
        if d < best.1 {
            best = (j, d);
        }
    }
    best
}

fn farthest_point(data: &[Vec<f64>], centroids: &[Vec<f64>], labels: &[usize]) -> usize {
    let mut best = (0, -1.0_f64);
    for (i, (point, &label)) in data.iter().zip(labels.iter()).enumerate() {
        let d = sq_dist(point, &centroids[label]);
        if d > best.1 {
            best = (i, d);
        }
    }
    best.0
}

fn sq_dist(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}
