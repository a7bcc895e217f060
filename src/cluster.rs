//! Fixed-k performance clustering over (cgpa, growth, skill).
//!
//! Seeded k-means++ with several restarts; the run with the lowest inertia
//! wins. Identical input always yields identical clusters.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::models::{PerformanceCluster, StudentFeatureRecord};
use crate::trend::{format_decimal, round_to};

pub const CLUSTER_COUNT: usize = 4;
pub const CLUSTER_LABELS: [&str; CLUSTER_COUNT] = [
    "High Achievers",
    "Stable Performers",
    "Improving Students",
    "Critical Zone",
];

const INIT_SEED: u64 = 42;
const RESTARTS: usize = 10;
const MAX_ITERATIONS: usize = 300;
const TOLERANCE: f64 = 1e-4;

pub type Point = [f64; 3];

/// Result of one clustering pass before labelling.
#[derive(Debug, Clone, PartialEq)]
pub struct KMeansFit {
    pub centroids: Vec<Point>,
    /// Cluster index for each input point, in input order.
    pub assignments: Vec<usize>,
    pub inertia: f64,
}

pub fn feature_points(features: &[StudentFeatureRecord]) -> Vec<Point> {
    features
        .iter()
        .map(|f| [f.cgpa, f.growth, f.skill])
        .collect()
}

/// Runs k-means with `k` reduced to the number of distinct points when the
/// data cannot support `k` clusters.
pub fn fit(points: &[Point], k: usize) -> KMeansFit {
    let k = k.min(distinct_count(points));
    if k == 0 {
        return KMeansFit {
            centroids: Vec::new(),
            assignments: Vec::new(),
            inertia: 0.0,
        };
    }

    let mut rng = ChaCha8Rng::seed_from_u64(INIT_SEED);
    let mut best: Option<KMeansFit> = None;
    for _ in 0..RESTARTS {
        let centroids = init_plus_plus(points, k, &mut rng);
        let run = lloyd(points, centroids);
        if best.as_ref().map_or(true, |b| run.inertia < b.inertia) {
            best = Some(run);
        }
    }

    best.unwrap_or_else(|| lloyd(points, points[..k].to_vec()))
}

/// Clusters the feature table and labels exactly [`CLUSTER_COUNT`] groups,
/// best first. Groups the data could not populate are reported empty and
/// rank after every populated group.
pub fn performance_clusters(features: &[StudentFeatureRecord]) -> Vec<PerformanceCluster> {
    let points = feature_points(features);
    let fitted = fit(&points, CLUSTER_COUNT);
    let total = points.len();

    let mut counts = vec![0usize; fitted.centroids.len()];
    for &cluster in &fitted.assignments {
        counts[cluster] += 1;
    }

    let mut order: Vec<usize> = (0..fitted.centroids.len()).collect();
    order.sort_by(|&a, &b| {
        coordinate_sum(&fitted.centroids[b]).total_cmp(&coordinate_sum(&fitted.centroids[a]))
    });

    tracing::debug!(
        students = total,
        populated = fitted.centroids.len(),
        inertia = fitted.inertia,
        "performance clustering complete"
    );

    CLUSTER_LABELS
        .iter()
        .enumerate()
        .map(|(rank, label)| match order.get(rank) {
            Some(&index) => {
                let centroid = fitted.centroids[index];
                let count = counts[index];
                PerformanceCluster {
                    name: label.to_string(),
                    count,
                    percentage: percentage(count, total),
                    description: format!(
                        "Group with average CGPA of {}",
                        format_decimal(round_to(centroid[0], 2))
                    ),
                    rank: rank + 1,
                    centroid: Some(centroid.map(|v| round_to(v, 2))),
                }
            }
            None => PerformanceCluster {
                name: label.to_string(),
                count: 0,
                percentage: 0.0,
                description: "No students currently in this group".to_string(),
                rank: rank + 1,
                centroid: None,
            },
        })
        .collect()
}

fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        round_to(count as f64 / total as f64 * 100.0, 2)
    }
}

fn coordinate_sum(point: &Point) -> f64 {
    point.iter().sum()
}

fn distance_sq(a: &Point, b: &Point) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

fn distinct_count(points: &[Point]) -> usize {
    let mut seen: Vec<&Point> = Vec::new();
    for point in points {
        if !seen.iter().any(|p| *p == point) {
            seen.push(point);
        }
    }
    seen.len()
}

fn nearest(point: &Point, centroids: &[Point]) -> (usize, f64) {
    centroids
        .iter()
        .enumerate()
        .map(|(i, c)| (i, distance_sq(point, c)))
        .fold((0, f64::INFINITY), |best, cur| if cur.1 < best.1 { cur } else { best })
}

/// k-means++ seeding: each new centre is drawn with probability
/// proportional to its squared distance from the nearest chosen centre.
fn init_plus_plus<R: Rng>(points: &[Point], k: usize, rng: &mut R) -> Vec<Point> {
    let mut centroids = vec![points[rng.gen_range(0..points.len())]];

    while centroids.len() < k {
        let weights: Vec<f64> = points.iter().map(|p| nearest(p, &centroids).1).collect();
        let total: f64 = weights.iter().sum();
        if !total.is_finite() || total <= 0.0 {
            break;
        }

        let mut target = rng.gen_range(0.0..total);
        let mut chosen = points.len() - 1;
        for (i, weight) in weights.iter().enumerate() {
            if target < *weight {
                chosen = i;
                break;
            }
            target -= weight;
        }
        centroids.push(points[chosen]);
    }

    centroids
}

/// Lloyd iterations from the given centres. A centre that loses all its
/// members keeps its previous position.
fn lloyd(points: &[Point], mut centroids: Vec<Point>) -> KMeansFit {
    let k = centroids.len();
    let mut assignments = vec![0usize; points.len()];

    for _ in 0..MAX_ITERATIONS {
        for (slot, point) in assignments.iter_mut().zip(points) {
            *slot = nearest(point, &centroids).0;
        }

        let mut sums = vec![[0.0f64; 3]; k];
        let mut counts = vec![0usize; k];
        for (point, &cluster) in points.iter().zip(&assignments) {
            for dim in 0..3 {
                sums[cluster][dim] += point[dim];
            }
            counts[cluster] += 1;
        }

        let mut shift = 0.0;
        for cluster in 0..k {
            if counts[cluster] == 0 {
                continue;
            }
            let updated = sums[cluster].map(|s| s / counts[cluster] as f64);
            shift += distance_sq(&centroids[cluster], &updated);
            centroids[cluster] = updated;
        }

        if shift <= TOLERANCE * TOLERANCE {
            break;
        }
    }

    for (slot, point) in assignments.iter_mut().zip(points) {
        *slot = nearest(point, &centroids).0;
    }
    let inertia = points
        .iter()
        .zip(&assignments)
        .map(|(p, &c)| distance_sq(p, &centroids[c]))
        .sum();

    KMeansFit {
        centroids,
        assignments,
        inertia,
    }
}
