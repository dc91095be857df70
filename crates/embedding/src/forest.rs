//! A small pure-Rust isolation forest: random axis-aligned splits over a
//! fixed seed, average path length converted to an anomaly score in [0,1]
//! via the standard `2^(-E(h(x))/c(n))` formula. No external ML crate — the
//! teacher stack only performs nearest-neighbor search, never outlier
//! scoring against a fitted population, so this is new but structurally
//! modest: a handful of recursive splits per tree.

enum Node {
    Leaf { size: usize },
    Internal { feature: usize, split: f32, left: Box<Node>, right: Box<Node> },
}

pub struct IsolationForest {
    trees: Vec<Node>,
    sample_size: usize,
}

/// Average path length of an unsuccessful search in a binary search tree of
/// `n` items — the normalization constant `c(n)` from the isolation forest
/// paper (Liu, Ting & Zhou, 2008).
fn average_path_length(n: usize) -> f64 {
    if n <= 1 {
        return 0.0;
    }
    let n = n as f64;
    2.0 * (harmonic(n - 1.0)) - (2.0 * (n - 1.0) / n)
}

fn harmonic(n: f64) -> f64 {
    if n <= 0.0 {
        return 0.0;
    }
    n.ln() + 0.5772156649015329
}

fn build_tree(
    data: &[&[f32]],
    rng: &mut fastrand::Rng,
    depth: usize,
    max_depth: usize,
) -> Node {
    if data.len() <= 1 || depth >= max_depth {
        return Node::Leaf { size: data.len() };
    }
    let dim = data[0].len();
    let feature = rng.usize(0..dim);
    let mut min_v = f32::MAX;
    let mut max_v = f32::MIN;
    for point in data {
        let value = point[feature];
        min_v = min_v.min(value);
        max_v = max_v.max(value);
    }
    if (max_v - min_v).abs() < f32::EPSILON {
        return Node::Leaf { size: data.len() };
    }
    let split = min_v + rng.f32() * (max_v - min_v);
    let (left, right): (Vec<&[f32]>, Vec<&[f32]>) =
        data.iter().partition(|p| p[feature] < split);
    if left.is_empty() || right.is_empty() {
        return Node::Leaf { size: data.len() };
    }
    Node::Internal {
        feature,
        split,
        left: Box::new(build_tree(&left, rng, depth + 1, max_depth)),
        right: Box::new(build_tree(&right, rng, depth + 1, max_depth)),
    }
}

fn path_length(node: &Node, point: &[f32], depth: usize) -> f64 {
    match node {
        Node::Leaf { size } => depth as f64 + average_path_length(*size),
        Node::Internal { feature, split, left, right } => {
            if point[*feature] < *split {
                path_length(left, point, depth + 1)
            } else {
                path_length(right, point, depth + 1)
            }
        }
    }
}

impl IsolationForest {
    /// Fit `num_trees` isolation trees over `corpus`, each built from a
    /// `sample_size`-point subsample drawn with a fixed seed so that fitting
    /// is fully reproducible.
    pub fn fit(corpus: &[Vec<f32>], num_trees: usize, sample_size: usize, seed: u64) -> Self {
        let mut rng = fastrand::Rng::with_seed(seed);
        let sample_size = sample_size.min(corpus.len()).max(1);
        let max_depth = (sample_size as f64).log2().ceil() as usize;
        let refs: Vec<&[f32]> = corpus.iter().map(|v| v.as_slice()).collect();
        let trees = (0..num_trees)
            .map(|_| {
                let mut sample: Vec<&[f32]> = Vec::with_capacity(sample_size);
                for _ in 0..sample_size {
                    let idx = rng.usize(0..refs.len());
                    sample.push(refs[idx]);
                }
                build_tree(&sample, &mut rng, 0, max_depth)
            })
            .collect();
        IsolationForest { trees, sample_size }
    }

    /// Raw anomaly score in [0,1]: close to 1 means short average path
    /// length (easily isolated, anomalous); close to 0.5 means average.
    pub fn anomaly_score(&self, point: &[f32]) -> f64 {
        let avg_path: f64 =
            self.trees.iter().map(|t| path_length(t, point, 0)).sum::<f64>() / self.trees.len() as f64;
        let c = average_path_length(self.sample_size).max(1e-9);
        2f64.powf(-avg_path / c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus(n: usize) -> Vec<Vec<f32>> {
        let mut rng = fastrand::Rng::with_seed(7);
        (0..n)
            .map(|_| (0..8).map(|_| rng.f32()).collect())
            .collect()
    }

    #[test]
    fn fit_is_deterministic() {
        let data = corpus(50);
        let f1 = IsolationForest::fit(&data, 20, 16, 42);
        let f2 = IsolationForest::fit(&data, 20, 16, 42);
        let point = vec![0.5f32; 8];
        assert_eq!(f1.anomaly_score(&point), f2.anomaly_score(&point));
    }

    #[test]
    fn outlier_scores_higher_than_inlier() {
        let data = corpus(200);
        let forest = IsolationForest::fit(&data, 50, 32, 1);
        let inlier = vec![0.5f32; 8];
        let outlier = vec![50.0f32; 8];
        assert!(forest.anomaly_score(&outlier) > forest.anomaly_score(&inlier));
    }
}
