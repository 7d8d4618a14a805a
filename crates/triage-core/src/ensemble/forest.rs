//! Random forest classifier.
//!
//! 100 Gini-split CART trees, each grown on a bootstrap sample with
//! sqrt(N) feature subsampling. Probability output is the mean of the
//! per-tree leaf class distributions.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::Classifier;

/// Number of trees in the forest.
const N_TREES: usize = 100;

/// Minimum samples required to attempt a split.
const MIN_SAMPLES_SPLIT: usize = 2;

/// Random forest over binary symptom features.
#[derive(Debug, Clone)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    n_classes: usize,
}

impl RandomForest {
    /// Fit the forest. `seed` fixes bootstrap and feature sampling.
    pub fn fit(x: &[Vec<f64>], y: &[usize], n_classes: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let n_rows = x.len();
        let n_features = x.first().map_or(0, |row| row.len());
        let max_features = ((n_features as f64).sqrt() as usize).max(1);

        let trees = (0..N_TREES)
            .map(|_| {
                let bootstrap: Vec<usize> =
                    (0..n_rows).map(|_| rng.gen_range(0..n_rows)).collect();
                DecisionTree::fit(x, y, n_classes, &bootstrap, Some(max_features), &mut rng)
            })
            .collect();

        Self { trees, n_classes }
    }
}

impl Classifier for RandomForest {
    fn predict_proba(&self, features: &[f64]) -> Vec<f64> {
        let mut mean = vec![0.0; self.n_classes];
        for tree in &self.trees {
            for (acc, p) in mean.iter_mut().zip(tree.predict_dist(features)) {
                *acc += p;
            }
        }
        let n = self.trees.len().max(1) as f64;
        for p in &mut mean {
            *p /= n;
        }
        mean
    }
}

/// Arena-allocated CART classification tree.
#[derive(Debug, Clone)]
pub(crate) struct DecisionTree {
    nodes: Vec<TreeNode>,
}

#[derive(Debug, Clone)]
enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        dist: Vec<f64>,
    },
}

impl DecisionTree {
    /// Grow a tree on the given sample indices.
    ///
    /// `max_features` limits how many candidate features each split
    /// considers (`None` means all, used by plain CART).
    pub(crate) fn fit(
        x: &[Vec<f64>],
        y: &[usize],
        n_classes: usize,
        samples: &[usize],
        max_features: Option<usize>,
        rng: &mut StdRng,
    ) -> Self {
        let mut nodes = Vec::new();
        build_node(&mut nodes, x, y, n_classes, samples, max_features, rng);
        Self { nodes }
    }

    /// Class distribution at the leaf reached by `features`.
    pub(crate) fn predict_dist(&self, features: &[f64]) -> Vec<f64> {
        let mut current = 0;
        loop {
            match &self.nodes[current] {
                TreeNode::Leaf { dist } => return dist.clone(),
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    current = if features[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }
}

/// Recursively grow one node, returning its index in the arena.
fn build_node(
    nodes: &mut Vec<TreeNode>,
    x: &[Vec<f64>],
    y: &[usize],
    n_classes: usize,
    samples: &[usize],
    max_features: Option<usize>,
    rng: &mut StdRng,
) -> usize {
    let counts = class_counts(y, samples, n_classes);
    let total = samples.len();

    let is_pure = counts.iter().filter(|&&c| c > 0).count() <= 1;
    if is_pure || total < MIN_SAMPLES_SPLIT {
        return push_leaf(nodes, &counts, total);
    }

    let best = best_split(x, y, n_classes, samples, max_features, rng);
    let (feature, threshold) = match best {
        Some(split) => split,
        None => return push_leaf(nodes, &counts, total),
    };

    let (left_samples, right_samples): (Vec<usize>, Vec<usize>) = samples
        .iter()
        .copied()
        .partition(|&i| x[i][feature] <= threshold);

    let node_index = nodes.len();
    nodes.push(TreeNode::Leaf { dist: Vec::new() }); // placeholder

    let left = build_node(nodes, x, y, n_classes, &left_samples, max_features, rng);
    let right = build_node(nodes, x, y, n_classes, &right_samples, max_features, rng);

    nodes[node_index] = TreeNode::Split {
        feature,
        threshold,
        left,
        right,
    };
    node_index
}

fn push_leaf(nodes: &mut Vec<TreeNode>, counts: &[usize], total: usize) -> usize {
    let denom = total.max(1) as f64;
    let dist = counts.iter().map(|&c| c as f64 / denom).collect();
    let index = nodes.len();
    nodes.push(TreeNode::Leaf { dist });
    index
}

fn class_counts(y: &[usize], samples: &[usize], n_classes: usize) -> Vec<usize> {
    let mut counts = vec![0usize; n_classes];
    for &i in samples {
        counts[y[i]] += 1;
    }
    counts
}

/// Best (feature, threshold) by Gini gain, if any split improves purity.
fn best_split(
    x: &[Vec<f64>],
    y: &[usize],
    n_classes: usize,
    samples: &[usize],
    max_features: Option<usize>,
    rng: &mut StdRng,
) -> Option<(usize, f64)> {
    let n_features = x.first().map_or(0, |row| row.len());
    if n_features == 0 {
        return None;
    }

    let candidates: Vec<usize> = match max_features {
        Some(k) if k < n_features => rand::seq::index::sample(rng, n_features, k).into_vec(),
        _ => (0..n_features).collect(),
    };

    let parent = gini(&class_counts(y, samples, n_classes), samples.len());
    let total = samples.len() as f64;

    let mut best: Option<(usize, f64, f64)> = None; // (feature, threshold, gain)

    for &feature in &candidates {
        let mut values: Vec<f64> = samples.iter().map(|&i| x[i][feature]).collect();
        values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        values.dedup();

        for pair in values.windows(2) {
            let threshold = (pair[0] + pair[1]) / 2.0;

            let mut left_counts = vec![0usize; n_classes];
            let mut right_counts = vec![0usize; n_classes];
            for &i in samples {
                if x[i][feature] <= threshold {
                    left_counts[y[i]] += 1;
                } else {
                    right_counts[y[i]] += 1;
                }
            }
            let n_left: usize = left_counts.iter().sum();
            let n_right: usize = right_counts.iter().sum();
            if n_left == 0 || n_right == 0 {
                continue;
            }

            let weighted = (n_left as f64 / total) * gini(&left_counts, n_left)
                + (n_right as f64 / total) * gini(&right_counts, n_right);
            let gain = parent - weighted;

            let improves = match best {
                Some((_, _, best_gain)) => gain > best_gain,
                None => gain > 1e-12,
            };
            if improves {
                best = Some((feature, threshold, gain));
            }
        }
    }

    best.map(|(feature, threshold, _)| (feature, threshold))
}

/// Gini impurity of a count vector.
fn gini(counts: &[usize], total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f64 / total;
            p * p
        })
        .sum::<f64>()
}
