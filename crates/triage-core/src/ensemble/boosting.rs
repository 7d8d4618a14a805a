//! Gradient-boosted tree classifier.
//!
//! Multinomial deviance boosting: 100 stages, one depth-3 regression
//! tree per class per stage, fitted to softmax residuals with Newton
//! leaf values. Fully deterministic, no subsampling.

use super::{softmax_in_place, Classifier};

/// Number of boosting stages.
const N_STAGES: usize = 100;

/// Shrinkage applied to every tree's contribution.
const LEARNING_RATE: f64 = 0.1;

/// Depth limit for the stage regression trees.
const MAX_DEPTH: usize = 3;

/// Minimum samples in a node before a split is attempted.
const MIN_SAMPLES_SPLIT: usize = 2;

/// Gradient boosting machine over binary symptom features.
#[derive(Debug, Clone)]
pub struct GradientBoosting {
    /// Initial raw score per class (log class prior)
    init: Vec<f64>,
    /// `stages[s][c]` is the stage-`s` tree for class `c`
    stages: Vec<Vec<RegressionTree>>,
    n_classes: usize,
}

impl GradientBoosting {
    /// Fit the boosting ensemble.
    pub fn fit(x: &[Vec<f64>], y: &[usize], n_classes: usize) -> Self {
        let n_rows = x.len();

        let mut counts = vec![0usize; n_classes];
        for &class in y {
            counts[class] += 1;
        }
        let init: Vec<f64> = counts
            .iter()
            .map(|&c| ((c.max(1)) as f64 / n_rows.max(1) as f64).ln())
            .collect();

        // Raw score matrix, one row per sample
        let mut scores: Vec<Vec<f64>> = vec![init.clone(); n_rows];
        let leaf_factor = if n_classes > 1 {
            (n_classes - 1) as f64 / n_classes as f64
        } else {
            0.0
        };

        let all_samples: Vec<usize> = (0..n_rows).collect();
        let mut stages = Vec::with_capacity(N_STAGES);

        for _ in 0..N_STAGES {
            let probs: Vec<Vec<f64>> = scores
                .iter()
                .map(|row| {
                    let mut p = row.clone();
                    softmax_in_place(&mut p);
                    p
                })
                .collect();

            let mut stage = Vec::with_capacity(n_classes);
            for class in 0..n_classes {
                let grad: Vec<f64> = (0..n_rows)
                    .map(|i| (if y[i] == class { 1.0 } else { 0.0 }) - probs[i][class])
                    .collect();
                let hess: Vec<f64> = (0..n_rows)
                    .map(|i| probs[i][class] * (1.0 - probs[i][class]))
                    .collect();

                let tree =
                    RegressionTree::fit(x, &grad, &hess, &all_samples, MAX_DEPTH, leaf_factor);
                for (i, row) in scores.iter_mut().enumerate() {
                    row[class] += LEARNING_RATE * tree.predict(&x[i]);
                }
                stage.push(tree);
            }
            stages.push(stage);
        }

        Self {
            init,
            stages,
            n_classes,
        }
    }
}

impl Classifier for GradientBoosting {
    fn predict_proba(&self, features: &[f64]) -> Vec<f64> {
        let mut scores = self.init.clone();
        for stage in &self.stages {
            for (class, tree) in stage.iter().enumerate() {
                scores[class] += LEARNING_RATE * tree.predict(features);
            }
        }
        debug_assert_eq!(scores.len(), self.n_classes);
        softmax_in_place(&mut scores);
        scores
    }
}

/// Depth-limited regression tree with Newton-step leaf values.
#[derive(Debug, Clone)]
struct RegressionTree {
    nodes: Vec<RegressionNode>,
}

#[derive(Debug, Clone)]
enum RegressionNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

impl RegressionTree {
    /// Fit a tree to gradients, with leaf value
    /// `factor * sum(grad) / sum(hess)`.
    fn fit(
        x: &[Vec<f64>],
        grad: &[f64],
        hess: &[f64],
        samples: &[usize],
        max_depth: usize,
        factor: f64,
    ) -> Self {
        let mut nodes = Vec::new();
        build_node(&mut nodes, x, grad, hess, samples, max_depth, factor);
        Self { nodes }
    }

    fn predict(&self, features: &[f64]) -> f64 {
        let mut current = 0;
        loop {
            match &self.nodes[current] {
                RegressionNode::Leaf { value } => return *value,
                RegressionNode::Split {
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

fn build_node(
    nodes: &mut Vec<RegressionNode>,
    x: &[Vec<f64>],
    grad: &[f64],
    hess: &[f64],
    samples: &[usize],
    depth_left: usize,
    factor: f64,
) -> usize {
    if depth_left == 0 || samples.len() < MIN_SAMPLES_SPLIT {
        return push_leaf(nodes, grad, hess, samples, factor);
    }

    let split = best_split(x, grad, samples);
    let (feature, threshold) = match split {
        Some(s) => s,
        None => return push_leaf(nodes, grad, hess, samples, factor),
    };

    let (left_samples, right_samples): (Vec<usize>, Vec<usize>) = samples
        .iter()
        .copied()
        .partition(|&i| x[i][feature] <= threshold);

    let node_index = nodes.len();
    nodes.push(RegressionNode::Leaf { value: 0.0 }); // placeholder

    let left = build_node(nodes, x, grad, hess, &left_samples, depth_left - 1, factor);
    let right = build_node(nodes, x, grad, hess, &right_samples, depth_left - 1, factor);

    nodes[node_index] = RegressionNode::Split {
        feature,
        threshold,
        left,
        right,
    };
    node_index
}

fn push_leaf(
    nodes: &mut Vec<RegressionNode>,
    grad: &[f64],
    hess: &[f64],
    samples: &[usize],
    factor: f64,
) -> usize {
    let grad_sum: f64 = samples.iter().map(|&i| grad[i]).sum();
    let hess_sum: f64 = samples.iter().map(|&i| hess[i]).sum();
    let value = factor * grad_sum / (hess_sum + 1e-12);

    let index = nodes.len();
    nodes.push(RegressionNode::Leaf { value });
    index
}

/// Best split by squared-error reduction on the gradients.
fn best_split(x: &[Vec<f64>], grad: &[f64], samples: &[usize]) -> Option<(usize, f64)> {
    let n_features = x.first().map_or(0, |row| row.len());

    let parent_sse = sse(grad, samples);
    let mut best: Option<(usize, f64, f64)> = None;

    for feature in 0..n_features {
        let mut values: Vec<f64> = samples.iter().map(|&i| x[i][feature]).collect();
        values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        values.dedup();

        for pair in values.windows(2) {
            let threshold = (pair[0] + pair[1]) / 2.0;
            let (left, right): (Vec<usize>, Vec<usize>) = samples
                .iter()
                .copied()
                .partition(|&i| x[i][feature] <= threshold);
            if left.is_empty() || right.is_empty() {
                continue;
            }

            let gain = parent_sse - sse(grad, &left) - sse(grad, &right);
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

/// Sum of squared deviations from the sample mean.
fn sse(grad: &[f64], samples: &[usize]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let mean: f64 = samples.iter().map(|&i| grad[i]).sum::<f64>() / samples.len() as f64;
    samples
        .iter()
        .map(|&i| {
            let d = grad[i] - mean;
            d * d
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy_data() -> (Vec<Vec<f64>>, Vec<usize>) {
        let mut x = Vec::new();
        let mut y = Vec::new();
        for _ in 0..5 {
            x.push(vec![1.0, 0.0, 0.0]);
            y.push(0);
            x.push(vec![0.0, 1.0, 0.0]);
            y.push(1);
            x.push(vec![0.0, 0.0, 1.0]);
            y.push(2);
        }
        (x, y)
    }

    #[test]
    fn test_proba_is_distribution() {
        let (x, y) = toy_data();
        let gb = GradientBoosting::fit(&x, &y, 3);

        let proba = gb.predict_proba(&[1.0, 0.0, 0.0]);
        assert_eq!(proba.len(), 3);
        assert!((proba.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_learns_three_classes() {
        let (x, y) = toy_data();
        let gb = GradientBoosting::fit(&x, &y, 3);

        assert!(gb.predict_proba(&[1.0, 0.0, 0.0])[0] > 0.7);
        assert!(gb.predict_proba(&[0.0, 1.0, 0.0])[1] > 0.7);
        assert!(gb.predict_proba(&[0.0, 0.0, 1.0])[2] > 0.7);
    }

    #[test]
    fn test_deterministic() {
        let (x, y) = toy_data();
        let a = GradientBoosting::fit(&x, &y, 3);
        let b = GradientBoosting::fit(&x, &y, 3);

        assert_eq!(
            a.predict_proba(&[0.0, 1.0, 0.0]),
            b.predict_proba(&[0.0, 1.0, 0.0])
        );
    }
}
