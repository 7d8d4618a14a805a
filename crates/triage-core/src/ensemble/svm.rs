//! Support-vector classifier with probability calibration.
//!
//! One-vs-rest RBF-kernel machines trained with kernel Pegasos, each
//! calibrated to a probability with Platt's sigmoid fit. Per-class
//! probabilities are normalized into a distribution.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::Classifier;

/// Pegasos passes over the training set.
const EPOCHS: usize = 15;

/// Newton iteration cap for the Platt sigmoid fit.
const PLATT_MAX_ITER: usize = 100;

/// RBF-kernel SVM with per-class Platt calibration.
#[derive(Debug, Clone)]
pub struct SvmClassifier {
    /// Training rows kept as the support set
    train_x: Vec<Vec<f64>>,
    /// RBF kernel width
    gamma: f64,
    /// One binary machine per class
    machines: Vec<BinaryMachine>,
}

#[derive(Debug, Clone)]
struct BinaryMachine {
    /// Per-row signed dual coefficient, `alpha_j * y_j / (lambda * T)`
    coeffs: Vec<f64>,
    /// Platt sigmoid slope
    platt_a: f64,
    /// Platt sigmoid intercept
    platt_b: f64,
}

impl SvmClassifier {
    /// Fit one-vs-rest machines. `seed` fixes the Pegasos sampling.
    pub fn fit(x: &[Vec<f64>], y: &[usize], n_classes: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let n_rows = x.len();
        let n_features = x.first().map_or(0, |row| row.len());
        let gamma = scale_gamma(x, n_features);

        // Dense kernel matrix; training sets here are small
        let kernel: Vec<Vec<f64>> = (0..n_rows)
            .map(|i| (0..n_rows).map(|j| rbf(&x[i], &x[j], gamma)).collect())
            .collect();

        let lambda = 1.0 / n_rows.max(1) as f64;
        let steps = EPOCHS * n_rows;

        let machines = (0..n_classes)
            .map(|class| {
                let targets: Vec<f64> = y
                    .iter()
                    .map(|&c| if c == class { 1.0 } else { -1.0 })
                    .collect();

                let coeffs = pegasos(&kernel, &targets, lambda, steps, &mut rng);

                let decisions: Vec<f64> = (0..n_rows)
                    .map(|i| dot(&coeffs, &kernel[i]))
                    .collect();
                let (platt_a, platt_b) = platt_fit(&decisions, &targets);

                BinaryMachine {
                    coeffs,
                    platt_a,
                    platt_b,
                }
            })
            .collect();

        Self {
            train_x: x.to_vec(),
            gamma,
            machines,
        }
    }
}

impl Classifier for SvmClassifier {
    fn predict_proba(&self, features: &[f64]) -> Vec<f64> {
        let kvec: Vec<f64> = self
            .train_x
            .iter()
            .map(|row| rbf(row, features, self.gamma))
            .collect();

        let mut probs: Vec<f64> = self
            .machines
            .iter()
            .map(|m| {
                let decision = dot(&m.coeffs, &kvec);
                sigmoid(-(m.platt_a * decision + m.platt_b))
            })
            .collect();

        let sum: f64 = probs.iter().sum();
        if sum > 1e-12 {
            for p in &mut probs {
                *p /= sum;
            }
        } else if !probs.is_empty() {
            let uniform = 1.0 / probs.len() as f64;
            probs.fill(uniform);
        }
        probs
    }
}

/// Kernel Pegasos: returns signed dual coefficients already scaled by
/// `1 / (lambda * T)`.
fn pegasos(
    kernel: &[Vec<f64>],
    targets: &[f64],
    lambda: f64,
    steps: usize,
    rng: &mut StdRng,
) -> Vec<f64> {
    let n_rows = targets.len();
    let mut alphas = vec![0.0f64; n_rows];

    for t in 1..=steps {
        let i = rng.gen_range(0..n_rows);
        let margin: f64 = (0..n_rows)
            .map(|j| alphas[j] * targets[j] * kernel[j][i])
            .sum::<f64>()
            / (lambda * t as f64);
        if targets[i] * margin < 1.0 {
            alphas[i] += 1.0;
        }
    }

    let scale = 1.0 / (lambda * steps.max(1) as f64);
    (0..n_rows)
        .map(|j| alphas[j] * targets[j] * scale)
        .collect()
}

/// Platt's sigmoid fit (Lin-Weng-Keerthi variant): find (a, b) so that
/// `1 / (1 + exp(a*f + b))` estimates P(y = +1 | f).
fn platt_fit(decisions: &[f64], targets: &[f64]) -> (f64, f64) {
    let prior1 = targets.iter().filter(|&&t| t > 0.0).count() as f64;
    let prior0 = targets.len() as f64 - prior1;

    let hi = (prior1 + 1.0) / (prior1 + 2.0);
    let lo = 1.0 / (prior0 + 2.0);
    let t: Vec<f64> = targets
        .iter()
        .map(|&y| if y > 0.0 { hi } else { lo })
        .collect();

    let sigma = 1e-12;
    let min_step = 1e-10;
    let mut a = 0.0;
    let mut b = ((prior0 + 1.0) / (prior1 + 1.0)).ln();
    let mut fval = platt_objective(decisions, &t, a, b);

    for _ in 0..PLATT_MAX_ITER {
        let (mut g1, mut g2) = (0.0, 0.0);
        let (mut h11, mut h22, mut h21) = (sigma, sigma, 0.0);

        for (&d, &ti) in decisions.iter().zip(&t) {
            let f_ab = d * a + b;
            let (p, q) = if f_ab >= 0.0 {
                let e = (-f_ab).exp();
                (e / (1.0 + e), 1.0 / (1.0 + e))
            } else {
                let e = f_ab.exp();
                (1.0 / (1.0 + e), e / (1.0 + e))
            };
            let d2 = p * q;
            h11 += d * d * d2;
            h22 += d2;
            h21 += d * d2;
            let d1 = ti - p;
            g1 += d * d1;
            g2 += d1;
        }

        if g1.abs() < 1e-5 && g2.abs() < 1e-5 {
            break;
        }

        let det = h11 * h22 - h21 * h21;
        let da = -(h22 * g1 - h21 * g2) / det;
        let db = -(-h21 * g1 + h11 * g2) / det;
        let gd = g1 * da + g2 * db;

        let mut stepsize = 1.0;
        while stepsize >= min_step {
            let new_a = a + stepsize * da;
            let new_b = b + stepsize * db;
            let new_f = platt_objective(decisions, &t, new_a, new_b);
            if new_f < fval + 1e-4 * stepsize * gd {
                a = new_a;
                b = new_b;
                fval = new_f;
                break;
            }
            stepsize /= 2.0;
        }
        if stepsize < min_step {
            break;
        }
    }

    (a, b)
}

/// Cross-entropy objective of the Platt sigmoid, evaluated stably.
fn platt_objective(decisions: &[f64], t: &[f64], a: f64, b: f64) -> f64 {
    decisions
        .iter()
        .zip(t)
        .map(|(&d, &ti)| {
            let f_ab = d * a + b;
            if f_ab >= 0.0 {
                ti * f_ab + (1.0 + (-f_ab).exp()).ln()
            } else {
                (ti - 1.0) * f_ab + (1.0 + f_ab.exp()).ln()
            }
        })
        .sum()
}

/// Sklearn-style "scale" gamma: `1 / (n_features * var(X))`.
fn scale_gamma(x: &[Vec<f64>], n_features: usize) -> f64 {
    if n_features == 0 {
        return 1.0;
    }
    let count = (x.len() * n_features) as f64;
    if count == 0.0 {
        return 1.0 / n_features as f64;
    }
    let mean: f64 = x.iter().flatten().sum::<f64>() / count;
    let var: f64 = x
        .iter()
        .flatten()
        .map(|&v| {
            let d = v - mean;
            d * d
        })
        .sum::<f64>()
        / count;

    if var > 1e-12 {
        1.0 / (n_features as f64 * var)
    } else {
        1.0 / n_features as f64
    }
}

fn rbf(a: &[f64], b: &[f64], gamma: f64) -> f64 {
    let sq_dist: f64 = a
        .iter()
        .zip(b)
        .map(|(&x, &y)| {
            let d = x - y;
            d * d
        })
        .sum();
    (-gamma * sq_dist).exp()
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(&x, &y)| x * y).sum()
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy_data() -> (Vec<Vec<f64>>, Vec<usize>) {
        let mut x = Vec::new();
        let mut y = Vec::new();
        for _ in 0..6 {
            x.push(vec![1.0, 1.0, 0.0, 0.0]);
            y.push(0);
            x.push(vec![0.0, 0.0, 1.0, 1.0]);
            y.push(1);
        }
        (x, y)
    }

    #[test]
    fn test_proba_is_distribution() {
        let (x, y) = toy_data();
        let svm = SvmClassifier::fit(&x, &y, 2, 42);

        let proba = svm.predict_proba(&[1.0, 1.0, 0.0, 0.0]);
        assert_eq!(proba.len(), 2);
        assert!((proba.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert!(proba.iter().all(|&p| (0.0..=1.0).contains(&p)));
    }

    #[test]
    fn test_separable_classes() {
        let (x, y) = toy_data();
        let svm = SvmClassifier::fit(&x, &y, 2, 42);

        assert!(svm.predict_proba(&[1.0, 1.0, 0.0, 0.0])[0] > 0.5);
        assert!(svm.predict_proba(&[0.0, 0.0, 1.0, 1.0])[1] > 0.5);
    }

    #[test]
    fn test_deterministic_for_seed() {
        let (x, y) = toy_data();
        let a = SvmClassifier::fit(&x, &y, 2, 9);
        let b = SvmClassifier::fit(&x, &y, 2, 9);

        let query = [1.0, 0.0, 1.0, 0.0];
        assert_eq!(a.predict_proba(&query), b.predict_proba(&query));
    }

    #[test]
    fn test_platt_fit_orients_sigmoid() {
        // Positive decisions for positive targets: slope must be negative
        // so that 1/(1+exp(a*f+b)) increases with f
        let decisions = vec![2.0, 1.5, 1.0, -1.0, -1.5, -2.0];
        let targets = vec![1.0, 1.0, 1.0, -1.0, -1.0, -1.0];
        let (a, b) = platt_fit(&decisions, &targets);

        let p_pos = sigmoid(-(a * 2.0 + b));
        let p_neg = sigmoid(-(a * -2.0 + b));
        assert!(p_pos > 0.5, "expected high probability, got {p_pos}");
        assert!(p_neg < 0.5, "expected low probability, got {p_neg}");
    }
}
