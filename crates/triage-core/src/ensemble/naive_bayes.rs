//! Gaussian naive Bayes classifier.

use super::{log_sum_exp, Classifier};

/// Portion of the largest feature variance added to every per-class
/// variance, keeping the Gaussian likelihood finite for constant features.
const VAR_SMOOTHING: f64 = 1e-9;

/// Gaussian naive Bayes: class priors plus per-class feature means and
/// variances, combined under the independence assumption.
#[derive(Debug, Clone)]
pub struct GaussianNb {
    /// Log prior per class
    log_priors: Vec<f64>,
    /// Feature means, `[n_classes][n_features]`
    means: Vec<Vec<f64>>,
    /// Smoothed feature variances, `[n_classes][n_features]`
    variances: Vec<Vec<f64>>,
}

impl GaussianNb {
    /// Fit priors, means and variances from training rows.
    pub fn fit(x: &[Vec<f64>], y: &[usize], n_classes: usize) -> Self {
        let n_features = x.first().map_or(0, |row| row.len());
        let n_rows = x.len();

        let mut counts = vec![0usize; n_classes];
        let mut means = vec![vec![0.0; n_features]; n_classes];
        for (row, &class) in x.iter().zip(y) {
            counts[class] += 1;
            for (m, &value) in means[class].iter_mut().zip(row) {
                *m += value;
            }
        }
        for (class, count) in counts.iter().enumerate() {
            let denom = (*count).max(1) as f64;
            for m in &mut means[class] {
                *m /= denom;
            }
        }

        let mut variances = vec![vec![0.0; n_features]; n_classes];
        for (row, &class) in x.iter().zip(y) {
            for ((v, m), &value) in variances[class].iter_mut().zip(&means[class]).zip(row) {
                let d = value - m;
                *v += d * d;
            }
        }
        for (class, count) in counts.iter().enumerate() {
            let denom = (*count).max(1) as f64;
            for v in &mut variances[class] {
                *v /= denom;
            }
        }

        // Smoothing scaled by the largest variance over the whole table
        let epsilon = VAR_SMOOTHING * global_max_variance(x, n_features, n_rows).max(1e-3);
        for class_vars in &mut variances {
            for v in class_vars {
                *v += epsilon;
            }
        }

        let log_priors = counts
            .iter()
            .map(|&c| ((c.max(1)) as f64 / n_rows.max(1) as f64).ln())
            .collect();

        Self {
            log_priors,
            means,
            variances,
        }
    }
}

impl Classifier for GaussianNb {
    fn predict_proba(&self, features: &[f64]) -> Vec<f64> {
        let mut joint: Vec<f64> = self
            .log_priors
            .iter()
            .enumerate()
            .map(|(class, &log_prior)| {
                let mut ll = log_prior;
                for ((&value, &mean), &var) in features
                    .iter()
                    .zip(&self.means[class])
                    .zip(&self.variances[class])
                {
                    let d = value - mean;
                    ll += -0.5 * (2.0 * std::f64::consts::PI * var).ln() - d * d / (2.0 * var);
                }
                ll
            })
            .collect();

        let norm = log_sum_exp(&joint);
        for ll in &mut joint {
            *ll = (*ll - norm).exp();
        }
        joint
    }
}

/// Largest per-feature variance across the full table.
fn global_max_variance(x: &[Vec<f64>], n_features: usize, n_rows: usize) -> f64 {
    if n_rows == 0 {
        return 0.0;
    }
    let mut max_var: f64 = 0.0;
    for feature in 0..n_features {
        let mean: f64 = x.iter().map(|row| row[feature]).sum::<f64>() / n_rows as f64;
        let var: f64 = x
            .iter()
            .map(|row| {
                let d = row[feature] - mean;
                d * d
            })
            .sum::<f64>()
            / n_rows as f64;
        max_var = max_var.max(var);
    }
    max_var
}
