//! Contracts with the external DRT fitting collaborator.
//!
//! The numerical inversion itself is out of scope; the core hands over
//! (frequency, complex impedance) plus fit options and only queries the
//! returned model through the methods below.

use num_complex::Complex64;

/// Options forwarded to the fitter for one file.
#[derive(Debug, Clone, PartialEq)]
pub struct FitOptions {
    /// DRT regularization strength.
    pub lambda: f64,
    /// Constrain the distribution to be non-negative.
    pub nonneg: bool,
    /// Also fit a distribution of phasance.
    pub fit_dop: bool,
    /// DOP regularization strength, set when `fit_dop` is on.
    pub dop_lambda: Option<f64>,
}

/// A fitted distribution, queryable for predictions and residuals.
pub trait FitModel {
    /// Distribution values at the given relaxation times.
    fn predict_distribution(&self, tau: &[f64]) -> Vec<f64>;

    /// DOP values and their phasance-angle axis as `(nu, values)`;
    /// `normalize` requests angle-normalized values.
    fn predict_dop(&self, normalize: bool) -> (Vec<f64>, Vec<f64>);

    /// Residuals of the fit against the measured impedance.
    fn residuals(&self, freq: &[f64], z: &[Complex64]) -> Vec<Complex64>;
}

/// The fitting collaborator.
pub trait DrtFitter {
    fn fit(
        &self,
        freq: &[f64],
        z: &[Complex64],
        basis_tau: &[f64],
        options: &FitOptions,
    ) -> anyhow::Result<Box<dyn FitModel>>;
}

/// `n` log-spaced points from `10^start_exp` to `10^end_exp`, endpoints
/// included.
pub fn logspace(start_exp: f64, end_exp: f64, n: usize) -> Vec<f64> {
    if n == 1 {
        return vec![10f64.powf(start_exp)];
    }
    let step = (end_exp - start_exp) / (n - 1) as f64;
    (0..n)
        .map(|i| 10f64.powf(start_exp + step * i as f64))
        .collect()
}

/// The fixed relaxation-time basis shared by every fit in a batch:
/// 181 points from 1e-7 to 1e2 seconds.
pub fn fixed_basis_tau() -> Vec<f64> {
    logspace(-7.0, 2.0, 181)
}
