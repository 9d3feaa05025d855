//! Log-log regression of relative home hours on the female wage.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::error::{HouseholdError, Result};

/// Fitted coefficients of `ln(HF/HM) = beta0 + beta1 ln(wF)`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegressionResult {
    pub beta0: f64,
    pub beta1: f64,
}

impl RegressionResult {
    /// Coefficients before any regression has been run.
    pub fn unset() -> Self {
        Self {
            beta0: f64::NAN,
            beta1: f64::NAN,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.beta0.is_finite() && self.beta1.is_finite()
    }

    /// Squared distance to the target coefficients.
    pub fn squared_error(&self, beta0_target: f64, beta1_target: f64) -> f64 {
        (beta0_target - self.beta0).powi(2) + (beta1_target - self.beta1).powi(2)
    }
}

impl Default for RegressionResult {
    fn default() -> Self {
        Self::unset()
    }
}

/// Ordinary least squares of `y` on a constant and `x`.
///
/// Solved through an SVD, so a rank-deficient design yields the minimum
/// 2-norm coefficients.
pub fn ols(x: &DVector<f64>, y: &DVector<f64>) -> Result<RegressionResult> {
    let n = x.len();
    if y.len() != n {
        return Err(HouseholdError::dimension_mismatch("regression target", n, y.len()));
    }
    if n == 0 {
        return Err(HouseholdError::dimension_mismatch("regression sample", 1, 0));
    }

    let design = DMatrix::from_fn(n, 2, |i, j| if j == 0 { 1.0 } else { x[i] });
    let svd = design
        .try_svd(true, true, f64::EPSILON, 0)
        .ok_or(HouseholdError::Singular {
            context: "regression design SVD",
        })?;
    let tolerance = f64::EPSILON * n as f64 * svd.singular_values.max();
    let beta = svd
        .solve(y, tolerance)
        .map_err(|_| HouseholdError::Singular {
            context: "regression least squares",
        })?;

    Ok(RegressionResult {
        beta0: beta[0],
        beta1: beta[1],
    })
}

/// Regresses `ln(HF/HM)` on `ln(wF)`.
///
/// Zero or negative entries in `hm` or `hf` are not rejected. Any log ratio
/// that is not finite makes both coefficients NaN, so check
/// [`RegressionResult::is_finite`] before using the output.
pub fn run_regression(
    female_wages: &DVector<f64>,
    hm: &DVector<f64>,
    hf: &DVector<f64>,
) -> Result<RegressionResult> {
    let n = female_wages.len();
    if hm.len() != n {
        return Err(HouseholdError::dimension_mismatch("HM length", n, hm.len()));
    }
    if hf.len() != n {
        return Err(HouseholdError::dimension_mismatch("HF length", n, hf.len()));
    }

    let x = female_wages.map(f64::ln);
    let y = hf.zip_map(hm, |f, m| (f / m).ln());
    if !y.iter().all(|v| v.is_finite()) {
        return Ok(RegressionResult::unset());
    }
    ols(&x, &y)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::params::linspace;

    #[test]
    fn recovers_noise_free_coefficients() {
        let wages = linspace(0.8, 1.2, 5);
        let hm = DVector::from_element(5, 5.0);
        let hf = DVector::from_fn(5, |i, _| 5.0 * (0.4 - 0.1 * wages[i].ln()).exp());
        let fit = run_regression(&wages, &hm, &hf).unwrap();
        assert_relative_eq!(fit.beta0, 0.4, epsilon = 1e-6);
        assert_relative_eq!(fit.beta1, -0.1, epsilon = 1e-6);
        assert!(fit.squared_error(0.4, -0.1) < 1e-12);
    }

    #[test]
    fn constant_regressor_gives_minimum_norm_solution() {
        let x = DVector::from_element(4, 2.0);
        let y = DVector::from_element(4, 5.0);
        let fit = ols(&x, &y).unwrap();
        // Every (b0, b1) with b0 + 2 b1 = 5 fits; the minimum norm one is (1, 2).
        assert_relative_eq!(fit.beta0, 1.0, epsilon = 1e-10);
        assert_relative_eq!(fit.beta1, 2.0, epsilon = 1e-10);
    }

    #[test]
    fn zero_male_home_hours_propagate_as_non_finite() {
        let wages = linspace(0.8, 1.2, 3);
        let hm = DVector::from_vec(vec![1.0, 0.0, 1.0]);
        let hf = DVector::from_element(3, 1.0);
        let fit = run_regression(&wages, &hm, &hf).unwrap();
        assert!(!fit.is_finite());
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        let wages = linspace(0.8, 1.2, 3);
        let short = DVector::from_element(2, 1.0);
        let full = DVector::from_element(3, 1.0);
        assert!(matches!(
            run_regression(&wages, &short, &full),
            Err(HouseholdError::DimensionMismatch {
                context: "HM length",
                ..
            })
        ));
    }
}
