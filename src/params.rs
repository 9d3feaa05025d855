//! Model parameters, their documented defaults, and validation.

use nalgebra::DVector;
use serde::{Deserialize, Serialize};

use crate::error::{HouseholdError, Result};

/// Lower bound applied to hours, CES inner sums, and composite consumption
/// before any fractional power is taken.
pub const FLOOR: f64 = 1e-7;

/// Distance from 0 or 1 within which `sigma` selects the Leontief or
/// Cobb-Douglas limit instead of the generic CES aggregator.
pub const SIGMA_TOLERANCE: f64 = 1e-10;

/// Distance from 1 within which `rho` switches to log utility.
pub const RHO_TOLERANCE: f64 = 1e-10;

/// Home production technology, resolved once from `(alpha, sigma)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum HomeProduction {
    /// `H = min(HM, HF)`.
    Leontief,
    /// `H = HM^(1-alpha) * HF^alpha`.
    CobbDouglas { alpha: f64 },
    /// `H = [(1-alpha) HM^r + alpha HF^r]^(1/r)` with `r = (sigma-1)/sigma`.
    Ces { alpha: f64, sigma: f64 },
}

impl HomeProduction {
    /// Picks the technology for a given share `alpha` and elasticity `sigma`.
    pub fn from_sigma(alpha: f64, sigma: f64) -> Self {
        if sigma.abs() <= SIGMA_TOLERANCE {
            Self::Leontief
        } else if (sigma - 1.0).abs() <= SIGMA_TOLERANCE {
            Self::CobbDouglas { alpha }
        } else {
            Self::Ces { alpha, sigma }
        }
    }

    /// Output of home production for male and female hours.
    pub fn output(&self, hm: f64, hf: f64) -> f64 {
        match *self {
            Self::Leontief => hm.min(hf),
            Self::CobbDouglas { alpha } => hm.powf(1.0 - alpha) * hf.powf(alpha),
            Self::Ces { alpha, sigma } => {
                let r = (sigma - 1.0) / sigma;
                let inner = (1.0 - alpha) * hm.max(FLOOR).powf(r) + alpha * hf.max(FLOOR).powf(r);
                inner.max(FLOOR).powf(1.0 / r)
            }
        }
    }
}

/// Preference, production, price, and target parameters of the household model.
///
/// Defaults reproduce the baseline calibration: `rho = 2`, `nu = 0.001`,
/// `epsilon = 1`, `omega = 0.5`, `alpha = 0.5`, `sigma = 1`, `wM = wF = 1`,
/// `wF_vec = [0.8, 0.9, 1.0, 1.1, 1.2]`, targets `beta0 = 0.4`, `beta1 = -0.1`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HouseholdParams {
    /// Relative risk aversion of the consumption transform.
    pub rho: f64,
    /// Scale of the disutility of work.
    pub nu: f64,
    /// Frisch elasticity of labor supply.
    pub epsilon: f64,
    /// Weight of market consumption in the composite good.
    pub omega: f64,
    /// Female share in home production.
    pub alpha: f64,
    /// Elasticity of substitution between male and female home hours.
    pub sigma: f64,
    /// Male wage.
    pub wage_male: f64,
    /// Female wage used by single solves.
    pub wage_female: f64,
    /// Female wages visited by a sweep, in order.
    pub female_wages: DVector<f64>,
    pub beta0_target: f64,
    pub beta1_target: f64,
}

impl Default for HouseholdParams {
    fn default() -> Self {
        Self {
            rho: 2.0,
            nu: 0.001,
            epsilon: 1.0,
            omega: 0.5,
            alpha: 0.5,
            sigma: 1.0,
            wage_male: 1.0,
            wage_female: 1.0,
            female_wages: linspace(0.8, 1.2, 5),
            beta0_target: 0.4,
            beta1_target: -0.1,
        }
    }
}

impl HouseholdParams {
    /// Start a validated construction from the defaults.
    pub fn builder() -> HouseholdParamsBuilder {
        HouseholdParamsBuilder::new()
    }

    /// Home production technology implied by the current `alpha` and `sigma`.
    pub fn home_production(&self) -> HomeProduction {
        HomeProduction::from_sigma(self.alpha, self.sigma)
    }

    /// Returns a snapshot with the female wage replaced.
    pub fn with_female_wage(&self, wage: f64) -> Self {
        Self {
            wage_female: wage,
            ..self.clone()
        }
    }

    /// Returns a snapshot with new structural home production parameters.
    pub fn with_structural(&self, alpha: f64, sigma: f64) -> Self {
        Self {
            alpha,
            sigma,
            ..self.clone()
        }
    }

    /// Number of points visited by a wage sweep.
    pub fn sweep_len(&self) -> usize {
        self.female_wages.len()
    }

    /// Checks the invariants enforced by [`HouseholdParamsBuilder::build`].
    pub fn validate(&self) -> Result<()> {
        check_positive("wage_male", self.wage_male)?;
        check_positive("wage_female", self.wage_female)?;
        if self.female_wages.is_empty() {
            return Err(HouseholdError::dimension_mismatch("female wage vector", 1, 0));
        }
        for wage in self.female_wages.iter() {
            check_positive("female_wages", *wage)?;
        }
        if !(self.nu >= 0.0 && self.nu.is_finite()) {
            return Err(HouseholdError::invalid_parameter(
                "nu",
                self.nu,
                "must be finite and non-negative",
            ));
        }
        check_positive("epsilon", self.epsilon)?;
        if !(self.sigma >= 0.0 && self.sigma.is_finite()) {
            return Err(HouseholdError::invalid_parameter(
                "sigma",
                self.sigma,
                "must be finite and non-negative",
            ));
        }
        for (name, value) in [
            ("rho", self.rho),
            ("omega", self.omega),
            ("alpha", self.alpha),
            ("beta0_target", self.beta0_target),
            ("beta1_target", self.beta1_target),
        ] {
            if !value.is_finite() {
                return Err(HouseholdError::invalid_parameter(
                    name,
                    value,
                    "must be finite",
                ));
            }
        }
        Ok(())
    }
}

fn check_positive(name: &'static str, value: f64) -> Result<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(HouseholdError::invalid_parameter(
            name,
            value,
            "must be strictly positive and finite",
        ))
    }
}

/// `n` evenly spaced values from `start` to `stop`, both inclusive.
pub fn linspace(start: f64, stop: f64, n: usize) -> DVector<f64> {
    if n == 1 {
        return DVector::from_element(1, start);
    }
    let step = (stop - start) / (n as f64 - 1.0);
    DVector::from_fn(n, |i, _| start + i as f64 * step)
}

/// Builder that validates parameters before constructing [`HouseholdParams`].
#[derive(Debug, Default)]
pub struct HouseholdParamsBuilder {
    params: HouseholdParams,
}

impl HouseholdParamsBuilder {
    /// Start from the documented defaults.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rho(mut self, rho: f64) -> Self {
        self.params.rho = rho;
        self
    }

    pub fn nu(mut self, nu: f64) -> Self {
        self.params.nu = nu;
        self
    }

    pub fn epsilon(mut self, epsilon: f64) -> Self {
        self.params.epsilon = epsilon;
        self
    }

    pub fn omega(mut self, omega: f64) -> Self {
        self.params.omega = omega;
        self
    }

    pub fn alpha(mut self, alpha: f64) -> Self {
        self.params.alpha = alpha;
        self
    }

    pub fn sigma(mut self, sigma: f64) -> Self {
        self.params.sigma = sigma;
        self
    }

    /// Sets both wages used by single solves.
    pub fn wages(mut self, male: f64, female: f64) -> Self {
        self.params.wage_male = male;
        self.params.wage_female = female;
        self
    }

    /// Sets the female wages visited by a sweep.
    pub fn female_wages(mut self, wages: DVector<f64>) -> Self {
        self.params.female_wages = wages;
        self
    }

    /// Sets the regression coefficients targeted by calibration.
    pub fn targets(mut self, beta0: f64, beta1: f64) -> Self {
        self.params.beta0_target = beta0;
        self.params.beta1_target = beta1;
        self
    }

    /// Finalizes construction after validating every parameter.
    pub fn build(self) -> Result<HouseholdParams> {
        self.params.validate()?;
        Ok(self.params)
    }
}
