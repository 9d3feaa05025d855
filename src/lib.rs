//! Household specialization model: how a two-person household splits its
//! time between market work and home production.
//!
//! The crate offers tools to
//!
//! - describe preferences, home production technology, and wages (`params` module),
//! - evaluate household utility for any allocation of hours (`utility` module),
//! - find the optimal allocation on a grid or continuously (`solving` module),
//! - re-solve the model along a vector of female wages (`sweep` module),
//! - regress relative home hours on relative wages (`regression` module), and
//! - calibrate `alpha` and `sigma` to target regression coefficients (`estimation` module).
//!
//! A small `solow` module computes the series behind a Solow growth diagram.
//!
//! # Quick start
//!
//! ```no_run
//! use hhspec::{HouseholdModel, HouseholdParams, SolveMode};
//!
//! let params = HouseholdParams::builder()
//!     .alpha(0.5)
//!     .sigma(1.0)
//!     .build()
//!     .expect("valid parameters");
//! let mut model = HouseholdModel::new(params).expect("valid model");
//!
//! let discrete = model.solve_discrete();
//! println!("grid optimum: {:?}", discrete.choice);
//!
//! model.solve_wage_vector(SolveMode::Continuous);
//! let fit = model.run_regression().expect("regression");
//! println!("beta0 = {}, beta1 = {}", fit.beta0, fit.beta1);
//!
//! let calibrated = model.estimate().expect("calibration");
//! println!("alpha = {}, sigma = {}", calibrated.alpha, calibrated.sigma);
//! ```
//!
//! Numerical edge cases are reported rather than hidden: optimizer
//! convergence travels in [`SolveSummary`], and a regression over zero home
//! hours yields NaN coefficients instead of an error.

pub mod error;
pub mod estimation;
pub mod options;
pub mod params;
pub mod regression;
pub mod solow;
pub mod solving;
pub mod sweep;
pub mod utility;

pub use error::{HouseholdError, Result};
pub use estimation::{calibrate_alpha_sigma, calibrate_sigma, CalibrationResult, HouseholdModel};
pub use options::{
    CalibrationOptions, ContinuousOptions, DiscreteOptions, SolveMode, SolverOptions, SweepOptions,
};
pub use params::{HomeProduction, HouseholdParams, HouseholdParamsBuilder};
pub use regression::RegressionResult;
pub use solving::{Solution, SolveSummary};
pub use sweep::SweepSolution;
pub use utility::Choice;
