//! Calibration of the home production parameters and the model owner that
//! ties solving, sweeping, and regression together.

use argmin::core::{CostFunction, Executor, State};
use argmin::solver::neldermead::NelderMead;
use log::{debug, info};

use crate::error::{HouseholdError, Result};
use crate::options::{CalibrationOptions, SolveMode, SolverOptions};
use crate::params::HouseholdParams;
use crate::regression::{run_regression, RegressionResult};
use crate::solving::{solve_continuous, solve_discrete, Solution};
use crate::sweep::{solve_wage_vector, sweep_into, SweepSolution};

/// Which structural parameters a calibration search moves.
#[derive(Clone, Copy, Debug, PartialEq)]
enum FreeParameters {
    AlphaSigma,
    /// `sigma` alone, projected into `[lower, upper]`.
    Sigma { lower: f64, upper: f64 },
}

/// Outcome of a calibration search.
#[derive(Clone, Debug, PartialEq)]
pub struct CalibrationResult {
    pub alpha: f64,
    pub sigma: f64,
    /// Squared distance between fitted and target coefficients at the optimum.
    pub objective: f64,
    /// Regression refitted at the returned parameters.
    pub regression: RegressionResult,
    /// Nelder-Mead iterations performed.
    pub iterations: u64,
    /// Termination reason reported by the simplex search.
    pub termination: String,
}

/// Sweeps the wage vector with the continuous solver and fits the regression.
pub fn sweep_and_regress(
    params: &HouseholdParams,
    options: &SolverOptions,
) -> Result<(SweepSolution, RegressionResult)> {
    let options = options.clone().with_mode(SolveMode::Continuous);
    let solution = solve_wage_vector(params, &options);
    let regression = run_regression(&params.female_wages, &solution.hm, &solution.hf)?;
    Ok((solution, regression))
}

struct CalibrationProblem<'a> {
    params: &'a HouseholdParams,
    options: &'a SolverOptions,
    free: FreeParameters,
}

impl CalibrationProblem<'_> {
    fn trial(&self, x: &[f64]) -> HouseholdParams {
        match self.free {
            FreeParameters::AlphaSigma => self.params.with_structural(x[0], x[1]),
            FreeParameters::Sigma { lower, upper } => self
                .params
                .with_structural(self.params.alpha, x[0].clamp(lower, upper)),
        }
    }

    fn objective(&self, trial: &HouseholdParams) -> Result<(f64, RegressionResult)> {
        let (_, regression) = sweep_and_regress(trial, self.options)?;
        let value = regression.squared_error(trial.beta0_target, trial.beta1_target);
        debug!(
            "calibration trial alpha = {:.6}, sigma = {:.6}: beta0 = {:.6}, beta1 = {:.6}, objective = {:.3e}",
            trial.alpha, trial.sigma, regression.beta0, regression.beta1, value
        );
        if value.is_nan() {
            return Err(HouseholdError::NonFiniteObjective {
                context: "calibration trial",
                value,
            });
        }
        Ok((value, regression))
    }

    /// Solves the best simplex point once more for the reported regression.
    fn refit(&self, x: &[f64]) -> Result<(HouseholdParams, f64, RegressionResult)> {
        let fitted = self.trial(x);
        if !admissible(&fitted) {
            return Err(HouseholdError::optimizer(
                "calibration",
                format!(
                    "best point alpha = {}, sigma = {} is outside 0 < alpha < 1, sigma >= 0",
                    fitted.alpha, fitted.sigma
                ),
            ));
        }
        let (objective, regression) = self.objective(&fitted)?;
        Ok((fitted, objective, regression))
    }
}

impl CostFunction for CalibrationProblem<'_> {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, x: &Self::Param) -> std::result::Result<Self::Output, argmin::core::Error> {
        let trial = self.trial(x);
        if !admissible(&trial) {
            debug!(
                "calibration trial alpha = {}, sigma = {} outside 0 < alpha < 1, sigma >= 0",
                trial.alpha, trial.sigma
            );
            return Ok(f64::INFINITY);
        }
        let (value, _) = self.objective(&trial)?;
        Ok(value)
    }
}

/// Structural parameters the simplex may evaluate. Points outside cost `+inf`.
fn admissible(params: &HouseholdParams) -> bool {
    params.alpha > 0.0 && params.alpha < 1.0 && params.sigma >= 0.0
}

/// Vertices of the starting simplex: `x0` plus one vertex per coordinate,
/// displaced by `step` relative to the coordinate (or an absolute 0.00025
/// when it is zero).
fn initial_simplex(x0: &[f64], step: f64) -> Vec<Vec<f64>> {
    let mut simplex = vec![x0.to_vec()];
    for i in 0..x0.len() {
        let mut vertex = x0.to_vec();
        vertex[i] = if vertex[i] != 0.0 {
            vertex[i] * (1.0 + step)
        } else {
            0.000_25
        };
        simplex.push(vertex);
    }
    simplex
}

fn calibrate(
    params: &HouseholdParams,
    options: &SolverOptions,
    free: FreeParameters,
    x0: Vec<f64>,
) -> Result<CalibrationResult> {
    let calibration: &CalibrationOptions = &options.calibration;
    let problem = CalibrationProblem {
        params,
        options,
        free,
    };

    // Nelder-Mead unwraps the costs of its starting vertices, so a NaN there
    // has to surface before the solver is built.
    let simplex = initial_simplex(&x0, calibration.simplex_step);
    for vertex in &simplex {
        problem.cost(vertex)?;
    }

    let solver = NelderMead::new(simplex)
        .with_sd_tolerance(calibration.sd_tolerance)?;
    let max_iterations = calibration.max_iterations;
    let result = Executor::new(problem, solver)
        .configure(|state| state.max_iters(max_iterations))
        .run()?;

    let state = result.state();
    let best = state
        .get_best_param()
        .cloned()
        .ok_or_else(|| HouseholdError::optimizer("calibration", "no best parameter reported"))?;
    let iterations = state.get_iter();
    let termination = format!("{:?}", state.get_termination_status());

    let problem = CalibrationProblem {
        params,
        options,
        free,
    };
    let (fitted, objective, regression) = problem.refit(&best)?;
    info!(
        "calibration finished after {iterations} iterations ({termination}): alpha = {:.6}, sigma = {:.6}, objective = {:.3e}",
        fitted.alpha, fitted.sigma, objective
    );

    Ok(CalibrationResult {
        alpha: fitted.alpha,
        sigma: fitted.sigma,
        objective,
        regression,
        iterations,
        termination,
    })
}

/// Searches `(alpha, sigma)` so the sweep regression matches the targets in
/// `params`, starting from `options.calibration.initial_alpha_sigma`.
///
/// Trials with `alpha` outside `(0, 1)` or negative `sigma` cost `+inf`
/// without being solved. A trial whose objective is NaN aborts the search
/// with [`HouseholdError::NonFiniteObjective`].
pub fn calibrate_alpha_sigma(
    params: &HouseholdParams,
    options: &SolverOptions,
) -> Result<CalibrationResult> {
    let (alpha, sigma) = options.calibration.initial_alpha_sigma;
    info!("calibrating alpha and sigma from ({alpha}, {sigma})");
    calibrate(params, options, FreeParameters::AlphaSigma, vec![alpha, sigma])
}

/// Searches `sigma` alone, holding `alpha` fixed, within
/// `options.calibration.sigma_bounds`.
pub fn calibrate_sigma(
    params: &HouseholdParams,
    options: &SolverOptions,
) -> Result<CalibrationResult> {
    let (lower, upper) = options.calibration.sigma_bounds;
    if !(lower <= upper) {
        return Err(HouseholdError::invalid_parameter(
            "sigma_bounds",
            lower,
            "lower bound exceeds upper bound",
        ));
    }
    let sigma = options.calibration.initial_sigma.clamp(lower, upper);
    info!("calibrating sigma from {sigma} within [{lower}, {upper}]");
    calibrate(
        params,
        options,
        FreeParameters::Sigma { lower, upper },
        vec![sigma],
    )
}

/// Owns one parameter set and the results computed from it.
///
/// Every mutating method takes `&mut self`, so sweeps and calibrations on one
/// model cannot overlap; share parameters across threads by cloning them.
#[derive(Clone, Debug)]
pub struct HouseholdModel {
    params: HouseholdParams,
    options: SolverOptions,
    solution: SweepSolution,
    regression: RegressionResult,
}

impl HouseholdModel {
    /// Constructs a model after validating `params`.
    pub fn new(params: HouseholdParams) -> Result<Self> {
        params.validate()?;
        let solution = SweepSolution::new(params.sweep_len());
        Ok(Self {
            params,
            options: SolverOptions::default(),
            solution,
            regression: RegressionResult::unset(),
        })
    }

    /// Overrides the solver configuration.
    pub fn with_options(mut self, options: SolverOptions) -> Self {
        self.options = options;
        self
    }

    pub fn params(&self) -> &HouseholdParams {
        &self.params
    }

    pub fn options(&self) -> &SolverOptions {
        &self.options
    }

    /// Results of the latest sweep.
    pub fn solution(&self) -> &SweepSolution {
        &self.solution
    }

    /// Coefficients of the latest regression, NaN before the first one.
    pub fn regression(&self) -> RegressionResult {
        self.regression
    }

    /// Replaces the parameters after validation. Stored results are kept.
    pub fn set_params(&mut self, params: HouseholdParams) -> Result<()> {
        params.validate()?;
        self.params = params;
        Ok(())
    }

    /// Grid search at the current female wage.
    pub fn solve_discrete(&self) -> Solution {
        solve_discrete(&self.params, &self.options.discrete, self.options.verbose)
    }

    /// Continuous optimization at the current female wage.
    pub fn solve(&self) -> Result<Solution> {
        solve_continuous(&self.params, &self.options.continuous, self.options.verbose)
    }

    /// Re-solves every female wage with the chosen solver, overwriting the
    /// stored sweep in place.
    pub fn solve_wage_vector(&mut self, mode: SolveMode) -> &SweepSolution {
        let options = self.options.clone().with_mode(mode);
        sweep_into(&self.params, &options, &mut self.solution);
        &self.solution
    }

    /// Regresses the stored sweep and keeps the coefficients.
    pub fn run_regression(&mut self) -> Result<RegressionResult> {
        self.regression = run_regression(
            &self.params.female_wages,
            &self.solution.hm,
            &self.solution.hf,
        )?;
        Ok(self.regression)
    }

    /// Calibrates `(alpha, sigma)`, then stores the fitted parameters and
    /// the sweep and regression they imply.
    pub fn estimate(&mut self) -> Result<CalibrationResult> {
        let result = calibrate_alpha_sigma(&self.params, &self.options)?;
        self.adopt(&result);
        Ok(result)
    }

    /// Calibrates `sigma` with `alpha` fixed and stores the outcome.
    pub fn estimate_sigma(&mut self) -> Result<CalibrationResult> {
        let result = calibrate_sigma(&self.params, &self.options)?;
        self.adopt(&result);
        Ok(result)
    }

    fn adopt(&mut self, result: &CalibrationResult) {
        self.params = self.params.with_structural(result.alpha, result.sigma);
        self.solve_wage_vector(SolveMode::Continuous);
        self.regression = result.regression;
    }
}
