//! Configuration structures for the solvers, sweeps, and calibration searches.

use crate::utility::{Choice, TIME_ENDOWMENT};

/// Controls the exhaustive grid search.
#[derive(Clone, Debug)]
pub struct DiscreteOptions {
    /// Evenly spaced points per choice variable on `[0, 24]`.
    pub grid_points: usize,
    /// Evaluate `LM` slices on the rayon pool.
    pub parallel: bool,
}

impl Default for DiscreteOptions {
    fn default() -> Self {
        Self {
            grid_points: 49,
            parallel: true,
        }
    }
}

impl DiscreteOptions {
    /// Distance between adjacent grid values.
    pub fn step(&self) -> f64 {
        TIME_ENDOWMENT / (self.grid_points.max(2) - 1) as f64
    }
}

/// Controls the constrained continuous solver.
#[derive(Clone, Debug)]
pub struct ContinuousOptions {
    /// Starting allocation handed to the optimizer.
    pub initial_guess: Choice,
    /// Relative tolerance on both the objective and the iterate.
    pub tolerance: f64,
    /// Maximum number of objective evaluations.
    pub max_evaluations: usize,
    /// Initial trust region radius.
    pub initial_step: f64,
    /// Reject solutions that break the time budget by more than `constraint_tolerance`.
    pub validate_constraints: bool,
    pub constraint_tolerance: f64,
}

impl Default for ContinuousOptions {
    fn default() -> Self {
        Self {
            initial_guess: Choice::new(10.0, 10.0, 10.0, 10.0),
            tolerance: 1e-9,
            max_evaluations: 5_000,
            initial_step: 1.0,
            validate_constraints: false,
            constraint_tolerance: 1e-6,
        }
    }
}

/// Which solver a wage sweep invokes at every point.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SolveMode {
    Discrete,
    #[default]
    Continuous,
}

/// Controls wage sweeps.
#[derive(Clone, Debug, Default)]
pub struct SweepOptions {
    pub mode: SolveMode,
    /// Solve wage points concurrently; results are still stored in wage order.
    pub parallel: bool,
}

/// Controls the Nelder-Mead calibration searches.
#[derive(Clone, Debug)]
pub struct CalibrationOptions {
    /// Starting `(alpha, sigma)` for the two-parameter search.
    pub initial_alpha_sigma: (f64, f64),
    /// Starting `sigma` for the single-parameter search.
    pub initial_sigma: f64,
    /// Box for `sigma` in the single-parameter search.
    pub sigma_bounds: (f64, f64),
    /// Relative displacement of the initial simplex vertices.
    pub simplex_step: f64,
    /// Stop once the standard deviation of simplex costs falls below this.
    pub sd_tolerance: f64,
    pub max_iterations: u64,
}

impl Default for CalibrationOptions {
    fn default() -> Self {
        Self {
            initial_alpha_sigma: (0.5, 1.0),
            initial_sigma: 1.4,
            sigma_bounds: (0.0, 30.0),
            simplex_step: 0.05,
            sd_tolerance: 1e-10,
            max_iterations: 400,
        }
    }
}

/// Aggregated solver configuration used by [`HouseholdModel`](crate::HouseholdModel).
#[derive(Clone, Debug, Default)]
pub struct SolverOptions {
    pub discrete: DiscreteOptions,
    pub continuous: ContinuousOptions,
    pub sweep: SweepOptions,
    pub calibration: CalibrationOptions,
    /// Log optimal allocations at `info` level.
    pub verbose: bool,
}

impl SolverOptions {
    /// Override the grid search settings while preserving other defaults.
    pub fn with_discrete(mut self, discrete: DiscreteOptions) -> Self {
        self.discrete = discrete;
        self
    }

    /// Override the continuous solver settings.
    pub fn with_continuous(mut self, continuous: ContinuousOptions) -> Self {
        self.continuous = continuous;
        self
    }

    /// Select the solver used by sweeps.
    pub fn with_mode(mut self, mode: SolveMode) -> Self {
        self.sweep.mode = mode;
        self
    }

    pub fn with_parallel_sweep(mut self, parallel: bool) -> Self {
        self.sweep.parallel = parallel;
        self
    }

    /// Override the calibration settings.
    pub fn with_calibration(mut self, calibration: CalibrationOptions) -> Self {
        self.calibration = calibration;
        self
    }

    /// Enable the post-hoc time budget check on continuous solutions.
    pub fn with_constraint_validation(mut self, tolerance: f64) -> Self {
        self.continuous.validate_constraints = true;
        self.continuous.constraint_tolerance = tolerance;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}
