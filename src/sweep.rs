//! Re-solving the household problem along a vector of female wages.

use log::{debug, warn};
use nalgebra::DVector;
use rayon::prelude::*;

use crate::error::Result;
use crate::options::{SolveMode, SolverOptions};
use crate::params::HouseholdParams;
use crate::solving::{solve_continuous, solve_discrete, Solution};

/// Optimal allocations indexed like the swept wage vector.
///
/// Hours start at zero and utilities at NaN; an index whose solve failed
/// keeps those sentinels and is listed in `failed`.
#[derive(Clone, Debug, PartialEq)]
pub struct SweepSolution {
    pub lm: DVector<f64>,
    pub hm: DVector<f64>,
    pub lf: DVector<f64>,
    pub hf: DVector<f64>,
    /// Utility attained at each wage point.
    pub utility: DVector<f64>,
    /// Whether the solver reported convergence at each wage point.
    pub converged: Vec<bool>,
    /// Indices whose solve returned an error.
    pub failed: Vec<usize>,
}

impl SweepSolution {
    /// Sentinel-filled container for `n` wage points.
    pub fn new(n: usize) -> Self {
        Self {
            lm: DVector::zeros(n),
            hm: DVector::zeros(n),
            lf: DVector::zeros(n),
            hf: DVector::zeros(n),
            utility: DVector::from_element(n, f64::NAN),
            converged: vec![false; n],
            failed: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.lm.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lm.is_empty()
    }

    /// Whether every wage point was solved and the solver converged.
    pub fn all_converged(&self) -> bool {
        self.failed.is_empty() && self.converged.iter().all(|c| *c)
    }

    fn store(&mut self, index: usize, solution: Solution) {
        let choice = solution.choice;
        self.lm[index] = choice.lm;
        self.hm[index] = choice.hm;
        self.lf[index] = choice.lf;
        self.hf[index] = choice.hf;
        self.utility[index] = solution.utility;
        self.converged[index] = solution.summary.converged;
    }
}

fn solve_at(params: &HouseholdParams, wage: f64, options: &SolverOptions) -> Result<Solution> {
    let snapshot = params.with_female_wage(wage);
    match options.sweep.mode {
        SolveMode::Discrete => Ok(solve_discrete(
            &snapshot,
            &options.discrete,
            options.verbose,
        )),
        SolveMode::Continuous => {
            solve_continuous(&snapshot, &options.continuous, options.verbose)
        }
    }
}

/// Solves the model at every entry of `params.female_wages`, in order.
pub fn solve_wage_vector(params: &HouseholdParams, options: &SolverOptions) -> SweepSolution {
    let mut solution = SweepSolution::new(params.sweep_len());
    sweep_into(params, options, &mut solution);
    solution
}

/// Like [`solve_wage_vector`] but overwrites an existing container in place.
/// Indices whose solve fails keep their previous values.
pub fn sweep_into(params: &HouseholdParams, options: &SolverOptions, target: &mut SweepSolution) {
    let wages: Vec<f64> = params.female_wages.iter().copied().collect();
    if target.len() != wages.len() {
        *target = SweepSolution::new(wages.len());
    }
    target.failed.clear();

    let results: Vec<Result<Solution>> = if options.sweep.parallel {
        wages
            .par_iter()
            .map(|&wage| solve_at(params, wage, options))
            .collect()
    } else {
        wages
            .iter()
            .map(|&wage| solve_at(params, wage, options))
            .collect()
    };

    for (index, (wage, result)) in wages.iter().zip(results).enumerate() {
        match result {
            Ok(solution) => {
                debug!(
                    "wF = {wage:.4}: LM = {:.4}, HM = {:.4}, LF = {:.4}, HF = {:.4}",
                    solution.choice.lm, solution.choice.hm, solution.choice.lf, solution.choice.hf
                );
                target.store(index, solution);
            }
            Err(err) => {
                warn!("sweep point {index} (wF = {wage}) left unsolved: {err}");
                target.failed.push(index);
            }
        }
    }
}
