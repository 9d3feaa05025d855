//! Discrete grid search and constrained continuous optimization of the
//! household's time allocation.

use std::cell::Cell;

use log::{info, warn};
use rayon::prelude::*;

use crate::error::{HouseholdError, Result};
use crate::options::{ContinuousOptions, DiscreteOptions};
use crate::params::HouseholdParams;
use crate::utility::{utility, utility_with, Choice, TIME_ENDOWMENT};

/// Diagnostics returned alongside an optimal allocation.
#[derive(Clone, Debug, PartialEq)]
pub struct SolveSummary {
    /// Whether the optimizer reported success. Always true for the grid search.
    pub converged: bool,
    /// Optimizer status as reported by the backend.
    pub status: String,
    /// Number of utility evaluations performed (grid size for the grid search).
    pub evaluations: usize,
}

/// Optimal allocation for a single parameter set.
#[derive(Clone, Debug, PartialEq)]
pub struct Solution {
    pub choice: Choice,
    /// Utility attained at `choice`.
    pub utility: f64,
    pub summary: SolveSummary,
}

/// Values of the grid used by [`solve_discrete`].
pub fn grid(options: &DiscreteOptions) -> Vec<f64> {
    let n = options.grid_points.max(2);
    (0..n)
        .map(|i| TIME_ENDOWMENT * i as f64 / (n - 1) as f64)
        .collect()
}

/// Best allocation on a fixed grid, enumerating `LM`, then `HM`, `LF`, `HF`
/// in row-major order. Allocations breaking either time budget score `-inf`,
/// and ties go to the first maximum in enumeration order.
pub fn solve_discrete(
    params: &HouseholdParams,
    options: &DiscreteOptions,
    verbose: bool,
) -> Solution {
    let x = grid(options);
    let technology = params.home_production();

    let best_in_slice = |lm: f64| -> (Choice, f64) {
        let mut best = (Choice::new(lm, 0.0, 0.0, 0.0), f64::NEG_INFINITY);
        for &hm in &x {
            for &lf in &x {
                for &hf in &x {
                    let choice = Choice::new(lm, hm, lf, hf);
                    let value = if choice.male_hours() > TIME_ENDOWMENT
                        || choice.female_hours() > TIME_ENDOWMENT
                    {
                        f64::NEG_INFINITY
                    } else {
                        utility_with(params, technology, &choice)
                    };
                    if value > best.1 {
                        best = (choice, value);
                    }
                }
            }
        }
        best
    };

    let slices: Vec<(Choice, f64)> = if options.parallel {
        x.par_iter().map(|&lm| best_in_slice(lm)).collect()
    } else {
        x.iter().map(|&lm| best_in_slice(lm)).collect()
    };

    // Slices arrive in LM order, so a strict comparison keeps the first maximum.
    let mut best = slices[0];
    for candidate in slices.into_iter().skip(1) {
        if candidate.1 > best.1 {
            best = candidate;
        }
    }

    let (choice, value) = best;
    if verbose {
        log_choice("discrete", &choice, value);
    }

    Solution {
        choice,
        utility: value,
        summary: SolveSummary {
            converged: true,
            status: "grid exhausted".to_string(),
            evaluations: x.len().pow(4),
        },
    }
}

fn male_budget(x: &[f64], _: &mut ()) -> f64 {
    TIME_ENDOWMENT - x[0] - x[1]
}

fn female_budget(x: &[f64], _: &mut ()) -> f64 {
    TIME_ENDOWMENT - x[2] - x[3]
}

/// Maximizes utility over `[0, 24]^4` subject to `LM + HM <= 24` and
/// `LF + HF <= 24` with COBYLA.
///
/// Whatever point the optimizer reports is returned, converged or not; check
/// [`SolveSummary::converged`]. The point is not re-validated against the
/// constraints unless `options.validate_constraints` is set, in which case a
/// violation beyond `options.constraint_tolerance` is an error.
pub fn solve_continuous(
    params: &HouseholdParams,
    options: &ContinuousOptions,
    verbose: bool,
) -> Result<Solution> {
    let technology = params.home_production();
    let evaluations = Cell::new(0usize);
    let objective = |x: &[f64], _: &mut ()| -> f64 {
        evaluations.set(evaluations.get() + 1);
        -utility_with(params, technology, &Choice::from_slice(x))
    };

    let bounds = [(0.0, TIME_ENDOWMENT); 4];
    let constraints: [fn(&[f64], &mut ()) -> f64; 2] = [male_budget, female_budget];
    let stop = cobyla::StopTols {
        ftol_rel: options.tolerance,
        xtol_rel: options.tolerance,
        ..cobyla::StopTols::default()
    };

    let outcome = cobyla::minimize(
        objective,
        &options.initial_guess.to_array(),
        &bounds,
        &constraints,
        (),
        options.max_evaluations,
        cobyla::RhoBeg::All(options.initial_step),
        Some(stop),
    );

    let (x, converged, status) = match outcome {
        Ok((status, x, _)) => (x, true, format!("{status:?}")),
        Err((status, x, _)) => {
            warn!(
                "continuous solver did not converge at wF = {}: {status:?}",
                params.wage_female
            );
            (x, false, format!("{status:?}"))
        }
    };

    let choice = Choice::try_from(x.as_slice())?;

    if options.validate_constraints && !choice.satisfies_time_budget(options.constraint_tolerance)
    {
        return Err(HouseholdError::ConstraintViolation {
            male_hours: choice.male_hours(),
            female_hours: choice.female_hours(),
        });
    }

    let value = utility(params, &choice);
    if verbose {
        log_choice("continuous", &choice, value);
    }

    Ok(Solution {
        choice,
        utility: value,
        summary: SolveSummary {
            converged,
            status,
            evaluations: evaluations.get(),
        },
    })
}

fn log_choice(solver: &str, choice: &Choice, value: f64) {
    info!(
        "{solver} optimum: LM = {:6.4}, HM = {:6.4}, LF = {:6.4}, HF = {:6.4}, u = {:.6}",
        choice.lm, choice.hm, choice.lf, choice.hf, value
    );
}
