use approx::assert_relative_eq;
use hhspec::estimation::sweep_and_regress;
use hhspec::params::linspace;
use hhspec::regression::run_regression;
use hhspec::solving::{solve_continuous, solve_discrete};
use hhspec::sweep::solve_wage_vector;
use hhspec::{
    ContinuousOptions, DiscreteOptions, HouseholdModel, HouseholdParams, SolveMode, SolverOptions,
};
use nalgebra::DVector;

/// The textbook calibration: wages 0.8..1.2, wM = 1, targets (0.4, -0.1).
#[test]
fn calibration_reproduces_target_coefficients() {
    let params = HouseholdParams::builder()
        .wages(1.0, 1.0)
        .female_wages(DVector::from_vec(vec![0.8, 0.9, 1.0, 1.1, 1.2]))
        .targets(0.4, -0.1)
        .build()
        .unwrap();
    let mut model = HouseholdModel::new(params).unwrap();
    let result = model.estimate().unwrap();

    // Re-run the sweep and regression independently at the fitted parameters.
    let fitted = model.params().with_structural(result.alpha, result.sigma);
    let (_, regression) = sweep_and_regress(&fitted, &SolverOptions::default()).unwrap();
    assert_relative_eq!(regression.beta0, 0.4, epsilon = 1e-2);
    assert_relative_eq!(regression.beta1, -0.1, epsilon = 1e-2);

    assert_eq!(model.params().alpha, result.alpha);
    assert_eq!(model.params().sigma, result.sigma);
    assert!(model.regression().is_finite());
}

/// With equal wages the household is symmetric, so both members choose alike.
#[test]
fn equal_wages_give_symmetric_allocations() {
    let params = HouseholdParams::builder()
        .wages(1.0, 1.0)
        .female_wages(DVector::from_element(4, 1.0))
        .build()
        .unwrap();
    let solution = solve_wage_vector(&params, &SolverOptions::default());
    for i in 0..solution.len() {
        assert_relative_eq!(solution.lm[i], solution.lf[i], epsilon = 1e-3);
        assert_relative_eq!(solution.hm[i], solution.hf[i], epsilon = 1e-3);
    }
}

#[test]
fn continuous_optimum_is_at_least_as_good_as_the_grid() {
    let params = HouseholdParams::default().with_structural(0.4, 0.75);
    for wage in [0.8, 1.0, 1.2] {
        let snapshot = params.with_female_wage(wage);
        let grid = solve_discrete(&snapshot, &DiscreteOptions::default(), false);
        let continuous = solve_continuous(&snapshot, &ContinuousOptions::default(), false).unwrap();
        assert!(grid.choice.satisfies_time_budget(0.0));
        assert!(grid.choice.on_grid(0.5));
        assert!(continuous.utility >= grid.utility - 1e-6);
    }
}

#[test]
fn discrete_sweep_matches_single_grid_solves() {
    let params = HouseholdParams::default();
    let options = SolverOptions::default()
        .with_mode(SolveMode::Discrete)
        .with_discrete(DiscreteOptions {
            grid_points: 25,
            parallel: true,
        });
    let sweep = solve_wage_vector(&params, &options);
    for (i, wage) in params.female_wages.iter().enumerate() {
        let single = solve_discrete(&params.with_female_wage(*wage), &options.discrete, false);
        assert_eq!(sweep.lm[i], single.choice.lm);
        assert_eq!(sweep.hm[i], single.choice.hm);
        assert_eq!(sweep.lf[i], single.choice.lf);
        assert_eq!(sweep.hf[i], single.choice.hf);
    }
}

#[test]
fn regression_recovers_known_coefficients() {
    let wages = linspace(0.5, 2.0, 7);
    let hm = DVector::from_fn(7, |i, _| 3.0 + i as f64);
    let hf = DVector::from_fn(7, |i, _| hm[i] * (0.4 - 0.1 * wages[i].ln()).exp());
    let fit = run_regression(&wages, &hm, &hf).unwrap();
    assert_relative_eq!(fit.beta0, 0.4, epsilon = 1e-6);
    assert_relative_eq!(fit.beta1, -0.1, epsilon = 1e-6);
}
