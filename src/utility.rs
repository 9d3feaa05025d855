//! Household utility: market consumption, home production, and disutility of work.

use nalgebra::DVector;
use serde::{Deserialize, Serialize};

use crate::error::{HouseholdError, Result};
use crate::params::{HomeProduction, HouseholdParams, FLOOR, RHO_TOLERANCE};

/// Hours available to each household member per day.
pub const TIME_ENDOWMENT: f64 = 24.0;

/// Hours of market work and home production for both household members.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    pub lm: f64,
    pub hm: f64,
    pub lf: f64,
    pub hf: f64,
}

impl Choice {
    pub fn new(lm: f64, hm: f64, lf: f64, hf: f64) -> Self {
        Self { lm, hm, lf, hf }
    }

    /// Packs the choice in solver order `[LM, HM, LF, HF]`.
    pub fn to_array(self) -> [f64; 4] {
        [self.lm, self.hm, self.lf, self.hf]
    }

    /// Unchecked unpacking for optimizer callbacks that always pass four values.
    pub(crate) fn from_slice(x: &[f64]) -> Self {
        Self::new(x[0], x[1], x[2], x[3])
    }

    pub fn male_hours(&self) -> f64 {
        self.lm + self.hm
    }

    pub fn female_hours(&self) -> f64 {
        self.lf + self.hf
    }

    /// Whether both members respect the 24 hour budget and every entry lies
    /// in `[0, 24]`, up to `tolerance`.
    pub fn satisfies_time_budget(&self, tolerance: f64) -> bool {
        let in_box = self
            .to_array()
            .iter()
            .all(|h| *h >= -tolerance && *h <= TIME_ENDOWMENT + tolerance);
        in_box
            && self.male_hours() <= TIME_ENDOWMENT + tolerance
            && self.female_hours() <= TIME_ENDOWMENT + tolerance
    }

    /// Whether every entry is a multiple of `step` within `[0, 24]`.
    pub fn on_grid(&self, step: f64) -> bool {
        self.to_array().iter().all(|h| {
            let k = (h / step).round();
            (h - k * step).abs() < 1e-12 && *h >= 0.0 && *h <= TIME_ENDOWMENT
        })
    }
}

impl TryFrom<&[f64]> for Choice {
    type Error = HouseholdError;

    /// Unpacks `[LM, HM, LF, HF]`.
    fn try_from(x: &[f64]) -> Result<Self> {
        match x {
            [lm, hm, lf, hf] => Ok(Self::new(*lm, *hm, *lf, *hf)),
            _ => Err(HouseholdError::dimension_mismatch("choice slice", 4, x.len())),
        }
    }
}

/// Evaluates utility of a single allocation.
///
/// Never fails: hours entering fractional powers are floored at
/// [`FLOOR`], so zero or negative home hours still yield a real number in the
/// CES branch. For `rho == 1` the CRRA transform is replaced by its log limit.
pub fn utility(params: &HouseholdParams, choice: &Choice) -> f64 {
    utility_with(params, params.home_production(), choice)
}

/// Same as [`utility`] with the technology already resolved, for hot loops.
pub(crate) fn utility_with(
    params: &HouseholdParams,
    technology: HomeProduction,
    choice: &Choice,
) -> f64 {
    let consumption = params.wage_male * choice.lm + params.wage_female * choice.lf;
    let home = technology.output(choice.hm, choice.hf);

    let composite = (consumption.powf(params.omega) * home.powf(1.0 - params.omega)).max(FLOOR);
    let consumption_utility = if (params.rho - 1.0).abs() <= RHO_TOLERANCE {
        composite.ln()
    } else {
        composite.powf(1.0 - params.rho) / (1.0 - params.rho)
    };

    let exponent = 1.0 + 1.0 / params.epsilon;
    let male = choice.male_hours();
    let female = choice.female_hours();
    let disutility =
        params.nu * (male.powf(exponent) / exponent + female.powf(exponent) / exponent);

    consumption_utility - disutility
}

/// Vectorized evaluation over equally long vectors of hours.
pub fn utility_many(
    params: &HouseholdParams,
    lm: &DVector<f64>,
    hm: &DVector<f64>,
    lf: &DVector<f64>,
    hf: &DVector<f64>,
) -> Result<DVector<f64>> {
    let n = lm.len();
    for (context, found) in [
        ("HM length", hm.len()),
        ("LF length", lf.len()),
        ("HF length", hf.len()),
    ] {
        if found != n {
            return Err(HouseholdError::dimension_mismatch(context, n, found));
        }
    }

    let technology = params.home_production();
    Ok(DVector::from_fn(n, |i, _| {
        utility_with(params, technology, &Choice::new(lm[i], hm[i], lf[i], hf[i]))
    }))
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    use super::*;

    fn feasible_sample(rng: &mut SmallRng) -> Choice {
        let lm = rng.gen_range(0.0..=TIME_ENDOWMENT);
        let hm = rng.gen_range(0.0..=TIME_ENDOWMENT - lm);
        let lf = rng.gen_range(0.0..=TIME_ENDOWMENT);
        let hf = rng.gen_range(0.0..=TIME_ENDOWMENT - lf);
        Choice::new(lm, hm, lf, hf)
    }

    #[test]
    fn baseline_value_matches_hand_computation() {
        let params = HouseholdParams::default();
        let choice = Choice::new(4.5, 4.5, 4.5, 4.5);
        // C = 9, H = 4.5, Q = sqrt(9 * 4.5), u = -1 / Q, disutility = 0.001 * 2 * 81 / 2
        let q = (9.0_f64 * 4.5).sqrt();
        let expected = -1.0 / q - 0.001 * 81.0;
        assert_relative_eq!(utility(&params, &choice), expected, epsilon = 1e-12);
    }

    #[test]
    fn finite_on_feasible_region_for_every_technology() {
        let mut rng = SmallRng::seed_from_u64(17);
        for sigma in [0.0, 0.1, 0.5, 1.0, 1.5, 5.0] {
            for alpha in [0.1, 0.5, 0.98] {
                let params = HouseholdParams::default().with_structural(alpha, sigma);
                for _ in 0..2_000 {
                    let choice = feasible_sample(&mut rng);
                    let value = utility(&params, &choice);
                    assert!(value.is_finite(), "{choice:?} gave {value} at sigma {sigma}");
                }
                let corners = [
                    Choice::default(),
                    Choice::new(24.0, 0.0, 0.0, 24.0),
                    Choice::new(0.0, 24.0, 24.0, 0.0),
                ];
                for choice in corners {
                    assert!(utility(&params, &choice).is_finite());
                }
            }
        }
    }

    #[test]
    fn ces_converges_to_cobb_douglas_from_both_sides() {
        let choice = Choice::new(5.0, 3.0, 6.0, 7.5);
        let params = HouseholdParams::default().with_structural(0.3, 1.0);
        let limit = utility(&params, &choice);
        for delta in [1e-5, 1e-6] {
            let below = utility(&params.with_structural(0.3, 1.0 - delta), &choice);
            let above = utility(&params.with_structural(0.3, 1.0 + delta), &choice);
            assert_relative_eq!(below, limit, epsilon = 1e-6);
            assert_relative_eq!(above, limit, epsilon = 1e-6);
        }
    }

    #[test]
    fn log_utility_replaces_unit_risk_aversion() {
        let mut params = HouseholdParams::default();
        params.rho = 1.0;
        let choice = Choice::new(4.0, 4.0, 4.0, 4.0);
        let value = utility(&params, &choice);
        assert!(value.is_finite());
        let q = (8.0_f64 * 4.0).sqrt();
        assert_relative_eq!(value, q.ln() - 0.001 * 64.0, epsilon = 1e-12);
    }

    #[test]
    fn vectorized_matches_scalar() {
        let params = HouseholdParams::default().with_structural(0.6, 0.4);
        let lm = DVector::from_vec(vec![0.0, 4.0, 10.0]);
        let hm = DVector::from_vec(vec![0.0, 5.0, 2.0]);
        let lf = DVector::from_vec(vec![1.0, 3.0, 8.0]);
        let hf = DVector::from_vec(vec![0.0, 6.0, 9.0]);
        let values = utility_many(&params, &lm, &hm, &lf, &hf).unwrap();
        for i in 0..3 {
            let scalar = utility(&params, &Choice::new(lm[i], hm[i], lf[i], hf[i]));
            assert_eq!(values[i], scalar);
        }

        let short = DVector::from_vec(vec![1.0]);
        assert!(matches!(
            utility_many(&params, &lm, &short, &lf, &hf),
            Err(HouseholdError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn slices_of_the_wrong_length_are_rejected() {
        let choice = Choice::try_from([1.0, 2.0, 3.0, 4.0].as_slice()).unwrap();
        assert_eq!(choice, Choice::new(1.0, 2.0, 3.0, 4.0));
        assert!(matches!(
            Choice::try_from([1.0, 2.0, 3.0].as_slice()),
            Err(HouseholdError::DimensionMismatch {
                expected: 4,
                found: 3,
                ..
            })
        ));
    }

    #[test]
    fn grid_and_budget_helpers() {
        assert!(Choice::new(4.5, 4.5, 0.0, 24.0).on_grid(0.5));
        assert!(!Choice::new(4.25, 4.5, 0.0, 24.0).on_grid(0.5));
        assert!(Choice::new(12.0, 12.0, 0.0, 24.0).satisfies_time_budget(0.0));
        assert!(!Choice::new(12.5, 12.0, 0.0, 24.0).satisfies_time_budget(1e-9));
    }
}
