//! Data behind a Solow diagram: saving curve, replacement line, steady state,
//! and the arrows pointing from the current capital stock towards it.
//!
//! Nothing here draws; a renderer consumes [`SolowDiagram`] as plain series.

use serde::{Deserialize, Serialize};

use crate::error::{HouseholdError, Result};

/// Relative positions of the convergence arrows along the path to `k*`.
const ARROW_POSITIONS: [f64; 6] = [0.3, 0.6, 0.8, 0.9, 0.95, 1.0];

/// Inputs of the Solow diagram.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SolowParams {
    /// Capital per capita at which the economy is evaluated.
    pub k: f64,
    /// Population growth rate.
    pub n: f64,
    /// Saving rate.
    pub s: f64,
    /// Total factor productivity.
    pub b: f64,
    /// Capital share.
    pub alpha: f64,
    /// Depreciation rate.
    pub delta: f64,
    /// Last capital value plotted on the horizontal axis.
    pub kt_xmax: usize,
    /// Capital stock marked by the vertical line.
    pub kt_vline: f64,
}

/// Series and markers of a Solow diagram.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SolowDiagram {
    /// `s B t^alpha` for `t = 0..=kt_xmax`.
    pub saving: Vec<f64>,
    /// `(n + delta) t` for `t = 0..=kt_xmax`.
    pub replacement: Vec<f64>,
    /// Steady state capital per capita.
    pub steady_state: f64,
    /// Position of the current capital marker.
    pub current: f64,
    /// Tails of the arrows, all pointing at `current` on the horizontal axis.
    pub arrow_tails: Vec<f64>,
}

impl SolowParams {
    /// `k* = (s B / (n + delta))^(1 / (1 - alpha))`.
    pub fn steady_state(&self) -> Result<f64> {
        let depreciation = self.n + self.delta;
        if !(depreciation > 0.0) {
            return Err(HouseholdError::invalid_parameter(
                "n + delta",
                depreciation,
                "must be positive",
            ));
        }
        if !(self.alpha < 1.0) {
            return Err(HouseholdError::invalid_parameter(
                "alpha",
                self.alpha,
                "must be below one",
            ));
        }
        Ok((self.s * self.b / depreciation).powf(1.0 / (1.0 - self.alpha)))
    }
}

impl SolowDiagram {
    pub fn compute(params: &SolowParams) -> Result<Self> {
        if params.kt_xmax == 0 {
            return Err(HouseholdError::invalid_parameter(
                "kt_xmax",
                0.0,
                "must be at least one",
            ));
        }
        let steady_state = params.steady_state()?;

        let saving = (0..=params.kt_xmax)
            .map(|t| params.s * params.b * (t as f64).powf(params.alpha))
            .collect();
        let replacement = (0..=params.kt_xmax)
            .map(|t| (params.n + params.delta) * t as f64)
            .collect();

        let distance = (steady_state - params.kt_vline).abs();
        let length = if params.kt_vline < steady_state {
            -distance
        } else {
            distance
        };
        let center = steady_state.min(params.kt_vline) + distance / 2.0;
        let arrow_tails = ARROW_POSITIONS
            .iter()
            .map(|pos| center + length * ((1.0 - pos) - 0.5))
            .collect();

        Ok(Self {
            saving,
            replacement,
            steady_state,
            current: params.kt_vline,
            arrow_tails,
        })
    }
}
