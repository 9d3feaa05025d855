use argmin::core::ArgminError;
use thiserror::Error;

/// Unified error type for `hhspec` operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HouseholdError {
    /// Raised when provided arrays or vectors have incompatible lengths.
    #[error("dimension mismatch in {context}: expected {expected} but found {found}")]
    DimensionMismatch {
        /// Human-readable context describing the operation.
        context: &'static str,
        /// The required length, usually implied by the wage vector.
        expected: usize,
        /// The length that was actually supplied.
        found: usize,
    },

    /// Raised when a model parameter is outside its admissible range.
    #[error("parameter `{name}` = {value} is invalid: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },

    /// Raised by the optional post-hoc check on continuous solutions.
    #[error(
        "time budget violated: male hours {male_hours}, female hours {female_hours} (limit 24)"
    )]
    ConstraintViolation { male_hours: f64, female_hours: f64 },

    /// Raised when a calibration trial evaluates to NaN.
    #[error("objective in {context} is not a number ({value})")]
    NonFiniteObjective { context: &'static str, value: f64 },

    /// Raised when a linear algebra decomposition cannot be computed.
    #[error("decomposition in {context} failed")]
    Singular { context: &'static str },

    /// Raised when an external optimizer rejects its configuration or aborts.
    #[error("optimizer failure in {context}: {text}")]
    Optimizer { context: &'static str, text: String },
}

impl HouseholdError {
    /// Helper to format a [`DimensionMismatch`](HouseholdError::DimensionMismatch) error.
    pub fn dimension_mismatch(context: &'static str, expected: usize, found: usize) -> Self {
        Self::DimensionMismatch {
            context,
            expected,
            found,
        }
    }

    /// Helper for builder validation failures.
    pub fn invalid_parameter(name: &'static str, value: f64, reason: &'static str) -> Self {
        Self::InvalidParameter {
            name,
            value,
            reason,
        }
    }

    pub fn optimizer<S: Into<String>>(context: &'static str, text: S) -> Self {
        Self::Optimizer {
            context,
            text: text.into(),
        }
    }
}

impl From<argmin::core::Error> for HouseholdError {
    fn from(original_err: argmin::core::Error) -> Self {
        // Errors raised inside our own cost functions travel through argmin boxed.
        let original_err = match original_err.downcast::<HouseholdError>() {
            Ok(own) => return own,
            Err(other) => other,
        };
        match original_err.downcast::<ArgminError>() {
            Ok(ArgminError::InvalidParameter { text }) => {
                Self::optimizer("argmin parameter validation", text)
            }
            Ok(ArgminError::ConditionViolated { text }) => {
                Self::optimizer("argmin condition check", text)
            }
            Ok(other) => Self::optimizer("argmin", other.to_string()),
            Err(err) => Self::optimizer("argmin", err.to_string()),
        }
    }
}

/// Type alias for results returned by this crate.
pub type Result<T> = std::result::Result<T, HouseholdError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn own_errors_survive_a_trip_through_argmin() {
        let raised = HouseholdError::NonFiniteObjective {
            context: "calibration trial",
            value: f64::NAN,
        };
        let boxed: argmin::core::Error = raised.into();
        let recovered = HouseholdError::from(boxed);
        assert!(matches!(
            recovered,
            HouseholdError::NonFiniteObjective {
                context: "calibration trial",
                ..
            }
        ));
    }

    #[test]
    fn argmin_errors_become_optimizer_failures() {
        let boxed: argmin::core::Error = ArgminError::InvalidParameter {
            text: "bad tolerance".to_string(),
        }
        .into();
        match HouseholdError::from(boxed) {
            HouseholdError::Optimizer { text, .. } => assert_eq!(text, "bad tolerance"),
            other => panic!("unexpected error {other:?}"),
        }
    }
}
