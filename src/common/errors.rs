//! Error types for the estimator and the experiment driver
//!
//! Every fallible operation returns [`EstimationError`] instead of panicking
//! or letting NaN propagate through the update loop.

use std::fmt;

/// Errors that can occur while estimating
#[derive(Debug, Clone, PartialEq)]
pub enum EstimationError {
    /// State coincides with the sensor position, so range/bearing and the
    /// Jacobian are undefined there
    DegenerateState {
        /// Which evaluation hit the singularity
        context: String,
    },

    /// Matrix inversion hit a singular or ill-conditioned matrix.
    ///
    /// `update` recovers from this with a pseudo-inverse; the variant is
    /// only surfaced through diagnostics and reporters.
    SingularMatrix {
        /// Which matrix was being inverted
        context: String,
        /// Ratio of the largest to smallest singular value
        condition_number: f64,
    },

    /// Caller-supplied covariance is not symmetric positive-(semi)definite
    InvalidCovariance {
        /// Which covariance failed validation (e.g. "R", "Q0")
        name: String,
        /// What was wrong with it
        reason: String,
    },

    /// A NaN or infinity appeared in an input or intermediate result
    NonFinite {
        /// Where the value was detected
        context: String,
    },

    /// The measurement source ran dry before the requested step count
    SourceExhausted {
        /// Zero-based step at which no measurement was available
        step: usize,
    },

    /// Configuration error
    Configuration {
        /// Description of the configuration issue
        description: String,
    },
}

impl EstimationError {
    pub(crate) fn degenerate(context: impl Into<String>) -> Self {
        EstimationError::DegenerateState {
            context: context.into(),
        }
    }

    pub(crate) fn non_finite(context: impl Into<String>) -> Self {
        EstimationError::NonFinite {
            context: context.into(),
        }
    }

    pub(crate) fn invalid_covariance(name: impl Into<String>, reason: impl Into<String>) -> Self {
        EstimationError::InvalidCovariance {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn configuration(description: impl Into<String>) -> Self {
        EstimationError::Configuration {
            description: description.into(),
        }
    }

    /// Whether this error is a degenerate-state error.
    ///
    /// The loop's skip policy only applies to these.
    pub fn is_degenerate(&self) -> bool {
        matches!(self, EstimationError::DegenerateState { .. })
    }
}

impl fmt::Display for EstimationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EstimationError::DegenerateState { context } => {
                write!(f, "Degenerate state (at sensor position): {}", context)
            }
            EstimationError::SingularMatrix {
                context,
                condition_number,
            } => {
                write!(
                    f,
                    "Singular matrix in {} (condition number {:.2e})",
                    context, condition_number
                )
            }
            EstimationError::InvalidCovariance { name, reason } => {
                write!(f, "Invalid covariance {}: {}", name, reason)
            }
            EstimationError::NonFinite { context } => {
                write!(f, "Non-finite value in {}", context)
            }
            EstimationError::SourceExhausted { step } => {
                write!(f, "Measurement source exhausted at step {}", step)
            }
            EstimationError::Configuration { description } => {
                write!(f, "Configuration error: {}", description)
            }
        }
    }
}

impl std::error::Error for EstimationError {}

impl From<serde_json::Error> for EstimationError {
    fn from(e: serde_json::Error) -> Self {
        EstimationError::configuration(format!("invalid experiment JSON: {}", e))
    }
}

impl From<std::io::Error> for EstimationError {
    fn from(e: std::io::Error) -> Self {
        EstimationError::configuration(format!("cannot read experiment file: {}", e))
    }
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, EstimationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimation_error_display() {
        let err = EstimationError::degenerate("jacobian");
        assert!(err.to_string().contains("jacobian"));

        let err = EstimationError::SingularMatrix {
            context: "information matrix".to_string(),
            condition_number: 1e15,
        };
        let msg = err.to_string();
        assert!(msg.contains("information matrix"));
        assert!(msg.contains("e15"));

        let err = EstimationError::SourceExhausted { step: 17 };
        assert!(err.to_string().contains("17"));
    }

    #[test]
    fn test_invalid_covariance_display() {
        let err = EstimationError::invalid_covariance("R", "not symmetric");
        assert_eq!(err.to_string(), "Invalid covariance R: not symmetric");
    }

    #[test]
    fn test_is_degenerate() {
        assert!(EstimationError::degenerate("h").is_degenerate());
        assert!(!EstimationError::non_finite("h").is_degenerate());
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<u32>("not json").unwrap_err();
        let err: EstimationError = json_err.into();
        assert!(matches!(err, EstimationError::Configuration { .. }));
    }
}
