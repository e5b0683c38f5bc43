//! Belief and per-step diagnostic types

use nalgebra::{Matrix2, Vector2};
use serde::Serialize;

use crate::common::linalg::validate_covariance;
use crate::common::{EstimationError, Result};

/// Gaussian belief over the 2D state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Belief {
    /// State estimate x̂
    pub mean: Vector2<f64>,
    /// Estimate covariance Q
    pub covariance: Matrix2<f64>,
}

impl Belief {
    /// Create a new belief
    pub fn new(mean: Vector2<f64>, covariance: Matrix2<f64>) -> Self {
        Self { mean, covariance }
    }

    /// Belief centred at `mean` with covariance `variance * I`
    pub fn isotropic(mean: Vector2<f64>, variance: f64) -> Self {
        Self::new(mean, Matrix2::identity() * variance)
    }

    /// trace(Q), the total variance
    #[inline]
    pub fn trace(&self) -> f64 {
        self.covariance.trace()
    }

    /// Euclidean distance from the estimate to `truth`
    #[inline]
    pub fn error_to(&self, truth: &Vector2<f64>) -> f64 {
        (self.mean - truth).norm()
    }

    /// Check the mean is finite and the covariance is symmetric PSD
    pub fn validate(&self, tolerance: f64) -> Result<()> {
        if !self.mean.iter().all(|v| v.is_finite()) {
            return Err(EstimationError::non_finite("belief mean"));
        }
        validate_covariance("Q", &self.covariance, tolerance)
    }
}

/// What happened during a single information update
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StepDiagnostics {
    /// Zero-based step index within the run (0 for standalone updates)
    pub step: usize,
    /// trace(Q') after the update
    pub trace: f64,
    /// ‖x̂' − x̂‖
    pub step_norm: f64,
    /// Condition number of the information matrix Q⁻¹ + HᵀR⁻¹H
    pub condition_number: f64,
    /// Condition number of the prior covariance Q
    pub prior_condition_number: f64,
    /// Innovation y ⊖ h(x̂) as (range, bearing)
    pub innovation: [f64; 2],
    /// True when either inversion took the pseudo-inverse fallback
    pub used_pseudo_inverse: bool,
    /// True when either condition number exceeded the configured threshold
    pub ill_conditioned: bool,
}

impl StepDiagnostics {
    /// The worse of the prior and information condition numbers
    pub fn worst_condition_number(&self) -> f64 {
        self.condition_number.max(self.prior_condition_number)
    }

    /// The flagged condition as an error value, for reporting
    pub fn as_singular_error(&self) -> Option<EstimationError> {
        self.ill_conditioned.then(|| {
            let context = if self.prior_condition_number > self.condition_number {
                "prior covariance"
            } else {
                "information matrix"
            };
            EstimationError::SingularMatrix {
                context: format!("{} at step {}", context, self.step),
                condition_number: self.worst_condition_number(),
            }
        })
    }
}

/// Summary of a completed run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunOutcome {
    /// Final belief (x̂ₙ, Qₙ)
    pub belief: Belief,
    /// Updates that were applied
    pub steps_applied: usize,
    /// Steps dropped by the degenerate-skip policy
    pub steps_skipped: usize,
    /// Applied steps whose information matrix was flagged ill-conditioned
    pub ill_conditioned_steps: usize,
    /// ‖x̂ₜ − x̂ₜ₋₁‖ of the last applied step (0 if none)
    pub last_step_norm: f64,
}

impl RunOutcome {
    /// trace(Qₙ)
    pub fn final_trace(&self) -> f64 {
        self.belief.trace()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_belief_trace_and_error() {
        let b = Belief::isotropic(Vector2::new(3.0, 3.0), 2.0);
        assert!((b.trace() - 4.0).abs() < 1e-15);
        let err = b.error_to(&Vector2::new(0.0, -1.0));
        assert!((err - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_belief_validate() {
        assert!(Belief::isotropic(Vector2::new(1.0, 1.0), 1.0).validate(1e-9).is_ok());

        let bad_mean = Belief::isotropic(Vector2::new(f64::NAN, 1.0), 1.0);
        assert!(matches!(
            bad_mean.validate(1e-9),
            Err(EstimationError::NonFinite { .. })
        ));

        let bad_cov = Belief::new(Vector2::new(1.0, 1.0), Matrix2::new(1.0, 0.0, 0.0, -2.0));
        assert!(matches!(
            bad_cov.validate(1e-9),
            Err(EstimationError::InvalidCovariance { .. })
        ));
    }

    #[test]
    fn test_singular_error_only_when_flagged() {
        let mut diag = StepDiagnostics {
            step: 3,
            trace: 0.1,
            step_norm: 0.0,
            condition_number: 1e14,
            prior_condition_number: 2.0,
            innovation: [0.0, 0.0],
            used_pseudo_inverse: true,
            ill_conditioned: false,
        };
        assert!(diag.as_singular_error().is_none());

        diag.ill_conditioned = true;
        let err = diag.as_singular_error().unwrap();
        assert!(err.to_string().contains("step 3"));
        assert!(err.to_string().contains("information matrix"));
    }

    #[test]
    fn test_singular_error_names_prior_when_worse() {
        let diag = StepDiagnostics {
            step: 0,
            trace: 1.0,
            step_norm: 0.0,
            condition_number: 50.0,
            prior_condition_number: 1e13,
            innovation: [0.0, 0.0],
            used_pseudo_inverse: false,
            ill_conditioned: true,
        };
        assert_eq!(diag.worst_condition_number(), 1e13);
        match diag.as_singular_error() {
            Some(EstimationError::SingularMatrix {
                context,
                condition_number,
            }) => {
                assert!(context.starts_with("prior covariance"));
                assert_eq!(condition_number, 1e13);
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
