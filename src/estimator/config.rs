//! Estimator configuration
//!
//! Numerical knobs for the information update and the loop's response to
//! degenerate states. Everything has a sensible default; override with the
//! `with_*` setters.

use serde::{Deserialize, Serialize};

use crate::common::{EstimationError, Result};

/// Default relative singular value cutoff for the pseudo-inverse
///
/// Close to machine precision: only numerically rank-deficient matrices lose
/// a direction, matching the usual `pinv` rcond.
pub const DEFAULT_PINV_TOLERANCE: f64 = 1e-15;

/// Default condition number above which a step is flagged ill-conditioned
pub const DEFAULT_CONDITION_THRESHOLD: f64 = 1e12;

/// Default tolerance for symmetry/PSD validation of caller covariances
pub const DEFAULT_VALIDATION_TOLERANCE: f64 = 1e-9;

/// What the run loop does when an update hits a degenerate state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegeneratePolicy {
    /// Stop the run and return the error
    #[default]
    Abort,
    /// Drop the step, keep the current belief, and continue.
    ///
    /// If the estimate itself sits on the sensor every later step is
    /// dropped too; the count shows up in the run outcome.
    Skip,
}

/// Numerical configuration for [`Estimator`](super::Estimator)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    /// Relative singular value cutoff for the pseudo-inverse fallback
    pub pinv_tolerance: f64,
    /// Condition number above which a step is flagged
    pub condition_threshold: f64,
    /// Tolerance for symmetry/PSD checks on R and Q₀
    pub validation_tolerance: f64,
    /// Response to degenerate states inside the loop
    pub degenerate_policy: DegeneratePolicy,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            pinv_tolerance: DEFAULT_PINV_TOLERANCE,
            condition_threshold: DEFAULT_CONDITION_THRESHOLD,
            validation_tolerance: DEFAULT_VALIDATION_TOLERANCE,
            degenerate_policy: DegeneratePolicy::Abort,
        }
    }
}

impl EstimatorConfig {
    /// Default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the pseudo-inverse cutoff
    pub fn with_pinv_tolerance(mut self, tolerance: f64) -> Self {
        self.pinv_tolerance = tolerance;
        self
    }

    /// Set the ill-conditioning threshold
    pub fn with_condition_threshold(mut self, threshold: f64) -> Self {
        self.condition_threshold = threshold;
        self
    }

    /// Set the covariance validation tolerance
    pub fn with_validation_tolerance(mut self, tolerance: f64) -> Self {
        self.validation_tolerance = tolerance;
        self
    }

    /// Set the degenerate-state policy
    pub fn with_degenerate_policy(mut self, policy: DegeneratePolicy) -> Self {
        self.degenerate_policy = policy;
        self
    }

    /// Reject negative or non-finite tolerances and thresholds
    pub fn validate(&self) -> Result<()> {
        if !(self.pinv_tolerance >= 0.0 && self.pinv_tolerance.is_finite()) {
            return Err(EstimationError::configuration(format!(
                "pinv_tolerance must be finite and non-negative, got {}",
                self.pinv_tolerance
            )));
        }
        if !(self.condition_threshold >= 1.0) {
            return Err(EstimationError::configuration(format!(
                "condition_threshold must be at least 1, got {}",
                self.condition_threshold
            )));
        }
        if !(self.validation_tolerance >= 0.0 && self.validation_tolerance.is_finite()) {
            return Err(EstimationError::configuration(format!(
                "validation_tolerance must be finite and non-negative, got {}",
                self.validation_tolerance
            )));
        }
        Ok(())
    }
}
