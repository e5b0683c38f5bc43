//! Recursive range/bearing estimator
//!
//! - [`Estimator`] - information-form update and the fixed-count run loop
//! - [`Belief`] - the (mean, covariance) pair threaded through the loop
//! - [`EstimatorConfig`] - pseudo-inverse cutoff, conditioning threshold,
//!   degenerate-state policy

mod belief;
mod config;
mod core;

pub use belief::{Belief, RunOutcome, StepDiagnostics};
pub use config::{
    DegeneratePolicy, EstimatorConfig, DEFAULT_CONDITION_THRESHOLD, DEFAULT_PINV_TOLERANCE,
    DEFAULT_VALIDATION_TOLERANCE,
};
pub use self::core::{run, update, Estimator};
