//! Common utilities shared by the estimator and the experiment driver.
//!
//! This module contains the crate error type and the small linear algebra
//! helpers used by the information-form update.

pub mod errors;
pub mod linalg;

pub use errors::{EstimationError, Result};
