//! Measurement sources
//!
//! The estimator pulls one observation per step from a [`MeasurementSource`]
//! and never sees the ground truth. A [`SimulatedSensor`] draws Gaussian
//! noise around `h(x_true)`; a [`ReplaySource`] plays back a recorded
//! sequence for deterministic tests.

use nalgebra::{Matrix2, Vector2};
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};

use crate::common::linalg::{covariance_sqrt, validate_covariance, wrap_angle};
use crate::common::Result;
use crate::estimator::DEFAULT_VALIDATION_TOLERANCE;
use crate::model::MeasurementModel;

/// Produces noisy `(range, bearing)` observations
pub trait MeasurementSource {
    /// Next observation, or `None` once the source is exhausted
    fn next_measurement(&mut self) -> Option<Vector2<f64>>;
}

impl<S: MeasurementSource + ?Sized> MeasurementSource for &mut S {
    fn next_measurement(&mut self) -> Option<Vector2<f64>> {
        (**self).next_measurement()
    }
}

/// Simulated sensor observing a fixed ground truth
///
/// Each call returns `h(x_true) + L z` with `z ~ N(0, I)` and `L Lᵀ = R`.
/// The noisy bearing is wrapped back into `(-π, π]` and the noisy range is
/// clamped at zero, so samples stay valid range/bearing pairs even when the
/// range noise is comparable to the true range.
pub struct SimulatedSensor<M, G> {
    model: M,
    truth: Vector2<f64>,
    clean: Vector2<f64>,
    noise_sqrt: Matrix2<f64>,
    rng: G,
}

impl<M: MeasurementModel, G: Rng> SimulatedSensor<M, G> {
    /// Create a sensor for `truth` with noise covariance `noise`
    ///
    /// Fails if the truth is degenerate for the model or `noise` is not a
    /// valid covariance.
    pub fn new(model: M, truth: Vector2<f64>, noise: Matrix2<f64>, rng: G) -> Result<Self> {
        Self::with_tolerance(model, truth, noise, rng, DEFAULT_VALIDATION_TOLERANCE)
    }

    /// [`new`](Self::new) with an explicit symmetry/PSD tolerance for `noise`
    pub fn with_tolerance(
        model: M,
        truth: Vector2<f64>,
        noise: Matrix2<f64>,
        rng: G,
        tolerance: f64,
    ) -> Result<Self> {
        validate_covariance("R", &noise, tolerance)?;
        let clean = model.observe(&truth)?;
        Ok(Self {
            model,
            truth,
            clean,
            noise_sqrt: covariance_sqrt(&noise),
            rng,
        })
    }

    /// Ground truth this sensor observes
    pub fn truth(&self) -> &Vector2<f64> {
        &self.truth
    }

    /// The measurement model
    pub fn model(&self) -> &M {
        &self.model
    }

    /// Draw one noisy observation
    pub fn sample(&mut self) -> Vector2<f64> {
        let z: Vector2<f64> = Vector2::new(
            StandardNormal.sample(&mut self.rng),
            StandardNormal.sample(&mut self.rng),
        );
        let y = self.clean + self.noise_sqrt * z;
        Vector2::new(y[0].max(0.0), wrap_angle(y[1]))
    }
}

impl<M: MeasurementModel, G: Rng> MeasurementSource for SimulatedSensor<M, G> {
    fn next_measurement(&mut self) -> Option<Vector2<f64>> {
        Some(self.sample())
    }
}

/// Plays back a recorded sequence of observations once
#[derive(Debug, Clone)]
pub struct ReplaySource {
    measurements: Vec<Vector2<f64>>,
    cursor: usize,
}

impl ReplaySource {
    /// Replay `measurements` in order
    pub fn new(measurements: Vec<Vector2<f64>>) -> Self {
        Self {
            measurements,
            cursor: 0,
        }
    }

    /// Replay the same measurement `count` times
    pub fn constant(measurement: Vector2<f64>, count: usize) -> Self {
        Self::new(vec![measurement; count])
    }

    /// Observations not yet consumed
    pub fn remaining(&self) -> usize {
        self.measurements.len() - self.cursor
    }

    /// Start over from the first observation
    pub fn rewind(&mut self) {
        self.cursor = 0;
    }
}

impl MeasurementSource for ReplaySource {
    fn next_measurement(&mut self) -> Option<Vector2<f64>> {
        let y = self.measurements.get(self.cursor).copied()?;
        self.cursor += 1;
        Some(y)
    }
}

impl FromIterator<Vector2<f64>> for ReplaySource {
    fn from_iter<I: IntoIterator<Item = Vector2<f64>>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
