//! Information-form update and the fixed-count run loop
//!
//! One update linearizes the measurement model at the current estimate and
//! fuses a single observation:
//!
//! ```text
//! H  = ∂h/∂x (x̂)
//! Q' = (Q⁻¹ + Hᵀ R⁻¹ H)⁻¹
//! x̂' = x̂ + Q' Hᵀ R⁻¹ (y ⊖ h(x̂))
//! ```
//!
//! Inverses go through [`invert_psd`], so a singular prior or information
//! matrix yields the minimal-norm pseudo-inverse instead of an error. Both
//! inversions feed the step's conditioning flags. Degenerate
//! states and non-finite values abort the update.

use nalgebra::{Matrix2, Vector2};

use super::belief::{Belief, RunOutcome, StepDiagnostics};
use super::config::{DegeneratePolicy, EstimatorConfig};
use crate::common::linalg::{invert_psd, symmetrize, validate_covariance};
use crate::common::{EstimationError, Result};
use crate::model::{MeasurementModel, RangeBearing};
use crate::reporter::{NoOpReporter, StepReporter};
use crate::sources::MeasurementSource;

/// Recursive estimator bound to a measurement model and noise covariance
///
/// `R` is validated and inverted once at construction. The estimator holds
/// no per-run state: the belief is threaded through [`Estimator::update`]
/// by the caller, or owned by [`Estimator::run`] for the duration of a run.
#[derive(Debug, Clone)]
pub struct Estimator<M> {
    model: M,
    noise: Matrix2<f64>,
    noise_information: Matrix2<f64>,
    config: EstimatorConfig,
}

impl Estimator<RangeBearing> {
    /// Range/bearing estimator with the sensor at the origin and default config
    pub fn range_bearing(noise: Matrix2<f64>) -> Result<Self> {
        Self::new(RangeBearing::new(), noise, EstimatorConfig::default())
    }
}

impl<M: MeasurementModel> Estimator<M> {
    /// Create an estimator
    ///
    /// # Errors
    /// `InvalidCovariance` if `noise` is not symmetric PSD, `Configuration`
    /// if the config has invalid tolerances.
    pub fn new(model: M, noise: Matrix2<f64>, config: EstimatorConfig) -> Result<Self> {
        config.validate()?;
        validate_covariance("R", &noise, config.validation_tolerance)?;

        let inversion = invert_psd(&noise, config.pinv_tolerance, "noise covariance R")?;
        if inversion.used_pseudo_inverse {
            log::warn!(
                "Noise covariance R is singular (cond={:.3e}); using pseudo-inverse",
                inversion.condition_number
            );
        }

        Ok(Self {
            model,
            noise,
            noise_information: inversion.inverse,
            config,
        })
    }

    /// The measurement model
    pub fn model(&self) -> &M {
        &self.model
    }

    /// Noise covariance R
    pub fn noise(&self) -> &Matrix2<f64> {
        &self.noise
    }

    /// Estimator configuration
    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    /// Fuse one observation into `belief`
    ///
    /// Returns the posterior belief and the step diagnostics (with
    /// `step = 0`; [`run`](Self::run) fills in the index).
    ///
    /// # Errors
    /// `DegenerateState` when the estimate sits on the sensor, `NonFinite`
    /// for NaN/∞ inputs or results.
    pub fn update(
        &self,
        belief: &Belief,
        observation: &Vector2<f64>,
    ) -> Result<(Belief, StepDiagnostics)> {
        if !observation.iter().all(|v| v.is_finite()) {
            return Err(EstimationError::non_finite("observation"));
        }

        // Linearize at the estimate, never at the truth
        let h = self.model.jacobian(&belief.mean)?;
        let predicted = self.model.observe(&belief.mean)?;

        let tolerance = self.config.pinv_tolerance;
        let prior = invert_psd(&belief.covariance, tolerance, "prior covariance Q")?;

        let h_t_r_inv = h.transpose() * self.noise_information;
        let information = symmetrize(&(prior.inverse + h_t_r_inv * h));
        let posterior = invert_psd(&information, tolerance, "information matrix")?;
        let covariance = symmetrize(&posterior.inverse);

        let innovation = self.model.residual(observation, &predicted);
        let correction = covariance * h_t_r_inv * innovation;
        let mean = belief.mean + correction;

        if !mean.iter().all(|v| v.is_finite()) || !covariance.iter().all(|v| v.is_finite()) {
            return Err(EstimationError::non_finite("posterior belief"));
        }

        let threshold = self.config.condition_threshold;
        let diagnostics = StepDiagnostics {
            step: 0,
            trace: covariance.trace(),
            step_norm: correction.norm(),
            condition_number: posterior.condition_number,
            prior_condition_number: prior.condition_number,
            innovation: [innovation[0], innovation[1]],
            used_pseudo_inverse: prior.used_pseudo_inverse || posterior.used_pseudo_inverse,
            ill_conditioned: prior.condition_number > threshold
                || posterior.condition_number > threshold,
        };

        Ok((Belief::new(mean, covariance), diagnostics))
    }

    /// Run exactly `n_steps` updates, one measurement per step
    ///
    /// # Errors
    /// `InvalidCovariance` for an invalid initial belief, `SourceExhausted`
    /// if the source runs dry, and any update error not absorbed by the
    /// degenerate-skip policy.
    pub fn run<S: MeasurementSource>(
        &self,
        initial: Belief,
        source: S,
        n_steps: usize,
    ) -> Result<RunOutcome> {
        self.run_with_reporter(initial, source, n_steps, &mut NoOpReporter)
    }

    /// [`run`](Self::run) with a reporter receiving every loop event
    pub fn run_with_reporter<S: MeasurementSource, P: StepReporter>(
        &self,
        initial: Belief,
        mut source: S,
        n_steps: usize,
        reporter: &mut P,
    ) -> Result<RunOutcome> {
        initial
            .validate(self.config.validation_tolerance)
            .map_err(|e| match e {
                EstimationError::InvalidCovariance { reason, .. } => {
                    EstimationError::invalid_covariance("Q0", reason)
                }
                other => other,
            })?;
        reporter.on_start(&initial, n_steps);

        let mut belief = initial;
        let mut steps_applied = 0;
        let mut steps_skipped = 0;
        let mut ill_conditioned_steps = 0;
        let mut last_step_norm = 0.0;

        for step in 0..n_steps {
            let Some(observation) = source.next_measurement() else {
                let err = EstimationError::SourceExhausted { step };
                reporter.on_failure(step, &err);
                return Err(err);
            };

            match self.update(&belief, &observation) {
                Ok((next, mut diagnostics)) => {
                    diagnostics.step = step;
                    if diagnostics.ill_conditioned {
                        if ill_conditioned_steps == 0 {
                            log::warn!(
                                "Ill-conditioned inversion at step {} (cond={:.3e})",
                                step,
                                diagnostics.worst_condition_number()
                            );
                        }
                        ill_conditioned_steps += 1;
                        reporter.on_ill_conditioned(&diagnostics);
                    }
                    belief = next;
                    steps_applied += 1;
                    last_step_norm = diagnostics.step_norm;
                    reporter.on_step(&belief, &diagnostics);
                }
                Err(err)
                    if err.is_degenerate()
                        && self.config.degenerate_policy == DegeneratePolicy::Skip =>
                {
                    steps_skipped += 1;
                    reporter.on_skipped(step, &err);
                }
                Err(err) => {
                    reporter.on_failure(step, &err);
                    return Err(err);
                }
            }
        }

        let outcome = RunOutcome {
            belief,
            steps_applied,
            steps_skipped,
            ill_conditioned_steps,
            last_step_norm,
        };
        reporter.on_complete(&outcome);
        Ok(outcome)
    }
}

/// Single information update with the origin-referenced range/bearing model
///
/// Validates `noise` on every call; prefer [`Estimator`] inside loops.
pub fn update(
    belief: &Belief,
    observation: &Vector2<f64>,
    noise: &Matrix2<f64>,
) -> Result<Belief> {
    let estimator = Estimator::range_bearing(*noise)?;
    estimator.update(belief, observation).map(|(b, _)| b)
}

/// Run `n_steps` range/bearing updates from `(x̂₀, Q₀)`
pub fn run<S: MeasurementSource>(
    initial: Belief,
    noise: &Matrix2<f64>,
    source: S,
    n_steps: usize,
) -> Result<Belief> {
    let estimator = Estimator::range_bearing(*noise)?;
    estimator.run(initial, source, n_steps).map(|o| o.belief)
}
