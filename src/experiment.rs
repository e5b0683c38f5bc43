//! Experiment driver
//!
//! Holds everything the estimator must not see (ground truth and the
//! noise model used for simulation) in an [`ExperimentConfig`], runs the
//! estimator against a seeded [`SimulatedSensor`], and reports the final
//! belief together with an error-vs-sample-count curve.
//!
//! Configurations are plain serde structs so they can be loaded from JSON:
//!
//! ```json
//! {
//!   "ground_truth": [1.5, 1.0],
//!   "noise_covariance": [[0.01, 0.0], [0.0, 0.017453292519943295]],
//!   "initial_mean": [3.0, 3.0],
//!   "n_samples": 1000,
//!   "seed": 42
//! }
//! ```

use std::fs;
use std::path::Path;

use nalgebra::{Matrix2, Vector2};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

#[cfg(feature = "rayon")]
use rayon::prelude::*;

use crate::common::{EstimationError, Result};
use crate::estimator::{Belief, Estimator, EstimatorConfig, RunOutcome, StepDiagnostics};
use crate::model::RangeBearing;
use crate::reporter::{CompositeReporter, StepReporter};
use crate::sources::SimulatedSensor;

/// Sample counts at which the pedagogical scenario records its error
pub const DEFAULT_CHECKPOINTS: [usize; 11] = [0, 1, 2, 5, 10, 20, 50, 100, 200, 500, 1000];

// =============================================================================
// Configuration
// =============================================================================

/// Complete description of one estimation experiment
///
/// Matrices are stored row-major as nested arrays for readable JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    /// True position observed by the simulated sensor
    pub ground_truth: [f64; 2],
    /// Measurement noise covariance R
    pub noise_covariance: [[f64; 2]; 2],
    /// Range and bearing standard deviations; when set, R = diag(σᵣ², σ_b²)
    /// and `noise_covariance` is ignored
    #[serde(skip_serializing_if = "Option::is_none")]
    pub noise_std: Option<[f64; 2]>,
    /// Initial estimate x̂₀
    pub initial_mean: [f64; 2],
    /// Initial covariance Q₀
    pub initial_covariance: [[f64; 2]; 2],
    /// Sensor position (the origin in the pedagogical scenario)
    pub sensor_position: [f64; 2],
    /// Number of measurements fused
    pub n_samples: usize,
    /// Seed for the measurement noise
    pub seed: u64,
    /// Sample counts at which the error is recorded
    pub checkpoints: Vec<usize>,
    /// Numerical settings for the estimator
    pub estimator: EstimatorConfig,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self::pedagogical()
    }
}

impl ExperimentConfig {
    /// Reference scenario: truth (1.5, 1.0), R = diag(0.01, radians(1)),
    /// x̂₀ = (3, 3), Q₀ = I, 1000 samples
    pub fn pedagogical() -> Self {
        Self {
            ground_truth: [1.5, 1.0],
            noise_covariance: [[0.01, 0.0], [0.0, 1.0f64.to_radians()]],
            noise_std: None,
            initial_mean: [3.0, 3.0],
            initial_covariance: [[1.0, 0.0], [0.0, 1.0]],
            sensor_position: [0.0, 0.0],
            n_samples: 1000,
            seed: 42,
            checkpoints: DEFAULT_CHECKPOINTS.to_vec(),
            estimator: EstimatorConfig::default(),
        }
    }

    /// Parse a configuration from JSON; missing fields take pedagogical values
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Set the sample count
    pub fn with_samples(mut self, n_samples: usize) -> Self {
        self.n_samples = n_samples;
        self
    }

    /// Set the noise seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the checkpoints
    pub fn with_checkpoints(mut self, checkpoints: Vec<usize>) -> Self {
        self.checkpoints = checkpoints;
        self
    }

    /// Diagonal R from range and bearing standard deviations
    pub fn with_noise_std(mut self, range_std: f64, bearing_std: f64) -> Self {
        self.noise_std = Some([range_std, bearing_std]);
        self
    }

    /// Set the initial belief
    pub fn with_initial_belief(mut self, mean: [f64; 2], covariance: [[f64; 2]; 2]) -> Self {
        self.initial_mean = mean;
        self.initial_covariance = covariance;
        self
    }

    /// Ground truth as a vector
    pub fn truth(&self) -> Vector2<f64> {
        Vector2::from(self.ground_truth)
    }

    /// R as a matrix
    pub fn noise(&self) -> Matrix2<f64> {
        match self.noise_std {
            Some([range_std, bearing_std]) => {
                Matrix2::new(range_std * range_std, 0.0, 0.0, bearing_std * bearing_std)
            }
            None => matrix_from_rows(&self.noise_covariance),
        }
    }

    /// (x̂₀, Q₀)
    pub fn initial_belief(&self) -> Belief {
        Belief::new(
            Vector2::from(self.initial_mean),
            matrix_from_rows(&self.initial_covariance),
        )
    }

    /// Measurement model for this experiment
    pub fn model(&self) -> RangeBearing {
        RangeBearing::at(Vector2::from(self.sensor_position))
    }

    /// Sorted, deduplicated checkpoints that fall within the run
    pub fn checkpoint_schedule(&self) -> Vec<usize> {
        let mut schedule: Vec<usize> = self
            .checkpoints
            .iter()
            .copied()
            .filter(|&c| c <= self.n_samples)
            .collect();
        schedule.sort_unstable();
        schedule.dedup();
        schedule
    }

    /// Reject non-finite vectors and invalid estimator settings
    ///
    /// Covariances are validated by the estimator itself.
    pub fn validate(&self) -> Result<()> {
        let vectors = [
            ("ground_truth", self.ground_truth),
            ("initial_mean", self.initial_mean),
            ("sensor_position", self.sensor_position),
        ];
        for (name, v) in vectors {
            if !v.iter().all(|x| x.is_finite()) {
                return Err(EstimationError::configuration(format!(
                    "{} must be finite, got {:?}",
                    name, v
                )));
            }
        }
        if let Some(std) = self.noise_std {
            if !std.iter().all(|x| x.is_finite() && *x >= 0.0) {
                return Err(EstimationError::configuration(format!(
                    "noise_std must be finite and non-negative, got {:?}",
                    std
                )));
            }
        }
        self.estimator.validate()
    }
}

fn matrix_from_rows(rows: &[[f64; 2]; 2]) -> Matrix2<f64> {
    Matrix2::new(rows[0][0], rows[0][1], rows[1][0], rows[1][1])
}

// =============================================================================
// Reports
// =============================================================================

/// Estimation error after a given number of samples
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ErrorPoint {
    /// Measurements fused so far
    pub samples: usize,
    /// ‖x − x̂‖
    pub error: f64,
}

/// Result of a single experiment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExperimentReport {
    /// Seed used for the measurement noise
    pub seed: u64,
    /// Requested sample count
    pub n_samples: usize,
    /// x̂ₙ
    pub final_mean: [f64; 2],
    /// Qₙ (row-major)
    pub final_covariance: [[f64; 2]; 2],
    /// ‖x − x̂ₙ‖
    pub final_error: f64,
    /// trace(Qₙ)
    pub final_trace: f64,
    /// Error at each checkpoint
    pub error_curve: Vec<ErrorPoint>,
    /// Updates applied
    pub steps_applied: usize,
    /// Degenerate steps dropped
    pub steps_skipped: usize,
    /// Steps flagged ill-conditioned
    pub ill_conditioned_steps: usize,
}

impl ExperimentReport {
    fn new(config: &ExperimentConfig, outcome: &RunOutcome, error_curve: Vec<ErrorPoint>) -> Self {
        let b = &outcome.belief;
        Self {
            seed: config.seed,
            n_samples: config.n_samples,
            final_mean: [b.mean[0], b.mean[1]],
            final_covariance: [
                [b.covariance[(0, 0)], b.covariance[(0, 1)]],
                [b.covariance[(1, 0)], b.covariance[(1, 1)]],
            ],
            final_error: b.error_to(&config.truth()),
            final_trace: outcome.final_trace(),
            error_curve,
            steps_applied: outcome.steps_applied,
            steps_skipped: outcome.steps_skipped,
            ill_conditioned_steps: outcome.ill_conditioned_steps,
        }
    }

    /// Final estimate as a vector
    pub fn final_estimate(&self) -> Vector2<f64> {
        Vector2::from(self.final_mean)
    }

    /// Error recorded at `samples`, if that was a checkpoint
    pub fn error_at(&self, samples: usize) -> Option<f64> {
        self.error_curve
            .iter()
            .find(|p| p.samples == samples)
            .map(|p| p.error)
    }

    /// Pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Records the error to the truth whenever the sample count hits a checkpoint
struct CheckpointRecorder {
    truth: Vector2<f64>,
    schedule: Vec<usize>,
    next: usize,
    curve: Vec<ErrorPoint>,
}

impl CheckpointRecorder {
    fn new(truth: Vector2<f64>, schedule: Vec<usize>) -> Self {
        Self {
            truth,
            schedule,
            next: 0,
            curve: Vec::new(),
        }
    }

    fn record(&mut self, samples: usize, belief: &Belief) {
        while self.next < self.schedule.len() && self.schedule[self.next] < samples {
            self.next += 1;
        }
        if self.schedule.get(self.next) == Some(&samples) {
            self.curve.push(ErrorPoint {
                samples,
                error: belief.error_to(&self.truth),
            });
            self.next += 1;
        }
    }
}

impl StepReporter for CheckpointRecorder {
    fn on_start(&mut self, initial: &Belief, _n_steps: usize) {
        self.record(0, initial);
    }

    fn on_step(&mut self, belief: &Belief, diagnostics: &StepDiagnostics) {
        self.record(diagnostics.step + 1, belief);
    }
}

// =============================================================================
// Drivers
// =============================================================================

/// Run one experiment
pub fn run_experiment(config: &ExperimentConfig) -> Result<ExperimentReport> {
    run_experiment_with_reporter(config, &mut crate::reporter::NoOpReporter)
}

/// Run one experiment, forwarding loop events to `reporter`
pub fn run_experiment_with_reporter<P: StepReporter>(
    config: &ExperimentConfig,
    reporter: &mut P,
) -> Result<ExperimentReport> {
    config.validate()?;

    let model = config.model();
    let noise = config.noise();
    let estimator = Estimator::new(model, noise, config.estimator)?;
    let sensor = SimulatedSensor::with_tolerance(
        model,
        config.truth(),
        noise,
        StdRng::seed_from_u64(config.seed),
        config.estimator.validation_tolerance,
    )?;

    let recorder = CheckpointRecorder::new(config.truth(), config.checkpoint_schedule());
    let mut composite = CompositeReporter::new(recorder, reporter);
    let outcome = estimator.run_with_reporter(
        config.initial_belief(),
        sensor,
        config.n_samples,
        &mut composite,
    )?;

    let (recorder, _) = composite.into_parts();
    Ok(ExperimentReport::new(config, &outcome, recorder.curve))
}

/// Error at one checkpoint averaged over trials
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MeanErrorPoint {
    /// Measurements fused so far
    pub samples: usize,
    /// Mean ‖x − x̂‖ across trials
    pub mean_error: f64,
    /// Largest ‖x − x̂‖ across trials
    pub max_error: f64,
}

/// Error-vs-sample-count curve averaged over independent trials
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonteCarloCurve {
    /// Number of trials
    pub trials: usize,
    /// One point per checkpoint
    pub points: Vec<MeanErrorPoint>,
}

impl MonteCarloCurve {
    /// Mean error at `samples`, if that was a checkpoint
    pub fn mean_error_at(&self, samples: usize) -> Option<f64> {
        self.points
            .iter()
            .find(|p| p.samples == samples)
            .map(|p| p.mean_error)
    }
}

/// Average the error curve over `trials` independent runs
///
/// Trial `k` uses seed `config.seed + k`. With the `rayon` feature the
/// trials run in parallel; results are identical either way.
pub fn monte_carlo_error_curve(config: &ExperimentConfig, trials: usize) -> Result<MonteCarloCurve> {
    if trials == 0 {
        return Err(EstimationError::configuration(
            "monte carlo run needs at least one trial",
        ));
    }

    let run_trial = |k: usize| {
        let trial_config = config.clone().with_seed(config.seed.wrapping_add(k as u64));
        run_experiment(&trial_config)
    };

    #[cfg(feature = "rayon")]
    let reports: Vec<ExperimentReport> = (0..trials)
        .into_par_iter()
        .map(run_trial)
        .collect::<Result<_>>()?;

    #[cfg(not(feature = "rayon"))]
    let reports: Vec<ExperimentReport> = (0..trials).map(run_trial).collect::<Result<_>>()?;

    let points = config
        .checkpoint_schedule()
        .into_iter()
        .map(|samples| {
            let errors: Vec<f64> = reports.iter().filter_map(|r| r.error_at(samples)).collect();
            let mean_error = errors.iter().sum::<f64>() / errors.len().max(1) as f64;
            let max_error = errors.iter().copied().fold(0.0, f64::max);
            MeanErrorPoint {
                samples,
                mean_error,
                max_error,
            }
        })
        .collect();

    log::debug!("Monte Carlo curve complete: {} trials", trials);
    Ok(MonteCarloCurve { trials, points })
}
