//! Observability for estimator runs.
//!
//! This module provides the [`StepReporter`] trait for debugging and
//! diagnostics. Reporters receive callbacks at key points of the update loop
//! without polluting the numerical code.
//!
//! The default [`NoOpReporter`] has empty callbacks that the compiler
//! removes entirely.
//!
//! # Example
//!
//! ```
//! use nalgebra::{Matrix2, Vector2};
//! use rangebearing_filter::{Belief, DebugReporter, Estimator, ReplaySource};
//!
//! let estimator = Estimator::range_bearing(Matrix2::new(0.01, 0.0, 0.0, 0.001)).unwrap();
//! let truth_measurement = Vector2::new(2.0_f64.sqrt(), std::f64::consts::FRAC_PI_4);
//! let source = ReplaySource::constant(truth_measurement, 5);
//!
//! let mut reporter = DebugReporter::new();
//! let initial = Belief::isotropic(Vector2::new(2.0, 2.0), 1.0);
//! estimator.run_with_reporter(initial, source, 5, &mut reporter).unwrap();
//!
//! assert_eq!(reporter.step_events().len(), 5);
//! ```

use crate::common::EstimationError;
use crate::estimator::{Belief, RunOutcome, StepDiagnostics};

// ============================================================================
// StepReporter Trait
// ============================================================================

/// Observability trait for the estimator loop.
///
/// All methods have default empty implementations, so you only need to
/// override the events you care about. Callbacks take `&mut self`, so
/// reporters are not required to be `Send + Sync`.
pub trait StepReporter {
    /// Called once before the first step with the validated initial belief.
    fn on_start(&mut self, _initial: &Belief, _n_steps: usize) {}

    /// Called after each applied update with the new belief.
    fn on_step(&mut self, _belief: &Belief, _diagnostics: &StepDiagnostics) {}

    /// Called (before `on_step`) when the information matrix of a step
    /// exceeded the condition threshold.
    fn on_ill_conditioned(&mut self, _diagnostics: &StepDiagnostics) {}

    /// Called when a degenerate step is dropped under the skip policy.
    fn on_skipped(&mut self, _step: usize, _error: &EstimationError) {}

    /// Called when the run aborts.
    fn on_failure(&mut self, _step: usize, _error: &EstimationError) {}

    /// Called after the last step.
    fn on_complete(&mut self, _outcome: &RunOutcome) {}
}

impl<R: StepReporter + ?Sized> StepReporter for &mut R {
    fn on_start(&mut self, initial: &Belief, n_steps: usize) {
        (**self).on_start(initial, n_steps);
    }

    fn on_step(&mut self, belief: &Belief, diagnostics: &StepDiagnostics) {
        (**self).on_step(belief, diagnostics);
    }

    fn on_ill_conditioned(&mut self, diagnostics: &StepDiagnostics) {
        (**self).on_ill_conditioned(diagnostics);
    }

    fn on_skipped(&mut self, step: usize, error: &EstimationError) {
        (**self).on_skipped(step, error);
    }

    fn on_failure(&mut self, step: usize, error: &EstimationError) {
        (**self).on_failure(step, error);
    }

    fn on_complete(&mut self, outcome: &RunOutcome) {
        (**self).on_complete(outcome);
    }
}

// ============================================================================
// NoOpReporter
// ============================================================================

/// Reporter that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpReporter;

impl NoOpReporter {
    /// Create a new no-op reporter.
    pub fn new() -> Self {
        Self
    }
}

impl StepReporter for NoOpReporter {}

// ============================================================================
// DebugReporter
// ============================================================================

/// Reporter that captures every event.
///
/// Stores a copy of the belief after each step, so a run of `n` steps keeps
/// `n` beliefs in memory.
#[derive(Debug, Clone, Default)]
pub struct DebugReporter {
    starts: Vec<(Belief, usize)>,
    steps: Vec<(Belief, StepDiagnostics)>,
    ill_conditioned: Vec<StepDiagnostics>,
    skipped: Vec<(usize, EstimationError)>,
    failures: Vec<(usize, EstimationError)>,
    completions: Vec<RunOutcome>,
}

impl DebugReporter {
    /// Create a new debug reporter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all captured events.
    pub fn clear(&mut self) {
        self.starts.clear();
        self.steps.clear();
        self.ill_conditioned.clear();
        self.skipped.clear();
        self.failures.clear();
        self.completions.clear();
    }

    /// Initial beliefs and requested step counts.
    pub fn start_events(&self) -> &[(Belief, usize)] {
        &self.starts
    }

    /// Belief and diagnostics after each applied step.
    pub fn step_events(&self) -> &[(Belief, StepDiagnostics)] {
        &self.steps
    }

    /// Diagnostics of flagged steps.
    pub fn ill_conditioned_events(&self) -> &[StepDiagnostics] {
        &self.ill_conditioned
    }

    /// Dropped steps and why.
    pub fn skipped_events(&self) -> &[(usize, EstimationError)] {
        &self.skipped
    }

    /// Aborts and why.
    pub fn failure_events(&self) -> &[(usize, EstimationError)] {
        &self.failures
    }

    /// Completed runs.
    pub fn completion_events(&self) -> &[RunOutcome] {
        &self.completions
    }

    /// trace(Q) after each applied step
    pub fn trace_history(&self) -> Vec<f64> {
        self.steps.iter().map(|(_, d)| d.trace).collect()
    }

    /// Total number of captured events across all types.
    pub fn total_events(&self) -> usize {
        self.starts.len()
            + self.steps.len()
            + self.ill_conditioned.len()
            + self.skipped.len()
            + self.failures.len()
            + self.completions.len()
    }
}

impl StepReporter for DebugReporter {
    fn on_start(&mut self, initial: &Belief, n_steps: usize) {
        self.starts.push((*initial, n_steps));
    }

    fn on_step(&mut self, belief: &Belief, diagnostics: &StepDiagnostics) {
        self.steps.push((*belief, *diagnostics));
    }

    fn on_ill_conditioned(&mut self, diagnostics: &StepDiagnostics) {
        self.ill_conditioned.push(*diagnostics);
    }

    fn on_skipped(&mut self, step: usize, error: &EstimationError) {
        self.skipped.push((step, error.clone()));
    }

    fn on_failure(&mut self, step: usize, error: &EstimationError) {
        self.failures.push((step, error.clone()));
    }

    fn on_complete(&mut self, outcome: &RunOutcome) {
        self.completions.push(*outcome);
    }
}

// ============================================================================
// LoggingReporter
// ============================================================================

/// Reporter that emits events through the `log` crate.
///
/// Levels:
/// - `on_start`, `on_complete`: INFO
/// - `on_step`: TRACE (DEBUG when verbose)
/// - `on_ill_conditioned`, `on_skipped`: WARN
/// - `on_failure`: ERROR
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingReporter {
    verbose: bool,
}

impl LoggingReporter {
    /// Create a new logging reporter.
    pub fn new() -> Self {
        Self { verbose: false }
    }

    /// Create a logging reporter that logs every step at DEBUG.
    pub fn verbose() -> Self {
        Self { verbose: true }
    }
}

impl StepReporter for LoggingReporter {
    fn on_start(&mut self, initial: &Belief, n_steps: usize) {
        log::info!(
            "Starting run: {} steps from x̂=({:.4}, {:.4}), trace(Q)={:.4e}",
            n_steps,
            initial.mean[0],
            initial.mean[1],
            initial.trace()
        );
    }

    fn on_step(&mut self, belief: &Belief, diagnostics: &StepDiagnostics) {
        let level = if self.verbose {
            log::Level::Debug
        } else {
            log::Level::Trace
        };
        log::log!(
            level,
            "Step {}: x̂=({:.6}, {:.6}), trace(Q)={:.4e}, |Δx̂|={:.3e}, cond={:.3e}",
            diagnostics.step,
            belief.mean[0],
            belief.mean[1],
            diagnostics.trace,
            diagnostics.step_norm,
            diagnostics.condition_number
        );
    }

    fn on_ill_conditioned(&mut self, diagnostics: &StepDiagnostics) {
        log::warn!(
            "Step {}: ill-conditioned inversion (prior cond={:.3e}, information cond={:.3e}, pseudo-inverse={})",
            diagnostics.step,
            diagnostics.prior_condition_number,
            diagnostics.condition_number,
            diagnostics.used_pseudo_inverse
        );
    }

    fn on_skipped(&mut self, step: usize, error: &EstimationError) {
        log::warn!("Step {} skipped: {}", step, error);
    }

    fn on_failure(&mut self, step: usize, error: &EstimationError) {
        log::error!("Run aborted at step {}: {}", step, error);
    }

    fn on_complete(&mut self, outcome: &RunOutcome) {
        log::info!(
            "Run complete: {} applied, {} skipped, {} ill-conditioned, trace(Q)={:.4e}",
            outcome.steps_applied,
            outcome.steps_skipped,
            outcome.ill_conditioned_steps,
            outcome.final_trace()
        );
    }
}

// ============================================================================
// CompositeReporter
// ============================================================================

/// Reporter that forwards events to two child reporters.
#[derive(Debug, Clone)]
pub struct CompositeReporter<A: StepReporter, B: StepReporter> {
    first: A,
    second: B,
}

impl<A: StepReporter, B: StepReporter> CompositeReporter<A, B> {
    /// Create a new composite reporter.
    pub fn new(first: A, second: B) -> Self {
        Self { first, second }
    }

    /// Get a reference to the first reporter.
    pub fn first(&self) -> &A {
        &self.first
    }

    /// Get a reference to the second reporter.
    pub fn second(&self) -> &B {
        &self.second
    }

    /// Consume and return both reporters.
    pub fn into_parts(self) -> (A, B) {
        (self.first, self.second)
    }
}

impl<A: StepReporter, B: StepReporter> StepReporter for CompositeReporter<A, B> {
    fn on_start(&mut self, initial: &Belief, n_steps: usize) {
        self.first.on_start(initial, n_steps);
        self.second.on_start(initial, n_steps);
    }

    fn on_step(&mut self, belief: &Belief, diagnostics: &StepDiagnostics) {
        self.first.on_step(belief, diagnostics);
        self.second.on_step(belief, diagnostics);
    }

    fn on_ill_conditioned(&mut self, diagnostics: &StepDiagnostics) {
        self.first.on_ill_conditioned(diagnostics);
        self.second.on_ill_conditioned(diagnostics);
    }

    fn on_skipped(&mut self, step: usize, error: &EstimationError) {
        self.first.on_skipped(step, error);
        self.second.on_skipped(step, error);
    }

    fn on_failure(&mut self, step: usize, error: &EstimationError) {
        self.first.on_failure(step, error);
        self.second.on_failure(step, error);
    }

    fn on_complete(&mut self, outcome: &RunOutcome) {
        self.first.on_complete(outcome);
        self.second.on_complete(outcome);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector2;

    fn dummy_belief() -> Belief {
        Belief::isotropic(Vector2::new(1.0, 2.0), 1.0)
    }

    fn dummy_diagnostics(step: usize) -> StepDiagnostics {
        StepDiagnostics {
            step,
            trace: 1.0 / (step as f64 + 1.0),
            step_norm: 0.1,
            condition_number: 10.0,
            prior_condition_number: 1.0,
            innovation: [0.0, 0.0],
            used_pseudo_inverse: false,
            ill_conditioned: false,
        }
    }

    fn dummy_outcome() -> RunOutcome {
        RunOutcome {
            belief: dummy_belief(),
            steps_applied: 2,
            steps_skipped: 0,
            ill_conditioned_steps: 0,
            last_step_norm: 0.1,
        }
    }

    #[test]
    fn test_noop_reporter() {
        let mut reporter = NoOpReporter::new();
        reporter.on_start(&dummy_belief(), 10);
        reporter.on_step(&dummy_belief(), &dummy_diagnostics(0));
        reporter.on_complete(&dummy_outcome());
    }

    #[test]
    fn test_debug_reporter_captures_events() {
        let mut reporter = DebugReporter::new();
        assert_eq!(reporter.total_events(), 0);

        reporter.on_start(&dummy_belief(), 2);
        reporter.on_step(&dummy_belief(), &dummy_diagnostics(0));
        reporter.on_step(&dummy_belief(), &dummy_diagnostics(1));
        reporter.on_skipped(2, &EstimationError::degenerate("test"));
        reporter.on_complete(&dummy_outcome());

        assert_eq!(reporter.start_events().len(), 1);
        assert_eq!(reporter.step_events().len(), 2);
        assert_eq!(reporter.skipped_events()[0].0, 2);
        assert_eq!(reporter.completion_events().len(), 1);
        assert_eq!(reporter.total_events(), 5);
        assert_eq!(reporter.trace_history(), vec![1.0, 0.5]);

        reporter.clear();
        assert_eq!(reporter.total_events(), 0);
    }

    #[test]
    fn test_logging_reporter() {
        // Just verify it doesn't panic without a logger installed
        let mut reporter = LoggingReporter::new();
        reporter.on_start(&dummy_belief(), 1);
        reporter.on_step(&dummy_belief(), &dummy_diagnostics(0));
        reporter.on_ill_conditioned(&dummy_diagnostics(0));
        reporter.on_failure(0, &EstimationError::degenerate("test"));
        reporter.on_complete(&dummy_outcome());

        let mut verbose = LoggingReporter::verbose();
        verbose.on_step(&dummy_belief(), &dummy_diagnostics(0));
    }

    #[test]
    fn test_composite_reporter() {
        let mut composite = CompositeReporter::new(DebugReporter::new(), NoOpReporter::new());
        composite.on_step(&dummy_belief(), &dummy_diagnostics(0));
        composite.on_ill_conditioned(&dummy_diagnostics(0));
        assert_eq!(composite.first().step_events().len(), 1);
        assert_eq!(composite.first().ill_conditioned_events().len(), 1);

        let (debug, _noop) = composite.into_parts();
        assert_eq!(debug.total_events(), 2);
    }

    #[test]
    fn test_mut_ref_forwarding() {
        let mut debug = DebugReporter::new();
        {
            let mut by_ref = &mut debug;
            StepReporter::on_step(&mut by_ref, &dummy_belief(), &dummy_diagnostics(0));
        }
        assert_eq!(debug.step_events().len(), 1);
    }
}
