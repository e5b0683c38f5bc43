//! Integration tests for the range/bearing estimator
//!
//! End-to-end runs with seeded RNGs. These double as regression tests for
//! the reference scenario.

use nalgebra::{Matrix2, Vector2};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rangebearing_filter::{
    range_bearing, run_experiment, run_experiment_with_reporter, Belief, DebugReporter,
    DegeneratePolicy, EstimationError, Estimator, EstimatorConfig, ExperimentConfig,
    MeasurementSource, RangeBearing, ReplaySource, SimulatedSensor,
};

fn pedagogical_noise() -> Matrix2<f64> {
    Matrix2::new(0.01, 0.0, 0.0, 1.0f64.to_radians())
}

/// Reference scenario: 1000 noisy samples bring the estimate within 0.05
#[test]
fn test_pedagogical_convergence() {
    let config = ExperimentConfig::pedagogical();
    let report = run_experiment(&config).unwrap();

    assert_eq!(report.steps_applied, 1000);
    assert_eq!(report.steps_skipped, 0);
    assert!(
        report.final_error < 0.05,
        "final error {} with seed {}",
        report.final_error,
        config.seed
    );
}

/// Convergence bound holds across several fixed seeds
#[test]
fn test_convergence_across_seeds() {
    for seed in [1, 7, 123, 2024, 9999] {
        let report = run_experiment(&ExperimentConfig::pedagogical().with_seed(seed)).unwrap();
        assert!(
            report.final_error < 0.05,
            "seed {}: final error {}",
            seed,
            report.final_error
        );
    }
}

/// Driving the estimator directly matches the experiment driver
#[test]
fn test_driver_matches_direct_loop() {
    let config = ExperimentConfig::pedagogical().with_samples(300);
    let report = run_experiment(&config).unwrap();

    let estimator = Estimator::range_bearing(pedagogical_noise()).unwrap();
    let sensor = SimulatedSensor::new(
        RangeBearing::new(),
        Vector2::new(1.5, 1.0),
        pedagogical_noise(),
        StdRng::seed_from_u64(config.seed),
    )
    .unwrap();
    let outcome = estimator
        .run(Belief::isotropic(Vector2::new(3.0, 3.0), 1.0), sensor, 300)
        .unwrap();

    assert_eq!(report.final_estimate(), outcome.belief.mean);
}

/// Recorded measurements replay to the identical estimate
#[test]
fn test_replay_reproduces_live_run() {
    let truth = Vector2::new(1.5, 1.0);
    let mut live = SimulatedSensor::new(
        RangeBearing::new(),
        truth,
        pedagogical_noise(),
        StdRng::seed_from_u64(5),
    )
    .unwrap();
    let recorded: Vec<Vector2<f64>> = (0..250).map(|_| live.next_measurement().unwrap()).collect();

    let estimator = Estimator::range_bearing(pedagogical_noise()).unwrap();
    let initial = Belief::isotropic(Vector2::new(3.0, 3.0), 1.0);

    let from_replay = estimator
        .run(initial, ReplaySource::new(recorded.clone()), 250)
        .unwrap();
    let from_sensor = estimator
        .run(
            initial,
            SimulatedSensor::new(
                RangeBearing::new(),
                truth,
                pedagogical_noise(),
                StdRng::seed_from_u64(5),
            )
            .unwrap(),
            250,
        )
        .unwrap();

    assert_eq!(from_replay.belief, from_sensor.belief);
}

/// Covariance trace never increases over a full run
#[test]
fn test_trace_non_increasing_over_run() {
    let mut reporter = DebugReporter::new();
    run_experiment_with_reporter(&ExperimentConfig::pedagogical().with_samples(500), &mut reporter)
        .unwrap();

    let traces = reporter.trace_history();
    assert_eq!(traces.len(), 500);
    assert!(traces[0] < 2.0);
    for (t, w) in traces.windows(2).enumerate() {
        assert!(w[1] <= w[0] + 1e-15, "trace grew at step {}", t + 1);
    }
    assert!(reporter.ill_conditioned_events().is_empty());
}

/// Running an experiment leaves its configuration (and ground truth) untouched
#[test]
fn test_config_unchanged_by_run() {
    let config = ExperimentConfig::pedagogical().with_samples(10);
    let before = config.clone();
    let _ = run_experiment(&config).unwrap();
    assert_eq!(config, before);
}

/// Degenerate initial estimate: abort by default, skip when configured
#[test]
fn test_degenerate_initial_estimate() {
    let config = ExperimentConfig::pedagogical()
        .with_samples(20)
        .with_initial_belief([0.0, 0.0], [[1.0, 0.0], [0.0, 1.0]]);
    let err = run_experiment(&config).unwrap_err();
    assert!(err.is_degenerate());

    let mut skipping = config.clone();
    skipping.estimator = EstimatorConfig::default().with_degenerate_policy(DegeneratePolicy::Skip);
    let report = run_experiment(&skipping).unwrap();
    assert_eq!(report.steps_skipped, 20);
    assert_eq!(report.final_mean, [0.0, 0.0]);
}

/// Degenerate inputs raise the documented error, never NaN
#[test]
fn test_degenerate_functions_never_nan() {
    assert!(range_bearing(&Vector2::zeros()).unwrap_err().is_degenerate());

    let estimator = Estimator::range_bearing(pedagogical_noise()).unwrap();
    let result = estimator.update(
        &Belief::isotropic(Vector2::zeros(), 1.0),
        &Vector2::new(1.8, 0.6),
    );
    assert!(matches!(
        result,
        Err(EstimationError::DegenerateState { .. })
    ));
}

/// Invalid noise covariance is rejected before any sampling
#[test]
fn test_invalid_noise_in_experiment() {
    let mut config = ExperimentConfig::pedagogical();
    config.noise_covariance = [[0.01, 0.0], [0.0, -0.1]];
    let err = run_experiment(&config).unwrap_err();
    assert!(matches!(err, EstimationError::InvalidCovariance { .. }));
}

/// A target sitting just across the ±π bearing cut still converges
#[test]
fn test_convergence_across_bearing_cut() {
    let config = ExperimentConfig::pedagogical()
        .with_samples(1000)
        .with_initial_belief([-3.0, 0.5], [[1.0, 0.0], [0.0, 1.0]]);
    let mut config = config;
    config.ground_truth = [-2.0, -0.05];
    config.noise_covariance = [[0.01, 0.0], [0.0, 0.001]];

    let report = run_experiment(&config).unwrap();
    assert!(
        report.final_error < 0.05,
        "final error {}",
        report.final_error
    );
}
