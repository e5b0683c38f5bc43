/*!
# rangebearing-filter - Recursive range/bearing position estimation

Estimates a fixed 2D position from a stream of noisy range/bearing
observations using an information-form Bayesian update under local
linearization of the measurement model.

## Modules

- [`model`] - Range/bearing measurement model and its analytic Jacobian
- [`estimator`] - Information update, run loop, configuration
- [`sources`] - Measurement sources (simulated sensor, replay)
- [`experiment`] - Experiment driver, error curves, Monte Carlo averaging
- [`reporter`] - Observability hooks for the run loop
- [`planning`] - Rejection sampling of free space around polygon obstacles
- [`common`] - Errors and linear algebra helpers

## Example

```rust
use nalgebra::{Matrix2, Vector2};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rangebearing_filter::{Belief, Estimator, RangeBearing, SimulatedSensor};

let noise = Matrix2::new(0.01, 0.0, 0.0, 1.0f64.to_radians());
let truth = Vector2::new(1.5, 1.0);

let estimator = Estimator::range_bearing(noise).unwrap();
let sensor = SimulatedSensor::new(RangeBearing::new(), truth, noise, StdRng::seed_from_u64(42)).unwrap();

let initial = Belief::isotropic(Vector2::new(3.0, 3.0), 1.0);
let outcome = estimator.run(initial, sensor, 1000).unwrap();
assert!(outcome.belief.error_to(&truth) < 0.05);
```
*/

pub mod common;
pub mod estimator;
pub mod experiment;
pub mod model;
pub mod planning;
pub mod reporter;
pub mod sources;

// Errors
pub use common::{EstimationError, Result};

// Core types
pub use estimator::{
    Belief, DegeneratePolicy, Estimator, EstimatorConfig, RunOutcome, StepDiagnostics,
};
pub use model::{range_bearing, range_bearing_jacobian, MeasurementModel, RangeBearing};

// Sources
pub use sources::{MeasurementSource, ReplaySource, SimulatedSensor};

// Reporters
pub use reporter::{CompositeReporter, DebugReporter, LoggingReporter, NoOpReporter, StepReporter};

// Experiments
pub use experiment::{
    monte_carlo_error_curve, run_experiment, run_experiment_with_reporter, ErrorPoint,
    ExperimentConfig, ExperimentReport, MonteCarloCurve,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
