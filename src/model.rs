//! Range/bearing measurement model and its analytic Jacobian
//!
//! The sensor observes a 2D position `x` (relative to the sensor) as
//!
//! ```text
//! h(x) = [ ‖x‖₂ , atan2(x₁, x₀) ]
//! ```
//!
//! with the bearing in `(-π, π]`. Both `h` and its Jacobian are undefined
//! when the state coincides with the sensor, and every entry point reports
//! [`EstimationError::DegenerateState`] there instead of returning NaN.

use nalgebra::{Matrix2, Vector2};

use crate::common::linalg::wrap_angle;
use crate::common::{EstimationError, Result};

/// Ranges at or below this are treated as the sensor position itself
pub const DEGENERATE_RANGE: f64 = 1e-12;

/// Measurement model seam used by the estimator.
///
/// The estimator only needs the prediction, its linearization, and a way to
/// subtract two measurements. Implementations must be pure: the Jacobian is
/// re-evaluated at every step because the linearization point moves.
pub trait MeasurementModel {
    /// Predicted measurement `h(x)`
    fn observe(&self, state: &Vector2<f64>) -> Result<Vector2<f64>>;

    /// Jacobian `∂h/∂x` evaluated at `state`
    fn jacobian(&self, state: &Vector2<f64>) -> Result<Matrix2<f64>>;

    /// Innovation `observed ⊖ predicted`
    fn residual(&self, observed: &Vector2<f64>, predicted: &Vector2<f64>) -> Vector2<f64> {
        observed - predicted
    }
}

/// Range and bearing to a single point, measured from `sensor_position`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeBearing {
    /// Where the sensor sits; the origin unless configured otherwise
    pub sensor_position: Vector2<f64>,
}

impl Default for RangeBearing {
    fn default() -> Self {
        Self::new()
    }
}

impl RangeBearing {
    /// Sensor at the origin
    pub fn new() -> Self {
        Self {
            sensor_position: Vector2::zeros(),
        }
    }

    /// Sensor at an arbitrary position
    pub fn at(sensor_position: Vector2<f64>) -> Self {
        Self { sensor_position }
    }

    fn relative(&self, state: &Vector2<f64>, context: &str) -> Result<(Vector2<f64>, f64)> {
        if !state.iter().all(|v| v.is_finite()) {
            return Err(EstimationError::non_finite(format!("{} input state", context)));
        }
        let d = state - self.sensor_position;
        let range = d.norm();
        if range <= DEGENERATE_RANGE {
            return Err(EstimationError::degenerate(format!(
                "{} at ({}, {})",
                context, state[0], state[1]
            )));
        }
        Ok((d, range))
    }
}

impl MeasurementModel for RangeBearing {
    fn observe(&self, state: &Vector2<f64>) -> Result<Vector2<f64>> {
        let (d, range) = self.relative(state, "measurement model")?;
        // atan2(-0.0, x<0) is -π; wrap maps it onto +π
        let bearing = wrap_angle(d[1].atan2(d[0]));
        Ok(Vector2::new(range, bearing))
    }

    fn jacobian(&self, state: &Vector2<f64>) -> Result<Matrix2<f64>> {
        let (d, range) = self.relative(state, "jacobian")?;
        let range_sq = range * range;

        // Bearing row: h₁ = atan2(x₁, x₀), so ∂/∂x₀ = -x₁/ρ² and ∂/∂x₁ = x₀/ρ²
        #[rustfmt::skip]
        let h = Matrix2::new(
            d[0] / range,      d[1] / range,
            -d[1] / range_sq,  d[0] / range_sq,
        );
        Ok(h)
    }

    fn residual(&self, observed: &Vector2<f64>, predicted: &Vector2<f64>) -> Vector2<f64> {
        Vector2::new(
            observed[0] - predicted[0],
            wrap_angle(observed[1] - predicted[1]),
        )
    }
}

/// `h(x)` for a sensor at the origin
pub fn range_bearing(state: &Vector2<f64>) -> Result<Vector2<f64>> {
    RangeBearing::new().observe(state)
}

/// Jacobian of [`range_bearing`] at `state`
pub fn range_bearing_jacobian(state: &Vector2<f64>) -> Result<Matrix2<f64>> {
    RangeBearing::new().jacobian(state)
}
