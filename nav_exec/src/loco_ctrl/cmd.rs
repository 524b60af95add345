//! Commands passed into LocoCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::trace;
use serde::Serialize;
use util::maths::scale_to_limit;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Linear speed demand for each wheel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct WheelCommand {
    /// Left wheel speed
    ///
    /// Units: meters/second
    pub left_ms: f64,

    /// Right wheel speed
    ///
    /// Units: meters/second
    pub right_ms: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl WheelCommand {
    pub fn new(left_ms: f64, right_ms: f64) -> Self {
        Self { left_ms, right_ms }
    }

    pub fn stop() -> Self {
        Self::default()
    }

    /// Build the command from a body speed and turn rate, using the standard
    /// differential drive inverse kinematics.
    ///
    /// Each wheel's rate is `(v -/+ omega * W/2) / r`, and its linear speed is
    /// that rate times the wheel radius.
    pub fn from_body_rates(speed_ms: f64, turn_rate_rads: f64, params: &super::Params) -> Self {
        let left_rads = (speed_ms - turn_rate_rads * params.half_track_m()) / params.wheel_radius_m;
        let right_rads = (speed_ms + turn_rate_rads * params.half_track_m()) / params.wheel_radius_m;

        Self {
            left_ms: left_rads * params.wheel_radius_m,
            right_ms: right_rads * params.wheel_radius_m,
        }
    }

    /// Body speed and turn rate produced by this command.
    pub fn body_rates(&self, params: &super::Params) -> (f64, f64) {
        (
            (self.left_ms + self.right_ms) / 2.0,
            (self.right_ms - self.left_ms) / params.track_width_m,
        )
    }

    /// Wheel angular rates (left, right).
    ///
    /// Units: radians/second
    pub fn wheel_rates_rads(&self, params: &super::Params) -> (f64, f64) {
        (
            self.left_ms / params.wheel_radius_m,
            self.right_ms / params.wheel_radius_m,
        )
    }

    /// Multiply both wheel speeds by the same factor.
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            left_ms: self.left_ms * factor,
            right_ms: self.right_ms * factor,
        }
    }

    /// Limit the command to the maximum wheel speed.
    ///
    /// If either wheel is too fast both are scaled down by the same factor, so
    /// the ratio between them (and therefore the curvature of the motion) is
    /// kept. Clamping each wheel on its own would change the direction of
    /// travel.
    pub fn saturated(&self, max_wheel_speed_ms: f64) -> Self {
        let (left_ms, right_ms, factor) =
            scale_to_limit(self.left_ms, self.right_ms, max_wheel_speed_ms);

        if factor < 1.0 {
            trace!(
                "Wheel command ({:.3}, {:.3}) saturated by {:.3}",
                self.left_ms,
                self.right_ms,
                factor
            );
        }

        Self { left_ms, right_ms }
    }

    /// The largest absolute wheel speed.
    pub fn max_abs_ms(&self) -> f64 {
        self.left_ms.abs().max(self.right_ms.abs())
    }
}
