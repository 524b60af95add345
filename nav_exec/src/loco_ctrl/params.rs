//! Parameters structure for LocoCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for Locomotion control.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Params {
    // ---- GEOMETRY ----
    /// The radius of the robot's wheels.
    ///
    /// Units: meters.
    pub wheel_radius_m: f64,

    /// Distance between the two wheels.
    ///
    /// Units: meters.
    pub track_width_m: f64,

    // ---- CAPABILITIES ----
    /// Maximum absolute linear speed of either wheel.
    ///
    /// Units: meters/second
    pub max_wheel_speed_ms: f64,

    /// Maximum wheel acceleration, used by planners exploring reachable
    /// speeds.
    ///
    /// Units: meters/second^2
    pub max_wheel_accel_mss: f64,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            wheel_radius_m: 0.04,
            track_width_m: 0.28,
            max_wheel_speed_ms: 1.0,
            max_wheel_accel_mss: 0.5,
        }
    }
}

impl Params {
    /// Half of the track width, the lever arm of each wheel about the centre.
    pub fn half_track_m(&self) -> f64 {
        self.track_width_m / 2.0
    }
}
