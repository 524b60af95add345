//! Trajectory control parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for trajectory control
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Params {
    /// Distance gain
    pub k_rho: f64,

    /// Line of sight angle gain
    pub k_alpha: f64,

    /// Final heading angle gain
    pub k_beta: f64,

    /// When the target is the ball and it is closer than this distance the
    /// robot is hunting it and the wheel speeds are boosted.
    ///
    /// Units: meters
    pub hunt_distance_m: f64,

    /// Factor applied to both wheel speeds while hunting.
    pub hunt_velocity_boost: f64,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            k_rho: 0.5,
            k_alpha: 5.0,
            k_beta: 1.0,
            hunt_distance_m: 0.6,
            hunt_velocity_boost: 1.5,
        }
    }
}
