//! # Simulation
//!
//! A single robot chases a ball around a rectangular field of moving obstacles. The
//! [`SimLoop`] runs the fixed timestep sense, plan, act cycle until the robot reaches the ball,
//! hits an obstacle, runs out of time or is told to stop.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

pub mod scene;
mod sim_loop;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use crate::{loc::Pose, nav::NavError, per::PerError};
use util::archive::ArchiveError;

pub use scene::{Field, MovingObstacle, Scene};
pub use sim_loop::{SimLoop, TickRecord};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters for the simulation.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Params {
    // ---- TIMING ----
    /// Length of one tick.
    ///
    /// Units: seconds
    pub tick_period_s: f64,

    /// The simulation ends after this many ticks.
    pub max_ticks: u64,

    /// The planner runs every this many ticks, in between the controller continues towards the
    /// last plan.
    pub plan_period_ticks: u64,

    // ---- FIELD ----
    /// Field corners as `[x_min, y_min, x_max, y_max]`.
    ///
    /// Units: meters
    pub field_corners_m: [f64; 4],

    /// Gap between robot and obstacle which counts as a collision.
    ///
    /// Units: meters
    pub collision_epsilon_m: f64,

    // ---- ROBOT ----
    /// Initial pose as `[x, y, heading]`.
    ///
    /// Units: meters, radians
    pub robot_start: [f64; 3],

    /// Units: meters
    pub robot_radius_m: f64,

    // ---- BALL ----
    /// Units: meters
    pub ball_radius_m: f64,

    /// Fixed starting position for the ball, if not given the ball is placed randomly near the
    /// centre of the field.
    ///
    /// Units: meters
    pub ball_start_m: Option<[f64; 2]>,

    /// Maximum offset of a randomly placed ball from the field centre along each axis.
    ///
    /// Units: meters
    pub ball_spread_m: [f64; 2],

    /// Maximum speed along each axis of the ball.
    ///
    /// Units: meters/second
    pub ball_speed_range_ms: f64,

    // ---- OBSTACLES ----
    /// Units: meters
    pub obstacle_radius_m: f64,

    /// Obstacles placed explicitly as `[x, y, vx, vy]`.
    ///
    /// Units: meters, meters/second
    pub obstacles: Vec<[f64; 4]>,

    /// Number of extra obstacles placed randomly.
    pub num_random_obstacles: usize,

    /// Maximum speed along each axis of a random obstacle.
    ///
    /// Units: meters/second
    pub obstacle_speed_range_ms: f64,

    /// Seed for the random scene.
    pub seed: u64,
}

/// Summary of a finished run.
#[derive(Debug, Clone, Serialize)]
pub struct SimResult {
    pub outcome: Outcome,

    pub planner: String,

    pub num_ticks: u64,

    /// Units: seconds
    pub sim_time_s: f64,

    pub final_pose: Pose,

    /// Smallest gap between robot and any obstacle over the run.
    ///
    /// Units: meters
    pub min_clearance_m: Option<f64>,

    /// Number of ticks on which the ball was not seen
    pub num_ball_dropouts: u64,

    /// Number of plans which had to ignore dangerous sectors
    pub num_danger_fallbacks: u64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Outcome {
    /// The robot touched an obstacle
    Collision,

    /// The robot touched the ball
    TargetReached,

    /// Ran out of ticks
    TickLimit,

    /// Stopped from outside
    Stopped,
}

#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("Invalid simulation parameter: {0}")]
    InvalidParam(&'static str),

    #[error("Could not create the planner: {0}")]
    NavError(#[from] NavError),

    #[error("Could not create the detector: {0}")]
    PerError(#[from] PerError),

    #[error("Archive error: {0}")]
    ArchiveError(#[from] ArchiveError),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            tick_period_s: 0.1,
            max_ticks: 2000,
            plan_period_ticks: 1,
            field_corners_m: [-4.0, -2.5, 4.0, 2.5],
            collision_epsilon_m: 0.001,
            robot_start: [-3.86, -2.36, 0.0],
            robot_radius_m: 0.14,
            ball_radius_m: 0.14,
            ball_start_m: None,
            ball_spread_m: [1.0, 2.0],
            ball_speed_range_ms: 0.1,
            obstacle_radius_m: 0.14,
            obstacles: Vec::new(),
            num_random_obstacles: 2,
            obstacle_speed_range_ms: 0.1,
            seed: 239,
        }
    }
}

impl Params {
    pub fn validate(&self) -> Result<(), SimError> {
        if !(self.tick_period_s > 0.0) {
            return Err(SimError::InvalidParam("tick_period_s must be positive"));
        }
        if self.plan_period_ticks == 0 {
            return Err(SimError::InvalidParam("plan_period_ticks must be at least 1"));
        }

        let [x_min, y_min, x_max, y_max] = self.field_corners_m;
        if !(x_max > x_min && y_max > y_min) {
            return Err(SimError::InvalidParam("field corners must describe a non-empty field"));
        }

        if !(self.robot_radius_m > 0.0 && self.ball_radius_m > 0.0 && self.obstacle_radius_m > 0.0)
        {
            return Err(SimError::InvalidParam("radii must be positive"));
        }
        if self.ball_speed_range_ms < 0.0 || self.obstacle_speed_range_ms < 0.0 {
            return Err(SimError::InvalidParam("speed ranges must not be negative"));
        }
        if self.ball_spread_m.iter().any(|s| *s < 0.0) {
            return Err(SimError::InvalidParam("ball_spread_m must not be negative"));
        }

        Ok(())
    }

    pub fn robot_start_pose(&self) -> Pose {
        Pose::new(self.robot_start[0], self.robot_start[1], self.robot_start[2])
    }
}
