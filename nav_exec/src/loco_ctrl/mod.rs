//! # Locomotion control module
//!
//! The robot is a differential drive, two parallel wheels separated by the track width. This
//! module owns the wheel-level view of the robot: the [`WheelCommand`] produced by trajectory
//! control, the saturation applied to it, and the forward kinematics which turn a command into
//! motion.
//!
//! The kinematics are used both to integrate the simulated robot and by planners which predict
//! future poses, so there is only one implementation of them, in [`kinematics`].

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod cmd;
pub mod kinematics;
mod params;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use cmd::*;
pub use kinematics::{integrate, MotionRegime, KINEMATIC_REGIME_RESOLUTION};
pub use params::*;
