//! # Trajectory control module
//!
//! Trajectory control drives the robot onto the target point chosen by the navigation planner.
//! It uses the classical polar-coordinate pose regulation law for a unicycle.
//!
//! The error between the robot and the target is expressed as three quantities:
//!
//! - `rho` - the distance to the target,
//! - `alpha` - the angle between the robot's heading and the line of sight to the target,
//! - `beta` - the angle between the line of sight and the world X axis (negated), which is the
//!   heading the robot should finish with.
//!
//! The body speed demand is `k_rho * rho` and the turn rate demand is
//! `k_alpha * alpha + k_beta * beta`. The law is stable for `k_rho > 0`, `k_beta < 0` and
//! `k_alpha - k_rho > 0`; other gains can oscillate or diverge when regulating onto a fixed
//! point, though they work when the target keeps moving ahead of the robot as it does under the
//! planners.
//!
//! These demands are converted into wheel speeds, boosted when hunting the ball at close range,
//! and finally saturated by [`WheelCommand::saturated`](crate::loco_ctrl::WheelCommand).

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod controllers;
pub mod params;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use controllers::*;
pub use params::Params;
