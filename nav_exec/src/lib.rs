//! # Navigation library.
//!
//! Local motion planning for a differential-drive robot chasing a ball through a field of
//! moving obstacles. This library allows the executable and benchmarks to access items defined
//! inside the navigation crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Geometry primitives - lines, footprint squares and frame transforms
pub mod geom;

/// Localisation module - the robot's pose
pub mod loc;

/// Locomotion control module - differential drive kinematics and wheel commands
pub mod loco_ctrl;

/// Trajectory control module - drives the robot onto the planner's target point
pub mod traj_ctrl;

/// Navigation module - local obstacle avoidance planners
pub mod nav;

/// Perception module - converts the scene into obstacle observations
pub mod per;

/// Simulation module - the scene and the sense/plan/act loop
pub mod sim;

/// Parameters for the whole executable
pub mod params;
