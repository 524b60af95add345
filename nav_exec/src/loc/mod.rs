//! # Localisation module
//!
//! The robot is localised perfectly in simulation, so this module only
//! provides the pose type shared by every other module.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};
use util::maths::norm_angle;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The current pose (position and heading in the world frame) of the robot.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    /// The position in the world frame
    pub position_m: Point2<f64>,

    /// Heading (angle to the positive world X axis), always in (-pi, pi]
    pub heading_rad: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Pose {
    fn default() -> Self {
        Self {
            position_m: Point2::origin(),
            heading_rad: 0.0,
        }
    }
}

impl Pose {
    /// Create a new pose, normalising the heading.
    pub fn new(x_m: f64, y_m: f64, heading_rad: f64) -> Self {
        Self {
            position_m: Point2::new(x_m, y_m),
            heading_rad: norm_angle(heading_rad),
        }
    }

    pub fn x(&self) -> f64 {
        self.position_m.x
    }

    pub fn y(&self) -> f64 {
        self.position_m.y
    }

    /// Unit vector pointing along the robot's heading.
    pub fn forward(&self) -> Vector2<f64> {
        Vector2::new(self.heading_rad.cos(), self.heading_rad.sin())
    }

    /// Distance from the robot's centre to the given point.
    pub fn distance_to(&self, point_m: &Point2<f64>) -> f64 {
        nalgebra::distance(&self.position_m, point_m)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_pose_heading_normalised() {
        let pose = Pose::new(1.0, 2.0, 3.0 * PI);
        assert!((pose.heading_rad - PI).abs() < 1e-9);

        let pose = Pose::new(0.0, 0.0, -PI / 2.0 - 2.0 * PI);
        assert!((pose.heading_rad + PI / 2.0).abs() < 1e-9);
        assert!((pose.forward() - Vector2::new(0.0, -1.0)).norm() < 1e-9);

        assert!((pose.distance_to(&Point2::new(3.0, 4.0)) - 5.0).abs() < 1e-12);
    }
}
