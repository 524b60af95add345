//! # Potential field planner
//!
//! The ball pulls the robot with a unit strength field, every obstacle within the influence
//! distance pushes it away with a strength growing quadratically as the gap closes. The robot is
//! sent a fixed step along the combined field.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::warn;
use nalgebra::{Point2, Vector2};
use serde::Deserialize;

use super::{NavError, ObstacleAvoidance};
use crate::loc::Pose;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PotFieldParams {
    /// Strength of the pull towards the ball
    pub attractive_gain: f64,

    /// Strength of the push from an obstacle in contact with the robot
    pub repulsive_gain: f64,

    /// Gap between robot and obstacle beyond which the obstacle has no effect.
    ///
    /// Units: meters
    pub influence_distance_m: f64,

    /// Distance along the field to the returned point.
    ///
    /// Units: meters
    pub step_m: f64,
}

#[derive(Debug, Clone)]
pub struct PotFieldNav {
    params: PotFieldParams,

    /// Sum of the obstacle and robot radii
    contact_dist_m: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for PotFieldParams {
    fn default() -> Self {
        Self {
            attractive_gain: 1.0,
            repulsive_gain: 2.0,
            influence_distance_m: 0.8,
            step_m: 1.0,
        }
    }
}

impl PotFieldParams {
    pub fn validate(&self) -> Result<(), NavError> {
        if !(self.influence_distance_m > 0.0) {
            return Err(NavError::InvalidParam("influence_distance_m must be positive"));
        }
        if !(self.step_m > 0.0) {
            return Err(NavError::InvalidParam("step_m must be positive"));
        }
        if self.attractive_gain < 0.0 || self.repulsive_gain < 0.0 {
            return Err(NavError::InvalidParam("field gains must not be negative"));
        }
        Ok(())
    }
}

impl PotFieldNav {
    pub fn new(
        params: &PotFieldParams,
        obstacle_radius_m: f64,
        robot_radius_m: f64,
    ) -> Result<Self, NavError> {
        params.validate()?;

        Ok(Self {
            params: params.clone(),
            contact_dist_m: obstacle_radius_m + robot_radius_m,
        })
    }

    /// The combined field at the given position.
    pub fn field(
        &self,
        position_m: &Point2<f64>,
        target_m: &Point2<f64>,
        obstacles_m: &[Point2<f64>],
    ) -> Vector2<f64> {
        let to_target = target_m - position_m;
        let mut field = match to_target.try_normalize(1e-9) {
            Some(u) => u * self.params.attractive_gain,
            None => Vector2::zeros(),
        };

        let influence = self.params.influence_distance_m;

        for obstacle in obstacles_m {
            let away = position_m - obstacle;
            let dist_m = away.norm();
            let gap_m = dist_m - self.contact_dist_m;

            if gap_m >= influence || dist_m < 1e-9 {
                continue;
            }

            let x = ((influence - gap_m) / influence).min(1.0);
            field += away / dist_m * self.params.repulsive_gain * x * x;
        }

        field
    }
}

impl ObstacleAvoidance for PotFieldNav {
    fn plan_next_target(
        &mut self,
        pose: &Pose,
        target_m: &Point2<f64>,
        obstacles_m: &[Point2<f64>],
    ) -> Point2<f64> {
        let field = self.field(&pose.position_m, target_m, obstacles_m);

        match field.try_normalize(1e-9) {
            Some(dir) => pose.position_m + dir * self.params.step_m,
            None => {
                warn!("Potential field is flat at the robot, holding position");
                pose.position_m
            }
        }
    }

    fn name(&self) -> &'static str {
        "PotField"
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn pot_field() -> PotFieldNav {
        PotFieldNav::new(&PotFieldParams::default(), 0.14, 0.14).unwrap()
    }

    #[test]
    fn test_far_obstacles_have_no_effect() {
        let mut nav = pot_field();
        let pose = Pose::new(1.0, 1.0, 2.0);
        let ball = Point2::new(4.0, 5.0);

        let next = nav.plan_next_target(&pose, &ball, &[Point2::new(-2.0, 1.0)]);

        assert!((next - Point2::new(1.6, 1.8)).norm() < 1e-9);
    }

    #[test]
    fn test_deflects_around_obstacle() {
        let mut nav = pot_field();
        let pose = Pose::new(0.0, 0.0, 0.0);
        let ball = Point2::new(3.0, 0.0);

        // Obstacle slightly left of the path pushes the robot right
        let next = nav.plan_next_target(&pose, &ball, &[Point2::new(0.5, 0.1)]);
        assert!(next.y < 0.0);
        assert!((pose.distance_to(&next) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_ball_on_robot_holds() {
        let mut nav = pot_field();
        let pose = Pose::new(0.5, 0.5, 0.0);

        let next = nav.plan_next_target(&pose, &Point2::new(0.5, 0.5), &[]);
        assert_eq!(next, pose.position_m);
    }
}
