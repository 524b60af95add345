//! # Dynamic window planner
//!
//! Tries a small set of wheel speed changes around the last chosen speeds, predicts where each
//! would take the robot using the locomotion kinematics, and scores each by how much closer it
//! gets to the ball minus a penalty for ending up near an obstacle.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::trace;
use nalgebra::Point2;
use serde::Deserialize;

use super::{NavError, ObstacleAvoidance};
use crate::{
    loc::Pose,
    loco_ctrl::{self, integrate, WheelCommand},
};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Multiples of the per-cycle speed change tried on each wheel.
const SPEED_STEPS: [f64; 7] = [-5.0, -3.0, -1.0, 0.0, 1.0, 3.0, 5.0];

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DwaParams {
    /// Weight on the reduction in distance to the ball
    pub forward_weight: f64,

    /// Weight on the obstacle clearance penalty
    pub obstacle_weight: f64,

    /// Prediction horizon as a multiple of the control period
    pub lookahead_factor: f64,

    /// Clearance below this multiple of the track width is penalised
    pub clearance_factor: f64,
}

#[derive(Debug, Clone)]
pub struct DwaNav {
    params: DwaParams,

    loco_params: loco_ctrl::Params,

    /// Sum of the obstacle and robot radii
    contact_dist_m: f64,

    tick_period_s: f64,

    /// Speeds chosen on the last cycle
    last_cmd: WheelCommand,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for DwaParams {
    fn default() -> Self {
        Self {
            forward_weight: 15.0,
            obstacle_weight: 10000.0,
            lookahead_factor: 10.0,
            clearance_factor: 1.5,
        }
    }
}

impl DwaParams {
    pub fn validate(&self) -> Result<(), NavError> {
        if !(self.lookahead_factor > 0.0) {
            return Err(NavError::InvalidParam("lookahead_factor must be positive"));
        }
        if self.forward_weight < 0.0 || self.obstacle_weight < 0.0 || self.clearance_factor < 0.0
        {
            return Err(NavError::InvalidParam("DWA weights must not be negative"));
        }
        Ok(())
    }
}

impl DwaNav {
    pub fn new(
        params: &DwaParams,
        loco_params: &loco_ctrl::Params,
        obstacle_radius_m: f64,
        robot_radius_m: f64,
        tick_period_s: f64,
    ) -> Result<Self, NavError> {
        params.validate()?;

        if !(tick_period_s > 0.0) {
            return Err(NavError::InvalidParam("tick period must be positive"));
        }

        Ok(Self {
            params: params.clone(),
            loco_params: loco_params.clone(),
            contact_dist_m: obstacle_radius_m + robot_radius_m,
            tick_period_s,
            last_cmd: WheelCommand::stop(),
        })
    }

    /// Wheel speeds of the action chosen on the last cycle.
    pub fn last_command(&self) -> WheelCommand {
        self.last_cmd
    }

    /// Distance between the robot's edge and the nearest obstacle's edge.
    fn clearance_m(&self, position_m: &Point2<f64>, obstacles_m: &[Point2<f64>]) -> f64 {
        obstacles_m
            .iter()
            .map(|o| nalgebra::distance(o, position_m) - self.contact_dist_m)
            .fold(std::f64::INFINITY, f64::min)
    }

    fn score(
        &self,
        predicted: &Pose,
        start_dist_m: f64,
        target_m: &Point2<f64>,
        obstacles_m: &[Point2<f64>],
    ) -> f64 {
        let progress_m = start_dist_m - predicted.distance_to(target_m);

        let clearance_m = self.clearance_m(&predicted.position_m, obstacles_m);
        let min_clearance_m = self.params.clearance_factor * self.loco_params.track_width_m;
        let penalty = match clearance_m < min_clearance_m {
            true => self.params.obstacle_weight * (min_clearance_m - clearance_m),
            false => 0.0,
        };

        self.params.forward_weight * progress_m - penalty
    }
}

impl ObstacleAvoidance for DwaNav {
    fn plan_next_target(
        &mut self,
        pose: &Pose,
        target_m: &Point2<f64>,
        obstacles_m: &[Point2<f64>],
    ) -> Point2<f64> {
        let delta_ms = self.loco_params.max_wheel_accel_mss * self.tick_period_s;
        let horizon_s = self.params.lookahead_factor * self.tick_period_s;
        let max_ms = self.loco_params.max_wheel_speed_ms;
        let start_dist_m = pose.distance_to(target_m);

        let mut best: Option<(f64, WheelCommand, Pose)> = None;

        for l_step in SPEED_STEPS.iter() {
            for r_step in SPEED_STEPS.iter() {
                let cmd = WheelCommand::new(
                    self.last_cmd.left_ms + l_step * delta_ms,
                    self.last_cmd.right_ms + r_step * delta_ms,
                );

                if cmd.max_abs_ms() > max_ms {
                    continue;
                }

                let predicted = integrate(&cmd, pose, horizon_s, self.loco_params.track_width_m);

                // Rounded so that near-equal scores keep the earlier action
                let score = self.score(&predicted, start_dist_m, target_m, obstacles_m);
                let score = (score * 1e3).round() / 1e3;

                match best {
                    Some((best_score, _, _)) if score <= best_score => (),
                    _ => best = Some((score, cmd, predicted)),
                }
            }
        }

        match best {
            Some((score, cmd, predicted)) => {
                trace!(
                    "DWA chose ({:.3}, {:.3}) m/s scoring {:.3}",
                    cmd.left_ms,
                    cmd.right_ms,
                    score
                );
                self.last_cmd = cmd;
                predicted.position_m
            }
            // Only happens if the last speeds were outside the limits, so start again from rest
            None => {
                self.last_cmd = WheelCommand::stop();
                pose.position_m
            }
        }
    }

    fn name(&self) -> &'static str {
        "Dwa"
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn dwa() -> DwaNav {
        DwaNav::new(
            &DwaParams::default(),
            &loco_ctrl::Params::default(),
            0.14,
            0.14,
            0.1,
        )
        .unwrap()
    }

    #[test]
    fn test_accelerates_towards_clear_ball() {
        let mut nav = dwa();
        let pose = Pose::new(0.0, 0.0, 0.0);
        let ball = Point2::new(3.0, 0.0);

        let first = nav.plan_next_target(&pose, &ball, &[]);
        let first_cmd = nav.last_command();
        assert!((first_cmd.left_ms - 0.25).abs() < 1e-9);
        assert!((first_cmd.right_ms - 0.25).abs() < 1e-9);
        assert!((first.x - 0.25).abs() < 1e-9);

        // Keeps speeding up but never past the limit
        for _ in 0..10 {
            nav.plan_next_target(&pose, &ball, &[]);
            assert!(nav.last_command().max_abs_ms() <= 1.0 + 1e-9);
        }
        assert!((nav.last_command().left_ms - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_avoids_obstacle_ahead() {
        let mut nav = dwa();
        let pose = Pose::new(0.0, 0.0, 0.0);
        let ball = Point2::new(3.0, 0.0);
        let obstacle = Point2::new(0.6, 0.0);

        let next = nav.plan_next_target(&pose, &ball, &[obstacle]);

        assert!(nalgebra::distance(&next, &obstacle) >= 0.6);
    }
}
