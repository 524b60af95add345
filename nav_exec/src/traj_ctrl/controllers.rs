//! # Trajectory controllers module
//!
//! This module provides the polar pose regulation controller used by TrajCtrl, including its
//! error calculations.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;
use nalgebra::Point2;
use serde::Serialize;
use util::maths::norm_angle;

// Internal
use crate::{loc::Pose, loco_ctrl::{self, WheelCommand}};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Targets closer than this to the ball are the ball itself.
///
/// Units: meters
const TARGET_IS_BALL_TOL_M: f64 = 1e-6;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Error between the robot and its target in polar coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PolarError {
    /// Distance to the target
    pub rho_m: f64,

    /// Angle from the robot's heading to the line of sight
    pub alpha_rad: f64,

    /// Negated angle of the line of sight to the world X axis
    pub beta_rad: f64,
}

/// The pose regulation controller.
#[derive(Debug, Clone)]
pub struct PoseRegulator {
    params: super::Params,

    loco_params: loco_ctrl::Params,

    /// Error at the last time the demand was calculated
    error: Option<PolarError>,

    /// True if the last target was the ball
    target_is_ball: bool,
}

/// The status report containing the controller's monitoring quantities.
#[derive(Debug, Default, Copy, Clone, Serialize)]
pub struct StatusReport {
    /// The error used for this demand
    pub error: PolarError,

    /// Body speed demand
    pub speed_dem_ms: f64,

    /// Turn rate demand
    pub turn_rate_dem_rads: f64,

    /// True if the hunt boost was applied
    pub hunting: bool,

    /// True if the command was scaled down to the maximum wheel speed
    pub saturated: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PolarError {
    /// Calculate the error of the target point relative to the pose.
    pub fn new(pose: &Pose, target_m: &Point2<f64>) -> Self {
        let d = target_m - pose.position_m;

        let alpha_rad = norm_angle(-pose.heading_rad + d.y.atan2(d.x));

        Self {
            rho_m: d.norm(),
            alpha_rad,
            beta_rad: norm_angle(-pose.heading_rad - alpha_rad),
        }
    }

    /// Propagate the error forward by `dt_s` under the closed loop control law.
    ///
    /// This is a forward Euler step of
    ///
    /// ```text
    /// rho'   = -k_rho * rho * cos(alpha)
    /// alpha' =  k_rho * sin(alpha) - k_alpha * alpha - k_beta * beta
    /// beta'  = -k_rho * sin(alpha)
    /// ```
    pub fn propagate(&self, dt_s: f64, params: &super::Params) -> Self {
        let rho_rate = -params.k_rho * self.rho_m * self.alpha_rad.cos();
        let alpha_rate = params.k_rho * self.alpha_rad.sin()
            - params.k_alpha * self.alpha_rad
            - params.k_beta * self.beta_rad;
        let beta_rate = -params.k_rho * self.alpha_rad.sin();

        Self {
            rho_m: self.rho_m + rho_rate * dt_s,
            alpha_rad: self.alpha_rad + alpha_rate * dt_s,
            beta_rad: self.beta_rad + beta_rate * dt_s,
        }
    }
}

impl PoseRegulator {
    /// Create a new instance of the controller from the parameters
    pub fn new(params: &super::Params, loco_params: &loco_ctrl::Params) -> Self {
        Self {
            params: params.clone(),
            loco_params: loco_params.clone(),
            error: None,
            target_is_ball: false,
        }
    }

    /// The error used for the last demand, if any has been calculated.
    pub fn last_error(&self) -> Option<PolarError> {
        self.error
    }

    /// Calculate the wheel demand that moves the robot towards the target point.
    ///
    /// The robot is hunting when the target is the ball and the ball is within the hunt
    /// distance. Intermediate targets from a planner are never hunted.
    pub fn compute_wheel_velocities(
        &mut self,
        pose: &Pose,
        target_m: &Point2<f64>,
        ball_m: Option<&Point2<f64>>,
    ) -> (WheelCommand, StatusReport) {
        let error = PolarError::new(pose, target_m);
        self.target_is_ball = ball_m
            .map(|b| (target_m - b).norm() < TARGET_IS_BALL_TOL_M)
            .unwrap_or(false);
        let hunting = self.is_hunting(pose, ball_m);

        self.demand_from_error(error, hunting)
    }

    /// Calculate the wheel demand without a new target, by propagating the
    /// previous error forward in time.
    ///
    /// Used when planning runs slower than control. If there is no previous
    /// error the robot is stopped.
    pub fn compute_wheel_velocities_again(
        &mut self,
        pose: &Pose,
        ball_m: Option<&Point2<f64>>,
        dt_s: f64,
    ) -> (WheelCommand, StatusReport) {
        let error = match self.error {
            Some(e) => e.propagate(dt_s, &self.params),
            None => return (WheelCommand::stop(), StatusReport::default()),
        };
        let hunting = self.is_hunting(pose, ball_m);

        self.demand_from_error(error, hunting)
    }

    fn is_hunting(&self, pose: &Pose, ball_m: Option<&Point2<f64>>) -> bool {
        self.target_is_ball
            && ball_m
                .map(|b| pose.distance_to(b) < self.params.hunt_distance_m)
                .unwrap_or(false)
    }

    fn demand_from_error(&mut self, error: PolarError, hunting: bool) -> (WheelCommand, StatusReport) {
        self.error = Some(error);

        let speed_dem_ms = self.params.k_rho * error.rho_m;
        let turn_rate_dem_rads =
            self.params.k_alpha * error.alpha_rad + self.params.k_beta * error.beta_rad;

        let mut cmd = WheelCommand::from_body_rates(speed_dem_ms, turn_rate_dem_rads, &self.loco_params);

        if hunting {
            cmd = cmd.scaled(self.params.hunt_velocity_boost);
        }

        // Saturation is always the last thing applied
        let sat = cmd.saturated(self.loco_params.max_wheel_speed_ms);

        trace!(
            "PoseRegulator: rho {:.3} alpha {:.3} beta {:.3} -> ({:.3}, {:.3})",
            error.rho_m,
            error.alpha_rad,
            error.beta_rad,
            sat.left_ms,
            sat.right_ms
        );

        (
            sat,
            StatusReport {
                error,
                speed_dem_ms,
                turn_rate_dem_rads,
                hunting,
                saturated: sat != cmd,
            },
        )
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::{loco_ctrl::integrate, traj_ctrl::Params};
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_polar_error() {
        let pose = Pose::new(0.0, 0.0, FRAC_PI_2);
        let err = PolarError::new(&pose, &Point2::new(1.0, 1.0));

        assert!((err.rho_m - 2f64.sqrt()).abs() < 1e-12);
        assert!((err.alpha_rad + std::f64::consts::FRAC_PI_4).abs() < 1e-12);
        assert!((err.beta_rad + std::f64::consts::FRAC_PI_4).abs() < 1e-12);
    }

    #[test]
    fn test_turns_towards_target() {
        let mut ctrl = PoseRegulator::new(&Params::default(), &loco_ctrl::Params::default());
        let pose = Pose::new(0.0, 0.0, 0.0);

        // Target up and to the left, right wheel faster
        let (cmd, report) = ctrl.compute_wheel_velocities(&pose, &Point2::new(0.5, 0.5), None);
        assert!(cmd.right_ms > cmd.left_ms);
        assert!(!report.hunting);
        assert!(cmd.max_abs_ms() <= 1.0 + 1e-12);
    }

    #[test]
    fn test_hunt_and_saturation() {
        let loco = loco_ctrl::Params::default();
        let params = Params {
            k_rho: 3.0,
            ..Params::default()
        };
        let mut ctrl = PoseRegulator::new(&params, &loco);
        let pose = Pose::new(0.0, 0.0, 0.0);

        // Far target, straight ahead, unboosted speed 3 m/s saturates to the limit
        let (cmd, report) = ctrl.compute_wheel_velocities(&pose, &Point2::new(1.0, 0.0), None);
        assert!(report.saturated);
        assert!((cmd.left_ms - loco.max_wheel_speed_ms).abs() < 1e-9);
        assert!((cmd.right_ms - loco.max_wheel_speed_ms).abs() < 1e-9);

        // Slow approach to a ball right next to the robot is boosted
        let params = Params::default();
        let mut ctrl = PoseRegulator::new(&params, &loco);
        let ball = Point2::new(0.3, 0.0);
        let (plain, _) = ctrl.compute_wheel_velocities(&pose, &ball, None);
        let (boosted, report) = ctrl.compute_wheel_velocities(&pose, &ball, Some(&ball));
        assert!(report.hunting);
        assert!((boosted.left_ms - plain.left_ms * params.hunt_velocity_boost).abs() < 1e-9);
    }

    #[test]
    fn test_only_hunts_the_ball() {
        let loco = loco_ctrl::Params::default();
        let params = Params::default();
        let mut ctrl = PoseRegulator::new(&params, &loco);
        let pose = Pose::new(0.0, 0.0, 0.0);
        let ball = Point2::new(0.3, 0.0);

        // A planner target next to a close ball is not hunted
        let (_, report) =
            ctrl.compute_wheel_velocities(&pose, &Point2::new(0.3, 0.1), Some(&ball));
        assert!(!report.hunting);

        let (_, report) = ctrl.compute_wheel_velocities_again(&pose, Some(&ball), 0.1);
        assert!(!report.hunting);

        // Once the ball is the target the incremental demand keeps hunting it
        let (_, report) = ctrl.compute_wheel_velocities(&pose, &ball, Some(&ball));
        assert!(report.hunting);
        let (_, report) = ctrl.compute_wheel_velocities_again(&pose, Some(&ball), 0.1);
        assert!(report.hunting);

        // But not once the ball is out of range
        let far_ball = Point2::new(2.0, 0.0);
        let (_, report) = ctrl.compute_wheel_velocities(&pose, &far_ball, Some(&far_ball));
        assert!(!report.hunting);
    }

    #[test]
    fn test_incremental_matches_recomputed() {
        let loco = loco_ctrl::Params::default();
        let params = Params {
            k_rho: 0.3,
            k_alpha: 0.8,
            k_beta: -0.15,
            ..Params::default()
        };
        let mut ctrl = PoseRegulator::new(&params, &loco);

        let target = Point2::new(1.0, 0.5);
        let mut pose = Pose::new(0.0, 0.0, 0.2);
        let dt = 0.01;

        let (mut cmd, report) = ctrl.compute_wheel_velocities(&pose, &target, None);
        assert!(!report.saturated);

        for _ in 0..50 {
            pose = integrate(&cmd, &pose, dt, loco.track_width_m);

            let (next_cmd, report) = ctrl.compute_wheel_velocities_again(&pose, None, dt);
            let recomputed = PolarError::new(&pose, &target);

            assert!((report.error.rho_m - recomputed.rho_m).abs() < 5e-3);
            assert!((report.error.alpha_rad - recomputed.alpha_rad).abs() < 5e-3);
            assert!((report.error.beta_rad - recomputed.beta_rad).abs() < 5e-3);

            cmd = next_cmd;
        }
    }

    #[test]
    fn test_incremental_without_history_stops() {
        let mut ctrl = PoseRegulator::new(&Params::default(), &loco_ctrl::Params::default());
        let (cmd, _) = ctrl.compute_wheel_velocities_again(&Pose::default(), None, 0.1);
        assert_eq!(cmd, WheelCommand::stop());
    }
}
