//! Differential drive forward kinematics

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;

use super::WheelCommand;
use crate::loc::Pose;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Resolution at which wheel speeds are compared when choosing the motion regime.
///
/// Speeds which round to the same multiple of this are treated as exactly equal, which keeps the
/// turning radius of the arc regime from blowing up as the wheel speeds converge.
///
/// Units: meters/second
pub const KINEMATIC_REGIME_RESOLUTION: f64 = 1e-3;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The three regimes of differential drive motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MotionRegime {
    /// Both wheels at the same speed
    Straight,

    /// Wheels at equal and opposite speeds, turning on the spot
    PointTurn,

    /// Any other combination, motion along a circular arc
    Arc,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl MotionRegime {
    /// Select the regime the command falls into.
    pub fn of(cmd: &WheelCommand) -> Self {
        let l = quantise(cmd.left_ms);
        let r = quantise(cmd.right_ms);

        if l == r {
            MotionRegime::Straight
        } else if l == -r {
            MotionRegime::PointTurn
        } else {
            MotionRegime::Arc
        }
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Integrate the pose forward by `dt_s` under the given wheel command.
pub fn integrate(cmd: &WheelCommand, pose: &Pose, dt_s: f64, track_width_m: f64) -> Pose {
    let (x, y, theta) = (pose.x(), pose.y(), pose.heading_rad);
    let (v_l, v_r) = (cmd.left_ms, cmd.right_ms);

    match MotionRegime::of(cmd) {
        MotionRegime::Straight => {
            let v = (v_l + v_r) / 2.0;
            Pose::new(x + v * dt_s * theta.cos(), y + v * dt_s * theta.sin(), theta)
        }
        MotionRegime::PointTurn => Pose::new(x, y, theta + (v_r - v_l) * dt_s / track_width_m),
        MotionRegime::Arc => {
            let radius_m = track_width_m / 2.0 * (v_r + v_l) / (v_r - v_l);
            let delta_theta = (v_r - v_l) * dt_s / track_width_m;

            Pose::new(
                x + radius_m * ((theta + delta_theta).sin() - theta.sin()),
                y - radius_m * ((theta + delta_theta).cos() - theta.cos()),
                theta + delta_theta,
            )
        }
    }
}

fn quantise(speed_ms: f64) -> i64 {
    (speed_ms / KINEMATIC_REGIME_RESOLUTION).round() as i64
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    const W: f64 = 0.28;

    #[test]
    fn test_regimes() {
        assert_eq!(MotionRegime::of(&WheelCommand::new(0.5, 0.5)), MotionRegime::Straight);
        assert_eq!(MotionRegime::of(&WheelCommand::new(0.5, 0.5002)), MotionRegime::Straight);
        assert_eq!(MotionRegime::of(&WheelCommand::new(-0.3, 0.3)), MotionRegime::PointTurn);
        assert_eq!(MotionRegime::of(&WheelCommand::new(0.3, 0.6)), MotionRegime::Arc);
        assert_eq!(MotionRegime::of(&WheelCommand::stop()), MotionRegime::Straight);
    }

    #[test]
    fn test_straight() {
        let pose = Pose::new(1.0, -1.0, FRAC_PI_2);
        let new = integrate(&WheelCommand::new(0.5, 0.5), &pose, 2.0, W);

        assert!((new.x() - 1.0).abs() < 1e-12);
        assert!((new.y() - 0.0).abs() < 1e-12);
        assert_eq!(new.heading_rad, pose.heading_rad);
    }

    #[test]
    fn test_point_turn() {
        let pose = Pose::new(0.0, 0.0, 0.0);
        let new = integrate(&WheelCommand::new(-0.14, 0.14), &pose, 1.0, W);

        assert_eq!(new.position_m, pose.position_m);
        assert!((new.heading_rad - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_arc_half_circle() {
        // Left wheel stopped, the robot pivots about it with radius W/2
        let pose = Pose::new(0.0, 0.0, 0.0);
        let v_r = 0.1;
        let dt = PI * W / v_r;
        let new = integrate(&WheelCommand::new(0.0, v_r), &pose, dt, W);

        assert!(new.x().abs() < 1e-9);
        assert!((new.y() - W).abs() < 1e-9);
        assert!((new.heading_rad.abs() - PI).abs() < 1e-9);
    }

    #[test]
    fn test_arc_converges_to_straight() {
        let pose = Pose::new(0.3, 0.2, 0.7);
        let dt = 0.1;
        let straight = integrate(&WheelCommand::new(1.0, 1.0), &pose, dt, W);

        let mut prev_err = std::f64::INFINITY;
        for eps in [5e-2, 2e-2, 1e-2, 5e-3, 2e-3].iter() {
            let cmd = WheelCommand::new(1.0, 1.0 + eps);
            assert_eq!(MotionRegime::of(&cmd), MotionRegime::Arc);

            let arc = integrate(&cmd, &pose, dt, W);
            let err = (arc.position_m - straight.position_m).norm()
                + (arc.heading_rad - straight.heading_rad).abs();

            assert!(err < prev_err, "error did not shrink at eps = {}", eps);
            assert!(err < 2.0 * eps * dt / W, "jump at eps = {}: {}", eps, err);
            prev_err = err;
        }

        // Below the resolution the straight regime takes over with no jump
        let tiny = integrate(&WheelCommand::new(1.0, 1.0 + 1e-4), &pose, dt, W);
        assert!((tiny.position_m - straight.position_m).norm() < 1e-4);
    }
}
