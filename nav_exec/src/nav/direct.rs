//! Pass-through planner

use nalgebra::Point2;

use super::ObstacleAvoidance;
use crate::loc::Pose;

/// Drives directly at the target, ignoring every obstacle.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectNav;

impl ObstacleAvoidance for DirectNav {
    fn plan_next_target(
        &mut self,
        _pose: &Pose,
        target_m: &Point2<f64>,
        _obstacles_m: &[Point2<f64>],
    ) -> Point2<f64> {
        *target_m
    }

    fn name(&self) -> &'static str {
        "Direct"
    }
}
