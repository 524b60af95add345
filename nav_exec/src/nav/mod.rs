//! # Navigation
//!
//! This module provides local obstacle avoidance for the robot.
//!
//! Every planner takes the robot pose, the ball position and the observed obstacle positions, and
//! returns the point trajectory control should drive towards on this cycle. Four planners are
//! implemented:
//! - [`DirectNav`] - Drives straight at the ball, ignoring obstacles.
//! - [`SectorHistNav`] - Builds a polar histogram of obstacle density around the robot and steers
//!   through the free valley closest to the ball.
//! - [`DwaNav`] - Dynamic window approach, scores reachable wheel speeds by progress and
//!   clearance.
//! - [`PotFieldNav`] - Follows the sum of an attractive field towards the ball and repulsive
//!   fields around obstacles.
//!
//! The planner in use is chosen from the parameters through [`NavCtrl`].

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod direct;
pub mod dwa;
pub mod pot_field;
pub mod sector;
pub mod sector_hist;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::info;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::{loc::Pose, loco_ctrl};

pub use direct::DirectNav;
pub use dwa::{DwaNav, DwaParams};
pub use pot_field::{PotFieldNav, PotFieldParams};
pub use sector::{Sector, SectorPartition};
pub use sector_hist::{SectorHistNav, SectorHistParams, SectorHistReport};

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A local obstacle avoidance planner.
pub trait ObstacleAvoidance {
    /// Plan the point the robot should move towards on this cycle.
    ///
    /// All positions are in the world frame. Planners never fail, if they can't find anything
    /// better they return the robot's own position so that it holds still.
    fn plan_next_target(
        &mut self,
        pose: &Pose,
        target_m: &Point2<f64>,
        obstacles_m: &[Point2<f64>],
    ) -> Point2<f64>;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters for navigation.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Params {
    /// Which planner to use
    pub nav_type: NavCtrlType,

    /// Radius the planners assume for every obstacle
    pub obstacle_radius_m: f64,

    /// Radius of the robot's body
    pub robot_radius_m: f64,

    pub sector_hist: SectorHistParams,

    pub dwa: DwaParams,

    pub pot_field: PotFieldParams,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NavCtrlType {
    Direct,
    SectorHist,
    Dwa,
    PotField,
}

/// The configured planner.
#[derive(Debug, Clone)]
pub enum NavCtrl {
    Direct(DirectNav),
    SectorHist(SectorHistNav),
    Dwa(DwaNav),
    PotField(PotFieldNav),
}

#[derive(Debug, thiserror::Error)]
pub enum NavError {
    #[error("Sector width of {0} degrees does not evenly divide 360 degrees into sectors of at most 90 degrees")]
    InvalidSectorWidth(f64),

    #[error("Invalid navigation parameter: {0}")]
    InvalidParam(&'static str),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            nav_type: NavCtrlType::SectorHist,
            obstacle_radius_m: 0.14,
            robot_radius_m: 0.14,
            sector_hist: SectorHistParams::default(),
            dwa: DwaParams::default(),
            pot_field: PotFieldParams::default(),
        }
    }
}

impl NavCtrl {
    /// Build the planner selected in the parameters.
    pub fn new(
        params: &Params,
        loco_params: &loco_ctrl::Params,
        tick_period_s: f64,
    ) -> Result<Self, NavError> {
        let nav = match params.nav_type {
            NavCtrlType::Direct => NavCtrl::Direct(DirectNav),
            NavCtrlType::SectorHist => NavCtrl::SectorHist(SectorHistNav::new(
                &params.sector_hist,
                params.obstacle_radius_m,
            )?),
            NavCtrlType::Dwa => NavCtrl::Dwa(DwaNav::new(
                &params.dwa,
                loco_params,
                params.obstacle_radius_m,
                params.robot_radius_m,
                tick_period_s,
            )?),
            NavCtrlType::PotField => NavCtrl::PotField(PotFieldNav::new(
                &params.pot_field,
                params.obstacle_radius_m,
                params.robot_radius_m,
            )?),
        };

        info!("Navigation planner: {}", nav.name());

        Ok(nav)
    }

    /// The sector histogram of the last cycle, if the sector histogram planner is in use.
    pub fn sector_report(&self) -> Option<&SectorHistReport> {
        match self {
            NavCtrl::SectorHist(s) => s.last_report(),
            _ => None,
        }
    }
}

impl ObstacleAvoidance for NavCtrl {
    fn plan_next_target(
        &mut self,
        pose: &Pose,
        target_m: &Point2<f64>,
        obstacles_m: &[Point2<f64>],
    ) -> Point2<f64> {
        match self {
            NavCtrl::Direct(n) => n.plan_next_target(pose, target_m, obstacles_m),
            NavCtrl::SectorHist(n) => n.plan_next_target(pose, target_m, obstacles_m),
            NavCtrl::Dwa(n) => n.plan_next_target(pose, target_m, obstacles_m),
            NavCtrl::PotField(n) => n.plan_next_target(pose, target_m, obstacles_m),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            NavCtrl::Direct(n) => n.name(),
            NavCtrl::SectorHist(n) => n.name(),
            NavCtrl::Dwa(n) => n.name(),
            NavCtrl::PotField(n) => n.name(),
        }
    }
}
