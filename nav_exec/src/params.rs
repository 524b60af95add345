//! # Executable parameters
//!
//! Every module's parameters in one structure, loaded from a single TOML file with one table per
//! module. Tables and keys which are missing take their default values.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Deserialize;

use crate::{
    loco_ctrl,
    nav::{self, NavError},
    per::{self, PerError},
    sim::{self, SimError},
    traj_ctrl,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NavExecParams {
    pub loco_ctrl: loco_ctrl::Params,

    pub traj_ctrl: traj_ctrl::Params,

    pub nav: nav::Params,

    pub per: per::Params,

    pub sim: sim::Params,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ParamsError {
    #[error("Invalid locomotion parameter: {0}")]
    LocoCtrl(&'static str),

    #[error("Invalid trajectory control parameter: {0}")]
    TrajCtrl(&'static str),

    #[error(transparent)]
    Nav(#[from] NavError),

    #[error(transparent)]
    Per(#[from] PerError),

    #[error(transparent)]
    Sim(#[from] SimError),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl NavExecParams {
    /// Check every module's parameters.
    pub fn validate(&self) -> Result<(), ParamsError> {
        let loco = &self.loco_ctrl;
        if !(loco.wheel_radius_m > 0.0 && loco.track_width_m > 0.0) {
            return Err(ParamsError::LocoCtrl("wheel radius and track width must be positive"));
        }
        if !(loco.max_wheel_speed_ms > 0.0 && loco.max_wheel_accel_mss > 0.0) {
            return Err(ParamsError::LocoCtrl("speed and acceleration limits must be positive"));
        }

        let traj = &self.traj_ctrl;
        if !(traj.k_rho > 0.0) {
            return Err(ParamsError::TrajCtrl("k_rho must be positive"));
        }
        if traj.hunt_distance_m < 0.0 || !(traj.hunt_velocity_boost > 0.0) {
            return Err(ParamsError::TrajCtrl(
                "hunt distance must not be negative and the hunt boost must be positive",
            ));
        }

        if !(self.nav.obstacle_radius_m > 0.0 && self.nav.robot_radius_m > 0.0) {
            return Err(NavError::InvalidParam("radii must be positive").into());
        }
        if self.nav.obstacle_radius_m != self.sim.obstacle_radius_m
            || self.nav.robot_radius_m != self.sim.robot_radius_m
        {
            return Err(NavError::InvalidParam(
                "nav and sim robot and obstacle radii must match",
            )
            .into());
        }
        self.nav.sector_hist.validate()?;
        self.nav.dwa.validate()?;
        self.nav.pot_field.validate()?;

        self.per.validate()?;
        self.sim.validate()?;

        Ok(())
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::{nav::NavCtrlType, per::DetectorType};

    #[test]
    fn test_defaults_are_valid() {
        NavExecParams::default().validate().unwrap();
    }

    #[test]
    fn test_partial_toml() {
        let params: NavExecParams = util::params::from_str(
            r#"
            [traj_ctrl]
            k_rho = 0.4

            [nav]
            nav_type = "Dwa"

            [nav.sector_hist]
            sector_width_deg = 10.0

            [per]
            detector = "PixelQuantised"
            noise_px = 2.0

            [sim]
            ball_start_m = [3.0, 1.5]
            obstacles = [[1.0, 0.0, 0.1, 0.0]]
            "#,
        )
        .unwrap();

        params.validate().unwrap();

        assert_eq!(params.traj_ctrl.k_rho, 0.4);
        assert_eq!(params.traj_ctrl.k_alpha, 5.0);
        assert_eq!(params.nav.nav_type, NavCtrlType::Dwa);
        assert_eq!(params.nav.sector_hist.sector_width_deg, 10.0);
        assert_eq!(params.nav.sector_hist.valley_width, 3);
        assert_eq!(params.per.detector, DetectorType::PixelQuantised);
        assert_eq!(params.sim.ball_start_m, Some([3.0, 1.5]));
        assert_eq!(params.sim.obstacles.len(), 1);
        assert_eq!(params.loco_ctrl.track_width_m, 0.28);
    }

    #[test]
    fn test_rejects_invalid() {
        let mut p = NavExecParams::default();
        p.nav.sector_hist.sector_width_deg = 7.0;
        assert!(matches!(p.validate(), Err(ParamsError::Nav(_))));

        let mut p = NavExecParams::default();
        p.nav.sector_hist.danger = p.nav.sector_hist.threshold;
        assert!(matches!(p.validate(), Err(ParamsError::Nav(_))));

        let mut p = NavExecParams::default();
        p.loco_ctrl.track_width_m = 0.0;
        assert!(matches!(p.validate(), Err(ParamsError::LocoCtrl(_))));

        let mut p = NavExecParams::default();
        p.sim.plan_period_ticks = 0;
        assert!(matches!(p.validate(), Err(ParamsError::Sim(_))));

        let mut p = NavExecParams::default();
        p.per.noise_px = -1.0;
        assert!(matches!(p.validate(), Err(ParamsError::Per(_))));

        let mut p = NavExecParams::default();
        p.sim.obstacle_radius_m = 0.2;
        assert!(matches!(p.validate(), Err(ParamsError::Nav(_))));

        let mut p = NavExecParams::default();
        p.nav.robot_radius_m = 0.2;
        assert!(matches!(p.validate(), Err(ParamsError::Nav(_))));
    }
}
