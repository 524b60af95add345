//! # Simulation loop
//!
//! Each tick:
//! 1. Sense - the detector observes the ball and obstacles.
//! 2. Plan - on planning ticks the planner picks a new target point and the controller computes
//!    fresh wheel speeds, on other ticks the controller propagates its last error instead.
//! 3. Act - the robot is moved with the locomotion kinematics, then the ball and obstacles move.
//! 4. Check - a collision ends the run before reaching the ball is checked.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use log::{debug, info, warn};
use nalgebra::Point2;
use serde::Serialize;

use super::{Outcome, Scene, SimError, SimResult};
use crate::{
    loc::Pose,
    loco_ctrl::{self, integrate, WheelCommand},
    nav::{NavCtrl, ObstacleAvoidance},
    params::NavExecParams,
    per::{Detector, ObstacleDetector},
    traj_ctrl::PoseRegulator,
};
use util::{
    archive::{ArchiveError, Archived, Archiver},
    session::Session,
    time::ticks_to_seconds,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// One row of the tick archive.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct TickRecord {
    pub tick: u64,
    pub sim_time_s: f64,
    pub x_m: f64,
    pub y_m: f64,
    pub heading_rad: f64,
    pub left_ms: f64,
    pub right_ms: f64,
    pub target_x_m: Option<f64>,
    pub target_y_m: Option<f64>,
    pub ball_x_m: f64,
    pub ball_y_m: f64,
    pub ball_seen: bool,
    pub planned: bool,
    pub hunting: bool,
    pub chosen_sector: Option<usize>,
    pub clearance_m: Option<f64>,
}

pub struct SimLoop {
    params: super::Params,
    loco_params: loco_ctrl::Params,

    scene: Scene,
    pose: Pose,

    detector: Detector,
    nav: NavCtrl,
    regulator: PoseRegulator,

    /// Target point from the last plan
    plan_target: Option<Point2<f64>>,

    tick: u64,
    record: TickRecord,
    min_clearance_m: Option<f64>,
    num_ball_dropouts: u64,
    num_danger_fallbacks: u64,

    stop: Arc<AtomicBool>,

    arch_ticks: Archiver,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SimLoop {
    /// Build the scene and every module.
    ///
    /// If a session is given each tick is archived to `ticks.csv` in the session's archive
    /// directory.
    pub fn new(params: &NavExecParams, session: Option<&Session>) -> Result<Self, SimError> {
        let scene = Scene::from_params(&params.sim)?;
        let detector = Detector::new(&params.per)?;
        let nav = NavCtrl::new(&params.nav, &params.loco_ctrl, params.sim.tick_period_s)?;
        let regulator = PoseRegulator::new(&params.traj_ctrl, &params.loco_ctrl);

        let arch_ticks = match session {
            Some(s) => Archiver::from_path(s, "ticks.csv")?,
            None => Archiver::default(),
        };

        Ok(Self {
            params: params.sim.clone(),
            loco_params: params.loco_ctrl.clone(),
            scene,
            pose: params.sim.robot_start_pose(),
            detector,
            nav,
            regulator,
            plan_target: None,
            tick: 0,
            record: TickRecord::default(),
            min_clearance_m: None,
            num_ball_dropouts: 0,
            num_danger_fallbacks: 0,
            stop: Arc::new(AtomicBool::new(false)),
            arch_ticks,
        })
    }

    /// Flag which stops the loop at the start of the next tick when set.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        self.stop.clone()
    }

    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn nav(&self) -> &NavCtrl {
        &self.nav
    }

    /// Number of ticks run so far.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Run one tick, returning the outcome if the run has ended.
    pub fn step(&mut self) -> Result<Option<Outcome>, SimError> {
        if self.stop.load(Ordering::Relaxed) {
            return Ok(Some(Outcome::Stopped));
        }

        let dt_s = self.params.tick_period_s;

        // ---- SENSE ----
        let observation = self
            .detector
            .detect(&self.scene.ball.position_m, &self.scene.obstacle_positions());

        // ---- PLAN ----
        let planning_tick = self.tick % self.params.plan_period_ticks == 0;
        let mut planned = false;
        let mut chosen_sector = None;

        let (cmd, hunting) = match observation.target_m {
            Some(ball_m) => {
                let (cmd, report) = match (planning_tick, self.plan_target) {
                    (false, Some(_)) => {
                        self.regulator
                            .compute_wheel_velocities_again(&self.pose, Some(&ball_m), dt_s)
                    }
                    _ => {
                        let target_m = self.nav.plan_next_target(
                            &self.pose,
                            &ball_m,
                            &observation.obstacles_m,
                        );
                        self.plan_target = Some(target_m);
                        planned = true;

                        if let Some(r) = self.nav.sector_report() {
                            chosen_sector = r.chosen_sector;
                            if r.danger_fallback {
                                self.num_danger_fallbacks += 1;
                            }
                        }

                        self.regulator
                            .compute_wheel_velocities(&self.pose, &target_m, Some(&ball_m))
                    }
                };
                (cmd, report.hunting)
            }
            None => {
                debug!("Ball not seen on tick {}, holding", self.tick);
                self.num_ball_dropouts += 1;
                (WheelCommand::stop(), false)
            }
        };

        // ---- ACT ----
        self.pose = integrate(&cmd, &self.pose, dt_s, self.loco_params.track_width_m);
        self.scene.step(dt_s);
        self.tick += 1;

        // ---- CHECK ----
        let clearance_m = self
            .scene
            .closest_clearance_m(&self.pose, self.params.robot_radius_m);

        if let Some(c) = clearance_m {
            self.min_clearance_m = Some(self.min_clearance_m.map_or(c, |m| m.min(c)));
        }

        self.record = TickRecord {
            tick: self.tick,
            sim_time_s: ticks_to_seconds(self.tick, dt_s),
            x_m: self.pose.x(),
            y_m: self.pose.y(),
            heading_rad: self.pose.heading_rad,
            left_ms: cmd.left_ms,
            right_ms: cmd.right_ms,
            target_x_m: self.plan_target.map(|t| t.x),
            target_y_m: self.plan_target.map(|t| t.y),
            ball_x_m: self.scene.ball.position_m.x,
            ball_y_m: self.scene.ball.position_m.y,
            ball_seen: observation.target_m.is_some(),
            planned,
            hunting,
            chosen_sector,
            clearance_m,
        };

        if self.arch_ticks.is_init() {
            self.write()?;
        }

        if clearance_m.map_or(false, |c| c < self.params.collision_epsilon_m) {
            warn!("Collision on tick {}", self.tick);
            return Ok(Some(Outcome::Collision));
        }

        let reach_dist_m = self.params.ball_radius_m + self.params.robot_radius_m;
        if self.scene.ball_distance_m(&self.pose) < reach_dist_m {
            info!("Reached the ball on tick {}", self.tick);
            return Ok(Some(Outcome::TargetReached));
        }

        if self.tick >= self.params.max_ticks {
            return Ok(Some(Outcome::TickLimit));
        }

        Ok(None)
    }

    /// Run until the simulation ends.
    pub fn run(&mut self) -> Result<SimResult, SimError> {
        info!("Running with the {} planner", self.nav.name());

        let outcome = loop {
            if let Some(outcome) = self.step()? {
                break outcome;
            }
        };

        info!(
            "Finished after {} ticks ({:.1} s): {:?}",
            self.tick,
            ticks_to_seconds(self.tick, self.params.tick_period_s),
            outcome
        );

        Ok(self.result(outcome))
    }

    fn result(&self, outcome: Outcome) -> SimResult {
        SimResult {
            outcome,
            planner: self.nav.name().to_string(),
            num_ticks: self.tick,
            sim_time_s: ticks_to_seconds(self.tick, self.params.tick_period_s),
            final_pose: self.pose,
            min_clearance_m: self.min_clearance_m,
            num_ball_dropouts: self.num_ball_dropouts,
            num_danger_fallbacks: self.num_danger_fallbacks,
        }
    }
}

impl Archived for SimLoop {
    fn write(&mut self) -> Result<(), ArchiveError> {
        self.arch_ticks.serialise(self.record)
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
