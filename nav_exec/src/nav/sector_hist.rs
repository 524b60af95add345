//! # Sector histogram planner
//!
//! Every cycle the planner:
//! 1. Moves the ball and obstacles into the robot frame.
//! 2. Replaces each nearby obstacle with a square footprint and samples it on a grid, adding a
//!    density to the sector each sample falls in. Closer samples add more.
//! 3. Smooths the densities around the ring and classifies sectors as free, occupied or
//!    dangerous.
//! 4. Finds the valleys, runs of free sectors wide enough for the robot, and picks the one
//!    closest to the ball, keeping clear of dangerous sectors where possible.
//! 5. Returns a point a short distance along the chosen direction.
//!
//! The result of the last cycle is kept in a [`SectorHistReport`] for visualisation and tests.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{debug, trace, warn};
use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

use super::{NavError, ObstacleAvoidance, SectorPartition};
use crate::{
    geom::{robot_to_world, world_to_robot, Square},
    loc::Pose,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters for the sector histogram planner.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SectorHistParams {
    /// Angular width of each sector, must divide 360.
    ///
    /// Units: degrees
    pub sector_width_deg: f64,

    /// Obstacles whose footprint is further than this from the robot are ignored.
    ///
    /// Units: meters
    pub aware_distance_m: f64,

    /// Added to the obstacle radius to get the half side of its footprint.
    ///
    /// Units: meters
    pub footprint_margin_m: f64,

    /// Number of grid steps along each side of a footprint when sampling it.
    pub footprint_samples_per_side: usize,

    /// Number of neighbouring sectors either side used when smoothing.
    pub smoothing_half_width: usize,

    /// Sectors with a smoothed density below this are free.
    pub threshold: f64,

    /// Sectors with a smoothed density at or above this are dangerous.
    pub danger: f64,

    /// Number of consecutive free sectors making a valley.
    pub valley_width: usize,

    /// Valley targets must be further than this from every dangerous sector.
    ///
    /// Units: degrees
    pub danger_aware_angle_deg: f64,

    /// Distance from the robot to the returned target point.
    ///
    /// Units: meters
    pub max_dist_to_go_m: f64,
}

/// How a sector was classified on one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SectorClass {
    pub id: usize,
    pub is_empty: bool,
    pub is_danger: bool,
    pub is_chosen: bool,
}

/// A run of free sectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Valley {
    /// First sector of the run
    pub start_id: usize,

    /// Middle sector of the run, the direction the robot would take
    pub target_id: usize,
}

/// Everything the planner worked out on one cycle.
#[derive(Debug, Clone, Serialize)]
pub struct SectorHistReport {
    /// Density per sector, indexed by `id - 1`
    pub raw_density: Vec<f64>,

    /// Smoothed density per sector, indexed by `id - 1`
    pub smoothed_density: Vec<f64>,

    pub classes: Vec<SectorClass>,

    pub valleys: Vec<Valley>,

    /// Number of obstacles within the aware distance
    pub num_aware_obstacles: usize,

    /// Sector the ball is in, if it could be found
    pub ball_sector: Option<usize>,

    /// Sector the robot was sent along, if any
    pub chosen_sector: Option<usize>,

    /// Every valley was near a dangerous sector so the closest valley was taken anyway
    pub danger_fallback: bool,

    /// There were no valleys so the robot was sent straight at the ball
    pub no_valley_fallback: bool,

    /// The point returned to trajectory control
    pub target_m: Point2<f64>,
}

/// The sector histogram planner.
#[derive(Debug, Clone)]
pub struct SectorHistNav {
    params: SectorHistParams,

    partition: SectorPartition,

    /// Half side of every obstacle footprint
    footprint_half_side_m: f64,

    report: Option<SectorHistReport>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for SectorHistParams {
    fn default() -> Self {
        Self {
            sector_width_deg: 5.0,
            aware_distance_m: 1.5,
            footprint_margin_m: 0.1,
            footprint_samples_per_side: 10,
            smoothing_half_width: 5,
            threshold: 1.0,
            danger: 15.0,
            valley_width: 3,
            danger_aware_angle_deg: 20.0,
            max_dist_to_go_m: 1.0,
        }
    }
}

impl SectorHistParams {
    /// Check the parameters describe a usable planner.
    pub fn validate(&self) -> Result<(), NavError> {
        SectorPartition::new(self.sector_width_deg)?;

        if !(self.aware_distance_m > 0.0) {
            return Err(NavError::InvalidParam("aware_distance_m must be positive"));
        }
        if self.footprint_margin_m < 0.0 {
            return Err(NavError::InvalidParam("footprint_margin_m must not be negative"));
        }
        if self.footprint_samples_per_side == 0 {
            return Err(NavError::InvalidParam("footprint_samples_per_side must be at least 1"));
        }
        if !(self.danger > self.threshold) {
            return Err(NavError::InvalidParam("danger must be greater than threshold"));
        }
        if self.valley_width == 0 {
            return Err(NavError::InvalidParam("valley_width must be at least 1"));
        }
        if self.danger_aware_angle_deg < 0.0 {
            return Err(NavError::InvalidParam("danger_aware_angle_deg must not be negative"));
        }
        if !(self.max_dist_to_go_m > 0.0) {
            return Err(NavError::InvalidParam("max_dist_to_go_m must be positive"));
        }

        Ok(())
    }
}

impl SectorHistNav {
    pub fn new(params: &SectorHistParams, obstacle_radius_m: f64) -> Result<Self, NavError> {
        params.validate()?;

        Ok(Self {
            params: params.clone(),
            partition: SectorPartition::new(params.sector_width_deg)?,
            footprint_half_side_m: obstacle_radius_m + params.footprint_margin_m,
            report: None,
        })
    }

    pub fn partition(&self) -> &SectorPartition {
        &self.partition
    }

    /// The report from the last call to `plan_next_target`.
    pub fn last_report(&self) -> Option<&SectorHistReport> {
        self.report.as_ref()
    }

    /// Density of each sector from the given footprints.
    ///
    /// Each sector's total is divided by the number of footprints that put at least one sample
    /// in it.
    fn raw_density(&self, footprints: &[Square]) -> Vec<f64> {
        let n = self.partition.len();
        let max_range_m = std::f64::consts::SQRT_2 * self.params.aware_distance_m;

        let mut sums = vec![0.0; n];
        let mut contributors = vec![0usize; n];
        let mut touched = vec![false; n];

        for footprint in footprints {
            touched.iter_mut().for_each(|t| *t = false);

            for sample in footprint.grid(self.params.footprint_samples_per_side) {
                if let Some(sector) = self.partition.find(&sample) {
                    let idx = sector.id - 1;
                    sums[idx] += (max_range_m - sample.coords.norm()).max(0.0);
                    touched[idx] = true;
                }
            }

            for (count, t) in contributors.iter_mut().zip(touched.iter()) {
                if *t {
                    *count += 1;
                }
            }
        }

        sums.iter()
            .zip(contributors.iter())
            .map(|(s, &c)| if c > 0 { s / c as f64 } else { 0.0 })
            .collect()
    }

    /// Circular weighted moving average of the densities.
    ///
    /// A neighbour `d` sectors away is weighted `max(L - d, 1)`, the total is divided by
    /// `2L + 1`.
    fn smooth(&self, raw: &[f64]) -> Vec<f64> {
        let n = raw.len() as isize;
        let l = self.params.smoothing_half_width as isize;
        let norm = (2 * l + 1) as f64;

        (0..n)
            .map(|k| {
                let sum: f64 = (-l..=l)
                    .map(|d| {
                        let weight = (l - d.abs()).max(1) as f64;
                        weight * raw[(k + d).rem_euclid(n) as usize]
                    })
                    .sum();
                sum / norm
            })
            .collect()
    }

    /// Every run of `valley_width` free sectors, wrapping around the ring.
    fn find_valleys(&self, classes: &[SectorClass]) -> Vec<Valley> {
        let n = classes.len();
        let k = self.params.valley_width;

        if k > n {
            return Vec::new();
        }

        (0..n)
            .filter(|&start| (0..k).all(|i| classes[(start + i) % n].is_empty))
            .map(|start| Valley {
                start_id: start + 1,
                target_id: (start + k / 2) % n + 1,
            })
            .collect()
    }

    /// Target sector of the candidate valley nearest the ball, ties go to the first candidate.
    fn closest_valley<'a>(
        &self,
        candidates: impl Iterator<Item = &'a Valley>,
        ball_sector: usize,
    ) -> Option<usize> {
        candidates
            .min_by_key(|v| {
                self.partition
                    .steps_between(v.target_id, ball_sector)
                    .unwrap_or(usize::MAX)
            })
            .map(|v| v.target_id)
    }

    /// Pick the sector to head along, returns the sector and whether the danger fallback was
    /// used.
    fn select_sector(
        &self,
        classes: &[SectorClass],
        valleys: &[Valley],
        ball_sector: usize,
    ) -> (usize, bool) {
        let danger_ids: Vec<usize> = classes
            .iter()
            .filter(|c| c.is_danger)
            .map(|c| c.id)
            .collect();

        if danger_ids.is_empty() {
            return match self.closest_valley(valleys.iter(), ball_sector) {
                Some(id) => (id, false),
                None => (ball_sector, false),
            };
        }

        let safe = self.closest_valley(
            valleys.iter().filter(|v| {
                danger_ids.iter().all(|&d| {
                    self.partition
                        .ang_dist_deg(v.target_id, d)
                        .map_or(false, |a| a > self.params.danger_aware_angle_deg)
                })
            }),
            ball_sector,
        );

        match safe {
            Some(id) => (id, false),
            None => match self.closest_valley(valleys.iter(), ball_sector) {
                Some(id) => {
                    warn!(
                        "No valley clear of the {} dangerous sectors, taking closest valley {}",
                        danger_ids.len(),
                        id
                    );
                    (id, true)
                }
                None => (ball_sector, false),
            },
        }
    }
}

impl ObstacleAvoidance for SectorHistNav {
    fn plan_next_target(
        &mut self,
        pose: &Pose,
        target_m: &Point2<f64>,
        obstacles_m: &[Point2<f64>],
    ) -> Point2<f64> {
        let target_rb = world_to_robot(pose, target_m);

        let footprints: Vec<Square> = obstacles_m
            .iter()
            .map(|o| Square::new(world_to_robot(pose, o), self.footprint_half_side_m))
            .filter(|sq| sq.distance_to(&Point2::origin()) <= self.params.aware_distance_m)
            .collect();

        let raw_density = self.raw_density(&footprints);
        let smoothed_density = self.smooth(&raw_density);

        let mut classes: Vec<SectorClass> = self
            .partition
            .iter()
            .zip(smoothed_density.iter())
            .map(|(s, &d)| SectorClass {
                id: s.id,
                is_empty: d < self.params.threshold,
                is_danger: d >= self.params.danger,
                is_chosen: false,
            })
            .collect();

        let valleys = self.find_valleys(&classes);
        let ball_sector = self.partition.find(&target_rb).map(|s| s.id);

        let mut report = SectorHistReport {
            raw_density,
            smoothed_density,
            classes: Vec::new(),
            valleys: Vec::new(),
            num_aware_obstacles: footprints.len(),
            ball_sector,
            chosen_sector: None,
            danger_fallback: false,
            no_valley_fallback: valleys.is_empty(),
            target_m: pose.position_m,
        };

        let ball_sector = match ball_sector {
            Some(b) => b,
            None => {
                warn!("Ball is not in any sector, holding position");
                report.classes = classes;
                report.valleys = valleys;
                self.report = Some(report);
                return pose.position_m;
            }
        };

        let (chosen, danger_fallback) = self.select_sector(&classes, &valleys, ball_sector);
        classes[chosen - 1].is_chosen = true;

        if report.no_valley_fallback {
            warn!("No valleys found, heading for the ball's sector {}", ball_sector);
        }

        let bisector_rad = self
            .partition
            .get(chosen)
            .map(|s| s.bisector_rad())
            .unwrap_or_default();
        let step_rb = Vector2::new(bisector_rad.cos(), bisector_rad.sin())
            * self.params.max_dist_to_go_m;
        let next_target_m = robot_to_world(pose, &Point2::from(step_rb));

        debug!(
            "{} aware obstacles, {} valleys, ball in sector {}, chose sector {}",
            report.num_aware_obstacles,
            valleys.len(),
            ball_sector,
            chosen
        );
        trace!("Smoothed density: {:?}", report.smoothed_density);

        report.classes = classes;
        report.valleys = valleys;
        report.chosen_sector = Some(chosen);
        report.danger_fallback = danger_fallback;
        report.target_m = next_target_m;
        self.report = Some(report);

        next_target_m
    }

    fn name(&self) -> &'static str {
        "SectorHist"
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    const OBSTACLE_RADIUS_M: f64 = 0.14;

    fn bearing_to(pose: &Pose, point: &Point2<f64>) -> f64 {
        let d = point - pose.position_m;
        util::maths::norm_angle(d.y.atan2(d.x) - pose.heading_rad)
    }

    #[test]
    fn test_smoothing_weights() {
        let nav = SectorHistNav::new(&SectorHistParams::default(), OBSTACLE_RADIUS_M).unwrap();

        // A single spike spreads with weights 5, 4, 3, 2, 1, 1 over 11
        let mut raw = vec![0.0; nav.partition().len()];
        raw[0] = 11.0;
        let smoothed = nav.smooth(&raw);

        let expected = [5.0, 4.0, 3.0, 2.0, 1.0, 1.0];
        for (d, e) in expected.iter().enumerate() {
            assert!((smoothed[d] - e).abs() < 1e-12);
            assert!((smoothed[(72 - d) % 72] - e).abs() < 1e-12);
        }
        assert_eq!(smoothed[6], 0.0);
        assert_eq!(smoothed[72 - 6], 0.0);

        // Uniform input stays uniform up to the total weight
        let smoothed = nav.smooth(&vec![1.0; 72]);
        assert!(smoothed.iter().all(|s| (s - 27.0 / 11.0).abs() < 1e-12));
    }

    #[test]
    fn test_valleys_wrap() {
        let params = SectorHistParams {
            sector_width_deg: 90.0,
            valley_width: 3,
            ..SectorHistParams::default()
        };
        let nav = SectorHistNav::new(&params, OBSTACLE_RADIUS_M).unwrap();

        let class = |id, is_empty| SectorClass {
            id,
            is_empty,
            is_danger: false,
            is_chosen: false,
        };
        let classes = vec![class(1, true), class(2, false), class(3, true), class(4, true)];

        assert_eq!(
            nav.find_valleys(&classes),
            vec![Valley {
                start_id: 3,
                target_id: 4
            }]
        );
    }

    #[test]
    fn test_no_obstacles_heads_for_ball() {
        let mut nav = SectorHistNav::new(&SectorHistParams::default(), OBSTACLE_RADIUS_M).unwrap();

        let pose = Pose::new(1.0, -2.0, 0.3);
        let ball = Point2::new(3.0, 1.5);

        let next = nav.plan_next_target(&pose, &ball, &[]);
        let report = nav.last_report().unwrap();

        assert!(report.classes.iter().all(|c| c.is_empty && !c.is_danger));
        assert_eq!(report.valleys.len(), 72);
        assert_eq!(report.chosen_sector, report.ball_sector);
        assert!(!report.danger_fallback);
        assert!(!report.no_valley_fallback);

        assert!((bearing_to(&pose, &next) - bearing_to(&pose, &ball)).abs() <= 5f64.to_radians());
        assert!((pose.distance_to(&next) - 1.0).abs() < 1e-9);
        assert_eq!(report.target_m, next);
    }

    #[test]
    fn test_steers_away_from_danger() {
        let mut nav = SectorHistNav::new(&SectorHistParams::default(), OBSTACLE_RADIUS_M).unwrap();

        let pose = Pose::new(0.0, 0.0, 0.0);
        let ball = Point2::new(3.0, 0.0);
        let obstacles = [Point2::new(0.8, 0.0)];

        let next = nav.plan_next_target(&pose, &ball, &obstacles);
        let report = nav.last_report().unwrap().clone();

        assert_eq!(report.num_aware_obstacles, 1);
        assert_eq!(report.ball_sector, Some(1));
        assert!(report.classes[0].is_danger);
        assert!(!report.danger_fallback);

        let chosen = report.chosen_sector.unwrap();
        assert_ne!(Some(chosen), report.ball_sector);
        assert!(report.classes[chosen - 1].is_chosen);
        assert!(report.classes[chosen - 1].is_empty);

        for c in report.classes.iter().filter(|c| c.is_danger) {
            assert!(nav.partition().ang_dist_deg(chosen, c.id).unwrap() > 20.0);
        }

        // Still heading roughly forwards rather than turning around
        assert!(next.x > 0.0);
    }

    #[test]
    fn test_danger_fallback_takes_closest_valley() {
        let params = SectorHistParams {
            danger_aware_angle_deg: 180.0,
            ..SectorHistParams::default()
        };
        let mut nav = SectorHistNav::new(&params, OBSTACLE_RADIUS_M).unwrap();

        let pose = Pose::new(0.0, 0.0, 0.0);
        let ball = Point2::new(3.0, 0.0);

        nav.plan_next_target(&pose, &ball, &[Point2::new(0.8, 0.0)]);
        let report = nav.last_report().unwrap();

        assert!(report.danger_fallback);
        assert!(!report.valleys.is_empty());

        let ball_sector = report.ball_sector.unwrap();
        let closest = report
            .valleys
            .iter()
            .map(|v| nav.partition().steps_between(v.target_id, ball_sector).unwrap())
            .min()
            .unwrap();
        let chosen = report.chosen_sector.unwrap();
        assert_eq!(nav.partition().steps_between(chosen, ball_sector), Some(closest));
    }

    #[test]
    fn test_no_valley_heads_for_ball() {
        let params = SectorHistParams {
            threshold: 0.01,
            ..SectorHistParams::default()
        };
        let mut nav = SectorHistNav::new(&params, OBSTACLE_RADIUS_M).unwrap();

        let pose = Pose::new(0.0, 0.0, 0.0);
        let ball = Point2::new(0.0, 3.0);
        let obstacles: Vec<Point2<f64>> = (0..8)
            .map(|i| {
                let a = i as f64 * std::f64::consts::FRAC_PI_4;
                Point2::new(0.5 * a.cos(), 0.5 * a.sin())
            })
            .collect();

        nav.plan_next_target(&pose, &ball, &obstacles);
        let report = nav.last_report().unwrap();

        assert!(report.valleys.is_empty());
        assert!(report.no_valley_fallback);
        assert_eq!(report.chosen_sector, report.ball_sector);
    }

    #[test]
    fn test_far_obstacles_ignored() {
        let mut nav = SectorHistNav::new(&SectorHistParams::default(), OBSTACLE_RADIUS_M).unwrap();

        let pose = Pose::new(0.0, 0.0, 0.0);
        let ball = Point2::new(5.0, 0.0);

        nav.plan_next_target(&pose, &ball, &[Point2::new(3.0, 0.0), Point2::new(-2.0, 1.0)]);
        let report = nav.last_report().unwrap();

        assert_eq!(report.num_aware_obstacles, 0);
        assert!(report.raw_density.iter().all(|d| *d == 0.0));
        assert_eq!(report.chosen_sector, Some(1));
    }

    #[test]
    fn test_ball_on_robot_holds() {
        let mut nav = SectorHistNav::new(&SectorHistParams::default(), OBSTACLE_RADIUS_M).unwrap();

        let pose = Pose::new(1.0, 1.0, 0.5);
        let next = nav.plan_next_target(&pose, &Point2::new(1.0, 1.0), &[]);

        assert_eq!(next, pose.position_m);
        let report = nav.last_report().unwrap();
        assert!(report.ball_sector.is_none());
        assert!(report.chosen_sector.is_none());
    }

    #[test]
    fn test_invalid_params() {
        let bad = [
            SectorHistParams {
                sector_width_deg: 7.0,
                ..SectorHistParams::default()
            },
            SectorHistParams {
                danger: 0.5,
                ..SectorHistParams::default()
            },
            SectorHistParams {
                valley_width: 0,
                ..SectorHistParams::default()
            },
            SectorHistParams {
                footprint_samples_per_side: 0,
                ..SectorHistParams::default()
            },
        ];

        for p in bad.iter() {
            assert!(SectorHistNav::new(p, OBSTACLE_RADIUS_M).is_err());
        }
    }
}
