//! # Perception
//!
//! Turns the true state of the scene into what the planner gets to see each cycle. The
//! [`GroundTruth`] detector passes positions straight through, [`PixelQuantised`] emulates an
//! overhead camera by snapping positions onto the image's pixel grid, optionally adding noise and
//! occasionally losing sight of the ball.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

pub mod pixel;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::trace;
use nalgebra::Point2;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

pub use pixel::PixelFrame;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

pub trait ObstacleDetector {
    /// Observe the ball and obstacles, all positions in the world frame.
    fn detect(&mut self, ball_m: &Point2<f64>, obstacles_m: &[Point2<f64>]) -> Observation;
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// What was seen on one cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Observation {
    /// Position of the ball, if it was seen
    pub target_m: Option<Point2<f64>>,

    pub obstacles_m: Vec<Point2<f64>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Params {
    pub detector: DetectorType,

    pub frame: PixelFrame,

    /// Maximum uniform noise added to each detection.
    ///
    /// Units: pixels
    pub noise_px: f64,

    /// Chance of missing the ball on any one cycle
    pub ball_dropout_prob: f64,

    /// Seed for the noise and drop-out
    pub seed: u64,
}

/// Exact observations.
#[derive(Debug, Clone, Copy, Default)]
pub struct GroundTruth;

/// Observations as seen through an overhead camera.
#[derive(Debug, Clone)]
pub struct PixelQuantised {
    frame: PixelFrame,

    noise_px: f64,

    ball_dropout_prob: f64,

    rng: StdRng,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum DetectorType {
    GroundTruth,
    PixelQuantised,
}

#[derive(Debug, Clone)]
pub enum Detector {
    GroundTruth(GroundTruth),
    PixelQuantised(PixelQuantised),
}

#[derive(Debug, thiserror::Error)]
pub enum PerError {
    #[error("Invalid perception parameter: {0}")]
    InvalidParam(&'static str),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            detector: DetectorType::GroundTruth,
            frame: PixelFrame::default(),
            noise_px: 0.0,
            ball_dropout_prob: 0.0,
            seed: 239,
        }
    }
}

impl Params {
    pub fn validate(&self) -> Result<(), PerError> {
        if !(self.frame.pixels_per_m > 0.0) {
            return Err(PerError::InvalidParam("pixels_per_m must be positive"));
        }
        if self.frame.width_px == 0 || self.frame.height_px == 0 {
            return Err(PerError::InvalidParam("image size must be non-zero"));
        }
        if !(self.noise_px >= 0.0) {
            return Err(PerError::InvalidParam("noise_px must not be negative"));
        }
        if !(0.0..=1.0).contains(&self.ball_dropout_prob) {
            return Err(PerError::InvalidParam("ball_dropout_prob must be between 0 and 1"));
        }
        Ok(())
    }
}

impl Detector {
    pub fn new(params: &Params) -> Result<Self, PerError> {
        params.validate()?;

        Ok(match params.detector {
            DetectorType::GroundTruth => Detector::GroundTruth(GroundTruth),
            DetectorType::PixelQuantised => Detector::PixelQuantised(PixelQuantised::new(
                params.frame,
                params.noise_px,
                params.ball_dropout_prob,
                params.seed,
            )),
        })
    }
}

impl ObstacleDetector for Detector {
    fn detect(&mut self, ball_m: &Point2<f64>, obstacles_m: &[Point2<f64>]) -> Observation {
        match self {
            Detector::GroundTruth(d) => d.detect(ball_m, obstacles_m),
            Detector::PixelQuantised(d) => d.detect(ball_m, obstacles_m),
        }
    }
}

impl ObstacleDetector for GroundTruth {
    fn detect(&mut self, ball_m: &Point2<f64>, obstacles_m: &[Point2<f64>]) -> Observation {
        Observation {
            target_m: Some(*ball_m),
            obstacles_m: obstacles_m.to_vec(),
        }
    }
}

impl PixelQuantised {
    pub fn new(frame: PixelFrame, noise_px: f64, ball_dropout_prob: f64, seed: u64) -> Self {
        Self {
            frame,
            noise_px,
            ball_dropout_prob,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Where the camera would put the point, or `None` if it's outside the image.
    fn observe(&mut self, point_m: &Point2<f64>) -> Option<Point2<f64>> {
        let mut pixel = self.frame.to_pixel(point_m);

        if self.noise_px > 0.0 {
            pixel.x += self.rng.random_range(-self.noise_px..=self.noise_px);
            pixel.y += self.rng.random_range(-self.noise_px..=self.noise_px);
        }

        let pixel = Point2::new(pixel.x.round(), pixel.y.round());

        match self.frame.contains(&pixel) {
            true => Some(self.frame.to_metric(&pixel)),
            false => None,
        }
    }
}

impl ObstacleDetector for PixelQuantised {
    fn detect(&mut self, ball_m: &Point2<f64>, obstacles_m: &[Point2<f64>]) -> Observation {
        let target_m = match self.ball_dropout_prob > 0.0
            && self.rng.random_bool(self.ball_dropout_prob)
        {
            true => {
                trace!("Ball dropped out");
                None
            }
            false => self.observe(ball_m),
        };

        let obstacles_m = obstacles_m.iter().filter_map(|o| self.observe(o)).collect();

        Observation {
            target_m,
            obstacles_m,
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
