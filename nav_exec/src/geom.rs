//! # Geometry primitives
//!
//! Points are nalgebra [`Point2`]s. This module adds the homogeneous [`Line`]
//! used for sector boundaries, the [`Square`] obstacle footprint, and the
//! transforms between the world frame and the robot frame.
//!
//! The robot frame (RB) is centred on the robot with its X axis along the
//! robot's heading.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use nalgebra::{Point2, Rotation2, Vector2};
use serde::Serialize;

use crate::loc::Pose;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A line `a*x + b*y + c = 0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Line {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

/// An axis aligned square footprint in the robot frame.
///
/// Used as a cheap stand-in for a circular obstacle when computing sector
/// densities.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Square {
    /// Centre of the square
    pub centre_m: Point2<f64>,

    /// Half the length of a side
    pub half_side_m: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Line {
    pub fn new(a: f64, b: f64, c: f64) -> Self {
        Self { a, b, c }
    }

    /// The line through the origin at the given angle, oriented so that points counter-clockwise
    /// of the ray are on its left.
    ///
    /// This is the line of slope `tan(angle)`, scaled by `cos(angle)`. The scaling flips the sign
    /// for rays pointing into the negative X half plane, which `tan` alone can't tell apart from
    /// the opposite ray, and keeps the coefficients finite at 90 and 270 degrees.
    pub fn through_origin(angle_rad: f64) -> Self {
        Self {
            a: angle_rad.sin(),
            b: -angle_rad.cos(),
            c: 0.0,
        }
    }

    /// Signed position of the point relative to the line.
    pub fn relative_position(&self, point: &Point2<f64>) -> f64 {
        self.a * point.x + self.b * point.y + self.c
    }

    /// A vector lying along the line.
    pub fn direction(&self) -> Vector2<f64> {
        Vector2::new(-self.b, self.a)
    }

    pub fn is_left_of(&self, point: &Point2<f64>) -> bool {
        self.relative_position(point) < 0.0
    }
}

impl Square {
    pub fn new(centre_m: Point2<f64>, half_side_m: f64) -> Self {
        Self {
            centre_m,
            half_side_m,
        }
    }

    /// The four corners followed by the centre.
    pub fn sample_points(&self) -> [Point2<f64>; 5] {
        let h = self.half_side_m;
        let c = self.centre_m;
        [
            Point2::new(c.x - h, c.y - h),
            Point2::new(c.x + h, c.y - h),
            Point2::new(c.x + h, c.y + h),
            Point2::new(c.x - h, c.y + h),
            c,
        ]
    }

    /// Approximate distance from the square to the point.
    ///
    /// This is the minimum distance over the corners and centre, not the exact closest point on
    /// the square, so it over-estimates for points facing the middle of an edge.
    pub fn distance_to(&self, point: &Point2<f64>) -> f64 {
        self.sample_points()
            .iter()
            .map(|p| nalgebra::distance(p, point))
            .fold(std::f64::INFINITY, f64::min)
    }

    /// A regular grid of points covering the square, with `samples_per_side + 1` points along
    /// each side (edges included).
    pub fn grid(&self, samples_per_side: usize) -> impl Iterator<Item = Point2<f64>> {
        let n = samples_per_side.max(1);
        let step = 2.0 * self.half_side_m / n as f64;
        let origin = Point2::new(
            self.centre_m.x - self.half_side_m,
            self.centre_m.y - self.half_side_m,
        );

        (0..=n).flat_map(move |i| {
            (0..=n).map(move |j| Point2::new(origin.x + i as f64 * step, origin.y + j as f64 * step))
        })
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Express the point relative to the reference point.
pub fn relative_to(point: &Point2<f64>, reference: &Point2<f64>) -> Point2<f64> {
    Point2::from(point - reference)
}

/// Rotate the point about the origin by the given angle.
pub fn rotate(point: &Point2<f64>, angle_rad: f64) -> Point2<f64> {
    Rotation2::new(angle_rad) * point
}

/// Transform a world frame point into the robot frame of the given pose.
pub fn world_to_robot(pose: &Pose, point_m: &Point2<f64>) -> Point2<f64> {
    rotate(&relative_to(point_m, &pose.position_m), -pose.heading_rad)
}

/// Transform a robot frame point back into the world frame.
pub fn robot_to_world(pose: &Pose, point_rb: &Point2<f64>) -> Point2<f64> {
    pose.position_m + rotate(point_rb, pose.heading_rad).coords
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
