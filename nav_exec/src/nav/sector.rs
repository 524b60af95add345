//! # Sector partition
//!
//! The space around the robot is split into `N = 360 / width` equal wedges, each bounded by two
//! lines through the robot. Sector `i` (numbered from 1) covers the half-open angular range
//! `[(i - 1) * width, i * width)` measured counter-clockwise from the robot's forward axis.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use nalgebra::Point2;
use serde::Serialize;

use super::NavError;
use crate::geom::Line;
use util::maths::ring_dist;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A single wedge of the partition. Sectors never change once the partition is built.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Sector {
    /// Identifier, from 1 to N
    pub id: usize,

    /// Angle of the lower boundary.
    ///
    /// Units: degrees
    pub start_deg: f64,

    /// Angle of the upper boundary.
    ///
    /// Units: degrees
    pub end_deg: f64,

    /// Boundary line at `start_deg`
    pub lower: Line,

    /// Boundary line at `end_deg`, shared with the next sector's lower line
    pub upper: Line,
}

/// The full ring of sectors around the robot.
#[derive(Debug, Clone)]
pub struct SectorPartition {
    sectors: Vec<Sector>,

    width_deg: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Sector {
    /// True if the robot frame point lies in this sector.
    ///
    /// A point on the lower line belongs to the sector, a point on the upper line belongs to the
    /// next one. The origin belongs to no sector.
    pub fn contains(&self, point_rb: &Point2<f64>) -> bool {
        self.lower.relative_position(point_rb) <= 0.0
            && self.upper.relative_position(point_rb) > 0.0
    }

    /// Angle of the line splitting the sector in half.
    ///
    /// Units: radians
    pub fn bisector_rad(&self) -> f64 {
        (0.5 * (self.start_deg + self.end_deg)).to_radians()
    }
}

impl SectorPartition {
    /// Build the partition for the given sector width.
    ///
    /// The width must divide 360 exactly and be no more than 90 degrees, otherwise the two
    /// boundary lines no longer describe a single wedge.
    pub fn new(width_deg: f64) -> Result<Self, NavError> {
        if !(width_deg > 0.0 && width_deg <= 90.0) {
            return Err(NavError::InvalidSectorWidth(width_deg));
        }

        let num_sectors = (360.0 / width_deg).round() as usize;
        if (num_sectors as f64 * width_deg - 360.0).abs() > 1e-9 {
            return Err(NavError::InvalidSectorWidth(width_deg));
        }

        // One line per boundary so that neighbouring sectors share the exact same line
        let lines: Vec<Line> = (0..num_sectors)
            .map(|i| Line::through_origin((i as f64 * width_deg).to_radians()))
            .collect();

        let sectors = (0..num_sectors)
            .map(|i| Sector {
                id: i + 1,
                start_deg: i as f64 * width_deg,
                end_deg: (i + 1) as f64 * width_deg,
                lower: lines[i],
                upper: lines[(i + 1) % num_sectors],
            })
            .collect();

        Ok(Self { sectors, width_deg })
    }

    /// Number of sectors in the ring.
    pub fn len(&self) -> usize {
        self.sectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sectors.is_empty()
    }

    pub fn width_deg(&self) -> f64 {
        self.width_deg
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sector> {
        self.sectors.iter()
    }

    /// Get the sector with the given id.
    pub fn get(&self, id: usize) -> Option<&Sector> {
        match id {
            0 => None,
            _ => self.sectors.get(id - 1),
        }
    }

    /// Find the sector containing the robot frame point.
    pub fn find(&self, point_rb: &Point2<f64>) -> Option<&Sector> {
        self.sectors.iter().find(|s| s.contains(point_rb))
    }

    /// Shortest angular distance between two sectors going either way around the ring, or
    /// `None` if either id is not in the partition.
    ///
    /// Units: degrees
    pub fn ang_dist_deg(&self, id_a: usize, id_b: usize) -> Option<f64> {
        self.steps_between(id_a, id_b).map(|steps| steps as f64 * self.width_deg)
    }

    /// Shortest number of sector steps between two sectors, or `None` if either id is not in
    /// the partition.
    pub fn steps_between(&self, id_a: usize, id_b: usize) -> Option<usize> {
        let n = self.sectors.len();
        match (id_a, id_b) {
            (a, b) if (1..=n).contains(&a) && (1..=n).contains(&b) => {
                Some(ring_dist(a - 1, b - 1, n))
            }
            _ => None,
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    #[test]
    fn test_partition_tiles_circle() {
        for width in [1.0, 5.0, 10.0, 45.0, 90.0].iter() {
            let part = SectorPartition::new(*width).unwrap();

            assert_eq!(part.len(), (360.0 / width) as usize);
            assert_eq!(part.iter().next().unwrap().start_deg, 0.0);
            assert_eq!(part.iter().last().unwrap().end_deg, 360.0);

            let sectors: Vec<&Sector> = part.iter().collect();
            for pair in sectors.windows(2) {
                assert_eq!(pair[0].end_deg, pair[1].start_deg);
                assert_eq!(pair[0].upper, pair[1].lower);
                assert_eq!(pair[0].id + 1, pair[1].id);
            }
            assert_eq!(sectors[sectors.len() - 1].upper, sectors[0].lower);
        }
    }

    #[test]
    fn test_invalid_widths() {
        assert!(SectorPartition::new(0.0).is_err());
        assert!(SectorPartition::new(-5.0).is_err());
        assert!(SectorPartition::new(7.0).is_err());
        assert!(SectorPartition::new(120.0).is_err());
        assert!(SectorPartition::new(std::f64::NAN).is_err());
    }

    #[test]
    fn test_random_points_in_exactly_one_sector() {
        let part = SectorPartition::new(5.0).unwrap();
        let mut rng = StdRng::seed_from_u64(239);

        for _ in 0..10_000 {
            let ang_deg: f64 = rng.random_range(0.0..360.0);
            let range_m: f64 = rng.random_range(0.05..5.0);
            let point = Point2::new(
                range_m * ang_deg.to_radians().cos(),
                range_m * ang_deg.to_radians().sin(),
            );

            let containing: Vec<&Sector> = part.iter().filter(|s| s.contains(&point)).collect();
            assert_eq!(containing.len(), 1, "angle {} in {} sectors", ang_deg, containing.len());

            // Away from the boundaries the sector must be the one the angle says
            let frac = ang_deg / 5.0;
            if (frac - frac.round()).abs() > 1e-6 {
                assert_eq!(containing[0].id, frac.floor() as usize + 1);
            }
        }
    }

    #[test]
    fn test_boundary_points() {
        let part = SectorPartition::new(5.0).unwrap();

        // Exactly on the forward axis is the start of the first sector
        assert_eq!(part.find(&Point2::new(3.0, 0.0)).unwrap().id, 1);

        // Points on the axes belong to exactly one sector
        for p in [
            Point2::new(0.0, 2.0),
            Point2::new(-2.0, 0.0),
            Point2::new(0.0, -2.0),
        ]
        .iter()
        {
            assert_eq!(part.iter().filter(|s| s.contains(p)).count(), 1);
        }

        // The robot itself is in no sector
        assert!(part.find(&Point2::origin()).is_none());
    }

    #[test]
    fn test_bisector_and_distance() {
        let part = SectorPartition::new(5.0).unwrap();

        assert!((part.get(1).unwrap().bisector_rad() - 2.5f64.to_radians()).abs() < 1e-12);
        assert!(part.get(0).is_none());
        assert!(part.get(73).is_none());

        assert_eq!(part.ang_dist_deg(1, 1), Some(0.0));
        assert_eq!(part.ang_dist_deg(1, 72), Some(5.0));
        assert_eq!(part.ang_dist_deg(10, 1), Some(45.0));
        assert_eq!(part.ang_dist_deg(1, 37), Some(180.0));
        assert_eq!(part.ang_dist_deg(2, 70), Some(20.0));
    }

    #[test]
    fn test_distance_rejects_unknown_ids() {
        let part = SectorPartition::new(5.0).unwrap();

        assert_eq!(part.steps_between(0, 1), None);
        assert_eq!(part.steps_between(1, 0), None);
        assert_eq!(part.steps_between(73, 1), None);
        assert_eq!(part.ang_dist_deg(0, 0), None);
        assert_eq!(part.steps_between(72, 1), Some(1));
    }
}
