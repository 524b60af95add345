//! # Scene
//!
//! The ball and obstacles, each a disc moving in a straight line and bouncing off the edges of the
//! field.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::debug;
use nalgebra::{Point2, Vector2};
use ordered_float::NotNan;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::Serialize;

use super::{Params, SimError};
use crate::loc::Pose;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Number of tries at finding a free spot for a random obstacle.
const MAX_PLACEMENT_ATTEMPTS: usize = 100;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// The rectangle everything moves inside.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Field {
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MovingObstacle {
    pub position_m: Point2<f64>,

    pub velocity_ms: Vector2<f64>,

    pub radius_m: f64,
}

#[derive(Debug, Clone)]
pub struct Scene {
    pub field: Field,

    pub ball: MovingObstacle,

    pub obstacles: Vec<MovingObstacle>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl From<[f64; 4]> for Field {
    fn from(c: [f64; 4]) -> Self {
        Self {
            x_min: c[0],
            y_min: c[1],
            x_max: c[2],
            y_max: c[3],
        }
    }
}

impl Field {
    pub fn centre(&self) -> Point2<f64> {
        Point2::new(
            0.5 * (self.x_min + self.x_max),
            0.5 * (self.y_min + self.y_max),
        )
    }
}

impl MovingObstacle {
    pub fn new(position_m: Point2<f64>, velocity_ms: Vector2<f64>, radius_m: f64) -> Self {
        Self {
            position_m,
            velocity_ms,
            radius_m,
        }
    }

    /// Move for one tick.
    ///
    /// Each velocity component reverses once the disc has crossed the matching edge of the field.
    pub fn step(&mut self, dt_s: f64, field: &Field) {
        self.position_m += self.velocity_ms * dt_s;

        let r = self.radius_m;
        let p = self.position_m;

        if p.x < field.x_min + r || p.x > field.x_max - r {
            self.velocity_ms.x = -self.velocity_ms.x;
        }
        if p.y < field.y_min + r || p.y > field.y_max - r {
            self.velocity_ms.y = -self.velocity_ms.y;
        }
    }
}

impl Scene {
    /// Build the scene from the parameters.
    ///
    /// Explicit obstacles are placed as given, random obstacles and the ball (unless its start is
    /// given) are drawn from an RNG seeded from the parameters, so a seed always gives the same
    /// scene.
    pub fn from_params(params: &Params) -> Result<Self, SimError> {
        params.validate()?;

        let field = Field::from(params.field_corners_m);
        let robot = params.robot_start_pose();
        let mut rng = StdRng::seed_from_u64(params.seed);

        let ball_velocity = random_velocity(&mut rng, params.ball_speed_range_ms);
        let ball_position = match params.ball_start_m {
            Some([x, y]) => Point2::new(x, y),
            None => {
                let c = field.centre();
                Point2::new(
                    c.x + random_offset(&mut rng, params.ball_spread_m[0]),
                    c.y + random_offset(&mut rng, params.ball_spread_m[1]),
                )
            }
        };
        let ball = MovingObstacle::new(ball_position, ball_velocity, params.ball_radius_m);

        let mut obstacles: Vec<MovingObstacle> = params
            .obstacles
            .iter()
            .map(|o| {
                MovingObstacle::new(
                    Point2::new(o[0], o[1]),
                    Vector2::new(o[2], o[3]),
                    params.obstacle_radius_m,
                )
            })
            .collect();

        // Random obstacles start clear of the field edges, the robot and the ball
        let r = params.obstacle_radius_m;
        let inset = 2.0 * r;
        let too_small =
            field.x_max - field.x_min <= 2.0 * inset || field.y_max - field.y_min <= 2.0 * inset;
        if too_small && params.num_random_obstacles > 0 {
            return Err(SimError::InvalidParam("field too small for random obstacles"));
        }

        for _ in 0..params.num_random_obstacles {
            let mut position = Point2::origin();

            for _ in 0..MAX_PLACEMENT_ATTEMPTS {
                position = Point2::new(
                    rng.random_range((field.x_min + inset)..(field.x_max - inset)),
                    rng.random_range((field.y_min + inset)..(field.y_max - inset)),
                );

                let clear_of_robot =
                    robot.distance_to(&position) > 2.0 * (r + params.robot_radius_m);
                let clear_of_ball =
                    nalgebra::distance(&position, &ball.position_m) > r + ball.radius_m;

                if clear_of_robot && clear_of_ball {
                    break;
                }
            }

            let velocity = random_velocity(&mut rng, params.obstacle_speed_range_ms);
            obstacles.push(MovingObstacle::new(position, velocity, r));
        }

        debug!(
            "Scene: ball at ({:.2}, {:.2}), {} obstacles",
            ball.position_m.x,
            ball.position_m.y,
            obstacles.len()
        );

        Ok(Self {
            field,
            ball,
            obstacles,
        })
    }

    /// Move the ball and every obstacle for one tick.
    pub fn step(&mut self, dt_s: f64) {
        let field = self.field;

        self.ball.step(dt_s, &field);
        for o in self.obstacles.iter_mut() {
            o.step(dt_s, &field);
        }
    }

    pub fn obstacle_positions(&self) -> Vec<Point2<f64>> {
        self.obstacles.iter().map(|o| o.position_m).collect()
    }

    /// Smallest gap between the robot's edge and any obstacle's edge, `None` if there are no
    /// obstacles.
    pub fn closest_clearance_m(&self, pose: &Pose, robot_radius_m: f64) -> Option<f64> {
        self.obstacles
            .iter()
            .filter_map(|o| {
                NotNan::new(pose.distance_to(&o.position_m) - o.radius_m - robot_radius_m).ok()
            })
            .min()
            .map(NotNan::into_inner)
    }

    /// Distance between the robot's centre and the ball's centre.
    pub fn ball_distance_m(&self, pose: &Pose) -> f64 {
        pose.distance_to(&self.ball.position_m)
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Uniform offset in `[-range, range]`.
fn random_offset(rng: &mut StdRng, range: f64) -> f64 {
    match range > 0.0 {
        true => rng.random_range(-range..=range),
        false => 0.0,
    }
}

fn random_velocity(rng: &mut StdRng, range_ms: f64) -> Vector2<f64> {
    Vector2::new(random_offset(rng, range_ms), random_offset(rng, range_ms))
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_obstacle_bounces_off_edge() {
        let field = Field::from([-4.0, -2.5, 4.0, 2.5]);
        let mut o = MovingObstacle::new(Point2::new(3.8, 0.0), Vector2::new(1.0, 0.5), 0.14);

        o.step(0.1, &field);
        assert!((o.position_m.x - 3.9).abs() < 1e-12);
        assert_eq!(o.velocity_ms, Vector2::new(-1.0, 0.5));

        o.step(0.1, &field);
        assert!((o.position_m.x - 3.8).abs() < 1e-12);
        assert_eq!(o.velocity_ms, Vector2::new(-1.0, 0.5));
    }

    #[test]
    fn test_obstacles_stay_in_field() {
        let params = Params {
            num_random_obstacles: 10,
            obstacle_speed_range_ms: 1.0,
            ..Params::default()
        };
        let mut scene = Scene::from_params(&params).unwrap();

        for _ in 0..1000 {
            scene.step(0.1);
            for o in scene.obstacles.iter() {
                // Can overshoot by at most one tick of travel before bouncing back
                assert!(o.position_m.x.abs() <= 4.0 - 0.14 + 0.1 + 1e-9);
                assert!(o.position_m.y.abs() <= 2.5 - 0.14 + 0.1 + 1e-9);
            }
        }
    }

    #[test]
    fn test_seeded_scene_is_repeatable() {
        let params = Params::default();
        let a = Scene::from_params(&params).unwrap();
        let b = Scene::from_params(&params).unwrap();

        assert_eq!(a.ball, b.ball);
        assert_eq!(a.obstacles, b.obstacles);
        assert_eq!(a.obstacles.len(), 2);

        // Ball starts near the middle of the field
        assert!(a.ball.position_m.x.abs() <= 1.0);
        assert!(a.ball.position_m.y.abs() <= 2.0);

        let c = Scene::from_params(&Params {
            seed: 1,
            ..Params::default()
        })
        .unwrap();
        assert_ne!(a.ball, c.ball);
    }

    #[test]
    fn test_clearance() {
        let params = Params {
            obstacles: vec![[1.0, 0.0, 0.0, 0.0], [0.0, 2.0, 0.0, 0.0]],
            num_random_obstacles: 0,
            ball_start_m: Some([3.0, 0.0]),
            ..Params::default()
        };
        let scene = Scene::from_params(&params).unwrap();
        let pose = Pose::new(0.0, 0.0, 0.0);

        assert!((scene.closest_clearance_m(&pose, 0.14).unwrap() - 0.72).abs() < 1e-12);
        assert!((scene.ball_distance_m(&pose) - 3.0).abs() < 1e-12);

        let empty = Scene::from_params(&Params {
            num_random_obstacles: 0,
            ..Params::default()
        })
        .unwrap();
        assert!(empty.closest_clearance_m(&pose, 0.14).is_none());
    }
}
