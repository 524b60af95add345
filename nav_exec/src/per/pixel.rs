//! # Pixel frame
//!
//! Overhead camera images put the origin at the top left corner with the vertical axis pointing
//! down. The world frame is centred on the image with Y pointing up:
//!
//! ```text
//! u = u0 + k * x
//! v = v0 - k * y
//! ```

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use nalgebra::Point2;
use serde::Deserialize;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct PixelFrame {
    /// Scale between image and world.
    ///
    /// Units: pixels/meter
    pub pixels_per_m: f64,

    /// Units: pixels
    pub width_px: u32,

    /// Units: pixels
    pub height_px: u32,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for PixelFrame {
    fn default() -> Self {
        Self {
            pixels_per_m: 100.0,
            width_px: 800,
            height_px: 500,
        }
    }
}

impl PixelFrame {
    /// Pixel position of the world origin.
    pub fn centre_px(&self) -> Point2<f64> {
        Point2::new(self.width_px as f64 / 2.0, self.height_px as f64 / 2.0)
    }

    /// Convert an image position into the world frame.
    pub fn to_metric(&self, pixel: &Point2<f64>) -> Point2<f64> {
        let c = self.centre_px();
        Point2::new(
            (pixel.x - c.x) / self.pixels_per_m,
            (c.y - pixel.y) / self.pixels_per_m,
        )
    }

    /// Convert a world position into the image.
    pub fn to_pixel(&self, point_m: &Point2<f64>) -> Point2<f64> {
        let c = self.centre_px();
        Point2::new(
            c.x + point_m.x * self.pixels_per_m,
            c.y - point_m.y * self.pixels_per_m,
        )
    }

    /// True if the image position is inside the image.
    pub fn contains(&self, pixel: &Point2<f64>) -> bool {
        pixel.x >= 0.0
            && pixel.y >= 0.0
            && pixel.x < self.width_px as f64
            && pixel.y < self.height_px as f64
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_pixel_conversion() {
        let frame = PixelFrame::default();

        assert_eq!(frame.to_metric(&Point2::new(400.0, 250.0)), Point2::origin());

        // Top left of the image is the far corner of the field
        assert_eq!(frame.to_metric(&Point2::new(0.0, 0.0)), Point2::new(-4.0, 2.5));
        assert_eq!(frame.to_pixel(&Point2::new(4.0, -2.5)), Point2::new(800.0, 500.0));

        let p = Point2::new(1.23, -0.45);
        assert!((frame.to_metric(&frame.to_pixel(&p)) - p).norm() < 1e-12);

        assert!(frame.contains(&Point2::new(0.0, 0.0)));
        assert!(!frame.contains(&Point2::new(800.0, 10.0)));
        assert!(!frame.contains(&Point2::new(10.0, -1.0)));
    }
}
