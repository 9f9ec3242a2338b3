//! Fixed-geometry guesses about where a subject sits in a photo.
//!
//! Neither routine looks at pixels. They exist for masking experiments and are
//! not part of the relay path.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaceRegion {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl FaceRegion {
    /// Centered rectangle, 0.4 of the short side wide and 1.2 times as tall,
    /// shifted above the vertical middle.
    pub fn estimate(image_width: f64, image_height: f64) -> Self {
        let width = image_width.min(image_height) * 0.4;
        let height = width * 1.2;
        Self {
            x: (image_width - width) / 2.0,
            y: (image_height - height) / 2.5,
            width,
            height,
        }
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }
}

/// Area the background mask keeps (painted black); everything else gets edited.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PersonEllipse {
    pub center_x: f64,
    pub center_y: f64,
    pub radius_x: f64,
    pub radius_y: f64,
}

impl PersonEllipse {
    pub fn estimate(image_width: f64, image_height: f64) -> Self {
        let person_width = (image_width * 0.6).min(image_height * 0.8);
        let person_height = (image_height * 0.9).min(image_width * 1.2);
        Self {
            center_x: image_width / 2.0,
            center_y: image_height / 2.0,
            radius_x: person_width / 2.0,
            radius_y: person_height / 2.0,
        }
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        if self.radius_x <= 0.0 || self.radius_y <= 0.0 {
            return false;
        }
        let dx = (x - self.center_x) / self.radius_x;
        let dy = (y - self.center_y) / self.radius_y;
        dx * dx + dy * dy <= 1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn face_region_on_landscape_image() {
        let face = FaceRegion::estimate(1000.0, 500.0);
        assert_eq!(face.width, 200.0);
        assert_eq!(face.height, 240.0);
        assert_eq!(face.x, 400.0);
        assert_eq!(face.y, 104.0);
        assert!(face.contains(500.0, 200.0));
        assert!(!face.contains(10.0, 10.0));
    }

    #[test]
    fn face_region_on_square_image() {
        let face = FaceRegion::estimate(1024.0, 1024.0);
        assert!((face.width - 409.6).abs() < 1e-9);
        assert!((face.x - 307.2).abs() < 1e-9);
    }

    #[test]
    fn ellipse_on_portrait_image() {
        let ellipse = PersonEllipse::estimate(600.0, 800.0);
        assert_eq!(ellipse.center_x, 300.0);
        assert_eq!(ellipse.center_y, 400.0);
        // min(360, 640) and min(720, 720)
        assert_eq!(ellipse.radius_x, 180.0);
        assert_eq!(ellipse.radius_y, 360.0);
        assert!(ellipse.contains(300.0, 400.0));
        assert!(!ellipse.contains(0.0, 0.0));
        assert!(ellipse.contains(480.0, 400.0));
        assert!(!ellipse.contains(481.0, 400.0));
    }

    #[test]
    fn degenerate_image_keeps_nothing() {
        let ellipse = PersonEllipse::estimate(0.0, 0.0);
        assert!(!ellipse.contains(0.0, 0.0));
    }
}
