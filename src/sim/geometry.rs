//! Axis-aligned rectangles and circles in surface coordinates
//!
//! y grows downward, matching the drawing surface.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle given by its min/max corners
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Rectangle from top-left corner and size
    pub fn from_xywh(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            min: Vec2::new(x, y),
            max: Vec2::new(x + w, y + h),
        }
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    #[inline]
    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    /// Shrink horizontally by `pad` on both sides
    pub fn inset_x(&self, pad: f32) -> Self {
        Self {
            min: Vec2::new(self.min.x + pad, self.min.y),
            max: Vec2::new(self.max.x - pad, self.max.y),
        }
    }

    /// Point of the rectangle closest to `p`
    #[inline]
    pub fn closest_point(&self, p: Vec2) -> Vec2 {
        p.clamp(self.min, self.max)
    }
}

/// A circle, used as the player's hitbox
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    pub center: Vec2,
    pub radius: f32,
}

impl Circle {
    pub fn new(center: Vec2, radius: f32) -> Self {
        Self { center, radius }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closest_point_outside_corner() {
        let r = Rect::from_xywh(10.0, 10.0, 20.0, 20.0);
        assert_eq!(r.closest_point(Vec2::new(0.0, 0.0)), Vec2::new(10.0, 10.0));
        assert_eq!(r.closest_point(Vec2::new(40.0, 15.0)), Vec2::new(30.0, 15.0));
    }

    #[test]
    fn test_closest_point_inside_is_identity() {
        let r = Rect::from_xywh(0.0, 0.0, 10.0, 10.0);
        let p = Vec2::new(3.0, 7.0);
        assert_eq!(r.closest_point(p), p);
    }

    #[test]
    fn test_inset_x() {
        let r = Rect::from_xywh(100.0, 0.0, 120.0, 50.0).inset_x(15.0);
        assert_eq!(r.min.x, 115.0);
        assert_eq!(r.max.x, 205.0);
        assert_eq!(r.height(), 50.0);
    }
}
