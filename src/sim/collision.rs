//! Collision geometry for the rectangular play field
//!
//! Everything that can be hit (paddle, bricks, boss, pickups, lasers) is an axis-aligned
//! rectangle; the ball is a circle. Malformed rectangles never collide.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle, origin at the top-left corner (screen coordinates, y down)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Finite coordinates and non-negative extents. Zero-size rectangles are valid.
    pub fn is_valid(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
            && self.width >= 0.0
            && self.height >= 0.0
    }

    #[inline]
    pub fn min(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    #[inline]
    pub fn max(&self) -> Vec2 {
        Vec2::new(self.x + self.width, self.y + self.height)
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Strict overlap test (touching edges do not overlap)
    pub fn overlaps(&self, other: &Rect) -> bool {
        if !self.is_valid() || !other.is_valid() {
            return false;
        }
        self.x < other.x + other.width
            && self.x + self.width > other.x
            && self.y < other.y + other.height
            && self.y + self.height > other.y
    }

    /// Point on (or inside) the rectangle closest to `p`
    #[inline]
    pub fn closest_point(&self, p: Vec2) -> Vec2 {
        p.clamp(self.min(), self.max())
    }
}

/// Circle vs axis-aligned rectangle
///
/// Clamps the circle center onto the rectangle and compares the squared distance to the
/// squared radius. Returns false for rectangles without usable numeric bounds.
pub fn circle_rect_collision(center: Vec2, radius: f32, rect: &Rect) -> bool {
    if !rect.is_valid() || !center.is_finite() || !radius.is_finite() {
        return false;
    }
    let nearest = rect.closest_point(center);
    center.distance_squared(nearest) <= radius * radius
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_circle_centered_inside_collides() {
        let rect = Rect::new(100.0, 100.0, 60.0, 30.0);
        assert!(circle_rect_collision(rect.center(), 8.0, &rect));
    }

    #[test]
    fn test_circle_touching_edge_collides() {
        let rect = Rect::new(100.0, 100.0, 60.0, 30.0);
        // Exactly radius away from the left edge
        assert!(circle_rect_collision(Vec2::new(92.0, 115.0), 8.0, &rect));
        assert!(!circle_rect_collision(Vec2::new(91.9, 115.0), 8.0, &rect));
    }

    #[test]
    fn test_corner_uses_euclidean_distance() {
        let rect = Rect::new(0.0, 0.0, 10.0, 10.0);
        // 6/6 from the corner: inside the bounding square but outside the rounded corner
        assert!(!circle_rect_collision(Vec2::new(16.0, 16.0), 8.0, &rect));
        assert!(circle_rect_collision(Vec2::new(15.0, 15.0), 8.0, &rect));
    }

    #[test]
    fn test_invalid_geometry_never_collides() {
        let center = Vec2::new(5.0, 5.0);
        assert!(!circle_rect_collision(center, 8.0, &Rect::new(f32::NAN, 0.0, 10.0, 10.0)));
        assert!(!circle_rect_collision(center, 8.0, &Rect::new(0.0, 0.0, f32::INFINITY, 10.0)));
        assert!(!circle_rect_collision(center, 8.0, &Rect::new(0.0, 0.0, -10.0, 10.0)));
    }

    #[test]
    fn test_zero_size_rect_is_legal() {
        let rect = Rect::new(10.0, 10.0, 0.0, 0.0);
        assert!(rect.is_valid());
        assert!(circle_rect_collision(Vec2::new(14.0, 10.0), 8.0, &rect));
        assert!(!circle_rect_collision(Vec2::new(30.0, 10.0), 8.0, &rect));
    }

    #[test]
    fn test_rect_overlap() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(a.overlaps(&Rect::new(5.0, 5.0, 10.0, 10.0)));
        assert!(!a.overlaps(&Rect::new(10.0, 0.0, 10.0, 10.0)));
        assert!(!a.overlaps(&Rect::new(f32::NAN, 0.0, 10.0, 10.0)));
    }

    proptest! {
        #[test]
        fn prop_far_circle_never_collides(
            x in -500.0f32..500.0, y in -500.0f32..500.0,
            w in 0.0f32..200.0, h in 0.0f32..200.0,
            r in 0.5f32..20.0, angle in 0.0f32..std::f32::consts::TAU,
        ) {
            let rect = Rect::new(x, y, w, h);
            // Place the center outside the rectangle expanded by the radius
            let reach = (w * w + h * h).sqrt() + r + 1.0;
            let center = rect.center() + Vec2::new(angle.cos(), angle.sin()) * reach;
            prop_assert!(!circle_rect_collision(center, r, &rect));
        }

        #[test]
        fn prop_center_inside_always_collides(
            x in -500.0f32..500.0, y in -500.0f32..500.0,
            w in 0.0f32..200.0, h in 0.0f32..200.0,
            tx in 0.0f32..=1.0, ty in 0.0f32..=1.0, r in 0.5f32..20.0,
        ) {
            let rect = Rect::new(x, y, w, h);
            let center = Vec2::new(x + w * tx, y + h * ty);
            prop_assert!(circle_rect_collision(center, r, &rect));
        }

        #[test]
        fn prop_mirror_symmetry(
            cx in -100.0f32..100.0, cy in -100.0f32..100.0,
            w in 0.0f32..80.0, h in 0.0f32..80.0, r in 0.5f32..20.0,
        ) {
            // Mirroring both shapes across x = 0 must not change the answer
            let rect = Rect::new(10.0, -20.0, w, h);
            let mirrored = Rect::new(-10.0 - w, -20.0, w, h);
            prop_assert_eq!(
                circle_rect_collision(Vec2::new(cx, cy), r, &rect),
                circle_rect_collision(Vec2::new(-cx, cy), r, &mirrored)
            );
        }
    }
}
