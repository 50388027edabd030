//! Disk and rectangle tests over battlefield coordinates

use super::vec2::Vec2;

/// Axis-aligned battlefield rectangle anchored at the origin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Inclusive on every edge
    #[inline]
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= 0.0 && p.x <= self.width && p.y >= 0.0 && p.y <= self.height
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }

    #[inline]
    pub fn mirror(&self, p: Vec2) -> Vec2 {
        p.mirrored(self.width, self.height)
    }
}

#[inline]
pub fn in_disk(center: Vec2, radius: f32, p: Vec2) -> bool {
    center.distance_sq_to(p) <= radius * radius
}

/// True when all four corners of the rectangle spanned by `min`/`max` lie in the disk
pub fn rect_in_disk(center: Vec2, radius: f32, min: Vec2, max: Vec2) -> bool {
    in_disk(center, radius, min)
        && in_disk(center, radius, max)
        && in_disk(center, radius, Vec2::new(min.x, max.y))
        && in_disk(center, radius, Vec2::new(max.x, min.y))
}
