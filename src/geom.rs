//! Planar geometry helpers shared by every game variant
//!
//! Pure functions over `glam::Vec2`. Comparisons should prefer
//! [`distance_sq`] to skip the square root.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::{FIELD_HEIGHT, FIELD_WIDTH};

/// Euclidean distance between two points
#[inline]
pub fn distance(a: Vec2, b: Vec2) -> f32 {
    (b - a).length()
}

/// Squared distance between two points
#[inline]
pub fn distance_sq(a: Vec2, b: Vec2) -> f32 {
    (b - a).length_squared()
}

/// Unit vector pointing from `from` toward `to`
///
/// Coincident points yield `Vec2::ZERO` instead of NaN.
#[inline]
pub fn direction(from: Vec2, to: Vec2) -> Vec2 {
    (to - from).normalize_or_zero()
}

/// Minimum distance from point `p` to the segment `a..b`
///
/// Degenerate segments (a == b) collapse to point distance.
pub fn point_segment_distance(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    let seg = b - a;
    let rel = p - a;

    let along = rel.dot(seg);
    if along <= 0.0 {
        return distance(p, a);
    }
    let seg_len_sq = seg.length_squared();
    if seg_len_sq <= along {
        return distance(p, b);
    }

    let t = along / seg_len_sq;
    distance(p, a + seg * t)
}

/// Minimum distance from `p` to a polyline given as consecutive waypoints
///
/// Returns `f32::INFINITY` for polylines with fewer than two points.
pub fn polyline_distance(p: Vec2, points: &[Vec2]) -> f32 {
    points
        .windows(2)
        .map(|seg| point_segment_distance(p, seg[0], seg[1]))
        .fold(f32::INFINITY, f32::min)
}

/// Rectangular playfield anchored at the origin (screen coordinates, y down)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Playfield {
    pub width: f32,
    pub height: f32,
}

impl Default for Playfield {
    fn default() -> Self {
        Self {
            width: FIELD_WIDTH,
            height: FIELD_HEIGHT,
        }
    }
}

impl Playfield {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }

    /// Point at fractional coordinates (0..1 on each axis)
    #[inline]
    pub fn at(&self, fx: f32, fy: f32) -> Vec2 {
        Vec2::new(self.width * fx, self.height * fy)
    }

    /// Clamp a point so a circle of `radius` stays fully inside
    pub fn clamp_inside(&self, p: Vec2, radius: f32) -> Vec2 {
        let min = Vec2::splat(radius);
        let max = Vec2::new(self.width - radius, self.height - radius).max(min);
        p.clamp(min, max)
    }

    /// Whether `p` lies inside the playfield grown by `margin` on every side
    ///
    /// Strict on all edges, a point exactly on the expanded border is outside.
    pub fn contains_expanded(&self, p: Vec2, margin: f32) -> bool {
        p.x > -margin && p.x < self.width + margin && p.y > -margin && p.y < self.height + margin
    }
}
