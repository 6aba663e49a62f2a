//! Quadratic Bezier curves for star flight paths

use glam::Vec2;

/// Point on the quadratic Bezier through `start`, `control`, `end` at `t`.
///
/// At `t == 1.0` the start and control weights are exactly zero, so the
/// result is bit-for-bit `end`.
#[inline]
pub fn quadratic_bezier(start: Vec2, control: Vec2, end: Vec2, t: f32) -> Vec2 {
    let inv = 1.0 - t;
    start * (inv * inv) + control * (2.0 * inv * t) + end * (t * t)
}
