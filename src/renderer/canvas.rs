//! Drawing surface abstraction and the scene painter

use glam::Vec2;

use crate::colors::{self, with_alpha};
use crate::sim::state::{SceneState, StarState};

/// Minimal immediate-mode 2D surface in logical pixels
pub trait Canvas {
    /// Drop everything drawn in the previous frame
    fn clear(&mut self, width: f32, height: f32);
    fn fill_circle(&mut self, center: Vec2, radius: f32, color: [f32; 4]);
    /// Disc fading from `inner` at the center to `outer` at `radius`
    fn radial_glow(&mut self, center: Vec2, radius: f32, inner: [f32; 4], outer: [f32; 4]);
}

/// Pulsing opacity of a floating star
#[inline]
pub fn pulse_opacity(time: f64, phase: f32) -> f32 {
    0.5 + (time * 3.0 + f64::from(phase)).sin() as f32 * 0.5
}

/// Paint one frame of the scene.
///
/// Collected stars stay in the list but are skipped. Flying stars shrink
/// with `1 - progress`. Reads `time` only; never mutates the scene.
pub fn draw_scene(canvas: &mut dyn Canvas, state: &SceneState) {
    canvas.clear(state.bounds.width, state.bounds.height);

    for star in &state.stars {
        let scale = match &star.state {
            StarState::Collected => continue,
            StarState::Floating => 1.0,
            StarState::Flying(flight) => 1.0 - flight.progress.min(1.0),
        };
        let r = star.radius * scale;
        if r <= 0.0 {
            continue;
        }

        let (glow, alpha) = if star.lucky {
            (colors::GLOW_LUCKY, 0.8)
        } else {
            (colors::GLOW_COMMON, pulse_opacity(state.time, star.phase))
        };
        canvas.radial_glow(star.pos, r * 3.0, with_alpha(glow, alpha), colors::GLOW_EDGE);
        canvas.fill_circle(star.pos, r, colors::STAR_CORE);
    }

    for p in &state.particles {
        if p.size <= 0.0 {
            continue;
        }
        canvas.fill_circle(p.pos, p.size, with_alpha(p.color, p.life_ratio()));
    }
}
