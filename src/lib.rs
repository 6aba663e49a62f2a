//! Star Bottle - a star-collecting canvas mini-game
//!
//! Core modules:
//! - `sim`: Frame-stepped simulation (stars, particles, queries, interactions)
//! - `renderer`: Canvas abstraction, vertex tessellation and WebGPU upload
//! - `platform`: Host frame scheduling seam
//! - `tuning`: Data-driven scene constants and game rules
//! - `game`: Mini-game rules layered over the scene (goal, cooldowns, phases)

pub mod game;
pub mod platform;
pub mod renderer;
pub mod sim;
pub mod tuning;

pub use game::{GameEvent, GamePhase, StarBottleGame};
pub use sim::{StarId, StarScene};
pub use tuning::{GameRules, Tuning, TuningError};

use glam::Vec2;

/// Scene configuration constants
pub mod consts {
    /// Nominal display refresh rate the per-step constants are tuned for
    pub const FRAME_RATE: f32 = 60.0;
    /// Seconds covered by one simulation step at the nominal rate
    pub const FRAME_DT: f32 = 1.0 / FRAME_RATE;

    /// Smallest logical surface dimension accepted by `resize`
    pub const MIN_SURFACE_SIZE: f32 = 1.0;

    /// Backing-store scale used by the web host (retina canvas)
    pub const BACKING_SCALE: f32 = 2.0;
    /// Share of the viewport height the play surface occupies
    pub const VIEWPORT_HEIGHT_SHARE: f32 = 0.65;
}

/// RGBA colors shared by the simulation (particle tint) and the renderer
pub mod colors {
    pub const STAR_CORE: [f32; 4] = [1.0, 1.0, 1.0, 1.0];
    pub const GLOW_COMMON: [f32; 4] = [1.0, 1.0, 1.0, 0.8];
    pub const GLOW_LUCKY: [f32; 4] = [0.984, 0.749, 0.141, 0.8];
    pub const GLOW_EDGE: [f32; 4] = [1.0, 1.0, 1.0, 0.0];

    /// Impact spark of a common star
    pub const SPARK_WHITE: [f32; 4] = [1.0, 1.0, 1.0, 1.0];
    /// Impact spark of a lucky star, scatter and finale bursts
    pub const SPARK_GOLD: [f32; 4] = [0.984, 0.749, 0.141, 1.0];
    /// Burst at the bottle mouth when a star lands (#fcd34d)
    pub const SPARK_DEPOSIT: [f32; 4] = [0.988, 0.827, 0.302, 1.0];

    /// Scale the alpha channel of a color
    #[inline]
    pub fn with_alpha(color: [f32; 4], alpha: f32) -> [f32; 4] {
        [color[0], color[1], color[2], color[3] * alpha.clamp(0.0, 1.0)]
    }
}

/// Clamp into `[lo, hi]`, collapsing to `lo` when the range is inverted.
///
/// `f32::clamp` panics on an inverted range, which a tiny surface produces
/// once play-area margins are subtracted.
#[inline]
pub fn clamp_band(value: f32, lo: f32, hi: f32) -> f32 {
    if hi < lo {
        lo
    } else {
        value.clamp(lo, hi)
    }
}

/// Unit vector at the given angle
#[inline]
pub fn unit_from_angle(theta: f32) -> Vec2 {
    Vec2::new(theta.cos(), theta.sin())
}
