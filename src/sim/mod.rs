//! Frame-stepped simulation module
//!
//! All star and particle behavior lives here. This module must stay
//! host-agnostic:
//! - One fixed step per `update()` call, never wall-clock time
//! - Injected random source only
//! - Stable iteration order (insertion order)
//! - No platform dependencies; drawing goes through the `Canvas` trait

pub mod bezier;
pub mod query;
pub mod rng;
pub mod scene;
pub mod state;
pub mod tick;

pub use bezier::quadratic_bezier;
pub use query::{hit_test, k_nearest};
pub use rng::{RandomSource, SeededRng, SequenceRng};
pub use scene::{CollectCallback, StarScene};
pub use state::{Bounds, Flight, Particle, SceneState, Star, StarId, StarState};
pub use tick::{Landing, tick};
