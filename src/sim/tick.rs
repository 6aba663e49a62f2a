//! Per-frame simulation step
//!
//! One call advances every entity by exactly one tick. Stars are processed
//! before particles so a landing burst is already in the particle set when
//! the frame is drawn.

use glam::Vec2;

use super::rng::RandomSource;
use super::state::{SceneState, StarId, StarState};
use crate::colors;
use crate::tuning::Tuning;

/// A star that reached the deposit point during a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Landing {
    pub id: StarId,
    pub lucky: bool,
}

/// Advance the scene by one tick, returning the stars that landed
pub fn tick<R: RandomSource>(state: &mut SceneState, rng: &mut R, tuning: &Tuning) -> Vec<Landing> {
    state.time += f64::from(tuning.time_step);
    state.time_ticks += 1;

    let time = state.time;
    let mut landings = Vec::new();

    for star in &mut state.stars {
        match star.state {
            StarState::Floating => star.drift(time, tuning),
            StarState::Flying(ref mut flight) => {
                let landed = flight.advance(tuning.flight_step);
                star.pos = flight.position();
                if landed {
                    star.state = StarState::Collected;
                    landings.push(Landing {
                        id: star.id,
                        lucky: star.lucky,
                    });
                }
            }
            StarState::Collected => {}
        }
    }

    if !landings.is_empty() {
        let mouth = state.deposit - Vec2::new(0.0, tuning.deposit_burst_lift);
        for _ in &landings {
            state.spawn_burst(mouth, tuning.deposit_burst, colors::SPARK_DEPOSIT, rng, tuning);
        }
    }

    // Stable in-place removal: every particle is stepped exactly once
    let decay = tuning.particle_decay;
    state.particles.retain_mut(|p| {
        p.step(decay);
        p.is_alive()
    });

    landings
}
