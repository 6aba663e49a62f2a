//! Entity model and scene state
//!
//! Stars drift, fly and land; particles burst and fade. Neither knows about
//! rendering or the host.

use std::f32::consts::TAU;
use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::bezier::quadratic_bezier;
use super::rng::RandomSource;
use crate::consts::MIN_SURFACE_SIZE;
use crate::tuning::Tuning;
use crate::{clamp_band, unit_from_angle};

/// Stable identity of a star within one session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StarId(pub u32);

impl fmt::Display for StarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "star#{}", self.0)
    }
}

/// Logical size of the play surface (CSS pixels, not backing-store pixels)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    /// Dimensions below 1x1 (or NaN) are raised to 1x1
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width: sane_dimension(width),
            height: sane_dimension(height),
        }
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }

    /// Bottle mouth all flying stars converge on
    pub fn deposit_point(&self, tuning: &Tuning) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height - tuning.deposit_offset)
    }

    /// Clamp a home position into the play area (inside the side margins,
    /// above the deposit zone). On a surface too small for the margins the
    /// result is still kept inside the bounds.
    pub fn clamp_home(&self, home: Vec2, tuning: &Tuning) -> Vec2 {
        let x = clamp_band(home.x, tuning.play_margin, self.width - tuning.play_margin);
        let y = clamp_band(
            home.y,
            tuning.play_margin,
            self.height - tuning.play_bottom_margin,
        );
        Vec2::new(x.clamp(0.0, self.width), y.clamp(0.0, self.height))
    }

    pub fn contains(&self, point: Vec2) -> bool {
        (0.0..=self.width).contains(&point.x) && (0.0..=self.height).contains(&point.y)
    }
}

fn sane_dimension(value: f32) -> f32 {
    if value.is_finite() {
        value.max(MIN_SURFACE_SIZE)
    } else {
        MIN_SURFACE_SIZE
    }
}

/// Parameters of an in-progress flight to the deposit point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Flight {
    pub start: Vec2,
    pub control: Vec2,
    pub end: Vec2,
    /// 0-1, advanced by a fixed step per tick
    pub progress: f32,
}

impl Flight {
    /// Current point on the arc
    pub fn position(&self) -> Vec2 {
        quadratic_bezier(self.start, self.control, self.end, self.progress.min(1.0))
    }

    /// Advance by `step`; returns true once the end is reached
    pub fn advance(&mut self, step: f32) -> bool {
        self.progress = (self.progress + step).min(1.0);
        self.progress >= 1.0
    }
}

/// Lifecycle of a star. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum StarState {
    /// Drifting around its home position, selectable
    Floating,
    /// Travelling along a Bezier arc to the deposit point
    Flying(Flight),
    /// Landed; kept for identity lookups but never drawn
    Collected,
}

impl StarState {
    /// Position in the lifecycle (0 floating, 1 flying, 2 collected)
    pub fn stage(&self) -> u8 {
        match self {
            StarState::Floating => 0,
            StarState::Flying(_) => 1,
            StarState::Collected => 2,
        }
    }
}

/// A collectible star
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Star {
    pub id: StarId,
    pub pos: Vec2,
    /// Drift anchor; relocated by scatter and resize
    pub home: Vec2,
    pub radius: f32,
    pub lucky: bool,
    /// Phase offset for drift and pulsing (radians)
    pub phase: f32,
    /// Per-star drift speed multiplier
    pub drift_seed: f32,
    pub state: StarState,
}

impl Star {
    /// Place a new floating star somewhere in the upper spawn band.
    ///
    /// Draw order: x, y, radius, phase, drift seed.
    pub fn spawn<R: RandomSource>(
        id: StarId,
        bounds: &Bounds,
        lucky: bool,
        rng: &mut R,
        tuning: &Tuning,
    ) -> Self {
        let x = rng.next_f32() * bounds.width;
        let y = rng.next_f32() * bounds.height * tuning.spawn_band;
        let [lo, hi] = if lucky {
            tuning.lucky_radius
        } else {
            tuning.common_radius
        };
        let radius = rng.range(lo, hi);
        let phase = rng.next_f32() * TAU;
        let drift_seed = rng.range(tuning.drift_seed[0], tuning.drift_seed[1]);

        let pos = Vec2::new(x, y);
        Self {
            id,
            pos,
            home: pos,
            radius,
            lucky,
            phase,
            drift_seed,
            state: StarState::Floating,
        }
    }

    #[inline]
    pub fn is_floating(&self) -> bool {
        matches!(self.state, StarState::Floating)
    }

    #[inline]
    pub fn is_collected(&self) -> bool {
        matches!(self.state, StarState::Collected)
    }

    pub fn flight(&self) -> Option<&Flight> {
        match &self.state {
            StarState::Flying(flight) => Some(flight),
            _ => None,
        }
    }

    /// Launch toward `target` along an upward-bowing arc.
    ///
    /// Only a floating star can take off; any other state is left untouched
    /// and `false` is returned. Draw order: lateral jitter, lift.
    pub fn begin_flight<R: RandomSource>(
        &mut self,
        target: Vec2,
        rng: &mut R,
        tuning: &Tuning,
    ) -> bool {
        if !self.is_floating() {
            return false;
        }
        let start = self.pos;
        let mid_x = (start.x + target.x) / 2.0;
        let lift = rng.range(tuning.flight_arc_lift[0], tuning.flight_arc_lift[1]);
        let control = Vec2::new(
            mid_x + rng.centered() * tuning.flight_arc_spread,
            start.y.min(target.y) - lift,
        );
        self.state = StarState::Flying(Flight {
            start,
            control,
            end: target,
            progress: 0.0,
        });
        true
    }

    /// Ease toward home plus a time-based wobble
    pub fn drift(&mut self, time: f64, tuning: &Tuning) {
        let t = time * f64::from(self.drift_seed);
        let phase = f64::from(self.phase);
        let offset = Vec2::new(
            (t + phase).sin() as f32 * tuning.drift_amplitude[0],
            (t * 0.5 + phase).cos() as f32 * tuning.drift_amplitude[1],
        );
        self.pos += (self.home + offset - self.pos) * tuning.drift_smoothing;
    }

    /// Make the star lucky and at least `min_radius` wide. Never reverts.
    pub fn make_lucky(&mut self, min_radius: f32) {
        self.lucky = true;
        self.radius = self.radius.max(min_radius);
    }
}

/// A short-lived visual spark
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub color: [f32; 4],
    /// Remaining life, counts down from `max_life`
    pub life: f32,
    pub max_life: f32,
    pub size: f32,
}

impl Particle {
    /// Spark flying off in a random direction with a slight upward bias.
    ///
    /// Draw order: angle, speed, lifetime, size.
    pub fn spawn<R: RandomSource>(
        origin: Vec2,
        color: [f32; 4],
        rng: &mut R,
        tuning: &Tuning,
    ) -> Self {
        let angle = rng.next_f32() * TAU;
        let speed = rng.next_f32() * tuning.particle_speed;
        let vel = unit_from_angle(angle) * speed - Vec2::new(0.0, tuning.particle_lift);
        let max_life = rng.range(tuning.particle_life[0], tuning.particle_life[1]);
        let size = rng.next_f32() * tuning.particle_size;
        Self {
            pos: origin,
            vel,
            color,
            life: max_life,
            max_life,
            size,
        }
    }

    /// Integrate one tick
    pub fn step(&mut self, decay: f32) {
        self.pos += self.vel;
        self.life -= decay;
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        self.life > 0.0
    }

    /// Remaining life as a 0-1 ratio
    pub fn life_ratio(&self) -> f32 {
        if self.max_life > 0.0 {
            (self.life / self.max_life).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

/// Everything the simulation owns
#[derive(Debug, Clone)]
pub struct SceneState {
    pub bounds: Bounds,
    pub deposit: Vec2,
    /// In insertion order; later entries draw on top
    pub stars: Vec<Star>,
    pub particles: Vec<Particle>,
    /// Drift clock, advanced by a fixed increment per tick. Kept in f64 so
    /// the increment stays exact over long sessions.
    pub time: f64,
    /// Simulation tick counter
    pub time_ticks: u64,
    next_id: u32,
}

impl SceneState {
    pub fn new(bounds: Bounds, tuning: &Tuning) -> Self {
        Self {
            bounds,
            deposit: bounds.deposit_point(tuning),
            stars: Vec::new(),
            particles: Vec::new(),
            time: 0.0,
            time_ticks: 0,
            next_id: 1,
        }
    }

    /// Allocate a new star id; ids are never reused
    pub fn next_star_id(&mut self) -> StarId {
        let id = StarId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        id
    }

    pub fn star(&self, id: StarId) -> Option<&Star> {
        self.stars.iter().find(|s| s.id == id)
    }

    pub fn star_mut(&mut self, id: StarId) -> Option<&mut Star> {
        self.stars.iter_mut().find(|s| s.id == id)
    }

    /// Spawn `count` particles at `origin`, evicting the oldest past the cap
    pub fn spawn_burst<R: RandomSource>(
        &mut self,
        origin: Vec2,
        count: usize,
        color: [f32; 4],
        rng: &mut R,
        tuning: &Tuning,
    ) {
        self.particles.reserve(count);
        for _ in 0..count {
            self.particles.push(Particle::spawn(origin, color, rng, tuning));
        }
        if self.particles.len() > tuning.max_particles {
            let overflow = self.particles.len() - tuning.max_particles;
            self.particles.drain(..overflow);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::rng::SequenceRng;

    #[test]
    fn test_spawn_exact_placement() {
        let tuning = Tuning::default();
        let bounds = Bounds::new(400.0, 300.0);
        let mut rng = SequenceRng::new(vec![0.5, 0.5, 0.0, 0.25, 0.0]);
        let star = Star::spawn(StarId(1), &bounds, false, &mut rng, &tuning);
        assert_eq!(star.pos, Vec2::new(200.0, 90.0));
        assert_eq!(star.home, star.pos);
        assert_eq!(star.radius, 2.0);
        assert!((star.phase - TAU / 4.0).abs() < 1e-6);
        assert_eq!(star.drift_seed, 0.5);
        assert!(star.is_floating());
    }

    #[test]
    fn test_spawn_stays_in_upper_band() {
        let tuning = Tuning::default();
        let bounds = Bounds::new(400.0, 300.0);
        let mut rng = SequenceRng::constant(0.999);
        let star = Star::spawn(StarId(1), &bounds, true, &mut rng, &tuning);
        assert!(star.pos.y < 300.0 * 0.6);
        assert!(star.radius >= 4.0 && star.radius < 7.0);
    }

    #[test]
    fn test_begin_flight_only_from_floating() {
        let tuning = Tuning::default();
        let bounds = Bounds::new(400.0, 300.0);
        let mut rng = SequenceRng::constant(0.5);
        let mut star = Star::spawn(StarId(1), &bounds, false, &mut rng, &tuning);
        let target = Vec2::new(200.0, 260.0);

        assert!(star.begin_flight(target, &mut rng, &tuning));
        let first = *star.flight().unwrap();
        assert_eq!(first.start, star.pos);
        assert_eq!(first.end, target);
        // Control point sits above both endpoints
        assert!(first.control.y < first.start.y.min(first.end.y));

        // Second launch must not disturb the flight
        assert!(!star.begin_flight(Vec2::ZERO, &mut rng, &tuning));
        assert_eq!(*star.flight().unwrap(), first);

        star.state = StarState::Collected;
        assert!(!star.begin_flight(target, &mut rng, &tuning));
        assert!(star.is_collected());
    }

    #[test]
    fn test_flight_clamps_progress() {
        let mut flight = Flight {
            start: Vec2::new(50.0, 50.0),
            control: Vec2::new(100.0, -50.0),
            end: Vec2::new(200.0, 260.0),
            progress: 0.99,
        };
        assert!(flight.advance(0.02));
        assert_eq!(flight.progress, 1.0);
        assert_eq!(flight.position(), flight.end);
    }

    #[test]
    fn test_make_lucky_never_shrinks() {
        let tuning = Tuning::default();
        let mut rng = SequenceRng::constant(0.9);
        let mut star = Star::spawn(StarId(1), &Bounds::new(100.0, 100.0), true, &mut rng, &tuning);
        let before = star.radius;
        assert!(before > 6.0);
        star.make_lucky(6.0);
        assert_eq!(star.radius, before);
    }

    #[test]
    fn test_particle_decays_and_dies() {
        let tuning = Tuning::default();
        let mut rng = SequenceRng::new(vec![0.0, 0.0, 0.0, 0.5]);
        let mut p = Particle::spawn(Vec2::ZERO, [1.0; 4], &mut rng, &tuning);
        assert_eq!(p.vel, Vec2::new(0.0, -1.0));
        assert_eq!(p.max_life, 0.5);
        assert_eq!(p.life_ratio(), 1.0);

        let mut ticks = 0;
        while p.is_alive() {
            p.step(tuning.particle_decay);
            ticks += 1;
        }
        assert!((24..=26).contains(&ticks));
        assert_eq!(p.life_ratio(), 0.0);
    }

    #[test]
    fn test_bounds_clamp_and_minimum() {
        let tuning = Tuning::default();
        let bounds = Bounds::new(0.0, -5.0);
        assert_eq!(bounds.width, 1.0);
        assert_eq!(bounds.height, 1.0);
        let bounds = Bounds::new(f32::NAN, 300.0);
        assert_eq!(bounds.width, 1.0);

        let bounds = Bounds::new(400.0, 300.0);
        assert_eq!(bounds.deposit_point(&tuning), Vec2::new(200.0, 260.0));
        let home = bounds.clamp_home(Vec2::new(-50.0, 290.0), &tuning);
        assert_eq!(home, Vec2::new(20.0, 200.0));
    }

    #[test]
    fn test_clamp_home_on_surface_smaller_than_margins() {
        let tuning = Tuning::default();
        for (w, h) in [(10.0, 10.0), (1.0, 1.0), (30.0, 90.0), (400.0, 50.0)] {
            let bounds = Bounds::new(w, h);
            for home in [Vec2::ZERO, Vec2::new(-50.0, 500.0), Vec2::new(w, h)] {
                let clamped = bounds.clamp_home(home, &tuning);
                assert!(bounds.contains(clamped), "{clamped} outside {w}x{h}");
            }
        }
    }

    #[test]
    fn test_burst_respects_cap() {
        let tuning = Tuning {
            max_particles: 10,
            ..Tuning::default()
        };
        let mut state = SceneState::new(Bounds::new(100.0, 100.0), &tuning);
        let mut rng = SequenceRng::constant(0.3);
        state.spawn_burst(Vec2::ZERO, 6, [1.0; 4], &mut rng, &tuning);
        state.spawn_burst(Vec2::ONE, 6, [0.5; 4], &mut rng, &tuning);
        assert_eq!(state.particles.len(), 10);
        // Newest burst survives intact
        assert_eq!(state.particles.iter().filter(|p| p.pos == Vec2::ONE).count(), 6);
    }

    #[test]
    fn test_ids_are_sequential() {
        let mut state = SceneState::new(Bounds::new(100.0, 100.0), &Tuning::default());
        assert_eq!(state.next_star_id(), StarId(1));
        assert_eq!(state.next_star_id(), StarId(2));
    }

    #[test]
    fn test_id_counter_wraps_instead_of_panicking() {
        let mut state = SceneState::new(Bounds::new(100.0, 100.0), &Tuning::default());
        state.next_id = u32::MAX;
        assert_eq!(state.next_star_id(), StarId(u32::MAX));
        assert_eq!(state.next_star_id(), StarId(0));
    }
}
