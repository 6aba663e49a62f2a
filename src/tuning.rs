//! Data-driven scene constants and mini-game rules
//!
//! Both structs deserialize from JSON with every field optional, so a host
//! can override a handful of values and keep the rest at their defaults.

use serde::{Deserialize, Serialize};

/// Errors produced while loading tuning data
#[derive(Debug, thiserror::Error)]
pub enum TuningError {
    #[error("tuning JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid tuning value `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

/// Scene constants. Per-step values assume one step per display frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Spawning ===
    /// Fraction of the surface height stars may spawn in (measured from the top)
    pub spawn_band: f32,
    /// Common star radius range [min, max)
    pub common_radius: [f32; 2],
    /// Lucky star radius range [min, max)
    pub lucky_radius: [f32; 2],
    /// Drift seed range [min, max)
    pub drift_seed: [f32; 2],

    // === Drift ===
    /// Simulation time advanced per step (drives drift and pulsing only)
    pub time_step: f32,
    /// Drift amplitude on x (sine) and y (cosine at half frequency)
    pub drift_amplitude: [f32; 2],
    /// Fraction of the remaining distance covered per step
    pub drift_smoothing: f32,

    // === Flight ===
    /// Flight progress added per step
    pub flight_step: f32,
    /// Lateral jitter of the Bezier control point around the midpoint
    pub flight_arc_spread: f32,
    /// Minimum and maximum lift of the control point above the higher endpoint
    pub flight_arc_lift: [f32; 2],
    /// Distance of the deposit point above the bottom edge
    pub deposit_offset: f32,

    // === Interaction ===
    /// Pointer hit radius (larger than any visual radius)
    pub hit_radius: f32,
    /// Attraction capture radius
    pub attract_radius: f32,
    /// Fraction of the distance to the attractor covered per call
    pub attract_strength: f32,
    /// Maximum home displacement per scatter on x and y
    pub scatter_jitter: [f32; 2],
    /// Margin kept between home positions and the left/right/top edges
    pub play_margin: f32,
    /// Margin kept between home positions and the bottom edge (deposit zone)
    pub play_bottom_margin: f32,
    /// Probability a floating star turns lucky on scatter
    pub lucky_chance: f32,
    /// Minimum radius of a star upgraded by scatter
    pub lucky_upgrade_radius: f32,

    // === Particles ===
    /// Maximum initial particle speed (pixels per step)
    pub particle_speed: f32,
    /// Upward bias subtracted from initial y velocity
    pub particle_lift: f32,
    /// Particle lifetime range [min, max)
    pub particle_life: [f32; 2],
    /// Life removed per step
    pub particle_decay: f32,
    /// Maximum particle radius
    pub particle_size: f32,
    /// Live particle cap; the oldest are evicted first
    pub max_particles: usize,
    pub impact_burst: usize,
    pub deposit_burst: usize,
    /// Height of the deposit burst above the deposit point
    pub deposit_burst_lift: f32,
    pub scatter_burst: usize,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            spawn_band: 0.6,
            common_radius: [2.0, 4.0],
            lucky_radius: [4.0, 7.0],
            drift_seed: [0.5, 1.0],

            time_step: 0.01,
            drift_amplitude: [10.0, 5.0],
            drift_smoothing: 0.05,

            flight_step: 0.02,
            flight_arc_spread: 100.0,
            flight_arc_lift: [60.0, 140.0],
            deposit_offset: 40.0,

            hit_radius: 30.0,
            attract_radius: 150.0,
            attract_strength: 0.05,
            scatter_jitter: [100.0, 50.0],
            play_margin: 20.0,
            play_bottom_margin: 100.0,
            lucky_chance: 0.3,
            lucky_upgrade_radius: 6.0,

            particle_speed: 2.0,
            particle_lift: 1.0,
            particle_life: [0.5, 1.0],
            particle_decay: 0.02,
            particle_size: 3.0,
            max_particles: 512,
            impact_burst: 8,
            deposit_burst: 5,
            deposit_burst_lift: 20.0,
            scatter_burst: 20,
        }
    }
}

impl Tuning {
    /// Parse tuning from JSON, filling omitted fields with defaults
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Self = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Reject values that would stall or destabilize the simulation
    pub fn validate(&self) -> Result<(), TuningError> {
        positive("time_step", self.time_step)?;
        positive("flight_step", self.flight_step)?;
        positive("particle_decay", self.particle_decay)?;
        positive("hit_radius", self.hit_radius)?;
        fraction("spawn_band", self.spawn_band)?;
        fraction("drift_smoothing", self.drift_smoothing)?;
        fraction("attract_strength", self.attract_strength)?;
        fraction("lucky_chance", self.lucky_chance)?;
        range("common_radius", self.common_radius)?;
        range("lucky_radius", self.lucky_radius)?;
        range("drift_seed", self.drift_seed)?;
        range("flight_arc_lift", self.flight_arc_lift)?;
        range("particle_life", self.particle_life)?;
        if self.particle_life[0] <= 0.0 {
            return Err(TuningError::Invalid {
                field: "particle_life",
                reason: "lifetime must be positive",
            });
        }
        Ok(())
    }
}

/// Rules of the star-bottle mini-game around the scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameRules {
    /// Stars seeded when the game starts
    pub initial_stars: usize,
    /// Collected stars needed to finish
    pub target_stars: u32,
    /// Seconds the intro overlay blocks input
    pub intro_secs: f32,
    /// Seconds between reaching the goal and the result screen
    pub celebrate_secs: f32,
    pub shake_cooldown_secs: f32,
    pub vacuum_cooldown_secs: f32,
    /// Stars gathered when a vacuum gesture is released
    pub vacuum_batch: usize,
    /// Particles in the finale burst
    pub finale_burst: usize,
    /// Height of the finale burst above the bottom edge
    pub finale_lift: f32,
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            initial_stars: 25,
            target_stars: 18,
            intro_secs: 2.5,
            celebrate_secs: 1.0,
            shake_cooldown_secs: 3.0,
            vacuum_cooldown_secs: 3.0,
            vacuum_batch: 3,
            finale_burst: 50,
            finale_lift: 50.0,
        }
    }
}

impl GameRules {
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let rules: Self = serde_json::from_str(json)?;
        rules.validate()?;
        Ok(rules)
    }

    pub fn validate(&self) -> Result<(), TuningError> {
        if self.target_stars == 0 {
            return Err(TuningError::Invalid {
                field: "target_stars",
                reason: "goal must be at least one star",
            });
        }
        if self.initial_stars < self.target_stars as usize {
            return Err(TuningError::Invalid {
                field: "initial_stars",
                reason: "fewer stars than the goal requires",
            });
        }
        non_negative("intro_secs", self.intro_secs)?;
        non_negative("celebrate_secs", self.celebrate_secs)?;
        non_negative("shake_cooldown_secs", self.shake_cooldown_secs)?;
        non_negative("vacuum_cooldown_secs", self.vacuum_cooldown_secs)?;
        Ok(())
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), TuningError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(TuningError::Invalid {
            field,
            reason: "must be a positive number",
        })
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), TuningError> {
    if value >= 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(TuningError::Invalid {
            field,
            reason: "must not be negative",
        })
    }
}

fn fraction(field: &'static str, value: f32) -> Result<(), TuningError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(TuningError::Invalid {
            field,
            reason: "must lie in [0, 1]",
        })
    }
}

fn range(field: &'static str, [lo, hi]: [f32; 2]) -> Result<(), TuningError> {
    if lo <= hi && lo.is_finite() && hi.is_finite() {
        Ok(())
    } else {
        Err(TuningError::Invalid {
            field,
            reason: "range minimum exceeds maximum",
        })
    }
}
