//! Star-bottle mini-game rules
//!
//! Wraps a [`StarScene`] with the page-level rules: an intro pause, a goal
//! of collected stars, rate-limited shake and vacuum skills, and a short
//! celebration before the result screen. The scene itself never rate-limits.

use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec2;

use crate::colors;
use crate::platform::{FrameHandle, FrameScheduler};
use crate::renderer::Canvas;
use crate::sim::{RandomSource, SeededRng, StarId, StarScene};
use crate::tuning::{GameRules, Tuning};

/// Current phase of the mini-game
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    /// Intro overlay; input ignored
    Intro,
    /// Collecting stars
    Playing,
    /// Goal reached, waiting before showing the result
    Celebrating,
    /// Result card shown
    Result,
}

/// Notifications for the host UI, drained once per frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    /// A star landed in the bottle; `progress` is capped at the goal
    StarCollected {
        id: StarId,
        lucky: bool,
        progress: u32,
    },
    /// Progress hit the goal
    GoalReached,
    /// Celebration over; show the result card
    Finished,
}

/// State shared with the scene's collect callback
#[derive(Debug, Default)]
struct Tally {
    progress: u32,
    lucky: u32,
    events: Vec<GameEvent>,
}

pub struct StarBottleGame<R: RandomSource = SeededRng> {
    scene: StarScene<R>,
    rules: GameRules,
    tally: Rc<RefCell<Tally>>,
    phase: GamePhase,
    /// Seconds left in the intro or celebration
    phase_timer: f32,
    shake_cooldown: f32,
    vacuum_cooldown: f32,
    vacuuming: bool,
}

impl<R: RandomSource> StarBottleGame<R> {
    pub fn new(width: f32, height: f32, rng: R, tuning: Tuning, rules: GameRules) -> Self {
        let tally = Rc::new(RefCell::new(Tally::default()));
        let sink = Rc::clone(&tally);
        let target = rules.target_stars;
        let mut scene = StarScene::initialize(width, height, rng, tuning, move |id, lucky| {
            let mut tally = sink.borrow_mut();
            let was_short = tally.progress < target;
            tally.progress = tally.progress.saturating_add(1).min(target);
            if lucky {
                tally.lucky = tally.lucky.saturating_add(1);
            }
            let progress = tally.progress;
            tally.events.push(GameEvent::StarCollected { id, lucky, progress });
            if was_short && progress >= target {
                tally.events.push(GameEvent::GoalReached);
            }
        });
        scene.seed(rules.initial_stars);

        let (phase, phase_timer) = if rules.intro_secs > 0.0 {
            (GamePhase::Intro, rules.intro_secs)
        } else {
            (GamePhase::Playing, 0.0)
        };
        log::info!(
            "Star bottle game ready: {} stars, goal {}",
            rules.initial_stars,
            rules.target_stars
        );

        Self {
            scene,
            rules,
            tally,
            phase,
            phase_timer,
            shake_cooldown: 0.0,
            vacuum_cooldown: 0.0,
            vacuuming: false,
        }
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn progress(&self) -> u32 {
        self.tally.borrow().progress
    }

    /// Lucky stars collected so far
    pub fn lucky_collected(&self) -> u32 {
        self.tally.borrow().lucky
    }

    pub fn target(&self) -> u32 {
        self.rules.target_stars
    }

    pub fn rules(&self) -> &GameRules {
        &self.rules
    }

    pub fn scene(&self) -> &StarScene<R> {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut StarScene<R> {
        &mut self.scene
    }

    pub fn is_vacuuming(&self) -> bool {
        self.vacuuming
    }

    /// Whole seconds until shake is available again (0 = ready)
    pub fn shake_cooldown(&self) -> u32 {
        self.shake_cooldown.ceil() as u32
    }

    /// Whole seconds until vacuum is available again (0 = ready)
    pub fn vacuum_cooldown(&self) -> u32 {
        self.vacuum_cooldown.ceil() as u32
    }

    fn goal_reached(&self) -> bool {
        self.progress() >= self.rules.target_stars
    }

    fn accepts_input(&self) -> bool {
        self.phase == GamePhase::Playing && !self.goal_reached()
    }

    /// Tap the play surface
    pub fn tap(&mut self, point: Vec2) -> bool {
        if !self.accepts_input() {
            return false;
        }
        self.scene.collect_at(point)
    }

    /// Shake the bottle if the skill is off cooldown
    pub fn shake(&mut self) -> bool {
        if self.phase != GamePhase::Playing || self.shake_cooldown > 0.0 {
            log::warn!("Shake rejected ({:?}, cooldown {:.1}s)", self.phase, self.shake_cooldown);
            return false;
        }
        self.scene.scatter();
        self.shake_cooldown = self.rules.shake_cooldown_secs;
        true
    }

    /// Begin holding the vacuum; stars near the center are pulled each frame
    pub fn vacuum_start(&mut self) -> bool {
        if !self.accepts_input() || self.vacuum_cooldown > 0.0 || self.vacuuming {
            return false;
        }
        self.vacuuming = true;
        true
    }

    /// Release the vacuum: gather the nearest stars and start the cooldown.
    ///
    /// Returns how many stars took off.
    pub fn vacuum_end(&mut self) -> usize {
        if !self.vacuuming {
            return 0;
        }
        self.vacuuming = false;
        let center = self.scene.center();
        let ids = self.scene.k_nearest(center, self.rules.vacuum_batch);
        let launched = self.scene.collect_by_ids(&ids);
        self.vacuum_cooldown = self.rules.vacuum_cooldown_secs;
        log::debug!("Vacuum released: {} stars gathered", launched);
        launched
    }

    /// Advance timers by `dt` seconds and apply held gestures.
    ///
    /// Call once per frame before the scene update.
    pub fn advance(&mut self, dt: f32) {
        let dt = dt.max(0.0);
        self.shake_cooldown = (self.shake_cooldown - dt).max(0.0);
        self.vacuum_cooldown = (self.vacuum_cooldown - dt).max(0.0);

        match self.phase {
            GamePhase::Intro => {
                self.phase_timer -= dt;
                if self.phase_timer <= 0.0 {
                    self.phase = GamePhase::Playing;
                    log::info!("Star bottle game started");
                }
            }
            GamePhase::Playing => {
                if self.goal_reached() {
                    self.phase = GamePhase::Celebrating;
                    self.phase_timer = self.rules.celebrate_secs;
                    log::info!("Goal reached ({} stars)", self.rules.target_stars);
                } else if self.vacuuming {
                    let center = self.scene.center();
                    self.scene.attract(center);
                }
            }
            GamePhase::Celebrating => {
                self.phase_timer -= dt;
                if self.phase_timer <= 0.0 {
                    self.finish();
                }
            }
            GamePhase::Result => {}
        }
    }

    fn finish(&mut self) {
        self.phase = GamePhase::Result;
        let bounds = self.scene.bounds();
        let origin = Vec2::new(bounds.width / 2.0, bounds.height - self.rules.finale_lift);
        self.scene
            .spawn_burst(origin, self.rules.finale_burst, colors::SPARK_GOLD);
        self.tally.borrow_mut().events.push(GameEvent::Finished);
        log::info!("Star bottle game finished");
    }

    /// Headless step: timers, then one scene update
    pub fn step(&mut self, dt: f32) {
        self.advance(dt);
        self.scene.update();
    }

    /// Handle a fired frame callback: scene update and draw, then timers.
    ///
    /// Returns false for a stale handle; nothing advances in that case.
    pub fn frame(
        &mut self,
        handle: FrameHandle,
        scheduler: &mut dyn FrameScheduler,
        dt: f32,
        canvas: &mut dyn Canvas,
    ) -> bool {
        if !self.scene.frame(handle, scheduler, canvas) {
            return false;
        }
        self.advance(dt);
        true
    }

    pub fn start(&mut self, scheduler: &mut dyn FrameScheduler) {
        self.scene.start(scheduler);
    }

    /// Stop the frame loop; a held vacuum is dropped without collecting
    pub fn stop(&mut self, scheduler: &mut dyn FrameScheduler) {
        self.vacuuming = false;
        self.scene.stop(scheduler);
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.scene.resize(width, height);
    }

    /// Take all events queued since the last call
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.tally.borrow_mut().events)
    }
}
