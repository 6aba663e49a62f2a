//! The star scene: sole owner of all stars and particles
//!
//! Hosts drive it through a narrow surface: lifecycle (`initialize`, `seed`,
//! `resize`, `start`/`stop`/`frame`), interactions (`collect_at`,
//! `collect_by_ids`, `scatter`, `attract`) and read-only queries. The entity
//! lists are never handed out by reference.

use glam::Vec2;

use super::query;
use super::rng::{RandomSource, SeededRng};
use super::state::{Bounds, SceneState, Star, StarId};
use super::tick::tick;
use crate::colors;
use crate::platform::{FrameHandle, FrameLoop, FrameScheduler};
use crate::renderer::{Canvas, draw_scene};
use crate::tuning::Tuning;

/// Called once per star reaching the deposit point with `(id, lucky)`.
///
/// Runs synchronously inside `update()`; the scene is mutably borrowed for
/// the duration, so the callback cannot re-enter it.
pub type CollectCallback = Box<dyn FnMut(StarId, bool)>;

pub struct StarScene<R: RandomSource = SeededRng> {
    state: SceneState,
    rng: R,
    tuning: Tuning,
    on_collect: CollectCallback,
    frames: FrameLoop,
}

impl<R: RandomSource> StarScene<R> {
    /// Create an empty scene over a `width` x `height` logical surface
    pub fn initialize(
        width: f32,
        height: f32,
        rng: R,
        tuning: Tuning,
        on_collect: impl FnMut(StarId, bool) + 'static,
    ) -> Self {
        let bounds = Bounds::new(width, height);
        log::info!(
            "Star scene initialized ({}x{})",
            bounds.width,
            bounds.height
        );
        Self {
            state: SceneState::new(bounds, &tuning),
            rng,
            tuning,
            on_collect: Box::new(on_collect),
            frames: FrameLoop::new(),
        }
    }

    /// Replace the star set with `count` fresh floating stars
    pub fn seed(&mut self, count: usize) {
        self.state.stars.clear();
        self.state.stars.reserve(count);
        for _ in 0..count {
            let id = self.state.next_star_id();
            let star = Star::spawn(id, &self.state.bounds, false, &mut self.rng, &self.tuning);
            self.state.stars.push(star);
        }
        log::debug!("Seeded {} stars", count);
    }

    /// Change the logical surface size.
    ///
    /// Re-derives the deposit point and pulls floating stars' homes back
    /// into the play area. Stars already in flight keep their target.
    pub fn resize(&mut self, width: f32, height: f32) {
        let bounds = Bounds::new(width, height);
        self.state.bounds = bounds;
        self.state.deposit = bounds.deposit_point(&self.tuning);
        for star in self.state.stars.iter_mut().filter(|s| s.is_floating()) {
            star.home = bounds.clamp_home(star.home, &self.tuning);
        }
        log::debug!("Scene resized to {}x{}", bounds.width, bounds.height);
    }

    // === Simulation loop ===

    /// Advance one tick and notify the host of every landing
    pub fn update(&mut self) {
        let landings = tick(&mut self.state, &mut self.rng, &self.tuning);
        for landing in landings {
            log::debug!("{} collected (lucky: {})", landing.id, landing.lucky);
            (self.on_collect)(landing.id, landing.lucky);
        }
    }

    /// Paint the current state
    pub fn draw(&self, canvas: &mut dyn Canvas) {
        draw_scene(canvas, &self.state);
    }

    /// Register the recurring frame callback. No-op if already running.
    pub fn start(&mut self, scheduler: &mut dyn FrameScheduler) {
        if self.frames.start(scheduler) {
            log::info!("Star scene started");
        }
    }

    /// Cancel the frame callback, keeping all entity state. No-op if stopped.
    pub fn stop(&mut self, scheduler: &mut dyn FrameScheduler) {
        if self.frames.stop(scheduler) {
            log::info!("Star scene stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.frames.is_running()
    }

    /// Handle a fired frame callback: update, draw, re-arm.
    ///
    /// Returns false without touching the scene if `handle` is stale.
    pub fn frame(
        &mut self,
        handle: FrameHandle,
        scheduler: &mut dyn FrameScheduler,
        canvas: &mut dyn Canvas,
    ) -> bool {
        if !self.frames.fire(handle, scheduler) {
            return false;
        }
        self.update();
        self.draw(canvas);
        true
    }

    // === Interaction ===

    /// Launch the topmost floating star under `point`, if any
    pub fn collect_at(&mut self, point: Vec2) -> bool {
        let hit = query::hit_test(&self.state.stars, point, self.tuning.hit_radius).map(|s| s.id);
        match hit {
            Some(id) => self.launch(id),
            None => false,
        }
    }

    /// Launch every listed star that is still floating.
    ///
    /// Unknown, flying and collected ids are skipped. Returns how many
    /// stars took off.
    pub fn collect_by_ids(&mut self, ids: &[StarId]) -> usize {
        ids.iter().filter(|&&id| self.launch(id)).count()
    }

    fn launch(&mut self, id: StarId) -> bool {
        let deposit = self.state.deposit;
        let Some(star) = self.state.star_mut(id) else {
            return false;
        };
        if !star.begin_flight(deposit, &mut self.rng, &self.tuning) {
            return false;
        }
        let (origin, lucky) = (star.pos, star.lucky);
        let color = if lucky {
            colors::SPARK_GOLD
        } else {
            colors::SPARK_WHITE
        };
        self.state
            .spawn_burst(origin, self.tuning.impact_burst, color, &mut self.rng, &self.tuning);
        true
    }

    /// Shake the bottle: jostle every floating star's home, maybe turning
    /// some lucky, and burst at the center.
    ///
    /// Draw order per floating star: x jitter, y jitter, lucky roll.
    pub fn scatter(&mut self) {
        let bounds = self.state.bounds;
        let tuning = &self.tuning;
        let mut upgraded = 0;
        for star in self.state.stars.iter_mut().filter(|s| s.is_floating()) {
            let jitter = Vec2::new(
                self.rng.centered() * tuning.scatter_jitter[0],
                self.rng.centered() * tuning.scatter_jitter[1],
            );
            star.home = bounds.clamp_home(star.home + jitter, tuning);
            if self.rng.chance(tuning.lucky_chance) {
                if !star.lucky {
                    upgraded += 1;
                }
                star.make_lucky(tuning.lucky_upgrade_radius);
            }
        }
        log::debug!("Scatter: {} stars turned lucky", upgraded);
        self.state.spawn_burst(
            bounds.center(),
            self.tuning.scatter_burst,
            colors::SPARK_GOLD,
            &mut self.rng,
            &self.tuning,
        );
    }

    /// Pull floating stars within the capture radius a fraction of the way
    /// toward `point`. Call every frame while the gesture is held.
    pub fn attract(&mut self, point: Vec2) {
        let radius = self.tuning.attract_radius;
        let strength = self.tuning.attract_strength;
        for star in self.state.stars.iter_mut().filter(|s| s.is_floating()) {
            let delta = point - star.pos;
            if delta.length() < radius {
                star.pos += delta * strength;
            }
        }
    }

    /// Decorative burst of `count` particles
    pub fn spawn_burst(&mut self, origin: Vec2, count: usize, color: [f32; 4]) {
        self.state
            .spawn_burst(origin, count, color, &mut self.rng, &self.tuning);
    }

    // === Queries ===

    /// Copy of the topmost floating star under `point`
    pub fn hit_test(&self, point: Vec2) -> Option<Star> {
        query::hit_test(&self.state.stars, point, self.tuning.hit_radius).copied()
    }

    /// Up to `k` floating star ids nearest `point`, closest first
    pub fn k_nearest(&self, point: Vec2, k: usize) -> Vec<StarId> {
        query::k_nearest(&self.state.stars, point, k)
    }

    /// Copy of a star by id
    pub fn star(&self, id: StarId) -> Option<Star> {
        self.state.star(id).copied()
    }

    pub fn bounds(&self) -> Bounds {
        self.state.bounds
    }

    pub fn deposit_point(&self) -> Vec2 {
        self.state.deposit
    }

    pub fn center(&self) -> Vec2 {
        self.state.bounds.center()
    }

    pub fn time(&self) -> f64 {
        self.state.time
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn star_count(&self) -> usize {
        self.state.stars.len()
    }

    pub fn lucky_count(&self) -> usize {
        self.state.stars.iter().filter(|s| s.lucky).count()
    }

    pub fn particle_count(&self) -> usize {
        self.state.particles.len()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::HashSet;
    use std::rc::Rc;

    use super::*;
    use crate::platform::ManualScheduler;
    use crate::renderer::canvas::tests::RecordingCanvas;
    use crate::sim::rng::SequenceRng;
    use proptest::prelude::*;

    type Log = Rc<RefCell<Vec<(StarId, bool)>>>;

    fn scene<R: RandomSource>(rng: R, width: f32, height: f32) -> (StarScene<R>, Log) {
        let log: Log = Rc::default();
        let sink = log.clone();
        let scene = StarScene::initialize(width, height, rng, Tuning::default(), move |id, lucky| {
            sink.borrow_mut().push((id, lucky));
        });
        (scene, log)
    }

    fn run_until_settled<R: RandomSource>(scene: &mut StarScene<R>) {
        for _ in 0..200 {
            scene.update();
        }
    }

    #[test]
    fn test_scripted_flight_lands_on_deposit() {
        let (mut scene, log) = scene(SequenceRng::constant(0.5), 400.0, 300.0);
        assert_eq!(scene.deposit_point(), Vec2::new(200.0, 260.0));
        scene.seed(1);
        let id = scene.k_nearest(Vec2::ZERO, 1)[0];
        scene.state.stars[0].pos = Vec2::new(50.0, 50.0);
        scene.state.stars[0].home = Vec2::new(50.0, 50.0);

        assert_eq!(scene.collect_by_ids(&[id]), 1);
        let start = scene.star(id).unwrap().flight().unwrap().start;
        assert_eq!(start, Vec2::new(50.0, 50.0));

        while !scene.star(id).unwrap().is_collected() {
            scene.update();
        }
        let star = scene.star(id).unwrap();
        assert!((star.pos - Vec2::new(200.0, 260.0)).length() < 1e-3);
        assert_eq!(*log.borrow(), vec![(id, false)]);
    }

    #[test]
    fn test_callback_fires_exactly_once_per_star() {
        let (mut scene, log) = scene(SeededRng::new(7), 400.0, 300.0);
        scene.seed(25);
        let ids = scene.k_nearest(Vec2::ZERO, 25);
        scene.collect_by_ids(&ids);
        run_until_settled(&mut scene);

        let log = log.borrow();
        assert_eq!(log.len(), 25);
        let unique: HashSet<_> = log.iter().map(|(id, _)| *id).collect();
        assert_eq!(unique.len(), 25);
    }

    #[test]
    fn test_collect_by_ids_idempotent() {
        let (mut scene, log) = scene(SeededRng::new(3), 400.0, 300.0);
        scene.seed(10);
        let ids = scene.k_nearest(scene.center(), 4);
        assert_eq!(scene.collect_by_ids(&ids), 4);
        let particles = scene.particle_count();
        assert_eq!(scene.collect_by_ids(&ids), 0);
        assert_eq!(scene.particle_count(), particles);
        // Unknown ids are skipped
        assert_eq!(scene.collect_by_ids(&[StarId(9999)]), 0);

        run_until_settled(&mut scene);
        assert_eq!(scene.collect_by_ids(&ids), 0);
        assert_eq!(log.borrow().len(), 4);
    }

    #[test]
    fn test_collect_at_miss_changes_nothing() {
        let (mut scene, _) = scene(SeededRng::new(11), 400.0, 300.0);
        scene.seed(5);
        let before: Vec<Star> = scene.state.stars.clone();
        // Stars spawn in the top 60%; the bottom corner is far from all of them
        assert!(!scene.collect_at(Vec2::new(-500.0, 1000.0)));
        assert_eq!(scene.state.stars, before);
        assert_eq!(scene.particle_count(), 0);
    }

    #[test]
    fn test_collect_at_hit_launches_and_bursts() {
        let (mut scene, _) = scene(SeededRng::new(12), 400.0, 300.0);
        scene.seed(5);
        let target = scene.state.stars[2];
        let hit = scene.hit_test(target.pos + Vec2::new(3.0, 0.0)).unwrap();
        assert!(scene.collect_at(target.pos + Vec2::new(3.0, 0.0)));
        assert!(scene.star(hit.id).unwrap().flight().is_some());
        assert_eq!(scene.particle_count(), scene.tuning().impact_burst);
        // The launched star is no longer selectable
        let again = scene.hit_test(hit.pos);
        assert!(again.map_or(true, |s| s.id != hit.id));
    }

    #[test]
    fn test_scatter_keeps_count_bounds_and_luck() {
        let (mut scene, _) = scene(SeededRng::new(2024), 400.0, 300.0);
        scene.seed(25);
        let tuning = scene.tuning().clone();
        let mut lucky = scene.lucky_count();
        for _ in 0..10 {
            scene.scatter();
            assert_eq!(scene.star_count(), 25);
            for star in &scene.state.stars {
                assert!(star.home.x >= tuning.play_margin && star.home.x <= 400.0 - tuning.play_margin);
                assert!(star.home.y >= tuning.play_margin && star.home.y <= 300.0 - tuning.play_bottom_margin);
            }
            let now = scene.lucky_count();
            assert!(now >= lucky);
            lucky = now;
        }
        // 25 stars, 10 rolls each at 30%: at least one upgrade is certain in practice
        assert!(lucky > 0);
    }

    #[test]
    fn test_scatter_skips_flying_and_bursts_at_center() {
        let (mut scene, _) = scene(SequenceRng::constant(0.1), 400.0, 300.0);
        scene.seed(2);
        let flying = scene.state.stars[0].id;
        scene.collect_by_ids(&[flying]);
        let flight_before = *scene.star(flying).unwrap().flight().unwrap();
        let particles = scene.particle_count();

        scene.scatter();
        let star = scene.star(flying).unwrap();
        assert_eq!(*star.flight().unwrap(), flight_before);
        assert!(!star.lucky);
        // constant 0.1 < 0.3 chance: the floating one turned lucky
        assert!(scene.state.stars[1].lucky);
        assert_eq!(scene.particle_count(), particles + scene.tuning().scatter_burst);
        assert!(scene.state.particles[particles..].iter().all(|p| p.pos == Vec2::new(200.0, 150.0)));
    }

    #[test]
    fn test_attract_pulls_only_nearby_floating() {
        let (mut scene, _) = scene(SequenceRng::constant(0.5), 400.0, 300.0);
        scene.seed(3);
        scene.state.stars[0].pos = Vec2::new(150.0, 100.0);
        scene.state.stars[1].pos = Vec2::new(390.0, 10.0);
        scene.state.stars[2].pos = Vec2::new(120.0, 100.0);
        let flying = scene.state.stars[2].id;
        scene.collect_by_ids(&[flying]);
        let flying_pos = scene.star(flying).unwrap().pos;

        let target = Vec2::new(100.0, 100.0);
        scene.attract(target);
        assert_eq!(scene.state.stars[0].pos, Vec2::new(147.5, 100.0));
        assert_eq!(scene.state.stars[1].pos, Vec2::new(390.0, 10.0));
        assert_eq!(scene.star(flying).unwrap().pos, flying_pos);

        // Sustained pull converges without overshooting
        for _ in 0..200 {
            scene.attract(target);
        }
        assert!(scene.state.stars[0].pos.distance(target) < 0.1);
    }

    #[test]
    fn test_resize_clamps_homes_and_moves_deposit() {
        let (mut scene, _) = scene(SeededRng::new(5), 800.0, 600.0);
        scene.seed(20);
        let flying = scene.state.stars[0].id;
        scene.collect_by_ids(&[flying]);
        let old_end = scene.star(flying).unwrap().flight().unwrap().end;

        scene.resize(200.0, 150.0);
        assert_eq!(scene.deposit_point(), Vec2::new(100.0, 110.0));
        for star in scene.state.stars.iter().filter(|s| s.is_floating()) {
            assert!(star.home.x >= 20.0 && star.home.x <= 180.0);
            assert!(star.home.y >= 20.0 && star.home.y <= 50.0);
        }
        assert_eq!(scene.star(flying).unwrap().flight().unwrap().end, old_end);
        assert_eq!(scene.star_count(), 20);
    }

    #[test]
    fn test_resize_degenerate_dimensions() {
        let (mut scene, _) = scene(SeededRng::new(5), 400.0, 300.0);
        scene.seed(5);
        scene.resize(0.0, -10.0);
        assert_eq!(scene.bounds(), Bounds::new(1.0, 1.0));
        scene.scatter();
        for _ in 0..10 {
            scene.update();
        }
        assert!(scene.state.stars.iter().all(|s| s.pos.is_finite()));
    }

    #[test]
    fn test_resize_below_margins_keeps_homes_in_bounds() {
        let (mut scene, _) = scene(SeededRng::new(5), 400.0, 300.0);
        scene.seed(5);
        scene.resize(10.0, 10.0);
        let bounds = scene.bounds();
        for star in &scene.state.stars {
            assert!(bounds.contains(star.home), "home {} outside 10x10", star.home);
        }
        scene.scatter();
        for star in &scene.state.stars {
            assert!(bounds.contains(star.home), "home {} outside 10x10", star.home);
        }
    }

    #[test]
    fn test_reseed_never_reuses_ids() {
        let (mut scene, _) = scene(SeededRng::new(1), 400.0, 300.0);
        scene.seed(5);
        let first: HashSet<StarId> = scene.state.stars.iter().map(|s| s.id).collect();
        scene.seed(5);
        assert!(scene.state.stars.iter().all(|s| !first.contains(&s.id)));
    }

    #[test]
    fn test_frame_loop_drives_update_and_draw() {
        let (mut scene, _) = scene(SeededRng::new(9), 400.0, 300.0);
        scene.seed(3);
        let mut sched = ManualScheduler::new();
        let mut canvas = RecordingCanvas::default();

        scene.start(&mut sched);
        scene.start(&mut sched);
        assert_eq!(sched.outstanding(), 1);

        for _ in 0..5 {
            for handle in sched.due() {
                assert!(scene.frame(handle, &mut sched, &mut canvas));
            }
        }
        assert_eq!(scene.state.time_ticks, 5);
        assert!(!canvas.ops.is_empty());

        let stale = sched.due();
        scene.stop(&mut sched);
        scene.stop(&mut sched);
        assert!(!scene.frame(stale[0], &mut sched, &mut canvas));
        assert_eq!(scene.state.time_ticks, 5);
        assert_eq!(scene.star_count(), 3);

        // Resumable
        scene.start(&mut sched);
        let due = sched.due();
        assert!(scene.frame(due[0], &mut sched, &mut canvas));
        assert_eq!(scene.state.time_ticks, 6);
    }

    #[test]
    fn test_interactions_visible_to_next_update() {
        let (mut scene, log) = scene(SequenceRng::constant(0.5), 400.0, 300.0);
        scene.seed(1);
        let id = scene.state.stars[0].id;
        scene.collect_by_ids(&[id]);
        scene.update();
        let progress = scene.star(id).unwrap().flight().unwrap().progress;
        assert!((progress - scene.tuning().flight_step).abs() < 1e-6);
        assert!(log.borrow().is_empty());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_lifecycle_monotonic(seed in any::<u64>(), ops in prop::collection::vec(0u8..5, 1..60)) {
            let (mut scene, log) = scene(SeededRng::new(seed), 400.0, 300.0);
            scene.seed(12);
            let mut stages: Vec<u8> = scene.state.stars.iter().map(|s| s.state.stage()).collect();
            let mut ids_seen = HashSet::new();
            for s in &scene.state.stars {
                prop_assert!(ids_seen.insert(s.id));
            }

            for op in ops {
                match op {
                    0 => { scene.collect_at(scene.center()); }
                    1 => { let ids = scene.k_nearest(Vec2::ZERO, 2); scene.collect_by_ids(&ids); }
                    2 => scene.scatter(),
                    3 => scene.attract(scene.center()),
                    _ => for _ in 0..10 { scene.update(); },
                }
                for (i, s) in scene.state.stars.iter().enumerate() {
                    let now = s.state.stage();
                    prop_assert!(now >= stages[i]);
                    stages[i] = now;
                }
            }

            let collected = scene.state.stars.iter().filter(|s| s.is_collected()).count();
            prop_assert_eq!(log.borrow().len(), collected);
            let unique: HashSet<_> = log.borrow().iter().map(|(id, _)| *id).collect();
            prop_assert_eq!(unique.len(), collected);
        }
    }
}
