//! Star Bottle entry point
//!
//! Handles platform-specific initialization and hosts the frame loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::{Cell, RefCell};
    use std::rc::{Rc, Weak};

    use glam::Vec2;
    use wasm_bindgen::prelude::*;
    use web_sys::{HtmlCanvasElement, PointerEvent};

    use star_bottle::consts::*;
    use star_bottle::platform::{FrameHandle, FrameScheduler};
    use star_bottle::renderer::{GpuSurface, VertexCanvas};
    use star_bottle::sim::SeededRng;
    use star_bottle::{GameEvent, GamePhase, GameRules, StarBottleGame, Tuning};

    /// Schedules frames with `requestAnimationFrame`
    struct WebScheduler {
        window: web_sys::Window,
        app: Weak<RefCell<WebApp>>,
    }

    impl FrameScheduler for WebScheduler {
        fn request_frame(&mut self) -> FrameHandle {
            let app = self.app.clone();
            let id = Rc::new(Cell::new(-1));
            let fired = Rc::clone(&id);
            let closure = Closure::once(move |time: f64| {
                if let Some(app) = app.upgrade() {
                    on_frame(&app, FrameHandle(fired.get()), time);
                }
            });
            let handle = self
                .window
                .request_animation_frame(closure.as_ref().unchecked_ref())
                .unwrap_or(-1);
            closure.forget();
            id.set(handle);
            FrameHandle(handle)
        }

        fn cancel_frame(&mut self, handle: FrameHandle) {
            let _ = self.window.cancel_animation_frame(handle.0);
        }
    }

    /// Everything the page keeps alive between frames
    struct WebApp {
        game: StarBottleGame,
        canvas: VertexCanvas,
        gpu: Option<GpuSurface>,
        scheduler: WebScheduler,
        element: HtmlCanvasElement,
        last_time: f64,
    }

    impl WebApp {
        fn render(&mut self) {
            let Some(gpu) = self.gpu.as_mut() else {
                return;
            };
            match gpu.render(self.canvas.vertices()) {
                Ok(()) => {}
                Err(wgpu::SurfaceError::Lost) => gpu.reconfigure(),
                Err(wgpu::SurfaceError::OutOfMemory) => log::error!("Out of memory!"),
                Err(e) => log::warn!("Render error: {:?}", e),
            }
        }

        fn resize(&mut self) {
            let (logical, physical) = surface_size(&self.scheduler.window);
            self.element.set_width(physical.0);
            self.element.set_height(physical.1);
            set_css_size(&self.element, logical);
            self.game.resize(logical.0, logical.1);
            if let Some(gpu) = self.gpu.as_mut() {
                gpu.resize(physical, logical);
            }
        }

        /// Point in logical canvas pixels
        fn local_point(&self, event: &PointerEvent) -> Vec2 {
            let rect = self.element.get_bounding_client_rect();
            Vec2::new(
                (event.client_x() as f64 - rect.left()) as f32,
                (event.client_y() as f64 - rect.top()) as f32,
            )
        }

        /// Update HUD elements in DOM
        fn update_hud(&mut self) {
            let document = match self.scheduler.window.document() {
                Some(d) => d,
                None => return,
            };

            for event in self.game.drain_events() {
                match event {
                    GameEvent::StarCollected { lucky, progress, .. } => {
                        if let Some(el) = document.get_element_by_id("hud-progress") {
                            el.set_text_content(Some(&format!(
                                "{} / {}",
                                progress,
                                self.game.target()
                            )));
                        }
                        if lucky {
                            log::info!("Lucky star collected");
                        }
                    }
                    GameEvent::GoalReached => log::info!("Bottle full"),
                    GameEvent::Finished => {
                        if let Some(el) = document.get_element_by_id("result") {
                            let _ = el.set_attribute("class", "");
                        }
                        if let Some(el) = document.get_element_by_id("result-lucky") {
                            el.set_text_content(Some(&self.game.lucky_collected().to_string()));
                        }
                    }
                }
            }

            if let Some(el) = document.get_element_by_id("intro") {
                let class = if self.game.phase() == GamePhase::Intro {
                    ""
                } else {
                    "hidden"
                };
                let _ = el.set_attribute("class", class);
            }
            cooldown_label(&document, "shake-btn", "Shake", self.game.shake_cooldown());
            cooldown_label(&document, "vacuum-btn", "Vacuum", self.game.vacuum_cooldown());
        }
    }

    fn cooldown_label(document: &web_sys::Document, id: &str, label: &str, secs: u32) {
        if let Some(btn) = document.get_element_by_id(id) {
            let text = if secs > 0 {
                format!("{} ({}s)", label, secs)
            } else {
                label.to_string()
            };
            btn.set_text_content(Some(&text));
        }
    }

    /// Logical and physical surface size for the current viewport
    fn surface_size(window: &web_sys::Window) -> ((f32, f32), (u32, u32)) {
        let width = window
            .inner_width()
            .ok()
            .and_then(|v| v.as_f64())
            .unwrap_or(800.0) as f32;
        let height = window
            .inner_height()
            .ok()
            .and_then(|v| v.as_f64())
            .unwrap_or(600.0) as f32
            * VIEWPORT_HEIGHT_SHARE;
        let logical = (width.max(MIN_SURFACE_SIZE), height.max(MIN_SURFACE_SIZE));
        let physical = (
            (logical.0 * BACKING_SCALE) as u32,
            (logical.1 * BACKING_SCALE) as u32,
        );
        (logical, physical)
    }

    fn set_css_size(canvas: &HtmlCanvasElement, logical: (f32, f32)) {
        let style = canvas.style();
        let _ = style.set_property("width", &format!("{}px", logical.0));
        let _ = style.set_property("height", &format!("{}px", logical.1));
    }

    fn on_frame(app: &Rc<RefCell<WebApp>>, handle: FrameHandle, time: f64) {
        let mut guard = app.borrow_mut();
        let app = &mut *guard;

        let dt = if app.last_time > 0.0 {
            ((time - app.last_time) / 1000.0) as f32
        } else {
            FRAME_DT
        };
        // Clamp long gaps (background tab) so cooldowns don't skip
        let dt = dt.min(0.1);

        if !app.game.frame(handle, &mut app.scheduler, dt, &mut app.canvas) {
            return;
        }
        app.last_time = time;
        app.render();
        app.update_hud();
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Star Bottle starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .expect("no canvas")
            .dyn_into()
            .expect("not a canvas");

        let (logical, physical) = surface_size(&window);
        canvas.set_width(physical.0);
        canvas.set_height(physical.1);
        set_css_size(&canvas, logical);

        let seed = js_sys::Date::now() as u64;
        let game = StarBottleGame::new(
            logical.0,
            logical.1,
            SeededRng::new(seed),
            Tuning::default(),
            GameRules::default(),
        );
        log::info!("Game initialized with seed: {}", seed);

        // Initialize WebGPU; the game still runs headless if this fails
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::BROWSER_WEBGPU,
            ..Default::default()
        });
        let gpu = match instance.create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone())) {
            Ok(surface) => {
                let adapter = instance
                    .request_adapter(&wgpu::RequestAdapterOptions {
                        power_preference: wgpu::PowerPreference::HighPerformance,
                        compatible_surface: Some(&surface),
                        force_fallback_adapter: false,
                    })
                    .await;
                match adapter {
                    Ok(adapter) => {
                        log::info!("Using adapter: {:?}", adapter.get_info().name);
                        match GpuSurface::new(surface, &adapter, physical, logical).await {
                            Ok(gpu) => Some(gpu),
                            Err(e) => {
                                log::error!("GPU setup failed: {}", e);
                                None
                            }
                        }
                    }
                    Err(e) => {
                        log::error!("No adapter: {}", e);
                        None
                    }
                }
            }
            Err(e) => {
                log::error!("Failed to create surface: {}", e);
                None
            }
        };

        let app = Rc::new_cyclic(|weak| {
            RefCell::new(WebApp {
                game,
                canvas: VertexCanvas::new(),
                gpu,
                scheduler: WebScheduler {
                    window: window.clone(),
                    app: weak.clone(),
                },
                element: canvas.clone(),
                last_time: 0.0,
            })
        });

        setup_input_handlers(&canvas, app.clone());
        setup_skill_buttons(app.clone());
        setup_lifecycle(app.clone());

        {
            let mut guard = app.borrow_mut();
            let app = &mut *guard;
            app.game.start(&mut app.scheduler);
        }

        log::info!("Star Bottle running!");
    }

    fn setup_input_handlers(canvas: &HtmlCanvasElement, app: Rc<RefCell<WebApp>>) {
        let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
            let mut a = app.borrow_mut();
            let point = a.local_point(&event);
            a.game.tap(point);
        });
        let _ = canvas
            .add_event_listener_with_callback("pointerdown", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_skill_buttons(app: Rc<RefCell<WebApp>>) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };

        if let Some(btn) = document.get_element_by_id("shake-btn") {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: PointerEvent| {
                app.borrow_mut().game.shake();
            });
            let _ = btn.add_event_listener_with_callback("pointerdown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        if let Some(btn) = document.get_element_by_id("vacuum-btn") {
            {
                let app = app.clone();
                let closure = Closure::<dyn FnMut(_)>::new(move |_event: PointerEvent| {
                    app.borrow_mut().game.vacuum_start();
                });
                let _ = btn
                    .add_event_listener_with_callback("pointerdown", closure.as_ref().unchecked_ref());
                closure.forget();
            }
            // Releasing or sliding off the button both end the gesture
            for kind in ["pointerup", "pointerleave"] {
                let app = app.clone();
                let closure = Closure::<dyn FnMut(_)>::new(move |_event: PointerEvent| {
                    app.borrow_mut().game.vacuum_end();
                });
                let _ = btn.add_event_listener_with_callback(kind, closure.as_ref().unchecked_ref());
                closure.forget();
            }
        }
    }

    fn setup_lifecycle(app: Rc<RefCell<WebApp>>) {
        let Some(window) = web_sys::window() else {
            return;
        };

        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                app.borrow_mut().resize();
            });
            let _ = window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Page teardown: cancel the pending frame so nothing fires afterwards
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            let mut guard = app.borrow_mut();
            let a = &mut *guard;
            a.game.stop(&mut a.scheduler);
        });
        let _ = window.add_event_listener_with_callback("pagehide", closure.as_ref().unchecked_ref());
        closure.forget();
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_game::run().await;
}

/// Headless session: tap stars until the bottle is full, logging events
#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use star_bottle::consts::FRAME_DT;
    use star_bottle::platform::ManualScheduler;
    use star_bottle::renderer::VertexCanvas;
    use star_bottle::sim::SeededRng;
    use star_bottle::{GameEvent, GamePhase, GameRules, StarBottleGame, Tuning};

    env_logger::init();
    log::info!("Star Bottle (native) starting...");
    log::info!("Native mode runs a headless session - serve the wasm build for the web version");

    let seed = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(42);
    let mut game = StarBottleGame::new(
        800.0,
        520.0,
        SeededRng::new(seed),
        Tuning::default(),
        GameRules::default(),
    );
    let mut scheduler = ManualScheduler::new();
    let mut canvas = VertexCanvas::new();
    game.start(&mut scheduler);

    let mut frames = 0u32;
    while game.phase() != GamePhase::Result && frames < 60 * 60 {
        if game.phase() == GamePhase::Playing && frames % 20 == 0 {
            let center = game.scene().center();
            if let Some(star) = game
                .scene()
                .k_nearest(center, 1)
                .first()
                .and_then(|id| game.scene().star(*id))
            {
                game.tap(star.pos);
            }
            if game.shake_cooldown() == 0 && frames % 240 == 0 {
                game.shake();
            }
        }

        for handle in scheduler.due() {
            game.frame(handle, &mut scheduler, FRAME_DT, &mut canvas);
        }
        for event in game.drain_events() {
            match event {
                GameEvent::StarCollected { id, lucky, progress } => {
                    println!("{} collected (lucky: {}) {}/{}", id, lucky, progress, game.target());
                }
                GameEvent::GoalReached => println!("Bottle full!"),
                GameEvent::Finished => println!("Finished after {} frames", frames),
            }
        }
        frames += 1;
    }

    game.stop(&mut scheduler);
    println!(
        "Collected {} stars ({} lucky), {} vertices in last frame",
        game.progress(),
        game.lucky_collected(),
        canvas.vertices().len()
    );
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
