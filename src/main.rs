//! Space Shooter entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::Vec2;
    use wasm_bindgen::prelude::*;
    use web_sys::{Event, HtmlCanvasElement, KeyboardEvent, MouseEvent, TouchEvent};

    use space_shooter::GameError;
    use space_shooter::platform::storage::LocalStore;
    use space_shooter::platform::time::DateClock;
    use space_shooter::platform::web::{CanvasSurface, ListenerSet, RafScheduler, WebShareTarget};
    use space_shooter::platform::{Button, InputAdapter};
    use space_shooter::share::share_with_fallback;
    use space_shooter::sim::{GameMode, Viewport};
    use space_shooter::{Engine, Settings};

    /// Game instance: the engine plus the canvas it draws on
    struct Game {
        engine: Engine,
        surface: CanvasSurface,
    }

    type SharedGame = Rc<RefCell<Game>>;

    thread_local! {
        static GAME: RefCell<Option<SharedGame>> = const { RefCell::new(None) };
    }

    /// Keys the page must not scroll on
    fn is_game_key(key: &str) -> bool {
        matches!(
            key,
            " " | "ArrowUp" | "ArrowDown" | "ArrowLeft" | "ArrowRight"
        )
    }

    /// Run an input callback, then react to a transition into the share screen
    fn with_input(game: &SharedGame, f: impl FnOnce(&mut Engine)) {
        let entered_share = {
            let mut g = game.borrow_mut();
            let before = g.engine.mode();
            f(&mut g.engine);
            before != GameMode::Share && g.engine.mode() == GameMode::Share
        };
        if entered_share {
            start_share(game.clone());
        }
    }

    /// Share the finished session in the background; the outcome becomes a notice
    fn start_share(game: SharedGame) {
        let Some(card) = game.borrow().engine.share_card() else {
            return;
        };
        wasm_bindgen_futures::spawn_local(async move {
            let outcome = share_with_fallback(&card, &mut WebShareTarget).await;
            log::info!("Share finished: {:?}", outcome);
            game.borrow_mut().engine.show_notice(outcome.notice());
        });
    }

    fn canvas_point(canvas: &HtmlCanvasElement, client_x: i32, client_y: i32) -> Vec2 {
        let rect = canvas.get_bounding_client_rect();
        Vec2::new(
            client_x as f32 - rect.left() as f32,
            client_y as f32 - rect.top() as f32,
        )
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        if let Err(e) = console_log::init_with_level(log::Level::Info) {
            web_sys::console::error_1(&format!("Logger init failed: {}", e).into());
        }

        log::info!("Space Shooter starting...");

        if let Err(e) = setup() {
            log::error!("Space Shooter failed to start: {}", e);
        }
    }

    fn setup() -> Result<(), GameError> {
        let window = web_sys::window().ok_or(GameError::SurfaceUnavailable("no window".into()))?;
        let document = window
            .document()
            .ok_or(GameError::SurfaceUnavailable("no document".into()))?;

        // Hide loading indicator
        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .ok_or(GameError::SurfaceUnavailable("no #canvas element".into()))?
            .dyn_into()
            .map_err(|_| GameError::SurfaceUnavailable("#canvas is not a canvas".into()))?;

        let mut surface = CanvasSurface::new(canvas.clone())?;
        let size = surface.fit(window.device_pixel_ratio());

        let store = LocalStore::new();
        let settings = Settings::load(&store);
        let pointer_supported = js_sys::Reflect::has(&window, &"onmousedown".into()).unwrap_or(false)
            || js_sys::Reflect::has(&window, &"ontouchstart".into()).unwrap_or(false);

        let engine = Engine::initialize(
            Viewport::new(size.x, size.y),
            settings,
            Box::new(store),
            Box::new(DateClock),
        )
        .with_input(InputAdapter::new(pointer_supported));

        let game = Rc::new(RefCell::new(Game { engine, surface }));
        GAME.with(|slot| *slot.borrow_mut() = Some(game.clone()));

        let mut listeners = ListenerSet::new();
        setup_input_handlers(&mut listeners, &canvas, &game)?;
        setup_control_buttons(&mut listeners, &game)?;
        setup_auto_pause(&mut listeners, &game)?;
        setup_resize(&mut listeners, &game)?;

        // Frame loop: one long-lived callback, re-requested by the engine
        let frame_callback: Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>> = Rc::new(RefCell::new(None));
        {
            let game = game.clone();
            *frame_callback.borrow_mut() = Some(Closure::<dyn FnMut(f64)>::new(move |time: f64| {
                let mut g = game.borrow_mut();
                let Game { engine, surface } = &mut *g;
                engine.frame(time, surface);
            }));
        }
        let scheduler = match frame_callback.borrow().as_ref() {
            Some(callback) => RafScheduler::new(callback)?,
            None => return Err(GameError::SurfaceUnavailable("frame callback missing".into())),
        };

        {
            let mut g = game.borrow_mut();
            g.engine.register_teardown(Box::new(move || {
                let mut listeners = listeners;
                listeners.clear();
                frame_callback.borrow_mut().take();
                log::info!("Host resources released");
            }));
            g.engine.set_scheduler(Box::new(scheduler));
        }

        log::info!("Space Shooter running!");
        Ok(())
    }

    fn setup_input_handlers(
        listeners: &mut ListenerSet,
        canvas: &HtmlCanvasElement,
        game: &SharedGame,
    ) -> Result<(), GameError> {
        let window = web_sys::window().ok_or(GameError::SurfaceUnavailable("no window".into()))?;

        // Keyboard
        {
            let game = game.clone();
            listeners.add(&window, "keydown", move |event: Event| {
                let Some(event) = event.dyn_ref::<KeyboardEvent>() else {
                    return;
                };
                let key = event.key();
                if is_game_key(&key) {
                    event.prevent_default();
                }
                with_input(&game, |engine| engine.key_down(&key));
            });
        }
        {
            let game = game.clone();
            listeners.add(&window, "keyup", move |event: Event| {
                if let Some(event) = event.dyn_ref::<KeyboardEvent>() {
                    game.borrow_mut().engine.key_up(&event.key());
                }
            });
        }

        // Mouse
        {
            let game = game.clone();
            let canvas_clone = canvas.clone();
            listeners.add(canvas, "mousedown", move |event: Event| {
                if let Some(event) = event.dyn_ref::<MouseEvent>() {
                    let pos = canvas_point(&canvas_clone, event.client_x(), event.client_y());
                    with_input(&game, |engine| engine.pointer_down(pos));
                }
            });
        }
        {
            let game = game.clone();
            let canvas_clone = canvas.clone();
            listeners.add(canvas, "mousemove", move |event: Event| {
                if let Some(event) = event.dyn_ref::<MouseEvent>() {
                    let pos = canvas_point(&canvas_clone, event.client_x(), event.client_y());
                    game.borrow_mut().engine.pointer_move(pos);
                }
            });
        }
        {
            let game = game.clone();
            listeners.add(&window, "mouseup", move |_event: Event| {
                game.borrow_mut().engine.pointer_up();
            });
        }

        // Touch
        {
            let game = game.clone();
            let canvas_clone = canvas.clone();
            listeners.add(canvas, "touchstart", move |event: Event| {
                event.prevent_default();
                let Some(event) = event.dyn_ref::<TouchEvent>() else {
                    return;
                };
                if let Some(touch) = event.touches().get(0) {
                    let pos = canvas_point(&canvas_clone, touch.client_x(), touch.client_y());
                    with_input(&game, |engine| engine.pointer_down(pos));
                }
            });
        }
        {
            let game = game.clone();
            let canvas_clone = canvas.clone();
            listeners.add(canvas, "touchmove", move |event: Event| {
                event.prevent_default();
                let Some(event) = event.dyn_ref::<TouchEvent>() else {
                    return;
                };
                if let Some(touch) = event.touches().get(0) {
                    let pos = canvas_point(&canvas_clone, touch.client_x(), touch.client_y());
                    game.borrow_mut().engine.pointer_move(pos);
                }
            });
        }
        for name in ["touchend", "touchcancel"] {
            let game = game.clone();
            listeners.add(canvas, name, move |_event: Event| {
                game.borrow_mut().engine.pointer_up();
            });
        }

        Ok(())
    }

    /// Optional on-screen buttons (`#btn-up`, `#btn-fire`, ...) for touch devices
    fn setup_control_buttons(listeners: &mut ListenerSet, game: &SharedGame) -> Result<(), GameError> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or(GameError::SurfaceUnavailable("no document".into()))?;

        let buttons = [
            ("btn-up", Button::Up),
            ("btn-down", Button::Down),
            ("btn-left", Button::Left),
            ("btn-right", Button::Right),
            ("btn-fire", Button::Fire),
        ];
        for (id, button) in buttons {
            let Some(el) = document.get_element_by_id(id) else {
                continue;
            };
            for (event, pressed) in [
                ("touchstart", true),
                ("mousedown", true),
                ("touchend", false),
                ("touchcancel", false),
                ("mouseup", false),
                ("mouseleave", false),
            ] {
                let game = game.clone();
                listeners.add(&el, event, move |event: Event| {
                    event.prevent_default();
                    game.borrow_mut().engine.button(button, pressed);
                });
            }
        }
        Ok(())
    }

    fn setup_auto_pause(listeners: &mut ListenerSet, game: &SharedGame) -> Result<(), GameError> {
        let window = web_sys::window().ok_or(GameError::SurfaceUnavailable("no window".into()))?;
        let document = window
            .document()
            .ok_or(GameError::SurfaceUnavailable("no document".into()))?;

        // Visibility change (tab switch, minimize)
        {
            let game = game.clone();
            let document_clone = document.clone();
            listeners.add(&document, "visibilitychange", move |_event: Event| {
                if document_clone.visibility_state() == web_sys::VisibilityState::Hidden {
                    game.borrow_mut().engine.suspend();
                }
            });
        }

        // Window blur (click outside)
        {
            let game = game.clone();
            listeners.add(&window, "blur", move |_event: Event| {
                game.borrow_mut().engine.suspend();
            });
        }
        Ok(())
    }

    fn setup_resize(listeners: &mut ListenerSet, game: &SharedGame) -> Result<(), GameError> {
        let window = web_sys::window().ok_or(GameError::SurfaceUnavailable("no window".into()))?;
        let window_clone = window.clone();
        let game = game.clone();
        listeners.add(&window, "resize", move |_event: Event| {
            let mut g = game.borrow_mut();
            let size = g.surface.fit(window_clone.device_pixel_ratio());
            g.engine.resize(size.x, size.y);
        });
        Ok(())
    }

    /// Stop the game and release every listener and pending frame
    #[wasm_bindgen]
    pub fn destroy_game() {
        if let Some(game) = GAME.with(|slot| slot.borrow_mut().take()) {
            game.borrow_mut().engine.destroy();
        }
    }

    /// JSON snapshot of the running game (for embedding pages and debugging)
    #[wasm_bindgen]
    pub fn game_snapshot() -> Option<String> {
        GAME.with(|slot| {
            let game = slot.borrow().clone()?;
            let snapshot = game.borrow().engine.snapshot_json();
            match snapshot {
                Ok(json) => Some(json),
                Err(e) => {
                    log::warn!("Snapshot failed: {}", e);
                    None
                }
            }
        })
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_game::run().await;
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Space Shooter (native) starting...");
    log::info!("Native mode runs a headless demo - run with `trunk serve` for the web version");

    run_headless_demo();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Autopilot session: weave left and right with the trigger held until the
/// ship is destroyed or two minutes of game time pass.
#[cfg(not(target_arch = "wasm32"))]
fn run_headless_demo() {
    use space_shooter::consts::FRAME_MS;
    use space_shooter::platform::{
        Clock, Controls, ManualClock, ManualScheduler, MemoryStore, SystemClock,
    };
    use space_shooter::renderer::RecordingSurface;
    use space_shooter::sim::{GameMode, Viewport};
    use space_shooter::{Engine, QualityPreset, Settings};

    // Optional quality preset argument: low, medium or high
    let preset = std::env::args()
        .nth(1)
        .and_then(|arg| QualityPreset::parse(&arg))
        .unwrap_or_default();
    log::info!("Quality preset: {}", preset.as_str());

    let clock = ManualClock::new(0.0);
    let scheduler = ManualScheduler::new();
    let mut engine = Engine::initialize(
        Viewport::new(1024.0, 768.0),
        Settings::from_preset(preset),
        Box::new(MemoryStore::new()),
        Box::new(clock.clone()),
    );
    engine.set_scheduler(Box::new(scheduler.clone()));
    let mut surface = RecordingSurface::new(1024.0, 768.0);

    if let Err(e) = engine.start() {
        log::error!("Could not start: {}", e);
        return;
    }

    let wall = SystemClock::new();
    let frame_ms = FRAME_MS as f64;
    let mut time = 0.0;
    while engine.mode() == GameMode::Playing && time < 120_000.0 {
        if scheduler.take_pending().is_none() {
            log::warn!("No frame scheduled, stopping");
            break;
        }
        let phase = (time / 1500.0) as u64 % 2 == 0;
        engine.set_controls(Controls {
            left: phase,
            right: !phase,
            fire: true,
            ..Controls::default()
        });
        clock.advance(frame_ms);
        time += frame_ms;
        surface.reset();
        engine.frame(time, &mut surface);
    }

    let snapshot = engine.snapshot();
    println!("\nHeadless session finished ({:?})", snapshot.mode);
    println!("  Score:        {}", snapshot.player.score);
    println!("  Level:        {}", snapshot.player.level);
    println!("  Enemies:      {}", snapshot.stats.enemies_killed);
    println!("  Power-ups:    {}", snapshot.stats.power_ups_collected);
    println!("  Shots fired:  {}", snapshot.stats.shots_fired);
    println!("  Session time: {:.1}s", snapshot.session_ms / 1000.0);
    println!("  Wall time:    {:.1}ms", wall.now_ms());
    if let Some(card) = engine.share_card() {
        println!("\n{}", card.share_text());
    }

    engine.destroy();
}
