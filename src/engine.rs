//! Engine - owns the game state and drives it frame by frame
//!
//! The host (browser page or native driver) feeds it raw input, calls
//! `frame` from its scheduler and provides a drawing surface. The engine
//! keeps the pause-aware session clock, persists the high score and
//! settings, and tears down host resources on `destroy`.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::FRAME_MS;
use crate::error::{FlowError, GameError};
use crate::highscores::HighScore;
use crate::platform::input::{Button, Controls, FlowCommand, InputAdapter};
use crate::platform::storage::KeyValueStore;
use crate::platform::time::{Clock, FrameHandle, Scheduler, SessionClock};
use crate::renderer::{self, RenderOptions, Rgba, Surface, TextAlign};
use crate::settings::Settings;
use crate::share::ShareCard;
use crate::sim::state::{
    ActiveEffect, Bullet, Enemy, GameEvent, GameMode, GameState, Player, PowerUp, ScreenShake,
    SessionStats, Viewport,
};
use crate::sim::{flow, tick};

/// How long a notice stays on screen (wall ms)
const NOTICE_MS: f64 = 2_500.0;

/// Serializable read-only view of the game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub mode: GameMode,
    pub viewport: Viewport,
    pub player: Player,
    pub enemies: Vec<Enemy>,
    pub bullets: Vec<Bullet>,
    pub power_ups: Vec<PowerUp>,
    pub active_effects: Vec<ActiveEffect>,
    pub particle_count: usize,
    pub shake: ScreenShake,
    pub stats: SessionStats,
    pub high_score: u64,
    pub new_high_score: bool,
    pub session_ms: f64,
}

/// Rolling FPS estimate over the last 60 frames
#[derive(Debug, Clone)]
struct FpsCounter {
    frame_times: [f64; 60],
    frame_index: usize,
    fps: u32,
}

impl FpsCounter {
    fn new() -> Self {
        Self {
            frame_times: [0.0; 60],
            frame_index: 0,
            fps: 0,
        }
    }

    fn record(&mut self, time: f64) {
        self.frame_times[self.frame_index] = time;
        self.frame_index = (self.frame_index + 1) % self.frame_times.len();

        // Oldest sample sits at the next write position
        let oldest = self.frame_times[self.frame_index];
        if oldest > 0.0 {
            let elapsed = time - oldest;
            if elapsed > 0.0 {
                self.fps = ((self.frame_times.len() - 1) as f64 * 1000.0 / elapsed).round() as u32;
            }
        }
    }
}

/// Transient message shown over the game
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub text: String,
    /// Wall time at which it disappears
    pub until: f64,
}

pub struct Engine {
    state: GameState,
    settings: Settings,
    high_score: HighScore,
    store: Box<dyn KeyValueStore>,
    clock: Box<dyn Clock>,
    session: SessionClock,
    input: InputAdapter,
    scheduler: Option<Box<dyn Scheduler>>,
    pending_frame: Option<FrameHandle>,
    teardown: Vec<Box<dyn FnOnce()>>,
    last_frame: Option<f64>,
    fps: FpsCounter,
    notice: Option<Notice>,
    destroyed: bool,
}

impl Engine {
    /// Create an engine in `Intro` mode, loading the persisted high score
    pub fn initialize(
        viewport: Viewport,
        settings: Settings,
        store: Box<dyn KeyValueStore>,
        clock: Box<dyn Clock>,
    ) -> Self {
        let high_score = HighScore::load(store.as_ref());
        let seed = clock.now_ms().to_bits();
        let mut state = GameState::new(
            viewport,
            settings.tuning_for(viewport.width),
            high_score.value,
            seed,
        );
        state.max_particles = settings.max_particles();
        log::info!(
            "Engine initialized ({}x{}, {:?} profile, high score {})",
            viewport.width,
            viewport.height,
            settings.profile.resolve(viewport.width),
            high_score.value
        );

        Self {
            state,
            settings,
            high_score,
            store,
            clock,
            session: SessionClock::new(),
            input: InputAdapter::default(),
            scheduler: None,
            pending_frame: None,
            teardown: Vec::new(),
            last_frame: None,
            fps: FpsCounter::new(),
            notice: None,
            destroyed: false,
        }
    }

    /// Replace the input adapter (e.g. when the host has no pointer events)
    pub fn with_input(mut self, input: InputAdapter) -> Self {
        self.input = input;
        self
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn mode(&self) -> GameMode {
        self.state.mode
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn high_score(&self) -> u64 {
        self.high_score.value
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn fps(&self) -> u32 {
        self.fps.fps
    }

    /// Session milliseconds (frozen outside `Playing`)
    pub fn session_now(&self) -> f64 {
        self.session.now(self.clock.now_ms())
    }

    /// Apply and persist new settings. Tuning changes take effect on the
    /// next session start.
    pub fn set_settings(&mut self, settings: Settings) {
        self.state.max_particles = settings.max_particles();
        settings.save(self.store.as_mut());
        self.settings = settings;
    }

    // === Simulation ===

    /// Advance the simulation by `dt_ms` (no-op unless playing)
    pub fn tick(&mut self, dt_ms: f32) {
        if self.destroyed {
            return;
        }
        let before = self.state.mode;
        let input = tick::TickInput {
            dt_ms,
            now_ms: self.session_now(),
        };
        tick::tick(&mut self.state, &input);
        self.after_transition(before);
        self.collect_events();
    }

    /// Keep the clock and persistence in step with mode changes
    fn after_transition(&mut self, before: GameMode) {
        let after = self.state.mode;
        if before == after {
            return;
        }
        let wall = self.clock.now_ms();
        if after == GameMode::Playing {
            self.session.run(wall);
        } else {
            self.session.freeze(wall);
        }
        if after == GameMode::GameOver {
            self.high_score
                .commit_if_beaten(self.state.player.score, self.store.as_mut());
        }
    }

    /// Turn tick events into player-facing notices
    fn collect_events(&mut self) {
        let events: Vec<GameEvent> = self.state.events.drain(..).collect();
        for event in events {
            let text = match event {
                GameEvent::LevelUp { level } => format!("Level {}! Health Restored!", level),
                GameEvent::PowerUpCollected(kind) => kind.label().to_string(),
                GameEvent::GameOver {
                    new_high_score: true,
                    score,
                } => format!("New high score: {}!", score),
                GameEvent::GameOver { .. } | GameEvent::PlayerHit { .. } => continue,
            };
            self.show_notice(text);
        }
    }

    pub fn show_notice(&mut self, text: impl Into<String>) {
        self.notice = Some(Notice {
            text: text.into(),
            until: self.clock.now_ms() + NOTICE_MS,
        });
    }

    /// Current notice, if it has not expired
    pub fn notice(&self) -> Option<&Notice> {
        let now = self.clock.now_ms();
        self.notice.as_ref().filter(|n| now < n.until)
    }

    // === Flow ===

    /// Run one flow transition and keep the clock and persistence in step.
    /// `fresh_session` transitions start the session clock from zero.
    fn transition(
        &mut self,
        fresh_session: bool,
        apply: impl FnOnce(&mut GameState, f64) -> Result<(), FlowError>,
    ) -> Result<GameMode, GameError> {
        if self.destroyed {
            return Err(GameError::Destroyed);
        }
        let before = self.state.mode;
        let now = if fresh_session { 0.0 } else { self.session_now() };
        if fresh_session && before != GameMode::Playing && before != GameMode::Paused {
            // New sessions pick up the current profile
            self.state.tuning = self.settings.tuning_for(self.state.viewport.width);
        }
        apply(&mut self.state, now)?;
        if fresh_session {
            self.session.reset();
        }
        self.after_transition(before);
        Ok(self.state.mode)
    }

    /// Apply a flow command; invalid ones leave the state untouched
    pub fn handle_command(&mut self, command: FlowCommand) -> Result<GameMode, GameError> {
        let fresh_session = matches!(command, FlowCommand::Start | FlowCommand::Restart);
        self.transition(fresh_session, |state, now| {
            flow::apply(state, command, now).map(|_| ())
        })
    }

    pub fn start(&mut self) -> Result<GameMode, GameError> {
        self.transition(true, flow::start)
    }

    pub fn pause(&mut self) -> Result<GameMode, GameError> {
        self.transition(false, |state, _| flow::pause(state))
    }

    pub fn resume(&mut self) -> Result<GameMode, GameError> {
        self.transition(false, |state, _| flow::resume(state))
    }

    pub fn restart(&mut self) -> Result<GameMode, GameError> {
        self.transition(true, flow::restart)
    }

    pub fn open_share(&mut self) -> Result<GameMode, GameError> {
        self.transition(false, |state, _| flow::open_share(state))
    }

    pub fn dismiss_share(&mut self) -> Result<GameMode, GameError> {
        self.transition(false, |state, _| flow::dismiss_share(state))
    }

    /// Auto-pause when the page is hidden or loses focus
    pub fn suspend(&mut self) {
        self.input.release_all();
        self.state.controls = Controls::default();
        if self.state.mode == GameMode::Playing && self.pause().is_ok() {
            log::info!("Auto-paused");
        }
    }

    // === Input ===

    /// Set the control vector directly (bypassing the input adapter)
    pub fn set_controls(&mut self, controls: Controls) {
        self.state.controls = controls;
    }

    fn dispatch(&mut self, command: Option<FlowCommand>) {
        if let Some(command) = command {
            // Rejections are already logged by the flow module
            let _ = self.handle_command(command);
        }
        // After the command: a session start resets the controls
        self.state.controls = self.input.controls();
    }

    pub fn key_down(&mut self, key: &str) {
        if self.destroyed {
            return;
        }
        let command = self.input.key_down(key, self.state.mode);
        self.dispatch(command);
    }

    pub fn key_up(&mut self, key: &str) {
        self.input.key_up(key);
        self.dispatch(None);
    }

    pub fn button(&mut self, button: Button, pressed: bool) {
        self.input.button(button, pressed);
        self.dispatch(None);
    }

    pub fn pointer_down(&mut self, pos: Vec2) {
        if self.destroyed {
            return;
        }
        let command = self.input.pointer_down(pos, self.state.mode);
        self.dispatch(command);
    }

    pub fn pointer_move(&mut self, pos: Vec2) {
        self.input.pointer_move(pos);
        self.dispatch(None);
    }

    pub fn pointer_up(&mut self) {
        self.input.pointer_up();
        self.dispatch(None);
    }

    // === Frames ===

    /// Hand the engine a scheduler and request the first frame
    pub fn set_scheduler(&mut self, scheduler: Box<dyn Scheduler>) {
        self.scheduler = Some(scheduler);
        self.request_frame();
    }

    fn request_frame(&mut self) {
        if self.destroyed {
            return;
        }
        if let Some(scheduler) = self.scheduler.as_mut() {
            self.pending_frame = scheduler.request_frame();
        }
    }

    /// Run on every scheduled frame: tick, render, schedule the next one
    pub fn frame(&mut self, timestamp_ms: f64, surface: &mut dyn Surface) {
        if self.destroyed {
            return;
        }
        self.pending_frame = None;
        let dt = match self.last_frame {
            Some(last) => (timestamp_ms - last).max(0.0) as f32,
            None => FRAME_MS,
        };
        self.last_frame = Some(timestamp_ms);
        self.fps.record(timestamp_ms);

        self.tick(dt);
        self.render(surface, timestamp_ms);
        self.request_frame();
    }

    /// Draw the current state (never mutates it)
    pub fn render(&self, surface: &mut dyn Surface, time_ms: f64) {
        let options = RenderOptions::from_settings(&self.settings, self.fps.fps);
        renderer::render_with(&self.state, surface, time_ms, &options);
        if let Some(notice) = self.notice() {
            let size = surface.size();
            surface.text(
                &notice.text,
                Vec2::new(size.x / 2.0, size.y - 40.0),
                20.0,
                Rgba::hex(0xffd700),
                TextAlign::Center,
            );
        }
    }

    /// New drawing area size; entity coordinates are left as they are
    pub fn resize(&mut self, width: f32, height: f32) {
        self.state.set_viewport(Viewport::new(width, height));
        log::info!("Resized to {}x{}", width, height);
    }

    // === Teardown ===

    /// Run `hook` on `destroy` (listener removal and the like)
    pub fn register_teardown(&mut self, hook: Box<dyn FnOnce()>) {
        if self.destroyed {
            hook();
        } else {
            self.teardown.push(hook);
        }
    }

    /// Cancel the pending frame and release every host resource. Idempotent.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        if let (Some(scheduler), Some(handle)) = (self.scheduler.as_mut(), self.pending_frame.take()) {
            scheduler.cancel_frame(handle);
        }
        for hook in self.teardown.drain(..) {
            hook();
        }
        self.session.freeze(self.clock.now_ms());
        self.input.release_all();
        log::info!("Engine destroyed");
    }

    // === External reads ===

    pub fn snapshot(&self) -> Snapshot {
        let s = &self.state;
        Snapshot {
            mode: s.mode,
            viewport: s.viewport,
            player: s.player.clone(),
            enemies: s.enemies.clone(),
            bullets: s.bullets.clone(),
            power_ups: s.power_ups.clone(),
            active_effects: s.active_effects.clone(),
            particle_count: s.particles.len(),
            shake: s.shake,
            stats: s.stats.clone(),
            high_score: s.high_score,
            new_high_score: s.new_high_score,
            session_ms: self.session_now(),
        }
    }

    pub fn snapshot_json(&self) -> Result<String, GameError> {
        Ok(serde_json::to_string(&self.snapshot())?)
    }

    /// Share summary, available once the game is over
    pub fn share_card(&self) -> Option<ShareCard> {
        matches!(self.state.mode, GameMode::GameOver | GameMode::Share)
            .then(|| ShareCard::from_state(&self.state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::storage::MemoryStore;
    use crate::platform::time::{ManualClock, ManualScheduler};
    use crate::renderer::RecordingSurface;
    use crate::sim::state::Owner;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Store handle that outlives the engine it was given to
    #[derive(Clone, Default)]
    struct SharedStore(Rc<std::cell::RefCell<MemoryStore>>);

    impl KeyValueStore for SharedStore {
        fn get(&self, key: &str) -> Result<Option<String>, GameError> {
            self.0.borrow().get(key)
        }
        fn set(&mut self, key: &str, value: &str) -> Result<(), GameError> {
            self.0.borrow_mut().set(key, value)
        }
        fn remove(&mut self, key: &str) -> Result<(), GameError> {
            self.0.borrow_mut().remove(key)
        }
    }

    fn engine_with(store: SharedStore, clock: &ManualClock) -> Engine {
        Engine::initialize(
            Viewport::new(1024.0, 768.0),
            Settings {
                profile: crate::settings::DeviceProfile::Desktop,
                ..Settings::default()
            },
            Box::new(store),
            Box::new(clock.clone()),
        )
    }

    fn engine(clock: &ManualClock) -> Engine {
        engine_with(SharedStore::default(), clock)
    }

    #[test]
    fn test_initialize_loads_high_score() {
        let store = SharedStore::default();
        store.0.borrow_mut().set(HighScore::STORAGE_KEY, "4200").unwrap();
        let clock = ManualClock::new(0.0);
        let e = engine_with(store, &clock);
        assert_eq!(e.mode(), GameMode::Intro);
        assert_eq!(e.high_score(), 4200);
        assert_eq!(e.state().high_score, 4200);
    }

    #[test]
    fn test_keys_drive_flow() {
        let clock = ManualClock::new(1_000.0);
        let mut e = engine(&clock);
        e.key_down(" ");
        assert_eq!(e.mode(), GameMode::Playing);
        e.key_up(" ");
        e.key_down("Escape");
        assert_eq!(e.mode(), GameMode::Paused);
        e.key_down("Escape");
        assert_eq!(e.mode(), GameMode::Paused);
        e.key_up("Escape");
        e.key_down("p");
        assert_eq!(e.mode(), GameMode::Playing);
    }

    #[test]
    fn test_pause_freezes_session_clock() {
        let clock = ManualClock::new(50_000.0);
        let mut e = engine(&clock);
        e.start().unwrap();
        assert_eq!(e.session_now(), 0.0);

        clock.advance(1_000.0);
        e.tick(16.0);
        e.pause().unwrap();
        let frozen = e.session_now();
        assert_eq!(frozen, 1_000.0);
        let spawn = e.state().last_enemy_spawn;

        clock.advance(60_000.0);
        e.tick(16.0);
        assert_eq!(e.session_now(), frozen);
        assert_eq!(e.state().last_enemy_spawn, spawn);

        e.resume().unwrap();
        clock.advance(100.0);
        assert_eq!(e.session_now(), 1_100.0);
    }

    #[test]
    fn test_invalid_commands_are_errors() {
        let clock = ManualClock::new(0.0);
        let mut e = engine(&clock);
        assert!(matches!(e.pause(), Err(GameError::Flow(_))));
        assert!(matches!(e.restart(), Err(GameError::Flow(_))));
        assert_eq!(e.mode(), GameMode::Intro);
    }

    #[test]
    fn test_game_over_persists_high_score_and_restart_keeps_it() {
        let store = SharedStore::default();
        let clock = ManualClock::new(0.0);
        let mut e = engine_with(store.clone(), &clock);
        e.start().unwrap();
        e.state.player.score = 300;
        e.state.player.health = 10.0;
        let pos = e.state.player.pos;
        e.state
            .bullets
            .push(Bullet::new(Owner::Enemy, pos, Vec2::ZERO, 20.0));
        clock.advance(16.0);
        e.tick(16.0);

        assert_eq!(e.mode(), GameMode::GameOver);
        assert_eq!(e.high_score(), 300);
        assert_eq!(
            store.0.borrow().get(HighScore::STORAGE_KEY).unwrap().as_deref(),
            Some("300")
        );
        assert!(e.share_card().is_some_and(|c| c.new_high_score));
        assert!(e.notice().is_some());

        e.restart().unwrap();
        assert_eq!(e.state().player.score, 0);
        assert_eq!(e.state().high_score, 300);
        assert_eq!(e.session_now(), 0.0);
        assert!(e.share_card().is_none());
    }

    #[test]
    fn test_held_space_does_not_restart_after_death() {
        let clock = ManualClock::new(0.0);
        let mut e = engine(&clock);
        e.key_down(" ");
        assert_eq!(e.mode(), GameMode::Playing);
        e.state.player.health = 5.0;
        let pos = e.state.player.pos;
        e.state
            .bullets
            .push(Bullet::new(Owner::Enemy, pos, Vec2::ZERO, 20.0));
        e.tick(16.0);
        assert_eq!(e.mode(), GameMode::GameOver);

        // Key repeat while still held
        e.key_down(" ");
        assert_eq!(e.mode(), GameMode::GameOver);
        e.key_up(" ");
        e.key_down(" ");
        assert_eq!(e.mode(), GameMode::Playing);
    }

    #[test]
    fn test_frame_uses_reference_delta_first() {
        let clock = ManualClock::new(0.0);
        let mut e = engine(&clock);
        e.start().unwrap();
        e.set_controls(Controls {
            right: true,
            ..Controls::default()
        });
        let x0 = e.state().player.pos.x;
        let mut surface = RecordingSurface::new(1024.0, 768.0);
        e.frame(5_000.0, &mut surface);
        assert!((e.state().player.pos.x - (x0 + 10.0)).abs() < 1e-3);
        // 2 s gap is clamped to 50 ms (3 frames)
        e.frame(7_000.0, &mut surface);
        assert!((e.state().player.pos.x - (x0 + 40.0)).abs() < 1e-3);
    }

    #[test]
    fn test_destroy_cancels_frame_and_runs_teardown() {
        let clock = ManualClock::new(0.0);
        let mut e = engine(&clock);
        let scheduler = ManualScheduler::new();
        e.set_scheduler(Box::new(scheduler.clone()));
        let pending = scheduler.pending();
        assert_eq!(pending.len(), 1);

        let released = Rc::new(Cell::new(0));
        for _ in 0..2 {
            let released = released.clone();
            e.register_teardown(Box::new(move || released.set(released.get() + 1)));
        }

        e.destroy();
        assert!(e.is_destroyed());
        assert_eq!(released.get(), 2);
        assert!(scheduler.pending().is_empty());
        assert_eq!(scheduler.cancelled(), pending);

        // Later calls are no-ops
        let mut surface = RecordingSurface::new(1024.0, 768.0);
        e.frame(16.0, &mut surface);
        assert!(surface.commands.is_empty());
        assert!(scheduler.pending().is_empty());
        assert_eq!(e.start(), Err(GameError::Destroyed));
        e.destroy();
        assert_eq!(released.get(), 2);
    }

    #[test]
    fn test_frame_reschedules_itself() {
        let clock = ManualClock::new(0.0);
        let mut e = engine(&clock);
        let scheduler = ManualScheduler::new();
        e.set_scheduler(Box::new(scheduler.clone()));
        let mut surface = RecordingSurface::new(1024.0, 768.0);
        for i in 0..3 {
            assert!(scheduler.take_pending().is_some());
            e.frame(i as f64 * 16.0, &mut surface);
        }
        assert_eq!(scheduler.pending().len(), 1);
    }

    #[test]
    fn test_resize_keeps_entity_coordinates() {
        let clock = ManualClock::new(0.0);
        let mut e = engine(&clock);
        e.start().unwrap();
        let pos = e.state().player.pos;
        e.resize(1024.0, 768.0);
        assert_eq!(e.state().viewport, Viewport::new(1024.0, 768.0));
        assert_eq!(e.state().player.pos, pos);
    }

    #[test]
    fn test_drag_recovers_after_viewport_shrink() {
        use crate::consts::{DRAG_DEAD_ZONE, PLAYER_MARGIN};
        let clock = ManualClock::new(0.0);
        let mut e = engine(&clock);
        e.start().unwrap();
        e.state.player.pos = Vec2::new(700.0, 500.0);
        e.resize(400.0, 600.0);
        assert!(e.state().player.pos.x <= 400.0 - PLAYER_MARGIN);

        e.pointer_down(Vec2::new(200.0, 500.0));
        for _ in 0..60 {
            clock.advance(FRAME_MS as f64);
            e.tick(FRAME_MS);
        }
        assert!((e.state().player.pos - Vec2::new(200.0, 500.0)).length() <= DRAG_DEAD_ZONE);
    }

    #[test]
    fn test_snapshot_json_round_trips() {
        let clock = ManualClock::new(0.0);
        let mut e = engine(&clock);
        e.start().unwrap();
        let json = e.snapshot_json().unwrap();
        let snapshot: Snapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(snapshot.mode, GameMode::Playing);
        assert_eq!(snapshot, e.snapshot());
    }

    #[test]
    fn test_suspend_auto_pauses() {
        let clock = ManualClock::new(0.0);
        let mut e = engine(&clock);
        e.start().unwrap();
        e.key_down("ArrowUp");
        assert!(e.state().controls.up);
        e.suspend();
        assert_eq!(e.mode(), GameMode::Paused);
        assert_eq!(e.state().controls, Controls::default());
    }

    #[test]
    fn test_settings_are_saved() {
        let store = SharedStore::default();
        let clock = ManualClock::new(0.0);
        let mut e = engine_with(store.clone(), &clock);
        e.set_settings(Settings {
            particles: false,
            ..Settings::default()
        });
        assert_eq!(e.state().max_particles, 0);
        let loaded = Settings::load(&*store.0.borrow());
        assert!(!loaded.particles);
    }
}
