//! Time sources and frame scheduling
//!
//! Cooldowns and spawn timers are measured on a wall clock, but through a
//! `SessionClock` that only runs while the game is being played. Pausing
//! therefore freezes every timer.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Wall-clock milliseconds
pub trait Clock {
    fn now_ms(&self) -> f64;
}

/// `std::time` backed clock (native)
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: std::time::Instant,
}

#[cfg(not(target_arch = "wasm32"))]
impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: std::time::Instant::now(),
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl Clock for SystemClock {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// `Date.now()` backed clock (WASM)
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone, Copy, Default)]
pub struct DateClock;

#[cfg(target_arch = "wasm32")]
impl Clock for DateClock {
    fn now_ms(&self) -> f64 {
        js_sys::Date::now()
    }
}

/// Hand-driven clock for tests and headless runs.
///
/// Clones share the same time, so a test can keep a handle after giving the
/// clock to the engine.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<f64>>,
}

impl ManualClock {
    pub fn new(start_ms: f64) -> Self {
        Self {
            now: Rc::new(Cell::new(start_ms)),
        }
    }

    pub fn advance(&self, ms: f64) {
        self.now.set(self.now.get() + ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> f64 {
        self.now.get()
    }
}

/// Pause-aware session time derived from the wall clock
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SessionClock {
    /// Session time banked before the current run segment
    banked: f64,
    /// Wall time at which the current run segment started
    running_since: Option<f64>,
}

impl SessionClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Session milliseconds at wall time `wall`
    pub fn now(&self, wall: f64) -> f64 {
        match self.running_since {
            Some(since) => self.banked + (wall - since).max(0.0),
            None => self.banked,
        }
    }

    /// Start (or keep) counting
    pub fn run(&mut self, wall: f64) {
        if self.running_since.is_none() {
            self.running_since = Some(wall);
        }
    }

    /// Stop counting, banking the elapsed segment
    pub fn freeze(&mut self, wall: f64) {
        if let Some(since) = self.running_since.take() {
            self.banked += (wall - since).max(0.0);
        }
    }

    /// Back to zero, stopped
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Opaque id of a requested frame callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub i32);

/// Display-synchronized frame scheduling (requestAnimationFrame on the web)
pub trait Scheduler {
    /// Ask for one more frame callback
    fn request_frame(&mut self) -> Option<FrameHandle>;
    /// Cancel a requested frame so it never runs
    fn cancel_frame(&mut self, handle: FrameHandle);
}

#[derive(Debug, Default)]
struct ManualSchedulerInner {
    next_id: i32,
    pending: Vec<FrameHandle>,
    cancelled: Vec<FrameHandle>,
}

/// Scheduler that only records requests; the test or headless driver decides
/// when frames happen.
#[derive(Debug, Clone, Default)]
pub struct ManualScheduler {
    inner: Rc<RefCell<ManualSchedulerInner>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames requested and not yet taken or cancelled
    pub fn pending(&self) -> Vec<FrameHandle> {
        self.inner.borrow().pending.clone()
    }

    pub fn cancelled(&self) -> Vec<FrameHandle> {
        self.inner.borrow().cancelled.clone()
    }

    /// Pop the oldest pending frame (the driver is about to run it)
    pub fn take_pending(&self) -> Option<FrameHandle> {
        let mut inner = self.inner.borrow_mut();
        if inner.pending.is_empty() {
            None
        } else {
            Some(inner.pending.remove(0))
        }
    }
}

impl Scheduler for ManualScheduler {
    fn request_frame(&mut self) -> Option<FrameHandle> {
        let mut inner = self.inner.borrow_mut();
        inner.next_id += 1;
        let handle = FrameHandle(inner.next_id);
        inner.pending.push(handle);
        Some(handle)
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        let mut inner = self.inner.borrow_mut();
        inner.pending.retain(|h| *h != handle);
        inner.cancelled.push(handle);
    }
}
