//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Time/ticks and frame scheduling
//! - Input events
//! - Storage (LocalStorage on web, in-memory elsewhere)

pub mod input;
pub mod storage;
pub mod time;

#[cfg(target_arch = "wasm32")]
pub mod web;

pub use input::{Button, Controls, FlowCommand, InputAdapter, Key};
pub use storage::{KeyValueStore, MemoryStore};
pub use time::{Clock, FrameHandle, ManualClock, ManualScheduler, Scheduler, SessionClock};

#[cfg(not(target_arch = "wasm32"))]
pub use time::SystemClock;
