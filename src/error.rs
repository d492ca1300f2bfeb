//! Error types
//!
//! Nothing in the simulation loop returns an error; these cover the
//! platform edges (storage, share, surfaces) and rejected flow commands.

use std::fmt;

use crate::sim::GameMode;

/// A flow command that is not valid in the current mode
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FlowError {
    pub mode: GameMode,
    pub command: &'static str,
}

impl fmt::Display for FlowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot {} while {:?}", self.command, self.mode)
    }
}

impl std::error::Error for FlowError {}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameError {
    /// Durable storage is disabled or missing
    StorageUnavailable,
    /// Storage rejected a write (quota, privacy mode)
    StorageWrite { key: String },
    /// A stored value could not be parsed
    CorruptValue { key: String, value: String },
    /// (De)serialization failure
    Serialization(String),
    /// The platform share API is missing
    ShareUnavailable,
    /// The platform share API failed or was cancelled
    ShareFailed(String),
    /// Clipboard write failed
    ClipboardUnavailable,
    /// Drawing surface could not be created
    SurfaceUnavailable(String),
    /// Engine was used after `destroy`
    Destroyed,
    Flow(FlowError),
}

impl fmt::Display for GameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StorageUnavailable => write!(f, "storage unavailable"),
            Self::StorageWrite { key } => write!(f, "failed to write storage key {key}"),
            Self::CorruptValue { key, value } => {
                write!(f, "corrupt value {value:?} under storage key {key}")
            }
            Self::Serialization(msg) => write!(f, "serialization failed: {msg}"),
            Self::ShareUnavailable => write!(f, "share API unavailable"),
            Self::ShareFailed(msg) => write!(f, "share failed: {msg}"),
            Self::ClipboardUnavailable => write!(f, "clipboard unavailable"),
            Self::SurfaceUnavailable(msg) => write!(f, "drawing surface unavailable: {msg}"),
            Self::Destroyed => write!(f, "engine has been destroyed"),
            Self::Flow(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for GameError {}

impl From<serde_json::Error> for GameError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<FlowError> for GameError {
    fn from(err: FlowError) -> Self {
        Self::Flow(err)
    }
}
