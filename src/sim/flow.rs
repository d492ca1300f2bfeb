//! Game-flow state machine
//!
//! ```text
//! Intro --start--> Playing <--pause/resume--> Paused
//!                     |
//!                 health <= 0
//!                     v
//!                  GameOver --share--> Share --dismiss--> GameOver
//!                     ^  \--restart--> Playing <--restart-- Share
//! ```
//!
//! Transitions only touch mode-level fields. Clock handling and persistence
//! belong to the engine, which watches the mode before and after.

use super::state::{GameEvent, GameMode, GameState};
use crate::error::FlowError;
use crate::platform::input::FlowCommand;

fn reject(state: &GameState, command: &'static str) -> FlowError {
    let err = FlowError {
        mode: state.mode,
        command,
    };
    log::debug!("Rejected transition: {}", err);
    err
}

/// Intro -> Playing
pub fn start(state: &mut GameState, now: f64) -> Result<(), FlowError> {
    if state.mode != GameMode::Intro {
        return Err(reject(state, "start"));
    }
    state.reset_session(now);
    state.mode = GameMode::Playing;
    log::info!("Game started");
    Ok(())
}

/// Playing -> Paused
pub fn pause(state: &mut GameState) -> Result<(), FlowError> {
    if state.mode != GameMode::Playing {
        return Err(reject(state, "pause"));
    }
    state.mode = GameMode::Paused;
    state.shake.clear();
    log::info!("Game paused");
    Ok(())
}

/// Paused -> Playing
pub fn resume(state: &mut GameState) -> Result<(), FlowError> {
    if state.mode != GameMode::Paused {
        return Err(reject(state, "resume"));
    }
    state.mode = GameMode::Playing;
    log::info!("Game resumed");
    Ok(())
}

/// GameOver | Share -> Playing, with a fresh session
pub fn restart(state: &mut GameState, now: f64) -> Result<(), FlowError> {
    if !matches!(state.mode, GameMode::GameOver | GameMode::Share) {
        return Err(reject(state, "restart"));
    }
    state.reset_session(now);
    state.mode = GameMode::Playing;
    log::info!("Game restarted");
    Ok(())
}

/// GameOver -> Share
pub fn open_share(state: &mut GameState) -> Result<(), FlowError> {
    if state.mode != GameMode::GameOver {
        return Err(reject(state, "share"));
    }
    state.mode = GameMode::Share;
    Ok(())
}

/// Share -> GameOver
pub fn dismiss_share(state: &mut GameState) -> Result<(), FlowError> {
    if state.mode != GameMode::Share {
        return Err(reject(state, "dismiss share"));
    }
    state.mode = GameMode::GameOver;
    Ok(())
}

/// Playing -> GameOver. Records the end time and raises the in-memory high
/// score if it was beaten; returns whether it was.
pub fn game_over(state: &mut GameState, now: f64) -> Result<bool, FlowError> {
    if state.mode != GameMode::Playing {
        return Err(reject(state, "end the game"));
    }
    state.shake.clear();
    state.mode = GameMode::GameOver;
    state.stats.ended_at = Some(now);

    let score = state.player.score;
    let beaten = score > state.high_score;
    if beaten {
        state.high_score = score;
        state.new_high_score = true;
    }
    state.events.push(GameEvent::GameOver {
        score,
        new_high_score: beaten,
    });
    log::info!("Game over - score {}, level {}", score, state.player.level);
    Ok(beaten)
}

/// Apply an input command, mapping the pause toggle by mode
pub fn apply(state: &mut GameState, command: FlowCommand, now: f64) -> Result<GameMode, FlowError> {
    match command {
        FlowCommand::Start => start(state, now),
        FlowCommand::TogglePause => match state.mode {
            GameMode::Paused => resume(state),
            _ => pause(state),
        },
        FlowCommand::Restart => restart(state, now),
        FlowCommand::Share => open_share(state),
        FlowCommand::DismissShare => dismiss_share(state),
    }?;
    Ok(state.mode)
}
