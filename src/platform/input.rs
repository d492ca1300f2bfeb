//! Input adapter
//!
//! Turns raw host events into two things:
//! - `Controls`: level-triggered movement and fire state, read every tick
//! - `FlowCommand`: edge-triggered mode changes (start, pause, restart, ...)
//!
//! Holding a key or receiving OS key-repeat yields exactly one command.

use std::collections::HashSet;

use glam::Vec2;

use crate::sim::GameMode;

/// Logical keys the game reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    /// Space: fire while playing, start/restart otherwise
    Space,
    Enter,
    Pause,
    Escape,
    Restart,
    Share,
}

impl Key {
    /// Map a DOM `KeyboardEvent.key` value
    pub fn from_dom(key: &str) -> Option<Key> {
        match key {
            "ArrowUp" | "w" | "W" => Some(Key::Up),
            "ArrowDown" | "s" | "S" => Some(Key::Down),
            "ArrowLeft" | "a" | "A" => Some(Key::Left),
            "ArrowRight" | "d" | "D" => Some(Key::Right),
            " " | "Spacebar" => Some(Key::Space),
            "Enter" => Some(Key::Enter),
            "p" | "P" => Some(Key::Pause),
            "Escape" | "Esc" => Some(Key::Escape),
            "r" | "R" => Some(Key::Restart),
            "x" | "X" => Some(Key::Share),
            _ => None,
        }
    }
}

/// Per-tick control vector
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Controls {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    pub fire: bool,
    /// Drag target in viewport pixels (pointer/touch); overrides the flags
    pub move_target: Option<Vec2>,
}

/// Edge-triggered game-flow request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowCommand {
    Start,
    TogglePause,
    Restart,
    Share,
    DismissShare,
}

/// On-screen button ids (mobile overlay)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    Up,
    Down,
    Left,
    Right,
    Fire,
}

/// Normalizes keyboard, buttons and pointer into controls and commands
#[derive(Debug, Clone)]
pub struct InputAdapter {
    held: HashSet<Key>,
    buttons: HashSet<Button>,
    pointer: Option<Vec2>,
    /// False when the host has no pointer/touch events; pointer calls are ignored
    pointer_supported: bool,
}

impl Default for InputAdapter {
    fn default() -> Self {
        Self::new(true)
    }
}

impl InputAdapter {
    pub fn new(pointer_supported: bool) -> Self {
        if !pointer_supported {
            log::warn!("Pointer input unavailable - keyboard only");
        }
        Self {
            held: HashSet::new(),
            buttons: HashSet::new(),
            pointer: None,
            pointer_supported,
        }
    }

    /// Key pressed (DOM key string); returns a command on the first press only
    pub fn key_down(&mut self, key: &str, mode: GameMode) -> Option<FlowCommand> {
        let key = Key::from_dom(key)?;
        if !self.held.insert(key) {
            // Repeat
            return None;
        }
        Self::command_for(key, mode)
    }

    pub fn key_up(&mut self, key: &str) {
        if let Some(key) = Key::from_dom(key) {
            self.held.remove(&key);
        }
    }

    pub fn button(&mut self, button: Button, pressed: bool) {
        if pressed {
            self.buttons.insert(button);
        } else {
            self.buttons.remove(&button);
        }
    }

    /// Pointer/touch down: fire and steer while playing, start from the intro
    pub fn pointer_down(&mut self, pos: Vec2, mode: GameMode) -> Option<FlowCommand> {
        if !self.pointer_supported {
            return None;
        }
        match mode {
            GameMode::Intro => Some(FlowCommand::Start),
            GameMode::Playing => {
                self.pointer = Some(pos);
                None
            }
            _ => None,
        }
    }

    pub fn pointer_move(&mut self, pos: Vec2) {
        if let Some(target) = self.pointer.as_mut() {
            *target = pos;
        }
    }

    pub fn pointer_up(&mut self) {
        self.pointer = None;
    }

    /// Forget everything held (window blur, session reset)
    pub fn release_all(&mut self) {
        self.held.clear();
        self.buttons.clear();
        self.pointer = None;
    }

    /// Current control vector
    pub fn controls(&self) -> Controls {
        let key = |k| self.held.contains(&k);
        let button = |b| self.buttons.contains(&b);
        Controls {
            up: key(Key::Up) || button(Button::Up),
            down: key(Key::Down) || button(Button::Down),
            left: key(Key::Left) || button(Button::Left),
            right: key(Key::Right) || button(Button::Right),
            fire: key(Key::Space) || button(Button::Fire) || self.pointer.is_some(),
            move_target: self.pointer,
        }
    }

    fn command_for(key: Key, mode: GameMode) -> Option<FlowCommand> {
        match (mode, key) {
            (GameMode::Intro, Key::Space | Key::Enter) => Some(FlowCommand::Start),
            (GameMode::Playing | GameMode::Paused, Key::Pause | Key::Escape) => {
                Some(FlowCommand::TogglePause)
            }
            (GameMode::GameOver | GameMode::Share, Key::Space | Key::Restart) => {
                Some(FlowCommand::Restart)
            }
            (GameMode::GameOver, Key::Share) => Some(FlowCommand::Share),
            (GameMode::Share, Key::Escape | Key::Share) => Some(FlowCommand::DismissShare),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wasd_and_arrows_map_to_same_controls() {
        let mut input = InputAdapter::default();
        input.key_down("w", GameMode::Playing);
        input.key_down("ArrowLeft", GameMode::Playing);
        let c = input.controls();
        assert!(c.up && c.left);
        assert!(!c.down && !c.right && !c.fire);
        input.key_up("W");
        assert!(!input.controls().up);
    }

    #[test]
    fn test_held_pause_key_toggles_once() {
        let mut input = InputAdapter::default();
        assert_eq!(
            input.key_down("p", GameMode::Playing),
            Some(FlowCommand::TogglePause)
        );
        // OS key-repeat
        assert_eq!(input.key_down("p", GameMode::Paused), None);
        assert_eq!(input.key_down("P", GameMode::Paused), None);
        input.key_up("p");
        assert_eq!(
            input.key_down("p", GameMode::Paused),
            Some(FlowCommand::TogglePause)
        );
    }

    #[test]
    fn test_space_held_through_death_does_not_restart() {
        let mut input = InputAdapter::default();
        assert_eq!(input.key_down(" ", GameMode::Playing), None);
        assert!(input.controls().fire);
        assert_eq!(input.key_down(" ", GameMode::GameOver), None);
        input.key_up(" ");
        assert_eq!(
            input.key_down(" ", GameMode::GameOver),
            Some(FlowCommand::Restart)
        );
    }

    #[test]
    fn test_mode_specific_commands() {
        let mut input = InputAdapter::default();
        assert_eq!(input.key_down("Enter", GameMode::Intro), Some(FlowCommand::Start));
        assert_eq!(input.key_down("x", GameMode::GameOver), Some(FlowCommand::Share));
        assert_eq!(
            input.key_down("Escape", GameMode::Share),
            Some(FlowCommand::DismissShare)
        );
        assert_eq!(input.key_down("r", GameMode::Intro), None);
    }

    #[test]
    fn test_pointer_drag_sets_fire_and_target() {
        let mut input = InputAdapter::default();
        assert_eq!(
            input.pointer_down(Vec2::new(10.0, 10.0), GameMode::Intro),
            Some(FlowCommand::Start)
        );
        input.pointer_down(Vec2::new(100.0, 200.0), GameMode::Playing);
        input.pointer_move(Vec2::new(120.0, 180.0));
        let c = input.controls();
        assert!(c.fire);
        assert_eq!(c.move_target, Some(Vec2::new(120.0, 180.0)));
        input.pointer_up();
        assert_eq!(input.controls(), Controls::default());
    }

    #[test]
    fn test_no_pointer_support_degrades_to_keyboard() {
        let mut input = InputAdapter::new(false);
        assert_eq!(input.pointer_down(Vec2::ZERO, GameMode::Intro), None);
        input.pointer_down(Vec2::ZERO, GameMode::Playing);
        assert_eq!(input.controls().move_target, None);
        assert_eq!(input.key_down(" ", GameMode::Intro), Some(FlowCommand::Start));
    }

    #[test]
    fn test_buttons_and_release_all() {
        let mut input = InputAdapter::default();
        input.button(Button::Fire, true);
        input.button(Button::Right, true);
        assert!(input.controls().fire && input.controls().right);
        input.release_all();
        assert_eq!(input.controls(), Controls::default());
    }
}
