//! Core data types for command interpretation

use serde::{Deserialize, Serialize};

/// Where a cursor-move command should land.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CursorTarget {
    /// Top-right corner of the screen.
    TopRight,
    /// The fixed fallback position when no location was spoken.
    Default,
}

/// Key chords the interpreter can issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyChord {
    /// Alt+F4: close the focused window.
    AltF4,
}

/// A fully interpreted voice command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    MoveCursor { target: CursorTarget },
    CloseWindow,
}

/// What became of one piece of recognized text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Executed(Command),
    /// The text matched no known phrase; not an error.
    NoMatch,
    /// A blocklisted (or unknown, per policy) application held focus.
    SuppressedByFocus { app_name: Option<String> },
    /// The injection backend could not perform the action.
    Failed(String),
}

/// Configuration for the command interpreter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterpreterConfig {
    /// Act even when the active window cannot be determined.
    #[serde(default = "default_true")]
    pub act_on_unknown_focus: bool,

    /// Lowercased application-name substrings under which commands are
    /// suppressed (false-positive guard for e.g. screen-share tools).
    #[serde(default)]
    pub blocklist: Vec<String>,

    /// Cursor animation time for move commands, in milliseconds.
    #[serde(default = "default_move_duration_ms")]
    pub move_duration_ms: u64,

    /// Landing position for an unqualified "move mouse".
    #[serde(default = "default_position")]
    pub default_position: (i32, i32),
}

fn default_true() -> bool {
    true
}

fn default_move_duration_ms() -> u64 {
    500
}

fn default_position() -> (i32, i32) {
    (200, 200)
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            act_on_unknown_focus: default_true(),
            blocklist: Vec::new(),
            move_duration_ms: default_move_duration_ms(),
            default_position: default_position(),
        }
    }
}
