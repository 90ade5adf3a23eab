//! # CommandFlow Command Interpretation
//!
//! Maps recognized text onto a small fixed set of computer-control actions
//! and carries them out through pluggable input-injection backends.
//!
//! ## Backend support
//!
//! | Backend | Platform | Notes                        |
//! |---------|----------|------------------------------|
//! | NoOp    | All      | Logs actions, always usable  |
//! | Enigo   | Cross    | Real cursor/keyboard control |
//!
//! The `enigo` feature enables the real input-simulation backend; without it
//! the interpreter still parses and gates commands but performs nothing.

pub mod error;
pub mod interpreter;
pub mod parser;
pub mod processor;
pub mod types;
pub mod window;

pub mod noop_injector;

#[cfg(feature = "enigo")]
pub mod enigo_injector;

pub use error::CommandError;
pub use interpreter::CommandInterpreter;
pub use noop_injector::NoopInjector;
pub use parser::parse_command;
pub use processor::CommandProcessor;
pub use types::{Command, CommandOutcome, CursorTarget, InterpreterConfig, KeyChord};
pub use window::{NullWindowProbe, WindowProbe, WindowSnapshot};

use std::time::Duration;

/// Input-simulation seam. Implementations perform the OS-level action for an
/// interpreted command.
#[async_trait::async_trait]
pub trait InputInjector: Send + Sync {
    /// Move the cursor to absolute screen coordinates, animated over
    /// `duration`.
    async fn move_cursor(&self, x: i32, y: i32, duration: Duration) -> Result<(), CommandError>;

    /// Press a key chord.
    async fn key_chord(&self, chord: KeyChord) -> Result<(), CommandError>;

    /// Screen dimensions in pixels, used to resolve corner targets.
    async fn screen_size(&self) -> Result<(i32, i32), CommandError>;

    /// Whether the backend is ready to inject on this system.
    async fn is_available(&self) -> bool;

    fn backend_name(&self) -> &'static str;
}
