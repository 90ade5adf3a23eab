//! Active-window context used to gate command execution.
//!
//! OS-specific enumeration stays outside this crate; implementations of
//! [`WindowProbe`] wrap whatever mechanism the host platform offers and the
//! interpreter only ever sees snapshots.

use serde::{Deserialize, Serialize};

/// Point-in-time description of the focused window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSnapshot {
    pub title: String,
    pub app_name: String,
}

/// Source of active-window snapshots.
pub trait WindowProbe: Send + Sync {
    /// The currently focused window, or `None` when focus is unknown.
    fn active_window(&self) -> Option<WindowSnapshot>;
}

/// Probe that never knows the active window. Commands are then gated purely
/// by the `act_on_unknown_focus` policy.
#[derive(Default)]
pub struct NullWindowProbe;

impl NullWindowProbe {
    pub fn new() -> Self {
        Self
    }
}

impl WindowProbe for NullWindowProbe {
    fn active_window(&self) -> Option<WindowSnapshot> {
        None
    }
}

/// Fixed-snapshot probe for tests and headless runs.
pub struct StaticWindowProbe {
    snapshot: WindowSnapshot,
}

impl StaticWindowProbe {
    pub fn new(title: impl Into<String>, app_name: impl Into<String>) -> Self {
        Self {
            snapshot: WindowSnapshot {
                title: title.into(),
                app_name: app_name.into(),
            },
        }
    }
}

impl WindowProbe for StaticWindowProbe {
    fn active_window(&self) -> Option<WindowSnapshot> {
        Some(self.snapshot.clone())
    }
}
