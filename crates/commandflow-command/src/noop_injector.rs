use crate::error::CommandError;
use crate::types::KeyChord;
use crate::InputInjector;
use std::time::Duration;
use tracing::info;

/// Logs every requested action and performs nothing. Always available, so
/// the pipeline runs end to end on systems with no input simulation.
#[derive(Default)]
pub struct NoopInjector;

impl NoopInjector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl InputInjector for NoopInjector {
    async fn move_cursor(&self, x: i32, y: i32, duration: Duration) -> Result<(), CommandError> {
        info!(x, y, ?duration, "noop injector: move cursor");
        Ok(())
    }

    async fn key_chord(&self, chord: KeyChord) -> Result<(), CommandError> {
        info!(?chord, "noop injector: key chord");
        Ok(())
    }

    async fn screen_size(&self) -> Result<(i32, i32), CommandError> {
        // A plausible geometry keeps corner targets well-defined.
        Ok((1920, 1080))
    }

    async fn is_available(&self) -> bool {
        true
    }

    fn backend_name(&self) -> &'static str {
        "noop"
    }
}
