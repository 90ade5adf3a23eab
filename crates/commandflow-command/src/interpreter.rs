use crate::parser::parse_command;
use crate::types::{Command, CommandOutcome, CursorTarget, InterpreterConfig, KeyChord};
use crate::window::WindowProbe;
use crate::InputInjector;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Turns recognized text into executed input actions, gated by the active
/// window context.
pub struct CommandInterpreter {
    config: InterpreterConfig,
    injector: Arc<dyn InputInjector>,
    probe: Arc<dyn WindowProbe>,
}

impl CommandInterpreter {
    pub fn new(
        config: InterpreterConfig,
        injector: Arc<dyn InputInjector>,
        probe: Arc<dyn WindowProbe>,
    ) -> Self {
        Self {
            config,
            injector,
            probe,
        }
    }

    /// Interpret and, focus permitting, execute one piece of recognized text.
    pub async fn handle(&self, text: &str) -> CommandOutcome {
        let Some(command) = parse_command(text) else {
            debug!("no command in: {:?}", text);
            return CommandOutcome::NoMatch;
        };

        if let Some(blocked_app) = self.focus_blocks_execution() {
            info!(?command, app = ?blocked_app, "command suppressed by focus gate");
            return CommandOutcome::SuppressedByFocus {
                app_name: blocked_app,
            };
        }

        match self.execute(command).await {
            Ok(()) => {
                info!(?command, backend = self.injector.backend_name(), "command executed");
                CommandOutcome::Executed(command)
            }
            Err(e) => {
                warn!(?command, "command failed: {}", e);
                CommandOutcome::Failed(e.to_string())
            }
        }
    }

    /// Returns `Some(app)` when the focus gate suppresses execution. The
    /// `Some(None)` case means focus was unknown and policy forbids acting.
    fn focus_blocks_execution(&self) -> Option<Option<String>> {
        match self.probe.active_window() {
            Some(snapshot) => {
                let app = snapshot.app_name.to_lowercase();
                let title = snapshot.title.to_lowercase();
                let blocked = self
                    .config
                    .blocklist
                    .iter()
                    .any(|pat| app.contains(pat.as_str()) || title.contains(pat.as_str()));
                blocked.then_some(Some(snapshot.app_name))
            }
            None => (!self.config.act_on_unknown_focus).then_some(None),
        }
    }

    async fn execute(&self, command: Command) -> Result<(), crate::CommandError> {
        let duration = Duration::from_millis(self.config.move_duration_ms);
        match command {
            Command::MoveCursor { target } => {
                let (x, y) = self.resolve_target(target).await?;
                self.injector.move_cursor(x, y, duration).await
            }
            Command::CloseWindow => self.injector.key_chord(KeyChord::AltF4).await,
        }
    }

    async fn resolve_target(
        &self,
        target: CursorTarget,
    ) -> Result<(i32, i32), crate::CommandError> {
        match target {
            CursorTarget::TopRight => {
                let (width, _height) = self.injector.screen_size().await?;
                Ok((width - 1, 0))
            }
            CursorTarget::Default => Ok(self.config.default_position),
        }
    }
}
