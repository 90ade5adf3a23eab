use crate::error::CommandError;
use crate::types::KeyChord;
use crate::InputInjector;
use enigo::{Coordinate, Direction, Enigo, Key, Keyboard, Mouse, Settings};
use std::time::Duration;
use tracing::{debug, warn};

/// Real input simulation through the enigo library.
///
/// Enigo's platform handles are not `Sync`, so every action constructs its
/// own instance on a blocking thread; the per-call setup cost is negligible
/// next to the animated move itself.
#[derive(Default)]
pub struct EnigoInjector;

impl EnigoInjector {
    pub fn new() -> Self {
        Self
    }
}

fn new_enigo() -> Result<Enigo, CommandError> {
    Enigo::new(&Settings::default()).map_err(|e| CommandError::BackendUnavailable {
        backend: "enigo",
        reason: e.to_string(),
    })
}

fn animated_move(enigo: &mut Enigo, x: i32, y: i32, duration: Duration) -> Result<(), CommandError> {
    let (from_x, from_y) = enigo
        .location()
        .map_err(|e| CommandError::InjectionFailed(e.to_string()))?;

    let steps = (duration.as_millis() / 10).clamp(1, 100) as i32;
    for step in 1..=steps {
        let ix = from_x + (x - from_x) * step / steps;
        let iy = from_y + (y - from_y) * step / steps;
        enigo
            .move_mouse(ix, iy, Coordinate::Abs)
            .map_err(|e| CommandError::InjectionFailed(e.to_string()))?;
        std::thread::sleep(duration / steps as u32);
    }
    Ok(())
}

#[async_trait::async_trait]
impl InputInjector for EnigoInjector {
    async fn move_cursor(&self, x: i32, y: i32, duration: Duration) -> Result<(), CommandError> {
        debug!(x, y, ?duration, "enigo: move cursor");
        tokio::task::spawn_blocking(move || {
            let mut enigo = new_enigo()?;
            animated_move(&mut enigo, x, y, duration)
        })
        .await
        .map_err(|e| CommandError::InjectionFailed(format!("injection task panicked: {}", e)))?
    }

    async fn key_chord(&self, chord: KeyChord) -> Result<(), CommandError> {
        debug!(?chord, "enigo: key chord");
        tokio::task::spawn_blocking(move || {
            let mut enigo = new_enigo()?;
            match chord {
                KeyChord::AltF4 => {
                    let pressed = enigo.key(Key::Alt, Direction::Press);
                    let clicked = pressed.and_then(|_| enigo.key(Key::F4, Direction::Click));
                    // Always release the modifier, even if F4 failed above.
                    if let Err(e) = enigo.key(Key::Alt, Direction::Release) {
                        warn!("failed to release Alt: {}", e);
                    }
                    clicked.map_err(|e| CommandError::InjectionFailed(e.to_string()))?;
                }
            }
            Ok(())
        })
        .await
        .map_err(|e| CommandError::InjectionFailed(format!("injection task panicked: {}", e)))?
    }

    async fn screen_size(&self) -> Result<(i32, i32), CommandError> {
        tokio::task::spawn_blocking(|| {
            let enigo = new_enigo()?;
            enigo
                .main_display()
                .map_err(|e| CommandError::ScreenGeometry(e.to_string()))
        })
        .await
        .map_err(|e| CommandError::ScreenGeometry(format!("probe task panicked: {}", e)))?
    }

    async fn is_available(&self) -> bool {
        tokio::task::spawn_blocking(|| Enigo::new(&Settings::default()).is_ok())
            .await
            .unwrap_or(false)
    }

    fn backend_name(&self) -> &'static str {
        "enigo"
    }
}
