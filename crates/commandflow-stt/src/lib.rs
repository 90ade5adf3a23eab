//! Speech-to-text abstraction layer for CommandFlow
//!
//! Completed utterances from the segmenter are handed to a bounded worker
//! pool here; each worker writes the audio to a temporary WAV file, invokes a
//! [`Transcriber`] backend, and forwards the recognized text as a
//! [`TranscriptionEvent`]. Model inference itself always lives behind the
//! `Transcriber` seam.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

pub mod backends;
pub mod dispatcher;
pub mod preprocess;
pub mod types;
pub mod wav;

pub use dispatcher::TranscriptionDispatcher;
pub use types::{DispatchConfig, SttError, TranscriptionEvent};

/// Generates unique utterance IDs
static UTTERANCE_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Generate a unique utterance ID
pub fn next_utterance_id() -> u64 {
    UTTERANCE_ID_COUNTER.fetch_add(1, Ordering::SeqCst)
}

/// Core transcription interface.
///
/// Implementations receive a mono 16-bit WAV on disk and return the
/// recognized text, `None` when the audio contained no recognizable speech.
#[async_trait::async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe_wav(&self, wav_path: &Path) -> Result<Option<String>, SttError>;

    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utterance_ids_are_unique_and_increasing() {
        let a = next_utterance_id();
        let b = next_utterance_id();
        assert!(b > a);
    }
}
