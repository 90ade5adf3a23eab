//! Core types for transcription dispatch

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SttError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("Transcriber '{backend}' failed: {message}")]
    Backend { backend: &'static str, message: String },

    #[error("Transcriber command exited with {status}: {stderr}")]
    CommandFailed { status: String, stderr: String },
}

/// Transcription event types
#[derive(Debug, Clone)]
pub enum TranscriptionEvent {
    /// Recognized text for a completed utterance
    Final { utterance_id: u64, text: String },
    /// The utterance contained no recognizable speech
    NoSpeech { utterance_id: u64 },
    /// Transcription failed
    Error { utterance_id: u64, message: String },
}

impl TranscriptionEvent {
    pub fn utterance_id(&self) -> u64 {
        match self {
            TranscriptionEvent::Final { utterance_id, .. }
            | TranscriptionEvent::NoSpeech { utterance_id }
            | TranscriptionEvent::Error { utterance_id, .. } => *utterance_id,
        }
    }
}

/// Worker-pool dispatch configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Enable/disable transcription entirely
    pub enabled: bool,
    /// Concurrent transcription workers
    pub workers: usize,
    /// Capacity of the utterance queue feeding the pool; the segmenter side
    /// drops (never blocks) when it is full
    pub queue_depth: usize,
    /// Linear gain applied before the WAV handoff (clipped at full scale)
    pub gain: f32,
    /// Keep the temporary WAV after transcription (debugging aid)
    pub keep_wav_files: bool,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            workers: 4,
            queue_depth: 16,
            gain: 2.0,
            keep_wav_files: false,
        }
    }
}

impl DispatchConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.workers == 0 {
            return Err("workers must be at least 1".into());
        }
        if self.queue_depth == 0 {
            return Err("queue_depth must be at least 1".into());
        }
        if !self.gain.is_finite() || self.gain <= 0.0 {
            return Err("gain must be a positive finite value".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_dispatch_config_is_valid() {
        DispatchConfig::default().validate().unwrap();
    }

    #[test]
    fn zero_workers_rejected() {
        let cfg = DispatchConfig {
            workers: 0,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn event_id_accessor_covers_all_variants() {
        let f = TranscriptionEvent::Final {
            utterance_id: 1,
            text: "hi".into(),
        };
        let n = TranscriptionEvent::NoSpeech { utterance_id: 2 };
        let e = TranscriptionEvent::Error {
            utterance_id: 3,
            message: "x".into(),
        };
        assert_eq!(f.utterance_id(), 1);
        assert_eq!(n.utterance_id(), 2);
        assert_eq!(e.utterance_id(), 3);
    }
}
