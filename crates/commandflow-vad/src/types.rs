//! Core types for utterance segmentation

/// Segmenter state: either waiting for speech or accumulating an utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VadState {
    Idle,
    Recording,
}

/// A contiguous span of buffered audio bounded by a speech-energy onset and a
/// trailing run of silent chunks.
#[derive(Debug, Clone)]
pub struct Utterance {
    /// Concatenated mono PCM samples, onset chunk through trailing silence.
    pub samples: Vec<i16>,
    pub sample_rate: u32,
    /// Stream timestamp of the onset chunk.
    pub started_at_ms: u64,
    pub duration_ms: u64,
    /// Number of chunks that went into the buffer.
    pub chunks: u32,
}

/// Events emitted by the segmenter as chunks are processed.
#[derive(Debug, Clone)]
pub enum SegmenterEvent {
    SpeechStart {
        timestamp_ms: u64,
        peak: i16,
    },
    /// Speech ended; carries the complete buffered utterance.
    UtteranceReady(Utterance),
}

/// Running counters maintained by the segmenter.
#[derive(Debug, Clone, Default)]
pub struct SegmenterMetrics {
    pub chunks_processed: u64,
    pub speech_chunks: u64,
    pub silent_chunks: u64,
    pub utterances: u64,
    /// Utterances completed by the max-duration cap rather than silence.
    pub forced_completions: u64,
    pub last_peak: i16,
    pub last_rms_dbfs: f32,
}
