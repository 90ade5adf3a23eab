//! Audio constants for the segmentation pipeline

/// Standard sample rate for all segmentation processing (Hz)
pub const SAMPLE_RATE_HZ: u32 = 48_000;

/// Standard chunk size for all segmentation processing (samples)
/// At 48 kHz, 8192 samples ≈ 171 ms chunks
pub const CHUNK_SIZE_SAMPLES: usize = 8192;

/// Standard number of channels for mono audio processing
pub const CHANNELS_MONO: u16 = 1;

/// Chunk duration in milliseconds (derived constant)
pub const CHUNK_DURATION_MS: f32 = (CHUNK_SIZE_SAMPLES as f32 * 1000.0) / SAMPLE_RATE_HZ as f32;

/// Peak-amplitude level above which a chunk counts as speech
pub const DEFAULT_ENERGY_THRESHOLD: i16 = 500;

/// Consecutive silent chunks that terminate an utterance
pub const DEFAULT_SILENCE_CHUNKS: u32 = 8;
