use serde::{Deserialize, Serialize};

use super::constants::{
    CHUNK_SIZE_SAMPLES, DEFAULT_ENERGY_THRESHOLD, DEFAULT_SILENCE_CHUNKS, SAMPLE_RATE_HZ,
};

/// Configuration for the fixed-threshold utterance segmenter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmenterConfig {
    /// Peak amplitude (i16 counts) strictly above which a chunk is speech.
    pub energy_threshold: i16,
    /// Consecutive silent chunks that complete an utterance.
    pub silence_chunks: u32,
    /// Hard cap on buffered chunks per utterance; the segmenter
    /// force-completes when reached. `None` disables the cap.
    pub max_utterance_chunks: Option<u32>,
    pub chunk_size_samples: usize,
    pub sample_rate_hz: u32,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            energy_threshold: DEFAULT_ENERGY_THRESHOLD,
            silence_chunks: DEFAULT_SILENCE_CHUNKS,
            // ~30 s at the default chunk geometry
            max_utterance_chunks: Some(176),
            chunk_size_samples: CHUNK_SIZE_SAMPLES,
            sample_rate_hz: SAMPLE_RATE_HZ,
        }
    }
}

impl SegmenterConfig {
    pub fn chunk_duration_ms(&self) -> f32 {
        (self.chunk_size_samples as f32 * 1000.0) / self.sample_rate_hz as f32
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.chunk_size_samples == 0 {
            return Err("chunk_size_samples must be non-zero".into());
        }
        if self.sample_rate_hz == 0 {
            return Err("sample_rate_hz must be non-zero".into());
        }
        if self.silence_chunks == 0 {
            return Err("silence_chunks must be at least 1".into());
        }
        if self.energy_threshold < 0 {
            return Err("energy_threshold must be non-negative".into());
        }
        if let Some(max) = self.max_utterance_chunks {
            if max <= self.silence_chunks {
                return Err(format!(
                    "max_utterance_chunks ({}) must exceed silence_chunks ({})",
                    max, self.silence_chunks
                ));
            }
        }
        Ok(())
    }
}
