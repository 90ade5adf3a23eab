pub mod config;
pub mod constants;
pub mod energy;
pub mod segmenter;
pub mod types;

pub use config::SegmenterConfig;
pub use constants::{CHUNK_DURATION_MS, CHUNK_SIZE_SAMPLES, SAMPLE_RATE_HZ};
pub use segmenter::UtteranceSegmenter;
pub use types::{SegmenterEvent, SegmenterMetrics, Utterance, VadState};

/// Chunk-level voice activity engine.
///
/// Consumes fixed-size sample chunks and emits segmentation events. The one
/// shipped implementation is the fixed-threshold [`UtteranceSegmenter`]; the
/// trait is the seam for swapping in a different detector.
pub trait VadEngine: Send {
    fn process(&mut self, chunk: &[i16]) -> Result<Option<SegmenterEvent>, String>;

    /// Flush a partially buffered utterance, if any. Called when listening
    /// stops mid-speech so the trailing words are not lost.
    fn force_end(&mut self) -> Option<SegmenterEvent>;

    fn reset(&mut self);
    fn current_state(&self) -> VadState;
    fn required_sample_rate(&self) -> u32;
    fn required_chunk_size_samples(&self) -> usize;
}
