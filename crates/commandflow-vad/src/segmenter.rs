use crate::config::SegmenterConfig;
use crate::energy::EnergyMeter;
use crate::types::{SegmenterEvent, SegmenterMetrics, Utterance, VadState};
use crate::VadEngine;

/// Fixed-threshold utterance segmenter.
///
/// Classifies each chunk by peak amplitude against a fixed threshold. The
/// first speech chunk opens an utterance; every subsequent chunk (speech or
/// silence) is buffered until a run of `silence_chunks` consecutive silent
/// chunks closes it, at which point the buffered samples are emitted as one
/// [`Utterance`].
///
/// Invariants:
/// - utterances are emitted in chunk order;
/// - an utterance always contains at least one above-threshold chunk;
/// - the buffer is empty whenever the state is [`VadState::Idle`].
pub struct UtteranceSegmenter {
    config: SegmenterConfig,
    meter: EnergyMeter,
    state: VadState,
    buffer: Vec<i16>,
    buffered_chunks: u32,
    silence_run: u32,
    utterance_start_ms: u64,
    chunks_since_start: u64,
    metrics: SegmenterMetrics,
}

impl UtteranceSegmenter {
    pub fn new(config: SegmenterConfig) -> Result<Self, String> {
        config.validate()?;
        Ok(Self {
            meter: EnergyMeter::new(),
            state: VadState::Idle,
            buffer: Vec::new(),
            buffered_chunks: 0,
            silence_run: 0,
            utterance_start_ms: 0,
            chunks_since_start: 0,
            metrics: SegmenterMetrics::default(),
            config,
        })
    }

    pub fn metrics(&self) -> &SegmenterMetrics {
        &self.metrics
    }

    pub fn config(&self) -> &SegmenterConfig {
        &self.config
    }

    fn stream_timestamp_ms(&self) -> u64 {
        (self.chunks_since_start as f32 * self.config.chunk_duration_ms()) as u64
    }

    fn buffer_chunk(&mut self, chunk: &[i16]) {
        if self.buffer.is_empty() {
            let expected = self.config.chunk_size_samples
                * (self.config.silence_chunks as usize + 4);
            self.buffer.reserve(expected);
        }
        self.buffer.extend_from_slice(chunk);
        self.buffered_chunks += 1;
    }

    fn complete_utterance(&mut self) -> Utterance {
        let chunks = self.buffered_chunks;
        let duration_ms = (chunks as f32 * self.config.chunk_duration_ms()) as u64;
        let utterance = Utterance {
            samples: std::mem::take(&mut self.buffer),
            sample_rate: self.config.sample_rate_hz,
            started_at_ms: self.utterance_start_ms,
            duration_ms,
            chunks,
        };

        self.state = VadState::Idle;
        self.buffered_chunks = 0;
        self.silence_run = 0;
        self.metrics.utterances += 1;
        utterance
    }
}

impl VadEngine for UtteranceSegmenter {
    fn process(&mut self, chunk: &[i16]) -> Result<Option<SegmenterEvent>, String> {
        if chunk.len() != self.config.chunk_size_samples {
            return Err(format!(
                "Expected {} samples, got {}",
                self.config.chunk_size_samples,
                chunk.len()
            ));
        }

        let peak = self.meter.peak(chunk);
        let is_speech = peak > self.config.energy_threshold;

        self.chunks_since_start += 1;
        self.metrics.chunks_processed += 1;
        self.metrics.last_peak = peak;
        self.metrics.last_rms_dbfs = self.meter.dbfs(chunk);
        if is_speech {
            self.metrics.speech_chunks += 1;
        } else {
            self.metrics.silent_chunks += 1;
        }

        let event = match self.state {
            VadState::Idle => {
                if !is_speech {
                    // No pre-roll: idle silence is discarded.
                    return Ok(None);
                }
                self.state = VadState::Recording;
                self.silence_run = 0;
                self.utterance_start_ms = self.stream_timestamp_ms();
                self.buffer_chunk(chunk);
                tracing::debug!(peak, "speech onset");
                Some(SegmenterEvent::SpeechStart {
                    timestamp_ms: self.utterance_start_ms,
                    peak,
                })
            }
            VadState::Recording => {
                self.buffer_chunk(chunk);
                if is_speech {
                    self.silence_run = 0;
                } else {
                    self.silence_run += 1;
                }

                if self.silence_run >= self.config.silence_chunks {
                    tracing::debug!(
                        chunks = self.buffered_chunks,
                        "utterance closed by trailing silence"
                    );
                    Some(SegmenterEvent::UtteranceReady(self.complete_utterance()))
                } else if self
                    .config
                    .max_utterance_chunks
                    .is_some_and(|max| self.buffered_chunks >= max)
                {
                    tracing::warn!(
                        chunks = self.buffered_chunks,
                        "utterance hit max length; force-completing"
                    );
                    self.metrics.forced_completions += 1;
                    Some(SegmenterEvent::UtteranceReady(self.complete_utterance()))
                } else {
                    None
                }
            }
        };

        Ok(event)
    }

    fn force_end(&mut self) -> Option<SegmenterEvent> {
        if self.state != VadState::Recording || self.buffer.is_empty() {
            return None;
        }
        self.metrics.forced_completions += 1;
        Some(SegmenterEvent::UtteranceReady(self.complete_utterance()))
    }

    fn reset(&mut self) {
        self.state = VadState::Idle;
        self.buffer.clear();
        self.buffered_chunks = 0;
        self.silence_run = 0;
        self.chunks_since_start = 0;
        self.metrics = SegmenterMetrics::default();
    }

    fn current_state(&self) -> VadState {
        self.state
    }

    fn required_sample_rate(&self) -> u32 {
        self.config.sample_rate_hz
    }

    fn required_chunk_size_samples(&self) -> usize {
        self.config.chunk_size_samples
    }
}
