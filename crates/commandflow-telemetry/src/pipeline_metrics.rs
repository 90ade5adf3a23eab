use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicI16, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Pipeline stages, in data-flow order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Capture,
    Chunker,
    Vad,
    Dispatch,
    Command,
}

/// Shared metrics for cross-thread pipeline monitoring.
///
/// Every field is an atomic (or a parking_lot lock around a small value) so
/// the audio thread, the async stages, and any observer can touch them
/// without coordination.
#[derive(Clone)]
pub struct PipelineMetrics {
    // Audio level monitoring
    pub current_peak: Arc<AtomicI16>,   // Peak sample value in current window
    pub current_rms: Arc<AtomicU64>,    // RMS * 1000 for precision
    pub audio_level_db: Arc<AtomicI16>, // Current level in dB * 10

    // Stage liveness
    pub stage_capture: Arc<AtomicBool>,
    pub stage_chunker: Arc<AtomicBool>,
    pub stage_vad: Arc<AtomicBool>,
    pub stage_dispatch: Arc<AtomicBool>,
    pub stage_command: Arc<AtomicBool>,

    // Frame/chunk counters
    pub capture_frames: Arc<AtomicU64>,
    pub chunker_frames: Arc<AtomicU64>,
    pub vad_chunks: Arc<AtomicU64>,

    // Frame rate tracking (value * 10)
    pub capture_fps: Arc<AtomicU64>,
    pub chunker_fps: Arc<AtomicU64>,
    pub vad_fps: Arc<AtomicU64>,

    // Segmentation activity
    pub is_speaking: Arc<AtomicBool>,
    pub last_speech_time: Arc<RwLock<Option<Instant>>>,
    pub utterances_segmented: Arc<AtomicU64>,

    // Dispatch accounting
    pub utterances_dispatched: Arc<AtomicU64>,
    pub utterances_dropped: Arc<AtomicU64>,
    pub dispatch_queue_depth: Arc<AtomicUsize>,
    pub transcriptions_ok: Arc<AtomicU64>,
    pub transcriptions_empty: Arc<AtomicU64>,
    pub transcriptions_failed: Arc<AtomicU64>,
    pub last_transcription_latency_ms: Arc<AtomicU64>,

    // Command interpreter outcomes
    pub commands_executed: Arc<AtomicU64>,
    pub commands_unmatched: Arc<AtomicU64>,
    pub commands_suppressed: Arc<AtomicU64>,
    pub commands_failed: Arc<AtomicU64>,

    // Error tracking
    pub capture_errors: Arc<AtomicU64>,
    pub chunker_errors: Arc<AtomicU64>,
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self {
            current_peak: Arc::new(AtomicI16::new(0)),
            current_rms: Arc::new(AtomicU64::new(0)),
            audio_level_db: Arc::new(AtomicI16::new(-900)),

            stage_capture: Arc::new(AtomicBool::new(false)),
            stage_chunker: Arc::new(AtomicBool::new(false)),
            stage_vad: Arc::new(AtomicBool::new(false)),
            stage_dispatch: Arc::new(AtomicBool::new(false)),
            stage_command: Arc::new(AtomicBool::new(false)),

            capture_frames: Arc::new(AtomicU64::new(0)),
            chunker_frames: Arc::new(AtomicU64::new(0)),
            vad_chunks: Arc::new(AtomicU64::new(0)),

            capture_fps: Arc::new(AtomicU64::new(0)),
            chunker_fps: Arc::new(AtomicU64::new(0)),
            vad_fps: Arc::new(AtomicU64::new(0)),

            is_speaking: Arc::new(AtomicBool::new(false)),
            last_speech_time: Arc::new(RwLock::new(None)),
            utterances_segmented: Arc::new(AtomicU64::new(0)),

            utterances_dispatched: Arc::new(AtomicU64::new(0)),
            utterances_dropped: Arc::new(AtomicU64::new(0)),
            dispatch_queue_depth: Arc::new(AtomicUsize::new(0)),
            transcriptions_ok: Arc::new(AtomicU64::new(0)),
            transcriptions_empty: Arc::new(AtomicU64::new(0)),
            transcriptions_failed: Arc::new(AtomicU64::new(0)),
            last_transcription_latency_ms: Arc::new(AtomicU64::new(0)),

            commands_executed: Arc::new(AtomicU64::new(0)),
            commands_unmatched: Arc::new(AtomicU64::new(0)),
            commands_suppressed: Arc::new(AtomicU64::new(0)),
            commands_failed: Arc::new(AtomicU64::new(0)),

            capture_errors: Arc::new(AtomicU64::new(0)),
            chunker_errors: Arc::new(AtomicU64::new(0)),
        }
    }
}

impl PipelineMetrics {
    pub fn update_audio_level(&self, samples: &[i16]) {
        if samples.is_empty() {
            return;
        }

        let peak = samples.iter().map(|&s| s.saturating_abs()).max().unwrap_or(0);
        self.current_peak.store(peak, Ordering::Relaxed);

        let sum: i64 = samples.iter().map(|&s| s as i64 * s as i64).sum();
        let rms = ((sum as f64 / samples.len() as f64).sqrt() * 1000.0) as u64;
        self.current_rms.store(rms, Ordering::Relaxed);

        let db = if peak > 0 {
            (20.0 * (peak as f64 / 32768.0).log10() * 10.0) as i16
        } else {
            -900
        };
        self.audio_level_db.store(db, Ordering::Relaxed);
    }

    pub fn mark_stage_active(&self, stage: PipelineStage) {
        match stage {
            PipelineStage::Capture => self.stage_capture.store(true, Ordering::Relaxed),
            PipelineStage::Chunker => self.stage_chunker.store(true, Ordering::Relaxed),
            PipelineStage::Vad => self.stage_vad.store(true, Ordering::Relaxed),
            PipelineStage::Dispatch => self.stage_dispatch.store(true, Ordering::Relaxed),
            PipelineStage::Command => self.stage_command.store(true, Ordering::Relaxed),
        }
    }

    pub fn decay_stages(&self) {
        self.stage_capture.store(false, Ordering::Relaxed);
        self.stage_chunker.store(false, Ordering::Relaxed);
        self.stage_vad.store(false, Ordering::Relaxed);
        self.stage_dispatch.store(false, Ordering::Relaxed);
        self.stage_command.store(false, Ordering::Relaxed);
    }

    pub fn increment_capture_frames(&self) {
        self.capture_frames.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_chunker_frames(&self) {
        self.chunker_frames.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_vad_chunks(&self) {
        self.vad_chunks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn update_capture_fps(&self, fps: f64) {
        self.capture_fps.store((fps * 10.0) as u64, Ordering::Relaxed);
    }

    pub fn update_chunker_fps(&self, fps: f64) {
        self.chunker_fps.store((fps * 10.0) as u64, Ordering::Relaxed);
    }

    pub fn update_vad_fps(&self, fps: f64) {
        self.vad_fps.store((fps * 10.0) as u64, Ordering::Relaxed);
    }

    pub fn record_speech_start(&self) {
        self.is_speaking.store(true, Ordering::Relaxed);
        *self.last_speech_time.write() = Some(Instant::now());
    }

    pub fn record_speech_end(&self) {
        self.is_speaking.store(false, Ordering::Relaxed);
        self.utterances_segmented.fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audio_level_tracks_peak_and_rms() {
        let metrics = PipelineMetrics::default();
        metrics.update_audio_level(&[0, 100, -400, 250]);
        assert_eq!(metrics.current_peak.load(Ordering::Relaxed), 400);
        assert!(metrics.current_rms.load(Ordering::Relaxed) > 0);
    }

    #[test]
    fn empty_slice_leaves_level_untouched() {
        let metrics = PipelineMetrics::default();
        metrics.update_audio_level(&[]);
        assert_eq!(metrics.current_peak.load(Ordering::Relaxed), 0);
        assert_eq!(metrics.audio_level_db.load(Ordering::Relaxed), -900);
    }

    #[test]
    fn min_sample_does_not_overflow_peak() {
        let metrics = PipelineMetrics::default();
        metrics.update_audio_level(&[i16::MIN]);
        assert_eq!(metrics.current_peak.load(Ordering::Relaxed), i16::MAX);
    }

    #[test]
    fn stage_marking_and_decay() {
        let metrics = PipelineMetrics::default();
        metrics.mark_stage_active(PipelineStage::Vad);
        assert!(metrics.stage_vad.load(Ordering::Relaxed));
        metrics.decay_stages();
        assert!(!metrics.stage_vad.load(Ordering::Relaxed));
    }

    #[test]
    fn speech_bookkeeping() {
        let metrics = PipelineMetrics::default();
        metrics.record_speech_start();
        assert!(metrics.is_speaking.load(Ordering::Relaxed));
        metrics.record_speech_end();
        assert!(!metrics.is_speaking.load(Ordering::Relaxed));
        assert_eq!(metrics.utterances_segmented.load(Ordering::Relaxed), 1);
    }
}
