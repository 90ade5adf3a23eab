//! Segmentation stage: subscribes to fixed-size chunks, runs the VAD engine,
//! and forwards completed utterances to the transcription dispatcher.

use commandflow_audio::AudioChunk;
use commandflow_telemetry::{FpsTracker, PipelineMetrics, PipelineStage};
use commandflow_vad::{SegmenterEvent, Utterance, VadEngine};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Lightweight segmentation notifications for observers (status displays,
/// tests). The full audio payload only travels on the utterance channel.
#[derive(Debug, Clone)]
pub enum SegmentationNotice {
    SpeechStart { timestamp_ms: u64, peak: i16 },
    UtteranceComplete { chunks: u32, duration_ms: u64 },
}

pub struct SegmenterStage {
    engine: Box<dyn VadEngine>,
    chunk_rx: broadcast::Receiver<AudioChunk>,
    notice_tx: broadcast::Sender<SegmentationNotice>,
    utterance_tx: mpsc::Sender<Utterance>,
    metrics: Option<Arc<PipelineMetrics>>,
}

impl SegmenterStage {
    pub fn new(
        engine: Box<dyn VadEngine>,
        chunk_rx: broadcast::Receiver<AudioChunk>,
        notice_tx: broadcast::Sender<SegmentationNotice>,
        utterance_tx: mpsc::Sender<Utterance>,
    ) -> Self {
        Self {
            engine,
            chunk_rx,
            notice_tx,
            utterance_tx,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<PipelineMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(mut self) {
        info!("Segmenter stage started");
        let mut fps_tracker = FpsTracker::new();
        let mut chunks_processed: u64 = 0;

        loop {
            match self.chunk_rx.recv().await {
                Ok(chunk) => {
                    chunks_processed += 1;
                    if let Some(m) = &self.metrics {
                        m.increment_vad_chunks();
                        if let Some(fps) = fps_tracker.tick() {
                            m.update_vad_fps(fps);
                        }
                        m.mark_stage_active(PipelineStage::Vad);
                    }

                    match self.engine.process(&chunk.samples) {
                        Ok(Some(event)) => self.handle_event(event),
                        Ok(None) => {}
                        Err(e) => error!("Segmenter error: {}", e),
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Segmenter lagged; {} chunks skipped", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }

        // Chunk source is gone; flush a partially buffered utterance so the
        // last words before stop are not lost.
        if let Some(event) = self.engine.force_end() {
            self.handle_event(event);
        }

        info!(
            "Segmenter stage shutting down after {} chunks",
            chunks_processed
        );
    }

    fn handle_event(&mut self, event: SegmenterEvent) {
        match event {
            SegmenterEvent::SpeechStart { timestamp_ms, peak } => {
                debug!(timestamp_ms, peak, "speech started");
                if let Some(m) = &self.metrics {
                    m.record_speech_start();
                }
                let _ = self
                    .notice_tx
                    .send(SegmentationNotice::SpeechStart { timestamp_ms, peak });
            }
            SegmenterEvent::UtteranceReady(utterance) => {
                debug!(
                    chunks = utterance.chunks,
                    duration_ms = utterance.duration_ms,
                    "utterance complete"
                );
                if let Some(m) = &self.metrics {
                    m.record_speech_end();
                }
                let _ = self.notice_tx.send(SegmentationNotice::UtteranceComplete {
                    chunks: utterance.chunks,
                    duration_ms: utterance.duration_ms,
                });

                // The audio path never blocks on a slow transcriber; a full
                // queue drops the utterance and counts it.
                match self.utterance_tx.try_send(utterance) {
                    Ok(()) => {}
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        warn!("Dispatch queue full; utterance dropped");
                        if let Some(m) = &self.metrics {
                            m.utterances_dropped.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => {
                        debug!("Dispatch queue closed; utterance discarded");
                    }
                }
            }
        }
    }
}
