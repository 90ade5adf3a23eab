//! Bounded worker-pool dispatch for completed utterances
//!
//! Utterances arrive on an mpsc channel from the segmenter side. Each one is
//! preprocessed, written to a temp WAV, and transcribed on a pooled worker;
//! recognized text leaves as [`TranscriptionEvent`]s. The pool is bounded by
//! a semaphore so a slow backend can never pile up unbounded work, and the
//! feeding side uses `try_send`, so the audio path never blocks here.

use crate::preprocess::apply_gain;
use crate::types::{DispatchConfig, TranscriptionEvent};
use crate::wav::write_utterance_wav;
use crate::{next_utterance_id, Transcriber};
use commandflow_telemetry::{PipelineMetrics, PipelineStage};
use commandflow_vad::Utterance;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

pub struct TranscriptionDispatcher {
    utterance_rx: mpsc::Receiver<Utterance>,
    event_tx: mpsc::Sender<TranscriptionEvent>,
    transcriber: Arc<dyn Transcriber>,
    config: DispatchConfig,
    metrics: Option<Arc<PipelineMetrics>>,
}

impl TranscriptionDispatcher {
    pub fn new(
        utterance_rx: mpsc::Receiver<Utterance>,
        event_tx: mpsc::Sender<TranscriptionEvent>,
        transcriber: Arc<dyn Transcriber>,
        config: DispatchConfig,
    ) -> Result<Self, String> {
        config.validate()?;
        Ok(Self {
            utterance_rx,
            event_tx,
            transcriber,
            config,
            metrics: None,
        })
    }

    pub fn with_metrics(mut self, metrics: Arc<PipelineMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(mut self) {
        if !self.config.enabled {
            info!(target: "stt", "Transcription dispatch disabled - exiting immediately");
            return;
        }

        info!(
            target: "stt",
            "Transcription dispatcher starting (backend: {}, workers: {})",
            self.transcriber.name(),
            self.config.workers
        );

        let semaphore = Arc::new(Semaphore::new(self.config.workers));

        while let Some(utterance) = self.utterance_rx.recv().await {
            let utterance_id = next_utterance_id();
            if let Some(m) = &self.metrics {
                m.utterances_dispatched.fetch_add(1, Ordering::Relaxed);
                m.mark_stage_active(PipelineStage::Dispatch);
            }

            let permit = match semaphore.clone().acquire_owned().await {
                Ok(p) => p,
                Err(_) => break, // semaphore closed, shutting down
            };

            debug!(
                target: "stt",
                utterance_id,
                samples = utterance.samples.len(),
                duration_ms = utterance.duration_ms,
                "dispatching utterance"
            );

            let transcriber = Arc::clone(&self.transcriber);
            let event_tx = self.event_tx.clone();
            let gain = self.config.gain;
            let keep_wav = self.config.keep_wav_files;
            let metrics = self.metrics.clone();

            tokio::spawn(async move {
                let started = Instant::now();
                let event =
                    process_utterance(utterance_id, utterance, transcriber, gain, keep_wav).await;

                if let Some(m) = &metrics {
                    m.last_transcription_latency_ms
                        .store(started.elapsed().as_millis() as u64, Ordering::Relaxed);
                    match &event {
                        TranscriptionEvent::Final { .. } => {
                            m.transcriptions_ok.fetch_add(1, Ordering::Relaxed);
                        }
                        TranscriptionEvent::NoSpeech { .. } => {
                            m.transcriptions_empty.fetch_add(1, Ordering::Relaxed);
                        }
                        TranscriptionEvent::Error { .. } => {
                            m.transcriptions_failed.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                }

                // Bounded wait: a wedged consumer must not pin the worker.
                match tokio::time::timeout(
                    std::time::Duration::from_secs(5),
                    event_tx.send(event),
                )
                .await
                {
                    Ok(Ok(())) => {}
                    Ok(Err(_)) => debug!(target: "stt", "Event channel closed"),
                    Err(_) => {
                        warn!(target: "stt", "Event channel send timed out - consumer too slow")
                    }
                }

                drop(permit);
            });
        }

        // Channel closed; wait for in-flight workers before exiting.
        let _ = semaphore.acquire_many(self.config.workers as u32).await;
        info!(target: "stt", "Transcription dispatcher shutting down");
    }
}

async fn process_utterance(
    utterance_id: u64,
    utterance: Utterance,
    transcriber: Arc<dyn Transcriber>,
    gain: f32,
    keep_wav: bool,
) -> TranscriptionEvent {
    let started = Instant::now();
    let processed = apply_gain(&utterance.samples, gain);

    let wav = match write_utterance_wav(&processed, utterance.sample_rate) {
        Ok(wav) => wav,
        Err(e) => {
            error!(target: "stt", utterance_id, "Failed to write utterance WAV: {}", e);
            return TranscriptionEvent::Error {
                utterance_id,
                message: e.to_string(),
            };
        }
    };

    let result = transcriber.transcribe_wav(wav.path()).await;

    if keep_wav {
        match wav.keep() {
            Ok(path) => info!(target: "stt", utterance_id, "Kept utterance WAV at {}", path.display()),
            Err(e) => warn!(target: "stt", utterance_id, "Failed to keep utterance WAV: {}", e),
        }
    }

    match result {
        Ok(Some(text)) => {
            info!(
                target: "stt",
                utterance_id,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Recognized: {}",
                text
            );
            TranscriptionEvent::Final { utterance_id, text }
        }
        Ok(None) => {
            debug!(target: "stt", utterance_id, "No speech detected");
            TranscriptionEvent::NoSpeech { utterance_id }
        }
        Err(e) => {
            error!(target: "stt", utterance_id, "Transcription failed: {}", e);
            TranscriptionEvent::Error {
                utterance_id,
                message: e.to_string(),
            }
        }
    }
}
