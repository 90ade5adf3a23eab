//! # Command Processor
//!
//! Consumes transcription events and drives the interpreter. Listens for
//! final transcriptions and a shutdown signal; every decision lands in the
//! shared metrics.

use crate::interpreter::CommandInterpreter;
use crate::types::CommandOutcome;
use commandflow_stt::TranscriptionEvent;
use commandflow_telemetry::{PipelineMetrics, PipelineStage};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

pub struct CommandProcessor {
    interpreter: CommandInterpreter,
    transcription_rx: mpsc::Receiver<TranscriptionEvent>,
    shutdown_rx: mpsc::Receiver<()>,
    metrics: Option<Arc<PipelineMetrics>>,
}

impl CommandProcessor {
    pub fn new(
        interpreter: CommandInterpreter,
        transcription_rx: mpsc::Receiver<TranscriptionEvent>,
        shutdown_rx: mpsc::Receiver<()>,
    ) -> Self {
        Self {
            interpreter,
            transcription_rx,
            shutdown_rx,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<PipelineMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub async fn run(mut self) {
        info!("Command processor started.");
        loop {
            tokio::select! {
                event = self.transcription_rx.recv() => {
                    let Some(event) = event else {
                        info!("Transcription channel closed. Exiting command processor.");
                        break;
                    };
                    self.handle_event(event).await;
                }
                _ = self.shutdown_rx.recv() => {
                    info!("Shutdown signal received. Exiting command processor.");
                    break;
                }
            }
        }
    }

    async fn handle_event(&self, event: TranscriptionEvent) {
        match event {
            TranscriptionEvent::Final { utterance_id, text } => {
                debug!(utterance_id, "processing recognized text: {:?}", text);
                if let Some(m) = &self.metrics {
                    m.mark_stage_active(PipelineStage::Command);
                }
                let outcome = self.interpreter.handle(&text).await;
                self.record_outcome(&outcome);
            }
            TranscriptionEvent::NoSpeech { utterance_id } => {
                debug!(utterance_id, "utterance carried no speech");
            }
            TranscriptionEvent::Error {
                utterance_id,
                message,
            } => {
                debug!(utterance_id, "transcription error upstream: {}", message);
            }
        }
    }

    fn record_outcome(&self, outcome: &CommandOutcome) {
        let Some(m) = &self.metrics else {
            return;
        };
        match outcome {
            CommandOutcome::Executed(_) => {
                m.commands_executed.fetch_add(1, Ordering::Relaxed);
            }
            CommandOutcome::NoMatch => {
                m.commands_unmatched.fetch_add(1, Ordering::Relaxed);
            }
            CommandOutcome::SuppressedByFocus { .. } => {
                m.commands_suppressed.fetch_add(1, Ordering::Relaxed);
            }
            CommandOutcome::Failed(_) => {
                m.commands_failed.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}
