use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::info;

use commandflow_audio::{
    AudioCaptureThread, AudioChunk, AudioChunker, AudioRingBuffer, ChunkerConfig, FrameReader,
    ResamplerQuality,
};
use commandflow_command::{
    CommandInterpreter, CommandProcessor, InputInjector, InterpreterConfig, NoopInjector,
    NullWindowProbe, WindowProbe,
};
use commandflow_foundation::AudioConfig;
use commandflow_stt::backends::{ExternalCommandTranscriber, NoopTranscriber};
use commandflow_stt::{
    DispatchConfig, Transcriber, TranscriptionDispatcher, TranscriptionEvent,
};
use commandflow_telemetry::PipelineMetrics;
use commandflow_vad::{SegmenterConfig, UtteranceSegmenter, Utterance};

use crate::pipeline::{SegmentationNotice, SegmenterStage};

/// Which input-injection backend carries out interpreted commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InjectionBackend {
    /// Log-only; no real input simulation.
    #[default]
    Noop,
    /// Real cursor/keyboard control (requires the `enigo` feature).
    #[cfg(feature = "enigo")]
    Enigo,
}

/// Options for starting the CommandFlow runtime
#[derive(Clone, Debug)]
pub struct AppRuntimeOptions {
    pub device: Option<String>,
    pub resampler_quality: ResamplerQuality,
    pub segmenter: SegmenterConfig,
    pub dispatch: DispatchConfig,
    /// External transcriber invocation; no-op backend when absent.
    pub transcriber_command: Option<Vec<String>>,
    pub interpreter: InterpreterConfig,
    pub injection_backend: InjectionBackend,
}

impl Default for AppRuntimeOptions {
    fn default() -> Self {
        Self {
            device: None,
            resampler_quality: ResamplerQuality::Balanced,
            segmenter: SegmenterConfig::default(),
            dispatch: DispatchConfig::default(),
            transcriber_command: None,
            interpreter: InterpreterConfig::default(),
            injection_backend: InjectionBackend::default(),
        }
    }
}

/// Handle to the running pipeline
pub struct AppHandle {
    pub metrics: Arc<PipelineMetrics>,
    notice_tx: broadcast::Sender<SegmentationNotice>,
    audio_capture: AudioCaptureThread,
    chunker_handle: JoinHandle<()>,
    segmenter_handle: JoinHandle<()>,
    dispatcher_handle: JoinHandle<()>,
    command_handle: JoinHandle<()>,
    command_shutdown_tx: mpsc::Sender<()>,
}

impl AppHandle {
    /// Subscribe to segmentation notices (multiple subscribers supported)
    pub fn subscribe_notices(&self) -> broadcast::Receiver<SegmentationNotice> {
        self.notice_tx.subscribe()
    }

    /// Gracefully stop the pipeline and wait for shutdown
    pub async fn shutdown(self) {
        info!("Shutting down CommandFlow runtime...");

        // Stop the audio source first to quiesce the pipeline.
        self.audio_capture.stop();

        let _ = self.command_shutdown_tx.send(()).await;

        // Abort the chunker; its broadcast sender drops, which lets the
        // segmenter drain, flush, and close the utterance channel, which in
        // turn winds down the dispatcher and command processor.
        self.chunker_handle.abort();
        let _ = self.chunker_handle.await;
        let _ = self.segmenter_handle.await;
        let _ = self.dispatcher_handle.await;
        let _ = self.command_handle.await;

        info!("CommandFlow runtime shutdown complete");
    }
}

/// Start the CommandFlow pipeline with the given options
pub async fn start(
    opts: AppRuntimeOptions,
) -> Result<AppHandle, Box<dyn std::error::Error + Send + Sync>> {
    // Metrics shared across components
    let metrics = Arc::new(PipelineMetrics::default());

    // 1) Audio capture
    let audio_config = AudioConfig::default();
    let ring_buffer = AudioRingBuffer::new(16384 * 4);
    let (audio_producer, audio_consumer) = ring_buffer.split();
    let (audio_capture, device_cfg, device_config_rx) =
        AudioCaptureThread::spawn(audio_config, audio_producer, opts.device.clone())?;

    // 2) Chunker (downmix + resample to the pipeline geometry)
    let frame_reader = FrameReader::new(
        audio_consumer,
        device_cfg.sample_rate,
        device_cfg.channels,
    );
    let chunker_cfg = ChunkerConfig {
        chunk_size_samples: opts.segmenter.chunk_size_samples,
        sample_rate_hz: opts.segmenter.sample_rate_hz,
        resampler_quality: opts.resampler_quality,
    };
    let (chunk_tx, _) = broadcast::channel::<AudioChunk>(64);
    let chunker = AudioChunker::new(frame_reader, chunk_tx.clone(), chunker_cfg)
        .with_metrics(metrics.clone())
        .with_device_config(device_config_rx);
    let chunker_handle = chunker.spawn();

    // 3) Utterance segmentation
    let engine = Box::new(UtteranceSegmenter::new(opts.segmenter.clone())?);
    let (notice_tx, _) = broadcast::channel::<SegmentationNotice>(256);
    let (utterance_tx, utterance_rx) = mpsc::channel::<Utterance>(opts.dispatch.queue_depth);
    let segmenter_handle = SegmenterStage::new(
        engine,
        chunk_tx.subscribe(),
        notice_tx.clone(),
        utterance_tx,
    )
    .with_metrics(metrics.clone())
    .spawn();

    // 4) Transcription dispatch over the worker pool
    let transcriber: Arc<dyn Transcriber> = match &opts.transcriber_command {
        Some(cmd) => {
            let (program, args) = cmd
                .split_first()
                .ok_or("transcriber command must name a program")?;
            Arc::new(ExternalCommandTranscriber::new(
                program.clone(),
                args.to_vec(),
            ))
        }
        None => Arc::new(NoopTranscriber::new()),
    };
    let (event_tx, event_rx) = mpsc::channel::<TranscriptionEvent>(100);
    let dispatcher_handle =
        TranscriptionDispatcher::new(utterance_rx, event_tx, transcriber, opts.dispatch.clone())?
            .with_metrics(metrics.clone())
            .spawn();

    // 5) Command interpretation and injection
    let injector: Arc<dyn InputInjector> = match opts.injection_backend {
        InjectionBackend::Noop => Arc::new(NoopInjector::new()),
        #[cfg(feature = "enigo")]
        InjectionBackend::Enigo => Arc::new(commandflow_command::enigo_injector::EnigoInjector::new()),
    };
    let probe: Arc<dyn WindowProbe> = Arc::new(NullWindowProbe::new());
    let interpreter = CommandInterpreter::new(opts.interpreter.clone(), injector, probe);
    let (command_shutdown_tx, command_shutdown_rx) = mpsc::channel::<()>(1);
    let command_handle = tokio::spawn(
        CommandProcessor::new(interpreter, event_rx, command_shutdown_rx)
            .with_metrics(metrics.clone())
            .run(),
    );

    info!(
        "Pipeline started: device {} Hz {} ch, chunks of {} samples at {} Hz, {} workers",
        device_cfg.sample_rate,
        device_cfg.channels,
        opts.segmenter.chunk_size_samples,
        opts.segmenter.sample_rate_hz,
        opts.dispatch.workers
    );

    Ok(AppHandle {
        metrics,
        notice_tx,
        audio_capture,
        chunker_handle,
        segmenter_handle,
        dispatcher_handle,
        command_handle,
        command_shutdown_tx,
    })
}
