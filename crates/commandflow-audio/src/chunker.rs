use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{self, Duration};

use super::capture::DeviceConfig;
use super::frame_reader::FrameReader;
use super::resampler::StreamResampler;
use commandflow_telemetry::{FpsTracker, PipelineMetrics, PipelineStage};

/// Fixed-size mono chunk at the pipeline rate, ready for segmentation.
#[derive(Debug, Clone)]
pub struct AudioChunk {
    pub samples: Vec<i16>,
    pub sample_rate: u32,
    pub timestamp: std::time::Instant,
}

#[derive(Debug, Clone, Copy)]
pub enum ResamplerQuality {
    Fast,     // Lower quality, lower CPU usage
    Balanced, // Default quality/performance balance
    Quality,  // Higher quality, higher CPU usage
}

pub struct ChunkerConfig {
    pub chunk_size_samples: usize,
    pub sample_rate_hz: u32,
    pub resampler_quality: ResamplerQuality,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            chunk_size_samples: 8192,
            sample_rate_hz: 48_000,
            resampler_quality: ResamplerQuality::Balanced,
        }
    }
}

/// Re-blocks arbitrary capture frames into fixed-size chunks, downmixing to
/// mono and resampling to the pipeline rate when the device differs.
pub struct AudioChunker {
    frame_reader: FrameReader,
    output_tx: broadcast::Sender<AudioChunk>,
    cfg: ChunkerConfig,
    running: Arc<AtomicBool>,
    metrics: Option<Arc<PipelineMetrics>>,
    device_cfg_rx: Option<broadcast::Receiver<DeviceConfig>>,
}

impl AudioChunker {
    pub fn new(
        frame_reader: FrameReader,
        output_tx: broadcast::Sender<AudioChunk>,
        cfg: ChunkerConfig,
    ) -> Self {
        Self {
            frame_reader,
            output_tx,
            cfg,
            running: Arc::new(AtomicBool::new(false)),
            metrics: None,
            device_cfg_rx: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<PipelineMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn with_device_config(mut self, rx: broadcast::Receiver<DeviceConfig>) -> Self {
        self.device_cfg_rx = Some(rx);
        self
    }

    pub fn spawn(self) -> JoinHandle<()> {
        let mut worker = ChunkerWorker::new(
            self.frame_reader,
            self.output_tx,
            self.cfg,
            self.metrics,
            self.device_cfg_rx,
        );
        self.running.store(true, Ordering::SeqCst);
        let running = self.running.clone();

        tokio::spawn(async move {
            worker.run(running).await;
        })
    }
}

struct ChunkerWorker {
    frame_reader: FrameReader,
    output_tx: broadcast::Sender<AudioChunk>,
    cfg: ChunkerConfig,
    buffer: VecDeque<i16>,
    samples_emitted: u64,
    metrics: Option<Arc<PipelineMetrics>>,
    capture_fps_tracker: FpsTracker,
    chunker_fps_tracker: FpsTracker,
    resampler: Option<StreamResampler>,
    current_input_rate: Option<u32>,
    current_input_channels: Option<u16>,
    device_cfg_rx: Option<broadcast::Receiver<DeviceConfig>>,
    start_time: std::time::Instant,
}

impl ChunkerWorker {
    fn new(
        frame_reader: FrameReader,
        output_tx: broadcast::Sender<AudioChunk>,
        cfg: ChunkerConfig,
        metrics: Option<Arc<PipelineMetrics>>,
        device_cfg_rx: Option<broadcast::Receiver<DeviceConfig>>,
    ) -> Self {
        let cap = cfg.chunk_size_samples * 4;
        Self {
            frame_reader,
            output_tx,
            cfg,
            buffer: VecDeque::with_capacity(cap),
            samples_emitted: 0,
            metrics,
            capture_fps_tracker: FpsTracker::new(),
            chunker_fps_tracker: FpsTracker::new(),
            resampler: None,
            current_input_rate: None,
            current_input_channels: None,
            device_cfg_rx,
            start_time: std::time::Instant::now(),
        }
    }

    async fn run(&mut self, running: Arc<AtomicBool>) {
        tracing::info!("Audio chunker started");

        while running.load(Ordering::SeqCst) {
            if let Some(rx) = &mut self.device_cfg_rx {
                while let Ok(cfg) = rx.try_recv() {
                    self.frame_reader
                        .update_device_config(cfg.sample_rate, cfg.channels);
                }
            }
            if let Some(frame) = self.frame_reader.read_frame(8192) {
                if let Some(m) = &self.metrics {
                    m.increment_capture_frames();
                    if let Some(fps) = self.capture_fps_tracker.tick() {
                        m.update_capture_fps(fps);
                    }
                    m.update_audio_level(&frame.samples);
                    m.mark_stage_active(PipelineStage::Capture);
                }

                if self.current_input_rate != Some(frame.sample_rate)
                    || self.current_input_channels != Some(frame.channels)
                {
                    self.reconfigure_for_device(&frame);
                }

                let processed = self.process_frame(&frame);
                self.buffer.extend(processed);
                self.flush_ready_chunks();
            } else {
                // Device blocks arrive every 10-20 ms and full chunks only
                // every ~171 ms; polling at 40 Hz keeps up without spinning.
                time::sleep(Duration::from_millis(25)).await;
            }
        }

        tracing::info!("Audio chunker stopped");
    }

    fn flush_ready_chunks(&mut self) {
        let cs = self.cfg.chunk_size_samples;
        while self.buffer.len() >= cs {
            let out: Vec<i16> = self.buffer.drain(..cs).collect();

            // Timestamp from the emitted sample count, not wall clock.
            let timestamp_ms =
                (self.samples_emitted as u128 * 1000 / self.cfg.sample_rate_hz as u128) as u64;
            let timestamp = self.start_time + std::time::Duration::from_millis(timestamp_ms);

            let chunk = AudioChunk {
                samples: out,
                sample_rate: self.cfg.sample_rate_hz,
                timestamp,
            };

            // A broadcast send only fails when there are no receivers; the
            // pipeline may legitimately be between subscribers.
            match self.output_tx.send(chunk) {
                Ok(num_receivers) => {
                    tracing::trace!("Chunker: chunk sent to {} receivers", num_receivers);
                }
                Err(_) => {
                    tracing::warn!("No active listeners for audio chunks.");
                }
            }

            self.samples_emitted += cs as u64;

            if let Some(m) = &self.metrics {
                m.increment_chunker_frames();
                if let Some(fps) = self.chunker_fps_tracker.tick() {
                    m.update_chunker_fps(fps);
                }
                m.mark_stage_active(PipelineStage::Chunker);
            }
        }
    }

    fn reconfigure_for_device(&mut self, frame: &super::capture::CapturedFrame) {
        if frame.sample_rate != self.cfg.sample_rate_hz {
            tracing::info!(
                "Configuring resampler: {}Hz {} ch -> {}Hz mono",
                frame.sample_rate,
                frame.channels,
                self.cfg.sample_rate_hz
            );

            match StreamResampler::new_with_quality(
                frame.sample_rate,
                self.cfg.sample_rate_hz,
                self.cfg.resampler_quality,
            ) {
                Ok(rs) => self.resampler = Some(rs),
                Err(e) => {
                    tracing::error!("Failed to configure resampler: {}", e);
                    if let Some(m) = &self.metrics {
                        m.chunker_errors.fetch_add(1, Ordering::Relaxed);
                    }
                    self.resampler = None;
                }
            }
        } else {
            tracing::info!(
                "Device already at target rate {}Hz, no resampling needed",
                frame.sample_rate
            );
            self.resampler = None;
        }

        self.current_input_rate = Some(frame.sample_rate);
        self.current_input_channels = Some(frame.channels);
    }

    fn process_frame(&mut self, frame: &super::capture::CapturedFrame) -> Vec<i16> {
        let mono_samples = if frame.channels == 1 {
            frame.samples.clone()
        } else {
            // Downmix by averaging interleaved channels.
            let channels = frame.channels as usize;
            frame
                .samples
                .chunks_exact(channels)
                .map(|chunk| {
                    let sum: i32 = chunk.iter().map(|&s| s as i32).sum();
                    (sum / channels as i32) as i16
                })
                .collect()
        };

        if let Some(resampler) = &mut self.resampler {
            resampler.process(&mono_samples)
        } else {
            mono_samples
        }
    }
}
