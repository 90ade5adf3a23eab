use std::time::Instant;

use super::capture::CapturedFrame;
use super::ring_buffer::AudioConsumer;

/// Drains the ring buffer and reconstructs frame metadata. Timestamps are
/// derived from the running sample count, not wall-clock reads, so they stay
/// monotone even when the reader falls behind.
pub struct FrameReader {
    consumer: AudioConsumer,
    sample_rate: u32,
    channels: u16,
    samples_read: u64,
    start_time: Instant,
}

impl FrameReader {
    pub fn new(consumer: AudioConsumer, sample_rate: u32, channels: u16) -> Self {
        Self {
            consumer,
            sample_rate,
            channels,
            samples_read: 0,
            start_time: Instant::now(),
        }
    }

    /// Applies a device change broadcast by the capture thread.
    pub fn update_device_config(&mut self, sample_rate: u32, channels: u16) {
        if self.sample_rate != sample_rate || self.channels != channels {
            tracing::info!(
                "Frame reader reconfigured: {} Hz {} ch -> {} Hz {} ch",
                self.sample_rate,
                self.channels,
                sample_rate,
                channels
            );
            self.sample_rate = sample_rate;
            self.channels = channels;
        }
    }

    pub fn read_frame(&mut self, max_samples: usize) -> Option<CapturedFrame> {
        let mut buffer = vec![0i16; max_samples];
        let samples_read = self.consumer.read(&mut buffer);

        if samples_read == 0 {
            return None;
        }

        buffer.truncate(samples_read);

        // Interleaved samples; divide by channel count for elapsed time.
        let frames = self.samples_read / self.channels.max(1) as u64;
        let elapsed_ms = (frames * 1000) / self.sample_rate as u64;
        let timestamp = self.start_time + std::time::Duration::from_millis(elapsed_ms);

        self.samples_read += samples_read as u64;

        Some(CapturedFrame {
            samples: buffer,
            timestamp,
            sample_rate: self.sample_rate,
            channels: self.channels,
        })
    }

    pub fn available_samples(&self) -> usize {
        self.consumer.slots()
    }
}
