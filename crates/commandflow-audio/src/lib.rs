pub mod capture;
pub mod chunker;
pub mod detector;
pub mod device;
pub mod frame_reader;
pub mod resampler;
pub mod ring_buffer;
pub mod watchdog;

// Public API
pub use capture::{AudioCaptureThread, CaptureStats, DeviceConfig};
pub use chunker::{AudioChunk, AudioChunker, ChunkerConfig, ResamplerQuality};
pub use device::{DeviceInfo, DeviceManager};
pub use frame_reader::FrameReader;
pub use ring_buffer::{AudioConsumer, AudioProducer, AudioRingBuffer};
pub use watchdog::WatchdogTimer;
