use rtrb::{Consumer, Producer, RingBuffer};
use tracing::warn;

/// Real-time-safe SPSC sample buffer between the cpal callback and the
/// processing side, backed by rtrb.
pub struct AudioRingBuffer {
    producer: Producer<i16>,
    consumer: Consumer<i16>,
}

impl AudioRingBuffer {
    pub fn new(capacity: usize) -> Self {
        let (producer, consumer) = RingBuffer::new(capacity);
        Self { producer, consumer }
    }

    /// Split into halves owned by the callback thread and the reader task.
    pub fn split(self) -> (AudioProducer, AudioConsumer) {
        (
            AudioProducer {
                producer: self.producer,
            },
            AudioConsumer {
                consumer: self.consumer,
            },
        )
    }
}

/// Producer half, written from the audio callback. Writes are all-or-nothing:
/// a block that does not fit is dropped whole rather than blocking.
pub struct AudioProducer {
    producer: Producer<i16>,
}

impl AudioProducer {
    pub fn write(&mut self, samples: &[i16]) -> Result<usize, ()> {
        let mut chunk = match self.producer.write_chunk(samples.len()) {
            Ok(chunk) => chunk,
            Err(_) => {
                warn!(
                    "Ring buffer overflow: tried to write {} samples, buffer full",
                    samples.len()
                );
                return Err(());
            }
        };

        // The write region may wrap; fill both slices.
        let (first, second) = chunk.as_mut_slices();
        let split = first.len();
        if split > 0 {
            first.copy_from_slice(&samples[..split]);
        }
        if !second.is_empty() {
            second.copy_from_slice(&samples[split..]);
        }
        chunk.commit_all();
        Ok(samples.len())
    }

    pub fn slots(&self) -> usize {
        self.producer.slots()
    }
}

/// Consumer half, drained by the frame reader.
pub struct AudioConsumer {
    consumer: Consumer<i16>,
}

impl AudioConsumer {
    /// Read up to `buffer.len()` samples without blocking; returns the count.
    pub fn read(&mut self, buffer: &mut [i16]) -> usize {
        let chunk = match self.consumer.read_chunk(buffer.len()) {
            Ok(chunk) => chunk,
            Err(rtrb::chunks::ChunkError::TooFewSlots(available)) => {
                if available == 0 {
                    return 0;
                }
                match self.consumer.read_chunk(available) {
                    Ok(chunk) => chunk,
                    Err(_) => return 0,
                }
            }
        };

        let len = chunk.len();
        let (first, second) = chunk.as_slices();
        let split = first.len();
        if split > 0 {
            buffer[..split].copy_from_slice(first);
        }
        if !second.is_empty() {
            buffer[split..split + second.len()].copy_from_slice(second);
        }
        chunk.commit_all();
        len
    }

    pub fn slots(&self) -> usize {
        self.consumer.slots()
    }
}
