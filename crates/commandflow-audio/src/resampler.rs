use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};

use super::chunker::ResamplerQuality;

/// Streaming mono i16 resampler over rubato's sinc interpolation.
///
/// Accumulates arbitrary-sized input into rubato's fixed chunk size and
/// returns whatever full output is available per call; residual samples stay
/// buffered for the next call.
pub struct StreamResampler {
    in_rate: u32,
    out_rate: u32,
    resampler: Option<SincFixedIn<f32>>,
    input_buffer: Vec<f32>,
    chunk_size: usize,
}

impl StreamResampler {
    pub fn new(in_rate: u32, out_rate: u32) -> Result<Self, String> {
        Self::new_with_quality(in_rate, out_rate, ResamplerQuality::Balanced)
    }

    pub fn new_with_quality(
        in_rate: u32,
        out_rate: u32,
        quality: ResamplerQuality,
    ) -> Result<Self, String> {
        let chunk_size = 1024;

        let resampler = if in_rate == out_rate {
            None
        } else {
            let sinc_params = match quality {
                ResamplerQuality::Fast => SincInterpolationParameters {
                    sinc_len: 32,
                    f_cutoff: 0.92,
                    interpolation: SincInterpolationType::Linear,
                    oversampling_factor: 64,
                    window: WindowFunction::Blackman,
                },
                ResamplerQuality::Balanced => SincInterpolationParameters {
                    sinc_len: 64,
                    f_cutoff: 0.95,
                    interpolation: SincInterpolationType::Cubic,
                    oversampling_factor: 128,
                    window: WindowFunction::Blackman2,
                },
                ResamplerQuality::Quality => SincInterpolationParameters {
                    sinc_len: 128,
                    f_cutoff: 0.97,
                    interpolation: SincInterpolationType::Cubic,
                    oversampling_factor: 256,
                    window: WindowFunction::BlackmanHarris2,
                },
            };

            Some(
                SincFixedIn::<f32>::new(
                    out_rate as f64 / in_rate as f64,
                    2.0,
                    sinc_params,
                    chunk_size,
                    1, // mono
                )
                .map_err(|e| format!("Failed to create resampler: {}", e))?,
            )
        };

        Ok(Self {
            in_rate,
            out_rate,
            resampler,
            input_buffer: Vec::with_capacity(chunk_size * 2),
            chunk_size,
        })
    }

    pub fn in_rate(&self) -> u32 {
        self.in_rate
    }

    pub fn out_rate(&self) -> u32 {
        self.out_rate
    }

    /// Process an arbitrary chunk of mono i16 samples; returns resampled i16
    /// at the output rate (possibly empty while input accumulates).
    pub fn process(&mut self, input: &[i16]) -> Vec<i16> {
        let Some(resampler) = self.resampler.as_mut() else {
            // Same-rate fast path.
            return input.to_vec();
        };

        for &sample in input {
            self.input_buffer.push(sample as f32 / 32768.0);
        }

        let mut output = Vec::new();
        while self.input_buffer.len() >= self.chunk_size {
            let chunk: Vec<f32> = self.input_buffer.drain(..self.chunk_size).collect();
            let input_frames = vec![chunk];

            match resampler.process(&input_frames, None) {
                Ok(output_frames) => {
                    if let Some(channel) = output_frames.into_iter().next() {
                        output.extend(channel.into_iter().map(|s| {
                            (s.clamp(-1.0, 1.0) * 32767.0).round() as i16
                        }));
                    }
                }
                Err(e) => {
                    tracing::error!("Resampler error: {}", e);
                    return output;
                }
            }
        }

        output
    }
}
