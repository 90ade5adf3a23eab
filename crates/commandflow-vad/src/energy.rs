/// Per-chunk energy measures.
///
/// Classification uses peak absolute amplitude; RMS/dBFS are computed for
/// metrics and logging only.
pub struct EnergyMeter {
    epsilon: f32,
}

impl EnergyMeter {
    pub fn new() -> Self {
        Self { epsilon: 1e-10 }
    }

    /// Peak absolute amplitude of the chunk, in raw i16 counts.
    pub fn peak(&self, chunk: &[i16]) -> i16 {
        chunk
            .iter()
            .map(|&s| s.saturating_abs())
            .max()
            .unwrap_or(0)
    }

    pub fn rms(&self, chunk: &[i16]) -> f32 {
        if chunk.is_empty() {
            return 0.0;
        }

        let sum_squares: i64 = chunk
            .iter()
            .map(|&sample| {
                let s = sample as i64;
                s * s
            })
            .sum();

        let mean_square = sum_squares as f64 / chunk.len() as f64;
        (mean_square.sqrt() / 32768.0) as f32
    }

    pub fn rms_to_dbfs(&self, rms: f32) -> f32 {
        if rms <= self.epsilon {
            return -100.0;
        }
        20.0 * rms.log10()
    }

    pub fn dbfs(&self, chunk: &[i16]) -> f32 {
        self.rms_to_dbfs(self.rms(chunk))
    }
}

impl Default for EnergyMeter {
    fn default() -> Self {
        Self::new()
    }
}
