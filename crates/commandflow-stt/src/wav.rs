use crate::types::SttError;
use hound::{SampleFormat, WavSpec, WavWriter};
use std::path::PathBuf;
use tempfile::NamedTempFile;

/// A temporary WAV on disk holding one utterance. The file is deleted when
/// this handle drops unless `keep()` was requested.
pub struct UtteranceWav {
    file: Option<NamedTempFile>,
    path: PathBuf,
}

impl UtteranceWav {
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Persist the file instead of deleting it on drop.
    pub fn keep(mut self) -> Result<PathBuf, SttError> {
        if let Some(file) = self.file.take() {
            let (_, path) = file.keep().map_err(|e| SttError::Io(e.error))?;
            self.path = path.clone();
            return Ok(path);
        }
        Ok(self.path.clone())
    }
}

/// Writes mono 16-bit PCM to a temp WAV for the transcriber handoff.
pub fn write_utterance_wav(samples: &[i16], sample_rate: u32) -> Result<UtteranceWav, SttError> {
    let mut file = tempfile::Builder::new()
        .prefix("commandflow-utterance-")
        .suffix(".wav")
        .tempfile()?;

    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::new(file.as_file_mut(), spec)?;
    for &sample in samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;

    let path = file.path().to_path_buf();
    Ok(UtteranceWav {
        file: Some(file),
        path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn written_wav_reads_back_identically() {
        let samples: Vec<i16> = (0..1000).map(|i| (i % 256) as i16 * 100).collect();
        let wav = write_utterance_wav(&samples, 48_000).unwrap();

        let mut reader = hound::WavReader::open(wav.path()).unwrap();
        assert_eq!(reader.spec().channels, 1);
        assert_eq!(reader.spec().sample_rate, 48_000);
        assert_eq!(reader.spec().bits_per_sample, 16);
        let read: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(read, samples);
    }

    #[test]
    fn file_removed_on_drop() {
        let wav = write_utterance_wav(&[0i16; 16], 48_000).unwrap();
        let path = wav.path().to_path_buf();
        assert!(path.exists());
        drop(wav);
        assert!(!path.exists());
    }

    #[test]
    fn kept_file_survives_drop() {
        let wav = write_utterance_wav(&[0i16; 16], 48_000).unwrap();
        let path = wav.keep().unwrap();
        assert!(path.exists());
        std::fs::remove_file(path).unwrap();
    }
}
