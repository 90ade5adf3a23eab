use crate::types::SttError;
use crate::Transcriber;
use std::path::Path;

/// Recognizes nothing. Lets the rest of the pipeline run without any
/// speech-to-text backend configured.
#[derive(Default)]
pub struct NoopTranscriber;

impl NoopTranscriber {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl Transcriber for NoopTranscriber {
    async fn transcribe_wav(&self, _wav_path: &Path) -> Result<Option<String>, SttError> {
        Ok(None)
    }

    fn name(&self) -> &'static str {
        "noop"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn always_reports_no_speech() {
        let t = NoopTranscriber::new();
        let result = t.transcribe_wav(Path::new("/nonexistent.wav")).await.unwrap();
        assert!(result.is_none());
    }
}
