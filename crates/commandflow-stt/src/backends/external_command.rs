use crate::types::SttError;
use crate::Transcriber;
use std::path::Path;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

/// Invokes an external speech-to-text command on the utterance WAV.
///
/// The configured program is run with its arguments followed by the WAV path;
/// trimmed stdout is the recognized text. This keeps model loading and
/// inference entirely outside the process.
pub struct ExternalCommandTranscriber {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl ExternalCommandTranscriber {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            timeout: Duration::from_secs(60),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait::async_trait]
impl Transcriber for ExternalCommandTranscriber {
    async fn transcribe_wav(&self, wav_path: &Path) -> Result<Option<String>, SttError> {
        debug!(
            program = %self.program,
            wav = %wav_path.display(),
            "invoking external transcriber"
        );

        let output = tokio::time::timeout(
            self.timeout,
            Command::new(&self.program)
                .args(&self.args)
                .arg(wav_path)
                .kill_on_drop(true)
                .output(),
        )
        .await
        .map_err(|_| SttError::Backend {
            backend: "external-command",
            message: format!("timed out after {:?}", self.timeout),
        })??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            warn!(status = %output.status, "external transcriber failed");
            return Err(SttError::CommandFailed {
                status: output.status.to_string(),
                stderr,
            });
        }

        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if text.is_empty() {
            Ok(None)
        } else {
            Ok(Some(text))
        }
    }

    fn name(&self) -> &'static str {
        "external-command"
    }
}
