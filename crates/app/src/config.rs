//! Layered runtime configuration: built-in defaults, then an optional TOML
//! file, then CLI/environment overrides applied by `main`.

use anyhow::Context;
use commandflow_command::InterpreterConfig;
use commandflow_stt::DispatchConfig;
use commandflow_vad::SegmenterConfig;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Preferred input device name; host default when absent.
    pub device: Option<String>,

    /// External speech-to-text command: program followed by its arguments.
    /// The utterance WAV path is appended as the final argument. When absent,
    /// the no-op transcriber runs and nothing is recognized.
    pub transcriber: Option<Vec<String>>,

    pub vad: SegmenterConfig,
    pub stt: DispatchConfig,
    pub command: InterpreterConfig,
}

impl AppConfig {
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config: AppConfig = toml::from_str(&raw)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        config.validate().map_err(anyhow::Error::msg)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), String> {
        self.vad.validate()?;
        self.stt.validate()?;
        if let Some(cmd) = &self.transcriber {
            if cmd.is_empty() {
                return Err("transcriber command must name a program".into());
            }
        }
        Ok(())
    }
}
