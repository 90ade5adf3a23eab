use thiserror::Error;

#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Injection backend '{backend}' unavailable: {reason}")]
    BackendUnavailable {
        backend: &'static str,
        reason: String,
    },

    #[error("Injection failed: {0}")]
    InjectionFailed(String),

    #[error("Screen geometry unknown: {0}")]
    ScreenGeometry(String),
}
