pub mod config;
pub mod pipeline;
pub mod runtime;

pub use config::AppConfig;
pub use runtime::{start, AppHandle, AppRuntimeOptions, InjectionBackend};
