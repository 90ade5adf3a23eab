use anyhow::Context;
use clap::Parser;
use commandflow_app::config::AppConfig;
use commandflow_app::runtime::{self, AppRuntimeOptions, InjectionBackend};
use commandflow_audio::{DeviceManager, ResamplerQuality};
use commandflow_foundation::{
    AppState, HealthMonitor, ShutdownHandler, StateManager,
};
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::writer::MakeWriterExt;

#[derive(Parser, Debug)]
#[command(name = "commandflow", about = "Voice-driven computer control pipeline")]
struct Cli {
    /// Path to a TOML config file
    #[arg(long, env = "COMMANDFLOW_CONFIG")]
    config: Option<PathBuf>,

    /// Input device name (exact or closest match)
    #[arg(short, long, env = "COMMANDFLOW_DEVICE")]
    device: Option<String>,

    /// List available input devices and exit
    #[arg(long)]
    list_devices: bool,

    /// Peak-amplitude speech threshold override
    #[arg(long, env = "COMMANDFLOW_ENERGY_THRESHOLD")]
    energy_threshold: Option<i16>,

    /// Trailing-silence chunk count override
    #[arg(long, env = "COMMANDFLOW_SILENCE_CHUNKS")]
    silence_chunks: Option<u32>,

    /// Transcription worker count override
    #[arg(long, env = "COMMANDFLOW_WORKERS")]
    workers: Option<usize>,

    /// External transcriber command, whitespace-separated
    /// (e.g. "whisper-cli --model small.en")
    #[arg(long, env = "COMMANDFLOW_TRANSCRIBER")]
    transcriber: Option<String>,

    /// Keep utterance WAV files for debugging
    #[arg(long)]
    keep_wav: bool,

    /// Input injection backend: noop or enigo
    #[arg(long, default_value = "noop", env = "COMMANDFLOW_INJECTOR")]
    injector: String,

    /// Resampler quality: fast, balanced, or quality
    #[arg(long, default_value = "balanced")]
    resampler: String,
}

fn init_logging() -> anyhow::Result<()> {
    std::fs::create_dir_all("logs")?;
    let file_appender = RollingFileAppender::new(Rotation::DAILY, "logs", "commandflow.log");
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_writer(std::io::stdout.and(non_blocking_file))
        .with_env_filter(log_level)
        .init();
    // Keep the appender guard alive for the process lifetime.
    std::mem::forget(guard);
    Ok(())
}

fn list_devices() -> anyhow::Result<()> {
    let manager = DeviceManager::new().context("initializing audio host")?;
    let devices = manager.enumerate_devices();
    if devices.is_empty() {
        println!("No input devices found.");
        return Ok(());
    }
    println!("Available input devices:");
    for device in devices {
        let marker = if device.is_default { " (default)" } else { "" };
        println!("  {}{}", device.name, marker);
        for cfg in device.supported_configs {
            println!("      {}", cfg);
        }
    }
    Ok(())
}

fn build_options(cli: &Cli, config: AppConfig) -> anyhow::Result<AppRuntimeOptions> {
    let mut opts = AppRuntimeOptions {
        device: cli.device.clone().or(config.device),
        segmenter: config.vad,
        dispatch: config.stt,
        transcriber_command: config.transcriber,
        interpreter: config.command,
        ..Default::default()
    };

    if let Some(threshold) = cli.energy_threshold {
        opts.segmenter.energy_threshold = threshold;
    }
    if let Some(chunks) = cli.silence_chunks {
        opts.segmenter.silence_chunks = chunks;
    }
    if let Some(workers) = cli.workers {
        opts.dispatch.workers = workers;
    }
    if let Some(cmd) = &cli.transcriber {
        let parts: Vec<String> = cmd.split_whitespace().map(String::from).collect();
        if parts.is_empty() {
            anyhow::bail!("--transcriber must name a program");
        }
        opts.transcriber_command = Some(parts);
    }
    if cli.keep_wav {
        opts.dispatch.keep_wav_files = true;
    }

    opts.resampler_quality = match cli.resampler.as_str() {
        "fast" => ResamplerQuality::Fast,
        "balanced" => ResamplerQuality::Balanced,
        "quality" => ResamplerQuality::Quality,
        other => anyhow::bail!("unknown resampler quality: {}", other),
    };

    opts.injection_backend = match cli.injector.as_str() {
        "noop" => InjectionBackend::Noop,
        #[cfg(feature = "enigo")]
        "enigo" => InjectionBackend::Enigo,
        other => anyhow::bail!("unknown injection backend: {}", other),
    };

    opts.segmenter.validate().map_err(anyhow::Error::msg)?;
    opts.dispatch.validate().map_err(anyhow::Error::msg)?;
    Ok(opts)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.list_devices {
        return list_devices();
    }

    init_logging()?;
    tracing::info!("Starting CommandFlow");

    let config = AppConfig::load(cli.config.as_deref())?;
    let opts = build_options(&cli, config)?;

    let state_manager = StateManager::new();
    let _health_monitor = HealthMonitor::new(Duration::from_secs(10)).start();
    let shutdown = ShutdownHandler::new().install().await;

    let handle = runtime::start(opts)
        .await
        .map_err(|e| anyhow::anyhow!("failed to start pipeline: {}", e))?;

    state_manager.transition(AppState::Running)?;
    tracing::info!("Application state: {:?}", state_manager.current());

    let mut stats_interval = tokio::time::interval(Duration::from_secs(30));
    stats_interval.tick().await; // first tick fires immediately
    loop {
        tokio::select! {
            _ = shutdown.wait() => {
                tracing::info!("Shutdown signal received");
                break;
            }
            _ = stats_interval.tick() => {
                let m = &handle.metrics;
                tracing::info!(
                    "Pipeline: {} chunks, {} utterances ({} dropped), {} recognized, {} commands",
                    m.vad_chunks.load(Ordering::Relaxed),
                    m.utterances_segmented.load(Ordering::Relaxed),
                    m.utterances_dropped.load(Ordering::Relaxed),
                    m.transcriptions_ok.load(Ordering::Relaxed),
                    m.commands_executed.load(Ordering::Relaxed),
                );
            }
        }
    }

    tracing::info!("Beginning graceful shutdown");
    state_manager.transition(AppState::Stopping)?;
    handle.shutdown().await;
    state_manager.transition(AppState::Stopped)?;
    tracing::info!("Shutdown complete");

    Ok(())
}
