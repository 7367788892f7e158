// agentdeck - terminal console for coding agents working across git worktrees
//
// Architecture:
// - Controller: pure state machine (events in, requests and frames out)
// - Runtime: owns the terminal, executes requests on tokio, feeds results back
// - Backend: worktrees, sessions and remote status behind one trait
// - Logging: captured in memory while the alternate screen is up

use agentdeck::backend::{DemoBackend, SessionBackend};
use agentdeck::cli::{self, Cli};
use agentdeck::config::{Config, LogRotation};
use agentdeck::logging::{LogBuffer, TuiLogLayer};
use agentdeck::theme::Theme;
use agentdeck::tui::{self, markdown::TermMarkdown, Controller};
use anyhow::{bail, Result};
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Handle subcommands first (config --show, --path)
    if cli::handle_command(&cli) {
        return Ok(());
    }

    // Ensure config template exists (helps users discover options)
    Config::ensure_config_exists();

    let mut config = Config::from_env();
    cli.apply(&mut config);

    if !config.demo_mode {
        bail!(
            "no session backend configured; run `agentdeck --demo` (or set AGENTDECK_DEMO=1) \
             to try the console with simulated agents"
        );
    }

    let log_buffer = LogBuffer::new();

    // Logs go to the in-memory buffer while the TUI is up; file logging is optional.
    // Precedence: RUST_LOG env var > config file > default "info"
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.logging.filter_directive().into());

    // The guard must be kept alive for the duration of the program to ensure logs flush
    let _file_guard: Option<tracing_appender::non_blocking::WorkerGuard> =
        if config.logging.file_enabled {
            if let Err(e) = std::fs::create_dir_all(&config.logging.file_dir) {
                eprintln!(
                    "Warning: Could not create log directory {:?}: {}",
                    config.logging.file_dir, e
                );
                tracing_subscriber::registry()
                    .with(filter)
                    .with(TuiLogLayer::new(log_buffer.clone()))
                    .init();
                None
            } else {
                let file_appender = match config.logging.file_rotation {
                    LogRotation::Hourly => tracing_appender::rolling::hourly(
                        &config.logging.file_dir,
                        &config.logging.file_prefix,
                    ),
                    LogRotation::Daily => tracing_appender::rolling::daily(
                        &config.logging.file_dir,
                        &config.logging.file_prefix,
                    ),
                    LogRotation::Never => tracing_appender::rolling::never(
                        &config.logging.file_dir,
                        &config.logging.file_prefix,
                    ),
                };

                // Writes happen on a background thread
                let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

                tracing_subscriber::registry()
                    .with(filter)
                    .with(TuiLogLayer::new(log_buffer.clone()))
                    .with(
                        tracing_subscriber::fmt::layer()
                            .json()
                            .with_writer(non_blocking)
                            .with_ansi(false),
                    )
                    .init();

                Some(guard)
            }
        } else {
            tracing_subscriber::registry()
                .with(filter)
                .with(TuiLogLayer::new(log_buffer.clone()))
                .init();
            None
        };

    tracing::info!(
        version = agentdeck::config::VERSION,
        theme = %config.theme,
        demo = config.demo_mode,
        "starting agentdeck"
    );

    let backend: Arc<dyn SessionBackend> = Arc::new(DemoBackend::new());
    let controller = Controller::new(
        config.controller_config(),
        Theme::by_name(&config.theme),
        Box::new(TermMarkdown),
    );

    let result = tui::run(controller, backend).await;

    // The alternate screen is gone; surface anything the user should know about
    let mut stderr = std::io::stderr();
    let _ = log_buffer.replay_problems(&mut stderr);

    result
}
