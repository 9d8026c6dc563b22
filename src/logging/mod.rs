/*!
 * Logging Module
 * Rolling file logs plus console output, JSON in production
 */
pub mod config;
pub mod middleware;

use std::io;
use tracing_appender::{non_blocking, non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

pub use config::{LogLevel, LoggingConfig};

/// Flushes the background writers when dropped; hold it for the life of the process.
#[must_use = "dropping the guards stops the log writers"]
pub struct LogGuards(#[allow(dead_code)] Vec<WorkerGuard>);

/// Initialize the logging system
pub fn init(config: &LoggingConfig) -> LogGuards {
    if let Err(e) = std::fs::create_dir_all(&config.directory) {
        eprintln!("could not create log directory {:?}: {e}", config.directory);
    }

    // All events
    let (file_writer, file_guard) = non_blocking(rolling::daily(&config.directory, "app.log"));
    // Errors only
    let (error_writer, error_guard) = non_blocking(rolling::daily(&config.directory, "error.log"));
    let (console_writer, console_guard) = non_blocking(io::stdout());

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.default_directives()));

    let error_filter = tracing_subscriber::filter::LevelFilter::ERROR;
    let subscriber = tracing_subscriber::registry().with(env_filter);

    if config.is_production() {
        subscriber
            .with(
                fmt::layer()
                    .json()
                    .with_writer(file_writer)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .with(
                fmt::layer()
                    .json()
                    .with_writer(error_writer)
                    .with_file(true)
                    .with_line_number(true)
                    .with_filter(error_filter),
            )
            .with(fmt::layer().json().with_writer(console_writer).with_target(false))
            .init();
    } else {
        subscriber
            .with(
                fmt::layer()
                    .with_writer(file_writer)
                    .with_file(true)
                    .with_line_number(true)
                    .with_ansi(false),
            )
            .with(
                fmt::layer()
                    .with_writer(error_writer)
                    .with_ansi(false)
                    .with_filter(error_filter),
            )
            .with(fmt::layer().with_writer(console_writer).pretty())
            .init();
    }

    tracing::info!(
        environment = %config.environment,
        level = %config.level,
        "Logging initialized"
    );

    LogGuards(vec![file_guard, error_guard, console_guard])
}
