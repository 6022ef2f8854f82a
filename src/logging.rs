use color_eyre::{eyre::WrapErr, Result};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const LOG_DIR: &str = "logs";
pub const LOG_FILE: &str = "citybands.log";

/// Routes `tracing` output to a daily rolling file under `dir`; the terminal
/// belongs to the UI, so nothing goes to stdout.
///
/// `RUST_LOG` narrows or widens the default `info` level. Keep the returned
/// guard alive until exit or buffered lines are lost.
pub fn initialize_logging(dir: impl AsRef<Path>) -> Result<WorkerGuard> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)
        .wrap_err_with(|| format!("could not create log directory {}", dir.display()))?;

    let file_appender = tracing_appender::rolling::daily(dir, LOG_FILE);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .try_init()
        .wrap_err("a global tracing subscriber is already installed")?;

    tracing::info!("Logging to {}", dir.join(LOG_FILE).display());
    Ok(guard)
}
