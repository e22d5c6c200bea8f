use anyhow::{Context, Error, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::AppConfig;

pub const LOG_FILE_NAME: &str = "uartplot.log";

/// Installs the global subscriber. The terminal is owned by the chart, so events go to
/// `<log_directory>/uartplot.log`; keep the returned guard alive until exit.
pub fn init(config: &AppConfig) -> Result<WorkerGuard> {
    let filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.log_level))?;
    std::fs::create_dir_all(&config.log_directory)
        .with_context(|| format!("failed to create log directory {}", config.log_directory))?;
    let appender = tracing_appender::rolling::never(&config.log_directory, LOG_FILE_NAME);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .map_err(|err| Error::msg(err))?;
    Ok(guard)
}
