use std::io;

use anyhow::Result;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::infrastructure::config::{LogFormat, LogSettings};

/// Global tracing subscriber.
///
/// Keep the returned value alive for the life of the process; dropping it
/// flushes and stops the background log writer.
pub struct Logger {
    _guard: Option<WorkerGuard>,
}

impl Logger {
    /// Install the global subscriber from the given settings.
    ///
    /// When a log directory is configured, a daily-rotated JSON file layer
    /// is added alongside the stdout layer. `RUST_LOG` overrides the
    /// configured level.
    ///
    /// # Errors
    /// Returns an error if the level is unknown or a subscriber is
    /// already installed.
    pub fn init(settings: &LogSettings) -> Result<Self> {
        let default_level = parse_log_level(&settings.level)?;

        let env_filter = EnvFilter::builder()
            .with_default_directive(default_level.into())
            .from_env_lossy();

        let guard = if let Some(ref log_dir) = settings.dir {
            let file_appender = rolling::daily(log_dir, "switchboard.log");
            let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

            // File output is always JSON for downstream ingestion.
            let file_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking_file)
                .with_ansi(false)
                .with_current_span(true)
                .with_target(true)
                .with_filter(env_filter.clone());

            match settings.format {
                LogFormat::Json => {
                    let stdout_layer = tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(io::stdout)
                        .with_current_span(true)
                        .with_target(true)
                        .with_filter(env_filter);

                    tracing_subscriber::registry()
                        .with(file_layer)
                        .with(stdout_layer)
                        .try_init()?;
                }
                LogFormat::Pretty => {
                    let stdout_layer = tracing_subscriber::fmt::layer()
                        .pretty()
                        .with_writer(io::stdout)
                        .with_target(true)
                        .with_span_events(FmtSpan::CLOSE)
                        .with_filter(env_filter);

                    tracing_subscriber::registry()
                        .with(file_layer)
                        .with(stdout_layer)
                        .try_init()?;
                }
            }

            Some(guard)
        } else {
            match settings.format {
                LogFormat::Json => {
                    let stdout_layer = tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(io::stdout)
                        .with_current_span(true)
                        .with_target(true)
                        .with_filter(env_filter);

                    tracing_subscriber::registry().with(stdout_layer).try_init()?;
                }
                LogFormat::Pretty => {
                    let stdout_layer = tracing_subscriber::fmt::layer()
                        .pretty()
                        .with_writer(io::stdout)
                        .with_target(true)
                        .with_span_events(FmtSpan::CLOSE)
                        .with_filter(env_filter);

                    tracing_subscriber::registry().with(stdout_layer).try_init()?;
                }
            }

            None
        };

        tracing::info!(
            level = %settings.level,
            format = ?settings.format,
            file_output = settings.dir.is_some(),
            "logger initialized"
        );

        Ok(Self { _guard: guard })
    }
}

fn parse_log_level(level: &str) -> Result<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => anyhow::bail!("Invalid log level: {level}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_log_level() {
        assert_eq!(parse_log_level("trace").unwrap(), Level::TRACE);
        assert_eq!(parse_log_level("debug").unwrap(), Level::DEBUG);
        assert_eq!(parse_log_level("info").unwrap(), Level::INFO);
        assert_eq!(parse_log_level("warn").unwrap(), Level::WARN);
        assert_eq!(parse_log_level("error").unwrap(), Level::ERROR);
        assert_eq!(parse_log_level("WARN").unwrap(), Level::WARN);
        assert!(parse_log_level("verbose").is_err());
    }

    #[test]
    fn test_init_registers_once() {
        let settings = LogSettings::default();
        let first = Logger::init(&settings);
        assert!(first.is_ok());
        // The global subscriber can only be installed once per process.
        assert!(Logger::init(&settings).is_err());
    }
}
