//! Builds the process-wide `slog::Logger` used by every indexer component.
//!
//! Mirrors the shape of a conventional Lighthouse-style logging setup: an
//! async terminal drain for interactive use, a JSON drain for production, and
//! a `test_logger` feature that routes log output to stderr during tests
//! instead of silently dropping it.

use serde::{Deserialize, Serialize};
use slog::{o, Drain, Level, Logger};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogFormat {
    Terminal,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "terminal" => Ok(LogFormat::Terminal),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format {other}")),
        }
    }
}

/// Parses a `slog::Level` from the conventional lowercase names used in config files.
pub fn parse_level(s: &str) -> Result<Level, String> {
    Level::from_str(s).map_err(|()| format!("unknown log level {s}"))
}

/// Builds the root async logger. Every component logger is derived from this
/// one via `log.new(o!("component" => "..."))`.
pub fn root_logger(level: Level, format: LogFormat) -> Logger {
    match format {
        LogFormat::Terminal => {
            let decorator = slog_term::TermDecorator::new().build();
            let drain = slog_term::FullFormat::new(decorator).build().fuse();
            let drain = slog::LevelFilter::new(drain, level).fuse();
            let drain = slog_async::Async::new(drain).build().fuse();
            Logger::root(drain, o!())
        }
        LogFormat::Json => {
            use sloggers::{json::JsonLoggerBuilder, types::Severity, Build};
            let mut builder = JsonLoggerBuilder::new();
            builder.level(severity_from_level(level));
            builder
                .build()
                .unwrap_or_else(|_| Logger::root(slog::Discard, o!()))
        }
    }
}

fn severity_from_level(level: Level) -> sloggers::types::Severity {
    use sloggers::types::Severity;
    match level {
        Level::Critical | Level::Error => Severity::Error,
        Level::Warning => Severity::Warning,
        Level::Info => Severity::Info,
        Level::Debug => Severity::Debug,
        Level::Trace => Severity::Trace,
    }
}

/// A logger that discards everything, used as a default for tests that don't
/// care about log output.
pub fn null_logger() -> Logger {
    Logger::root(slog::Discard, o!())
}

#[cfg(feature = "test_logger")]
pub fn test_logger() -> Logger {
    let decorator = slog_term::PlainDecorator::new(std::io::stderr());
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    let drain = slog::LevelFilter::new(drain, Level::Debug).fuse();
    Logger::root(std::sync::Mutex::new(drain).fuse(), o!())
}

#[cfg(not(feature = "test_logger"))]
pub fn test_logger() -> Logger {
    null_logger()
}
