// src/logging.rs

//! `tracing` subscriber setup for programs embedding `workdag`.
//!
//! The level comes from, in order:
//! 1. the level handed to [`init_logging`] (usually `[config].log_level`)
//! 2. the `WORKDAG_LOG` environment variable
//! 3. `info`
//!
//! Output goes to stderr.

use std::str::FromStr;

use anyhow::Result;
use serde::Deserialize;
use tracing::Level;
use tracing_subscriber::fmt;

/// Environment variable consulted when no level is configured.
pub const LOG_ENV_VAR: &str = "WORKDAG_LOG";

/// Log verbosity accepted in `[config].log_level` and `WORKDAG_LOG`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            other => Err(format!("invalid log level: {other}")),
        }
    }
}

impl From<LogLevel> for Level {
    fn from(lvl: LogLevel) -> Self {
        match lvl {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

/// Install the global subscriber.
///
/// Returns an error instead of panicking if a subscriber is already set,
/// so a host program that configured its own tracing keeps it.
pub fn init_logging(level: Option<LogLevel>) -> Result<()> {
    let level = level
        .or_else(|| {
            std::env::var(LOG_ENV_VAR)
                .ok()
                .and_then(|s| s.parse::<LogLevel>().ok())
        })
        .map_or(Level::INFO, Level::from);

    fmt()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))?;

    Ok(())
}
