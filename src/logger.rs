//! Installs the global `tracing` subscriber.

use serde::{Deserialize, Serialize};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::errors::{Error, Result};

/// Crates whose events are shown at the configured level.
const MODULE_WHITELIST: &[&str] = &["ontosim"];

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Off,
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let level = match self {
            Self::Off => "off",
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        };
        f.write_str(level)
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    #[default]
    Compact,
    Pretty,
    Json,
}

/// Logger section of the configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Install a subscriber at all.
    pub enable: bool,
    pub level: LogLevel,
    pub format: Format,
    /// Full `EnvFilter` directive replacing the whitelist built from `level`.
    pub override_filter: Option<String>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            enable: true,
            level: LogLevel::default(),
            format: Format::default(),
            override_filter: None,
        }
    }
}

/// Installs the global subscriber described by `config`.
///
/// `RUST_LOG` wins over the configured level. Installing a second subscriber
/// fails with [`Error::Logger`].
///
/// # Errors
/// Returns an error when the filter directive is invalid or a global
/// subscriber is already set.
pub fn init(config: &LoggerConfig) -> Result<()> {
    if !config.enable {
        return Ok(());
    }

    let filter = env_filter(config)?;
    let layer = match config.format {
        Format::Compact => fmt::layer().compact().with_writer(std::io::stderr).boxed(),
        Format::Pretty => fmt::layer().pretty().with_writer(std::io::stderr).boxed(),
        Format::Json => fmt::layer().json().with_writer(std::io::stderr).boxed(),
    };

    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .try_init()
        .map_err(|err| Error::Logger(err.to_string()))
}

fn env_filter(config: &LoggerConfig) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    let directive = config.override_filter.clone().unwrap_or_else(|| {
        MODULE_WHITELIST
            .iter()
            .map(|module| format!("{module}={}", config.level))
            .collect::<Vec<_>>()
            .join(",")
    });
    EnvFilter::try_new(directive).map_err(|err| Error::Logger(err.to_string()))
}
