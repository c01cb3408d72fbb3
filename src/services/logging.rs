//! Logging setup for applications embedding the orchestration core.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Output format for log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default level (trace, debug, info, warn, error); `RUST_LOG` overrides.
    pub level: String,
    /// Structured JSON for production, pretty for local runs.
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Installs the global tracing subscriber.
///
/// Call once at process startup. Fails when the level is unknown or a
/// subscriber is already installed.
pub fn init(config: &LogConfig) -> Result<()> {
    let level: Level = config
        .level
        .parse()
        .with_context(|| format!("invalid log level: {}", config.level))?;
    let env_filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    match config.format {
        LogFormat::Json => {
            let layer = tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(true)
                .with_target(true)
                .with_filter(env_filter);
            tracing_subscriber::registry()
                .with(layer)
                .try_init()
                .context("failed to install logging subscriber")?;
        }
        LogFormat::Pretty => {
            let layer = tracing_subscriber::fmt::layer()
                .pretty()
                .with_target(true)
                .with_span_events(FmtSpan::CLOSE)
                .with_filter(env_filter);
            tracing_subscriber::registry()
                .with(layer)
                .try_init()
                .context("failed to install logging subscriber")?;
        }
    }
    Ok(())
}
