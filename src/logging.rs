//! Logging infrastructure - structured tracing for synthesis and dispatch
//!
//! Design: the library only emits `tracing` events under the targets
//! `synth`, `cache`, `dispatch` and `handle`. Embedders that have no
//! subscriber of their own can install one here.

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use tracing::Level;
use tracing_subscriber::{
    filter::Directive, fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};

/// Environment variable holding filter directives (overrides the configured level)
pub const LOG_ENV: &str = "IFACE_PROXY_LOG";

static LOGGER_INITIALIZED: OnceCell<()> = OnceCell::new();

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable multi-line format
    Pretty,
    /// Single-line format
    #[default]
    Compact,
    /// JSON lines for structured collection
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// trace, debug, info, warn or error
    pub level: String,
    pub format: LogFormat,
    /// Extra filter directives, e.g. "dispatch=trace"
    pub filter: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Compact,
            filter: None,
        }
    }
}

impl LogConfig {
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level.as_str().to_lowercase();
        self
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Parsed level, falling back to INFO for unknown names
    pub fn level(&self) -> Level {
        match self.level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    }

    fn env_filter(&self) -> EnvFilter {
        let base = EnvFilter::try_from_env(LOG_ENV)
            .unwrap_or_else(|_| EnvFilter::new(self.level().as_str().to_lowercase()));

        match &self.filter {
            Some(directives) => directives
                .split(',')
                .filter(|d| !d.trim().is_empty())
                .fold(base, |filter, directive| match directive.trim().parse::<Directive>() {
                    Ok(parsed) => filter.add_directive(parsed),
                    Err(_) => {
                        tracing::warn!("Invalid filter directive: {}", directive);
                        filter
                    }
                }),
            None => base,
        }
    }
}

/// Install a global subscriber. Later calls, or calls after another
/// subscriber was installed, are no-ops.
pub fn init_logging(config: &LogConfig) {
    LOGGER_INITIALIZED.get_or_init(|| {
        let filter = config.env_filter();
        let layer = match config.format {
            LogFormat::Pretty => fmt::layer().pretty().with_target(true).boxed(),
            LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
            LogFormat::Json => fmt::layer().json().with_target(true).boxed(),
        };

        tracing_subscriber::registry()
            .with(layer.with_filter(filter))
            .try_init()
            .ok();
    });
}

pub fn is_initialized() -> bool {
    LOGGER_INITIALIZED.get().is_some()
}

/// Time a block under a debug span
///
/// Usage:
/// ```ignore
/// let ty = time_block!("synthesize", { synthesizer.implement(&iface) });
/// ```
#[macro_export]
macro_rules! time_block {
    ($name:expr, $block:block) => {{
        let _span = tracing::debug_span!($name).entered();
        let start = std::time::Instant::now();
        let result = $block;
        tracing::debug!(
            operation = $name,
            duration_us = start.elapsed().as_micros() as u64,
            "operation complete"
        );
        result
    }};
}
