//! Structured logging configuration.

use crate::config::LoggingSettings;
use std::path::PathBuf;

/// Default filter directive.
const DEFAULT_LEVEL: &str = "info";

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable multi-line output.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

impl LogFormat {
    /// Parses a format name, defaulting to pretty.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        if s.eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Pretty
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// `EnvFilter` directive (`info`, `ragstore=debug,reqwest=warn`, ...).
    pub level: String,
    /// Output format.
    pub format: LogFormat,
    /// Append to this file instead of writing to stderr.
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LEVEL.to_string(),
            format: LogFormat::default(),
            file: None,
        }
    }
}

impl LoggingConfig {
    /// Builds logging configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_settings(None)
    }

    /// Builds logging configuration from config settings with env overrides.
    ///
    /// | Variable | Description |
    /// |----------|-------------|
    /// | `RAGSTORE_LOG_LEVEL` | Filter directive (falls back to `RUST_LOG`) |
    /// | `RAGSTORE_LOG_FORMAT` | `pretty` or `json` |
    /// | `RAGSTORE_LOG_FILE` | Log file path |
    #[must_use]
    pub fn from_settings(settings: Option<&LoggingSettings>) -> Self {
        let mut config = Self::default();

        if let Some(settings) = settings {
            if let Some(level) = &settings.level {
                config.level.clone_from(level);
            }
            if let Some(format) = &settings.format {
                config.format = LogFormat::parse(format);
            }
            config.file.clone_from(&settings.file);
        }

        if let Ok(level) =
            std::env::var("RAGSTORE_LOG_LEVEL").or_else(|_| std::env::var("RUST_LOG"))
        {
            config.level = level;
        }
        if let Ok(format) = std::env::var("RAGSTORE_LOG_FORMAT") {
            config.format = LogFormat::parse(&format);
        }
        if let Ok(file) = std::env::var("RAGSTORE_LOG_FILE") {
            config.file = Some(PathBuf::from(file));
        }

        config
    }
}
