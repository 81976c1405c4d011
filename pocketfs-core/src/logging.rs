//! Structured JSON logging to a rolling file.
//!
//! One global subscriber per process: an `EnvFilter` (seeded from
//! `RUST_LOG`, then the configured level) in front of a JSON `fmt` layer that
//! writes through a non-blocking rolling appender. Keep the returned
//! [`WorkerGuard`] alive for as long as logs should be flushed.

use std::{
    path::{Component, Path, PathBuf},
    str::FromStr,
    sync::atomic::{AtomicBool, Ordering},
};

use compact_str::CompactString;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tokio::fs as TokioFs;
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{RollingFileAppender, Rotation},
};
use tracing_subscriber::{
    EnvFilter, filter::Directive, fmt::time::ChronoUtc, layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    pub log_dir: PathBuf,
    pub log_file_prefix: CompactString,
    pub log_level: CompactString,
    pub max_log_files: usize,
    pub rotation: LogRotation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogRotation {
    Never,
    Daily,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        let log_dir: PathBuf = ProjectDirs::from("org", "pocketfs", "PocketFS").map_or_else(
            || PathBuf::from("./logs"),
            |dirs| dirs.data_local_dir().join("logs"),
        );

        Self {
            log_dir,
            log_file_prefix: CompactString::const_new("pocketfs"),
            log_level: CompactString::const_new("info"),
            max_log_files: 10,
            rotation: LogRotation::Daily,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Logger already initialized")]
    AlreadyInitialized,

    #[error("Invalid log directory: {0}")]
    InvalidLogDirectory(String),

    #[error("Failed to create log directory: {0}")]
    DirectoryCreationFailed(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

static INITIALIZED: AtomicBool = AtomicBool::new(false);

pub struct LoggerBuilder {
    config: LoggerConfig,
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl LoggerBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: LoggerConfig::default(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: LoggerConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn with_level(mut self, level: &str) -> Self {
        self.config.log_level = CompactString::new(level);
        self
    }

    pub async fn build(self) -> Result<WorkerGuard, LoggingError> {
        validate_config(&self.config)?;

        if INITIALIZED
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(LoggingError::AlreadyInitialized);
        }

        let result = Self::install(&self.config).await;
        if result.is_err() {
            INITIALIZED.store(false, Ordering::Release);
        }
        result
    }

    async fn install(config: &LoggerConfig) -> Result<WorkerGuard, LoggingError> {
        TokioFs::create_dir_all(&config.log_dir).await?;

        let rotation = match config.rotation {
            LogRotation::Never => Rotation::NEVER,
            LogRotation::Daily => Rotation::DAILY,
        };

        let file_appender = RollingFileAppender::builder()
            .rotation(rotation)
            .filename_prefix(config.log_file_prefix.as_str())
            .filename_suffix("jsonl")
            .max_log_files(config.max_log_files)
            .build(&config.log_dir)
            .map_err(|e| LoggingError::ConfigError(format!("file appender: {e}")))?;

        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        let directive = Directive::from_str(&config.log_level)
            .map_err(|e| LoggingError::ConfigError(format!("log level: {e}")))?;
        let filter = EnvFilter::from_default_env().add_directive(directive);

        let json_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .with_timer(ChronoUtc::rfc_3339())
            .with_writer(non_blocking);

        tracing_subscriber::registry()
            .with(filter)
            .with(json_layer)
            .try_init()
            .map_err(|e| LoggingError::ConfigError(format!("global subscriber: {e}")))?;

        Ok(guard)
    }
}

pub(crate) fn validate_config(config: &LoggerConfig) -> Result<(), LoggingError> {
    if config.max_log_files == 0 {
        return Err(LoggingError::ConfigError(
            "Max log files must be greater than 0".to_string(),
        ));
    }

    if config.log_file_prefix.is_empty() {
        return Err(LoggingError::ConfigError(
            "Log file prefix must not be empty".to_string(),
        ));
    }

    if Directive::from_str(&config.log_level).is_err() {
        return Err(LoggingError::ConfigError(format!(
            "Invalid log level: {}",
            config.log_level
        )));
    }

    validate_log_directory(&config.log_dir)
}

fn validate_log_directory(path: &Path) -> Result<(), LoggingError> {
    if path.components().count() == 0 {
        return Err(LoggingError::InvalidLogDirectory("Empty path".to_string()));
    }

    if path.components().any(|c| c == Component::ParentDir) {
        return Err(LoggingError::InvalidLogDirectory(
            "Path contains parent directory references".to_string(),
        ));
    }

    Ok(())
}

pub async fn init_logging_with_config(config: LoggerConfig) -> Result<WorkerGuard, LoggingError> {
    LoggerBuilder::new().with_config(config).build().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config_in(dir: &Path) -> LoggerConfig {
        LoggerConfig {
            log_dir: dir.to_path_buf(),
            ..LoggerConfig::default()
        }
    }

    #[test]
    fn test_rejects_parent_references_and_empty_dirs() {
        let mut config = config_in(Path::new("logs/../../etc"));
        assert!(matches!(
            validate_config(&config),
            Err(LoggingError::InvalidLogDirectory(_))
        ));

        config.log_dir = PathBuf::new();
        assert!(matches!(
            validate_config(&config),
            Err(LoggingError::InvalidLogDirectory(_))
        ));
    }

    #[test]
    fn test_rejects_zero_limits_and_bad_levels() {
        let temp_dir = TempDir::new().unwrap();

        let mut config = config_in(temp_dir.path());
        config.max_log_files = 0;
        assert!(matches!(
            validate_config(&config),
            Err(LoggingError::ConfigError(_))
        ));

        let mut config = config_in(temp_dir.path());
        config.log_level = CompactString::const_new("pocketfs_core=verbose");
        assert!(validate_config(&config).is_err());

        let config = config_in(temp_dir.path());
        assert!(validate_config(&config).is_ok());
    }

    #[tokio::test]
    async fn test_second_initialisation_is_refused() {
        let temp_dir = TempDir::new().unwrap();
        let log_dir = temp_dir.path().join("logs");

        let _guard = init_logging_with_config(config_in(&log_dir)).await.unwrap();
        assert!(log_dir.is_dir());

        let second = LoggerBuilder::new()
            .with_config(config_in(&log_dir))
            .with_level("debug")
            .build()
            .await;
        assert!(matches!(second, Err(LoggingError::AlreadyInitialized)));
    }
}
