//! TOML configuration file parsing and loading
//!
//! Handles default config file discovery, parsing into typed sections, and
//! merging with command line arguments (defaults < file < command line).

use super::args::Args;
use crate::app::drill::DrillSettings;
use crate::core::logging::{LogFormat, LogSettings};
use serde::Deserialize;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("The specified configuration file does not exist: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Error reading configuration file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Error parsing configuration file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid value for '{field}': {message}")]
    Invalid { field: String, message: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QueueSection {
    pub capacity: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DrillSection {
    pub producers: Option<usize>,
    pub workers: Option<usize>,
    pub messages_per_producer: Option<usize>,
    pub control_every: Option<usize>,
    pub work_delay_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogSection {
    pub level: Option<String>,
    pub format: Option<LogFormat>,
    pub file: Option<PathBuf>,
    pub color: Option<bool>,
}

/// Contents of `pipeline-queue.toml`
///
/// ```toml
/// [queue]
/// capacity = 32
///
/// [drill]
/// producers = 4
/// workers = 8
/// messages_per_producer = 10000
/// control_every = 20
/// work_delay_ms = 0
///
/// [log]
/// level = "debug"
/// format = "ext"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub queue: QueueSection,
    pub drill: DrillSection,
    pub log: LogSection,
}

impl FileConfig {
    /// Parse configuration text; `path` is only used for error messages
    pub fn parse(contents: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
        Self::parse(&contents, path)
    }

    /// `<config dir>/pipeline-queue/pipeline-queue.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("pipeline-queue").join("pipeline-queue.toml"))
    }

    /// Load the explicitly requested file (which must exist), or the default
    /// file when present
    pub async fn discover(
        config_file: Option<PathBuf>,
    ) -> Result<Option<(PathBuf, Self)>, ConfigError> {
        let path = match config_file {
            Some(path) if !path.exists() => return Err(ConfigError::NotFound { path }),
            Some(path) => path,
            None => match Self::default_path() {
                Some(path) if path.exists() => path,
                _ => return Ok(None),
            },
        };

        let config = Self::load(&path).await?;
        Ok(Some((path, config)))
    }
}

/// Fully resolved application settings
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub drill: DrillSettings,
    pub log: LogSettings,
}

impl Settings {
    /// Merge command line arguments over the config file over defaults
    pub fn resolve(args: &Args, file: &FileConfig) -> Result<Self, ConfigError> {
        let defaults = DrillSettings::default();

        let drill = DrillSettings {
            capacity: args
                .capacity
                .or(file.queue.capacity)
                .unwrap_or(defaults.capacity),
            producers: positive(
                "producers",
                args.producers.or(file.drill.producers),
                defaults.producers,
            )?,
            workers: positive(
                "workers",
                args.workers.or(file.drill.workers),
                defaults.workers,
            )?,
            messages_per_producer: args
                .messages_per_producer
                .or(file.drill.messages_per_producer)
                .unwrap_or(defaults.messages_per_producer),
            control_every: args
                .control_every
                .or(file.drill.control_every)
                .unwrap_or(defaults.control_every),
            work_delay: args
                .work_delay_ms
                .or(file.drill.work_delay_ms)
                .map(Duration::from_millis)
                .unwrap_or(defaults.work_delay),
        };

        let level = match args.log_level.clone().or_else(|| file.log.level.clone()) {
            Some(level) => crate::core::validation::validate_log_level(&level).map_err(
                |message| ConfigError::Invalid {
                    field: "log.level".to_string(),
                    message,
                },
            )?,
            None => LogSettings::default().level,
        };

        let format = match &args.log_format {
            Some(format) => format.parse().map_err(|message| ConfigError::Invalid {
                field: "log-format".to_string(),
                message,
            })?,
            None => file.log.format.unwrap_or_default(),
        };

        let color = args
            .color_override()
            .or(file.log.color)
            .unwrap_or_else(|| std::io::stdout().is_terminal());

        let log = LogSettings {
            level,
            format,
            file: args.log_file.clone().or_else(|| file.log.file.clone()),
            color,
        };

        Ok(Self { drill, log })
    }
}

fn positive(field: &str, value: Option<usize>, default: usize) -> Result<usize, ConfigError> {
    match value {
        Some(0) => Err(ConfigError::Invalid {
            field: field.to_string(),
            message: "Value must be greater than 0".to_string(),
        }),
        Some(n) => Ok(n),
        None => Ok(default),
    }
}
