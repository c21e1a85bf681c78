//! Declarative dispatcher configuration
//!
//! A [`DispatcherConfig`] is deserialized once (usually from JSON), validated,
//! and resolved into a logger, its targets and their sinks. Nothing is
//! re-read afterwards; runtime changes go through [`Dispatcher`].
//!
//! ```json
//! {
//!   "flush_interval": 100,
//!   "targets": [
//!     { "name": "file", "levels": ["info", "trace"], "categories": ["app.*"],
//!       "sink": { "type": "file", "path": "/var/log/app.log" } },
//!     { "name": "console", "levels": ["error"],
//!       "sink": { "type": "console" } }
//!   ]
//! }
//! ```

use super::{
    dispatcher::Dispatcher,
    error::{LoggerError, Result},
    export::Export,
    filter::parse_patterns,
    log_level::LogLevel,
    logger::{DispatchMode, Logger, DEFAULT_FLUSH_INTERVAL, DEFAULT_SHUTDOWN_TIMEOUT},
    output_format::OutputFormat,
    policy::FailurePolicy,
    session::LogSession,
    target::{Target, DEFAULT_EXPORT_INTERVAL},
    timestamp::TimestampFormat,
};
use crate::sinks::{ConsoleSink, FileSink, JsonSink, MemorySink, NetworkSink};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

fn default_true() -> bool {
    true
}

fn default_flush_interval() -> usize {
    DEFAULT_FLUSH_INTERVAL
}

fn default_export_interval() -> usize {
    DEFAULT_EXPORT_INTERVAL
}

fn default_shutdown_timeout_ms() -> u64 {
    DEFAULT_SHUTDOWN_TIMEOUT.as_millis() as u64
}

fn default_max_files() -> usize {
    crate::sinks::file::DEFAULT_MAX_FILES
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatcherConfig {
    #[serde(default = "default_flush_interval")]
    pub flush_interval: usize,

    #[serde(default)]
    pub trace_level: usize,

    #[serde(default)]
    pub mode: DispatchMode,

    #[serde(default = "default_shutdown_timeout_ms")]
    pub shutdown_timeout_ms: u64,

    /// Dispatch order follows list order
    #[serde(default)]
    pub targets: Vec<TargetConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetConfig {
    pub name: String,

    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub levels: Vec<LogLevel>,

    #[serde(default)]
    pub categories: Vec<String>,

    #[serde(default)]
    pub except: Vec<String>,

    #[serde(default = "default_export_interval")]
    pub export_interval: usize,

    /// Falls back to the sink's own default when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_policy: Option<FailurePolicy>,

    pub sink: SinkConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SinkConfig {
    Console {
        #[serde(default = "default_true")]
        colors: bool,
        #[serde(default)]
        format: OutputFormat,
        #[serde(default)]
        timestamp: TimestampFormat,
    },
    File {
        path: PathBuf,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_file_size: Option<u64>,
        #[serde(default = "default_max_files")]
        max_files: usize,
        #[serde(default = "default_true")]
        lock: bool,
        #[serde(default)]
        format: OutputFormat,
        #[serde(default)]
        timestamp: TimestampFormat,
    },
    Json {
        path: PathBuf,
        #[serde(default)]
        pretty: bool,
        #[serde(default)]
        timestamp: TimestampFormat,
    },
    Network {
        address: String,
        #[serde(default = "default_true")]
        reconnect: bool,
        #[serde(default)]
        format: OutputFormat,
    },
    Memory,
}

impl SinkConfig {
    /// Open the sink this entry describes
    pub fn open(&self, target_name: &str) -> Result<Box<dyn Export>> {
        Ok(match self {
            SinkConfig::Console {
                colors,
                format,
                timestamp,
            } => Box::new(
                ConsoleSink::new()
                    .with_colors(*colors)
                    .with_output_format(*format)
                    .with_timestamp_format(timestamp.clone()),
            ),
            SinkConfig::File {
                path,
                max_file_size,
                max_files,
                lock,
                format,
                timestamp,
            } => {
                let mut sink = FileSink::new(path)?
                    .with_lock(*lock)
                    .with_output_format(*format)
                    .with_timestamp_format(timestamp.clone());
                if let Some(max_bytes) = max_file_size {
                    sink = sink.with_rotation(*max_bytes, *max_files);
                }
                Box::new(sink)
            }
            SinkConfig::Json {
                path,
                pretty,
                timestamp,
            } => Box::new(
                JsonSink::new(path)?
                    .with_pretty(*pretty)
                    .with_timestamp_format(timestamp.clone()),
            ),
            SinkConfig::Network {
                address,
                reconnect,
                format,
            } => Box::new(
                NetworkSink::new(address.as_str())?
                    .with_reconnect(*reconnect)
                    .with_output_format(*format),
            ),
            SinkConfig::Memory => Box::new(MemorySink::with_name(target_name)),
        })
    }

    fn validate(&self, target_name: &str) -> Result<()> {
        let component = format!("target '{}'", target_name);
        match self {
            SinkConfig::File {
                path, max_file_size, ..
            } => {
                check_path(&component, path)?;
                if *max_file_size == Some(0) {
                    return Err(LoggerError::config(component, "max_file_size must be positive"));
                }
            }
            SinkConfig::Json { path, .. } => check_path(&component, path)?,
            SinkConfig::Network { address, .. } if address.trim().is_empty() => {
                return Err(LoggerError::config(component, "network address is empty"));
            }
            _ => {}
        }
        Ok(())
    }
}

fn check_path(component: &str, path: &Path) -> Result<()> {
    if path.as_os_str().is_empty() {
        return Err(LoggerError::config(component, "sink path is empty"));
    }
    Ok(())
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            trace_level: 0,
            mode: DispatchMode::Sync,
            shutdown_timeout_ms: default_shutdown_timeout_ms(),
            targets: Vec::new(),
        }
    }
}

impl DispatcherConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            LoggerError::io_operation("reading configuration", path.display().to_string(), e)
        })?;
        Self::from_json(&json)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check everything that can be checked without touching sinks
    pub fn validate(&self) -> Result<()> {
        if let DispatchMode::Background { capacity: 0, .. } = self.mode {
            return Err(LoggerError::config(
                "mode",
                "background queue capacity must be positive",
            ));
        }

        let mut seen = HashSet::new();
        for target in &self.targets {
            if target.name.trim().is_empty() {
                return Err(LoggerError::config("targets", "target name is empty"));
            }
            if !seen.insert(target.name.as_str()) {
                return Err(LoggerError::duplicate_target(&target.name));
            }
            parse_patterns(&target.categories)?;
            parse_patterns(&target.except)?;
            target.sink.validate(&target.name)?;
        }
        Ok(())
    }

    /// Validate, open every sink and start the session
    pub fn build(self) -> Result<LogSession> {
        self.build_with(|name, sink| sink.open(name))
    }

    /// Like [`build`](Self::build), with `open_sink` deciding which exporter
    /// backs each target
    pub fn build_with<F>(self, mut open_sink: F) -> Result<LogSession>
    where
        F: FnMut(&str, &SinkConfig) -> Result<Box<dyn Export>>,
    {
        self.validate()?;

        let logger = Logger::builder()
            .flush_interval(self.flush_interval)
            .trace_level(self.trace_level)
            .dispatch_mode(self.mode)
            .shutdown_timeout(Duration::from_millis(self.shutdown_timeout_ms))
            .build();

        let mut targets = Vec::with_capacity(self.targets.len());
        for config in self.targets {
            let exporter = open_sink(&config.name, &config.sink)?;
            let mut builder = Target::builder(exporter)
                .enabled(config.enabled)
                .levels(config.levels)
                .categories(config.categories)
                .except(config.except)
                .export_interval(config.export_interval);
            if let Some(policy) = config.failure_policy {
                builder = builder.failure_policy(policy);
            }
            targets.push((config.name, builder.build()?));
        }

        let dispatcher = Dispatcher::new(Arc::new(logger), targets)?;
        Ok(LogSession::new(dispatcher))
    }
}
