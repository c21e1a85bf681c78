//! Log message record

use super::call_trace::TraceFrame;
use super::log_level::LogLevel;
use super::metadata::Metadata;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::sync::Arc;

/// One log event. Built once, then shared read-only as `Arc<Message>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    text: String,
    level: LogLevel,
    category: String,
    timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    trace: Vec<TraceFrame>,
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    metadata: Metadata,
}

impl Message {
    pub fn new(text: impl Into<String>, level: LogLevel, category: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            level,
            category: category.into(),
            timestamp: Utc::now(),
            trace: Vec::new(),
            metadata: Metadata::new(),
        }
    }

    /// Build a message from an error value: its display text followed by
    /// every `source()` in the chain.
    pub fn from_error(error: &dyn Error, level: LogLevel, category: impl Into<String>) -> Self {
        Self::new(error_text(error), level, category)
    }

    pub fn with_trace(mut self, trace: Vec<TraceFrame>) -> Self {
        self.trace = trace;
        self
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Freeze into the shared form handed to targets
    pub fn into_shared(self) -> Arc<Message> {
        Arc::new(self)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn timestamp(&self) -> &DateTime<Utc> {
        &self.timestamp
    }

    pub fn trace(&self) -> &[TraceFrame] {
        &self.trace
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }
}

/// Render an error and its source chain as one string
pub fn error_text(error: &dyn Error) -> String {
    let mut text = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        text.push_str("\nCaused by: ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    text
}
