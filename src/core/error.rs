//! Error types for the dispatcher

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// IO error with context
    #[error("IO error while {operation}: {message}")]
    IoOperation {
        operation: String,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization or configuration parse error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// Category pattern that cannot be matched
    #[error("Invalid category pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// Two targets declared under the same name
    #[error("Duplicate target name '{name}'")]
    DuplicateTarget { name: String },

    /// Lookup of a target name that was never declared
    #[error("Unknown target '{name}'")]
    UnknownTarget { name: String },

    /// A sink refused or failed to deliver a batch
    #[error("Export to target '{target}' failed: {message}")]
    ExportFailed { target: String, message: String },

    /// File sink error with path
    #[error("File sink error for '{path}': {message}")]
    FileSinkError { path: String, message: String },

    /// File rotation error
    #[error("File rotation failed for '{path}': {message}")]
    FileRotationError { path: String, message: String },

    /// File lock error
    #[error("Failed to acquire file lock on '{path}'")]
    FileLockError { path: String },

    /// Writer error (generic)
    #[error("Writer error: {0}")]
    WriterError(String),

    /// Channel send error
    #[error("Failed to send batch to dispatch worker")]
    ChannelSendError,
}

impl LoggerError {
    /// Create an IO operation error with context
    pub fn io_operation(
        operation: impl Into<String>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        LoggerError::IoOperation {
            operation: operation.into(),
            message: message.into(),
            source,
        }
    }

    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create an invalid pattern error
    pub fn pattern(pattern: impl Into<String>, reason: impl Into<String>) -> Self {
        LoggerError::InvalidPattern {
            pattern: pattern.into(),
            reason: reason.into(),
        }
    }

    pub fn duplicate_target(name: impl Into<String>) -> Self {
        LoggerError::DuplicateTarget { name: name.into() }
    }

    pub fn unknown_target(name: impl Into<String>) -> Self {
        LoggerError::UnknownTarget { name: name.into() }
    }

    /// Create an export failure for a named target
    pub fn export(target: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::ExportFailed {
            target: target.into(),
            message: message.into(),
        }
    }

    /// Create a file sink error
    pub fn file_sink(path: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::FileSinkError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a file rotation error
    pub fn file_rotation(path: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::FileRotationError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a file lock error
    pub fn file_lock(path: impl Into<String>) -> Self {
        LoggerError::FileLockError { path: path.into() }
    }

    /// Create a writer error (generic)
    pub fn writer<S: Into<String>>(msg: S) -> Self {
        LoggerError::WriterError(msg.into())
    }

    /// Whether this error was raised while resolving configuration
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            LoggerError::InvalidConfiguration { .. }
                | LoggerError::InvalidPattern { .. }
                | LoggerError::DuplicateTarget { .. }
                | LoggerError::UnknownTarget { .. }
                | LoggerError::JsonError(_)
        )
    }
}
