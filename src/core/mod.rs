//! Core dispatcher types and traits

pub mod call_trace;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod export;
pub mod filter;
pub mod log_level;
pub mod logger;
pub mod message;
pub mod metadata;
pub mod metrics;
pub mod output_format;
pub mod policy;
pub mod session;
pub mod target;
pub mod timestamp;
mod worker;

pub use call_trace::TraceFrame;
pub use config::{DispatcherConfig, SinkConfig, TargetConfig};
pub use dispatcher::{Dispatcher, DispatcherBuilder};
pub use error::{LoggerError, Result};
pub use export::Export;
pub use filter::{CategoryPattern, LevelSet, MessageFilter};
pub use log_level::LogLevel;
pub use logger::{
    DispatchMode, Logger, LoggerBuilder, DEFAULT_FLUSH_INTERVAL, DEFAULT_SHUTDOWN_TIMEOUT,
};
pub use message::Message;
pub use metadata::{FieldValue, Metadata};
pub use metrics::{LoggerMetrics, TargetMetrics};
pub use output_format::OutputFormat;
pub use policy::{FailurePolicy, OverflowCallback, OverflowPolicy, DEFAULT_MAX_RETAINED};
pub use session::LogSession;
pub use target::{Target, TargetBuilder, DEFAULT_EXPORT_INTERVAL};
pub use timestamp::TimestampFormat;
