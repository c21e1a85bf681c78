//! # Log Dispatcher
//!
//! Buffered, filtered fan-out of application log messages to named targets.
//!
//! A [`Logger`] accumulates messages and flushes them in batches to a
//! [`Dispatcher`], which hands every batch to each enabled [`Target`] in
//! declaration order. A target keeps the messages its level and category
//! filters accept and exports them through a sink once enough have
//! accumulated, or on the final flush.
//!
//! ## Features
//!
//! - **Category patterns**: exact names or `prefix*` wildcards, with exclusions
//! - **Isolation**: a failing or panicking sink never affects its siblings
//! - **Background dispatch**: optional worker thread with overflow policies
//! - **Sinks**: console, file with rotation, JSON Lines, TCP and in-memory
//!
//! ```
//! use log_dispatcher::prelude::*;
//!
//! let file = MemorySink::new();
//! let email = MemorySink::new();
//! let session = LogSession::new(
//!     Dispatcher::builder(Logger::new())
//!         .target(
//!             "file",
//!             Target::builder(file.clone())
//!                 .levels([LogLevel::Info, LogLevel::Trace])
//!                 .categories(["app.*"])
//!                 .build()
//!                 .unwrap(),
//!         )
//!         .target(
//!             "email",
//!             Target::builder(email.clone())
//!                 .levels([LogLevel::Error])
//!                 .build()
//!                 .unwrap(),
//!         )
//!         .build()
//!         .unwrap(),
//! );
//!
//! session.info("db ok", "app.db");
//! session.error("disk full", "sys.disk");
//! session.shutdown();
//!
//! assert_eq!(file.texts(), vec![vec!["db ok"]]);
//! assert_eq!(email.texts(), vec![vec!["disk full"]]);
//! ```

#[cfg(feature = "log")]
pub mod bridge;
pub mod core;
pub mod macros;
pub mod sinks;

pub mod prelude {
    pub use crate::core::{
        CategoryPattern, DispatchMode, Dispatcher, DispatcherBuilder, DispatcherConfig, Export,
        FailurePolicy, FieldValue, LevelSet, LogLevel, LogSession, Logger, LoggerBuilder,
        LoggerError, LoggerMetrics, Message, MessageFilter, Metadata, OutputFormat,
        OverflowCallback, OverflowPolicy, Result, SinkConfig, Target, TargetBuilder,
        TargetConfig, TargetMetrics, TimestampFormat, DEFAULT_SHUTDOWN_TIMEOUT,
    };
    pub use crate::sinks::{ConsoleSink, FileSink, JsonSink, MemorySink, NetworkSink};
}

#[cfg(feature = "log")]
pub use crate::bridge::LogBridge;
pub use crate::core::{
    CategoryPattern, DispatchMode, Dispatcher, DispatcherBuilder, DispatcherConfig, Export,
    FailurePolicy, FieldValue, LevelSet, LogLevel, LogSession, Logger, LoggerBuilder, LoggerError,
    LoggerMetrics, Message, MessageFilter, Metadata, OutputFormat, OverflowCallback,
    OverflowPolicy, Result, SinkConfig, Target, TargetBuilder, TargetConfig, TargetMetrics,
    TimestampFormat, TraceFrame, DEFAULT_SHUTDOWN_TIMEOUT,
};
pub use crate::sinks::{ConsoleSink, FileSink, JsonSink, MemorySink, NetworkSink};
