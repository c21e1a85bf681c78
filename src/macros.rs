//! Logging macros with `format!`-style arguments.
//!
//! The category defaults to the calling module's path; pass
//! `category: "..."` first to override it.
//!
//! # Examples
//!
//! ```
//! use log_dispatcher::prelude::*;
//! use log_dispatcher::{error, info};
//!
//! let sink = MemorySink::new();
//! let session = LogSession::new(
//!     Dispatcher::builder(Logger::new())
//!         .target("memory", Target::new(sink.clone()))
//!         .build()
//!         .unwrap(),
//! );
//!
//! let port = 8080;
//! info!(session, "Server listening on port {}", port);
//! error!(session, category: "app.db", "connection lost after {} retries", 3);
//! session.shutdown();
//!
//! let messages = sink.messages();
//! assert_eq!(messages[0].text(), "Server listening on port 8080");
//! assert_eq!(messages[0].category(), module_path!());
//! assert_eq!(messages[1].category(), "app.db");
//! ```

/// Log at an explicit level.
///
/// # Examples
///
/// ```
/// # use log_dispatcher::prelude::*;
/// # let logger = Logger::builder().flush_interval(0).build();
/// use log_dispatcher::log;
/// log!(logger, LogLevel::Info, "Simple message");
/// log!(logger, LogLevel::Error, category: "http", "Error code: {}", 500);
/// assert_eq!(logger.pending(), 2);
/// # logger.flush(true);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, category: $category:expr, $($arg:tt)+) => {
        $logger.log(format!($($arg)+), $level, $category)
    };
    ($logger:expr, $level:expr, $($arg:tt)+) => {
        $logger.log(format!($($arg)+), $level, module_path!())
    };
}

#[macro_export]
macro_rules! trace {
    ($logger:expr, category: $category:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Trace, category: $category, $($arg)+)
    };
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Trace, $($arg)+)
    };
}

#[macro_export]
macro_rules! info {
    ($logger:expr, category: $category:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Info, category: $category, $($arg)+)
    };
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Info, $($arg)+)
    };
}

#[macro_export]
macro_rules! warning {
    ($logger:expr, category: $category:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Warning, category: $category, $($arg)+)
    };
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Warning, $($arg)+)
    };
}

/// Log an error-level message.
///
/// # Examples
///
/// ```
/// # use log_dispatcher::prelude::*;
/// # let logger = Logger::builder().flush_interval(0).build();
/// use log_dispatcher::error;
/// error!(logger, "Failed to connect to database");
/// error!(logger, category: "app.db", "Error code: {}, message: {}", 500, "Internal error");
/// # logger.flush(true);
/// ```
#[macro_export]
macro_rules! error {
    ($logger:expr, category: $category:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Error, category: $category, $($arg)+)
    };
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Error, $($arg)+)
    };
}

#[cfg(test)]
mod tests {
    use crate::core::logger::Logger;

    #[test]
    fn test_macros_default_category() {
        let logger = Logger::builder().flush_interval(0).build();
        crate::info!(logger, "value {}", 1);
        crate::warning!(logger, "plain");
        crate::trace!(logger, category: "custom", "x={}", 2);
        crate::error!(logger, category: String::from("owned"), "e");
        assert_eq!(logger.pending(), 4);
        logger.flush(true);
    }
}
