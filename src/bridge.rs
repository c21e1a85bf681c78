//! Bridge from the [`log`] facade into a [`Logger`]
//!
//! The record's target becomes the category. `Debug` and `Trace` both map to
//! [`LogLevel::Trace`].

use crate::core::{LogLevel, Logger, LoggerError, Message, Result, TraceFrame};
use std::sync::Arc;

pub struct LogBridge {
    logger: Arc<Logger>,
}

impl LogBridge {
    pub fn new(logger: Arc<Logger>) -> Self {
        Self { logger }
    }

    /// Install as the global `log` logger
    pub fn init(logger: Arc<Logger>, max_level: log::LevelFilter) -> Result<()> {
        log::set_boxed_logger(Box::new(Self::new(logger)))
            .map_err(|e| LoggerError::config("log bridge", e.to_string()))?;
        log::set_max_level(max_level);
        Ok(())
    }
}

fn map_level(level: log::Level) -> LogLevel {
    match level {
        log::Level::Error => LogLevel::Error,
        log::Level::Warn => LogLevel::Warning,
        log::Level::Info => LogLevel::Info,
        log::Level::Debug | log::Level::Trace => LogLevel::Trace,
    }
}

impl log::Log for LogBridge {
    fn enabled(&self, _metadata: &log::Metadata) -> bool {
        !self.logger.is_closed()
    }

    fn log(&self, record: &log::Record) {
        let mut message = Message::new(
            record.args().to_string(),
            map_level(record.level()),
            record.target(),
        );

        // A captured backtrace would start inside the `log` crate; the record
        // already knows the call site.
        if self.logger.trace_level() > 0 {
            if let (Some(file), Some(line)) = (record.file(), record.line()) {
                message = message.with_trace(vec![TraceFrame {
                    file: file.to_string(),
                    line,
                    function: record.module_path().unwrap_or_default().to_string(),
                }]);
            }
        }

        self.logger.log_message(message);
    }

    fn flush(&self) {
        self.logger.flush(false);
    }
}
