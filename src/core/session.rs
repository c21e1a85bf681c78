//! Scoped ownership of a dispatcher and its logger

use super::{dispatcher::Dispatcher, logger::Logger};
use std::ops::Deref;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Runs the final flush when the application is done logging.
///
/// [`LogSession::shutdown`] performs the final flush exactly once; if the
/// owner never calls it, dropping the session does. Logging after shutdown
/// is discarded and counted in [`LoggerMetrics`](super::LoggerMetrics).
///
/// # Example
/// ```
/// use log_dispatcher::prelude::*;
///
/// let sink = MemorySink::new();
/// {
///     let session = LogSession::new(
///         Dispatcher::builder(Logger::new())
///             .target("memory", Target::new(sink.clone()))
///             .build()
///             .unwrap(),
///     );
///     session.warning("low disk", "sys.disk");
/// }
/// assert_eq!(sink.texts(), vec![vec!["low disk"]]);
/// ```
pub struct LogSession {
    dispatcher: Arc<Dispatcher>,
    finished: AtomicBool,
}

impl LogSession {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            dispatcher,
            finished: AtomicBool::new(false),
        }
    }

    pub fn logger(&self) -> &Arc<Logger> {
        self.dispatcher.logger()
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }

    /// Final flush and worker drain. Later calls are no-ops returning `true`.
    ///
    /// Returns `false` if a background worker missed the shutdown timeout.
    pub fn shutdown(&self) -> bool {
        if self.finished.swap(true, Ordering::AcqRel) {
            return true;
        }
        self.logger().finalize()
    }
}

impl Deref for LogSession {
    type Target = Logger;

    fn deref(&self) -> &Logger {
        self.logger()
    }
}

impl Drop for LogSession {
    fn drop(&mut self) {
        if !self.shutdown() {
            eprintln!("[LOGGER WARNING] Log session ended before all batches were delivered");
        }
    }
}

impl std::fmt::Debug for LogSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogSession")
            .field("dispatcher", &self.dispatcher)
            .field("finished", &self.is_finished())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{log_level::LogLevel, target::Target};
    use crate::sinks::MemorySink;

    fn session(sink: &MemorySink) -> LogSession {
        LogSession::new(
            Dispatcher::builder(Logger::new())
                .target("memory", Target::new(sink.clone()))
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn test_shutdown_runs_final_flush_once() {
        let sink = MemorySink::new();
        let session = session(&sink);
        session.log("kept", LogLevel::Info, "app");

        assert!(session.shutdown());
        assert!(session.shutdown());
        assert_eq!(sink.texts(), vec![vec!["kept"]]);
        assert_eq!(sink.flush_count(), 1);

        session.info("too late", "app");
        assert_eq!(session.metrics().discarded_after_shutdown(), 1);
    }

    #[test]
    fn test_drop_flushes() {
        let sink = MemorySink::new();
        {
            let session = session(&sink);
            session.error("boom", "app");
            assert!(!session.is_finished());
        }
        assert_eq!(sink.texts(), vec![vec!["boom"]]);
    }
}
