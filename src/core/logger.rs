//! Message accumulation and flush handoff

use super::{
    call_trace,
    dispatcher::{self, Dispatcher},
    error::{LoggerError, Result},
    log_level::LogLevel,
    message::Message,
    metadata::Metadata,
    metrics::LoggerMetrics,
    policy::{OverflowCallback, OverflowPolicy},
    worker::{Batch, DispatchWorker},
};
use crossbeam_channel::{SendTimeoutError, Sender, TrySendError};
use parking_lot::{Condvar, Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::mem;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

/// Default shutdown timeout for draining the background worker (5 seconds)
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Messages accumulated before an automatic flush
pub const DEFAULT_FLUSH_INTERVAL: usize = 1000;

/// Where flushed batches are dispatched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DispatchMode {
    /// Dispatch on the thread that triggered the flush
    Sync,

    /// Queue batches for a worker thread
    Background {
        capacity: usize,
        #[serde(default)]
        overflow: OverflowPolicy,
    },
}

impl Default for DispatchMode {
    fn default() -> Self {
        DispatchMode::Sync
    }
}

#[derive(Clone)]
enum Route {
    Detached,
    Inline(Weak<Dispatcher>),
    Background {
        sender: Sender<Batch>,
        dispatcher: Weak<Dispatcher>,
    },
}

#[derive(Default)]
struct Buffer {
    messages: Vec<Arc<Message>>,
    closed: bool,
    next_ticket: u64,
}

impl Buffer {
    /// Swap the messages out, numbering the batch in hand-off order
    fn take(&mut self, is_final: bool) -> (u64, Batch) {
        let ticket = self.next_ticket;
        self.next_ticket += 1;
        let batch = Batch {
            messages: mem::take(&mut self.messages),
            is_final,
        };
        (ticket, batch)
    }
}

/// Lets the next ticket through when the current hand-off ends, unwinding
/// included
struct Turn<'a> {
    logger: &'a Logger,
    ticket: u64,
}

impl Drop for Turn<'_> {
    fn drop(&mut self) {
        *self.logger.turn.lock() = self.ticket + 1;
        self.logger.turn_changed.notify_all();
    }
}

/// Accumulates messages and hands them to the attached [`Dispatcher`] every
/// `flush_interval` messages and on the final flush.
///
/// Appending, the threshold check and the buffer swap happen under one lock;
/// the swapped-out batch is dispatched after the lock is released, so
/// messages logged meanwhile land in a fresh buffer. Batches reach the
/// dispatch route in the order they were swapped out, so the final flush is
/// always the last batch targets see.
///
/// A thread that is already dispatching (an exporter logging through this
/// logger) only appends; its messages go out with the next flush.
pub struct Logger {
    buffer: Mutex<Buffer>,
    turn: Mutex<u64>,
    turn_changed: Condvar,
    flush_interval: AtomicUsize,
    trace_level: AtomicUsize,
    route: RwLock<Route>,
    worker: Mutex<Option<DispatchWorker>>,
    mode: DispatchMode,
    shutdown_timeout: Duration,
    metrics: Arc<LoggerMetrics>,
    on_overflow: Option<OverflowCallback>,
    warned_closed: AtomicBool,
}

impl Logger {
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    #[must_use]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }

    pub fn flush_interval(&self) -> usize {
        self.flush_interval.load(Ordering::Relaxed)
    }

    pub fn set_flush_interval(&self, interval: usize) {
        self.flush_interval.store(interval, Ordering::Relaxed);
    }

    pub fn trace_level(&self) -> usize {
        self.trace_level.load(Ordering::Relaxed)
    }

    pub fn set_trace_level(&self, level: usize) {
        self.trace_level.store(level, Ordering::Relaxed);
    }

    pub fn mode(&self) -> DispatchMode {
        self.mode
    }

    pub fn shutdown_timeout(&self) -> Duration {
        self.shutdown_timeout
    }

    pub fn metrics(&self) -> &LoggerMetrics {
        &self.metrics
    }

    /// Messages logged but not yet flushed
    pub fn pending(&self) -> usize {
        self.buffer.lock().messages.len()
    }

    /// Whether the final flush has happened
    pub fn is_closed(&self) -> bool {
        self.buffer.lock().closed
    }

    /// Route flushed batches to `dispatcher`, starting the background worker
    /// when the logger runs in background mode.
    ///
    /// A logger feeds a single dispatcher; attaching it again is an error.
    pub(crate) fn attach(&self, dispatcher: &Arc<Dispatcher>) -> Result<()> {
        let mut route = self.route.write();
        if !matches!(*route, Route::Detached) {
            return Err(LoggerError::config(
                "logger",
                "already attached to a dispatcher",
            ));
        }

        let weak = Arc::downgrade(dispatcher);
        *route = match self.mode {
            DispatchMode::Sync => Route::Inline(weak),
            DispatchMode::Background { capacity, .. } => {
                let worker = DispatchWorker::spawn(capacity, weak.clone())?;
                let sender = worker.sender().ok_or(LoggerError::ChannelSendError)?;
                *self.worker.lock() = Some(worker);
                Route::Background {
                    sender,
                    dispatcher: weak,
                }
            }
        };
        Ok(())
    }

    /// Record a message. Never fails; after the final flush messages are
    /// discarded and counted.
    pub fn log(&self, text: impl Into<String>, level: LogLevel, category: impl Into<String>) {
        self.log_with_metadata(text, level, category, Metadata::new());
    }

    pub fn log_with_metadata(
        &self,
        text: impl Into<String>,
        level: LogLevel,
        category: impl Into<String>,
        metadata: Metadata,
    ) {
        let trace = call_trace::capture(self.trace_level());
        let message = Message::new(text, level, category)
            .with_trace(trace)
            .with_metadata(metadata);
        self.push(message.into_shared());
    }

    /// Record a message built elsewhere, e.g. with [`Message::from_error`]
    pub fn log_message(&self, message: Message) {
        self.push(message.into_shared());
    }

    #[inline]
    pub fn error(&self, text: impl Into<String>, category: impl Into<String>) {
        self.log(text, LogLevel::Error, category);
    }

    #[inline]
    pub fn warning(&self, text: impl Into<String>, category: impl Into<String>) {
        self.log(text, LogLevel::Warning, category);
    }

    #[inline]
    pub fn info(&self, text: impl Into<String>, category: impl Into<String>) {
        self.log(text, LogLevel::Info, category);
    }

    #[inline]
    pub fn trace(&self, text: impl Into<String>, category: impl Into<String>) {
        self.log(text, LogLevel::Trace, category);
    }

    fn push(&self, message: Arc<Message>) {
        let handoff = {
            let mut buffer = self.buffer.lock();
            if buffer.closed {
                drop(buffer);
                self.record_after_close();
                return;
            }

            buffer.messages.push(message);
            self.metrics.record_logged();

            let interval = self.flush_interval();
            let due = interval > 0 && buffer.messages.len() >= interval;
            if due && !dispatcher::is_dispatching() {
                Some(buffer.take(false))
            } else {
                None
            }
        };

        if let Some((ticket, batch)) = handoff {
            self.hand_off(ticket, batch);
        }
    }

    /// Hand the current buffer to the dispatcher.
    ///
    /// `is_final` marks the last flush: targets export whatever they still
    /// hold and the logger stops accepting messages. Use [`Logger::finalize`]
    /// to also wait for a background worker.
    ///
    /// Called from inside a dispatch (by an exporter) this does nothing: the
    /// buffer is left for the next flush outside it.
    pub fn flush(&self, is_final: bool) {
        if dispatcher::is_dispatching() {
            if is_final {
                eprintln!("[LOGGER WARNING] Final flush requested during dispatch was skipped");
            }
            return;
        }

        let (ticket, batch) = {
            let mut buffer = self.buffer.lock();
            if buffer.closed {
                return;
            }
            buffer.closed = is_final;
            buffer.take(is_final)
        };

        self.hand_off(ticket, batch);
    }

    /// Final flush, then drain and stop the background worker.
    ///
    /// Returns `false` if the worker did not finish within the shutdown
    /// timeout.
    pub fn finalize(&self) -> bool {
        self.flush(true);

        *self.route.write() = Route::Detached;
        match self.worker.lock().take() {
            Some(mut worker) => worker.shutdown(self.shutdown_timeout),
            None => true,
        }
    }

    /// Wait until every earlier batch has been routed, then route this one
    fn hand_off(&self, ticket: u64, batch: Batch) {
        {
            let mut turn = self.turn.lock();
            while *turn != ticket {
                self.turn_changed.wait(&mut turn);
            }
        }
        let _turn = Turn {
            logger: self,
            ticket,
        };
        self.route_batch(batch);
    }

    fn route_batch(&self, batch: Batch) {
        self.metrics.record_flush();
        let route = self.route.read().clone();

        match route {
            Route::Detached => {
                if !batch.messages.is_empty() {
                    self.alert_and_drop(batch.messages.len(), "no dispatcher attached");
                }
            }
            Route::Inline(dispatcher) => Self::dispatch_inline(&dispatcher, batch),
            Route::Background { sender, dispatcher } => {
                if batch.is_final {
                    if let Err(e) = sender.send(batch) {
                        // Worker already gone; deliver on this thread instead.
                        Self::dispatch_inline(&dispatcher, e.into_inner());
                    }
                    return;
                }

                match sender.try_send(batch) {
                    Ok(()) => {}
                    Err(TrySendError::Full(batch)) => self.handle_overflow(&sender, &dispatcher, batch),
                    Err(TrySendError::Disconnected(batch)) => {
                        self.alert_and_drop(batch.messages.len(), "dispatch worker stopped");
                    }
                }
            }
        }
    }

    fn dispatch_inline(dispatcher: &Weak<Dispatcher>, batch: Batch) {
        match dispatcher.upgrade() {
            Some(dispatcher) => dispatcher.dispatch(&batch.messages, batch.is_final),
            None => eprintln!(
                "[LOGGER WARNING] Dispatcher dropped, {} messages discarded",
                batch.messages.len()
            ),
        }
    }

    /// Handle a full background queue based on the configured policy
    fn handle_overflow(&self, sender: &Sender<Batch>, dispatcher: &Weak<Dispatcher>, batch: Batch) {
        self.metrics.record_queue_full();

        // Batches with errors are never dropped: deliver them on this thread.
        if batch.is_critical() {
            self.metrics.record_critical_preserved();
            Self::dispatch_inline(dispatcher, batch);
            return;
        }

        let policy = match self.mode {
            DispatchMode::Background { overflow, .. } => overflow,
            DispatchMode::Sync => OverflowPolicy::default(),
        };

        match policy {
            OverflowPolicy::DropNewest => {
                self.metrics.record_dropped(batch.messages.len() as u64);
            }
            OverflowPolicy::Block => {
                self.metrics.record_block();
                if let Err(e) = sender.send(batch) {
                    self.alert_and_drop(e.into_inner().messages.len(), "dispatch worker stopped");
                }
            }
            OverflowPolicy::BlockWithTimeout(timeout) => {
                self.metrics.record_block();
                match sender.send_timeout(batch, timeout) {
                    Ok(()) => {}
                    Err(SendTimeoutError::Timeout(batch)) => {
                        self.alert_and_drop(batch.messages.len(), "queue full after timeout");
                    }
                    Err(SendTimeoutError::Disconnected(batch)) => {
                        self.alert_and_drop(batch.messages.len(), "dispatch worker stopped");
                    }
                }
            }
            OverflowPolicy::AlertAndDrop => {
                self.alert_and_drop(batch.messages.len(), "queue full");
            }
        }
    }

    /// Drop `count` messages, alerting on the first drop and every 1000 after
    fn alert_and_drop(&self, count: usize, reason: &str) {
        let count = count as u64;
        let previous = self.metrics.record_dropped(count);
        let total = previous + count;

        if previous == 0 || previous / 1000 != total / 1000 {
            eprintln!(
                "[LOGGER WARNING] {}: {} logs dropped. \
                 Consider increasing queue capacity or using a different overflow policy.",
                reason, total
            );

            if let Some(ref callback) = self.on_overflow {
                callback(total);
            }
        }
    }

    fn record_after_close(&self) {
        self.metrics.record_discarded();
        if !self.warned_closed.swap(true, Ordering::Relaxed) {
            eprintln!("[LOGGER WARNING] Message logged after final flush was discarded");
        }
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        *self.route.get_mut() = Route::Detached;
        if let Some(mut worker) = self.worker.get_mut().take() {
            worker.shutdown(self.shutdown_timeout);
        }

        let buffer = self.buffer.get_mut();
        if !buffer.closed && !buffer.messages.is_empty() {
            eprintln!(
                "[LOGGER WARNING] Logger dropped without a final flush, {} messages lost",
                buffer.messages.len()
            );
        }
    }
}

/// Builder for constructing Logger with a fluent API
///
/// # Example
/// ```
/// use log_dispatcher::prelude::*;
/// use std::sync::Arc;
///
/// let logger = Logger::builder()
///     .flush_interval(100)
///     .trace_level(3)
///     .dispatch_mode(DispatchMode::Background {
///         capacity: 64,
///         overflow: OverflowPolicy::AlertAndDrop,
///     })
///     .on_overflow(Arc::new(|count| {
///         eprintln!("ALERT: {} logs dropped", count);
///     }))
///     .build();
/// assert_eq!(logger.flush_interval(), 100);
/// ```
pub struct LoggerBuilder {
    flush_interval: usize,
    trace_level: usize,
    mode: DispatchMode,
    shutdown_timeout: Duration,
    on_overflow: Option<OverflowCallback>,
}

impl LoggerBuilder {
    pub fn new() -> Self {
        Self {
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            trace_level: 0,
            mode: DispatchMode::Sync,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
            on_overflow: None,
        }
    }

    /// Messages accumulated before an automatic flush; 0 flushes only on
    /// explicit calls
    #[must_use = "builder methods return a new value"]
    pub fn flush_interval(mut self, interval: usize) -> Self {
        self.flush_interval = interval;
        self
    }

    /// Call frames captured per message; 0 disables trace capture
    #[must_use = "builder methods return a new value"]
    pub fn trace_level(mut self, level: usize) -> Self {
        self.trace_level = level;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn dispatch_mode(mut self, mode: DispatchMode) -> Self {
        self.mode = mode;
        self
    }

    /// Enable background dispatch with a queue of `capacity` batches
    #[must_use = "builder methods return a new value"]
    pub fn background(mut self, capacity: usize) -> Self {
        self.mode = DispatchMode::Background {
            capacity,
            overflow: OverflowPolicy::default(),
        };
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Set a callback for drop notifications
    ///
    /// The parameter is the total count of dropped messages.
    #[must_use = "builder methods return a new value"]
    pub fn on_overflow(mut self, callback: OverflowCallback) -> Self {
        self.on_overflow = Some(callback);
        self
    }

    pub fn build(self) -> Logger {
        Logger {
            buffer: Mutex::new(Buffer::default()),
            turn: Mutex::new(0),
            turn_changed: Condvar::new(),
            flush_interval: AtomicUsize::new(self.flush_interval),
            trace_level: AtomicUsize::new(self.trace_level),
            route: RwLock::new(Route::Detached),
            worker: Mutex::new(None),
            mode: self.mode,
            shutdown_timeout: self.shutdown_timeout,
            metrics: Arc::new(LoggerMetrics::new()),
            on_overflow: self.on_overflow,
            warned_closed: AtomicBool::new(false),
        }
    }
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
