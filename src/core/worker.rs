//! Background dispatch worker
//!
//! Flushed batches are moved over a bounded channel to a dedicated thread
//! that calls [`Dispatcher::dispatch`]. The producer's next buffer never
//! aliases a batch in flight.

use super::{dispatcher::Dispatcher, error::Result, message::Message};
use crossbeam_channel::{bounded, Sender};
use std::sync::{Arc, Weak};
use std::thread;
use std::time::{Duration, Instant};

/// One flushed batch on its way to the dispatcher
pub(crate) struct Batch {
    pub messages: Vec<Arc<Message>>,
    pub is_final: bool,
}

impl Batch {
    /// Whether the batch carries error-level messages
    pub fn is_critical(&self) -> bool {
        self.messages
            .iter()
            .any(|m| m.level() == super::log_level::LogLevel::Error)
    }
}

pub(crate) struct DispatchWorker {
    sender: Option<Sender<Batch>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl DispatchWorker {
    pub fn spawn(capacity: usize, dispatcher: Weak<Dispatcher>) -> Result<Self> {
        let (sender, receiver) = bounded::<Batch>(capacity.max(1));

        let handle = thread::Builder::new()
            .name("log-dispatch".to_string())
            .spawn(move || {
                for batch in receiver.iter() {
                    match dispatcher.upgrade() {
                        Some(dispatcher) => dispatcher.dispatch(&batch.messages, batch.is_final),
                        None => {
                            eprintln!(
                                "[LOGGER WARNING] Dispatcher dropped, {} messages discarded",
                                batch.messages.len()
                            );
                        }
                    }
                }
            })?;

        Ok(Self {
            sender: Some(sender),
            handle: Some(handle),
        })
    }

    pub fn sender(&self) -> Option<Sender<Batch>> {
        self.sender.clone()
    }

    /// Close the queue and wait for the worker to drain it
    ///
    /// Returns `false` if the worker did not finish within `timeout` or
    /// panicked.
    pub fn shutdown(&mut self, timeout: Duration) -> bool {
        drop(self.sender.take());

        let Some(handle) = self.handle.take() else {
            return true;
        };

        // Dropping the last dispatcher reference on the worker thread lands here.
        if handle.thread().id() == thread::current().id() {
            return true;
        }

        let start = Instant::now();
        loop {
            if handle.is_finished() {
                if let Err(e) = handle.join() {
                    eprintln!(
                        "[LOGGER ERROR] Dispatch worker panicked during shutdown: {:?}",
                        e
                    );
                    return false;
                }
                return true;
            }

            if start.elapsed() >= timeout {
                eprintln!(
                    "[LOGGER WARNING] Dispatch worker did not finish within {:?} timeout. \
                     Some logs may be lost.",
                    timeout
                );
                return false;
            }

            thread::sleep(Duration::from_millis(10));
        }
    }
}

impl Drop for DispatchWorker {
    fn drop(&mut self) {
        if self.handle.is_some() {
            self.shutdown(super::logger::DEFAULT_SHUTDOWN_TIMEOUT);
        }
    }
}
