//! In-memory exporter
//!
//! Records every export call. Clones share the same record, so a handle kept
//! by the caller can inspect what a target exported after the target has
//! been moved into a dispatcher.

use crate::core::{Export, LoggerError, Message, Result};
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Default)]
struct Record {
    exports: Vec<Vec<Arc<Message>>>,
    flushes: usize,
    failing: bool,
}

#[derive(Clone)]
pub struct MemorySink {
    name: String,
    record: Arc<Mutex<Record>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::with_name("memory")
    }

    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            record: Arc::new(Mutex::new(Record::default())),
        }
    }

    /// Make subsequent exports fail with [`LoggerError::ExportFailed`]
    pub fn set_failing(&self, failing: bool) {
        self.record.lock().failing = failing;
    }

    /// Number of successful export calls
    pub fn export_count(&self) -> usize {
        self.record.lock().exports.len()
    }

    /// Every successful export call, in order
    pub fn exports(&self) -> Vec<Vec<Arc<Message>>> {
        self.record.lock().exports.clone()
    }

    /// Message texts per export call
    pub fn texts(&self) -> Vec<Vec<String>> {
        self.record
            .lock()
            .exports
            .iter()
            .map(|batch| batch.iter().map(|m| m.text().to_string()).collect())
            .collect()
    }

    /// All exported messages, flattened in export order
    pub fn messages(&self) -> Vec<Arc<Message>> {
        self.record.lock().exports.concat()
    }

    pub fn flush_count(&self) -> usize {
        self.record.lock().flushes
    }

    pub fn clear(&self) {
        let mut record = self.record.lock();
        record.exports.clear();
        record.flushes = 0;
    }
}

impl Default for MemorySink {
    fn default() -> Self {
        Self::new()
    }
}

impl Export for MemorySink {
    fn export(&mut self, messages: &[Arc<Message>]) -> Result<()> {
        let mut record = self.record.lock();
        if record.failing {
            return Err(LoggerError::export(&self.name, "memory sink set to fail"));
        }
        record.exports.push(messages.to_vec());
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.record.lock().flushes += 1;
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
