//! Exporter implementations

pub mod console;
pub mod file;
pub mod json;
pub mod memory;
pub mod network;

pub use console::ConsoleSink;
pub use file::FileSink;
pub use json::JsonSink;
pub use memory::MemorySink;
pub use network::NetworkSink;

pub use crate::core::Export;
