//! JSON Lines exporter
//!
//! Writes each message as one JSON object per line, the shape log
//! aggregation tools such as ELK or Loki ingest directly.

use crate::core::output_format::to_json_object;
use crate::core::{Export, Message, Result, TimestampFormat};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

pub struct JsonSink {
    writer: BufWriter<File>,
    pretty: bool,
    timestamp_format: TimestampFormat,
}

impl JsonSink {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            writer: BufWriter::new(file),
            pretty: false,
            timestamp_format: TimestampFormat::default(),
        })
    }

    /// Multi-line, indented objects; no longer valid JSON Lines
    #[must_use]
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    #[must_use]
    pub fn with_timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.timestamp_format = format;
        self
    }
}

impl Export for JsonSink {
    fn export(&mut self, messages: &[Arc<Message>]) -> Result<()> {
        for message in messages {
            let value = to_json_object(message, &self.timestamp_format);
            let json = if self.pretty {
                serde_json::to_string_pretty(&value)?
            } else {
                serde_json::to_string(&value)?
            };
            writeln!(self.writer, "{}", json)?;
        }
        self.writer.flush()?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        "json"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{LogLevel, Metadata};
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_json_lines() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("app.jsonl");

        let mut sink = JsonSink::new(&path)?;
        let batch: Vec<_> = (0..3)
            .map(|i| {
                Message::new(format!("step {}", i), LogLevel::Info, "app.jobs")
                    .with_metadata(Metadata::new().with_field("step", i))
                    .into_shared()
            })
            .collect();
        sink.export(&batch)?;

        let content = fs::read_to_string(&path)?;
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);

        for (i, line) in lines.iter().enumerate() {
            let parsed: serde_json::Value = serde_json::from_str(line)?;
            assert_eq!(parsed["message"], format!("step {}", i));
            assert_eq!(parsed["category"], "app.jobs");
            assert_eq!(parsed["level"], "info");
            assert_eq!(parsed["step"], i as i64);
        }
        Ok(())
    }

    #[test]
    fn test_pretty_output() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("pretty.json");

        let mut sink = JsonSink::new(&path)?.with_pretty(true);
        sink.export(&[Message::new("hi", LogLevel::Warning, "app").into_shared()])?;

        let content = fs::read_to_string(&path)?;
        assert!(content.lines().count() > 1);
        let parsed: serde_json::Value = serde_json::from_str(&content)?;
        assert_eq!(parsed["level"], "warning");
        Ok(())
    }
}
