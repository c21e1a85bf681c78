//! TCP exporter for centralized logging
//!
//! Each export sends the batch as newline-delimited text in a single write.
//! A broken connection is re-established once per export and the whole
//! batch resent; if that fails too the target keeps the batch for the next
//! export.

use crate::core::{Export, LoggerError, Message, OutputFormat, Result, TimestampFormat};
use std::io::Write;
use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

const IO_TIMEOUT: Duration = Duration::from_secs(5);

/// # Example
///
/// ```no_run
/// use log_dispatcher::prelude::*;
/// use log_dispatcher::sinks::NetworkSink;
///
/// let sink = NetworkSink::new("127.0.0.1:5140").expect("log server reachable");
/// let session = LogSession::new(
///     Dispatcher::builder(Logger::new())
///         .target("remote", Target::new(sink))
///         .build()
///         .unwrap(),
/// );
/// session.info("shipped to 127.0.0.1:5140", "app");
/// ```
pub struct NetworkSink {
    stream: Option<TcpStream>,
    address: String,
    reconnect_on_error: bool,
    output_format: OutputFormat,
    timestamp_format: TimestampFormat,
}

impl NetworkSink {
    /// Connect to `address`, e.g. `"localhost:5140"`
    ///
    /// # Errors
    ///
    /// Returns error if connection fails
    pub fn new(address: impl Into<String>) -> Result<Self> {
        let address = address.into();
        let stream = connect(&address)?;

        Ok(Self {
            stream: Some(stream),
            address,
            reconnect_on_error: true,
            output_format: OutputFormat::default(),
            timestamp_format: TimestampFormat::default(),
        })
    }

    /// Default: enabled
    #[must_use]
    pub fn with_reconnect(mut self, enable: bool) -> Self {
        self.reconnect_on_error = enable;
        self
    }

    #[must_use]
    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    #[must_use]
    pub fn with_timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.timestamp_format = format;
        self
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    fn send(&mut self, payload: &[u8]) -> std::io::Result<()> {
        match self.stream {
            Some(ref mut stream) => stream.write_all(payload),
            None => Err(std::io::Error::new(
                std::io::ErrorKind::NotConnected,
                "network stream not connected",
            )),
        }
    }
}

fn connect(address: &str) -> Result<TcpStream> {
    let stream = TcpStream::connect(address).map_err(|e| {
        LoggerError::io_operation("connecting to log server", address.to_string(), e)
    })?;
    stream.set_write_timeout(Some(IO_TIMEOUT))?;
    stream.set_read_timeout(Some(IO_TIMEOUT))?;
    stream.set_nodelay(true)?;
    Ok(stream)
}

impl Export for NetworkSink {
    fn export(&mut self, messages: &[Arc<Message>]) -> Result<()> {
        let mut payload = String::new();
        for message in messages {
            payload.push_str(&self.output_format.format(message, &self.timestamp_format));
            payload.push('\n');
        }

        let first = match self.send(payload.as_bytes()) {
            Ok(()) => return Ok(()),
            Err(e) => e,
        };
        self.stream = None;

        if !self.reconnect_on_error {
            return Err(LoggerError::export("network", first.to_string()));
        }

        match connect(&self.address) {
            Ok(stream) => {
                self.stream = Some(stream);
                self.send(payload.as_bytes()).map_err(|e| {
                    self.stream = None;
                    LoggerError::export("network", format!("resend failed: {}", e))
                })
            }
            Err(reconnect_err) => Err(LoggerError::export(
                "network",
                format!(
                    "Failed to send log and reconnect: {} (reconnect: {})",
                    first, reconnect_err
                ),
            )),
        }
    }

    fn flush(&mut self) -> Result<()> {
        if let Some(ref mut stream) = self.stream {
            stream.flush()?;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "network"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::LogLevel;
    use std::io::{BufRead, BufReader};
    use std::net::TcpListener;

    #[test]
    fn test_connection_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let address = listener.local_addr().unwrap().to_string();
        drop(listener);

        assert!(NetworkSink::new(address).is_err());
    }

    #[test]
    fn test_sends_newline_delimited_batch() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let address = listener.local_addr().unwrap().to_string();

        let mut sink = NetworkSink::new(&address).unwrap();
        let (socket, _) = listener.accept().unwrap();

        let batch = vec![
            Message::new("one", LogLevel::Info, "net").into_shared(),
            Message::new("two", LogLevel::Error, "net").into_shared(),
        ];
        sink.export(&batch).unwrap();
        sink.flush().unwrap();

        let mut reader = BufReader::new(socket);
        let mut first = String::new();
        let mut second = String::new();
        reader.read_line(&mut first).unwrap();
        reader.read_line(&mut second).unwrap();
        assert!(first.trim_end().ends_with("[info][net] one"));
        assert!(second.trim_end().ends_with("[error][net] two"));
    }

    #[test]
    fn test_export_without_connection() {
        let mut sink = NetworkSink {
            stream: None,
            address: "127.0.0.1:9".to_string(),
            reconnect_on_error: false,
            output_format: OutputFormat::Text,
            timestamp_format: TimestampFormat::default(),
        };

        let batch = vec![Message::new("lost", LogLevel::Info, "net").into_shared()];
        assert!(matches!(
            sink.export(&batch),
            Err(LoggerError::ExportFailed { .. })
        ));
    }
}
