//! Console exporter

use crate::core::{
    Export, FailurePolicy, LogLevel, Message, OutputFormat, Result, TimestampFormat,
};
#[cfg(feature = "console")]
use colored::Colorize;
use std::io::Write;
use std::sync::Arc;

/// Writes one line per message; errors go to stderr, everything else to stdout.
pub struct ConsoleSink {
    use_colors: bool,
    output_format: OutputFormat,
    timestamp_format: TimestampFormat,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self {
            use_colors: cfg!(feature = "console"),
            output_format: OutputFormat::default(),
            timestamp_format: TimestampFormat::default(),
        }
    }

    /// Colours apply to text output only, and need the `console` feature
    #[must_use]
    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    /// # Example
    ///
    /// ```
    /// use log_dispatcher::sinks::ConsoleSink;
    /// use log_dispatcher::OutputFormat;
    ///
    /// let sink = ConsoleSink::new().with_output_format(OutputFormat::Json);
    /// ```
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

    fn render(&self, message: &Message) -> String {
        let line = self.output_format.format(message, &self.timestamp_format);

        #[cfg(feature = "console")]
        if self.use_colors && self.output_format == OutputFormat::Text {
            return line.color(message.level().color_code()).to_string();
        }

        line
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new()
    }
}

impl Export for ConsoleSink {
    fn export(&mut self, messages: &[Arc<Message>]) -> Result<()> {
        let stdout = std::io::stdout();
        let stderr = std::io::stderr();
        let mut out = stdout.lock();
        let mut err = stderr.lock();

        for message in messages {
            let line = self.render(message);
            if message.level() == LogLevel::Error {
                writeln!(err, "{}", line)?;
            } else {
                writeln!(out, "{}", line)?;
            }
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        std::io::stdout().flush()?;
        std::io::stderr().flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        "console"
    }

    /// A failed console write is not retried
    fn default_failure_policy(&self) -> FailurePolicy {
        FailurePolicy::DropBatch
    }
}
