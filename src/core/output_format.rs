//! Line formats shared by the console, file and network sinks
//!
//! - Text: `<timestamp> [<level>][<category>] <text> key=value`, followed by
//!   one indented `in <file>:<line> (<function>)` line per trace frame
//! - Json: one JSON object per message
//! - Logfmt: key=value pairs

use super::message::Message;
use super::metadata::FieldValue;
use super::timestamp::TimestampFormat;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Logfmt,
}

impl OutputFormat {
    pub fn format(&self, message: &Message, timestamp_format: &TimestampFormat) -> String {
        match self {
            OutputFormat::Text => format_text(message, timestamp_format),
            OutputFormat::Json => format_json(message, timestamp_format),
            OutputFormat::Logfmt => format_logfmt(message, timestamp_format),
        }
    }
}

/// Keep a multi-line message on one physical line
fn escape_newlines(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('\r', "\\r")
        .replace('\n', "\\n")
}

fn format_text(message: &Message, timestamp_format: &TimestampFormat) -> String {
    let mut line = format!(
        "{} [{}][{}] {}",
        timestamp_format.format(message.timestamp()),
        message.level(),
        message.category(),
        escape_newlines(message.text())
    );

    if !message.metadata().is_empty() {
        line.push(' ');
        line.push_str(&message.metadata().format_fields());
    }

    for frame in message.trace() {
        line.push_str("\n    in ");
        line.push_str(&frame.to_string());
    }

    line
}

/// Message as a JSON object; metadata fields are flattened into it
pub(crate) fn to_json_object(
    message: &Message,
    timestamp_format: &TimestampFormat,
) -> serde_json::Value {
    let mut object = serde_json::Map::new();

    object.insert(
        "timestamp".to_string(),
        timestamp_format.to_json_value(message.timestamp()),
    );
    object.insert("level".to_string(), message.level().to_str().into());
    object.insert("category".to_string(), message.category().into());
    object.insert("message".to_string(), message.text().into());

    if !message.trace().is_empty() {
        let frames = message
            .trace()
            .iter()
            .map(|frame| {
                serde_json::json!({
                    "file": frame.file,
                    "line": frame.line,
                    "function": frame.function,
                })
            })
            .collect();
        object.insert("trace".to_string(), serde_json::Value::Array(frames));
    }

    for (key, value) in message.metadata().iter() {
        object
            .entry(key.clone())
            .or_insert_with(|| value.to_json_value());
    }

    serde_json::Value::Object(object)
}

fn format_json(message: &Message, timestamp_format: &TimestampFormat) -> String {
    serde_json::to_string(&to_json_object(message, timestamp_format)).unwrap_or_default()
}

fn format_logfmt(message: &Message, timestamp_format: &TimestampFormat) -> String {
    let mut parts = vec![
        format!(
            "timestamp={}",
            escape_logfmt_value(&timestamp_format.format(message.timestamp()))
        ),
        format!("level={}", message.level()),
        format!("category={}", escape_logfmt_value(message.category())),
        format!("message={}", quote_logfmt_value(message.text())),
    ];

    if let Some(frame) = message.trace().first() {
        parts.push(format!("caller={}:{}", escape_logfmt_value(&frame.file), frame.line));
    }

    for (key, value) in message.metadata().iter() {
        let formatted = match value {
            FieldValue::String(s) => quote_logfmt_value(s),
            other => other.to_string(),
        };
        parts.push(format!("{}={}", escape_logfmt_key(key), formatted));
    }

    parts.join(" ")
}

fn escape_logfmt_key(key: &str) -> String {
    key.chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-' || *c == '.')
        .collect()
}

fn escape_logfmt_value(value: &str) -> String {
    if value.is_empty() || value.contains([' ', '"', '=', '\n']) {
        quote_logfmt_value(value)
    } else {
        value.to_string()
    }
}

fn quote_logfmt_value(value: &str) -> String {
    format!("\"{}\"", escape_newlines(value).replace('"', "\\\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{call_trace::TraceFrame, log_level::LogLevel, metadata::Metadata};
    use chrono::TimeZone;
    use chrono::Utc;

    fn fixed(message: Message) -> Message {
        message.with_timestamp(Utc.with_ymd_and_hms(2025, 1, 8, 10, 30, 45).unwrap())
    }

    #[test]
    fn test_text_layout() {
        let message = fixed(Message::new("db ok", LogLevel::Info, "app.db"));
        let line = OutputFormat::Text.format(&message, &TimestampFormat::Iso8601);
        assert_eq!(line, "2025-01-08T10:30:45.000Z [info][app.db] db ok");
    }

    #[test]
    fn test_text_escapes_newlines_and_appends_trace() {
        let message = fixed(Message::new("line1\nline2", LogLevel::Error, "sys"))
            .with_metadata(Metadata::new().with_field("code", 7))
            .with_trace(vec![TraceFrame {
                file: "src/main.rs".to_string(),
                line: 12,
                function: "app::main".to_string(),
            }]);
        let text = OutputFormat::Text.format(&message, &TimestampFormat::Unix);

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "1736332245 [error][sys] line1\\nline2 code=7");
        assert_eq!(lines[1], "    in src/main.rs:12 (app::main)");
    }

    #[test]
    fn test_json_format() {
        let message = fixed(Message::new("disk full", LogLevel::Error, "sys.disk"))
            .with_metadata(Metadata::new().with_field("free_mb", 0));
        let line = OutputFormat::Json.format(&message, &TimestampFormat::Iso8601);

        let parsed: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed["level"], "error");
        assert_eq!(parsed["category"], "sys.disk");
        assert_eq!(parsed["message"], "disk full");
        assert_eq!(parsed["free_mb"], 0);
        assert!(parsed.get("trace").is_none());
    }

    #[test]
    fn test_metadata_cannot_shadow_core_fields() {
        let message = Message::new("real", LogLevel::Info, "app")
            .with_metadata(Metadata::new().with_field("message", "fake"));
        let value = to_json_object(&message, &TimestampFormat::Iso8601);
        assert_eq!(value["message"], "real");
    }

    #[test]
    fn test_logfmt_format() {
        let message = fixed(Message::new("query ran", LogLevel::Warning, "app.db"))
            .with_metadata(Metadata::new().with_field("sql", "SELECT 1 WHERE id=1"));
        let line = OutputFormat::Logfmt.format(&message, &TimestampFormat::Iso8601);

        assert!(line.contains("level=warning"));
        assert!(line.contains("category=app.db"));
        assert!(line.contains("message=\"query ran\""));
        assert!(line.contains("sql=\"SELECT 1 WHERE id=1\""));
    }

    #[test]
    fn test_config_names() {
        let format: OutputFormat = serde_json::from_str("\"logfmt\"").unwrap();
        assert_eq!(format, OutputFormat::Logfmt);
        assert_eq!(OutputFormat::default(), OutputFormat::Text);
    }
}
