//! File logging example
//!
//! Builds a session from a JSON configuration: a rotating text log for the
//! application and a JSON Lines file collecting warnings and errors.
//!
//! Run with: cargo run --example file_logging

use log_dispatcher::prelude::*;

const CONFIG: &str = r#"{
    "flush_interval": 10,
    "trace_level": 1,
    "targets": [
        {
            "name": "application",
            "categories": ["app.*"],
            "sink": { "type": "file", "path": "application.log",
                      "max_file_size": 4096, "max_files": 3 }
        },
        {
            "name": "problems",
            "levels": ["warning", "error"],
            "export_interval": 1,
            "sink": { "type": "json", "path": "problems.jsonl" }
        }
    ]
}"#;

fn main() -> Result<()> {
    println!("=== Log Dispatcher - File Logging Example ===\n");

    let session = DispatcherConfig::from_json(CONFIG)?.build()?;

    println!("1. Logging to application.log and problems.jsonl:");
    session.info("Application started", "app.main");
    session.trace("Loading configuration...", "app.config");
    session.info("Configuration loaded successfully", "app.config");
    session.warning("Using default settings for some options", "app.config");
    session.log_with_metadata(
        "Database connection established",
        LogLevel::Info,
        "app.db",
        Metadata::new().with_field("pool_size", 8),
    );
    session.error("Failed to load optional plugin", "plugins");

    for i in 0..100 {
        session.info(format!("Processing item {}", i), "app.worker");
    }

    let metrics = session.dispatcher().target_metrics("application")?;
    session.shutdown();

    println!("   application target exported {} messages", metrics.exported());
    println!("\n2. Check application.log (and its .1/.2/.3 backups) and problems.jsonl");
    println!("\n=== Example completed successfully! ===");

    Ok(())
}
