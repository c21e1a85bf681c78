//! Basic dispatcher usage example
//!
//! Routes messages to two console targets with different level and category
//! filters.
//!
//! Run with: cargo run --example basic_usage

use log_dispatcher::prelude::*;
use log_dispatcher::{info, warning};

fn main() -> Result<()> {
    println!("=== Log Dispatcher - Basic Usage Example ===\n");

    let dispatcher = Dispatcher::builder(Logger::builder().flush_interval(2).build())
        .target(
            "app",
            Target::builder(ConsoleSink::new())
                .levels([LogLevel::Info, LogLevel::Warning, LogLevel::Trace])
                .categories(["app.*"])
                .except(["app.secret.*"])
                .export_interval(1)
                .build()?,
        )
        .target(
            "alerts",
            Target::builder(ConsoleSink::new().with_output_format(OutputFormat::Logfmt))
                .levels([LogLevel::Error])
                .export_interval(1)
                .build()?,
        )
        .build()?;
    let session = LogSession::new(dispatcher);

    println!("1. Messages routed by level and category:");
    session.info("database connection established", "app.db");
    session.trace("cache warmed", "app.cache");
    session.info("api key loaded", "app.secret.keys");
    session.error("disk full", "sys.disk");

    println!("\n2. Macros default the category to the module path:");
    info!(session, category: "app.http", "listening on port {}", 8080);
    warning!(session, category: "app.http", "slow request took {}ms", 1250);

    println!("\n3. Disabling a target at runtime:");
    session.dispatcher().set_enabled("app", false)?;
    session.info("nobody sees this", "app.db");
    session.error("alerts still work", "sys.net");

    session.shutdown();
    println!("\n=== Example completed successfully! ===");

    Ok(())
}
