//! Background dispatch example
//!
//! Several threads log through one logger while a worker thread delivers the
//! flushed batches. A small queue with `AlertAndDrop` shows the overflow
//! metrics and callback.
//!
//! Run with: cargo run --example background_dispatch

use log_dispatcher::prelude::*;
use std::sync::Arc;
use std::thread;
use std::time::Instant;

fn main() -> Result<()> {
    println!("=== Log Dispatcher - Background Dispatch Example ===\n");

    let logger = Logger::builder()
        .flush_interval(100)
        .dispatch_mode(DispatchMode::Background {
            capacity: 4,
            overflow: OverflowPolicy::AlertAndDrop,
        })
        .on_overflow(Arc::new(|total| {
            println!("   [overflow] {} messages dropped so far", total);
        }))
        .build();

    let sink = MemorySink::new();
    let session = LogSession::new(
        Dispatcher::builder(logger)
            .target("memory", Target::builder(sink.clone()).export_interval(500).build()?)
            .target(
                "errors",
                Target::builder(ConsoleSink::new()).levels([LogLevel::Error]).build()?,
            )
            .build()?,
    );

    println!("1. Logging from 4 threads:");
    let start = Instant::now();
    let handles: Vec<_> = (0..4)
        .map(|t| {
            let logger = Arc::clone(session.logger());
            thread::spawn(move || {
                for i in 0..25_000 {
                    logger.info(format!("thread {} message {}", t, i), "app.worker");
                }
                logger.error(format!("thread {} finished", t), "app.worker");
            })
        })
        .collect();

    for handle in handles {
        let _ = handle.join();
    }
    println!("   logged in {:?}", start.elapsed());

    let delivered_in_time = session.shutdown();
    let metrics = session.metrics();

    println!("\n2. Results:");
    println!("   worker drained in time: {}", delivered_in_time);
    println!("   logged:     {}", metrics.total_logged());
    println!("   delivered:  {}", sink.messages().len());
    println!("   dropped:    {} ({:.2}%)", metrics.dropped_count(), metrics.drop_rate());
    println!("   queue full: {} times", metrics.queue_full_events());
    println!("   error batches kept: {}", metrics.critical_batches_preserved());

    println!("\n=== Example completed successfully! ===");

    Ok(())
}
