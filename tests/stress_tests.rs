//! Stress tests for concurrent logging and background dispatch
//!
//! These tests verify:
//! - No message is lost or duplicated when many threads log concurrently
//! - Background dispatch drains every queued batch on shutdown
//! - Error batches survive a full background queue
//! - Overflow drops are counted and reported through the callback
//! - A final flush racing producers still delivers everything logged before it

use log_dispatcher::prelude::*;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Exporter that sleeps on every export to keep the background queue full
struct SlowSink {
    inner: MemorySink,
    delay: Duration,
}

impl Export for SlowSink {
    fn export(&mut self, messages: &[Arc<Message>]) -> Result<()> {
        thread::sleep(self.delay);
        self.inner.export(messages)
    }

    fn name(&self) -> &str {
        "slow"
    }
}

fn log_from_threads(logger: &Arc<Logger>, threads: usize, per_thread: usize) {
    let handles: Vec<_> = (0..threads)
        .map(|t| {
            let logger = Arc::clone(logger);
            thread::spawn(move || {
                for i in 0..per_thread {
                    logger.info(format!("{}-{}", t, i), "stress");
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("logging thread panicked");
    }
}

#[test]
fn test_concurrent_sync_logging_loses_nothing() {
    let sink = MemorySink::new();
    let session = LogSession::new(
        Dispatcher::builder(Logger::builder().flush_interval(7).build())
            .target(
                "all",
                Target::builder(sink.clone()).export_interval(13).build().unwrap(),
            )
            .build()
            .unwrap(),
    );

    log_from_threads(session.logger(), 8, 500);
    assert!(session.shutdown());

    let texts: Vec<String> = sink.messages().iter().map(|m| m.text().to_string()).collect();
    assert_eq!(texts.len(), 8 * 500);
    let unique: HashSet<&String> = texts.iter().collect();
    assert_eq!(unique.len(), texts.len(), "duplicate messages exported");
    assert_eq!(session.metrics().total_logged(), 4000);
}

#[test]
fn test_per_thread_order_preserved() {
    let sink = MemorySink::new();
    let session = LogSession::new(
        Dispatcher::builder(Logger::builder().flush_interval(1).build())
            .target("all", Target::builder(sink.clone()).export_interval(1).build().unwrap())
            .build()
            .unwrap(),
    );

    log_from_threads(session.logger(), 4, 200);
    session.shutdown();

    // With one message per flush, each thread's messages arrive in the order
    // that thread logged them.
    let mut last_seen = [None::<usize>; 4];
    for message in sink.messages() {
        let (thread_id, index) = message.text().split_once('-').unwrap();
        let thread_id: usize = thread_id.parse().unwrap();
        let index: usize = index.parse().unwrap();
        if let Some(previous) = last_seen[thread_id] {
            assert!(index > previous, "thread {} out of order", thread_id);
        }
        last_seen[thread_id] = Some(index);
    }
}

#[test]
fn test_background_dispatch_drains_on_shutdown() {
    let sink = MemorySink::new();
    let session = LogSession::new(
        Dispatcher::builder(
            Logger::builder()
                .flush_interval(50)
                .dispatch_mode(DispatchMode::Background {
                    capacity: 1024,
                    overflow: OverflowPolicy::Block,
                })
                .build(),
        )
        .target("all", Target::builder(sink.clone()).export_interval(100).build().unwrap())
        .build()
        .unwrap(),
    );

    log_from_threads(session.logger(), 4, 1000);
    assert!(session.shutdown(), "worker missed the shutdown timeout");

    assert_eq!(sink.messages().len(), 4000);
    assert_eq!(session.metrics().dropped_count(), 0);
}

#[test]
fn test_error_batches_survive_full_queue() {
    let sink = MemorySink::new();
    let dropped = Arc::new(AtomicU64::new(0));
    let observed = Arc::clone(&dropped);

    let session = LogSession::new(
        Dispatcher::builder(
            Logger::builder()
                .flush_interval(1)
                .dispatch_mode(DispatchMode::Background {
                    capacity: 1,
                    overflow: OverflowPolicy::DropNewest,
                })
                .on_overflow(Arc::new(move |total| {
                    observed.store(total, Ordering::Relaxed);
                }))
                .build(),
        )
        .target(
            "slow",
            Target::builder(SlowSink {
                inner: MemorySink::new(),
                delay: Duration::from_millis(5),
            })
            .export_interval(1)
            .build()
            .unwrap(),
        )
        .target(
            "errors",
            Target::builder(sink.clone())
                .levels([LogLevel::Error])
                .export_interval(1)
                .build()
                .unwrap(),
        )
        .build()
        .unwrap(),
    );

    for i in 0..200 {
        session.trace(format!("noise {}", i), "stress");
        if i % 20 == 0 {
            session.error(format!("critical {}", i), "stress");
        }
    }
    assert!(session.shutdown());

    let errors: Vec<String> = sink.messages().iter().map(|m| m.text().to_string()).collect();
    assert_eq!(errors.len(), 10, "an error-level message was dropped");

    let metrics = session.metrics();
    assert!(metrics.queue_full_events() > 0);
    assert!(metrics.dropped_count() > 0);
    // DropNewest stays silent; the callback is for AlertAndDrop.
    assert_eq!(dropped.load(Ordering::Relaxed), 0);
}

#[test]
fn test_alert_and_drop_invokes_callback() {
    let dropped = Arc::new(AtomicU64::new(0));
    let observed = Arc::clone(&dropped);

    let session = LogSession::new(
        Dispatcher::builder(
            Logger::builder()
                .flush_interval(1)
                .dispatch_mode(DispatchMode::Background {
                    capacity: 1,
                    overflow: OverflowPolicy::AlertAndDrop,
                })
                .on_overflow(Arc::new(move |total| {
                    observed.store(total, Ordering::Relaxed);
                }))
                .build(),
        )
        .target(
            "slow",
            Target::builder(SlowSink {
                inner: MemorySink::new(),
                delay: Duration::from_millis(20),
            })
            .export_interval(1)
            .build()
            .unwrap(),
        )
        .build()
        .unwrap(),
    );

    for i in 0..50 {
        session.info(format!("burst {}", i), "stress");
    }
    session.shutdown();

    assert!(session.metrics().dropped_count() > 0);
    assert!(dropped.load(Ordering::Relaxed) >= 1);
}

/// Log from `threads` producers while `close` runs part-way through, then
/// check that every accepted message was exported exactly once.
fn race_final_flush(session: &LogSession, sink: &MemorySink, close: impl FnOnce()) {
    let threads = 6;
    let per_thread = 300;
    let handles: Vec<_> = (0..threads)
        .map(|t| {
            let logger = Arc::clone(session.logger());
            thread::spawn(move || {
                for i in 0..per_thread {
                    let level = if i % 7 == 0 { LogLevel::Error } else { LogLevel::Info };
                    logger.log(format!("{}-{}", t, i), level, "stress");
                }
            })
        })
        .collect();

    thread::sleep(Duration::from_millis(1));
    close();
    for handle in handles {
        handle.join().expect("logging thread panicked");
    }

    let metrics = session.metrics();
    assert_eq!(
        metrics.total_logged() + metrics.discarded_after_shutdown(),
        (threads * per_thread) as u64
    );
    assert_eq!(sink.messages().len() as u64, metrics.total_logged());
}

#[test]
fn test_final_flush_racing_sync_producers() {
    for _ in 0..20 {
        let sink = MemorySink::new();
        let session = LogSession::new(
            Dispatcher::builder(Logger::builder().flush_interval(3).build())
                .target("all", Target::builder(sink.clone()).export_interval(0).build().unwrap())
                .build()
                .unwrap(),
        );

        race_final_flush(&session, &sink, || session.logger().flush(true));
    }
}

#[test]
fn test_final_flush_racing_background_producers() {
    for _ in 0..20 {
        let sink = MemorySink::new();
        let session = LogSession::new(
            Dispatcher::builder(
                Logger::builder()
                    .flush_interval(3)
                    .dispatch_mode(DispatchMode::Background {
                        capacity: 2,
                        overflow: OverflowPolicy::Block,
                    })
                    .build(),
            )
            .target("all", Target::builder(sink.clone()).export_interval(0).build().unwrap())
            .build()
            .unwrap(),
        );

        race_final_flush(&session, &sink, || {
            assert!(session.shutdown());
        });
    }
}
