//! Fan-out of flushed batches to named targets

use super::{
    error::{LoggerError, Result},
    logger::Logger,
    message::Message,
    metrics::TargetMetrics,
    target::Target,
};
use parking_lot::Mutex;
use std::cell::Cell;
use std::collections::HashMap;
use std::sync::Arc;

thread_local! {
    static DISPATCHING: Cell<bool> = const { Cell::new(false) };
}

/// Whether the current thread is inside [`Dispatcher::dispatch`], e.g. an
/// exporter logging through the logger that feeds it
pub(crate) fn is_dispatching() -> bool {
    DISPATCHING.with(Cell::get)
}

/// Marks the current thread as dispatching until dropped
struct DispatchScope {
    outer: bool,
}

impl DispatchScope {
    fn enter() -> Self {
        Self {
            outer: DISPATCHING.with(|flag| flag.replace(true)),
        }
    }
}

impl Drop for DispatchScope {
    fn drop(&mut self) {
        DISPATCHING.with(|flag| flag.set(self.outer));
    }
}

struct NamedTarget {
    name: String,
    target: Mutex<Target>,
    metrics: Arc<TargetMetrics>,
}

/// Owns the targets and forwards every batch the logger flushes to each
/// enabled target, in declaration order.
///
/// # Example
/// ```
/// use log_dispatcher::prelude::*;
///
/// let sink = MemorySink::new();
/// let dispatcher = Dispatcher::builder(Logger::new())
///     .target("memory", Target::new(sink.clone()))
///     .build()
///     .unwrap();
///
/// dispatcher.logger().info("ready", "app");
/// dispatcher.logger().flush(true);
/// assert_eq!(sink.texts(), vec![vec!["ready"]]);
/// ```
pub struct Dispatcher {
    targets: Vec<NamedTarget>,
    index: HashMap<String, usize>,
    logger: Arc<Logger>,
}

impl Dispatcher {
    /// Build a dispatcher over `targets` and attach it to `logger`.
    ///
    /// Fails on duplicate target names or when the logger cannot start its
    /// dispatch route.
    pub fn new(logger: Arc<Logger>, targets: Vec<(String, Target)>) -> Result<Arc<Self>> {
        let mut index = HashMap::with_capacity(targets.len());
        let mut named = Vec::with_capacity(targets.len());

        for (position, (name, target)) in targets.into_iter().enumerate() {
            if index.insert(name.clone(), position).is_some() {
                return Err(LoggerError::duplicate_target(name));
            }
            named.push(NamedTarget {
                metrics: target.metrics(),
                target: Mutex::new(target),
                name,
            });
        }

        let dispatcher = Arc::new(Self {
            targets: named,
            index,
            logger,
        });
        dispatcher.logger.attach(&dispatcher)?;
        Ok(dispatcher)
    }

    #[must_use]
    pub fn builder(logger: impl Into<Arc<Logger>>) -> DispatcherBuilder {
        DispatcherBuilder::new(logger)
    }

    /// Forward `messages` to every enabled target.
    ///
    /// Each target is isolated: an export error or a panic inside one target
    /// is reported on stderr and the remaining targets still get the batch.
    pub fn dispatch(&self, messages: &[Arc<Message>], is_final: bool) {
        let _scope = DispatchScope::enter();
        for slot in &self.targets {
            let mut target = slot.target.lock();
            if !target.is_enabled() {
                continue;
            }

            let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                target.collect(messages, is_final)
            }));

            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    eprintln!("[LOGGER ERROR] Target '{}' failed: {}", slot.name, e);
                }
                Err(panic_info) => {
                    slot.metrics.record_panic();
                    let panic_msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                        s.to_string()
                    } else if let Some(s) = panic_info.downcast_ref::<String>() {
                        s.clone()
                    } else {
                        "Unknown panic".to_string()
                    };
                    eprintln!(
                        "[LOGGER CRITICAL] Target '{}' panicked: {}. \
                         Other targets continue to function.",
                        slot.name, panic_msg
                    );
                }
            }
        }
    }

    pub fn logger(&self) -> &Arc<Logger> {
        &self.logger
    }

    /// Call-trace depth captured per message; proxies to the logger
    pub fn trace_level(&self) -> usize {
        self.logger.trace_level()
    }

    pub fn set_trace_level(&self, level: usize) {
        self.logger.set_trace_level(level);
    }

    /// Messages accumulated before the logger flushes; proxies to the logger
    pub fn flush_interval(&self) -> usize {
        self.logger.flush_interval()
    }

    pub fn set_flush_interval(&self, interval: usize) {
        self.logger.set_flush_interval(interval);
    }

    /// Target names in declaration order
    pub fn target_names(&self) -> impl Iterator<Item = &str> {
        self.targets.iter().map(|slot| slot.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn set_enabled(&self, name: &str, enabled: bool) -> Result<()> {
        self.with_target(name, |target| target.set_enabled(enabled))
    }

    pub fn is_enabled(&self, name: &str) -> Result<bool> {
        self.with_target(name, |target| target.is_enabled())
    }

    pub fn target_metrics(&self, name: &str) -> Result<Arc<TargetMetrics>> {
        Ok(Arc::clone(&self.slot(name)?.metrics))
    }

    /// Run `f` with exclusive access to the named target
    pub fn with_target<R>(&self, name: &str, f: impl FnOnce(&mut Target) -> R) -> Result<R> {
        let slot = self.slot(name)?;
        let mut target = slot.target.lock();
        Ok(f(&mut target))
    }

    fn slot(&self, name: &str) -> Result<&NamedTarget> {
        self.index
            .get(name)
            .map(|&position| &self.targets[position])
            .ok_or_else(|| LoggerError::unknown_target(name))
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("targets", &self.target_names().collect::<Vec<_>>())
            .finish()
    }
}

/// Builder collecting targets in declaration order
pub struct DispatcherBuilder {
    logger: Arc<Logger>,
    targets: Vec<(String, Target)>,
}

impl DispatcherBuilder {
    pub fn new(logger: impl Into<Arc<Logger>>) -> Self {
        Self {
            logger: logger.into(),
            targets: Vec::new(),
        }
    }

    /// Declare a target; dispatch order follows declaration order
    #[must_use = "builder methods return a new value"]
    pub fn target(mut self, name: impl Into<String>, target: Target) -> Self {
        self.targets.push((name.into(), target));
        self
    }

    pub fn build(self) -> Result<Arc<Dispatcher>> {
        Dispatcher::new(self.logger, self.targets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{export::Export, log_level::LogLevel};
    use crate::sinks::MemorySink;

    struct PanickingSink;

    impl Export for PanickingSink {
        fn export(&mut self, _messages: &[Arc<Message>]) -> Result<()> {
            panic!("sink exploded");
        }

        fn name(&self) -> &str {
            "panicking"
        }
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let result = Dispatcher::builder(Logger::new())
            .target("a", Target::new(MemorySink::new()))
            .target("a", Target::new(MemorySink::new()))
            .build();
        assert!(matches!(result, Err(LoggerError::DuplicateTarget { .. })));
    }

    #[test]
    fn test_declaration_order_preserved() {
        let dispatcher = Dispatcher::builder(Logger::new())
            .target("zeta", Target::new(MemorySink::new()))
            .target("alpha", Target::new(MemorySink::new()))
            .target("mid", Target::new(MemorySink::new()))
            .build()
            .unwrap();
        let names: Vec<_> = dispatcher.target_names().collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_disabled_target_receives_nothing() {
        let sink = MemorySink::new();
        let dispatcher = Dispatcher::builder(Logger::new())
            .target("off", Target::new(sink.clone()))
            .build()
            .unwrap();
        dispatcher.set_enabled("off", false).unwrap();

        let batch = vec![Message::new("x", LogLevel::Error, "app").into_shared()];
        dispatcher.dispatch(&batch, true);

        assert_eq!(sink.export_count(), 0);
        assert_eq!(sink.flush_count(), 0);
        assert_eq!(dispatcher.target_metrics("off").unwrap().collected(), 0);
    }

    #[test]
    fn test_panic_isolated() {
        let sink = MemorySink::new();
        let dispatcher = Dispatcher::builder(Logger::new())
            .target("boom", Target::new(PanickingSink))
            .target("ok", Target::new(sink.clone()))
            .build()
            .unwrap();

        let batch = vec![Message::new("x", LogLevel::Info, "app").into_shared()];
        dispatcher.dispatch(&batch, true);

        assert_eq!(sink.texts(), vec![vec!["x"]]);
        assert_eq!(dispatcher.target_metrics("boom").unwrap().panics(), 1);
    }

    #[test]
    fn test_dispatch_scope_restores_flag() {
        assert!(!is_dispatching());
        {
            let _outer = DispatchScope::enter();
            {
                let _inner = DispatchScope::enter();
                assert!(is_dispatching());
            }
            assert!(is_dispatching());
        }
        assert!(!is_dispatching());
    }

    #[test]
    fn test_logger_attaches_once() {
        let sink = MemorySink::new();
        let logger = Arc::new(Logger::new());
        let first = Dispatcher::builder(Arc::clone(&logger))
            .target("memory", Target::new(sink.clone()))
            .build()
            .unwrap();
        let second = Dispatcher::builder(Arc::clone(&logger)).build();
        assert!(matches!(
            second,
            Err(LoggerError::InvalidConfiguration { .. })
        ));

        // The first dispatcher keeps receiving batches.
        logger.info("still routed", "app");
        logger.flush(true);
        assert_eq!(sink.texts(), vec![vec!["still routed"]]);
        assert_eq!(first.len(), 1);
    }

    #[test]
    fn test_unknown_target() {
        let dispatcher = Dispatcher::builder(Logger::new()).build().unwrap();
        assert!(dispatcher.is_empty());
        assert!(matches!(
            dispatcher.set_enabled("missing", true),
            Err(LoggerError::UnknownTarget { .. })
        ));
    }

    #[test]
    fn test_properties_proxy_to_logger() {
        let dispatcher = Dispatcher::builder(Logger::new()).build().unwrap();
        dispatcher.set_trace_level(3);
        dispatcher.set_flush_interval(10);
        assert_eq!(dispatcher.logger().trace_level(), 3);
        assert_eq!(dispatcher.logger().flush_interval(), 10);
        assert_eq!(dispatcher.trace_level(), 3);
        assert_eq!(dispatcher.flush_interval(), 10);
    }
}
