//! Filtered, buffered log target
//!
//! A target keeps the messages that pass its [`MessageFilter`] and hands them
//! to its exporter once `export_interval` messages have accumulated, or on
//! the final collect. What stays in the buffer after a failed export is
//! decided by the target's [`FailurePolicy`].

use super::{
    error::Result,
    export::Export,
    filter::{parse_patterns, CategoryPattern, LevelSet, MessageFilter},
    log_level::LogLevel,
    message::Message,
    metrics::TargetMetrics,
    policy::FailurePolicy,
};
use std::fmt;
use std::sync::Arc;

/// Buffered messages that trigger an export when no interval is configured
pub const DEFAULT_EXPORT_INTERVAL: usize = 1000;

pub struct Target {
    enabled: bool,
    filter: MessageFilter,
    buffer: Vec<Arc<Message>>,
    export_interval: usize,
    failure_policy: FailurePolicy,
    exporter: Box<dyn Export>,
    metrics: Arc<TargetMetrics>,
}

impl Target {
    /// Target that accepts every message and uses the exporter's failure policy
    pub fn new<E: Export + 'static>(exporter: E) -> Self {
        Self::with_filter(exporter, MessageFilter::new())
    }

    pub fn with_filter<E: Export + 'static>(exporter: E, filter: MessageFilter) -> Self {
        let failure_policy = exporter.default_failure_policy();
        Self {
            enabled: true,
            filter,
            buffer: Vec::new(),
            export_interval: DEFAULT_EXPORT_INTERVAL,
            failure_policy,
            exporter: Box::new(exporter),
            metrics: Arc::new(TargetMetrics::new()),
        }
    }

    /// Builder taking textual category patterns, validated on `build`
    #[must_use]
    pub fn builder<E: Export + 'static>(exporter: E) -> TargetBuilder {
        TargetBuilder::new(exporter)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn filter(&self) -> &MessageFilter {
        &self.filter
    }

    pub fn export_interval(&self) -> usize {
        self.export_interval
    }

    pub fn set_export_interval(&mut self, interval: usize) {
        self.export_interval = interval;
    }

    pub fn failure_policy(&self) -> FailurePolicy {
        self.failure_policy
    }

    pub fn set_failure_policy(&mut self, policy: FailurePolicy) {
        self.failure_policy = policy;
    }

    /// Messages waiting for the next export
    pub fn buffered(&self) -> &[Arc<Message>] {
        &self.buffer
    }

    pub fn exporter_name(&self) -> &str {
        self.exporter.name()
    }

    pub fn metrics(&self) -> Arc<TargetMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Filter `messages` into the buffer and export when due.
    ///
    /// The buffer is exported when it is non-empty and either `is_final` is set
    /// or it holds at least `export_interval` messages (interval 0 exports
    /// only on `is_final`). The returned error is the export failure, after the
    /// failure policy has been applied to the buffer.
    pub fn collect(&mut self, messages: &[Arc<Message>], is_final: bool) -> Result<()> {
        let before = self.buffer.len();
        self.buffer.extend(
            messages
                .iter()
                .filter(|message| self.filter.matches(message))
                .cloned(),
        );
        self.metrics.record_collected(self.buffer.len() - before);

        let count = self.buffer.len();
        let due = is_final || (self.export_interval > 0 && count >= self.export_interval);
        let exported = if count > 0 && due {
            self.export_buffer()
        } else {
            Ok(())
        };

        // The final flush reaches the exporter even when the last export failed.
        if is_final {
            let flushed = self.exporter.flush();
            exported?;
            flushed?;
            Ok(())
        } else {
            exported
        }
    }

    fn export_buffer(&mut self) -> Result<()> {
        match self.exporter.export(&self.buffer) {
            Ok(()) => {
                self.metrics.record_export(self.buffer.len());
                self.buffer.clear();
                Ok(())
            }
            Err(e) => {
                self.metrics.record_failure();
                self.apply_failure_policy();
                Err(e)
            }
        }
    }

    fn apply_failure_policy(&mut self) {
        match self.failure_policy {
            FailurePolicy::DropBatch => {
                self.metrics.record_dropped(self.buffer.len());
                self.buffer.clear();
            }
            FailurePolicy::Retain { max_messages } => {
                if self.buffer.len() > max_messages {
                    let excess = self.buffer.len() - max_messages;
                    self.buffer.drain(..excess);
                    self.metrics.record_dropped(excess);
                }
            }
        }
    }
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Target")
            .field("exporter", &self.exporter.name())
            .field("enabled", &self.enabled)
            .field("filter", &self.filter)
            .field("buffered", &self.buffer.len())
            .field("export_interval", &self.export_interval)
            .field("failure_policy", &self.failure_policy)
            .finish()
    }
}

/// Builder for [`Target`]
///
/// # Example
/// ```
/// use log_dispatcher::prelude::*;
///
/// let target = Target::builder(MemorySink::new())
///     .levels([LogLevel::Error, LogLevel::Warning])
///     .categories(["app.*"])
///     .except(["app.secret.*"])
///     .export_interval(100)
///     .build()
///     .unwrap();
/// assert_eq!(target.export_interval(), 100);
/// ```
pub struct TargetBuilder {
    exporter: Box<dyn Export>,
    enabled: bool,
    levels: LevelSet,
    categories: Vec<String>,
    except: Vec<String>,
    export_interval: usize,
    failure_policy: Option<FailurePolicy>,
}

impl TargetBuilder {
    pub fn new<E: Export + 'static>(exporter: E) -> Self {
        Self {
            exporter: Box::new(exporter),
            enabled: true,
            levels: LevelSet::empty(),
            categories: Vec::new(),
            except: Vec::new(),
            export_interval: DEFAULT_EXPORT_INTERVAL,
            failure_policy: None,
        }
    }

    #[must_use = "builder methods return a new value"]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn levels(mut self, levels: impl IntoIterator<Item = LogLevel>) -> Self {
        self.levels = levels.into_iter().collect();
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn categories<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = patterns.into_iter().map(Into::into).collect();
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn except<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.except = patterns.into_iter().map(Into::into).collect();
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn export_interval(mut self, interval: usize) -> Self {
        self.export_interval = interval;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = Some(policy);
        self
    }

    /// Validate the category patterns and build the target
    pub fn build(self) -> Result<Target> {
        let categories: Vec<CategoryPattern> = parse_patterns(&self.categories)?;
        let except: Vec<CategoryPattern> = parse_patterns(&self.except)?;
        let failure_policy = self
            .failure_policy
            .unwrap_or_else(|| self.exporter.default_failure_policy());

        Ok(Target {
            enabled: self.enabled,
            filter: MessageFilter {
                levels: self.levels,
                categories,
                except,
            },
            buffer: Vec::new(),
            export_interval: self.export_interval,
            failure_policy,
            exporter: self.exporter,
            metrics: Arc::new(TargetMetrics::new()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::LoggerError;
    use crate::sinks::MemorySink;

    fn batch(items: &[(&str, LogLevel, &str)]) -> Vec<Arc<Message>> {
        items
            .iter()
            .map(|(text, level, category)| Message::new(*text, *level, *category).into_shared())
            .collect()
    }

    #[test]
    fn test_collect_filters_and_buffers() {
        let sink = MemorySink::new();
        let mut target = Target::builder(sink.clone())
            .levels([LogLevel::Info])
            .categories(["app.*"])
            .export_interval(0)
            .build()
            .unwrap();

        target
            .collect(
                &batch(&[
                    ("keep", LogLevel::Info, "app.db"),
                    ("wrong level", LogLevel::Error, "app.db"),
                    ("wrong category", LogLevel::Info, "sys"),
                ]),
                false,
            )
            .unwrap();

        assert_eq!(target.buffered().len(), 1);
        assert_eq!(sink.export_count(), 0);
    }

    #[test]
    fn test_export_interval_threshold() {
        let sink = MemorySink::new();
        let mut target = Target::builder(sink.clone())
            .export_interval(3)
            .build()
            .unwrap();

        target.collect(&batch(&[("a", LogLevel::Info, "x"), ("b", LogLevel::Info, "x")]), false).unwrap();
        assert_eq!(sink.export_count(), 0);

        target.collect(&batch(&[("c", LogLevel::Info, "x")]), false).unwrap();
        assert_eq!(sink.export_count(), 1);
        assert!(target.buffered().is_empty());
        assert_eq!(sink.texts(), vec![vec!["a", "b", "c"]]);
    }

    #[test]
    fn test_final_exports_previously_buffered() {
        let sink = MemorySink::new();
        let mut target = Target::builder(sink.clone()).export_interval(0).build().unwrap();

        target.collect(&batch(&[("a", LogLevel::Info, "x")]), false).unwrap();
        target.collect(&batch(&[("b", LogLevel::Trace, "x")]), false).unwrap();
        target.collect(&[], true).unwrap();

        assert_eq!(sink.texts(), vec![vec!["a", "b"]]);
        assert_eq!(sink.flush_count(), 1);
    }

    #[test]
    fn test_final_with_empty_buffer_does_not_export() {
        let sink = MemorySink::new();
        let mut target = Target::new(sink.clone());
        target.collect(&[], true).unwrap();
        assert_eq!(sink.export_count(), 0);
        assert_eq!(sink.flush_count(), 1);
    }

    #[test]
    fn test_failure_retains_bounded() {
        let sink = MemorySink::new();
        sink.set_failing(true);
        let mut target = Target::builder(sink.clone())
            .export_interval(1)
            .failure_policy(FailurePolicy::Retain { max_messages: 2 })
            .build()
            .unwrap();

        for text in ["a", "b", "c"] {
            let result = target.collect(&batch(&[(text, LogLevel::Info, "x")]), false);
            assert!(matches!(result, Err(LoggerError::ExportFailed { .. })));
        }
        let kept: Vec<_> = target.buffered().iter().map(|m| m.text().to_string()).collect();
        assert_eq!(kept, vec!["b", "c"]);
        assert_eq!(target.metrics().dropped(), 1);

        sink.set_failing(false);
        target.collect(&[], true).unwrap();
        assert_eq!(sink.texts(), vec![vec!["b", "c"]]);
    }

    #[test]
    fn test_failed_final_export_still_flushes() {
        let sink = MemorySink::new();
        sink.set_failing(true);
        let mut target = Target::builder(sink.clone()).export_interval(0).build().unwrap();

        let result = target.collect(&batch(&[("last", LogLevel::Error, "x")]), true);
        assert!(matches!(result, Err(LoggerError::ExportFailed { .. })));
        assert_eq!(sink.flush_count(), 1);
        assert_eq!(target.buffered().len(), 1);
    }

    #[test]
    fn test_failure_drop_batch() {
        let sink = MemorySink::new();
        sink.set_failing(true);
        let mut target = Target::builder(sink.clone())
            .export_interval(2)
            .failure_policy(FailurePolicy::DropBatch)
            .build()
            .unwrap();

        let result = target.collect(
            &batch(&[("a", LogLevel::Info, "x"), ("b", LogLevel::Info, "x")]),
            false,
        );
        assert!(result.is_err());
        assert!(target.buffered().is_empty());
        assert_eq!(target.metrics().dropped(), 2);
        assert_eq!(target.metrics().export_failures(), 1);
    }

    #[test]
    fn test_builder_rejects_bad_pattern() {
        let result = Target::builder(MemorySink::new()).categories(["a*b"]).build();
        assert!(matches!(result, Err(LoggerError::InvalidPattern { .. })));
    }
}
