//! Export trait for log sink implementations

use super::{error::Result, message::Message, policy::FailurePolicy};
use std::sync::Arc;

/// Delivers a target's buffered messages to the underlying medium.
///
/// Formatting, transport and retry are the sink's business; the target only
/// looks at whether `export` succeeded.
pub trait Export: Send {
    fn export(&mut self, messages: &[Arc<Message>]) -> Result<()>;

    /// Push anything the sink buffers internally. Called after the final export.
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str;

    /// Buffer policy a target uses for this sink unless configured otherwise
    fn default_failure_policy(&self) -> FailurePolicy {
        FailurePolicy::default()
    }
}

impl<E: Export + ?Sized> Export for Box<E> {
    fn export(&mut self, messages: &[Arc<Message>]) -> Result<()> {
        (**self).export(messages)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    fn default_failure_policy(&self) -> FailurePolicy {
        (**self).default_failure_policy()
    }
}
