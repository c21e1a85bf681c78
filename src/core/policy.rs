//! Policies for export failures and background queue overflow
//!
//! [`FailurePolicy`] bounds how much a target keeps after its sink fails, so a
//! sink that stays down cannot grow the buffer without limit.
//! [`OverflowPolicy`] decides what happens to a flushed batch when the
//! background dispatch queue is full.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Default cap on messages a target retains across failed exports
pub const DEFAULT_MAX_RETAINED: usize = 10_000;

/// What a target does with its buffer when an export fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Discard the batch that failed
    DropBatch,

    /// Keep the buffer and retry at the next export
    ///
    /// When the buffer grows past `max_messages` the oldest messages are
    /// discarded first.
    Retain { max_messages: usize },
}

impl Default for FailurePolicy {
    fn default() -> Self {
        FailurePolicy::Retain {
            max_messages: DEFAULT_MAX_RETAINED,
        }
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailurePolicy::DropBatch => write!(f, "DropBatch"),
            FailurePolicy::Retain { max_messages } => write!(f, "Retain({})", max_messages),
        }
    }
}

/// Policy for a full background dispatch queue
///
/// # Example
///
/// ```
/// use log_dispatcher::OverflowPolicy;
/// use std::time::Duration;
///
/// // Default behavior: alert and drop
/// let policy = OverflowPolicy::default();
///
/// // Block with timeout
/// let policy = OverflowPolicy::BlockWithTimeout(Duration::from_millis(100));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "timeout_ms", rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Drop the batch silently, tracking metrics only
    DropNewest,

    /// Block the flushing thread until the worker catches up
    Block,

    /// Block with timeout, then drop
    BlockWithTimeout(#[serde(with = "duration_ms")] Duration),

    /// Drop but alert via callback and stderr
    AlertAndDrop,
}

impl Default for OverflowPolicy {
    fn default() -> Self {
        OverflowPolicy::AlertAndDrop
    }
}

impl fmt::Display for OverflowPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverflowPolicy::DropNewest => write!(f, "DropNewest"),
            OverflowPolicy::Block => write!(f, "Block"),
            OverflowPolicy::BlockWithTimeout(d) => write!(f, "BlockWithTimeout({:?})", d),
            OverflowPolicy::AlertAndDrop => write!(f, "AlertAndDrop"),
        }
    }
}

/// Callback type for drop notifications
///
/// The parameter is the total number of messages dropped so far.
pub type OverflowCallback = Arc<dyn Fn(u64) + Send + Sync>;

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}
