//! Call-trace capture for messages logged with a non-zero trace level
//!
//! Frames are walked with [`backtrace::trace`] and resolved one at a time, so
//! capture stops as soon as `depth` frames are found. Only symbols that
//! resolve to a source location are kept, and frames from this crate or the
//! standard library are skipped so the trace starts at the application call
//! site. Release builds without debug info resolve no locations and yield an
//! empty trace.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// One application call frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceFrame {
    pub file: String,
    pub line: u32,
    pub function: String,
}

impl fmt::Display for TraceFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} ({})", self.file, self.line, self.function)
    }
}

const SKIPPED_PREFIXES: &[&str] = &[
    "std::",
    "core::",
    "alloc::",
    "backtrace::",
    "__rust",
    "rust_begin_unwind",
    concat!(env!("CARGO_CRATE_NAME"), "::"),
];

/// Capture at most `depth` application frames
pub fn capture(depth: usize) -> Vec<TraceFrame> {
    let mut frames = Vec::new();
    if depth == 0 {
        return frames;
    }

    backtrace::trace(|raw| {
        // Inlined calls resolve to several symbols for one frame.
        backtrace::resolve_frame(raw, |symbol| {
            if frames.len() >= depth {
                return;
            }
            let (Some(name), Some(file), Some(line)) =
                (symbol.name(), symbol.filename(), symbol.lineno())
            else {
                return;
            };
            // `{:#}` drops the trailing hash of Rust symbols.
            if let Some(frame) = application_frame(format!("{:#}", name), file, line) {
                frames.push(frame);
            }
        });
        frames.len() < depth
    });

    frames
}

fn application_frame(function: String, file: &Path, line: u32) -> Option<TraceFrame> {
    let file = file.display().to_string();
    if is_infrastructure(&function) || file.starts_with("/rustc/") {
        return None;
    }
    Some(TraceFrame {
        file,
        line,
        function,
    })
}

fn is_infrastructure(function: &str) -> bool {
    let name = function.trim_start_matches('<');
    SKIPPED_PREFIXES.iter().any(|prefix| name.starts_with(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_application_frames_are_kept() {
        let frame = application_frame(
            "my_app::db::connect".to_string(),
            Path::new("./src/db.rs"),
            42,
        )
        .unwrap();
        assert_eq!(frame.file, "./src/db.rs");
        assert_eq!(frame.line, 42);
        assert_eq!(frame.to_string(), "./src/db.rs:42 (my_app::db::connect)");
    }

    #[test]
    fn test_infrastructure_frames_are_filtered() {
        let logger_frame = concat!(env!("CARGO_CRATE_NAME"), "::core::logger::Logger::log");
        assert!(
            application_frame(logger_frame.to_string(), Path::new("src/core/logger.rs"), 80)
                .is_none()
        );
        assert!(application_frame(
            "core::ops::function::FnOnce::call_once".to_string(),
            Path::new("/rustc/abc/library/core/src/ops/function.rs"),
            250,
        )
        .is_none());
        assert!(application_frame(
            "my_app::inlined".to_string(),
            Path::new("/rustc/abc/library/std/src/rt.rs"),
            1,
        )
        .is_none());
    }

    #[test]
    fn test_trait_impl_frames_are_recognized() {
        assert!(is_infrastructure("<alloc::boxed::Box<F> as core::ops::function::Fn<A>>::call"));
        assert!(!is_infrastructure("<my_app::Db as my_app::Store>::get"));
    }

    #[test]
    fn test_zero_depth_captures_nothing() {
        assert!(capture(0).is_empty());
    }

    #[test]
    fn test_capture_respects_depth() {
        // Test frames belong to this crate and are skipped; only the harness
        // frames below them can show up.
        assert!(capture(2).len() <= 2);
    }
}
