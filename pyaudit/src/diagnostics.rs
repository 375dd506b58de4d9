//! Scan-scoped diagnostics sink.
//!
//! Bridge failures and per-file anomalies are recoverable: they degrade
//! the report instead of aborting the scan, but the operator still wants
//! to know about them. Each scan owns one `Diagnostics` value; warnings
//! recorded here are emitted through `tracing` immediately and kept for
//! verbose CLI output. No state persists between scans.

use std::sync::Mutex;
use tracing::warn;

/// Collects warnings for the duration of one scan.
#[derive(Debug, Default)]
pub struct Diagnostics {
    records: Mutex<Vec<String>>,
}

impl Diagnostics {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a warning. Thread-safe: the parallel scan phase reports
    /// through a shared reference.
    pub fn warn(&self, message: impl Into<String>) {
        let message = message.into();
        warn!("{message}");
        if let Ok(mut records) = self.records.lock() {
            records.push(message);
        }
    }

    /// Returns a snapshot of all warnings recorded so far.
    #[must_use]
    pub fn warnings(&self) -> Vec<String> {
        self.records.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_warnings_in_order() {
        let diagnostics = Diagnostics::new();
        diagnostics.warn("first");
        diagnostics.warn(String::from("second"));
        assert_eq!(diagnostics.warnings(), vec!["first", "second"]);
    }
}
