//! # Common Provider Utilities
//!
//! Shared helpers used by every concrete `EntryProvider` adapter, mirroring
//! the comparison/masking pattern the teacher controller uses for its
//! `create_or_update_secret` implementations.

use std::time::Instant;
use tracing::debug;

/// Result of comparing a candidate value against the provider's current
/// value for a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryComparison {
    NotFound,
    Unchanged,
    Changed,
}

pub fn compare_entry_value(current: Option<&str>, candidate: &str) -> EntryComparison {
    match current {
        None => EntryComparison::NotFound,
        Some(c) if c == candidate => EntryComparison::Unchanged,
        Some(_) => EntryComparison::Changed,
    }
}

/// Mask a value for logging: show the first and last 4 characters, or
/// asterisks for short values. Secret values are never logged in full.
pub fn mask_value(value: &str) -> String {
    if value.len() <= 8 {
        "*".repeat(value.len().min(4))
    } else {
        let first = &value[..4.min(value.len())];
        let last_start = value.len().saturating_sub(4);
        let last = &value[last_start..];
        format!("{first}...{last}")
    }
}

/// Record an operation's outcome as a structured tracing event. `suve` is a
/// one-shot CLI, not a long-running service, so there is no Prometheus
/// registry to push into — the teacher's counters become log fields instead,
/// still scrapeable by any collector reading structured logs.
pub fn record_operation(provider: &str, service: &str, operation: &str, start: Instant, ok: bool) {
    let duration_ms = start.elapsed().as_millis();
    if ok {
        debug!(
            counter.provider_operations = 1,
            provider, service, operation, duration_ms, "provider operation completed"
        );
    } else {
        debug!(
            counter.provider_operation_errors = 1,
            provider, service, operation, duration_ms, "provider operation failed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compare_not_found() {
        assert_eq!(compare_entry_value(None, "v"), EntryComparison::NotFound);
    }

    #[test]
    fn compare_unchanged() {
        assert_eq!(
            compare_entry_value(Some("same"), "same"),
            EntryComparison::Unchanged
        );
    }

    #[test]
    fn compare_changed() {
        assert_eq!(
            compare_entry_value(Some("old"), "new"),
            EntryComparison::Changed
        );
    }

    #[test]
    fn mask_short_value() {
        assert_eq!(mask_value("abc"), "***");
        assert_eq!(mask_value("12345678"), "****");
    }

    #[test]
    fn mask_long_value() {
        let masked = mask_value("this-is-a-very-long-secret-value");
        assert!(masked.starts_with("this"));
        assert!(masked.ends_with("alue"));
        assert!(masked.contains("..."));
    }

    #[test]
    fn record_operation_does_not_panic() {
        let start = Instant::now();
        record_operation("aws", "secret", "get", start, true);
        record_operation("aws", "secret", "get", start, false);
    }
}
