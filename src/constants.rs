//! # Constants
//!
//! Shared constants used throughout the crate. Reasonable defaults,
//! overridable via CLI flags or environment variables where applicable.

/// Minimum allowed `--recovery-window` in days for a secret delete.
pub const MIN_RECOVERY_WINDOW_DAYS: u32 = 7;

/// Maximum allowed `--recovery-window` in days for a secret delete.
pub const MAX_RECOVERY_WINDOW_DAYS: u32 = 30;

/// Default `--recovery-window` in days when the flag is omitted.
pub const DEFAULT_RECOVERY_WINDOW_DAYS: u32 = 30;

/// Number of characters a version id is truncated to for display, e.g. in
/// `log` output. Never used for equality or resolution.
pub const SHORT_VERSION_ID_LEN: usize = 8;

/// Default page size for `list --number`.
pub const DEFAULT_LIST_NUMBER: usize = 20;
