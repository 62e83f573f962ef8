//! # Error Kinds
//!
//! `SuveError` is the single closed set of domain errors the core raises.
//! Each variant corresponds to one row of the error table: parsing, resolving,
//! staging, and applying all fail through this type so callers can match on
//! `kind()` without string-sniffing messages.

use thiserror::Error;

/// Domain error raised by the version parser, resolver, reducer, executor, or
/// apply engine. Provider/store adapters wrap their own failures into
/// [`SuveError::Provider`] / [`SuveError::Store`].
#[derive(Debug, Error)]
pub enum SuveError {
    #[error("invalid version spec: {0}")]
    InvalidSpec(String),

    #[error("usage error: {0}")]
    UsageError(String),

    #[error("no versions found for '{0}'")]
    VersionNotFound(String),

    #[error("version id '{id}' not found for '{name}'")]
    VersionIdNotFound { name: String, id: String },

    #[error("label '{label}' not found for '{name}'")]
    LabelNotFound { name: String, label: String },

    #[error("shift {shift} is out of range for '{name}' ({available} version(s) available past the anchor)")]
    ShiftOutOfRange {
        name: String,
        shift: u64,
        available: usize,
    },

    #[error("no staged or remote entry named '{0}'")]
    NoSuchEntry(String),

    #[error("'{0}' already exists")]
    AlreadyExists(String),

    #[error("cannot edit an entry staged for deletion: '{0}'")]
    CannotEditDelete(String),

    #[error("cannot tag an entry staged for deletion: '{0}'")]
    CannotTagDelete(String),

    #[error("'{0}' is not staged")]
    NotStaged(String),

    #[error("'{0}' has a conflict: remote was modified after staging (use --force to override)")]
    Conflict(String),

    #[error("provider error: {0}")]
    Provider(#[from] anyhow::Error),

    #[error("store error: {0}")]
    Store(String),
}

impl SuveError {
    /// Stable machine-readable kind, used by tests that assert on error
    /// identity rather than message text.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidSpec(_) => "InvalidSpec",
            Self::UsageError(_) => "UsageError",
            Self::VersionNotFound(_) => "VersionNotFound",
            Self::VersionIdNotFound { .. } => "VersionIdNotFound",
            Self::LabelNotFound { .. } => "LabelNotFound",
            Self::ShiftOutOfRange { .. } => "ShiftOutOfRange",
            Self::NoSuchEntry(_) => "NoSuchEntry",
            Self::AlreadyExists(_) => "AlreadyExists",
            Self::CannotEditDelete(_) => "CannotEditDelete",
            Self::CannotTagDelete(_) => "CannotTagDelete",
            Self::NotStaged(_) => "NotStaged",
            Self::Conflict(_) => "Conflict",
            Self::Provider(_) => "ProviderError",
            Self::Store(_) => "StoreError",
        }
    }

    /// Whether this is the "absent key" case the staging executor tolerates
    /// when unstaging something that was never staged.
    pub fn is_not_staged(&self) -> bool {
        matches!(self, Self::NotStaged(_))
    }
}

pub type Result<T> = std::result::Result<T, SuveError>;
