//! # Shared Data Model
//!
//! Types used across the resolver, staging engine, and apply engine: the
//! `Scope`/`Service` partition key, and the provider-facing `SecretVersion`
//! record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// One of the two backends within a [`Scope`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Service {
    Param,
    Secret,
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Param => write!(f, "param"),
            Self::Secret => write!(f, "secret"),
        }
    }
}

/// Identifies a `(provider, account/project, region, namespace)` tuple.
/// Staging is partitioned by scope so that e.g. `aws/123/us-east-1` and
/// `aws/123/us-west-2` never collide.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Scope {
    pub provider: String,
    pub account: String,
    pub region: String,
}

impl Scope {
    pub fn new(provider: impl Into<String>, account: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            account: account.into(),
            region: region.into(),
        }
    }

    /// Partition key used by the on-disk/daemon store layout, e.g.
    /// `aws/123456789012/us-east-1`.
    pub fn key(&self) -> String {
        format!("{}/{}/{}", self.provider, self.account, self.region)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// A revision record as produced by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretVersion {
    pub version_id: String,
    pub created_at: Option<DateTime<Utc>>,
    pub stages: BTreeSet<String>,
}

impl SecretVersion {
    /// First 8 characters of the version id, for display only — never used
    /// for equality or resolution.
    pub fn short_id(&self) -> &str {
        let end = self.version_id.char_indices().nth(8).map_or(self.version_id.len(), |(i, _)| i);
        &self.version_id[..end]
    }
}

/// A single entry returned by a list operation, before any version is
/// resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryListItem {
    pub name: String,
    pub arn: Option<String>,
    pub description: Option<String>,
}

/// A fully materialized secret/parameter value at some resolved version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Secret {
    pub name: String,
    pub arn: Option<String>,
    pub version_id: Option<String>,
    pub stages: BTreeSet<String>,
    pub created_at: Option<DateTime<Utc>>,
    /// Remote last-modified timestamp, the basis for apply-time conflict
    /// detection against a staged entry's `base_modified_at`.
    pub modified_at: Option<DateTime<Utc>>,
    pub value: Option<String>,
}

/// Result of a mutating write operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteResult {
    pub name: String,
    pub arn: Option<String>,
    pub version_id: Option<String>,
    pub deletion_date: Option<DateTime<Utc>>,
}
