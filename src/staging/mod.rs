//! # Staging State Model
//!
//! The local, uncommitted view of pending changes: a (`Scope`, `Service`,
//! `Name`)-keyed pair of maps — staged entry mutations and staged tag
//! mutations — backed by a pluggable [`StagingStore`]. [`reducer`] applies
//! actions to in-memory state; [`executor`] wraps the reducer with
//! persistence; `store_memory`/`store_file` are the two concrete stores.

pub mod executor;
pub mod reducer;
pub mod store_file;
pub mod store_memory;

use crate::model::Service;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A staged mutation to an entry's value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub operation: Operation,
    pub value: Option<String>,
    pub staged_at: DateTime<Utc>,
    pub base_modified_at: Option<DateTime<Utc>>,
    pub description: Option<String>,
    /// For `Operation::Delete` only: skip the provider's recovery window at
    /// apply time (AWS Secrets Manager's `force_delete_without_recovery`).
    /// Ignored for `Create`/`Update`.
    #[serde(default)]
    pub delete_without_recovery: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    Create,
    Update,
    Delete,
}

/// A staged mutation to an entry's tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagEntry {
    pub to_set: BTreeMap<String, String>,
    pub to_unset: BTreeSet<String>,
    pub staged_at: DateTime<Utc>,
    pub base_modified_at: Option<DateTime<Utc>>,
}

impl TagEntry {
    pub fn is_empty(&self) -> bool {
        self.to_set.is_empty() && self.to_unset.is_empty()
    }
}

/// The reducer's view of one entry: the remote value plus whatever is
/// staged on top of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryState {
    pub current_value: Option<String>,
    pub staged: EntryStagedState,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryStagedState {
    NotStaged,
    Create(Draft),
    Update(Draft),
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    pub value: String,
    pub description: Option<String>,
}

/// Load the combined state for one entry: its remote value plus whatever is
/// staged on top.
pub fn load_entry_state(staged: Option<&Entry>, remote: Option<String>) -> EntryState {
    let staged_state = match staged {
        None => EntryStagedState::NotStaged,
        Some(e) => match e.operation {
            Operation::Create => EntryStagedState::Create(Draft {
                value: e.value.clone().unwrap_or_default(),
                description: e.description.clone(),
            }),
            Operation::Update => EntryStagedState::Update(Draft {
                value: e.value.clone().unwrap_or_default(),
                description: e.description.clone(),
            }),
            Operation::Delete => EntryStagedState::Delete,
        },
    };
    EntryState {
        current_value: remote,
        staged: staged_state,
    }
}

/// Persistence for staged entries/tags, partitioned by `(Scope, Service)`.
/// Implementations serialize mutations per scope (see `store_file`'s
/// atomic-replace strategy); reads never block on a write in flight for a
/// different scope.
#[async_trait]
pub trait StagingStore: Send + Sync {
    async fn ping(&self) -> Result<()>;

    async fn get_entry(&self, scope: &str, service: Service, name: &str) -> Result<Option<Entry>>;
    async fn set_entry(&self, scope: &str, service: Service, name: &str, entry: Entry) -> Result<()>;
    async fn delete_entry(&self, scope: &str, service: Service, name: &str) -> Result<()>;
    async fn list_entries(&self, scope: &str, service: Service) -> Result<Vec<(String, Entry)>>;

    async fn get_tags(&self, scope: &str, service: Service, name: &str) -> Result<Option<TagEntry>>;
    async fn set_tags(&self, scope: &str, service: Service, name: &str, tags: TagEntry) -> Result<()>;
    async fn delete_tags(&self, scope: &str, service: Service, name: &str) -> Result<()>;
    async fn list_tags(&self, scope: &str, service: Service) -> Result<Vec<(String, TagEntry)>>;

    /// Discard every staged entry and tag mutation for `service` within this
    /// scope.
    async fn unstage_all(&self, scope: &str, service: Service) -> Result<()>;
}
