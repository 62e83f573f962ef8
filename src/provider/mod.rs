//! # Provider Abstraction
//!
//! The single collaborator contract the core depends on (§6). `EntryProvider`
//! unifies the spec's `SecretReader/Writer/Tagger` and the analogous
//! `ParameterReader/Writer/Tagger` into one trait parameterized implicitly by
//! which concrete adapter you hold — the resolver, staging engine, and apply
//! engine never need to know whether they are talking to Secrets Manager or
//! Parameter Store, only that [`crate::model::Service`] selects which
//! provider instance to call.
//!
//! Concrete adapters live in `provider::aws`; `provider::memory` carries
//! lightweight in-memory test doubles used by the rest of the crate's test
//! suite.

use crate::model::{EntryListItem, Secret, SecretVersion, WriteResult};
use anyhow::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;

/// Abstract reader/writer/tagger contract over a cloud secrets or parameters
/// backend. Failures surface as [`crate::error::SuveError::Provider`] once
/// wrapped by a caller; adapters themselves return `anyhow::Result` so SDK
/// error types don't leak into the core.
#[async_trait]
pub trait EntryProvider: Send + Sync {
    /// Fetch a single revision. `version_id` and `version_stage` are
    /// mutually exclusive; both absent means "latest".
    async fn get_entry(
        &self,
        name: &str,
        version_id: Option<&str>,
        version_stage: Option<&str>,
    ) -> Result<Secret>;

    /// Fetch the full version history, unsorted — the resolver performs the
    /// descending-by-created-at sort itself.
    async fn get_versions(&self, name: &str) -> Result<Vec<SecretVersion>>;

    /// List all entries in this service, without fetching their values.
    async fn list_entries(&self) -> Result<Vec<EntryListItem>>;

    async fn create_entry(&self, name: &str, value: &str, description: Option<&str>) -> Result<WriteResult>;

    async fn update_entry(&self, name: &str, value: &str) -> Result<WriteResult>;

    async fn delete_entry(&self, name: &str, force: bool) -> Result<WriteResult>;

    async fn restore_entry(&self, name: &str) -> Result<WriteResult>;

    async fn get_tags(&self, name: &str) -> Result<BTreeMap<String, String>>;

    async fn add_tags(&self, name: &str, tags: &BTreeMap<String, String>) -> Result<()>;

    async fn remove_tags(&self, name: &str, keys: &[String]) -> Result<()>;
}

pub mod aws;
pub mod common;
pub mod memory;
