//! # In-Memory Staging Store
//!
//! A `Mutex<HashMap<..>>`-backed [`StagingStore`], used by the executor and
//! apply-engine test suites, and as the default store for ephemeral/one-shot
//! invocations that pass `--no-stage-persist` (see SPEC_FULL.md §10.3).

use super::{Entry, StagingStore, TagEntry};
use crate::model::Service;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

type Key = (String, Service, String);

#[derive(Debug, Default)]
pub struct MemoryStagingStore {
    entries: Mutex<HashMap<Key, Entry>>,
    tags: Mutex<HashMap<Key, TagEntry>>,
}

impl MemoryStagingStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StagingStore for MemoryStagingStore {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn get_entry(&self, scope: &str, service: Service, name: &str) -> Result<Option<Entry>> {
        let entries = self.entries.lock().expect("lock poisoned");
        Ok(entries.get(&(scope.to_string(), service, name.to_string())).cloned())
    }

    async fn set_entry(&self, scope: &str, service: Service, name: &str, entry: Entry) -> Result<()> {
        let mut entries = self.entries.lock().expect("lock poisoned");
        entries.insert((scope.to_string(), service, name.to_string()), entry);
        Ok(())
    }

    async fn delete_entry(&self, scope: &str, service: Service, name: &str) -> Result<()> {
        let mut entries = self.entries.lock().expect("lock poisoned");
        entries.remove(&(scope.to_string(), service, name.to_string()));
        Ok(())
    }

    async fn list_entries(&self, scope: &str, service: Service) -> Result<Vec<(String, Entry)>> {
        let entries = self.entries.lock().expect("lock poisoned");
        Ok(entries
            .iter()
            .filter(|((s, svc, _), _)| s == scope && *svc == service)
            .map(|((_, _, name), entry)| (name.clone(), entry.clone()))
            .collect())
    }

    async fn get_tags(&self, scope: &str, service: Service, name: &str) -> Result<Option<TagEntry>> {
        let tags = self.tags.lock().expect("lock poisoned");
        Ok(tags.get(&(scope.to_string(), service, name.to_string())).cloned())
    }

    async fn set_tags(&self, scope: &str, service: Service, name: &str, tags: TagEntry) -> Result<()> {
        let mut store = self.tags.lock().expect("lock poisoned");
        store.insert((scope.to_string(), service, name.to_string()), tags);
        Ok(())
    }

    async fn delete_tags(&self, scope: &str, service: Service, name: &str) -> Result<()> {
        let mut tags = self.tags.lock().expect("lock poisoned");
        tags.remove(&(scope.to_string(), service, name.to_string()));
        Ok(())
    }

    async fn list_tags(&self, scope: &str, service: Service) -> Result<Vec<(String, TagEntry)>> {
        let tags = self.tags.lock().expect("lock poisoned");
        Ok(tags
            .iter()
            .filter(|((s, svc, _), _)| s == scope && *svc == service)
            .map(|((_, _, name), tag)| (name.clone(), tag.clone()))
            .collect())
    }

    async fn unstage_all(&self, scope: &str, service: Service) -> Result<()> {
        let mut entries = self.entries.lock().expect("lock poisoned");
        entries.retain(|(s, svc, _), _| !(s == scope && *svc == service));
        let mut tags = self.tags.lock().expect("lock poisoned");
        tags.retain(|(s, svc, _), _| !(s == scope && *svc == service));
        Ok(())
    }
}
