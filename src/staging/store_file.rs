//! # File-Backed Staging Store
//!
//! Persists staged entries/tags as one JSON document per scope, written with
//! a temp-file-then-rename atomic replace so a crash mid-write never leaves
//! a half-written file behind. Mutations are serialized per scope via an
//! in-process mutex; cross-process safety is out of scope (see
//! SPEC_FULL.md §10.6).

use super::{Entry, StagingStore, TagEntry};
use crate::model::Service;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::debug;

#[derive(Debug, Default, Serialize, Deserialize)]
struct ScopeDocument {
    entries: HashMap<Service, HashMap<String, Entry>>,
    tags: HashMap<Service, HashMap<String, TagEntry>>,
}

/// Staging store backed by one JSON file per scope under `root`.
#[derive(Debug)]
pub struct FileStagingStore {
    root: PathBuf,
    lock: Mutex<()>,
}

impl FileStagingStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            lock: Mutex::new(()),
        }
    }

    fn path_for(&self, scope: &str) -> PathBuf {
        self.root.join(format!("{}.json", scope.replace('/', "_")))
    }

    fn read(&self, scope: &str) -> Result<ScopeDocument> {
        let path = self.path_for(scope);
        if !path.exists() {
            return Ok(ScopeDocument::default());
        }
        let bytes = std::fs::read(&path).with_context(|| format!("failed to read {}", path.display()))?;
        serde_json::from_slice(&bytes).with_context(|| format!("failed to parse {}", path.display()))
    }

    /// Write `doc` atomically: serialize to a temp file in the same
    /// directory, fsync, then rename over the target so readers never
    /// observe a partial write.
    fn write(&self, scope: &str, doc: &ScopeDocument) -> Result<()> {
        std::fs::create_dir_all(&self.root)
            .with_context(|| format!("failed to create staging dir {}", self.root.display()))?;
        let path = self.path_for(scope);
        let mut tmp = tempfile::NamedTempFile::new_in(&self.root)
            .with_context(|| format!("failed to create temp file under {}", self.root.display()))?;
        let bytes = serde_json::to_vec_pretty(doc).context("failed to serialize staging document")?;
        tmp.write_all(&bytes).context("failed to write staging document")?;
        tmp.as_file().sync_all().context("failed to fsync staging document")?;
        tmp.persist(&path)
            .with_context(|| format!("failed to replace {}", path.display()))?;
        debug!(scope, path = %path.display(), "staging document replaced atomically");
        Ok(())
    }
}

#[async_trait]
impl StagingStore for FileStagingStore {
    async fn ping(&self) -> Result<()> {
        std::fs::create_dir_all(&self.root)
            .with_context(|| format!("staging root {} is not writable", self.root.display()))?;
        Ok(())
    }

    async fn get_entry(&self, scope: &str, service: Service, name: &str) -> Result<Option<Entry>> {
        let _guard = self.lock.lock().expect("lock poisoned");
        let doc = self.read(scope)?;
        Ok(doc.entries.get(&service).and_then(|m| m.get(name)).cloned())
    }

    async fn set_entry(&self, scope: &str, service: Service, name: &str, entry: Entry) -> Result<()> {
        let _guard = self.lock.lock().expect("lock poisoned");
        let mut doc = self.read(scope)?;
        doc.entries.entry(service).or_default().insert(name.to_string(), entry);
        self.write(scope, &doc)
    }

    async fn delete_entry(&self, scope: &str, service: Service, name: &str) -> Result<()> {
        let _guard = self.lock.lock().expect("lock poisoned");
        let mut doc = self.read(scope)?;
        if let Some(m) = doc.entries.get_mut(&service) {
            m.remove(name);
        }
        self.write(scope, &doc)
    }

    async fn list_entries(&self, scope: &str, service: Service) -> Result<Vec<(String, Entry)>> {
        let _guard = self.lock.lock().expect("lock poisoned");
        let doc = self.read(scope)?;
        Ok(doc
            .entries
            .get(&service)
            .map(|m| m.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default())
    }

    async fn get_tags(&self, scope: &str, service: Service, name: &str) -> Result<Option<TagEntry>> {
        let _guard = self.lock.lock().expect("lock poisoned");
        let doc = self.read(scope)?;
        Ok(doc.tags.get(&service).and_then(|m| m.get(name)).cloned())
    }

    async fn set_tags(&self, scope: &str, service: Service, name: &str, tags: TagEntry) -> Result<()> {
        let _guard = self.lock.lock().expect("lock poisoned");
        let mut doc = self.read(scope)?;
        doc.tags.entry(service).or_default().insert(name.to_string(), tags);
        self.write(scope, &doc)
    }

    async fn delete_tags(&self, scope: &str, service: Service, name: &str) -> Result<()> {
        let _guard = self.lock.lock().expect("lock poisoned");
        let mut doc = self.read(scope)?;
        if let Some(m) = doc.tags.get_mut(&service) {
            m.remove(name);
        }
        self.write(scope, &doc)
    }

    async fn list_tags(&self, scope: &str, service: Service) -> Result<Vec<(String, TagEntry)>> {
        let _guard = self.lock.lock().expect("lock poisoned");
        let doc = self.read(scope)?;
        Ok(doc
            .tags
            .get(&service)
            .map(|m| m.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default())
    }

    async fn unstage_all(&self, scope: &str, service: Service) -> Result<()> {
        let _guard = self.lock.lock().expect("lock poisoned");
        let mut doc = self.read(scope)?;
        doc.entries.remove(&service);
        doc.tags.remove(&service);
        self.write(scope, &doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::tempdir;

    fn entry(value: &str) -> Entry {
        Entry {
            operation: super::super::Operation::Create,
            value: Some(value.to_string()),
            staged_at: Utc::now(),
            base_modified_at: None,
            description: None,
            delete_without_recovery: false,
        }
    }

    #[tokio::test]
    async fn set_then_get_round_trips_through_disk() {
        let dir = tempdir().unwrap();
        let store = FileStagingStore::new(dir.path());
        store.set_entry("aws/1/us-east-1", Service::Secret, "n", entry("v")).await.unwrap();
        let got = store.get_entry("aws/1/us-east-1", Service::Secret, "n").await.unwrap();
        assert_eq!(got.unwrap().value.as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn separate_scopes_write_separate_files() {
        let dir = tempdir().unwrap();
        let store = FileStagingStore::new(dir.path());
        store.set_entry("aws/1/us-east-1", Service::Secret, "n", entry("v1")).await.unwrap();
        store.set_entry("aws/1/us-west-2", Service::Secret, "n", entry("v2")).await.unwrap();
        let a = store.get_entry("aws/1/us-east-1", Service::Secret, "n").await.unwrap().unwrap();
        let b = store.get_entry("aws/1/us-west-2", Service::Secret, "n").await.unwrap().unwrap();
        assert_eq!(a.value.as_deref(), Some("v1"));
        assert_eq!(b.value.as_deref(), Some("v2"));
    }

    #[tokio::test]
    async fn new_store_has_no_entries() {
        let dir = tempdir().unwrap();
        let store = FileStagingStore::new(dir.path());
        let listed = store.list_entries("s", Service::Secret).await.unwrap();
        assert!(listed.is_empty());
    }

    #[tokio::test]
    async fn delete_then_reread_reflects_removal() {
        let dir = tempdir().unwrap();
        let store = FileStagingStore::new(dir.path());
        store.set_entry("s", Service::Secret, "n", entry("v")).await.unwrap();
        store.delete_entry("s", Service::Secret, "n").await.unwrap();
        assert!(store.get_entry("s", Service::Secret, "n").await.unwrap().is_none());
    }
}
