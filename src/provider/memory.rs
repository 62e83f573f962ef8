//! # In-Memory Provider
//!
//! A bare-bones [`EntryProvider`] test double used by the resolver, staging
//! reducer, and apply engine test suites so they never touch real AWS
//! credentials. Mirrors the shape of the AWS adapters but keeps state in a
//! `Mutex<HashMap<..>>` instead of calling out over the network.

use crate::model::{EntryListItem, Secret, SecretVersion, WriteResult};
use crate::provider::EntryProvider;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

#[derive(Debug, Clone)]
struct StoredVersion {
    version_id: String,
    value: String,
    created_at: DateTime<Utc>,
    stages: std::collections::BTreeSet<String>,
}

#[derive(Debug, Default)]
struct Entry {
    versions: Vec<StoredVersion>,
    tags: BTreeMap<String, String>,
    description: Option<String>,
    deleted: bool,
}

/// In-memory stand-in for a cloud provider, seeded directly by tests via
/// [`MemoryProvider::seed_version`] or driven purely through the
/// [`EntryProvider`] trait like a real adapter.
#[derive(Debug, Default)]
pub struct MemoryProvider {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a version directly, bypassing `create_entry`/`update_entry` —
    /// used by tests to set up pre-existing remote state.
    pub fn seed_version(&self, name: &str, version_id: &str, value: &str, created_at: DateTime<Utc>, stages: &[&str]) {
        let mut entries = self.entries.lock().expect("lock poisoned");
        let entry = entries.entry(name.to_string()).or_default();
        entry.versions.push(StoredVersion {
            version_id: version_id.to_string(),
            value: value.to_string(),
            created_at,
            stages: stages.iter().map(|s| s.to_string()).collect(),
        });
    }

    pub fn seed_tags(&self, name: &str, tags: &[(&str, &str)]) {
        let mut entries = self.entries.lock().expect("lock poisoned");
        let entry = entries.entry(name.to_string()).or_default();
        for (k, v) in tags {
            entry.tags.insert(k.to_string(), v.to_string());
        }
    }

    fn next_version_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

#[async_trait]
impl EntryProvider for MemoryProvider {
    async fn get_entry(&self, name: &str, version_id: Option<&str>, version_stage: Option<&str>) -> Result<Secret> {
        let entries = self.entries.lock().expect("lock poisoned");
        let entry = entries
            .get(name)
            .filter(|e| !e.deleted)
            .ok_or_else(|| anyhow!("no such entry '{name}'"))?;

        let version = if let Some(id) = version_id {
            entry.versions.iter().find(|v| v.version_id == id)
        } else if let Some(stage) = version_stage {
            entry.versions.iter().find(|v| v.stages.contains(stage))
        } else {
            entry.versions.last()
        }
        .ok_or_else(|| anyhow!("no matching version for '{name}'"))?;

        Ok(Secret {
            name: name.to_string(),
            arn: Some(format!("arn:memory:{name}")),
            version_id: Some(version.version_id.clone()),
            stages: version.stages.clone(),
            created_at: Some(version.created_at),
            modified_at: Some(version.created_at),
            value: Some(version.value.clone()),
        })
    }

    async fn get_versions(&self, name: &str) -> Result<Vec<SecretVersion>> {
        let entries = self.entries.lock().expect("lock poisoned");
        let entry = entries
            .get(name)
            .filter(|e| !e.deleted)
            .ok_or_else(|| anyhow!("no such entry '{name}'"))?;
        Ok(entry
            .versions
            .iter()
            .map(|v| SecretVersion {
                version_id: v.version_id.clone(),
                created_at: Some(v.created_at),
                stages: v.stages.clone(),
            })
            .collect())
    }

    async fn list_entries(&self) -> Result<Vec<EntryListItem>> {
        let entries = self.entries.lock().expect("lock poisoned");
        Ok(entries
            .iter()
            .filter(|(_, e)| !e.deleted)
            .map(|(name, e)| EntryListItem {
                name: name.clone(),
                arn: Some(format!("arn:memory:{name}")),
                description: e.description.clone(),
            })
            .collect())
    }

    async fn create_entry(&self, name: &str, value: &str, description: Option<&str>) -> Result<WriteResult> {
        let mut entries = self.entries.lock().expect("lock poisoned");
        if entries.get(name).is_some_and(|e| !e.deleted) {
            return Err(anyhow!("entry '{name}' already exists"));
        }
        let version_id = Self::next_version_id();
        let entry = entries.entry(name.to_string()).or_default();
        entry.deleted = false;
        entry.description = description.map(ToString::to_string);
        entry.versions.push(StoredVersion {
            version_id: version_id.clone(),
            value: value.to_string(),
            created_at: Utc::now(),
            stages: std::iter::once("AWSCURRENT".to_string()).collect(),
        });
        Ok(WriteResult {
            name: name.to_string(),
            arn: Some(format!("arn:memory:{name}")),
            version_id: Some(version_id),
            deletion_date: None,
        })
    }

    async fn update_entry(&self, name: &str, value: &str) -> Result<WriteResult> {
        let mut entries = self.entries.lock().expect("lock poisoned");
        let entry = entries
            .get_mut(name)
            .filter(|e| !e.deleted)
            .ok_or_else(|| anyhow!("no such entry '{name}'"))?;
        for v in &mut entry.versions {
            v.stages.remove("AWSCURRENT");
        }
        let version_id = Self::next_version_id();
        entry.versions.push(StoredVersion {
            version_id: version_id.clone(),
            value: value.to_string(),
            created_at: Utc::now(),
            stages: std::iter::once("AWSCURRENT".to_string()).collect(),
        });
        Ok(WriteResult {
            name: name.to_string(),
            arn: Some(format!("arn:memory:{name}")),
            version_id: Some(version_id),
            deletion_date: None,
        })
    }

    async fn delete_entry(&self, name: &str, force: bool) -> Result<WriteResult> {
        let mut entries = self.entries.lock().expect("lock poisoned");
        let entry = entries.get_mut(name).ok_or_else(|| anyhow!("no such entry '{name}'"))?;
        entry.deleted = true;
        if force {
            entry.versions.clear();
        }
        Ok(WriteResult {
            name: name.to_string(),
            arn: Some(format!("arn:memory:{name}")),
            version_id: None,
            deletion_date: Some(Utc::now()),
        })
    }

    async fn restore_entry(&self, name: &str) -> Result<WriteResult> {
        let mut entries = self.entries.lock().expect("lock poisoned");
        let entry = entries
            .get_mut(name)
            .filter(|e| e.deleted)
            .ok_or_else(|| anyhow!("'{name}' is not pending deletion"))?;
        entry.deleted = false;
        Ok(WriteResult {
            name: name.to_string(),
            arn: Some(format!("arn:memory:{name}")),
            version_id: None,
            deletion_date: None,
        })
    }

    async fn get_tags(&self, name: &str) -> Result<BTreeMap<String, String>> {
        let entries = self.entries.lock().expect("lock poisoned");
        Ok(entries.get(name).map(|e| e.tags.clone()).unwrap_or_default())
    }

    async fn add_tags(&self, name: &str, tags: &BTreeMap<String, String>) -> Result<()> {
        let mut entries = self.entries.lock().expect("lock poisoned");
        let entry = entries.get_mut(name).ok_or_else(|| anyhow!("no such entry '{name}'"))?;
        entry.tags.extend(tags.clone());
        Ok(())
    }

    async fn remove_tags(&self, name: &str, keys: &[String]) -> Result<()> {
        let mut entries = self.entries.lock().expect("lock poisoned");
        let entry = entries.get_mut(name).ok_or_else(|| anyhow!("no such entry '{name}'"))?;
        for key in keys {
            entry.tags.remove(key);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_then_get_round_trips() {
        let provider = MemoryProvider::new();
        provider.create_entry("n", "v1", None).await.unwrap();
        let got = provider.get_entry("n", None, None).await.unwrap();
        assert_eq!(got.value.as_deref(), Some("v1"));
    }

    #[tokio::test]
    async fn duplicate_create_fails() {
        let provider = MemoryProvider::new();
        provider.create_entry("n", "v1", None).await.unwrap();
        assert!(provider.create_entry("n", "v2", None).await.is_err());
    }

    #[tokio::test]
    async fn update_advances_current_stage() {
        let provider = MemoryProvider::new();
        provider.create_entry("n", "v1", None).await.unwrap();
        provider.update_entry("n", "v2").await.unwrap();
        let versions = provider.get_versions("n").await.unwrap();
        assert_eq!(versions.len(), 2);
        assert!(versions[1].stages.contains("AWSCURRENT"));
        assert!(!versions[0].stages.contains("AWSCURRENT"));
    }

    #[tokio::test]
    async fn delete_then_restore() {
        let provider = MemoryProvider::new();
        provider.create_entry("n", "v1", None).await.unwrap();
        provider.delete_entry("n", false).await.unwrap();
        assert!(provider.get_entry("n", None, None).await.is_err());
        provider.restore_entry("n").await.unwrap();
        assert!(provider.get_entry("n", None, None).await.is_ok());
    }

    #[tokio::test]
    async fn tags_round_trip() {
        let provider = MemoryProvider::new();
        provider.create_entry("n", "v1", None).await.unwrap();
        let mut tags = BTreeMap::new();
        tags.insert("env".to_string(), "prod".to_string());
        provider.add_tags("n", &tags).await.unwrap();
        assert_eq!(provider.get_tags("n").await.unwrap(), tags);
        provider.remove_tags("n", &["env".to_string()]).await.unwrap();
        assert!(provider.get_tags("n").await.unwrap().is_empty());
    }
}
