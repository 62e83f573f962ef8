//! # Apply Engine
//!
//! Replays staged entries/tags against a real [`EntryProvider`]: delete
//! before update before create, per-entry conflict detection against the
//! provider's current `ModifiedAt`, `--force` override, and a per-item
//! outcome report. Partial failure is expected — one bad item never aborts
//! the rest of the batch.

use crate::model::Service;
use crate::provider::EntryProvider;
use crate::staging::{Entry, Operation, StagingStore, TagEntry};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// The disposition of one staged name after `apply` has run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    Conflicted,
    Failed(String),
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyResult {
    pub name: String,
    pub outcome: Outcome,
}

/// What kind of write, if any, a [`PlannedItem`] performs against the
/// entry itself. `TagsOnly` covers a name that was tagged/untagged without
/// any staged create/update/delete — valid per §4.5's tag rules, which only
/// block tagging a name staged for deletion.
enum PlannedOp {
    Create,
    Update,
    Delete,
    TagsOnly,
}

struct PlannedItem {
    name: String,
    op: PlannedOp,
    entry: Option<Entry>,
    tags: Option<TagEntry>,
    staged_at: DateTime<Utc>,
    base_modified_at: Option<DateTime<Utc>>,
}

/// Apply every staged entry/tag for `service` within `scope`. `force` skips
/// the conflict check. Returns one [`ApplyResult`] per staged name;
/// successfully applied names are unstaged, everything else remains staged
/// for a future `apply` attempt.
pub async fn apply(
    provider: &dyn EntryProvider,
    store: &dyn StagingStore,
    scope: &str,
    service: Service,
    force: bool,
) -> anyhow::Result<Vec<ApplyResult>> {
    let staged_entries = store.list_entries(scope, service).await?;
    let staged_tags = store.list_tags(scope, service).await?;
    let mut tags_by_name: BTreeMap<String, TagEntry> = staged_tags.into_iter().collect();

    let mut deletes = Vec::new();
    let mut updates = Vec::new();
    let mut creates = Vec::new();

    for (name, entry) in staged_entries {
        let tags = if entry.operation == Operation::Delete {
            tags_by_name.remove(&name);
            None
        } else {
            tags_by_name.remove(&name)
        };
        let op = match entry.operation {
            Operation::Delete => PlannedOp::Delete,
            Operation::Update => PlannedOp::Update,
            Operation::Create => PlannedOp::Create,
        };
        let item = PlannedItem {
            name,
            op,
            staged_at: entry.staged_at,
            base_modified_at: entry.base_modified_at,
            entry: Some(entry),
            tags,
        };
        match item.op {
            PlannedOp::Delete => deletes.push(item),
            PlannedOp::Update => updates.push(item),
            PlannedOp::Create => creates.push(item),
            PlannedOp::TagsOnly => unreachable!("entries never plan as TagsOnly"),
        }
    }

    // Names with a staged tag mutation but no staged entry mutation still
    // need to be applied — fold them in alongside updates, since tagging an
    // existing entry is the closest of the three dispositions.
    for (name, tags) in tags_by_name {
        updates.push(PlannedItem {
            name,
            op: PlannedOp::TagsOnly,
            staged_at: tags.staged_at,
            base_modified_at: tags.base_modified_at,
            entry: None,
            tags: Some(tags),
        });
    }

    deletes.sort_by_key(|i| i.staged_at);
    updates.sort_by_key(|i| i.staged_at);
    creates.sort_by_key(|i| i.staged_at);

    let conflicts = join_all(
        deletes
            .iter()
            .chain(updates.iter())
            .chain(creates.iter())
            .map(|item| check_conflict(provider, &item.name, item.base_modified_at, force)),
    )
    .await
    .into_iter()
    .collect::<BTreeMap<_, _>>();

    let mut results = Vec::new();
    for item in deletes.into_iter().chain(updates).chain(creates) {
        if conflicts.get(&item.name).copied().unwrap_or(false) {
            warn!(entry.name = %item.name, "apply conflict: remote modified since staging");
            results.push(ApplyResult { name: item.name, outcome: Outcome::Conflicted });
            continue;
        }
        let outcome = apply_one(provider, &item).await;
        if matches!(outcome, Outcome::Applied) {
            if item.entry.is_some() {
                let _ = store.delete_entry(scope, service, &item.name).await;
            }
            if !matches!(item.op, PlannedOp::Delete) {
                let _ = store.delete_tags(scope, service, &item.name).await;
            }
        }
        results.push(ApplyResult { name: item.name, outcome });
    }

    Ok(results)
}

async fn check_conflict(
    provider: &dyn EntryProvider,
    name: &str,
    base_modified_at: Option<chrono::DateTime<chrono::Utc>>,
    force: bool,
) -> (String, bool) {
    let Some(base) = base_modified_at else {
        return (name.to_string(), false);
    };
    if force {
        return (name.to_string(), false);
    }
    match provider.get_entry(name, None, None).await {
        Ok(remote) => {
            let conflicted = remote.modified_at.is_some_and(|m| m > base);
            (name.to_string(), conflicted)
        }
        // Absence of the remote entry is not itself a conflict — the local
        // operation (e.g. a staged Create) still gets a chance to run and
        // will fail on its own terms if that turns out to be wrong.
        Err(_) => (name.to_string(), false),
    }
}

async fn apply_one(provider: &dyn EntryProvider, item: &PlannedItem) -> Outcome {
    if let Some(entry) = &item.entry {
        let write_result = match item.op {
            PlannedOp::Create => {
                provider
                    .create_entry(&item.name, entry.value.as_deref().unwrap_or(""), entry.description.as_deref())
                    .await
            }
            PlannedOp::Update => provider.update_entry(&item.name, entry.value.as_deref().unwrap_or("")).await,
            PlannedOp::Delete => provider.delete_entry(&item.name, entry.delete_without_recovery).await,
            PlannedOp::TagsOnly => unreachable!("TagsOnly items never carry an entry"),
        };

        if let Err(e) = write_result {
            return Outcome::Failed(e.to_string());
        }

        if matches!(item.op, PlannedOp::Delete) {
            info!(entry.name = %item.name, "applied delete");
            return Outcome::Applied;
        }
    }

    if let Some(tags) = &item.tags {
        if !tags.to_set.is_empty() {
            if let Err(e) = provider.add_tags(&item.name, &tags.to_set).await {
                return Outcome::Failed(e.to_string());
            }
        }
        if !tags.to_unset.is_empty() {
            let keys: Vec<String> = tags.to_unset.iter().cloned().collect();
            if let Err(e) = provider.remove_tags(&item.name, &keys).await {
                return Outcome::Failed(e.to_string());
            }
        }
    }

    info!(entry.name = %item.name, "applied");
    Outcome::Applied
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::memory::MemoryProvider;
    use crate::staging::store_memory::MemoryStagingStore;
    use chrono::Utc;

    fn entry(op: Operation, value: &str, base_modified_at: Option<chrono::DateTime<Utc>>) -> Entry {
        Entry {
            operation: op,
            value: Some(value.to_string()),
            staged_at: Utc::now(),
            base_modified_at,
            description: None,
            delete_without_recovery: false,
        }
    }

    #[tokio::test]
    async fn applies_a_staged_create() {
        let provider = MemoryProvider::new();
        let store = MemoryStagingStore::new();
        store.set_entry("s", Service::Secret, "n", entry(Operation::Create, "v1", None)).await.unwrap();

        let results = apply(&provider, &store, "s", Service::Secret, false).await.unwrap();
        assert_eq!(results, vec![ApplyResult { name: "n".into(), outcome: Outcome::Applied }]);
        assert!(store.get_entry("s", Service::Secret, "n").await.unwrap().is_none());
        assert_eq!(provider.get_entry("n", None, None).await.unwrap().value.as_deref(), Some("v1"));
    }

    #[tokio::test]
    async fn deletes_apply_before_creates() {
        let provider = MemoryProvider::new();
        provider.create_entry("old", "v0", None).await.unwrap();
        let store = MemoryStagingStore::new();
        store.set_entry("s", Service::Secret, "new", entry(Operation::Create, "v1", None)).await.unwrap();
        store.set_entry("s", Service::Secret, "old", entry(Operation::Delete, "", None)).await.unwrap();

        let results = apply(&provider, &store, "s", Service::Secret, false).await.unwrap();
        let names: Vec<&str> = results.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["old", "new"]);
    }

    #[tokio::test]
    async fn conflict_is_detected_when_remote_modified_after_staging() {
        let provider = MemoryProvider::new();
        let old_time = Utc::now() - chrono::Duration::days(1);
        provider.seed_version("n", "v0", "remote-newer", Utc::now(), &["AWSCURRENT"]);
        let store = MemoryStagingStore::new();
        store.set_entry("s", Service::Secret, "n", entry(Operation::Update, "staged-value", Some(old_time))).await.unwrap();

        let results = apply(&provider, &store, "s", Service::Secret, false).await.unwrap();
        assert_eq!(results, vec![ApplyResult { name: "n".into(), outcome: Outcome::Conflicted }]);
        // Conflicted items remain staged for a future retry.
        assert!(store.get_entry("s", Service::Secret, "n").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn force_overrides_conflict() {
        let provider = MemoryProvider::new();
        let old_time = Utc::now() - chrono::Duration::days(1);
        provider.seed_version("n", "v0", "remote-newer", Utc::now(), &["AWSCURRENT"]);
        let store = MemoryStagingStore::new();
        store.set_entry("s", Service::Secret, "n", entry(Operation::Update, "staged-value", Some(old_time))).await.unwrap();

        let results = apply(&provider, &store, "s", Service::Secret, true).await.unwrap();
        assert_eq!(results, vec![ApplyResult { name: "n".into(), outcome: Outcome::Applied }]);
    }

    #[tokio::test]
    async fn one_failure_does_not_block_other_items() {
        let provider = MemoryProvider::new();
        provider.create_entry("existing", "v0", None).await.unwrap();
        let store = MemoryStagingStore::new();
        // Staged Create over an entry that already exists remotely -> fails.
        store.set_entry("s", Service::Secret, "existing", entry(Operation::Create, "v1", None)).await.unwrap();
        store.set_entry("s", Service::Secret, "fresh", entry(Operation::Create, "v1", None)).await.unwrap();

        let results = apply(&provider, &store, "s", Service::Secret, false).await.unwrap();
        let fresh = results.iter().find(|r| r.name == "fresh").unwrap();
        assert_eq!(fresh.outcome, Outcome::Applied);
        let existing = results.iter().find(|r| r.name == "existing").unwrap();
        assert!(matches!(existing.outcome, Outcome::Failed(_)));
        // Failed item remains staged.
        assert!(store.get_entry("s", Service::Secret, "existing").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn tags_are_applied_after_the_entry_write() {
        let provider = MemoryProvider::new();
        let store = MemoryStagingStore::new();
        store.set_entry("s", Service::Secret, "n", entry(Operation::Create, "v1", None)).await.unwrap();
        let mut to_set = BTreeMap::new();
        to_set.insert("env".to_string(), "prod".to_string());
        store
            .set_tags(
                "s",
                Service::Secret,
                "n",
                TagEntry { to_set, to_unset: Default::default(), staged_at: Utc::now(), base_modified_at: None },
            )
            .await
            .unwrap();

        apply(&provider, &store, "s", Service::Secret, false).await.unwrap();
        let tags = provider.get_tags("n").await.unwrap();
        assert_eq!(tags.get("env"), Some(&"prod".to_string()));
    }

    #[tokio::test]
    async fn tag_only_staging_with_no_staged_entry_is_still_applied_and_unstaged() {
        let provider = MemoryProvider::new();
        provider.create_entry("n", "v1", None).await.unwrap();
        let store = MemoryStagingStore::new();
        let mut to_set = BTreeMap::new();
        to_set.insert("env".to_string(), "prod".to_string());
        store
            .set_tags(
                "s",
                Service::Secret,
                "n",
                TagEntry { to_set, to_unset: Default::default(), staged_at: Utc::now(), base_modified_at: None },
            )
            .await
            .unwrap();

        let results = apply(&provider, &store, "s", Service::Secret, false).await.unwrap();
        assert_eq!(results, vec![ApplyResult { name: "n".into(), outcome: Outcome::Applied }]);
        let tags = provider.get_tags("n").await.unwrap();
        assert_eq!(tags.get("env"), Some(&"prod".to_string()));
        assert!(store.get_tags("s", Service::Secret, "n").await.unwrap().is_none());
    }
}
