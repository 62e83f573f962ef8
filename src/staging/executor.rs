//! # Transition Executor
//!
//! Wraps the pure [`reducer`](super::reducer) with persistence against a
//! [`StagingStore`]: load current staged state, reduce, write the result
//! back, and apply the reducer's `discard_tags` side effect.

use super::reducer::{self, EntryAction, StagedTags};
use super::{load_entry_state, Entry, EntryStagedState, Operation, StagingStore, TagEntry};
use crate::error::{Result, SuveError};
use crate::model::Service;
use chrono::Utc;
use std::collections::{BTreeMap, BTreeSet};

/// Stage `action` for `(scope, service, name)`, persisting the result.
/// `remote_exists`/`remote_modified_at` describe the provider's current
/// view, used to distinguish the "already exists" rows of the transition
/// table and to stamp `base_modified_at` on new drafts.
pub async fn apply_entry_action(
    store: &dyn StagingStore,
    scope: &str,
    service: Service,
    name: &str,
    action: EntryAction,
    remote_exists: bool,
    remote_modified_at: Option<chrono::DateTime<Utc>>,
) -> Result<EntryStagedState> {
    apply_entry_action_with_recovery(store, scope, service, name, action, remote_exists, remote_modified_at, false).await
}

/// Same as [`apply_entry_action`], but lets a staged `Delete` request that
/// the provider skip its recovery window at apply time.
#[allow(clippy::too_many_arguments)]
pub async fn apply_entry_action_with_recovery(
    store: &dyn StagingStore,
    scope: &str,
    service: Service,
    name: &str,
    action: EntryAction,
    remote_exists: bool,
    remote_modified_at: Option<chrono::DateTime<Utc>>,
    delete_without_recovery: bool,
) -> Result<EntryStagedState> {
    let staged = store
        .get_entry(scope, service, name)
        .await
        .map_err(|e| SuveError::Store(e.to_string()))?;
    let state = load_entry_state(staged.as_ref(), None).staged;

    let transition = reducer::reduce_entry(name, &state, remote_exists, action)?;

    match &transition.new_state {
        EntryStagedState::Create(draft) | EntryStagedState::Update(draft) => {
            let operation = match transition.new_state {
                EntryStagedState::Create(_) => Operation::Create,
                _ => Operation::Update,
            };
            store
                .set_entry(
                    scope,
                    service,
                    name,
                    Entry {
                        operation,
                        value: Some(draft.value.clone()),
                        staged_at: Utc::now(),
                        base_modified_at: remote_modified_at,
                        description: draft.description.clone(),
                        delete_without_recovery: false,
                    },
                )
                .await
                .map_err(|e| SuveError::Store(e.to_string()))?;
        }
        EntryStagedState::Delete => {
            store
                .set_entry(
                    scope,
                    service,
                    name,
                    Entry {
                        operation: Operation::Delete,
                        value: None,
                        staged_at: Utc::now(),
                        base_modified_at: remote_modified_at,
                        description: None,
                        delete_without_recovery,
                    },
                )
                .await
                .map_err(|e| SuveError::Store(e.to_string()))?;
        }
        EntryStagedState::NotStaged => {
            unstage_entry_tolerant(store, scope, service, name).await?;
        }
    }

    if transition.discard_tags {
        unstage_tags_tolerant(store, scope, service, name).await?;
    }

    Ok(transition.new_state)
}

/// Stage a `Tag(add)` action for `(scope, service, name)`.
pub async fn apply_add_tags(
    store: &dyn StagingStore,
    scope: &str,
    service: Service,
    name: &str,
    add: &BTreeMap<String, String>,
    current_remote_tags: Option<&BTreeMap<String, String>>,
    is_delete_staged: bool,
    remote_modified_at: Option<chrono::DateTime<Utc>>,
) -> Result<()> {
    reducer::reduce_tag_on_delete(name, is_delete_staged)?;

    let current = current_staged_tags(store, scope, service, name).await?;
    let next = reducer::reduce_add_tags(&current, add, current_remote_tags);
    persist_or_unstage_tags(store, scope, service, name, next, remote_modified_at).await
}

/// Stage an `Untag(keys)` action for `(scope, service, name)`.
pub async fn apply_remove_tags(
    store: &dyn StagingStore,
    scope: &str,
    service: Service,
    name: &str,
    keys: &BTreeSet<String>,
    current_remote_tag_keys: Option<&BTreeSet<String>>,
    is_delete_staged: bool,
    remote_modified_at: Option<chrono::DateTime<Utc>>,
) -> Result<()> {
    reducer::reduce_tag_on_delete(name, is_delete_staged)?;

    let current = current_staged_tags(store, scope, service, name).await?;
    let next = reducer::reduce_remove_tags(&current, keys, current_remote_tag_keys);
    persist_or_unstage_tags(store, scope, service, name, next, remote_modified_at).await
}

async fn current_staged_tags(
    store: &dyn StagingStore,
    scope: &str,
    service: Service,
    name: &str,
) -> Result<StagedTags> {
    let existing = store
        .get_tags(scope, service, name)
        .await
        .map_err(|e| SuveError::Store(e.to_string()))?;
    Ok(existing
        .map(|t| StagedTags { to_set: t.to_set, to_unset: t.to_unset })
        .unwrap_or_default())
}

async fn persist_or_unstage_tags(
    store: &dyn StagingStore,
    scope: &str,
    service: Service,
    name: &str,
    tags: StagedTags,
    remote_modified_at: Option<chrono::DateTime<Utc>>,
) -> Result<()> {
    if tags.is_empty() {
        unstage_tags_tolerant(store, scope, service, name).await
    } else {
        store
            .set_tags(
                scope,
                service,
                name,
                TagEntry {
                    to_set: tags.to_set,
                    to_unset: tags.to_unset,
                    staged_at: Utc::now(),
                    base_modified_at: remote_modified_at,
                },
            )
            .await
            .map_err(|e| SuveError::Store(e.to_string()))
    }
}

async fn unstage_entry_tolerant(store: &dyn StagingStore, scope: &str, service: Service, name: &str) -> Result<()> {
    match store.delete_entry(scope, service, name).await {
        Ok(()) => Ok(()),
        Err(e) => Err(SuveError::Store(e.to_string())),
    }
}

async fn unstage_tags_tolerant(store: &dyn StagingStore, scope: &str, service: Service, name: &str) -> Result<()> {
    match store.delete_tags(scope, service, name).await {
        Ok(()) => Ok(()),
        Err(e) => Err(SuveError::Store(e.to_string())),
    }
}
