//! # Transition Reducer
//!
//! Pure `(state, action) -> new state` functions over the closed
//! [`EntryStagedState`] union. No I/O, no clock reads beyond what the caller
//! passes in — easy to exhaustively table-test. [`executor`](super::executor)
//! wraps these with persistence.

use super::{Draft, EntryStagedState};
use crate::error::{Result, SuveError};
use std::collections::{BTreeMap, BTreeSet};

/// An action applied to an entry's staged state.
pub enum EntryAction {
    Add { value: String, description: Option<String> },
    Edit { value: String },
    Delete,
    Reset,
}

/// Result of reducing an [`EntryAction`]: the new state, and whether any
/// staged tags for the same name must be discarded as a side effect (only
/// true for `Delete` applied to a staged `Create`).
#[derive(Debug)]
pub struct EntryTransition {
    pub new_state: EntryStagedState,
    pub discard_tags: bool,
}

fn transition(state: EntryStagedState, discard_tags: bool) -> EntryTransition {
    EntryTransition {
        new_state: state,
        discard_tags,
    }
}

/// Apply `action` to `state`, given whether the entry currently exists
/// remotely (`remote_exists`) — needed to distinguish the two `NotStaged`
/// rows of the transition table. `name` is only used to render error
/// messages; the transition itself depends solely on `state`/`action`.
pub fn reduce_entry(
    name: &str,
    state: &EntryStagedState,
    remote_exists: bool,
    action: EntryAction,
) -> Result<EntryTransition> {
    use EntryStagedState::*;

    match (state, action) {
        (NotStaged, EntryAction::Add { value, description }) if !remote_exists => {
            Ok(transition(Create(Draft { value, description }), false))
        }
        (NotStaged, EntryAction::Add { .. }) => Err(SuveError::AlreadyExists(name.to_string())),
        (NotStaged, EntryAction::Edit { .. }) if !remote_exists => Err(SuveError::NoSuchEntry(name.to_string())),
        (NotStaged, EntryAction::Edit { value }) => Ok(transition(
            Update(Draft { value, description: None }),
            false,
        )),
        (NotStaged, EntryAction::Delete) if !remote_exists => Err(SuveError::NoSuchEntry(name.to_string())),
        (NotStaged, EntryAction::Delete) => Ok(transition(Delete, false)),
        (NotStaged, EntryAction::Reset) => Ok(transition(NotStaged, false)),

        (Create(_), EntryAction::Add { value, description }) => {
            Ok(transition(Create(Draft { value, description }), false))
        }
        (Create(draft), EntryAction::Edit { value }) => Ok(transition(
            Create(Draft { value, description: draft.description.clone() }),
            false,
        )),
        (Create(_), EntryAction::Delete) => Ok(transition(NotStaged, true)),
        (Create(_), EntryAction::Reset) => Ok(transition(NotStaged, false)),

        (Update(_), EntryAction::Add { .. }) => Err(SuveError::AlreadyExists(name.to_string())),
        (Update(draft), EntryAction::Edit { value }) => Ok(transition(
            Update(Draft { value, description: draft.description.clone() }),
            false,
        )),
        (Update(_), EntryAction::Delete) => Ok(transition(Delete, false)),
        (Update(_), EntryAction::Reset) => Ok(transition(NotStaged, false)),

        (Delete, EntryAction::Add { .. }) => Err(SuveError::AlreadyExists(name.to_string())),
        (Delete, EntryAction::Edit { .. }) => Err(SuveError::CannotEditDelete(name.to_string())),
        (Delete, EntryAction::Delete) => Ok(transition(Delete, false)),
        (Delete, EntryAction::Reset) => Ok(transition(NotStaged, false)),
    }
}

/// Staged tag mutations, mirroring [`super::TagEntry`] but without the
/// timestamps the executor attaches on persist.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StagedTags {
    pub to_set: BTreeMap<String, String>,
    pub to_unset: BTreeSet<String>,
}

impl StagedTags {
    pub fn is_empty(&self) -> bool {
        self.to_set.is_empty() && self.to_unset.is_empty()
    }
}

/// `Tag`/`Untag` may not be applied to an entry staged for deletion.
pub fn reduce_tag_on_delete(name: &str, is_delete_staged: bool) -> Result<()> {
    if is_delete_staged {
        Err(SuveError::CannotTagDelete(name.to_string()))
    } else {
        Ok(())
    }
}

/// Apply a `Tag(add)` action: skip keys already at the desired remote value,
/// otherwise stage them and clear any pending unset for the same key.
pub fn reduce_add_tags(
    current: &StagedTags,
    add: &BTreeMap<String, String>,
    current_remote_tags: Option<&BTreeMap<String, String>>,
) -> StagedTags {
    let mut next = current.clone();
    for (k, v) in add {
        if current_remote_tags.and_then(|m| m.get(k)).is_some_and(|rv| rv == v) {
            continue;
        }
        next.to_set.insert(k.clone(), v.clone());
        next.to_unset.remove(k);
    }
    next
}

/// Apply an `Untag(keys)` action: skip keys that are already absent
/// remotely, otherwise stage them for removal and clear any pending set for
/// the same key.
pub fn reduce_remove_tags(
    current: &StagedTags,
    keys: &BTreeSet<String>,
    current_remote_tag_keys: Option<&BTreeSet<String>>,
) -> StagedTags {
    let mut next = current.clone();
    for k in keys {
        if let Some(remote_keys) = current_remote_tag_keys {
            if !remote_keys.contains(k) {
                continue;
            }
        }
        next.to_unset.insert(k.clone());
        next.to_set.remove(k);
    }
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::staging::EntryStagedState::*;

    fn draft(v: &str) -> Draft {
        Draft { value: v.to_string(), description: None }
    }

    fn add(v: &str) -> EntryAction {
        EntryAction::Add { value: v.to_string(), description: None }
    }

    fn edit(v: &str) -> EntryAction {
        EntryAction::Edit { value: v.to_string() }
    }

    #[test]
    fn add_on_absent_not_staged_creates() {
        let t = reduce_entry("n", &NotStaged, false, add("v")).unwrap();
        assert_eq!(t.new_state, Create(draft("v")));
        assert!(!t.discard_tags);
    }

    #[test]
    fn add_on_present_not_staged_errs() {
        let err = reduce_entry("n", &NotStaged, true, add("v")).unwrap_err();
        assert_eq!(err.kind(), "AlreadyExists");
    }

    #[test]
    fn edit_on_absent_not_staged_errs() {
        let err = reduce_entry("n", &NotStaged, false, edit("v")).unwrap_err();
        assert_eq!(err.kind(), "NoSuchEntry");
    }

    #[test]
    fn edit_on_present_not_staged_updates() {
        let t = reduce_entry("n", &NotStaged, true, edit("v")).unwrap();
        assert_eq!(t.new_state, Update(draft("v")));
    }

    #[test]
    fn delete_on_absent_not_staged_errs() {
        let err = reduce_entry("n", &NotStaged, false, EntryAction::Delete).unwrap_err();
        assert_eq!(err.kind(), "NoSuchEntry");
    }

    #[test]
    fn delete_on_present_not_staged_deletes() {
        let t = reduce_entry("n", &NotStaged, true, EntryAction::Delete).unwrap();
        assert_eq!(t.new_state, Delete);
    }

    #[test]
    fn add_on_create_overwrites_draft() {
        let state = Create(draft("old"));
        let t = reduce_entry("n", &state, false, add("new")).unwrap();
        assert_eq!(t.new_state, Create(draft("new")));
        assert!(!t.discard_tags);
    }

    #[test]
    fn edit_on_create_overwrites_draft() {
        let state = Create(draft("old"));
        let t = reduce_entry("n", &state, false, edit("new")).unwrap();
        assert_eq!(t.new_state, Create(draft("new")));
    }

    #[test]
    fn delete_on_create_unstages_and_discards_tags() {
        let state = Create(draft("v"));
        let t = reduce_entry("n", &state, false, EntryAction::Delete).unwrap();
        assert_eq!(t.new_state, NotStaged);
        assert!(t.discard_tags);
    }

    #[test]
    fn add_on_update_errs_already_exists() {
        let state = Update(draft("v"));
        let err = reduce_entry("n", &state, true, add("v2")).unwrap_err();
        assert_eq!(err.kind(), "AlreadyExists");
    }

    #[test]
    fn edit_on_update_overwrites_draft() {
        let state = Update(draft("v"));
        let t = reduce_entry("n", &state, true, edit("v2")).unwrap();
        assert_eq!(t.new_state, Update(draft("v2")));
    }

    #[test]
    fn delete_on_update_transitions_to_delete() {
        let state = Update(draft("v"));
        let t = reduce_entry("n", &state, true, EntryAction::Delete).unwrap();
        assert_eq!(t.new_state, Delete);
    }

    #[test]
    fn add_on_delete_errs() {
        let err = reduce_entry("n", &Delete, true, add("v")).unwrap_err();
        assert_eq!(err.kind(), "AlreadyExists");
    }

    #[test]
    fn edit_on_delete_errs_cannot_edit_delete() {
        let err = reduce_entry("n", &Delete, true, edit("v")).unwrap_err();
        assert_eq!(err.kind(), "CannotEditDelete");
    }

    #[test]
    fn reset_always_returns_to_not_staged() {
        for state in [NotStaged, Create(draft("v")), Update(draft("v")), Delete] {
            let t = reduce_entry("n", &state, true, EntryAction::Reset).unwrap();
            assert_eq!(t.new_state, NotStaged);
            assert!(!t.discard_tags);
        }
    }

    #[test]
    fn tag_on_delete_errs() {
        assert_eq!(reduce_tag_on_delete("n", true).unwrap_err().kind(), "CannotTagDelete");
        assert!(reduce_tag_on_delete("n", false).is_ok());
    }

    #[test]
    fn add_tags_skips_values_already_matching_remote() {
        let remote = BTreeMap::from([("env".to_string(), "prod".to_string())]);
        let mut add_map = BTreeMap::new();
        add_map.insert("env".to_string(), "prod".to_string());
        add_map.insert("team".to_string(), "infra".to_string());
        let result = reduce_add_tags(&StagedTags::default(), &add_map, Some(&remote));
        assert!(!result.to_set.contains_key("env"));
        assert_eq!(result.to_set.get("team"), Some(&"infra".to_string()));
    }

    #[test]
    fn add_tags_clears_pending_unset_for_same_key() {
        let mut current = StagedTags::default();
        current.to_unset.insert("env".to_string());
        let mut add_map = BTreeMap::new();
        add_map.insert("env".to_string(), "prod".to_string());
        let result = reduce_add_tags(&current, &add_map, None);
        assert!(!result.to_unset.contains("env"));
        assert_eq!(result.to_set.get("env"), Some(&"prod".to_string()));
    }

    #[test]
    fn remove_tags_skips_keys_already_absent_remotely() {
        let remote_keys = BTreeSet::from(["team".to_string()]);
        let keys = BTreeSet::from(["env".to_string(), "team".to_string()]);
        let result = reduce_remove_tags(&StagedTags::default(), &keys, Some(&remote_keys));
        assert!(!result.to_unset.contains("env"));
        assert!(result.to_unset.contains("team"));
    }

    #[test]
    fn remove_tags_clears_pending_set_for_same_key() {
        let mut current = StagedTags::default();
        current.to_set.insert("env".to_string(), "prod".to_string());
        let keys = BTreeSet::from(["env".to_string()]);
        let result = reduce_remove_tags(&current, &keys, None);
        assert!(!result.to_set.contains_key("env"));
        assert!(result.to_unset.contains("env"));
    }

    #[test]
    fn staged_tags_set_and_unset_stay_disjoint() {
        let mut current = StagedTags::default();
        let mut add_map = BTreeMap::new();
        add_map.insert("env".to_string(), "prod".to_string());
        current = reduce_add_tags(&current, &add_map, None);
        let keys = BTreeSet::from(["env".to_string()]);
        current = reduce_remove_tags(&current, &keys, None);
        assert!(current.to_set.is_empty());
        assert!(current.to_unset.contains("env"));
    }
}
