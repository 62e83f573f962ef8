//! # Version Resolver
//!
//! Turns a parsed [`crate::spec::Spec`] into a concrete revision by talking
//! to an [`EntryProvider`]. Two paths: a no-shift fast path that asks the
//! provider for the revision directly, and a shift path that fetches the
//! full version list, sorts it, finds the base index, and walks `shift`
//! positions further into the past.

use crate::error::{Result, SuveError};
use crate::model::{Secret, SecretVersion};
use crate::provider::EntryProvider;
use crate::spec::Spec;

/// Resolve `spec` against `provider` into the secret/parameter value at that
/// revision.
pub async fn resolve(provider: &dyn EntryProvider, spec: &Spec) -> Result<Secret> {
    if spec.shift == 0 {
        return resolve_no_shift(provider, spec).await;
    }
    resolve_with_shift(provider, spec).await
}

async fn resolve_no_shift(provider: &dyn EntryProvider, spec: &Spec) -> Result<Secret> {
    provider
        .get_entry(&spec.name, spec.id(), spec.label())
        .await
        .map_err(SuveError::Provider)
}

async fn resolve_with_shift(provider: &dyn EntryProvider, spec: &Spec) -> Result<Secret> {
    let mut versions = provider
        .get_versions(&spec.name)
        .await
        .map_err(SuveError::Provider)?;

    sort_versions_descending(&mut versions);

    let base_index = find_base_index(&versions, spec)?;
    let target_index = base_index
        .checked_add(spec.shift as usize)
        .filter(|i| *i < versions.len())
        .ok_or_else(|| SuveError::ShiftOutOfRange {
            name: spec.name.clone(),
            shift: spec.shift,
            available: versions.len().saturating_sub(base_index + 1),
        })?;

    let target = &versions[target_index];
    provider
        .get_entry(&spec.name, Some(&target.version_id), None)
        .await
        .map_err(SuveError::Provider)
}

/// Sort newest-first. Versions with no creation timestamp (can happen with
/// provider-reported "pending" revisions) sort after every dated version,
/// since we have no basis to order them relative to anything else.
pub(crate) fn sort_versions_descending(versions: &mut [SecretVersion]) {
    versions.sort_by(|a, b| match (a.created_at, b.created_at) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
}

/// Find the index of the version a shift should be measured from: the
/// version matching the spec's id/label anchor, or index 0 ("latest") when
/// the spec carries no anchor.
fn find_base_index(versions: &[SecretVersion], spec: &Spec) -> Result<usize> {
    if versions.is_empty() {
        return Err(SuveError::VersionNotFound(spec.name.clone()));
    }
    match (spec.id(), spec.label()) {
        (Some(id), _) => versions
            .iter()
            .position(|v| v.version_id == id)
            .ok_or_else(|| SuveError::VersionIdNotFound {
                name: spec.name.clone(),
                id: id.to_string(),
            }),
        (None, Some(label)) => versions
            .iter()
            .position(|v| v.stages.contains(label))
            .ok_or_else(|| SuveError::LabelNotFound {
                name: spec.name.clone(),
                label: label.to_string(),
            }),
        (None, None) => Ok(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::memory::MemoryProvider;
    use chrono::{Duration, Utc};

    fn seeded_provider() -> MemoryProvider {
        let provider = MemoryProvider::new();
        let now = Utc::now();
        provider.seed_version("n", "v1", "value-1", now - Duration::days(3), &[]);
        provider.seed_version("n", "v2", "value-2", now - Duration::days(2), &["AWSPREVIOUS"]);
        provider.seed_version("n", "v3", "value-3", now - Duration::days(1), &["AWSCURRENT"]);
        provider
    }

    #[tokio::test]
    async fn no_shift_resolves_latest_by_label() {
        let provider = seeded_provider();
        let spec = Spec::named("n");
        // no-shift fast path asks the provider directly; our memory provider
        // treats `get_entry(name, None, None)` as "most recently pushed".
        let secret = resolve(&provider, &spec).await.unwrap();
        assert_eq!(secret.value.as_deref(), Some("value-3"));
    }

    #[tokio::test]
    async fn no_shift_resolves_by_id() {
        let provider = seeded_provider();
        let spec = crate::spec::parse("n#v1").unwrap();
        let secret = resolve(&provider, &spec).await.unwrap();
        assert_eq!(secret.value.as_deref(), Some("value-1"));
    }

    #[tokio::test]
    async fn no_shift_resolves_by_label() {
        let provider = seeded_provider();
        let spec = crate::spec::parse("n:AWSPREVIOUS").unwrap();
        let secret = resolve(&provider, &spec).await.unwrap();
        assert_eq!(secret.value.as_deref(), Some("value-2"));
    }

    #[tokio::test]
    async fn shift_one_from_latest_steps_back_one_version() {
        let provider = seeded_provider();
        let spec = crate::spec::parse("n~1").unwrap();
        let secret = resolve(&provider, &spec).await.unwrap();
        assert_eq!(secret.value.as_deref(), Some("value-2"));
    }

    #[tokio::test]
    async fn shift_from_label_anchor() {
        let provider = seeded_provider();
        let spec = crate::spec::parse("n:AWSCURRENT~2").unwrap();
        let secret = resolve(&provider, &spec).await.unwrap();
        assert_eq!(secret.value.as_deref(), Some("value-1"));
    }

    #[tokio::test]
    async fn shift_out_of_range_errors() {
        let provider = seeded_provider();
        let spec = crate::spec::parse("n~10").unwrap();
        let err = resolve(&provider, &spec).await.unwrap_err();
        assert_eq!(err.kind(), "ShiftOutOfRange");
    }

    #[tokio::test]
    async fn unknown_id_on_no_shift_path_returns_the_providers_error_unchanged() {
        let provider = seeded_provider();
        let spec = crate::spec::parse("n#doesnotexist").unwrap();
        let err = resolve(&provider, &spec).await.unwrap_err();
        assert_eq!(err.kind(), "ProviderError");
    }

    #[tokio::test]
    async fn unknown_label_on_no_shift_path_returns_the_providers_error_unchanged() {
        let provider = seeded_provider();
        let spec = crate::spec::parse("n:NOSUCHLABEL").unwrap();
        let err = resolve(&provider, &spec).await.unwrap_err();
        assert_eq!(err.kind(), "ProviderError");
    }

    #[tokio::test]
    async fn unknown_id_on_shift_path_fails_version_id_not_found() {
        let provider = seeded_provider();
        let spec = crate::spec::parse("n#doesnotexist~1").unwrap();
        let err = resolve(&provider, &spec).await.unwrap_err();
        assert_eq!(err.kind(), "VersionIdNotFound");
    }

    #[tokio::test]
    async fn unknown_label_on_shift_path_fails_label_not_found() {
        let provider = seeded_provider();
        let spec = crate::spec::parse("n:NOSUCHLABEL~1").unwrap();
        let err = resolve(&provider, &spec).await.unwrap_err();
        assert_eq!(err.kind(), "LabelNotFound");
    }

    #[test]
    fn sort_places_undated_versions_last() {
        let now = Utc::now();
        let mut versions = vec![
            SecretVersion { version_id: "a".into(), created_at: None, stages: Default::default() },
            SecretVersion { version_id: "b".into(), created_at: Some(now), stages: Default::default() },
            SecretVersion { version_id: "c".into(), created_at: Some(now - Duration::days(1)), stages: Default::default() },
        ];
        sort_versions_descending(&mut versions);
        assert_eq!(versions[0].version_id, "b");
        assert_eq!(versions[1].version_id, "c");
        assert_eq!(versions[2].version_id, "a");
    }
}
