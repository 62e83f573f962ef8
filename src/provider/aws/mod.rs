//! # AWS Secrets Manager Adapter
//!
//! Concrete [`EntryProvider`] implementation backed by AWS Secrets Manager.
//! Instrumentation follows the teacher controller's pattern: one
//! `info_span!`/`debug_span!` per provider call, carrying `secret.name` and
//! `region`, with outcomes recorded via [`crate::provider::common::record_operation`].

use crate::model::{EntryListItem, Secret, SecretVersion, WriteResult};
use crate::provider::common::record_operation;
use crate::provider::EntryProvider;
use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_sdk_secretsmanager::Client as SecretsManagerClient;
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug_span, info_span, Instrument};

pub mod parameter_store;
pub use parameter_store::AwsParameterStore;

/// AWS Secrets Manager provider implementation.
pub struct AwsSecretsManager {
    client: SecretsManagerClient,
    region: String,
}

impl std::fmt::Debug for AwsSecretsManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsSecretsManager")
            .field("region", &self.region)
            .finish_non_exhaustive()
    }
}

impl AwsSecretsManager {
    /// Build a client from the default AWS credential chain (env vars,
    /// shared config/profile, or instance/task role) for `region`.
    pub async fn new(region: impl Into<String>) -> Self {
        let region = region.into();
        let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(region.clone()))
            .load()
            .await;
        Self {
            client: SecretsManagerClient::new(&sdk_config),
            region,
        }
    }
}

#[async_trait]
impl EntryProvider for AwsSecretsManager {
    async fn get_entry(
        &self,
        name: &str,
        version_id: Option<&str>,
        version_stage: Option<&str>,
    ) -> Result<Secret> {
        let span = debug_span!("aws.secret.get", secret.name = name, region = %self.region);
        let start = Instant::now();
        async move {
            let mut req = self.client.get_secret_value().secret_id(name);
            if let Some(id) = version_id {
                req = req.version_id(id);
            }
            if let Some(stage) = version_stage {
                req = req.version_stage(stage);
            }
            let resp = req
                .send()
                .await
                .with_context(|| format!("failed to get secret '{name}'"))?;

            let value = resp.secret_string().map(ToString::to_string).or_else(|| {
                resp.secret_binary()
                    .map(|b| String::from_utf8_lossy(b.as_ref()).to_string())
            });

            record_operation("aws", "secret", "get", start, true);
            Ok(Secret {
                name: resp.name().unwrap_or(name).to_string(),
                arn: resp.arn().map(ToString::to_string),
                version_id: resp.version_id().map(ToString::to_string),
                stages: resp.version_stages().iter().cloned().collect(),
                created_at: resp.created_date().and_then(to_chrono),
                modified_at: resp.created_date().and_then(to_chrono),
                value,
            })
        }
        .instrument(span)
        .await
    }

    async fn get_versions(&self, name: &str) -> Result<Vec<SecretVersion>> {
        let span = debug_span!("aws.secret.get_versions", secret.name = name, region = %self.region);
        async move {
            let resp = self
                .client
                .list_secret_version_ids()
                .secret_id(name)
                .include_deprecated(false)
                .send()
                .await
                .with_context(|| format!("failed to list versions for '{name}'"))?;

            Ok(resp
                .versions()
                .iter()
                .map(|v| SecretVersion {
                    version_id: v.version_id().unwrap_or_default().to_string(),
                    created_at: v.created_date().and_then(to_chrono),
                    stages: v.version_stages().iter().cloned().collect(),
                })
                .collect())
        }
        .instrument(span)
        .await
    }

    async fn list_entries(&self) -> Result<Vec<EntryListItem>> {
        let span = info_span!("aws.secret.list", region = %self.region);
        async move {
            let mut items = Vec::new();
            let mut stream = self.client.list_secrets().into_paginator().send();
            while let Some(page) = stream.next().await {
                let page = page.context("failed to list secrets")?;
                for entry in page.secret_list() {
                    items.push(EntryListItem {
                        name: entry.name().unwrap_or_default().to_string(),
                        arn: entry.arn().map(ToString::to_string),
                        description: entry.description().map(ToString::to_string),
                    });
                }
            }
            Ok(items)
        }
        .instrument(span)
        .await
    }

    async fn create_entry(&self, name: &str, value: &str, description: Option<&str>) -> Result<WriteResult> {
        let span = info_span!("aws.secret.create", secret.name = name, region = %self.region);
        let start = Instant::now();
        async move {
            let mut req = self.client.create_secret().name(name).secret_string(value);
            if let Some(desc) = description {
                req = req.description(desc);
            }
            let resp = req
                .send()
                .await
                .with_context(|| format!("failed to create secret '{name}'"));
            record_operation("aws", "secret", "create", start, resp.is_ok());
            let resp = resp?;
            Ok(WriteResult {
                name: resp.name().unwrap_or(name).to_string(),
                arn: resp.arn().map(ToString::to_string),
                version_id: resp.version_id().map(ToString::to_string),
                deletion_date: None,
            })
        }
        .instrument(span)
        .await
    }

    async fn update_entry(&self, name: &str, value: &str) -> Result<WriteResult> {
        let span = info_span!("aws.secret.update", secret.name = name, region = %self.region);
        let start = Instant::now();
        async move {
            let resp = self
                .client
                .put_secret_value()
                .secret_id(name)
                .secret_string(value)
                .send()
                .await
                .with_context(|| format!("failed to update secret '{name}'"));
            record_operation("aws", "secret", "update", start, resp.is_ok());
            let resp = resp?;
            Ok(WriteResult {
                name: resp.name().unwrap_or(name).to_string(),
                arn: resp.arn().map(ToString::to_string),
                version_id: resp.version_id().map(ToString::to_string),
                deletion_date: None,
            })
        }
        .instrument(span)
        .await
    }

    async fn delete_entry(&self, name: &str, force: bool) -> Result<WriteResult> {
        let span = info_span!("aws.secret.delete", secret.name = name, region = %self.region, force);
        let start = Instant::now();
        async move {
            let resp = self
                .client
                .delete_secret()
                .secret_id(name)
                .force_delete_without_recovery(force)
                .send()
                .await
                .with_context(|| format!("failed to delete secret '{name}'"));
            record_operation("aws", "secret", "delete", start, resp.is_ok());
            let resp = resp?;
            Ok(WriteResult {
                name: resp.name().unwrap_or(name).to_string(),
                arn: resp.arn().map(ToString::to_string),
                version_id: None,
                deletion_date: resp.deletion_date().and_then(to_chrono),
            })
        }
        .instrument(span)
        .await
    }

    async fn restore_entry(&self, name: &str) -> Result<WriteResult> {
        let span = info_span!("aws.secret.restore", secret.name = name, region = %self.region);
        async move {
            let resp = self
                .client
                .restore_secret()
                .secret_id(name)
                .send()
                .await
                .with_context(|| format!("failed to restore secret '{name}'"))?;
            Ok(WriteResult {
                name: resp.name().unwrap_or(name).to_string(),
                arn: resp.arn().map(ToString::to_string),
                version_id: None,
                deletion_date: None,
            })
        }
        .instrument(span)
        .await
    }

    async fn get_tags(&self, name: &str) -> Result<BTreeMap<String, String>> {
        let resp = self
            .client
            .describe_secret()
            .secret_id(name)
            .send()
            .await
            .with_context(|| format!("failed to describe secret '{name}'"))?;
        Ok(resp
            .tags()
            .iter()
            .filter_map(|t| Some((t.key()?.to_string(), t.value().unwrap_or_default().to_string())))
            .collect())
    }

    async fn add_tags(&self, name: &str, tags: &BTreeMap<String, String>) -> Result<()> {
        if tags.is_empty() {
            return Ok(());
        }
        let aws_tags = tags
            .iter()
            .map(|(k, v)| aws_sdk_secretsmanager::types::Tag::builder().key(k).value(v).build())
            .collect::<Vec<_>>();
        self.client
            .tag_resource()
            .secret_id(name)
            .set_tags(Some(aws_tags))
            .send()
            .await
            .with_context(|| format!("failed to add tags to '{name}'"))?;
        Ok(())
    }

    async fn remove_tags(&self, name: &str, keys: &[String]) -> Result<()> {
        if keys.is_empty() {
            return Ok(());
        }
        self.client
            .untag_resource()
            .secret_id(name)
            .set_tag_keys(Some(keys.to_vec()))
            .send()
            .await
            .with_context(|| format!("failed to remove tags from '{name}'"))?;
        Ok(())
    }
}

/// Convert an AWS SDK `DateTime` to a `chrono::DateTime<Utc>`; `None` on any
/// value the SDK cannot express as a valid instant.
pub(crate) fn to_chrono(dt: &aws_smithy_types::DateTime) -> Option<chrono::DateTime<chrono::Utc>> {
    chrono::DateTime::from_timestamp(dt.secs(), dt.subsec_nanos())
}

#[cfg(test)]
mod tests {
    #[test]
    fn secret_name_validation() {
        // AWS Secrets Manager secret names must be 1-512 characters.
        let valid_names = ["my-secret", "my/secret/path", "my_secret_123", "my+secret=test", "my.secret@test"];
        for name in valid_names {
            assert!(!name.is_empty() && name.len() <= 512, "secret name {name} should be valid");
        }
    }
}
