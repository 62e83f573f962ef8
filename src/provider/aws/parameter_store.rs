//! # AWS Parameter Store Adapter
//!
//! Concrete [`EntryProvider`] implementation backed by AWS Systems Manager
//! Parameter Store, mirroring [`super::AwsSecretsManager`]'s shape. SSM has
//! no notion of soft-delete/restore, so [`AwsParameterStore::restore_entry`]
//! is a hard error — `suve` surfaces that as a provider-level failure rather
//! than pretending the operation exists.

use crate::model::{EntryListItem, Secret, SecretVersion, WriteResult};
use crate::provider::common::record_operation;
use crate::provider::EntryProvider;
use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_sdk_ssm::types::{ParameterType, ResourceTypeForTagging, Tag};
use aws_sdk_ssm::Client as SsmClient;
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug_span, info_span, Instrument};

/// AWS Parameter Store provider implementation.
pub struct AwsParameterStore {
    client: SsmClient,
    region: String,
}

impl std::fmt::Debug for AwsParameterStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsParameterStore")
            .field("region", &self.region)
            .finish_non_exhaustive()
    }
}

impl AwsParameterStore {
    pub async fn new(region: impl Into<String>) -> Self {
        let region = region.into();
        let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(region.clone()))
            .load()
            .await;
        Self {
            client: SsmClient::new(&sdk_config),
            region,
        }
    }
}

#[async_trait]
impl EntryProvider for AwsParameterStore {
    async fn get_entry(
        &self,
        name: &str,
        version_id: Option<&str>,
        version_stage: Option<&str>,
    ) -> Result<Secret> {
        let span = debug_span!("aws.parameter.get", parameter.name = name, region = %self.region);
        let start = Instant::now();
        async move {
            // SSM addresses a revision as `name:version`; a staging label
            // resolves through get_parameter_history instead since
            // put_parameter tags (labels) aren't queryable via get_parameter.
            let lookup_name = match version_id {
                Some(v) => format!("{name}:{v}"),
                None => name.to_string(),
            };

            if let Some(stage) = version_stage {
                return self.get_entry_by_label(name, stage).await;
            }

            let resp = self
                .client
                .get_parameter()
                .name(&lookup_name)
                .with_decryption(true)
                .send()
                .await
                .with_context(|| format!("failed to get parameter '{name}'"))?;

            let param = resp
                .parameter()
                .with_context(|| format!("parameter '{name}' returned no value"))?;

            record_operation("aws", "param", "get", start, true);
            Ok(Secret {
                name: param.name().unwrap_or(name).to_string(),
                arn: param.arn().map(ToString::to_string),
                version_id: Some(param.version().to_string()),
                stages: Default::default(),
                created_at: param.last_modified_date().and_then(super::to_chrono),
                modified_at: param.last_modified_date().and_then(super::to_chrono),
                value: param.value().map(ToString::to_string),
            })
        }
        .instrument(span)
        .await
    }

    async fn get_versions(&self, name: &str) -> Result<Vec<SecretVersion>> {
        let span = debug_span!("aws.parameter.get_versions", parameter.name = name, region = %self.region);
        async move {
            let mut versions = Vec::new();
            let mut stream = self.client.get_parameter_history().name(name).into_paginator().send();
            while let Some(page) = stream.next().await {
                let page = page.with_context(|| format!("failed to list history for '{name}'"))?;
                for entry in page.parameters() {
                    versions.push(SecretVersion {
                        version_id: entry.version().to_string(),
                        created_at: entry.last_modified_date().and_then(super::to_chrono),
                        stages: entry.labels().iter().cloned().collect(),
                    });
                }
            }
            Ok(versions)
        }
        .instrument(span)
        .await
    }

    async fn list_entries(&self) -> Result<Vec<EntryListItem>> {
        let span = info_span!("aws.parameter.list", region = %self.region);
        async move {
            let mut items = Vec::new();
            let mut stream = self.client.describe_parameters().into_paginator().send();
            while let Some(page) = stream.next().await {
                let page = page.context("failed to list parameters")?;
                for entry in page.parameters() {
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
        let span = info_span!("aws.parameter.create", parameter.name = name, region = %self.region);
        let start = Instant::now();
        async move {
            let mut req = self
                .client
                .put_parameter()
                .name(name)
                .value(value)
                .r#type(ParameterType::String)
                .overwrite(false);
            if let Some(desc) = description {
                req = req.description(desc);
            }
            let resp = req
                .send()
                .await
                .with_context(|| format!("failed to create parameter '{name}'"));
            record_operation("aws", "param", "create", start, resp.is_ok());
            let resp = resp?;
            Ok(WriteResult {
                name: name.to_string(),
                arn: None,
                version_id: Some(resp.version().to_string()),
                deletion_date: None,
            })
        }
        .instrument(span)
        .await
    }

    async fn update_entry(&self, name: &str, value: &str) -> Result<WriteResult> {
        let span = info_span!("aws.parameter.update", parameter.name = name, region = %self.region);
        let start = Instant::now();
        async move {
            let resp = self
                .client
                .put_parameter()
                .name(name)
                .value(value)
                .r#type(ParameterType::String)
                .overwrite(true)
                .send()
                .await
                .with_context(|| format!("failed to update parameter '{name}'"));
            record_operation("aws", "param", "update", start, resp.is_ok());
            let resp = resp?;
            Ok(WriteResult {
                name: name.to_string(),
                arn: None,
                version_id: Some(resp.version().to_string()),
                deletion_date: None,
            })
        }
        .instrument(span)
        .await
    }

    async fn delete_entry(&self, name: &str, _force: bool) -> Result<WriteResult> {
        let span = info_span!("aws.parameter.delete", parameter.name = name, region = %self.region);
        let start = Instant::now();
        async move {
            let resp = self
                .client
                .delete_parameter()
                .name(name)
                .send()
                .await
                .with_context(|| format!("failed to delete parameter '{name}'"));
            record_operation("aws", "param", "delete", start, resp.is_ok());
            resp?;
            Ok(WriteResult {
                name: name.to_string(),
                arn: None,
                version_id: None,
                deletion_date: None,
            })
        }
        .instrument(span)
        .await
    }

    async fn restore_entry(&self, name: &str) -> Result<WriteResult> {
        Err(anyhow::anyhow!(
            "parameter store has no recycle bin; '{name}' cannot be restored"
        ))
    }

    async fn get_tags(&self, name: &str) -> Result<BTreeMap<String, String>> {
        let resp = self
            .client
            .list_tags_for_resource()
            .resource_type(ResourceTypeForTagging::Parameter)
            .resource_id(name)
            .send()
            .await
            .with_context(|| format!("failed to list tags for '{name}'"))?;
        Ok(resp
            .tag_list()
            .iter()
            .map(|t| (t.key().to_string(), t.value().to_string()))
            .collect())
    }

    async fn add_tags(&self, name: &str, tags: &BTreeMap<String, String>) -> Result<()> {
        if tags.is_empty() {
            return Ok(());
        }
        let aws_tags = tags
            .iter()
            .map(|(k, v)| Tag::builder().key(k).value(v).build().expect("key and value set"))
            .collect::<Vec<_>>();
        self.client
            .add_tags_to_resource()
            .resource_type(ResourceTypeForTagging::Parameter)
            .resource_id(name)
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
            .remove_tags_from_resource()
            .resource_type(ResourceTypeForTagging::Parameter)
            .resource_id(name)
            .set_tag_keys(Some(keys.to_vec()))
            .send()
            .await
            .with_context(|| format!("failed to remove tags from '{name}'"))?;
        Ok(())
    }
}

impl AwsParameterStore {
    async fn get_entry_by_label(&self, name: &str, label: &str) -> Result<Secret> {
        let mut stream = self.client.get_parameter_history().name(name).into_paginator().send();
        while let Some(page) = stream.next().await {
            let page = page.with_context(|| format!("failed to list history for '{name}'"))?;
            for entry in page.parameters() {
                if entry.labels().iter().any(|l| l == label) {
                    return Ok(Secret {
                        name: name.to_string(),
                        arn: None,
                        version_id: Some(entry.version().to_string()),
                        stages: entry.labels().iter().cloned().collect(),
                        created_at: entry.last_modified_date().and_then(super::to_chrono),
                        modified_at: entry.last_modified_date().and_then(super::to_chrono),
                        value: entry.value().map(ToString::to_string),
                    });
                }
            }
        }
        Err(anyhow::anyhow!("no version of '{name}' carries label '{label}'"))
    }
}
