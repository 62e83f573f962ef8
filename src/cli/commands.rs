//! # Command Dispatch
//!
//! Wires one parsed [`Cli`] invocation to the resolver, staging engine, and
//! apply engine: build a [`Config`], build the right [`EntryProvider`] and
//! [`StagingStore`] for it, run the command, render the result.

use super::args::{ApplyArgs, Cli, Command, DeleteArgs, EntryCommand, ListArgs, LogArgs, OutputFormat, ShowArgs};
use super::output;
use crate::apply;
use crate::config::{Config, StoreConfig};
use crate::diff_args;
use crate::model::{Secret, Service};
use crate::provider::aws::{AwsParameterStore, AwsSecretsManager};
use crate::provider::EntryProvider;
use crate::resolver;
use crate::spec;
use crate::staging::reducer::EntryAction;
use crate::staging::store_file::FileStagingStore;
use crate::staging::store_memory::MemoryStagingStore;
use crate::staging::{executor, StagingStore};
use anyhow::{bail, Context, Result};
use futures::future::join_all;
use std::collections::BTreeMap;
use tracing::instrument;

pub async fn run(cli: Cli) -> Result<()> {
    let config = Config::resolve(
        cli.global.region,
        cli.global.profile,
        cli.global.account,
        cli.global.staging_path,
        cli.global.in_memory_store,
    );
    if let Some(profile) = &config.aws_profile {
        std::env::set_var("AWS_PROFILE", profile);
    }
    let output_format = cli.global.output;

    match cli.command {
        Command::Secret { command } => run_entry_command(Service::Secret, command, &config, output_format).await,
        Command::Param { command } => run_entry_command(Service::Param, command, &config, output_format).await,
        Command::Apply(args) => run_apply(args, &config, output_format).await,
    }
}

async fn build_provider(service: Service, config: &Config) -> Box<dyn EntryProvider> {
    match service {
        Service::Secret => Box::new(AwsSecretsManager::new(config.aws_region.clone()).await),
        Service::Param => Box::new(AwsParameterStore::new(config.aws_region.clone()).await),
    }
}

fn build_store(config: &Config) -> Box<dyn StagingStore> {
    match &config.store {
        StoreConfig::Memory => Box::new(MemoryStagingStore::new()),
        StoreConfig::File { path } => Box::new(FileStagingStore::new(path.clone())),
    }
}

/// The remote's existence/modified-at, used to fill in the transition
/// table's `remote_exists` parameter and to stamp `base_modified_at` on new
/// drafts. A provider error here just means "no remote entry" — the staged
/// action itself will fail on its own terms if that turns out to be wrong.
async fn remote_snapshot(provider: &dyn EntryProvider, name: &str) -> Option<Secret> {
    provider.get_entry(name, None, None).await.ok()
}

#[instrument(skip(config), fields(service = %service))]
async fn run_entry_command(
    service: Service,
    command: EntryCommand,
    config: &Config,
    output_format: OutputFormat,
) -> Result<()> {
    let scope = config.scope.key();

    match command {
        EntryCommand::Show(args) => run_show(service, args, config, output_format).await,
        EntryCommand::List(args) => run_list(service, args, config, output_format).await,
        EntryCommand::Log(args) => run_log(service, args, config, output_format).await,
        EntryCommand::Diff { args } => run_diff(service, &args, config, output_format).await,
        EntryCommand::Create { name, value, description } => {
            let provider = build_provider(service, config).await;
            let store = build_store(config);
            let remote = remote_snapshot(provider.as_ref(), &name).await;
            let state = executor::apply_entry_action(
                store.as_ref(),
                &scope,
                service,
                &name,
                EntryAction::Add { value, description },
                remote.is_some(),
                remote.and_then(|s| s.modified_at),
            )
            .await?;
            output::render_staged(output_format, &name, &state);
            Ok(())
        }
        EntryCommand::Update { name, value } => {
            let provider = build_provider(service, config).await;
            let store = build_store(config);
            let remote = remote_snapshot(provider.as_ref(), &name).await;
            let state = executor::apply_entry_action(
                store.as_ref(),
                &scope,
                service,
                &name,
                EntryAction::Edit { value },
                remote.is_some(),
                remote.and_then(|s| s.modified_at),
            )
            .await?;
            output::render_staged(output_format, &name, &state);
            Ok(())
        }
        EntryCommand::Delete(args) => run_delete(service, args, config, output_format).await,
        EntryCommand::Restore { name } => {
            let provider = build_provider(service, config).await;
            let result = provider.restore_entry(&name).await.context("restore failed")?;
            output::render_write_result(output_format, &result);
            Ok(())
        }
        EntryCommand::Tag { name, pairs } => {
            let provider = build_provider(service, config).await;
            let store = build_store(config);
            let add = parse_tag_pairs(&pairs)?;
            let remote = remote_snapshot(provider.as_ref(), &name).await;
            let remote_tags = provider.get_tags(&name).await.ok();
            let is_delete_staged = is_delete_staged(store.as_ref(), &scope, service, &name).await?;
            executor::apply_add_tags(
                store.as_ref(),
                &scope,
                service,
                &name,
                &add,
                remote_tags.as_ref(),
                is_delete_staged,
                remote.and_then(|s| s.modified_at),
            )
            .await?;
            output::render_tag_staged(output_format, &name);
            Ok(())
        }
        EntryCommand::Untag { name, keys } => {
            let provider = build_provider(service, config).await;
            let store = build_store(config);
            let keys: std::collections::BTreeSet<String> = keys.into_iter().collect();
            let remote = remote_snapshot(provider.as_ref(), &name).await;
            let remote_tag_keys = provider.get_tags(&name).await.ok().map(|m| m.keys().cloned().collect());
            let is_delete_staged = is_delete_staged(store.as_ref(), &scope, service, &name).await?;
            executor::apply_remove_tags(
                store.as_ref(),
                &scope,
                service,
                &name,
                &keys,
                remote_tag_keys.as_ref(),
                is_delete_staged,
                remote.and_then(|s| s.modified_at),
            )
            .await?;
            output::render_tag_staged(output_format, &name);
            Ok(())
        }
        EntryCommand::Reset { name } => {
            let store = build_store(config);
            let state =
                executor::apply_entry_action(store.as_ref(), &scope, service, &name, EntryAction::Reset, false, None)
                    .await?;
            output::render_staged(output_format, &name, &state);
            Ok(())
        }
    }
}

async fn run_show(service: Service, args: ShowArgs, config: &Config, output_format: OutputFormat) -> Result<()> {
    let provider = build_provider(service, config).await;
    let parsed = spec::parse(&args.spec)?;
    let secret = resolver::resolve(provider.as_ref(), &parsed).await?;
    let tags = provider.get_tags(&secret.name).await.unwrap_or_default();
    output::render_show(output_format, &secret, &tags, args.raw)
}

async fn run_list(service: Service, args: ListArgs, config: &Config, output_format: OutputFormat) -> Result<()> {
    let provider = build_provider(service, config).await;
    let items = provider.list_entries().await?;
    if args.show {
        let values = fetch_list_values(provider.as_ref(), &items).await;
        output::render_list_with_values(output_format, &items, &values);
    } else {
        output::render_list(output_format, &items);
    }
    Ok(())
}

/// Parallel fan-out: one value fetch per listed name. A per-name failure is
/// captured and surfaced inline rather than aborting the batch.
pub async fn fetch_list_values(
    provider: &dyn EntryProvider,
    items: &[crate::model::EntryListItem],
) -> Vec<std::result::Result<String, String>> {
    join_all(items.iter().map(|item| fetch_value(provider, &item.name))).await
}

async fn fetch_value(provider: &dyn EntryProvider, name: &str) -> std::result::Result<String, String> {
    provider
        .get_entry(name, None, None)
        .await
        .map(|s| s.value.unwrap_or_default())
        .map_err(|e| e.to_string())
}

async fn run_log(service: Service, args: LogArgs, config: &Config, output_format: OutputFormat) -> Result<()> {
    let provider = build_provider(service, config).await;
    let versions = displayed_versions(provider.as_ref(), &args).await?;

    if args.patch {
        let diffs = fetch_log_patch(provider.as_ref(), &args.name, &versions).await;
        output::render_log_with_patch(output_format, &versions, &diffs);
    } else {
        output::render_log(output_format, &versions);
    }
    Ok(())
}

/// Fetches, sorts (descending by default, or ascending with `--reverse`),
/// and truncates a log's version list to what `log` actually displays.
pub async fn displayed_versions(
    provider: &dyn EntryProvider,
    args: &LogArgs,
) -> Result<Vec<crate::model::SecretVersion>> {
    let mut versions = provider.get_versions(&args.name).await?;
    resolver::sort_versions_descending(&mut versions);
    if args.reverse {
        versions.reverse();
    }
    let limit = args.number.unwrap_or(crate::constants::DEFAULT_LIST_NUMBER);
    versions.truncate(limit);
    Ok(versions)
}

/// Parallel fan-out: every displayed version's value is fetched before the
/// diff chain between consecutive displayed versions is built.
pub async fn fetch_log_patch(
    provider: &dyn EntryProvider,
    name: &str,
    versions: &[crate::model::SecretVersion],
) -> Vec<Option<String>> {
    let values = join_all(versions.iter().map(|v| fetch_version_value(provider, name, &v.version_id))).await;
    consecutive_diffs(&values)
}

async fn fetch_version_value(
    provider: &dyn EntryProvider,
    name: &str,
    version_id: &str,
) -> std::result::Result<String, String> {
    provider
        .get_entry(name, Some(version_id), None)
        .await
        .map(|s| s.value.unwrap_or_default())
        .map_err(|e| e.to_string())
}

/// Diff chain between each displayed version and the one displayed before
/// it. The first displayed version has no predecessor, so it carries no
/// diff block; a version whose value could not be fetched is skipped rather
/// than diffed against a missing value.
fn consecutive_diffs(values: &[std::result::Result<String, String>]) -> Vec<Option<String>> {
    let mut diffs = Vec::with_capacity(values.len());
    for i in 0..values.len() {
        if i == 0 {
            diffs.push(None);
            continue;
        }
        diffs.push(match (&values[i - 1], &values[i]) {
            (Ok(prev), Ok(curr)) if prev != curr => Some(format!("-{prev}\n+{curr}")),
            _ => None,
        });
    }
    diffs
}

async fn run_diff(service: Service, args: &[String], config: &Config, output_format: OutputFormat) -> Result<()> {
    let provider = build_provider(service, config).await;
    let (spec1, spec2) = diff_args::parse_diff_args(args)?;
    let old = resolver::resolve(provider.as_ref(), &spec1).await?;
    let new = resolver::resolve(provider.as_ref(), &spec2).await?;
    output::render_diff(output_format, &old, &new);
    Ok(())
}

async fn run_delete(service: Service, args: DeleteArgs, config: &Config, output_format: OutputFormat) -> Result<()> {
    let provider = build_provider(service, config).await;
    let store = build_store(config);
    let scope = config.scope.key();
    let remote = remote_snapshot(provider.as_ref(), &args.name).await;
    let delete_without_recovery = args.recovery_window == Some(0);
    let state = executor::apply_entry_action_with_recovery(
        store.as_ref(),
        &scope,
        service,
        &args.name,
        EntryAction::Delete,
        remote.is_some(),
        remote.and_then(|s| s.modified_at),
        delete_without_recovery,
    )
    .await?;
    output::render_staged(output_format, &args.name, &state);
    Ok(())
}

async fn run_apply(args: ApplyArgs, config: &Config, output_format: OutputFormat) -> Result<()> {
    let service: Service = args.service.into();
    let provider = build_provider(service, config).await;
    let store = build_store(config);
    let scope = config.scope.key();
    let results = apply::apply(provider.as_ref(), store.as_ref(), &scope, service, args.force).await?;
    output::render_apply_results(output_format, &results);
    if results.iter().any(|r| !matches!(r.outcome, apply::Outcome::Applied)) {
        bail!("one or more staged changes failed to apply");
    }
    Ok(())
}

async fn is_delete_staged(store: &dyn StagingStore, scope: &str, service: Service, name: &str) -> Result<bool> {
    let staged = store.get_entry(scope, service, name).await?;
    Ok(matches!(staged.map(|e| e.operation), Some(crate::staging::Operation::Delete)))
}

fn parse_tag_pairs(pairs: &[String]) -> Result<BTreeMap<String, String>> {
    let mut map = BTreeMap::new();
    for pair in pairs {
        let (k, v) = pair
            .split_once('=')
            .with_context(|| format!("tag '{pair}' must be in key=value form"))?;
        map.insert(k.to_string(), v.to_string());
    }
    Ok(map)
}
