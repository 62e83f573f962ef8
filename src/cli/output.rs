//! # Output Rendering
//!
//! Text and JSON renderers for each command's result, per SPEC_FULL.md §6's
//! JSON shapes. JSON uses `serde_json::to_string_pretty`; text mirrors the
//! teacher's plain `println!`/fixed-width-column style.

use super::args::OutputFormat;
use crate::apply::{ApplyResult, Outcome};
use crate::model::{EntryListItem, Secret, SecretVersion, WriteResult};
use crate::staging::EntryStagedState;
use serde::Serialize;
use std::collections::BTreeMap;

pub fn render_show(format: OutputFormat, secret: &Secret, tags: &BTreeMap<String, String>, raw: bool) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            #[derive(Serialize)]
            struct ShowJson<'a> {
                name: &'a str,
                arn: &'a Option<String>,
                #[serde(rename = "versionId")]
                version_id: &'a Option<String>,
                stages: &'a std::collections::BTreeSet<String>,
                created: &'a Option<chrono::DateTime<chrono::Utc>>,
                tags: &'a BTreeMap<String, String>,
                value: &'a Option<String>,
            }
            let json = ShowJson {
                name: &secret.name,
                arn: &secret.arn,
                version_id: &secret.version_id,
                stages: &secret.stages,
                created: &secret.created_at,
                tags,
                value: &secret.value,
            };
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Text => {
            println!("name:    {}", secret.name);
            if let Some(arn) = &secret.arn {
                println!("arn:     {arn}");
            }
            if let Some(id) = &secret.version_id {
                println!("version: {id}");
            }
            if !secret.stages.is_empty() {
                println!("stages:  {}", secret.stages.iter().cloned().collect::<Vec<_>>().join(", "));
            }
            if let Some(created) = secret.created_at {
                println!("created: {created}");
            }
            for (k, v) in tags {
                println!("tag:     {k}={v}");
            }
            match &secret.value {
                Some(v) if raw => println!("{v}"),
                Some(v) => println!("value:   {v}"),
                None => println!("value:   <none>"),
            }
        }
    }
    Ok(())
}

pub fn render_list(format: OutputFormat, items: &[EntryListItem]) {
    match format {
        OutputFormat::Json => {
            if let Ok(json) = serde_json::to_string_pretty(items) {
                println!("{json}");
            }
        }
        OutputFormat::Text => {
            for item in items {
                println!("{:<40} {}", item.name, item.description.as_deref().unwrap_or(""));
            }
        }
    }
}

pub fn render_list_with_values(format: OutputFormat, items: &[EntryListItem], values: &[Result<String, String>]) {
    match format {
        OutputFormat::Json => {
            #[derive(Serialize)]
            struct ListShowJson<'a> {
                name: &'a str,
                description: Option<&'a str>,
                value: Option<&'a str>,
                error: Option<&'a str>,
            }
            let json: Vec<ListShowJson> = items
                .iter()
                .zip(values.iter())
                .map(|(item, value)| {
                    let (value, error) = match value {
                        Ok(v) => (Some(v.as_str()), None),
                        Err(e) => (None, Some(e.as_str())),
                    };
                    ListShowJson { name: &item.name, description: item.description.as_deref(), value, error }
                })
                .collect();
            if let Ok(s) = serde_json::to_string_pretty(&json) {
                println!("{s}");
            }
        }
        OutputFormat::Text => {
            for (item, value) in items.iter().zip(values.iter()) {
                match value {
                    Ok(v) => println!("{}\t{}", item.name, v),
                    Err(e) => println!("{}\t<error: {e}>", item.name),
                }
            }
        }
    }
}

pub fn render_log(format: OutputFormat, versions: &[SecretVersion]) {
    #[derive(Serialize)]
    struct LogEntryJson<'a> {
        #[serde(rename = "versionId")]
        version_id: &'a str,
        stages: &'a std::collections::BTreeSet<String>,
        created: &'a Option<chrono::DateTime<chrono::Utc>>,
    }

    match format {
        OutputFormat::Json => {
            let json: Vec<LogEntryJson> = versions
                .iter()
                .map(|v| LogEntryJson { version_id: &v.version_id, stages: &v.stages, created: &v.created_at })
                .collect();
            if let Ok(s) = serde_json::to_string_pretty(&json) {
                println!("{s}");
            }
        }
        OutputFormat::Text => {
            for v in versions {
                let created = v.created_at.map(|c| c.to_rfc3339()).unwrap_or_else(|| "-".to_string());
                let stages = v.stages.iter().cloned().collect::<Vec<_>>().join(",");
                println!("{:<10} {:<30} {}", v.short_id(), created, stages);
            }
        }
    }
}

pub fn render_log_with_patch(format: OutputFormat, versions: &[SecretVersion], diffs: &[Option<String>]) {
    #[derive(Serialize)]
    struct LogPatchJson<'a> {
        #[serde(rename = "versionId")]
        version_id: &'a str,
        stages: &'a std::collections::BTreeSet<String>,
        created: &'a Option<chrono::DateTime<chrono::Utc>>,
        diff: Option<&'a str>,
    }

    match format {
        OutputFormat::Json => {
            let json: Vec<LogPatchJson> = versions
                .iter()
                .zip(diffs.iter())
                .map(|(v, d)| LogPatchJson {
                    version_id: &v.version_id,
                    stages: &v.stages,
                    created: &v.created_at,
                    diff: d.as_deref(),
                })
                .collect();
            if let Ok(s) = serde_json::to_string_pretty(&json) {
                println!("{s}");
            }
        }
        OutputFormat::Text => {
            for (v, d) in versions.iter().zip(diffs.iter()) {
                let created = v.created_at.map(|c| c.to_rfc3339()).unwrap_or_else(|| "-".to_string());
                let stages = v.stages.iter().cloned().collect::<Vec<_>>().join(",");
                println!("{:<10} {:<30} {}", v.short_id(), created, stages);
                if let Some(diff) = d {
                    for line in diff.lines() {
                        println!("  {line}");
                    }
                }
            }
        }
    }
}

pub fn render_diff(format: OutputFormat, old: &Secret, new: &Secret) {
    let identical = old.value == new.value;
    match format {
        OutputFormat::Json => {
            #[derive(Serialize)]
            struct DiffJson<'a> {
                #[serde(rename = "oldName")]
                old_name: &'a str,
                #[serde(rename = "oldVersionId")]
                old_version_id: &'a Option<String>,
                #[serde(rename = "oldValue")]
                old_value: &'a Option<String>,
                #[serde(rename = "newName")]
                new_name: &'a str,
                #[serde(rename = "newVersionId")]
                new_version_id: &'a Option<String>,
                #[serde(rename = "newValue")]
                new_value: &'a Option<String>,
                identical: bool,
            }
            let json = DiffJson {
                old_name: &old.name,
                old_version_id: &old.version_id,
                old_value: &old.value,
                new_name: &new.name,
                new_version_id: &new.version_id,
                new_value: &new.value,
                identical,
            };
            if let Ok(s) = serde_json::to_string_pretty(&json) {
                println!("{s}");
            }
        }
        OutputFormat::Text => {
            if identical {
                println!("no differences");
                return;
            }
            println!("--- {} ({})", old.name, old.version_id.as_deref().unwrap_or("latest"));
            println!("+++ {} ({})", new.name, new.version_id.as_deref().unwrap_or("latest"));
            println!("-{}", old.value.as_deref().unwrap_or(""));
            println!("+{}", new.value.as_deref().unwrap_or(""));
        }
    }
}

pub fn render_staged(format: OutputFormat, name: &str, state: &EntryStagedState) {
    let label = match state {
        EntryStagedState::NotStaged => "unstaged",
        EntryStagedState::Create(_) => "staged (create)",
        EntryStagedState::Update(_) => "staged (update)",
        EntryStagedState::Delete => "staged (delete)",
    };
    match format {
        OutputFormat::Json => {
            #[derive(Serialize)]
            struct StagedJson<'a> {
                name: &'a str,
                state: &'a str,
            }
            if let Ok(s) = serde_json::to_string_pretty(&StagedJson { name, state: label }) {
                println!("{s}");
            }
        }
        OutputFormat::Text => println!("{name}: {label}"),
    }
}

pub fn render_tag_staged(format: OutputFormat, name: &str) {
    match format {
        OutputFormat::Json => println!("{{\"name\": \"{name}\", \"state\": \"tags staged\"}}"),
        OutputFormat::Text => println!("{name}: tags staged"),
    }
}

pub fn render_write_result(format: OutputFormat, result: &WriteResult) {
    match format {
        OutputFormat::Json => {
            if let Ok(s) = serde_json::to_string_pretty(result) {
                println!("{s}");
            }
        }
        OutputFormat::Text => println!("{}: {}", result.name, result.version_id.as_deref().unwrap_or("-")),
    }
}

pub fn render_apply_results(format: OutputFormat, results: &[ApplyResult]) {
    match format {
        OutputFormat::Json => {
            #[derive(Serialize)]
            struct ResultJson<'a> {
                name: &'a str,
                outcome: String,
            }
            let json: Vec<ResultJson> = results
                .iter()
                .map(|r| ResultJson { name: &r.name, outcome: outcome_label(&r.outcome) })
                .collect();
            if let Ok(s) = serde_json::to_string_pretty(&json) {
                println!("{s}");
            }
        }
        OutputFormat::Text => {
            for r in results {
                println!("{:<30} {}", r.name, outcome_label(&r.outcome));
            }
        }
    }
}

fn outcome_label(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Applied => "applied".to_string(),
        Outcome::Conflicted => "conflicted".to_string(),
        Outcome::Failed(reason) => format!("failed: {reason}"),
        Outcome::Skipped => "skipped".to_string(),
    }
}
