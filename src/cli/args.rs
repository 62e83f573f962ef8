//! # CLI Argument Definitions
//!
//! `clap` derive tree. `secret {...}` and `param {...}` share the same
//! verb set ([`EntryCommand`]) since the only difference between the two
//! services is which [`crate::provider::EntryProvider`] backs them — see
//! SPEC_FULL.md §6's expansion note.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "suve", version, about = "Git-like CLI for cloud secrets and parameters")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// AWS region; falls back to AWS_REGION / AWS_DEFAULT_REGION / us-east-1.
    #[arg(long, global = true)]
    pub region: Option<String>,

    /// Named AWS profile; falls back to AWS_PROFILE.
    #[arg(long, global = true)]
    pub profile: Option<String>,

    /// Account identifier used only to namespace local staged changes.
    #[arg(long, global = true)]
    pub account: Option<String>,

    /// Where staged entries/tags are persisted. Defaults to ~/.suve/staging.
    #[arg(long, global = true)]
    pub staging_path: Option<PathBuf>,

    /// Keep staged changes in memory only; nothing survives process exit.
    #[arg(long, global = true)]
    pub in_memory_store: bool,

    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Operate on AWS Secrets Manager entries.
    Secret {
        #[command(subcommand)]
        command: EntryCommand,
    },
    /// Operate on AWS Systems Manager Parameter Store entries.
    Param {
        #[command(subcommand)]
        command: EntryCommand,
    },
    /// Replay staged changes against the remote provider.
    Apply(ApplyArgs),
}

#[derive(Debug, Subcommand)]
pub enum EntryCommand {
    /// Print the value (and metadata) at a resolved revision.
    Show(ShowArgs),
    /// List every entry's name and description.
    List(ListArgs),
    /// Print the version history of one entry.
    Log(LogArgs),
    /// Compare two revisions.
    Diff {
        /// 1-3 positional args; see the version-spec grammar.
        args: Vec<String>,
    },
    /// Stage a new entry.
    Create {
        name: String,
        value: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// Stage a value change for an existing entry.
    Update { name: String, value: String },
    /// Stage deletion of an entry.
    Delete(DeleteArgs),
    /// Immediately restore an entry pending deletion (not staged — this
    /// calls the provider directly, undoing a recovery-window delete).
    Restore { name: String },
    /// Stage tags to add/overwrite.
    Tag {
        name: String,
        /// `key=value` pairs.
        pairs: Vec<String>,
    },
    /// Stage tag keys to remove.
    Untag { name: String, keys: Vec<String> },
    /// Discard any staged change for an entry.
    Reset { name: String },
}

#[derive(Debug, Args)]
pub struct ShowArgs {
    pub spec: String,
    #[arg(long)]
    pub parse_json: bool,
    #[arg(long)]
    pub raw: bool,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    #[arg(long)]
    pub show: bool,
}

#[derive(Debug, Args)]
pub struct LogArgs {
    pub name: String,
    #[arg(long)]
    pub number: Option<usize>,
    #[arg(long)]
    pub reverse: bool,
    /// Show a diff between each pair of consecutive displayed versions.
    #[arg(long)]
    pub patch: bool,
}

#[derive(Debug, Args)]
pub struct DeleteArgs {
    pub name: String,
    /// 7-30 days; omit for the provider default. 0 skips the recovery
    /// window entirely (immediate deletion at apply time).
    #[arg(long)]
    pub recovery_window: Option<u32>,
}

#[derive(Debug, Args)]
pub struct ApplyArgs {
    #[arg(long, value_enum)]
    pub service: ServiceArg,
    /// Override apply-time conflict detection.
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ServiceArg {
    Secret,
    Param,
}

impl From<ServiceArg> for crate::model::Service {
    fn from(value: ServiceArg) -> Self {
        match value {
            ServiceArg::Secret => crate::model::Service::Secret,
            ServiceArg::Param => crate::model::Service::Param,
        }
    }
}
