//! # Configuration
//!
//! `Config` is resolved from CLI flags plus environment, mirroring the shape
//! of the teacher's `AwsConfig`/`GcpConfig` CRD-spec structs without the CRD
//! machinery — `suve` has no daemon or cluster to own a config resource, so
//! flags + env are the idiomatic substitute.

use crate::model::Scope;
use std::path::PathBuf;

/// Where staged entries/tags are persisted between invocations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfig {
    Memory,
    File { path: PathBuf },
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::File {
            path: default_staging_dir(),
        }
    }
}

fn default_staging_dir() -> PathBuf {
    dirs_staging_dir().unwrap_or_else(|| PathBuf::from(".suve/staging"))
}

fn dirs_staging_dir() -> Option<PathBuf> {
    std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".suve").join("staging"))
}

/// Resolved runtime configuration for one invocation.
#[derive(Debug, Clone)]
pub struct Config {
    pub aws_region: String,
    pub aws_profile: Option<String>,
    pub store: StoreConfig,
    pub scope: Scope,
}

impl Config {
    /// Build configuration from explicit CLI values, falling back to
    /// environment variables the AWS CLI/SDK also respect.
    pub fn resolve(
        region: Option<String>,
        profile: Option<String>,
        account: Option<String>,
        staging_path: Option<PathBuf>,
        in_memory: bool,
    ) -> Self {
        let aws_region = region
            .or_else(|| std::env::var("AWS_REGION").ok())
            .or_else(|| std::env::var("AWS_DEFAULT_REGION").ok())
            .unwrap_or_else(|| "us-east-1".to_string());

        let aws_profile = profile.or_else(|| std::env::var("AWS_PROFILE").ok());

        let account = account
            .or_else(|| std::env::var("SUVE_ACCOUNT").ok())
            .unwrap_or_else(|| "default".to_string());

        let store = if in_memory {
            StoreConfig::Memory
        } else if let Some(path) = staging_path {
            StoreConfig::File { path }
        } else {
            StoreConfig::default()
        };

        Self {
            scope: Scope::new("aws", account, aws_region.clone()),
            aws_region,
            aws_profile,
            store,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_defaults_region_when_unset() {
        let config = Config::resolve(None, None, None, None, true);
        assert!(!config.aws_region.is_empty());
        assert_eq!(config.store, StoreConfig::Memory);
    }

    #[test]
    fn resolve_prefers_explicit_region_over_env() {
        let config = Config::resolve(Some("eu-west-1".to_string()), None, None, None, true);
        assert_eq!(config.aws_region, "eu-west-1");
    }

    #[test]
    fn resolve_builds_scope_from_account_and_region() {
        let config = Config::resolve(Some("eu-west-1".to_string()), None, Some("123456789012".to_string()), None, true);
        assert_eq!(config.scope.key(), "aws/123456789012/eu-west-1");
    }

    #[test]
    fn file_store_uses_explicit_path() {
        let config = Config::resolve(None, None, None, Some(PathBuf::from("/tmp/suve-test")), false);
        assert_eq!(config.store, StoreConfig::File { path: PathBuf::from("/tmp/suve-test") });
    }
}
