//! # Observability
//!
//! `suve` is a one-shot CLI, not a long-running service, so there is no
//! metrics endpoint to bind — structured logging via `tracing` is the whole
//! story (see [`crate::provider::common::record_operation`] for how
//! per-operation counters ride along as log fields instead of a Prometheus
//! registry).

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global `tracing` subscriber. Respects `RUST_LOG`; defaults to
/// `suve=info` when unset, matching the teacher's `info`-by-default posture
/// for its own crate while keeping dependency crates quiet.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("suve=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        git_hash = env!("BUILD_GIT_HASH"),
        built_at = env!("BUILD_DATETIME"),
        "suve starting"
    );
}
