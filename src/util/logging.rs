use anyhow::{anyhow, Context};
use tracing_subscriber::EnvFilter;

use crate::util::env as env_util;

pub const DEFAULT_LEVEL: &str = "info";

/// Targets held at `warn` whatever level the run asks for; sqlx logs every
/// statement at `info`.
const QUIET_TARGETS: [&str; 2] = ["sqlx=warn", "testcontainers=warn"];

/// Filter string for `level` with the quiet targets appended.
pub fn filter_directives(level: &str) -> String {
    let level = level.trim();
    let level = if level.is_empty() { DEFAULT_LEVEL } else { level };
    std::iter::once(level)
        .chain(QUIET_TARGETS)
        .collect::<Vec<_>>()
        .join(",")
}

/// Install the global subscriber.
///
/// `RUST_LOG` wins outright. Otherwise the level comes from `level` (the
/// `--log-level` flag), then `CATALOG_LOG_LEVEL`, then [`DEFAULT_LEVEL`].
pub fn init_tracing(level: Option<&str>) -> anyhow::Result<()> {
    let directives = match env_util::env_opt("RUST_LOG") {
        Some(raw) => raw,
        None => {
            let level = level
                .map(str::to_string)
                .or_else(|| env_util::env_opt("CATALOG_LOG_LEVEL"))
                .unwrap_or_else(|| DEFAULT_LEVEL.to_string());
            filter_directives(&level)
        }
    };
    let filter = EnvFilter::try_new(&directives)
        .with_context(|| format!("invalid log filter {directives:?}"))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .try_init()
        .map_err(|e| anyhow!("failed to initialize tracing: {e}"))
}
