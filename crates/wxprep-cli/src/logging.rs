//! Tracing subscriber setup.

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

/// Filter directive used when `RUST_LOG` is not set.
///
/// `--log-level` wins over `-v`; with neither, the level is `info`.
pub fn filter_directive(verbose: bool, log_level: Option<&str>) -> String {
    match log_level {
        Some(level) => level.to_string(),
        None if verbose => "debug".to_string(),
        None => "info".to_string(),
    }
}

/// Builds the filter: `RUST_LOG` when set, else [`filter_directive`].
///
/// A `RUST_LOG` that does not parse is an error, not a silent fallback.
pub fn build_filter(
    rust_log: Option<&str>,
    verbose: bool,
    log_level: Option<&str>,
) -> Result<EnvFilter> {
    match rust_log {
        Some(directive) => EnvFilter::try_new(directive)
            .with_context(|| format!("invalid RUST_LOG '{directive}'")),
        None => {
            let directive = filter_directive(verbose, log_level);
            EnvFilter::try_new(&directive)
                .with_context(|| format!("invalid log level '{directive}'"))
        }
    }
}

/// Installs the global `fmt` subscriber writing to stderr.
pub fn init(verbose: bool, log_level: Option<&str>) -> Result<()> {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV)
        .ok()
        .filter(|v| !v.trim().is_empty());
    let filter = build_filter(rust_log.as_deref(), verbose, log_level)?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}
