//! Logging setup.
//!
//! The quiz UI owns the terminal, so interactive runs only log when a log
//! file is given. `RUST_LOG` overrides the default level.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter: `info`, or `debug` when verbose.
pub fn default_filter(verbose: bool) -> &'static str {
    if verbose { "debug" } else { "info" }
}

fn env_filter(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback))
        .unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Append logs to `path`. Plain text, no colors.
pub fn init_file(path: &Path, verbose: bool) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_ansi(false)
        .compact()
        .with_writer(Mutex::new(file));

    let _ = tracing_subscriber::registry()
        .with(env_filter(default_filter(verbose)))
        .with(fmt_layer)
        .try_init();
    Ok(())
}

/// Log to stderr, but only when `RUST_LOG` is set, so stdout stays clean
/// for piped output.
pub fn init_stderr() {
    if std::env::var("RUST_LOG").is_err() {
        return;
    }

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .compact()
        .with_writer(std::io::stderr);

    let _ = tracing_subscriber::registry()
        .with(env_filter("warn"))
        .with(fmt_layer)
        .try_init();
}
