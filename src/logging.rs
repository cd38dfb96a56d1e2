//! tracing subscriber setup.
//!
//! The canvas owns the terminal, so while it runs events go to
//! `.mindmap/mindmap.log`; plain subcommands log to stderr.

use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

pub const LOG_ENV: &str = "MINDMAP_LOG";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    File(PathBuf),
}

/// `env` wins when it parses; otherwise `fallback`, otherwise `info`.
pub fn filter_from(env: Option<&str>, fallback: &str) -> EnvFilter {
    env.and_then(|directives| EnvFilter::try_new(directives).ok())
        .or_else(|| EnvFilter::try_new(fallback).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

/// Install the global subscriber. A second call is a no-op.
pub fn init(target: LogTarget, fallback: &str) -> Result<()> {
    let env = std::env::var(LOG_ENV).ok();
    let filter = filter_from(env.as_deref(), fallback);

    let installed = match target {
        LogTarget::Stderr => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
            .try_init(),
        LogTarget::File(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false))
                .try_init()
        }
    };
    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_directives_take_precedence() {
        let filter = filter_from(Some("mindmap=trace"), "warn");
        assert_eq!(filter.to_string(), "mindmap=trace");
    }

    #[test]
    fn invalid_directives_fall_back() {
        assert_eq!(filter_from(Some("mindmap=loud"), "warn").to_string(), "warn");
        assert_eq!(filter_from(None, "mindmap=loud").to_string(), "info");
    }
}
