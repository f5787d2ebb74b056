// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use std::env;
use std::fs::{self, File};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

use crate::config::APP_NAME;

const LOG_ENV: &str = "CHIPDESK_LOG";

/// Where log lines go. The terminal UI owns stdout, so interactive sessions
/// log to a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sink {
    Stderr,
    File(PathBuf),
}

pub fn default_log_path() -> Result<PathBuf> {
    let root = dirs::state_dir()
        .or_else(dirs::data_local_dir)
        .ok_or_else(|| anyhow!("cannot resolve a state directory for the log file"))?;
    Ok(root.join(APP_NAME).join(format!("{APP_NAME}.log")))
}

/// `CHIPDESK_LOG` wins over the configured level.
pub fn filter_directive(configured: &str) -> String {
    env::var(LOG_ENV)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| configured.to_owned())
}

pub fn init(configured_level: &str, sink: &Sink) -> Result<()> {
    let directive = filter_directive(configured_level);
    let filter = EnvFilter::try_new(&directive)
        .with_context(|| format!("invalid log filter {directive:?} (from {LOG_ENV} or [log].level)"))?;

    match sink {
        Sink::Stderr => {
            let layer = fmt::layer().with_writer(std::io::stderr).with_target(true);
            tracing_subscriber::registry()
                .with(filter)
                .with(layer)
                .try_init()
                .context("install log subscriber")?;
        }
        Sink::File(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("create log directory {}", parent.display()))?;
            }
            let file = File::options()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("open log file {}", path.display()))?;
            let layer = fmt::layer()
                .with_writer(Arc::new(file))
                .with_thread_names(true)
                .with_ansi(false);
            tracing_subscriber::registry()
                .with(filter)
                .with(layer)
                .try_init()
                .context("install log subscriber")?;
        }
    }
    Ok(())
}
