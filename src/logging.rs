// Copyright 2025 Tomoki Hayashi
// MIT License (https://opensource.org/licenses/MIT)

//! Tracing setup. Output goes to a file because the terminal belongs to the UI.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::{Mutex, Once};

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

fn filter(debug: bool) -> EnvFilter {
    let default = if debug { "memegen=debug" } else { "memegen=info" };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Install the global subscriber, appending to `path`. Subsequent calls are no-ops.
pub fn init(path: &Path, debug: bool) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;

    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter(debug))
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(false)
            .with_level(true)
            .try_init();
    });
    Ok(())
}
