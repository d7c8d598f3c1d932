//! Batch extraction over a newline-delimited file of target addresses.

use crate::commands::grab::GrabCommand;
use crate::config::Config;
use crate::reviews::accumulator::ReviewAccumulator;
use crate::reviews::client::{ReviewClient, ReviewFetch};
use crate::store::ReviewStore;
use anyhow::{Context, Result};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::info;

/// What happens to recovered rows when the batch completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchMode {
    /// Persist everything to a table as soon as the batch finishes.
    Auto,
    /// Leave the rows in the accumulator for the operator to save.
    Manual,
}

impl FromStr for BatchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(BatchMode::Auto),
            "manual" => Ok(BatchMode::Manual),
            _ => Err(format!("Invalid batch mode: {s} (use 'auto' or 'manual')")),
        }
    }
}

impl fmt::Display for BatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchMode::Auto => write!(f, "auto"),
            BatchMode::Manual => write!(f, "manual"),
        }
    }
}

pub struct BatchCommand {
    config: Config,
    mode: BatchMode,
    table: String,
}

impl BatchCommand {
    pub fn new(config: Config, mode: BatchMode, table: String) -> Self {
        Self { config, mode, table }
    }

    /// Runs every target in `file`, one per line. A target that fails
    /// produces a diagnostic line and the batch moves on.
    pub async fn execute(
        &self,
        file: &Path,
        acc: &mut ReviewAccumulator,
        cancel: &AtomicBool,
    ) -> Result<Vec<String>> {
        let client = ReviewClient::new(&self.config).context("Failed to create HTTP client")?;
        self.execute_with_client(&client, file, acc, cancel).await
    }

    pub async fn execute_with_client(
        &self,
        client: &impl ReviewFetch,
        file: &Path,
        acc: &mut ReviewAccumulator,
        cancel: &AtomicBool,
    ) -> Result<Vec<String>> {
        let contents = std::fs::read_to_string(file)
            .with_context(|| format!("Failed to read batch file: {}", file.display()))?;

        let targets: Vec<&str> = contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();

        info!("Batch of {} targets from {}", targets.len(), file.display());

        let grab = GrabCommand::new(self.config.clone());
        let mut reports = Vec::with_capacity(targets.len());

        for target in targets {
            if cancel.load(Ordering::Relaxed) {
                reports.push("[!] Batch cancelled".to_string());
                break;
            }
            match grab.execute_with_client(client, target, acc, cancel).await {
                Ok(report) => reports.push(report),
                Err(err) => reports.push(format!("[!] Skipping {target}: {err:#}")),
            }
        }

        if self.mode == BatchMode::Auto && !acc.is_empty() {
            let mut store = ReviewStore::open(&self.config.db_path)?;
            let rows = acc.take();
            let saved = store.append(&self.table, &rows)?;
            reports.push(format!("[+] Saved {} rows to table '{}'", saved, self.table));
        }

        Ok(reports)
    }
}
