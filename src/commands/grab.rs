//! Single-target extraction command.

use crate::config::Config;
use crate::reviews::accumulator::ReviewAccumulator;
use crate::reviews::client::{ReviewClient, ReviewFetch};
use crate::reviews::grabber::ReviewGrabber;
use anyhow::{Context, Result};
use std::sync::atomic::AtomicBool;
use tracing::info;

/// Extracts all reviews for one target address into an accumulator.
pub struct GrabCommand {
    config: Config,
}

impl GrabCommand {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Runs the extraction and returns the operator report line.
    pub async fn execute(
        &self,
        url: &str,
        acc: &mut ReviewAccumulator,
        cancel: &AtomicBool,
    ) -> Result<String> {
        let client = ReviewClient::new(&self.config).context("Failed to create HTTP client")?;
        self.execute_with_client(&client, url, acc, cancel).await
    }

    /// Runs the extraction with a provided client (for testing).
    pub async fn execute_with_client(
        &self,
        client: &impl ReviewFetch,
        url: &str,
        acc: &mut ReviewAccumulator,
        cancel: &AtomicBool,
    ) -> Result<String> {
        let grabber = ReviewGrabber::new(&self.config);
        let outcome = grabber.run_with_cancel(client, url, cancel).await?;

        info!(
            "Run for {} stopped ({}), {} reviews",
            outcome.summary.item_id, outcome.summary.stop, outcome.summary.reviews_found
        );

        let report = outcome.report();
        if !outcome.reviews.is_empty() {
            acc.append_run(outcome.reviews);
        }
        Ok(report)
    }
}
