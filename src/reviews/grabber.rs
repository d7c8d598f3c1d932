//! Pagination driver: orchestrates fetch/extract cycles for one target.

use crate::config::{Config, SparsePagePolicy};
use crate::reviews::client::ReviewFetch;
use crate::reviews::models::{GrabOutcome, GrabSummary, Review, StopReason, PAGE_SIZE};
use crate::reviews::parser::{item_id_from_url, ReviewParser};
use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

/// Drives repeated fetch/extract cycles until a target's reviews are
/// exhausted, a page comes back empty, or fetching fails.
pub struct ReviewGrabber {
    sparse_page: SparsePagePolicy,
}

impl ReviewGrabber {
    pub fn new(config: &Config) -> Self {
        Self { sparse_page: config.sparse_page }
    }

    /// Runs a full extraction for one target address.
    pub async fn run(&self, client: &impl ReviewFetch, url: &str) -> Result<GrabOutcome> {
        self.run_with_cancel(client, url, &AtomicBool::new(false)).await
    }

    /// Runs a full extraction, checking the cancel flag between page fetches.
    ///
    /// Per-target fetch failures are part of the outcome, not errors: the
    /// caller always gets whatever was accumulated before the stop, except on
    /// cancellation, where the in-flight target's partial results are
    /// discarded.
    pub async fn run_with_cancel(
        &self,
        client: &impl ReviewFetch,
        url: &str,
        cancel: &AtomicBool,
    ) -> Result<GrabOutcome> {
        let item_id = item_id_from_url(url)?;
        info!("Extracting reviews for {}", item_id);

        let parser = ReviewParser::new();
        let mut reviews: Vec<Review> = Vec::new();
        let mut pages_fetched = 1u32;
        let mut productive_pages = 0u32;

        let first = match client.fetch_page(url, 1).await {
            Ok(response) => response,
            Err(e) => {
                warn!("First fetch failed for {}: {}", item_id, e);
                return Ok(outcome(reviews, item_id, 0, 1, 0, StopReason::Transport(e.to_string())));
            }
        };

        if !first.is_success() {
            return Ok(outcome(reviews, item_id, 0, 1, 0, StopReason::HttpStatus(first.status)));
        }

        let expected_total = parser.parse_total_count(&first.body);
        debug!("Expecting {} reviews for {}", expected_total, item_id);

        let pb = ProgressBar::new(u64::from(expected_total));
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40} {pos}/{len}")?
                .progress_chars("=> "),
        );

        // One page past the exact boundary is tolerated; anything beyond that
        // means the site keeps serving unproductive pages, so bail out.
        let page_limit = expected_total.div_ceil(PAGE_SIZE) + 1;

        let mut processed: u32 = 0;
        let mut stop = None;

        // Page 1 is both counted and extracted; it is never re-fetched.
        self.apply_page(
            parser.parse_page(&first.body, &item_id),
            &mut reviews,
            &mut processed,
            &mut productive_pages,
            &mut stop,
            &pb,
        );

        let mut page = 2u32;
        while stop.is_none() {
            // Inclusive boundary: the loop may fetch one extra page past
            // the exact total before concluding the listing is exhausted.
            if processed > expected_total {
                stop = Some(StopReason::Exhausted);
                break;
            }
            if page > page_limit {
                debug!("Page limit {} reached for {}", page_limit, item_id);
                stop = Some(StopReason::Exhausted);
                break;
            }
            if cancel.load(Ordering::Relaxed) {
                info!("Run cancelled for {}, discarding partial results", item_id);
                reviews.clear();
                stop = Some(StopReason::Cancelled);
                break;
            }

            let response = match client.fetch_page(url, page).await {
                Ok(response) => response,
                Err(e) => {
                    warn!("Fetch failed for {} page {}: {}", item_id, page, e);
                    stop = Some(StopReason::Transport(e.to_string()));
                    break;
                }
            };
            pages_fetched += 1;
            page += 1;

            if !response.is_success() {
                warn!("Received status {} for {}", response.status, item_id);
                stop = Some(StopReason::HttpStatus(response.status));
                break;
            }

            self.apply_page(
                parser.parse_page(&response.body, &item_id),
                &mut reviews,
                &mut processed,
                &mut productive_pages,
                &mut stop,
                &pb,
            );
        }

        pb.finish_and_clear();

        let stop = stop.unwrap_or(StopReason::Exhausted);
        Ok(outcome(reviews, item_id, expected_total, pages_fetched, productive_pages, stop))
    }

    /// Folds one page's extraction result into the run state.
    ///
    /// Absent extraction stops the run; a zero-length page is skipped without
    /// progress; a productive page advances the processed count. Under the
    /// soft-stop policy a page shorter than the page size ends the run after
    /// its reviews are kept.
    fn apply_page(
        &self,
        batch: Option<Vec<Review>>,
        reviews: &mut Vec<Review>,
        processed: &mut u32,
        productive_pages: &mut u32,
        stop: &mut Option<StopReason>,
        pb: &ProgressBar,
    ) {
        match batch {
            None => {
                debug!("Page had no review containers, stopping");
                *stop = Some(StopReason::EmptyPage);
            }
            Some(batch) if batch.is_empty() => {
                debug!("Page yielded no usable reviews, continuing");
            }
            Some(batch) => {
                let len = batch.len() as u32;
                *processed += len;
                *productive_pages += 1;
                pb.inc(u64::from(len));
                reviews.extend(batch);

                if self.sparse_page == SparsePagePolicy::SoftStop && len < PAGE_SIZE {
                    debug!("Short page ({} < {}), soft-stopping", len, PAGE_SIZE);
                    *stop = Some(StopReason::ShortPage);
                }
            }
        }
    }
}

fn outcome(
    reviews: Vec<Review>,
    item_id: String,
    expected_total: u32,
    pages_fetched: u32,
    productive_pages: u32,
    stop: StopReason,
) -> GrabOutcome {
    let summary = GrabSummary {
        item_id,
        expected_total,
        reviews_found: reviews.len(),
        pages_fetched,
        productive_pages,
        stop,
    };
    GrabOutcome { reviews, summary }
}
