//! Process-wide review accumulation with column normalization.

use crate::reviews::models::Review;
use crate::reviews::parser::fold_author;
use std::collections::HashSet;
use tracing::debug;

/// Growable table of extracted reviews, owned by the orchestrating layer.
///
/// Each pagination run appends one batch; the buffer is cleared only when
/// handed off to persistence. Rows are deduplicated by record id across the
/// buffer's lifetime. Normalization runs eagerly on append and is idempotent:
/// numeric columns are integer-typed by construction, so only the author fold
/// and its sentinel substitution do any work, and both are stable under
/// re-application.
#[derive(Debug, Default)]
pub struct ReviewAccumulator {
    rows: Vec<Review>,
    seen: HashSet<String>,
}

impl ReviewAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one run's batch in extraction order, dropping records already
    /// accumulated, then normalizes the new rows.
    pub fn append_run(&mut self, batch: Vec<Review>) {
        let start = self.rows.len();
        for mut row in batch {
            if !self.seen.insert(row.record_id.clone()) {
                debug!("Dropping duplicate record {}", row.record_id);
                continue;
            }
            row.author = fold_author(&row.author);
            self.rows.push(row);
        }
        debug!("Accumulated {} rows ({} total)", self.rows.len() - start, self.rows.len());
    }

    /// Re-applies normalization to the whole table. A no-op on already
    /// normalized data.
    pub fn normalize(&mut self) {
        for row in &mut self.rows {
            row.author = fold_author(&row.author);
        }
    }

    pub fn rows(&self) -> &[Review] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Drains the buffer for handoff to persistence.
    pub fn take(&mut self) -> Vec<Review> {
        self.seen.clear();
        std::mem::take(&mut self.rows)
    }
}
