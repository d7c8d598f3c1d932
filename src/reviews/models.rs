//! Data models for extracted reviews and pagination run outcomes.

use serde::{Deserialize, Serialize};

/// Sentinel written when a review has no title.
pub const NO_TITLE: &str = "None";
/// Sentinel written when a review has no author or profile link.
pub const ANONYMOUS: &str = "Anonymous";
/// Final author sentinel, substituted when ASCII-folding leaves the name empty.
pub const AMAZON_CUSTOMER: &str = "Amazon Customer";

/// Fixed number of reviews requested per page. Amazon caps pageSize at 50.
pub const PAGE_SIZE: u32 = 50;

/// One extracted customer review.
///
/// The column set is fixed: every field is always present, with documented
/// sentinels standing in for missing optional sub-fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    /// Review identifier from the container element. Required.
    pub record_id: String,
    /// Item (product) id the review belongs to.
    pub item_id: String,
    /// Star rating, 1-5.
    pub rating: u8,
    /// Permalink fragment for the review.
    pub link: String,
    /// Review title, or "None".
    pub title: String,
    /// Author display name, or "Anonymous".
    pub author: String,
    /// Author profile link, or "Anonymous".
    pub author_profile: String,
    /// Review date normalized to MM/DD/YYYY.
    pub review_date: String,
    /// Review body with trailing newlines stripped.
    pub review: String,
    /// 1 if the review carries an image, else 0.
    pub image_available: u8,
    /// Number of helpful votes.
    pub helpful: u32,
}

impl Review {
    /// Column names in the fixed persistence/export order.
    pub const COLUMNS: [&'static str; 11] = [
        "record_id",
        "item_id",
        "rating",
        "link",
        "title",
        "author",
        "author_profile",
        "review_date",
        "review",
        "image_available",
        "helpful",
    ];
}

/// Why a pagination run stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    /// All expected reviews were recovered.
    Exhausted,
    /// A page contained no review containers. Normal termination.
    EmptyPage,
    /// A page came back with fewer reviews than the page size while the
    /// soft-stop policy was active.
    ShortPage,
    /// A fetch returned a non-2xx status.
    HttpStatus(u16),
    /// The fetch failed before returning a status.
    Transport(String),
    /// The run was cancelled between page fetches.
    Cancelled,
}

impl StopReason {
    /// True when the run ended without recovering anything useful to report
    /// as an error.
    pub fn is_failure(&self) -> bool {
        matches!(self, StopReason::HttpStatus(_) | StopReason::Transport(_))
    }
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopReason::Exhausted => write!(f, "exhausted"),
            StopReason::EmptyPage => write!(f, "empty page"),
            StopReason::ShortPage => write!(f, "short page"),
            StopReason::HttpStatus(code) => write!(f, "http status {}", code),
            StopReason::Transport(msg) => write!(f, "transport error: {}", msg),
            StopReason::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Summary of one pagination run, for operator reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrabSummary {
    /// Item id the run targeted.
    pub item_id: String,
    /// Total reviews the count probe promised on page 1.
    pub expected_total: u32,
    /// Reviews actually recovered.
    pub reviews_found: usize,
    /// Pages fetched, productive or not.
    pub pages_fetched: u32,
    /// Pages that yielded at least one review.
    pub productive_pages: u32,
    /// Why the run stopped.
    pub stop: StopReason,
}

/// Full result of one pagination run: the extracted reviews plus a summary.
#[derive(Debug, Clone)]
pub struct GrabOutcome {
    pub reviews: Vec<Review>,
    pub summary: GrabSummary,
}

impl GrabOutcome {
    /// Short diagnostic line for the operator.
    pub fn report(&self) -> String {
        if self.reviews.is_empty() && self.summary.stop.is_failure() {
            format!(
                "[!] Reviews not available for {} ({})",
                self.summary.item_id, self.summary.stop
            )
        } else {
            format!(
                "[+] Recovered {} reviews from {} pages for {}",
                self.summary.reviews_found, self.summary.productive_pages, self.summary.item_id
            )
        }
    }
}
