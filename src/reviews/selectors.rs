//! CSS selectors for Amazon review pages.
//!
//! This file contains all CSS selectors used for parsing review pages.
//! Update this file when Amazon changes their HTML structure.
//!
//! **Update process**: When parsing fails, capture HTML sample,
//! update selectors, and add test fixture.

use scraper::Selector;
use std::sync::LazyLock;

/// Selectors for the review listing page.
pub mod review {
    use super::*;

    /// One review container.
    pub static CONTAINER: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("[data-hook='review']").unwrap());

    /// Attribute on the container holding the review id.
    pub static ID_ATTR: &str = "id";

    /// Total review count for the product. Read once from page 1.
    pub static TOTAL_COUNT: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("[data-hook='total-review-count']").unwrap());

    /// Star rating text ("4.0 out of 5 stars").
    pub static RATING: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse(
            "i[data-hook='review-star-rating'] span.a-icon-alt, \
             [data-hook='review-star-rating'] .a-icon-alt, \
             span.a-icon-alt",
        )
        .unwrap()
    });

    /// Permalink anchor for the review.
    pub static LINK: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse(
            "a[data-hook='review-title'], \
             a.a-link-normal",
        )
        .unwrap()
    });

    /// Review title.
    pub static TITLE: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse(
            "a[data-hook='review-title'] span:not(.a-icon-alt), \
             [data-hook='review-title']",
        )
        .unwrap()
    });

    /// Author anchor carrying the profile link.
    pub static AUTHOR_LINK: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse(
            "a.author, \
             a.a-profile",
        )
        .unwrap()
    });

    /// Author display name inside the author anchor.
    pub static AUTHOR_NAME: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("span.a-profile-name").unwrap());

    /// Localized review date.
    pub static DATE: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("span[data-hook='review-date']").unwrap());

    /// Review body text.
    pub static BODY: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse(
            "span[data-hook='review-body'] span, \
             span[data-hook='review-body']",
        )
        .unwrap()
    });

    /// Image attached to the review, if any.
    pub static IMAGE: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("img[data-hook='review-image-tile']").unwrap());

    /// "N people found this helpful" statement.
    pub static HELPFUL: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("span[data-hook='helpful-vote-statement']").unwrap());
}
