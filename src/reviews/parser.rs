//! HTML parser for Amazon review pages: count probe and field extraction.

use crate::reviews::models::{Review, AMAZON_CUSTOMER, ANONYMOUS, NO_TITLE};
use crate::reviews::selectors::review;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use scraper::{ElementRef, Html};
use tracing::{debug, trace, warn};

/// Number of characters of locale prefix before the long date
/// ("on March 4, 2018").
const DATE_PREFIX_LEN: usize = 3;

/// Extracts the item id from a review page address.
///
/// Addresses follow `https://host/<slug>/product-reviews/<ITEM_ID>/ref=...`;
/// the item id is the 4th path component.
pub fn item_id_from_url(url: &str) -> Result<String> {
    let path = match url.split_once("://") {
        Some((_, rest)) => rest.find('/').map(|i| &rest[i..]).unwrap_or(""),
        None => url,
    };

    path.split('/')
        .nth(3)
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .with_context(|| format!("No item id in address: {}", url))
}

/// Parser for Amazon review pages.
pub struct ReviewParser;

impl ReviewParser {
    pub fn new() -> Self {
        Self
    }

    /// Reads the total review count from the first page.
    ///
    /// Keeps ASCII digits only, which also strips thousands separators.
    /// A missing count marker reads as 0.
    pub fn parse_total_count(&self, html: &str) -> u32 {
        let document = Html::parse_document(html);

        let text = match document.select(&review::TOTAL_COUNT).next() {
            Some(e) => e.text().collect::<String>(),
            None => {
                debug!("No total-review-count marker on page");
                return 0;
            }
        };

        let cleaned: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
        cleaned.parse().unwrap_or(0)
    }

    /// Extracts all reviews on a page.
    ///
    /// Returns `None` when the page contains no review containers at all,
    /// which the pagination driver treats as "nothing left to page through".
    /// A malformed record is skipped with a warning; it never aborts the page.
    pub fn parse_page(&self, html: &str, item_id: &str) -> Option<Vec<Review>> {
        let document = Html::parse_document(html);

        let containers: Vec<ElementRef> = document.select(&review::CONTAINER).collect();
        if containers.is_empty() {
            return None;
        }

        let mut reviews = Vec::with_capacity(containers.len());
        for container in containers {
            match self.parse_review(container, item_id) {
                Ok(review) => {
                    trace!("Parsed review: {}", review.record_id);
                    reviews.push(review);
                }
                Err(e) => {
                    warn!("Skipping malformed review for {}: {}", item_id, e);
                }
            }
        }

        debug!("Extracted {} reviews for {}", reviews.len(), item_id);
        Some(reviews)
    }

    /// Extracts one review from its container element.
    ///
    /// A missing record id or malformed date fails this record only; optional
    /// sub-fields fall back to their documented sentinels.
    fn parse_review(&self, element: ElementRef, item_id: &str) -> Result<Review> {
        let record_id = element
            .value()
            .attr(review::ID_ATTR)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .context("Review container has no id")?;

        let rating = self.parse_rating(element)?;

        let link = element
            .select(&review::LINK)
            .next()
            .and_then(|e| e.value().attr("href"))
            .unwrap_or_default()
            .to_string();

        let title = element
            .select(&review::TITLE)
            .next()
            .map(|e| e.text().collect::<String>().trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| NO_TITLE.to_string());

        // Author and profile come from the same anchor; both fall back together.
        let (author, author_profile) = match element.select(&review::AUTHOR_LINK).next() {
            Some(anchor) => {
                let name = anchor
                    .select(&review::AUTHOR_NAME)
                    .next()
                    .map(|e| e.text().collect::<String>())
                    .unwrap_or_else(|| anchor.text().collect::<String>());
                let profile = anchor.value().attr("href").unwrap_or(ANONYMOUS).to_string();
                (name.trim().to_string(), profile)
            }
            None => (ANONYMOUS.to_string(), ANONYMOUS.to_string()),
        };

        let date_text = element
            .select(&review::DATE)
            .next()
            .map(|e| e.text().collect::<String>())
            .context("Review has no date")?;
        let review_date = self.parse_review_date(&date_text)?;

        let body = element
            .select(&review::BODY)
            .next()
            .map(|e| e.text().collect::<String>())
            .unwrap_or_default();
        let body = body.trim_end_matches('\n').to_string();

        let image_available = u8::from(element.select(&review::IMAGE).next().is_some());

        let helpful = self.parse_helpful(element);

        Ok(Review {
            record_id,
            item_id: item_id.to_string(),
            rating,
            link,
            title,
            author,
            author_profile,
            review_date,
            review: body,
            image_available,
            helpful,
        })
    }

    /// Parses the star rating from text like "4.0 out of 5 stars".
    ///
    /// The leading token is a numeral, possibly with a decimal part; the
    /// integral value is kept.
    fn parse_rating(&self, element: ElementRef) -> Result<u8> {
        let text = element
            .select(&review::RATING)
            .next()
            .map(|e| e.text().collect::<String>())
            .context("Review has no rating")?;

        let token = text.split_whitespace().next().context("Empty rating text")?;
        let value: f32 = token
            .parse()
            .with_context(|| format!("Unparseable rating: {}", token))?;

        Ok((value as u8).clamp(1, 5))
    }

    /// Normalizes a localized long date to MM/DD/YYYY.
    ///
    /// The raw text carries a fixed 3-character locale prefix before the
    /// "Month DD, YYYY" date ("on March 4, 2018").
    fn parse_review_date(&self, text: &str) -> Result<String> {
        let trimmed = text.trim();
        let date_part = trimmed
            .get(DATE_PREFIX_LEN..)
            .with_context(|| format!("Date text too short: {}", trimmed))?
            .trim();

        let date = NaiveDate::parse_from_str(date_part, "%B %d, %Y")
            .with_context(|| format!("Unparseable review date: {}", date_part))?;

        Ok(date.format("%m/%d/%Y").to_string())
    }

    /// Parses the helpful-vote count.
    ///
    /// The first vote reads "One", not "1"; larger counts carry thousands
    /// separators. A missing statement means zero votes.
    fn parse_helpful(&self, element: ElementRef) -> u32 {
        let text = match element.select(&review::HELPFUL).next() {
            Some(e) => e.text().collect::<String>(),
            None => return 0,
        };

        let token = match text.trim().split_whitespace().next() {
            Some(t) => t,
            None => return 0,
        };

        if token == "One" {
            return 1;
        }

        token.replace(',', "").parse().unwrap_or(0)
    }
}

impl Default for ReviewParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Normalizes an author name: drop non-ASCII characters, and substitute the
/// final sentinel when nothing printable remains.
pub fn fold_author(author: &str) -> String {
    let folded: String = author.chars().filter(char::is_ascii).collect();
    let folded = folded.trim().to_string();
    if folded.is_empty() {
        AMAZON_CUSTOMER.to_string()
    } else {
        folded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review_html(inner: &str) -> String {
        format!(r#"<html><body><div data-hook="review" id="R1TESTID">{}</div></body></html>"#, inner)
    }

    fn full_review_inner() -> &'static str {
        r#"
            <a class="a-link-normal" href="/gp/customer-reviews/R1TESTID">
                <i data-hook="review-star-rating"><span class="a-icon-alt">4.0 out of 5 stars</span></i>
            </a>
            <a data-hook="review-title" href="/gp/customer-reviews/R1TESTID"><span>Solid router</span></a>
            <a class="author" href="/gp/profile/alice"><span class="a-profile-name">Alice</span></a>
            <span data-hook="review-date">on March 4, 2018</span>
            <span data-hook="review-body"><span>Covers the whole house.
</span></span>
            <img data-hook="review-image-tile" src="img.jpg">
            <span data-hook="helpful-vote-statement">1,234 people found this helpful</span>
        "#
    }

    // Item id extraction

    #[test]
    fn test_item_id_from_url() {
        let url = "https://www.amazon.com/Google-Wifi-system/product-reviews/B01MAW2294/ref=cm_cr_dp?ie=UTF8";
        assert_eq!(item_id_from_url(url).unwrap(), "B01MAW2294");
    }

    #[test]
    fn test_item_id_from_url_missing() {
        assert!(item_id_from_url("https://www.amazon.com/").is_err());
        assert!(item_id_from_url("https://www.amazon.com").is_err());
    }

    // Count probe

    #[test]
    fn test_total_count_with_separator() {
        let parser = ReviewParser::new();
        let html = r#"<span data-hook="total-review-count">2,731</span>"#;
        assert_eq!(parser.parse_total_count(html), 2731);
    }

    #[test]
    fn test_total_count_with_label_text() {
        let parser = ReviewParser::new();
        let html = r#"<span data-hook="total-review-count">2,731 global ratings</span>"#;
        assert_eq!(parser.parse_total_count(html), 2731);
    }

    #[test]
    fn test_total_count_absent() {
        let parser = ReviewParser::new();
        assert_eq!(parser.parse_total_count("<html><body></body></html>"), 0);
    }

    // Full record extraction

    #[test]
    fn test_parse_full_review() {
        let parser = ReviewParser::new();
        let html = review_html(full_review_inner());
        let reviews = parser.parse_page(&html, "B01MAW2294").unwrap();
        assert_eq!(reviews.len(), 1);

        let r = &reviews[0];
        assert_eq!(r.record_id, "R1TESTID");
        assert_eq!(r.item_id, "B01MAW2294");
        assert_eq!(r.rating, 4);
        assert_eq!(r.link, "/gp/customer-reviews/R1TESTID");
        assert_eq!(r.title, "Solid router");
        assert_eq!(r.author, "Alice");
        assert_eq!(r.author_profile, "/gp/profile/alice");
        assert_eq!(r.review_date, "03/04/2018");
        assert_eq!(r.review, "Covers the whole house.");
        assert_eq!(r.image_available, 1);
        assert_eq!(r.helpful, 1234);
    }

    #[test]
    fn test_parse_page_absent_vs_empty() {
        let parser = ReviewParser::new();
        // No containers at all: absent signal
        assert!(parser.parse_page("<html><body></body></html>", "X").is_none());

        // Container present but record fails: present-but-empty page
        let html =
            r#"<html><body><div data-hook="review"><span>no id here</span></div></body></html>"#;
        let reviews = parser.parse_page(html, "X").unwrap();
        assert!(reviews.is_empty());
    }

    #[test]
    fn test_parse_review_fallbacks() {
        let parser = ReviewParser::new();
        let html = review_html(
            r#"
                <i data-hook="review-star-rating"><span class="a-icon-alt">5.0 out of 5 stars</span></i>
                <span data-hook="review-date">on June 17, 2019</span>
            "#,
        );
        let reviews = parser.parse_page(&html, "B01MAW2294").unwrap();
        assert_eq!(reviews.len(), 1);

        let r = &reviews[0];
        assert_eq!(r.title, NO_TITLE);
        assert_eq!(r.author, ANONYMOUS);
        assert_eq!(r.author_profile, ANONYMOUS);
        assert_eq!(r.review, "");
        assert_eq!(r.image_available, 0);
        assert_eq!(r.helpful, 0);
        assert_eq!(r.review_date, "06/17/2019");
    }

    #[test]
    fn test_malformed_date_skips_record_only() {
        let parser = ReviewParser::new();
        let good = review_html(full_review_inner());
        let bad = r#"<div data-hook="review" id="R2BADDATE">
            <i data-hook="review-star-rating"><span class="a-icon-alt">3.0 out of 5 stars</span></i>
            <span data-hook="review-date">on not a date</span>
        </div>"#;
        let html = good.replace("</body>", &format!("{}</body>", bad));

        let reviews = parser.parse_page(&html, "B01MAW2294").unwrap();
        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0].record_id, "R1TESTID");
    }

    #[test]
    fn test_missing_rating_skips_record() {
        let parser = ReviewParser::new();
        let html = review_html(r#"<span data-hook="review-date">on March 4, 2018</span>"#);
        let reviews = parser.parse_page(&html, "B01MAW2294").unwrap();
        assert!(reviews.is_empty());
    }

    // Date parsing

    #[test]
    fn test_parse_review_date() {
        let parser = ReviewParser::new();
        assert_eq!(parser.parse_review_date("on March 4, 2018").unwrap(), "03/04/2018");
        assert_eq!(parser.parse_review_date("on December 25, 2020").unwrap(), "12/25/2020");
    }

    #[test]
    fn test_parse_review_date_malformed() {
        let parser = ReviewParser::new();
        assert!(parser.parse_review_date("on someday").is_err());
        assert!(parser.parse_review_date("x").is_err());
    }

    // Helpful parsing

    #[test]
    fn test_parse_helpful_variants() {
        let parser = ReviewParser::new();

        let one = review_html(
            r#"<span data-hook="helpful-vote-statement">One person found this helpful</span>"#,
        );
        let doc = Html::parse_document(&one);
        let el = doc.select(&review::CONTAINER).next().unwrap();
        assert_eq!(parser.parse_helpful(el), 1);

        let many = review_html(
            r#"<span data-hook="helpful-vote-statement">1,234 people found this helpful</span>"#,
        );
        let doc = Html::parse_document(&many);
        let el = doc.select(&review::CONTAINER).next().unwrap();
        assert_eq!(parser.parse_helpful(el), 1234);

        let absent = review_html("");
        let doc = Html::parse_document(&absent);
        let el = doc.select(&review::CONTAINER).next().unwrap();
        assert_eq!(parser.parse_helpful(el), 0);
    }

    // Author folding

    #[test]
    fn test_fold_author() {
        assert_eq!(fold_author("Alice"), "Alice");
        assert_eq!(fold_author("Aliçe"), "Alie");
        assert_eq!(fold_author("雨宮"), AMAZON_CUSTOMER);
        assert_eq!(fold_author("   "), AMAZON_CUSTOMER);
    }
}
