//! HTTP client for review page requests using wreq for TLS fingerprint emulation.

use crate::config::Config;
use anyhow::{Context, Result};
use async_trait::async_trait;
use rand::RngExt;
use std::time::Duration;
use tracing::{debug, warn};
use wreq::Client;
use wreq_util::Emulation;

use crate::reviews::models::PAGE_SIZE;

/// Fixed browser-identifying header sent with every page request.
const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 6.1; WOW64; rv:40.0) Gecko/20100101 Firefox/40.1";

/// Raw result of one page fetch: status plus document body.
///
/// Non-2xx statuses are data, not errors; the pagination driver decides what
/// a given status means for the run.
#[derive(Debug, Clone)]
pub struct PageResponse {
    pub status: u16,
    pub body: String,
}

impl PageResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Trait for fetching review pages - enables mocking for tests.
#[async_trait]
pub trait ReviewFetch: Send + Sync {
    /// Fetches one result page for the target address.
    async fn fetch_page(&self, url: &str, page: u32) -> Result<PageResponse>;
}

/// Review page HTTP client with browser impersonation and anti-bot measures.
pub struct ReviewClient {
    client: Client,
    delay_ms: u64,
    delay_jitter_ms: u64,
}

impl ReviewClient {
    /// Creates a new client with the given configuration.
    pub fn new(config: &Config) -> Result<Self> {
        let mut builder = Client::builder()
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(10));

        // Configure proxy if specified
        if let Some(proxy_url) = &config.proxy {
            debug!("Configuring proxy: {}", proxy_url);
            let proxy = wreq::Proxy::all(proxy_url).context("Failed to configure proxy")?;
            builder = builder.proxy(proxy);
        }

        let client = builder.build()?;

        Ok(Self {
            client,
            delay_ms: config.delay_ms,
            delay_jitter_ms: config.delay_jitter_ms,
        })
    }

    /// Builds the page address by appending the pagination query parameters.
    fn page_url(url: &str, page: u32) -> String {
        let sep = if url.contains('?') { '&' } else { '?' };
        format!("{}{}pageNumber={}&pageSize={}", url, sep, page, PAGE_SIZE)
    }

    /// Adds a random delay to mimic human behavior.
    async fn delay(&self) {
        if self.delay_ms == 0 {
            return;
        }

        let jitter = if self.delay_jitter_ms > 0 {
            rand::rng().random_range(0..=self.delay_jitter_ms)
        } else {
            0
        };

        let total_delay = self.delay_ms + jitter;
        debug!("Delaying {}ms", total_delay);
        tokio::time::sleep(Duration::from_millis(total_delay)).await;
    }
}

#[async_trait]
impl ReviewFetch for ReviewClient {
    async fn fetch_page(&self, url: &str, page: u32) -> Result<PageResponse> {
        self.delay().await;

        let page_url = Self::page_url(url, page);
        debug!("GET {}", page_url);

        let response = self
            .client
            .get(&page_url)
            .emulation(Emulation::Chrome131)
            .header("User-Agent", USER_AGENT)
            .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
            .header("Accept-Language", "en-US,en;q=0.9")
            .header("Accept-Encoding", "gzip, deflate, br")
            .header("Cache-Control", "no-cache")
            .header("Upgrade-Insecure-Requests", "1")
            .send()
            .await
            .context("Failed to send request")?;

        let status = response.status().as_u16();
        debug!("Response status: {}", status);

        if status == 503 {
            warn!("Rate limited (503). Consider using a proxy or increasing delay.");
        }

        let body = response.text().await.context("Failed to read response body")?;

        Ok(PageResponse { status, body })
    }
}
