//! Pendant API client.
//!
//! Read-only reqwest client for the Pendant cloud: chat-style summaries come
//! from an offset-paginated endpoint, lifelogs from a cursor-paginated one.
//! Both loops stop at a hard page cap so a misbehaving remote cannot keep an
//! invocation alive forever. Failures surface as [`Error::Request`] and end
//! the invocation; the next scheduled sync retries.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

use daybook_core::{
    defaults, Error, FetchWindow, PendantSource, RemoteChatSummary, RemoteLifelog, Result,
};

/// Default Pendant API base URL.
pub const DEFAULT_PENDANT_API_BASE: &str = defaults::PENDANT_API_BASE;

/// Timeout for Pendant requests (seconds).
pub const PENDANT_TIMEOUT_SECS: u64 = defaults::PENDANT_TIMEOUT_SECS;

/// HTTP client for the Pendant wearable API.
pub struct PendantClient {
    client: Client,
    base_url: String,
    page_limit: i64,
    max_pages: usize,
}

impl PendantClient {
    /// Create a new Pendant client with default settings.
    pub fn new() -> Self {
        Self::with_config(DEFAULT_PENDANT_API_BASE.to_string())
    }

    /// Create a new Pendant client against a specific base URL.
    pub fn with_config(base_url: String) -> Self {
        let timeout = std::env::var(defaults::ENV_PENDANT_TIMEOUT_SECS)
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults::PENDANT_TIMEOUT_SECS);

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout))
            .build()
            .expect("Failed to create HTTP client");

        info!("Initializing Pendant client: url={}", base_url);

        Self {
            client,
            base_url,
            page_limit: defaults::PENDANT_PAGE_LIMIT,
            max_pages: defaults::PENDANT_MAX_PAGES,
        }
    }

    /// Create from environment variables.
    pub fn from_env() -> Self {
        let base_url = std::env::var(defaults::ENV_PENDANT_API_BASE)
            .unwrap_or_else(|_| DEFAULT_PENDANT_API_BASE.to_string());
        Self::with_config(base_url)
    }

    /// Set the per-page fetch size.
    pub fn with_page_limit(mut self, limit: i64) -> Self {
        self.page_limit = limit.max(1);
        self
    }

    /// Set the hard cap on pages fetched per invocation.
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages.max(1);
        self
    }
}

impl Default for PendantClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PendantSource for PendantClient {
    #[instrument(skip(self, api_key))]
    async fn fetch_chat_summaries(
        &self,
        api_key: &str,
        window: FetchWindow,
    ) -> Result<Vec<RemoteChatSummary>> {
        let start = Instant::now();
        let mut summaries = Vec::new();
        let mut offset: i64 = 0;
        let mut pages = 0usize;

        loop {
            let response = self
                .client
                .get(format!("{}/v1/chat-summaries", self.base_url))
                .header("X-API-Key", api_key)
                .query(&[
                    ("start", window.start.to_rfc3339()),
                    ("end", window.end.to_rfc3339()),
                    ("limit", self.page_limit.to_string()),
                    ("offset", offset.to_string()),
                ])
                .send()
                .await
                .map_err(|e| Error::Request(format!("Request failed: {}", e)))?;

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                return Err(Error::Request(format!(
                    "Pendant API returned {}: {}",
                    status, body
                )));
            }

            let page: ChatSummaryPage = response
                .json()
                .await
                .map_err(|e| Error::Request(format!("Failed to parse response: {}", e)))?;

            pages += 1;
            let count = page.summaries.len();
            summaries.extend(page.summaries);
            debug!(page = pages, count, offset, "Fetched chat summary page");

            if (count as i64) < self.page_limit {
                break;
            }
            if pages >= self.max_pages {
                warn!(
                    pages,
                    fetched = summaries.len(),
                    "Chat summary fetch hit the page cap; window truncated"
                );
                break;
            }
            offset += self.page_limit;
        }

        debug!(
            fetched = summaries.len(),
            page_count = pages,
            duration_ms = start.elapsed().as_millis() as u64,
            "Chat summary fetch complete"
        );
        Ok(summaries)
    }

    #[instrument(skip(self, api_key))]
    async fn fetch_lifelogs(
        &self,
        api_key: &str,
        window: FetchWindow,
    ) -> Result<Vec<RemoteLifelog>> {
        let start = Instant::now();
        let mut lifelogs = Vec::new();
        let mut cursor: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let mut request = self
                .client
                .get(format!("{}/v1/lifelogs", self.base_url))
                .header("X-API-Key", api_key)
                .query(&[
                    ("start", window.start.to_rfc3339()),
                    ("end", window.end.to_rfc3339()),
                    ("limit", self.page_limit.to_string()),
                ]);
            if let Some(ref c) = cursor {
                request = request.query(&[("cursor", c.as_str())]);
            }

            let response = request
                .send()
                .await
                .map_err(|e| Error::Request(format!("Request failed: {}", e)))?;

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                return Err(Error::Request(format!(
                    "Pendant API returned {}: {}",
                    status, body
                )));
            }

            let page: LifelogPage = response
                .json()
                .await
                .map_err(|e| Error::Request(format!("Failed to parse response: {}", e)))?;

            pages += 1;
            let count = page.lifelogs.len();
            lifelogs.extend(page.lifelogs);
            debug!(page = pages, count, "Fetched lifelog page");

            match page.next_cursor {
                Some(next) if pages < self.max_pages => cursor = Some(next),
                Some(_) => {
                    warn!(
                        pages,
                        fetched = lifelogs.len(),
                        "Lifelog fetch hit the page cap; window truncated"
                    );
                    break;
                }
                None => break,
            }
        }

        debug!(
            fetched = lifelogs.len(),
            page_count = pages,
            duration_ms = start.elapsed().as_millis() as u64,
            "Lifelog fetch complete"
        );
        Ok(lifelogs)
    }
}

/// Response envelope for `/v1/chat-summaries`.
#[derive(Deserialize)]
struct ChatSummaryPage {
    summaries: Vec<RemoteChatSummary>,
}

/// Response envelope for `/v1/lifelogs`.
#[derive(Deserialize)]
struct LifelogPage {
    lifelogs: Vec<RemoteLifelog>,
    next_cursor: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_defaults() {
        let client = PendantClient::new();
        assert_eq!(client.base_url, DEFAULT_PENDANT_API_BASE);
        assert_eq!(client.page_limit, defaults::PENDANT_PAGE_LIMIT);
        assert_eq!(client.max_pages, defaults::PENDANT_MAX_PAGES);
    }

    #[test]
    fn test_client_builders_clamp() {
        let client = PendantClient::new().with_page_limit(0).with_max_pages(0);
        assert_eq!(client.page_limit, 1);
        assert_eq!(client.max_pages, 1);
    }

    #[test]
    fn test_lifelog_page_parses_without_cursor() {
        let page: LifelogPage = serde_json::from_str(r#"{"lifelogs": []}"#).unwrap();
        assert!(page.lifelogs.is_empty());
        assert!(page.next_cursor.is_none());
    }
}
