//! Page source — the upstream wiki supplying a contributor's documents.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

const REQUEST_TIMEOUT_SECS: u64 = 30;
const SEARCH_PAGE_SIZE: usize = 100;

#[derive(Debug, Error)]
pub enum PageSourceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("page source request failed (status {status}): {message}")]
    Api { status: u16, message: String },
}

/// One document as reported by the upstream wiki.
#[derive(Debug, Clone, Default)]
pub struct RemotePage {
    pub id: String,
    pub page_type: String,
    pub title: String,
    pub content: String,
    pub link: String,
    pub timestamp: i64,
}

/// Seam over the wiki backend. Injected as a trait object so handlers never
/// depend on the concrete HTTP client.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// All pages authored by the given contributor, without body content.
    async fn pages_by_contributor(&self, email: &str)
        -> Result<Vec<RemotePage>, PageSourceError>;

    /// Raw storage-format body of a single page.
    async fn page_content(&self, page_id: &str) -> Result<String, PageSourceError>;

    /// Fetches the contributor's pages and fills in body content. A page
    /// whose content fetch fails is kept without content.
    async fn pages_by_contributor_with_content(
        &self,
        email: &str,
    ) -> Result<Vec<RemotePage>, PageSourceError> {
        let mut pages = self.pages_by_contributor(email).await?;
        for page in &mut pages {
            match self.page_content(&page.id).await {
                Ok(content) => page.content = content,
                Err(e) => warn!("failed to fetch content for page {}: {e}", page.id),
            }
        }
        Ok(pages)
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
    #[serde(rename = "totalSize", default)]
    total_size: usize,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    content: SearchContent,
    // Epoch seconds; not all deployments report it.
    #[serde(default)]
    timestamp: i64,
}

#[derive(Debug, Deserialize)]
struct SearchContent {
    #[serde(default)]
    id: String,
    #[serde(rename = "type", default)]
    content_type: String,
    #[serde(default)]
    title: String,
}

/// Concrete wiki client. Authenticates with a session cookie when one is
/// configured; the search API pages through results in fixed-size batches.
pub struct WikiClient {
    client: Client,
    base_url: String,
    cookie: Option<String>,
}

impl WikiClient {
    pub fn new(base_url: String, cookie: Option<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .expect("Failed to build HTTP client"),
            base_url,
            cookie,
        }
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        let mut request = self.client.get(url).header("accept", "*/*");
        if let Some(cookie) = &self.cookie {
            request = request.header("cookie", cookie);
        }
        request
    }

    fn page_link(&self, page_id: &str) -> String {
        format!("{}/pages/viewpage.action?pageId={page_id}", self.base_url)
    }
}

#[async_trait]
impl PageSource for WikiClient {
    async fn pages_by_contributor(
        &self,
        email: &str,
    ) -> Result<Vec<RemotePage>, PageSourceError> {
        let url = format!("{}/rest/api/search", self.base_url);
        let cql = format!(r#"contributor in ("{email}") AND type in ("page")"#);

        let mut all_pages = Vec::new();
        let mut start = 0usize;

        loop {
            let start_param = start.to_string();
            let limit_param = SEARCH_PAGE_SIZE.to_string();
            let response = self
                .get(&url)
                .query(&[
                    ("cql", cql.as_str()),
                    ("start", start_param.as_str()),
                    ("limit", limit_param.as_str()),
                    ("excerpt", "highlight"),
                    ("includeArchivedSpaces", "false"),
                ])
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                let message = response.text().await.unwrap_or_default();
                return Err(PageSourceError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            let page: SearchResponse = response.json().await?;
            let batch_size = page.results.len();

            for result in page.results {
                all_pages.push(RemotePage {
                    link: self.page_link(&result.content.id),
                    id: result.content.id,
                    page_type: result.content.content_type,
                    title: result.content.title,
                    content: String::new(),
                    timestamp: result.timestamp,
                });
            }

            if batch_size == 0 || start + batch_size >= page.total_size {
                break;
            }
            start += SEARCH_PAGE_SIZE;
        }

        Ok(all_pages)
    }

    async fn page_content(&self, page_id: &str) -> Result<String, PageSourceError> {
        let url = format!(
            "{}/plugins/viewstorage/viewpagestorage.action",
            self.base_url
        );

        let response = self.get(&url).query(&[("pageId", page_id)]).send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(PageSourceError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.text().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_response_parses_wiki_payload() {
        let json = r#"{
            "results": [
                {"content": {"id": "101", "type": "page", "title": "Runbook"}, "timestamp": 1700000000},
                {"content": {"id": "102", "type": "page", "title": "Postmortem"}}
            ],
            "totalSize": 2
        }"#;
        let parsed: SearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.total_size, 2);
        assert_eq!(parsed.results.len(), 2);
        assert_eq!(parsed.results[0].content.id, "101");
        assert_eq!(parsed.results[0].timestamp, 1_700_000_000);
        assert_eq!(parsed.results[1].timestamp, 0);
    }

    #[test]
    fn test_search_response_tolerates_missing_fields() {
        let parsed: SearchResponse = serde_json::from_str(r#"{"results": []}"#).unwrap();
        assert_eq!(parsed.total_size, 0);
        assert!(parsed.results.is_empty());
    }
}
