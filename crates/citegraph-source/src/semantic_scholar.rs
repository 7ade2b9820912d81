//! Semantic Scholar Graph API client.
//!
//! Endpoints used:
//! - `GET /paper/search/match?query=` for title resolution
//! - `GET /paper/{id}`
//! - `GET /paper/{id}/citations` and `/paper/{id}/references`, paginated
//!
//! Pacing between calls is the caller's job (see `RateLimiter`). This
//! client only retries HTTP 429 with exponential backoff.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use citegraph_core::config::SourceConfig;
use citegraph_core::{CitationItem, Error, Page, PaperRecord, Result};

use crate::source::{ExternalSource, PageRequest};

/// Paper fields requested from every endpoint.
pub const PAPER_FIELDS: &str = "paperId,corpusId,url,title,abstract,venue,publicationVenue,year,\
     referenceCount,citationCount,influentialCitationCount,isOpenAccess,fieldsOfStudy,\
     s2FieldsOfStudy,publicationTypes,publicationDate,authors";

/// The API rejects citation pages larger than this.
pub const MAX_PAGE_LIMIT: usize = 1000;

const MAX_RETRIES: u32 = 3;
const RETRY_DELAY: Duration = Duration::from_secs(2);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct MatchResponse {
    #[serde(default)]
    data: Vec<PaperRecord>,
}

/// HTTP client for the Semantic Scholar Graph API.
pub struct SemanticScholarClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    retry_delay: Duration,
}

impl SemanticScholarClient {
    pub fn new(config: &SourceConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::Source(format!("HTTP client init failed: {}", e)))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            retry_delay: RETRY_DELAY,
        })
    }

    /// Override the base delay used for 429 backoff.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// GET with 429 backoff. `Ok(None)` on 404.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Option<T>> {
        let url = format!("{}{}", self.base_url, path);
        let mut retries = 0;
        loop {
            let mut request = self.client.get(&url).query(query);
            if let Some(ref api_key) = self.api_key {
                request = request.header("x-api-key", api_key);
            }

            debug!("GET {}", url);
            let response = request
                .send()
                .await
                .map_err(|e| Error::Source(format!("request to {} failed: {}", url, e)))?;

            let status = response.status();
            if status == StatusCode::TOO_MANY_REQUESTS && retries < MAX_RETRIES {
                retries += 1;
                let delay = self.retry_delay * 2u32.pow(retries - 1);
                warn!(
                    "Rate limited by Semantic Scholar, retrying ({}/{}) in {:?}",
                    retries, MAX_RETRIES, delay
                );
                tokio::time::sleep(delay).await;
                continue;
            }
            if status == StatusCode::NOT_FOUND {
                return Ok(None);
            }
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(Error::Source(format!("API error {} for {}: {}", status, url, body)));
            }

            return response
                .json::<T>()
                .await
                .map(Some)
                .map_err(|e| Error::Source(format!("malformed response from {}: {}", url, e)));
        }
    }

    async fn list(&self, paper_id: &str, edge: &str, page: PageRequest) -> Result<Page<CitationItem>> {
        let path = format!("/paper/{}/{}", paper_id, edge);
        let page = self
            .get_json::<Page<CitationItem>>(&path, &page_query(&page))
            .await?
            .unwrap_or_default();
        debug!(
            "Listed {} {} of {} (next={:?})",
            page.data.len(),
            edge,
            paper_id,
            page.next
        );
        Ok(page)
    }
}

/// Query parameters for a citations/references page.
fn page_query(page: &PageRequest) -> Vec<(&'static str, String)> {
    let mut query = vec![
        ("fields", format!("{},isInfluential", PAPER_FIELDS)),
        ("limit", page.limit.clamp(1, MAX_PAGE_LIMIT).to_string()),
        ("offset", page.offset.to_string()),
    ];
    if let Some(year) = page.year {
        query.push(("publicationDateOrYear", year.to_string()));
    }
    query
}

#[async_trait]
impl ExternalSource for SemanticScholarClient {
    async fn find_by_title(&self, title: &str) -> Result<Option<PaperRecord>> {
        let query = [
            ("query", title.to_string()),
            ("fields", PAPER_FIELDS.to_string()),
        ];
        let found = self
            .get_json::<MatchResponse>("/paper/search/match", &query)
            .await?
            .and_then(|r| r.data.into_iter().next());
        if found.is_none() {
            debug!("No title match for '{}'", title);
        }
        Ok(found)
    }

    async fn find_by_id(&self, paper_id: &str) -> Result<Option<PaperRecord>> {
        let path = format!("/paper/{}", paper_id);
        self.get_json(&path, &[("fields", PAPER_FIELDS.to_string())])
            .await
    }

    async fn list_citations(&self, paper_id: &str, page: PageRequest) -> Result<Page<CitationItem>> {
        self.list(paper_id, "citations", page).await
    }

    async fn list_references(&self, paper_id: &str, page: PageRequest) -> Result<Page<CitationItem>> {
        self.list(paper_id, "references", page).await
    }
}
