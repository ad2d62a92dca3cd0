//! Image search provider trait and the Custom Search client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{SearchError, SearchResult};

/// Options forwarded to the upstream search provider.
///
/// Part of the cache key: the same keywords with different options are
/// different searches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchOptions {
    /// Results requested per keyword (provider caps at 10 per page)
    pub per_keyword_limit: u32,
    /// Safe-search level (off/medium/high)
    pub safe_search: String,
    /// Image size filter (e.g. "large", "xlarge")
    pub image_size: String,
    /// Region bias, e.g. "countryKR"
    pub region: Option<String>,
    /// Result language, e.g. "lang_ko"
    pub language: Option<String>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            per_keyword_limit: 10,
            safe_search: "medium".to_string(),
            image_size: "large".to_string(),
            region: None,
            language: None,
        }
    }
}

/// Raw item as returned by the provider, before filtering and scoring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawSearchItem {
    /// Full-size image URL
    pub link: String,
    #[serde(default)]
    pub title: String,
    /// Page domain
    #[serde(rename = "displayLink", default)]
    pub display_link: String,
    #[serde(default)]
    pub image: Option<RawImageInfo>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawImageInfo {
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    #[serde(rename = "thumbnailLink", default)]
    pub thumbnail_link: Option<String>,
}

/// An upstream image-search backend. One call searches one keyword.
#[async_trait]
pub trait ImageSearchProvider: Send + Sync {
    async fn search(
        &self,
        keyword: &str,
        options: &SearchOptions,
    ) -> SearchResult<Vec<RawSearchItem>>;
}

/// Google Custom Search-style image search client.
pub struct CseClient {
    http: reqwest::Client,
    api_key: String,
    engine_id: String,
    base_url: String,
}

/// Provider response envelope.
#[derive(Debug, Deserialize)]
struct CseResponse {
    #[serde(default)]
    items: Vec<RawSearchItem>,
}

impl CseClient {
    const DEFAULT_BASE_URL: &'static str = "https://www.googleapis.com/customsearch/v1";

    pub fn new(api_key: impl Into<String>, engine_id: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            engine_id: engine_id.into(),
            base_url: Self::DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Create from `SEARCH_API_KEY` / `SEARCH_ENGINE_ID` environment
    /// variables.
    pub fn from_env() -> SearchResult<Self> {
        let api_key = std::env::var("SEARCH_API_KEY")
            .map_err(|_| SearchError::not_configured("SEARCH_API_KEY not set"))?;
        let engine_id = std::env::var("SEARCH_ENGINE_ID")
            .map_err(|_| SearchError::not_configured("SEARCH_ENGINE_ID not set"))?;
        Ok(Self::new(api_key, engine_id))
    }

    /// Override the endpoint; used by tests.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl ImageSearchProvider for CseClient {
    async fn search(
        &self,
        keyword: &str,
        options: &SearchOptions,
    ) -> SearchResult<Vec<RawSearchItem>> {
        let mut query: Vec<(&str, String)> = vec![
            ("key", self.api_key.clone()),
            ("cx", self.engine_id.clone()),
            ("q", keyword.to_string()),
            ("searchType", "image".to_string()),
            ("num", options.per_keyword_limit.min(10).to_string()),
            ("safe", options.safe_search.clone()),
            ("imgSize", options.image_size.clone()),
        ];
        if let Some(region) = &options.region {
            query.push(("gl", region.clone()));
        }
        if let Some(language) = &options.language {
            query.push(("lr", language.clone()));
        }

        debug!(keyword = %keyword, "Searching image provider");

        let response = self.http.get(&self.base_url).query(&query).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(keyword = %keyword, status = status.as_u16(), "Image search failed");
            return Err(SearchError::ProviderStatus {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: CseResponse = response.json().await?;
        debug!(keyword = %keyword, count = parsed.items.len(), "Provider returned items");
        Ok(parsed.items)
    }
}
