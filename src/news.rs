//! News search client.
//!
//! Queries the newsapi.org `everything` endpoint and normalizes the result
//! into [`NewsArticle`]s. Any answer other than `200 OK` is treated as "no results";
//! only transport failures are reported as errors.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};

/// Default number of articles requested per lookup.
pub const DEFAULT_PAGE_SIZE: u32 = 5;

/// A normalized news article, as handed to the assistant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsArticle {
    pub title: String,
    pub author: Option<String>,
    pub source: NewsSource,
    pub description: Option<String>,
    pub url: String,
    pub content: Option<String>,
}

/// Publisher of an article.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewsSource {
    #[serde(default)]
    pub name: Option<String>,
}

/// Upstream response body.
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    articles: Vec<RawArticle>,
}

/// Article as returned by the news service.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawArticle {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    source: NewsSource,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    content: Option<String>,
}

impl RawArticle {
    fn normalize(self) -> Option<NewsArticle> {
        let title = self.title.filter(|t| !t.trim().is_empty())?;
        let url = self.url.filter(|u| !u.trim().is_empty())?;
        Some(NewsArticle {
            title,
            author: self.author,
            source: self.source,
            description: self.description,
            url,
            content: self.content,
        })
    }
}

/// Client for the news search endpoint.
#[derive(Clone)]
pub struct NewsClient {
    http: reqwest::Client,
    endpoint: Url,
    api_key: String,
    page_size: u32,
}

impl std::fmt::Debug for NewsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewsClient")
            .field("endpoint", &self.endpoint.as_str())
            .field("page_size", &self.page_size)
            .finish_non_exhaustive()
    }
}

impl NewsClient {
    /// Create a client for the service at `base_url` (e.g. `https://newsapi.org`).
    pub fn new(base_url: &str, api_key: impl Into<String>) -> Result<Self> {
        Self::with_client(base_url, api_key, reqwest::Client::new())
    }

    /// Create a client sharing an existing `reqwest` client.
    pub fn with_client(
        base_url: &str,
        api_key: impl Into<String>,
        http: reqwest::Client,
    ) -> Result<Self> {
        Ok(Self {
            http,
            endpoint: Url::parse(base_url)?.join("/v2/everything")?,
            api_key: api_key.into(),
            page_size: DEFAULT_PAGE_SIZE,
        })
    }

    /// Set the number of articles requested per lookup.
    #[must_use]
    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Search articles about `topic`.
    ///
    /// Returns an empty list when the service answers with anything but
    /// `200 OK`, and [`AppError::NewsRequest`] when the request itself fails.
    pub async fn get_news(&self, topic: &str) -> Result<Vec<NewsArticle>> {
        tracing::info!(name: "news.request", topic = %topic, page_size = self.page_size, "Searching news");

        let page_size = self.page_size.to_string();
        let response = self
            .http
            .get(self.endpoint.clone())
            .query(&[("q", topic), ("pageSize", page_size.as_str())])
            .header("X-Api-Key", &self.api_key)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(name: "news.request.failed", error = %e, "Error occurred during news API request");
                AppError::NewsRequest(e)
            })?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            tracing::warn!(name: "news.request.rejected", status = %status, "News API did not answer 200 OK");
            return Ok(Vec::new());
        }

        let body: SearchResponse = response.json().await.map_err(AppError::NewsRequest)?;
        let articles: Vec<NewsArticle> = body
            .articles
            .into_iter()
            .filter_map(RawArticle::normalize)
            .take(self.page_size as usize)
            .collect();

        tracing::info!(name: "news.request.done", topic = %topic, article_count = articles.len(), "News search completed");
        Ok(articles)
    }
}
