//! NewsAPI client returning the most recent headlines for a symbol.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use market_core::{MarketDataError, NewsArticle, NewsSource};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

const BASE_URL: &str = "https://newsapi.org/v2/everything";

/// Headlines returned per symbol.
pub const MAX_ARTICLES: usize = 5;

#[derive(Clone)]
pub struct NewsApiClient {
    api_key: Option<String>,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct NewsResponse {
    status: String,
    #[serde(default)]
    articles: Vec<NewsResult>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewsResult {
    source: Option<NewsSourceRef>,
    author: Option<String>,
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,
    published_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NewsSourceRef {
    name: Option<String>,
}

impl NewsApiClient {
    /// A client without a key reports `NotConfigured` on every request.
    pub fn new(api_key: Option<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            client,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Get the latest articles mentioning `symbol`, newest first.
    pub async fn get_news(&self, symbol: &str) -> Result<Vec<NewsArticle>, MarketDataError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| MarketDataError::NotConfigured("NEWS_API_KEY is not set".to_string()))?;

        let response = self
            .client
            .get(BASE_URL)
            .query(&[("q", symbol), ("sortBy", "publishedAt"), ("apiKey", api_key)])
            .send()
            .await
            .map_err(|e| MarketDataError::ApiError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!("Failed to fetch news for {}: HTTP {}", symbol, status);
            return Err(MarketDataError::ApiError(format!(
                "Failed to fetch news. Status code: {}",
                status.as_u16()
            )));
        }

        let body: NewsResponse = response
            .json()
            .await
            .map_err(|e| MarketDataError::ApiError(e.to_string()))?;

        parse_articles(body)
    }
}

fn parse_articles(body: NewsResponse) -> Result<Vec<NewsArticle>, MarketDataError> {
    if body.status != "ok" {
        return Err(MarketDataError::ApiError(
            body.message.unwrap_or_else(|| format!("News API status {}", body.status)),
        ));
    }

    Ok(body
        .articles
        .into_iter()
        .filter_map(|r| {
            // Untitled or unlinked entries cannot be rendered as headlines
            let title = r.title?;
            let url = r.url?;
            let published_at = r
                .published_at
                .as_deref()
                .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
                .map(|dt| dt.with_timezone(&Utc))?;
            Some(NewsArticle {
                title,
                description: r.description,
                published_at,
                url,
                source: r.source.and_then(|s| s.name),
                author: r.author,
            })
        })
        .take(MAX_ARTICLES)
        .collect())
}

#[async_trait]
impl NewsSource for NewsApiClient {
    async fn latest(&self, symbol: &str) -> Result<Vec<NewsArticle>, MarketDataError> {
        self.get_news(symbol).await
    }
}
