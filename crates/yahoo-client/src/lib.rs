//! Yahoo Finance market data client.
//!
//! Implements the quote and history collaborator traits from `market-core`
//! on top of the public chart (`v8`) and quote (`v7`) endpoints. Symbols are
//! expected in exchange-suffixed form (`TCS.NS`).

mod models;
mod rate_limiter;

use async_trait::async_trait;
use market_core::{Bar, Fundamentals, HistoryRange, HistorySource, MarketDataError, QuoteSource};
use reqwest::Client;
use std::time::Duration;

use models::{ChartResponse, ChartResult, QuoteResponse};
use rate_limiter::RateLimiter;

const CHART_URL: &str = "https://query2.finance.yahoo.com/v8/finance/chart";
const QUOTE_URL: &str = "https://query2.finance.yahoo.com/v7/finance/quote";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";
const DEFAULT_RATE_LIMIT: usize = 120;
const MAX_ATTEMPTS: u32 = 3;

#[derive(Clone)]
pub struct YahooFinanceClient {
    client: Client,
    rate_limiter: RateLimiter,
}

/// Backoff before retrying after a 429 on `attempt`; `None` on the final attempt.
fn retry_delay(attempt: u32) -> Option<Duration> {
    (attempt + 1 < MAX_ATTEMPTS).then(|| Duration::from_secs(2u64 << attempt))
}

impl YahooFinanceClient {
    pub fn new() -> Self {
        Self::with_rate_limit(DEFAULT_RATE_LIMIT)
    }

    /// `requests_per_minute` caps outbound calls across all clones.
    pub fn with_rate_limit(requests_per_minute: usize) -> Self {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            rate_limiter: RateLimiter::new(requests_per_minute, Duration::from_secs(60)),
        }
    }

    /// Send a request with rate limiting and automatic 429 retry.
    async fn send_request(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::Response, MarketDataError> {
        let request = builder.build().map_err(|e| MarketDataError::ApiError(e.to_string()))?;

        for attempt in 0..MAX_ATTEMPTS {
            self.rate_limiter.acquire().await;
            let req_clone = request.try_clone()
                .ok_or_else(|| MarketDataError::ApiError("Cannot clone request".to_string()))?;
            let response = self.client.execute(req_clone).await
                .map_err(|e| MarketDataError::ApiError(e.to_string()))?;

            if response.status().as_u16() != 429 {
                return Ok(response);
            }

            match retry_delay(attempt) {
                Some(wait) => {
                    tracing::warn!(
                        "Yahoo Finance 429 rate limited, waiting {}s before retry {}/{}",
                        wait.as_secs(),
                        attempt + 1,
                        MAX_ATTEMPTS - 1
                    );
                    tokio::time::sleep(wait).await;
                }
                None => tracing::warn!("Yahoo Finance 429 rate limited, giving up"),
            }
        }

        Err(MarketDataError::ApiError(format!(
            "Rate limited by Yahoo Finance after {} retries",
            MAX_ATTEMPTS
        )))
    }

    async fn get_chart(&self, symbol: &str, range: &str, interval: &str) -> Result<ChartResult, MarketDataError> {
        let url = format!("{}/{}", CHART_URL, symbol);

        let response = self.send_request(
            self.client.get(&url).query(&[("range", range), ("interval", interval)])
        ).await?;

        if response.status().as_u16() == 404 {
            return Err(MarketDataError::QuoteUnavailable(symbol.to_string()));
        }
        if !response.status().is_success() {
            return Err(MarketDataError::ApiError(format!(
                "HTTP {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }

        let chart: ChartResponse = response
            .json()
            .await
            .map_err(|e| MarketDataError::ApiError(e.to_string()))?;

        let result = chart.into_result(symbol)?;
        tracing::debug!(
            "Chart for {} ({} {}): {} rows, currency {}",
            symbol,
            range,
            interval,
            result.timestamp.len(),
            result.meta.currency.as_deref().unwrap_or("?")
        );
        Ok(result)
    }

    /// Latest traded price for a symbol.
    pub async fn get_price(&self, symbol: &str) -> Result<f64, MarketDataError> {
        let chart = self
            .get_chart(symbol, HistoryRange::Intraday.range_param(), "1d")
            .await?;
        chart
            .current_price()
            .ok_or_else(|| MarketDataError::QuoteUnavailable(symbol.to_string()))
    }

    /// Historical bars for a symbol over the given range.
    pub async fn get_history(&self, symbol: &str, range: HistoryRange) -> Result<Vec<Bar>, MarketDataError> {
        let chart = self
            .get_chart(symbol, range.range_param(), range.interval_param())
            .await?;
        Ok(chart.bars())
    }

    /// Published valuation fields (P/E, market cap) for a symbol.
    pub async fn get_fundamentals(&self, symbol: &str) -> Result<Fundamentals, MarketDataError> {
        let response = self.send_request(
            self.client.get(QUOTE_URL).query(&[("symbols", symbol)])
        ).await?;

        if !response.status().is_success() {
            return Err(MarketDataError::ApiError(format!(
                "Quote HTTP {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }

        let quote: QuoteResponse = response
            .json()
            .await
            .map_err(|e| MarketDataError::ApiError(e.to_string()))?;

        quote.into_fundamentals(symbol)
    }
}

impl Default for YahooFinanceClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QuoteSource for YahooFinanceClient {
    async fn quote(&self, symbol: &str) -> Result<f64, MarketDataError> {
        self.get_price(symbol).await
    }
}

#[async_trait]
impl HistorySource for YahooFinanceClient {
    async fn history(&self, symbol: &str, range: HistoryRange) -> Result<Vec<Bar>, MarketDataError> {
        self.get_history(symbol, range).await
    }

    async fn fundamentals(&self, symbol: &str) -> Result<Fundamentals, MarketDataError> {
        self.get_fundamentals(symbol).await
    }
}
