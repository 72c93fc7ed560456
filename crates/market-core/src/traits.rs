use async_trait::async_trait;
use crate::{Bar, Fundamentals, HistoryRange, MarketDataError, NewsArticle, PriceQuote};

/// Source of current prices, addressed by exchange-suffixed symbol (`TCS.NS`).
#[async_trait]
pub trait QuoteSource: Send + Sync {
    async fn quote(&self, symbol: &str) -> Result<f64, MarketDataError>;

    /// Fetch a quote, folding every failure into `PriceQuote::Unavailable`.
    ///
    /// Errors are logged here and never returned; callers that iterate over
    /// many symbols rely on one failure not affecting the rest.
    async fn price_quote(&self, symbol: &str) -> PriceQuote {
        match self.quote(symbol).await {
            Ok(price) => {
                let quote = PriceQuote::from_price(price);
                if !quote.is_available() {
                    tracing::warn!("Discarding invalid price {} for {}", price, symbol);
                }
                quote
            }
            Err(e) => {
                tracing::warn!("Quote unavailable for {}: {}", symbol, e);
                PriceQuote::Unavailable
            }
        }
    }
}

/// Source of historical bars and published valuation fields.
#[async_trait]
pub trait HistorySource: Send + Sync {
    async fn history(&self, symbol: &str, range: HistoryRange) -> Result<Vec<Bar>, MarketDataError>;

    async fn fundamentals(&self, symbol: &str) -> Result<Fundamentals, MarketDataError>;
}

/// Source of recent headlines for a symbol.
#[async_trait]
pub trait NewsSource: Send + Sync {
    async fn latest(&self, symbol: &str) -> Result<Vec<NewsArticle>, MarketDataError>;
}
