//! Dashboard Orchestrator
//!
//! Combines the history, quote and news collaborators with the indicator
//! library into the per-symbol views the dashboard serves, caching the
//! expensive ones for an hour within the current day.

pub mod cache;
pub mod models;


use chrono::{Duration, Utc};
use market_core::{
    Exchange, Fundamentals, HistoryRange, HistorySource, MarketDataError, NewsArticle,
    NewsSource, QuoteSource,
};
use std::sync::Arc;
use technical_analysis::{
    validate_alert_threshold, MovingAverageOverlay, StockStatistics, MOVING_AVERAGE_WINDOW,
};

pub use cache::{CacheKey, TtlCache, DEFAULT_TTL_SECS};
pub use models::{
    AlertReport, ChartPoint, MovementAlert, PriceComparison, PriceVolumeChart, StockOverview,
};

pub struct DashboardOrchestrator {
    history: Arc<dyn HistorySource>,
    quotes: Arc<dyn QuoteSource>,
    news: Arc<dyn NewsSource>,
    exchange: Exchange,
    overview_cache: TtlCache<StockOverview>,
    overlay_cache: TtlCache<MovingAverageOverlay>,
}

impl DashboardOrchestrator {
    pub fn new(
        history: Arc<dyn HistorySource>,
        quotes: Arc<dyn QuoteSource>,
        news: Arc<dyn NewsSource>,
    ) -> Self {
        Self {
            history,
            quotes,
            news,
            exchange: Exchange::default(),
            overview_cache: TtlCache::default(),
            overlay_cache: TtlCache::default(),
        }
    }

    pub fn with_exchange(mut self, exchange: Exchange) -> Self {
        self.exchange = exchange;
        self
    }

    /// Replace both caches with empty ones using `ttl`.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.overview_cache = TtlCache::new(ttl);
        self.overlay_cache = TtlCache::new(ttl);
        self
    }

    pub fn exchange(&self) -> Exchange {
        self.exchange
    }

    pub fn cache_ttl(&self) -> Duration {
        self.overview_cache.ttl()
    }

    /// Statistics, valuation fields and both history series for `symbol`.
    ///
    /// Only the yearly series is required; a failed intraday or fundamentals
    /// fetch leaves those parts empty.
    pub async fn stock_overview(&self, symbol: &str) -> Result<StockOverview, MarketDataError> {
        let symbol = normalize(symbol)?;
        if let Some(cached) = self.overview_cache.get(&symbol) {
            tracing::debug!("Overview cache hit for {}", symbol);
            return Ok(cached);
        }

        let listing = self.exchange.qualify(&symbol);
        tracing::info!("Fetching overview for {}", listing);

        let (yearly, intraday, fundamentals) = tokio::join!(
            self.history.history(&listing, HistoryRange::Year),
            self.history.history(&listing, HistoryRange::Intraday),
            self.history.fundamentals(&listing),
        );

        let yearly = yearly?;
        if yearly.is_empty() {
            return Err(MarketDataError::QuoteUnavailable(format!(
                "Data for {} is unavailable",
                listing
            )));
        }

        let intraday = intraday.unwrap_or_else(|e| {
            tracing::warn!("Intraday history failed for {}: {}", listing, e);
            Vec::new()
        });
        let fundamentals = fundamentals.unwrap_or_else(|e| {
            tracing::warn!("Fundamentals failed for {}: {}", listing, e);
            Fundamentals {
                symbol: listing.clone(),
                ..Default::default()
            }
        });

        let current_price = fundamentals
            .current_price
            .or_else(|| intraday.last().map(|b| b.close));
        let statistics = StockStatistics::from_bars(&yearly, current_price)?;

        let overview = StockOverview {
            symbol: symbol.clone(),
            listing,
            long_name: fundamentals.long_name,
            pe_ratio: fundamentals.trailing_pe,
            market_cap: fundamentals.market_cap,
            statistics,
            yearly,
            intraday,
            fetched_at: Utc::now(),
        };
        self.overview_cache.insert(&symbol, overview.clone());
        Ok(overview)
    }

    pub async fn chart(
        &self,
        symbol: &str,
        range: HistoryRange,
    ) -> Result<PriceVolumeChart, MarketDataError> {
        let overview = self.stock_overview(symbol).await?;
        let bars = match range {
            HistoryRange::Intraday => &overview.intraday,
            HistoryRange::Year => &overview.yearly,
        };
        Ok(PriceVolumeChart::from_bars(&overview.symbol, range, bars))
    }

    /// SMA and EMA over the yearly closes.
    pub async fn moving_averages(
        &self,
        symbol: &str,
    ) -> Result<MovingAverageOverlay, MarketDataError> {
        let symbol = normalize(symbol)?;
        if let Some(cached) = self.overlay_cache.get(&symbol) {
            return Ok(cached);
        }

        let overview = self.stock_overview(&symbol).await?;
        let overlay = MovingAverageOverlay::from_bars(&overview.yearly, MOVING_AVERAGE_WINDOW);
        self.overlay_cache.insert(&symbol, overlay.clone());
        Ok(overlay)
    }

    /// Current price of each symbol. A failed quote is reported as
    /// unavailable without affecting the others.
    pub async fn price_comparison(&self, symbols: &[String]) -> Vec<PriceComparison> {
        let mut comparisons = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            let Ok(symbol) = normalize(symbol) else {
                continue;
            };
            let current_price = self.quotes.price_quote(&self.exchange.qualify(&symbol)).await;
            comparisons.push(PriceComparison {
                symbol,
                current_price,
            });
        }
        comparisons
    }

    /// Flag symbols that moved more than `threshold_pct` away from their
    /// 52-week low or high.
    pub async fn movement_alerts(
        &self,
        symbols: &[String],
        threshold_pct: f64,
    ) -> Result<AlertReport, MarketDataError> {
        let threshold_pct = validate_alert_threshold(threshold_pct)?;

        let mut alerts = Vec::new();
        let mut unavailable = Vec::new();
        for symbol in symbols {
            match self.stock_overview(symbol).await {
                Ok(overview) => {
                    let stats = &overview.statistics;
                    alerts.push(MovementAlert {
                        symbol: overview.symbol.clone(),
                        current_price: stats.current_price,
                        gain_from_low_pct: stats.gain_from_low_pct,
                        drop_from_high_pct: stats.drop_from_high_pct,
                        significant: stats.has_significant_movement(threshold_pct),
                    });
                }
                Err(e) => {
                    tracing::warn!("Skipping {} in movement alerts: {}", symbol, e);
                    unavailable.push(symbol.trim().to_uppercase());
                }
            }
        }

        Ok(AlertReport {
            threshold_pct,
            alerts,
            unavailable,
        })
    }

    /// Latest headlines, searched by the bare symbol.
    pub async fn news(&self, symbol: &str) -> Result<Vec<NewsArticle>, MarketDataError> {
        let symbol = normalize(symbol)?;
        self.news.latest(&symbol).await
    }

    /// Drop cached data for one symbol. Returns the number of entries removed.
    pub fn invalidate(&self, symbol: &str) -> usize {
        let symbol = symbol.trim().to_uppercase();
        let removed = self.overview_cache.invalidate(&symbol) + self.overlay_cache.invalidate(&symbol);
        tracing::info!("Invalidated {} cache entries for {}", removed, symbol);
        removed
    }

    pub fn invalidate_all(&self) -> usize {
        let removed = self.overview_cache.invalidate_all() + self.overlay_cache.invalidate_all();
        tracing::info!("Cleared {} cache entries", removed);
        removed
    }

    pub fn purge_expired(&self) -> usize {
        self.overview_cache.purge_expired() + self.overlay_cache.purge_expired()
    }
}

fn normalize(symbol: &str) -> Result<String, MarketDataError> {
    let symbol = symbol.trim().to_uppercase();
    if symbol.is_empty() {
        return Err(MarketDataError::InvalidData(
            "Symbol must not be empty".to_string(),
        ));
    }
    Ok(symbol)
}
