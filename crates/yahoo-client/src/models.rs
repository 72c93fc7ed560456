//! Wire types for the Yahoo Finance chart and quote endpoints.

use chrono::DateTime;
use market_core::{Bar, Fundamentals, MarketDataError};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct ChartResponse {
    pub chart: ChartBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChartBody {
    pub result: Option<Vec<ChartResult>>,
    pub error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    pub code: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ChartMeta {
    pub regular_market_price: Option<f64>,
    pub currency: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChartResult {
    pub meta: ChartMeta,
    #[serde(default)]
    pub timestamp: Vec<i64>,
    pub indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChartIndicators {
    #[serde(default)]
    pub quote: Vec<ChartQuote>,
}

/// Columns are parallel to `ChartResult::timestamp`; gaps are `null`.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ChartQuote {
    #[serde(default)]
    pub open: Vec<Option<f64>>,
    #[serde(default)]
    pub high: Vec<Option<f64>>,
    #[serde(default)]
    pub low: Vec<Option<f64>>,
    #[serde(default)]
    pub close: Vec<Option<f64>>,
    #[serde(default)]
    pub volume: Vec<Option<f64>>,
}

impl ChartResponse {
    /// First result, or the provider's error message.
    pub(crate) fn into_result(self, symbol: &str) -> Result<ChartResult, MarketDataError> {
        if let Some(err) = self.chart.error {
            return Err(MarketDataError::ApiError(format!(
                "{} for {}: {}",
                err.code.unwrap_or_else(|| "Error".to_string()),
                symbol,
                err.description.unwrap_or_default()
            )));
        }
        self.chart
            .result
            .and_then(|results| results.into_iter().next())
            .ok_or_else(|| MarketDataError::QuoteUnavailable(symbol.to_string()))
    }
}

impl ChartResult {
    /// Rows with any missing OHLC column are dropped (halted intervals).
    pub(crate) fn bars(&self) -> Vec<Bar> {
        let Some(quote) = self.indicators.quote.first() else {
            return Vec::new();
        };

        self.timestamp
            .iter()
            .enumerate()
            .filter_map(|(i, &ts)| {
                let open = column(&quote.open, i)?;
                let high = column(&quote.high, i)?;
                let low = column(&quote.low, i)?;
                let close = column(&quote.close, i)?;
                Some(Bar {
                    timestamp: DateTime::from_timestamp(ts, 0)?,
                    open,
                    high,
                    low,
                    close,
                    volume: column(&quote.volume, i).unwrap_or(0.0),
                })
            })
            .collect()
    }

    /// Regular market price, falling back to the latest non-null close.
    pub(crate) fn current_price(&self) -> Option<f64> {
        self.meta.regular_market_price.or_else(|| {
            self.indicators
                .quote
                .first()
                .and_then(|q| q.close.iter().rev().find_map(|c| *c))
        })
    }
}

fn column(values: &[Option<f64>], i: usize) -> Option<f64> {
    values.get(i).copied().flatten()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct QuoteResponse {
    pub quote_response: QuoteBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct QuoteBody {
    #[serde(default)]
    pub result: Vec<QuoteResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct QuoteResult {
    pub symbol: String,
    pub regular_market_price: Option<f64>,
    #[serde(rename = "trailingPE")]
    pub trailing_pe: Option<f64>,
    pub market_cap: Option<f64>,
    pub long_name: Option<String>,
}

impl QuoteResponse {
    pub(crate) fn into_fundamentals(self, symbol: &str) -> Result<Fundamentals, MarketDataError> {
        let quote = self
            .quote_response
            .result
            .into_iter()
            .find(|q| q.symbol.eq_ignore_ascii_case(symbol))
            .ok_or_else(|| {
                MarketDataError::QuoteUnavailable(format!("No quote data found for {}", symbol))
            })?;

        Ok(Fundamentals {
            symbol: quote.symbol,
            current_price: quote.regular_market_price,
            trailing_pe: quote.trailing_pe,
            market_cap: quote.market_cap,
            long_name: quote.long_name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHART_FIXTURE: &str = r#"{
        "chart": {
            "result": [{
                "meta": {"symbol": "TCS.NS", "regularMarketPrice": 3600.5, "currency": "INR"},
                "timestamp": [1760500800, 1760587200, 1760673600],
                "indicators": {"quote": [{
                    "open":   [3500.0, null, 3550.0],
                    "high":   [3520.0, 3540.0, 3610.0],
                    "low":    [3490.0, 3500.0, 3540.0],
                    "close":  [3510.0, 3530.0, 3600.0],
                    "volume": [120000, 98000, null]
                }]}
            }],
            "error": null
        }
    }"#;

    #[test]
    fn test_chart_bars_skip_incomplete_rows() {
        let response: ChartResponse = serde_json::from_str(CHART_FIXTURE).unwrap();
        let result = response.into_result("TCS.NS").unwrap();
        let bars = result.bars();

        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].close, 3510.0);
        assert_eq!(bars[0].volume, 120000.0);
        // missing volume is reported as zero, the row is kept
        assert_eq!(bars[1].close, 3600.0);
        assert_eq!(bars[1].volume, 0.0);
    }

    #[test]
    fn test_chart_current_price_prefers_meta() {
        let response: ChartResponse = serde_json::from_str(CHART_FIXTURE).unwrap();
        let result = response.into_result("TCS.NS").unwrap();
        assert_eq!(result.current_price(), Some(3600.5));
        assert_eq!(result.meta.currency.as_deref(), Some("INR"));
    }

    #[test]
    fn test_chart_current_price_falls_back_to_last_close() {
        let json = r#"{"chart": {"result": [{
            "meta": {"symbol": "INFY.NS"},
            "timestamp": [1, 2],
            "indicators": {"quote": [{"close": [1500.0, null]}]}
        }], "error": null}}"#;
        let response: ChartResponse = serde_json::from_str(json).unwrap();
        let result = response.into_result("INFY.NS").unwrap();
        assert_eq!(result.current_price(), Some(1500.0));
    }

    #[test]
    fn test_chart_error_body() {
        let json = r#"{"chart": {"result": null, "error": {
            "code": "Not Found", "description": "No data found, symbol may be delisted"
        }}}"#;
        let response: ChartResponse = serde_json::from_str(json).unwrap();
        let err = response.into_result("NOPE.NS").unwrap_err();
        assert!(err.to_string().contains("Not Found"));
    }

    #[test]
    fn test_chart_empty_result_is_unavailable() {
        let json = r#"{"chart": {"result": [], "error": null}}"#;
        let response: ChartResponse = serde_json::from_str(json).unwrap();
        assert!(matches!(
            response.into_result("TCS.NS"),
            Err(MarketDataError::QuoteUnavailable(_))
        ));
    }

    #[test]
    fn test_quote_fundamentals() {
        let json = r#"{"quoteResponse": {"result": [{
            "symbol": "TCS.NS",
            "regularMarketPrice": 3600.0,
            "trailingPE": 29.4,
            "marketCap": 13000000000000,
            "longName": "Tata Consultancy Services Limited"
        }], "error": null}}"#;
        let response: QuoteResponse = serde_json::from_str(json).unwrap();
        let fundamentals = response.into_fundamentals("TCS.NS").unwrap();

        assert_eq!(fundamentals.trailing_pe, Some(29.4));
        assert_eq!(fundamentals.current_price, Some(3600.0));
        assert_eq!(
            fundamentals.long_name.as_deref(),
            Some("Tata Consultancy Services Limited")
        );
    }

    #[test]
    fn test_quote_missing_symbol() {
        let json = r#"{"quoteResponse": {"result": []}}"#;
        let response: QuoteResponse = serde_json::from_str(json).unwrap();
        assert!(response.into_fundamentals("TCS.NS").is_err());
    }
}
