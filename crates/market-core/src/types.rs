use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::MarketDataError;

/// OHLCV bar data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// A price that may not have been obtainable.
///
/// `Unavailable` is the explicit "no value" marker: it is never collapsed into
/// zero and never treated as an error by callers that hold a `PriceQuote`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceQuote {
    Available(f64),
    Unavailable,
}

impl PriceQuote {
    /// Wrap a raw provider price, rejecting non-finite and non-positive values.
    pub fn from_price(price: f64) -> Self {
        if price.is_finite() && price > 0.0 {
            PriceQuote::Available(price)
        } else {
            PriceQuote::Unavailable
        }
    }

    pub fn price(&self) -> Option<f64> {
        match self {
            PriceQuote::Available(p) => Some(*p),
            PriceQuote::Unavailable => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, PriceQuote::Available(_))
    }
}

impl From<Option<f64>> for PriceQuote {
    fn from(price: Option<f64>) -> Self {
        price.map_or(PriceQuote::Unavailable, PriceQuote::from_price)
    }
}

/// Exchange a bare symbol is listed on. Providers expect the suffixed form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Exchange {
    #[default]
    Nse,
    Bse,
}

impl Exchange {
    pub fn suffix(&self) -> &'static str {
        match self {
            Exchange::Nse => ".NS",
            Exchange::Bse => ".BO",
        }
    }

    /// `TCS` -> `TCS.NS`. Already-suffixed symbols are returned unchanged.
    pub fn qualify(&self, symbol: &str) -> String {
        if symbol.ends_with(self.suffix()) {
            symbol.to_string()
        } else {
            format!("{}{}", symbol, self.suffix())
        }
    }
}

impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Exchange::Nse => write!(f, "NSE"),
            Exchange::Bse => write!(f, "BSE"),
        }
    }
}

impl FromStr for Exchange {
    type Err = MarketDataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NSE" | "NS" => Ok(Exchange::Nse),
            "BSE" | "BO" => Ok(Exchange::Bse),
            other => Err(MarketDataError::InvalidData(format!(
                "Unknown exchange: {}",
                other
            ))),
        }
    }
}

/// Window of history requested from a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HistoryRange {
    /// One trading day at 5-minute resolution
    #[serde(rename = "1d")]
    Intraday,
    /// One year at daily resolution
    #[serde(rename = "1y")]
    Year,
}

impl HistoryRange {
    pub fn range_param(&self) -> &'static str {
        match self {
            HistoryRange::Intraday => "1d",
            HistoryRange::Year => "1y",
        }
    }

    pub fn interval_param(&self) -> &'static str {
        match self {
            HistoryRange::Intraday => "5m",
            HistoryRange::Year => "1d",
        }
    }
}

impl FromStr for HistoryRange {
    type Err = MarketDataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1d" => Ok(HistoryRange::Intraday),
            "1y" => Ok(HistoryRange::Year),
            other => Err(MarketDataError::InvalidData(format!(
                "Unsupported range: {} (expected 1d or 1y)",
                other
            ))),
        }
    }
}

/// Valuation fields a provider may or may not publish for a symbol.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fundamentals {
    pub symbol: String,
    pub current_price: Option<f64>,
    pub trailing_pe: Option<f64>,
    pub market_cap: Option<f64>,
    pub long_name: Option<String>,
}

/// News article
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsArticle {
    pub title: String,
    pub description: Option<String>,
    pub published_at: DateTime<Utc>,
    pub url: String,
    pub source: Option<String>,
    pub author: Option<String>,
}
