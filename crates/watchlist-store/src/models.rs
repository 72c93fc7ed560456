use chrono::NaiveDate;
use market_core::PriceQuote;
use serde::{Deserialize, Serialize};

use crate::error::{Result, WatchlistError};

/// One tracked holding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchlistEntry {
    pub symbol: String,
    pub purchase_price: f64,
    pub purchase_date: NaiveDate,
    /// Quote captured when the entry was added; not refreshed at rest.
    pub last_known_price: PriceQuote,
}

/// On-disk shape of an entry. The symbol is the map key, not a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct StoredEntry {
    pub purchase_price: f64,
    pub purchase_date: NaiveDate,
    pub current_price: Option<f64>,
}

impl From<&WatchlistEntry> for StoredEntry {
    fn from(entry: &WatchlistEntry) -> Self {
        Self {
            purchase_price: entry.purchase_price,
            purchase_date: entry.purchase_date,
            current_price: entry.last_known_price.price(),
        }
    }
}

impl StoredEntry {
    pub(crate) fn into_entry(self, symbol: String) -> WatchlistEntry {
        WatchlistEntry {
            symbol,
            purchase_price: self.purchase_price,
            purchase_date: self.purchase_date,
            last_known_price: PriceQuote::from(self.current_price),
        }
    }
}

/// Purchase price compared against a freshly fetched quote. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationRecord {
    pub symbol: String,
    pub purchase_price: f64,
    pub purchase_date: NaiveDate,
    pub current_price: PriceQuote,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub absolute_delta: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percent_delta: Option<f64>,
}

impl ValuationRecord {
    pub fn new(entry: &WatchlistEntry, current_price: PriceQuote) -> Self {
        let absolute_delta = current_price
            .price()
            .map(|p| p - entry.purchase_price)
            .filter(|d| d.is_finite());
        let percent_delta = absolute_delta
            .map(|d| d / entry.purchase_price * 100.0)
            .filter(|pct| pct.is_finite());

        Self {
            symbol: entry.symbol.clone(),
            purchase_price: entry.purchase_price,
            purchase_date: entry.purchase_date,
            current_price,
            absolute_delta,
            percent_delta,
        }
    }
}

/// Trim and upper-case a user supplied symbol; empty symbols are rejected.
pub fn normalize_symbol(symbol: &str) -> Result<String> {
    let symbol = symbol.trim().to_uppercase();
    if symbol.is_empty() {
        return Err(WatchlistError::InvalidInput(
            "Symbol must not be empty".to_string(),
        ));
    }
    Ok(symbol)
}

pub(crate) fn validate_purchase_price(purchase_price: f64) -> Result<f64> {
    if !purchase_price.is_finite() || purchase_price <= 0.0 {
        return Err(WatchlistError::InvalidInput(format!(
            "Purchase price must be greater than 0, got {}",
            purchase_price
        )));
    }
    Ok(purchase_price)
}
