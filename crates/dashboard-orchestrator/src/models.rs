use chrono::{DateTime, Utc};
use market_core::{Bar, HistoryRange, PriceQuote};
use serde::{Deserialize, Serialize};
use technical_analysis::StockStatistics;

/// Everything the dashboard shows for one symbol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockOverview {
    pub symbol: String,
    /// Exchange-qualified symbol sent to providers (`TCS.NS`)
    pub listing: String,
    pub long_name: Option<String>,
    pub pe_ratio: Option<f64>,
    pub market_cap: Option<f64>,
    pub statistics: StockStatistics,
    #[serde(skip)]
    pub yearly: Vec<Bar>,
    #[serde(skip)]
    pub intraday: Vec<Bar>,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub timestamp: DateTime<Utc>,
    pub close: f64,
    pub volume: f64,
}

/// Close and volume series for one history range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceVolumeChart {
    pub symbol: String,
    pub range: HistoryRange,
    pub points: Vec<ChartPoint>,
}

impl PriceVolumeChart {
    pub fn from_bars(symbol: &str, range: HistoryRange, bars: &[Bar]) -> Self {
        Self {
            symbol: symbol.to_string(),
            range,
            points: bars
                .iter()
                .map(|b| ChartPoint {
                    timestamp: b.timestamp,
                    close: b.close,
                    volume: b.volume,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceComparison {
    pub symbol: String,
    pub current_price: PriceQuote,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovementAlert {
    pub symbol: String,
    pub current_price: f64,
    pub gain_from_low_pct: Option<f64>,
    pub drop_from_high_pct: Option<f64>,
    pub significant: bool,
}

/// Result of checking a set of symbols against a movement threshold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertReport {
    pub threshold_pct: f64,
    pub alerts: Vec<MovementAlert>,
    /// Symbols whose history could not be fetched
    pub unavailable: Vec<String>,
}

impl AlertReport {
    pub fn significant(&self) -> impl Iterator<Item = &MovementAlert> {
        self.alerts.iter().filter(|a| a.significant)
    }
}
