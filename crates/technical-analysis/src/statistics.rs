use chrono::{DateTime, Utc};
use market_core::{Bar, MarketDataError};
use serde::{Deserialize, Serialize};

use crate::indicators::*;

/// Window used for the support/resistance levels.
pub const SUPPORT_WINDOW: usize = 20;
/// Window for the SMA/EMA overlay.
pub const MOVING_AVERAGE_WINDOW: usize = 20;

pub const MIN_ALERT_THRESHOLD_PCT: f64 = 1.0;
pub const MAX_ALERT_THRESHOLD_PCT: f64 = 50.0;

/// Summary statistics derived from one year of daily bars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockStatistics {
    pub current_price: f64,
    pub high_52_week: f64,
    pub low_52_week: f64,
    /// 20-day low
    pub support: Option<f64>,
    /// 20-day high
    pub resistance: Option<f64>,
    pub gain_from_low_pct: Option<f64>,
    pub drop_from_high_pct: Option<f64>,
    pub rsi: Option<f64>,
    pub macd_signal: Option<f64>,
    pub bollinger_upper: Option<f64>,
    pub bollinger_lower: Option<f64>,
}

impl StockStatistics {
    /// Compute statistics from yearly bars. When `current_price` is `None`
    /// the last close stands in for it.
    pub fn from_bars(bars: &[Bar], current_price: Option<f64>) -> Result<Self, MarketDataError> {
        let last = bars.last().ok_or_else(|| {
            MarketDataError::InsufficientData("No bars to compute statistics from".to_string())
        })?;
        let current_price = current_price
            .filter(|p| p.is_finite() && *p > 0.0)
            .unwrap_or(last.close);

        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();
        let lows: Vec<f64> = bars.iter().map(|b| b.low).collect();

        let high_52_week = highs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let low_52_week = lows.iter().copied().fold(f64::INFINITY, f64::min);

        let gain_from_low_pct = if low_52_week != 0.0 {
            Some((current_price - low_52_week) / low_52_week * 100.0)
        } else {
            None
        };
        let drop_from_high_pct = if high_52_week != 0.0 {
            Some((high_52_week - current_price) / high_52_week * 100.0)
        } else {
            None
        };

        let macd_result = macd(&closes, MACD_FAST, MACD_SLOW, MACD_SIGNAL);
        let bands = bollinger_bands(&closes, BOLLINGER_PERIOD, BOLLINGER_STD_DEV);

        Ok(Self {
            current_price,
            high_52_week,
            low_52_week,
            support: latest(&rolling_min(&lows, SUPPORT_WINDOW)),
            resistance: latest(&rolling_max(&highs, SUPPORT_WINDOW)),
            gain_from_low_pct,
            drop_from_high_pct,
            rsi: latest(&rsi(&closes, RSI_PERIOD)),
            macd_signal: latest(&macd_result.signal_line),
            bollinger_upper: latest(&bands.upper),
            bollinger_lower: latest(&bands.lower),
        })
    }

    /// Whether the move from the 52-week range exceeds `threshold_pct`.
    pub fn has_significant_movement(&self, threshold_pct: f64) -> bool {
        let gain = self.gain_from_low_pct.is_some_and(|g| g > threshold_pct);
        let drop = self.drop_from_high_pct.is_some_and(|d| d.abs() > threshold_pct);
        gain || drop
    }
}

/// Validate a user supplied alert threshold (whole percent, 1 to 50).
pub fn validate_alert_threshold(threshold_pct: f64) -> Result<f64, MarketDataError> {
    if !(MIN_ALERT_THRESHOLD_PCT..=MAX_ALERT_THRESHOLD_PCT).contains(&threshold_pct) {
        return Err(MarketDataError::InvalidData(format!(
            "Alert threshold must be between {} and {} percent, got {}",
            MIN_ALERT_THRESHOLD_PCT, MAX_ALERT_THRESHOLD_PCT, threshold_pct
        )));
    }
    Ok(threshold_pct)
}

/// Close price with SMA and EMA overlays, aligned by timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovingAverageOverlay {
    pub window: usize,
    pub points: Vec<OverlayPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayPoint {
    pub timestamp: DateTime<Utc>,
    pub close: f64,
    pub sma: Option<f64>,
    pub ema: Option<f64>,
}

impl MovingAverageOverlay {
    pub fn from_bars(bars: &[Bar], window: usize) -> Self {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let sma_values = sma(&closes, window);
        let ema_values = ema(&closes, window);

        let points = bars
            .iter()
            .zip(sma_values)
            .zip(ema_values)
            .map(|((bar, sma), ema)| OverlayPoint {
                timestamp: bar.timestamp,
                close: bar.close,
                sma,
                ema,
            })
            .collect();

        Self { window, points }
    }
}
