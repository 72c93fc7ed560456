//! Per-session dashboard UI state.
//!
//! Which detail panels are expanded for each symbol, plus the auto-refresh
//! settings. Kept in memory only and independent of the watchlist.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

pub const MIN_REFRESH_INTERVAL_SECS: u64 = 5;
pub const MAX_REFRESH_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 5;

pub const MAX_SESSIONS: usize = 10_000;
pub const SESSION_IDLE_SECS: i64 = 6 * 3600;
/// Distinct symbols one session may hold panel state for.
pub const MAX_PANEL_SYMBOLS: usize = 100;

const MAX_SESSION_ID_LEN: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Panel {
    IntradayChart,
    YearlyChart,
    MovingAverages,
    Analytics,
}

impl FromStr for Panel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "intraday-chart" => Ok(Panel::IntradayChart),
            "yearly-chart" => Ok(Panel::YearlyChart),
            "moving-averages" => Ok(Panel::MovingAverages),
            "analytics" => Ok(Panel::Analytics),
            other => Err(format!(
                "Unknown panel: {} (expected intraday-chart, yearly-chart, moving-averages or analytics)",
                other
            )),
        }
    }
}

/// Visibility of each detail panel for one symbol. All hidden by default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolPanels {
    pub intraday_chart: bool,
    pub yearly_chart: bool,
    pub moving_averages: bool,
    pub analytics: bool,
}

impl SymbolPanels {
    fn slot(&mut self, panel: Panel) -> &mut bool {
        match panel {
            Panel::IntradayChart => &mut self.intraday_chart,
            Panel::YearlyChart => &mut self.yearly_chart,
            Panel::MovingAverages => &mut self.moving_averages,
            Panel::Analytics => &mut self.analytics,
        }
    }

    /// Flip `panel` and return its new visibility.
    pub fn toggle(&mut self, panel: Panel) -> bool {
        let slot = self.slot(panel);
        *slot = !*slot;
        *slot
    }

    pub fn is_visible(&self, panel: Panel) -> bool {
        match panel {
            Panel::IntradayChart => self.intraday_chart,
            Panel::YearlyChart => self.yearly_chart,
            Panel::MovingAverages => self.moving_averages,
            Panel::Analytics => self.analytics,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplaySettings {
    pub auto_refresh: bool,
    pub refresh_interval_secs: u64,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            auto_refresh: true,
            refresh_interval_secs: DEFAULT_REFRESH_INTERVAL_SECS,
        }
    }
}

impl DisplaySettings {
    /// Interval is clamped into the 5..=60 second range.
    pub fn new(auto_refresh: bool, refresh_interval_secs: u64) -> Self {
        Self {
            auto_refresh,
            refresh_interval_secs: refresh_interval_secs
                .clamp(MIN_REFRESH_INTERVAL_SECS, MAX_REFRESH_INTERVAL_SECS),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub settings: DisplaySettings,
    /// Keyed by upper-cased symbol; symbols never toggled are absent.
    pub panels: BTreeMap<String, SymbolPanels>,
}

struct SessionEntry {
    state: SessionState,
    last_seen: DateTime<Utc>,
}

/// In-memory sessions, bounded in count and dropped after going idle.
pub struct SessionRegistry {
    sessions: DashMap<String, SessionEntry>,
    max_sessions: usize,
    idle_ttl: Duration,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::with_limits(MAX_SESSIONS, Duration::seconds(SESSION_IDLE_SECS))
    }
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(max_sessions: usize, idle_ttl: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            max_sessions: max_sessions.max(1),
            idle_ttl,
        }
    }

    /// State for `session_id`; unknown sessions read as defaults without
    /// being created.
    pub fn get(&self, session_id: &str) -> SessionState {
        match self.sessions.get_mut(session_id) {
            Some(mut entry) => {
                entry.last_seen = Utc::now();
                entry.state.clone()
            }
            None => SessionState::default(),
        }
    }

    /// Flip `panel` for `symbol`. Fails once the session tracks
    /// `MAX_PANEL_SYMBOLS` symbols and `symbol` is not one of them.
    pub fn toggle_panel(
        &self,
        session_id: &str,
        symbol: &str,
        panel: Panel,
    ) -> Result<SymbolPanels, String> {
        self.toggle_panel_at(session_id, symbol, panel, Utc::now())
    }

    fn toggle_panel_at(
        &self,
        session_id: &str,
        symbol: &str,
        panel: Panel,
        now: DateTime<Utc>,
    ) -> Result<SymbolPanels, String> {
        let symbol = symbol.trim().to_uppercase();
        let mut entry = self.touch(session_id, now);

        let panels = &mut entry.state.panels;
        if !panels.contains_key(&symbol) && panels.len() >= MAX_PANEL_SYMBOLS {
            return Err(format!(
                "Session already tracks panels for {} symbols",
                MAX_PANEL_SYMBOLS
            ));
        }
        let symbol_panels = panels.entry(symbol).or_default();
        symbol_panels.toggle(panel);
        Ok(*symbol_panels)
    }

    pub fn update_settings(&self, session_id: &str, settings: DisplaySettings) -> DisplaySettings {
        let settings = DisplaySettings::new(settings.auto_refresh, settings.refresh_interval_secs);
        self.touch(session_id, Utc::now()).state.settings = settings;
        settings
    }

    /// Drop sessions not seen within the idle TTL. Returns the number removed.
    pub fn evict_idle(&self) -> usize {
        self.evict_idle_at(Utc::now())
    }

    fn evict_idle_at(&self, now: DateTime<Utc>) -> usize {
        let before = self.sessions.len();
        self.sessions
            .retain(|_, entry| now - entry.last_seen < self.idle_ttl);
        before - self.sessions.len()
    }

    /// Fetch or create the entry for `session_id`, evicting the least
    /// recently seen session when a new one would exceed the limit.
    fn touch(
        &self,
        session_id: &str,
        now: DateTime<Utc>,
    ) -> dashmap::mapref::one::RefMut<'_, String, SessionEntry> {
        if !self.sessions.contains_key(session_id) && self.sessions.len() >= self.max_sessions {
            let oldest = self
                .sessions
                .iter()
                .min_by_key(|entry| entry.last_seen)
                .map(|entry| entry.key().clone());
            if let Some(oldest) = oldest {
                tracing::debug!("Session limit reached, evicting {}", oldest);
                self.sessions.remove(&oldest);
            }
        }

        let mut entry = self
            .sessions
            .entry(session_id.to_string())
            .or_insert_with(|| SessionEntry {
                state: SessionState::default(),
                last_seen: now,
            });
        entry.last_seen = now;
        entry
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// Session ids are client generated: 1 to 128 of `[A-Za-z0-9_-]`.
pub fn validate_session_id(session_id: &str) -> Result<(), String> {
    let valid = !session_id.is_empty()
        && session_id.len() <= MAX_SESSION_ID_LEN
        && session_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(format!("Invalid session id: {}", session_id))
    }
}
