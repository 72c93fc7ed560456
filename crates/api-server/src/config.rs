use anyhow::{Context, Result};
use market_core::Exchange;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Server settings read from the environment (after `.env` is loaded).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub watchlist_path: PathBuf,
    pub exchange: Exchange,
    pub news_api_key: Option<String>,
    pub cache_ttl_secs: i64,
    /// Yahoo requests per minute
    pub yahoo_rate_limit: usize,
    pub log_format: LogFormat,
    /// Empty means any origin
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            watchlist_path: PathBuf::from("portfolio_data.json"),
            exchange: Exchange::Nse,
            news_api_key: None,
            cache_ttl_secs: 3600,
            yahoo_rate_limit: 120,
            log_format: LogFormat::Pretty,
            cors_origins: Vec::new(),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let config = Self {
            host: lookup("API_HOST").unwrap_or(defaults.host),
            port: match lookup("API_PORT") {
                Some(v) => v.parse().context("API_PORT must be a port number")?,
                None => defaults.port,
            },
            watchlist_path: lookup("WATCHLIST_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.watchlist_path),
            exchange: match lookup("EXCHANGE") {
                Some(v) => v.parse().context("EXCHANGE must be NSE or BSE")?,
                None => defaults.exchange,
            },
            news_api_key: lookup("NEWS_API_KEY").filter(|k| !k.trim().is_empty()),
            cache_ttl_secs: match lookup("CACHE_TTL_SECS") {
                Some(v) => v.parse().context("CACHE_TTL_SECS must be a whole number")?,
                None => defaults.cache_ttl_secs,
            },
            yahoo_rate_limit: match lookup("YAHOO_RATE_LIMIT") {
                Some(v) => v.parse().context("YAHOO_RATE_LIMIT must be a whole number")?,
                None => defaults.yahoo_rate_limit,
            },
            log_format: match lookup("LOG_FORMAT").as_deref() {
                Some("json") => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
            cors_origins: lookup("CORS_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(|o| o.trim().to_string())
                        .filter(|o| !o.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
        };

        if config.cache_ttl_secs < 0 {
            anyhow::bail!("CACHE_TTL_SECS must not be negative");
        }
        if config.yahoo_rate_limit == 0 {
            anyhow::bail!("YAHOO_RATE_LIMIT must be at least 1");
        }

        Ok(config)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<ServerConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.bind_addr(), "0.0.0.0:3000");
        assert_eq!(config.watchlist_path, PathBuf::from("portfolio_data.json"));
        assert_eq!(config.exchange, Exchange::Nse);
        assert_eq!(config.cache_ttl_secs, 3600);
        assert_eq!(config.yahoo_rate_limit, 120);
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert!(config.news_api_key.is_none());
        assert!(config.cors_origins.is_empty());
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("API_PORT", "8080"),
            ("EXCHANGE", "BSE"),
            ("NEWS_API_KEY", "abc"),
            ("LOG_FORMAT", "json"),
            ("CORS_ORIGINS", "http://localhost:5173, https://dash.example.com"),
        ])
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.exchange, Exchange::Bse);
        assert_eq!(config.news_api_key.as_deref(), Some("abc"));
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.cors_origins.len(), 2);
    }

    #[test]
    fn test_blank_news_key_is_unset() {
        let config = config_from(&[("NEWS_API_KEY", "  ")]).unwrap();
        assert!(config.news_api_key.is_none());
    }

    #[test]
    fn test_invalid_values() {
        assert!(config_from(&[("API_PORT", "http")]).is_err());
        assert!(config_from(&[("EXCHANGE", "NYSE")]).is_err());
        assert!(config_from(&[("CACHE_TTL_SECS", "-1")]).is_err());
        assert!(config_from(&[("YAHOO_RATE_LIMIT", "0")]).is_err());
    }
}
