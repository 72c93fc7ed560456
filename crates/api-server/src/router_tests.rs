use super::*;
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request};
use chrono::{TimeZone, Utc};
use market_core::{Bar, Fundamentals, HistoryRange, NewsArticle};
use serde_json::{json, Value};
use std::path::PathBuf;
use tempfile::TempDir;
use tower::ServiceExt;

struct FakeMarket {
    news_configured: bool,
}

fn bars() -> Vec<Bar> {
    let start = Utc.with_ymd_and_hms(2025, 10, 16, 0, 0, 0).unwrap();
    (0..30)
        .map(|i| {
            let close = 100.0 + i as f64;
            Bar {
                timestamp: start + Duration::days(i),
                open: close,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 500.0,
            }
        })
        .collect()
}

#[async_trait]
impl QuoteSource for FakeMarket {
    async fn quote(&self, symbol: &str) -> Result<f64, MarketDataError> {
        match symbol {
            "TCS.NS" => Ok(3600.0),
            "INFY.NS" => Ok(1500.0),
            _ => Err(MarketDataError::QuoteUnavailable(symbol.to_string())),
        }
    }
}

#[async_trait]
impl HistorySource for FakeMarket {
    async fn history(&self, symbol: &str, range: HistoryRange) -> Result<Vec<Bar>, MarketDataError> {
        if symbol != "TCS.NS" {
            return Err(MarketDataError::QuoteUnavailable(symbol.to_string()));
        }
        match range {
            HistoryRange::Year => Ok(bars()),
            HistoryRange::Intraday => Ok(bars().split_off(27)),
        }
    }

    async fn fundamentals(&self, symbol: &str) -> Result<Fundamentals, MarketDataError> {
        Ok(Fundamentals {
            symbol: symbol.to_string(),
            trailing_pe: Some(30.1),
            ..Default::default()
        })
    }
}

#[async_trait]
impl NewsSource for FakeMarket {
    async fn latest(&self, symbol: &str) -> Result<Vec<NewsArticle>, MarketDataError> {
        if !self.news_configured {
            return Err(MarketDataError::NotConfigured("NEWS_API_KEY".to_string()));
        }
        Ok(vec![NewsArticle {
            title: format!("{} beats estimates", symbol),
            description: Some("Quarterly results".to_string()),
            published_at: Utc::now(),
            url: "https://example.com/tcs".to_string(),
            source: Some("Wire".to_string()),
            author: None,
        }])
    }
}

struct TestApp {
    router: Router,
    watchlist_path: PathBuf,
    _dir: TempDir,
}

fn test_app_with(news_configured: bool, seed_file: Option<&str>) -> TestApp {
    let dir = TempDir::new().unwrap();
    let watchlist_path = dir.path().join("portfolio_data.json");
    if let Some(contents) = seed_file {
        std::fs::write(&watchlist_path, contents).unwrap();
    }

    let config = ServerConfig {
        watchlist_path: watchlist_path.clone(),
        ..Default::default()
    };
    let market = Arc::new(FakeMarket { news_configured });
    let state = AppState::new(config, market.clone(), market.clone(), market);

    TestApp {
        router: build_router(state),
        watchlist_path,
        _dir: dir,
    }
}

fn test_app() -> TestApp {
    test_app_with(true, None)
}

impl TestApp {
    async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, None).await
    }

    fn file_json(&self) -> Value {
        serde_json::from_str(&std::fs::read_to_string(&self.watchlist_path).unwrap()).unwrap()
    }
}

#[tokio::test]
async fn test_health() {
    let app = test_app();
    let (status, body) = app.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["exchange"], "NSE");
    assert_eq!(body["data"]["watchlist_entries"], 0);
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let app = test_app();
    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "abc-123")
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.headers()["x-request-id"], "abc-123");

    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_list_indices() {
    let app = test_app();
    let (status, body) = app.get("/api/indices").await;
    assert_eq!(status, StatusCode::OK);

    let indices = body["data"].as_array().unwrap();
    assert_eq!(indices.len(), 5);
    assert_eq!(indices[0]["slug"], "nifty-50");
    assert_eq!(indices[0]["constituents"], 50);
}

#[tokio::test]
async fn test_index_stocks() {
    let app = test_app();
    let (status, body) = app.get("/api/indices/bank-nifty/stocks").await;
    assert_eq!(status, StatusCode::OK);

    let symbols: Vec<&str> = body["data"]["symbols"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|s| s.as_str())
        .collect();
    assert_eq!(symbols.len(), 12);
    let mut sorted = symbols.clone();
    sorted.sort();
    assert_eq!(symbols, sorted);
    assert!(body["data"]["default_symbol"].is_string());

    let (status, body) = app.get("/api/indices/dow-jones/stocks").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_watchlist_add_valuate_remove() {
    let app = test_app();

    let (status, body) = app
        .send(
            Method::POST,
            "/api/watchlist",
            Some(json!({ "symbol": "tcs", "purchase_price": 3500.0 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["symbol"], "TCS");
    assert_eq!(app.file_json()["TCS"]["purchase_price"], 3500.0);
    assert_eq!(app.file_json()["TCS"]["current_price"], 3600.0);

    let (status, body) = app.get("/api/watchlist").await;
    assert_eq!(status, StatusCode::OK);
    let record = &body["data"]["entries"][0];
    assert_eq!(record["symbol"], "TCS");
    assert_eq!(record["absolute_delta"], 100.0);
    let pct = record["percent_delta"].as_f64().unwrap();
    assert!((pct - 2.857142857).abs() < 1e-6);
    assert!(body["data"].get("warning").is_none());

    let (status, _) = app.send(Method::DELETE, "/api/watchlist/TCS", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.file_json(), json!({}));

    let (status, body) = app.send(Method::DELETE, "/api/watchlist/TCS", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_watchlist_rejects_invalid_price() {
    let app = test_app();
    let before = std::fs::read_to_string(&app.watchlist_path).unwrap();

    let (status, body) = app
        .send(
            Method::POST,
            "/api/watchlist",
            Some(json!({ "symbol": "TCS", "purchase_price": 0.0 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("greater than 0"));
    assert_eq!(std::fs::read_to_string(&app.watchlist_path).unwrap(), before);
}

#[tokio::test]
async fn test_watchlist_unavailable_quote_is_reported() {
    let app = test_app();
    let (status, _) = app
        .send(
            Method::POST,
            "/api/watchlist",
            Some(json!({ "symbol": "ZZZ", "purchase_price": 10.0 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.file_json()["ZZZ"]["current_price"], Value::Null);

    let (_, body) = app.get("/api/watchlist").await;
    let record = &body["data"]["entries"][0];
    assert_eq!(record["current_price"], "unavailable");
    assert!(record.get("absolute_delta").is_none());
}

#[tokio::test]
async fn test_watchlist_clear() {
    let app = test_app_with(
        true,
        Some(r#"{"TCS":{"purchase_price":3500.0,"purchase_date":"2026-10-16","current_price":3600.0}}"#),
    );

    let (status, _) = app.send(Method::DELETE, "/api/watchlist", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.file_json(), json!({}));

    let (_, body) = app.get("/api/watchlist").await;
    assert!(body["data"]["entries"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_damaged_watchlist_degrades_with_warning() {
    let app = test_app_with(true, Some("not json"));

    let (status, body) = app.get("/api/watchlist").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["entries"].as_array().unwrap().is_empty());
    assert!(body["data"]["warning"].is_string());

    app.send(
        Method::POST,
        "/api/watchlist",
        Some(json!({ "symbol": "INFY", "purchase_price": 1400.0 })),
    )
    .await;
    let (_, body) = app.get("/api/watchlist").await;
    assert!(body["data"].get("warning").is_none());
    assert_eq!(app.file_json()["INFY"]["purchase_price"], 1400.0);
}

#[tokio::test]
async fn test_stock_overview() {
    let app = test_app();
    let (status, body) = app.get("/api/stocks/tcs").await;
    assert_eq!(status, StatusCode::OK);

    let data = &body["data"];
    assert_eq!(data["symbol"], "TCS");
    assert_eq!(data["listing"], "TCS.NS");
    assert_eq!(data["pe_ratio"], 30.1);
    assert_eq!(data["statistics"]["high_52_week"], 130.0);
    assert_eq!(data["statistics"]["low_52_week"], 99.0);
    assert!(data.get("yearly").is_none());
}

#[tokio::test]
async fn test_stock_overview_unavailable() {
    let app = test_app();
    let (status, body) = app.get("/api/stocks/NOPE").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_stock_chart_ranges() {
    let app = test_app();

    let (status, body) = app.get("/api/stocks/TCS/chart?range=1d").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["range"], "1d");
    assert_eq!(body["data"]["points"].as_array().unwrap().len(), 3);

    let (_, body) = app.get("/api/stocks/TCS/chart").await;
    assert_eq!(body["data"]["range"], "1y");
    assert_eq!(body["data"]["points"].as_array().unwrap().len(), 30);

    let (status, _) = app.get("/api/stocks/TCS/chart?range=5y").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_moving_averages() {
    let app = test_app();
    let (status, body) = app.get("/api/stocks/TCS/moving-averages").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["window"], 20);
    assert_eq!(body["data"]["points"].as_array().unwrap().len(), 30);
    assert_eq!(body["data"]["points"][0]["sma"], Value::Null);
}

#[tokio::test]
async fn test_compare_prices() {
    let app = test_app();
    let (status, body) = app.get("/api/stocks/compare?symbols=TCS,ZZZ").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["current_price"]["available"], 3600.0);
    assert_eq!(body["data"][1]["current_price"], "unavailable");

    let (status, _) = app.get("/api/stocks/compare?symbols=,").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_movement_alerts() {
    let app = test_app();
    let (status, body) = app
        .send(
            Method::POST,
            "/api/stocks/alerts",
            Some(json!({ "symbols": ["TCS", "NOPE"], "threshold_pct": 10.0 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["alerts"][0]["significant"], true);
    assert_eq!(body["data"]["unavailable"][0], "NOPE");

    let (status, _) = app
        .send(
            Method::POST,
            "/api/stocks/alerts",
            Some(json!({ "symbols": ["TCS"], "threshold_pct": 75.0 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_news() {
    let app = test_app();
    let (status, body) = app.get("/api/news/tcs").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["title"], "TCS beats estimates");
}

#[tokio::test]
async fn test_news_not_configured() {
    let app = test_app_with(false, None);
    let (status, body) = app.get("/api/news/TCS").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_cache_invalidation() {
    let app = test_app();
    app.get("/api/stocks/TCS").await;

    let (status, body) = app.send(Method::DELETE, "/api/cache/tcs", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["removed"], 1);

    app.get("/api/stocks/TCS/moving-averages").await;
    let (_, body) = app.send(Method::DELETE, "/api/cache", None).await;
    assert_eq!(body["data"]["removed"], 2);
}

#[tokio::test]
async fn test_session_defaults() {
    let app = test_app();
    let (status, body) = app.get("/api/sessions/tab-1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["settings"]["auto_refresh"], true);
    assert_eq!(body["data"]["settings"]["refresh_interval_secs"], 5);
    assert_eq!(body["data"]["panels"], json!({}));
}

#[tokio::test]
async fn test_session_panel_toggle() {
    let app = test_app();
    let uri = "/api/sessions/tab-1/panels/tcs/yearly-chart/toggle";

    let (status, body) = app.send(Method::POST, uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["visible"], true);
    assert_eq!(body["data"]["panels"]["intraday_chart"], false);

    let (_, body) = app.send(Method::POST, uri, None).await;
    assert_eq!(body["data"]["visible"], false);

    let (_, body) = app.get("/api/sessions/tab-2").await;
    assert_eq!(body["data"]["panels"], json!({}));

    let (status, _) = app
        .send(Method::POST, "/api/sessions/tab-1/panels/TCS/volume/toggle", None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_session_settings_clamped() {
    let app = test_app();
    let (status, body) = app
        .send(
            Method::PUT,
            "/api/sessions/tab-1/settings",
            Some(json!({ "auto_refresh": false, "refresh_interval_secs": 120 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["refresh_interval_secs"], 60);

    let (_, body) = app.get("/api/sessions/tab-1").await;
    assert_eq!(body["data"]["settings"]["auto_refresh"], false);
}
