use crate::AppState;
use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use tradelens::services::MarketDataSource;

/// Liveness plus the settings the analysis endpoints run with.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    data_source: String,
    cache_ttl_secs: u64,
    default_lookback: usize,
    min_pattern_confidence: f64,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        data_source: state.mtf.market_data().name().to_string(),
        cache_ttl_secs: state.config.market_data_cache_ttl_secs,
        default_lookback: state.mtf.lookback(),
        min_pattern_confidence: state.config.patterns.min_confidence,
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/api/health", get(health))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_health_handler() {
        let Json(response) = health(State(test_support::state())).await;
        assert_eq!(response.status, "ok");
        assert_eq!(response.version, env!("CARGO_PKG_VERSION"));
        assert_eq!(response.data_source, "fixture");
        assert_eq!(response.min_pattern_confidence, 60.0);
    }

    #[tokio::test]
    async fn test_health_route() {
        let (status, body) = test_support::get("/api/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert!(body["default_lookback"].as_u64().unwrap() > 0);
    }
}
