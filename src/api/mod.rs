pub mod health;
pub mod levels;
pub mod mtf;
pub mod patterns;

use axum::Router;
use serde::Serialize;

use crate::AppState;
use tradelens::error::{AppError, Result};
use tradelens::services::MarketDataSource;
use tradelens::types::{OhlcPoint, Timeframe};

/// API response wrapper.
#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub data: T,
    pub meta: ApiMeta,
}

#[derive(Serialize)]
pub struct ApiMeta {
    pub cached: bool,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self::with_cached(data, false)
    }

    pub fn with_cached(data: T, cached: bool) -> Self {
        Self {
            data,
            meta: ApiMeta { cached },
        }
    }
}

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .nest("/api/mtf", mtf::router())
        .nest("/api/patterns", patterns::router())
        .nest("/api/levels", levels::router())
}

/// Timeframe query parameter, daily when absent.
pub fn parse_timeframe(raw: Option<&str>) -> Result<Timeframe> {
    match raw {
        None => Ok(Timeframe::Day1),
        Some(s) => Timeframe::from_str(s)
            .ok_or_else(|| AppError::BadRequest(format!("Unknown timeframe: {}", s))),
    }
}

/// Bars for one ticker and timeframe, plus whether they came from the cache.
pub async fn load_series(
    state: &AppState,
    ticker: &str,
    timeframe: Timeframe,
) -> Result<(Vec<OhlcPoint>, bool)> {
    let market_data = state.mtf.market_data();
    let cached = market_data.is_cached(ticker, timeframe);
    let bars = market_data.fetch_ohlcv(ticker, timeframe).await?;
    if bars.is_empty() {
        return Err(AppError::NotFound(format!(
            "No {} data for {}",
            timeframe.label(),
            ticker
        )));
    }
    Ok((bars, cached))
}
