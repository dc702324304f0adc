//! Trendline, channel and Fibonacci endpoints.

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use super::{load_series, parse_timeframe, ApiResponse};
use crate::AppState;
use tradelens::error::{AppError, Result};
use tradelens::types::{Channel, FibonacciLevels, SwingDirection, TrendlineSet};

#[derive(Debug, Deserialize)]
pub struct LevelsQuery {
    pub timeframe: Option<String>,
    pub lookback: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct ManualFibonacciRequest {
    pub high: f64,
    pub low: f64,
    pub direction: SwingDirection,
    pub current_price: f64,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/fibonacci", post(manual_fibonacci))
        .route("/:ticker/trendlines", get(get_trendlines))
        .route("/:ticker/channels", get(get_channels))
        .route("/:ticker/fibonacci", get(get_fibonacci))
}

fn lookback(state: &AppState, query: &LevelsQuery) -> Result<usize> {
    match query.lookback {
        Some(0) => Err(AppError::BadRequest("lookback must be positive".to_string())),
        Some(n) => Ok(n),
        None => Ok(state.mtf.lookback()),
    }
}

async fn get_trendlines(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
    Query(query): Query<LevelsQuery>,
) -> Result<Json<ApiResponse<TrendlineSet>>> {
    let timeframe = parse_timeframe(query.timeframe.as_deref())?;
    let lookback = lookback(&state, &query)?;
    let (bars, cached) = load_series(&state, &ticker, timeframe).await?;
    let set = state.mtf.trendlines().detect_all_trendlines(&bars, lookback);
    Ok(Json(ApiResponse::with_cached(set, cached)))
}

async fn get_channels(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
    Query(query): Query<LevelsQuery>,
) -> Result<Json<ApiResponse<Vec<Channel>>>> {
    let timeframe = parse_timeframe(query.timeframe.as_deref())?;
    let lookback = lookback(&state, &query)?;
    let (bars, cached) = load_series(&state, &ticker, timeframe).await?;
    let channels = state.mtf.trendlines().detect_channels(&bars, lookback);
    Ok(Json(ApiResponse::with_cached(channels, cached)))
}

async fn get_fibonacci(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
    Query(query): Query<LevelsQuery>,
) -> Result<Json<ApiResponse<Vec<FibonacciLevels>>>> {
    let timeframe = parse_timeframe(query.timeframe.as_deref())?;
    let lookback = lookback(&state, &query)?;
    let (bars, cached) = load_series(&state, &ticker, timeframe).await?;
    let levels = state.mtf.fibonacci().calculate_auto_fibonacci(&bars, lookback);
    Ok(Json(ApiResponse::with_cached(levels, cached)))
}

async fn manual_fibonacci(
    State(state): State<AppState>,
    Json(request): Json<ManualFibonacciRequest>,
) -> Result<Json<ApiResponse<FibonacciLevels>>> {
    let values = [request.high, request.low, request.current_price];
    if values.iter().any(|v| !v.is_finite() || *v <= 0.0) {
        return Err(AppError::BadRequest(
            "high, low and current_price must be positive".to_string(),
        ));
    }
    if request.high == request.low {
        return Err(AppError::BadRequest("high and low must differ".to_string()));
    }

    let levels = state.mtf.fibonacci().calculate_manual_fibonacci(
        request.high,
        request.low,
        request.direction,
        request.current_price,
    );
    Ok(Json(ApiResponse::new(levels)))
}
