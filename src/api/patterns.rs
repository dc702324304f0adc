//! Chart pattern endpoint.

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use super::{load_series, parse_timeframe, ApiResponse};
use crate::AppState;
use tradelens::config::PatternConfig;
use tradelens::error::{AppError, Result};
use tradelens::services::AdvancedPatternDetector;
use tradelens::types::Pattern;

#[derive(Debug, Deserialize)]
pub struct PatternsQuery {
    pub timeframe: Option<String>,
    /// Overrides the configured minimum confidence (0-100).
    pub min_confidence: Option<f64>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/:ticker", get(get_patterns))
}

async fn get_patterns(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
    Query(query): Query<PatternsQuery>,
) -> Result<Json<ApiResponse<Vec<Pattern>>>> {
    let timeframe = parse_timeframe(query.timeframe.as_deref())?;
    let (bars, cached) = load_series(&state, &ticker, timeframe).await?;

    let patterns = match query.min_confidence {
        Some(min) if !(0.0..=100.0).contains(&min) => {
            return Err(AppError::BadRequest(format!(
                "min_confidence must be within 0-100, got {}",
                min
            )));
        }
        Some(min_confidence) => {
            let detector = AdvancedPatternDetector::new(PatternConfig {
                min_confidence,
                ..state.mtf.patterns().config().clone()
            });
            detector.detect_all_patterns(&bars, timeframe)
        }
        None => state.mtf.patterns().detect_all_patterns(&bars, timeframe),
    };

    Ok(Json(ApiResponse::with_cached(patterns, cached)))
}
