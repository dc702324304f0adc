//! Multi-timeframe analysis endpoints.

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;

use super::ApiResponse;
use crate::AppState;
use tradelens::error::Result;
use tradelens::types::{EntryTiming, MtfAnalysis, MtfScore, TradeRecommendation};

#[derive(Serialize)]
pub struct ScoreResponse {
    pub ticker: String,
    pub score: MtfScore,
    pub recommendation: TradeRecommendation,
    pub recommendation_label: &'static str,
}

#[derive(Serialize)]
pub struct EntryResponse {
    pub ticker: String,
    pub entry_timing: EntryTiming,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/:ticker", get(get_analysis))
        .route("/:ticker/score", get(get_score))
        .route("/:ticker/entry", get(get_entry))
}

async fn get_analysis(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
) -> Result<Json<ApiResponse<MtfAnalysis>>> {
    let analysis = state.mtf.analyze(&ticker).await?;
    Ok(Json(ApiResponse::new(analysis)))
}

async fn get_score(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
) -> Result<Json<ApiResponse<ScoreResponse>>> {
    let analysis = state.mtf.analyze(&ticker).await?;
    Ok(Json(ApiResponse::new(ScoreResponse {
        ticker: analysis.ticker,
        recommendation_label: analysis.recommendation.label(),
        recommendation: analysis.recommendation,
        score: analysis.score,
    })))
}

async fn get_entry(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
) -> Result<Json<ApiResponse<EntryResponse>>> {
    let analysis = state.mtf.analyze(&ticker).await?;
    Ok(Json(ApiResponse::new(EntryResponse {
        ticker: analysis.ticker,
        entry_timing: analysis.entry_timing,
    })))
}
