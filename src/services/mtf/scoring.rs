//! Composite 0-10 score from alignment, momentum, volume, patterns and divergence.

use std::collections::BTreeMap;

use super::analyzer::weighted_average;
use crate::types::{
    AlignmentType, DivergenceSeverity, DivergenceType, MtfAlignment, MtfDivergence, MtfScore,
    ScoreCategory, Timeframe, TimeframeData, TradeRecommendation, TrendDirection, VolumeTrend,
};

const TREND_WEIGHT: f64 = 0.40;
const MOMENTUM_WEIGHT: f64 = 0.25;
const VOLUME_WEIGHT: f64 = 0.20;
const PATTERN_WEIGHT: f64 = 0.15;
const MAX_DIVERGENCE_ADJUSTMENT: f64 = 3.0;

#[derive(Debug, Clone, Copy, Default)]
pub struct MtfScoringEngine;

impl MtfScoringEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn calculate_mtf_score(
        &self,
        data: &BTreeMap<Timeframe, TimeframeData>,
        alignment: &MtfAlignment,
        divergences: &[MtfDivergence],
    ) -> MtfScore {
        let trend = trend_score(alignment);
        let momentum = weighted_average(data, momentum_component).clamp(0.0, 10.0);
        let volume = weighted_average(data, volume_component).clamp(0.0, 10.0);
        let pattern = weighted_average(data, pattern_component).clamp(0.0, 10.0);
        let adjustment = divergence_adjustment(divergences);

        let overall_score = (trend * TREND_WEIGHT
            + momentum * MOMENTUM_WEIGHT
            + volume * VOLUME_WEIGHT
            + pattern * PATTERN_WEIGHT
            + adjustment)
            .clamp(0.0, 10.0);

        let mut score_breakdown = BTreeMap::new();
        score_breakdown.insert("trend".to_string(), trend * TREND_WEIGHT);
        score_breakdown.insert("momentum".to_string(), momentum * MOMENTUM_WEIGHT);
        score_breakdown.insert("volume".to_string(), volume * VOLUME_WEIGHT);
        score_breakdown.insert("pattern".to_string(), pattern * PATTERN_WEIGHT);
        score_breakdown.insert("divergence".to_string(), adjustment);

        MtfScore {
            overall_score,
            category: ScoreCategory::from_score(overall_score),
            trend_alignment_score: trend,
            momentum_score: momentum,
            volume_score: volume,
            pattern_score: pattern,
            divergence_adjustment: adjustment,
            score_breakdown,
            scoring_notes: notes(data, alignment, divergences, trend, momentum, volume),
        }
    }

    pub fn get_trade_recommendation(&self, score: f64) -> TradeRecommendation {
        match score {
            s if s >= 8.5 => TradeRecommendation::StrongBuy,
            s if s >= 7.0 => TradeRecommendation::Buy,
            s if s >= 4.5 => TradeRecommendation::Hold,
            s if s >= 3.0 => TradeRecommendation::Sell,
            _ => TradeRecommendation::StrongSell,
        }
    }
}

fn trend_score(alignment: &MtfAlignment) -> f64 {
    let mut score = alignment.alignment_score;
    if alignment.alignment_type == AlignmentType::AllBullish {
        score += 1.0;
    }
    score -= 0.5 * alignment.conflicts.len() as f64;
    if alignment.trend_agreement {
        score += 0.5;
    }
    score.clamp(0.0, 10.0)
}

fn momentum_component(d: &TimeframeData) -> f64 {
    let mut score = 5.0;
    match d.rsi {
        Some(rsi) if (50.0..=70.0).contains(&rsi) => score += 2.5,
        Some(rsi) if rsi > 70.0 => score += 1.0,
        Some(rsi) if rsi < 30.0 => score -= 1.0,
        _ => {}
    }
    match d.macd_histogram {
        Some(h) if h > 0.0 => score += 1.5,
        Some(h) if h < 0.0 => score -= 1.5,
        _ => {}
    }
    score
}

fn volume_component(d: &TimeframeData) -> f64 {
    match (d.volume_trend, d.trend_direction) {
        (VolumeTrend::Increasing, TrendDirection::Up) => 5.0 + 5.0 * d.volume_strength,
        (VolumeTrend::Increasing, TrendDirection::Down) => 5.0 - 5.0 * d.volume_strength,
        (VolumeTrend::Decreasing, TrendDirection::Up) => 5.0 - 2.5 * d.volume_strength,
        _ => 5.0,
    }
}

fn pattern_component(d: &TimeframeData) -> f64 {
    let mut score = 5.0;
    if d.pattern_detected {
        score += d.pattern_confidence * 5.0;
    }
    if let (Some(sma_50), Some(sma_200)) = (d.sma_50, d.sma_200) {
        if d.current_price > sma_50 && d.current_price > sma_200 {
            score += 1.0;
        } else if d.current_price < sma_50 && d.current_price < sma_200 {
            score -= 1.0;
        }
    }
    score
}

fn divergence_adjustment(divergences: &[MtfDivergence]) -> f64 {
    divergences
        .iter()
        .map(|d| {
            let magnitude = match d.severity {
                DivergenceSeverity::Strong => 1.5,
                DivergenceSeverity::Moderate => 1.0,
                DivergenceSeverity::Weak => 0.5,
            };
            match d.divergence_type {
                DivergenceType::Bullish => magnitude,
                DivergenceType::Bearish => -magnitude,
            }
        })
        .sum::<f64>()
        .clamp(-MAX_DIVERGENCE_ADJUSTMENT, MAX_DIVERGENCE_ADJUSTMENT)
}

fn notes(
    data: &BTreeMap<Timeframe, TimeframeData>,
    alignment: &MtfAlignment,
    divergences: &[MtfDivergence],
    trend: f64,
    momentum: f64,
    volume: f64,
) -> Vec<String> {
    let mut notes = vec![format!(
        "Scored over {} of {} timeframes",
        data.len(),
        Timeframe::ALL.len()
    )];
    notes.push(format!(
        "Trend {:.1}/10 ({})",
        trend,
        alignment.alignment_type.label()
    ));
    if !alignment.conflicts.is_empty() {
        notes.push(format!(
            "{} timeframe conflict(s) reduce the trend score",
            alignment.conflicts.len()
        ));
    }
    if momentum >= 7.0 {
        notes.push("Momentum broadly positive".to_string());
    } else if momentum <= 3.0 {
        notes.push("Momentum broadly negative".to_string());
    }
    if volume >= 7.0 {
        notes.push("Volume confirms the trend".to_string());
    } else if volume <= 3.0 {
        notes.push("Volume works against the trend".to_string());
    }
    notes.extend(divergences.iter().map(|d| d.description.clone()));
    notes
}
