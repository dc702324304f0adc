//! Integration tests for the multi-timeframe pipeline

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tradelens::error::{AppError, Result};
use tradelens::services::{
    ComprehensiveMtfService, MarketDataService, MarketDataSource, MtfAnalyzer, MtfScoringEngine,
};
use tradelens::types::*;

fn rally(count: usize, bar_ms: i64) -> Vec<OhlcPoint> {
    (0..count)
        .map(|i| {
            let close = 100.0 * 1.005_f64.powi(i as i32) + if i % 2 == 0 { 0.3 } else { -0.3 };
            OhlcPoint {
                time: i as i64 * bar_ms,
                open: close - 0.2,
                high: close + 0.8,
                low: close - 0.8,
                close,
                volume: 1_000_000.0,
            }
        })
        .collect()
}

fn bullish(tf: Timeframe, strength: f64) -> TimeframeData {
    let mut data = TimeframeData::unknown(tf, 120, 100.0);
    data.trend_direction = TrendDirection::Up;
    data.trend_strength = strength;
    data
}

fn daily_and_weekly() -> BTreeMap<Timeframe, Vec<OhlcPoint>> {
    BTreeMap::from([
        (Timeframe::Day1, rally(120, Timeframe::Day1.bar_millis())),
        (Timeframe::Week1, rally(120, Timeframe::Week1.bar_millis())),
    ])
}

fn service_with(source: impl MarketDataSource + 'static) -> ComprehensiveMtfService {
    let market_data = MarketDataService::new(Arc::new(source), Duration::from_secs(60));
    ComprehensiveMtfService::new(Arc::new(market_data))
}

/// Serves rallies for the daily and weekly charts only.
struct HigherTimeframesOnly;

#[async_trait]
impl MarketDataSource for HigherTimeframesOnly {
    fn name(&self) -> &str {
        "higher-only"
    }

    async fn fetch_ohlcv(&self, ticker: &str, timeframe: Timeframe) -> Result<Vec<OhlcPoint>> {
        match timeframe {
            Timeframe::Day1 | Timeframe::Week1 => Ok(rally(120, timeframe.bar_millis())),
            _ => Err(AppError::NotFound(format!("{} {}", ticker, timeframe))),
        }
    }
}

struct Offline;

#[async_trait]
impl MarketDataSource for Offline {
    fn name(&self) -> &str {
        "offline"
    }

    async fn fetch_ohlcv(&self, _ticker: &str, _timeframe: Timeframe) -> Result<Vec<OhlcPoint>> {
        Err(AppError::ExternalApi("connection refused".to_string()))
    }
}

// =========================================================================
// Alignment and scoring
// =========================================================================

#[test]
fn test_all_bullish_alignment_scores_high() {
    let data: BTreeMap<Timeframe, TimeframeData> = Timeframe::ALL
        .into_iter()
        .map(|tf| (tf, bullish(tf, 0.8)))
        .collect();
    let alignment = MtfAnalyzer::new().analyze_alignment(&data);

    assert_eq!(alignment.alignment_type, AlignmentType::AllBullish);
    assert!(alignment.is_aligned);
    assert!((9.0..=10.0).contains(&alignment.alignment_score));
    assert_eq!(alignment.higher_tf_trend, TrendDirection::Up);
    assert_eq!(alignment.lower_tf_trend, TrendDirection::Up);
    assert!(alignment.trend_agreement);
    assert!(alignment.conflicts.is_empty());
    assert!(alignment.warnings.is_empty());
}

#[test]
fn test_all_bearish_alignment_mirrors_bullish_without_bonus() {
    let data: BTreeMap<Timeframe, TimeframeData> = Timeframe::ALL
        .into_iter()
        .map(|tf| {
            let mut d = bullish(tf, 0.8);
            d.trend_direction = TrendDirection::Down;
            (tf, d)
        })
        .collect();
    let alignment = MtfAnalyzer::new().analyze_alignment(&data);

    assert_eq!(alignment.alignment_type, AlignmentType::AllBearish);
    assert!((alignment.alignment_score - 1.0).abs() < 1e-9);
    assert_eq!(alignment.higher_tf_trend, TrendDirection::Down);
    assert_eq!(alignment.lower_tf_trend, TrendDirection::Down);
}

#[test]
fn test_alignment_partitions_present_timeframes() {
    let mut data = BTreeMap::new();
    data.insert(Timeframe::Week1, bullish(Timeframe::Week1, 0.5));
    let mut daily = bullish(Timeframe::Day1, 0.5);
    daily.trend_direction = TrendDirection::Down;
    data.insert(Timeframe::Day1, daily);
    data.insert(
        Timeframe::Hour1,
        TimeframeData::unknown(Timeframe::Hour1, 5, 100.0),
    );

    let alignment = MtfAnalyzer::new().analyze_alignment(&data);
    let total = alignment.bullish_timeframes.len()
        + alignment.bearish_timeframes.len()
        + alignment.neutral_timeframes.len();
    assert_eq!(total, data.len());
    assert_eq!(alignment.bullish_timeframes, vec!["Weekly".to_string()]);
    assert_eq!(alignment.bearish_timeframes, vec!["Daily".to_string()]);
    assert_eq!(alignment.conflicts.len(), 1);
    assert!(alignment
        .warnings
        .iter()
        .any(|w| w.contains("insufficient data")));
    assert!(alignment.warnings.iter().any(|w| w.contains("Monthly")));
}

#[test]
fn test_score_bounds_and_recommendation() {
    let engine = MtfScoringEngine::new();
    let analyzer = MtfAnalyzer::new();

    for strength in [0.0, 0.5, 1.0] {
        let data: BTreeMap<Timeframe, TimeframeData> = Timeframe::ALL
            .into_iter()
            .map(|tf| (tf, bullish(tf, strength)))
            .collect();
        let alignment = analyzer.analyze_alignment(&data);
        let score = engine.calculate_mtf_score(&data, &alignment, &[]);

        assert!((0.0..=10.0).contains(&score.overall_score));
        assert_eq!(score.category, ScoreCategory::from_score(score.overall_score));
        let parts: f64 = score.score_breakdown.values().sum();
        assert!((parts.clamp(0.0, 10.0) - score.overall_score).abs() < 1e-9);
    }

    assert_eq!(engine.get_trade_recommendation(9.0), TradeRecommendation::StrongBuy);
    assert_eq!(engine.get_trade_recommendation(7.0), TradeRecommendation::Buy);
    assert_eq!(engine.get_trade_recommendation(5.0), TradeRecommendation::Hold);
    assert_eq!(engine.get_trade_recommendation(3.0), TradeRecommendation::Sell);
    assert_eq!(engine.get_trade_recommendation(1.0), TradeRecommendation::StrongSell);
}

#[test]
fn test_empty_snapshot_is_neutral() {
    let data = BTreeMap::new();
    let alignment = MtfAnalyzer::new().analyze_alignment(&data);
    assert_eq!(alignment.alignment_type, AlignmentType::Neutral);
    assert_eq!(alignment.higher_tf_trend, TrendDirection::Unknown);
    assert_eq!(alignment.warnings.len(), Timeframe::ALL.len());

    let score = MtfScoringEngine::new().calculate_mtf_score(&data, &alignment, &[]);
    assert!((0.0..=10.0).contains(&score.overall_score));
}

// =========================================================================
// Full pipeline
// =========================================================================

#[test]
fn test_analyze_series_with_missing_timeframes() {
    let service = service_with(Offline);
    let series = daily_and_weekly();
    let analysis = service.analyze_series("MSFT", &series);

    assert_eq!(analysis.ticker, "MSFT");
    assert_eq!(analysis.timeframe_data.len(), 2);
    assert_eq!(
        analysis.missing_timeframes,
        vec![Timeframe::Month1, Timeframe::Hour4, Timeframe::Hour1]
    );
    for (tf, data) in &analysis.timeframe_data {
        assert_eq!(data.trend_direction, TrendDirection::Up, "{}", tf);
    }
    assert_eq!(analysis.alignment.alignment_type, AlignmentType::AllBullish);

    assert!((0.0..=10.0).contains(&analysis.score.overall_score));
    assert_eq!(
        analysis.recommendation,
        MtfScoringEngine::new().get_trade_recommendation(analysis.score.overall_score)
    );

    // No 4H or 1H data, so there is nothing to time an entry on.
    let signal = &analysis.entry_timing.current_signal;
    assert_eq!(signal.signal_type, SignalType::Wait);
    assert_eq!(signal.entry_timeframe, Timeframe::Day1);
    assert_eq!(signal.entry_price, series[&Timeframe::Day1].last().unwrap().close);
    assert!(analysis.entry_timing.optimal_entry_tf.is_none());

    assert!(analysis
        .alerts
        .iter()
        .any(|a| a.kind == AlertKind::MissingData && a.message.contains("4H")));
    assert!(analysis
        .alerts
        .iter()
        .any(|a| a.kind == AlertKind::FullAlignment));
    assert!(analysis
        .alerts
        .windows(2)
        .all(|pair| pair[0].severity >= pair[1].severity));

    assert_eq!(analysis.summary.timeframes_analyzed, 2);
    assert_eq!(analysis.summary.recommendation, analysis.recommendation);
    assert!(analysis.daily_patterns.iter().all(|p| p.confidence >= 60.0));
}

#[test]
fn test_analyze_series_without_daily_skips_levels() {
    let service = service_with(Offline);
    let series = BTreeMap::from([(Timeframe::Week1, rally(80, Timeframe::Week1.bar_millis()))]);
    let analysis = service.analyze_series("MSFT", &series);

    assert!(analysis.daily_patterns.is_empty());
    assert!(analysis.trendlines.support.is_empty());
    assert!(analysis.channels.is_empty());
    assert!(analysis.fibonacci.is_empty());
}

#[test]
fn test_analyze_series_is_deterministic() {
    let service = service_with(Offline);
    let series = daily_and_weekly();
    let first = service.analyze_series("MSFT", &series);
    let second = service.analyze_series("MSFT", &series);

    assert_eq!(first.score, second.score);
    assert_eq!(first.alignment, second.alignment);
    assert_eq!(first.entry_timing, second.entry_timing);
    assert_eq!(first.daily_patterns, second.daily_patterns);
    assert_eq!(first.alerts, second.alerts);
}

#[tokio::test]
async fn test_analyze_fetches_and_normalizes() {
    let service = service_with(HigherTimeframesOnly);
    let analysis = service.analyze(" msft ").await.unwrap();

    assert_eq!(analysis.ticker, "MSFT");
    assert_eq!(analysis.timeframe_data.len(), 2);
    assert_eq!(analysis.missing_timeframes.len(), 3);
    assert!(service.market_data().is_cached("MSFT", Timeframe::Day1));
}

#[tokio::test]
async fn test_analyze_without_any_data_is_not_found() {
    let service = service_with(Offline);
    let err = service.analyze("MSFT").await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}
