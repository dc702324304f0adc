//! Full multi-timeframe analysis for one ticker.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::info;

use super::{MtfAlertSystem, MtfAnalyzer, MtfEntryTimingOptimizer, MtfScoringEngine};
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::services::fibonacci::FibonacciCalculator;
use crate::services::market_data::{normalize_ticker, MarketDataService};
use crate::services::patterns::AdvancedPatternDetector;
use crate::services::trendlines::TrendlineDetector;
use crate::types::{
    EntryTiming, MtfAlignment, MtfAnalysis, MtfScore, MtfSummary, OhlcPoint, Pattern, Timeframe,
    TimeframeData, TradeRecommendation, TrendlineSet,
};

const DEFAULT_LOOKBACK: usize = 100;

/// Fetches every timeframe, then runs the analyzers in order: per-timeframe
/// snapshots, alignment and divergence, score, entry timing, daily chart
/// detectors, alerts and summary.
pub struct ComprehensiveMtfService {
    market_data: Arc<MarketDataService>,
    analyzer: MtfAnalyzer,
    scoring: MtfScoringEngine,
    entry_timing: MtfEntryTimingOptimizer,
    alerts: MtfAlertSystem,
    patterns: AdvancedPatternDetector,
    trendlines: TrendlineDetector,
    fibonacci: FibonacciCalculator,
    lookback: usize,
}

impl ComprehensiveMtfService {
    pub fn new(market_data: Arc<MarketDataService>) -> Self {
        Self {
            market_data,
            analyzer: MtfAnalyzer::new(),
            scoring: MtfScoringEngine::new(),
            entry_timing: MtfEntryTimingOptimizer::new(),
            alerts: MtfAlertSystem::new(),
            patterns: AdvancedPatternDetector::default(),
            trendlines: TrendlineDetector::default(),
            fibonacci: FibonacciCalculator::new(),
            lookback: DEFAULT_LOOKBACK,
        }
    }

    pub fn from_config(market_data: Arc<MarketDataService>, config: &Config) -> Self {
        Self {
            patterns: AdvancedPatternDetector::new(config.patterns.clone()),
            trendlines: TrendlineDetector::new(config.trendlines),
            lookback: config.default_lookback,
            ..Self::new(market_data)
        }
    }

    pub fn market_data(&self) -> &Arc<MarketDataService> {
        &self.market_data
    }

    pub fn patterns(&self) -> &AdvancedPatternDetector {
        &self.patterns
    }

    pub fn trendlines(&self) -> &TrendlineDetector {
        &self.trendlines
    }

    pub fn fibonacci(&self) -> &FibonacciCalculator {
        &self.fibonacci
    }

    pub fn lookback(&self) -> usize {
        self.lookback
    }

    /// Fetch all timeframes concurrently and analyze whatever arrived.
    /// Errors only when no timeframe could be fetched.
    pub async fn analyze(&self, ticker: &str) -> Result<MtfAnalysis> {
        let ticker = normalize_ticker(ticker);
        let series = self.market_data.fetch_all(&ticker, &Timeframe::ALL).await;
        if series.is_empty() {
            return Err(AppError::NotFound(format!("No market data for {}", ticker)));
        }
        Ok(self.analyze_series(&ticker, &series))
    }

    /// Analyze already-fetched series. Absent timeframes are reported in
    /// `missing_timeframes` and excluded from every weighted average.
    pub fn analyze_series(
        &self,
        ticker: &str,
        series: &BTreeMap<Timeframe, Vec<OhlcPoint>>,
    ) -> MtfAnalysis {
        let timeframe_data: BTreeMap<Timeframe, TimeframeData> = series
            .iter()
            .map(|(&tf, bars)| (tf, self.analyzer.analyze_timeframe(ticker, tf, bars)))
            .collect();
        let missing_timeframes: Vec<Timeframe> = Timeframe::ALL
            .into_iter()
            .filter(|tf| !series.contains_key(tf))
            .collect();

        let alignment = self.analyzer.analyze_alignment(&timeframe_data);
        let divergences = self.analyzer.detect_mtf_divergences(&timeframe_data);
        let score = self
            .scoring
            .calculate_mtf_score(&timeframe_data, &alignment, &divergences);
        let recommendation = self.scoring.get_trade_recommendation(score.overall_score);
        let entry_timing = self
            .entry_timing
            .optimize_entry(ticker, &timeframe_data, series);

        let (daily_patterns, trendlines, channels, fibonacci) = match series.get(&Timeframe::Day1) {
            Some(daily) => (
                self.patterns.detect_all_patterns(daily, Timeframe::Day1),
                self.trendlines.detect_all_trendlines(daily, self.lookback),
                self.trendlines.detect_channels(daily, self.lookback),
                self.fibonacci.calculate_auto_fibonacci(daily, self.lookback),
            ),
            None => (Vec::new(), TrendlineSet::default(), Vec::new(), Vec::new()),
        };

        let summary = build_summary(
            ticker,
            &timeframe_data,
            &alignment,
            &score,
            recommendation,
            &entry_timing,
            &daily_patterns,
        );

        let mut analysis = MtfAnalysis {
            ticker: ticker.to_string(),
            timeframe_data,
            missing_timeframes,
            alignment,
            divergences,
            score,
            recommendation,
            entry_timing,
            daily_patterns,
            trendlines,
            channels,
            fibonacci,
            alerts: Vec::new(),
            summary,
            generated_at: chrono::Utc::now().timestamp_millis(),
        };
        analysis.alerts = self.alerts.generate(&analysis);

        info!(
            "{}: MTF score {:.1} ({}), {} timeframe(s), {} alert(s)",
            ticker,
            analysis.score.overall_score,
            analysis.recommendation.label(),
            analysis.timeframe_data.len(),
            analysis.alerts.len()
        );
        analysis
    }
}

/// Daily level when present, otherwise the first timeframe that has one.
fn key_level(
    data: &BTreeMap<Timeframe, TimeframeData>,
    level: impl Fn(&TimeframeData) -> Option<f64>,
) -> Option<f64> {
    data.get(&Timeframe::Day1)
        .and_then(&level)
        .or_else(|| data.values().find_map(&level))
}

fn build_summary(
    ticker: &str,
    data: &BTreeMap<Timeframe, TimeframeData>,
    alignment: &MtfAlignment,
    score: &MtfScore,
    recommendation: TradeRecommendation,
    entry_timing: &EntryTiming,
    daily_patterns: &[Pattern],
) -> MtfSummary {
    let signal = &entry_timing.current_signal;
    let mut notes = vec![signal.entry_reason.clone()];
    if let Some(top) = daily_patterns.first() {
        notes.push(format!(
            "Daily {} ({:.0}% confidence)",
            top.pattern_type.name(),
            top.confidence
        ));
    }
    notes.extend(alignment.conflicts.iter().cloned());
    notes.extend(entry_timing.wait_for.iter().map(|w| format!("Wait for: {}", w)));

    MtfSummary {
        headline: format!(
            "{}: {} ({:.1}/10, {})",
            ticker,
            recommendation.label(),
            score.overall_score,
            alignment.alignment_type.label()
        ),
        recommendation,
        overall_score: score.overall_score,
        category: score.category,
        alignment_type: alignment.alignment_type,
        trend_direction: signal.trend_direction,
        entry_action: signal.signal_type,
        key_support: key_level(data, |d| d.nearest_support),
        key_resistance: key_level(data, |d| d.nearest_resistance),
        timeframes_analyzed: data.len(),
        notes,
    }
}
