use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::{Channel, FibonacciLevels, Pattern, Timeframe, TrendlineSet};

/// Direction of price over a timeframe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Up,
    Down,
    Sideways,
    /// Not enough bars to tell.
    Unknown,
}

impl TrendDirection {
    pub fn is_directional(&self) -> bool {
        matches!(self, TrendDirection::Up | TrendDirection::Down)
    }

    pub fn is_opposite(&self, other: TrendDirection) -> bool {
        matches!(
            (self, other),
            (TrendDirection::Up, TrendDirection::Down) | (TrendDirection::Down, TrendDirection::Up)
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            TrendDirection::Up => "up",
            TrendDirection::Down => "down",
            TrendDirection::Sideways => "sideways",
            TrendDirection::Unknown => "unknown",
        }
    }
}

/// Momentum read of an oscillator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MomentumBias {
    Bullish,
    Bearish,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeTrend {
    Increasing,
    Decreasing,
    Stable,
}

/// Technical snapshot of one timeframe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeframeData {
    pub timeframe: Timeframe,
    pub label: String,
    pub weight: f64,
    pub bars: usize,
    pub current_price: f64,
    pub sma_50: Option<f64>,
    pub sma_200: Option<f64>,
    pub trend_direction: TrendDirection,
    /// 0-1.
    pub trend_strength: f64,
    pub rsi: Option<f64>,
    pub rsi_trend: Option<MomentumBias>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub macd_histogram: Option<f64>,
    pub volume_trend: VolumeTrend,
    /// Recent-to-earlier average volume ratio.
    pub volume_ratio: Option<f64>,
    /// 0-1.
    pub volume_strength: f64,
    pub pattern_detected: bool,
    pub pattern_name: Option<String>,
    /// 0-1.
    pub pattern_confidence: f64,
    pub nearest_support: Option<f64>,
    pub nearest_resistance: Option<f64>,
    pub bullish_divergence: bool,
    pub bearish_divergence: bool,
}

impl TimeframeData {
    /// Snapshot for a timeframe without enough bars: unknown trend and no indicators.
    pub fn unknown(timeframe: Timeframe, bars: usize, current_price: f64) -> Self {
        Self {
            timeframe,
            label: timeframe.label().to_string(),
            weight: timeframe.weight(),
            bars,
            current_price,
            sma_50: None,
            sma_200: None,
            trend_direction: TrendDirection::Unknown,
            trend_strength: 0.0,
            rsi: None,
            rsi_trend: None,
            macd: None,
            macd_signal: None,
            macd_histogram: None,
            volume_trend: VolumeTrend::Stable,
            volume_ratio: None,
            volume_strength: 0.0,
            pattern_detected: false,
            pattern_name: None,
            pattern_confidence: 0.0,
            nearest_support: None,
            nearest_resistance: None,
            bullish_divergence: false,
            bearish_divergence: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlignmentType {
    AllBullish,
    AllBearish,
    MostlyBullish,
    MostlyBearish,
    MixedBullish,
    MixedBearish,
    Neutral,
}

impl AlignmentType {
    pub fn label(&self) -> &'static str {
        match self {
            AlignmentType::AllBullish => "all bullish",
            AlignmentType::AllBearish => "all bearish",
            AlignmentType::MostlyBullish => "mostly bullish",
            AlignmentType::MostlyBearish => "mostly bearish",
            AlignmentType::MixedBullish => "mixed, leaning bullish",
            AlignmentType::MixedBearish => "mixed, leaning bearish",
            AlignmentType::Neutral => "neutral",
        }
    }
}

/// Agreement of trend direction across timeframes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MtfAlignment {
    pub is_aligned: bool,
    /// 0-10.
    pub alignment_score: f64,
    pub alignment_type: AlignmentType,
    pub bullish_timeframes: Vec<String>,
    pub bearish_timeframes: Vec<String>,
    pub neutral_timeframes: Vec<String>,
    pub higher_tf_trend: TrendDirection,
    pub lower_tf_trend: TrendDirection,
    pub trend_agreement: bool,
    pub conflicts: Vec<String>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DivergenceType {
    Bullish,
    Bearish,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DivergenceSeverity {
    Weak,
    Moderate,
    Strong,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MtfDivergence {
    pub divergence_type: DivergenceType,
    pub timeframes_involved: Vec<String>,
    pub severity: DivergenceSeverity,
    /// 0-1.
    pub confirmation_score: f64,
    pub description: String,
}

/// Score band. Ordered from worst to best.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreCategory {
    VeryPoor,
    Poor,
    Fair,
    Good,
    Excellent,
}

impl ScoreCategory {
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s >= 9.0 => ScoreCategory::Excellent,
            s if s >= 7.5 => ScoreCategory::Good,
            s if s >= 5.5 => ScoreCategory::Fair,
            s if s >= 3.0 => ScoreCategory::Poor,
            _ => ScoreCategory::VeryPoor,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ScoreCategory::Excellent => "Excellent",
            ScoreCategory::Good => "Good",
            ScoreCategory::Fair => "Fair",
            ScoreCategory::Poor => "Poor",
            ScoreCategory::VeryPoor => "Very Poor",
        }
    }
}

/// Trade action implied by a composite score. Ordered from most bearish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeRecommendation {
    StrongSell,
    Sell,
    Hold,
    Buy,
    StrongBuy,
}

impl TradeRecommendation {
    pub fn label(&self) -> &'static str {
        match self {
            TradeRecommendation::StrongBuy => "Strong Buy",
            TradeRecommendation::Buy => "Buy",
            TradeRecommendation::Hold => "Hold",
            TradeRecommendation::Sell => "Sell",
            TradeRecommendation::StrongSell => "Strong Sell",
        }
    }
}

/// Composite multi-timeframe score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MtfScore {
    /// 0-10.
    pub overall_score: f64,
    pub category: ScoreCategory,
    pub trend_alignment_score: f64,
    pub momentum_score: f64,
    pub volume_score: f64,
    pub pattern_score: f64,
    /// Clamped to [-3, 3].
    pub divergence_adjustment: f64,
    pub score_breakdown: BTreeMap<String, f64>,
    pub scoring_notes: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalType {
    Buy,
    Sell,
    Wait,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntrySignal {
    pub signal_type: SignalType,
    /// 0-1.
    pub confidence: f64,
    pub entry_price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub risk_reward_ratio: f64,
    pub entry_timeframe: Timeframe,
    pub entry_reason: String,
    /// Higher-timeframe direction at the time of the signal.
    pub trend_direction: TrendDirection,
    pub higher_tf_confirmed: bool,
    pub volume_confirmed: bool,
    pub pattern_confirmed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryTiming {
    pub optimal_entry_tf: Option<Timeframe>,
    pub current_signal: EntrySignal,
    pub alternative_entries: Vec<EntrySignal>,
    pub timing_notes: Vec<String>,
    pub wait_for: Vec<String>,
}

/// Ordered alert severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    FullAlignment,
    Divergence,
    ScoreExtreme,
    EntrySignal,
    TimeframeConflict,
    MissingData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MtfAlert {
    pub ticker: String,
    pub kind: AlertKind,
    pub severity: AlertSeverity,
    pub message: String,
}

/// Plain-language digest of an analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MtfSummary {
    pub headline: String,
    pub recommendation: TradeRecommendation,
    pub overall_score: f64,
    pub category: ScoreCategory,
    pub alignment_type: AlignmentType,
    pub trend_direction: TrendDirection,
    pub entry_action: SignalType,
    pub key_support: Option<f64>,
    pub key_resistance: Option<f64>,
    pub timeframes_analyzed: usize,
    pub notes: Vec<String>,
}

/// Full multi-timeframe result for one ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MtfAnalysis {
    pub ticker: String,
    pub timeframe_data: BTreeMap<Timeframe, TimeframeData>,
    pub missing_timeframes: Vec<Timeframe>,
    pub alignment: MtfAlignment,
    pub divergences: Vec<MtfDivergence>,
    pub score: MtfScore,
    pub recommendation: TradeRecommendation,
    pub entry_timing: EntryTiming,
    pub daily_patterns: Vec<Pattern>,
    pub trendlines: TrendlineSet,
    pub channels: Vec<Channel>,
    pub fibonacci: Vec<FibonacciLevels>,
    pub alerts: Vec<MtfAlert>,
    pub summary: MtfSummary,
    /// Unix timestamp (milliseconds).
    pub generated_at: i64,
}
