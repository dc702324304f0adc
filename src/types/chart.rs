use serde::{Deserialize, Serialize};

/// Bar interval analysed by the multi-timeframe engine.
///
/// Declaration order runs from the highest to the lowest timeframe, which is
/// also the `Ord` order used for `BTreeMap<Timeframe, _>` iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "1month")]
    Month1,
    #[serde(rename = "1week")]
    Week1,
    #[serde(rename = "1day")]
    Day1,
    #[serde(rename = "4hour")]
    Hour4,
    #[serde(rename = "1hour")]
    Hour1,
}

impl Timeframe {
    /// All timeframes, highest first.
    pub const ALL: [Timeframe; 5] = [
        Timeframe::Month1,
        Timeframe::Week1,
        Timeframe::Day1,
        Timeframe::Hour4,
        Timeframe::Hour1,
    ];

    /// Timeframes voting on the higher-timeframe direction.
    pub const HIGHER: [Timeframe; 3] = [Timeframe::Day1, Timeframe::Week1, Timeframe::Month1];

    /// Timeframes on which entries are timed.
    pub const ENTRY: [Timeframe; 2] = [Timeframe::Hour4, Timeframe::Hour1];

    /// Parse from the wire key (`"1day"`) or a few common aliases.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "1month" | "1mo" | "monthly" => Some(Timeframe::Month1),
            "1week" | "1w" | "1wk" | "weekly" => Some(Timeframe::Week1),
            "1day" | "1d" | "daily" => Some(Timeframe::Day1),
            "4hour" | "4h" => Some(Timeframe::Hour4),
            "1hour" | "1h" | "hourly" => Some(Timeframe::Hour1),
            _ => None,
        }
    }

    /// Wire key.
    pub fn key(&self) -> &'static str {
        match self {
            Timeframe::Month1 => "1month",
            Timeframe::Week1 => "1week",
            Timeframe::Day1 => "1day",
            Timeframe::Hour4 => "4hour",
            Timeframe::Hour1 => "1hour",
        }
    }

    /// Display label.
    pub fn label(&self) -> &'static str {
        match self {
            Timeframe::Month1 => "Monthly",
            Timeframe::Week1 => "Weekly",
            Timeframe::Day1 => "Daily",
            Timeframe::Hour4 => "4H",
            Timeframe::Hour1 => "1H",
        }
    }

    /// Fixed consensus weight. The five weights sum to 1.0.
    pub fn weight(&self) -> f64 {
        match self {
            Timeframe::Month1 => 0.30,
            Timeframe::Week1 => 0.25,
            Timeframe::Day1 => 0.20,
            Timeframe::Hour4 => 0.15,
            Timeframe::Hour1 => 0.10,
        }
    }

    /// Nominal bar length in milliseconds.
    pub fn bar_millis(&self) -> i64 {
        match self {
            Timeframe::Month1 => 30 * 86_400_000,
            Timeframe::Week1 => 7 * 86_400_000,
            Timeframe::Day1 => 86_400_000,
            Timeframe::Hour4 => 4 * 3_600_000,
            Timeframe::Hour1 => 3_600_000,
        }
    }

    /// Whether this timeframe belongs to the higher-timeframe group
    /// (Monthly, Weekly) used for trend agreement.
    pub fn is_higher(&self) -> bool {
        matches!(self, Timeframe::Month1 | Timeframe::Week1)
    }

    /// Whether this timeframe belongs to the lower-timeframe group (4H, 1H).
    pub fn is_lower(&self) -> bool {
        matches!(self, Timeframe::Hour4 | Timeframe::Hour1)
    }
}

impl std::fmt::Display for Timeframe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// OHLCV bar. `time` is a Unix timestamp in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OhlcPoint {
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: f64,
}

impl OhlcPoint {
    /// Absolute candle body size.
    pub fn body(&self) -> f64 {
        (self.close - self.open).abs()
    }

    /// High minus low.
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    pub fn upper_shadow(&self) -> f64 {
        self.high - self.open.max(self.close)
    }

    pub fn lower_shadow(&self) -> f64 {
        self.open.min(self.close) - self.low
    }

    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }
}

/// Column views over a bar slice, used by the regression-heavy detectors.
pub fn closes(bars: &[OhlcPoint]) -> Vec<f64> {
    bars.iter().map(|b| b.close).collect()
}

pub fn highs(bars: &[OhlcPoint]) -> Vec<f64> {
    bars.iter().map(|b| b.high).collect()
}

pub fn lows(bars: &[OhlcPoint]) -> Vec<f64> {
    bars.iter().map(|b| b.low).collect()
}

pub fn volumes(bars: &[OhlcPoint]) -> Vec<f64> {
    bars.iter().map(|b| b.volume).collect()
}
