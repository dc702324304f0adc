use serde::{Deserialize, Serialize};

/// Which side of price a trendline sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendlineKind {
    Support,
    Resistance,
}

/// Fitted support or resistance line. Price at bar `i` is `slope * i + intercept`,
/// with `i` an index into the analysed series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trendline {
    pub slope: f64,
    pub intercept: f64,
    pub start_idx: usize,
    pub end_idx: usize,
    #[serde(rename = "type")]
    pub kind: TrendlineKind,
    pub touches: usize,
    /// Correlation coefficient of the fit (signed).
    pub r_squared: f64,
    /// 0-100.
    pub strength: f64,
    pub breaks: usize,
}

impl Trendline {
    /// Projected price at a bar index.
    pub fn price_at(&self, index: usize) -> f64 {
        self.slope * index as f64 + self.intercept
    }
}

/// Support and resistance lines, strongest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrendlineSet {
    pub support: Vec<Trendline>,
    pub resistance: Vec<Trendline>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelType {
    Ascending,
    Descending,
    Horizontal,
}

/// Parallel support/resistance pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub support: Trendline,
    pub resistance: Trendline,
    pub channel_type: ChannelType,
    pub start_idx: usize,
    pub end_idx: usize,
    /// Mean vertical separation over the overlap.
    pub width: f64,
    /// Width as a percentage of the mid price.
    pub width_pct: f64,
    /// 0-1 slope similarity.
    pub slope_similarity: f64,
    pub strength: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwingDirection {
    Uptrend,
    Downtrend,
}

impl SwingDirection {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "uptrend" | "up" => Some(SwingDirection::Uptrend),
            "downtrend" | "down" => Some(SwingDirection::Downtrend),
            _ => None,
        }
    }
}

/// One ratio/price pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FibonacciLevel {
    pub ratio: f64,
    pub price: f64,
}

/// Retracement and extension levels for one swing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FibonacciLevels {
    pub swing_high: f64,
    pub swing_low: f64,
    pub direction: SwingDirection,
    /// Ordered by ratio ascending.
    pub retracement_levels: Vec<FibonacciLevel>,
    /// Ordered by ratio ascending.
    pub extension_levels: Vec<FibonacciLevel>,
    pub current_price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub swing_high_idx: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub swing_low_idx: Option<usize>,
}

impl FibonacciLevels {
    pub fn retracement(&self, ratio: f64) -> Option<f64> {
        find_level(&self.retracement_levels, ratio)
    }

    pub fn extension(&self, ratio: f64) -> Option<f64> {
        find_level(&self.extension_levels, ratio)
    }

    fn all_prices(&self) -> impl Iterator<Item = f64> + '_ {
        self.retracement_levels
            .iter()
            .chain(self.extension_levels.iter())
            .map(|l| l.price)
            .chain([self.swing_high, self.swing_low])
    }

    /// Closest level strictly below the current price.
    pub fn nearest_support(&self) -> Option<f64> {
        self.all_prices()
            .filter(|p| *p < self.current_price)
            .fold(None, |best: Option<f64>, p| Some(best.map_or(p, |b| b.max(p))))
    }

    /// Closest level strictly above the current price.
    pub fn nearest_resistance(&self) -> Option<f64> {
        self.all_prices()
            .filter(|p| *p > self.current_price)
            .fold(None, |best: Option<f64>, p| Some(best.map_or(p, |b| b.min(p))))
    }
}

fn find_level(levels: &[FibonacciLevel], ratio: f64) -> Option<f64> {
    levels
        .iter()
        .find(|l| (l.ratio - ratio).abs() < 1e-9)
        .map(|l| l.price)
}
