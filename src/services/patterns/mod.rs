//! Chart and candlestick pattern detection.
//!
//! `AdvancedPatternDetector` runs every family detector over the trailing bars
//! of a series, attaches the configured win rate, filters by minimum
//! confidence and returns the survivors sorted by confidence.

mod candlesticks;
mod cup_handle;
mod diamonds;
mod flags;
mod gaps;
mod harmonics;
mod head_shoulders;
mod rectangles;
mod rounding;
mod tops_bottoms;
mod triangles;
mod wedges;

use tracing::debug;

use crate::config::PatternConfig;
use crate::services::indicators::{local_maxima, local_minima};
use crate::types::{KeyPoint, OhlcPoint, Pattern, Timeframe};

/// Fewer bars than this and no detector runs.
pub const MIN_BARS: usize = 20;

/// Slope per bar, relative to the mean close, below which a line counts as flat.
pub(crate) const FLAT_SLOPE: f64 = 0.0005;

/// Signature shared by every family detector.
type DetectFn = fn(&[OhlcPoint], Timeframe) -> Vec<Pattern>;

const DETECTORS: [(&str, DetectFn); 12] = [
    ("triangles", triangles::detect),
    ("flags", flags::detect),
    ("head_shoulders", head_shoulders::detect),
    ("tops_bottoms", tops_bottoms::detect),
    ("cup_handle", cup_handle::detect),
    ("wedges", wedges::detect),
    ("rounding", rounding::detect),
    ("rectangles", rectangles::detect),
    ("diamonds", diamonds::detect),
    ("gaps", gaps::detect),
    ("candlesticks", candlesticks::detect),
    ("harmonics", harmonics::detect),
];

/// Runs all pattern family detectors over an OHLCV series.
#[derive(Debug, Clone, Default)]
pub struct AdvancedPatternDetector {
    config: PatternConfig,
}

impl AdvancedPatternDetector {
    pub fn new(config: PatternConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PatternConfig {
        &self.config
    }

    /// Detect every supported pattern in `bars`.
    ///
    /// Returns an empty list for fewer than [`MIN_BARS`] bars. Results carry
    /// absolute bar indices, never fall below the configured minimum
    /// confidence and are sorted by confidence, highest first.
    pub fn detect_all_patterns(&self, bars: &[OhlcPoint], timeframe: Timeframe) -> Vec<Pattern> {
        if bars.len() < MIN_BARS {
            return Vec::new();
        }
        let price = match bars.last() {
            Some(bar) if bar.close > 0.0 => bar.close,
            _ => return Vec::new(),
        };

        let mut patterns: Vec<Pattern> = Vec::new();
        for (name, detect) in DETECTORS {
            let found = detect(bars, timeframe);
            if !found.is_empty() {
                debug!("{} detector found {} candidate(s) on {}", name, found.len(), timeframe);
            }
            patterns.extend(found);
        }

        let mut patterns: Vec<Pattern> = patterns
            .into_iter()
            .filter(|p| p.confidence >= self.config.min_confidence)
            .map(|mut p| {
                p.win_probability = self.config.win_rates.get(p.family());
                p.expected_move_pct = p.target_price.map(|t| (t - price) / price * 100.0);
                p
            })
            .collect();

        patterns.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        patterns
    }
}

/// Trailing `size` bars with the absolute index of the first one.
pub(crate) fn trailing(bars: &[OhlcPoint], size: usize) -> Option<(usize, &[OhlcPoint])> {
    if size == 0 || bars.len() < size {
        return None;
    }
    let offset = bars.len() - size;
    Some((offset, &bars[offset..]))
}

/// Keep the highest-confidence candidate of each pattern type, preserving
/// first-seen order.
pub(crate) fn best_per_type(candidates: Vec<Pattern>) -> Vec<Pattern> {
    let mut best: Vec<Pattern> = Vec::new();
    for candidate in candidates {
        match best
            .iter_mut()
            .find(|p| p.pattern_type == candidate.pattern_type)
        {
            Some(existing) if candidate.confidence > existing.confidence => *existing = candidate,
            Some(_) => {}
            None => best.push(candidate),
        }
    }
    best
}

/// Swing highs and lows of a window as `(local index, price)` pairs.
pub(crate) struct Pivots {
    pub peaks: Vec<(usize, f64)>,
    pub troughs: Vec<(usize, f64)>,
}

impl Pivots {
    pub fn find(window: &[OhlcPoint], order: usize) -> Self {
        let highs: Vec<f64> = window.iter().map(|b| b.high).collect();
        let lows: Vec<f64> = window.iter().map(|b| b.low).collect();
        Self {
            peaks: local_maxima(&highs, order)
                .into_iter()
                .map(|i| (i, highs[i]))
                .collect(),
            troughs: local_minima(&lows, order)
                .into_iter()
                .map(|i| (i, lows[i]))
                .collect(),
        }
    }

    /// All pivots as absolute key points, ordered by index.
    pub fn key_points(&self, offset: usize) -> Vec<KeyPoint> {
        let mut points: Vec<KeyPoint> = self
            .peaks
            .iter()
            .chain(&self.troughs)
            .map(|&(i, price)| KeyPoint::new(offset + i, price))
            .collect();
        points.sort_by_key(|p| p.index);
        points
    }

    /// Local index of the earliest pivot, or 0 when there are none.
    pub fn first_index(&self) -> usize {
        self.peaks
            .first()
            .into_iter()
            .chain(self.troughs.first())
            .map(|p| p.0)
            .min()
            .unwrap_or(0)
    }

    pub fn peak_prices(&self) -> Vec<f64> {
        self.peaks.iter().map(|p| p.1).collect()
    }

    pub fn trough_prices(&self) -> Vec<f64> {
        self.troughs.iter().map(|p| p.1).collect()
    }
}

/// Relative spread of `values` around their mean: max |v - mean| / mean.
pub(crate) fn relative_spread(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    if mean <= 0.0 {
        return None;
    }
    let max_dev = values
        .iter()
        .map(|v| (v - mean).abs())
        .fold(0.0_f64, f64::max);
    Some(max_dev / mean)
}
