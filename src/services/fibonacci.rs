//! Fibonacci retracement and extension levels.

use tracing::debug;

use crate::services::indicators::{local_maxima, local_minima};
use crate::types::{FibonacciLevel, FibonacciLevels, OhlcPoint, SwingDirection};

pub const RETRACEMENT_RATIOS: [f64; 5] = [0.236, 0.382, 0.5, 0.618, 0.786];
pub const EXTENSION_RATIOS: [f64; 5] = [1.272, 1.414, 1.618, 2.0, 2.618];

/// Wide neighbourhood so only major swings qualify.
const SWING_ORDER: usize = 10;
/// Minimum move for the most recent swing.
const RECENT_MIN_MOVE: f64 = 0.05;
/// Minimum move for the larger historical swing.
const HISTORICAL_MIN_MOVE: f64 = 0.10;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Swing {
    start_idx: usize,
    end_idx: usize,
    high: f64,
    low: f64,
    direction: SwingDirection,
}

impl Swing {
    fn between(a: (usize, f64, bool), b: (usize, f64, bool)) -> Option<Self> {
        // (index, price, is_peak); a comes first.
        let (start_idx, start_price, start_is_peak) = a;
        let (end_idx, end_price, end_is_peak) = b;
        if start_is_peak == end_is_peak || end_idx <= start_idx {
            return None;
        }
        let (high, low, direction) = if end_is_peak {
            (end_price, start_price, SwingDirection::Uptrend)
        } else {
            (start_price, end_price, SwingDirection::Downtrend)
        };
        if low <= 0.0 || high <= low {
            return None;
        }
        Some(Self {
            start_idx,
            end_idx,
            high,
            low,
            direction,
        })
    }

    fn relative_move(&self) -> f64 {
        (self.high - self.low) / self.low
    }

    fn high_idx(&self) -> usize {
        match self.direction {
            SwingDirection::Uptrend => self.end_idx,
            SwingDirection::Downtrend => self.start_idx,
        }
    }

    fn low_idx(&self) -> usize {
        match self.direction {
            SwingDirection::Uptrend => self.start_idx,
            SwingDirection::Downtrend => self.end_idx,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FibonacciCalculator;

impl FibonacciCalculator {
    pub fn new() -> Self {
        Self
    }

    /// Levels for the most recent significant swing (>5%) and, when it is a
    /// different swing, the largest historical one (>10%) in the trailing
    /// `lookback` bars. At most two results, recent first.
    pub fn calculate_auto_fibonacci(
        &self,
        bars: &[OhlcPoint],
        lookback: usize,
    ) -> Vec<FibonacciLevels> {
        let Some(current_price) = bars.last().map(|b| b.close) else {
            return Vec::new();
        };
        let offset = bars.len().saturating_sub(lookback);
        let window = &bars[offset..];

        let swings = candidate_swings(window, offset);
        let recent = most_recent_swing(&swings).or_else(|| range_swing(window, offset));
        let historical = swings
            .iter()
            .filter(|s| s.relative_move() > HISTORICAL_MIN_MOVE)
            .max_by(|a, b| a.relative_move().total_cmp(&b.relative_move()))
            .copied();

        let mut result = Vec::new();
        if let Some(swing) = recent {
            result.push(levels_for(&swing, current_price));
        }
        if let Some(swing) = historical {
            if Some(swing) != recent {
                result.push(levels_for(&swing, current_price));
            }
        }

        debug!(
            "Fibonacci: {} swing(s) from {} pivot pairs",
            result.len(),
            swings.len()
        );
        result
    }

    /// Levels for an explicit swing. `high` and `low` are swapped if given
    /// the wrong way round.
    pub fn calculate_manual_fibonacci(
        &self,
        high: f64,
        low: f64,
        direction: SwingDirection,
        current_price: f64,
    ) -> FibonacciLevels {
        let (high, low) = if high >= low { (high, low) } else { (low, high) };
        build_levels(high, low, direction, current_price, None, None)
    }
}

/// Every peak/trough pair in time order, as absolute-index swings.
fn candidate_swings(window: &[OhlcPoint], offset: usize) -> Vec<Swing> {
    let highs: Vec<f64> = window.iter().map(|b| b.high).collect();
    let lows: Vec<f64> = window.iter().map(|b| b.low).collect();

    let mut pivots: Vec<(usize, f64, bool)> = local_maxima(&highs, SWING_ORDER)
        .into_iter()
        .map(|i| (offset + i, highs[i], true))
        .chain(
            local_minima(&lows, SWING_ORDER)
                .into_iter()
                .map(|i| (offset + i, lows[i], false)),
        )
        .collect();
    pivots.sort_by_key(|p| p.0);

    let mut swings = Vec::new();
    for (a, start) in pivots.iter().enumerate() {
        for end in &pivots[a + 1..] {
            swings.extend(Swing::between(*start, *end));
        }
    }
    swings
}

/// The swing ending at the latest pivot that has a qualifying move, taking
/// the largest such move for that end point.
fn most_recent_swing(swings: &[Swing]) -> Option<Swing> {
    let mut ends: Vec<usize> = swings.iter().map(|s| s.end_idx).collect();
    ends.sort_unstable();
    ends.dedup();

    ends.into_iter().rev().find_map(|end| {
        swings
            .iter()
            .filter(|s| s.end_idx == end && s.relative_move() > RECENT_MIN_MOVE)
            .max_by(|a, b| a.relative_move().total_cmp(&b.relative_move()))
            .copied()
    })
}

/// Fallback when the window has no opposing pivots: its absolute high and low.
fn range_swing(window: &[OhlcPoint], offset: usize) -> Option<Swing> {
    let (high_i, high) = window
        .iter()
        .enumerate()
        .map(|(i, b)| (i, b.high))
        .reduce(|a, b| if b.1 > a.1 { b } else { a })?;
    let (low_i, low) = window
        .iter()
        .enumerate()
        .map(|(i, b)| (i, b.low))
        .reduce(|a, b| if b.1 < a.1 { b } else { a })?;

    let swing = if low_i < high_i {
        Swing::between((offset + low_i, low, false), (offset + high_i, high, true))
    } else {
        Swing::between((offset + high_i, high, true), (offset + low_i, low, false))
    }?;
    (swing.relative_move() > RECENT_MIN_MOVE).then_some(swing)
}

fn levels_for(swing: &Swing, current_price: f64) -> FibonacciLevels {
    build_levels(
        swing.high,
        swing.low,
        swing.direction,
        current_price,
        Some(swing.high_idx()),
        Some(swing.low_idx()),
    )
}

fn build_levels(
    high: f64,
    low: f64,
    direction: SwingDirection,
    current_price: f64,
    swing_high_idx: Option<usize>,
    swing_low_idx: Option<usize>,
) -> FibonacciLevels {
    let range = high - low;
    let level = |ratio: f64, from: f64, sign: f64| FibonacciLevel {
        ratio,
        price: from + sign * ratio * range,
    };

    let (retracement_levels, extension_levels) = match direction {
        SwingDirection::Uptrend => (
            RETRACEMENT_RATIOS.iter().map(|&r| level(r, high, -1.0)).collect(),
            EXTENSION_RATIOS.iter().map(|&r| level(r, low, 1.0)).collect(),
        ),
        SwingDirection::Downtrend => (
            RETRACEMENT_RATIOS.iter().map(|&r| level(r, low, 1.0)).collect(),
            EXTENSION_RATIOS.iter().map(|&r| level(r, high, -1.0)).collect(),
        ),
    };

    FibonacciLevels {
        swing_high: high,
        swing_low: low,
        direction,
        retracement_levels,
        extension_levels,
        current_price,
        swing_high_idx,
        swing_low_idx,
    }
}
