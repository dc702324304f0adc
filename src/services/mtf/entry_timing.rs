//! Entry timing on the 4H and 1H charts in the direction of the higher timeframes.

use std::collections::BTreeMap;

use tracing::debug;

use crate::types::{
    EntrySignal, EntryTiming, OhlcPoint, SignalType, Timeframe, TimeframeData, TrendDirection,
    VolumeTrend,
};

/// Maximum distance from the level, as a fraction of it, for an entry.
const MAX_LEVEL_DISTANCE: f64 = 0.02;
const CLOSE_LEVEL_DISTANCE: f64 = 0.005;
const STOP_BUFFER: f64 = 0.02;
const DEFAULT_TARGET_MOVE: f64 = 0.05;
const MIN_RISK_REWARD: f64 = 1.5;
/// Winning side of the higher-timeframe vote must outweigh the other by this factor.
const VOTE_MARGIN: f64 = 1.2;

#[derive(Debug, Clone, Copy, Default)]
pub struct MtfEntryTimingOptimizer;

impl MtfEntryTimingOptimizer {
    pub fn new() -> Self {
        Self
    }

    /// Best entry across the 4H and 1H timeframes, or a `Wait` signal when
    /// neither offers a setup with enough reward for its risk.
    pub fn optimize_entry(
        &self,
        ticker: &str,
        data: &BTreeMap<Timeframe, TimeframeData>,
        ohlcv: &BTreeMap<Timeframe, Vec<OhlcPoint>>,
    ) -> EntryTiming {
        let direction = higher_timeframe_direction(data);
        let agreement = agreement_fraction(data, direction);
        let mut timing_notes = vec![format!(
            "Higher timeframes trend {}",
            direction.label()
        )];

        let mut candidates: Vec<EntrySignal> = Vec::new();
        for tf in Timeframe::ENTRY {
            let Some(tf_data) = data.get(&tf) else {
                timing_notes.push(format!("{} data unavailable", tf.label()));
                continue;
            };
            let price = ohlcv
                .get(&tf)
                .and_then(|bars| bars.last())
                .map(|b| b.close)
                .unwrap_or(tf_data.current_price);
            match candidate(tf_data, price, direction, agreement, data) {
                Ok(signal) => {
                    timing_notes.push(format!(
                        "{}: {} setup at {:.2}, R:R {:.2}",
                        tf.label(),
                        if signal.signal_type == SignalType::Buy { "buy" } else { "sell" },
                        signal.entry_price,
                        signal.risk_reward_ratio
                    ));
                    candidates.push(signal);
                }
                Err(reason) => timing_notes.push(format!("{}: {}", tf.label(), reason)),
            }
        }

        candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        let mut candidates = candidates.into_iter();
        let best = candidates.next();
        let alternative_entries: Vec<EntrySignal> = candidates.collect();

        let wait_for = wait_conditions(data, direction, best.as_ref());
        debug!(
            "{}: entry direction {}, {} candidate(s)",
            ticker,
            direction.label(),
            alternative_entries.len() + usize::from(best.is_some())
        );

        match best {
            Some(current_signal) => EntryTiming {
                optimal_entry_tf: Some(current_signal.entry_timeframe),
                current_signal,
                alternative_entries,
                timing_notes,
                wait_for,
            },
            None => EntryTiming {
                optimal_entry_tf: None,
                current_signal: wait_signal(data, ohlcv, direction),
                alternative_entries,
                timing_notes,
                wait_for,
            },
        }
    }
}

/// Weighted vote of the Daily, Weekly and Monthly trends. `Unknown` when none
/// of them is present.
pub fn higher_timeframe_direction(data: &BTreeMap<Timeframe, TimeframeData>) -> TrendDirection {
    let mut present = false;
    let mut up = 0.0;
    let mut down = 0.0;
    for tf in Timeframe::HIGHER {
        let Some(d) = data.get(&tf) else {
            continue;
        };
        present = true;
        match d.trend_direction {
            TrendDirection::Up => up += d.weight,
            TrendDirection::Down => down += d.weight,
            _ => {}
        }
    }

    if !present {
        TrendDirection::Unknown
    } else if up > 0.0 && up > down * VOTE_MARGIN {
        TrendDirection::Up
    } else if down > 0.0 && down > up * VOTE_MARGIN {
        TrendDirection::Down
    } else {
        TrendDirection::Sideways
    }
}

/// Share of present timeframes trending in `direction`.
fn agreement_fraction(data: &BTreeMap<Timeframe, TimeframeData>, direction: TrendDirection) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let agreeing = data
        .values()
        .filter(|d| d.trend_direction == direction)
        .count();
    agreeing as f64 / data.len() as f64
}

fn candidate(
    tf_data: &TimeframeData,
    price: f64,
    direction: TrendDirection,
    agreement: f64,
    data: &BTreeMap<Timeframe, TimeframeData>,
) -> Result<EntrySignal, String> {
    if price <= 0.0 {
        return Err("no price".to_string());
    }

    let (signal_type, level, distance, stop, target) = match direction {
        TrendDirection::Up => {
            let support = tf_data
                .nearest_support
                .filter(|s| *s > 0.0)
                .ok_or("no support level")?;
            let distance = (price - support) / support;
            if !(0.0..=MAX_LEVEL_DISTANCE).contains(&distance) {
                return Err(format!(
                    "price {:.1}% above support {:.2}",
                    distance * 100.0,
                    support
                ));
            }
            let target = tf_data
                .nearest_resistance
                .filter(|r| *r > price)
                .unwrap_or(price * (1.0 + DEFAULT_TARGET_MOVE));
            (SignalType::Buy, support, distance, support * (1.0 - STOP_BUFFER), target)
        }
        TrendDirection::Down => {
            let resistance = tf_data
                .nearest_resistance
                .filter(|r| *r > 0.0)
                .ok_or("no resistance level")?;
            let distance = (resistance - price) / resistance;
            if !(0.0..=MAX_LEVEL_DISTANCE).contains(&distance) {
                return Err(format!(
                    "price {:.1}% below resistance {:.2}",
                    distance * 100.0,
                    resistance
                ));
            }
            let target = tf_data
                .nearest_support
                .filter(|s| *s < price)
                .unwrap_or(price * (1.0 - DEFAULT_TARGET_MOVE));
            (
                SignalType::Sell,
                resistance,
                distance,
                resistance * (1.0 + STOP_BUFFER),
                target,
            )
        }
        _ => return Err("no directional bias".to_string()),
    };

    let risk = (price - stop).abs();
    let reward = (target - price).abs();
    if risk <= 0.0 {
        return Err("zero risk distance".to_string());
    }
    let risk_reward_ratio = reward / risk;
    if risk_reward_ratio < MIN_RISK_REWARD {
        return Err(format!("R:R {:.2} below {:.1}", risk_reward_ratio, MIN_RISK_REWARD));
    }

    let volume_confirmed = tf_data.volume_trend == VolumeTrend::Increasing;
    let mut confidence = 0.5;
    confidence += if distance <= CLOSE_LEVEL_DISTANCE { 0.2 } else { 0.1 };
    if volume_confirmed {
        confidence += 0.15;
    }
    if let Some(rsi) = tf_data.rsi {
        confidence += match signal_type {
            SignalType::Buy if rsi > 70.0 => -0.1,
            SignalType::Buy if rsi < 40.0 => 0.1,
            SignalType::Sell if rsi < 30.0 => -0.1,
            SignalType::Sell if rsi > 60.0 => 0.1,
            _ => 0.0,
        };
    }
    if tf_data.pattern_detected {
        confidence += 0.1;
    }
    confidence += (agreement - 0.5) * 0.2;

    let higher_tf_confirmed = Timeframe::HIGHER
        .iter()
        .filter_map(|tf| data.get(tf))
        .all(|d| d.trend_direction == direction);

    Ok(EntrySignal {
        signal_type,
        confidence: confidence.clamp(0.0, 1.0),
        entry_price: price,
        stop_loss: stop,
        take_profit: target,
        risk_reward_ratio,
        entry_timeframe: tf_data.timeframe,
        entry_reason: format!(
            "{} trend {}, price {:.2}% from {} {:.2}",
            tf_data.label,
            direction.label(),
            distance * 100.0,
            if signal_type == SignalType::Buy { "support" } else { "resistance" },
            level
        ),
        trend_direction: direction,
        higher_tf_confirmed,
        volume_confirmed,
        pattern_confirmed: tf_data.pattern_detected,
    })
}

fn wait_signal(
    data: &BTreeMap<Timeframe, TimeframeData>,
    ohlcv: &BTreeMap<Timeframe, Vec<OhlcPoint>>,
    direction: TrendDirection,
) -> EntrySignal {
    // Lowest present timeframe gives the freshest price.
    let (entry_timeframe, price) = data
        .iter()
        .next_back()
        .map(|(tf, d)| {
            let price = ohlcv
                .get(tf)
                .and_then(|bars| bars.last())
                .map(|b| b.close)
                .unwrap_or(d.current_price);
            (*tf, price)
        })
        .unwrap_or((Timeframe::Day1, 0.0));

    EntrySignal {
        signal_type: SignalType::Wait,
        confidence: 0.0,
        entry_price: price,
        stop_loss: price,
        take_profit: price,
        risk_reward_ratio: 0.0,
        entry_timeframe,
        entry_reason: format!(
            "No qualifying entry; higher timeframes trend {}",
            direction.label()
        ),
        trend_direction: direction,
        higher_tf_confirmed: false,
        volume_confirmed: false,
        pattern_confirmed: false,
    }
}

fn wait_conditions(
    data: &BTreeMap<Timeframe, TimeframeData>,
    direction: TrendDirection,
    best: Option<&EntrySignal>,
) -> Vec<String> {
    let mut wait_for = Vec::new();
    if !direction.is_directional() {
        wait_for.push("Higher-timeframe trend confirmation".to_string());
    }

    let entry_data: Vec<&TimeframeData> = Timeframe::ENTRY
        .iter()
        .filter_map(|tf| data.get(tf))
        .collect();
    let (volume_ok, pattern_ok) = match best {
        Some(signal) => (signal.volume_confirmed, signal.pattern_confirmed),
        None => (
            entry_data
                .iter()
                .any(|d| d.volume_trend == VolumeTrend::Increasing),
            entry_data.iter().any(|d| d.pattern_detected),
        ),
    };
    if !volume_ok {
        wait_for.push("Volume expansion".to_string());
    }
    if !pattern_ok {
        wait_for.push("Pattern confirmation".to_string());
    }

    if best.is_none() {
        for d in &entry_data {
            match direction {
                TrendDirection::Up => wait_for.push(match d.nearest_support {
                    Some(s) => format!("{} pullback toward support {:.2}", d.label, s),
                    None => format!("{} pullback to complete", d.label),
                }),
                TrendDirection::Down => wait_for.push(match d.nearest_resistance {
                    Some(r) => format!("{} rally toward resistance {:.2}", d.label, r),
                    None => format!("{} rally to complete", d.label),
                }),
                _ => {}
            }
        }
    }

    if let Some(rsi) = data.get(&Timeframe::Hour1).and_then(|d| d.rsi) {
        if rsi > 70.0 {
            wait_for.push(format!("1H RSI overbought ({:.0}), wait for it to cool", rsi));
        } else if rsi < 30.0 {
            wait_for.push(format!("1H RSI oversold ({:.0}), wait for a bounce", rsi));
        }
    }
    wait_for
}
