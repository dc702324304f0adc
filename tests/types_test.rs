//! Unit tests for types module

use std::collections::BTreeMap;

use tradelens::types::*;

#[test]
fn test_timeframe_parsing() {
    assert_eq!(Timeframe::from_str("1day"), Some(Timeframe::Day1));
    assert_eq!(Timeframe::from_str("4h"), Some(Timeframe::Hour4));
    assert_eq!(Timeframe::from_str("Weekly"), Some(Timeframe::Week1));
    assert_eq!(Timeframe::from_str("1mo"), Some(Timeframe::Month1));
    assert_eq!(Timeframe::from_str("3day"), None);
}

#[test]
fn test_timeframe_keys_round_trip() {
    for tf in Timeframe::ALL {
        assert_eq!(Timeframe::from_str(tf.key()), Some(tf));
    }
}

#[test]
fn test_timeframe_weights_sum_to_one() {
    let total: f64 = Timeframe::ALL.iter().map(|tf| tf.weight()).sum();
    assert!((total - 1.0).abs() < 1e-9);
}

#[test]
fn test_timeframe_order_highest_first() {
    let mut shuffled = vec![Timeframe::Hour1, Timeframe::Day1, Timeframe::Month1];
    shuffled.sort();
    assert_eq!(
        shuffled,
        vec![Timeframe::Month1, Timeframe::Day1, Timeframe::Hour1]
    );
}

#[test]
fn test_timeframe_map_serializes_as_object() {
    let mut map = BTreeMap::new();
    map.insert(Timeframe::Day1, 1);
    map.insert(Timeframe::Hour4, 2);
    let json = serde_json::to_string(&map).unwrap();
    assert_eq!(json, r#"{"1day":1,"4hour":2}"#);

    let parsed: BTreeMap<Timeframe, i32> = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, map);
}

#[test]
fn test_ohlc_point_geometry() {
    let bar = OhlcPoint {
        time: 0,
        open: 100.0,
        high: 110.0,
        low: 95.0,
        close: 105.0,
        volume: 1_000.0,
    };
    assert_eq!(bar.body(), 5.0);
    assert_eq!(bar.range(), 15.0);
    assert_eq!(bar.upper_shadow(), 5.0);
    assert_eq!(bar.lower_shadow(), 5.0);
    assert!(bar.is_bullish());
    assert!(!bar.is_bearish());
}

#[test]
fn test_ohlc_point_volume_defaults() {
    let bar: OhlcPoint =
        serde_json::from_str(r#"{"time":1,"open":1.0,"high":2.0,"low":0.5,"close":1.5}"#).unwrap();
    assert_eq!(bar.volume, 0.0);
}

#[test]
fn test_score_category_bands() {
    assert_eq!(ScoreCategory::from_score(9.5), ScoreCategory::Excellent);
    assert_eq!(ScoreCategory::from_score(7.5), ScoreCategory::Good);
    assert_eq!(ScoreCategory::from_score(6.0), ScoreCategory::Fair);
    assert_eq!(ScoreCategory::from_score(3.0), ScoreCategory::Poor);
    assert_eq!(ScoreCategory::from_score(2.9), ScoreCategory::VeryPoor);
    assert_eq!(ScoreCategory::VeryPoor.label(), "Very Poor");
}

#[test]
fn test_ordered_enums() {
    assert!(AlertSeverity::Critical > AlertSeverity::High);
    assert!(AlertSeverity::Low > AlertSeverity::Info);
    assert!(TradeRecommendation::StrongBuy > TradeRecommendation::Buy);
    assert!(TradeRecommendation::Sell > TradeRecommendation::StrongSell);
    assert!(DivergenceSeverity::Strong > DivergenceSeverity::Weak);
    assert!(ScoreCategory::Excellent > ScoreCategory::Fair);
}

#[test]
fn test_trend_direction_helpers() {
    assert!(TrendDirection::Up.is_opposite(TrendDirection::Down));
    assert!(!TrendDirection::Up.is_opposite(TrendDirection::Sideways));
    assert!(!TrendDirection::Unknown.is_directional());
    assert_eq!(
        serde_json::to_string(&TrendDirection::Sideways).unwrap(),
        "\"sideways\""
    );
}

#[test]
fn test_pattern_type_metadata() {
    assert_eq!(PatternType::AscendingTriangle.family(), PatternFamily::Triangle);
    assert_eq!(PatternType::AscendingTriangle.bias(), PatternBias::Bullish);
    assert_eq!(PatternType::HeadAndShoulders.bias(), PatternBias::Bearish);
    assert_eq!(PatternType::Abcd.name(), "AB=CD");
    assert_eq!(
        serde_json::to_string(&PatternType::InverseCupAndHandle).unwrap(),
        "\"inverse_cup_and_handle\""
    );
}

#[test]
fn test_pattern_builder() {
    let pattern = Pattern::new(
        PatternType::DoubleBottom,
        130.0,
        10,
        40,
        Timeframe::Day1,
        "two lows",
    )
    .with_target(120.0)
    .with_stop(95.0);

    assert_eq!(pattern.confidence, 100.0);
    assert_eq!(pattern.strength, PatternStrength::VeryStrong);
    assert_eq!(pattern.bias, PatternBias::Bullish);
    assert_eq!(pattern.target_price, Some(120.0));
    assert_eq!(pattern.stop_loss, Some(95.0));
    assert_eq!(pattern.family(), PatternFamily::DoubleTopBottom);
}

#[test]
fn test_timeframe_data_unknown() {
    let data = TimeframeData::unknown(Timeframe::Hour4, 12, 101.5);
    assert_eq!(data.trend_direction, TrendDirection::Unknown);
    assert_eq!(data.weight, 0.15);
    assert_eq!(data.label, "4H");
    assert!(data.rsi.is_none() && data.sma_50.is_none());
}

#[test]
fn test_swing_direction_parsing() {
    assert_eq!(SwingDirection::from_str("UP"), Some(SwingDirection::Uptrend));
    assert_eq!(
        SwingDirection::from_str("downtrend"),
        Some(SwingDirection::Downtrend)
    );
    assert_eq!(SwingDirection::from_str("flat"), None);
}
