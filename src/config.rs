use std::collections::HashMap;
use std::env;

use crate::types::PatternFamily;

/// Historical win rate (percent) reported alongside each pattern family.
///
/// The defaults are uncalibrated literature figures; deployments that have
/// their own backtest statistics should override them.
#[derive(Debug, Clone, PartialEq)]
pub struct WinRateTable {
    rates: HashMap<PatternFamily, f64>,
}

impl Default for WinRateTable {
    fn default() -> Self {
        let rates = HashMap::from([
            (PatternFamily::Triangle, 75.0),
            (PatternFamily::FlagPennant, 68.0),
            (PatternFamily::HeadAndShoulders, 83.0),
            (PatternFamily::DoubleTopBottom, 72.0),
            (PatternFamily::TripleTopBottom, 78.0),
            (PatternFamily::CupAndHandle, 68.0),
            (PatternFamily::Wedge, 70.0),
            (PatternFamily::Rounding, 66.0),
            (PatternFamily::Rectangle, 64.0),
            (PatternFamily::Diamond, 69.0),
            (PatternFamily::Gap, 60.0),
            (PatternFamily::Candlestick, 58.0),
            (PatternFamily::Harmonic, 70.0),
        ]);
        Self { rates }
    }
}

impl WinRateTable {
    pub fn get(&self, family: PatternFamily) -> Option<f64> {
        self.rates.get(&family).copied()
    }

    pub fn set(&mut self, family: PatternFamily, win_rate_pct: f64) {
        self.rates.insert(family, win_rate_pct.clamp(0.0, 100.0));
    }
}

/// Pattern detector settings.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternConfig {
    /// Patterns below this confidence (0-100) are dropped.
    pub min_confidence: f64,
    pub win_rates: WinRateTable,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            min_confidence: 60.0,
            win_rates: WinRateTable::default(),
        }
    }
}

/// Trendline detector settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendlineConfig {
    pub min_touches: usize,
    /// Minimum absolute correlation of the fit.
    pub min_r_squared: f64,
    /// Relative distance that still counts as a touch (0.02 = 2%).
    pub tolerance: f64,
}

impl Default for TrendlineConfig {
    fn default() -> Self {
        Self {
            min_touches: 3,
            min_r_squared: 0.7,
            tolerance: 0.02,
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host address.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Timeout for market-data HTTP requests.
    pub market_data_timeout_secs: u64,
    /// How long fetched series stay cached.
    pub market_data_cache_ttl_secs: u64,
    /// Default bar lookback for trendline and Fibonacci detection.
    pub default_lookback: usize,
    pub patterns: PatternConfig,
    pub trendlines: TrendlineConfig,
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let pattern_defaults = PatternConfig::default();
        let trendline_defaults = TrendlineConfig::default();

        Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env_parse("PORT", 8000),
            market_data_timeout_secs: env_parse("MARKET_DATA_TIMEOUT_SECS", 30),
            market_data_cache_ttl_secs: env_parse("MARKET_DATA_CACHE_TTL_SECS", 300),
            default_lookback: env_parse("DEFAULT_LOOKBACK", 100),
            patterns: PatternConfig {
                min_confidence: env_parse(
                    "PATTERN_MIN_CONFIDENCE",
                    pattern_defaults.min_confidence,
                ),
                win_rates: pattern_defaults.win_rates,
            },
            trendlines: TrendlineConfig {
                min_touches: env_parse("TRENDLINE_MIN_TOUCHES", trendline_defaults.min_touches),
                min_r_squared: env_parse(
                    "TRENDLINE_MIN_R_SQUARED",
                    trendline_defaults.min_r_squared,
                ),
                tolerance: env_parse("TRENDLINE_TOLERANCE", trendline_defaults.tolerance),
            },
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_config_defaults() {
        let config = PatternConfig::default();
        assert_eq!(config.min_confidence, 60.0);
        assert_eq!(config.win_rates.get(PatternFamily::HeadAndShoulders), Some(83.0));
    }

    #[test]
    fn test_trendline_config_defaults() {
        let config = TrendlineConfig::default();
        assert_eq!(config.min_touches, 3);
        assert_eq!(config.min_r_squared, 0.7);
        assert_eq!(config.tolerance, 0.02);
    }

    #[test]
    fn test_win_rate_override_is_clamped() {
        let mut table = WinRateTable::default();
        table.set(PatternFamily::Gap, 140.0);
        assert_eq!(table.get(PatternFamily::Gap), Some(100.0));
        table.set(PatternFamily::Gap, 55.0);
        assert_eq!(table.get(PatternFamily::Gap), Some(55.0));
    }

    #[test]
    fn test_every_family_has_a_default_rate() {
        let table = WinRateTable::default();
        for family in [
            PatternFamily::Triangle,
            PatternFamily::FlagPennant,
            PatternFamily::HeadAndShoulders,
            PatternFamily::DoubleTopBottom,
            PatternFamily::TripleTopBottom,
            PatternFamily::CupAndHandle,
            PatternFamily::Wedge,
            PatternFamily::Rounding,
            PatternFamily::Rectangle,
            PatternFamily::Diamond,
            PatternFamily::Gap,
            PatternFamily::Candlestick,
            PatternFamily::Harmonic,
        ] {
            assert!(table.get(family).is_some(), "missing rate for {:?}", family);
        }
    }

    #[test]
    fn test_env_parse_falls_back_on_garbage() {
        assert_eq!(env_parse("TRADELENS_TEST_UNSET_VARIABLE", 42usize), 42);
    }
}
