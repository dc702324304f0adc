//! Technical indicator toolkit.
//!
//! Pure functions over close/high/low series shared by the pattern, level
//! and multi-timeframe analyzers.

pub mod extrema;
pub mod macd;
pub mod moving_average;
pub mod regression;
pub mod rsi;

pub use extrema::{local_maxima, local_minima};
pub use macd::{macd, macd_with, MacdValue};
pub use moving_average::{ema_series, mean, sma, std_dev};
pub use regression::{
    fit_points, linear_regression, linear_regression_indexed, quadratic_regression, LinearFit,
    QuadraticFit,
};
pub use rsi::{rsi, rsi_series};
