//! tradelens - multi-timeframe technical analysis and chart pattern detection

pub mod config;
pub mod error;
pub mod services;
pub mod sources;
pub mod types;

// Re-export commonly used types
pub use config::{Config, PatternConfig, TrendlineConfig, WinRateTable};
pub use error::{AppError, Result};
pub use services::{
    AdvancedPatternDetector, ComprehensiveMtfService, FibonacciCalculator, MarketDataService,
    MarketDataSource, MtfAnalyzer, MtfEntryTimingOptimizer, MtfScoringEngine, TrendlineDetector,
};
pub use types::*;
