pub mod cache;
pub mod fibonacci;
pub mod indicators;
pub mod market_data;
pub mod mtf;
pub mod patterns;
pub mod trendlines;

pub use cache::Cache;
pub use fibonacci::FibonacciCalculator;
pub use market_data::{normalize_ticker, resample, MarketDataService, MarketDataSource};
pub use mtf::{
    ComprehensiveMtfService, MtfAlertSystem, MtfAnalyzer, MtfEntryTimingOptimizer,
    MtfScoringEngine,
};
pub use patterns::AdvancedPatternDetector;
pub use trendlines::TrendlineDetector;
