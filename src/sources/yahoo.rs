//! Yahoo Finance chart API client.
//!
//! Uses the unofficial v8 chart endpoint. Four-hour bars are not offered by
//! Yahoo, so they are built from hourly bars.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::error::{AppError, Result};
use crate::services::market_data::{normalize_ticker, resample, MarketDataSource};
use crate::types::{OhlcPoint, Timeframe};

const BASE_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<Quote>,
}

#[derive(Debug, Default, Deserialize)]
struct Quote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

/// Yahoo `(range, interval)` for each timeframe.
fn range_and_interval(timeframe: Timeframe) -> (&'static str, &'static str) {
    match timeframe {
        Timeframe::Month1 => ("10y", "1mo"),
        Timeframe::Week1 => ("5y", "1wk"),
        Timeframe::Day1 => ("2y", "1d"),
        Timeframe::Hour4 => ("6mo", "1h"),
        Timeframe::Hour1 => ("1mo", "1h"),
    }
}

pub struct YahooFinanceClient {
    client: Client,
}

impl YahooFinanceClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()?;
        Ok(Self { client })
    }

    /// Raw chart bars for a Yahoo `range` and `interval`.
    pub async fn get_historical_data(
        &self,
        ticker: &str,
        range: &str,
        interval: &str,
    ) -> Result<Vec<OhlcPoint>> {
        let url = format!(
            "{}/{}?range={}&interval={}&includePrePost=false",
            BASE_URL,
            normalize_ticker(ticker),
            range,
            interval
        );
        debug!("Fetching Yahoo Finance data: {}", url);

        let response = self.client.get(&url).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(format!("Unknown ticker {}", ticker)));
        }
        if !response.status().is_success() {
            return Err(AppError::ExternalApi(format!(
                "Yahoo Finance returned {}",
                response.status()
            )));
        }

        let body: ChartResponse = response.json().await?;
        parse_chart(body)
    }
}

#[async_trait]
impl MarketDataSource for YahooFinanceClient {
    fn name(&self) -> &str {
        "yahoo"
    }

    async fn fetch_ohlcv(&self, ticker: &str, timeframe: Timeframe) -> Result<Vec<OhlcPoint>> {
        let (range, interval) = range_and_interval(timeframe);
        let bars = self.get_historical_data(ticker, range, interval).await?;
        Ok(match timeframe {
            Timeframe::Hour4 => resample(&bars, Timeframe::Hour4.bar_millis()),
            _ => bars,
        })
    }
}

fn parse_chart(body: ChartResponse) -> Result<Vec<OhlcPoint>> {
    if let Some(error) = body.chart.error {
        return Err(AppError::ExternalApi(format!(
            "Yahoo Finance error: {} - {}",
            error.code, error.description
        )));
    }

    let result = body
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| AppError::ExternalApi("Empty chart result".to_string()))?;
    let timestamps = result.timestamp.unwrap_or_default();
    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();

    let value = |column: &[Option<f64>], i: usize| column.get(i).copied().flatten();
    let bars = timestamps
        .iter()
        .enumerate()
        .filter_map(|(i, &ts)| {
            // Yahoo pads sessions without trades with nulls.
            let close = value(&quote.close, i).filter(|c| *c > 0.0)?;
            Some(OhlcPoint {
                time: ts * 1000,
                open: value(&quote.open, i).unwrap_or(close),
                high: value(&quote.high, i).unwrap_or(close),
                low: value(&quote.low, i).unwrap_or(close),
                close,
                volume: value(&quote.volume, i).unwrap_or(0.0),
            })
        })
        .collect();
    Ok(bars)
}
