// Market data provider contract plus an in-memory and a CSV-directory provider
use async_trait::async_trait;
use chrono::NaiveDate;
use shared::models::PriceSample;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::debug;

use super::csv_parser::PriceCsvParser;
use crate::error::{EngineError, Result};

#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Latest traded price for `ticker`.
    async fn current_price(&self, ticker: &str) -> Result<f64>;

    /// Daily closes between `from` and `to` inclusive, in any order.
    async fn history(&self, ticker: &str, from: NaiveDate, to: NaiveDate) -> Result<Vec<PriceSample>>;

    /// Date of the most recent trade for `ticker`.
    async fn latest_trade_date(&self, ticker: &str) -> Result<NaiveDate>;
}

/// Rejects prices the engine cannot work with.
pub fn validate_price(ticker: &str, price: f64) -> Result<f64> {
    if price.is_finite() && price > 0.0 {
        Ok(price)
    } else {
        Err(EngineError::DataProviderError(format!("malformed price {} for {}", price, ticker)))
    }
}

pub fn validate_history(ticker: &str, samples: Vec<PriceSample>) -> Result<Vec<PriceSample>> {
    for sample in &samples {
        validate_price(ticker, sample.close)?;
    }
    Ok(samples)
}

fn latest_sample(ticker: &str, samples: &[PriceSample]) -> Result<PriceSample> {
    samples
        .iter()
        .max_by_key(|s| s.date)
        .copied()
        .ok_or_else(|| EngineError::DataProviderError(format!("no price data for {}", ticker)))
}

fn within(samples: &[PriceSample], from: NaiveDate, to: NaiveDate) -> Vec<PriceSample> {
    samples.iter().filter(|s| s.date >= from && s.date <= to).copied().collect()
}

/// Daily closes held in memory, keyed by ticker.
pub struct MarketDataStore {
    data: HashMap<String, Vec<PriceSample>>,
}

impl MarketDataStore {
    pub fn new() -> Self {
        MarketDataStore { data: HashMap::new() }
    }

    pub fn add_samples(&mut self, ticker: &str, new_samples: Vec<PriceSample>) {
        let series = self.data.entry(ticker.to_string()).or_default();
        series.extend(new_samples);
        series.sort_by_key(|s| s.date);
        series.dedup_by_key(|s| s.date);
    }

    fn series(&self, ticker: &str) -> Result<&[PriceSample]> {
        self.data
            .get(ticker)
            .map(Vec::as_slice)
            .ok_or_else(|| EngineError::DataProviderError(format!("unknown ticker {}", ticker)))
    }
}

impl Default for MarketDataStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MarketDataProvider for MarketDataStore {
    async fn current_price(&self, ticker: &str) -> Result<f64> {
        let latest = latest_sample(ticker, self.series(ticker)?)?;
        validate_price(ticker, latest.close)
    }

    async fn history(&self, ticker: &str, from: NaiveDate, to: NaiveDate) -> Result<Vec<PriceSample>> {
        validate_history(ticker, within(self.series(ticker)?, from, to))
    }

    async fn latest_trade_date(&self, ticker: &str) -> Result<NaiveDate> {
        Ok(latest_sample(ticker, self.series(ticker)?)?.date)
    }
}

/// Offline provider reading `{directory}/{TICKER}.csv` on every call.
pub struct CsvHistoryProvider {
    directory: PathBuf,
}

impl CsvHistoryProvider {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self { directory: directory.into() }
    }

    fn load(&self, ticker: &str) -> Result<Vec<PriceSample>> {
        let path = self.directory.join(format!("{}.csv", ticker));
        debug!(ticker, path = %path.display(), "loading price history from CSV");
        PriceCsvParser::load_price_history(&path)
            .map_err(|e| EngineError::DataProviderError(format!("{}: {}", ticker, e)))
    }
}

#[async_trait]
impl MarketDataProvider for CsvHistoryProvider {
    async fn current_price(&self, ticker: &str) -> Result<f64> {
        let latest = latest_sample(ticker, &self.load(ticker)?)?;
        validate_price(ticker, latest.close)
    }

    async fn history(&self, ticker: &str, from: NaiveDate, to: NaiveDate) -> Result<Vec<PriceSample>> {
        validate_history(ticker, within(&self.load(ticker)?, from, to))
    }

    async fn latest_trade_date(&self, ticker: &str) -> Result<NaiveDate> {
        Ok(latest_sample(ticker, &self.load(ticker)?)?.date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[tokio::test]
    async fn test_store_sorts_and_dedups() {
        let mut store = MarketDataStore::new();
        store.add_samples("AAPL", vec![PriceSample::new(day(3), 3.0), PriceSample::new(day(1), 1.0)]);
        store.add_samples("AAPL", vec![PriceSample::new(day(2), 2.0), PriceSample::new(day(3), 3.5)]);

        let history = store.history("AAPL", day(1), day(31)).await.unwrap();
        assert_eq!(history.iter().map(|s| s.date).collect::<Vec<_>>(), vec![day(1), day(2), day(3)]);
        assert_eq!(store.current_price("AAPL").await.unwrap(), 3.0);
        assert_eq!(store.latest_trade_date("AAPL").await.unwrap(), day(3));
    }

    #[tokio::test]
    async fn test_store_history_window_is_inclusive() {
        let mut store = MarketDataStore::new();
        store.add_samples("AAPL", (1..=10).map(|d| PriceSample::new(day(d), d as f64)).collect());
        let history = store.history("AAPL", day(3), day(5)).await.unwrap();
        assert_eq!(history.len(), 3);
    }

    #[tokio::test]
    async fn test_unknown_ticker_is_provider_error() {
        let store = MarketDataStore::new();
        let err = store.current_price("NOPE").await.unwrap_err();
        assert!(matches!(err, EngineError::DataProviderError(_)));
    }

    #[tokio::test]
    async fn test_non_positive_close_is_malformed() {
        let mut store = MarketDataStore::new();
        store.add_samples("BAD", vec![PriceSample::new(day(1), 10.0), PriceSample::new(day(2), 0.0)]);
        assert!(store.current_price("BAD").await.is_err());
        assert!(store.history("BAD", day(1), day(2)).await.is_err());
    }

    #[tokio::test]
    async fn test_csv_provider_reads_ticker_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("MSFT.csv"), "Date,Close\n2024-03-27,421.43\n2024-03-28,420.72\n").unwrap();
        let provider = CsvHistoryProvider::new(dir.path());

        assert_eq!(provider.current_price("MSFT").await.unwrap(), 420.72);
        assert_eq!(provider.latest_trade_date("MSFT").await.unwrap(), day(28));
        assert_eq!(provider.history("MSFT", day(28), day(28)).await.unwrap().len(), 1);
        assert!(matches!(
            provider.current_price("IBM").await.unwrap_err(),
            EngineError::DataProviderError(_)
        ));
    }
}
