use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One daily close for a ticker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceSample {
    pub date: NaiveDate,
    pub close: f64,
}

impl PriceSample {
    pub fn new(date: NaiveDate, close: f64) -> Self {
        Self { date, close }
    }
}

/// Persisted per-ticker indicator snapshot. Each run appends a new one;
/// existing snapshots are never modified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorState {
    pub ticker: String,
    pub as_of: NaiveDate,
    pub close_price: f64,
    pub ema_fast: f64,
    pub ema_slow: f64,
    pub macd: f64,
    pub signal: f64,
    pub histogram: f64,
    pub rsi14: f64,
}

impl IndicatorState {
    /// Copy with every indicator field rounded to `places` decimals. The close
    /// price is kept as reported by the market data provider.
    pub fn rounded(&self, places: u32) -> Self {
        use crate::utils::round_to;
        Self {
            ticker: self.ticker.clone(),
            as_of: self.as_of,
            close_price: self.close_price,
            ema_fast: round_to(self.ema_fast, places),
            ema_slow: round_to(self.ema_slow, places),
            macd: round_to(self.macd, places),
            signal: round_to(self.signal, places),
            histogram: round_to(self.histogram, places),
            rsi14: round_to(self.rsi14, places),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertKind {
    RsiOverbought,
    RsiOversold,
    MacdBullishCross,
    MacdBearishCross,
}

impl AlertKind {
    pub fn description(&self) -> &'static str {
        match self {
            AlertKind::RsiOverbought => "RSI is above 70",
            AlertKind::RsiOversold => "RSI is below 30",
            AlertKind::MacdBullishCross => "Histogram changed from negative to positive",
            AlertKind::MacdBearishCross => "Histogram changed from positive to negative",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub ticker: String,
    pub kind: AlertKind,
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.ticker, self.kind.description())
    }
}
