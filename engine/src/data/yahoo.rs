// HTTP market data provider backed by the Yahoo Finance chart endpoint
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::Deserialize;
use shared::models::PriceSample;
use tracing::{debug, warn};

use super::market_data::{validate_history, validate_price, MarketDataProvider};
use crate::error::{EngineError, Result};

const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
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
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    #[serde(default)]
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    regular_market_price: Option<f64>,
    regular_market_time: Option<i64>,
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Default, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<Quote>,
}

#[derive(Debug, Default, Deserialize)]
struct Quote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

pub struct YahooChartProvider {
    base_url: String,
    client: reqwest::Client,
}

impl YahooChartProvider {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("tickwatch/", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self::with_client(base_url, client))
    }

    pub fn with_client(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    async fn fetch_chart(&self, ticker: &str, query: &[(&str, String)]) -> Result<ChartResult> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, ticker);
        debug!(ticker, %url, "requesting chart");
        let envelope: ChartEnvelope = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(err) = envelope.chart.error {
            return Err(EngineError::DataProviderError(format!(
                "{}: {} ({})",
                ticker, err.description, err.code
            )));
        }
        envelope
            .chart
            .result
            .and_then(|results| results.into_iter().next())
            .ok_or_else(|| EngineError::DataProviderError(format!("{}: empty chart result", ticker)))
    }

    async fn fetch_meta(&self, ticker: &str) -> Result<ChartMeta> {
        let query = [("range", "1d".to_string()), ("interval", "1d".to_string())];
        Ok(self.fetch_chart(ticker, &query).await?.meta)
    }
}

fn local_date(epoch_secs: i64, gmtoffset: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp(epoch_secs + gmtoffset, 0).map(|dt| dt.date_naive())
}

fn midnight_utc(date: NaiveDate) -> i64 {
    DateTime::<Utc>::from_naive_utc_and_offset(date.and_time(NaiveTime::default()), Utc).timestamp()
}

fn samples_from_chart(ticker: &str, chart: ChartResult) -> Result<Vec<PriceSample>> {
    let closes = chart.indicators.quote.into_iter().next().map(|q| q.close).unwrap_or_default();
    if closes.len() != chart.timestamp.len() {
        return Err(EngineError::DataProviderError(format!(
            "{}: {} timestamps but {} closes",
            ticker,
            chart.timestamp.len(),
            closes.len()
        )));
    }

    let mut samples = Vec::with_capacity(closes.len());
    for (ts, close) in chart.timestamp.into_iter().zip(closes) {
        let Some(close) = close else {
            // Yahoo reports halted sessions as null closes
            warn!(ticker, ts, "skipping null close");
            continue;
        };
        let date = local_date(ts, chart.meta.gmtoffset)
            .ok_or_else(|| EngineError::DataProviderError(format!("{}: bad timestamp {}", ticker, ts)))?;
        samples.push(PriceSample::new(date, close));
    }
    validate_history(ticker, samples)
}

#[async_trait]
impl MarketDataProvider for YahooChartProvider {
    async fn current_price(&self, ticker: &str) -> Result<f64> {
        let price = self
            .fetch_meta(ticker)
            .await?
            .regular_market_price
            .ok_or_else(|| EngineError::DataProviderError(format!("{}: no market price", ticker)))?;
        validate_price(ticker, price)
    }

    async fn history(&self, ticker: &str, from: NaiveDate, to: NaiveDate) -> Result<Vec<PriceSample>> {
        let query = [
            ("period1", midnight_utc(from).to_string()),
            ("period2", midnight_utc(to + Duration::days(1)).to_string()),
            ("interval", "1d".to_string()),
        ];
        let chart = self.fetch_chart(ticker, &query).await?;
        samples_from_chart(ticker, chart)
    }

    async fn latest_trade_date(&self, ticker: &str) -> Result<NaiveDate> {
        let meta = self.fetch_meta(ticker).await?;
        meta.regular_market_time
            .and_then(|ts| local_date(ts, meta.gmtoffset))
            .ok_or_else(|| EngineError::DataProviderError(format!("{}: no market time", ticker)))
    }
}
