// Builds the collaborators named in the settings and runs one daily batch

use chrono::NaiveDate;
use tracing::{info, warn};

use super::indicator_service::{IndicatorService, RunReport};
use crate::config::settings::{MarketDataSettings, MarketDataSource, NotificationSettings, Settings};
use crate::data::csv_parser::load_ticker_list;
use crate::data::{CsvHistoryProvider, MarketDataProvider, SqliteStateStore, YahooChartProvider};
use crate::error::Result;
use crate::notify::{LogNotifier, Notifier, WebhookNotifier};

pub fn build_provider(settings: &MarketDataSettings) -> Result<Box<dyn MarketDataProvider>> {
    let provider: Box<dyn MarketDataProvider> = match &settings.source {
        MarketDataSource::Yahoo { endpoint } => Box::new(YahooChartProvider::new(endpoint.clone())?),
        MarketDataSource::Csv { directory } => Box::new(CsvHistoryProvider::new(directory.clone())),
    };
    Ok(provider)
}

pub fn build_notifier(settings: &NotificationSettings) -> Box<dyn Notifier> {
    match &settings.webhook_url {
        Some(url) => Box::new(WebhookNotifier::new(url.clone(), settings.recipient.clone())),
        None => Box::new(LogNotifier::new(settings.recipient.clone())),
    }
}

/// Runs the job for `today`. Returns `None` when the run gate says the market
/// has not traded today.
pub async fn run_job(settings: &Settings, today: NaiveDate) -> Result<Option<RunReport>> {
    let provider = build_provider(&settings.market_data)?;
    let notifier = build_notifier(&settings.notification);

    let tickers = load_ticker_list(&settings.ticker_list)?;
    let alert_tickers = load_ticker_list(&settings.alert_ticker_list)?;
    info!(tickers = tickers.len(), alert_tickers = alert_tickers.len(), "loaded ticker lists");

    let store = SqliteStateStore::open(&settings.database_path)?;
    let mut service = IndicatorService::new(provider, Box::new(store), alert_tickers, settings.market_data.history_days);

    if settings.run_gate.enabled && !service.is_trading_day(&settings.run_gate.reference_ticker, today).await? {
        warn!(%today, reference = %settings.run_gate.reference_ticker, "no trading session today, skipping run");
        return Ok(None);
    }

    let report = service.run_batch(&tickers, today).await;
    match report.summary() {
        Some(summary) => notifier.send(&summary).await?,
        None => info!("no alerts triggered"),
    }
    Ok(Some(report))
}
