// Per-ticker indicator updates for a batch of tickers.
// Submodules hold the individual steps; IndicatorService owns the collaborators.
use chrono::NaiveDate;
use shared::models::{Alert, AlertKind, IndicatorState};
use std::collections::HashSet;
use tracing::{error, info, warn};

use crate::alerts;
use crate::data::{MarketDataProvider, StateStore};
use crate::error::{EngineError, Result};

pub mod process_ticker;
pub mod run_gate;

#[derive(Debug, Clone, PartialEq)]
pub enum TickerOutcome {
    /// First observation for the ticker; alerts are never evaluated.
    Bootstrapped(IndicatorState),
    Advanced {
        state: IndicatorState,
        alerts: Vec<AlertKind>,
    },
}

impl TickerOutcome {
    pub fn state(&self) -> &IndicatorState {
        match self {
            TickerOutcome::Bootstrapped(state) => state,
            TickerOutcome::Advanced { state, .. } => state,
        }
    }
}

#[derive(Debug, Default)]
pub struct RunReport {
    pub outcomes: Vec<(String, TickerOutcome)>,
    pub failures: Vec<(String, EngineError)>,
}

impl RunReport {
    pub fn alerts(&self) -> Vec<Alert> {
        self.outcomes
            .iter()
            .filter_map(|(ticker, outcome)| match outcome {
                TickerOutcome::Advanced { alerts, .. } => Some(alerts.iter().map(move |kind| Alert {
                    ticker: ticker.clone(),
                    kind: *kind,
                })),
                TickerOutcome::Bootstrapped(_) => None,
            })
            .flatten()
            .collect()
    }

    pub fn summary(&self) -> Option<String> {
        alerts::build_summary(&self.alerts())
    }
}

pub struct IndicatorService {
    provider: Box<dyn MarketDataProvider>,
    store: Box<dyn StateStore>,
    alert_tickers: HashSet<String>,
    history_days: i64,
}

impl IndicatorService {
    pub fn new(
        provider: Box<dyn MarketDataProvider>,
        store: Box<dyn StateStore>,
        alert_tickers: impl IntoIterator<Item = String>,
        history_days: i64,
    ) -> Self {
        IndicatorService {
            provider,
            store,
            alert_tickers: alert_tickers.into_iter().collect(),
            history_days,
        }
    }

    pub fn store(&self) -> &dyn StateStore {
        self.store.as_ref()
    }

    pub async fn is_trading_day(&self, reference_ticker: &str, today: NaiveDate) -> Result<bool> {
        run_gate::handle_run_gate(self.provider.as_ref(), reference_ticker, today).await
    }

    pub async fn process_ticker(&mut self, ticker: &str, today: NaiveDate) -> Result<TickerOutcome> {
        process_ticker::handle_process_ticker(
            ticker,
            today,
            self.history_days,
            self.provider.as_ref(),
            self.store.as_mut(),
            &self.alert_tickers,
        )
        .await
    }

    /// Processes tickers one after another. A failing ticker is recorded in the
    /// report and the batch moves on, unless the error is fatal for the batch.
    pub async fn run_batch(&mut self, tickers: &[String], today: NaiveDate) -> RunReport {
        let mut report = RunReport::default();
        for ticker in tickers {
            match self.process_ticker(ticker, today).await {
                Ok(outcome) => report.outcomes.push((ticker.clone(), outcome)),
                Err(e @ EngineError::InsufficientHistory { .. }) => {
                    warn!(ticker = %ticker, error = %e, "skipping ticker");
                    report.failures.push((ticker.clone(), e));
                }
                Err(e) if e.is_fatal_for_batch() => {
                    error!(ticker = %ticker, error = ?e, "aborting batch");
                    report.failures.push((ticker.clone(), e));
                    break;
                }
                Err(e) => {
                    error!(ticker = %ticker, error = ?e, "failed to process ticker");
                    report.failures.push((ticker.clone(), e));
                }
            }
        }
        info!(
            processed = report.outcomes.len(),
            failed = report.failures.len(),
            "batch finished"
        );
        report
    }
}
