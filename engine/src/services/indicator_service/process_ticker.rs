// Fetch -> load prior -> compute -> append -> evaluate for a single ticker
use chrono::{Duration, NaiveDate};
use std::collections::HashSet;
use tracing::{debug, info};

use super::TickerOutcome;
use crate::alerts;
use crate::data::state_store::PERSISTED_DECIMALS;
use crate::data::{MarketDataProvider, StateStore};
use crate::error::{EngineError, Result};
use crate::indicators::{Observation, TickerPhase};

pub async fn handle_process_ticker(
    ticker: &str,
    today: NaiveDate,
    history_days: i64,
    provider: &dyn MarketDataProvider,
    store: &mut dyn StateStore,
    alert_tickers: &HashSet<String>,
) -> Result<TickerOutcome> {
    let from = Duration::try_days(history_days)
        .and_then(|window| today.checked_sub_signed(window))
        .ok_or_else(|| {
            EngineError::ConfigError(format!("history window of {} days before {} is out of range", history_days, today))
        })?;
    let close = provider.current_price(ticker).await?;
    let history = provider.history(ticker, from, today).await?;
    debug!(ticker, close, samples = history.len(), %from, %today, "fetched market data");

    let phase = TickerPhase::from_latest(store.latest_state(ticker)?);
    // Nothing is written unless the whole state could be computed.
    let state = phase
        .next_state(ticker, Observation::new(today, close), &history)?
        .rounded(PERSISTED_DECIMALS);
    store.append_state(&state)?;

    let alerts = if phase.evaluates_alerts() && alert_tickers.contains(ticker) {
        alerts::evaluate(&store.last_two_states(ticker)?)
    } else {
        Vec::new()
    };

    match phase {
        TickerPhase::NoPriorState => {
            info!(ticker, ema_fast = state.ema_fast, ema_slow = state.ema_slow, rsi14 = state.rsi14, "bootstrapped ticker");
            Ok(TickerOutcome::Bootstrapped(state))
        }
        TickerPhase::HasPriorState(_) => {
            info!(
                ticker,
                macd = state.macd,
                signal = state.signal,
                histogram = state.histogram,
                rsi14 = state.rsi14,
                alerts = alerts.len(),
                "advanced ticker"
            );
            Ok(TickerOutcome::Advanced { state, alerts })
        }
    }
}
