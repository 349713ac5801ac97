// Incremental MACD/RSI engine: bootstrap seeds a new ticker, advance steps from the stored state

use chrono::NaiveDate;
use shared::models::{IndicatorState, PriceSample};
use tracing::debug;

use super::rsi::{compute_rsi, RSI_PERIOD};
use super::{closes_most_recent_first, Ema, Sma, WindowIndicator};
use crate::error::{EngineError, Result};

pub const FAST_PERIOD: usize = 12;
pub const SLOW_PERIOD: usize = 26;
// 2 / (9 + 1): the signal line smooths with 2/10
pub const SIGNAL_PERIOD: usize = 9;

/// Samples required to seed a ticker: the slow window plus today's close.
pub const BOOTSTRAP_MIN_SAMPLES: usize = SLOW_PERIOD + 1;
/// Samples required for one incremental step (the RSI window).
pub const ADVANCE_MIN_SAMPLES: usize = RSI_PERIOD + 1;

/// The close being folded into a ticker's indicators.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub as_of: NaiveDate,
    pub close: f64,
}

impl Observation {
    pub fn new(as_of: NaiveDate, close: f64) -> Self {
        Self { as_of, close }
    }
}

/// Seeds a ticker with no stored state.
///
/// The fast and slow EMAs start as the means of the 12 and 26 closes before
/// the most recent sample. MACD, signal and histogram start at zero.
pub fn bootstrap(ticker: &str, observation: Observation, history: &[PriceSample]) -> Result<IndicatorState> {
    let closes = closes_most_recent_first(history);
    if closes.len() < BOOTSTRAP_MIN_SAMPLES {
        return Err(EngineError::InsufficientHistory {
            required: BOOTSTRAP_MIN_SAMPLES,
            available: closes.len(),
        });
    }

    let ema_fast = Sma::new(FAST_PERIOD).calculate(&closes[1..])?;
    let ema_slow = Sma::new(SLOW_PERIOD).calculate(&closes[1..])?;
    let rsi14 = compute_rsi(history)?;

    debug!(ticker, ema_fast, ema_slow, rsi14, "bootstrapped indicator state");

    Ok(IndicatorState {
        ticker: ticker.to_string(),
        as_of: observation.as_of,
        close_price: observation.close,
        ema_fast,
        ema_slow,
        macd: 0.0,
        signal: 0.0,
        histogram: 0.0,
        rsi14,
    })
}

/// One incremental step from `prior`. `prior` is left untouched.
pub fn advance(prior: &IndicatorState, observation: Observation, history: &[PriceSample]) -> Result<IndicatorState> {
    let available = closes_most_recent_first(history).len();
    if available < ADVANCE_MIN_SAMPLES {
        return Err(EngineError::InsufficientHistory {
            required: ADVANCE_MIN_SAMPLES,
            available,
        });
    }

    let close = observation.close;
    let ema_fast = Ema::new(FAST_PERIOD).next(close, prior.ema_fast);
    let ema_slow = Ema::new(SLOW_PERIOD).next(close, prior.ema_slow);
    let macd = ema_fast - ema_slow;
    let signal = Ema::new(SIGNAL_PERIOD).next(macd, prior.signal);
    let histogram = macd - signal;
    let rsi14 = compute_rsi(history)?;

    debug!(ticker = %prior.ticker, ema_fast, ema_slow, macd, signal, histogram, rsi14, "advanced indicator state");

    Ok(IndicatorState {
        ticker: prior.ticker.clone(),
        as_of: observation.as_of,
        close_price: close,
        ema_fast,
        ema_slow,
        macd,
        signal,
        histogram,
        rsi14,
    })
}

/// Where a ticker stands before today's observation.
#[derive(Debug, Clone, PartialEq)]
pub enum TickerPhase {
    /// Never seen: the next state is bootstrapped and no alerts are evaluated.
    NoPriorState,
    /// Has a persisted state: the next state advances from it and alerts are evaluated.
    HasPriorState(IndicatorState),
}

impl TickerPhase {
    pub fn from_latest(latest: Option<IndicatorState>) -> Self {
        match latest {
            Some(state) => TickerPhase::HasPriorState(state),
            None => TickerPhase::NoPriorState,
        }
    }

    pub fn next_state(&self, ticker: &str, observation: Observation, history: &[PriceSample]) -> Result<IndicatorState> {
        match self {
            TickerPhase::NoPriorState => bootstrap(ticker, observation, history),
            TickerPhase::HasPriorState(prior) => advance(prior, observation, history),
        }
    }

    pub fn evaluates_alerts(&self) -> bool {
        matches!(self, TickerPhase::HasPriorState(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::test_support::ascending;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 28).unwrap()
    }

    fn ramp(count: usize, start: f64) -> Vec<PriceSample> {
        ascending(&(0..count).map(|i| start + i as f64).collect::<Vec<_>>())
    }

    fn prior() -> IndicatorState {
        IndicatorState {
            ticker: "AAPL".to_string(),
            as_of: NaiveDate::from_ymd_opt(2024, 3, 27).unwrap(),
            close_price: 101.0,
            ema_fast: 100.0,
            ema_slow: 98.0,
            macd: 2.0,
            signal: 1.0,
            histogram: 1.0,
            rsi14: 55.0,
        }
    }

    #[test]
    fn test_bootstrap_ascending_ramp() {
        let history = ramp(27, 100.0); // 100.0 ..= 126.0
        let state = bootstrap("AAPL", Observation::new(today(), 126.0), &history).unwrap();
        assert_eq!(state.ema_fast, 119.5);
        assert_eq!(state.ema_slow, 112.5);
        assert_eq!(state.macd, 0.0);
        assert_eq!(state.signal, 0.0);
        assert_eq!(state.histogram, 0.0);
        assert_eq!(state.ticker, "AAPL");
        assert_eq!(state.as_of, today());
        assert_eq!(state.close_price, 126.0);
    }

    #[test]
    fn test_bootstrap_skips_most_recent_sample() {
        let mut closes = vec![10.0; 27];
        closes[26] = 1000.0; // most recent
        let state = bootstrap("X", Observation::new(today(), 1000.0), &ascending(&closes)).unwrap();
        assert_eq!(state.ema_fast, 10.0);
        assert_eq!(state.ema_slow, 10.0);
    }

    #[test]
    fn test_bootstrap_uses_rsi_of_same_history() {
        let closes: Vec<f64> = (0..40).map(|i| 50.0 + ((i * 7) % 5) as f64).collect();
        let history = ascending(&closes);
        let state = bootstrap("X", Observation::new(today(), 52.0), &history).unwrap();
        assert_eq!(state.rsi14, compute_rsi(&history).unwrap());
    }

    #[test]
    fn test_bootstrap_accepts_descending_history() {
        let mut history = ramp(27, 100.0);
        history.reverse();
        let state = bootstrap("AAPL", Observation::new(today(), 126.0), &history).unwrap();
        assert_eq!(state.ema_fast, 119.5);
        assert_eq!(state.ema_slow, 112.5);
    }

    #[test]
    fn test_bootstrap_insufficient_history() {
        let err = bootstrap("AAPL", Observation::new(today(), 1.0), &ramp(26, 1.0)).unwrap_err();
        assert!(matches!(err, EngineError::InsufficientHistory { required: 27, available: 26 }));
    }

    #[test]
    fn test_advance_recurrence() {
        let before = prior();
        let state = advance(&before, Observation::new(today(), 110.0), &ramp(15, 90.0)).unwrap();

        let fast = 110.0 * (2.0 / 13.0) + 100.0 * (1.0 - 2.0 / 13.0);
        let slow = 110.0 * (2.0 / 27.0) + 98.0 * (1.0 - 2.0 / 27.0);
        let macd = fast - slow;
        let signal = macd * (2.0 / 10.0) + 1.0 * (1.0 - 2.0 / 10.0);
        assert!((state.ema_fast - fast).abs() < 1e-12);
        assert!((state.ema_slow - slow).abs() < 1e-12);
        assert!((state.macd - macd).abs() < 1e-12);
        assert!((state.signal - signal).abs() < 1e-12);
        assert!((state.histogram - (macd - signal)).abs() < 1e-12);
        assert_eq!(state.close_price, 110.0);
        assert_eq!(state.as_of, today());
        assert_eq!(state.ticker, "AAPL");
    }

    #[test]
    fn test_advance_does_not_mutate_prior() {
        let before = prior();
        let snapshot = before.clone();
        let _ = advance(&before, Observation::new(today(), 80.0), &ramp(30, 60.0)).unwrap();
        assert_eq!(before, snapshot);
    }

    #[test]
    fn test_advance_moves_fast_ema_toward_close() {
        let before = prior();
        let up = advance(&before, Observation::new(today(), 120.0), &ramp(15, 1.0)).unwrap();
        assert!(up.ema_fast > before.ema_fast && up.ema_fast < 120.0);
        let down = advance(&before, Observation::new(today(), 80.0), &ramp(15, 1.0)).unwrap();
        assert!(down.ema_fast < before.ema_fast && down.ema_fast > 80.0);
    }

    #[test]
    fn test_advance_recomputes_rsi_from_history() {
        let history = ascending(&[
            10.0, 10.5, 10.2, 10.8, 11.0, 10.7, 10.9, 11.4, 11.1, 11.6, 11.2, 11.9, 12.0, 11.8, 12.3,
        ]);
        let state = advance(&prior(), Observation::new(today(), 12.3), &history).unwrap();
        assert_eq!(state.rsi14, compute_rsi(&history).unwrap());
        assert_ne!(state.rsi14, prior().rsi14);
    }

    #[test]
    fn test_advance_insufficient_history() {
        let err = advance(&prior(), Observation::new(today(), 1.0), &ramp(14, 1.0)).unwrap_err();
        assert!(matches!(err, EngineError::InsufficientHistory { required: 15, available: 14 }));
    }

    #[test]
    fn test_phase_dispatch() {
        let history = ramp(27, 100.0);
        let obs = Observation::new(today(), 126.0);

        let fresh = TickerPhase::from_latest(None);
        assert_eq!(fresh, TickerPhase::NoPriorState);
        assert!(!fresh.evaluates_alerts());
        assert_eq!(fresh.next_state("AAPL", obs, &history).unwrap().histogram, 0.0);

        let seeded = TickerPhase::from_latest(Some(prior()));
        assert!(seeded.evaluates_alerts());
        let next = seeded.next_state("AAPL", obs, &history).unwrap();
        assert_eq!(next, advance(&prior(), obs, &history).unwrap());
    }

    #[test]
    fn test_two_step_sequence_feeds_signal() {
        let history = ramp(27, 100.0);
        let first = bootstrap("AAPL", Observation::new(today(), 126.0), &history).unwrap();
        let second = advance(&first, Observation::new(today(), 127.0), &history).unwrap();
        assert!(second.macd > 0.0);
        assert!((second.signal - second.macd * 0.2).abs() < 1e-12);
        assert!(second.histogram > 0.0);
    }
}
