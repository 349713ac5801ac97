// Technical indicators module
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;

pub use ema::Ema;
pub use macd::{advance, bootstrap, Observation, TickerPhase};
pub use rsi::{compute_rsi, Rsi};
pub use sma::Sma;

use crate::error::Result;
use shared::models::PriceSample;

// Common trait for indicators computed over a fixed window of closes.
// Input is ordered most-recent-first: index 0 is the latest close.
pub trait WindowIndicator {
    fn window(&self) -> usize; // Closes needed for one value
    fn calculate(&self, closes: &[f64]) -> Result<f64>;
}

/// Closing prices ordered most-recent-first with one entry per date,
/// whatever order the provider returned them in.
pub fn closes_most_recent_first(history: &[PriceSample]) -> Vec<f64> {
    let mut samples = history.to_vec();
    samples.sort_by(|a, b| b.date.cmp(&a.date));
    samples.dedup_by_key(|s| s.date);
    samples.into_iter().map(|s| s.close).collect()
}


#[cfg(test)]
mod tests {
    use super::test_support::ascending;
    use super::*;

    #[test]
    fn test_closes_most_recent_first_reverses_ascending_input() {
        let history = ascending(&[1.0, 2.0, 3.0]);
        assert_eq!(closes_most_recent_first(&history), vec![3.0, 2.0, 1.0]);
    }

    #[test]
    fn test_closes_most_recent_first_accepts_descending_input() {
        let mut history = ascending(&[1.0, 2.0, 3.0]);
        history.reverse();
        assert_eq!(closes_most_recent_first(&history), vec![3.0, 2.0, 1.0]);
    }

    #[test]
    fn test_closes_most_recent_first_drops_duplicate_dates() {
        let mut history = ascending(&[1.0, 2.0, 3.0]);
        history.push(history[2]);
        assert_eq!(closes_most_recent_first(&history).len(), 3);
    }
}
