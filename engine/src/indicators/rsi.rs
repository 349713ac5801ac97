// Relative Strength Index (RSI) over a single fixed window
use super::{closes_most_recent_first, WindowIndicator};
use crate::error::{EngineError, Result};
use shared::models::PriceSample;

pub const RSI_PERIOD: usize = 14;

pub struct Rsi {
    period: usize,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        Self { period }
    }
}

impl WindowIndicator for Rsi {
    // `period` deltas need one extra close
    fn window(&self) -> usize {
        self.period + 1
    }

    fn calculate(&self, closes: &[f64]) -> Result<f64> {
        if self.period == 0 || closes.len() < self.window() {
            return Err(EngineError::InsufficientHistory {
                required: self.window(),
                available: closes.len(),
            });
        }

        let mut gains = 0.0;
        let mut losses = 0.0;
        for i in 0..self.period {
            let change = closes[i] - closes[i + 1];
            if change > 0.0 {
                gains += change;
            } else {
                losses -= change; // losses are positive values
            }
        }

        let avg_gain = gains / self.period as f64;
        let avg_loss = losses / self.period as f64;

        // A window without losses reports 0, not the textbook 100.
        if avg_loss == 0.0 {
            return Ok(0.0);
        }
        let rs = avg_gain / avg_loss;
        Ok(100.0 - (100.0 / (1.0 + rs)))
    }
}

/// 14-day RSI over the most recent 15 closes of `history`, in either order.
pub fn compute_rsi(history: &[PriceSample]) -> Result<f64> {
    let closes = closes_most_recent_first(history);
    Rsi::new(RSI_PERIOD).calculate(&closes)
}
