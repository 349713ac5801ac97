// Simple Moving Average (SMA) over the most recent closes
use super::WindowIndicator;
use crate::error::{EngineError, Result};

pub struct Sma {
    period: usize,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        Self { period }
    }
}

impl WindowIndicator for Sma {
    fn window(&self) -> usize {
        self.period
    }

    fn calculate(&self, closes: &[f64]) -> Result<f64> {
        if self.period == 0 || closes.len() < self.period {
            return Err(EngineError::InsufficientHistory {
                required: self.period.max(1),
                available: closes.len(),
            });
        }
        let sum: f64 = closes.iter().take(self.period).sum();
        Ok(sum / self.period as f64)
    }
}
