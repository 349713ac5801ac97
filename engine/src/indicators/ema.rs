// Exponential Moving Average (EMA) step
use tracing::trace;

/// One EMA recurrence with multiplier `2 / (period + 1)`.
pub struct Ema {
    period: usize,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        Self { period }
    }

    pub fn multiplier(&self) -> f64 {
        2.0 / (self.period as f64 + 1.0)
    }

    /// EMA(n) = close * k + EMA(n-1) * (1 - k)
    pub fn next(&self, close: f64, previous: f64) -> f64 {
        let k = self.multiplier();
        let value = close * k + previous * (1.0 - k);
        trace!(period = self.period, close, previous, value, "ema step");
        value
    }
}
