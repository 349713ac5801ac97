// Engine library root: incremental MACD/RSI indicators per ticker, their
// persistence and the daily alert job.

pub mod alerts;
pub mod config;
pub mod data;
pub mod error;
pub mod indicators;
pub mod notify;
pub mod services;

pub use error::{EngineError, Result};
