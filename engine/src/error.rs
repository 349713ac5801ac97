use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("CSV parsing system error: {source}")]
    CsvSystemError {
        #[from]
        source: csv::Error,
    },

    #[error("I/O error: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },

    #[error("Insufficient history: need {required} samples, got {available}")]
    InsufficientHistory { required: usize, available: usize },

    #[error("Market data provider error: {0}")]
    DataProviderError(String),

    #[error("Persistence error: {0}")]
    PersistenceError(String),

    #[error("Notification error: {0}")]
    NotificationError(String),
}

impl EngineError {
    /// Whether the error stops the whole batch rather than a single ticker.
    pub fn is_fatal_for_batch(&self) -> bool {
        matches!(self, EngineError::ConfigError(_) | EngineError::CsvSystemError { .. })
    }
}

impl From<rusqlite::Error> for EngineError {
    fn from(err: rusqlite::Error) -> Self {
        tracing::error!(error = ?err, "SQLite operation failed");
        EngineError::PersistenceError(err.to_string())
    }
}

impl From<reqwest::Error> for EngineError {
    fn from(err: reqwest::Error) -> Self {
        match err.url() {
            Some(url) => EngineError::DataProviderError(format!("request to {} failed: {}", url, err)),
            None => EngineError::DataProviderError(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::ConfigError(format!("invalid JSON: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticker_scoped_errors_are_not_fatal() {
        assert!(!EngineError::InsufficientHistory { required: 27, available: 3 }.is_fatal_for_batch());
        assert!(!EngineError::DataProviderError("timeout".into()).is_fatal_for_batch());
        assert!(!EngineError::PersistenceError("locked".into()).is_fatal_for_batch());
        assert!(EngineError::ConfigError("bad".into()).is_fatal_for_batch());
    }

    #[test]
    fn test_insufficient_history_message() {
        let err = EngineError::InsufficientHistory { required: 15, available: 4 };
        assert_eq!(err.to_string(), "Insufficient history: need 15 samples, got 4");
    }
}
