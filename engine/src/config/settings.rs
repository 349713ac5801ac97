// Job settings, loaded from a JSON file with defaults for every field
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::{EngineError, Result};

pub const DEFAULT_CONFIG_PATH: &str = "tickwatch.json";
pub const CONFIG_ENV_VAR: &str = "TICKWATCH_CONFIG";
/// Ten years of calendar days.
pub const MAX_HISTORY_DAYS: i64 = 3650;

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub market_data: MarketDataSettings,
    pub ticker_list: PathBuf,
    pub alert_ticker_list: PathBuf,
    pub database_path: PathBuf,
    pub notification: NotificationSettings,
    pub run_gate: RunGateSettings,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct MarketDataSettings {
    pub source: MarketDataSource,
    pub history_days: i64,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum MarketDataSource {
    Yahoo { endpoint: String },
    Csv { directory: PathBuf },
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct NotificationSettings {
    pub recipient: String,
    pub webhook_url: Option<String>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct RunGateSettings {
    pub enabled: bool,
    pub reference_ticker: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            market_data: MarketDataSettings::default(),
            ticker_list: PathBuf::from("tickers.csv"),
            alert_ticker_list: PathBuf::from("alert_tickers.csv"),
            database_path: PathBuf::from("stocks.db"),
            notification: NotificationSettings::default(),
            run_gate: RunGateSettings::default(),
        }
    }
}

impl Default for MarketDataSettings {
    fn default() -> Self {
        MarketDataSettings {
            source: MarketDataSource::Yahoo {
                endpoint: "https://query1.finance.yahoo.com".to_string(),
            },
            history_days: 90,
        }
    }
}

impl Default for NotificationSettings {
    fn default() -> Self {
        NotificationSettings {
            recipient: "alerts@localhost".to_string(),
            webhook_url: None,
        }
    }
}

impl Default for RunGateSettings {
    fn default() -> Self {
        RunGateSettings {
            enabled: true,
            reference_ticker: "SPY".to_string(),
        }
    }
}

impl Settings {
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            EngineError::ConfigError(format!("Failed to read config '{}': {}", path.display(), e))
        })?;
        let settings = Self::from_json(&json)?;
        info!(path = %path.display(), "loaded settings");
        Ok(settings)
    }

    /// Resolves the config path from the CLI argument, then `TICKWATCH_CONFIG`,
    /// then `tickwatch.json`. Only a missing file at the default path falls
    /// back to built-in defaults.
    pub fn resolve(cli_path: Option<PathBuf>) -> Result<Self> {
        let explicit = cli_path.or_else(|| std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from));
        match explicit {
            Some(path) => Self::load(&path),
            None => {
                let path = Path::new(DEFAULT_CONFIG_PATH);
                if path.exists() {
                    Self::load(path)
                } else {
                    warn!(path = %path.display(), "no config file found, using defaults");
                    Ok(Self::default())
                }
            }
        }
    }

    fn validate(&self) -> Result<()> {
        let history_days = self.market_data.history_days;
        if !(1..=MAX_HISTORY_DAYS).contains(&history_days) {
            return Err(EngineError::ConfigError(format!(
                "market_data.history_days must be between 1 and {}, got {}",
                MAX_HISTORY_DAYS, history_days
            )));
        }
        if self.run_gate.enabled && self.run_gate.reference_ticker.trim().is_empty() {
            return Err(EngineError::ConfigError("run_gate.reference_ticker must not be empty".to_string()));
        }
        if let MarketDataSource::Yahoo { endpoint } = &self.market_data.source {
            if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
                return Err(EngineError::ConfigError(format!("market data endpoint '{}' is not an HTTP URL", endpoint)));
            }
        }
        Ok(())
    }
}
