// Append-only persistence of indicator state snapshots

use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use shared::models::IndicatorState;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

use crate::error::{EngineError, Result};

/// Decimal places kept for persisted indicator fields.
pub const PERSISTED_DECIMALS: u32 = 3;

const DATE_FORMAT: &str = "%Y-%m-%d";

const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS stocks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    dateTime TEXT NOT NULL,
    ticker TEXT NOT NULL,
    closeprice REAL NOT NULL,
    fastema REAL NOT NULL,
    slowema REAL NOT NULL,
    macd REAL NOT NULL,
    signal REAL NOT NULL,
    histogram REAL NOT NULL,
    rsi14day REAL NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_stocks_ticker_id ON stocks (ticker, id);
";

const SELECT_RECENT_SQL: &str = "
SELECT ticker, dateTime, closeprice, fastema, slowema, macd, signal, histogram, rsi14day
FROM stocks WHERE ticker = ?1 ORDER BY id DESC LIMIT ?2";

pub trait StateStore: Send {
    fn latest_state(&self, ticker: &str) -> Result<Option<IndicatorState>>;

    /// Up to two states, most recent first.
    fn last_two_states(&self, ticker: &str) -> Result<Vec<IndicatorState>>;

    /// Appends a snapshot. Either the whole record is written or nothing is.
    fn append_state(&mut self, state: &IndicatorState) -> Result<()>;
}

fn check_appendable(state: &IndicatorState) -> Result<()> {
    if state.ticker.trim().is_empty() {
        return Err(EngineError::PersistenceError("refusing to store a state without a ticker".to_string()));
    }
    Ok(())
}

/// SQLite-backed store using the `stocks` table.
pub struct SqliteStateStore {
    conn: Connection,
}

impl SqliteStateStore {
    /// Open or create the database at `path` and make sure the schema exists.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path.as_ref())?;
        info!(path = %path.as_ref().display(), "opened state database");
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self { conn })
    }

    fn recent(&self, ticker: &str, limit: i64) -> Result<Vec<IndicatorState>> {
        let mut stmt = self.conn.prepare(SELECT_RECENT_SQL)?;
        let rows = stmt.query_map(params![ticker, limit], Self::row_to_state)?;
        let states = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(states)
    }

    fn row_to_state(row: &Row<'_>) -> rusqlite::Result<IndicatorState> {
        let date_str: String = row.get(1)?;
        let as_of = NaiveDate::parse_from_str(&date_str, DATE_FORMAT)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(e)))?;
        Ok(IndicatorState {
            ticker: row.get(0)?,
            as_of,
            close_price: row.get(2)?,
            ema_fast: row.get(3)?,
            ema_slow: row.get(4)?,
            macd: row.get(5)?,
            signal: row.get(6)?,
            histogram: row.get(7)?,
            rsi14: row.get(8)?,
        })
    }

    /// Number of stored snapshots for `ticker`.
    pub fn count(&self, ticker: &str) -> Result<usize> {
        let count: Option<i64> = self
            .conn
            .query_row("SELECT COUNT(*) FROM stocks WHERE ticker = ?1", params![ticker], |row| row.get(0))
            .optional()?;
        Ok(count.unwrap_or(0) as usize)
    }
}

impl StateStore for SqliteStateStore {
    fn latest_state(&self, ticker: &str) -> Result<Option<IndicatorState>> {
        Ok(self.recent(ticker, 1)?.into_iter().next())
    }

    fn last_two_states(&self, ticker: &str) -> Result<Vec<IndicatorState>> {
        self.recent(ticker, 2)
    }

    fn append_state(&mut self, state: &IndicatorState) -> Result<()> {
        check_appendable(state)?;
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO stocks (dateTime, ticker, closeprice, fastema, slowema, macd, signal, histogram, rsi14day)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                state.as_of.format(DATE_FORMAT).to_string(),
                state.ticker,
                state.close_price,
                state.ema_fast,
                state.ema_slow,
                state.macd,
                state.signal,
                state.histogram,
                state.rsi14,
            ],
        )?;
        tx.commit()?;
        debug!(ticker = %state.ticker, as_of = %state.as_of, "appended indicator state");
        Ok(())
    }
}

/// Process-local store, used for dry runs and tests.
#[derive(Default)]
pub struct InMemoryStateStore {
    states: HashMap<String, Vec<IndicatorState>>,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self, ticker: &str) -> &[IndicatorState] {
        self.states.get(ticker).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl StateStore for InMemoryStateStore {
    fn latest_state(&self, ticker: &str) -> Result<Option<IndicatorState>> {
        Ok(self.all(ticker).last().cloned())
    }

    fn last_two_states(&self, ticker: &str) -> Result<Vec<IndicatorState>> {
        Ok(self.all(ticker).iter().rev().take(2).cloned().collect())
    }

    fn append_state(&mut self, state: &IndicatorState) -> Result<()> {
        check_appendable(state)?;
        self.states.entry(state.ticker.clone()).or_default().push(state.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(ticker: &str, day: u32, histogram: f64) -> IndicatorState {
        IndicatorState {
            ticker: ticker.to_string(),
            as_of: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            close_price: 100.0 + day as f64,
            ema_fast: 101.5,
            ema_slow: 99.25,
            macd: 2.25,
            signal: 2.25 - histogram,
            histogram,
            rsi14: 48.125,
        }
    }

    fn exercise(store: &mut dyn StateStore) {
        assert_eq!(store.latest_state("AAPL").unwrap(), None);
        assert!(store.last_two_states("AAPL").unwrap().is_empty());

        store.append_state(&state("AAPL", 1, -1.0)).unwrap();
        store.append_state(&state("MSFT", 1, 3.0)).unwrap();
        assert_eq!(store.last_two_states("AAPL").unwrap(), vec![state("AAPL", 1, -1.0)]);

        store.append_state(&state("AAPL", 2, 0.5)).unwrap();
        store.append_state(&state("AAPL", 3, 0.75)).unwrap();

        assert_eq!(store.latest_state("AAPL").unwrap(), Some(state("AAPL", 3, 0.75)));
        assert_eq!(
            store.last_two_states("AAPL").unwrap(),
            vec![state("AAPL", 3, 0.75), state("AAPL", 2, 0.5)]
        );
        assert_eq!(store.latest_state("MSFT").unwrap(), Some(state("MSFT", 1, 3.0)));
    }

    #[test]
    fn test_sqlite_store_roundtrip_and_ordering() {
        let mut store = SqliteStateStore::open_in_memory().unwrap();
        exercise(&mut store);
        assert_eq!(store.count("AAPL").unwrap(), 3);
    }

    #[test]
    fn test_in_memory_store_roundtrip_and_ordering() {
        let mut store = InMemoryStateStore::new();
        exercise(&mut store);
        assert_eq!(store.all("AAPL").len(), 3);
    }

    #[test]
    fn test_sqlite_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("stocks.db");
        {
            let mut store = SqliteStateStore::open(&path).unwrap();
            store.append_state(&state("SPY", 4, 1.0)).unwrap();
        }
        let store = SqliteStateStore::open(&path).unwrap();
        assert_eq!(store.latest_state("SPY").unwrap(), Some(state("SPY", 4, 1.0)));
    }

    #[test]
    fn test_empty_ticker_is_rejected_without_writing() {
        let mut store = SqliteStateStore::open_in_memory().unwrap();
        let err = store.append_state(&state("", 1, 0.0)).unwrap_err();
        assert!(matches!(err, EngineError::PersistenceError(_)));
        assert_eq!(store.count("").unwrap(), 0);
    }
}
