// Market data, ticker lists and indicator state persistence
pub mod csv_parser;
pub mod market_data;
pub mod state_store;
pub mod yahoo;

pub use market_data::{CsvHistoryProvider, MarketDataProvider, MarketDataStore};
pub use state_store::{InMemoryStateStore, SqliteStateStore, StateStore};
pub use yahoo::YahooChartProvider;
