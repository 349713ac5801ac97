// Same-day gate: only run when the reference ticker traded today
use chrono::NaiveDate;
use tracing::info;

use crate::data::MarketDataProvider;
use crate::error::Result;

pub async fn handle_run_gate(provider: &dyn MarketDataProvider, reference_ticker: &str, today: NaiveDate) -> Result<bool> {
    let trade_date = provider.latest_trade_date(reference_ticker).await?;
    let open = trade_date == today;
    info!(reference_ticker, %trade_date, %today, open, "checked run gate");
    Ok(open)
}
