// Services: the per-ticker indicator service and the daily job wiring
pub mod indicator_service;
pub mod job;

pub use indicator_service::{IndicatorService, RunReport, TickerOutcome};
pub use job::run_job;
