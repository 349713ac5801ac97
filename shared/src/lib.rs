pub mod models;
pub mod utils;

pub use models::{Alert, AlertKind, IndicatorState, PriceSample};
