// Threshold alerts over the two most recent persisted states of a ticker

use shared::models::{Alert, AlertKind, IndicatorState};

pub const RSI_OVERBOUGHT: f64 = 70.0;
pub const RSI_OVERSOLD: f64 = 30.0;

pub fn rsi_alert(rsi14: f64) -> Option<AlertKind> {
    if rsi14 >= RSI_OVERBOUGHT {
        Some(AlertKind::RsiOverbought)
    } else if rsi14 <= RSI_OVERSOLD {
        Some(AlertKind::RsiOversold)
    } else {
        None
    }
}

/// A zero previous histogram never counts as a cross.
pub fn histogram_cross(previous: f64, current: f64) -> Option<AlertKind> {
    if previous == 0.0 {
        return None;
    }
    if previous <= 0.0 && current >= 0.0 {
        Some(AlertKind::MacdBullishCross)
    } else if previous >= 0.0 && current <= 0.0 {
        Some(AlertKind::MacdBearishCross)
    } else {
        None
    }
}

/// `recent` is most-recent-first, as returned by
/// [`StateStore::last_two_states`](crate::data::StateStore::last_two_states).
/// With a single state only the RSI is checked.
pub fn evaluate(recent: &[IndicatorState]) -> Vec<AlertKind> {
    let mut alerts = Vec::new();
    let Some(current) = recent.first() else {
        return alerts;
    };
    alerts.extend(rsi_alert(current.rsi14));
    if let Some(previous) = recent.get(1) {
        alerts.extend(histogram_cross(previous.histogram, current.histogram));
    }
    alerts
}

/// One line per alert, or `None` when there is nothing to send.
pub fn build_summary(alerts: &[Alert]) -> Option<String> {
    if alerts.is_empty() {
        return None;
    }
    Some(alerts.iter().map(Alert::to_string).collect::<Vec<_>>().join("\n"))
}
