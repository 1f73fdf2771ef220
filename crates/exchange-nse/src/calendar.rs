//! NSE trading-calendar check.
//!
//! Weekends plus the exchange's published holiday list. The table covers
//! the seasons this deployment runs against and needs a yearly refresh.

use chrono::{Datelike, NaiveDate, Weekday};

/// NSE trading holidays, `YYYY-MM-DD`.
const NSE_HOLIDAYS: [&str; 12] = [
    "2024-01-26",
    "2024-03-08",
    "2024-03-25",
    "2024-08-15",
    "2024-10-02",
    "2024-12-25",
    "2025-01-26",
    "2025-02-26",
    "2025-03-14",
    "2025-08-15",
    "2025-10-02",
    "2025-12-25",
];

/// Returns true when the exchange trades on `date`.
#[must_use]
pub fn is_market_open(date: NaiveDate) -> bool {
    if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
        return false;
    }
    let formatted = date.format("%Y-%m-%d").to_string();
    !NSE_HOLIDAYS.contains(&formatted.as_str())
}
