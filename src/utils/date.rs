// Evaluation-time parsing for `--as-of`
//
// Pipeline timestamps are UTC, so every expression is read as UTC.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use anyhow::Result;

/// Parse an `--as-of` expression into a Unix timestamp
///
/// Accepts `now`, `today` (start of the current UTC day), `YYYY-MM-DD`
/// (end of that day, so the whole day is inside the window),
/// `YYYY-MM-DDTHH:MM` and `YYYY-MM-DDTHH:MM:SS`.
pub fn parse_as_of(expr: &str, now: DateTime<Utc>) -> Result<i64> {
    let expr = expr.trim();
    match expr {
        "now" => return Ok(now.timestamp()),
        "today" => {
            let midnight = now.date_naive().and_hms_opt(0, 0, 0)
                .ok_or_else(|| anyhow::anyhow!("Invalid date"))?;
            return Ok(midnight.and_utc().timestamp());
        }
        _ => {}
    }

    if let Ok(date) = NaiveDate::parse_from_str(expr, "%Y-%m-%d") {
        let end_of_day = date.and_hms_opt(23, 59, 59)
            .ok_or_else(|| anyhow::anyhow!("Invalid date"))?;
        return Ok(end_of_day.and_utc().timestamp());
    }

    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(expr, format) {
            return Ok(datetime.and_utc().timestamp());
        }
    }

    anyhow::bail!(
        "Invalid --as-of value: '{}'. Use now, today, YYYY-MM-DD or YYYY-MM-DDTHH:MM",
        expr
    )
}
