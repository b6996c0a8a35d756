use chrono::{Datelike, Duration};

use crate::types::Fix;

/// Year some receivers report once their 10-bit GPS week counter wraps
pub const ROLLOVER_YEAR: i32 = 1999;

/// One full period of a 10-bit week counter: 1024 weeks = 7168 days
pub fn rollover_period() -> Duration {
    Duration::days(7 * 1024)
}

/// Shifts a fix stamped in the rollover year forward by one counter period.
/// Every other fix comes back unchanged.
pub fn fix_rollover(mut fix: Fix) -> Fix {
    if let Some(ts) = fix.timestamp {
        if ts.year() == ROLLOVER_YEAR {
            let repaired = ts + rollover_period();
            log::debug!("Week rollover repaired: {} -> {}", ts, repaired);
            fix.timestamp = Some(repaired);
        }
    }
    fix
}

/// Streaming rollover correction; keeps no state between fixes.
pub fn correct_rollover<I>(fixes: I) -> impl Iterator<Item = Fix>
where
    I: IntoIterator<Item = Fix>,
{
    fixes.into_iter().map(fix_rollover)
}
