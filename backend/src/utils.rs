use chrono::{NaiveDateTime, Utc};

/// Wall clock used for interval boundaries, in UTC.
pub fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}
