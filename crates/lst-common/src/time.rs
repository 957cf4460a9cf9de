//! Calendar date ranges for temporal imagery queries.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A half-open time interval `[start, end)`.
///
/// Both satellite sources use the same convention: granules acquired at
/// `start` are included, granules acquired at `end` are not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// The trailing `days` days ending at `end`.
    pub fn trailing_days(end: DateTime<Utc>, days: u32) -> Self {
        Self {
            start: end - Duration::days(days as i64),
            end,
        }
    }

    /// Length of the range in whole days.
    pub fn num_days(&self) -> i64 {
        (self.end - self.start).num_days()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_trailing_days() {
        let end = Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap();
        let range = DateRange::trailing_days(end, 30);
        assert_eq!(range.num_days(), 30);
        assert_eq!(range.end, end);
        assert!(range.start < range.end);
    }
}
