use chrono::{DateTime, Datelike, Utc};
use core::fmt::{Display, Formatter};

/// A calendar month, formatted as the zero-padded `YYYY-MM` key used in `commit_history`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    /// Create a month. `month` is 1-based and clamped into `1..=12`.
    #[must_use]
    pub fn new(year: i32, month: u32) -> Self {
        Self {
            year,
            month: month.clamp(1, 12),
        }
    }

    /// The UTC month containing `now`.
    #[must_use]
    pub fn from_datetime(now: DateTime<Utc>) -> Self {
        Self::new(now.year(), now.month())
    }

    /// The month `count` months before this one.
    #[must_use]
    pub fn minus_months(self, count: u32) -> Self {
        let index = i64::from(self.year) * 12 + i64::from(self.month - 1) - i64::from(count);
        Self::from_index(index)
    }

    /// The month following this one.
    #[must_use]
    pub fn next(self) -> Self {
        let index = i64::from(self.year) * 12 + i64::from(self.month - 1) + 1;
        Self::from_index(index)
    }

    #[expect(clippy::cast_possible_truncation, reason = "month indexes stay within the i32 year range")]
    #[expect(clippy::cast_sign_loss, reason = "rem_euclid is never negative")]
    fn from_index(index: i64) -> Self {
        Self {
            year: index.div_euclid(12) as i32,
            month: index.rem_euclid(12) as u32 + 1,
        }
    }

    /// The `commit_history` key for this month.
    #[must_use]
    pub fn key(self) -> String {
        self.to_string()
    }

    /// Midnight UTC on the first day of this month, as an ISO 8601 timestamp.
    #[must_use]
    pub fn start_timestamp(self) -> String {
        format!("{self}-01T00:00:00Z")
    }
}

impl Display for YearMonth {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}
