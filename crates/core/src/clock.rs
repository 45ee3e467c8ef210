//! Injected business clock.
//!
//! Default dates and the sweep's "already paid this month" guard depend on
//! "today" in the cooperative's timezone, never on the host clock directly.

use chrono::{Datelike, NaiveDate, Utc};
use chrono_tz::Tz;

/// Source of the current business date.
pub trait Clock: Send + Sync + std::fmt::Debug {
    /// Returns today's date in the business timezone.
    fn today(&self) -> NaiveDate;
}

/// Wall clock interpreted in a fixed IANA timezone.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    tz: Tz,
}

impl SystemClock {
    /// Creates a system clock for `tz`.
    #[must_use]
    pub const fn new(tz: Tz) -> Self {
        Self { tz }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new(chrono_tz::Asia::Jakarta)
    }
}

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.tz).date_naive()
    }
}

/// Clock pinned to one date.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// Returns true if both dates fall in the same calendar month of the same year.
#[must_use]
pub fn same_month(a: NaiveDate, b: NaiveDate) -> bool {
    a.year() == b.year() && a.month() == b.month()
}
