//! Clock abstraction for determinism.

use chrono::{DateTime, Datelike, Utc};

/// Abstraction over system time so sale timestamps and invoice numbers can be
/// pinned in tests.
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> DateTime<Utc>;

    /// Returns the current calendar year.
    fn current_year(&self) -> i32 {
        self.now().year()
    }
}

/// Production clock that delegates to the system clock.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
