//! Source of "today" for the daily factor reset.

use std::sync::RwLock;

use chrono::{DateTime, NaiveDate, Utc};

pub trait Clock: Send + Sync {
  fn now(&self) -> DateTime<Utc>;

  /// The calendar date the reset boundary is evaluated against.
  fn today(&self) -> NaiveDate { self.now().date_naive() }
}

/// Wall-clock time in UTC.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now(&self) -> DateTime<Utc> { Utc::now() }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
  now: RwLock<DateTime<Utc>>,
}

impl ManualClock {
  pub fn new(now: DateTime<Utc>) -> Self { Self { now: RwLock::new(now) } }

  pub fn set(&self, now: DateTime<Utc>) {
    *self.now.write().unwrap_or_else(|e| e.into_inner()) = now;
  }

  pub fn advance(&self, by: chrono::Duration) {
    let mut guard = self.now.write().unwrap_or_else(|e| e.into_inner());
    *guard += by;
  }
}

impl Clock for ManualClock {
  fn now(&self) -> DateTime<Utc> {
    *self.now.read().unwrap_or_else(|e| e.into_inner())
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn manual_clock_crosses_midnight() {
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 3, 1, 23, 30, 0).unwrap());
    assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    clock.advance(chrono::Duration::hours(1));
    assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2024, 3, 2).unwrap());

    clock.set(Utc.with_ymd_and_hms(2024, 2, 29, 8, 0, 0).unwrap());
    assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
  }
}
