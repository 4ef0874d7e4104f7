// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Clock abstraction for testable wall-clock time

use chrono::{
    DateTime, Duration, FixedOffset, Local, NaiveDate, NaiveTime, Offset, TimeZone, Utc,
};
use std::sync::{Arc, Mutex};

/// A clock that provides the current wall-clock time
pub trait Clock: Clone + Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Start (inclusive) and end (exclusive) of the local calendar day, in UTC
    fn today_bounds(&self) -> (DateTime<Utc>, DateTime<Utc>);
}

/// Bounds of the calendar day containing `now` in `tz`.
///
/// Each bound is resolved through the zone itself, so days that cross a
/// daylight-saving transition are 23 or 25 hours long.
fn day_bounds<Tz: TimeZone>(now: DateTime<Utc>, tz: &Tz) -> (DateTime<Utc>, DateTime<Utc>) {
    let today = now.with_timezone(tz).date_naive();
    let start = local_midnight(today, tz);
    let end = today
        .succ_opt()
        .map(|tomorrow| local_midnight(tomorrow, tz))
        .unwrap_or(start + Duration::days(1));
    (start, end)
}

fn local_midnight<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);
    match midnight.and_local_timezone(tz.clone()).earliest() {
        Some(start) => start.with_timezone(&Utc),
        // Midnight skipped by a transition: the day starts at the first
        // instant after the gap, which is midnight under the earlier offset.
        None => {
            let before = tz
                .offset_from_utc_datetime(&(midnight - Duration::days(1)))
                .fix();
            (midnight - Duration::seconds(i64::from(before.local_minus_utc()))).and_utc()
        }
    }
}

/// Real system clock, using the host's local time zone for day boundaries
#[derive(Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn today_bounds(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        day_bounds(self.now(), &Local)
    }
}

/// Fake clock for testing with controllable time
#[derive(Clone)]
pub struct FakeClock {
    current: Arc<Mutex<DateTime<Utc>>>,
    offset: FixedOffset,
}

impl FakeClock {
    pub fn new() -> Self {
        Self::at(Utc::now())
    }

    /// Start the clock at a specific moment
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            current: Arc::new(Mutex::new(now)),
            offset: Utc.fix(),
        }
    }

    /// Use a different local offset for day boundaries
    pub fn with_offset(mut self, offset: FixedOffset) -> Self {
        self.offset = offset;
        self
    }

    /// Advance the clock by the given duration
    pub fn advance(&self, duration: Duration) {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        *current += duration;
    }

    /// Set the clock to a specific moment
    pub fn set(&self, now: DateTime<Utc>) {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        *current = now;
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> DateTime<Utc> {
        *self.current.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn today_bounds(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        day_bounds(self.now(), &self.offset)
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
