//! Injectable time source and calendar-day helpers.
//!
//! Review timing works on instants (`DateTime<Utc>`). Clock-in records work on
//! calendar days, which are derived from an instant using the clock's UTC
//! offset so that a day starts at local midnight.

use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Duration, FixedOffset, Local, NaiveDate, NaiveTime, Offset, Utc};

/// Source of the current instant and of the offset that defines calendar days.
pub trait Clock: Send + Sync {
    /// The current instant.
    fn now(&self) -> DateTime<Utc>;

    /// The UTC offset used to turn instants into calendar days.
    fn offset(&self) -> FixedOffset;

    /// Today's calendar date.
    fn today(&self) -> NaiveDate {
        calendar_day(self.now(), self.offset())
    }

    /// The instant at which today started.
    fn today_start(&self) -> DateTime<Utc> {
        day_start(self.today(), self.offset())
    }
}

impl<T: Clock + ?Sized> Clock for Arc<T> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }

    fn offset(&self) -> FixedOffset {
        (**self).offset()
    }
}

/// Calendar date of `instant` as seen at `offset`.
pub fn calendar_day(instant: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    instant.with_timezone(&offset).date_naive()
}

/// The instant of local midnight starting `day` at `offset`.
pub fn day_start(day: NaiveDate, offset: FixedOffset) -> DateTime<Utc> {
    let local_midnight = day.and_time(NaiveTime::MIN);
    (local_midnight - Duration::seconds(i64::from(offset.local_minus_utc()))).and_utc()
}

/// Half-open instant range `[start, end)` covering `day` at `offset`.
pub fn day_bounds(day: NaiveDate, offset: FixedOffset) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = day_start(day, offset);
    (start, start + Duration::days(1))
}

/// Like [`day_bounds`], but `None` when either bound falls outside the
/// representable range. Use this for caller-supplied dates.
pub fn checked_day_bounds(
    day: NaiveDate,
    offset: FixedOffset,
) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let start = day
        .and_time(NaiveTime::MIN)
        .checked_sub_signed(Duration::seconds(i64::from(offset.local_minus_utc())))?
        .and_utc();
    let end = start.checked_add_signed(Duration::days(1))?;
    Some((start, end))
}

/// Wall clock backed by the system time.
#[derive(Debug, Clone, Default)]
pub struct SystemClock {
    offset: Option<FixedOffset>,
}

impl SystemClock {
    /// Use the system's local offset for calendar days.
    pub fn new() -> Self {
        Self { offset: None }
    }

    /// Use a fixed offset for calendar days instead of the local one.
    pub fn with_offset(offset: FixedOffset) -> Self {
        Self {
            offset: Some(offset),
        }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn offset(&self) -> FixedOffset {
        self.offset.unwrap_or_else(|| *Local::now().offset())
    }
}

/// Manually driven clock for tests and simulations.
#[derive(Debug)]
pub struct FixedClock {
    now: RwLock<DateTime<Utc>>,
    offset: FixedOffset,
}

impl FixedClock {
    /// A clock frozen at `now`, with calendar days in UTC.
    pub fn at(now: DateTime<Utc>) -> Self {
        Self::with_offset(now, Utc.fix())
    }

    /// A clock frozen at `now`, with calendar days at `offset`.
    pub fn with_offset(now: DateTime<Utc>, offset: FixedOffset) -> Self {
        Self {
            now: RwLock::new(now),
            offset,
        }
    }

    /// Move the clock to `now`.
    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.write().unwrap_or_else(PoisonError::into_inner) = now;
    }

    /// Move the clock forward by `by`.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.write().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }

    /// Move the clock forward by whole days.
    pub fn advance_days(&self, days: i64) {
        self.advance(Duration::days(days));
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn offset(&self) -> FixedOffset {
        self.offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn test_calendar_day_utc() {
        let day = calendar_day(utc(2026, 3, 1, 23, 59), FixedOffset::east_opt(0).unwrap());
        assert_eq!(day, NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());
    }

    #[test]
    fn test_calendar_day_respects_offset() {
        // 23:30 UTC is already the next day at UTC+8.
        let east8 = FixedOffset::east_opt(8 * 3600).unwrap();
        let day = calendar_day(utc(2026, 3, 1, 23, 30), east8);
        assert_eq!(day, NaiveDate::from_ymd_opt(2026, 3, 2).unwrap());
    }

    #[test]
    fn test_day_start_is_local_midnight() {
        let east8 = FixedOffset::east_opt(8 * 3600).unwrap();
        let day = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        assert_eq!(day_start(day, east8), utc(2026, 3, 1, 16, 0));

        let west5 = FixedOffset::west_opt(5 * 3600).unwrap();
        assert_eq!(day_start(day, west5), utc(2026, 3, 2, 5, 0));
    }

    #[test]
    fn test_day_bounds_span_one_day() {
        let day = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let (start, end) = day_bounds(day, FixedOffset::east_opt(0).unwrap());
        assert_eq!(end - start, Duration::days(1));
    }

    #[test]
    fn test_checked_day_bounds() {
        let day = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let east8 = FixedOffset::east_opt(8 * 3600).unwrap();
        assert_eq!(checked_day_bounds(day, east8), Some(day_bounds(day, east8)));

        let utc = FixedOffset::east_opt(0).unwrap();
        assert!(checked_day_bounds(NaiveDate::MAX, utc).is_none());
        assert!(checked_day_bounds(NaiveDate::MIN, east8).is_none());
    }

    #[test]
    fn test_fixed_clock_advance() {
        let clock = FixedClock::at(utc(2026, 3, 1, 9, 0));
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());

        clock.advance_days(2);
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2026, 3, 3).unwrap());
        assert_eq!(clock.today_start(), utc(2026, 3, 3, 0, 0));

        clock.set(utc(2026, 4, 1, 12, 0));
        assert_eq!(clock.now(), utc(2026, 4, 1, 12, 0));
    }

    #[test]
    fn test_arc_clock_delegates() {
        let clock = Arc::new(FixedClock::at(utc(2026, 3, 1, 9, 0)));
        let shared: Arc<FixedClock> = Arc::clone(&clock);
        clock.advance_days(1);
        assert_eq!(Clock::today(&shared), NaiveDate::from_ymd_opt(2026, 3, 2).unwrap());
    }

    #[test]
    fn test_system_clock_with_offset() {
        let east9 = FixedOffset::east_opt(9 * 3600).unwrap();
        let clock = SystemClock::with_offset(east9);
        assert_eq!(clock.offset(), east9);
    }
}
