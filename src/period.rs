//! Period key calculation
//!
//! Quest windows are anchored to one product-wide timezone offset so that
//! every user's daily and weekly quests roll over at the same local moment.
//! Daily keys are the local calendar date; weekly keys use ISO-8601 week
//! numbering (Monday-based weeks, week 1 contains the year's first
//! Thursday), so the year component near a boundary is the ISO week-year,
//! not the instant's calendar year.

use chrono::{DateTime, Datelike, FixedOffset, Offset, Utc};

use crate::catalog::QuestType;

/// Computes daily and weekly period keys in a fixed timezone
#[derive(Debug, Clone, Copy)]
pub struct PeriodClock {
    offset: FixedOffset,
}

impl PeriodClock {
    /// Create a clock anchored to the given UTC offset
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// Clock anchored to UTC
    pub fn utc() -> Self {
        Self { offset: Utc.fix() }
    }

    /// The anchoring offset
    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Local calendar date of the instant as `YYYY-MM-DD`
    pub fn daily_key(&self, instant: DateTime<Utc>) -> String {
        let local = instant.with_timezone(&self.offset).date_naive();
        format!("{:04}-{:02}-{:02}", local.year(), local.month(), local.day())
    }

    /// ISO week of the instant's local date as `YYYY-Www`
    pub fn weekly_key(&self, instant: DateTime<Utc>) -> String {
        let week = instant.with_timezone(&self.offset).date_naive().iso_week();
        format!("{:04}-W{:02}", week.year(), week.week())
    }

    /// Period key for the given quest type
    pub fn period_key(&self, quest_type: QuestType, instant: DateTime<Utc>) -> String {
        match quest_type {
            QuestType::Daily => self.daily_key(instant),
            QuestType::Weekly => self.weekly_key(instant),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn test_daily_key_format() {
        let clock = PeriodClock::utc();
        assert_eq!(clock.daily_key(utc(2025, 3, 7, 12, 0)), "2025-03-07");
    }

    #[test]
    fn test_daily_key_stable_within_day() {
        let clock = PeriodClock::utc();
        assert_eq!(
            clock.daily_key(utc(2025, 3, 7, 0, 0)),
            clock.daily_key(utc(2025, 3, 7, 23, 59)),
        );
    }

    #[test]
    fn test_daily_key_changes_at_local_midnight() {
        // UTC-6: 05:59Z is still the previous local day, 06:00Z is the next
        let clock = PeriodClock::new(FixedOffset::west_opt(6 * 3600).unwrap());
        assert_eq!(clock.daily_key(utc(2025, 3, 8, 5, 59)), "2025-03-07");
        assert_eq!(clock.daily_key(utc(2025, 3, 8, 6, 0)), "2025-03-08");
    }

    #[test]
    fn test_weekly_key_stable_within_iso_week() {
        let clock = PeriodClock::utc();
        // 2025-03-03 is a Monday, 2025-03-09 the following Sunday
        let monday = clock.weekly_key(utc(2025, 3, 3, 0, 0));
        let sunday = clock.weekly_key(utc(2025, 3, 9, 23, 59));
        assert_eq!(monday, sunday);
        assert_eq!(monday, "2025-W10");
        assert_ne!(monday, clock.weekly_key(utc(2025, 3, 10, 0, 0)));
    }

    #[test]
    fn test_weekly_key_year_boundaries() {
        let clock = PeriodClock::utc();
        // Tuesday Dec 31 2024 falls in the week of Thursday Jan 2 2025
        assert_eq!(clock.weekly_key(utc(2024, 12, 31, 12, 0)), "2025-W01");
        assert_eq!(clock.weekly_key(utc(2025, 1, 1, 12, 0)), "2025-W01");
        // Friday Jan 1 2021 falls in the last week of 2020, a 53-week year
        assert_eq!(clock.weekly_key(utc(2021, 1, 1, 12, 0)), "2020-W53");
        // Friday Jan 1 2027 belongs to 2026-W53 (2026 starts on a Thursday)
        assert_eq!(clock.weekly_key(utc(2027, 1, 1, 12, 0)), "2026-W53");
    }

    #[test]
    fn test_weekly_key_offset_shifts_boundary() {
        // 2025-03-09T22:30Z is Monday 00:30 local at +2, already the next ISO week
        let clock = PeriodClock::new(FixedOffset::east_opt(2 * 3600).unwrap());
        assert_eq!(clock.weekly_key(utc(2025, 3, 9, 22, 30)), "2025-W11");
        assert_eq!(PeriodClock::utc().weekly_key(utc(2025, 3, 9, 22, 30)), "2025-W10");
    }

    #[test]
    fn test_period_key_dispatch() {
        let clock = PeriodClock::utc();
        let at = utc(2025, 3, 7, 12, 0);
        assert_eq!(clock.period_key(QuestType::Daily, at), clock.daily_key(at));
        assert_eq!(clock.period_key(QuestType::Weekly, at), clock.weekly_key(at));
    }
}
