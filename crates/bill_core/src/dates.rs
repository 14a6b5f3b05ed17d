use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, Duration, OffsetDateTime, PrimitiveDateTime, UtcOffset};

/// A parsed action, vote or milestone date.
///
/// Source data mixes bare calendar dates ("2024-01-05") with full
/// timestamps. A bare date stands for the whole day: it sorts by its first
/// instant and falls inside a recency window if any part of the day does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventDate {
    Day(Date),
    Instant(OffsetDateTime),
}

impl EventDate {
    pub fn sort_key(&self) -> OffsetDateTime {
        match self {
            EventDate::Day(date) => date.midnight().assume_utc(),
            EventDate::Instant(instant) => *instant,
        }
    }

    fn latest_instant(&self) -> OffsetDateTime {
        match self {
            EventDate::Day(date) => match date.with_hms_nano(23, 59, 59, 999_999_999) {
                Ok(end) => end.assume_utc(),
                Err(_) => date.midnight().assume_utc(),
            },
            EventDate::Instant(instant) => *instant,
        }
    }

    pub fn calendar_date(&self) -> Date {
        match self {
            EventDate::Day(date) => *date,
            EventDate::Instant(instant) => instant.to_offset(UtcOffset::UTC).date(),
        }
    }

    /// True when the event happened strictly after `now - days`.
    pub fn within_last_days(&self, now: OffsetDateTime, days: i64) -> bool {
        self.latest_instant() > now - Duration::days(days)
    }
}

pub fn parse_date(raw: &str) -> Option<EventDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(instant) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Some(EventDate::Instant(instant));
    }
    if let Ok(naive) = PrimitiveDateTime::parse(
        raw,
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second][optional [.[subsecond]]]"),
    ) {
        return Some(EventDate::Instant(naive.assume_utc()));
    }
    if let Ok(naive) = PrimitiveDateTime::parse(
        raw,
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second][optional [.[subsecond]]]"),
    ) {
        return Some(EventDate::Instant(naive.assume_utc()));
    }
    Date::parse(raw, format_description!("[year]-[month]-[day]"))
        .ok()
        .map(EventDate::Day)
}

/// Whole calendar days from `earlier` to `now`.
pub fn days_between(earlier: &EventDate, now: OffsetDateTime) -> i64 {
    let today = now.to_offset(UtcOffset::UTC).date();
    (today - earlier.calendar_date()).whole_days()
}

pub trait Clock: Send + Sync {
    fn now(&self) -> OffsetDateTime;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub OffsetDateTime);

impl Clock for FixedClock {
    fn now(&self) -> OffsetDateTime {
        self.0
    }
}
