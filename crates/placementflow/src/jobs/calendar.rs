use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Offset, Utc};

/// The evaluation day of one auto-advance run.
///
/// Comparisons are date-only: "now" and every job date are truncated to a
/// calendar day in the same zone first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Today {
    date: NaiveDate,
    zone: FixedOffset,
}

impl Today {
    pub fn at(now: DateTime<Utc>, zone: FixedOffset) -> Self {
        Self {
            date: calendar_day(now, zone),
            zone,
        }
    }

    pub fn utc(now: DateTime<Utc>) -> Self {
        Self::at(now, utc_zone())
    }

    pub fn from_date(date: NaiveDate, zone: FixedOffset) -> Self {
        Self { date, zone }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn zone(&self) -> FixedOffset {
        self.zone
    }

    /// True once `ts` falls on a calendar day strictly before today.
    pub fn has_passed(&self, ts: DateTime<Utc>) -> bool {
        calendar_day(ts, self.zone) < self.date
    }

    /// Like [`Today::has_passed`] for a raw stored entry. Unparseable entries never pass.
    pub fn has_passed_raw(&self, raw: &str) -> bool {
        parse_day(raw, self.zone).is_some_and(|day| day < self.date)
    }
}

pub fn utc_zone() -> FixedOffset {
    Utc.fix()
}

/// Builds the evaluation zone from a whole-minute UTC offset (e.g. `330` for +05:30).
pub fn zone_from_offset_minutes(minutes: i32) -> anyhow::Result<FixedOffset> {
    minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .ok_or_else(|| anyhow::anyhow!("utc offset out of range: {minutes} minutes"))
}

pub fn calendar_day(ts: DateTime<Utc>, zone: FixedOffset) -> NaiveDate {
    ts.with_timezone(&zone).date_naive()
}

/// Parses a stored interview-date entry into its calendar day in `zone`.
///
/// Accepted shapes: RFC 3339, Postgres timestamptz text (`2025-03-01 09:30:00+05:30`),
/// naive timestamps and bare `YYYY-MM-DD` dates. Naive values are read as
/// already being local to `zone`.
pub fn parse_day(raw: &str, zone: FixedOffset) -> Option<NaiveDate> {
    let raw = raw.trim().trim_matches('"');
    if raw.is_empty() {
        return None;
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&zone).date_naive());
    }

    if let Ok(ts) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f%#z") {
        return Some(ts.with_timezone(&zone).date_naive());
    }

    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.date());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}
