//! Hour buckets.
//!
//! Dates are compared through formatted hour labels (`MMM DD hha`, UTC),
//! not as continuous timestamps. Two instants in the same hour share a
//! bucket; labels carry no year.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{GraphError, GraphResult};
use crate::normalize::CanonicalEdge;

pub const BUCKET_FORMAT: &str = "%b %d %I%P";

/// Hour labels repeat at the latest after four years (Feb 29 included), so
/// enumerating a longer range adds no new label.
const MAX_ENUMERATED_HOURS: i64 = 4 * 366 * 24;

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> GraphResult<Self> {
        if end < start {
            return Err(GraphError::Validation(format!(
                "date range ends ({}) before it starts ({})",
                end, start
            )));
        }
        Ok(Self { start, end })
    }

    /// Labels of every hour `start + k h` that is not after `end`.
    pub fn buckets(&self) -> IndexSet<String> {
        hour_labels(self.start, |t| t <= self.end)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct TimelineBin {
    pub bucket: String,
    pub start: DateTime<Utc>,
    pub count: usize,
}

/// Parse a raw date value. Numbers (and all-digit strings) are epoch
/// milliseconds; strings may be RFC 3339, `YYYY-MM-DD HH:MM:SS`,
/// `YYYY-MM-DDTHH:MM:SS` or `YYYY-MM-DD`, all read as UTC.
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64))
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
        Value::String(s) => parse_timestamp_str(s.trim()),
        _ => None,
    }
}

fn parse_timestamp_str(s: &str) -> Option<DateTime<Utc>> {
    if s.is_empty() {
        return None;
    }
    if s.bytes().all(|b| b.is_ascii_digit()) {
        return s
            .parse::<i64>()
            .ok()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

pub fn bucket_label(dt: &DateTime<Utc>) -> String {
    dt.format(BUCKET_FORMAT).to_string()
}

/// Hour label of a raw date value, `None` when it is not a date.
pub fn bucket_of(value: &Value) -> Option<String> {
    parse_timestamp(value).map(|dt| bucket_label(&dt))
}

pub fn floor_hour(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt.with_minute(0)
        .and_then(|d| d.with_second(0))
        .and_then(|d| d.with_nanosecond(0))
        .unwrap_or(dt)
}

pub fn round_hour(dt: DateTime<Utc>) -> DateTime<Utc> {
    let floor = floor_hour(dt);
    if dt - floor >= Duration::minutes(30) {
        floor + Duration::hours(1)
    } else {
        floor
    }
}

/// Labels for a timeline brush selection. Both ends snap to the nearest
/// hour; a selection that collapses becomes the single hour containing its
/// start. The end hour is excluded.
pub fn brush_buckets(start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<String> {
    let (mut from, mut to) = (round_hour(start), round_hour(end));
    if from >= to {
        from = floor_hour(start);
        to = from + Duration::hours(1);
    }
    hour_labels(from, |t| t < to).into_iter().collect()
}

fn hour_labels<F>(start: DateTime<Utc>, keep: F) -> IndexSet<String>
where
    F: Fn(DateTime<Utc>) -> bool,
{
    let mut labels = IndexSet::new();
    let mut current = start;
    let mut steps = 0;
    while keep(current) && steps < MAX_ENUMERATED_HOURS {
        labels.insert(bucket_label(&current));
        current += Duration::hours(1);
        steps += 1;
    }
    labels
}

/// Edge counts per hour from the earliest to the latest dated edge. Hours
/// without edges are reported with a zero count.
pub fn histogram(edges: &[CanonicalEdge]) -> Vec<TimelineBin> {
    let mut counts: IndexMap<DateTime<Utc>, usize> = IndexMap::new();
    for edge in edges {
        if let Some(dt) = parse_timestamp(&edge.epoch) {
            *counts.entry(floor_hour(dt)).or_default() += 1;
        }
    }

    let (Some(first), Some(last)) = (counts.keys().min().copied(), counts.keys().max().copied())
    else {
        return Vec::new();
    };

    let mut bins = Vec::new();
    let mut current = first;
    while current <= last {
        bins.push(TimelineBin {
            bucket: bucket_label(&current),
            start: current,
            count: counts.get(&current).copied().unwrap_or(0),
        });
        current += Duration::hours(1);
    }
    bins
}
