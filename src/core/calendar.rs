//! Trading calendar reconstruction and date-status resolution.
//!
//! Dates travel as zero-padded `YYYYMMDD` strings, so lexicographic order is
//! chronological order. The upstream only reports open days; everything else
//! inside the observed range is derived here.

use super::table::{RawValue, Table};
use chrono::{DateTime, Days, NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt::Display;
use tracing::{debug, warn};

pub const DATE_KEY_FORMAT: &str = "%Y%m%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DateStatus {
    Open,
    Holiday,
    Future,
}

impl Display for DateStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                DateStatus::Open => "open",
                DateStatus::Holiday => "holiday",
                DateStatus::Future => "future",
            }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarEntry {
    pub date: String,
    pub status: DateStatus,
}

/// Formats a date as its 8-digit key.
pub fn date_key(date: NaiveDate) -> String {
    date.format(DATE_KEY_FORMAT).to_string()
}

/// Parses an 8-digit key back into a date.
pub fn parse_date_key(key: &str) -> Option<NaiveDate> {
    if key.len() != 8 || !key.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveDate::parse_from_str(key, DATE_KEY_FORMAT).ok()
}

/// Parses the date shapes upstream tables and callers use.
pub fn parse_date_text(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if let Some(date) = parse_date_key(text) {
        return Some(date);
    }
    for format in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return Some(date);
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.date_naive());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt.date());
        }
    }
    None
}

/// Interprets a table cell as a calendar date. Integers shaped like an
/// 8-digit `YYYYMMDD` key are read as one; other integers are epoch
/// milliseconds, the encoding JSON bridges use for timestamps.
pub fn parse_date_value(value: &RawValue) -> Option<NaiveDate> {
    match value {
        RawValue::Str(s) => parse_date_text(s),
        RawValue::Int(key @ 19000101..=29991231) => parse_date_key(&key.to_string())
            .or_else(|| DateTime::from_timestamp_millis(*key).map(|dt| dt.date_naive())),
        RawValue::Int(ms) => DateTime::from_timestamp_millis(*ms).map(|dt| dt.date_naive()),
        RawValue::Date(d) => Some(*d),
        RawValue::DateTime(dt) => Some(dt.date()),
        _ => None,
    }
}

/// Extracts trading dates from an upstream calendar table: the `trade_date`
/// column when present, otherwise the first column. Unparseable cells are
/// skipped.
pub fn dates_from_table(table: &Table) -> Vec<String> {
    let Some(idx) = table.column_index("trade_date").or_else(|| {
        if table.columns().is_empty() {
            None
        } else {
            Some(0)
        }
    }) else {
        return Vec::new();
    };

    let mut skipped = 0usize;
    let dates: Vec<String> = table
        .column_values(idx)
        .filter_map(|value| {
            let parsed = parse_date_value(value).map(date_key);
            if parsed.is_none() {
                skipped += 1;
            }
            parsed
        })
        .collect();

    if skipped > 0 {
        warn!(skipped, "Skipped unparseable trading dates");
    }
    dates
}

/// True iff `date` as an 8-digit integer exceeds today's. Non-numeric input is
/// never in the future.
pub fn is_future(date: &str, today: NaiveDate) -> bool {
    let today_value: u64 = match date_key(today).parse() {
        Ok(v) => v,
        Err(_) => return false,
    };
    date.trim()
        .parse::<u64>()
        .map(|value| value > today_value)
        .unwrap_or(false)
}

/// Builds the contiguous calendar between the earliest and latest date.
///
/// Days after `today` are `future`, known days are `open` and the gaps are
/// `holiday`. If the bounds do not parse, only the known dates are returned,
/// each `open` when not after today and `future` otherwise.
pub fn expand(dates: &[String], today: NaiveDate) -> Vec<CalendarEntry> {
    let (Some(min), Some(max)) = (dates.iter().min(), dates.iter().max()) else {
        return Vec::new();
    };

    let (Some(start), Some(end)) = (parse_date_key(min), parse_date_key(max)) else {
        warn!(%min, %max, "Calendar bounds unparseable, holiday gaps not synthesized");
        let today_key = date_key(today);
        return dates
            .iter()
            .map(|d| CalendarEntry {
                date: d.clone(),
                status: if d.as_str() <= today_key.as_str() {
                    DateStatus::Open
                } else {
                    DateStatus::Future
                },
            })
            .collect();
    };

    let known: HashSet<&str> = dates.iter().map(String::as_str).collect();
    let mut entries = Vec::new();
    let mut current = start;
    while current <= end {
        let key = date_key(current);
        let status = if current > today {
            DateStatus::Future
        } else if known.contains(key.as_str()) {
            DateStatus::Open
        } else {
            DateStatus::Holiday
        };
        entries.push(CalendarEntry { date: key, status });
        current = match current.checked_add_days(Days::new(1)) {
            Some(next) => next,
            None => break,
        };
    }
    debug!(days = entries.len(), "Expanded trading calendar");
    entries
}

/// The known trading dates, ascending and deduplicated.
#[derive(Debug, Clone, Default)]
pub struct TradingCalendar {
    dates: Vec<String>,
    index: HashSet<String>,
}

impl TradingCalendar {
    pub fn new(mut dates: Vec<String>) -> Self {
        dates.sort();
        dates.dedup();
        let index = dates.iter().cloned().collect();
        Self { dates, index }
    }

    pub fn dates(&self) -> &[String] {
        &self.dates
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn contains(&self, date: &str) -> bool {
        self.index.contains(date)
    }

    pub fn latest(&self) -> Option<&str> {
        self.dates.last().map(String::as_str)
    }

    pub fn expand(&self, today: NaiveDate) -> Vec<CalendarEntry> {
        expand(&self.dates, today)
    }

    /// Latest known date strictly before `pivot`, which defaults to today.
    pub fn last_open_before(&self, pivot: Option<&str>, today: NaiveDate) -> Option<&str> {
        let today_key;
        let pivot = match pivot {
            Some(p) => p,
            None => {
                today_key = date_key(today);
                today_key.as_str()
            }
        };
        self.dates
            .iter()
            .rev()
            .find(|d| d.as_str() < pivot)
            .map(String::as_str)
    }
}
