//! Daily exchange summary resolution.
//!
//! Every request ends in exactly one [`SummaryStatus`]; the checks run in a
//! fixed order and the first one that applies decides the result.

use super::calendar::{date_key, is_future, parse_date_text};
use super::clock::Clock;
use super::sanitize::{SanitizedRecord, sanitize_table};
use super::source::DailySummarySource;
use super::store::CalendarStore;
use serde::Serialize;
use std::fmt::Display;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryStatus {
    Ok,
    Holiday,
    Future,
    TodayIncomplete,
    Error,
}

impl Display for SummaryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                SummaryStatus::Ok => "ok",
                SummaryStatus::Holiday => "holiday",
                SummaryStatus::Future => "future",
                SummaryStatus::TodayIncomplete => "today_incomplete",
                SummaryStatus::Error => "error",
            }
        )
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SummaryResult {
    pub date: String,
    pub data: Vec<SanitizedRecord>,
    /// Mirrors `status == holiday` for older clients.
    pub holiday: bool,
    pub message: String,
    pub status: SummaryStatus,
    pub last_open_date: Option<String>,
}

impl SummaryResult {
    fn new(date: String, status: SummaryStatus, message: String) -> Self {
        Self {
            date,
            data: Vec::new(),
            holiday: status == SummaryStatus::Holiday,
            message,
            status,
            last_open_date: None,
        }
    }

    fn with_last_open(mut self, last_open_date: Option<String>) -> Self {
        self.last_open_date = last_open_date;
        self
    }
}

pub struct SummaryResolver {
    store: Arc<CalendarStore>,
    source: Arc<dyn DailySummarySource>,
    clock: Arc<dyn Clock>,
}

impl SummaryResolver {
    pub fn new(
        store: Arc<CalendarStore>,
        source: Arc<dyn DailySummarySource>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            source,
            clock,
        }
    }

    #[instrument(name = "ResolveDailySummary", skip(self))]
    pub async fn resolve(&self, date: Option<&str>) -> SummaryResult {
        let today = self.clock.today();
        let today_key = date_key(today);
        let calendar = self.store.load().await;

        let requested = date.map(str::trim).filter(|d| !d.is_empty());

        if calendar.is_empty() {
            return SummaryResult::new(
                requested.unwrap_or_default().to_string(),
                SummaryStatus::Error,
                "calendar unavailable".to_string(),
            );
        }

        let date = match requested {
            Some(raw) => match parse_date_text(raw) {
                Some(parsed) => date_key(parsed),
                None => {
                    return SummaryResult::new(
                        raw.to_string(),
                        SummaryStatus::Error,
                        format!("invalid date '{raw}', expected YYYYMMDD"),
                    );
                }
            },
            None => {
                let fallback = calendar
                    .last_open_before(None, today)
                    .or_else(|| calendar.latest())
                    .unwrap_or_default()
                    .to_string();
                debug!(date = %fallback, "No date supplied, using last open date");
                fallback
            }
        };

        let last_open_date = calendar
            .last_open_before(Some(date.as_str()), today)
            .map(str::to_string);

        if is_future(&date, today) {
            return SummaryResult::new(
                date.clone(),
                SummaryStatus::Future,
                format!("{date} is in the future, the market has not opened yet"),
            )
            .with_last_open(last_open_date);
        }

        if !calendar.contains(&date) {
            return SummaryResult::new(
                date.clone(),
                SummaryStatus::Holiday,
                format!("{date} is not a trading day"),
            )
            .with_last_open(last_open_date);
        }

        if date == today_key {
            return SummaryResult::new(
                date,
                SummaryStatus::TodayIncomplete,
                "today's session has not closed, figures are not final; query the previous open day or retry later"
                    .to_string(),
            )
            .with_last_open(last_open_date);
        }

        let table = match self.source.fetch_daily_summary(&date).await {
            Ok(Some(table)) => table,
            Ok(None) => {
                return SummaryResult::new(
                    date,
                    SummaryStatus::Error,
                    "upstream returned no data, the exchange may not have published it yet"
                        .to_string(),
                )
                .with_last_open(last_open_date);
            }
            Err(e) => {
                warn!(error = %e, %date, "Daily summary request failed");
                return SummaryResult::new(
                    date,
                    SummaryStatus::Error,
                    format!("request failed: {e}"),
                )
                .with_last_open(last_open_date);
            }
        };

        if table.is_empty() {
            return SummaryResult::new(
                date,
                SummaryStatus::Error,
                "upstream returned an empty table".to_string(),
            )
            .with_last_open(last_open_date);
        }

        let mut result = SummaryResult::new(date, SummaryStatus::Ok, "success".to_string())
            .with_last_open(last_open_date);
        result.data = sanitize_table(&table);
        debug!(records = result.data.len(), "Daily summary resolved");
        result
    }
}
