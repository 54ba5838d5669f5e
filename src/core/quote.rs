//! Realtime quotes for one code or a filtered market snapshot.

use super::history::FetchStatus;
use super::sanitize::{SanitizedRecord, sanitize_table};
use super::source::{QuoteSource, plain_code};
use super::table::{RawValue, Table};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

const CODE_COLUMNS: [&str; 4] = ["代码", "股票代码", "code", "symbol"];

#[derive(Debug, Clone, Serialize)]
pub struct QuoteResult {
    pub codes: Vec<String>,
    pub status: FetchStatus,
    pub message: String,
    pub data: Vec<SanitizedRecord>,
}

impl QuoteResult {
    fn without_data(codes: Vec<String>, status: FetchStatus, message: impl Into<String>) -> Self {
        Self {
            codes,
            status,
            message: message.into(),
            data: Vec::new(),
        }
    }

    fn from_table(codes: Vec<String>, table: &Table) -> Self {
        if table.is_empty() {
            return Self::without_data(codes, FetchStatus::Empty, "no quotes found");
        }
        Self {
            codes,
            status: FetchStatus::Ok,
            message: "success".to_string(),
            data: sanitize_table(table),
        }
    }
}

/// Index of the snapshot's code column, if it has one.
pub fn code_column(table: &Table) -> Option<usize> {
    CODE_COLUMNS
        .iter()
        .find_map(|name| table.column_index(name))
}

fn cell_code(value: &RawValue) -> Option<String> {
    match value {
        RawValue::Str(s) => Some(plain_code(s)),
        RawValue::Int(i) => Some(format!("{i:06}")),
        RawValue::UInt(u) => Some(format!("{u:06}")),
        _ => None,
    }
}

/// Keeps the snapshot rows whose code is one of `codes`. Both sides are
/// compared in their six-digit form.
pub fn filter_snapshot(mut table: Table, codes: &[String]) -> Option<Table> {
    let idx = code_column(&table)?;
    let wanted: HashSet<String> = codes.iter().map(|c| plain_code(c)).collect();
    table.retain_rows(|row| {
        row.get(idx)
            .and_then(cell_code)
            .is_some_and(|code| wanted.contains(&code))
    });
    Some(table)
}

pub struct QuoteService {
    source: Arc<dyn QuoteSource>,
}

impl QuoteService {
    pub fn new(source: Arc<dyn QuoteSource>) -> Self {
        Self { source }
    }

    #[instrument(name = "FetchQuote", skip(self))]
    pub async fn quote(&self, code: &str) -> QuoteResult {
        let code = plain_code(code);
        if code.is_empty() {
            return QuoteResult::without_data(Vec::new(), FetchStatus::Error, "code is required");
        }

        match self.source.fetch_realtime(&code).await {
            Ok(table) => QuoteResult::from_table(vec![code], &table),
            Err(e) => {
                warn!(error = %e, "Realtime quote request failed");
                QuoteResult::without_data(
                    vec![code],
                    FetchStatus::Error,
                    format!("request failed: {e}"),
                )
            }
        }
    }

    /// Quotes for several codes taken from one market snapshot.
    #[instrument(name = "FetchQuoteBatch", skip(self, codes), fields(count = codes.len()))]
    pub async fn batch(&self, codes: &[String]) -> QuoteResult {
        let codes: Vec<String> = codes
            .iter()
            .map(|c| plain_code(c))
            .filter(|c| !c.is_empty())
            .collect();
        if codes.is_empty() {
            return QuoteResult::without_data(codes, FetchStatus::Error, "no codes requested");
        }

        let snapshot = match self.source.fetch_market_snapshot().await {
            Ok(table) => table,
            Err(e) => {
                warn!(error = %e, "Market snapshot request failed");
                return QuoteResult::without_data(
                    codes,
                    FetchStatus::Error,
                    format!("request failed: {e}"),
                );
            }
        };
        debug!(rows = snapshot.len(), "Received market snapshot");

        match filter_snapshot(snapshot, &codes) {
            Some(filtered) => QuoteResult::from_table(codes, &filtered),
            None => QuoteResult::without_data(
                codes,
                FetchStatus::Empty,
                "market snapshot has no code column",
            ),
        }
    }
}
