//! Historical bars: column normalisation and the fetch pipeline.

use super::calendar::parse_date_value;
use super::sanitize::{SanitizedRecord, sanitize_table};
use super::source::{Adjustment, HistoryProvider, HistorySource};
use super::table::{RawValue, Table};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Canonical history field names, as the client tables expect them.
pub mod field {
    pub const DATE: &str = "日期";
    pub const OPEN: &str = "开盘";
    pub const CLOSE: &str = "收盘";
    pub const HIGH: &str = "最高";
    pub const LOW: &str = "最低";
    pub const VOLUME: &str = "成交量";
    pub const AMOUNT: &str = "成交额";
    pub const TURNOVER: &str = "换手率";
    pub const AMPLITUDE: &str = "振幅";
    pub const PCT_CHANGE: &str = "涨跌幅";
    pub const CHANGE: &str = "涨跌额";
    pub const CODE: &str = "股票代码";
}

enum Match {
    Exact(&'static str),
    Contains(&'static str),
}

impl Match {
    fn test(&self, lowered: &str) -> bool {
        match self {
            Match::Exact(token) => lowered == *token,
            Match::Contains(token) => lowered.contains(token),
        }
    }
}

struct Rule {
    canonical: &'static str,
    matchers: &'static [Match],
}

// Order matters: the first matching rule names the column.
const RULES: &[Rule] = &[
    Rule {
        canonical: field::DATE,
        matchers: &[
            Match::Contains("date"),
            Match::Contains("交易"),
            Match::Contains("日期"),
        ],
    },
    Rule {
        canonical: field::OPEN,
        matchers: &[Match::Exact("open"), Match::Contains("开盘")],
    },
    Rule {
        canonical: field::CLOSE,
        matchers: &[Match::Exact("close"), Match::Contains("收盘")],
    },
    Rule {
        canonical: field::HIGH,
        matchers: &[Match::Exact("high"), Match::Contains("最高")],
    },
    Rule {
        canonical: field::LOW,
        matchers: &[Match::Exact("low"), Match::Contains("最低")],
    },
    Rule {
        canonical: field::VOLUME,
        matchers: &[
            Match::Contains("volume"),
            Match::Contains("成交量"),
            Match::Exact("vol"),
        ],
    },
    Rule {
        canonical: field::AMOUNT,
        matchers: &[Match::Exact("amount"), Match::Contains("成交额")],
    },
    Rule {
        canonical: field::TURNOVER,
        matchers: &[Match::Contains("turnover"), Match::Contains("换手率")],
    },
    Rule {
        canonical: field::AMPLITUDE,
        matchers: &[Match::Contains("amplitude"), Match::Contains("振幅")],
    },
    Rule {
        canonical: field::PCT_CHANGE,
        matchers: &[Match::Contains("pct"), Match::Contains("涨跌幅")],
    },
    Rule {
        canonical: field::CHANGE,
        matchers: &[Match::Exact("change"), Match::Contains("涨跌额")],
    },
    Rule {
        canonical: field::CODE,
        matchers: &[
            Match::Exact("code"),
            Match::Exact("symbol"),
            Match::Contains("代码"),
        ],
    },
];

/// Canonical name for a source column, if any rule recognises it.
pub fn canonical_name(column: &str) -> Option<&'static str> {
    let lowered = column.to_lowercase();
    RULES
        .iter()
        .find(|rule| rule.matchers.iter().any(|m| m.test(&lowered)))
        .map(|rule| rule.canonical)
}

/// Maps provider columns onto the canonical schema.
///
/// Unrecognised columns keep their names. When several columns map to the same
/// canonical name the first one wins. The date column is rewritten as
/// `YYYY-MM-DD`, or stringified as-is when any cell fails to parse. A code
/// column holding `symbol` is added when the source has none.
pub fn normalize(mut table: Table, symbol: &str) -> Table {
    let mut winners: Vec<(usize, &'static str)> = Vec::new();
    let mut losers: Vec<usize> = Vec::new();
    for (idx, column) in table.columns().iter().enumerate() {
        let Some(name) = canonical_name(column) else {
            continue;
        };
        if winners.iter().any(|(_, taken)| *taken == name) {
            if column == name {
                losers.push(idx);
            }
        } else {
            winners.push((idx, name));
        }
    }

    // A later column already carrying a won name steps aside first
    for idx in losers {
        let alias = unique_alias(&table, &table.columns()[idx]);
        debug!(column = %table.columns()[idx], %alias, "Canonical name taken by an earlier column");
        table.rename_column(idx, &alias);
    }
    for (idx, name) in winners {
        table.rename_column(idx, name);
    }

    if let Some(idx) = table.column_index(field::DATE) {
        format_date_column(&mut table, idx);
    }

    if !table.has_column(field::CODE) {
        table.add_constant_column(field::CODE, RawValue::Str(symbol.to_string()));
    }

    table
}

fn unique_alias(table: &Table, name: &str) -> String {
    (1..)
        .map(|n| format!("{name}.{n}"))
        .find(|alias| !table.has_column(alias))
        .unwrap_or_else(|| name.to_string())
}

fn format_date_column(table: &mut Table, idx: usize) {
    let all_parse = table
        .column_values(idx)
        .all(|v| matches!(v, RawValue::Null) || parse_date_value(v).is_some());

    if all_parse {
        table.map_column(idx, |v| match parse_date_value(v) {
            Some(date) => RawValue::Str(date.format("%Y-%m-%d").to_string()),
            None => RawValue::Null,
        });
    } else {
        warn!("History dates unparseable, keeping raw text");
        table.map_column(idx, stringify);
    }
}

fn stringify(value: &RawValue) -> RawValue {
    match value {
        RawValue::Null => RawValue::Null,
        RawValue::Str(s) => RawValue::Str(s.clone()),
        RawValue::Int(i) => RawValue::Str(i.to_string()),
        RawValue::UInt(u) => RawValue::Str(u.to_string()),
        RawValue::Float(f) => RawValue::Str(f.to_string()),
        RawValue::Bool(b) => RawValue::Str(b.to_string()),
        RawValue::Date(d) => RawValue::Str(d.to_string()),
        RawValue::DateTime(dt) => RawValue::Str(dt.to_string()),
        RawValue::Json(v) => RawValue::Str(v.to_string()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchStatus {
    Ok,
    Empty,
    Error,
}

#[derive(Debug, Clone, Default)]
pub struct HistoryQuery {
    pub code: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub adjust: Adjustment,
    pub provider: HistoryProvider,
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryResult {
    pub code: String,
    pub provider: HistoryProvider,
    pub status: FetchStatus,
    pub message: String,
    pub data: Vec<SanitizedRecord>,
}

impl HistoryResult {
    fn without_data(
        code: &str,
        provider: HistoryProvider,
        status: FetchStatus,
        message: String,
    ) -> Self {
        Self {
            code: code.to_string(),
            provider,
            status,
            message,
            data: Vec::new(),
        }
    }
}

pub struct HistoryService {
    source: Arc<dyn HistorySource>,
}

impl HistoryService {
    pub fn new(source: Arc<dyn HistorySource>) -> Self {
        Self { source }
    }

    #[instrument(
        name = "FetchHistory",
        skip(self, query),
        fields(code = %query.code, provider = %query.provider)
    )]
    pub async fn fetch(&self, query: &HistoryQuery) -> HistoryResult {
        let code = query.code.trim();
        if code.is_empty() {
            return HistoryResult::without_data(
                code,
                query.provider,
                FetchStatus::Error,
                "code is required".to_string(),
            );
        }

        let request = query.provider.request(
            code,
            query.start_date.as_deref(),
            query.end_date.as_deref(),
            query.adjust,
        );
        debug!(symbol = %request.symbol, "Requesting history");

        let table = match self.source.fetch_history(&request).await {
            Ok(table) => table,
            Err(e) => {
                warn!(error = %e, "History request failed");
                return HistoryResult::without_data(
                    code,
                    query.provider,
                    FetchStatus::Error,
                    format!("request failed: {e}"),
                );
            }
        };

        if table.is_empty() {
            return HistoryResult::without_data(
                code,
                query.provider,
                FetchStatus::Empty,
                "no data for the requested range".to_string(),
            );
        }

        let normalized = normalize(table, code);
        HistoryResult {
            code: code.to_string(),
            provider: query.provider,
            status: FetchStatus::Ok,
            message: "success".to_string(),
            data: sanitize_table(&normalized),
        }
    }
}
