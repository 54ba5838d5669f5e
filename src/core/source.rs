//! Upstream data seams.
//!
//! Each trait covers one upstream concern. Implementations return raw tables;
//! normalisation and sanitisation happen in the core.

use super::table::Table;
use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use std::fmt::Display;
use std::str::FromStr;

#[async_trait]
pub trait CalendarSource: Send + Sync {
    /// Table of known trading dates.
    async fn fetch_trading_calendar(&self) -> Result<Table>;
}

#[async_trait]
pub trait DailySummarySource: Send + Sync {
    /// Exchange summary for an 8-digit date. `None` when the upstream has
    /// nothing for that day.
    async fn fetch_daily_summary(&self, date: &str) -> Result<Option<Table>>;
}

#[async_trait]
pub trait HistorySource: Send + Sync {
    /// Daily bars. `request.symbol` is already formatted for `request.provider`.
    async fn fetch_history(&self, request: &HistoryRequest) -> Result<Table>;
}

#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// Realtime snapshot for one 6-digit code.
    async fn fetch_realtime(&self, code: &str) -> Result<Table>;

    /// Realtime snapshot of the whole market.
    async fn fetch_market_snapshot(&self) -> Result<Table>;
}

/// Price adjustment applied to historical bars.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Adjustment {
    #[default]
    None,
    /// Forward adjusted.
    Qfq,
    /// Backward adjusted.
    Hfq,
}

impl Adjustment {
    /// Upstream parameter value; unadjusted is the empty string.
    pub fn as_param(&self) -> &'static str {
        match self {
            Adjustment::None => "",
            Adjustment::Qfq => "qfq",
            Adjustment::Hfq => "hfq",
        }
    }
}

impl FromStr for Adjustment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "none" => Ok(Adjustment::None),
            "qfq" => Ok(Adjustment::Qfq),
            "hfq" => Ok(Adjustment::Hfq),
            _ => Err(anyhow::anyhow!("Invalid adjustment: {}", s)),
        }
    }
}

/// Upstream endpoint family for historical bars.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryProvider {
    #[default]
    EastMoney,
    Sina,
    Tencent,
}

impl HistoryProvider {
    /// Formats a caller supplied code the way this provider expects it.
    pub fn format_symbol(&self, code: &str) -> String {
        match self {
            HistoryProvider::EastMoney => plain_code(code),
            HistoryProvider::Sina | HistoryProvider::Tencent => exchange_prefixed(code),
        }
    }

    pub fn request(
        &self,
        code: &str,
        start_date: Option<&str>,
        end_date: Option<&str>,
        adjust: Adjustment,
    ) -> HistoryRequest {
        HistoryRequest {
            provider: *self,
            symbol: self.format_symbol(code),
            start_date: start_date.map(str::to_string),
            end_date: end_date.map(str::to_string),
            adjust,
        }
    }
}

impl Display for HistoryProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                HistoryProvider::EastMoney => "eastmoney",
                HistoryProvider::Sina => "sina",
                HistoryProvider::Tencent => "tencent",
            }
        )
    }
}

impl FromStr for HistoryProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "eastmoney" => Ok(HistoryProvider::EastMoney),
            "sina" => Ok(HistoryProvider::Sina),
            "tencent" => Ok(HistoryProvider::Tencent),
            _ => Err(anyhow::anyhow!("Invalid history provider: {}", s)),
        }
    }
}

/// A provider-ready history call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRequest {
    pub provider: HistoryProvider,
    pub symbol: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub adjust: Adjustment,
}

/// Last six characters of the code, or the whole code when shorter.
pub fn plain_code(code: &str) -> String {
    let chars: Vec<char> = code.trim().chars().collect();
    let start = chars.len().saturating_sub(6);
    chars[start..].iter().collect()
}

/// Lower-cased code with an `sh`/`sz` exchange prefix. Codes starting with 6
/// trade in Shanghai.
pub fn exchange_prefixed(code: &str) -> String {
    let code = code.trim().to_lowercase();
    if code.starts_with("sh") || code.starts_with("sz") {
        code
    } else if code.starts_with('6') {
        format!("sh{code}")
    } else {
        format!("sz{code}")
    }
}
