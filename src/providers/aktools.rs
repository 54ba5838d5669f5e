//! AKTools-style HTTP bridge.
//!
//! Every upstream function is exposed as `GET {base_url}/api/public/{function}`
//! with its arguments as query parameters, and answers with a JSON array of
//! row objects.

use crate::core::source::{
    CalendarSource, DailySummarySource, HistoryProvider, HistoryRequest, HistorySource,
    QuoteSource,
};
use crate::core::table::Table;
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Url;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument};

pub const TRADE_CALENDAR: &str = "tool_trade_date_hist_sina";
pub const SSE_DAILY_SUMMARY: &str = "stock_sse_deal_daily";
pub const EASTMONEY_HISTORY: &str = "stock_zh_a_hist";
pub const SINA_HISTORY: &str = "stock_zh_a_daily";
pub const TENCENT_HISTORY: &str = "stock_zh_a_hist_tx";
pub const BID_ASK: &str = "stock_bid_ask_em";
pub const MARKET_SNAPSHOT: &str = "stock_zh_a_spot_em";

pub struct AkToolsProvider {
    base_url: String,
    client: reqwest::Client,
}

impl AkToolsProvider {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("finlens/0.1")
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn endpoint(&self, function: &str, params: &[(&str, &str)]) -> Result<Url> {
        let url = format!("{}/api/public/{}", self.base_url, function);
        let params = params.iter().filter(|(_, value)| !value.is_empty());
        Url::parse_with_params(&url, params).with_context(|| format!("Invalid upstream URL: {url}"))
    }

    /// Calls one upstream function. `None` means the upstream answered with
    /// an empty body or JSON null.
    async fn call(&self, function: &str, params: &[(&str, &str)]) -> Result<Option<Table>> {
        let url = self.endpoint(function, params)?;
        debug!("Requesting {}", url);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {} for function: {}", e, function))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error: {} for function: {}",
                response.status(),
                function
            ));
        }

        let text = response
            .text()
            .await
            .with_context(|| format!("Failed to get response text for {function}"))?;
        if text.trim().is_empty() {
            return Ok(None);
        }

        let value: Value = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse response for {function}"))?;
        if value.is_null() {
            return Ok(None);
        }
        let table = Table::from_json(value);
        debug!(rows = table.len(), columns = table.columns().len(), "Received table");
        Ok(Some(table))
    }

    async fn call_table(&self, function: &str, params: &[(&str, &str)]) -> Result<Table> {
        Ok(self.call(function, params).await?.unwrap_or_default())
    }

    async fn fetch_eastmoney(&self, request: &HistoryRequest) -> Result<Table> {
        self.call_table(
            EASTMONEY_HISTORY,
            &[
                ("symbol", request.symbol.as_str()),
                ("period", "daily"),
                ("start_date", request.start_date.as_deref().unwrap_or_default()),
                ("end_date", request.end_date.as_deref().unwrap_or_default()),
                ("adjust", request.adjust.as_param()),
            ],
        )
        .await
    }

    async fn fetch_prefixed(&self, function: &str, request: &HistoryRequest) -> Result<Table> {
        self.call_table(
            function,
            &[
                ("symbol", request.symbol.as_str()),
                ("start_date", request.start_date.as_deref().unwrap_or_default()),
                ("end_date", request.end_date.as_deref().unwrap_or_default()),
                ("adjust", request.adjust.as_param()),
            ],
        )
        .await
    }
}

#[async_trait]
impl CalendarSource for AkToolsProvider {
    async fn fetch_trading_calendar(&self) -> Result<Table> {
        self.call_table(TRADE_CALENDAR, &[]).await
    }
}

#[async_trait]
impl DailySummarySource for AkToolsProvider {
    #[instrument(name = "AkToolsDailySummary", skip(self))]
    async fn fetch_daily_summary(&self, date: &str) -> Result<Option<Table>> {
        self.call(SSE_DAILY_SUMMARY, &[("date", date)]).await
    }
}

#[async_trait]
impl HistorySource for AkToolsProvider {
    #[instrument(
        name = "AkToolsHistory",
        skip(self, request),
        fields(symbol = %request.symbol, provider = %request.provider)
    )]
    async fn fetch_history(&self, request: &HistoryRequest) -> Result<Table> {
        match request.provider {
            HistoryProvider::EastMoney => self.fetch_eastmoney(request).await,
            HistoryProvider::Sina => self.fetch_prefixed(SINA_HISTORY, request).await,
            HistoryProvider::Tencent => self.fetch_prefixed(TENCENT_HISTORY, request).await,
        }
    }
}

#[async_trait]
impl QuoteSource for AkToolsProvider {
    #[instrument(name = "AkToolsRealtime", skip(self))]
    async fn fetch_realtime(&self, code: &str) -> Result<Table> {
        self.call_table(BID_ASK, &[("symbol", code)]).await
    }

    async fn fetch_market_snapshot(&self) -> Result<Table> {
        self.call_table(MARKET_SNAPSHOT, &[]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::source::Adjustment;
    use crate::core::table::RawValue;
    use wiremock::matchers::{method, path, query_param, query_param_is_missing};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn create_mock_server(function: &str, status: u16, body: &str) -> MockServer {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("/api/public/{function}")))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&mock_server)
            .await;
        mock_server
    }

    fn provider(mock_server: &MockServer) -> AkToolsProvider {
        AkToolsProvider::new(&mock_server.uri(), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_trading_calendar_fetch() {
        let body = r#"[{"trade_date":"1990-12-19"},{"trade_date":"1990-12-20"}]"#;
        let mock_server = create_mock_server(TRADE_CALENDAR, 200, body).await;

        let table = provider(&mock_server).fetch_trading_calendar().await.unwrap();
        assert_eq!(table.columns(), &["trade_date"]);
        assert_eq!(table.len(), 2);
    }

    #[tokio::test]
    async fn test_daily_summary_passes_date_and_handles_null() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("/api/public/{SSE_DAILY_SUMMARY}")))
            .and(query_param("date", "20240103"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"[{"单日情况":"挂牌数","股票":2150.0}]"#),
            )
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("/api/public/{SSE_DAILY_SUMMARY}")))
            .and(query_param("date", "20240102"))
            .respond_with(ResponseTemplate::new(200).set_body_string("null"))
            .mount(&mock_server)
            .await;

        let provider = provider(&mock_server);
        let table = provider.fetch_daily_summary("20240103").await.unwrap().unwrap();
        assert_eq!(table.rows()[0][0], RawValue::from("挂牌数"));
        assert!(provider.fetch_daily_summary("20240102").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_history_uses_provider_function() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("/api/public/{SINA_HISTORY}")))
            .and(query_param("symbol", "sh600000"))
            .and(query_param("adjust", "qfq"))
            .and(query_param_is_missing("end_date"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"[{"date":"2024-01-02","open":7.0,"close":7.1,"volume":1000}]"#,
            ))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("/api/public/{EASTMONEY_HISTORY}")))
            .and(query_param("symbol", "600000"))
            .and(query_param("period", "daily"))
            .and(query_param_is_missing("adjust"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(r#"[{"日期":"2024-01-02"}]"#),
            )
            .mount(&mock_server)
            .await;

        let provider = provider(&mock_server);
        let sina = HistoryProvider::Sina.request("600000", Some("20240101"), None, Adjustment::Qfq);
        let table = provider.fetch_history(&sina).await.unwrap();
        assert_eq!(table.columns(), &["date", "open", "close", "volume"]);

        let eastmoney =
            HistoryProvider::EastMoney.request("sh600000", None, None, Adjustment::None);
        let table = provider.fetch_history(&eastmoney).await.unwrap();
        assert_eq!(table.len(), 1);
    }

    #[tokio::test]
    async fn test_http_error_is_reported() {
        let mock_server = create_mock_server(MARKET_SNAPSHOT, 500, "boom").await;

        let result = provider(&mock_server).fetch_market_snapshot().await;
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("HTTP error: 500"));
    }

    #[tokio::test]
    async fn test_invalid_json_is_reported() {
        let mock_server = create_mock_server(BID_ASK, 200, "<html>").await;

        let result = provider(&mock_server).fetch_realtime("600000").await;
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to parse response")
        );
    }

    #[tokio::test]
    async fn test_empty_body_is_empty_table() {
        let mock_server = create_mock_server(MARKET_SNAPSHOT, 200, "").await;

        let table = provider(&mock_server).fetch_market_snapshot().await.unwrap();
        assert!(table.is_empty());
    }
}
