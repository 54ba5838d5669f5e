use chrono::NaiveDate;
use finlens::cli::OutputFormat;
use finlens::core::FixedClock;
use finlens::providers::AkToolsProvider;
use finlens::{App, AppCommand};
use serde_json::Value;
use std::fs;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

// Adds automatic logging to test
mod test_utils {
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub async fn mount(server: &MockServer, function: &str, body: &str) {
        Mock::given(method("GET"))
            .and(path(format!("/api/public/{function}")))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(server)
            .await;
    }

    pub async fn mount_with_param(
        server: &MockServer,
        function: &str,
        key: &str,
        value: &str,
        body: &str,
    ) {
        Mock::given(method("GET"))
            .and(path(format!("/api/public/{function}")))
            .and(query_param(key, value))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(server)
            .await;
    }

    pub async fn create_bridge_mock_server() -> MockServer {
        let server = MockServer::start().await;
        mount(
            &server,
            "tool_trade_date_hist_sina",
            r#"[{"trade_date":"2024-01-02"},{"trade_date":"2024-01-03"},{"trade_date":"2024-01-05"}]"#,
        )
        .await;
        mount_with_param(
            &server,
            "stock_sse_deal_daily",
            "date",
            "20240103",
            r#"[{"单日情况":"挂牌数","股票":2150.0,"主板A":1691.0},{"单日情况":"市盈率","股票":null,"主板A":12.5}]"#,
        )
        .await;
        mount_with_param(
            &server,
            "stock_zh_a_hist",
            "symbol",
            "600000",
            r#"[{"日期":"2024-01-02","开盘":7.0,"收盘":7.1,"涨跌幅":1.4}]"#,
        )
        .await;
        mount_with_param(
            &server,
            "stock_zh_a_hist_tx",
            "symbol",
            "sz000001",
            r#"[{"date":"2024-01-02","open":9.1,"close":9.2,"amount":1000.0}]"#,
        )
        .await;
        mount(
            &server,
            "stock_zh_a_spot_em",
            r#"[{"代码":"600000","名称":"浦发银行","最新价":7.12},{"代码":"000001","名称":"平安银行","最新价":9.2},{"代码":"300750","名称":"宁德时代","最新价":180.3}]"#,
        )
        .await;
        server
    }
}

fn app_with_today(uri: &str, today: NaiveDate) -> App {
    let provider = AkToolsProvider::new(uri, Duration::from_secs(5)).expect("client");
    App::new(Arc::new(provider), Arc::new(FixedClock(today)))
}

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

async fn execute_json(app: &App, command: AppCommand) -> Value {
    let output = app
        .execute(command, OutputFormat::Json)
        .await
        .expect("command failed");
    serde_json::from_str(&output).expect("output is JSON")
}

#[test_log::test(tokio::test)]
async fn test_trade_dates_with_status() {
    let server = test_utils::create_bridge_mock_server().await;
    let app = app_with_today(&server.uri(), ymd(2024, 1, 4));

    let dates = execute_json(&app, AppCommand::TradeDates { with_status: false }).await;
    assert_eq!(dates, serde_json::json!(["20240102", "20240103", "20240105"]));

    let entries = execute_json(&app, AppCommand::TradeDates { with_status: true }).await;
    info!(?entries, "Expanded calendar");
    assert_eq!(
        entries,
        serde_json::json!([
            {"date": "20240102", "status": "open"},
            {"date": "20240103", "status": "open"},
            {"date": "20240104", "status": "holiday"},
            {"date": "20240105", "status": "future"}
        ])
    );

    let last_open = execute_json(&app, AppCommand::LastOpen { before: None }).await;
    assert_eq!(last_open["last_open_date"], "20240103");
    assert_eq!(last_open["before"], "20240104");
}

#[test_log::test(tokio::test)]
async fn test_summary_states() {
    let server = test_utils::create_bridge_mock_server().await;
    let app = app_with_today(&server.uri(), ymd(2024, 1, 4));

    let ok = execute_json(&app, AppCommand::Summary { date: None }).await;
    assert_eq!(ok["status"], "ok");
    assert_eq!(ok["date"], "20240103");
    assert_eq!(ok["holiday"], false);
    assert_eq!(ok["last_open_date"], "20240102");
    assert_eq!(ok["data"].as_array().unwrap().len(), 2);
    assert!(ok["data"][1]["股票"].is_null());

    let holiday = execute_json(
        &app,
        AppCommand::Summary {
            date: Some("20240104".to_string()),
        },
    )
    .await;
    assert_eq!(holiday["status"], "holiday");
    assert_eq!(holiday["holiday"], true);

    let future = execute_json(
        &app,
        AppCommand::Summary {
            date: Some("20240105".to_string()),
        },
    )
    .await;
    assert_eq!(future["status"], "future");
    assert_eq!(future["data"], serde_json::json!([]));
}

#[test_log::test(tokio::test)]
async fn test_summary_today_incomplete() {
    let server = test_utils::create_bridge_mock_server().await;
    let app = app_with_today(&server.uri(), ymd(2024, 1, 3));

    let today = execute_json(
        &app,
        AppCommand::Summary {
            date: Some("20240103".to_string()),
        },
    )
    .await;
    assert_eq!(today["status"], "today_incomplete");
    assert_eq!(today["data"], serde_json::json!([]));
}

#[test_log::test(tokio::test)]
async fn test_history_across_providers() {
    let server = test_utils::create_bridge_mock_server().await;
    let app = app_with_today(&server.uri(), ymd(2024, 1, 4));

    let eastmoney = execute_json(
        &app,
        AppCommand::History {
            codes: vec!["sh600000".to_string()],
            start_date: None,
            end_date: None,
            adjust: Default::default(),
            provider: finlens::core::HistoryProvider::EastMoney,
        },
    )
    .await;
    assert_eq!(eastmoney["status"], "ok");
    assert_eq!(eastmoney["data"][0]["涨跌幅"], 1.4);
    assert_eq!(eastmoney["data"][0]["股票代码"], "sh600000");

    let both = execute_json(
        &app,
        AppCommand::History {
            codes: vec!["000001".to_string(), "300750".to_string()],
            start_date: None,
            end_date: None,
            adjust: Default::default(),
            provider: finlens::core::HistoryProvider::Tencent,
        },
    )
    .await;
    let results = both.as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["status"], "ok");
    assert_eq!(results[0]["data"][0]["日期"], "2024-01-02");
    assert_eq!(results[0]["data"][0]["成交额"], 1000.0);
    assert_eq!(results[0]["data"][0]["股票代码"], "000001");
    // No mock for sz300750
    assert_eq!(results[1]["status"], "error");
}

#[test_log::test(tokio::test)]
async fn test_batch_quotes_from_snapshot() {
    let server = test_utils::create_bridge_mock_server().await;
    let app = app_with_today(&server.uri(), ymd(2024, 1, 4));

    let quotes = execute_json(
        &app,
        AppCommand::Quote {
            codes: vec!["600000".to_string(), "sz000001".to_string()],
        },
    )
    .await;
    assert_eq!(quotes["status"], "ok");
    let names: Vec<&str> = quotes["data"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|r| r["名称"].as_str())
        .collect();
    assert_eq!(names, vec!["浦发银行", "平安银行"]);
}

#[test_log::test(tokio::test)]
async fn test_unreachable_bridge_degrades() {
    // Nothing listens on the discard port
    let app = app_with_today("http://127.0.0.1:9", ymd(2024, 1, 4));

    let dates = execute_json(&app, AppCommand::TradeDates { with_status: true }).await;
    assert_eq!(dates, serde_json::json!([]));

    let summary = execute_json(&app, AppCommand::Summary { date: None }).await;
    assert_eq!(summary["status"], "error");
    assert_eq!(summary["message"], "calendar unavailable");
}

#[test_log::test(tokio::test)]
async fn test_full_app_flow_with_config_file() {
    let server = test_utils::create_bridge_mock_server().await;

    let config_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    let config_path = config_file.path();
    let config_content = format!(
        r#"
        providers:
          aktools:
            base_url: {}
            timeout_secs: 5
    "#,
        server.uri()
    );
    fs::write(config_path, &config_content).expect("Failed to write config file");

    let result = finlens::run_command(
        AppCommand::Summary {
            date: Some("20240103".to_string()),
        },
        Some(config_path.to_str().unwrap()),
        OutputFormat::Table,
    )
    .await;
    assert!(
        result.is_ok(),
        "Main function failed with: {:?}",
        result.err()
    );
}

#[test_log::test(tokio::test)]
async fn test_missing_config_file_fails() {
    let result = finlens::run_command(
        AppCommand::TradeDates { with_status: false },
        Some("/nonexistent/finlens/config.yaml"),
        OutputFormat::Json,
    )
    .await;
    assert!(result.is_err());
}
