use super::{OutputFormat, render_json, ui};
use crate::core::{FetchStatus, HistoryQuery, HistoryResult, HistoryService};
use anyhow::Result;
use futures::future::join_all;
use tracing::debug;

impl HistoryResult {
    pub fn display_as_table(&self) -> String {
        let mut output = format!(
            "History: {} ({})\n",
            ui::style_text(&self.code, ui::StyleType::Title),
            self.provider
        );
        match self.status {
            FetchStatus::Ok => output.push_str(&ui::records_table(&self.data).to_string()),
            FetchStatus::Empty => {
                output.push_str(&ui::style_text(&self.message, ui::StyleType::Warning))
            }
            FetchStatus::Error => {
                output.push_str(&ui::style_text(&self.message, ui::StyleType::Error))
            }
        }
        output
    }
}

/// Fetches every code concurrently, one query per code built from `template`.
pub async fn fetch_all(
    service: &HistoryService,
    template: &HistoryQuery,
    codes: &[String],
) -> Vec<HistoryResult> {
    let pb = ui::new_progress_bar(codes.len() as u64, true);
    pb.set_message("Fetching history...");

    let futures = codes.iter().map(|code| {
        let pb_clone = pb.clone();
        let query = HistoryQuery {
            code: code.clone(),
            ..template.clone()
        };
        async move {
            let result = service.fetch(&query).await;
            pb_clone.inc(1);
            result
        }
    });

    let results = join_all(futures).await;
    pb.finish_and_clear();
    debug!(count = results.len(), "History fetched");
    results
}

/// A single result renders as an object, several as a list.
pub fn render(results: &[HistoryResult], format: OutputFormat) -> Result<String> {
    match (format, results) {
        (OutputFormat::Json, [single]) => render_json(single),
        (OutputFormat::Json, _) => render_json(results),
        (OutputFormat::Table, _) => Ok(results
            .iter()
            .map(HistoryResult::display_as_table)
            .collect::<Vec<_>>()
            .join("\n\n")),
    }
}
