use super::{OutputFormat, render_json, ui};
use crate::core::{SummaryResult, SummaryStatus};
use anyhow::Result;

impl SummaryResult {
    pub fn display_as_table(&self) -> String {
        let style_type = match self.status {
            SummaryStatus::Ok => ui::StyleType::Success,
            SummaryStatus::Holiday | SummaryStatus::Future | SummaryStatus::TodayIncomplete => {
                ui::StyleType::Warning
            }
            SummaryStatus::Error => ui::StyleType::Error,
        };

        let mut output = format!(
            "SSE daily summary: {}\n",
            ui::style_text(&self.date, ui::StyleType::Title)
        );
        output.push_str(&format!(
            "Status: {} ({})\n",
            ui::style_text(&self.status.to_string(), style_type),
            self.message
        ));
        if let Some(last_open) = &self.last_open_date {
            output.push_str(&format!(
                "{}\n",
                ui::style_text(&format!("Previous open day: {last_open}"), ui::StyleType::Subtle)
            ));
        }

        if !self.data.is_empty() {
            output.push('\n');
            output.push_str(&ui::records_table(&self.data).to_string());
        }
        output
    }
}

pub fn render(result: &SummaryResult, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => render_json(result),
        OutputFormat::Table => Ok(result.display_as_table()),
    }
}
