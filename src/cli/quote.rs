use super::{OutputFormat, render_json, ui};
use crate::core::{FetchStatus, QuoteResult, QuoteService};
use anyhow::Result;

impl QuoteResult {
    pub fn display_as_table(&self) -> String {
        let mut output = format!(
            "Quotes: {}\n",
            ui::style_text(&self.codes.join(", "), ui::StyleType::Title)
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

/// One code uses the single-symbol endpoint; several are served from one
/// market snapshot.
pub async fn fetch(service: &QuoteService, codes: &[String]) -> QuoteResult {
    match codes {
        [code] => service.quote(code).await,
        _ => service.batch(codes).await,
    }
}

pub fn render(result: &QuoteResult, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => render_json(result),
        OutputFormat::Table => Ok(result.display_as_table()),
    }
}
