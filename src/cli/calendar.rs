use super::{OutputFormat, render_json, ui};
use crate::core::{CalendarEntry, DateStatus, TradingCalendar};
use anyhow::Result;
use comfy_table::{Cell, Color};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct LastOpenDate<'a> {
    pub before: String,
    pub last_open_date: Option<&'a str>,
}

fn status_cell(status: DateStatus) -> Cell {
    let color = match status {
        DateStatus::Open => Color::Green,
        DateStatus::Holiday => Color::Yellow,
        DateStatus::Future => Color::DarkGrey,
    };
    Cell::new(status.to_string()).fg(color)
}

pub fn render_dates(calendar: &TradingCalendar, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => render_json(calendar.dates()),
        OutputFormat::Table => {
            if calendar.is_empty() {
                return Ok(ui::style_text(
                    "Trading calendar unavailable",
                    ui::StyleType::Error,
                ));
            }
            let first = calendar.dates().first().map(String::as_str).unwrap_or_default();
            let last = calendar.latest().unwrap_or_default();
            Ok(format!(
                "{} trading days from {} to {}",
                ui::style_text(&calendar.len().to_string(), ui::StyleType::Label),
                first,
                last
            ))
        }
    }
}

pub fn render_entries(entries: &[CalendarEntry], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => render_json(entries),
        OutputFormat::Table => {
            let mut table = ui::new_styled_table();
            table.set_header(vec![ui::header_cell("Date"), ui::header_cell("Status")]);
            for entry in entries {
                table.add_row(vec![Cell::new(&entry.date), status_cell(entry.status)]);
            }
            Ok(table.to_string())
        }
    }
}

pub fn render_last_open(result: &LastOpenDate<'_>, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => render_json(result),
        OutputFormat::Table => Ok(match result.last_open_date {
            Some(date) => format!(
                "Last open day before {}: {}",
                result.before,
                ui::style_text(date, ui::StyleType::Success)
            ),
            None => ui::style_text(
                &format!("No open day before {}", result.before),
                ui::StyleType::Warning,
            ),
        }),
    }
}
