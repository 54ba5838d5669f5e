pub mod calendar;
pub mod history;
pub mod quote;
pub mod setup;
pub mod summary;
pub mod ui;

use anyhow::{Context, Result};
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Pretty printed JSON
    #[default]
    Json,
    /// Styled tables
    Table,
}

pub fn render_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("Failed to serialize output")
}
