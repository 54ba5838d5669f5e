pub mod cli;
pub mod core;
pub mod providers;

use crate::cli::OutputFormat;
use crate::cli::calendar::LastOpenDate;
use crate::core::calendar::{date_key, parse_date_text};
use crate::core::config::AppConfig;
use crate::core::{
    Adjustment, CalendarStore, Clock, HistoryProvider, HistoryQuery, HistoryService, QuoteService,
    SummaryResolver, SystemClock,
};
use crate::providers::AkToolsProvider;
use anyhow::{Result, bail};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

pub enum AppCommand {
    TradeDates {
        with_status: bool,
    },
    LastOpen {
        before: Option<String>,
    },
    Summary {
        date: Option<String>,
    },
    History {
        codes: Vec<String>,
        start_date: Option<String>,
        end_date: Option<String>,
        adjust: Adjustment,
        provider: HistoryProvider,
    },
    Quote {
        codes: Vec<String>,
    },
}

/// Long-lived services sharing one calendar store.
pub struct App {
    store: Arc<CalendarStore>,
    summary: SummaryResolver,
    history: HistoryService,
    quotes: QuoteService,
    clock: Arc<dyn Clock>,
}

impl App {
    pub fn new(provider: Arc<AkToolsProvider>, clock: Arc<dyn Clock>) -> Self {
        let store = Arc::new(CalendarStore::new(provider.clone()));
        Self {
            summary: SummaryResolver::new(Arc::clone(&store), provider.clone(), clock.clone()),
            history: HistoryService::new(provider.clone()),
            quotes: QuoteService::new(provider),
            store,
            clock,
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let aktools = config.aktools();
        debug!(base_url = %aktools.base_url, "Using AKTools bridge");
        let provider = AkToolsProvider::new(
            &aktools.base_url,
            Duration::from_secs(aktools.timeout_secs),
        )?;
        Ok(Self::new(Arc::new(provider), Arc::new(SystemClock)))
    }

    /// Runs a command and returns the rendered output.
    pub async fn execute(&self, command: AppCommand, format: OutputFormat) -> Result<String> {
        match command {
            AppCommand::TradeDates { with_status } => {
                let calendar = self.store.load().await;
                if with_status {
                    let entries = calendar.expand(self.clock.today());
                    cli::calendar::render_entries(&entries, format)
                } else {
                    cli::calendar::render_dates(&calendar, format)
                }
            }
            AppCommand::LastOpen { before } => {
                let today = self.clock.today();
                let before = match before.as_deref().map(str::trim) {
                    Some(raw) => match parse_date_text(raw) {
                        Some(date) => date_key(date),
                        None => bail!("Invalid date '{}', expected YYYYMMDD", raw),
                    },
                    None => date_key(today),
                };
                let calendar = self.store.load().await;
                let result = LastOpenDate {
                    last_open_date: calendar.last_open_before(Some(before.as_str()), today),
                    before,
                };
                cli::calendar::render_last_open(&result, format)
            }
            AppCommand::Summary { date } => {
                let result = self.summary.resolve(date.as_deref()).await;
                cli::summary::render(&result, format)
            }
            AppCommand::History {
                codes,
                start_date,
                end_date,
                adjust,
                provider,
            } => {
                let template = HistoryQuery {
                    code: String::new(),
                    start_date,
                    end_date,
                    adjust,
                    provider,
                };
                let results = cli::history::fetch_all(&self.history, &template, &codes).await;
                cli::history::render(&results, format)
            }
            AppCommand::Quote { codes } => {
                let result = cli::quote::fetch(&self.quotes, &codes).await;
                cli::quote::render(&result, format)
            }
        }
    }
}

pub async fn run_command(
    command: AppCommand,
    config_path: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    info!("finlens starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let app = App::from_config(&config)?;
    let output = app.execute(command, format).await?;
    println!("{output}");
    Ok(())
}
