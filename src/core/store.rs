use super::cache::InitOnce;
use super::calendar::{TradingCalendar, dates_from_table};
use super::source::CalendarSource;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Lazily loaded trading calendar.
///
/// The first load attempt is cached whatever its outcome: a failed or empty
/// upstream response caches an empty calendar, so a broken upstream is asked
/// at most once per store.
pub struct CalendarStore {
    source: Arc<dyn CalendarSource>,
    cache: InitOnce<Arc<TradingCalendar>>,
}

impl CalendarStore {
    pub fn new(source: Arc<dyn CalendarSource>) -> Self {
        Self {
            source,
            cache: InitOnce::new(),
        }
    }

    pub async fn load(&self) -> Arc<TradingCalendar> {
        self.cache
            .get_or_init(|| async {
                debug!("Loading trading calendar from upstream");
                let dates = match self.source.fetch_trading_calendar().await {
                    Ok(table) if table.is_empty() => {
                        warn!("Upstream returned an empty trading calendar");
                        Vec::new()
                    }
                    Ok(table) => dates_from_table(&table),
                    Err(e) => {
                        warn!(error = %e, "Failed to load trading calendar");
                        Vec::new()
                    }
                };
                let calendar = TradingCalendar::new(dates);
                info!(dates = calendar.len(), "Trading calendar cached");
                Arc::new(calendar)
            })
            .await
    }
}
