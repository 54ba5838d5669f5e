//! Calendar, resolution and sanitisation logic. Nothing in here talks to the
//! network; upstream data arrives through the traits in [`source`].

pub mod cache;
pub mod calendar;
pub mod clock;
pub mod config;
pub mod history;
pub mod log;
pub mod quote;
pub mod sanitize;
pub mod source;
pub mod store;
pub mod summary;
pub mod table;

// Re-export main types for cleaner imports
pub use calendar::{CalendarEntry, DateStatus, TradingCalendar};
pub use clock::{Clock, FixedClock, SystemClock};
pub use history::{FetchStatus, HistoryQuery, HistoryResult, HistoryService};
pub use quote::{QuoteResult, QuoteService};
pub use sanitize::{SafeValue, SanitizedRecord};
pub use source::{
    Adjustment, CalendarSource, DailySummarySource, HistoryProvider, HistorySource, QuoteSource,
};
pub use store::CalendarStore;
pub use summary::{SummaryResolver, SummaryResult, SummaryStatus};
pub use table::{RawValue, Table};
