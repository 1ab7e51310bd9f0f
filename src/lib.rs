// Ledger Engine - Core Library
// Exposes the entry store, month bucketing and reports for the CLI, the
// HTTP bridge, and tests

pub mod api;
pub mod clock;
pub mod config;
pub mod db;
pub mod entry;
pub mod error;
pub mod month;
pub mod report;
pub mod validation;

use std::sync::Once;

// Re-export commonly used types
pub use api::{ApiResponse, Engine, RawAmount, RawRequest, Request, ResponseData};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::Config;
pub use db::{
    Ledger,
    setup_database, insert_entry, get_all_entries, get_entries_between,
    get_entry, delete_entry, verify_count,
};
pub use entry::{Entry, Kind, NewEntry};
pub use error::{LedgerError, Result, ValidationError};
pub use month::{month_key_of, month_range, MonthKey};
pub use report::{
    category_totals, format_amount, month_summary, round_for_display,
    CategoryTotal, MonthSummary,
};
pub use validation::{parse_amount_f64, parse_amount_str, parse_kind, validate};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

static TRACING_INIT: Once = Once::new();

/// Install the global tracing subscriber once, logging to stderr.
///
/// `RUST_LOG` wins when set; otherwise `default_filter` applies.
pub fn init_tracing(default_filter: &str) {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, EnvFilter};

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_filter));

        let _ = fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    });
}
