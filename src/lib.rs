// Expense Tracker - Core Library
// Exposes the store, aggregation and export for the CLI, the dashboard and the API server

pub mod aggregate;
pub mod config;
pub mod db;
pub mod entry;
pub mod error;
pub mod export;
pub mod logging;
pub mod money;
pub mod report;
pub mod store;

#[cfg(feature = "tui")]
pub mod ui;

#[cfg(feature = "server")]
pub mod server;

// Re-export commonly used types
pub use aggregate::{
    category_shares, is_over_budget, remaining_budget, sum_by_category, sum_by_month,
    sum_by_month_filled, total_amount, CategoryShare, MonthKey, MonthTotal,
};
pub use config::Config;
pub use db::{ExpenseRecord, NewExpense, DATE_FORMAT, SUGGESTED_CATEGORIES};
pub use entry::{submit_expense, ExpenseInput};
pub use error::{Result, TrackerError, ValidationError};
pub use export::{export_csv, export_csv_string};
pub use money::Money;
pub use report::{request_report, Report, ReportOptions};
pub use store::{ExpenseStore, MemoryStore, SqliteStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
