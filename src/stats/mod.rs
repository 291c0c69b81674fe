//! Stats module - column summaries

mod calculator;

pub use calculator::{percent_change, ColumnSummary, StatsCalculator};
