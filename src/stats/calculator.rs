//! Statistics Calculator Module
//! Descriptive statistics and growth figures for numeric table columns.

use crate::data::Table;
use statrs::statistics::{Data, Median, Statistics};

/// Summary of one numeric column. Missing cells are excluded from every figure.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSummary {
    pub count: usize,
    pub missing: usize,
    pub sum: f64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    pub first: Option<f64>,
    pub last: Option<f64>,
}

impl Default for ColumnSummary {
    fn default() -> Self {
        Self {
            count: 0,
            missing: 0,
            sum: 0.0,
            min: f64::NAN,
            max: f64::NAN,
            mean: f64::NAN,
            median: f64::NAN,
            std_dev: f64::NAN,
            first: None,
            last: None,
        }
    }
}

impl ColumnSummary {
    pub fn from_values(values: &[Option<f64>]) -> Self {
        let present: Vec<f64> = values.iter().flatten().copied().collect();
        let missing = values.len() - present.len();
        if present.is_empty() {
            return Self {
                missing,
                ..Self::default()
            };
        }

        // Iterator::min/max shadow the Statistics methods, so call them explicitly
        let min = Statistics::min(present.iter());
        let max = Statistics::max(present.iter());
        let mean = present.iter().mean();
        let std_dev = if present.len() > 1 {
            present.iter().std_dev()
        } else {
            0.0
        };
        let median = Data::new(present.clone()).median();

        Self {
            count: present.len(),
            missing,
            sum: present.iter().sum(),
            min,
            max,
            mean,
            median,
            std_dev,
            first: present.first().copied(),
            last: present.last().copied(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Change from the first to the last present value, in percent.
    pub fn growth_percent(&self) -> Option<f64> {
        if self.count < 2 {
            return None;
        }
        percent_change(self.first?, self.last?)
    }
}

/// `(latest - prior) / |prior| * 100`; undefined for a zero prior.
pub fn percent_change(prior: f64, latest: f64) -> Option<f64> {
    if prior == 0.0 || !prior.is_finite() || !latest.is_finite() {
        return None;
    }
    Some((latest - prior) / prior.abs() * 100.0)
}

/// Handles per-column statistics for a table.
pub struct StatsCalculator;

impl StatsCalculator {
    /// Summaries for every usable numeric column, in table order.
    pub fn summarize(table: &Table) -> Vec<(String, ColumnSummary)> {
        table
            .numeric_columns()
            .into_iter()
            .filter_map(|column| {
                let values = column.numbers()?;
                Some((column.name().to_string(), ColumnSummary::from_values(values)))
            })
            .collect()
    }
}
