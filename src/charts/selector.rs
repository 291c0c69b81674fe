//! Chart Selector
//! Chooses which charts suit a table. Pure: reads the table, returns chart specs.

use super::spec::{dashboard_grid, ChartKind, ChartSpec};
use crate::config::StyleConfig;
use crate::data::{ColumnKind, Table, TypedColumn};
use thiserror::Error;
use tracing::{debug, warn};

/// Most categories a pie chart may show.
pub const PIE_MAX_CATEGORIES: usize = 8;

const LATEST_MARKERS: [&str; 8] = [
    "latest",
    "current",
    "ttm",
    "this year",
    "current year",
    "ytd",
    "latest quarter",
    "current quarter",
];

const PRIOR_MARKERS: [&str; 8] = [
    "prior",
    "previous",
    "last year",
    "prior year",
    "previous year",
    "prior quarter",
    "previous quarter",
    "ly",
];

/// Series names are joined into titles up to this count.
const TITLE_SERIES_LIMIT: usize = 3;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error("Insufficient data: the table has no rows")]
    NoRows,
    #[error("Insufficient data: no numeric column with values")]
    NoNumericColumns,
}

/// Applies the ordered chart rules to a table.
pub struct ChartSelector;

impl ChartSelector {
    /// Chart specs in emission order: trend, pie, bar, comparison, then the dashboard.
    pub fn select(
        table: &Table,
        company: &str,
        style: &StyleConfig,
    ) -> Result<Vec<ChartSpec>, SelectionError> {
        if table.row_count() == 0 {
            return Err(SelectionError::NoRows);
        }
        let numeric = table.numeric_columns();
        if numeric.is_empty() {
            return Err(SelectionError::NoNumericColumns);
        }

        let names: Vec<String> = numeric.iter().map(|c| c.name().to_string()).collect();
        let axis = table.columns_of(ColumnKind::Temporal).next();
        let builder = SpecBuilder { company, style };
        let mut specs = Vec::new();

        if let Some(axis) = axis {
            debug!("Trend over '{}' for {} series", axis.name(), names.len());
            specs.push(builder.trend(axis.name(), &names));
        }

        if let [value] = numeric.as_slice() {
            if let Some(label) = Self::pie_label(table, value) {
                specs.push(builder.pie(label.name(), value.name()));
            }
        }

        if numeric.len() >= 2 && axis.is_none() {
            specs.push(builder.bar(Self::bar_label(table), &names));
        }

        if specs.is_empty() {
            warn!(
                "No trend, pie or multi-series bar fits; falling back to a bar chart of '{}'",
                names[0]
            );
            specs.push(builder.bar(Self::bar_label(table), &names));
        }

        if let Some((label, prior_row, latest_row)) = Self::comparison_rows(table) {
            debug!(
                "Comparing rows {} and {} of '{}'",
                prior_row,
                latest_row,
                label.name()
            );
            specs.push(builder.comparison(label, prior_row, latest_row, &names));
        }

        let dashboard = builder.dashboard(specs.clone());
        specs.push(dashboard);
        Ok(specs)
    }

    /// First categorical column that can slice the single numeric column.
    fn pie_label<'t>(table: &'t Table, value: &TypedColumn) -> Option<&'t TypedColumn> {
        let values = value.numbers()?;
        let present: Vec<f64> = values.iter().flatten().copied().collect();
        if present.iter().any(|v| *v < 0.0) || present.iter().sum::<f64>() <= 0.0 {
            debug!("'{}' has negative or zero total; no pie", value.name());
            return None;
        }

        table.columns_of(ColumnKind::Categorical).find(|column| {
            let distinct = column.distinct_count();
            let fits = (1..=PIE_MAX_CATEGORIES).contains(&distinct);
            if !fits {
                debug!(
                    "'{}' has {} categories; pie needs 1 to {}",
                    column.name(),
                    distinct,
                    PIE_MAX_CATEGORIES
                );
            }
            fits
        })
    }

    fn bar_label(table: &Table) -> Option<String> {
        table
            .columns_of(ColumnKind::Categorical)
            .chain(table.columns_of(ColumnKind::Identifier))
            .next()
            .map(|c| c.name().to_string())
    }

    /// First temporal, then categorical, column holding both a prior and a latest row.
    fn comparison_rows(table: &Table) -> Option<(&TypedColumn, usize, usize)> {
        let candidates = table
            .columns_of(ColumnKind::Temporal)
            .chain(table.columns_of(ColumnKind::Categorical));

        for column in candidates {
            let Some(cells) = column.texts() else {
                continue;
            };
            let row_of = |markers: &[&str]| {
                cells.iter().position(|cell| {
                    cell.as_deref()
                        .map(|c| markers.contains(&c.trim().to_lowercase().as_str()))
                        .unwrap_or(false)
                })
            };
            let rows = (row_of(&PRIOR_MARKERS[..]), row_of(&LATEST_MARKERS[..]));
            if let (Some(prior), Some(latest)) = rows {
                return Some((column, prior, latest));
            }
        }
        None
    }
}

struct SpecBuilder<'a> {
    company: &'a str,
    style: &'a StyleConfig,
}

impl SpecBuilder<'_> {
    fn spec(&self, kind: ChartKind, title: String) -> ChartSpec {
        let archetype = kind.archetype();
        ChartSpec {
            kind,
            title: format!("{} - {}", self.company, title),
            file_stem: format!("{}_{}", slug(self.company), archetype),
            style: self.style.chart_style(archetype),
        }
    }

    fn trend(&self, axis: &str, series: &[String]) -> ChartSpec {
        let title = format!("{} Trend", series_title(series));
        self.spec(
            ChartKind::Trend {
                axis: axis.to_string(),
                series: series.to_vec(),
            },
            title,
        )
    }

    fn pie(&self, label: &str, value: &str) -> ChartSpec {
        let title = format!("{} by {}", humanize(value), humanize(label));
        self.spec(
            ChartKind::Pie {
                label: label.to_string(),
                value: value.to_string(),
            },
            title,
        )
    }

    fn bar(&self, label: Option<String>, series: &[String]) -> ChartSpec {
        let title = match &label {
            Some(label) => format!("{} by {}", series_title(series), humanize(label)),
            None => format!("{} Overview", series_title(series)),
        };
        self.spec(
            ChartKind::Bar {
                label,
                series: series.to_vec(),
            },
            title,
        )
    }

    fn comparison(
        &self,
        label: &TypedColumn,
        prior_row: usize,
        latest_row: usize,
        series: &[String],
    ) -> ChartSpec {
        let name = |row| label.label(row).unwrap_or_default();
        let title = format!(
            "{} vs {} Comparison",
            name(latest_row).trim(),
            name(prior_row).trim()
        );
        self.spec(
            ChartKind::Comparison {
                label: label.name().to_string(),
                prior_row,
                latest_row,
                series: series.to_vec(),
            },
            title,
        )
    }

    fn dashboard(&self, panels: Vec<ChartSpec>) -> ChartSpec {
        let grid = dashboard_grid(panels.len());
        self.spec(
            ChartKind::Dashboard { panels, grid },
            "Comprehensive Data Dashboard".to_string(),
        )
    }
}

/// `net_profit` -> `Net Profit`.
pub fn humanize(name: &str) -> String {
    name.replace('_', " ")
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Company name made safe for file names.
pub fn slug(company: &str) -> String {
    company
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect()
}

fn series_title(series: &[String]) -> String {
    match series {
        [] => "Data".to_string(),
        [single] => humanize(single),
        _ if series.len() <= TITLE_SERIES_LIMIT => {
            let names: Vec<String> = series.iter().map(|s| humanize(s)).collect();
            let last = names.len() - 1;
            format!("{} & {}", names[..last].join(", "), names[last])
        }
        _ => "Key Metrics".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::Archetype;

    fn text(values: &[&str]) -> Vec<Option<String>> {
        values.iter().map(|v| Some(v.to_string())).collect()
    }

    fn numbers(values: &[f64]) -> Vec<Option<f64>> {
        values.iter().map(|v| Some(*v)).collect()
    }

    fn select(table: &Table) -> Result<Vec<ChartSpec>, SelectionError> {
        ChartSelector::select(table, "Acme Corp", &StyleConfig::default())
    }

    fn archetypes(specs: &[ChartSpec]) -> Vec<Archetype> {
        specs.iter().map(ChartSpec::archetype).collect()
    }

    #[test]
    fn yearly_financials_give_trend_and_dashboard() {
        let table = Table::new(vec![
            TypedColumn::temporal("Year", text(&["2020", "2021", "2022", "2023", "2024"])),
            TypedColumn::numeric("Revenue", numbers(&[10.0, 12.0, 15.0, 18.0, 21.0])),
            TypedColumn::numeric("Profit", numbers(&[1.0, 1.5, 2.0, 2.5, 3.0])),
        ])
        .unwrap();

        let specs = select(&table).unwrap();
        assert_eq!(
            archetypes(&specs),
            vec![Archetype::Trend, Archetype::Dashboard]
        );
        assert_eq!(
            specs[0].kind,
            ChartKind::Trend {
                axis: "Year".into(),
                series: vec!["Revenue".into(), "Profit".into()],
            }
        );
        assert_eq!(specs[0].title, "Acme Corp - Revenue & Profit Trend");
        assert_eq!(specs[0].file_stem, "Acme_Corp_trend");
        assert!(specs[0].style.value_labels);
    }

    #[test]
    fn segments_give_pie_and_dashboard() {
        let table = Table::new(vec![
            TypedColumn::categorical("Segment", text(&["Retail", "Cloud", "Ads", "Devices"])),
            TypedColumn::numeric("Revenue", numbers(&[40.0, 30.0, 20.0, 10.0])),
        ])
        .unwrap();

        let specs = select(&table).unwrap();
        assert_eq!(archetypes(&specs), vec![Archetype::Pie, Archetype::Dashboard]);
        assert_eq!(
            specs[0].kind,
            ChartKind::Pie {
                label: "Segment".into(),
                value: "Revenue".into(),
            }
        );
        assert_eq!(specs[0].title, "Acme Corp - Revenue by Segment");
        assert_eq!(specs[0].style.donut_hole, Some(0.4));
    }

    #[test]
    fn empty_table_is_insufficient() {
        let table = Table::new(vec![TypedColumn::numeric("Revenue", vec![])]).unwrap();
        assert_eq!(select(&table), Err(SelectionError::NoRows));
        assert_eq!(select(&Table::default()), Err(SelectionError::NoRows));
    }

    #[test]
    fn missing_numbers_are_insufficient() {
        let table = Table::new(vec![
            TypedColumn::categorical("Segment", text(&["A", "B"])),
            TypedColumn::numeric("Revenue", vec![None, None]),
        ])
        .unwrap();
        let err = select(&table).unwrap_err();
        assert_eq!(err, SelectionError::NoNumericColumns);
        assert!(err.to_string().starts_with("Insufficient data"));
    }

    #[test]
    fn nine_categories_never_become_a_pie() {
        let names: Vec<String> = (1..=9).map(|i| format!("Region {i}")).collect();
        let labels: Vec<&str> = names.iter().map(String::as_str).collect();
        let table = Table::new(vec![
            TypedColumn::categorical("Region", text(&labels)),
            TypedColumn::numeric("Sales", numbers(&[1.0; 9])),
        ])
        .unwrap();

        let specs = select(&table).unwrap();
        assert!(!archetypes(&specs).contains(&Archetype::Pie));
        assert_eq!(
            specs[0].kind,
            ChartKind::Bar {
                label: Some("Region".into()),
                series: vec!["Sales".into()],
            }
        );
    }

    #[test]
    fn first_qualifying_category_wins_the_pie() {
        let table = Table::new(vec![
            TypedColumn::categorical("Channel", text(&["Web", "Store", "Web"])),
            TypedColumn::categorical("Region", text(&["North", "South", "East"])),
            TypedColumn::numeric("Sales", numbers(&[5.0, 3.0, 2.0])),
        ])
        .unwrap();

        let specs = select(&table).unwrap();
        assert!(matches!(&specs[0].kind, ChartKind::Pie { label, .. } if label == "Channel"));
    }

    #[test]
    fn negative_values_skip_the_pie() {
        let table = Table::new(vec![
            TypedColumn::categorical("Segment", text(&["A", "B"])),
            TypedColumn::numeric("Profit", numbers(&[5.0, -3.0])),
        ])
        .unwrap();

        let specs = select(&table).unwrap();
        assert_eq!(archetypes(&specs), vec![Archetype::Bar, Archetype::Dashboard]);
    }

    #[test]
    fn several_measures_without_time_give_bars() {
        let table = Table::new(vec![
            TypedColumn::identifier("Ticker", text(&["AAA", "BBB"])),
            TypedColumn::numeric("Revenue", numbers(&[10.0, 20.0])),
            TypedColumn::numeric("Profit", numbers(&[1.0, 2.0])),
        ])
        .unwrap();

        let specs = select(&table).unwrap();
        assert_eq!(archetypes(&specs), vec![Archetype::Bar, Archetype::Dashboard]);
        assert_eq!(
            specs[0].kind,
            ChartKind::Bar {
                label: Some("Ticker".into()),
                series: vec!["Revenue".into(), "Profit".into()],
            }
        );
    }

    #[test]
    fn unlabelled_single_series_falls_back_to_bars() {
        let table = Table::new(vec![TypedColumn::numeric(
            "Units",
            numbers(&[3.0, 4.0, 5.0]),
        )])
        .unwrap();

        let specs = select(&table).unwrap();
        assert_eq!(
            specs[0].kind,
            ChartKind::Bar {
                label: None,
                series: vec!["Units".into()],
            }
        );
        assert_eq!(specs[0].title, "Acme Corp - Units Overview");
    }

    #[test]
    fn latest_and_prior_rows_give_a_comparison() {
        let table = Table::new(vec![
            TypedColumn::categorical("Period", text(&["Prior Year", "Latest"])),
            TypedColumn::numeric("Revenue", numbers(&[100.0, 120.0])),
            TypedColumn::numeric("Profit", numbers(&[10.0, 15.0])),
        ])
        .unwrap();

        let specs = select(&table).unwrap();
        assert_eq!(
            archetypes(&specs),
            vec![Archetype::Bar, Archetype::Comparison, Archetype::Dashboard]
        );
        assert_eq!(
            specs[1].kind,
            ChartKind::Comparison {
                label: "Period".into(),
                prior_row: 0,
                latest_row: 1,
                series: vec!["Revenue".into(), "Profit".into()],
            }
        );
        assert_eq!(specs[1].title, "Acme Corp - Latest vs Prior Year Comparison");
    }

    #[test]
    fn dashboard_panels_mirror_emitted_specs() {
        let table = Table::new(vec![
            TypedColumn::temporal("Period", text(&["Previous", "TTM"])),
            TypedColumn::numeric("Sales", numbers(&[4.0, 6.0])),
        ])
        .unwrap();

        let specs = select(&table).unwrap();
        let (dashboard, singles) = specs.split_last().unwrap();
        assert_eq!(dashboard.panels(), singles);
        assert_eq!(dashboard.title, "Acme Corp - Comprehensive Data Dashboard");
        assert_eq!(dashboard.file_stem, "Acme_Corp_dashboard");
        assert!(matches!(dashboard.kind, ChartKind::Dashboard { grid: (1, 2), .. }));
        assert_eq!(dashboard.style.size, (2400, 1600));
    }

    #[test]
    fn names_are_humanized() {
        assert_eq!(humanize("net_profit"), "Net Profit");
        assert_eq!(humanize("EPS"), "Eps");
        assert_eq!(slug("Eternal Ltd."), "Eternal_Ltd_");
    }
}
