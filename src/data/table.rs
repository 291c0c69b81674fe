//! Typed Table Module
//! Immutable table of named columns with inferred semantic kinds, built from Polars.

use super::infer;
use polars::prelude::*;
use std::collections::HashSet;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TableError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Column '{name}' has {found} rows, expected {expected}")]
    RowCountMismatch {
        name: String,
        expected: usize,
        found: usize,
    },
    #[error("Duplicate column name '{0}'")]
    DuplicateColumn(String),
}

/// Semantic type inferred for a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    Temporal,
    NumericContinuous,
    NumericDiscrete,
    Categorical,
    Identifier,
}

impl ColumnKind {
    pub fn is_numeric(self) -> bool {
        matches!(self, ColumnKind::NumericContinuous | ColumnKind::NumericDiscrete)
    }
}

/// Cell storage. Numeric kinds hold numbers, every other kind holds text.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValues {
    Numeric(Vec<Option<f64>>),
    Text(Vec<Option<String>>),
}

impl ColumnValues {
    pub fn len(&self) -> usize {
        match self {
            ColumnValues::Numeric(values) => values.len(),
            ColumnValues::Text(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A named column with its inferred kind.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedColumn {
    name: String,
    kind: ColumnKind,
    values: ColumnValues,
}

impl TypedColumn {
    /// Numeric column; discrete when every present value is whole.
    pub fn numeric(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        let values: Vec<Option<f64>> = values
            .into_iter()
            .map(|v| v.filter(|x| x.is_finite()))
            .collect();
        let kind = if infer::all_integral(&values) {
            ColumnKind::NumericDiscrete
        } else {
            ColumnKind::NumericContinuous
        };
        Self {
            name: name.into(),
            kind,
            values: ColumnValues::Numeric(values),
        }
    }

    pub fn temporal(name: impl Into<String>, values: Vec<Option<String>>) -> Self {
        Self::text(name, ColumnKind::Temporal, values)
    }

    pub fn categorical(name: impl Into<String>, values: Vec<Option<String>>) -> Self {
        Self::text(name, ColumnKind::Categorical, values)
    }

    pub fn identifier(name: impl Into<String>, values: Vec<Option<String>>) -> Self {
        Self::text(name, ColumnKind::Identifier, values)
    }

    fn text(name: impl Into<String>, kind: ColumnKind, values: Vec<Option<String>>) -> Self {
        let values = values
            .into_iter()
            .map(|v| v.map(|s| s.trim().to_string()).filter(|s| !infer::is_missing(s)))
            .collect();
        Self {
            name: name.into(),
            kind,
            values: ColumnValues::Text(values),
        }
    }

    /// Classify numbers that arrived under a name: identifiers and calendar
    /// years become text columns, everything else stays numeric.
    pub fn from_numbers(name: &str, values: Vec<Option<f64>>) -> Self {
        let as_text = |values: &[Option<f64>]| -> Vec<Option<String>> {
            values.iter().map(|v| v.map(format_number)).collect()
        };

        if infer::is_identifier_name(name) {
            Self::identifier(name, as_text(&values))
        } else if infer::is_temporal_name(name) && infer::all_years(&values) {
            Self::temporal(name, as_text(&values))
        } else {
            Self::numeric(name, values)
        }
    }

    /// Infer the kind of a column of raw text cells.
    pub fn from_text(name: &str, cells: Vec<Option<String>>) -> Self {
        let cells: Vec<Option<String>> = cells
            .into_iter()
            .map(|c| c.filter(|s| !infer::is_missing(s)))
            .collect();
        let present: Vec<&str> = cells.iter().flatten().map(String::as_str).collect();

        if !present.is_empty() {
            let parsed: Vec<Option<f64>> = cells
                .iter()
                .map(|c| c.as_deref().and_then(infer::parse_number))
                .collect();
            if parsed.iter().flatten().count() == present.len() {
                return Self::from_numbers(name, parsed);
            }
        }

        let all_periods = !present.is_empty() && present.iter().all(|c| infer::is_period_label(c));
        if infer::is_temporal_name(name) || all_periods {
            Self::temporal(name, cells)
        } else if infer::is_identifier_name(name) {
            Self::identifier(name, cells)
        } else {
            Self::categorical(name, cells)
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ColumnKind {
        self.kind
    }

    pub fn values(&self) -> &ColumnValues {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Numeric cells, or `None` for text columns.
    pub fn numbers(&self) -> Option<&[Option<f64>]> {
        match &self.values {
            ColumnValues::Numeric(values) => Some(values),
            ColumnValues::Text(_) => None,
        }
    }

    /// Text cells, or `None` for numeric columns.
    pub fn texts(&self) -> Option<&[Option<String>]> {
        match &self.values {
            ColumnValues::Text(values) => Some(values),
            ColumnValues::Numeric(_) => None,
        }
    }

    /// Display label of one cell.
    pub fn label(&self, row: usize) -> Option<String> {
        match &self.values {
            ColumnValues::Numeric(values) => values.get(row).copied().flatten().map(format_number),
            ColumnValues::Text(values) => values.get(row).cloned().flatten(),
        }
    }

    /// Number of non-missing cells.
    pub fn present_count(&self) -> usize {
        match &self.values {
            ColumnValues::Numeric(values) => values.iter().flatten().count(),
            ColumnValues::Text(values) => values.iter().flatten().count(),
        }
    }

    /// Number of distinct non-missing cells.
    pub fn distinct_count(&self) -> usize {
        match &self.values {
            ColumnValues::Numeric(values) => values
                .iter()
                .flatten()
                .map(|v| v.to_bits())
                .collect::<HashSet<_>>()
                .len(),
            ColumnValues::Text(values) => values.iter().flatten().collect::<HashSet<_>>().len(),
        }
    }
}

/// Render a number without a trailing `.0` for whole values.
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

/// Immutable table. Every column has the same row count and a unique name.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<TypedColumn>,
}

impl Table {
    pub fn new(columns: Vec<TypedColumn>) -> Result<Self, TableError> {
        let mut seen = HashSet::new();
        let expected = columns.first().map(TypedColumn::len).unwrap_or(0);

        for column in &columns {
            if !seen.insert(column.name()) {
                return Err(TableError::DuplicateColumn(column.name().to_string()));
            }
            if column.len() != expected {
                return Err(TableError::RowCountMismatch {
                    name: column.name().to_string(),
                    expected,
                    found: column.len(),
                });
            }
        }

        Ok(Self { columns })
    }

    /// Build a table from a DataFrame, inferring each column's kind.
    pub fn from_dataframe(df: &DataFrame) -> Result<Self, TableError> {
        let columns = df
            .get_columns()
            .iter()
            .map(Self::convert_column)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(columns)
    }

    fn convert_column(column: &Column) -> Result<TypedColumn, TableError> {
        let name = column.name().to_string();

        match column.dtype() {
            DataType::Date | DataType::Datetime(_, _) | DataType::Time => {
                Ok(TypedColumn::temporal(name, Self::string_cells(column)?))
            }
            DataType::Float32
            | DataType::Float64
            | DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64 => {
                let as_f64 = column.cast(&DataType::Float64)?;
                let values: Vec<Option<f64>> = as_f64.f64()?.into_iter().collect();
                Ok(TypedColumn::from_numbers(&name, values))
            }
            DataType::Boolean => Ok(TypedColumn::categorical(name, Self::string_cells(column)?)),
            _ => Ok(TypedColumn::from_text(&name, Self::string_cells(column)?)),
        }
    }

    fn string_cells(column: &Column) -> Result<Vec<Option<String>>, TableError> {
        let as_str = column.cast(&DataType::String)?;
        let cells = as_str
            .as_materialized_series()
            .str()?
            .into_iter()
            .map(|v| v.map(str::to_string))
            .collect();
        Ok(cells)
    }

    pub fn columns(&self) -> &[TypedColumn] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&TypedColumn> {
        self.columns.iter().find(|c| c.name() == name)
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map(TypedColumn::len).unwrap_or(0)
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Columns of a kind, in table order.
    pub fn columns_of(&self, kind: ColumnKind) -> impl Iterator<Item = &TypedColumn> {
        self.columns.iter().filter(move |c| c.kind() == kind)
    }

    /// Numeric columns holding at least one value, in table order.
    pub fn numeric_columns(&self) -> Vec<&TypedColumn> {
        self.columns
            .iter()
            .filter(|c| c.kind().is_numeric() && c.present_count() > 0)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(values: &[&str]) -> Vec<Option<String>> {
        values.iter().map(|v| Some(v.to_string())).collect()
    }

    #[test]
    fn rejects_ragged_columns() {
        let result = Table::new(vec![
            TypedColumn::numeric("a", vec![Some(1.0), Some(2.0)]),
            TypedColumn::numeric("b", vec![Some(1.0)]),
        ]);
        assert!(matches!(
            result,
            Err(TableError::RowCountMismatch { expected: 2, found: 1, .. })
        ));
    }

    #[test]
    fn rejects_duplicate_names() {
        let result = Table::new(vec![
            TypedColumn::numeric("a", vec![Some(1.0)]),
            TypedColumn::categorical("a", text(&["x"])),
        ]);
        assert!(matches!(result, Err(TableError::DuplicateColumn(name)) if name == "a"));
    }

    #[test]
    fn numeric_kind_follows_values() {
        let discrete = TypedColumn::numeric("n", vec![Some(1.0), None, Some(3.0)]);
        assert_eq!(discrete.kind(), ColumnKind::NumericDiscrete);
        let continuous = TypedColumn::numeric("n", vec![Some(1.5), Some(3.0)]);
        assert_eq!(continuous.kind(), ColumnKind::NumericContinuous);
    }

    #[test]
    fn text_inference() {
        let revenue = TypedColumn::from_text("Revenue", text(&["1,200", "1,450", "-"]));
        assert_eq!(revenue.kind(), ColumnKind::NumericDiscrete);
        assert_eq!(revenue.numbers().unwrap(), &[Some(1200.0), Some(1450.0), None]);

        let year = TypedColumn::from_text("Year", text(&["FY 2022", "FY 2023", "FY 2024 (P)"]));
        assert_eq!(year.kind(), ColumnKind::Temporal);

        let unnamed = TypedColumn::from_text("Col", text(&["Q1 2023", "Q2 2023"]));
        assert_eq!(unnamed.kind(), ColumnKind::Temporal);

        let segment = TypedColumn::from_text("Segment", text(&["Retail", "Digital", "O2C"]));
        assert_eq!(segment.kind(), ColumnKind::Categorical);

        let ticker = TypedColumn::from_text("Ticker", text(&["RELIANCE", "TCS"]));
        assert_eq!(ticker.kind(), ColumnKind::Identifier);
    }

    #[test]
    fn year_numbers_become_temporal() {
        let year = TypedColumn::from_numbers("Year", vec![Some(2019.0), Some(2020.0)]);
        assert_eq!(year.kind(), ColumnKind::Temporal);
        assert_eq!(year.label(1).as_deref(), Some("2020"));

        let headcount = TypedColumn::from_numbers("Employees", vec![Some(2019.0)]);
        assert_eq!(headcount.kind(), ColumnKind::NumericDiscrete);
    }

    #[test]
    fn distinct_count_ignores_missing() {
        let segment = TypedColumn::categorical(
            "Segment",
            vec![Some("A".into()), Some("B".into()), Some("A".into()), None, Some(" ".into())],
        );
        assert_eq!(segment.distinct_count(), 2);
        assert_eq!(segment.present_count(), 3);
    }

    #[test]
    fn from_dataframe_infers_kinds() {
        let df = df!(
            "Year" => [2020i64, 2021, 2022],
            "Segment" => ["Retail", "Jio", "Retail"],
            "Revenue" => [Some(10.5), None, Some(12.0)],
            "Profit" => ["1,000", "1,250", "1,400"]
        )
        .unwrap();

        let table = Table::from_dataframe(&df).unwrap();
        assert_eq!(table.row_count(), 3);
        let kinds: Vec<ColumnKind> = table.columns().iter().map(TypedColumn::kind).collect();
        assert_eq!(
            kinds,
            vec![
                ColumnKind::Temporal,
                ColumnKind::Categorical,
                ColumnKind::NumericContinuous,
                ColumnKind::NumericDiscrete,
            ]
        );
        let names: Vec<&str> = table.numeric_columns().iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["Revenue", "Profit"]);
    }

    #[test]
    fn all_missing_numeric_is_not_usable() {
        let table = Table::new(vec![TypedColumn::numeric("Revenue", vec![None, None])]).unwrap();
        assert!(table.numeric_columns().is_empty());
    }
}
