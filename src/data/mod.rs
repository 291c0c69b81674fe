//! Data module - sources, HTML scraping and the typed table

mod html;
mod infer;
mod loader;
mod table;
mod web;

pub use html::{best_table, extract_tables, RawTable};
pub use loader::{CsvSource, DataError, DataSource};
pub use table::{ColumnKind, ColumnValues, Table, TableError, TypedColumn};
pub use web::{WebSource, DEFAULT_TIMEOUT};
