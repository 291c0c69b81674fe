//! Web Source Module
//! Fetches a page over HTTP and turns its main data table into a typed table.

use super::html;
use super::loader::{DataError, DataSource};
use super::table::Table;
use std::time::Duration;
use tracing::{debug, info};

/// Some finance sites serve an empty shell to unknown clients.
const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Scrapes the most data-rich `<table>` of a webpage.
#[derive(Debug, Clone)]
pub struct WebSource {
    url: String,
    timeout: Duration,
}

impl WebSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn download(&self) -> Result<String, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT)
            .build()?;

        let response = client.get(&self.url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(DataError::Status {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }

        Ok(response.text()?)
    }

    /// Parse a downloaded page. `origin` only labels errors.
    pub fn table_from_html(origin: &str, page: &str) -> Result<Table, DataError> {
        let raw = html::best_table(page).ok_or_else(|| DataError::NoTable(origin.to_string()))?;
        debug!(
            "Selected table with {} columns, {} rows",
            raw.headers.len(),
            raw.rows.len()
        );
        let df = raw.prepared().into_dataframe()?;
        Ok(Table::from_dataframe(&df)?)
    }
}

impl DataSource for WebSource {
    fn fetch(&self) -> Result<Table, DataError> {
        info!("Fetching data from {}", self.url);
        let page = self.download()?;
        let table = Self::table_from_html(&self.url, &page)?;
        info!(
            "Scraped {} rows x {} columns",
            table.row_count(),
            table.column_count()
        );
        Ok(table)
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ColumnKind;

    #[test]
    fn builds_table_from_shareholding_page() {
        let page = r#"
            <h2>Shareholding Pattern</h2>
            <table>
              <tr><th>Shareholder Type</th><th>Percentage</th></tr>
              <tr><td>Promoters</td><td>50.13%</td></tr>
              <tr><td>FIIs</td><td>19.16%</td></tr>
              <tr><td>DIIs</td><td>19.02%</td></tr>
              <tr><td>Public</td><td>11.52%</td></tr>
            </table>
        "#;
        let table = WebSource::table_from_html("test", page).unwrap();
        assert_eq!(table.row_count(), 4);
        assert_eq!(
            table.column("Shareholder Type").unwrap().kind(),
            ColumnKind::Categorical
        );
        assert_eq!(
            table.column("Percentage").unwrap().numbers().unwrap()[0],
            Some(50.13)
        );
    }

    #[test]
    fn transposed_financials_get_a_time_axis() {
        let page = r#"
            <table class="data-table">
              <thead><tr><th></th><th>Mar 2022</th><th>Mar 2023</th><th>Mar 2024</th></tr></thead>
              <tbody>
                <tr><td class="text">Sales&nbsp;+</td><td>4,192</td><td>7,079</td><td>12,114</td></tr>
                <tr><td class="text">Net Profit&nbsp;+</td><td>-1,222</td><td>-971</td><td>351</td></tr>
              </tbody>
            </table>
        "#;
        let table = WebSource::table_from_html("test", page).unwrap();
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.column("Period").unwrap().kind(), ColumnKind::Temporal);
        assert_eq!(
            table.column("Net Profit").unwrap().numbers().unwrap(),
            &[Some(-1222.0), Some(-971.0), Some(351.0)]
        );
    }

    #[test]
    fn page_without_tables_is_data_unavailable() {
        let err = WebSource::table_from_html("https://example.com", "<p>nothing</p>").unwrap_err();
        assert!(matches!(err, DataError::NoTable(url) if url == "https://example.com"));
    }
}
