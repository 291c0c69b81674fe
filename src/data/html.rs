//! HTML Table Extraction
//! Tolerant scanning of `<table>` blocks into header + row bundles.
//!
//! Tag detection is case-insensitive and works on local blocks
//! (`<table>…</table>`, then `<tr>`, then `<th>`/`<td>`), so attribute order
//! and surrounding markup noise do not matter. Omitted closing tags on rows
//! and cells end at the next sibling.

use super::infer;
use polars::prelude::*;

/// Headers plus string rows, as scraped.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Count of cells that read as numbers.
    pub fn numeric_cell_count(&self) -> usize {
        self.rows
            .iter()
            .flatten()
            .filter(|c| infer::parse_number(c).is_some())
            .count()
    }

    pub fn is_usable(&self) -> bool {
        !self.headers.is_empty() && !self.rows.is_empty()
    }

    /// Pad or extend so every row matches the header width.
    fn squared(mut self) -> Self {
        let width = self
            .rows
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(self.headers.len()))
            .max()
            .unwrap_or(0);
        self.headers.resize(width, String::new());
        for row in &mut self.rows {
            row.resize(width, String::new());
        }
        self
    }

    /// Fill empty headers with `Column N` and suffix duplicates with `_2`, `_3`, …
    pub fn normalize_headers(mut self) -> Self {
        let mut used: Vec<String> = Vec::with_capacity(self.headers.len());
        for (i, header) in self.headers.iter_mut().enumerate() {
            let base = if header.trim().is_empty() {
                format!("Column {}", i + 1)
            } else {
                header.trim().to_string()
            };
            let mut candidate = base.clone();
            let mut n = 2;
            while used.contains(&candidate) {
                candidate = format!("{base}_{n}");
                n += 1;
            }
            used.push(candidate.clone());
            *header = candidate;
        }
        self
    }

    /// Periods laid out across the header, labels down the first column.
    pub fn has_periods_in_header(&self) -> bool {
        if self.headers.len() < 3 {
            return false;
        }
        let periods_across = self.headers[1..]
            .iter()
            .all(|h| !h.trim().is_empty() && infer::is_period_label(h));
        let labels_down = self
            .rows
            .iter()
            .filter_map(|r| r.first())
            .any(|c| !c.trim().is_empty() && infer::parse_number(c).is_none());
        periods_across && labels_down
    }

    /// Swap rows and columns so periods become rows.
    pub fn transpose(self) -> Self {
        let first = self.headers.first().map(|h| h.trim()).unwrap_or_default();
        let mut headers = vec![if first.is_empty() {
            "Period".to_string()
        } else {
            first.to_string()
        }];
        headers.extend(
            self.rows
                .iter()
                .map(|r| r.first().map(|c| clean_row_label(c)).unwrap_or_default()),
        );

        let rows = (1..self.headers.len())
            .map(|j| {
                let mut row = vec![self.headers[j].clone()];
                row.extend(self.rows.iter().map(|r| r.get(j).cloned().unwrap_or_default()));
                row
            })
            .collect();

        Self { headers, rows }
    }

    /// Orient and normalise the table for inference.
    pub fn prepared(self) -> Self {
        let table = self.squared();
        let table = if table.has_periods_in_header() {
            tracing::info!("Table lists periods across columns, transposing");
            table.transpose()
        } else {
            table
        };
        table.normalize_headers()
    }

    /// Convert into a DataFrame of string columns.
    pub fn into_dataframe(self) -> PolarsResult<DataFrame> {
        let columns = self
            .headers
            .iter()
            .enumerate()
            .map(|(i, header)| {
                let cells: Vec<Option<String>> = self
                    .rows
                    .iter()
                    .map(|r| r.get(i).cloned().filter(|c| !c.trim().is_empty()))
                    .collect();
                Column::new(header.as_str().into(), cells)
            })
            .collect();
        DataFrame::new(columns)
    }
}

/// Row labels on finance sites often carry an expand button rendered as `+`.
fn clean_row_label(label: &str) -> String {
    label.trim().trim_end_matches('+').trim_end().to_string()
}

/// Extract every table in the document, in document order.
pub fn extract_tables(html: &str) -> Vec<RawTable> {
    nested_blocks(html, "table")
        .into_iter()
        .map(parse_table)
        .filter(RawTable::is_usable)
        .collect()
}

/// The table with the most numeric cells; ties go to the first.
pub fn best_table(html: &str) -> Option<RawTable> {
    let mut best: Option<(usize, RawTable)> = None;
    for table in extract_tables(html) {
        let score = table.numeric_cell_count();
        if best.as_ref().map_or(true, |(s, _)| score > *s) {
            best = Some((score, table));
        }
    }
    best.map(|(_, table)| table)
}

fn parse_table(inner: &str) -> RawTable {
    let mut rows: Vec<Vec<(bool, String)>> = sibling_blocks(inner, &["tr"])
        .into_iter()
        .map(|(_, row)| {
            sibling_blocks(row, &["th", "td"])
                .into_iter()
                .map(|(tag, cell)| (tag == "th", clean_text(cell)))
                .collect::<Vec<_>>()
        })
        .filter(|cells: &Vec<(bool, String)>| !cells.is_empty())
        .collect();

    if rows.is_empty() {
        return RawTable::default();
    }

    // The first all-<th> row is the header; rows above it are captions
    let header_at = rows
        .iter()
        .position(|cells| cells.iter().all(|(is_th, _)| *is_th))
        .unwrap_or(0);
    let mut rows = rows.split_off(header_at);
    let headers = rows.remove(0).into_iter().map(|(_, text)| text).collect();
    let rows = rows
        .into_iter()
        .map(|cells| cells.into_iter().map(|(_, text)| text).collect())
        .collect();
    RawTable { headers, rows }
}

/// Position of the next `<tag` that is a real tag start (not `<thead` for `<th`).
fn find_open(lower: &str, tag: &str, from: usize) -> Option<usize> {
    let needle = format!("<{tag}");
    let mut cursor = from;
    while let Some(offset) = lower.get(cursor..)?.find(&needle) {
        let at = cursor + offset;
        let next = lower[at + needle.len()..].chars().next();
        if matches!(next, Some(c) if c == '>' || c == '/' || c.is_ascii_whitespace()) {
            return Some(at);
        }
        cursor = at + needle.len();
    }
    None
}

fn find_close(lower: &str, tag: &str, from: usize) -> Option<usize> {
    let needle = format!("</{tag}");
    lower.get(from..)?.find(&needle).map(|i| from + i)
}

/// End of the opening tag starting at `start`, just past its `>`.
fn content_start(lower: &str, start: usize) -> Option<usize> {
    lower[start..].find('>').map(|i| start + i + 1)
}

/// Inner content of each outermost `<tag>…</tag>`, respecting nesting.
fn nested_blocks<'a>(html: &'a str, tag: &str) -> Vec<&'a str> {
    // ASCII lowercasing keeps byte offsets aligned with `html`
    let lower = html.to_ascii_lowercase();
    let close_len = tag.len() + 2;
    let mut blocks = Vec::new();
    let mut pos = 0;

    while let Some(start) = find_open(&lower, tag, pos) {
        let Some(body) = content_start(&lower, start) else {
            break;
        };

        let mut depth = 1;
        let mut cursor = body;
        let end = loop {
            let next_open = find_open(&lower, tag, cursor);
            let Some(next_close) = find_close(&lower, tag, cursor) else {
                break None;
            };
            match next_open {
                Some(open) if open < next_close => {
                    depth += 1;
                    cursor = open + 1;
                }
                _ => {
                    depth -= 1;
                    if depth == 0 {
                        break Some(next_close);
                    }
                    cursor = next_close + close_len;
                }
            }
        };

        match end {
            Some(end) => {
                blocks.push(&html[body..end]);
                pos = end + close_len;
            }
            None => {
                blocks.push(&html[body..]);
                break;
            }
        }
    }

    blocks
}

/// Sibling blocks opened by any of `tags`; each ends at its close tag or the
/// next sibling opening, whichever comes first.
fn sibling_blocks<'a>(html: &'a str, tags: &[&'static str]) -> Vec<(&'static str, &'a str)> {
    let lower = html.to_ascii_lowercase();
    let next_open = |from: usize| {
        tags.iter()
            .filter_map(|t| find_open(&lower, t, from).map(|at| (at, *t)))
            .min_by_key(|(at, _)| *at)
    };

    let mut blocks = Vec::new();
    let mut pos = 0;
    while let Some((start, tag)) = next_open(pos) {
        let Some(body) = content_start(&lower, start) else {
            break;
        };
        let close = find_close(&lower, tag, body);
        let sibling = next_open(body).map(|(at, _)| at);
        let end = match (close, sibling) {
            (Some(c), Some(s)) => c.min(s),
            (Some(c), None) => c,
            (None, Some(s)) => s,
            (None, None) => html.len(),
        };
        blocks.push((tag, &html[body..end]));
        pos = if close == Some(end) { end + tag.len() + 2 } else { end };
    }
    blocks
}

/// Strip tags, decode common entities and collapse whitespace.
pub fn clean_text(fragment: &str) -> String {
    let mut text = String::with_capacity(fragment.len());
    let mut in_tag = false;
    for c in fragment.chars() {
        match c {
            '<' => {
                in_tag = true;
                text.push(' ');
            }
            '>' if in_tag => in_tag = false,
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }

    let decoded = text
        .replace("&nbsp;", " ")
        .replace("&#160;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&rsquo;", "'")
        .replace("&amp;", "&");

    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}
