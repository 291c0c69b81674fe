//! Cell Inference Helpers
//! Number cleaning, missing-value tokens and period-label detection for text cells.

/// Cell values treated as missing.
const MISSING_TOKENS: [&str; 8] = ["", "-", "—", "na", "n/a", "nan", "null", "none"];

/// Period labels that carry no year.
const PERIOD_KEYWORDS: [&str; 4] = ["ttm", "ytd", "mtd", "qtd"];

const MONTHS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

/// Column names hinting at a time axis.
const TEMPORAL_NAMES: [&str; 9] = [
    "year", "date", "period", "quarter", "month", "fy", "time", "fiscal", "day",
];

const IDENTIFIER_NAMES: [&str; 5] = ["id", "code", "ticker", "symbol", "isin"];

/// Check whether a raw cell should count as missing.
pub fn is_missing(cell: &str) -> bool {
    let trimmed = cell.trim().to_lowercase();
    MISSING_TOKENS.contains(&trimmed.as_str())
}

/// Parse a number out of a display-formatted cell.
///
/// Accepts thousands separators, a trailing `%`, leading currency symbols and
/// accounting-style parentheses for negatives (`(1,200)` is `-1200`).
pub fn parse_number(cell: &str) -> Option<f64> {
    let mut text = cell.trim();
    if is_missing(text) {
        return None;
    }

    let mut negative = false;
    if let Some(inner) = text.strip_prefix('(').and_then(|t| t.strip_suffix(')')) {
        negative = true;
        text = inner.trim();
    }

    let text = text.strip_prefix("Rs.").unwrap_or(text);
    let cleaned: String = text
        .trim()
        .trim_start_matches(['₹', '$', '€', '£', '¥'])
        .trim_end_matches('%')
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();

    // "inf" and "NaN" parse as floats but are never real table values
    if cleaned.is_empty() || cleaned.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E')
    {
        return None;
    }

    let value: f64 = cleaned.parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    Some(if negative { -value } else { value })
}

/// Whether every present value is a whole number.
pub fn all_integral(values: &[Option<f64>]) -> bool {
    values
        .iter()
        .flatten()
        .all(|v| v.fract() == 0.0 && v.abs() < 9_007_199_254_740_992.0)
}

/// Whether integral values fall in a plausible calendar-year range.
pub fn all_years(values: &[Option<f64>]) -> bool {
    let mut any = false;
    for v in values.iter().flatten() {
        any = true;
        if v.fract() != 0.0 || !(1800.0..=2200.0).contains(v) {
            return false;
        }
    }
    any
}

fn name_tokens(name: &str) -> Vec<String> {
    name.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Column names like `Year`, `Fiscal_Period` or `report date`.
pub fn is_temporal_name(name: &str) -> bool {
    name_tokens(name)
        .iter()
        .any(|t| TEMPORAL_NAMES.contains(&t.as_str()))
}

/// Column names like `id`, `company_id` or `Ticker`.
pub fn is_identifier_name(name: &str) -> bool {
    let tokens = name_tokens(name);
    match tokens.as_slice() {
        [] => false,
        [single] => IDENTIFIER_NAMES.contains(&single.as_str()),
        [.., last] => last == "id",
    }
}

/// Drop a trailing parenthesised annotation such as ` (P)` or ` (Est.)`.
fn strip_annotation(label: &str) -> &str {
    let trimmed = label.trim();
    if trimmed.ends_with(')') {
        if let Some(open) = trimmed.rfind('(') {
            let head = trimmed[..open].trim_end();
            if !head.is_empty() {
                return head;
            }
        }
    }
    trimmed
}

fn is_year(token: &str) -> bool {
    token.len() == 4
        && token.chars().all(|c| c.is_ascii_digit())
        && token
            .parse::<u32>()
            .map(|y| (1800..=2200).contains(&y))
            .unwrap_or(false)
}

fn is_short_year(token: &str) -> bool {
    token.len() == 2 && token.chars().all(|c| c.is_ascii_digit())
}

fn is_year_like(token: &str) -> bool {
    is_year(token) || is_short_year(token) || is_prefixed_year(token)
}

/// `fy2023`, `fy23`, `cy2024`.
fn is_prefixed_year(token: &str) -> bool {
    ["fy", "cy"]
        .iter()
        .filter_map(|p| token.strip_prefix(p))
        .any(|rest| is_year(rest) || is_short_year(rest))
}

fn is_quarter(token: &str) -> bool {
    matches!(token, "q1" | "q2" | "q3" | "q4" | "h1" | "h2")
}

fn is_month(token: &str) -> bool {
    token.len() >= 3
        && MONTHS
            .iter()
            .any(|m| token.starts_with(m) && token.chars().all(|c| c.is_ascii_alphabetic()))
}

fn is_date_triplet(a: &str, b: &str, c: &str) -> bool {
    let numeric = |t: &str| !t.is_empty() && t.len() <= 4 && t.chars().all(|ch| ch.is_ascii_digit());
    if !(numeric(a) && numeric(b) && numeric(c)) {
        // "31 Mar 2024"
        return numeric(a) && a.len() <= 2 && is_month(b) && is_year(c);
    }
    is_year(a) || is_year(c)
}

/// Whether a cell names a time period: `2023`, `FY 2024`, `Q1 2023`,
/// `Mar 2025 (P)`, `2024-03-31`, `TTM`.
pub fn is_period_label(cell: &str) -> bool {
    let lower = strip_annotation(cell).to_lowercase();
    if PERIOD_KEYWORDS.contains(&lower.as_str()) {
        return true;
    }

    let tokens: Vec<&str> = lower
        .split(|c: char| c.is_whitespace() || c == '-' || c == '/' || c == '.' || c == '\'')
        .filter(|t| !t.is_empty())
        .collect();

    match tokens.as_slice() {
        [single] => is_year(single) || is_prefixed_year(single),
        [prefix, year] if *prefix == "fy" || *prefix == "cy" => is_year_like(year),
        [quarter, year] if is_quarter(quarter) => is_year_like(year),
        [year, quarter] if is_quarter(quarter) => is_year(year) || is_prefixed_year(year),
        [month, year] if is_month(month) => is_year_like(year),
        [a, b, c] => is_date_triplet(a, b, c),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_display_formatted_numbers() {
        assert_eq!(parse_number("1,234"), Some(1234.0));
        assert_eq!(parse_number(" 17.5% "), Some(17.5));
        assert_eq!(parse_number("₹ 8,99,041"), Some(899041.0));
        assert_eq!(parse_number("$12.50"), Some(12.5));
        assert_eq!(parse_number("(1,200)"), Some(-1200.0));
        assert_eq!(parse_number("-107"), Some(-107.0));
        assert_eq!(parse_number("1e3"), Some(1000.0));
    }

    #[test]
    fn rejects_non_numbers() {
        assert_eq!(parse_number("Q1 2023"), None);
        assert_eq!(parse_number("inf"), None);
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number("-"), None);
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("2024-03-31"), None);
    }

    #[test]
    fn missing_tokens() {
        assert!(is_missing("  "));
        assert!(is_missing("N/A"));
        assert!(is_missing("—"));
        assert!(!is_missing("0"));
    }

    #[test]
    fn recognises_period_labels() {
        for label in [
            "2023",
            "FY 2024",
            "FY23",
            "FY 2025 (P)",
            "Q1 2023",
            "Q3-FY24",
            "Mar 2024",
            "March 2025 (P)",
            "Dec-23",
            "2024-03-31",
            "31/03/2024",
            "31 Mar 2024",
            "TTM",
        ] {
            assert!(is_period_label(label), "{label} should be a period");
        }
    }

    #[test]
    fn rejects_category_labels() {
        for label in [
            "Promoters",
            "P/E Ratio",
            "ROCE (%)",
            "Sales Growth (10Y)",
            "Last Year",
            "Operating Profit",
            "123",
        ] {
            assert!(!is_period_label(label), "{label} should not be a period");
        }
    }

    #[test]
    fn column_name_hints() {
        assert!(is_temporal_name("Year"));
        assert!(is_temporal_name("fiscal_period"));
        assert!(!is_temporal_name("Yearly_Revenue"));
        assert!(is_temporal_name("Fiscal Year"));
        assert!(is_temporal_name("Trading Day"));
        assert!(is_identifier_name("id"));
        assert!(is_identifier_name("company_id"));
        assert!(is_identifier_name("Ticker"));
        assert!(is_identifier_name("ISIN"));
        assert!(!is_identifier_name("Stock Code"));
        assert!(!is_identifier_name("Idea"));
        assert!(!is_identifier_name("Revenue"));
    }

    #[test]
    fn integral_and_year_checks() {
        assert!(all_integral(&[Some(1.0), None, Some(-4.0)]));
        assert!(!all_integral(&[Some(1.5)]));
        assert!(all_years(&[Some(2019.0), Some(2020.0), None]));
        assert!(!all_years(&[Some(19.0)]));
        assert!(!all_years(&[None]));
    }
}
