use time::Date;
use time::macros::format_description;

/// The validity-target cell, coerced exactly once at the loader boundary.
///
/// Downstream code never re-parses the raw cell text: classification,
/// aggregation and the error-detail table all read this enum.
#[derive(Debug, Clone, PartialEq)]
pub enum TargetValue {
    /// The cell parsed as a finite decimal (comma or dot separator).
    Number(f64),
    /// Empty or whitespace-only cell.
    Blank,
    /// Spreadsheet error marker: contains `#` (e.g. `#N/A`) or the word
    /// `error` in any casing.
    ErrorMarker,
    /// Non-empty text that is neither a marker nor a parseable number.
    Unparsed(String),
}

impl TargetValue {
    #[must_use]
    pub fn from_cell(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Self::Blank;
        }

        let lowered = trimmed.to_lowercase();
        if lowered.contains('#') || lowered.contains("error") {
            return Self::ErrorMarker;
        }

        // Source sheets use a comma decimal separator; values with
        // thousands grouping fail the parse and stay unparsed.
        let candidate = trimmed.replace(',', ".");
        match candidate.parse::<f64>() {
            Ok(value) if value.is_finite() => Self::Number(value),
            _ => Self::Unparsed(trimmed.to_string()),
        }
    }
}

/// One row of the working set. Every record holds a valid delivery date;
/// rows whose date fails to parse never become records.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub delivery_date: Date,
    pub business_code: String,
    pub entity_key: String,
    pub target: TargetValue,
    pub client_id: Option<String>,
    pub vehicle_id: Option<String>,
    pub order_ref: Option<String>,
    pub reason: Option<String>,
}

/// Best-effort delivery-date parser. Accepts ISO (`2024-01-10`) and
/// day-first (`10/01/2024`) dates, with an optional time-of-day suffix
/// that is discarded. `None` means the row is dropped upstream.
#[must_use]
pub fn parse_delivery_date(raw: &str) -> Option<Date> {
    let candidate = raw.trim();
    if candidate.is_empty() {
        return None;
    }

    let date_part = candidate.split([' ', 'T']).next().unwrap_or(candidate);

    let iso = format_description!("[year]-[month]-[day]");
    let day_first = format_description!("[day]/[month]/[year]");
    for format in [iso, day_first] {
        if let Ok(date) = Date::parse(date_part, format) {
            return Some(date);
        }
    }

    None
}

/// `YYYY-MM-DD`, the daily bucket key. Lexicographic order matches
/// chronological order, which the aggregator relies on.
#[must_use]
pub fn iso_date(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

/// `YYYY-MM`, the historical-monthly bucket key.
#[must_use]
pub fn month_key(date: Date) -> String {
    format!("{:04}-{:02}", date.year(), u8::from(date.month()))
}

#[must_use]
pub fn same_month(left: Date, right: Date) -> bool {
    left.year() == right.year() && left.month() == right.month()
}
