// src/normalize.rs
//
// Locale-aware value parsing shared by every extractor: numbers with a
// decimal comma, DD/MM/YYYY dates, business-day arithmetic for computed
// delivery dates, and removal of regulatory boilerplate that leaks into
// item descriptions on scanned documents.

use regex::Regex;
use time::macros::format_description;
use time::{Date, Weekday};

/// Parse a locale-formatted numeric string ("1.234,56", "R$ 120,00").
///
/// Dot is the thousands separator and comma the decimal mark; a string
/// with no comma falls back to plain dot-decimal parsing. Anything
/// non-numeric yields `0.0` — this never fails.
pub fn parse_locale_number(s: &str) -> f64 {
    let cleaned: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',' || *c == '.' || *c == '-')
        .collect();

    let normalized = if cleaned.contains(',') {
        cleaned.replace('.', "").replace(',', ".")
    } else {
        cleaned
    };

    normalized.parse::<f64>().unwrap_or(0.0)
}

/// Parse a strict DD/MM/YYYY date. Anything else is a miss, not an error.
pub fn parse_date(s: &str) -> Option<Date> {
    let fmt = format_description!("[day]/[month]/[year]");
    Date::parse(s.trim(), fmt).ok()
}

/// Advance `n` business days from `start`, counting Mon–Fri only.
///
/// `n = 0` returns the input unchanged, even on a weekend.
pub fn add_business_days(start: Date, n: u32) -> Date {
    let mut date = start;
    let mut remaining = n;
    while remaining > 0 {
        date = match date.next_day() {
            Some(d) => d,
            None => return date, // calendar overflow
        };
        if !is_weekend(date) {
            remaining -= 1;
        }
    }
    date
}

fn is_weekend(date: Date) -> bool {
    matches!(date.weekday(), Weekday::Saturday | Weekday::Sunday)
}

/// Cut a description at the first regulatory marker: a data-protection
/// disclosure clause, a leaked personal tax id, or a reprinted page
/// header. Returns the input unchanged when nothing matches.
pub fn strip_regulatory_text(description: &str) -> String {
    let markers = Regex::new(
        r"(?ix)
          general\s+data\s+protection
        | data\s+privacy\s+notice
        | i\s+consent\s+to\s+the\s+processing
        | \d{3}\.\d{3}\.\d{3}-\d{2}        # personal tax id
        | purchase\s+order\s*[-–]\s*page   # reprinted page header
        ",
    )
    .unwrap();

    match markers.find(description) {
        Some(m) => description[..m.start()].trim_end().to_string(),
        None => description.to_string(),
    }
}
