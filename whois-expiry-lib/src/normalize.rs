//! Date normalization.
//!
//! Strategies hand back whatever shape they found: a native date, a
//! date-time, several of them, or the raw text from a page. Everything is
//! reduced to a single calendar date here.

use crate::error::ExpiryCheckError;
use crate::types::ExpiryValue;
use chrono::NaiveDate;

/// Reduce an expiration value to a calendar date.
///
/// Lists contribute their first element only. Text keeps its first
/// whitespace-separated token, so `2025-08-01 00:00:00` becomes `2025-08-01`,
/// and must then parse as `YYYY-MM-DD`.
///
/// # Errors
///
/// `NotFound` for an empty list, `UnsupportedDateFormat` carrying the
/// offending token when text does not parse.
pub fn normalize(domain: &str, value: &ExpiryValue) -> Result<NaiveDate, ExpiryCheckError> {
    match value {
        ExpiryValue::Date(date) => Ok(*date),
        ExpiryValue::DateTime(datetime) => Ok(datetime.date()),
        ExpiryValue::List(values) => match values.first() {
            Some(first) => normalize(domain, first),
            None => Err(ExpiryCheckError::not_found(domain)),
        },
        ExpiryValue::Text(text) => parse_date_text(text),
    }
}

/// Parse the date portion of a free-text value.
pub fn parse_date_text(text: &str) -> Result<NaiveDate, ExpiryCheckError> {
    let token = match text.split_whitespace().next() {
        Some(token) => token,
        None => return Err(ExpiryCheckError::unsupported_date(text)),
    };

    NaiveDate::parse_from_str(token, "%Y-%m-%d")
        .map_err(|_| ExpiryCheckError::unsupported_date(token))
}

/// Whole days from `today` until `expiry`. Negative once the date has passed.
pub fn days_until(expiry: NaiveDate, today: NaiveDate) -> i64 {
    expiry.signed_duration_since(today).num_days()
}
