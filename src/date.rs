//! Validation and parsing for sale dates.
//!
//! Sale dates are opaque calendar labels in strict `YYYY-MM-DD` format, not
//! instants: there is no timezone concept anywhere in the application.

use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

use crate::Error;

const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Parse a sale date in strict `YYYY-MM-DD` format.
///
/// The input must be exactly 10 characters with exactly two `-` separators
/// and zero-padded components, and must name a real calendar date, so
/// `"2024-1-15"`, `"2024/01/15"` and `"2024-02-30"` are all rejected.
///
/// # Errors
/// This function will return an [Error::InvalidDate] carrying the offending
/// input if any of the above checks fail.
pub fn parse_sale_date(text: &str) -> Result<Date, Error> {
    if text.len() != 10 || text.bytes().filter(|&byte| byte == b'-').count() != 2 {
        return Err(Error::InvalidDate(text.to_owned()));
    }

    Date::parse(text, DATE_FORMAT).map_err(|_| Error::InvalidDate(text.to_owned()))
}

/// Check whether `text` is a real calendar date in strict `YYYY-MM-DD` format.
pub fn is_valid_sale_date(text: &str) -> bool {
    parse_sale_date(text).is_ok()
}
