//! Tolerant date-time parsing for search filters
//!
//! Accepts `yyyy-MM-dd[ HH:mm[:ss]]` and the same with `/` as the date
//! separator. chrono's numeric fields take one or two digits, so
//! single-digit month, day and hour are accepted by every pattern below.
//!
//! A date without a time denotes a whole day: range starts are widened to
//! 00:00:00 and range ends to 23:59:59.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// Date-time patterns, tried in order
const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

/// Date-only patterns, tried when no date-time pattern matches
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

/// Result of checking user input against the accepted formats
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateValidation {
    pub valid: bool,
    pub message: String,
}

impl DateValidation {
    fn ok(message: &str) -> Self {
        Self {
            valid: true,
            message: message.to_string(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }
}

/// What the user typed, at the granularity it was given
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Parsed {
    DateTime(NaiveDateTime),
    Date(NaiveDate),
}

fn parse(input: &str) -> Option<Parsed> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    DATE_TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
        .map(Parsed::DateTime)
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(input, fmt).ok())
                .map(Parsed::Date)
        })
}

fn resolve(input: &str, fill: NaiveTime) -> Option<NaiveDateTime> {
    match parse(input)? {
        Parsed::DateTime(dt) => Some(dt),
        Parsed::Date(date) => Some(date.and_time(fill)),
    }
}

/// Parse the lower bound of a range; a bare date means local midnight
pub fn parse_range_start(input: &str) -> Option<NaiveDateTime> {
    resolve(input, NaiveTime::MIN)
}

/// Parse the upper bound of a range; a bare date means 23:59:59 that day
pub fn parse_range_end(input: &str) -> Option<NaiveDateTime> {
    let end_of_day = NaiveTime::from_hms_opt(23, 59, 59)?;
    resolve(input, end_of_day)
}

/// Check input for live feedback; blank input is valid and means "no bound"
pub fn validate(input: &str) -> DateValidation {
    if input.trim().is_empty() {
        return DateValidation::ok("");
    }

    match parse(input) {
        Some(Parsed::DateTime(_)) => DateValidation::ok("valid date-time"),
        Some(Parsed::Date(_)) => DateValidation::ok("valid date"),
        None => DateValidation {
            valid: false,
            message: format!("invalid date format. {}", supported_formats()),
        },
    }
}

/// Help text listing the accepted input formats
pub fn supported_formats() -> &'static str {
    "Supported formats:\n\
     - date and time: 2020-06-20 14:30:00, 2020-06-20 14:30\n\
     - date only: 2020-06-20 (start bounds use 00:00:00, end bounds 23:59:59)\n\
     - slash separated: 2020/06/20 14:30:00, 2020/06/20\n\
     - single digits: 2020-6-20, 2020/6/20 9:05"
}
