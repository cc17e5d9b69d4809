pub mod digits;
pub mod rules;

use chrono::{Local, NaiveDateTime};

pub use digits::normalize_digits;
pub use rules::{Rule, RULES};

/// Date recovered from a file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateGuess {
    /// Naive local date and time, second resolution
    pub date: NaiveDateTime,
    /// Which digits the date was read from, for logging
    pub explanation: String,
    /// Name of the recognizer that matched
    pub rule: &'static str,
}

/// Extract a date from a file name, using the local clock as the upper
/// bound for epoch timestamps.
pub fn extract_date(filename: &str) -> Option<DateGuess> {
    extract_date_at(filename, Local::now().naive_local())
}

/// Extract a date from a file name. Rules are tried in order and the first
/// one that yields a valid date wins; `None` means no convention matched.
pub fn extract_date_at(filename: &str, now: NaiveDateTime) -> Option<DateGuess> {
    let name = normalize_digits(filename);
    let scan = rules::Scan { name: &name, now };
    RULES.iter().find_map(|rule| rule.apply(&scan))
}
