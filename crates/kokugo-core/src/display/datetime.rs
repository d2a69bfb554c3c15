//! DateTime display utilities.

use std::fmt;

use jiff::{tz::TimeZone, Timestamp};

use crate::reconcile::parse_timestamp;

/// Formats a timestamp in the system time zone as `YYYY-MM-DD HH:MM:SS TZ`.
pub struct LocalDateTime<'a>(pub &'a Timestamp);

impl fmt::Display for LocalDateTime<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            self.0
                .to_zoned(TimeZone::system())
                .strftime("%Y-%m-%d %H:%M:%S %Z")
        )
    }
}

/// Formats a stored ISO-8601 string in local time, or verbatim when it does
/// not parse.
pub struct StoredTime<'a>(pub &'a str);

impl fmt::Display for StoredTime<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match parse_timestamp(self.0) {
            Some(ts) => write!(f, "{}", LocalDateTime(&ts)),
            None => write!(f, "{}", self.0),
        }
    }
}
