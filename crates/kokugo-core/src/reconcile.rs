//! Choosing between the local and the remote draft at load time.
//!
//! The rule is last writer wins: whichever snapshot carries the later valid
//! timestamp is restored. A snapshot without a valid timestamp loses to any
//! snapshot that has one, and when neither is valid nothing is restored.
//! Equal timestamps go to the remote copy, since it is the one other devices
//! see.

use jiff::{
    civil::{Date, DateTime, Time},
    tz::TimeZone,
    Timestamp,
};
use log::debug;

use crate::models::Draft;

/// Parses an ISO-8601 timestamp.
///
/// RFC 3339 instants are read as-is. Civil date-times and bare dates carry
/// no offset and are read as UTC. Anything else yields `None`.
///
/// ```rust
/// use kokugo_core::reconcile::parse_timestamp;
///
/// assert!(parse_timestamp("2024-01-01T09:00:00+09:00").is_some());
/// assert!(parse_timestamp("2024-01-01").is_some());
/// assert!(parse_timestamp("not a date").is_none());
/// ```
pub fn parse_timestamp(text: &str) -> Option<Timestamp> {
    let text = text.trim();
    if let Ok(ts) = text.parse::<Timestamp>() {
        return Some(ts);
    }
    let civil = text
        .parse::<DateTime>()
        .ok()
        .or_else(|| text.parse::<Date>().ok().map(|d| d.to_datetime(Time::midnight())))?;
    civil.to_zoned(TimeZone::UTC).ok().map(|z| z.timestamp())
}

/// Picks the draft to restore.
///
/// Returns `None` when neither side has a valid timestamp, including when
/// both sides are absent.
pub fn choose_draft(local: Option<Draft>, remote: Option<Draft>) -> Option<Draft> {
    let local = local.and_then(|d| d.parsed_timestamp().map(|ts| (ts, d)));
    let remote = remote.and_then(|d| d.parsed_timestamp().map(|ts| (ts, d)));

    match (local, remote) {
        (None, None) => {
            debug!("No draft with a valid timestamp to restore");
            None
        }
        (Some((_, local)), None) => Some(local),
        (None, Some((_, remote))) => Some(remote),
        (Some((local_ts, local)), Some((remote_ts, remote))) => {
            if local_ts > remote_ts {
                debug!("Local draft ({local_ts}) is newer than remote ({remote_ts})");
                Some(local)
            } else {
                debug!("Remote draft ({remote_ts}) is at least as new as local ({local_ts})");
                Some(remote)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(unit: &str, timestamp: Option<&str>) -> Draft {
        let mut draft = Draft::default();
        draft.form.unit = unit.to_string();
        draft.timestamp = timestamp.map(String::from);
        draft
    }

    fn unit_of(chosen: Option<Draft>) -> Option<String> {
        chosen.map(|d| d.form.unit)
    }

    #[test]
    fn test_nothing_to_restore() {
        assert_eq!(choose_draft(None, None), None);
    }

    #[test]
    fn test_newer_remote_wins() {
        let chosen = choose_draft(
            Some(draft("A", Some("2024-01-01T00:00:00Z"))),
            Some(draft("B", Some("2024-01-02T00:00:00Z"))),
        );
        assert_eq!(unit_of(chosen).as_deref(), Some("B"));
    }

    #[test]
    fn test_newer_local_wins() {
        let chosen = choose_draft(
            Some(draft("A", Some("2024-01-03T00:00:00Z"))),
            Some(draft("B", Some("2024-01-02T00:00:00Z"))),
        );
        assert_eq!(unit_of(chosen).as_deref(), Some("A"));
    }

    #[test]
    fn test_only_one_side_present() {
        let local = draft("A", Some("2024-01-01T00:00:00Z"));
        assert_eq!(unit_of(choose_draft(Some(local.clone()), None)).as_deref(), Some("A"));
        assert_eq!(unit_of(choose_draft(None, Some(local))).as_deref(), Some("A"));
    }

    #[test]
    fn test_invalid_timestamp_loses_to_valid() {
        let chosen = choose_draft(
            Some(draft("A", Some("garbage"))),
            Some(draft("B", Some("2024-01-02T00:00:00Z"))),
        );
        assert_eq!(unit_of(chosen).as_deref(), Some("B"));

        let chosen = choose_draft(
            Some(draft("A", Some("2020-01-01T00:00:00Z"))),
            Some(draft("B", None)),
        );
        assert_eq!(unit_of(chosen).as_deref(), Some("A"));
    }

    #[test]
    fn test_neither_timestamp_valid() {
        let chosen = choose_draft(Some(draft("A", None)), Some(draft("B", Some("soon"))));
        assert_eq!(chosen, None);
    }

    #[test]
    fn test_single_invalid_side_restores_nothing() {
        assert_eq!(choose_draft(Some(draft("A", Some(""))), None), None);
    }

    #[test]
    fn test_tie_goes_to_remote() {
        let chosen = choose_draft(
            Some(draft("A", Some("2024-01-01T09:00:00+09:00"))),
            Some(draft("B", Some("2024-01-01T00:00:00Z"))),
        );
        assert_eq!(unit_of(chosen).as_deref(), Some("B"));
    }

    #[test]
    fn test_result_is_one_of_the_inputs() {
        let local = draft("A", Some("2024-06-01T12:00:00.123Z"));
        let remote = draft("B", Some("2024-06-01T12:00:00.122Z"));
        let chosen = choose_draft(Some(local.clone()), Some(remote));
        assert_eq!(chosen, Some(local));
    }

    #[test]
    fn test_parse_timestamp_civil_forms_are_utc() {
        assert_eq!(
            parse_timestamp("2024-01-01T00:00:00"),
            parse_timestamp("2024-01-01T00:00:00Z")
        );
        assert_eq!(parse_timestamp("2024-01-01"), parse_timestamp("2024-01-01T00:00:00Z"));
        assert_eq!(parse_timestamp(""), None);
    }
}
