//! Parses the broadcast route's `<station>/<areaPart1>/<areaPart2>` path
//! shape. Per spec.md §4.8 and the Open Question resolution in §9(a), the
//! zone must be exactly two slash-separated parts — this precludes
//! single-segment zone names like `UTC`, matching the original
//! implementation's behavior exactly rather than "fixing" it.

use chrono_tz::Tz;

use crate::error::{RadioError, Result};

pub struct ListenRequest {
    pub station: String,
    pub listener_tz: String,
}

/// Validates `(station, area1, area2)` path segments (as extracted by the
/// router) and reassembles the IANA zone name, verifying it against the
/// zone database.
pub fn parse_listen_path(station: &str, area1: &str, area2: &str) -> Result<ListenRequest> {
    if station.is_empty() || area1.is_empty() || area2.is_empty() {
        return Err(RadioError::PathMalformed(
            "want path: /listen/<station>/<area>/<location>".into(),
        ));
    }

    let listener_tz = format!("{area1}/{area2}");
    listener_tz
        .parse::<Tz>()
        .map_err(|_| RadioError::PathMalformed(format!("unknown timezone: {listener_tz}")))?;

    Ok(ListenRequest {
        station: station.to_string(),
        listener_tz,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_zone_parses() {
        let req = parse_listen_path("wkrp", "America", "New_York").unwrap();
        assert_eq!(req.station, "wkrp");
        assert_eq!(req.listener_tz, "America/New_York");
    }

    #[test]
    fn unknown_zone_is_malformed() {
        assert!(parse_listen_path("wkrp", "Not", "AZone").is_err());
    }

    #[test]
    fn empty_segment_is_malformed() {
        assert!(parse_listen_path("wkrp", "", "New_York").is_err());
    }

    #[test]
    fn single_segment_zone_names_are_not_representable() {
        // "UTC" has no slash, so it can never fill both area1/area2 — it is
        // rejected by the router's segment count before this function even
        // runs. `Etc/UTC` is the two-segment spelling listeners must use.
        let req = parse_listen_path("wkrp", "Etc", "UTC").unwrap();
        assert_eq!(req.listener_tz, "Etc/UTC");
    }
}
