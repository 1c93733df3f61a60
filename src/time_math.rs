use chrono::{DateTime, LocalResult, NaiveDateTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::{RadioError, Result};

fn parse_tz(name: &str) -> Result<Tz> {
    name.parse::<Tz>()
        .map_err(|_| RadioError::BackendInitFailed(format!("unknown timezone: {name}")))
}

/// Resolves a naive wall-clock reading against `zone`, the way Go's
/// `time.ParseInLocation` does: it never fails, even for a reading that's
/// ambiguous (DST "fall back" fold) or nonexistent (DST "spring forward"
/// gap) in that zone.
///
/// Ambiguous readings resolve to the earlier of the two instants (fold=0,
/// `time.ParseInLocation`'s default). Nonexistent readings have no real
/// instant with that wall clock in this zone at all; `time.Date` normalizes
/// these by applying the offset that was in effect just before the gap. We
/// reproduce that by looking up the offset one hour earlier (always outside
/// the gap, since IANA transitions are at most a couple of hours) and
/// applying it directly, which for a UTC-anchored reconstruction is never
/// itself ambiguous or nonexistent.
fn resolve_local(zone: &Tz, naive: NaiveDateTime) -> DateTime<Tz> {
    match zone.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(earliest, _latest) => earliest,
        LocalResult::None => {
            let probe = naive - chrono::Duration::hours(1);
            let offset = match zone.offset_from_local_datetime(&probe) {
                LocalResult::Single(o) => o,
                LocalResult::Ambiguous(o, _) => o,
                LocalResult::None => zone.offset_from_utc_datetime(&probe),
            };
            let offset_secs = offset.fix().local_minus_utc() as i64;
            zone.from_utc_datetime(&(naive - chrono::Duration::seconds(offset_secs)))
        }
    }
}

/// Minutes a wall-clock reading in zone `b` is ahead of the same wall-clock
/// reading in zone `a`, at instant `t`.
///
/// Reproduces the original's `LocationDistanceInMinutes`: take `t`'s naive
/// (zone-less) wall-clock components, reinterpret them once in `a` and once
/// in `b`, and diff the resulting instants. This is what makes the result
/// DST-correct for the specific date in question rather than a fixed UTC
/// offset difference.
pub fn distance_minutes(t: DateTime<Utc>, a: &str, b: &str) -> Result<i64> {
    let zone_a = parse_tz(a)?;
    let zone_b = parse_tz(b)?;
    let naive = t.naive_utc();

    let as_a = resolve_local(&zone_a, naive);
    let as_b = resolve_local(&zone_b, naive);

    let delta = as_b.with_timezone(&Utc) - as_a.with_timezone(&Utc);
    Ok(delta.num_minutes())
}

/// The station's current wall-clock time, i.e. `now()`. Exists as a named
/// seam so tests and the recorder/player can inject a fixed instant instead
/// of `Utc::now()`.
pub fn current_station_time() -> DateTime<Utc> {
    Utc::now()
}

/// The instant in the station's timeline that corresponds to "now" as
/// experienced by a listener in `listener_tz`, given the station lives in
/// `station_tz`: yesterday, at the station-local clock reading that matches
/// the listener's current local hour-of-day.
///
/// `d_minutes` is always forced negative (subtracting a day when the raw
/// offset isn't already negative) so the result is always in the past —
/// the whole point of the "time machine": recordings only exist for the
/// last 24h, so "live" is never a valid answer.
pub fn listener_time(
    now: DateTime<Utc>,
    station_tz: &str,
    listener_tz: &str,
) -> Result<DateTime<Utc>> {
    let mut d_minutes = distance_minutes(now, listener_tz, station_tz)?;
    if d_minutes >= 0 {
        d_minutes -= 24 * 60;
    }
    Ok(now + chrono::Duration::minutes(d_minutes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn ny_behind_stockholm_in_july() {
        let t = at(2017, 7, 30, 10, 13, 25);
        assert_eq!(
            distance_minutes(t, "America/New_York", "Europe/Stockholm").unwrap(),
            -360
        );
    }

    #[test]
    fn stockholm_ahead_of_ny_in_july() {
        let t = at(2017, 7, 30, 10, 13, 25);
        assert_eq!(
            distance_minutes(t, "Europe/Stockholm", "America/New_York").unwrap(),
            360
        );
    }

    #[test]
    fn distance_before_us_dst_start() {
        let t = at(2017, 3, 19, 10, 13, 25);
        assert_eq!(
            distance_minutes(t, "Europe/Stockholm", "America/New_York").unwrap(),
            300
        );
    }

    #[test]
    fn distance_after_us_dst_end() {
        let t = at(2017, 11, 1, 10, 13, 25);
        assert_eq!(
            distance_minutes(t, "Europe/Stockholm", "America/New_York").unwrap(),
            300
        );
    }

    #[test]
    fn distance_between_two_us_zones() {
        let t = at(2017, 11, 1, 10, 13, 25);
        assert_eq!(
            distance_minutes(t, "America/Los_Angeles", "America/New_York").unwrap(),
            -180
        );
    }

    #[test]
    fn unknown_zone_is_an_error() {
        let t = at(2017, 1, 1, 0, 0, 0);
        assert!(distance_minutes(t, "Not/AZone", "America/New_York").is_err());
    }

    #[test]
    fn nonexistent_local_time_in_the_spring_forward_gap_still_resolves() {
        // 2017-03-12 02:30 local never happens in America/New_York: clocks
        // jump from 02:00 to 03:00. `time.ParseInLocation` never errors on
        // this, so neither do we.
        let t = at(2017, 3, 12, 2, 30, 0);
        assert!(distance_minutes(t, "America/New_York", "Etc/UTC").is_ok());
    }

    #[test]
    fn ambiguous_local_time_in_the_fall_back_fold_still_resolves() {
        // 2017-11-05 01:30 local happens twice in America/New_York (once
        // before, once after the clocks fall back). Resolves to the earlier
        // instant (fold=0), matching `time.ParseInLocation`'s default.
        let t = at(2017, 11, 5, 1, 30, 0);
        assert!(distance_minutes(t, "America/New_York", "Etc/UTC").is_ok());
    }

    #[test]
    fn listener_time_always_lands_in_the_past() {
        let now = at(2017, 7, 30, 10, 13, 25);
        let shifted = listener_time(now, "America/New_York", "Europe/Stockholm").unwrap();
        assert!(shifted < now);
        assert!(now - shifted <= chrono::Duration::hours(24));
        assert!(now - shifted > chrono::Duration::hours(23));
    }

    #[test]
    fn listener_time_same_zone_is_exactly_yesterday() {
        let now = at(2017, 7, 30, 10, 13, 25);
        let shifted = listener_time(now, "America/New_York", "America/New_York").unwrap();
        assert_eq!(shifted, now - chrono::Duration::hours(24));
    }
}
