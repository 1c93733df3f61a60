use chrono::{DateTime, Duration, Utc};

/// The fixed chunk duration. Every cue advances by this amount; chunk-store
/// readers and writers agree on it implicitly through `Cue`.
pub const CHUNK_SECONDS: i64 = 20;

/// A cursor over a station's recording timeline, truncated to a
/// `CHUNK_SECONDS` boundary at construction and advanced one chunk at a time
/// by `key()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cue {
    station: String,
    anchor: DateTime<Utc>,
}

impl Cue {
    pub fn new(station: impl Into<String>, at: DateTime<Utc>) -> Self {
        let secs = at.timestamp();
        let truncated = secs - secs.rem_euclid(CHUNK_SECONDS);
        Cue {
            station: station.into(),
            anchor: DateTime::from_timestamp(truncated, 0).unwrap_or(at),
        }
    }

    /// The RFC3339 identity of the current position, then advances the
    /// cursor by one chunk. Station scoping happens at the chunk-address
    /// layer (`chunk:{station}:{cue}`), not in the key itself — two cues
    /// over different stations at the same anchor produce the same key
    /// string, and it's the store's `(station, cue_key)` pair that keeps
    /// them apart.
    pub fn key(&mut self) -> String {
        let key = self.anchor.to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
        self.anchor += Duration::seconds(CHUNK_SECONDS);
        key
    }

    pub fn station(&self) -> &str {
        &self.station
    }
}
