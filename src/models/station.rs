use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::time_math;

/// A configured radio station: a name (its preset identity), the origin
/// stream URL, and the IANA timezone it broadcasts in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Station {
    pub name: String,
    pub url: String,
    #[serde(rename = "location")]
    pub tz: String,
}

/// A connection to a station's live origin stream, opened by `Station::tune`.
/// Carries the detected bitrate so the recorder can size its chunk reads.
pub struct Stream<R> {
    pub bitrate_bps: u32,
    pub reader: R,
}

impl Station {
    pub fn new(name: impl Into<String>, url: impl Into<String>, tz: impl Into<String>) -> Self {
        Station {
            name: name.into(),
            url: url.into(),
            tz: tz.into(),
        }
    }

    /// Opens the station's origin stream over HTTP and sniffs its bitrate
    /// from the first frame header.
    pub async fn tune(&self) -> Result<Stream<impl tokio::io::AsyncRead + Unpin>> {
        let response = reqwest::get(&self.url)
            .await
            .map_err(|e| crate::error::RadioError::StreamReadError(e.to_string()))?;
        let byte_stream = response
            .bytes_stream()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e));
        let mut reader = tokio_util::io::StreamReader::new(byte_stream);

        let bitrate_bps = crate::chunker::detect_bitrate_from_reader(&mut reader).await?;
        Ok(Stream { bitrate_bps, reader })
    }

    /// The station's current wall-clock time.
    pub fn current_time(&self) -> DateTime<Utc> {
        time_math::current_station_time()
    }

    /// What a listener in `listener_tz` should be hearing right now, i.e.
    /// the station-timeline instant matching the listener's local
    /// hour-of-day.
    pub fn listener_time(&self, listener_tz: &str) -> Result<DateTime<Utc>> {
        time_math::listener_time(self.current_time(), &self.tz, listener_tz)
    }

    /// Minutes the listener's timezone is offset from the station's, at the
    /// station's current time.
    pub fn listener_distance(&self, listener_tz: &str) -> Result<i64> {
        time_math::distance_minutes(self.current_time(), listener_tz, &self.tz)
    }
}
