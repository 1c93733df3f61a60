//! One task per recorded station: tune into the origin stream, chunk it
//! into the store, and retry the whole tune-and-chunk cycle under
//! exponential backoff when the origin or the store misbehaves. Mirrors
//! `original_source/radio.go`'s `StartRecording` state machine:
//!
//! ```text
//!   IDLE ──start──► TUNING ──ok──► STREAMING ──eof/err──► BACKOFF ──► TUNING
//!        ◄──stop────┘            └──ctx.cancel──► STOPPED ◄─────┘
//! ```

use std::sync::Arc;
use std::time::Duration;

use exponential_backoff::Backoff;
use tokio_util::sync::CancellationToken;

use crate::chunker::{chunk_byte_size, chunk_pipe};
use crate::models::Station;
use crate::store::ChunkStore;

const INITIAL_BACKOFF: Duration = Duration::from_secs(2);
const MAX_BACKOFF: Duration = Duration::from_secs(60);
/// Effectively unbounded: spec.md §7 says `BitrateUnknown` is "fatal if
/// persistent (no circuit breaker, backoff grows)" — there is no retry
/// ceiling, only a growing delay.
const MAX_RETRIES: u32 = u32::MAX;

/// Runs the recorder loop for `station` until `cancel` fires. Never
/// returns an `Err` — all failures are retried internally; the only way
/// out is cancellation.
pub async fn run<S: ChunkStore + 'static>(station: Station, store: Arc<S>, cancel: CancellationToken) {
    tracing::info!(station = %station.name, "recorder starting");

    'outer: loop {
        let backoff = Backoff::new(MAX_RETRIES, INITIAL_BACKOFF, MAX_BACKOFF);
        for delay in &backoff {
            if cancel.is_cancelled() {
                tracing::debug!(station = %station.name, "recorder cancelled before tune");
                break 'outer;
            }

            match record_once(&station, store.clone(), cancel.clone()).await {
                Ok(()) => {
                    if cancel.is_cancelled() {
                        break 'outer;
                    }
                    // Unexpected EOF on the origin is transient: reopen the
                    // tune-and-chunk cycle under the same backoff an error
                    // would get, rather than hammering the origin.
                    tracing::debug!(station = %station.name, "stream ended, reconnecting under backoff");
                }
                Err(e) => {
                    tracing::warn!(station = %station.name, error = %e, "recorder error, backing off");
                }
            }

            if let Some(d) = delay {
                tokio::select! {
                    _ = cancel.cancelled() => break 'outer,
                    _ = tokio::time::sleep(d) => {}
                }
            }
        }
    }

    tracing::info!(station = %station.name, "recorder stopped");
}

/// One tune → chunk → pump cycle. Returns `Ok(())` on clean EOF or
/// cancellation, `Err` on anything that should be retried under backoff.
async fn record_once<S: ChunkStore + 'static>(
    station: &Station,
    store: Arc<S>,
    cancel: CancellationToken,
) -> crate::error::Result<()> {
    let stream = tokio::select! {
        _ = cancel.cancelled() => return Ok(()),
        res = station.tune() => res?,
    };

    let chunk_bytes = chunk_byte_size(stream.bitrate_bps);
    tracing::info!(
        station = %station.name,
        bitrate_bps = stream.bitrate_bps,
        chunk_bytes,
        "tuned in, recording"
    );

    let writer_cue = crate::cue::Cue::new(&station.name, station.current_time());

    let written = chunk_pipe(stream.reader, store, writer_cue, stream.bitrate_bps, cancel).await?;
    tracing::debug!(station = %station.name, written, "chunk pipe returned");
    Ok(())
}
