//! The per-listener broadcast handler: time-shift the request into a
//! station-local cue, stream chunks paced by the chunk duration, and
//! surface a mid-stream failure as an HTTP trailer rather than a truncated
//! body. Grounded in `original_source/radio.go`'s `Broadcast`/`Stream`/
//! `writeTrailers`, reimplemented with `http_body`'s native trailers frame
//! instead of a raw connection hijack.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context as TaskContext, Poll};
use std::time::Duration;

use axum::{
    body::Body,
    extract::{Path, State},
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use http_body::{Frame, SizeHint};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::cue::CHUNK_SECONDS;
use crate::error::RadioError;
use crate::path::parse_listen_path;
use crate::store::{ChunkStore, PresetStore};
use crate::tape::{recorded, ChunkReader};

/// Chunks pushed to the client before the Δ-second ticker takes over, to
/// absorb jitter in the first interval.
const BUFFER_CHUNKS: u32 = 2;

const TRAILER_NAME: &str = "X-Streaming-Error";

pub struct PlayerState<S> {
    pub store: Arc<S>,
    pub stop: CancellationToken,
}

/// `GET /listen/:station/:area1/:area2`
pub async fn broadcast<S: ChunkStore + PresetStore + 'static>(
    State(state): State<Arc<PlayerState<S>>>,
    Path((station, area1, area2)): Path<(String, String, String)>,
) -> Response {
    let req = match parse_listen_path(&station, &area1, &area2) {
        Ok(req) => req,
        Err(_) => return StatusCode::NOT_FOUND.into_response(),
    };

    let preset = match state.store.lookup_preset(&req.station).await {
        Ok(Some(preset)) => preset,
        Ok(None) => return StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            tracing::error!(station = %req.station, error = %e, "preset lookup failed");
            return StatusCode::SERVICE_UNAVAILABLE.into_response();
        }
    };

    let cue_anchor = match preset.listener_time(&req.listener_tz) {
        Ok(t) => t,
        Err(_) => return StatusCode::NOT_FOUND.into_response(),
    };

    tracing::info!(station = %preset.name, listener_tz = %req.listener_tz, "broadcasting");

    let reader = recorded(state.store.clone(), &preset.name, cue_anchor);
    let (tx, rx) = mpsc::channel::<Frame<Bytes>>(4);
    tokio::spawn(stream_chunks(reader, tx, state.stop.clone()));

    let mut response = Response::new(Body::new(TraileredBody { rx }));
    response.headers_mut().insert(
        HeaderName::from_static("trailer"),
        HeaderValue::from_static(TRAILER_NAME),
    );
    response
}

/// Drives the actual read/pace/send loop in a background task so the
/// handler can return the response (and its trailer declaration) before
/// the first chunk is ready.
async fn stream_chunks<S: ChunkStore>(
    mut reader: ChunkReader<S>,
    tx: mpsc::Sender<Frame<Bytes>>,
    stop: CancellationToken,
) {
    let error = stream_loop(&mut reader, &tx, &stop).await;

    if let Some(message) = error {
        let mut trailers = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(&message) {
            trailers.insert(HeaderName::from_static("x-streaming-error"), value);
            let _ = tx.send(Frame::trailers(trailers)).await;
        }
    }
}

async fn stream_loop<S: ChunkStore>(
    reader: &mut ChunkReader<S>,
    tx: &mpsc::Sender<Frame<Bytes>>,
    stop: &CancellationToken,
) -> Option<String> {
    for _ in 0..BUFFER_CHUNKS {
        if let Err(message) = push_chunk(reader, tx).await {
            return Some(message);
        }
    }

    let mut ticker = tokio::time::interval(Duration::from_secs(CHUNK_SECONDS as u64));
    ticker.tick().await; // first tick fires immediately; discard it

    loop {
        tokio::select! {
            biased;
            _ = stop.cancelled() => {
                tracing::debug!("stream cancelled by shutdown");
                return Some("stream cancelled".to_string());
            }
            _ = ticker.tick() => {
                if let Err(message) = push_chunk(reader, tx).await {
                    return Some(message);
                }
            }
        }
    }
}

/// Reads one chunk and forwards it as a data frame. Returns the trailer
/// message to send on failure; `Ok(())` continues the stream.
async fn push_chunk<S: ChunkStore>(
    reader: &mut ChunkReader<S>,
    tx: &mpsc::Sender<Frame<Bytes>>,
) -> Result<(), String> {
    let chunk = match reader.read().await {
        Ok(chunk) => chunk,
        Err(e) => {
            tracing::warn!(error = %e, "error reading tape");
            return Err(classify_read_error(&e));
        }
    };

    if tx.send(Frame::data(Bytes::from(chunk))).await.is_err() {
        // The receiving `Body` was dropped, meaning the client disconnected.
        // There is no one left to deliver this trailer to, but it keeps the
        // classification consistent with spec.md's taxonomy.
        tracing::debug!("client disconnected mid-stream");
        return Err("client error".to_string());
    }

    Ok(())
}

/// Maps any store-read failure onto spec.md §7's closed trailer vocabulary
/// (`stream cancelled` / `backend error` / `client error`) — a read error is
/// always a backend-layer failure from the listener's point of view, never
/// a raw error `Display` string.
fn classify_read_error(_e: &RadioError) -> String {
    "backend error".to_string()
}

/// `GET /preset/list`
pub async fn list_presets<S: PresetStore>(State(state): State<Arc<PlayerState<S>>>) -> Response {
    match state.store.read_all_presets().await {
        Ok(presets) => axum::Json(serde_json::json!({ "presets": presets })).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "failed to list presets");
            axum::Json(serde_json::json!({ "presets": [], "err": e.to_string() })).into_response()
        }
    }
}

/// A `http_body::Body` fed by a background task, so data frames and a
/// final trailers frame can be produced independently of the handler's
/// own lifetime.
struct TraileredBody {
    rx: mpsc::Receiver<Frame<Bytes>>,
}

impl http_body::Body for TraileredBody {
    type Data = Bytes;
    type Error = std::convert::Infallible;

    fn poll_frame(
        mut self: Pin<&mut Self>,
        cx: &mut TaskContext<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        self.rx.poll_recv(cx).map(|opt| opt.map(Ok))
    }

    fn size_hint(&self) -> SizeHint {
        SizeHint::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Station;
    use crate::store::memory_store::MemoryStore;
    use chrono::Utc;

    #[tokio::test]
    async fn push_chunk_forwards_bytes_and_advances_cue() {
        let store = Arc::new(MemoryStore::new());
        let anchor = Utc::now();

        let (client, mut server) = tokio::io::duplex(64 * 1024);
        tokio::spawn(async move {
            use tokio::io::AsyncWriteExt;
            let _ = server.write_all(&[1u8; 160_000]).await;
        });

        crate::chunker::chunk_pipe(
            client,
            store.clone(),
            crate::cue::Cue::new("wkrp", anchor),
            64_000,
            CancellationToken::new(),
        )
        .await
        .unwrap();

        let mut reader = recorded(store, "wkrp", anchor);
        let (tx, mut rx) = mpsc::channel(4);
        push_chunk(&mut reader, &tx).await.unwrap();
        drop(tx);

        let frame = rx.recv().await.unwrap();
        assert!(frame.is_data());
    }

    #[tokio::test]
    async fn push_chunk_on_missing_data_reports_backend_error() {
        let store = Arc::new(MemoryStore::new());
        let mut reader = recorded(store, "wkrp", Utc::now());
        let (tx, _rx) = mpsc::channel(4);

        let err = push_chunk(&mut reader, &tx).await.unwrap_err();
        assert_eq!(err, "backend error");
    }

    #[test]
    fn classifies_preset_station_model_is_clonable() {
        // Guards that `Station` stays usable from the player path without
        // extra glue.
        let station = Station::new("wkrp", "http://example/stream.mp3", "America/Chicago");
        let _ = station.clone();
    }
}
