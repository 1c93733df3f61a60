use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt};

use crate::cue::{Cue, CHUNK_SECONDS};
use crate::error::{RadioError, Result};
use crate::mp3::detect_bitrate;
use crate::store::ChunkStore;

/// Roughly how many bytes a `CHUNK_SECONDS`-long chunk holds at the given
/// bitrate. Used to size each read so a chunk boundary lands close to the
/// intended wall-clock duration; actual reads are not truncated to this
/// exact size, matching the original's "best effort" chunking.
pub fn chunk_byte_size(bitrate_bps: u32) -> usize {
    (bitrate_bps as usize / 8) * CHUNK_SECONDS as usize
}

/// Reads `reader` in `CHUNK_SECONDS`-sized pieces and writes each piece to
/// `store` under a freshly advanced `cue`, until the reader is exhausted or
/// `cancel` fires. Returns the number of chunks written.
pub async fn chunk_pipe<R, S>(
    mut reader: R,
    store: Arc<S>,
    mut cue: Cue,
    bitrate_bps: u32,
    cancel: tokio_util::sync::CancellationToken,
) -> Result<u64>
where
    R: AsyncRead + Unpin,
    S: ChunkStore,
{
    let chunk_size = chunk_byte_size(bitrate_bps).max(1);
    let mut buf = vec![0u8; chunk_size];
    let mut chunks_written = 0u64;
    let station = cue.station().to_string();

    loop {
        if cancel.is_cancelled() {
            return Ok(chunks_written);
        }

        // `readFull`: a chunk is only ever written whole. Any EOF, whether
        // at a chunk boundary or mid-chunk, is "unexpected" for a live
        // station stream and is surfaced as a clean return so the recorder
        // reopens the tune-and-chunk cycle under backoff rather than ever
        // writing a short chunk.
        let read_result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(chunks_written),
            r = reader.read_exact(&mut buf) => r,
        };

        match read_result {
            Ok(_) => {
                let key = cue.key();
                store.write_chunk(&station, &key, &buf).await?;
                chunks_written += 1;
            }
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                return Ok(chunks_written);
            }
            Err(e) => return Err(RadioError::StreamReadError(e.to_string())),
        }
    }
}

/// Convenience wrapper matching `Station::tune`'s typical call shape: reads
/// just enough of `reader` to decode one MP3 frame header and returns its
/// bitrate. The consumed bytes are not pushed back onto `reader` — they are
/// lost from the head of whatever chunk `chunk_pipe` writes first, per
/// spec.md §4.3's documented head-of-stream loss.
pub async fn detect_bitrate_from_reader<R>(reader: &mut R) -> Result<u32>
where
    R: AsyncRead + Unpin,
{
    let mut probe = vec![0u8; 4096];
    let n = reader
        .read(&mut probe)
        .await
        .map_err(|e| RadioError::StreamReadError(e.to_string()))?;
    detect_bitrate(&probe[..n])
}
