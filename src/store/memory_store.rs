use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use tokio::sync::RwLock;

use super::{ChunkStore, PresetStore, CHUNK_TTL_SECS};
use crate::error::Result;
use crate::models::Station;

fn chunk_key(station: &str, cue_key: &str) -> String {
    format!("chunk:{station}:{cue_key}")
}

/// In-process chunk/preset store used for local development and tests.
/// Chunks expire after `CHUNK_TTL_SECS`; presets never expire, matching the
/// reference Redis adapter's behavior.
#[derive(Clone)]
pub struct MemoryStore {
    chunks: Cache<String, Arc<Vec<u8>>>,
    presets: Arc<RwLock<std::collections::HashMap<String, Station>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore {
            chunks: Cache::builder()
                .time_to_live(Duration::from_secs(CHUNK_TTL_SECS))
                .build(),
            presets: Arc::new(RwLock::new(std::collections::HashMap::new())),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Approximate number of chunks currently held, for tests and basic
    /// introspection. `moka` applies writes on a background schedule, so
    /// pending tasks are flushed first to get an accurate count.
    pub async fn chunk_count(&self) -> u64 {
        self.chunks.run_pending_tasks().await;
        self.chunks.entry_count()
    }
}

#[async_trait]
impl ChunkStore for MemoryStore {
    async fn write_chunk(&self, station: &str, cue_key: &str, bytes: &[u8]) -> Result<()> {
        self.chunks
            .insert(chunk_key(station, cue_key), Arc::new(bytes.to_vec()))
            .await;
        Ok(())
    }

    async fn read_chunk(&self, station: &str, cue_key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self
            .chunks
            .get(&chunk_key(station, cue_key))
            .await
            .map(|bytes| (*bytes).clone()))
    }
}

#[async_trait]
impl PresetStore for MemoryStore {
    async fn lookup_preset(&self, name: &str) -> Result<Option<Station>> {
        Ok(self.presets.read().await.get(name).cloned())
    }

    async fn add_preset(&self, station: &Station) -> Result<()> {
        self.presets
            .write()
            .await
            .insert(station.name.clone(), station.clone());
        Ok(())
    }

    async fn read_all_presets(&self) -> Result<Vec<Station>> {
        Ok(self.presets.read().await.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn writes_then_reads_a_chunk() {
        let store = MemoryStore::new();
        store.write_chunk("wamc", "2020-01-01T00:00:00Z", b"audio-bytes").await.unwrap();
        let chunk = store.read_chunk("wamc", "2020-01-01T00:00:00Z").await.unwrap();
        assert_eq!(chunk, Some(b"audio-bytes".to_vec()));
    }

    #[tokio::test]
    async fn missing_chunk_is_none_not_error() {
        let store = MemoryStore::new();
        let chunk = store.read_chunk("wamc", "nope").await.unwrap();
        assert_eq!(chunk, None);
    }

    #[tokio::test]
    async fn presets_round_trip_and_list() {
        let store = MemoryStore::new();
        let wamc = Station::new("wamc", "http://example/wamc.mp3", "America/New_York");
        store.add_preset(&wamc).await.unwrap();

        assert_eq!(store.lookup_preset("wamc").await.unwrap(), Some(wamc.clone()));
        assert_eq!(store.lookup_preset("missing").await.unwrap(), None);
        assert_eq!(store.read_all_presets().await.unwrap(), vec![wamc]);
    }

    #[tokio::test]
    async fn chunks_for_different_stations_do_not_collide() {
        let store = MemoryStore::new();
        store.write_chunk("wamc", "same-cue", b"wamc-bytes").await.unwrap();
        store.write_chunk("falling", "same-cue", b"falling-bytes").await.unwrap();

        assert_eq!(store.read_chunk("wamc", "same-cue").await.unwrap(), Some(b"wamc-bytes".to_vec()));
        assert_eq!(store.read_chunk("falling", "same-cue").await.unwrap(), Some(b"falling-bytes".to_vec()));
    }
}
