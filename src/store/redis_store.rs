use async_trait::async_trait;
use redis::AsyncCommands;

use super::{ChunkStore, PresetStore, CHUNK_TTL_SECS};
use crate::error::{RadioError, Result};
use crate::models::Station;

/// Redis-backed reference adapter. Key layout matches the original's
/// `chunk:{name}:{cueKey}` / `preset:{name}` namespacing exactly, including
/// the `preset:*` scan used to enumerate presets.
#[derive(Clone)]
pub struct RedisStore {
    conn: redis::aio::ConnectionManager,
}

impl RedisStore {
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)
            .map_err(|e| RadioError::BackendInitFailed(e.to_string()))?;
        let conn = redis::aio::ConnectionManager::new(client)
            .await
            .map_err(|e| RadioError::BackendInitFailed(e.to_string()))?;
        Ok(RedisStore { conn })
    }
}

fn chunk_key(station: &str, cue_key: &str) -> String {
    format!("chunk:{station}:{cue_key}")
}

fn preset_key(name: &str) -> String {
    format!("preset:{name}")
}

#[async_trait]
impl ChunkStore for RedisStore {
    async fn write_chunk(&self, station: &str, cue_key: &str, bytes: &[u8]) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = conn
            .set_ex(chunk_key(station, cue_key), bytes, CHUNK_TTL_SECS)
            .await?;
        Ok(())
    }

    async fn read_chunk(&self, station: &str, cue_key: &str) -> Result<Option<Vec<u8>>> {
        let mut conn = self.conn.clone();
        let value: Option<Vec<u8>> = conn.get(chunk_key(station, cue_key)).await?;
        Ok(value)
    }
}

#[async_trait]
impl PresetStore for RedisStore {
    async fn lookup_preset(&self, name: &str) -> Result<Option<Station>> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(preset_key(name)).await?;
        match raw {
            Some(json) => {
                let station = serde_json::from_str(&json)
                    .map_err(|e| RadioError::EncodingError(e.to_string()))?;
                Ok(Some(station))
            }
            None => Ok(None),
        }
    }

    async fn add_preset(&self, station: &Station) -> Result<()> {
        let mut conn = self.conn.clone();
        let json = serde_json::to_string(station)
            .map_err(|e| RadioError::EncodingError(e.to_string()))?;
        let _: () = conn.set(preset_key(&station.name), json).await?;
        Ok(())
    }

    async fn read_all_presets(&self) -> Result<Vec<Station>> {
        let mut conn = self.conn.clone();
        let keys: Vec<String> = conn.keys("preset:*").await?;
        let mut presets = Vec::with_capacity(keys.len());
        for key in keys {
            let raw: Option<String> = conn.get(&key).await?;
            if let Some(json) = raw {
                match serde_json::from_str(&json) {
                    Ok(station) => presets.push(station),
                    // spec.md §7: EncodingError at startup is logged and the
                    // offending preset is skipped, not fatal to the whole load.
                    Err(e) => tracing::warn!(
                        key = %key,
                        error = %RadioError::EncodingError(e.to_string()),
                        "skipping preset with invalid JSON"
                    ),
                }
            }
        }
        Ok(presets)
    }
}
