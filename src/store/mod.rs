pub mod memory_store;
pub mod redis_store;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::Station;

/// TTL chunks live for, per the data model's retention window.
pub const CHUNK_TTL_SECS: u64 = 24 * 60 * 60;

/// Capability for writing and reading time-indexed audio chunks.
///
/// `station` and `cue_key` together address one chunk; implementations own
/// the namespacing scheme (the Redis adapter joins them as
/// `chunk:{station}:{cue_key}`).
#[async_trait]
pub trait ChunkStore: Send + Sync {
    async fn write_chunk(&self, station: &str, cue_key: &str, bytes: &[u8]) -> Result<()>;
    async fn read_chunk(&self, station: &str, cue_key: &str) -> Result<Option<Vec<u8>>>;
}

/// Capability for looking up and listing configured stations (presets).
/// Mutation is out of scope; presets are seeded at startup.
#[async_trait]
pub trait PresetStore: Send + Sync {
    async fn lookup_preset(&self, name: &str) -> Result<Option<Station>>;
    async fn add_preset(&self, station: &Station) -> Result<()>;
    async fn read_all_presets(&self) -> Result<Vec<Station>>;
}
