//! HTTP surface: the broadcast listen route and the read-only preset
//! listing, assembled into routers the supervisor mounts. Mirrors the
//! teacher's `api::station_routes()`-style router builders, just with one
//! state type shared by both handlers.

use std::sync::Arc;

use axum::{routing::get, Router};

use crate::player::{self, PlayerState};
use crate::store::{ChunkStore, PresetStore};

pub fn broadcast_routes<S>() -> Router<Arc<PlayerState<S>>>
where
    S: ChunkStore + PresetStore + Send + Sync + 'static,
{
    Router::new().route("/listen/:station/:area1/:area2", get(player::broadcast::<S>))
}

pub fn preset_routes<S>() -> Router<Arc<PlayerState<S>>>
where
    S: ChunkStore + PresetStore + Send + Sync + 'static,
{
    Router::new().route("/preset/list", get(player::list_presets::<S>))
}
