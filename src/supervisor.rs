//! The on/off lifecycle coordinator. Starts N recorder tasks plus an HTTP
//! listener, propagates a shutdown signal, and waits for every task to
//! drain. Named for what it does; the original calls this type `Radio`
//! (`original_source/radio.go`).

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::api;
use crate::config::RadioOptions;
use crate::error::{RadioError, Result};
use crate::player::PlayerState;
use crate::recorder;
use crate::store::{ChunkStore, PresetStore};

/// The HTTP server's graceful-shutdown deadline, per spec.md §4.7.
const SERVER_SHUTDOWN_DEADLINE: Duration = Duration::from_secs(5);

pub struct Supervisor<S> {
    store: Arc<S>,
    options: RadioOptions,
    addr: String,
    stop: CancellationToken,
    recorders: Mutex<Vec<JoinHandle<()>>>,
    server: Mutex<Option<JoinHandle<std::io::Result<()>>>>,
    bound_addr: Mutex<Option<SocketAddr>>,
}

impl<S> Supervisor<S>
where
    S: ChunkStore + PresetStore + Send + Sync + 'static,
{
    pub fn new(store: Arc<S>, options: RadioOptions, addr: impl Into<String>) -> Self {
        Supervisor {
            store,
            options,
            addr: addr.into(),
            stop: CancellationToken::new(),
            recorders: Mutex::new(Vec::new()),
            server: Mutex::new(None),
            bound_addr: Mutex::new(None),
        }
    }

    /// The HTTP server's actual bound address, once `on()` has started it.
    /// Useful when `addr` was given as `host:0` to pick an ephemeral port.
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        *self.bound_addr.lock().await
    }

    /// Starts recording (if enabled) and the broadcast HTTP server (if
    /// enabled). Returns once both are launched; neither blocks the caller.
    pub async fn on(&self) -> Result<()> {
        tracing::info!(
            record = self.options.record,
            broadcast = self.options.broadcast,
            "powering on the time machine"
        );

        if self.options.record {
            self.start_recorders().await?;
        }

        if self.options.broadcast {
            self.start_broadcast().await?;
        }

        Ok(())
    }

    async fn start_recorders(&self) -> Result<()> {
        let presets = self.store.read_all_presets().await?;
        tracing::info!(count = presets.len(), "starting recording presets");

        let mut handles = self.recorders.lock().await;
        for station in presets {
            let store = self.store.clone();
            let stop = self.stop.clone();
            let name = station.name.clone();
            handles.push(tokio::spawn(async move {
                recorder::run(station, store, stop).await;
                tracing::debug!(station = %name, "recorder task exited");
            }));
        }
        Ok(())
    }

    async fn start_broadcast(&self) -> Result<()> {
        let state = Arc::new(PlayerState {
            store: self.store.clone(),
            stop: self.stop.clone(),
        });

        let cors = CorsLayer::new()
            .allow_headers(Any)
            .allow_methods(Any)
            .allow_origin(Any);

        let app = api::broadcast_routes::<S>()
            .merge(api::preset_routes::<S>())
            .with_state(state)
            .layer(TraceLayer::new_for_http())
            .layer(cors);

        let listener = tokio::net::TcpListener::bind(&self.addr)
            .await
            .map_err(|e| RadioError::BackendInitFailed(format!("failed to bind {}: {e}", self.addr)))?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| RadioError::BackendInitFailed(e.to_string()))?;
        *self.bound_addr.lock().await = Some(local_addr);
        tracing::info!(addr = %local_addr, "starting broadcast and preset service");

        let stop = self.stop.clone();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move { stop.cancelled().await })
                .await
        });

        *self.server.lock().await = Some(handle);
        Ok(())
    }

    /// Shuts the server down (bounded by `SERVER_SHUTDOWN_DEADLINE`), then
    /// cancels every recorder and waits for all of them to exit. Returns
    /// only after both have fully drained.
    pub async fn off(&self) {
        tracing::info!("powering down the time machine");

        self.stop.cancel();

        if let Some(handle) = self.server.lock().await.take() {
            match tokio::time::timeout(SERVER_SHUTDOWN_DEADLINE, handle).await {
                Ok(Ok(Ok(()))) => {}
                Ok(Ok(Err(e))) => tracing::warn!(error = %e, "server exited with error"),
                Ok(Err(e)) => tracing::warn!(error = %e, "server task panicked"),
                Err(_) => tracing::warn!("server did not shut down within the deadline"),
            }
        }

        let handles: Vec<_> = self.recorders.lock().await.drain(..).collect();
        for handle in handles {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "recorder task panicked");
            }
        }

        tracing::info!("time machine is off");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Station;
    use crate::store::memory_store::MemoryStore;

    #[tokio::test]
    async fn off_drains_recorders_started_by_on() {
        let store = Arc::new(MemoryStore::new());
        store
            .add_preset(&Station::new(
                "unreachable",
                "http://127.0.0.1:1/unused.mp3",
                "America/New_York",
            ))
            .await
            .unwrap();

        let options = RadioOptions { record: true, broadcast: false };
        let sup = Supervisor::new(store, options, "127.0.0.1:0");
        sup.on().await.unwrap();

        tokio::time::timeout(Duration::from_secs(5), sup.off())
            .await
            .expect("off() did not drain within the test deadline");
    }

    #[tokio::test]
    async fn broadcast_server_binds_and_shuts_down_cleanly() {
        let store = Arc::new(MemoryStore::new());
        let options = RadioOptions { record: false, broadcast: true };
        let sup = Supervisor::new(store, options, "127.0.0.1:0");
        sup.on().await.unwrap();

        tokio::time::timeout(Duration::from_secs(5), sup.off())
            .await
            .expect("off() did not shut down the server within the test deadline");
    }
}
