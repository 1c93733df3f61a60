use std::env;

use clap::{Parser, ValueEnum};

/// Which chunk/preset store backend to wire up at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Driver {
    /// In-process store, backed by `moka`. No persistence across restarts.
    Memory,
    /// Redis-backed reference adapter.
    Redis,
}

#[derive(Debug, Parser)]
#[command(name = "radio-time-machine", about = "records and time-shifts Internet radio streams")]
pub struct Cli {
    /// Chunk/preset store backend.
    #[arg(long, value_enum, default_value = "memory", env = "RADIO_DRIVER")]
    pub driver: Driver,

    /// Store host (redis driver only).
    #[arg(long, default_value = "localhost", env = "RADIO_DBHOST")]
    pub dbhost: String,

    /// Store port (redis driver only).
    #[arg(long, default_value_t = 6379, env = "RADIO_DBPORT")]
    pub dbport: u16,

    /// Run the recorder pipeline for configured presets.
    #[arg(long, env = "RADIO_RECORD")]
    pub record: bool,

    /// Run the HTTP broadcast/listen pipeline.
    #[arg(long, env = "RADIO_BROADCAST")]
    pub broadcast: bool,

    /// Address the HTTP server binds to.
    #[arg(long, default_value = "0.0.0.0:8000", env = "RADIO_ADDR")]
    pub addr: String,

    /// Log level passed to the tracing env-filter when RUST_LOG is unset.
    #[arg(long, default_value = "info", env = "RADIO_LOGLEVEL")]
    pub loglevel: String,

    /// Unused by the implemented drivers; retained for CLI compatibility with
    /// deployments that still pass it.
    #[arg(long, default_value = "", env = "RADIO_STORAGE_DRIVER")]
    pub storage_driver: String,
}

impl Cli {
    pub fn load() -> Self {
        dotenvy::dotenv().ok();
        Cli::parse()
    }
}

/// Runtime toggles for which pipelines the supervisor starts.
///
/// Mirrors the CLI's `--record`/`--broadcast` flags so the supervisor can be
/// constructed directly in tests without going through `clap`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RadioOptions {
    pub record: bool,
    pub broadcast: bool,
}

impl From<&Cli> for RadioOptions {
    fn from(cli: &Cli) -> Self {
        RadioOptions {
            record: cli.record,
            broadcast: cli.broadcast,
        }
    }
}

pub fn redis_url(cli: &Cli) -> String {
    env::var("REDIS_URL").unwrap_or_else(|_| format!("redis://{}:{}", cli.dbhost, cli.dbport))
}
