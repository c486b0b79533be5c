use clap::Parser;
use ramkv::config::Config;
use ramkv::engine::{Engine, shared};
use ramkv::expire::now_millis;
use ramkv::persistence;
use ramkv::server;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let config = Config::parse();

    // RUST_LOG wins over --loglevel
    let (filter, bad_level) = match EnvFilter::try_from_default_env() {
        Ok(filter) => (filter, None),
        Err(_) => match EnvFilter::try_new(&config.loglevel) {
            Ok(filter) => (filter, None),
            Err(e) => (EnvFilter::new("info"), Some(e)),
        },
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
    if let Some(e) = bad_level {
        warn!("Invalid loglevel '{}': {e}, using info", config.loglevel);
    }

    let engine = if config.snapshot_path.exists() {
        info!("Loading snapshot from {}...", config.snapshot_path.display());
        match persistence::load(&config.snapshot_path, now_millis()) {
            Ok((keyspace, expiry)) => {
                info!(keys = keyspace.len(), "Snapshot loaded");
                Engine::with_data(keyspace, expiry)
            }
            Err(e) => {
                warn!("Failed to load snapshot: {e}, starting with empty store");
                Engine::new()
            }
        }
    } else {
        Engine::new()
    };

    server::run_server(shared(engine), config).await
}
