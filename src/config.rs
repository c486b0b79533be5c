use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Server settings, parsed from the command line.
#[derive(Debug, Clone, Parser)]
#[command(author, version, about = "In-memory Redis-compatible key/value server", long_about = None)]
pub struct Config {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1")]
    pub bind: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = 8001)]
    pub port: u16,

    /// JSON snapshot file, loaded at startup and rewritten periodically
    #[arg(long, default_value = "./data.json")]
    pub snapshot_path: PathBuf,

    /// Seconds between snapshots (0 disables periodic snapshots)
    #[arg(long, default_value_t = 20)]
    pub snapshot_interval: u64,

    /// Milliseconds between expiry sweeps
    #[arg(long, default_value_t = 1000)]
    pub sweep_interval_ms: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub loglevel: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bind: "127.0.0.1".to_string(),
            port: 8001,
            snapshot_path: PathBuf::from("./data.json"),
            snapshot_interval: 20,
            sweep_interval_ms: 1000,
            loglevel: "info".to_string(),
        }
    }
}

impl Config {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }

    pub fn snapshot_every(&self) -> Option<Duration> {
        (self.snapshot_interval > 0).then(|| Duration::from_secs(self.snapshot_interval))
    }

    /// Never zero; `tokio::time::interval` panics on a zero period.
    pub fn sweep_every(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms.max(1))
    }
}
