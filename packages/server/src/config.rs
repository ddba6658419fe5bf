use anyhow::{bail, Context, Result};
use dotenvy::dotenv;
use std::env;
use std::net::SocketAddr;
use std::time::Duration;

const DEFAULT_ADDR: &str = ":7070";
const DEFAULT_DB_PATH: &str = "../data/telemetry.db";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub db_path: String,
    pub request_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let listen_addr = parse_listen_addr(&env_or("INGEST_ADDR", DEFAULT_ADDR))?;

        let db_path = env_or("DB_PATH", DEFAULT_DB_PATH);
        check_db_path(&db_path)?;

        let request_timeout = env_or(
            "REQUEST_TIMEOUT_SECS",
            &DEFAULT_REQUEST_TIMEOUT_SECS.to_string(),
        )
        .parse::<u64>()
        .context("REQUEST_TIMEOUT_SECS must be a valid number")?;

        Ok(Self {
            listen_addr,
            db_path,
            request_timeout: Duration::from_secs(request_timeout),
        })
    }
}

/// Reads a variable, treating unset and blank values as missing.
fn env_or(key: &str, default: &str) -> String {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Accepts `host:port` or a bare `:port`, which binds every interface.
pub fn parse_listen_addr(raw: &str) -> Result<SocketAddr> {
    let full = if raw.starts_with(':') {
        format!("0.0.0.0{raw}")
    } else {
        raw.to_string()
    };
    full.parse()
        .with_context(|| format!("INGEST_ADDR must be host:port, got {raw:?}"))
}

/// The database lives in the shared data directory, never next to the binary.
pub fn check_db_path(path: &str) -> Result<()> {
    if path.starts_with("./") || path.starts_with("telemetry.db") {
        bail!("Refusing local DB path {path:?}. Use {DEFAULT_DB_PATH}");
    }
    Ok(())
}
