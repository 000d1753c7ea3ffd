use std::net::{IpAddr, Ipv4Addr};
use std::path::Path;
use std::time::Duration;

use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::Deserialize;

use crate::Result;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_rust_log")]
    pub rust_log: String,

    /// e.g. `sqlite://hearth.db?mode=rwc`
    pub database_url: String,

    #[serde(default)]
    pub listen: ListenConfig,

    /// per-call deadline for store reads/writes, in milliseconds.
    /// operations that miss it fail with a retryable error.
    #[serde(default = "default_store_timeout_ms")]
    pub store_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListenConfig {
    #[serde(default = "default_address")]
    pub address: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Config {
    /// config.toml merged with `HEARTH_*` environment overrides
    pub fn load(path: &Path) -> Result<Self> {
        let config = Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("HEARTH_"))
            .extract()?;
        Ok(config)
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            port: default_port(),
        }
    }
}

fn default_rust_log() -> String {
    "info".to_string()
}

fn default_store_timeout_ms() -> u64 {
    5000
}

fn default_address() -> IpAddr {
    Ipv4Addr::LOCALHOST.into()
}

fn default_port() -> u16 {
    4000
}
