use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;

pub const DEFAULT_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_DATA_DIR: &str = "portal";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub addr: SocketAddr,
    pub data_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_vars(
            std::env::var("PORTAL_ADDR").ok(),
            std::env::var("PORTAL_DATA_DIR").ok(),
        )
    }

    fn from_vars(addr: Option<String>, data_dir: Option<String>) -> anyhow::Result<Self> {
        let addr = addr.unwrap_or_else(|| DEFAULT_ADDR.to_string());
        let addr = addr
            .parse::<SocketAddr>()
            .with_context(|| format!("PORTAL_ADDR `{}` is not a socket address", addr))?;
        Ok(Self {
            addr,
            data_dir: PathBuf::from(data_dir.unwrap_or_else(|| DEFAULT_DATA_DIR.to_string())),
        })
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.data_dir.join("durable.dat")
    }
}
