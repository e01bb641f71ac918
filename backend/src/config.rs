//! Runtime configuration, read once from the environment at startup.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Result;

const DEFAULT_DATABASE_URL: &str = "sqlite:chore-tracker.db";
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    /// Root directory for the local photo store. When unset, photo
    /// uploads are refused and everything else works normally.
    pub photo_dir: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());
        let bind_addr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string())
            .parse()?;
        let photo_dir = env::var("PHOTO_DIR").ok().map(PathBuf::from);

        Ok(Self {
            database_url,
            bind_addr,
            photo_dir,
        })
    }
}
