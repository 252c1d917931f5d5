use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Result, anyhow};
use tracing::info;

/// Where session bindings live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionBackend {
    /// In the application database; survives restarts.
    Sqlite,
    /// In this process only.
    Memory,
}

impl FromStr for SessionBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(Self::Sqlite),
            "memory" => Ok(Self::Memory),
            other => Err(anyhow!("unknown session store '{}' (expected sqlite or memory)", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub session_backend: SessionBackend,
    pub cookie_secure: bool,
    pub body_limit_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let body_limit_mb: usize = load(&lookup, "SCRIBE_BODY_LIMIT_MB", "50")?;
        let body_limit_bytes = body_limit_mb
            .checked_mul(1024 * 1024)
            .ok_or_else(|| anyhow!("SCRIBE_BODY_LIMIT_MB value {body_limit_mb} is too large"))?;

        Ok(Self {
            host: load(&lookup, "SCRIBE_HOST", "0.0.0.0")?,
            port: load(&lookup, "SCRIBE_PORT", "4000")?,
            db_path: load(&lookup, "SCRIBE_DB_PATH", "scribe.db")?,
            session_backend: load(&lookup, "SCRIBE_SESSION_STORE", "sqlite")?,
            cookie_secure: load(&lookup, "SCRIBE_COOKIE_SECURE", "false")?,
            body_limit_bytes,
        })
    }
}

fn load<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: &str) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    let raw = lookup(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });
    raw.parse()
        .map_err(|e| anyhow!("invalid {key} value '{raw}': {e}"))
}
