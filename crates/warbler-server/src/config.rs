use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};

/// Placeholder session secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me", "dev-secret-change-me", "secret"];

#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub addr: SocketAddr,
    pub session_secret: String,
    pub session_days: i64,
    pub secure_cookies: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let session_secret = get("WARBLER_SESSION_SECRET").unwrap_or_default();
        if session_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&session_secret.as_str()) {
            bail!("WARBLER_SESSION_SECRET is unset or still a placeholder");
        }

        let db_path = get("WARBLER_DB_PATH").unwrap_or_else(|| "warbler.db".into());
        let host = get("WARBLER_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = get("WARBLER_PORT")
            .unwrap_or_else(|| "5000".into())
            .parse()
            .context("WARBLER_PORT must be a port number")?;
        let addr: SocketAddr = format!("{}:{}", host, port)
            .parse()
            .context("WARBLER_HOST must be an IP address")?;

        let session_days: i64 = get("WARBLER_SESSION_DAYS")
            .map(|v| v.parse::<i64>())
            .transpose()
            .context("WARBLER_SESSION_DAYS must be a whole number")?
            .unwrap_or(7);
        if session_days <= 0 {
            bail!("WARBLER_SESSION_DAYS must be positive");
        }

        let secure_cookies = get("WARBLER_SECURE_COOKIES")
            .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Ok(Self {
            db_path: db_path.into(),
            addr,
            session_secret,
            session_days,
            secure_cookies,
        })
    }
}
