use anyhow::{Context, Result};
use std::net::SocketAddr;

/// Service configuration, read once at startup and threaded through as part
/// of `AppState`. No process-wide globals.
#[derive(Clone, Debug)]
pub struct Config {
    pub user_agent: String,
    pub db_path: String,
    pub days_checked_recently: i64,
    pub bind_addr: SocketAddr,
    pub sentry_dsn: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let user_agent = std::env::var("USER_AGENT")
            .unwrap_or_else(|_| "feedgate/0.1 (+https://github.com/)".to_string());

        let db_path = std::env::var("DB_PATH")
            .or_else(|_| std::env::var("DYNAMODB_TABLE"))
            .unwrap_or_else(|_| "./db/feedgate.db".to_string());

        let days_checked_recently = std::env::var("DAYS_CHECKED_RECENTLY")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(7);

        let bind_addr: SocketAddr = std::env::var("BIND_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:8000".to_string())
            .parse()
            .context("BIND_ADDR must be host:port")?;

        let sentry_dsn = std::env::var("SENTRY_DSN").ok();

        Ok(Self {
            user_agent,
            db_path,
            days_checked_recently,
            bind_addr,
            sentry_dsn,
        })
    }
}
