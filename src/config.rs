use anyhow::Context;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_FAKE_USER_COUNT: usize = 1_000_000;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub database_url: String,
    pub messages_database_url: String,
    pub read_replica_urls: Vec<String>,
    pub read_from_primary: bool,
    pub max_connections: u32,
    /// Number of fake users to seed at startup, if seeding was requested.
    pub fake_user_count: Option<usize>,
    pub shutdown_grace: Duration,
    pub message_page_size: i64,
    pub search_page_size: i64,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port: u16 = parse_or(&var, "SERVICE_PORT", 8080)?;

        let read_replica_urls = var("READ_REPLICA_URLS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|url| !url.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let fake_user_count = match var("GENERATE_FAKE_DATA") {
            Some(_) => Some(parse_or(&var, "FAKE_USER_COUNT", DEFAULT_FAKE_USER_COUNT)?),
            None => None,
        };

        let message_page_size: i64 = parse_or(&var, "MESSAGE_PAGE_SIZE", 100)?;
        let search_page_size: i64 = parse_or(&var, "SEARCH_PAGE_SIZE", 1000)?;
        if message_page_size <= 0 || search_page_size <= 0 {
            anyhow::bail!("page sizes must be positive");
        }

        let max_connections: u32 = parse_or(&var, "DB_MAX_CONNECTIONS", 10)?;
        if max_connections == 0 {
            anyhow::bail!("DB_MAX_CONNECTIONS must be at least 1");
        }

        Ok(Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], port)),
            database_url: var("DATABASE_URL")
                .unwrap_or_else(|| "sqlite://socnet.db?mode=rwc".to_string()),
            messages_database_url: var("MESSAGES_DATABASE_URL")
                .unwrap_or_else(|| "sqlite://socnet_messages.db?mode=rwc".to_string()),
            read_replica_urls,
            read_from_primary: parse_or(&var, "READ_FROM_PRIMARY", true)?,
            max_connections,
            fake_user_count,
            shutdown_grace: Duration::from_secs(parse_or(&var, "SHUTDOWN_GRACE_SECS", 5)?),
            message_page_size,
            search_page_size,
        })
    }
}

fn parse_or<T, F>(var: &F, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("invalid value for {}: {:?}", key, raw)),
        None => Ok(default),
    }
}
