use std::net::SocketAddr;

use crate::variants::BaseUrls;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Settings for the fetch → extract → reconcile pipeline.
///
/// Kept separate from [`AppConfig`] so that database-free entry points
/// (fixture runs, transport tests) can load it without `DATABASE_URL`.
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    pub base_urls: BaseUrls,
    /// Overall budget for one page fetch, covering every redirect hop.
    pub fetch_timeout_secs: u64,
    pub max_redirects: usize,
    pub user_agent: String,
    /// Default for invocations that do not pass an explicit dry-run flag.
    pub dry_run: bool,
    /// Cron expression (with seconds) for the scheduled scrape job.
    pub schedule: String,
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub scrape: ScrapeConfig,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("scrape", &self.scrape)
            .finish()
    }
}
