use crate::app_config::{AppConfig, Environment, ScrapeConfig};
use crate::variants::{BaseUrls, DEFAULT_CA_BASE_URL, DEFAULT_US_BASE_URL};
use crate::ConfigError;
use url::Url;

pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Every six hours, on the hour.
pub const DEFAULT_SCRAPE_SCHEDULE: &str = "0 0 */6 * * *";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Load only the pipeline settings; does not require `DATABASE_URL`.
///
/// # Errors
///
/// Returns `ConfigError` if a scrape setting is present but invalid.
pub fn load_scrape_config() -> Result<ScrapeConfig, ConfigError> {
    dotenvy::dotenv().ok();
    build_scrape_config(&|key: &str| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so it can be tested with a pure
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let database_url = require("DATABASE_URL")?;
    if database_url.trim().is_empty() {
        return Err(ConfigError::MissingEnvVar("DATABASE_URL".to_string()));
    }

    let env = parse_environment(&or_default("OFFERWATCH_ENV", "development"))?;

    let bind_raw = or_default("OFFERWATCH_BIND_ADDR", "0.0.0.0:3000");
    let bind_addr = bind_raw
        .parse::<SocketAddr>()
        .map_err(|e| ConfigError::InvalidEnvVar {
            var: "OFFERWATCH_BIND_ADDR".to_string(),
            reason: e.to_string(),
        })?;
    let log_level = or_default("OFFERWATCH_LOG_LEVEL", "info");

    let db_max_connections = parse_num(&lookup, "OFFERWATCH_DB_MAX_CONNECTIONS", 10_u32)?;
    let db_min_connections = parse_num(&lookup, "OFFERWATCH_DB_MIN_CONNECTIONS", 1_u32)?;
    let db_acquire_timeout_secs = parse_num(&lookup, "OFFERWATCH_DB_ACQUIRE_TIMEOUT_SECS", 10_u64)?;

    let scrape = build_scrape_config(&lookup)?;

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        scrape,
    })
}

fn build_scrape_config<F>(lookup: &F) -> Result<ScrapeConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let us = parse_base_url(lookup, "OFFERWATCH_US_BASE_URL", DEFAULT_US_BASE_URL)?;
    let ca = parse_base_url(lookup, "OFFERWATCH_CA_BASE_URL", DEFAULT_CA_BASE_URL)?;

    let fetch_timeout_secs = parse_num(lookup, "OFFERWATCH_FETCH_TIMEOUT_SECS", 10_u64)?;
    if fetch_timeout_secs == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "OFFERWATCH_FETCH_TIMEOUT_SECS".to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    let max_redirects = parse_num(lookup, "OFFERWATCH_MAX_REDIRECTS", 10_usize)?;
    let user_agent =
        lookup("OFFERWATCH_USER_AGENT").unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string());
    let dry_run = parse_flag(lookup, "OFFERWATCH_DRY_RUN")?;
    let schedule = lookup("OFFERWATCH_SCRAPE_SCHEDULE")
        .unwrap_or_else(|_| DEFAULT_SCRAPE_SCHEDULE.to_string());

    Ok(ScrapeConfig {
        base_urls: BaseUrls { us, ca },
        fetch_timeout_secs,
        max_redirects,
        user_agent,
        dry_run,
        schedule,
    })
}

fn parse_num<F, T>(lookup: &F, var: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(var) {
        Ok(raw) => raw.trim().parse::<T>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}

fn parse_flag<F>(lookup: &F, var: &str) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let Ok(raw) = lookup(var) else {
        return Ok(false);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "" | "0" | "false" | "no" => Ok(false),
        other => Err(ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: format!("expected a boolean, got '{other}'"),
        }),
    }
}

fn parse_base_url<F>(lookup: &F, var: &str, default: &str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let raw = lookup(var).unwrap_or_else(|_| default.to_string());
    let trimmed = raw.trim();
    let invalid = |reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let url = Url::parse(trimmed)
        .map_err(|e| invalid(format!("'{trimmed}' is not a valid URL: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(invalid(format!("'{trimmed}' is not an absolute http(s) URL")));
    }
    Ok(trimmed.to_string())
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "OFFERWATCH_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
