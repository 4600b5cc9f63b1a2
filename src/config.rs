use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use crate::error::AppError;

const DEFAULT_API_BASE_URL: &str = "http://localhost:8080";
const DEFAULT_DATABASE_URL: &str = "sqlite://nihongo-admin.db?mode=rwc";
const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:3000";

const TRUTHY_VALUES: [&str; 4] = ["1", "true", "yes", "on"];

#[derive(Clone, Debug)]
pub struct ConsoleConfig {
    pub api_base_url: String,
    pub bypass_admin_auth: bool,
    pub database_url: String,
    pub listen_addr: SocketAddr,
    pub cache_stale_time: Duration,
    pub cache_gc_time: Duration,
    pub cache_sweep_interval: Duration,
}

impl ConsoleConfig {
    pub fn new_from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let api_base_url = lookup("API_BASE_URL")
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let bypass_admin_auth = read_bool(lookup("BYPASS_ADMIN_AUTH").as_deref());

        let database_url =
            lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

        let listen_addr = lookup("LISTEN_ADDR")
            .unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string());
        let listen_addr = listen_addr
            .parse::<SocketAddr>()
            .map_err(|e| AppError::Config(format!("Invalid LISTEN_ADDR '{}': {}", listen_addr, e)))?;

        Ok(Self {
            api_base_url,
            bypass_admin_auth,
            database_url,
            listen_addr,
            cache_stale_time: read_secs(&lookup, "CACHE_STALE_SECS", 5 * 60)?,
            cache_gc_time: read_secs(&lookup, "CACHE_GC_SECS", 30 * 60)?,
            cache_sweep_interval: read_interval(&lookup, "CACHE_SWEEP_SECS", 60)?,
        })
    }
}

pub fn read_bool(value: Option<&str>) -> bool {
    match value {
        Some(v) => TRUTHY_VALUES.contains(&v.trim().to_lowercase().as_str()),
        None => false,
    }
}

fn read_secs(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: u64,
) -> Result<Duration, AppError> {
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|e| AppError::Config(format!("Invalid {} '{}': {}", key, raw, e))),
        None => Ok(Duration::from_secs(default)),
    }
}

/// Like `read_secs`, but zero is rejected: a loop sleeping for nothing spins.
fn read_interval(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: u64,
) -> Result<Duration, AppError> {
    let interval = read_secs(lookup, key, default)?;
    if interval.is_zero() {
        return Err(AppError::Config(format!("{} must be at least 1 second", key)));
    }
    Ok(interval)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = ConsoleConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.api_base_url, "http://localhost:8080");
        assert!(!config.bypass_admin_auth);
        assert_eq!(config.listen_addr, "127.0.0.1:3000".parse().unwrap());
        assert_eq!(config.cache_stale_time, Duration::from_secs(300));
        assert_eq!(config.cache_gc_time, Duration::from_secs(1800));
    }

    #[test]
    fn base_url_loses_trailing_slash() {
        let config =
            ConsoleConfig::from_lookup(lookup_from(&[("API_BASE_URL", "https://lms.test/")])).unwrap();
        assert_eq!(config.api_base_url, "https://lms.test");
    }

    #[test]
    fn truthy_values_enable_bypass() {
        for value in ["1", "true", "YES", "On"] {
            assert!(read_bool(Some(value)), "{} should be truthy", value);
        }
        for value in ["0", "false", "no", ""] {
            assert!(!read_bool(Some(value)), "{} should be falsy", value);
        }
        assert!(!read_bool(None));
    }

    #[test]
    fn invalid_numbers_are_rejected() {
        let result = ConsoleConfig::from_lookup(lookup_from(&[("CACHE_GC_SECS", "soon")]));
        assert!(matches!(result, Err(AppError::Config(_))));

        let result = ConsoleConfig::from_lookup(lookup_from(&[("LISTEN_ADDR", "nowhere")]));
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn zero_sweep_interval_is_rejected() {
        let result = ConsoleConfig::from_lookup(lookup_from(&[("CACHE_SWEEP_SECS", "0")]));
        assert!(matches!(result, Err(AppError::Config(_))));

        // a zero stale time just means "always refetch"
        let config = ConsoleConfig::from_lookup(lookup_from(&[("CACHE_STALE_SECS", "0")])).unwrap();
        assert!(config.cache_stale_time.is_zero());
    }
}
