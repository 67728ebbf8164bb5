//! Configuration module for the payroll scope backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;

use crate::errors::AppError;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Pre-shared key for API authentication (required in production)
    pub api_psk: Option<String>,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Base URL of the upstream HR API
    pub upstream_url: String,
    /// Bearer token sent to the upstream HR API
    pub upstream_token: Option<String>,
    /// Upstream request timeout in seconds
    pub upstream_timeout_secs: u64,
    /// Delay before a typed search term reaches the employee listing
    pub search_debounce_ms: u64,
    /// Employees per picker page
    pub picker_per_page: u32,
    /// Idle time after which an open wizard is discarded
    pub wizard_ttl_secs: u64,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        Ok(Self {
            api_psk: env::var("PAYROLL_API_PSK").ok(),
            bind_addr: parsed("PAYROLL_BIND_ADDR", "127.0.0.1:8080")?,
            log_level: env::var("PAYROLL_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            upstream_url: env::var("PAYROLL_UPSTREAM_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:9000/api".to_string()),
            upstream_token: env::var("PAYROLL_UPSTREAM_TOKEN").ok(),
            upstream_timeout_secs: parsed("PAYROLL_UPSTREAM_TIMEOUT_SECS", "15")?,
            search_debounce_ms: parsed("PAYROLL_SEARCH_DEBOUNCE_MS", "400")?,
            picker_per_page: parsed("PAYROLL_PICKER_PER_PAGE", "10")?,
            wizard_ttl_secs: parsed("PAYROLL_WIZARD_TTL_SECS", "3600")?,
        })
    }

    /// How long a picker fetch may stay in flight before it is re-issued:
    /// one upstream timeout plus a second of slack.
    pub fn picker_stall_ms(&self) -> u64 {
        self.upstream_timeout_secs
            .saturating_mul(1000)
            .saturating_add(1000)
    }

    pub fn wizard_ttl_ms(&self) -> u64 {
        self.wizard_ttl_secs.saturating_mul(1000)
    }
}

fn parsed<T>(name: &str, default: &str) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    raw.parse()
        .map_err(|e| AppError::Config(format!("Invalid {} '{}': {}", name, raw, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const VARS: &[&str] = &[
        "PAYROLL_API_PSK",
        "PAYROLL_BIND_ADDR",
        "PAYROLL_LOG_LEVEL",
        "PAYROLL_UPSTREAM_URL",
        "PAYROLL_UPSTREAM_TOKEN",
        "PAYROLL_UPSTREAM_TIMEOUT_SECS",
        "PAYROLL_SEARCH_DEBOUNCE_MS",
        "PAYROLL_PICKER_PER_PAGE",
        "PAYROLL_WIZARD_TTL_SECS",
    ];

    // Both cases share one test so they never race on the process environment.
    #[test]
    fn test_config_from_env() {
        for var in VARS {
            env::remove_var(var);
        }

        let config = Config::from_env().unwrap();
        assert!(config.api_psk.is_none());
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8080");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.upstream_url, "http://127.0.0.1:9000/api");
        assert_eq!(config.upstream_timeout_secs, 15);
        assert_eq!(config.search_debounce_ms, 400);
        assert_eq!(config.picker_per_page, 10);
        assert_eq!(config.wizard_ttl_ms(), 3_600_000);
        assert_eq!(config.picker_stall_ms(), 16_000);

        env::set_var("PAYROLL_SEARCH_DEBOUNCE_MS", "soon");
        let err = Config::from_env().unwrap_err();
        assert_eq!(err.error_code(), "CONFIG_ERROR");
        env::remove_var("PAYROLL_SEARCH_DEBOUNCE_MS");
    }
}
