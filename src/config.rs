//! Provider configuration.
//!
//! Values come from the environment:
//!
//! | Variable                    | Default                  |
//! |-----------------------------|--------------------------|
//! | `GITHUB_TOKEN`              | required                 |
//! | `GITHUB_OWNER`              | required                 |
//! | `GITHUB_BASE_URL`           | `https://api.github.com` |
//! | `GITHUB_TEAM_API_RETRY`     | 10                       |
//! | `GITHUB_TEAM_API_WAIT_SECS` | 5                        |

use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::github::RetryConfig;

pub const DEFAULT_BASE_URL: &str = "https://api.github.com";

pub const ENV_TOKEN: &str = "GITHUB_TOKEN";
pub const ENV_OWNER: &str = "GITHUB_OWNER";
pub const ENV_BASE_URL: &str = "GITHUB_BASE_URL";
pub const ENV_RETRIES: &str = "GITHUB_TEAM_API_RETRY";
pub const ENV_WAIT_SECS: &str = "GITHUB_TEAM_API_WAIT_SECS";

/// Errors loading configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),

    #[error("invalid value {value:?} for {name}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Settings shared by every team managed in one run.
#[derive(Clone, PartialEq)]
pub struct ProviderConfig {
    pub token: String,
    /// Organization owning the teams.
    pub owner: String,
    pub base_url: String,
    pub retry: RetryConfig,
}

impl ProviderConfig {
    pub fn new(token: impl Into<String>, owner: impl Into<String>) -> Self {
        ProviderConfig {
            token: token.into(),
            owner: owner.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            retry: RetryConfig::DEFAULT,
        }
    }

    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads configuration from an arbitrary variable source.
    ///
    /// Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|v| !v.is_empty());

        let token = get(ENV_TOKEN).ok_or(ConfigError::Missing(ENV_TOKEN))?;
        let owner = get(ENV_OWNER).ok_or(ConfigError::Missing(ENV_OWNER))?;
        let mut config = ProviderConfig::new(token, owner);

        if let Some(base_url) = get(ENV_BASE_URL) {
            config.base_url = base_url;
        }
        if let Some(value) = get(ENV_RETRIES) {
            config.retry.max_retries = parse_number(ENV_RETRIES, &value)? as u32;
        }
        if let Some(value) = get(ENV_WAIT_SECS) {
            config = config.with_wait(Duration::from_secs(parse_number(ENV_WAIT_SECS, &value)?));
        }

        Ok(config)
    }

    /// Sets the number of retries after the first attempt.
    pub fn with_retries(mut self, max_retries: u32) -> Self {
        self.retry.max_retries = max_retries;
        self
    }

    /// Sets the fixed wait between attempts.
    pub fn with_wait(mut self, wait: Duration) -> Self {
        self.retry.initial_delay = wait;
        self.retry.max_delay = wait;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn retry_config(&self) -> RetryConfig {
        self.retry
    }
}

fn parse_number(name: &'static str, value: &str) -> Result<u64, ConfigError> {
    let n = value.trim().parse::<u64>().map_err(|e| ConfigError::Invalid {
        name,
        value: value.to_string(),
        reason: e.to_string(),
    })?;
    if name == ENV_RETRIES && n > u64::from(u32::MAX) {
        return Err(ConfigError::Invalid {
            name,
            value: value.to_string(),
            reason: "too large".to_string(),
        });
    }
    Ok(n)
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("token", &"<redacted>")
            .field("owner", &self.owner)
            .field("base_url", &self.base_url)
            .field("retry", &self.retry)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn defaults_apply() {
        let config =
            ProviderConfig::from_lookup(lookup(&[(ENV_TOKEN, "t"), (ENV_OWNER, "acme")])).unwrap();
        assert_eq!(config.owner, "acme");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.retry_config(), RetryConfig::DEFAULT);
        assert_eq!(config.retry.max_attempts(), 11);
    }

    #[test]
    fn retry_settings_are_read() {
        let config = ProviderConfig::from_lookup(lookup(&[
            (ENV_TOKEN, "t"),
            (ENV_OWNER, "acme"),
            (ENV_RETRIES, "3"),
            (ENV_WAIT_SECS, "1"),
            (ENV_BASE_URL, "https://ghe.example.com/api/v3"),
        ]))
        .unwrap();
        assert_eq!(config.retry, RetryConfig::fixed(3, Duration::from_secs(1)));
        assert_eq!(config.base_url, "https://ghe.example.com/api/v3");
    }

    #[test]
    fn missing_token_is_an_error() {
        let err = ProviderConfig::from_lookup(lookup(&[(ENV_OWNER, "acme"), (ENV_TOKEN, "")]))
            .unwrap_err();
        assert_eq!(err, ConfigError::Missing(ENV_TOKEN));
    }

    #[test]
    fn non_numeric_retry_is_an_error() {
        let err = ProviderConfig::from_lookup(lookup(&[
            (ENV_TOKEN, "t"),
            (ENV_OWNER, "acme"),
            (ENV_RETRIES, "lots"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: ENV_RETRIES, .. }));
    }

    #[test]
    fn largest_retry_count_is_usable() {
        let config = ProviderConfig::from_lookup(lookup(&[
            (ENV_TOKEN, "t"),
            (ENV_OWNER, "acme"),
            (ENV_RETRIES, "4294967295"),
        ]))
        .unwrap();
        assert_eq!(config.retry.max_retries, u32::MAX);
        assert_eq!(config.retry.max_attempts(), u32::MAX);
    }

    #[test]
    fn debug_redacts_token() {
        let config = ProviderConfig::new("ghp_secret", "acme");
        let debug = format!("{:?}", config);
        assert!(!debug.contains("ghp_secret"));
        assert!(debug.contains("acme"));
    }
}
