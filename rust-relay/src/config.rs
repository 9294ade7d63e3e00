//! Configuration module for environment variable parsing.
//!
//! Reads all configuration from environment variables. A `.env` file in the
//! working directory is honoured when the process was not started with an
//! injected environment.

use std::env;
use std::time::Duration;

use tracing::{info, warn};
use url::Url;

use crate::error::ConfigError;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// URL every queued submission is forwarded to
    pub destination_url: String,

    /// Seconds between drain scheduler ticks
    pub queue_check_period_secs: u64,

    /// Consecutive failed attempts tolerated before a drain pass pauses
    pub max_errors_count: u32,

    /// Per-attempt delivery timeout in milliseconds
    pub request_timeout_ms: u64,

    /// Non-2xx statuses the destination is known to send on success
    pub extra_success_statuses: Vec<u16>,

    /// Optional upper bound on queued entries
    pub queue_capacity: Option<usize>,

    /// Port for the web server to listen on
    pub port: u16,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Config {
            destination_url: env::var("RELAY_DESTINATION_URL").unwrap_or_default(),

            queue_check_period_secs: parse_var("RELAY_QUEUE_CHECK_PERIOD_SECS", 5),

            max_errors_count: parse_var("RELAY_MAX_ERRORS_COUNT", 3),

            request_timeout_ms: parse_var("RELAY_REQUEST_TIMEOUT_MS", 10_000),

            extra_success_statuses: parse_csv("RELAY_EXTRA_SUCCESS_STATUSES")
                .unwrap_or_default()
                .iter()
                .filter_map(|s| match s.parse() {
                    Ok(status) => Some(status),
                    Err(_) => {
                        warn!(value = %s, "Invalid extra success status, ignoring");
                        None
                    }
                })
                .collect(),

            queue_capacity: parse_optional_var("RELAY_QUEUE_CAPACITY"),

            port: parse_var("PORT", 8080),
        }
    }

    /// Load `.env` into the process environment unless `PORT` is already set.
    ///
    /// Containers receive their environment directly; local runs read the
    /// file. A missing file is not an error.
    pub fn load_dotenv() {
        if env::var("PORT").is_ok() {
            return;
        }
        match dotenvy::dotenv() {
            Ok(path) => info!(path = %path.display(), "dotenv_loaded"),
            Err(e) if e.not_found() => {}
            Err(e) => warn!(error = %e, "dotenv_load_failed"),
        }
    }

    /// Check the values the relay core depends on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.destination_url.trim().is_empty() {
            return Err(ConfigError::MissingDestination);
        }

        let url = Url::parse(&self.destination_url).map_err(|e| {
            ConfigError::InvalidDestination {
                url: self.destination_url.clone(),
                reason: e.to_string(),
            }
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidDestination {
                url: self.destination_url.clone(),
                reason: format!("unsupported scheme {}", url.scheme()),
            });
        }

        if self.queue_check_period_secs == 0 {
            return Err(ConfigError::NotPositive("RELAY_QUEUE_CHECK_PERIOD_SECS"));
        }
        if self.max_errors_count == 0 {
            return Err(ConfigError::NotPositive("RELAY_MAX_ERRORS_COUNT"));
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::NotPositive("RELAY_REQUEST_TIMEOUT_MS"));
        }
        if self.queue_capacity == Some(0) {
            return Err(ConfigError::NotPositive("RELAY_QUEUE_CAPACITY"));
        }

        if let Some(&bad) = self
            .extra_success_statuses
            .iter()
            .find(|s| !(100..=599).contains(*s))
        {
            return Err(ConfigError::InvalidStatus(bad));
        }

        Ok(())
    }

    /// Interval between drain scheduler ticks.
    pub fn drain_period(&self) -> Duration {
        Duration::from_secs(self.queue_check_period_secs)
    }

    /// Timeout applied to every delivery attempt.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Parse a variable, falling back to `default` when unset or unparsable.
fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => match raw.trim().parse() {
            Ok(v) => v,
            Err(_) => {
                warn!(env_var = name, value = %raw, "Invalid value, using default");
                default
            }
        },
        Err(_) => default,
    }
}

/// Parse an optional environment variable; unset or invalid yields `None`.
fn parse_optional_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(env_var = name, value = %raw, "Invalid value, leaving unset");
            None
        }
    }
}

/// Parse a comma-separated list of strings.
fn parse_csv(name: &str) -> Option<Vec<String>> {
    env::var(name).ok().map(|raw| {
        raw.split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        Config {
            destination_url: "http://localhost:9000/facts".to_string(),
            queue_check_period_secs: 5,
            max_errors_count: 3,
            request_timeout_ms: 1000,
            extra_success_statuses: vec![],
            queue_capacity: None,
            port: 8080,
        }
    }

    #[test]
    fn test_parse_var_valid() {
        env::set_var("TEST_RELAY_PERIOD", " 42 ");
        let result: u64 = parse_var("TEST_RELAY_PERIOD", 1);
        assert_eq!(result, 42);
        env::remove_var("TEST_RELAY_PERIOD");
    }

    #[test]
    fn test_parse_var_invalid_uses_default() {
        env::set_var("TEST_RELAY_BUDGET", "many");
        let result: u32 = parse_var("TEST_RELAY_BUDGET", 3);
        assert_eq!(result, 3);
        env::remove_var("TEST_RELAY_BUDGET");
    }

    #[test]
    fn test_parse_var_default() {
        let result: u16 = parse_var("NONEXISTENT_RELAY_VAR", 8080);
        assert_eq!(result, 8080);
    }

    #[test]
    fn test_parse_optional_var() {
        env::set_var("TEST_RELAY_CAPACITY", " 100 ");
        assert_eq!(parse_optional_var::<usize>("TEST_RELAY_CAPACITY"), Some(100));

        env::set_var("TEST_RELAY_CAPACITY", "lots");
        assert_eq!(parse_optional_var::<usize>("TEST_RELAY_CAPACITY"), None);

        env::remove_var("TEST_RELAY_CAPACITY");
        assert_eq!(parse_optional_var::<usize>("TEST_RELAY_CAPACITY"), None);
    }

    #[test]
    fn test_parse_csv() {
        env::set_var("TEST_RELAY_CSV", "500, 502,,");
        let result = parse_csv("TEST_RELAY_CSV");
        assert_eq!(result, Some(vec!["500".to_string(), "502".to_string()]));
        env::remove_var("TEST_RELAY_CSV");
    }

    #[test]
    fn test_period_and_budget_are_independent() {
        let config = Config {
            queue_check_period_secs: 30,
            max_errors_count: 2,
            ..valid_config()
        };
        assert_eq!(config.drain_period(), Duration::from_secs(30));
        assert_eq!(config.max_errors_count, 2);
    }

    #[test]
    fn test_validate_accepts_valid_config() {
        assert_eq!(valid_config().validate(), Ok(()));
    }

    #[test]
    fn test_validate_rejects_missing_destination() {
        let config = Config {
            destination_url: "  ".to_string(),
            ..valid_config()
        };
        assert_eq!(config.validate(), Err(ConfigError::MissingDestination));
    }

    #[test]
    fn test_validate_rejects_bad_destination() {
        let config = Config {
            destination_url: "ftp://example.com/facts".to_string(),
            ..valid_config()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidDestination { .. })
        ));

        let config = Config {
            destination_url: "not a url".to_string(),
            ..valid_config()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidDestination { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        let config = Config {
            queue_check_period_secs: 0,
            ..valid_config()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::NotPositive("RELAY_QUEUE_CHECK_PERIOD_SECS"))
        );

        let config = Config {
            max_errors_count: 0,
            ..valid_config()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::NotPositive("RELAY_MAX_ERRORS_COUNT"))
        );

        let config = Config {
            queue_capacity: Some(0),
            ..valid_config()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::NotPositive("RELAY_QUEUE_CAPACITY"))
        );
    }

    #[test]
    fn test_validate_rejects_out_of_range_status() {
        let config = Config {
            extra_success_statuses: vec![500, 700],
            ..valid_config()
        };
        assert_eq!(config.validate(), Err(ConfigError::InvalidStatus(700)));
    }
}
