//! Runner configuration.

use std::{env, time::Duration};

use url::Url;

use crate::{
    constants::{
        DEFAULT_JUDGE_URL, DEFAULT_MAX_ATTEMPTS, DEFAULT_POLL_INTERVAL, DEFAULT_REQUEST_TIMEOUT,
    },
    core::domain::LanguageTable,
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {msg}")]
    InvalidValue { key: String, msg: String },
}

/// Everything the runner needs, passed in explicitly. Nothing below the
/// binary reads the environment.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Base URL of the judge, e.g. `http://localhost:3000`
    pub judge_url: Url,
    /// Pause before every poll
    pub poll_interval: Duration,
    /// Polls per job before it is reported as timed out
    pub max_attempts: u32,
    /// Per-request HTTP timeout
    pub request_timeout: Duration,
    pub languages: LanguageTable,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            judge_url: Url::parse(DEFAULT_JUDGE_URL).expect("default judge url is valid"),
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            languages: LanguageTable::default(),
        }
    }
}

impl RunnerConfig {
    /// Load configuration from environment variables, falling back to the
    /// defaults for anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let judge_url = match env::var("JUDGE_URL") {
            Ok(raw) => Url::parse(&raw).map_err(|e| ConfigError::InvalidValue {
                key: "JUDGE_URL".to_string(),
                msg: e.to_string(),
            })?,
            Err(_) => defaults.judge_url,
        };

        let config = Self {
            judge_url,
            poll_interval: env_parsed("POLL_INTERVAL_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.poll_interval),
            max_attempts: env_parsed("MAX_POLL_ATTEMPTS")?.unwrap_or(defaults.max_attempts),
            request_timeout: env_parsed("REQUEST_TIMEOUT_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.request_timeout),
            languages: defaults.languages,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !matches!(self.judge_url.scheme(), "http" | "https") {
            return Err(invalid("JUDGE_URL", "scheme must be http or https"));
        }
        if self.poll_interval.is_zero() {
            return Err(invalid("POLL_INTERVAL_MS", "must be greater than zero"));
        }
        if self.max_attempts == 0 {
            return Err(invalid("MAX_POLL_ATTEMPTS", "must be greater than zero"));
        }
        Ok(())
    }
}

fn invalid(key: &str, msg: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        msg: msg.to_string(),
    }
}

fn env_parsed<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().map(Some).map_err(|e: T::Err| ConfigError::InvalidValue {
            key: key.to_string(),
            msg: e.to_string(),
        }),
        Err(_) => Ok(None),
    }
}
