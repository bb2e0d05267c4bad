//! Config entities module.
//!
//! This module contains the sections of the configuration file and
//! the accessors resolving their defaults.

use serde::{Deserialize, Serialize};
use std::{io, path::PathBuf, time::Duration};
use thiserror::Error;

pub const DEFAULT_SESSION_NAME: &str = "session";
pub const DEFAULT_SESSION_HASH_KEY: &str = "id";
pub const DEFAULT_SESSION_LIFETIME: u64 = 1440;
pub const DEFAULT_MAX_LOCK_WAIT_TIME: u64 = 10;
pub const DEFAULT_MIN_LOCK_RETRY_MICROTIME: u64 = 10_000;
pub const DEFAULT_MAX_LOCK_RETRY_MICROTIME: u64 = 50_000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {1}")]
    ReadConfigFile(#[source] io::Error, PathBuf),
    #[error("cannot parse config file {1}")]
    ParseConfigFile(#[source] toml::de::Error, PathBuf),
    #[error("cannot find config file")]
    FindConfigFile,

    #[error("DynamoDB session handler \"table_name\" is not configured")]
    MissingSessionTableName,
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Represents the configuration file.
#[derive(Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    /// Represents the process-wide AWS settings, shared by every
    /// client built by the client factory.
    #[serde(default)]
    pub aws: AwsConfig,
    /// Represents the DynamoDB session handler settings.
    pub session: Option<SessionConfig>,
    /// Represents the SES transport settings. They override the
    /// process-wide AWS settings for the email client only.
    pub email: Option<AwsConfig>,
}

impl Config {
    /// Returns the table name of the session handler.
    ///
    /// Fails when the session section or its table name is missing
    /// or empty.
    pub fn session_table_name(&self) -> Result<&str> {
        self.session
            .as_ref()
            .and_then(|session| session.table_name.as_deref())
            .filter(|table_name| !table_name.trim().is_empty())
            .ok_or(ConfigError::MissingSessionTableName)
    }

    /// Returns the AWS settings of the email transport, merged over
    /// the process-wide ones.
    pub fn email_aws_config(&self) -> AwsConfig {
        match self.email.as_ref() {
            Some(email) => self.aws.merge(email),
            None => self.aws.clone(),
        }
    }
}

/// Represents the AWS settings used to build service clients.
///
/// Every field is optional: missing ones are resolved by the SDK
/// default provider chains (environment, profile, instance role).
#[derive(Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct AwsConfig {
    pub region: Option<String>,
    /// Represents the API version. Only `latest` is meaningful to
    /// the Rust SDK, other values are kept for compatibility.
    pub version: Option<String>,
    pub key: Option<String>,
    pub secret: Option<String>,
}

impl AwsConfig {
    /// Returns a copy of self where every field set in `overrides`
    /// replaces the current one.
    pub fn merge(&self, overrides: &AwsConfig) -> AwsConfig {
        AwsConfig {
            region: overrides.region.clone().or_else(|| self.region.clone()),
            version: overrides.version.clone().or_else(|| self.version.clone()),
            key: overrides.key.clone().or_else(|| self.key.clone()),
            secret: overrides.secret.clone().or_else(|| self.secret.clone()),
        }
    }

    /// Returns the non-empty region, if any.
    pub fn region(&self) -> Option<&str> {
        self.region.as_deref().filter(|region| !region.is_empty())
    }

    /// Returns the static key and secret, only when both are set and
    /// non-empty.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        let key = self.key.as_deref().filter(|key| !key.is_empty())?;
        let secret = self.secret.as_deref().filter(|secret| !secret.is_empty())?;
        Some((key, secret))
    }
}

/// Represents the DynamoDB session handler settings.
#[derive(Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct SessionConfig {
    pub table_name: Option<String>,
    /// Represents the session name, used as prefix of the item ids.
    pub name: Option<String>,
    pub hash_key: Option<String>,
    /// Represents the session lifetime, in seconds.
    pub session_lifetime: Option<u64>,
    pub consistent_read: Option<bool>,
    /// Represents the maximum time spent waiting for a lock, in
    /// seconds.
    pub max_lock_wait_time: Option<u64>,
    pub min_lock_retry_microtime: Option<u64>,
    pub max_lock_retry_microtime: Option<u64>,
}

impl SessionConfig {
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or(DEFAULT_SESSION_NAME)
    }

    pub fn hash_key(&self) -> &str {
        self.hash_key.as_deref().unwrap_or(DEFAULT_SESSION_HASH_KEY)
    }

    pub fn session_lifetime(&self) -> Duration {
        Duration::from_secs(self.session_lifetime.unwrap_or(DEFAULT_SESSION_LIFETIME))
    }

    pub fn consistent_read(&self) -> bool {
        self.consistent_read.unwrap_or(true)
    }

    pub fn max_lock_wait_time(&self) -> Duration {
        Duration::from_secs(self.max_lock_wait_time.unwrap_or(DEFAULT_MAX_LOCK_WAIT_TIME))
    }

    /// Returns the bounds of the random pause between two lock
    /// attempts. The bounds are swapped if misconfigured.
    pub fn lock_retry_range(&self) -> (Duration, Duration) {
        let min = self
            .min_lock_retry_microtime
            .unwrap_or(DEFAULT_MIN_LOCK_RETRY_MICROTIME);
        let max = self
            .max_lock_retry_microtime
            .unwrap_or(DEFAULT_MAX_LOCK_RETRY_MICROTIME);
        (
            Duration::from_micros(min.min(max)),
            Duration::from_micros(min.max(max)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_prefers_overrides() {
        let aws = AwsConfig {
            region: Some("eu-west-1".into()),
            version: Some("latest".into()),
            key: Some("key".into()),
            secret: Some("secret".into()),
        };
        let email = AwsConfig {
            region: Some("us-east-1".into()),
            ..AwsConfig::default()
        };

        let merged = aws.merge(&email);
        assert_eq!(Some("us-east-1"), merged.region());
        assert_eq!(Some("latest"), merged.version.as_deref());
        assert_eq!(Some(("key", "secret")), merged.credentials());
    }

    #[test]
    fn credentials_need_key_and_secret() {
        let config = AwsConfig {
            key: Some("key".into()),
            ..AwsConfig::default()
        };
        assert_eq!(None, config.credentials());

        let config = AwsConfig {
            key: Some("key".into()),
            secret: Some("".into()),
            ..AwsConfig::default()
        };
        assert_eq!(None, config.credentials());
    }

    #[test]
    fn session_table_name_is_required() {
        let config = Config::default();
        assert!(matches!(
            config.session_table_name(),
            Err(ConfigError::MissingSessionTableName)
        ));

        let config = Config {
            session: Some(SessionConfig {
                table_name: Some("  ".into()),
                ..SessionConfig::default()
            }),
            ..Config::default()
        };
        assert!(matches!(
            config.session_table_name(),
            Err(ConfigError::MissingSessionTableName)
        ));

        let config = Config {
            session: Some(SessionConfig {
                table_name: Some("sessions".into()),
                ..SessionConfig::default()
            }),
            ..Config::default()
        };
        assert_eq!("sessions", config.session_table_name().unwrap());
    }

    #[test]
    fn session_defaults() {
        let config = SessionConfig {
            min_lock_retry_microtime: Some(90_000),
            ..SessionConfig::default()
        };

        assert_eq!("session", config.name());
        assert_eq!("id", config.hash_key());
        assert_eq!(Duration::from_secs(1440), config.session_lifetime());
        assert!(config.consistent_read());
        assert_eq!(Duration::from_secs(10), config.max_lock_wait_time());
        assert_eq!(
            (Duration::from_micros(50_000), Duration::from_micros(90_000)),
            config.lock_retry_range()
        );
    }
}
