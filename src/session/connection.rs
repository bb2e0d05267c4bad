use std::time::Duration;

use crate::config::{
    SessionConfig, DEFAULT_MAX_LOCK_RETRY_MICROTIME, DEFAULT_MAX_LOCK_WAIT_TIME,
    DEFAULT_MIN_LOCK_RETRY_MICROTIME, DEFAULT_SESSION_HASH_KEY, DEFAULT_SESSION_LIFETIME,
};

use super::Result;

/// Session item as stored in the table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionItem {
    pub data: Option<String>,
    /// Expiration time, as a UNIX timestamp in seconds.
    pub expires: Option<i64>,
}

/// Storage operations needed by the session handler. Ids given to
/// the connection are already prefixed by the session name.
pub trait SessionConnection {
    /// Reads the item, locking it first when the connection is
    /// configured to.
    fn read(&self, id: &str) -> Result<Option<SessionItem>>;

    /// Refreshes the item expiration time and releases its lock. The
    /// data is only stored when `is_changed` is set, and an empty
    /// data removes the stored one.
    fn write(&self, id: &str, data: &str, is_changed: bool) -> Result<()>;

    fn delete(&self, id: &str) -> Result<()>;

    /// Deletes every expired and unlocked item, returning how many
    /// were deleted.
    fn delete_expired(&self) -> Result<usize>;
}

/// Settings of a session handler, as given to
/// `DynamoDbClient::register_session_handler`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionHandlerConfig {
    pub table_name: String,
    pub locking: bool,
    pub hash_key: String,
    pub session_lifetime: Duration,
    pub consistent_read: bool,
    pub max_lock_wait_time: Duration,
    pub min_lock_retry: Duration,
    pub max_lock_retry: Duration,
}

impl SessionHandlerConfig {
    pub fn new<T: Into<String>>(table_name: T) -> Self {
        Self {
            table_name: table_name.into(),
            locking: false,
            hash_key: DEFAULT_SESSION_HASH_KEY.to_owned(),
            session_lifetime: Duration::from_secs(DEFAULT_SESSION_LIFETIME),
            consistent_read: true,
            max_lock_wait_time: Duration::from_secs(DEFAULT_MAX_LOCK_WAIT_TIME),
            min_lock_retry: Duration::from_micros(DEFAULT_MIN_LOCK_RETRY_MICROTIME),
            max_lock_retry: Duration::from_micros(DEFAULT_MAX_LOCK_RETRY_MICROTIME),
        }
    }

    pub fn from_session_config<T: Into<String>>(table_name: T, config: &SessionConfig) -> Self {
        let (min_lock_retry, max_lock_retry) = config.lock_retry_range();
        Self {
            table_name: table_name.into(),
            locking: false,
            hash_key: config.hash_key().to_owned(),
            session_lifetime: config.session_lifetime(),
            consistent_read: config.consistent_read(),
            max_lock_wait_time: config.max_lock_wait_time(),
            min_lock_retry,
            max_lock_retry,
        }
    }

    pub fn with_locking(mut self, locking: bool) -> Self {
        self.locking = locking;
        self
    }
}
