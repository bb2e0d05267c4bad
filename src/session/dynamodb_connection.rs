use aws_sdk_dynamodb::types::{AttributeValue, DeleteRequest, ReturnValue, WriteRequest};
use chrono::Utc;
use log::{debug, trace, warn};
use rand::Rng;
use std::{
    collections::HashMap,
    thread,
    time::{Duration, Instant},
};

use crate::client::DynamoDbClient;

use super::{Error, Result, SessionConnection, SessionHandlerConfig, SessionItem};

const DATA_ATTR: &str = "data";
const EXPIRES_ATTR: &str = "expires";
const LOCK_ATTR: &str = "lock";

/// BatchWriteItem accepts at most 25 requests per call.
const BATCH_WRITE_SIZE: usize = 25;

type Item = HashMap<String, AttributeValue>;

/// DynamoDB implementation of the session connection.
///
/// Items are keyed by the configured hash key. They hold the session
/// `data`, an `expires` timestamp and, while a request holds the
/// session, a `lock` flag.
pub struct DynamoDbConnection {
    client: DynamoDbClient,
    config: SessionHandlerConfig,
}

impl DynamoDbConnection {
    pub fn new(client: DynamoDbClient, config: SessionHandlerConfig) -> Self {
        Self { client, config }
    }

    fn key(&self, id: &str) -> Item {
        HashMap::from([(
            self.config.hash_key.clone(),
            AttributeValue::S(id.to_owned()),
        )])
    }

    fn expiration_time(&self) -> i64 {
        Utc::now().timestamp() + self.config.session_lifetime.as_secs() as i64
    }

    fn get_item(&self, id: &str) -> Result<Option<SessionItem>> {
        let output = self
            .client
            .block_on(
                self.client
                    .inner()
                    .get_item()
                    .table_name(&self.config.table_name)
                    .set_key(Some(self.key(id)))
                    .consistent_read(self.config.consistent_read)
                    .send(),
            )
            .map_err(|err| Error::GetItemError(Box::new(err), id.to_owned()))?;

        Ok(output.item().map(session_item))
    }

    /// Sets the lock flag on the item, creating it if needed, then
    /// returns its attributes.
    fn lock_item(&self, id: &str) -> Result<Option<SessionItem>> {
        let (min, max) = (self.config.min_lock_retry, self.config.max_lock_retry);

        wait_for_lock(
            id,
            self.config.max_lock_wait_time,
            || lock_retry_pause(min, max),
            || {
                let res = self.client.block_on(
                    self.client
                        .inner()
                        .update_item()
                        .table_name(&self.config.table_name)
                        .set_key(Some(self.key(id)))
                        .update_expression("SET #lock = :lock")
                        .condition_expression("attribute_not_exists(#lock)")
                        .expression_attribute_names("#lock", LOCK_ATTR)
                        .expression_attribute_values(":lock", AttributeValue::Bool(true))
                        .return_values(ReturnValue::AllNew)
                        .send(),
                );

                match res {
                    Ok(output) => Ok(LockAttempt::Acquired(output.attributes().map(session_item))),
                    Err(err)
                        if err
                            .as_service_error()
                            .map_or(false, |err| err.is_conditional_check_failed_exception()) =>
                    {
                        Ok(LockAttempt::Locked)
                    }
                    Err(err) => Err(Error::UpdateItemError(Box::new(err), id.to_owned())),
                }
            },
        )
    }

    fn scan_expired_keys(&self) -> Result<Vec<Item>> {
        let now = Utc::now().timestamp();
        let mut keys = Vec::new();
        let mut start_key = None;

        loop {
            let output = self
                .client
                .block_on(
                    self.client
                        .inner()
                        .scan()
                        .table_name(&self.config.table_name)
                        .filter_expression("#expires < :now AND attribute_not_exists(#lock)")
                        .projection_expression("#key")
                        .expression_attribute_names("#key", &self.config.hash_key)
                        .expression_attribute_names("#expires", EXPIRES_ATTR)
                        .expression_attribute_names("#lock", LOCK_ATTR)
                        .expression_attribute_values(":now", AttributeValue::N(now.to_string()))
                        .consistent_read(self.config.consistent_read)
                        .set_exclusive_start_key(start_key)
                        .send(),
                )
                .map_err(|err| Error::ScanError(Box::new(err)))?;

            keys.extend(output.items().iter().cloned());

            match output.last_evaluated_key() {
                Some(key) if !key.is_empty() => start_key = Some(key.clone()),
                _ => break,
            }
        }

        Ok(keys)
    }
}

impl SessionConnection for DynamoDbConnection {
    fn read(&self, id: &str) -> Result<Option<SessionItem>> {
        trace!(">> read session item {}", id);

        let item = if self.config.locking {
            self.lock_item(id)?
        } else {
            self.get_item(id)?
        };

        trace!("<< read session item {}", id);
        Ok(item)
    }

    fn write(&self, id: &str, data: &str, is_changed: bool) -> Result<()> {
        trace!(">> write session item {}", id);

        let expires = self.expiration_time();
        let update = WriteUpdate::new(expires, self.config.locking, is_changed, data);
        debug!("update session item {}: {}", id, update.expression);

        self.client
            .block_on(
                self.client
                    .inner()
                    .update_item()
                    .table_name(&self.config.table_name)
                    .set_key(Some(self.key(id)))
                    .update_expression(update.expression)
                    .set_expression_attribute_names(Some(update.names))
                    .set_expression_attribute_values(Some(update.values))
                    .send(),
            )
            .map_err(|err| Error::UpdateItemError(Box::new(err), id.to_owned()))?;

        trace!("<< write session item {}", id);
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<()> {
        self.client
            .block_on(
                self.client
                    .inner()
                    .delete_item()
                    .table_name(&self.config.table_name)
                    .set_key(Some(self.key(id)))
                    .send(),
            )
            .map_err(|err| Error::DeleteItemError(Box::new(err), id.to_owned()))?;
        debug!("session item {} deleted", id);
        Ok(())
    }

    fn delete_expired(&self) -> Result<usize> {
        trace!(">> delete expired session items");

        let keys = self.scan_expired_keys()?;
        let mut deleted = 0;

        for chunk in keys.chunks(BATCH_WRITE_SIZE) {
            let reqs = chunk
                .iter()
                .map(|key| {
                    let delete = DeleteRequest::builder()
                        .set_key(Some(key.clone()))
                        .build()
                        .map_err(|err| Error::BuildRequestError(Box::new(err)))?;
                    Ok(WriteRequest::builder().delete_request(delete).build())
                })
                .collect::<Result<Vec<_>>>()?;

            let output = self
                .client
                .block_on(
                    self.client
                        .inner()
                        .batch_write_item()
                        .request_items(&self.config.table_name, reqs)
                        .send(),
                )
                .map_err(|err| Error::BatchWriteItemError(Box::new(err)))?;

            let unprocessed = output
                .unprocessed_items()
                .and_then(|items| items.get(&self.config.table_name))
                .map_or(0, Vec::len);
            if unprocessed > 0 {
                warn!("{} expired session item(s) left for a next run", unprocessed);
            }
            deleted += chunk.len().saturating_sub(unprocessed);
        }

        trace!("<< delete expired session items");
        Ok(deleted)
    }
}

/// Outcome of a single lock attempt.
enum LockAttempt<T> {
    Acquired(T),
    Locked,
}

/// Repeats the attempt with a pause in between while another request
/// holds the lock, until the maximum wait time is reached.
fn wait_for_lock<T>(
    id: &str,
    max_wait: Duration,
    mut pause: impl FnMut() -> Duration,
    mut attempt: impl FnMut() -> Result<LockAttempt<T>>,
) -> Result<T> {
    let deadline = Instant::now() + max_wait;

    loop {
        match attempt()? {
            LockAttempt::Acquired(item) => {
                debug!("lock acquired on session item {}", id);
                return Ok(item);
            }
            LockAttempt::Locked if Instant::now() >= deadline => {
                warn!("cannot lock session item {}: wait time exceeded", id);
                return Err(Error::LockTimeoutError(id.to_owned(), max_wait));
            }
            LockAttempt::Locked => {
                trace!("session item {} is locked, retrying", id);
                thread::sleep(pause());
            }
        }
    }
}

/// Picks a random pause between both bounds, whatever their order.
fn lock_retry_pause(min: Duration, max: Duration) -> Duration {
    let a = min.as_micros() as u64;
    let b = max.as_micros() as u64;
    Duration::from_micros(rand::thread_rng().gen_range(a.min(b)..=a.max(b)))
}

/// Update expression written back at the end of a request.
///
/// The expiration time is always refreshed. The data is only set
/// when it changed, and removed when it changed to empty. The lock
/// is released when locking is enabled.
#[derive(Debug, Clone, PartialEq)]
struct WriteUpdate {
    expression: String,
    names: HashMap<String, String>,
    values: Item,
}

impl WriteUpdate {
    fn new(expires: i64, locking: bool, is_changed: bool, data: &str) -> Self {
        let mut set = vec!["#expires = :expires"];
        let mut remove = Vec::new();
        let mut names = HashMap::from([("#expires".to_owned(), EXPIRES_ATTR.to_owned())]);
        let mut values = HashMap::from([(
            ":expires".to_owned(),
            AttributeValue::N(expires.to_string()),
        )]);

        if locking {
            remove.push("#lock");
            names.insert("#lock".to_owned(), LOCK_ATTR.to_owned());
        }

        if is_changed {
            names.insert("#data".to_owned(), DATA_ATTR.to_owned());
            if data.is_empty() {
                remove.push("#data");
            } else {
                set.push("#data = :data");
                values.insert(":data".to_owned(), AttributeValue::S(data.to_owned()));
            }
        }

        let mut expression = format!("SET {}", set.join(", "));
        if !remove.is_empty() {
            expression.push_str(&format!(" REMOVE {}", remove.join(", ")));
        }

        Self {
            expression,
            names,
            values,
        }
    }
}

fn session_item(attrs: &Item) -> SessionItem {
    SessionItem {
        data: attrs
            .get(DATA_ATTR)
            .and_then(|data| data.as_s().ok())
            .cloned(),
        expires: attrs
            .get(EXPIRES_ATTR)
            .and_then(|expires| expires.as_n().ok())
            .and_then(|expires| expires.parse().ok()),
    }
}
