use std::{error, result, time::Duration};
use thiserror::Error;

pub type BoxError = Box<dyn error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("cannot get session item {1}")]
    GetItemError(#[source] BoxError, String),
    #[error("cannot update session item {1}")]
    UpdateItemError(#[source] BoxError, String),
    #[error("cannot delete session item {1}")]
    DeleteItemError(#[source] BoxError, String),
    #[error("cannot scan expired session items")]
    ScanError(#[source] BoxError),
    #[error("cannot delete expired session items")]
    BatchWriteItemError(#[source] BoxError),
    #[error("cannot build DynamoDB request")]
    BuildRequestError(#[source] BoxError),

    #[error("cannot acquire lock on session item {0} within {1:?}")]
    LockTimeoutError(String, Duration),
}

pub type Result<T> = result::Result<T, Error>;
