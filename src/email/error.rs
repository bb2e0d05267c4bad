use std::{error, io, path::PathBuf, result};
use thiserror::Error;

pub type BoxError = Box<dyn error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("cannot read attachment {1} at {2}")]
    ReadAttachmentError(#[source] io::Error, String, PathBuf),
    #[error("cannot decode base64 content of attachment {1}")]
    DecodeAttachmentError(#[source] base64::DecodeError, String),

    #[error("cannot build SES request")]
    BuildRequestError(#[source] BoxError),
    #[error("cannot send email through SES")]
    SendEmailError(#[source] BoxError),
}

pub type Result<T> = result::Result<T, Error>;
