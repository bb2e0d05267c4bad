//! Client module.
//!
//! This module builds AWS service clients. Each service actually used
//! by the crate has its own named factory method on
//! [`ClientFactory`], and its own synchronous client wrapper.

use std::{io, result};
use thiserror::Error;

mod factory;
pub use factory::*;

#[cfg(feature = "dynamodb")]
mod dynamodb;
#[cfg(feature = "dynamodb")]
pub use dynamodb::*;

#[cfg(feature = "ses")]
mod ses;
#[cfg(feature = "ses")]
pub use ses::*;

#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot build runtime for AWS clients")]
    BuildRuntimeError(#[source] io::Error),
}

pub type Result<T> = result::Result<T, Error>;
