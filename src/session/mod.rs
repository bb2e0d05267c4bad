//! Session module.
//!
//! This module contains the session lifecycle trait expected by the
//! web application, the session handler implementing it on top of a
//! [`SessionConnection`], and the DynamoDB implementation of that
//! connection.

mod error;
pub use error::*;

mod handler;
pub use handler::*;

mod connection;
pub use connection::*;

mod dynamodb_handler;
pub use dynamodb_handler::*;

#[cfg(feature = "dynamodb")]
mod dynamodb_connection;
#[cfg(feature = "dynamodb")]
pub use dynamodb_connection::*;

#[cfg(feature = "dynamodb")]
mod dynamodb_session;
#[cfg(feature = "dynamodb")]
pub use dynamodb_session::*;
