//! # aws-bridge
//!
//! Thin adapters that let a web application delegate three concerns
//! to the AWS SDK for Rust:
//!
//! - `client`: a [`ClientFactory`](client::ClientFactory) holding the
//!     AWS configuration and building named service clients on demand.
//!
//! - `email`: an SES transport turning a [`Message`](email::Message)
//!     into an SESv2 `SendEmail` request.
//!
//! - `session`: a DynamoDB-backed session handler with locking,
//!     exposed through the [`SessionHandler`](session::SessionHandler)
//!     lifecycle trait.
//!
//! Every component is synchronous: the async SDK is driven by a
//! current-thread runtime owned by the client factory.

use std::result;
use thiserror::Error;

/// Everything related to the configuration: AWS settings, session
/// settings and email transport overrides.
pub mod config;

/// Builds AWS service clients out of the configuration.
pub mod client;

/// Email model and the SES request assembler.
pub mod email;

/// Session lifecycle trait and its DynamoDB implementation.
pub mod session;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    ConfigError(#[from] config::ConfigError),

    #[error(transparent)]
    ClientError(#[from] client::Error),

    #[error(transparent)]
    EmailError(#[from] email::Error),

    #[error(transparent)]
    SessionError(#[from] session::Error),
}

pub type Result<T> = result::Result<T, Error>;
