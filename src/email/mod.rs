//! Email module.
//!
//! This module contains the email message model and the SES
//! transport: the message is assembled into an SESv2 `SendEmail`
//! request, then submitted through a [`SendEmail`] client.

mod error;
pub use error::*;

mod addr;
pub use addr::*;

mod attachment;
pub use attachment::*;

mod message;
pub use message::*;

mod request;
pub use request::*;

mod transport;
pub use transport::*;
