//! Config module.
//!
//! This module contains the representation of the configuration
//! file: the process-wide AWS settings, the session handler settings
//! and the email transport overrides.

mod config;
pub use config::*;

mod deserialized_config;
