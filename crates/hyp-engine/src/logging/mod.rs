//! Logging setup.
//!
//! The engine logs through the `log` facade; this module installs the
//! `env_logger` backend.

mod init;

pub use init::{init_logging, LoggingConfig};
