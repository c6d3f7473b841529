//! Logging setup.
//!
//! Everything logs through the `log` facade; this module only owns the one-time
//! `env_logger` initialization.

mod init;

pub use init::{init_logging, LoggingConfig};
