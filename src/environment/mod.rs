//! The environment: assembles mailboxes, timers, dispatchers, and
//! cooperations into one runnable object (§4.1).

pub mod config;
pub mod environment;
pub mod errors;

pub use config::{DispatcherKind, EnvironmentBuilder, EnvironmentConfig};
pub use environment::Environment;
pub use errors::EnvironmentError;
