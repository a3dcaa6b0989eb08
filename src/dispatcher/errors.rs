//! Dispatcher error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatcherError {
    /// A binder rejected an agent: an active-group bind without a group
    /// name, a thread-pool bind without a cooperation id, or similar misuse.
    #[error("dispatcher rejected binding: {reason}")]
    BindingFailure { reason: String },
}
