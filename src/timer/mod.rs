//! One-shot and periodic timer service.

pub mod handle;
pub mod service;

pub use handle::{TimerHandle, TimerId};
pub use service::TimerService;
