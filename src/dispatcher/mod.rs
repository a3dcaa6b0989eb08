//! Dispatcher strategies: the synchronous, thread-based scheduling layer
//! that turns a mailbox's fanned-out [`crate::demand::Demand`]s into actual
//! handler invocations.
//!
//! Every strategy implements the same [`Dispatcher`] contract and differs
//! only in how it partitions agents across worker threads and queues:
//!
//! - [`one_thread::OneThreadDispatcher`] — one shared queue, one thread, total order.
//! - [`active_object::ActiveObjectDispatcher`] — one queue and thread per agent.
//! - [`active_group::ActiveGroupDispatcher`] — one queue and thread per named group.
//! - [`thread_pool::ThreadPoolDispatcher`] — fixed worker pool, one queue per cooperation.

pub mod active_group;
pub mod active_object;
pub mod agent_table;
pub mod errors;
pub mod failure;
pub mod handle;
pub mod one_thread;
pub mod queue;
pub mod thread_pool;
pub mod worker;

pub use active_group::ActiveGroupDispatcher;
pub use active_object::ActiveObjectDispatcher;
pub use errors::DispatcherError;
pub use failure::{FailureHandler, NoopFailureHandler};
pub use handle::{BindRequest, Dispatcher};
pub use one_thread::OneThreadDispatcher;
pub use queue::{DemandQueue, LockStyle};
pub use thread_pool::{ThreadPoolDispatcher, ThreadPoolParams};
