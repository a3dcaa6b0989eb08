//! Mailboxes: per-address subscription tables that route an incoming message
//! to every agent registered for its type, plus the machinery built on top
//! of that routing — an environment-wide registry and a synchronous
//! request/reply rendezvous.
//!
//! A mailbox itself never runs anything: it hands each matched [`crate::demand::Demand`]
//! to a [`DemandSink`], which is how the `dispatcher` module plugs in without
//! `mailbox` depending on it.

pub mod errors;
pub mod mailbox;
pub mod registry;
pub mod service_request;

pub use errors::MailboxError;
pub use mailbox::{DemandSink, Mailbox, MailboxKind};
pub use registry::MailboxRegistry;
pub use service_request::request;
