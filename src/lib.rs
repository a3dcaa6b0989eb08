//! # agentbeam - Synchronous, Thread-Based Actor Runtime
//!
//! A fully synchronous actor runtime: agents run on OS threads under one of
//! a handful of dispatcher strategies, communicate exclusively through
//! mailboxes, and are supervised in atomically-registered groups called
//! cooperations. There is no `async`/`await` anywhere in the dispatch path —
//! a handler invocation either returns or it panics, and the owning
//! cooperation decides what happens next.
//!
//! # Quick Start
//!
//! ```rust
//! use agentbeam::prelude::*;
//!
//! #[derive(Debug, Clone)]
//! struct Greet {
//!     name: String,
//! }
//!
//! impl Message for Greet {
//!     const MESSAGE_TYPE: &'static str = "greet";
//! }
//!
//! struct Greeter {
//!     inbox: Mailbox,
//! }
//!
//! impl Greeter {
//!     fn on_greet(&mut self, msg: &Greet, _ctx: &mut AgentContext) {
//!         println!("Hello, {}!", msg.name);
//!     }
//! }
//!
//! impl Agent for Greeter {
//!     fn define(&mut self, ctx: &mut DefineContext) -> Result<(), AgentDefineError> {
//!         ctx.subscribe(&self.inbox).event::<Self, Greet, _>(Self::on_greet);
//!         Ok(())
//!     }
//! }
//!
//! let env = EnvironmentBuilder::new().build();
//! let greetings = env.create_mbox("greetings").expect("create");
//! let dispatcher = env.create_disp(DispatcherKind::OneThread { lock_style: LockStyle::Mutex });
//! let binder = Binder::new(dispatcher);
//!
//! let inbox = greetings.clone();
//! let spec = CooperationSpec::new(binder)
//!     .named("greeters")
//!     .with_agent(AgentSpec::new(move || Box::new(Greeter { inbox: inbox.clone() })));
//!
//! env.register_cooperation(spec).expect("register");
//! env.send(&greetings, Greet { name: "world".to_string() });
//! # env.stop();
//! ```
//!
//! # Core Concepts
//!
//! - **Agent** — the unit of state and behaviour. Declares its subscriptions
//!   once via [`agent::Agent::define`]; everything else happens in handler
//!   closures that run on whatever dispatcher owns it.
//! - **Mailbox** — a subscription table keyed by message type. Delivery is
//!   fan-out: every matching subscriber gets its own demand.
//! - **Cooperation** — an atomically registered group of agents and the
//!   supervisory policy (abort, ignore, restart, escalate, or shut down the
//!   environment) applied when one of them panics.
//! - **Dispatcher** — the scheduling strategy that turns matched demands into
//!   actual handler invocations: one shared thread, one thread per agent, one
//!   thread per named group, or a fixed worker pool.
//! - **Environment** — the object that owns every mailbox, timer, dispatcher,
//!   and cooperation, and the only thing an agent's handler ever talks to
//!   (through the narrow [`agent::EnvironmentServices`] seam).
//!
//! # Module Organization
//!
//! ## Core Runtime
//! - [`agent`] — the `Agent` trait, lifecycle, and handler context
//! - [`message`] — typed messages, priority, and the type-erased envelope
//! - [`mailbox`] — subscription routing and the request/reply rendezvous
//! - [`demand`] — the unit of work routed from a mailbox to a dispatcher
//! - [`dispatcher`] — the four scheduling strategies and their shared contract
//!
//! ## Supervision and Composition
//! - [`cooperation`] — atomic agent registration and exception reactions
//! - [`statechart`] — hierarchical state machines for stateful agents
//! - [`timer`] — one-shot and periodic scheduling
//!
//! ## Infrastructure
//! - [`environment`] — assembles everything above into one runnable object
//! - [`monitoring`] — synchronous diagnostics events for every layer above
//! - [`util`] — identifiers and small shared helpers
//!
//! # Standards
//!
//! - 3-layer import organization (std → third-party → internal) throughout
//! - `chrono::DateTime<Utc>` for every timestamp
//! - `thiserror` for every public error type, `Result` + `?` at every
//!   fallible boundary — no `unwrap`/`expect` outside tests
//! - No `async`/`await`: every blocking operation is an explicit, bounded
//!   wait on a condition variable or channel

pub mod agent;
pub mod cooperation;
pub mod demand;
pub mod dispatcher;
pub mod environment;
pub mod mailbox;
pub mod message;
pub mod monitoring;
pub mod prelude;
pub mod statechart;
pub mod timer;
pub mod util;

pub use agent::{Agent, AgentContext, AgentDefineError, EnvironmentServices, ExceptionReaction};
pub use cooperation::{Cooperation, CooperationError, CooperationSpec};
pub use demand::Demand;
pub use dispatcher::{Dispatcher, DispatcherError};
pub use environment::{Environment, EnvironmentBuilder, EnvironmentError};
pub use mailbox::{Mailbox, MailboxError};
pub use message::{Message, MessageEnvelope, MessagePriority};
pub use monitoring::{EventSeverity, InMemoryMonitor, Monitor, MonitoringEvent, NoopMonitor};
pub use util::{AgentId, CooperationId, MailboxAddress, MessageId};
