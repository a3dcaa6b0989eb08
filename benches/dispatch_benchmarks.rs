//! Dispatcher Benchmarks
//!
//! Compares end-to-end send-to-handler latency across the four dispatcher
//! strategies, and throughput of a single dispatcher under a message burst.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

// Layer 1: Standard library imports
use std::hint::black_box;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

// Layer 2: Third-party crate imports
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

// Layer 3: Internal module imports
use agentbeam::prelude::*;

#[derive(Debug, Clone)]
struct Ping;

impl Message for Ping {
    const MESSAGE_TYPE: &'static str = "bench::ping";
}

struct EchoAgent {
    inbox: Mailbox,
    hits: Arc<AtomicUsize>,
}

impl EchoAgent {
    fn on_ping(&mut self, _msg: &Ping, _ctx: &mut AgentContext) {
        self.hits.fetch_add(1, Ordering::SeqCst);
    }
}

impl Agent for EchoAgent {
    fn define(&mut self, ctx: &mut DefineContext) -> Result<(), AgentDefineError> {
        ctx.subscribe(&self.inbox).event::<Self, Ping, _>(Self::on_ping);
        Ok(())
    }
}

fn wait_for(hits: &AtomicUsize, target: usize, deadline: Duration) {
    let start = Instant::now();
    while hits.load(Ordering::SeqCst) < target && start.elapsed() < deadline {
        std::thread::yield_now();
    }
}

/// One send, one handler invocation, measured across every dispatcher kind.
fn send_to_handler_latency(c: &mut Criterion) {
    let mut group = c.benchmark_group("send_to_handler_latency");
    let kinds: Vec<(&str, DispatcherKind)> = vec![
        ("one_thread", DispatcherKind::one_thread()),
        ("active_object", DispatcherKind::active_object()),
        ("active_group", DispatcherKind::active_group()),
        ("thread_pool", DispatcherKind::thread_pool()),
    ];

    for (label, kind) in kinds {
        group.bench_with_input(BenchmarkId::from_parameter(label), &kind, |b, kind| {
            let env = EnvironmentBuilder::new().build();
            let dispatcher = env.create_disp(kind.clone());
            let binder = Binder::new(dispatcher);
            let inbox = env.create_mbox(format!("bench-{label}")).expect("create");
            let hits = Arc::new(AtomicUsize::new(0));

            let spec_inbox = inbox.clone();
            let spec_hits = Arc::clone(&hits);
            let spec = CooperationSpec::new(binder).named(label).with_agent(AgentSpec::new(move || {
                Box::new(EchoAgent { inbox: spec_inbox.clone(), hits: Arc::clone(&spec_hits) })
            }));
            env.register_cooperation(spec).expect("register");

            let mut sent = 0usize;
            b.iter(|| {
                sent += 1;
                env.send(&inbox, black_box(Ping));
                wait_for(&hits, sent, Duration::from_secs(1));
            });

            env.stop();
        });
    }
    group.finish();
}

/// Sustained throughput of a burst of sends into one dispatcher.
fn burst_throughput(c: &mut Criterion) {
    const BURST: usize = 500;

    let env = EnvironmentBuilder::new().build();
    let dispatcher = env.create_disp(DispatcherKind::one_thread());
    let binder = Binder::new(dispatcher);
    let inbox = env.create_mbox("bench-burst").expect("create");
    let hits = Arc::new(AtomicUsize::new(0));

    let spec_inbox = inbox.clone();
    let spec_hits = Arc::clone(&hits);
    let spec = CooperationSpec::new(binder).named("burst").with_agent(AgentSpec::new(move || {
        Box::new(EchoAgent { inbox: spec_inbox.clone(), hits: Arc::clone(&spec_hits) })
    }));
    env.register_cooperation(spec).expect("register");

    c.bench_function("burst_throughput_500", |b| {
        b.iter(|| {
            let start = hits.load(Ordering::SeqCst);
            for _ in 0..BURST {
                env.send(&inbox, Ping);
            }
            wait_for(&hits, start + BURST, Duration::from_secs(5));
            black_box(hits.load(Ordering::SeqCst));
        });
    });

    env.stop();
}

fn configure_criterion() -> Criterion {
    Criterion::default()
        .sample_size(20)
        .measurement_time(Duration::from_secs(8))
        .warm_up_time(Duration::from_secs(1))
        .without_plots()
}

criterion_group! {
    name = benches;
    config = configure_criterion();
    targets = send_to_handler_latency, burst_throughput
}

criterion_main!(benches);
