//! Inbound side: bounded queue, latency probe, command table and dispatcher

pub mod dispatcher;
pub mod latency;
pub mod queue;
pub mod registry;

pub use dispatcher::InboundDispatcher;
pub use latency::{latency_millis, LatencyProbe};
pub use queue::{inbound_queue, InboundQueue, InboundReceiver, PushOutcome};
pub use registry::CommandTable;
