//! Streaming receive: readiness handshake, receive task and message consumer

mod consumer;
mod coordinator;

pub use consumer::{consume, join_consumer, log_message};
pub use coordinator::{handshake, listen, receive_task, run_receive, ReadySignal, ReadyWaiter};
