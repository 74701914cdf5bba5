//! Message consumer

use crate::message::Message;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Hand every message to `on_message` until the channel closes
///
/// Keepalives are handled like any other message. Returns how many messages
/// were seen.
pub async fn consume<F>(mut messages: mpsc::Receiver<Message>, mut on_message: F) -> usize
where
    F: FnMut(&Message),
{
    let mut count = 0;
    while let Some(message) = messages.recv().await {
        on_message(&message);
        count += 1;
    }
    debug!("Message channel closed after {} message(s)", count);
    count
}

/// Default message handler: log for human inspection
pub fn log_message(message: &Message) {
    info!("{}", message);
}

/// Wait for a spawned consumer to drain its channel
pub async fn join_consumer(consumer: JoinHandle<usize>) {
    if let Err(e) = consumer.await {
        warn!("Message consumer failed: {}", e);
    }
}
