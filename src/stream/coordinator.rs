//! Streaming receive coordinator
//!
//! A receive task locates the gateway, tells its supervisor that listening has
//! started, then pushes messages to a consumer until the supervisor stops it.

use super::consumer::{consume, join_consumer, log_message};
use crate::capability::MessageSource;
use crate::discovery::{GatewayLocator, ServicePool};
use crate::error::{Error, Result};
use crate::message::Message;
use mihome_shared::ReceiveMode;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Create a readiness rendezvous between a task and its supervisor
///
/// `ReadySignal::notify` does not return until the waiter has taken the
/// token, so nothing the task does afterwards can overtake the supervisor.
pub fn handshake() -> (ReadySignal, ReadyWaiter) {
    let (tx, rx) = oneshot::channel();
    (ReadySignal { tx }, ReadyWaiter { rx })
}

/// Task side of the readiness handshake
pub struct ReadySignal {
    tx: oneshot::Sender<oneshot::Sender<()>>,
}

impl ReadySignal {
    /// Hand over the token and wait until it was taken
    ///
    /// Returns false if the supervisor stopped waiting.
    pub async fn notify(self) -> bool {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.tx.send(ack_tx).is_err() {
            return false;
        }
        ack_rx.await.is_ok()
    }
}

/// Supervisor side of the readiness handshake
pub struct ReadyWaiter {
    rx: oneshot::Receiver<oneshot::Sender<()>>,
}

impl ReadyWaiter {
    /// Wait for the task to start listening
    ///
    /// Returns false if the task ended without becoming ready.
    pub async fn wait(self) -> bool {
        match self.rx.await {
            Ok(ack) => {
                let _ = ack.send(());
                true
            }
            Err(_) => false,
        }
    }
}

/// Receive messages until `stop` is cancelled, logging each one
pub async fn receive_task<P>(
    locator: &GatewayLocator<P>,
    ready: ReadySignal,
    stop: CancellationToken,
) -> Result<()>
where
    P: ServicePool,
{
    run_receive(locator, ready, stop, log_message).await
}

/// Receive messages until `stop` is cancelled, handing each one to `on_message`
pub async fn run_receive<P, F>(
    locator: &GatewayLocator<P>,
    ready: ReadySignal,
    stop: CancellationToken,
    on_message: F,
) -> Result<()>
where
    P: ServicePool,
    F: FnMut(&Message) + Send + 'static,
{
    let client = match locator.get_client().await {
        Ok(client) => client,
        Err(e) => {
            error!("ReceiveTask: {}", e);
            return Err(e);
        }
    };

    if !ready.notify().await {
        debug!("Supervisor stopped waiting for readiness");
    }

    let (tx, rx) = mpsc::channel(locator.config().channel_capacity);
    let consumer = tokio::spawn(consume(rx, on_message));

    // The gateway keeps its current mode
    let result = client.receive(ReceiveMode::Unspecified, stop, tx).await;

    join_consumer(consumer).await;
    result
}

/// Run a receive task until `shutdown` resolves or the task ends on its own
pub async fn listen<P, S>(locator: Arc<GatewayLocator<P>>, shutdown: S) -> Result<()>
where
    P: ServicePool + 'static,
    S: Future<Output = ()>,
{
    let (ready, waiter) = handshake();
    let stop = CancellationToken::new();

    let mut task = tokio::spawn({
        let stop = stop.clone();
        async move { receive_task(&locator, ready, stop).await }
    });

    if waiter.wait().await {
        info!("Waiting for CTRL+C");
    }

    let joined = tokio::select! {
        () = shutdown => {
            info!("Stopping receive task");
            stop.cancel();
            task.await
        }
        joined = &mut task => joined,
    };

    joined.map_err(|e| Error::StreamClosed(format!("receive task failed: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GatewayConfig;
    use crate::discovery::ServiceRecord;
    use async_trait::async_trait;
    use mihome_shared::SensorEvent;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Pushes a fixed script, then waits for stop
    struct ScriptedClient {
        script: Vec<Message>,
        fail_after_script: bool,
    }

    #[async_trait]
    impl MessageSource for ScriptedClient {
        async fn ping(&self) -> Result<()> {
            Ok(())
        }

        async fn receive(
            &self,
            _mode: ReceiveMode,
            stop: CancellationToken,
            messages: mpsc::Sender<Message>,
        ) -> Result<()> {
            for message in &self.script {
                if messages.send(message.clone()).await.is_err() {
                    break;
                }
            }
            if self.fail_after_script {
                return Err(Error::StreamClosed("gateway hung up".into()));
            }
            stop.cancelled().await;
            Ok(())
        }
    }

    struct ScriptedPool {
        records: usize,
        script: Vec<Message>,
        fail_after_script: bool,
    }

    #[async_trait]
    impl ServicePool for ScriptedPool {
        type Connection = ();
        type Client = ScriptedClient;

        async fn lookup(
            &self,
            service: &str,
            address: &str,
            _max_results: usize,
        ) -> Result<Vec<ServiceRecord>> {
            Ok((0..self.records)
                .map(|_| ServiceRecord {
                    service: service.into(),
                    host: address.into(),
                    addr: ([127, 0, 0, 1], 8765).into(),
                })
                .collect())
        }

        async fn connect(&self, _record: &ServiceRecord) -> Result<()> {
            Ok(())
        }

        fn new_client(&self, _service: &str, _connection: ()) -> Option<ScriptedClient> {
            Some(ScriptedClient {
                script: self.script.clone(),
                fail_after_script: self.fail_after_script,
            })
        }
    }

    fn sensor(device: &str) -> Message {
        Message::Sensor(SensorEvent {
            mode: ReceiveMode::Control.into(),
            device: device.into(),
            payload: Vec::new(),
            rssi: Some(-60),
        })
    }

    fn locator(
        records: usize,
        script: Vec<Message>,
        fail: bool,
    ) -> Arc<GatewayLocator<ScriptedPool>> {
        Arc::new(GatewayLocator::new(
            ScriptedPool {
                records,
                script,
                fail_after_script: fail,
            },
            GatewayConfig::default(),
        ))
    }

    #[tokio::test]
    async fn test_handshake_waiter_sees_ready() {
        let (ready, waiter) = handshake();
        let notifier = tokio::spawn(ready.notify());
        assert!(waiter.wait().await);
        assert!(notifier.await.expect("notifier task"));
    }

    #[tokio::test]
    async fn test_handshake_without_waiter() {
        let (ready, waiter) = handshake();
        drop(waiter);
        assert!(!ready.notify().await);

        let (ready, waiter) = handshake();
        drop(ready);
        assert!(!waiter.wait().await);
    }

    #[tokio::test]
    async fn test_ready_before_any_message() {
        let log = Arc::new(Mutex::new(Vec::<String>::new()));
        let locator = locator(
            1,
            vec![sensor("a"), Message::Keepalive, sensor("b")],
            false,
        );

        let (ready, waiter) = handshake();
        let stop = CancellationToken::new();

        let task = tokio::spawn({
            let locator = locator.clone();
            let stop = stop.clone();
            let log = log.clone();
            async move {
                run_receive(&locator, ready, stop, move |m| {
                    log.lock().expect("lock poisoned").push(m.to_string());
                })
                .await
            }
        });

        assert!(waiter.wait().await);
        log.lock().expect("lock poisoned").push("ready".into());

        tokio::time::sleep(Duration::from_millis(20)).await;
        stop.cancel();
        task.await.expect("task").expect("receive");

        let log = log.lock().expect("lock poisoned").clone();
        assert_eq!(log[0], "ready");
        assert_eq!(log.len(), 4);
        assert_eq!(log[2], "<keepalive>");
    }

    #[tokio::test]
    async fn test_discovery_failure_never_signals_ready() {
        let locator = locator(0, Vec::new(), false);
        let (ready, waiter) = handshake();

        let task = tokio::spawn(async move {
            receive_task(&locator, ready, CancellationToken::new()).await
        });

        assert!(!waiter.wait().await);
        let result = task.await.expect("task");
        assert!(matches!(result, Err(Error::DiscoveryTimeout(_))));
    }

    #[tokio::test]
    async fn test_listen_stops_on_shutdown() {
        let locator = locator(1, vec![Message::Keepalive], false);
        let shutdown = tokio::time::sleep(Duration::from_millis(20));

        listen(locator, shutdown).await.expect("listen");
    }

    #[tokio::test]
    async fn test_listen_returns_stream_failure() {
        let locator = locator(1, vec![sensor("a")], true);
        let shutdown = std::future::pending::<()>();

        let result = listen(locator, shutdown).await;
        assert!(matches!(result, Err(Error::StreamClosed(_))));
    }
}
