//! Framed TCP session to the gateway

use crate::config::GatewayConfig;
use crate::error::{Error, Result};
use crate::message::Message;
use futures::{SinkExt, StreamExt};
use mihome_shared::codec::EnvelopeCodec;
use mihome_shared::{Command, Envelope, Hello, Payload, Response};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::time::timeout;
use tokio_util::codec::{FramedRead, FramedWrite};
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};
use tracing::{debug, info, trace, warn};

type FrameReader = FramedRead<OwnedReadHalf, EnvelopeCodec>;
type FrameWriter = FramedWrite<OwnedWriteHalf, EnvelopeCodec>;

/// Where inbound frames go once the session is up
#[derive(Default)]
struct Routes {
    /// Callers waiting for a response, by request id
    pending: Mutex<HashMap<u64, oneshot::Sender<Response>>>,
    /// Sink of the active receive subscription
    subscriber: Mutex<Option<mpsc::Sender<Message>>>,
}

impl Routes {
    async fn route(&self, envelope: Envelope) {
        match envelope.payload {
            Some(Payload::Response(response)) => {
                let waiter = self.pending.lock().await.remove(&envelope.id);
                match waiter {
                    Some(tx) => {
                        let _ = tx.send(response);
                    }
                    None => debug!("Dropping response to unknown request {}", envelope.id),
                }
            }
            Some(Payload::Event(event)) => {
                let Some(message) = Message::from_event(event) else {
                    return;
                };
                // Clone out of the lock so a slow consumer never blocks unsubscribe
                let subscriber = self.subscriber.lock().await.clone();
                match subscriber {
                    Some(tx) => {
                        if tx.send(message).await.is_err() {
                            debug!("Subscriber went away, dropping event");
                        }
                    }
                    None => trace!("Event without subscriber: {}", message),
                }
            }
            Some(Payload::Hello(_)) | Some(Payload::Request(_)) | None => {
                warn!("Unexpected frame from gateway (id={})", envelope.id);
            }
        }
    }

    /// Fail every waiter and close the subscription
    async fn close(&self) {
        self.pending.lock().await.clear();
        self.subscriber.lock().await.take();
    }
}

/// A live session to the gateway
///
/// A background task owns the socket; requests and the subscription reach it
/// through channels. Dropping the connection ends the task.
pub struct GatewayConnection {
    peer: SocketAddr,
    hello: Hello,
    outbound: mpsc::Sender<Envelope>,
    routes: Arc<Routes>,
    next_id: AtomicU64,
    request_timeout: Duration,
    closed: CancellationToken,
}

impl GatewayConnection {
    /// Connect to `addr` and wait for the gateway's hello
    pub async fn open(addr: SocketAddr, config: &GatewayConfig) -> Result<Self> {
        let stream = timeout(config.connect_timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| Error::Connection(format!("Timed out connecting to {}", addr)))?
            .map_err(|e| Error::Connection(format!("{}: {}", addr, e)))?;

        let (reader, writer) = stream.into_split();
        let mut reader = FramedRead::new(reader, EnvelopeCodec);

        let hello = timeout(config.connect_timeout, read_hello(&mut reader))
            .await
            .map_err(|_| Error::Connection(format!("No hello from {}", addr)))??;
        debug!(
            "Gateway {} speaks {} v{}",
            addr, hello.service, hello.version
        );

        let (outbound, outbound_rx) = mpsc::channel::<Envelope>(32);
        let routes = Arc::new(Routes::default());
        let closed = CancellationToken::new();

        tokio::spawn(session_loop(
            reader,
            FramedWrite::new(writer, EnvelopeCodec),
            outbound_rx,
            routes.clone(),
            closed.clone(),
        ));

        Ok(Self {
            peer: addr,
            hello,
            outbound,
            routes,
            next_id: AtomicU64::new(0),
            request_timeout: config.request_timeout,
            closed,
        })
    }

    /// Service type the gateway advertised
    pub fn service(&self) -> &str {
        &self.hello.service
    }

    /// Remote address of the session
    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// True once the session has ended
    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    /// Resolves when the session ends
    pub fn closed(&self) -> WaitForCancellationFuture<'_> {
        self.closed.cancelled()
    }

    /// Send a request and wait for its response
    ///
    /// A response carrying an error is returned as [`Error::Domain`].
    pub async fn call(&self, command: Command) -> Result<Response> {
        let name = command.name();
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let frame = Envelope::request(id, command);

        let (tx, rx) = oneshot::channel();
        self.routes.pending.lock().await.insert(id, tx);

        // The session may have ended after the waiter table was drained
        if self.is_closed() || self.outbound.send(frame).await.is_err() {
            self.routes.pending.lock().await.remove(&id);
            return Err(Error::Connection("Gateway session closed".into()));
        }
        trace!("Sent {} request {}", name, id);

        let response = match timeout(self.request_timeout, rx).await {
            Ok(Ok(response)) => response,
            Ok(Err(_)) => return Err(Error::Connection("Gateway session closed".into())),
            Err(_) => {
                self.routes.pending.lock().await.remove(&id);
                return Err(Error::RequestTimeout(name));
            }
        };

        if response.is_error() {
            return Err(Error::Domain(response.error));
        }
        Ok(response)
    }

    /// Route pushed events into `messages`, replacing any previous subscriber
    pub async fn subscribe(&self, messages: mpsc::Sender<Message>) {
        if self.routes.subscriber.lock().await.replace(messages).is_some() {
            debug!("Replaced previous receive subscriber");
        }
    }

    /// Stop routing events; drops the subscriber's sender
    pub async fn unsubscribe(&self) {
        self.routes.subscriber.lock().await.take();
    }
}

impl Drop for GatewayConnection {
    fn drop(&mut self) {
        self.closed.cancel();
    }
}

/// The gateway speaks first; anything but a hello ends the handshake
async fn read_hello(reader: &mut FrameReader) -> Result<Hello> {
    match reader.next().await {
        Some(Ok(Envelope {
            payload: Some(Payload::Hello(hello)),
            ..
        })) => Ok(hello),
        Some(Ok(_)) => Err(Error::Connection("Gateway did not start with hello".into())),
        Some(Err(e)) => Err(e.into()),
        None => Err(Error::Connection("Gateway closed connection".into())),
    }
}

/// Own the socket: write queued frames, route inbound frames
async fn session_loop(
    mut reader: FrameReader,
    mut writer: FrameWriter,
    mut outbound_rx: mpsc::Receiver<Envelope>,
    routes: Arc<Routes>,
    closed: CancellationToken,
) {
    let reason = 'session: loop {
        tokio::select! {
            () = closed.cancelled() => break 'session "connection dropped".to_string(),

            Some(envelope) = outbound_rx.recv() => {
                if let Err(e) = writer.send(envelope).await {
                    break 'session format!("Write error: {}", e);
                }
            }

            frame = reader.next() => match frame {
                Some(Ok(envelope)) => routes.route(envelope).await,
                Some(Err(e)) => break 'session format!("Read error: {}", e),
                None => break 'session "Gateway closed connection".to_string(),
            },
        }
    };

    info!("Gateway session ended: {}", reason);
    closed.cancel();
    routes.close().await;
}
