//! One client session on the gateway

use crate::radio::SimulatedRadio;
use anyhow::Result;
use futures::{SinkExt, StreamExt};
use mihome_shared::codec::EnvelopeCodec;
use mihome_shared::{
    limits, Command, Envelope, EventKind, Payload, PinMode, ReceiveMode, Request, Response,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::time::{interval_at, Instant};
use tokio_util::codec::{FramedRead, FramedWrite};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Every n-th tick of a subscription carries a sensor packet instead of a keepalive
const SENSOR_EVERY_TICKS: u64 = 3;

/// Shared writer so responses and pushed events do not interleave mid-frame
#[derive(Clone)]
struct SessionHandle {
    writer: Arc<Mutex<FramedWrite<OwnedWriteHalf, EnvelopeCodec>>>,
}

impl SessionHandle {
    async fn send(&self, envelope: Envelope) -> Result<()> {
        self.writer.lock().await.send(envelope).await?;
        Ok(())
    }
}

/// Serve a client until it disconnects
pub async fn serve(stream: TcpStream, radio: Arc<SimulatedRadio>) -> Result<()> {
    let (reader, writer) = stream.into_split();
    let handle = SessionHandle {
        writer: Arc::new(Mutex::new(FramedWrite::new(writer, EnvelopeCodec))),
    };
    handle.send(Envelope::hello(limits::SERVICE_NAME)).await?;

    let mut reader = FramedRead::new(reader, EnvelopeCodec);
    let mut subscription: Option<CancellationToken> = None;
    let result = read_requests(&mut reader, &handle, &radio, &mut subscription).await;

    if let Some(token) = subscription.take() {
        token.cancel();
    }
    result
}

async fn read_requests(
    reader: &mut FramedRead<OwnedReadHalf, EnvelopeCodec>,
    handle: &SessionHandle,
    radio: &Arc<SimulatedRadio>,
    subscription: &mut Option<CancellationToken>,
) -> Result<()> {
    while let Some(frame) = reader.next().await {
        handle_frame(frame?, handle, radio, subscription).await?;
    }
    Ok(())
}

async fn handle_frame(
    envelope: Envelope,
    handle: &SessionHandle,
    radio: &Arc<SimulatedRadio>,
    subscription: &mut Option<CancellationToken>,
) -> Result<()> {
    let command = match envelope.payload {
        Some(Payload::Request(Request {
            command: Some(command),
        })) => command,
        other => {
            warn!("Ignoring unexpected frame {}: {:?}", envelope.id, other);
            return Ok(());
        }
    };
    debug!("Request {}: {}", envelope.id, command.name());

    let response = match command {
        Command::Ping(_) => Response::ok(),
        Command::ResetRadio(_) => {
            radio.reset().await;
            Response::ok()
        }
        Command::MeasureTemperature(_) => Response::temperature(radio.temperature().await),
        Command::On(sockets) => outcome(radio.switch(&sockets.sockets, true).await),
        Command::Off(sockets) => outcome(radio.switch(&sockets.sockets, false).await),
        Command::SetPinMode(request) => match PinMode::try_from(request.mode) {
            Ok(mode) => outcome(radio.set_pin_mode(request.pin, mode).await),
            Err(_) => Response::failed(format!("unknown pin mode {}", request.mode)),
        },
        Command::Receive(request) => {
            let requested = ReceiveMode::try_from(request.mode).unwrap_or(ReceiveMode::Unspecified);
            let mode = radio.start_receive(requested).await;
            if let Some(previous) = subscription.take() {
                previous.cancel();
            }

            let stop = CancellationToken::new();
            tokio::spawn(push_events(handle.clone(), radio.clone(), mode, stop.clone()));
            *subscription = Some(stop);
            info!("Receiving in {} mode", mode);
            Response::ok()
        }
        Command::StopReceive(_) => {
            if let Some(stop) = subscription.take() {
                stop.cancel();
                info!("Receive stopped");
            }
            Response::ok()
        }
    };

    handle.send(Envelope::response(envelope.id, response)).await
}

fn outcome(result: Result<(), String>) -> Response {
    match result {
        Ok(()) => Response::ok(),
        Err(message) => Response::failed(message),
    }
}

/// Push keepalives and sensor packets until stopped or the peer goes away
async fn push_events(
    handle: SessionHandle,
    radio: Arc<SimulatedRadio>,
    mode: ReceiveMode,
    stop: CancellationToken,
) {
    let period = Duration::from_millis(limits::KEEPALIVE_INTERVAL_MS);
    let mut ticker = interval_at(Instant::now() + period, period);
    let mut tick = 0u64;

    loop {
        tokio::select! {
            () = stop.cancelled() => break,
            _ = ticker.tick() => {}
        }
        tick += 1;

        let envelope = if tick % SENSOR_EVERY_TICKS == 0 {
            Envelope::event(EventKind::Sensor(radio.next_packet(mode).await))
        } else {
            Envelope::keepalive()
        };
        if let Err(e) = handle.send(envelope).await {
            warn!("Dropping subscription: {}", e);
            break;
        }
    }
    debug!("Subscription ended");
}

#[cfg(test)]
mod tests {
    use super::*;
    use mihome_shared::{Empty, Sockets, StartReceive};
    use tokio::net::TcpListener;
    use tokio_util::codec::Framed;

    type Wire = Framed<TcpStream, EnvelopeCodec>;

    async fn start() -> (Wire, Arc<SimulatedRadio>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let radio = Arc::new(SimulatedRadio::new());

        let served = radio.clone();
        tokio::spawn(async move {
            let (socket, _) = listener.accept().await.expect("accept");
            let _ = serve(socket, served).await;
        });

        let stream = TcpStream::connect(addr).await.expect("connect");
        (Framed::new(stream, EnvelopeCodec), radio)
    }

    async fn next(wire: &mut Wire) -> Envelope {
        wire.next()
            .await
            .expect("gateway closed the session")
            .expect("decode")
    }

    async fn call(wire: &mut Wire, id: u64, command: Command) -> Response {
        wire.send(Envelope::request(id, command)).await.expect("write");
        loop {
            let envelope = next(wire).await;
            if let Some(Payload::Response(response)) = envelope.payload {
                assert_eq!(envelope.id, id);
                return response;
            }
        }
    }

    fn sockets(sockets: &[u32]) -> Sockets {
        Sockets {
            sockets: sockets.to_vec(),
        }
    }

    #[tokio::test]
    async fn test_hello_then_requests() {
        let (mut wire, radio) = start().await;

        match next(&mut wire).await.payload {
            Some(Payload::Hello(hello)) => assert_eq!(hello.service, limits::SERVICE_NAME),
            other => panic!("expected hello, got {:?}", other),
        }

        let response = call(&mut wire, 1, Command::On(sockets(&[2]))).await;
        assert!(!response.is_error());
        assert_eq!(radio.socket_states().await, [false, true, false, false]);

        let response = call(&mut wire, 2, Command::Off(sockets(&[7]))).await;
        assert!(response.error.contains("socket 7"));

        let response = call(&mut wire, 3, Command::MeasureTemperature(Empty {})).await;
        assert_eq!(response.celsius, Some(20.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscription_pushes_events() {
        let (mut wire, _radio) = start().await;
        next(&mut wire).await;

        let start = StartReceive {
            mode: ReceiveMode::Control.into(),
        };
        let response = call(&mut wire, 1, Command::Receive(start)).await;
        assert!(!response.is_error());

        let mut kinds = Vec::new();
        while kinds.len() < SENSOR_EVERY_TICKS as usize {
            if let Some(Payload::Event(event)) = next(&mut wire).await.payload {
                kinds.push(event.kind.expect("event kind"));
            }
        }
        assert!(matches!(kinds[0], EventKind::Keepalive(_)));
        match &kinds[SENSOR_EVERY_TICKS as usize - 1] {
            EventKind::Sensor(sensor) => assert!(sensor.device.starts_with("socket-")),
            other => panic!("expected sensor event, got {:?}", other),
        }

        let response = call(&mut wire, 2, Command::StopReceive(Empty {})).await;
        assert!(!response.is_error());
    }
}
