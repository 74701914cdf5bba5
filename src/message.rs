//! Decoded messages delivered by a receive subscription

use mihome_shared::{Event, EventKind, ReceiveMode, SensorEvent};
use std::fmt;

/// One item on the message channel
///
/// The channel itself closing (`recv()` returning `None`) is the only end
/// of stream; a keepalive just means the stream is still alive.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Keepalive,
    Sensor(SensorEvent),
}

impl Message {
    /// Convert a pushed event frame; `None` for an event without a kind
    pub fn from_event(event: Event) -> Option<Self> {
        match event.kind? {
            EventKind::Keepalive(_) => Some(Message::Keepalive),
            EventKind::Sensor(sensor) => Some(Message::Sensor(sensor)),
        }
    }

    pub fn is_keepalive(&self) -> bool {
        matches!(self, Message::Keepalive)
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Message::Keepalive => write!(f, "<keepalive>"),
            Message::Sensor(event) => {
                let mode = ReceiveMode::try_from(event.mode).unwrap_or(ReceiveMode::Unspecified);
                write!(f, "<{} device={}", mode, event.device)?;
                if let Some(rssi) = event.rssi {
                    write!(f, " rssi={}", rssi)?;
                }
                write!(f, " payload=")?;
                for byte in &event.payload {
                    write!(f, "{:02x}", byte)?;
                }
                write!(f, ">")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mihome_shared::Empty;

    #[test]
    fn test_from_event() {
        let keepalive = Event {
            kind: Some(EventKind::Keepalive(Empty {})),
        };
        assert_eq!(Message::from_event(keepalive), Some(Message::Keepalive));
        assert_eq!(Message::from_event(Event { kind: None }), None);
    }

    #[test]
    fn test_display() {
        let message = Message::Sensor(SensorEvent {
            mode: ReceiveMode::Monitor.into(),
            device: "energy-0042".into(),
            payload: vec![0x0a, 0xff],
            rssi: Some(-71),
        });
        assert_eq!(
            message.to_string(),
            "<FSK device=energy-0042 rssi=-71 payload=0aff>"
        );
        assert_eq!(Message::Keepalive.to_string(), "<keepalive>");
    }
}
