//! Wire messages exchanged between the gateway and its clients
//!
//! Declared with prost derives so no protoc step is needed at build time.
//! Every frame on the wire carries exactly one [`Envelope`].

use prost::{Enumeration, Message, Oneof};

/// Top-level frame
#[derive(Clone, PartialEq, Message)]
pub struct Envelope {
    /// Request id; responses echo the id of the request they answer, pushed
    /// events and hellos use 0
    #[prost(uint64, tag = "1")]
    pub id: u64,

    #[prost(uint64, tag = "2")]
    pub timestamp_ms: u64,

    #[prost(oneof = "Payload", tags = "3, 4, 5, 6")]
    pub payload: Option<Payload>,
}

#[derive(Clone, PartialEq, Oneof)]
pub enum Payload {
    #[prost(message, tag = "3")]
    Hello(Hello),
    #[prost(message, tag = "4")]
    Request(Request),
    #[prost(message, tag = "5")]
    Response(Response),
    #[prost(message, tag = "6")]
    Event(Event),
}

/// Sent by the gateway as the first frame of every session
#[derive(Clone, PartialEq, Message)]
pub struct Hello {
    #[prost(string, tag = "1")]
    pub service: String,

    #[prost(string, tag = "2")]
    pub version: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct Empty {}

#[derive(Clone, PartialEq, Message)]
pub struct Sockets {
    /// Empty means every socket
    #[prost(uint32, repeated, tag = "1")]
    pub sockets: Vec<u32>,
}

#[derive(Clone, PartialEq, Message)]
pub struct SetPinMode {
    #[prost(uint32, tag = "1")]
    pub pin: u32,

    #[prost(enumeration = "PinMode", tag = "2")]
    pub mode: i32,
}

#[derive(Clone, PartialEq, Message)]
pub struct StartReceive {
    #[prost(enumeration = "ReceiveMode", tag = "1")]
    pub mode: i32,
}

#[derive(Clone, PartialEq, Message)]
pub struct Request {
    #[prost(oneof = "Command", tags = "1, 2, 3, 4, 5, 6, 7, 8")]
    pub command: Option<Command>,
}

#[derive(Clone, PartialEq, Oneof)]
pub enum Command {
    #[prost(message, tag = "1")]
    Ping(Empty),
    #[prost(message, tag = "2")]
    ResetRadio(Empty),
    #[prost(message, tag = "3")]
    MeasureTemperature(Empty),
    #[prost(message, tag = "4")]
    On(Sockets),
    #[prost(message, tag = "5")]
    Off(Sockets),
    #[prost(message, tag = "6")]
    SetPinMode(SetPinMode),
    #[prost(message, tag = "7")]
    Receive(StartReceive),
    #[prost(message, tag = "8")]
    StopReceive(Empty),
}

#[derive(Clone, PartialEq, Message)]
pub struct Response {
    /// Empty on success, otherwise the gateway's description of the failure
    #[prost(string, tag = "1")]
    pub error: String,

    #[prost(float, optional, tag = "2")]
    pub celsius: Option<f32>,
}

/// Pushed by the gateway while a receive subscription is active
#[derive(Clone, PartialEq, Message)]
pub struct Event {
    #[prost(oneof = "EventKind", tags = "1, 2")]
    pub kind: Option<EventKind>,
}

#[derive(Clone, PartialEq, Oneof)]
pub enum EventKind {
    #[prost(message, tag = "1")]
    Keepalive(Empty),
    #[prost(message, tag = "2")]
    Sensor(SensorEvent),
}

/// A radio packet received by the gateway, still encoded
#[derive(Clone, PartialEq, Message)]
pub struct SensorEvent {
    #[prost(enumeration = "ReceiveMode", tag = "1")]
    pub mode: i32,

    /// Sensor identifier as reported by the gateway
    #[prost(string, tag = "2")]
    pub device: String,

    #[prost(bytes = "vec", tag = "3")]
    pub payload: Vec<u8>,

    #[prost(sint32, optional, tag = "4")]
    pub rssi: Option<i32>,
}

/// Radio receive modes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Enumeration)]
#[repr(i32)]
pub enum ReceiveMode {
    Unspecified = 0,
    /// OOK modulation, used by the remote-controlled sockets
    Control = 1,
    /// FSK modulation, used by the monitoring sensors
    Monitor = 2,
}

/// GPIO pin function
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Enumeration)]
#[repr(i32)]
pub enum PinMode {
    Input = 0,
    Output = 1,
    Alt0 = 4,
    Alt1 = 5,
    Alt2 = 6,
    Alt3 = 7,
    Alt4 = 3,
    Alt5 = 2,
}
