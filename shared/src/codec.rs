//! Envelope framing for `tokio_util::codec`
//!
//! A frame is a big-endian `u32` byte count followed by one protobuf
//! [`Envelope`]. Wrap a socket half in `FramedRead`/`FramedWrite` (or the
//! whole stream in `Framed`) with [`EnvelopeCodec`] to get a stream and sink
//! of envelopes.

use bytes::{Buf, BufMut, BytesMut};
use prost::Message;
use thiserror::Error;
use tokio_util::codec::{Decoder, Encoder};

use crate::Envelope;

/// Largest accepted envelope; radio packets are tiny so anything bigger is garbage
pub const MAX_MESSAGE_SIZE: usize = 1024 * 1024;

const HEADER_LEN: usize = 4;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Frame of {0} bytes exceeds the {MAX_MESSAGE_SIZE} byte limit")]
    FrameTooLarge(usize),

    #[error("Malformed envelope: {0}")]
    Decode(#[from] prost::DecodeError),

    #[error("Cannot encode envelope: {0}")]
    Encode(#[from] prost::EncodeError),

    #[error("Socket error: {0}")]
    Io(#[from] std::io::Error),
}

/// Length-prefixed protobuf codec for [`Envelope`]
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvelopeCodec;

impl Decoder for EnvelopeCodec {
    type Item = Envelope;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Envelope>, CodecError> {
        if src.len() < HEADER_LEN {
            return Ok(None);
        }

        let len = u32::from_be_bytes([src[0], src[1], src[2], src[3]]) as usize;
        // Reject before buffering the body
        if len > MAX_MESSAGE_SIZE {
            return Err(CodecError::FrameTooLarge(len));
        }

        let frame_len = HEADER_LEN + len;
        if src.len() < frame_len {
            src.reserve(frame_len - src.len());
            return Ok(None);
        }

        src.advance(HEADER_LEN);
        let body = src.split_to(len);
        Ok(Some(Envelope::decode(body)?))
    }
}

impl Encoder<Envelope> for EnvelopeCodec {
    type Error = CodecError;

    fn encode(&mut self, envelope: Envelope, dst: &mut BytesMut) -> Result<(), CodecError> {
        let len = envelope.encoded_len();
        if len > MAX_MESSAGE_SIZE {
            return Err(CodecError::FrameTooLarge(len));
        }

        dst.reserve(HEADER_LEN + len);
        dst.put_u32(len as u32);
        envelope.encode(dst)?;
        Ok(())
    }
}
