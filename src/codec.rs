//! Terminator-framed ASCII codec for tokio.
//!
//! The device protocol is line-oriented: every frame in either direction is
//! a run of single-byte characters closed by one terminator byte. The codec
//! maps bytes to chars 1:1 (ISO-8859-1); the stream is not UTF-8 safe and
//! must never go through UTF-8 validation.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::command::Command;
use crate::error::AvpError;
use crate::types::TERMINATOR;

/// Upper bound on a single inbound frame. The protocol's longest replies
/// are input long names, well under this; a buffer that grows past it
/// without a terminator is garbage and gets discarded.
pub const MAX_FRAME_LENGTH: usize = 128;

/// Codec splitting the inbound byte stream into terminated frames and
/// serializing outbound [`Command`]s.
///
/// Decoded frames keep their terminator; the parser strips it.
#[derive(Debug, Clone, Default)]
pub struct AsciiCodec;

impl AsciiCodec {
    /// Create a new codec.
    pub fn new() -> Self {
        Self
    }
}

impl Decoder for AsciiCodec {
    type Item = String;
    type Error = AvpError;

    fn decode(&mut self, src: &mut BytesMut) -> std::result::Result<Option<String>, AvpError> {
        match src.iter().position(|&b| b == TERMINATOR as u8) {
            Some(pos) => {
                let frame = src.split_to(pos + 1);
                Ok(Some(frame.iter().map(|&b| char::from(b)).collect()))
            }
            None => {
                if src.len() > MAX_FRAME_LENGTH {
                    tracing::trace!(len = src.len(), "discarding unterminated garbage");
                    src.clear();
                }
                Ok(None)
            }
        }
    }
}

impl Encoder<Command> for AsciiCodec {
    type Error = AvpError;

    fn encode(&mut self, item: Command, dst: &mut BytesMut) -> std::result::Result<(), AvpError> {
        let payload = item.payload();
        dst.reserve(payload.len());
        // Factory-built payloads are plain ASCII, so the char -> byte
        // truncation is exact.
        dst.extend(payload.chars().map(|c| c as u8));
        Ok(())
    }
}
