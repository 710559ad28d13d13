//! RPC packet codec.
//!
//! Wire format (both `rpc_command` writes and `rpc_result` notifications):
//! ```text
//! ┌─────────┬────────┬───────────────────────────┬──────────┐
//! │ Cmd (1B)│ Len(1B)│ (field_len:1B, field)*    │ Sum (1B) │
//! └─────────┴────────┴───────────────────────────┴──────────┘
//! ```
//!
//! Fields are UTF-8 strings, length-prefixed, never null-terminated.
//! Inbound packets are located purely by their inner field lengths;
//! the outer length byte is informational. Every index is bounds
//! checked so truncated or inconsistent packets decode to a clean
//! [`CodecError`], never a panic.

use core::fmt;

use log::debug;

use super::checksum::{checksum, verify};
use super::types::{ErrorState, RpcCommand};

/// Maximum payload bytes (the length field is a single byte).
pub const MAX_PAYLOAD_LEN: usize = 255;

/// Command + length + payload + checksum.
pub const MAX_PACKET_LEN: usize = MAX_PAYLOAD_LEN + 3;

/// Smallest well-formed packet: command, length, checksum.
pub const MIN_PACKET_LEN: usize = 3;

/// An encoded packet (or any characteristic value) ready for the transport.
pub type Frame = heapless::Vec<u8, MAX_PACKET_LEN>;

/// A decoded string field. One length byte bounds it to 255 bytes.
pub type Field = heapless::String<MAX_PAYLOAD_LEN>;

// ───────────────────────────────────────────────────────────────
// Errors
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecError {
    /// Packet shorter than [`MIN_PACKET_LEN`].
    TooShort { len: usize },
    /// Trailing checksum does not match the additive sum.
    ChecksumMismatch { expected: u8, actual: u8 },
    /// A field length points past the end of the packet.
    Truncated,
    /// A field is not valid UTF-8.
    InvalidUtf8,
    /// Encoded payload would not fit the one-byte length.
    PayloadTooLong { len: usize },
    /// Output buffer exhausted.
    BufferFull,
}

impl CodecError {
    /// Protocol error reported to the central for an inbound decode failure.
    pub const fn error_state(self) -> ErrorState {
        ErrorState::InvalidPacket
    }
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooShort { len } => write!(f, "packet too short ({len} < {MIN_PACKET_LEN} bytes)"),
            Self::ChecksumMismatch { expected, actual } => {
                write!(f, "checksum mismatch (expected 0x{expected:02x}, got 0x{actual:02x})")
            }
            Self::Truncated => write!(f, "field length exceeds packet"),
            Self::InvalidUtf8 => write!(f, "field is not valid UTF-8"),
            Self::PayloadTooLong { len } => {
                write!(f, "payload of {len} bytes exceeds {MAX_PAYLOAD_LEN}")
            }
            Self::BufferFull => write!(f, "frame buffer full"),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Framing
// ───────────────────────────────────────────────────────────────

/// A checksum-verified packet borrowed from the inbound buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RpcPacket<'a> {
    pub command: u8,
    pub declared_len: u8,
    /// Bytes between the length byte and the checksum.
    pub payload: &'a [u8],
}

impl<'a> RpcPacket<'a> {
    /// Validate length and checksum, then split the packet.
    pub fn parse(packet: &'a [u8]) -> Result<Self, CodecError> {
        if packet.len() < MIN_PACKET_LEN {
            return Err(CodecError::TooShort { len: packet.len() });
        }
        if packet.len() > MAX_PACKET_LEN {
            return Err(CodecError::PayloadTooLong {
                len: packet.len() - MIN_PACKET_LEN,
            });
        }
        if !verify(packet) {
            return Err(CodecError::ChecksumMismatch {
                expected: checksum(packet),
                actual: packet[packet.len() - 1],
            });
        }

        let payload = &packet[2..packet.len() - 1];
        let declared_len = packet[1];
        if declared_len as usize != payload.len() {
            debug!(
                "codec: declared length {} differs from payload length {}",
                declared_len,
                payload.len()
            );
        }

        Ok(Self {
            command: packet[0],
            declared_len,
            payload,
        })
    }

    /// Iterate the length-prefixed string fields of the payload.
    pub fn fields(&self) -> StringFields<'a> {
        StringFields { rest: self.payload }
    }
}

/// Iterator over `(len, bytes)` string fields.
///
/// Yields `Err(Truncated)` once and then stops if a length byte points
/// past the end of the payload.
pub struct StringFields<'a> {
    rest: &'a [u8],
}

impl<'a> Iterator for StringFields<'a> {
    type Item = Result<&'a str, CodecError>;

    fn next(&mut self) -> Option<Self::Item> {
        let (&len, tail) = self.rest.split_first()?;
        let len = len as usize;
        if len > tail.len() {
            self.rest = &[];
            return Some(Err(CodecError::Truncated));
        }
        let (field, rest) = tail.split_at(len);
        self.rest = rest;
        Some(core::str::from_utf8(field).map_err(|_| CodecError::InvalidUtf8))
    }
}

// ───────────────────────────────────────────────────────────────
// Decoded requests
// ───────────────────────────────────────────────────────────────

/// Wi-Fi credentials carried by `SubmitCredentials`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub ssid: Field,
    pub password: Field,
}

impl Credentials {
    pub fn new(ssid: &str, password: &str) -> Result<Self, CodecError> {
        Ok(Self {
            ssid: to_field(ssid)?,
            password: to_field(password)?,
        })
    }
}

/// A well-formed inbound command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RpcRequest {
    SubmitCredentials(Credentials),
    Identify,
    /// Checksum-valid packet with an unrecognised command byte.
    Unknown(u8),
}

/// Decode an `rpc_command` write.
pub fn decode(packet: &[u8]) -> Result<RpcRequest, CodecError> {
    let packet = RpcPacket::parse(packet)?;

    match RpcCommand::try_from(packet.command) {
        Err(byte) => Ok(RpcRequest::Unknown(byte)),
        Ok(RpcCommand::Identify) => Ok(RpcRequest::Identify),
        Ok(RpcCommand::SubmitCredentials) => {
            let mut fields = packet.fields();
            let ssid = fields.next().ok_or(CodecError::Truncated)??;
            let password = fields.next().ok_or(CodecError::Truncated)??;
            Ok(RpcRequest::SubmitCredentials(Credentials::new(ssid, password)?))
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Encoding
// ───────────────────────────────────────────────────────────────

/// Encode `command` with zero or more string fields.
///
/// Fails with [`CodecError::PayloadTooLong`] instead of truncating when
/// the fields do not fit the one-byte length.
pub fn encode(command: u8, fields: &[&str]) -> Result<Frame, CodecError> {
    let payload_len: usize = fields.iter().map(|f| 1 + f.len()).sum();
    if payload_len > MAX_PAYLOAD_LEN {
        return Err(CodecError::PayloadTooLong { len: payload_len });
    }

    let mut frame = Frame::new();
    push(&mut frame, command)?;
    push(&mut frame, payload_len as u8)?;
    for field in fields {
        push(&mut frame, field.len() as u8)?;
        frame
            .extend_from_slice(field.as_bytes())
            .map_err(|()| CodecError::BufferFull)?;
    }
    // Checksum slot, then fill it in.
    push(&mut frame, 0)?;
    let sum = checksum(&frame);
    if let Some(slot) = frame.last_mut() {
        *slot = sum;
    }
    Ok(frame)
}

/// Encode an `rpc_result` for a known command.
pub fn encode_result(command: RpcCommand, fields: &[&str]) -> Result<Frame, CodecError> {
    encode(command.as_byte(), fields)
}

fn push(frame: &mut Frame, byte: u8) -> Result<(), CodecError> {
    frame.push(byte).map_err(|_| CodecError::BufferFull)
}

fn to_field(s: &str) -> Result<Field, CodecError> {
    Field::try_from(s).map_err(|()| CodecError::PayloadTooLong { len: s.len() })
}
