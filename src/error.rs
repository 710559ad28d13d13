//! Crate error types.
//!
//! Protocol failures (bad packets, unknown commands, refused
//! credentials) are *not* errors here: they are reported to the central
//! through [`ErrorState`](crate::protocol::types::ErrorState) and the
//! session keeps running. This enum covers the plumbing around the
//! engine. All variants are `Copy`.

use core::fmt;

use crate::protocol::codec::CodecError;
use crate::protocol::transport::TransportError;

/// Every fallible non-protocol operation funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A packet could not be encoded or decoded.
    Codec(CodecError),
    /// The GATT transport refused an operation.
    Transport(TransportError),
    /// Configuration is invalid.
    Config(&'static str),
    /// The event inbox is full; the event was not accepted.
    InboxFull,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Codec(e) => write!(f, "codec: {e}"),
            Self::Transport(e) => write!(f, "transport: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::InboxFull => write!(f, "event inbox full"),
        }
    }
}

impl std::error::Error for Error {}

impl From<CodecError> for Error {
    fn from(e: CodecError) -> Self {
        Self::Codec(e)
    }
}

impl From<TransportError> for Error {
    fn from(e: TransportError) -> Self {
        Self::Transport(e)
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
