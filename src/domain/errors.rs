use thiserror::Error;

use crate::core::cbor::CodecError;
use crate::domain::message::MAX_WAIT_SECONDS;

/// ---- Domain error type (idiomatic, typed) ----
/// Captures semantic validation failures discovered while reading untrusted
/// message bodies, before any cryptographic or storage side effect.
#[derive(Debug, Error)]
pub enum MessageError {
    /// Generic field length mismatch (nonce and similar fixed-size fields).
    #[error("{field} length mismatch: expected {expected}, got {actual}")]
    LengthMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    /// ACCEPT_OWNER granted wait exceeded the protocol's unsigned 32-bit bound.
    #[error("invalid WaitSeconds: {value} exceeds {MAX_WAIT_SECONDS}")]
    WaitOutOfRange { value: u64 },

    /// Message-type tag outside the closed set of legal tags.
    #[error("unknown message type tag: {0}")]
    UnknownMsgType(u64),

    /// Positional read or shape check failed on a message body.
    #[error(transparent)]
    Codec(#[from] CodecError),
}
