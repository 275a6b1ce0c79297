use thiserror::Error;

use crate::application::to0::phase::SessionPhase;
use crate::core::cbor::CodecError;
use crate::domain::errors::MessageError;
use crate::domain::message::MsgType;
use crate::ports::crypto::CryptoError;

/// High-level errors surfaced by TO0 dispatch.
///
/// All handler faults propagate here uniformly — there is no internal
/// catch-and-continue; the only structured cleanup is the drop-based release
/// of the signing-key handle. The transport collaborator maps each class to a
/// wire-level ERROR and/or session teardown.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Malformed message content (wrong nonce length, too many fields,
    /// out-of-range integer). Detected before any crypto or storage effect.
    #[error(transparent)]
    Message(#[from] MessageError),

    /// Positional read or codec failure on the envelope.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Cryptographic operation failed. Fatal to the current message.
    #[error("crypto failure: {0}")]
    Crypto(#[from] CryptoError),

    /// The voucher has not been extended to the requesting owner: a
    /// recoverable business condition, but with no retry policy here — the
    /// caller decides whether to schedule a later attempt.
    #[error("voucher not extended to current owner")]
    KeyUnavailable,

    /// Message-type tag outside the protocol, or a tag this side never
    /// receives. Protocol desynchronization; the session cannot continue.
    #[error("unsupported message type tag: {0}")]
    Unsupported(u64),

    /// A legal message arrived in the wrong session phase.
    #[error("message {msg_type:?} not valid in phase {phase}")]
    OutOfOrder {
        phase: SessionPhase,
        msg_type: MsgType,
    },
}
