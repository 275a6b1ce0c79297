//! Protocol message envelope: tag set and positional layout.

use crate::core::cbor::Composite;
use crate::domain::errors::MessageError;

/// Envelope field: message length (filled by the transport, 0 from the engine).
pub const SM_LENGTH: usize = 0;
/// Envelope field: numeric message-type tag.
pub const SM_MSG_ID: usize = 1;
/// Envelope field: protocol version.
pub const SM_PROTOCOL_VERSION: usize = 2;
/// Envelope field: opaque protocol info (empty byte string at handshake start).
pub const SM_PROTOCOL_INFO: usize = 3;
/// Envelope field: message body, shape dependent on the message type.
pub const SM_BODY: usize = 4;

/// First positional field of a message body.
pub const FIRST_FIELD: usize = 0;

/// Upper bound on every wait-seconds value carried by the protocol.
/// Values are later used to schedule re-registration; anything wider than
/// an unsigned 32-bit count would corrupt that scheduling.
pub const MAX_WAIT_SECONDS: u64 = u32::MAX as u64;

/// The closed set of legal TO0 message-type tags.
///
/// Dispatch is exhaustive pattern matching over this enum; wire input outside
/// the set is rejected when converting with [`MsgType::try_from`]. The
/// `Error` tag is the generic protocol-error tag shared across all flows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MsgType {
    /// TO0.Hello — session-initiating message from the owner.
    Hello = 20,
    /// TO0.HelloAck — rendezvous reply carrying the signing nonce.
    HelloAck = 21,
    /// TO0.OwnerSign — owner's signed registration attestation.
    OwnerSign = 22,
    /// TO0.AcceptOwner — rendezvous acceptance with the granted wait.
    AcceptOwner = 23,
    /// Generic protocol ERROR, shared across all protocol flows.
    Error = 255,
}

impl TryFrom<u64> for MsgType {
    type Error = MessageError;

    fn try_from(v: u64) -> Result<Self, MessageError> {
        match v {
            20 => Ok(Self::Hello),
            21 => Ok(Self::HelloAck),
            22 => Ok(Self::OwnerSign),
            23 => Ok(Self::AcceptOwner),
            255 => Ok(Self::Error),
            other => Err(MessageError::UnknownMsgType(other)),
        }
    }
}

impl From<MsgType> for u64 {
    fn from(m: MsgType) -> u64 {
        m as u64
    }
}

/// Build a complete message envelope around `body`.
///
/// The length field carries 0 (the transport fills it when framing) and the
/// protocol-info field an empty byte string, matching the handshake-start
/// envelope shape.
#[must_use]
pub fn envelope(msg_type: MsgType, protocol_version: u64, body: Composite) -> Composite {
    Composite::new_array()
        .set(SM_LENGTH, 0u32)
        .set(SM_MSG_ID, i64::from(msg_type as u8))
        .set(SM_PROTOCOL_VERSION, protocol_version as i64)
        .set(SM_PROTOCOL_INFO, Vec::<u8>::new())
        .set(SM_BODY, body)
}
