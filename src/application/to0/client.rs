//! TO0 client orchestration: the owner side of ownership registration.
//!
//! Coordinates the three-message exchange with a rendezvous service,
//! consulting client storage for durable data and the crypto port for
//! transforms, and bracketing every handler with the storage lifecycle
//! hooks.
//!
//! Boundaries reminder:
//! - **`core::cbor`**: positional values and canonical bytes, no protocol
//!   knowledge.
//! - **`domain`**: message/voucher layout + invariants, no IO or crypto.
//! - **`ports`**: capability contracts this client consumes.
//! - this file: orchestrates the flow, checks the session phase, calls the
//!   ports, and advances phases. Synchronous and single-threaded per
//!   session; concurrent sessions share no mutable state.

use tracing::{debug, error};

use crate::application::to0::errors::DispatchError;
use crate::application::to0::phase::SessionPhase;
use crate::core::cbor::Composite;
use crate::domain::message::{envelope, MsgType, FIRST_FIELD, SM_BODY, SM_MSG_ID};
use crate::domain::nonce::Nonce16;
use crate::domain::voucher::{to0d, to1d_payload, TO0_TO0D, TO0_TO1D};
use crate::domain::MessageError;
use crate::ports::crypto::CryptoPort;
use crate::ports::storage::To0ClientStorage;

/// Outcome of one dispatch step.
#[derive(Debug)]
pub struct DispatchResult {
    /// Reply message to hand to the transport (may be an empty value on the
    /// terminal legs).
    pub reply: Composite,
    /// True when the session reached its terminal outcome and no further
    /// messages are expected.
    pub completed: bool,
}

/// TO0 client state machine.
///
/// Both capabilities are injected at construction; the client owns one
/// session's ephemeral state (its [`SessionPhase`]) and nothing durable.
pub struct To0Client<S, C> {
    storage: S,
    crypto: C,
    phase: SessionPhase,
}

impl<S: To0ClientStorage, C: CryptoPort> To0Client<S, C> {
    /// Create a client for one registration session.
    pub fn new(storage: S, crypto: C) -> Self {
        To0Client {
            storage,
            crypto,
            phase: SessionPhase::Init,
        }
    }

    /// Current session phase.
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Borrow the injected storage (inspection, tests).
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Consume the client, returning the storage.
    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Construct the session-initiating HELLO, independent of any inbound
    /// request. No cryptographic work happens here.
    ///
    /// # Errors
    /// Fails when invoked outside the `Init` phase or when the voucher
    /// header cannot be read.
    pub fn hello_message(&mut self) -> Result<DispatchResult, DispatchError> {
        if self.phase != SessionPhase::Init {
            return Err(DispatchError::OutOfOrder {
                phase: self.phase,
                msg_type: MsgType::Hello,
            });
        }
        let voucher = self.storage.voucher();
        let version = voucher.protocol_version()?;

        let empty = Composite::new_array();
        self.storage.starting(&empty, &empty);
        let hello = envelope(MsgType::Hello, version, Composite::new_array());
        self.storage.started(&empty, &hello);

        self.phase = SessionPhase::HelloSent;
        debug!(version, "TO0 hello emitted");
        Ok(DispatchResult {
            reply: hello,
            completed: false,
        })
    }

    /// Route an inbound message to its handler by message-type tag.
    ///
    /// Exactly one handler runs per call; any handler fault propagates as a
    /// dispatch fault and marks the session failed. An unrecognized tag is
    /// fatal and non-recoverable — the protocol has no "ignore unknown
    /// message" mode.
    ///
    /// # Errors
    /// See [`DispatchError`]; no reply is produced on error.
    pub fn dispatch(&mut self, request: &Composite) -> Result<DispatchResult, DispatchError> {
        let tag = request.get_uint(SM_MSG_ID)?;
        let msg_type =
            MsgType::try_from(tag).map_err(|_| DispatchError::Unsupported(tag))?;
        debug!(tag, phase = %self.phase, "dispatching TO0 message");

        let out = match msg_type {
            MsgType::HelloAck => self.do_hello_ack(request).map(|reply| DispatchResult {
                reply,
                completed: false,
            }),
            MsgType::AcceptOwner => self.do_accept_owner(request).map(|reply| DispatchResult {
                reply,
                completed: true,
            }),
            MsgType::Error => self.do_error(request).map(|reply| DispatchResult {
                reply,
                completed: true,
            }),
            // Outbound-only tags are never legal inbound.
            MsgType::Hello | MsgType::OwnerSign => Err(DispatchError::Unsupported(tag)),
        };

        if out.is_err() && !self.phase.is_terminal() {
            self.phase = SessionPhase::Failed;
        }
        out
    }

    /// Byte-level variant of [`To0Client::hello_message`] for transports
    /// that deal in encoded frames.
    ///
    /// # Errors
    /// As `hello_message`, plus serialization failures.
    pub fn hello_bytes(&mut self) -> Result<Vec<u8>, DispatchError> {
        let out = self.hello_message()?;
        Ok(out.reply.to_bytes()?)
    }

    /// Byte-level variant of [`To0Client::dispatch`]: decode, route, encode.
    ///
    /// Returns the encoded reply and the session-completion flag.
    ///
    /// # Errors
    /// Codec errors on non-canonical or malformed input, plus everything
    /// `dispatch` reports.
    pub fn dispatch_bytes(&mut self, request: &[u8]) -> Result<(Vec<u8>, bool), DispatchError> {
        let decoded = Composite::from_bytes(request)?;
        let out = self.dispatch(&decoded)?;
        Ok((out.reply.to_bytes()?, out.completed))
    }

    /// HELLO_ACK: build and sign the ownership-transfer attestation.
    ///
    /// The nonce length check runs before any cryptographic work; the
    /// TO0D hash uses the algorithm matched to the *manufacturer* key while
    /// the signature algorithm follows the *owner* key — deliberate protocol
    /// policy, preserved exactly.
    fn do_hello_ack(&mut self, request: &Composite) -> Result<Composite, DispatchError> {
        if self.phase != SessionPhase::HelloSent {
            return Err(DispatchError::OutOfOrder {
                phase: self.phase,
                msg_type: MsgType::HelloAck,
            });
        }
        let pending = Composite::new_array();
        self.storage.starting(request, &pending);

        let body = request.get_composite(SM_BODY)?;
        let nonce = Nonce16::try_from(body.get_bytes(FIRST_FIELD)?)?;

        let voucher = self.storage.voucher();
        let to0d = to0d(&voucher, self.storage.request_wait(), &nonce);

        let mfg_key = self.crypto.decode(voucher.manufacturer_public_key()?)?;
        let hash_alg = self.crypto.compatible_hash_type(&mfg_key);
        let to0d_hash = self.crypto.hash(hash_alg, &to0d.to_bytes()?)?;
        let to1d = to1d_payload(self.storage.redirect_blob(), to0d_hash.to_composite());

        let owner_encoded = self.crypto.owner_public_key(&voucher)?;
        let owner_key = self.crypto.decode(&owner_encoded)?;
        let signed = {
            // Handle is scoped to the sign call; zeroized on drop on every
            // exit path, including the failure returns below.
            let Some(handle) = self.storage.owner_signing_key(&owner_key) else {
                error!("voucher not extended to current owner");
                return Err(DispatchError::KeyUnavailable);
            };
            self.crypto.sign(
                &handle,
                &to1d.to_bytes()?,
                self.crypto.cose_algorithm(&owner_key),
            )?
        };

        let owner_sign = Composite::new_array()
            .set(TO0_TO0D, to0d)
            .set(TO0_TO1D, signed);
        let reply = envelope(MsgType::OwnerSign, voucher.protocol_version()?, owner_sign);

        self.storage.started(request, &reply);
        self.phase = SessionPhase::OwnerSignSent;
        Ok(reply)
    }

    /// ACCEPT_OWNER: record the granted wait and finish the session.
    ///
    /// Shape check before read: the body carries at most one field, and the
    /// granted wait must fit an unsigned 32-bit count before storage sees it.
    fn do_accept_owner(&mut self, request: &Composite) -> Result<Composite, DispatchError> {
        if self.phase != SessionPhase::OwnerSignSent {
            return Err(DispatchError::OutOfOrder {
                phase: self.phase,
                msg_type: MsgType::AcceptOwner,
            });
        }
        let pending = Composite::new_array();
        self.storage.continuing(request, &pending);

        let body = request.get_composite(SM_BODY)?;
        body.verify_max_index(FIRST_FIELD)?;
        let value = body.get_uint(FIRST_FIELD)?;
        let wait = u32::try_from(value)
            .map_err(|_| MessageError::WaitOutOfRange { value })?;
        self.storage.set_response_wait(wait);

        let reply = Composite::new_array();
        self.storage.completed(request, &reply);
        self.phase = SessionPhase::Done;
        debug!(wait, "TO0 registration accepted");
        Ok(reply)
    }

    /// Protocol ERROR from the peer: clear the reply, mark the session
    /// failed.
    fn do_error(&mut self, request: &Composite) -> Result<Composite, DispatchError> {
        if self.phase.is_terminal() {
            return Err(DispatchError::OutOfOrder {
                phase: self.phase,
                msg_type: MsgType::Error,
            });
        }
        let reply = Composite::new_array();
        self.storage.failed(request, &reply);
        self.phase = SessionPhase::Failed;
        Ok(reply)
    }
}
