//! Client-storage boundary port consumed by the TO0 engine.
//!
//! A deployment implements this trait to supply voucher material, signing
//! keys, and session-lifecycle hooks (durable session bookkeeping, auditing).
//! The engine calls it, never the reverse, and it issues no persistence calls
//! of its own.

use crate::core::cbor::Composite;
use crate::domain::voucher::OwnershipVoucher;
use crate::ports::crypto::{OwnerKeyHandle, PublicKey};

/// Capability interface a deployment implements for the TO0 client flow.
///
/// Lifecycle contract — the engine brackets every handler invocation and
/// calls each hook exactly once, in order, per session phase:
/// - non-terminal legs: `starting(request, reply)` → handler logic →
///   `started(request, reply)`;
/// - the terminal leg: `continuing` → handler logic → `completed`, or
///   `failed` when the peer reports a protocol error.
///
/// Hooks observe the request and the reply as built so far; the engine does
/// not interpret their effects. A transport tearing down a stalled session
/// should invoke `failed` itself to finalize bookkeeping.
///
/// Data accessors return the durable material the protocol signs over; the
/// engine treats all of it as read-only input.
pub trait To0ClientStorage {
    /// A non-terminal handler is about to run.
    fn starting(&mut self, request: &Composite, reply: &Composite);

    /// A non-terminal handler finished; `reply` is the message to send.
    fn started(&mut self, request: &Composite, reply: &Composite);

    /// The terminal handler is about to run.
    fn continuing(&mut self, request: &Composite, reply: &Composite);

    /// The session reached its successful terminal outcome.
    fn completed(&mut self, request: &Composite, reply: &Composite);

    /// The session reached a failed terminal outcome.
    fn failed(&mut self, request: &Composite, reply: &Composite);

    /// The ownership voucher this session registers.
    fn voucher(&self) -> OwnershipVoucher;

    /// Wait duration (seconds) the owner requests from the rendezvous
    /// service.
    fn request_wait(&self) -> u32;

    /// The TO1D rendezvous-redirect blob the owner commits to.
    fn redirect_blob(&self) -> Composite;

    /// Scoped signing-key handle for the resolved owner public key, or
    /// `None` when the voucher has not been extended to this owner — a
    /// normal, expected outcome for that voucher state, not a crash.
    fn owner_signing_key(&mut self, owner_key: &PublicKey) -> Option<OwnerKeyHandle>;

    /// Record the wait granted by ACCEPT_OWNER (drives re-registration
    /// scheduling; the engine bounds-checks before calling).
    fn set_response_wait(&mut self, seconds: u32);
}
