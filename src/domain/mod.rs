/*
Domain types and invariants for the TO0 registration flow (no IO, no crypto).

This module is the single source of truth for the positional wire schema of
the TO0 exchange: the message envelope and tag set, the ownership-voucher
layout, the TO0D/TO1D payloads, and the fixed-size signing nonce.

Goals:
* Enforce wire-format invariants at the type level where practical
  (closed `MsgType` enum, fixed-size `Nonce16` newtype).
* Provide explicit, typed validation errors via [`errors::MessageError`] for
  semantic checks not encoded in the type system (field counts, bounds).
* Keep all secret material out; only public keys and opaque blobs appear
  here, so zeroization is not required for these types.
*/

pub mod errors;
pub mod message;
pub mod nonce;
pub mod voucher;

pub use errors::MessageError;
pub use message::*;
pub use nonce::*;
pub use voucher::*;
