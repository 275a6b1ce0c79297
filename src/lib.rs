//! Crate root for `fdo-to0`.
//!
//! Protocol session engine for the FIDO Device Onboard TO0 flow: the
//! message dispatch/state-machine framework and the ownership-registration
//! client it drives, together with the positional value model, the
//! crypto/storage boundary ports, and an Ed25519 crypto adapter.
//!
//! High-level tree:
//! * `core::cbor` – positional `Composite` values and the canonical codec.
//! * `domain` – message envelope, tag set, voucher/TO0D/TO1D layout, nonce.
//! * `ports` – `CryptoPort` and `To0ClientStorage` capability traits.
//! * `application::to0` – the TO0 client state machine and dispatcher.
//! * `adapters::crypto` – Ed25519/SHA-2 implementation of `CryptoPort`.
//!
//! Transport (how encoded messages travel), persistence, and configuration
//! are external collaborators; this crate only meets them at the
//! `dispatch(request) -> (reply, completed)` and storage-port boundaries.

pub mod adapters;
pub mod application;
pub mod core;
pub mod domain;
pub mod ports;
#[doc(hidden)]
pub mod test_support;
