//! Shared fixtures for unit and integration tests. Deterministic values
//! only; nothing here is suitable for production use.

use ed25519_dalek::SigningKey;

use crate::core::cbor::Composite;
use crate::domain::message::{envelope, MsgType};
use crate::domain::voucher::{
    OwnershipVoucher, OVE_HASH_HDR_INFO, OVE_HASH_PREV, OVE_PUB_KEY, OVH_DEVICE_INFO, OVH_GUID,
    OVH_PUB_KEY, OVH_RENDEZVOUS_INFO, OVH_VERSION, OV_DEV_CERT_CHAIN, OV_ENTRIES, OV_HEADER,
    OV_HMAC,
};
use crate::ports::crypto::{encode_public_key, KeyType, OwnerKeyHandle, PublicKey};
use crate::ports::storage::To0ClientStorage;

/// Protocol version used by all fixtures.
pub const TEST_PROTOCOL_VERSION: u64 = 101;

/// Deterministic owner signing seed (Ed25519).
#[must_use]
pub fn owner_seed() -> [u8; 32] {
    [7u8; 32]
}

/// Public key body matching [`owner_seed`].
#[must_use]
pub fn owner_public_body() -> [u8; 32] {
    SigningKey::from_bytes(&owner_seed()).verifying_key().to_bytes()
}

/// Deterministic manufacturer key body (a different Ed25519 key).
#[must_use]
pub fn mfg_public_body() -> [u8; 32] {
    SigningKey::from_bytes(&[3u8; 32]).verifying_key().to_bytes()
}

/// Redirect blob fixture: `[dns, port, token]`.
#[must_use]
pub fn mk_redirect() -> Composite {
    Composite::new_array()
        .set(0, "owner.example")
        .set(1, 8443u32)
        .set(2, &[0xEE; 8][..])
}

fn mk_header(mfg_key: Composite) -> Composite {
    Composite::new_array()
        .set(OVH_VERSION, TEST_PROTOCOL_VERSION as i64)
        .set(OVH_GUID, &[0x11; 16][..])
        .set(OVH_RENDEZVOUS_INFO, Composite::new_array().set(0, "rv.example"))
        .set(OVH_DEVICE_INFO, "demo-device")
        .set(OVH_PUB_KEY, mfg_key)
}

/// Voucher whose chain has been extended to the owner key fixture.
#[must_use]
pub fn mk_voucher_extended() -> OwnershipVoucher {
    let entry = Composite::new_array()
        .set(OVE_HASH_PREV, &[0x44; 32][..])
        .set(OVE_HASH_HDR_INFO, &[0x55; 32][..])
        .set(OVE_PUB_KEY, encode_public_key(KeyType::Ed25519, &owner_public_body()));
    OwnershipVoucher::from_composite(
        Composite::new_array()
            .set(OV_HEADER, mk_header(encode_public_key(KeyType::Ed25519, &mfg_public_body())))
            .set(OV_HMAC, &[0x33; 32][..])
            .set(OV_DEV_CERT_CHAIN, Vec::<u8>::new())
            .set(OV_ENTRIES, Composite::new_array().set(0, entry)),
    )
}

/// Voucher with an empty entry chain (owner key falls back to the header).
#[must_use]
pub fn mk_voucher_unextended() -> OwnershipVoucher {
    OwnershipVoucher::from_composite(
        Composite::new_array()
            .set(OV_HEADER, mk_header(encode_public_key(KeyType::Ed25519, &owner_public_body())))
            .set(OV_HMAC, &[0x33; 32][..])
            .set(OV_DEV_CERT_CHAIN, Vec::<u8>::new())
            .set(OV_ENTRIES, Composite::new_array()),
    )
}

/// HELLO_ACK envelope carrying `nonce` as its only body field.
#[must_use]
pub fn mk_hello_ack(nonce: &[u8]) -> Composite {
    envelope(
        MsgType::HelloAck,
        TEST_PROTOCOL_VERSION,
        Composite::new_array().set(0, nonce),
    )
}

/// ACCEPT_OWNER envelope with a single wait-seconds body field.
#[must_use]
pub fn mk_accept_owner(wait: i64) -> Composite {
    envelope(
        MsgType::AcceptOwner,
        TEST_PROTOCOL_VERSION,
        Composite::new_array().set(0, wait),
    )
}

/// Protocol ERROR envelope.
#[must_use]
pub fn mk_error() -> Composite {
    envelope(
        MsgType::Error,
        TEST_PROTOCOL_VERSION,
        Composite::new_array().set(0, 100u32).set(1, "rejected"),
    )
}

/// In-memory [`To0ClientStorage`] recording every lifecycle call.
///
/// `events` captures the exact callback order; `key_requests` counts
/// signing-key acquisitions so tests can assert no key was touched on early
/// rejection paths.
pub struct MemStorage {
    voucher: OwnershipVoucher,
    request_wait: u32,
    redirect: Composite,
    key_available: bool,
    /// Wait granted by ACCEPT_OWNER, once stored.
    pub response_wait: Option<u32>,
    /// Lifecycle callback names in invocation order.
    pub events: Vec<&'static str>,
    /// Number of `owner_signing_key` calls observed.
    pub key_requests: usize,
}

impl MemStorage {
    /// Storage around `voucher` with the fixture wait and redirect.
    #[must_use]
    pub fn new(voucher: OwnershipVoucher) -> Self {
        MemStorage {
            voucher,
            request_wait: 3600,
            redirect: mk_redirect(),
            key_available: true,
            response_wait: None,
            events: Vec::new(),
            key_requests: 0,
        }
    }

    /// Simulate a voucher whose owner key this deployment does not hold.
    #[must_use]
    pub fn without_owner_key(mut self) -> Self {
        self.key_available = false;
        self
    }
}

impl To0ClientStorage for MemStorage {
    fn starting(&mut self, _request: &Composite, _reply: &Composite) {
        self.events.push("starting");
    }

    fn started(&mut self, _request: &Composite, _reply: &Composite) {
        self.events.push("started");
    }

    fn continuing(&mut self, _request: &Composite, _reply: &Composite) {
        self.events.push("continuing");
    }

    fn completed(&mut self, _request: &Composite, _reply: &Composite) {
        self.events.push("completed");
    }

    fn failed(&mut self, _request: &Composite, _reply: &Composite) {
        self.events.push("failed");
    }

    fn voucher(&self) -> OwnershipVoucher {
        self.voucher.clone()
    }

    fn request_wait(&self) -> u32 {
        self.request_wait
    }

    fn redirect_blob(&self) -> Composite {
        self.redirect.clone()
    }

    fn owner_signing_key(&mut self, _owner_key: &PublicKey) -> Option<OwnerKeyHandle> {
        self.key_requests += 1;
        if self.key_available {
            Some(OwnerKeyHandle::new(KeyType::Ed25519, owner_seed().to_vec()))
        } else {
            None
        }
    }

    fn set_response_wait(&mut self, seconds: u32) {
        self.response_wait = Some(seconds);
    }
}
