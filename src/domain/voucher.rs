//! Ownership voucher view and the TO0D / TO1D payload builders.
//!
//! The engine treats the voucher as read-only input held by client storage:
//! it reads the header and ownership chain, and never persists or mutates it.
//! Accessors are positional and fallible, like every read of protocol data.

use crate::core::cbor::{CodecError, Composite};
use crate::domain::nonce::Nonce16;

/// Voucher field: header container.
pub const OV_HEADER: usize = 0;
/// Voucher field: header HMAC.
pub const OV_HMAC: usize = 1;
/// Voucher field: device certificate chain.
pub const OV_DEV_CERT_CHAIN: usize = 2;
/// Voucher field: ownership-transfer entry list.
pub const OV_ENTRIES: usize = 3;

/// Header field: protocol version.
pub const OVH_VERSION: usize = 0;
/// Header field: device GUID (16 bytes).
pub const OVH_GUID: usize = 1;
/// Header field: rendezvous info.
pub const OVH_RENDEZVOUS_INFO: usize = 2;
/// Header field: device info string.
pub const OVH_DEVICE_INFO: usize = 3;
/// Header field: manufacturer public key (encoded).
pub const OVH_PUB_KEY: usize = 4;

/// Entry field: hash of the previous entry.
pub const OVE_HASH_PREV: usize = 0;
/// Entry field: hash of header info.
pub const OVE_HASH_HDR_INFO: usize = 1;
/// Entry field: public key of the owner this entry transfers to (encoded).
pub const OVE_PUB_KEY: usize = 2;

/// TO0D field: the ownership voucher.
pub const TO0D_VOUCHER: usize = 0;
/// TO0D field: requested wait seconds.
pub const TO0D_WAIT_SECONDS: usize = 1;
/// TO0D field: the 16-byte signing nonce echoed from HELLO_ACK.
pub const TO0D_NONCE: usize = 2;

/// TO1D field: rendezvous redirect blob.
pub const TO1D_RV: usize = 0;
/// TO1D field: hash of the serialized TO0D this redirect commits to.
pub const TO1D_TO0D_HASH: usize = 1;

/// OWNER_SIGN body field: the TO0D payload.
pub const TO0_TO0D: usize = 0;
/// OWNER_SIGN body field: the signed TO1D blob.
pub const TO0_TO1D: usize = 1;

/// Read-only view over a device's chain-of-custody record.
///
/// Invariant: the header's public key determines the hash algorithm used for
/// every attestation derived from this voucher (hash strength must match key
/// strength); the current owner's key is derivable from the entry chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnershipVoucher(Composite);

impl OwnershipVoucher {
    /// Wrap a decoded voucher value. Accessors validate shape on read.
    #[must_use]
    pub fn from_composite(c: Composite) -> Self {
        OwnershipVoucher(c)
    }

    /// The underlying positional value, e.g. for embedding into TO0D.
    #[must_use]
    pub fn as_composite(&self) -> &Composite {
        &self.0
    }

    /// The voucher header.
    pub fn header(&self) -> Result<&Composite, CodecError> {
        self.0.get_composite(OV_HEADER)
    }

    /// Protocol version recorded in the header.
    pub fn protocol_version(&self) -> Result<u64, CodecError> {
        self.header()?.get_uint(OVH_VERSION)
    }

    /// Device GUID recorded in the header.
    pub fn guid(&self) -> Result<&[u8], CodecError> {
        self.header()?.get_bytes(OVH_GUID)
    }

    /// The manufacturer's encoded public key from the header.
    pub fn manufacturer_public_key(&self) -> Result<&Composite, CodecError> {
        self.header()?.get_composite(OVH_PUB_KEY)
    }

    /// The ownership-transfer entry list (possibly empty).
    pub fn entries(&self) -> Result<&Composite, CodecError> {
        self.0.get_composite(OV_ENTRIES)
    }
}

/// Build the TO0D payload: `[voucher, wait-seconds, nonce]`.
///
/// The serialized form of this exact value is what the TO1D hash commits to;
/// callers must hash `to0d(..).to_bytes()` and never a re-derived encoding.
#[must_use]
pub fn to0d(voucher: &OwnershipVoucher, wait_seconds: u32, nonce: &Nonce16) -> Composite {
    Composite::new_array()
        .set(TO0D_VOUCHER, voucher.as_composite().clone())
        .set(TO0D_WAIT_SECONDS, wait_seconds)
        .set(TO0D_NONCE, &nonce.as_bytes()[..])
}

/// Build the TO1D payload: `[redirect-blob, to0d-hash]`.
///
/// Binding the redirect to a hash of one specific TO0D is the flow's core
/// anti-tampering property: a signed redirect cannot be replayed against a
/// different TO0D.
#[must_use]
pub fn to1d_payload(redirect: Composite, to0d_hash: Composite) -> Composite {
    Composite::new_array()
        .set(TO1D_RV, redirect)
        .set(TO1D_TO0D_HASH, to0d_hash)
}
