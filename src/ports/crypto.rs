// src/ports/crypto.rs
use std::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::core::cbor::{CodecError, Composite};
use crate::domain::voucher::OwnershipVoucher;

/// Encoded public key field: key type id.
pub const PK_TYPE: usize = 0;
/// Encoded public key field: body encoding id.
pub const PK_ENC: usize = 1;
/// Encoded public key field: key body bytes.
pub const PK_BODY: usize = 2;

/// Body encoding id for raw/X.509 subject-public-key bytes.
pub const PK_ENC_X509: u32 = 1;

/// Signed blob field: COSE algorithm id (signed integer).
pub const SIG_ALG: usize = 0;
/// Signed blob field: the exact payload bytes that were signed.
pub const SIG_PAYLOAD: usize = 1;
/// Signed blob field: signature bytes.
pub const SIG_SIGNATURE: usize = 2;

/// Public key types legal in voucher and entry key fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyType {
    /// NIST P-256 (wire id 10).
    Secp256r1,
    /// NIST P-384 (wire id 11).
    Secp384r1,
    /// Ed25519 (wire id 13).
    Ed25519,
}

impl KeyType {
    /// Numeric id carried in encoded public key composites.
    #[must_use]
    pub const fn wire_id(self) -> u64 {
        match self {
            KeyType::Secp256r1 => 10,
            KeyType::Secp384r1 => 11,
            KeyType::Ed25519 => 13,
        }
    }

    /// Parse a wire id back into a key type.
    ///
    /// # Errors
    /// Returns [`CryptoError::UnsupportedKeyType`] for ids outside the set.
    pub fn from_wire_id(id: u64) -> Result<Self, CryptoError> {
        match id {
            10 => Ok(KeyType::Secp256r1),
            11 => Ok(KeyType::Secp384r1),
            13 => Ok(KeyType::Ed25519),
            other => Err(CryptoError::UnsupportedKeyType(other)),
        }
    }
}

/// Hash algorithms selectable by key-strength policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlg {
    /// SHA-256 (wire id 8).
    Sha256,
    /// SHA-384 (wire id 14).
    Sha384,
}

impl HashAlg {
    /// Numeric id carried in hash composites.
    #[must_use]
    pub const fn wire_id(self) -> u64 {
        match self {
            HashAlg::Sha256 => 8,
            HashAlg::Sha384 => 14,
        }
    }
}

/// COSE signature-algorithm identifiers for output encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoseAlg {
    /// ECDSA w/ SHA-256 (-7).
    Es256,
    /// ECDSA w/ SHA-384 (-35).
    Es384,
    /// EdDSA (-8).
    EdDsa,
}

impl CoseAlg {
    /// Numeric COSE id (negative, per the COSE registry).
    #[must_use]
    pub const fn wire_id(self) -> i64 {
        match self {
            CoseAlg::Es256 => -7,
            CoseAlg::Es384 => -35,
            CoseAlg::EdDsa => -8,
        }
    }
}

/// A decoded public key: validated type plus raw body bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey {
    /// Key type recovered from the encoded form.
    pub key_type: KeyType,
    /// Raw key body (uncompressed EC point or Ed25519 key bytes).
    pub body: Vec<u8>,
}

/// A computed hash value, tagged with its algorithm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hash {
    /// Algorithm that produced `value`.
    pub alg: HashAlg,
    /// Digest bytes.
    pub value: Vec<u8>,
}

impl Hash {
    /// Wire form: `[alg-id, digest-bytes]`.
    #[must_use]
    pub fn to_composite(&self) -> Composite {
        Composite::new_array()
            .set(0, self.alg.wire_id() as i64)
            .set(1, self.value.clone())
    }
}

/// Scoped signing-key handle obtained from client storage for exactly one
/// sign operation.
///
/// Release is paired with acquisition by the drop mechanism: the secret bytes
/// are zeroized when the handle goes out of scope, on every exit path
/// including fault paths. This is a hard security requirement — there is no
/// explicit close call to forget.
///
/// Invariants:
/// - `Debug` redacts the secret; never log or persist the inner bytes.
/// - The handle is single-use in spirit: acquire immediately before signing,
///   let it drop immediately after.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct OwnerKeyHandle {
    #[zeroize(skip)]
    key_type: KeyType,
    secret: Vec<u8>,
}

impl OwnerKeyHandle {
    /// Wrap secret key bytes of the given type.
    #[must_use]
    pub fn new(key_type: KeyType, secret: Vec<u8>) -> Self {
        OwnerKeyHandle { key_type, secret }
    }

    /// Type of the wrapped key.
    #[must_use]
    pub fn key_type(&self) -> KeyType {
        self.key_type
    }

    /// Borrow the secret bytes for a sign operation.
    ///
    /// Callers must not copy these bytes into longer-lived storage and must
    /// not log them.
    #[must_use]
    pub fn expose_secret(&self) -> &[u8] {
        &self.secret
    }
}

impl fmt::Debug for OwnerKeyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OwnerKeyHandle({:?}, ..)", self.key_type)
    }
}

/// Errors from cryptographic operations. Always fatal to the current message;
/// never retried inside the engine.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// Encoded key failed structural validation.
    #[error("malformed public key: {0}")]
    MalformedKey(String),

    /// Key type id outside the supported set.
    #[error("unsupported key type id: {0}")]
    UnsupportedKeyType(u64),

    /// The key handle does not match what the operation requires.
    #[error("invalid signing key handle")]
    InvalidHandle,

    /// Underlying signing primitive failed.
    #[error("signing failed: {0}")]
    Signing(String),

    /// Positional read failed while walking key or voucher structures.
    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Stateless cryptographic capability consumed by the TO0 engine.
///
/// Every operation is pure given its inputs. Isolating these behind a narrow
/// trait lets the handshake logic be written and tested without real key
/// material — substitute a deterministic implementation in tests.
///
/// Implementations MUST NOT log, persist, or retain key material passed to
/// [`CryptoPort::sign`].
pub trait CryptoPort {
    /// Decode an encoded public key composite `[type, enc, body]`.
    ///
    /// # Errors
    /// Key-format errors on malformed input; shape errors on bad composites.
    fn decode(&self, encoded: &Composite) -> Result<PublicKey, CryptoError>;

    /// Select the hash algorithm whose strength matches `key`.
    ///
    /// Pure policy function of the key type: stronger keys require stronger
    /// hashes (P-384 → SHA-384, the 128-bit-strength types → SHA-256).
    fn compatible_hash_type(&self, key: &PublicKey) -> HashAlg;

    /// Hash `bytes` with `alg`. Deterministic, no side effects.
    ///
    /// # Errors
    /// Only on internal primitive failure.
    fn hash(&self, alg: HashAlg, bytes: &[u8]) -> Result<Hash, CryptoError>;

    /// Map a key to the COSE signature-algorithm id used when encoding blobs
    /// signed by that key.
    fn cose_algorithm(&self, key: &PublicKey) -> CoseAlg;

    /// Sign `payload` with the scoped key handle, producing the signed blob
    /// `[alg, payload, signature]`.
    ///
    /// # Errors
    /// [`CryptoError::InvalidHandle`] if the handle does not carry usable key
    /// material; [`CryptoError::Signing`] on primitive failure.
    fn sign(
        &self,
        key: &OwnerKeyHandle,
        payload: &[u8],
        alg: CoseAlg,
    ) -> Result<Composite, CryptoError>;

    /// Derive the current owner's *encoded* public key from the voucher:
    /// the key of the last ownership-transfer entry, or the manufacturer key
    /// when the chain is empty.
    ///
    /// # Errors
    /// Shape errors if the voucher's chain is structurally invalid.
    fn owner_public_key(&self, voucher: &OwnershipVoucher) -> Result<Composite, CryptoError>;
}

/// Build the encoded form `[type, enc, body]` of a public key.
#[must_use]
pub fn encode_public_key(key_type: KeyType, body: &[u8]) -> Composite {
    Composite::new_array()
        .set(PK_TYPE, key_type.wire_id() as i64)
        .set(PK_ENC, PK_ENC_X509)
        .set(PK_BODY, body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_ids_round_trip() {
        for kt in [KeyType::Secp256r1, KeyType::Secp384r1, KeyType::Ed25519] {
            assert_eq!(KeyType::from_wire_id(kt.wire_id()).unwrap(), kt);
        }
        assert!(matches!(
            KeyType::from_wire_id(1),
            Err(CryptoError::UnsupportedKeyType(1))
        ));
    }

    #[test]
    fn cose_ids_match_registry() {
        assert_eq!(CoseAlg::Es256.wire_id(), -7);
        assert_eq!(CoseAlg::Es384.wire_id(), -35);
        assert_eq!(CoseAlg::EdDsa.wire_id(), -8);
    }

    #[test]
    fn hash_composite_layout() {
        let h = Hash {
            alg: HashAlg::Sha384,
            value: vec![1, 2, 3],
        };
        let c = h.to_composite();
        assert_eq!(c.get_uint(0).unwrap(), 14);
        assert_eq!(c.get_bytes(1).unwrap(), &[1, 2, 3]);
    }

    #[test]
    fn key_handle_debug_redacts_secret() {
        let h = OwnerKeyHandle::new(KeyType::Ed25519, vec![0xAA; 32]);
        let dbg = format!("{h:?}");
        assert!(!dbg.contains("170"), "secret leaked into Debug: {dbg}");
        assert!(dbg.contains("Ed25519"));
    }

    #[test]
    fn encoded_key_layout() {
        let c = encode_public_key(KeyType::Secp384r1, &[7u8; 97]);
        assert_eq!(c.get_uint(PK_TYPE).unwrap(), 11);
        assert_eq!(c.get_uint(PK_ENC).unwrap(), u64::from(PK_ENC_X509));
        assert_eq!(c.get_bytes(PK_BODY).unwrap().len(), 97);
    }
}
