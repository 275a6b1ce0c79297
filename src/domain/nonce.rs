use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::errors::MessageError;

/// Byte length of the TO0 signing nonce.
pub const NONCE16_LEN: usize = 16;

/// 16-byte replay-resistance nonce carried in `HELLO_ACK` and echoed inside
/// the TO0D payload the owner signs over.
///
/// The rendezvous service samples this value per session; the owner only ever
/// *echoes* it, binding the signed attestation to this exact exchange.
///
/// Construction options:
/// - `Nonce16::random(rng)` for cryptographically strong randomness.
/// - `Nonce16::try_from(&[u8])` for fallible decoding/validation from a slice.
/// - `Nonce16::from([u8; 16])` zero-cost conversion from an owned array.
///
/// Invariants:
/// - Always exactly 16 bytes ([`NONCE16_LEN`]); the length check happens
///   before any cryptographic work on the enclosing message.
/// - Opaque: `Debug` redacts the inner value to avoid accidental logging of
///   raw session entropy.
///
/// # Examples
/// ```
/// use std::convert::TryFrom;
/// use fdo_to0::domain::nonce::Nonce16;
///
/// let n = Nonce16::try_from(&[1u8; 16][..]).unwrap();
/// assert_eq!(n.as_bytes()[0], 1);
/// // Error on wrong length
/// assert!(Nonce16::try_from(&[0u8; 15][..]).is_err());
/// ```
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Nonce16([u8; NONCE16_LEN]);

impl fmt::Debug for Nonce16 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Nonce16(..)")
    }
}

impl fmt::Display for Nonce16 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Redact full value; show first 4 bytes hex for trace correlation.
        for b in self.0.iter().take(4) {
            write!(f, "{b:02x}")?;
        }
        write!(f, "…")
    }
}

impl Nonce16 {
    /// Securely generate a random `Nonce16` using the provided CSPRNG.
    ///
    /// The caller supplies the RNG (dependency inversion for testability).
    #[must_use]
    pub fn random<R: rand_core::CryptoRng + rand_core::RngCore>(rng: &mut R) -> Self {
        let mut arr = [0u8; NONCE16_LEN];
        rng.fill_bytes(&mut arr);
        Nonce16(arr)
    }

    /// Access the inner byte array.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; NONCE16_LEN] {
        &self.0
    }
}

impl TryFrom<&[u8]> for Nonce16 {
    type Error = MessageError;

    /// Attempt to construct a `Nonce16` from a byte slice.
    ///
    /// # Errors
    /// Returns [`MessageError::LengthMismatch`] if the slice length is not
    /// [`NONCE16_LEN`].
    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        if value.len() != NONCE16_LEN {
            return Err(MessageError::LengthMismatch {
                field: "Nonce16",
                expected: NONCE16_LEN,
                actual: value.len(),
            });
        }
        let mut arr = [0u8; NONCE16_LEN];
        arr.copy_from_slice(value);
        Ok(Nonce16(arr))
    }
}

impl From<[u8; NONCE16_LEN]> for Nonce16 {
    /// Zero-cost conversion from an owned 16-byte array.
    fn from(value: [u8; NONCE16_LEN]) -> Self {
        Nonce16(value)
    }
}

impl AsRef<[u8]> for Nonce16 {
    /// Borrow the inner bytes as a slice (e.g., for serialization APIs).
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}
