// src/adapters/crypto/ed25519.rs
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use sha2::{Digest, Sha256, Sha384};

use crate::core::cbor::Composite;
use crate::domain::voucher::{OwnershipVoucher, OVE_PUB_KEY};
use crate::ports::crypto::{
    CoseAlg, CryptoError, CryptoPort, Hash, HashAlg, KeyType, OwnerKeyHandle, PublicKey,
    PK_BODY, PK_ENC, PK_TYPE, SIG_ALG, SIG_PAYLOAD, SIG_SIGNATURE,
};

/// Concrete [`CryptoPort`] for deployments whose owner keys are Ed25519.
///
/// Decoding and hash-type selection cover all three key types so vouchers
/// whose *manufacturer* key is an EC key still hash correctly; only the
/// signing operation is Ed25519-specific and reports
/// [`CryptoError::UnsupportedKeyType`] for EC handles.
///
/// Error mapping:
/// - structural key problems → [`CryptoError::MalformedKey`]
/// - wrong-size or wrong-type secret handles → [`CryptoError::InvalidHandle`]
///   / [`CryptoError::UnsupportedKeyType`]
///
/// No key material is logged or retained; the signing key is rebuilt from the
/// scoped handle for the duration of one call.
pub struct Ed25519Crypto;

fn expected_body_len(key_type: KeyType) -> usize {
    match key_type {
        // Uncompressed SEC1 points.
        KeyType::Secp256r1 => 65,
        KeyType::Secp384r1 => 97,
        KeyType::Ed25519 => 32,
    }
}

impl CryptoPort for Ed25519Crypto {
    fn decode(&self, encoded: &Composite) -> Result<PublicKey, CryptoError> {
        let key_type = KeyType::from_wire_id(encoded.get_uint(PK_TYPE)?)?;
        // Encoding id is carried for wire fidelity; body validation below is
        // what actually gates use.
        let _enc = encoded.get_uint(PK_ENC)?;
        let body = encoded.get_bytes(PK_BODY)?;

        let expected = expected_body_len(key_type);
        if body.len() != expected {
            return Err(CryptoError::MalformedKey(format!(
                "{key_type:?} body must be {expected} bytes, got {}",
                body.len()
            )));
        }
        if key_type == KeyType::Ed25519 {
            let mut arr = [0u8; 32];
            arr.copy_from_slice(body);
            VerifyingKey::from_bytes(&arr)
                .map_err(|e| CryptoError::MalformedKey(format!("ed25519 point: {e}")))?;
        }
        Ok(PublicKey {
            key_type,
            body: body.to_vec(),
        })
    }

    fn compatible_hash_type(&self, key: &PublicKey) -> HashAlg {
        match key.key_type {
            KeyType::Secp384r1 => HashAlg::Sha384,
            KeyType::Secp256r1 | KeyType::Ed25519 => HashAlg::Sha256,
        }
    }

    fn hash(&self, alg: HashAlg, bytes: &[u8]) -> Result<Hash, CryptoError> {
        let value = match alg {
            HashAlg::Sha256 => Sha256::digest(bytes).to_vec(),
            HashAlg::Sha384 => Sha384::digest(bytes).to_vec(),
        };
        Ok(Hash { alg, value })
    }

    fn cose_algorithm(&self, key: &PublicKey) -> CoseAlg {
        match key.key_type {
            KeyType::Secp256r1 => CoseAlg::Es256,
            KeyType::Secp384r1 => CoseAlg::Es384,
            KeyType::Ed25519 => CoseAlg::EdDsa,
        }
    }

    fn sign(
        &self,
        key: &OwnerKeyHandle,
        payload: &[u8],
        alg: CoseAlg,
    ) -> Result<Composite, CryptoError> {
        if key.key_type() != KeyType::Ed25519 {
            return Err(CryptoError::UnsupportedKeyType(key.key_type().wire_id()));
        }
        let seed: [u8; 32] = key
            .expose_secret()
            .try_into()
            .map_err(|_| CryptoError::InvalidHandle)?;
        let signing = SigningKey::from_bytes(&seed);
        let sig = signing.sign(payload);
        Ok(Composite::new_array()
            .set(SIG_ALG, alg.wire_id())
            .set(SIG_PAYLOAD, payload)
            .set(SIG_SIGNATURE, &sig.to_bytes()[..]))
    }

    fn owner_public_key(&self, voucher: &OwnershipVoucher) -> Result<Composite, CryptoError> {
        let entries = voucher.entries()?;
        if entries.is_empty() {
            // Chain never extended: the manufacturer still owns the device.
            return Ok(voucher.manufacturer_public_key()?.clone());
        }
        let last = entries.get_composite(entries.len() - 1)?;
        Ok(last.get_composite(OVE_PUB_KEY)?.clone())
    }
}

impl Ed25519Crypto {
    /// Verify a signed blob `[alg, payload, signature]` against an Ed25519
    /// public key. Used by the rendezvous side and by tests.
    ///
    /// # Errors
    /// Structural errors on the blob or key; [`CryptoError::Signing`] when
    /// the signature does not verify.
    pub fn verify(&self, blob: &Composite, key: &PublicKey) -> Result<(), CryptoError> {
        if key.key_type != KeyType::Ed25519 {
            return Err(CryptoError::UnsupportedKeyType(key.key_type.wire_id()));
        }
        let _alg = blob.get_int(SIG_ALG)?;
        let payload = blob.get_bytes(SIG_PAYLOAD)?;
        let sig_bytes = blob.get_bytes(SIG_SIGNATURE)?;

        let arr: [u8; 32] = key
            .body
            .as_slice()
            .try_into()
            .map_err(|_| CryptoError::MalformedKey("ed25519 body must be 32 bytes".into()))?;
        let verifying = VerifyingKey::from_bytes(&arr)
            .map_err(|e| CryptoError::MalformedKey(format!("ed25519 point: {e}")))?;
        let sig_arr: [u8; 64] = sig_bytes
            .try_into()
            .map_err(|_| CryptoError::Signing("signature must be 64 bytes".into()))?;
        verifying
            .verify(payload, &Signature::from_bytes(&sig_arr))
            .map_err(|e| CryptoError::Signing(e.to_string()))
    }
}
