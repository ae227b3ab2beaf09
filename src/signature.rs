//! secp256k1 ECDSA signing with public-key recovery
//!
//! The wire signature is the 65-byte compact form `r[32] ‖ s[32] ‖
//! recovery_id[1]` with `recovery_id ∈ {0, 1}` — not the Ethereum
//! `{27, 28}` convention.

use k256::ecdsa::{RecoveryId, Signature as K256Signature, SigningKey, VerifyingKey};

use crate::error::CodecError;

/// A 65-byte compact secp256k1 signature with recovery id
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct RecoverableSignature {
    /// r component
    pub r: [u8; 32],
    /// s component
    pub s: [u8; 32],
    /// recovery id, 0 or 1
    pub recovery_id: u8,
}

impl std::fmt::Debug for RecoverableSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecoverableSignature")
            .field("r", &hex::encode(self.r))
            .field("s", &hex::encode(self.s))
            .field("recovery_id", &self.recovery_id)
            .finish()
    }
}

impl RecoverableSignature {
    /// Length of the wire encoding
    pub const LEN: usize = 65;

    /// Encode as `r ‖ s ‖ recovery_id`
    pub fn to_bytes(&self) -> [u8; Self::LEN] {
        let mut out = [0u8; Self::LEN];
        out[..32].copy_from_slice(&self.r);
        out[32..64].copy_from_slice(&self.s);
        out[64] = self.recovery_id;
        out
    }

    /// Decode from `r ‖ s ‖ recovery_id`
    pub fn from_bytes(bytes: &[u8; Self::LEN]) -> Self {
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..64]);
        RecoverableSignature {
            r,
            s,
            recovery_id: bytes[64],
        }
    }
}

/// Sign a 32-byte digest with a 32-byte secp256k1 private key, producing a
/// compact signature plus recovery id
pub fn sign(digest: &[u8; 32], priv_key: &[u8; 32]) -> Result<RecoverableSignature, CodecError> {
    let signing_key = SigningKey::from_slice(priv_key)
        .map_err(|e| CodecError::InvalidParameters(format!("invalid private key: {e}")))?;

    let (signature, recovery_id) = signing_key
        .sign_prehash_recoverable(digest)
        .map_err(|e| CodecError::InvalidParameters(format!("signing failed: {e}")))?;

    let r: [u8; 32] = signature.r().to_bytes().into();
    let s: [u8; 32] = signature.s().to_bytes().into();

    Ok(RecoverableSignature {
        r,
        s,
        recovery_id: recovery_id.to_byte(),
    })
}

/// Recover the 65-byte uncompressed public key from a signature and digest.
///
/// Returns `Err` only when the recovery id is out of range or the math
/// yields a point at infinity; callers that want the non-fatal "decode the
/// payload anyway" behavior described by the codec (`SignatureRecoveryFailed`
/// is not a hard error) should turn this `Err` into `None` rather than
/// propagate it.
pub fn recover_public_key(
    digest: &[u8; 32],
    sig: &RecoverableSignature,
) -> Result<[u8; 65], CodecError> {
    let r: k256::FieldBytes = sig.r.into();
    let s: k256::FieldBytes = sig.s.into();
    let k256_sig = K256Signature::from_scalars(r, s)
        .map_err(|e| CodecError::MalformedEnvelope(format!("invalid signature scalars: {e}")))?;

    let recovery_id = RecoveryId::try_from(sig.recovery_id)
        .map_err(|_| CodecError::MalformedEnvelope("recovery id out of range".into()))?;

    let verifying_key = VerifyingKey::recover_from_prehash(digest, &k256_sig, recovery_id)
        .map_err(|e| CodecError::MalformedEnvelope(format!("public key recovery failed: {e}")))?;

    let encoded = verifying_key.to_encoded_point(false);
    let mut out = [0u8; 65];
    out.copy_from_slice(encoded.as_bytes());
    Ok(out)
}

/// Derive the 65-byte uncompressed public key for a private key
pub fn derive_public_key(priv_key: &[u8; 32]) -> Result<[u8; 65], CodecError> {
    let signing_key = SigningKey::from_slice(priv_key)
        .map_err(|e| CodecError::InvalidParameters(format!("invalid private key: {e}")))?;
    let encoded = signing_key.verifying_key().to_encoded_point(false);
    let mut out = [0u8; 65];
    out.copy_from_slice(encoded.as_bytes());
    Ok(out)
}
