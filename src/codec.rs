//! Public façade: compose clear framing with exactly one outer-encryption
//! scheme

use tracing::{debug, instrument, warn};

use crate::asymmetric::{decrypt_asymmetric, encrypt_asymmetric};
use crate::envelope::{clear_decode, clear_encode, ClearDecoded, Signature};
use crate::error::CodecError;
use crate::symmetric::{decrypt_symmetric, encrypt_symmetric};

/// Options accepted by [`encode`]
#[derive(Default)]
pub struct EncodeOptions<'a> {
    /// When set, the envelope is signed and the signature is returned
    /// alongside the encoded bytes
    pub sig_priv_key: Option<&'a [u8; 32]>,
    /// Selects ECIES outer encryption. Exactly one of this and `sym_key`
    /// must be set.
    pub asym_pub_key: Option<&'a [u8; 65]>,
    /// Selects AES-256-GCM outer encryption. Exactly one of this and
    /// `asym_pub_key` must be set.
    pub sym_key: Option<&'a [u8; 32]>,
}

/// Options accepted by [`decode`]
#[derive(Default)]
pub struct DecodeOptions<'a> {
    /// Decrypts ECIES outer encryption
    pub asym_priv_key: Option<&'a [u8; 32]>,
    /// Decrypts AES-256-GCM outer encryption
    pub sym_key: Option<&'a [u8; 32]>,
}

/// Result of [`encode`]
pub struct EncodeResult {
    /// The opaque, encrypted, transmission-ready bytes
    pub payload: Vec<u8>,
    /// Present iff `sig_priv_key` was supplied
    pub signature: Option<Signature>,
}

/// Encode `payload` into an opaque, padded, authenticated, encrypted byte
/// string, per the version-1 envelope format.
#[instrument(skip_all, fields(payload_len = payload.len()))]
pub fn encode(payload: &[u8], opts: &EncodeOptions<'_>) -> Result<EncodeResult, CodecError> {
    let clear = clear_encode(payload, opts.sig_priv_key).inspect_err(|e| {
        warn!(error = %e, "clear framing failed");
    })?;

    let encrypted = match (opts.asym_pub_key, opts.sym_key) {
        (Some(pub_key), None) => encrypt_asymmetric(&clear.envelope, pub_key)?,
        (None, Some(sym_key)) => encrypt_symmetric(&clear.envelope, sym_key)?,
        (None, None) => {
            return Err(CodecError::InvalidParameters(
                "exactly one of asym_pub_key or sym_key is required".into(),
            ))
        }
        (Some(_), Some(_)) => {
            return Err(CodecError::InvalidParameters(
                "asym_pub_key and sym_key are mutually exclusive".into(),
            ))
        }
    };

    debug!(envelope_len = encrypted.len(), signed = clear.signature.is_some(), "encoded");
    Ok(EncodeResult {
        payload: encrypted,
        signature: clear.signature,
    })
}

/// Decode bytes produced by [`encode`], reversing outer encryption and then
/// clear framing.
#[instrument(skip_all, fields(wire_len = bytes.len()))]
pub fn decode(bytes: &[u8], opts: &DecodeOptions<'_>) -> Result<ClearDecoded, CodecError> {
    let inner = match (opts.asym_priv_key, opts.sym_key) {
        (Some(priv_key), None) => decrypt_asymmetric(bytes, priv_key)?,
        (None, Some(sym_key)) => decrypt_symmetric(bytes, sym_key)?,
        (None, None) => {
            return Err(CodecError::InvalidParameters(
                "exactly one of asym_priv_key or sym_key is required".into(),
            ))
        }
        (Some(_), Some(_)) => {
            return Err(CodecError::InvalidParameters(
                "asym_priv_key and sym_key are mutually exclusive".into(),
            ))
        }
    };

    let decoded = clear_decode(&inner).inspect_err(|e| {
        warn!(error = %e, "clear framing rejected decrypted envelope");
    })?;
    debug!(payload_len = decoded.payload.len(), signed = decoded.signature.is_some(), "decoded");
    Ok(decoded)
}
