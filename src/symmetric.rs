//! AES-256-GCM symmetric encryption
//!
//! Wire format is `ciphertext ‖ gcm_tag(16) ‖ iv(12)` — the IV trails the
//! ciphertext+tag, which is unconventional but required for interop with
//! peers speaking this codec. Do not "fix" the ordering.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use tracing::{debug, instrument, warn};

use crate::error::CodecError;
use crate::random::random_bytes;

const IV_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// Encrypt `data` under a 32-byte AES-256 key with a fresh random 12-byte
/// IV. Returns `ciphertext ‖ tag ‖ iv`.
#[instrument(skip_all, fields(data_len = data.len()))]
pub fn encrypt_symmetric(data: &[u8], key: &[u8; 32]) -> Result<Vec<u8>, CodecError> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    let iv_bytes = random_bytes(IV_LEN);
    let nonce = Nonce::from_slice(&iv_bytes);

    let mut cipher_and_tag = cipher.encrypt(nonce, data).map_err(|_| {
        warn!("AES-256-GCM encryption failed");
        CodecError::DecryptionFailed
    })?;

    let mut out = Vec::with_capacity(cipher_and_tag.len() + IV_LEN);
    out.append(&mut cipher_and_tag);
    out.extend_from_slice(&iv_bytes);
    debug!(blob_len = out.len(), "symmetric blob built");
    Ok(out)
}

/// Decrypt a `ciphertext ‖ tag ‖ iv` blob under a 32-byte AES-256 key
#[instrument(skip_all, fields(payload_len = payload.len()))]
pub fn decrypt_symmetric(payload: &[u8], key: &[u8; 32]) -> Result<Vec<u8>, CodecError> {
    if payload.len() < IV_LEN + TAG_LEN {
        warn!(payload_len = payload.len(), "symmetric payload shorter than the iv+tag minimum");
        return Err(CodecError::MalformedEnvelope(format!(
            "symmetric payload shorter than the {}-byte iv+tag minimum",
            IV_LEN + TAG_LEN
        )));
    }

    let (cipher_and_tag, iv_bytes) = payload.split_at(payload.len() - IV_LEN);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    let nonce = Nonce::from_slice(iv_bytes);

    let plaintext = cipher.decrypt(nonce, cipher_and_tag).map_err(|_| {
        warn!("AES-256-GCM authentication failed");
        CodecError::DecryptionFailed
    })?;
    debug!(plaintext_len = plaintext.len(), "symmetric blob decrypted");
    Ok(plaintext)
}
