//! ECIES hybrid encryption over secp256k1
//!
//! This is the Ethereum-ecosystem ECIES construction (the one `eccrypto` /
//! `eth-crypto` speak): ephemeral ECDH, a SEC1/ANSI-X9.63 counter-mode
//! SHA-256 KDF, AES-128-CTR, and an HMAC-SHA256 tag over `iv ‖ ciphertext`.
//! The wire format is fixed (see SPEC_FULL.md §3) and must match
//! independently written peers byte-for-byte.

use aes::cipher::{KeyIvInit, StreamCipher};
use hmac::{Hmac, Mac};
use k256::ecdh::diffie_hellman;
use k256::{PublicKey, SecretKey};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use tracing::{debug, instrument, warn};
use zeroize::Zeroizing;

use crate::error::CodecError;
use crate::random::random_bytes;

type Aes128Ctr = ctr::Ctr128BE<aes::Aes128>;
type HmacSha256 = Hmac<Sha256>;

const EPHEMERAL_PUB_LEN: usize = 65;
const IV_LEN: usize = 16;
const MAC_LEN: usize = 32;
const KEY_MATERIAL_LEN: usize = 32; // 16-byte AES key + 16 bytes fed to SHA-256 for the MAC key

/// SEC1/ANSI-X9.63 counter-mode KDF: repeatedly hash `counter_be32 ‖ secret`
/// with SHA-256 and concatenate until `out` is filled
fn kdf(shared_secret: &[u8], out: &mut [u8]) {
    let mut counter: u32 = 1;
    let mut written = 0;
    while written < out.len() {
        let mut hasher = Sha256::new();
        hasher.update(counter.to_be_bytes());
        hasher.update(shared_secret);
        let digest = hasher.finalize();
        let take = (out.len() - written).min(digest.len());
        out[written..written + take].copy_from_slice(&digest[..take]);
        written += take;
        counter += 1;
    }
}

fn hmac_sha256(mac_key: &[u8], iv: &[u8], ciphertext: &[u8]) -> [u8; 32] {
    let mut mac = HmacSha256::new_from_slice(mac_key).expect("HMAC accepts any key length");
    mac.update(iv);
    mac.update(ciphertext);
    let result = mac.finalize().into_bytes();
    let mut out = [0u8; 32];
    out.copy_from_slice(&result);
    out
}

/// Encrypt `data` to the holder of `pub_key` (65-byte uncompressed secp256k1
/// point). Output: `ephemeral_pub(65) ‖ iv(16) ‖ ciphertext(N) ‖ mac(32)`.
#[instrument(skip_all, fields(data_len = data.len()))]
pub fn encrypt_asymmetric(data: &[u8], pub_key: &[u8; 65]) -> Result<Vec<u8>, CodecError> {
    let recipient = PublicKey::from_sec1_bytes(pub_key).map_err(|e| {
        warn!(error = %e, "invalid recipient public key");
        CodecError::InvalidParameters(format!("invalid public key: {e}"))
    })?;

    let ephemeral_secret = SecretKey::random(&mut rand::rngs::OsRng);
    let ephemeral_public = ephemeral_secret.public_key();

    let shared = diffie_hellman(&ephemeral_secret.to_nonzero_scalar(), recipient.as_affine());
    let shared_x = Zeroizing::new(shared.raw_secret_bytes().to_vec());

    let mut key_material = Zeroizing::new([0u8; KEY_MATERIAL_LEN]);
    kdf(&shared_x, key_material.as_mut_slice());
    let ekey = Zeroizing::new(key_material[..16].to_vec());
    let mkey = Zeroizing::new(Sha256::digest(&key_material[16..32]).to_vec());

    let iv = random_bytes(IV_LEN);
    let mut ciphertext = data.to_vec();
    let mut cipher = Aes128Ctr::new_from_slices(&ekey, &iv).map_err(|e| {
        warn!(error = %e, "bad AES-CTR key/iv");
        CodecError::InvalidParameters(format!("bad AES-CTR key/iv: {e}"))
    })?;
    cipher.apply_keystream(&mut ciphertext);

    let mac = hmac_sha256(&mkey, &iv, &ciphertext);

    let ephemeral_pub_bytes = ephemeral_public.to_encoded_point(false);
    let mut out = Vec::with_capacity(EPHEMERAL_PUB_LEN + IV_LEN + ciphertext.len() + MAC_LEN);
    out.extend_from_slice(ephemeral_pub_bytes.as_bytes());
    out.extend_from_slice(&iv);
    out.extend_from_slice(&ciphertext);
    out.extend_from_slice(&mac);
    debug!(blob_len = out.len(), "asymmetric blob built");
    Ok(out)
}

/// Decrypt an ECIES blob with a 32-byte secp256k1 private key, verifying the
/// HMAC in constant time before releasing the plaintext
#[instrument(skip_all, fields(payload_len = payload.len()))]
pub fn decrypt_asymmetric(payload: &[u8], priv_key: &[u8; 32]) -> Result<Vec<u8>, CodecError> {
    let min_len = EPHEMERAL_PUB_LEN + IV_LEN + MAC_LEN;
    if payload.len() < min_len {
        warn!(payload_len = payload.len(), "asymmetric payload shorter than the ephemeral-pub+iv+mac minimum");
        return Err(CodecError::MalformedEnvelope(format!(
            "asymmetric payload shorter than the {min_len}-byte minimum"
        )));
    }

    let ephemeral_pub_bytes = &payload[..EPHEMERAL_PUB_LEN];
    let iv = &payload[EPHEMERAL_PUB_LEN..EPHEMERAL_PUB_LEN + IV_LEN];
    let ciphertext = &payload[EPHEMERAL_PUB_LEN + IV_LEN..payload.len() - MAC_LEN];
    let received_mac = &payload[payload.len() - MAC_LEN..];

    let ephemeral_pub = PublicKey::from_sec1_bytes(ephemeral_pub_bytes).map_err(|_| {
        warn!("malformed ephemeral public key in asymmetric blob");
        CodecError::DecryptionFailed
    })?;
    let secret = SecretKey::from_slice(priv_key).map_err(|e| {
        warn!(error = %e, "invalid recipient private key");
        CodecError::InvalidParameters(format!("invalid private key: {e}"))
    })?;

    let shared = diffie_hellman(&secret.to_nonzero_scalar(), ephemeral_pub.as_affine());
    let shared_x = Zeroizing::new(shared.raw_secret_bytes().to_vec());

    let mut key_material = Zeroizing::new([0u8; KEY_MATERIAL_LEN]);
    kdf(&shared_x, key_material.as_mut_slice());
    let ekey = Zeroizing::new(key_material[..16].to_vec());
    let mkey = Zeroizing::new(Sha256::digest(&key_material[16..32]).to_vec());

    let expected_mac = hmac_sha256(&mkey, iv, ciphertext);
    if expected_mac.ct_eq(received_mac).unwrap_u8() != 1 {
        warn!("ECIES MAC did not verify");
        return Err(CodecError::DecryptionFailed);
    }

    let mut plaintext = ciphertext.to_vec();
    let mut cipher = Aes128Ctr::new_from_slices(&ekey, iv).map_err(|_| CodecError::DecryptionFailed)?;
    cipher.apply_keystream(&mut plaintext);

    debug!(plaintext_len = plaintext.len(), "asymmetric blob decrypted");
    Ok(plaintext)
}
