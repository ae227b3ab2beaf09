//! Cryptographically secure random byte generation

use rand::RngCore;

/// Fill a freshly allocated buffer of `len` bytes with CSPRNG output
pub fn random_bytes(len: usize) -> Vec<u8> {
    let mut buf = vec![0u8; len];
    rand::rngs::OsRng.fill_bytes(&mut buf);
    buf
}
