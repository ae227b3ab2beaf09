//! Clear (unencrypted) envelope framing
//!
//! Builds and parses `flags[1] ‖ size_field[1..3] ‖ payload[N] ‖ padding[P]
//! ‖ [signature[65]]`, padded so the total length is a positive multiple of
//! 256 bytes.

use tracing::{debug, instrument, warn};

use crate::error::CodecError;
use crate::hash::keccak256;
use crate::random::random_bytes;
use crate::signature::{self, RecoverableSignature};

/// Block size every clear envelope is padded to
pub const PADDING_TARGET: usize = 256;

const SIGNED_FLAG: u8 = 0b100;
const SIZE_FIELD_MASK: u8 = 0b011;

/// A signature produced by `clear_encode`, or recovered by `clear_decode`
#[derive(Clone, Debug)]
pub struct Signature {
    /// 65-byte compact signature (`r ‖ s ‖ recovery_id`)
    pub signature: [u8; 65],
    /// Recovered 65-byte uncompressed public key. `None` when recovery
    /// failed — a non-fatal condition, since an attacker-controlled
    /// signature should never prevent inspecting the payload.
    pub public_key: Option<[u8; 65]>,
}

/// Result of `clear_encode`
pub struct ClearEncoded {
    /// The built envelope, ready for outer encryption or direct transmission
    pub envelope: Vec<u8>,
    /// Present iff a signing key was supplied
    pub signature: Option<Signature>,
}

/// Result of `clear_decode`
pub struct ClearDecoded {
    /// The recovered application payload
    pub payload: Vec<u8>,
    /// Present iff the envelope's is-signed flag was set
    pub signature: Option<Signature>,
}

/// Number of bytes needed to little-endian encode `payload_len`, per the
/// distilled spec's `compute_size_field_len`: 1 for <256, 2 for <65_536, 3
/// for <16_777_216, 4 otherwise. A value of 4 cannot be represented in the
/// flags byte's two size-field bits and is rejected by `clear_encode`.
fn compute_size_field_len(payload_len: usize) -> u8 {
    if payload_len < 256 {
        1
    } else if payload_len < 65_536 {
        2
    } else if payload_len < 16_777_216 {
        3
    } else {
        4
    }
}

fn write_len_le(len: usize, field_len: u8) -> Vec<u8> {
    let bytes = (len as u32).to_le_bytes();
    bytes[..field_len as usize].to_vec()
}

fn read_len_le(bytes: &[u8]) -> u32 {
    let mut buf = [0u8; 4];
    buf[..bytes.len()].copy_from_slice(bytes);
    u32::from_le_bytes(buf)
}

/// Build a clear envelope around `payload`, optionally signing it
#[instrument(skip_all, fields(payload_len = payload.len(), signed = sig_priv_key.is_some()))]
pub fn clear_encode(
    payload: &[u8],
    sig_priv_key: Option<&[u8; 32]>,
) -> Result<ClearEncoded, CodecError> {
    let size_field_len = compute_size_field_len(payload.len());
    if size_field_len > 3 {
        warn!(payload_len = payload.len(), "payload too large for a version-1 size field");
        return Err(CodecError::PayloadTooLarge { len: payload.len() });
    }

    let mut envelope = Vec::with_capacity(1 + size_field_len as usize + payload.len());
    envelope.push(0u8);
    envelope.extend(write_len_le(payload.len(), size_field_len));
    envelope[0] |= size_field_len & SIZE_FIELD_MASK;
    envelope.extend_from_slice(payload);

    let raw_size = 1 + size_field_len as usize + payload.len() + if sig_priv_key.is_some() { 65 } else { 0 };
    let padding_size = PADDING_TARGET - (raw_size % PADDING_TARGET);
    let padding = random_bytes(padding_size);
    if padding.len() != padding_size || (padding_size > 3 && padding.iter().all(|&b| b == 0)) {
        warn!(padding_size, "padding generation produced an unusable buffer");
        return Err(CodecError::PaddingGenerationFailed);
    }
    envelope.extend_from_slice(&padding);

    let signature = match sig_priv_key {
        Some(priv_key) => {
            envelope[0] |= SIGNED_FLAG;
            let digest = keccak256(&envelope);
            let sig = signature::sign(&digest, priv_key)?;
            let public_key = signature::derive_public_key(priv_key)?;
            envelope.extend_from_slice(&sig.to_bytes());
            Some(Signature {
                signature: sig.to_bytes(),
                public_key: Some(public_key),
            })
        }
        None => None,
    };

    debug_assert_eq!(envelope.len() % PADDING_TARGET, 0);
    debug!(envelope_len = envelope.len(), "clear envelope built");
    Ok(ClearEncoded { envelope, signature })
}

/// Parse a clear envelope back into its payload and, if present, signature
#[instrument(skip_all, fields(message_len = message.len()))]
pub fn clear_decode(message: &[u8]) -> Result<ClearDecoded, CodecError> {
    if message.is_empty() || message.len() % PADDING_TARGET != 0 {
        warn!(message_len = message.len(), "envelope length is not a positive multiple of the padding target");
        return Err(CodecError::MalformedEnvelope(format!(
            "envelope length {} is not a positive multiple of {PADDING_TARGET}",
            message.len()
        )));
    }

    let flags = message[0];
    let size_field_len = (flags & SIZE_FIELD_MASK) as usize;
    if size_field_len == 0 {
        warn!("flags byte has a zero-length size field");
        return Err(CodecError::MalformedEnvelope(
            "size-field length is zero".into(),
        ));
    }
    let is_signed = flags & SIGNED_FLAG != 0;

    if message.len() < 1 + size_field_len {
        warn!("envelope too short for its declared size field");
        return Err(CodecError::MalformedEnvelope(
            "envelope too short for its declared size field".into(),
        ));
    }
    let payload_len = read_len_le(&message[1..1 + size_field_len]) as usize;

    let payload_start = 1 + size_field_len;
    let payload_end = payload_start + payload_len;
    let sig_reserved = if is_signed { 65 } else { 0 };
    if payload_end > message.len() - sig_reserved {
        warn!(payload_len, "declared payload length exceeds the envelope");
        return Err(CodecError::MalformedEnvelope(
            "declared payload length exceeds the envelope".into(),
        ));
    }
    let payload = message[payload_start..payload_end].to_vec();

    if !is_signed {
        debug!(payload_len, signed = false, "clear envelope decoded");
        return Ok(ClearDecoded { payload, signature: None });
    }

    let sig_start = message.len() - 65;
    let sig_bytes: [u8; 65] = message[sig_start..]
        .try_into()
        .expect("slice is exactly 65 bytes");
    let digest = keccak256(&message[..sig_start]);
    let sig = RecoverableSignature::from_bytes(&sig_bytes);
    let public_key = signature::recover_public_key(&digest, &sig).ok();
    if public_key.is_none() {
        warn!("signature public-key recovery failed; payload still decoded");
    }
    debug!(payload_len, signed = true, recovered = public_key.is_some(), "clear envelope decoded");

    Ok(ClearDecoded {
        payload,
        signature: Some(Signature {
            signature: sig_bytes,
            public_key,
        }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_priv_key() -> [u8; 32] {
        let mut k = [0u8; 32];
        k[31] = 0x09;
        k[2] = 0x55;
        k
    }

    // ==================== Round trips ====================

    #[test]
    fn unsigned_roundtrip() {
        let payload = b"hello waku";
        let encoded = clear_encode(payload, None).unwrap();
        assert!(encoded.signature.is_none());
        let decoded = clear_decode(&encoded.envelope).unwrap();
        assert_eq!(decoded.payload, payload);
        assert!(decoded.signature.is_none());
    }

    #[test]
    fn signed_roundtrip_recovers_signer_public_key() {
        let priv_key = test_priv_key();
        let payload = b"signed message";
        let encoded = clear_encode(payload, Some(&priv_key)).unwrap();
        let expected_pub = signature::derive_public_key(&priv_key).unwrap();
        assert_eq!(encoded.signature.as_ref().unwrap().public_key, Some(expected_pub));

        let decoded = clear_decode(&encoded.envelope).unwrap();
        assert_eq!(decoded.payload, payload);
        let sig = decoded.signature.unwrap();
        assert_eq!(sig.public_key, Some(expected_pub));
    }

    // ==================== Boundary cases from SPEC_FULL §8 ====================

    #[test]
    fn empty_payload_unsigned() {
        let encoded = clear_encode(b"", None).unwrap();
        assert_eq!(encoded.envelope.len(), PADDING_TARGET);
        assert_eq!(encoded.envelope[0] & SIZE_FIELD_MASK, 1);
        let decoded = clear_decode(&encoded.envelope).unwrap();
        assert_eq!(decoded.payload, b"");
    }

    #[test]
    fn payload_lengths_around_size_field_transitions() {
        for len in [0usize, 1, 254, 255, 256, 257, 65_534, 65_535, 65_536, 65_537] {
            let payload = vec![0x7au8; len];
            let encoded = clear_encode(&payload, None).unwrap();
            assert_eq!(encoded.envelope.len() % PADDING_TARGET, 0);
            let decoded = clear_decode(&encoded.envelope).unwrap();
            assert_eq!(decoded.payload, payload, "roundtrip failed for len={len}");
        }
    }

    #[test]
    fn payload_lengths_around_size_field_transitions_signed() {
        let priv_key = test_priv_key();
        for len in [0usize, 255, 256, 65_535, 65_536] {
            let payload = vec![0x11u8; len];
            let encoded = clear_encode(&payload, Some(&priv_key)).unwrap();
            assert_eq!(encoded.envelope.len() % PADDING_TARGET, 0);
            let decoded = clear_decode(&encoded.envelope).unwrap();
            assert_eq!(decoded.payload, payload);
            assert!(decoded.signature.unwrap().public_key.is_some());
        }
    }

    #[test]
    fn size_field_len_matches_payload_length() {
        assert_eq!(compute_size_field_len(0), 1);
        assert_eq!(compute_size_field_len(255), 1);
        assert_eq!(compute_size_field_len(256), 2);
        assert_eq!(compute_size_field_len(65_535), 2);
        assert_eq!(compute_size_field_len(65_536), 3);
        assert_eq!(compute_size_field_len(16_777_215), 3);
        assert_eq!(compute_size_field_len(16_777_216), 4);
    }

    #[test]
    fn oversized_payload_is_rejected_before_framing() {
        let payload = vec![0u8; 16_777_216];
        let err = clear_encode(&payload, None).unwrap_err();
        assert!(matches!(err, CodecError::PayloadTooLarge { len: 16_777_216 }));
    }

    // ==================== Malformed envelopes ====================

    #[test]
    fn zero_size_field_is_malformed() {
        let mut message = vec![0u8; PADDING_TARGET];
        message[0] = 0; // size-field bits are 0 -> invalid
        assert!(matches!(
            clear_decode(&message),
            Err(CodecError::MalformedEnvelope(_))
        ));
    }

    #[test]
    fn length_not_a_multiple_of_256_is_malformed() {
        let message = vec![0u8; 300];
        assert!(matches!(
            clear_decode(&message),
            Err(CodecError::MalformedEnvelope(_))
        ));
    }

    #[test]
    fn empty_message_is_malformed() {
        assert!(matches!(
            clear_decode(&[]),
            Err(CodecError::MalformedEnvelope(_))
        ));
    }

    #[test]
    fn declared_length_exceeding_envelope_is_malformed() {
        let mut message = vec![0u8; PADDING_TARGET];
        message[0] = 1; // size-field length 1
        message[1] = 0xff; // claims a 255-byte payload that doesn't fit
        assert!(matches!(
            clear_decode(&message),
            Err(CodecError::MalformedEnvelope(_))
        ));
    }

    // ==================== Randomness properties ====================

    #[test]
    fn two_encodings_of_same_payload_differ() {
        let payload = b"padding makes these different";
        let a = clear_encode(payload, None).unwrap();
        let b = clear_encode(payload, None).unwrap();
        assert_ne!(a.envelope, b.envelope);
    }

    #[test]
    fn padding_byte_length_is_exact() {
        let payload = vec![0u8; 10];
        let encoded = clear_encode(&payload, None).unwrap();
        // flags(1) + size_field(1) + payload(10) + padding = multiple of 256
        let padding_len = encoded.envelope.len() - 1 - 1 - 10;
        assert_eq!(padding_len, PADDING_TARGET - 12);
    }
}
