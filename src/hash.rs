//! Keccak-256 hashing

use sha3::{Digest, Keccak256};

/// Compute the Keccak-256 hash of `data`
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&result);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Known test vectors ====================

    #[test]
    fn empty_input() {
        // keccak256("") is the well-known empty-input test vector
        let hash = keccak256(&[]);
        assert_eq!(
            hex::encode(hash),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn hello() {
        let hash = keccak256(b"hello");
        assert_eq!(
            hex::encode(hash),
            "1c8aff950685c2ed4bc3174f3472287b56d9517b9c948127319a09a7a36deac8"
        );
    }

    #[test]
    fn abc() {
        let hash = keccak256(b"abc");
        assert_eq!(
            hex::encode(hash),
            "4e03657aea45a94fc7d47ba826c8d667c0d1e6e33a64a036ec44f58fa12d6c45"
        );
    }

    #[test]
    fn result_is_32_bytes() {
        let hash = keccak256(b"any input");
        assert_eq!(hash.len(), 32);
    }

    #[test]
    fn deterministic() {
        let data = b"test data for determinism";
        assert_eq!(keccak256(data), keccak256(data));
    }

    #[test]
    fn different_inputs_different_outputs() {
        assert_ne!(keccak256(b"input1"), keccak256(b"input2"));
    }

    #[test]
    fn single_bit_change_avalanche() {
        let h1 = keccak256(&[0x00]);
        let h2 = keccak256(&[0x01]);
        assert_ne!(h1, h2);
        let diff_count = h1.iter().zip(h2.iter()).filter(|(a, b)| a != b).count();
        assert!(diff_count > 20, "avalanche effect: only {diff_count} bytes differ");
    }

    #[test]
    fn boundary_lengths_do_not_panic() {
        for len in [0usize, 1, 135, 136, 137, 255, 256, 65_535, 65_536] {
            let data = vec![0xabu8; len];
            let hash = keccak256(&data);
            assert_eq!(hash.len(), 32);
        }
    }
}
