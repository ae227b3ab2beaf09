//! Version-1 Waku payload codec.
//!
//! A message passed to [`codec::encode`] is wrapped in a clear envelope
//! (flags, a little-endian size field, the payload, random padding out to a
//! multiple of 256 bytes, and an optional secp256k1 signature with recovery),
//! then encrypted under exactly one of two outer schemes: ECIES over
//! secp256k1, or AES-256-GCM with a pre-shared key. [`codec::decode`]
//! reverses both steps and, for signed envelopes, recovers the signer's
//! public key.
//!
//! ```
//! use waku_payload_codec::codec::{decode, encode, DecodeOptions, EncodeOptions};
//!
//! let key = [0x42u8; 32];
//! let encoded = encode(
//!     b"hello",
//!     &EncodeOptions { sym_key: Some(&key), ..Default::default() },
//! ).unwrap();
//! let decoded = decode(
//!     &encoded.payload,
//!     &DecodeOptions { sym_key: Some(&key), ..Default::default() },
//! ).unwrap();
//! assert_eq!(decoded.payload, b"hello");
//! ```

pub mod asymmetric;
pub mod codec;
pub mod envelope;
pub mod error;
pub mod hash;
pub mod random;
pub mod signature;
pub mod symmetric;

pub use codec::{decode, encode, DecodeOptions, EncodeOptions, EncodeResult};
pub use error::{CodecError, CodecResult};
