//! Salted SHA-256 digests for verification codes.
//!
//! Implements the `CodeHasher` trait from `campuschat-core` using the `sha2`
//! crate (RustCrypto ecosystem), with constant-time comparison from `subtle`.

use rand::Rng;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use campuschat_core::auth::code::CodeHasher;

/// SHA-256(salt || code), hex-encoded, with a 16-byte random salt.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256CodeHasher;

impl CodeHasher for Sha256CodeHasher {
    fn generate_salt(&self) -> String {
        let mut buf = [0u8; 16];
        rand::rng().fill(&mut buf);
        hex::encode(buf)
    }

    fn hash(&self, salt: &str, code: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(salt.as_bytes());
        hasher.update(code.as_bytes());
        hex::encode(hasher.finalize())
    }

    fn verify(&self, salt: &str, code: &str, expected_hash: &str) -> bool {
        let candidate = self.hash(salt, code);
        candidate.as_bytes().ct_eq(expected_hash.as_bytes()).into()
    }
}

/// Random secret of `len` bytes, hex-encoded. Used as an ephemeral signing
/// key when none is configured.
pub fn generate_secret(len: usize) -> String {
    let mut buf = vec![0u8; len];
    rand::rng().fill(buf.as_mut_slice());
    hex::encode(buf)
}
