//! One-time code generation and the hashing port used to store codes.

use rand::Rng;

/// Shortest and longest code a deployment may configure.
pub const MIN_CODE_LENGTH: usize = 4;
pub const MAX_CODE_LENGTH: usize = 10;

/// Generate a numeric code of `length` digits from the thread-local CSPRNG.
pub fn generate_code(length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
        .collect()
}

/// Salted one-way hashing of verification codes.
///
/// The `Sha256CodeHasher` adapter lives in campuschat-infra.
pub trait CodeHasher: Send + Sync {
    /// Fresh random salt, hex-encoded.
    fn generate_salt(&self) -> String;

    /// Hex-encoded digest of `salt || code`.
    fn hash(&self, salt: &str, code: &str) -> String;

    /// Compare `code` against a stored digest in constant time.
    fn verify(&self, salt: &str, code: &str, expected_hash: &str) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_code_is_numeric_with_requested_length() {
        for len in [4, 6, 8] {
            let code = generate_code(len);
            assert_eq!(code.len(), len);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_generate_code_varies() {
        let codes: std::collections::HashSet<String> = (0..20).map(|_| generate_code(6)).collect();
        assert!(codes.len() > 1);
    }
}
