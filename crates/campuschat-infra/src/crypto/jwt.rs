//! HS256 session token codec.
//!
//! Implements `TokenCodec` from `campuschat-core` with `jsonwebtoken`.
//! Expiry is deliberately left to the session manager, which treats an
//! expired token the same as a revoked one.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};

use campuschat_core::auth::session::TokenCodec;
use campuschat_types::error::AuthError;
use campuschat_types::session::{SESSION_ISSUER, SessionClaims};

/// Minimum signing secret length in bytes.
pub const MIN_SECRET_LEN: usize = 32;

#[derive(Debug, thiserror::Error)]
#[error("session secret must be at least {MIN_SECRET_LEN} bytes (got {0})")]
pub struct WeakSecret(pub usize);

pub struct JwtTokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtTokenCodec {
    pub fn new(secret: &[u8]) -> Result<Self, WeakSecret> {
        if secret.len() < MIN_SECRET_LEN {
            return Err(WeakSecret(secret.len()));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.set_issuer(&[SESSION_ISSUER]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        })
    }
}

impl TokenCodec for JwtTokenCodec {
    fn encode(&self, claims: &SessionClaims) -> Result<String, AuthError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key).map_err(|e| {
            tracing::error!(error = %e, "failed to sign session token");
            AuthError::InvalidToken
        })
    }

    fn decode(&self, token: &str) -> Result<SessionClaims, AuthError> {
        decode::<SessionClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "session token rejected");
                AuthError::InvalidToken
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    const SECRET: &[u8] = b"0123456789abcdef0123456789abcdef";

    fn claims(exp_offset: i64) -> SessionClaims {
        let now = Utc::now().timestamp();
        SessionClaims {
            iss: SESSION_ISSUER.to_string(),
            sub: "a@inst.edu".to_string(),
            jti: "session-1".to_string(),
            iat: now,
            exp: now + exp_offset,
        }
    }

    #[test]
    fn test_encode_decode() {
        let codec = JwtTokenCodec::new(SECRET).unwrap();
        let original = claims(3600);
        let token = codec.encode(&original).unwrap();
        let decoded = codec.decode(&token).unwrap();
        assert_eq!(decoded.sub, original.sub);
        assert_eq!(decoded.jti, "session-1");
        assert_eq!(decoded.exp, original.exp);
    }

    #[test]
    fn test_expired_claims_still_decode() {
        let codec = JwtTokenCodec::new(SECRET).unwrap();
        let token = codec.encode(&claims(-3600)).unwrap();
        assert!(codec.decode(&token).is_ok());
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let codec = JwtTokenCodec::new(SECRET).unwrap();
        let other = JwtTokenCodec::new(b"ffffffffffffffffffffffffffffffff").unwrap();
        let token = codec.encode(&claims(3600)).unwrap();
        assert!(matches!(other.decode(&token), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_wrong_issuer_is_rejected() {
        let codec = JwtTokenCodec::new(SECRET).unwrap();
        let mut c = claims(3600);
        c.iss = "someone-else".to_string();
        let token = codec.encode(&c).unwrap();
        assert!(matches!(codec.decode(&token), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_tampered_token_is_rejected() {
        let codec = JwtTokenCodec::new(SECRET).unwrap();
        let mut token = codec.encode(&claims(3600)).unwrap();
        token.push('x');
        assert!(codec.decode(&token).is_err());
        assert!(codec.decode("garbage").is_err());
    }

    #[test]
    fn test_short_secret_is_refused() {
        assert!(matches!(JwtTokenCodec::new(b"short"), Err(WeakSecret(5))));
    }
}
