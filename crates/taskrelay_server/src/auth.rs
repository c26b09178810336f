//! Authentication: bearer tokens and password hashing.
//!
//! Tokens are HMAC-SHA256 signed and carry their issue time, so they
//! expire without any server-side session state.
//!
//! ## Token format
//!
//! - 16 bytes: user id
//! - 8 bytes: issued-at (Unix millis, big-endian)
//! - 32 bytes: HMAC-SHA256 signature
//!
//! Total: 56 bytes, hex-encoded for transport.

use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::time::Duration;
use taskrelay_core::{now_millis, CoreError, CoreResult, User, UserId};
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

const TOKEN_LEN: usize = 16 + 8 + 32;

/// Authentication configuration.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Secret key for HMAC.
    pub secret: Vec<u8>,
    /// Token expiration duration.
    pub token_expiry: Duration,
}

impl AuthConfig {
    /// Creates a new auth configuration with a 7-day expiry.
    pub fn new(secret: Vec<u8>) -> Self {
        Self {
            secret,
            token_expiry: Duration::from_secs(7 * 24 * 60 * 60),
        }
    }

    /// Sets the token expiration duration.
    #[must_use]
    pub fn with_expiry(mut self, expiry: Duration) -> Self {
        self.token_expiry = expiry;
        self
    }
}

/// Issues and verifies bearer tokens.
#[derive(Clone)]
pub struct TokenIssuer {
    config: AuthConfig,
}

impl TokenIssuer {
    /// Creates a new issuer.
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    /// Issues a token for a user.
    pub fn issue(&self, user: UserId) -> String {
        let mut data = Vec::with_capacity(TOKEN_LEN);
        data.extend_from_slice(user.as_uuid().as_bytes());
        data.extend_from_slice(&now_millis().to_be_bytes());

        let signature = self.sign(&data);
        data.extend_from_slice(&signature);
        to_hex(&data)
    }

    /// Verifies a token and returns the subject user id.
    ///
    /// # Errors
    ///
    /// `Authentication` with a distinct message for malformed, tampered,
    /// and expired tokens.
    pub fn verify(&self, token: &str) -> CoreResult<UserId> {
        let bytes = from_hex(token)
            .ok_or_else(|| CoreError::Authentication("Invalid token".into()))?;
        if bytes.len() != TOKEN_LEN {
            return Err(CoreError::Authentication("Invalid token".into()));
        }

        let signature = &bytes[24..56];
        let expected = self.sign(&bytes[0..24]);
        if signature != expected.as_slice() {
            return Err(CoreError::Authentication("Invalid token".into()));
        }

        let mut issued_at = [0u8; 8];
        issued_at.copy_from_slice(&bytes[16..24]);
        let issued_at = u64::from_be_bytes(issued_at);
        let expiry_millis = self.config.token_expiry.as_millis() as u64;
        if now_millis() > issued_at.saturating_add(expiry_millis) {
            return Err(CoreError::Authentication("Token expired".into()));
        }

        let mut id = [0u8; 16];
        id.copy_from_slice(&bytes[0..16]);
        Ok(UserId::from_uuid(Uuid::from_bytes(id)))
    }

    fn sign(&self, data: &[u8]) -> [u8; 32] {
        let mut mac = HmacSha256::new_from_slice(&self.config.secret)
            .expect("HMAC can take key of any size");
        mac.update(data);
        mac.finalize().into_bytes().into()
    }
}

/// Generates a random 16-byte salt, hex-encoded.
pub fn generate_salt() -> String {
    let mut salt = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut salt);
    to_hex(&salt)
}

/// Hashes a password with its salt: SHA-256(salt || password), hex.
pub fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    to_hex(&hasher.finalize())
}

/// Checks a login password against the stored hash.
pub fn verify_password(user: &User, password: &str) -> bool {
    hash_password(&user.salt, password) == user.password_hash
}

fn to_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

fn from_hex(s: &str) -> Option<Vec<u8>> {
    if s.len() % 2 != 0 {
        return None;
    }
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(s.get(i..i + 2)?, 16).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(AuthConfig::new(b"test-secret-key-32-bytes-long!!".to_vec()))
    }

    #[test]
    fn issue_and_verify_roundtrip() {
        let issuer = issuer();
        let user = UserId::new();

        let token = issuer.issue(user);
        assert_eq!(token.len(), TOKEN_LEN * 2);

        let subject = issuer.verify(&token).unwrap();
        assert_eq!(subject, user);
    }

    #[test]
    fn reject_tampered_token() {
        let issuer = issuer();
        let mut token = issuer.issue(UserId::new()).into_bytes();
        // Flip a nibble inside the signature.
        token[100] = if token[100] == b'0' { b'1' } else { b'0' };
        let token = String::from_utf8(token).unwrap();

        assert!(issuer.verify(&token).is_err());
    }

    #[test]
    fn reject_garbage_token() {
        let issuer = issuer();
        assert!(issuer.verify("not-hex").is_err());
        assert!(issuer.verify("abcd").is_err());
        assert!(issuer.verify("").is_err());
    }

    #[test]
    fn reject_expired_token() {
        let config = AuthConfig::new(b"test-secret-key-32-bytes-long!!".to_vec())
            .with_expiry(Duration::from_secs(0));
        let issuer = TokenIssuer::new(config);

        let token = issuer.issue(UserId::new());
        std::thread::sleep(Duration::from_millis(10));

        let err = issuer.verify(&token).unwrap_err();
        assert!(err.to_string().contains("expired"));
    }

    #[test]
    fn reject_wrong_secret() {
        let token = issuer().issue(UserId::new());
        let other = TokenIssuer::new(AuthConfig::new(b"another-secret".to_vec()));
        assert!(other.verify(&token).is_err());
    }

    #[test]
    fn password_roundtrip() {
        let salt = generate_salt();
        let hash = hash_password(&salt, "hunter2");
        let user = User::new("ada".into(), "ada@example.com".into(), hash, salt);

        assert!(verify_password(&user, "hunter2"));
        assert!(!verify_password(&user, "hunter3"));
    }

    #[test]
    fn salts_are_unique() {
        assert_ne!(generate_salt(), generate_salt());
    }

    #[test]
    fn hex_roundtrip() {
        let bytes = vec![0x00, 0x0f, 0xff, 0x42];
        assert_eq!(from_hex(&to_hex(&bytes)).unwrap(), bytes);
    }
}
