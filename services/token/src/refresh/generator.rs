use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::Rng;
use sha2::{Digest, Sha256};

/// Opaque refresh secrets and their stored identifiers.
pub struct RefreshTokenGenerator;

impl RefreshTokenGenerator {
    /// 32 random bytes, base64url without padding. Handed to the client once.
    pub fn generate() -> String {
        let mut rng = rand::thread_rng();
        let random_bytes: [u8; 32] = rng.gen();
        URL_SAFE_NO_PAD.encode(random_bytes)
    }

    /// Stored identifier for a refresh secret: base64url SHA-256 digest.
    pub fn refresh_id(secret: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(secret.as_bytes());
        URL_SAFE_NO_PAD.encode(hasher.finalize())
    }

    pub fn generate_record_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }
}
