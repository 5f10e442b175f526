//! Signing and verification of compact JWS bearer tokens.
//!
//! Verification always dispatches on the header `kid` against the full
//! active and retired key set. A token whose kid is unknown is rejected;
//! no other key is tried.

use crate::error::TokenError;
use crate::jwt::claims::{Claims, IdTokenClaims};
use crate::keys::KeyRing;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::Utc;
use jsonwebtoken::{decode, decode_header, Validation};
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;

/// Claims every verified token must carry.
const REQUIRED_CLAIMS: [&str; 4] = ["exp", "iat", "iss", "sub"];

/// OIDC `at_hash`: base64url of the left half of SHA-256 over the access token.
#[must_use]
pub fn at_hash(access_token: &str) -> String {
    let digest = Sha256::digest(access_token.as_bytes());
    URL_SAFE_NO_PAD.encode(&digest[..digest.len() / 2])
}

/// Verified payloads expose their standard claims for the expiry check.
trait ClaimSet {
    fn standard(&self) -> &Claims;
}

impl ClaimSet for Claims {
    fn standard(&self) -> &Claims {
        self
    }
}

impl ClaimSet for IdTokenClaims {
    fn standard(&self) -> &Claims {
        &self.claims
    }
}

/// Token codec backed by a [`KeyRing`].
#[derive(Debug, Clone)]
pub struct TokenCodec {
    key_ring: Arc<KeyRing>,
}

impl TokenCodec {
    /// Create a codec signing with the ring's active key.
    #[must_use]
    pub const fn new(key_ring: Arc<KeyRing>) -> Self {
        Self { key_ring }
    }

    /// The backing key ring.
    #[must_use]
    pub const fn key_ring(&self) -> &Arc<KeyRing> {
        &self.key_ring
    }

    /// Sign an access token expiring `ttl` after the claims' `iat`.
    ///
    /// # Errors
    ///
    /// Returns `NoActiveKey` if the ring is empty, `ServerError` on signing failure.
    pub async fn sign_access_token(&self, claims: &Claims, ttl: Duration) -> Result<String, TokenError> {
        let key = self.key_ring.current_signing_key().await?;
        key.sign(&claims.expiring_after(ttl_seconds(ttl)))
    }

    /// Sign an ID token, bound to `access_token` through `at_hash` when given.
    ///
    /// # Errors
    ///
    /// Returns `NoActiveKey` if the ring is empty, `ServerError` on signing failure.
    pub async fn sign_id_token(
        &self,
        claims: &Claims,
        ttl: Duration,
        access_token: Option<&str>,
    ) -> Result<String, TokenError> {
        let key = self.key_ring.current_signing_key().await?;
        let id_claims = IdTokenClaims {
            claims: claims.expiring_after(ttl_seconds(ttl)),
            at_hash: access_token.map(at_hash),
        };
        key.sign(&id_claims)
    }

    /// Verify an access token and return its claims.
    ///
    /// # Errors
    ///
    /// Returns `InvalidToken` on any structural, key, algorithm, signature or
    /// expiry failure.
    pub async fn verify_access_token(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify(token).await
    }

    /// Verify an ID token and return its claims.
    ///
    /// # Errors
    ///
    /// Returns `InvalidToken` under the same rules as access tokens.
    pub async fn verify_id_token(&self, token: &str) -> Result<IdTokenClaims, TokenError> {
        self.verify(token).await
    }

    async fn verify<T: DeserializeOwned + ClaimSet>(&self, token: &str) -> Result<T, TokenError> {
        let header = decode_header(token)
            .map_err(|e| TokenError::invalid_token(format!("malformed header: {e}")))?;
        let kid = header
            .kid
            .ok_or_else(|| TokenError::invalid_token("missing kid"))?;

        let key = self
            .key_ring
            .verification_key_for(&kid)
            .await
            .map_err(|_| TokenError::invalid_token(format!("unknown kid {kid}")))?;

        let expected = key.algorithm().jsonwebtoken();
        if header.alg != expected {
            return Err(TokenError::invalid_token(format!(
                "algorithm {:?} does not match key",
                header.alg
            )));
        }

        let mut validation = Validation::new(expected);
        validation.leeway = 0;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&REQUIRED_CLAIMS);

        let claims = decode::<T>(token, key.decoding_key(), &validation)
            .map(|data| data.claims)
            .map_err(|e| TokenError::invalid_token(e.to_string()))?;

        // jsonwebtoken still accepts exp == now with zero leeway.
        if claims.standard().is_expired_at(Utc::now().timestamp()) {
            return Err(TokenError::invalid_token("token expired"));
        }
        Ok(claims)
    }
}

fn ttl_seconds(ttl: Duration) -> i64 {
    i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX)
}
