//! Asymmetric signing key material.
//!
//! The private half never leaves this type: callers sign through
//! [`SigningKey::sign`] and only the public JWK and decoding key are exposed.

use crate::config::JwtAlgorithm;
use crate::error::TokenError;
use crate::jwks::Jwk;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Utc};
use jsonwebtoken::{encode, DecodingKey, EncodingKey, Header};
use p256::elliptic_curve::sec1::ToEncodedPoint;
use p256::pkcs8::EncodePrivateKey;
use rand::rngs::OsRng;
use rsa::pkcs1::EncodeRsaPrivateKey;
use rsa::traits::PublicKeyParts;
use rsa::RsaPrivateKey;
use serde::Serialize;
use std::fmt;

/// RSA modulus size for RS256/PS256 keys.
pub const RSA_KEY_BITS: usize = 2048;

/// An immutable signing key with its kid.
pub struct SigningKey {
    kid: String,
    algorithm: JwtAlgorithm,
    created_at: DateTime<Utc>,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    jwk: Jwk,
}

impl SigningKey {
    /// Generate a fresh key pair with a random kid.
    ///
    /// CPU-bound for RSA; async callers should run it on a blocking thread.
    ///
    /// # Errors
    ///
    /// Returns `ServerError` if key generation or encoding fails.
    pub fn generate(algorithm: JwtAlgorithm, created_at: DateTime<Utc>) -> Result<Self, TokenError> {
        let kid = uuid::Uuid::new_v4().to_string();

        let (encoding_key, decoding_key, jwk) = match algorithm {
            JwtAlgorithm::RS256 | JwtAlgorithm::PS256 => generate_rsa(&kid, algorithm)?,
            JwtAlgorithm::ES256 => generate_p256(&kid)?,
        };

        Ok(Self {
            kid,
            algorithm,
            created_at,
            encoding_key,
            decoding_key,
            jwk,
        })
    }

    /// Key identifier carried in token headers.
    #[must_use]
    pub fn kid(&self) -> &str {
        &self.kid
    }

    /// Signing algorithm.
    #[must_use]
    pub const fn algorithm(&self) -> JwtAlgorithm {
        self.algorithm
    }

    /// Creation time.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Public key in JWK form.
    #[must_use]
    pub const fn jwk(&self) -> &Jwk {
        &self.jwk
    }

    /// Verification key for this key's signatures.
    #[must_use]
    pub const fn decoding_key(&self) -> &DecodingKey {
        &self.decoding_key
    }

    /// Sign a claim set into a compact JWS with `kid` in the header.
    ///
    /// # Errors
    ///
    /// Returns `ServerError` if serialization or signing fails.
    pub fn sign<T: Serialize>(&self, claims: &T) -> Result<String, TokenError> {
        let mut header = Header::new(self.algorithm.jsonwebtoken());
        header.kid = Some(self.kid.clone());

        encode(&header, claims, &self.encoding_key)
            .map_err(|e| TokenError::server(format!("JWT encoding failed: {e}")))
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("kid", &self.kid)
            .field("algorithm", &self.algorithm)
            .field("created_at", &self.created_at)
            .field("encoding_key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

type KeyParts = (EncodingKey, DecodingKey, Jwk);

fn generate_rsa(kid: &str, algorithm: JwtAlgorithm) -> Result<KeyParts, TokenError> {
    let private_key = RsaPrivateKey::new(&mut OsRng, RSA_KEY_BITS)
        .map_err(|e| TokenError::server(format!("RSA key generation failed: {e}")))?;
    let der = private_key
        .to_pkcs1_der()
        .map_err(|e| TokenError::server(format!("RSA key encoding failed: {e}")))?;
    let encoding_key = EncodingKey::from_rsa_der(der.as_bytes());

    let n = URL_SAFE_NO_PAD.encode(private_key.n().to_bytes_be());
    let e = URL_SAFE_NO_PAD.encode(private_key.e().to_bytes_be());
    let decoding_key = DecodingKey::from_rsa_components(&n, &e)
        .map_err(|err| TokenError::server(format!("RSA public key invalid: {err}")))?;

    Ok((encoding_key, decoding_key, Jwk::rsa(kid, algorithm, n, e)))
}

fn generate_p256(kid: &str) -> Result<KeyParts, TokenError> {
    let secret = p256::SecretKey::random(&mut OsRng);
    let der = secret
        .to_pkcs8_der()
        .map_err(|e| TokenError::server(format!("EC key encoding failed: {e}")))?;
    let encoding_key = EncodingKey::from_ec_der(der.as_bytes());

    let point = secret.public_key().to_encoded_point(false);
    let x = point
        .x()
        .ok_or_else(|| TokenError::server("missing x coordinate"))?;
    let y = point
        .y()
        .ok_or_else(|| TokenError::server("missing y coordinate"))?;
    let x = URL_SAFE_NO_PAD.encode(x);
    let y = URL_SAFE_NO_PAD.encode(y);
    let decoding_key = DecodingKey::from_ec_components(&x, &y)
        .map_err(|err| TokenError::server(format!("EC public key invalid: {err}")))?;

    Ok((encoding_key, decoding_key, Jwk::ec_p256(kid, x, y)))
}
