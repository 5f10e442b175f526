//! Key ring integration tests.
//!
//! Covers RSA and EC key material end to end: JWKS publication, signing
//! with the active key, and verification across rotations.

mod common;

use chrono::{Duration as ChronoDuration, Utc};
use oidc_token_service::jwt::{ClaimsBuilder, TokenCodec};
use oidc_token_service::{JwtAlgorithm, KeyRing, TokenError};
use std::sync::Arc;
use std::time::Duration;

fn claims() -> oidc_token_service::jwt::Claims {
    ClaimsBuilder::new(common::ISSUER)
        .subject("u1")
        .audience(vec!["c1".to_string()])
        .client_id("c1")
        .scope("openid")
        .build()
        .unwrap()
}

async fn ring(algorithm: JwtAlgorithm) -> Arc<KeyRing> {
    let ring = Arc::new(KeyRing::new(algorithm, Duration::from_secs(900)));
    ring.initialize(Utc::now()).await.unwrap();
    ring
}

#[tokio::test]
async fn test_rs256_round_trip_and_jwk() {
    let ring = ring(JwtAlgorithm::RS256).await;
    let codec = TokenCodec::new(ring.clone());

    let token = codec
        .sign_access_token(&claims(), Duration::from_secs(300))
        .await
        .unwrap();
    let decoded = codec.verify_access_token(&token).await.unwrap();
    assert_eq!(decoded.sub, "u1");

    let jwks = ring.public_key_set().await;
    assert_eq!(jwks.keys.len(), 1);
    let jwk = &jwks.keys[0];
    assert_eq!(jwk.kty, "RSA");
    assert_eq!(jwk.alg, "RS256");
    assert_eq!(jwk.key_use, "sig");
    assert_eq!(jwk.e.as_deref(), Some("AQAB"));
    // 2048-bit modulus: 256 bytes, 342 unpadded base64url characters
    assert_eq!(jwk.n.as_deref().map(str::len), Some(342));
    assert!(jwk.x.is_none());
}

#[tokio::test]
async fn test_ps256_round_trip() {
    let ring = ring(JwtAlgorithm::PS256).await;
    let codec = TokenCodec::new(ring.clone());

    let token = codec
        .sign_access_token(&claims(), Duration::from_secs(300))
        .await
        .unwrap();
    assert!(codec.verify_access_token(&token).await.is_ok());
    assert_eq!(ring.public_key_set().await.keys[0].alg, "PS256");
}

#[tokio::test]
async fn test_es256_jwk_has_curve_point_only() {
    let ring = ring(JwtAlgorithm::ES256).await;
    let jwks = ring.public_key_set().await;
    let jwk = &jwks.keys[0];

    assert_eq!(jwk.kty, "EC");
    assert_eq!(jwk.crv.as_deref(), Some("P-256"));
    // 32-byte coordinates encode to 43 characters
    assert_eq!(jwk.x.as_deref().map(str::len), Some(43));
    assert_eq!(jwk.y.as_deref().map(str::len), Some(43));
    assert!(jwk.n.is_none());

    let json = jwks.to_json();
    assert!(json.contains("\"use\":\"sig\""));
    assert!(!json.contains("\"d\""));
}

#[tokio::test]
async fn test_token_from_retired_key_still_verifies() {
    let ring = ring(JwtAlgorithm::ES256).await;
    let codec = TokenCodec::new(ring.clone());
    let before = codec
        .sign_access_token(&claims(), Duration::from_secs(300))
        .await
        .unwrap();
    let old_kid = ring.current_signing_key().await.unwrap().kid().to_string();

    let later = Utc::now() + ChronoDuration::seconds(901);
    assert!(ring.rotate_if_due(later).await.unwrap());

    let after = codec
        .sign_access_token(&claims(), Duration::from_secs(300))
        .await
        .unwrap();
    let new_kid = ring.current_signing_key().await.unwrap().kid().to_string();
    assert_ne!(old_kid, new_kid);

    assert!(codec.verify_access_token(&before).await.is_ok());
    assert!(codec.verify_access_token(&after).await.is_ok());

    let kids: Vec<_> = ring
        .public_key_set()
        .await
        .keys
        .into_iter()
        .map(|k| k.kid)
        .collect();
    assert_eq!(kids, vec![new_kid, old_kid]);
}

#[tokio::test]
async fn test_evicted_key_no_longer_verifies() {
    let ring = Arc::new(
        KeyRing::new(JwtAlgorithm::ES256, Duration::from_secs(900))
            .with_retired_retention(Duration::from_secs(60)),
    );
    let start = Utc::now();
    ring.initialize(start).await.unwrap();
    let codec = TokenCodec::new(ring.clone());
    let token = codec
        .sign_access_token(&claims(), Duration::from_secs(300))
        .await
        .unwrap();

    assert!(ring
        .rotate_if_due(start + ChronoDuration::seconds(900))
        .await
        .unwrap());
    assert!(codec.verify_access_token(&token).await.is_ok());

    assert!(ring
        .rotate_if_due(start + ChronoDuration::seconds(1800))
        .await
        .unwrap());
    assert_eq!(ring.retired_count().await, 1);
    assert!(matches!(
        codec.verify_access_token(&token).await,
        Err(TokenError::InvalidToken(_))
    ));
}

#[test]
fn test_from_config_uses_configured_algorithm() {
    let config = common::config();
    let ring = KeyRing::from_config(&config);
    assert_eq!(ring.algorithm(), JwtAlgorithm::ES256);
    assert!(matches!(
        tokio_test::block_on(ring.current_signing_key()),
        Err(TokenError::NoActiveKey)
    ));
}
