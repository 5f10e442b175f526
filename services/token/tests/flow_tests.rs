//! End-to-end flows through the token endpoint.

mod common;

use oidc_token_service::endpoint::{bearer_token, TokenRequest};
use oidc_token_service::{CodeRequest, TokenEndpoint};
use test_utils::fixtures::{RFC7636_CHALLENGE, RFC7636_VERIFIER};

const REDIRECT: &str = "https://a/cb";

async fn authorize(endpoint: &TokenEndpoint, nonce: Option<&str>) -> String {
    endpoint
        .authorization_codes()
        .issue(CodeRequest {
            client_id: "c1".to_string(),
            redirect_uri: REDIRECT.to_string(),
            scope: "openid email offline_access".to_string(),
            code_challenge: Some(RFC7636_CHALLENGE.to_string()),
            code_challenge_method: Some("S256".to_string()),
            user_id: "u1".to_string(),
            nonce: nonce.map(str::to_string),
        })
        .await
        .unwrap()
}

fn code_grant(code: &str) -> TokenRequest {
    TokenRequest {
        grant_type: "authorization_code".to_string(),
        code: Some(code.to_string()),
        redirect_uri: Some(REDIRECT.to_string()),
        client_id: Some("c1".to_string()),
        code_verifier: Some(RFC7636_VERIFIER.to_string()),
        ..TokenRequest::default()
    }
}

fn refresh_grant(refresh_token: &str) -> TokenRequest {
    TokenRequest {
        grant_type: "refresh_token".to_string(),
        client_id: Some("c1".to_string()),
        refresh_token: Some(refresh_token.to_string()),
        ..TokenRequest::default()
    }
}

#[tokio::test]
async fn test_code_exchange_then_replay() {
    let (endpoint, _) = common::endpoint().await;
    let code = authorize(&endpoint, Some("n-0S6")).await;

    let response = endpoint.token(code_grant(&code)).await.unwrap();
    assert!(!response.access_token.is_empty());
    assert!(!response.refresh_token.is_empty());
    assert_eq!(response.token_type, "Bearer");
    assert_eq!(response.expires_in, 600);
    assert_eq!(response.scope, "openid email offline_access");

    let id_token = response.id_token.as_deref().unwrap();
    let id = endpoint
        .issuer()
        .codec()
        .verify_id_token(id_token)
        .await
        .unwrap();
    assert_eq!(id.claims.sub, "u1");
    assert_eq!(id.claims.nonce, "n-0S6");
    assert_eq!(id.claims.iss, common::ISSUER);

    let replay = endpoint.token(code_grant(&code)).await.unwrap_err();
    assert_eq!(replay.error, "invalid_grant");
    assert_eq!(replay.status, 400);
}

#[tokio::test]
async fn test_refresh_rotation_and_reuse() {
    let (endpoint, _) = common::endpoint().await;
    let code = authorize(&endpoint, None).await;
    let first = endpoint.token(code_grant(&code)).await.unwrap();

    let second = endpoint
        .token(refresh_grant(&first.refresh_token))
        .await
        .unwrap();
    assert_ne!(second.access_token, first.access_token);
    assert_ne!(second.refresh_token, first.refresh_token);
    assert!(second.id_token.is_none());
    assert!(!serde_json::to_string(&second).unwrap().contains("id_token"));

    let third = endpoint
        .token(refresh_grant(&second.refresh_token))
        .await
        .unwrap();

    // Replay of the first refresh token burns the chain.
    let reuse = endpoint
        .token(refresh_grant(&first.refresh_token))
        .await
        .unwrap_err();
    assert_eq!(reuse.error, "invalid_grant");

    let head = endpoint
        .token(refresh_grant(&third.refresh_token))
        .await
        .unwrap_err();
    assert_eq!(head.error, "invalid_grant");
}

#[tokio::test]
async fn test_error_body_echoes_state() {
    let (endpoint, _) = common::endpoint().await;
    let request = TokenRequest {
        grant_type: "password".to_string(),
        state: Some("af0ifjsldkj".to_string()),
        ..TokenRequest::default()
    };

    let err = endpoint.token(request).await.unwrap_err();
    assert_eq!(err.error, "unsupported_grant_type");
    assert_eq!(err.state.as_deref(), Some("af0ifjsldkj"));

    let missing = TokenRequest {
        code: None,
        ..code_grant("unused")
    };
    let err = endpoint.token(missing).await.unwrap_err();
    assert_eq!(err.error, "invalid_request");
}

#[tokio::test]
async fn test_refresh_by_other_client_rejected() {
    let (endpoint, _) = common::endpoint().await;
    let code = authorize(&endpoint, None).await;
    let tokens = endpoint.token(code_grant(&code)).await.unwrap();

    let stolen = TokenRequest {
        client_id: Some("backend".to_string()),
        ..refresh_grant(&tokens.refresh_token)
    };
    assert_eq!(endpoint.token(stolen).await.unwrap_err().error, "invalid_grant");

    // The rightful client is unaffected.
    assert!(endpoint
        .token(refresh_grant(&tokens.refresh_token))
        .await
        .is_ok());
}

#[tokio::test]
async fn test_revoke_refresh_token() {
    let (endpoint, store) = common::endpoint().await;
    let code = authorize(&endpoint, None).await;
    let tokens = endpoint.token(code_grant(&code)).await.unwrap();

    endpoint.revoke(&tokens.refresh_token).await.unwrap();
    endpoint.revoke("never-issued").await.unwrap();
    assert!(endpoint.revoke("").await.is_err());

    let err = endpoint
        .token(refresh_grant(&tokens.refresh_token))
        .await
        .unwrap_err();
    assert_eq!(err.error, "invalid_grant");
    assert!(store.records_for_client("c1").await.iter().all(|r| r.revoked));
}

#[tokio::test]
async fn test_userinfo() {
    let (endpoint, _) = common::endpoint().await;
    let code = authorize(&endpoint, None).await;
    let tokens = endpoint.token(code_grant(&code)).await.unwrap();

    let header = format!("Bearer {}", tokens.access_token);
    let info = endpoint
        .userinfo(bearer_token(&header).unwrap())
        .await
        .unwrap();
    assert_eq!(info.sub, "u1");
    assert_eq!(info.email, "alice@example.com");
    assert!(info.email_verified);

    assert!(endpoint.userinfo("not-a-token").await.is_err());
}

#[tokio::test]
async fn test_jwks_and_discovery() {
    let (endpoint, _) = common::endpoint().await;
    let code = authorize(&endpoint, None).await;
    let tokens = endpoint.token(code_grant(&code)).await.unwrap();

    let kid = jsonwebtoken::decode_header(&tokens.access_token)
        .unwrap()
        .kid
        .unwrap();
    let jwks = endpoint.jwks().await;
    let jwk = jwks.find_key(&kid).unwrap();
    assert_eq!(jwk.alg, "ES256");

    let discovery = endpoint.discovery();
    assert_eq!(discovery.issuer, common::ISSUER);
    assert_eq!(discovery.jwks_uri, format!("{}/jwks.json", common::ISSUER));
    assert_eq!(discovery.id_token_signing_alg_values_supported, vec!["ES256"]);
}

#[tokio::test]
async fn test_initialize_builds_key_ring() {
    let store = common::seeded_store().await;
    let endpoint = TokenEndpoint::initialize(&common::config(), store)
        .await
        .unwrap();

    assert_eq!(endpoint.jwks().await.keys.len(), 1);
    assert!(endpoint.key_ring().current_signing_key().await.is_ok());
}
