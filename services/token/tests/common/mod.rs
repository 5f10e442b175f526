//! Shared setup for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use oidc_token_service::refresh::TokenRecord;
use oidc_token_service::storage::{Client, TokenStore, User};
use oidc_token_service::{
    AuthorizationCodeEngine, Config, JwtAlgorithm, KeyRing, MemoryStore, RefreshRotationEngine,
    TokenCodec, TokenEndpoint, TokenIssuer, TokenPolicy,
};
use rust_common::PlatformError;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use test_utils::fixtures::{SampleClient, SampleUser};

pub const ISSUER: &str = "https://sso.test";

pub fn client_from(sample: &SampleClient) -> Client {
    Client {
        id: format!("id-{}", sample.client_id),
        client_id: sample.client_id.to_string(),
        name: sample.name.to_string(),
        redirect_uris: sample.redirect_uris.iter().map(ToString::to_string).collect(),
        scopes: sample.scopes.iter().map(ToString::to_string).collect(),
        confidential: sample.confidential,
        pkce_required: sample.pkce_required,
    }
}

pub fn user_from(sample: &SampleUser) -> User {
    User {
        id: sample.id.to_string(),
        email: sample.email.to_string(),
        email_verified: sample.email_verified,
    }
}

/// ES256 configuration; P-256 keys generate fast enough for property runs.
pub fn config() -> Config {
    let vars: HashMap<&str, &str> = [
        ("JWT_ISSUER", ISSUER),
        ("JWT_ALGORITHM", "ES256"),
        ("ACCESS_TOKEN_TTL", "600"),
        ("REFRESH_TOKEN_TTL", "86400"),
        ("AUTH_CODE_TTL", "300"),
    ]
    .into_iter()
    .collect();
    Config::from_vars(|name| vars.get(name).map(ToString::to_string)).unwrap()
}

pub fn policy() -> TokenPolicy {
    TokenPolicy::from_config(&config())
}

pub async fn seeded_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    store.insert_client(client_from(&SampleClient::public_spa())).await;
    store
        .insert_client(client_from(&SampleClient::confidential_backend()))
        .await;
    store.insert_user(user_from(&SampleUser::alice())).await;
    store
}

pub async fn key_ring() -> Arc<KeyRing> {
    let ring = Arc::new(KeyRing::new(JwtAlgorithm::ES256, Duration::from_secs(900)));
    ring.initialize(Utc::now()).await.unwrap();
    ring
}

pub async fn endpoint() -> (TokenEndpoint, Arc<MemoryStore>) {
    let store = seeded_store().await;
    let endpoint = TokenEndpoint::new(&config(), key_ring().await, store.clone());
    (endpoint, store)
}

/// Engines wired over one store, for tests that drive them directly.
pub struct Core {
    pub store: Arc<MemoryStore>,
    pub ring: Arc<KeyRing>,
    pub issuer: Arc<TokenIssuer>,
    pub codes: AuthorizationCodeEngine,
    pub refresh: RefreshRotationEngine,
}

pub async fn core() -> Core {
    let store = seeded_store().await;
    core_over(store.clone(), store).await
}

pub async fn core_over(store: Arc<MemoryStore>, tokens: Arc<dyn TokenStore>) -> Core {
    let ring = key_ring().await;
    let issuer = Arc::new(TokenIssuer::new(
        store.clone(),
        tokens.clone(),
        TokenCodec::new(ring.clone()),
    ));
    let codes = AuthorizationCodeEngine::from_config(&config(), store.clone(), store.clone());
    let refresh = RefreshRotationEngine::new(issuer.clone(), tokens);
    Core {
        store,
        ring,
        issuer,
        codes,
        refresh,
    }
}

/// Token store whose chain revocation always fails.
pub struct FailingRevokeStore {
    pub inner: Arc<MemoryStore>,
}

#[async_trait]
impl TokenStore for FailingRevokeStore {
    async fn create_record(&self, record: TokenRecord) -> Result<(), PlatformError> {
        self.inner.create_record(record).await
    }

    async fn get_by_refresh_id(&self, refresh_id: &str) -> Result<Option<TokenRecord>, PlatformError> {
        self.inner.get_by_refresh_id(refresh_id).await
    }

    async fn mark_rotated(&self, refresh_id: &str) -> Result<bool, PlatformError> {
        self.inner.mark_rotated(refresh_id).await
    }

    async fn revoke_record(&self, record_id: &str) -> Result<bool, PlatformError> {
        self.inner.revoke_record(record_id).await
    }

    async fn revoke_by_refresh_id(&self, refresh_id: &str) -> Result<bool, PlatformError> {
        self.inner.revoke_by_refresh_id(refresh_id).await
    }

    async fn revoke_chain(&self, _refresh_id: &str) -> Result<usize, PlatformError> {
        Err(PlatformError::unavailable("token store offline"))
    }
}
