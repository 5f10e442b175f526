//! Token endpoint facade over the core engines.
//!
//! Transport layers parse requests into [`TokenRequest`] and render
//! [`TokenResponse`] or [`ErrorResponse`].

pub mod types;

pub use types::{ErrorResponse, TokenRequest, TokenResponse, UserInfo};

use crate::authorize::AuthorizationCodeEngine;
use crate::config::Config;
use crate::discovery::DiscoveryDocument;
use crate::error::TokenError;
use crate::issuer::{IssueRequest, TokenIssuer, TokenPolicy};
use crate::jwks::Jwks;
use crate::jwt::TokenCodec;
use crate::keys::KeyRing;
use crate::metrics;
use crate::refresh::{RefreshRotationEngine, RefreshTokenGenerator};
use crate::storage::{AuthorizationCodeStore, ClientStore, TokenStore, UserStore};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};
use types::{GRANT_AUTHORIZATION_CODE, GRANT_REFRESH_TOKEN};

/// Extract the token from an `Authorization: Bearer` header value.
///
/// # Errors
///
/// Returns `InvalidToken` if the header is not a bearer credential.
pub fn bearer_token(header: &str) -> Result<&str, TokenError> {
    let mut parts = header.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None) if scheme.eq_ignore_ascii_case("bearer") => Ok(token),
        _ => Err(TokenError::invalid_token("invalid authorization header")),
    }
}

/// Token, revocation, userinfo and JWKS operations.
pub struct TokenEndpoint {
    key_ring: Arc<KeyRing>,
    codes: AuthorizationCodeEngine,
    issuer: Arc<TokenIssuer>,
    refresh: RefreshRotationEngine,
    users: Arc<dyn UserStore>,
    tokens: Arc<dyn TokenStore>,
    policy: TokenPolicy,
    discovery: DiscoveryDocument,
}

impl TokenEndpoint {
    /// Wire the core over a store implementing every collaborator trait.
    ///
    /// The key ring must already be initialized for grants to succeed.
    pub fn new<S>(config: &Config, key_ring: Arc<KeyRing>, store: Arc<S>) -> Self
    where
        S: ClientStore + UserStore + AuthorizationCodeStore + TokenStore + 'static,
    {
        let codes = AuthorizationCodeEngine::from_config(config, store.clone(), store.clone());
        let issuer = Arc::new(TokenIssuer::new(
            store.clone(),
            store.clone(),
            TokenCodec::new(key_ring.clone()),
        ));
        let refresh = RefreshRotationEngine::new(issuer.clone(), store.clone());

        Self {
            key_ring,
            codes,
            issuer,
            refresh,
            users: store.clone(),
            tokens: store,
            policy: TokenPolicy::from_config(config),
            discovery: DiscoveryDocument::for_issuer(
                &config.jwt_issuer,
                config.jwt_algorithm,
                config.pkce_allow_plain,
            ),
        }
    }

    /// Build a key ring from configuration, install its first key, and wire the core.
    ///
    /// # Errors
    ///
    /// Returns `ServerError` if the first key cannot be generated.
    pub async fn initialize<S>(config: &Config, store: Arc<S>) -> Result<Self, TokenError>
    where
        S: ClientStore + UserStore + AuthorizationCodeStore + TokenStore + 'static,
    {
        let key_ring = Arc::new(KeyRing::from_config(config));
        key_ring.initialize(Utc::now()).await?;
        Ok(Self::new(config, key_ring, store))
    }

    /// Authorization code engine, for the authorization endpoint.
    #[must_use]
    pub const fn authorization_codes(&self) -> &AuthorizationCodeEngine {
        &self.codes
    }

    /// Token issuer.
    #[must_use]
    pub const fn issuer(&self) -> &Arc<TokenIssuer> {
        &self.issuer
    }

    /// Key ring.
    #[must_use]
    pub const fn key_ring(&self) -> &Arc<KeyRing> {
        &self.key_ring
    }

    /// Provider metadata.
    #[must_use]
    pub const fn discovery(&self) -> &DiscoveryDocument {
        &self.discovery
    }

    /// Handle a token request, rendering failures as an OAuth error body.
    ///
    /// # Errors
    ///
    /// Returns the wire error body for any [`TokenError`].
    pub async fn token(&self, request: TokenRequest) -> Result<TokenResponse, ErrorResponse> {
        let state = request.state.clone();
        self.exchange(request).await.map_err(|err| {
            debug!(error = %err, code = err.error_code(), "Token request failed");
            ErrorResponse::from_error(&err, state)
        })
    }

    /// Handle a token request with typed errors.
    ///
    /// # Errors
    ///
    /// `UnsupportedGrantType`, `InvalidRequest` for missing parameters, and
    /// every error of the dispatched grant.
    pub async fn exchange(&self, request: TokenRequest) -> Result<TokenResponse, TokenError> {
        match request.grant_type.as_str() {
            GRANT_AUTHORIZATION_CODE => {
                self.rotate_keys_if_due().await;
                self.authorization_code_grant(&request).await
            }
            GRANT_REFRESH_TOKEN => {
                self.rotate_keys_if_due().await;
                self.refresh_token_grant(&request).await
            }
            other => Err(TokenError::UnsupportedGrantType(other.to_string())),
        }
    }

    async fn authorization_code_grant(&self, request: &TokenRequest) -> Result<TokenResponse, TokenError> {
        let code = TokenRequest::require(request.code.as_ref(), "code")?;
        let client_id = TokenRequest::require(request.client_id.as_ref(), "client_id")?;
        let redirect_uri = TokenRequest::require(request.redirect_uri.as_ref(), "redirect_uri")?;

        let redeemed = self
            .codes
            .redeem(code, client_id, redirect_uri, request.code_verifier.as_deref())
            .await?;

        let tokens = self
            .issuer
            .issue(
                IssueRequest {
                    user_id: Some(redeemed.user_id),
                    client_id: redeemed.client_id.clone(),
                    scope: redeemed.scopes.join(" "),
                    audience: vec![redeemed.client_id],
                    nonce: redeemed.nonce,
                },
                &self.policy,
            )
            .await?;

        Ok(tokens.into())
    }

    async fn refresh_token_grant(&self, request: &TokenRequest) -> Result<TokenResponse, TokenError> {
        let secret = TokenRequest::require(request.refresh_token.as_ref(), "refresh_token")?;
        let client_id = TokenRequest::require(request.client_id.as_ref(), "client_id")?;

        let refresh_id = RefreshTokenGenerator::refresh_id(secret);
        let tokens = self
            .refresh
            .refresh_for_client(&refresh_id, client_id, &self.policy)
            .await?;

        Ok(tokens.into())
    }

    /// Revoke a refresh token (RFC 7009). Unknown tokens succeed.
    ///
    /// # Errors
    ///
    /// `InvalidRequest` for an empty token; `ServerError` on store failure.
    pub async fn revoke(&self, token: &str) -> Result<(), TokenError> {
        if token.is_empty() {
            return Err(TokenError::invalid_request("token is required"));
        }

        let refresh_id = RefreshTokenGenerator::refresh_id(token);
        if self.tokens.revoke_by_refresh_id(&refresh_id).await? {
            metrics::record_tokens_revoked("client_request", 1);
            info!(refresh = refresh_id.get(..8).unwrap_or_default(), "Revoked refresh token");
        }
        Ok(())
    }

    /// Claims about the access token's subject.
    ///
    /// # Errors
    ///
    /// `InvalidToken` for invalid tokens or unknown subjects; `ServerError` on store failure.
    pub async fn userinfo(&self, access_token: &str) -> Result<UserInfo, TokenError> {
        let claims = self.issuer.codec().verify_access_token(access_token).await?;

        let user = self
            .users
            .get_user(&claims.sub)
            .await?
            .ok_or_else(|| TokenError::invalid_token("unknown subject"))?;

        Ok(UserInfo {
            sub: user.id,
            email: user.email,
            email_verified: user.email_verified,
        })
    }

    /// Public key set of the active and retired keys.
    pub async fn jwks(&self) -> Jwks {
        self.key_ring.public_key_set().await
    }

    async fn rotate_keys_if_due(&self) {
        if let Err(err) = self.key_ring.rotate_if_due(Utc::now()).await {
            warn!(error = %err, "Key rotation failed; continuing with current key");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token("Bearer abc.def.ghi").unwrap(), "abc.def.ghi");
        assert_eq!(bearer_token("bearer  abc").unwrap(), "abc");
        assert!(bearer_token("Basic abc").is_err());
        assert!(bearer_token("Bearer").is_err());
        assert!(bearer_token("Bearer a b").is_err());
    }
}
