//! Token issuance: claims, signed access and ID tokens, opaque refresh
//! secret, and the persisted [`TokenRecord`].

use crate::config::{chrono_duration, Config};
use crate::error::TokenError;
use crate::jwt::{ClaimsBuilder, TokenCodec};
use crate::metrics;
use crate::refresh::{RefreshTokenGenerator, TokenRecord};
use crate::storage::{Client, ClientStore, TokenStore};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Issuer identity and lifetimes applied to one issuance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPolicy {
    /// `iss` claim
    pub issuer: String,
    /// Access token lifetime
    pub access_ttl: Duration,
    /// ID token lifetime
    pub id_token_ttl: Duration,
    /// Refresh lifetime
    pub refresh_ttl: Duration,
}

impl TokenPolicy {
    /// Policy from configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            issuer: config.jwt_issuer.clone(),
            access_ttl: config.access_token_ttl,
            id_token_ttl: config.id_token_ttl,
            refresh_ttl: config.refresh_token_ttl,
        }
    }
}

/// A grant to mint tokens for.
#[derive(Debug, Clone, Default)]
pub struct IssueRequest {
    /// Authenticated user; `None` for client-only grants
    pub user_id: Option<String>,
    /// Public client identifier
    pub client_id: String,
    /// Space-delimited granted scope
    pub scope: String,
    /// `aud` claim; defaults to the client id when empty
    pub audience: Vec<String>,
    /// OIDC nonce for the ID token
    pub nonce: Option<String>,
}

/// Tokens handed to the client.
///
/// `refresh_token` is the raw secret. It is never stored and cannot be
/// retrieved again.
#[derive(Clone)]
pub struct TokenSet {
    /// Signed access token
    pub access_token: String,
    /// Opaque refresh secret
    pub refresh_token: String,
    /// Signed ID token; absent on refresh
    pub id_token: Option<String>,
    /// Access token lifetime in seconds
    pub expires_in: u64,
    /// Granted scope
    pub scope: String,
    /// Refresh expiry
    pub refresh_expires_at: DateTime<Utc>,
    /// Persisted record id
    pub record_id: String,
}

impl std::fmt::Debug for TokenSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSet")
            .field("record_id", &self.record_id)
            .field("expires_in", &self.expires_in)
            .field("scope", &self.scope)
            .field("id_token", &self.id_token.is_some())
            .finish_non_exhaustive()
    }
}

/// Inputs shared by initial issuance and rotation.
pub(crate) struct MintRequest<'a> {
    pub user_id: Option<&'a str>,
    pub client_id: &'a str,
    pub scope: &'a str,
    pub audience: &'a [String],
    pub nonce: Option<&'a str>,
    pub parent_refresh_id: Option<&'a str>,
    pub with_id_token: bool,
}

/// Orchestrates one token-minting cycle.
pub struct TokenIssuer {
    clients: Arc<dyn ClientStore>,
    tokens: Arc<dyn TokenStore>,
    codec: TokenCodec,
}

impl TokenIssuer {
    /// Create an issuer.
    #[must_use]
    pub fn new(clients: Arc<dyn ClientStore>, tokens: Arc<dyn TokenStore>, codec: TokenCodec) -> Self {
        Self {
            clients,
            tokens,
            codec,
        }
    }

    /// The codec used for signing.
    #[must_use]
    pub const fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Issue access, refresh and ID tokens and persist a root record.
    ///
    /// # Errors
    ///
    /// `ClientNotFound` for an unknown client; `NoActiveKey` or `ServerError`
    /// on signing or store failure.
    pub async fn issue(&self, request: IssueRequest, policy: &TokenPolicy) -> Result<TokenSet, TokenError> {
        self.issue_at(request, policy, Utc::now()).await
    }

    /// [`Self::issue`] at an explicit instant.
    ///
    /// # Errors
    ///
    /// See [`Self::issue`].
    pub async fn issue_at(
        &self,
        request: IssueRequest,
        policy: &TokenPolicy,
        now: DateTime<Utc>,
    ) -> Result<TokenSet, TokenError> {
        let client = self.resolve_client(&request.client_id).await?;

        let (tokens, record) = self
            .mint(
                &MintRequest {
                    user_id: request.user_id.as_deref(),
                    client_id: &client.client_id,
                    scope: &request.scope,
                    audience: &request.audience,
                    nonce: request.nonce.as_deref(),
                    parent_refresh_id: None,
                    with_id_token: true,
                },
                policy,
                now,
            )
            .await?;

        let record_id = record.id.clone();
        self.tokens.create_record(record).await?;

        let algorithm = self.codec.key_ring().algorithm().as_str();
        metrics::record_token_issued("access", algorithm);
        metrics::record_token_issued("id", algorithm);
        metrics::record_token_issued("refresh", algorithm);
        info!(
            client_id = %client.client_id,
            record_id = %record_id,
            "Issued token set"
        );

        Ok(tokens)
    }

    /// Client by public identifier.
    ///
    /// # Errors
    ///
    /// `ClientNotFound` if unknown; `ServerError` on store failure.
    pub async fn resolve_client(&self, client_id: &str) -> Result<Client, TokenError> {
        self.clients
            .get_client(client_id)
            .await?
            .ok_or_else(|| TokenError::ClientNotFound(client_id.to_string()))
    }

    /// Sign tokens and build the record to persist. Persists nothing.
    pub(crate) async fn mint(
        &self,
        request: &MintRequest<'_>,
        policy: &TokenPolicy,
        now: DateTime<Utc>,
    ) -> Result<(TokenSet, TokenRecord), TokenError> {
        let subject = request.user_id.unwrap_or(request.client_id);
        let audience = if request.audience.is_empty() {
            vec![request.client_id.to_string()]
        } else {
            request.audience.to_vec()
        };

        let claims = ClaimsBuilder::new(policy.issuer.clone())
            .subject(subject)
            .audience(audience)
            .client_id(request.client_id)
            .scope(request.scope)
            .nonce(request.nonce.map(str::to_string))
            .issued_at(now)
            .build()?;

        let access_token = self.codec.sign_access_token(&claims, policy.access_ttl).await?;
        let id_token = if request.with_id_token {
            Some(
                self.codec
                    .sign_id_token(&claims, policy.id_token_ttl, Some(&access_token))
                    .await?,
            )
        } else {
            None
        };

        let refresh_secret = RefreshTokenGenerator::generate();
        let refresh_expires_at = now + chrono_duration(policy.refresh_ttl);
        let record = TokenRecord {
            id: RefreshTokenGenerator::generate_record_id(),
            user_id: request.user_id.map(str::to_string),
            client_id: request.client_id.to_string(),
            scope: request.scope.to_string(),
            access_token: access_token.clone(),
            refresh_id: RefreshTokenGenerator::refresh_id(&refresh_secret),
            parent_refresh_id: request.parent_refresh_id.map(str::to_string),
            rotated: false,
            revoked: false,
            access_expires_at: now + chrono_duration(policy.access_ttl),
            refresh_expires_at,
            created_at: now,
        };

        let tokens = TokenSet {
            access_token,
            refresh_token: refresh_secret,
            id_token,
            expires_in: policy.access_ttl.as_secs(),
            scope: request.scope.to_string(),
            refresh_expires_at,
            record_id: record.id.clone(),
        };

        Ok((tokens, record))
    }
}
