//! Authorization code issuance and single redemption.

use crate::authorize::code::AuthorizationCode;
use crate::authorize::pkce::{self, PkceMethod};
use crate::config::{chrono_duration, Config};
use crate::error::TokenError;
use crate::metrics;
use crate::scope::ScopeSet;
use crate::storage::{AuthorizationCodeStore, ClientStore};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Parameters of an authorization request that passed user authentication.
#[derive(Debug, Clone, Default)]
pub struct CodeRequest {
    /// Public client identifier
    pub client_id: String,
    /// Redirect URI, must be registered
    pub redirect_uri: String,
    /// Space-delimited requested scope
    pub scope: String,
    /// PKCE code challenge
    pub code_challenge: Option<String>,
    /// PKCE method; absent means `plain`
    pub code_challenge_method: Option<String>,
    /// Authenticated user
    pub user_id: String,
    /// OIDC nonce echoed into the ID token
    pub nonce: Option<String>,
}

/// Issues and redeems authorization codes.
pub struct AuthorizationCodeEngine {
    clients: Arc<dyn ClientStore>,
    codes: Arc<dyn AuthorizationCodeStore>,
    code_ttl: Duration,
    allow_plain: bool,
    strict_format: bool,
}

impl AuthorizationCodeEngine {
    /// Create an engine with explicit policy.
    #[must_use]
    pub fn new(
        clients: Arc<dyn ClientStore>,
        codes: Arc<dyn AuthorizationCodeStore>,
        code_ttl: Duration,
        allow_plain: bool,
    ) -> Self {
        Self {
            clients,
            codes,
            code_ttl,
            allow_plain,
            strict_format: false,
        }
    }

    /// Require RFC 7636 length and charset on challenges and verifiers.
    ///
    /// Off by default: redemption then only compares the digest.
    #[must_use]
    pub fn with_strict_format(mut self, strict: bool) -> Self {
        self.strict_format = strict;
        self
    }

    /// Create an engine with TTL and PKCE policy from configuration.
    #[must_use]
    pub fn from_config(
        config: &Config,
        clients: Arc<dyn ClientStore>,
        codes: Arc<dyn AuthorizationCodeStore>,
    ) -> Self {
        Self::new(clients, codes, config.auth_code_ttl, config.pkce_allow_plain)
            .with_strict_format(config.pkce_strict_format)
    }

    /// Issue a code for an authenticated user. Returns the code value.
    ///
    /// # Errors
    ///
    /// `InvalidClient`, `InvalidRedirectUri`, `InvalidScope`, `InvalidRequest`
    /// or `UnsupportedPkceMethod` on validation failure; `ServerError` on store failure.
    pub async fn issue(&self, request: CodeRequest) -> Result<String, TokenError> {
        self.issue_at(request, Utc::now()).await
    }

    /// [`Self::issue`] at an explicit instant.
    ///
    /// # Errors
    ///
    /// See [`Self::issue`].
    pub async fn issue_at(&self, request: CodeRequest, now: DateTime<Utc>) -> Result<String, TokenError> {
        let client = self
            .clients
            .get_client(&request.client_id)
            .await?
            .ok_or_else(|| TokenError::InvalidClient(request.client_id.clone()))?;

        if !client.allows_redirect(&request.redirect_uri) {
            return Err(TokenError::InvalidRedirectUri(client.client_id));
        }
        if request.user_id.is_empty() {
            return Err(TokenError::invalid_request("user_id is required"));
        }

        let scopes = ScopeSet::parse(&request.scope);
        if !client.scopes.is_empty() && !scopes.is_subset_of(&client.scopes) {
            return Err(TokenError::InvalidScope(scopes.to_string()));
        }

        let method = match request.code_challenge.as_deref() {
            Some(challenge) => {
                let method = PkceMethod::parse(request.code_challenge_method.as_deref())?;
                self.check_method_allowed(method, &client.client_id)?;
                if challenge.is_empty() {
                    return Err(TokenError::invalid_request("code_challenge is empty"));
                }
                if self.strict_format {
                    pkce::validate_challenge(challenge, method)?;
                }
                Some(method)
            }
            None if client.requires_pkce() => {
                return Err(TokenError::invalid_request("code_challenge is required"));
            }
            None if request.code_challenge_method.is_some() => {
                return Err(TokenError::invalid_request(
                    "code_challenge_method without code_challenge",
                ));
            }
            None => None,
        };

        let code = AuthorizationCode {
            code: AuthorizationCode::generate_value(),
            client_id: client.client_id,
            user_id: request.user_id,
            redirect_uri: request.redirect_uri,
            scopes: scopes.into_vec(),
            code_challenge: request.code_challenge,
            code_challenge_method: method,
            nonce: request.nonce.filter(|n| !n.is_empty()),
            expires_at: now + chrono_duration(self.code_ttl),
            used: false,
            created_at: now,
        };
        let value = code.code.clone();

        info!(
            client_id = %code.client_id,
            user_id = %code.user_id,
            pkce = method.map_or("none", |m| m.as_str()),
            "Issued authorization code"
        );

        self.codes.create_code(code).await?;
        metrics::record_auth_code("issue", "success");
        Ok(value)
    }

    /// Redeem a code exactly once. Returns the code as stored, marked used.
    ///
    /// # Errors
    ///
    /// `InvalidGrant` if the code is unknown, used, expired, bound to another
    /// client or redirect URI, or fails PKCE; `ServerError` on store failure.
    pub async fn redeem(
        &self,
        code: &str,
        client_id: &str,
        redirect_uri: &str,
        code_verifier: Option<&str>,
    ) -> Result<AuthorizationCode, TokenError> {
        self.redeem_at(code, client_id, redirect_uri, code_verifier, Utc::now())
            .await
    }

    /// [`Self::redeem`] at an explicit instant.
    ///
    /// # Errors
    ///
    /// See [`Self::redeem`].
    pub async fn redeem_at(
        &self,
        code: &str,
        client_id: &str,
        redirect_uri: &str,
        code_verifier: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<AuthorizationCode, TokenError> {
        let result = self
            .check_redeemable(code, client_id, redirect_uri, code_verifier, now)
            .await;

        let mut stored = match result {
            Ok(stored) => stored,
            Err(err) => {
                metrics::record_auth_code("redeem", "rejected");
                debug!(client_id = %client_id, error = %err, "Authorization code rejected");
                return Err(err);
            }
        };

        // Conditional flip: a concurrent redemption that passed the checks
        // first leaves this one with `false`.
        if !self.codes.mark_code_used(code).await? {
            metrics::record_auth_code("redeem", "race_lost");
            warn!(client_id = %client_id, "Concurrent redemption of authorization code");
            return Err(TokenError::invalid_grant("authorization code already used"));
        }
        stored.used = true;

        metrics::record_auth_code("redeem", "success");
        info!(
            client_id = %stored.client_id,
            user_id = %stored.user_id,
            "Redeemed authorization code"
        );
        Ok(stored)
    }

    async fn check_redeemable(
        &self,
        code: &str,
        client_id: &str,
        redirect_uri: &str,
        code_verifier: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<AuthorizationCode, TokenError> {
        let stored = self
            .codes
            .get_code(code)
            .await?
            .ok_or_else(|| TokenError::invalid_grant("unknown authorization code"))?;

        if !stored.is_redeemable_at(now, client_id, redirect_uri) {
            let reason = if stored.used {
                "authorization code already used"
            } else if stored.is_expired_at(now) {
                "authorization code expired"
            } else if stored.client_id != client_id {
                "client_id mismatch"
            } else {
                "redirect_uri mismatch"
            };
            return Err(TokenError::invalid_grant(reason));
        }

        if let Some(challenge) = stored.code_challenge.as_deref() {
            let method = stored.code_challenge_method.unwrap_or(PkceMethod::Plain);
            let verifier = code_verifier
                .ok_or_else(|| TokenError::invalid_grant("code_verifier is required"))?;
            if self.strict_format {
                pkce::validate_verifier(verifier)?;
            }
            if !pkce::verify(method, challenge, verifier) {
                return Err(TokenError::invalid_grant("PKCE verification failed"));
            }
        }

        Ok(stored)
    }

    fn check_method_allowed(&self, method: PkceMethod, client_id: &str) -> Result<(), TokenError> {
        if method != PkceMethod::Plain {
            return Ok(());
        }
        if !self.allow_plain {
            return Err(TokenError::UnsupportedPkceMethod("plain".to_string()));
        }
        warn!(client_id = %client_id, "Client uses discouraged PKCE method plain");
        Ok(())
    }
}
