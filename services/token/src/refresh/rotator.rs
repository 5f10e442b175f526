use crate::error::TokenError;
use crate::issuer::{MintRequest, TokenIssuer, TokenPolicy, TokenSet};
use crate::metrics;
use crate::refresh::record::TokenRecord;
use crate::storage::TokenStore;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Rotates refresh tokens and burns a chain when a rotated token comes back.
pub struct RefreshRotationEngine {
    issuer: Arc<TokenIssuer>,
    tokens: Arc<dyn TokenStore>,
}

impl RefreshRotationEngine {
    /// Create an engine minting through `issuer`.
    #[must_use]
    pub fn new(issuer: Arc<TokenIssuer>, tokens: Arc<dyn TokenStore>) -> Self {
        Self { issuer, tokens }
    }

    /// Exchange a refresh identifier for a new access/refresh pair.
    ///
    /// # Errors
    ///
    /// `InvalidGrant` for unknown or revoked records, `ReuseDetected` for a
    /// replayed rotated record (the chain is revoked first), `RefreshExpired`,
    /// `ClientNotFound`, or `ServerError` on signing or store failure.
    pub async fn refresh(
        &self,
        refresh_id: &str,
        audience: &[String],
        policy: &TokenPolicy,
    ) -> Result<TokenSet, TokenError> {
        self.refresh_at(refresh_id, None, audience, policy, Utc::now())
            .await
    }

    /// [`Self::refresh`] for a presenting client, which must own the record.
    ///
    /// # Errors
    ///
    /// As [`Self::refresh`]; a client mismatch on a live record is `InvalidGrant`.
    pub async fn refresh_for_client(
        &self,
        refresh_id: &str,
        client_id: &str,
        policy: &TokenPolicy,
    ) -> Result<TokenSet, TokenError> {
        let audience = [client_id.to_string()];
        self.refresh_at(refresh_id, Some(client_id), &audience, policy, Utc::now())
            .await
    }

    /// Rotation at an explicit instant.
    ///
    /// # Errors
    ///
    /// See [`Self::refresh`].
    pub async fn refresh_at(
        &self,
        refresh_id: &str,
        expected_client: Option<&str>,
        audience: &[String],
        policy: &TokenPolicy,
        now: DateTime<Utc>,
    ) -> Result<TokenSet, TokenError> {
        let result = self
            .rotate(refresh_id, expected_client, audience, policy, now)
            .await;

        let status = match &result {
            Ok(_) => "success",
            Err(TokenError::ReuseDetected) => "reuse_detected",
            Err(TokenError::RefreshExpired) => "expired",
            Err(TokenError::ServerError(_)) => "error",
            Err(_) => "invalid",
        };
        metrics::record_token_refreshed(status);
        result
    }

    async fn rotate(
        &self,
        refresh_id: &str,
        expected_client: Option<&str>,
        audience: &[String],
        policy: &TokenPolicy,
        now: DateTime<Utc>,
    ) -> Result<TokenSet, TokenError> {
        let record = self
            .tokens
            .get_by_refresh_id(refresh_id)
            .await?
            .ok_or_else(|| TokenError::invalid_grant("unknown refresh token"))?;

        if record.revoked {
            return Err(TokenError::invalid_grant("refresh token revoked"));
        }

        // Already exchanged once: replay of a superseded link.
        if record.rotated {
            warn!(
                client_id = %record.client_id,
                refresh = record.log_id(),
                "Refresh token reuse detected - revoking chain"
            );
            self.revoke_chain(&record, "reuse_detected").await?;
            return Err(TokenError::ReuseDetected);
        }

        if let Some(client_id) = expected_client {
            if client_id != record.client_id {
                return Err(TokenError::invalid_grant("refresh token issued to another client"));
            }
        }

        if record.is_refresh_expired_at(now) {
            return Err(TokenError::RefreshExpired);
        }

        let client = self.issuer.resolve_client(&record.client_id).await?;

        let (tokens, child) = self
            .issuer
            .mint(
                &MintRequest {
                    user_id: record.user_id.as_deref(),
                    client_id: &client.client_id,
                    scope: &record.scope,
                    audience,
                    nonce: None,
                    parent_refresh_id: Some(&record.refresh_id),
                    with_id_token: false,
                },
                policy,
                now,
            )
            .await?;

        let child_id = child.id.clone();
        self.tokens.create_record(child).await?;

        match self.tokens.mark_rotated(&record.refresh_id).await {
            Ok(true) => {}
            Ok(false) => {
                // A concurrent exchange of the same token won the flip.
                warn!(
                    client_id = %record.client_id,
                    refresh = record.log_id(),
                    "Concurrent refresh of the same token - revoking chain"
                );
                self.revoke_chain(&record, "reuse_detected").await?;
                return Err(TokenError::ReuseDetected);
            }
            Err(err) => {
                if let Err(revoke_err) = self.tokens.revoke_record(&child_id).await {
                    error!(
                        record_id = %child_id,
                        error = %revoke_err,
                        "Failed to revoke orphaned child record"
                    );
                }
                return Err(err.into());
            }
        }

        info!(
            client_id = %record.client_id,
            parent_id = %record.id,
            record_id = %child_id,
            "Rotated refresh token"
        );

        Ok(tokens)
    }

    /// Revoke the record and all its descendants. A store failure is fatal.
    async fn revoke_chain(&self, record: &TokenRecord, reason: &str) -> Result<usize, TokenError> {
        let revoked = self
            .tokens
            .revoke_chain(&record.refresh_id)
            .await
            .map_err(|e| {
                error!(
                    client_id = %record.client_id,
                    error = %e,
                    "Chain revocation failed"
                );
                TokenError::server(format!("chain revocation failed: {e}"))
            })?;

        metrics::record_tokens_revoked(reason, revoked);
        metrics::record_security_event("REFRESH_REUSE_DETECTED");
        self.log_security_event(record, "REFRESH_REUSE_DETECTED", revoked);
        Ok(revoked)
    }

    fn log_security_event(&self, record: &TokenRecord, event_type: &str, revoked: usize) {
        warn!(
            event_type = %event_type,
            record_id = %record.id,
            client_id = %record.client_id,
            user_id = record.user_id.as_deref().unwrap_or("-"),
            revoked,
            "Security event"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JwtAlgorithm;
    use crate::issuer::IssueRequest;
    use crate::jwt::TokenCodec;
    use crate::keys::KeyRing;
    use crate::refresh::RefreshTokenGenerator;
    use crate::storage::{Client, MemoryStore};
    use std::time::Duration;

    fn policy() -> TokenPolicy {
        TokenPolicy {
            issuer: "https://issuer.test".to_string(),
            access_ttl: Duration::from_secs(600),
            id_token_ttl: Duration::from_secs(600),
            refresh_ttl: Duration::from_secs(86_400),
        }
    }

    async fn setup() -> (Arc<TokenIssuer>, RefreshRotationEngine, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        store
            .insert_client(Client {
                id: "1".to_string(),
                client_id: "c1".to_string(),
                name: "SPA".to_string(),
                redirect_uris: vec!["https://a/cb".to_string()],
                scopes: vec![],
                confidential: false,
                pkce_required: true,
            })
            .await;
        let ring = Arc::new(KeyRing::new(JwtAlgorithm::ES256, Duration::from_secs(900)));
        ring.initialize(Utc::now()).await.unwrap();
        let issuer = Arc::new(TokenIssuer::new(store.clone(), store.clone(), TokenCodec::new(ring)));
        let engine = RefreshRotationEngine::new(issuer.clone(), store.clone());
        (issuer, engine, store)
    }

    async fn issue(issuer: &TokenIssuer) -> TokenSet {
        issuer
            .issue(
                IssueRequest {
                    user_id: Some("u1".to_string()),
                    client_id: "c1".to_string(),
                    scope: "openid offline_access".to_string(),
                    ..IssueRequest::default()
                },
                &policy(),
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_rotation_links_child_to_parent() {
        let (issuer, engine, store) = setup().await;
        let first = issue(&issuer).await;
        let first_id = RefreshTokenGenerator::refresh_id(&first.refresh_token);

        let second = engine.refresh_for_client(&first_id, "c1", &policy()).await.unwrap();
        let second_id = RefreshTokenGenerator::refresh_id(&second.refresh_token);

        assert_ne!(first.access_token, second.access_token);
        assert_ne!(first.refresh_token, second.refresh_token);
        assert!(second.id_token.is_none());
        assert_eq!(second.scope, "openid offline_access");

        let parent = store.get_by_refresh_id(&first_id).await.unwrap().unwrap();
        let child = store.get_by_refresh_id(&second_id).await.unwrap().unwrap();
        assert!(parent.rotated);
        assert_eq!(child.parent_refresh_id.as_deref(), Some(first_id.as_str()));
        assert!(child.is_live());
    }

    #[tokio::test]
    async fn test_unknown_and_revoked() {
        let (issuer, engine, store) = setup().await;
        assert!(matches!(
            engine.refresh("nope", &[], &policy()).await,
            Err(TokenError::InvalidGrant(_))
        ));

        let tokens = issue(&issuer).await;
        let id = RefreshTokenGenerator::refresh_id(&tokens.refresh_token);
        store.revoke_by_refresh_id(&id).await.unwrap();
        assert!(matches!(
            engine.refresh(&id, &[], &policy()).await,
            Err(TokenError::InvalidGrant(_))
        ));
    }

    #[tokio::test]
    async fn test_expired_refresh() {
        let (issuer, engine, _) = setup().await;
        let tokens = issue(&issuer).await;
        let id = RefreshTokenGenerator::refresh_id(&tokens.refresh_token);

        let later = tokens.refresh_expires_at;
        let result = engine.refresh_at(&id, None, &[], &policy(), later).await;
        assert!(matches!(result, Err(TokenError::RefreshExpired)));
    }

    #[tokio::test]
    async fn test_wrong_client_does_not_rotate() {
        let (issuer, engine, store) = setup().await;
        let tokens = issue(&issuer).await;
        let id = RefreshTokenGenerator::refresh_id(&tokens.refresh_token);

        assert!(matches!(
            engine.refresh_for_client(&id, "c2", &policy()).await,
            Err(TokenError::InvalidGrant(_))
        ));
        assert!(store.get_by_refresh_id(&id).await.unwrap().unwrap().is_live());
    }

    #[tokio::test]
    async fn test_client_removed_after_issuance() {
        let (issuer, engine, store) = setup().await;
        let tokens = issue(&issuer).await;
        let id = RefreshTokenGenerator::refresh_id(&tokens.refresh_token);

        store.remove_client("c1").await;
        assert!(matches!(
            engine.refresh(&id, &[], &policy()).await,
            Err(TokenError::ClientNotFound(_))
        ));
    }
}
