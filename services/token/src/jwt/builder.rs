use crate::error::TokenError;
use crate::jwt::claims::Claims;
use chrono::{DateTime, Utc};

/// Fluent construction of [`Claims`].
pub struct ClaimsBuilder {
    issuer: String,
    subject: Option<String>,
    audience: Vec<String>,
    client_id: Option<String>,
    scope: String,
    nonce: Option<String>,
    issued_at: Option<DateTime<Utc>>,
}

impl ClaimsBuilder {
    pub fn new(issuer: impl Into<String>) -> Self {
        ClaimsBuilder {
            issuer: issuer.into(),
            subject: None,
            audience: Vec::new(),
            client_id: None,
            scope: String::new(),
            nonce: None,
            issued_at: None,
        }
    }

    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn audience(mut self, audience: Vec<String>) -> Self {
        self.audience = audience;
        self
    }

    pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    pub fn scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    pub fn nonce(mut self, nonce: Option<String>) -> Self {
        self.nonce = nonce;
        self
    }

    pub fn issued_at(mut self, issued_at: DateTime<Utc>) -> Self {
        self.issued_at = Some(issued_at);
        self
    }

    /// # Errors
    ///
    /// Returns `InvalidRequest` if the subject or client is missing.
    pub fn build(self) -> Result<Claims, TokenError> {
        let subject = self
            .subject
            .filter(|s| !s.is_empty())
            .ok_or_else(|| TokenError::invalid_request("subject is required"))?;
        let client_id = self
            .client_id
            .filter(|c| !c.is_empty())
            .ok_or_else(|| TokenError::invalid_request("client_id is required"))?;

        let mut claims = Claims::new(
            self.issuer,
            subject,
            self.audience,
            self.issued_at.unwrap_or_else(Utc::now),
        )
        .with_client_id(client_id)
        .with_scope(self.scope);

        if let Some(nonce) = self.nonce {
            claims = claims.with_nonce(nonce);
        }

        Ok(claims)
    }
}
