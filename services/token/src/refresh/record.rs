use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Issuance metadata for one access/refresh pair.
///
/// Records form a rotation chain through `parent_refresh_id`. Only `rotated`
/// and `revoked` ever change after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    pub id: String,
    pub user_id: Option<String>,
    pub client_id: String,
    pub scope: String,
    pub access_token: String,
    pub refresh_id: String,
    pub parent_refresh_id: Option<String>,
    pub rotated: bool,
    pub revoked: bool,
    pub access_expires_at: DateTime<Utc>,
    pub refresh_expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl TokenRecord {
    /// Neither rotated nor revoked: the only state eligible for rotation.
    pub fn is_live(&self) -> bool {
        !self.rotated && !self.revoked
    }

    pub fn is_refresh_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.refresh_expires_at
    }

    /// Subject of tokens minted from this record; client-only grants use the client id.
    pub fn subject(&self) -> &str {
        self.user_id.as_deref().unwrap_or(&self.client_id)
    }

    /// Refresh identifier truncated for logs.
    pub fn log_id(&self) -> &str {
        self.refresh_id.get(..8).unwrap_or(&self.refresh_id)
    }
}
