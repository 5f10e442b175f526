//! Store collaborators.
//!
//! The core depends on these traits only. Conditional updates
//! (`mark_code_used`, `mark_rotated`) must be atomic in the backing store:
//! they report a lost race through their `bool` result, never as an error.

pub mod memory;
pub mod models;

use crate::authorize::AuthorizationCode;
use crate::refresh::TokenRecord;
use async_trait::async_trait;
use rust_common::PlatformError;

pub use memory::MemoryStore;
pub use models::{Client, User};

/// Registered client lookup.
#[async_trait]
pub trait ClientStore: Send + Sync {
    /// Client by public identifier.
    async fn get_client(&self, client_id: &str) -> Result<Option<Client>, PlatformError>;
}

/// End-user lookup.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// User by id.
    async fn get_user(&self, id: &str) -> Result<Option<User>, PlatformError>;

    /// User by email address.
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, PlatformError>;
}

/// Authorization code persistence.
#[async_trait]
pub trait AuthorizationCodeStore: Send + Sync {
    /// Persist a new code. Fails with `Duplicate` if the value exists.
    async fn create_code(&self, code: AuthorizationCode) -> Result<(), PlatformError>;

    /// Code by value.
    async fn get_code(&self, code: &str) -> Result<Option<AuthorizationCode>, PlatformError>;

    /// Set `used = true` only if it was false. Returns whether this call flipped it.
    async fn mark_code_used(&self, code: &str) -> Result<bool, PlatformError>;
}

/// Token record persistence, keyed by refresh identifier.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Persist a new record. Fails with `Duplicate` if the refresh identifier exists.
    async fn create_record(&self, record: TokenRecord) -> Result<(), PlatformError>;

    /// Record by refresh identifier.
    async fn get_by_refresh_id(&self, refresh_id: &str) -> Result<Option<TokenRecord>, PlatformError>;

    /// Set `rotated = true` only if the record is live. Returns whether this call flipped it.
    async fn mark_rotated(&self, refresh_id: &str) -> Result<bool, PlatformError>;

    /// Revoke a single record by record id. Returns whether it was newly revoked.
    async fn revoke_record(&self, record_id: &str) -> Result<bool, PlatformError>;

    /// Revoke a single record by refresh identifier. Returns whether it was newly revoked.
    async fn revoke_by_refresh_id(&self, refresh_id: &str) -> Result<bool, PlatformError>;

    /// Revoke the record and every descendant reachable through parent links.
    /// Returns the number of records newly revoked.
    async fn revoke_chain(&self, refresh_id: &str) -> Result<usize, PlatformError>;
}
