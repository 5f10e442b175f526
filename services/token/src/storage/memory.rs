//! In-process store implementing every collaborator trait.
//!
//! Each conditional update runs under a single write lock, which makes it
//! atomic for all tasks sharing this instance.

use crate::authorize::AuthorizationCode;
use crate::refresh::TokenRecord;
use crate::storage::{AuthorizationCodeStore, Client, ClientStore, TokenStore, User, UserStore};
use async_trait::async_trait;
use rust_common::PlatformError;
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;

/// Memory-backed store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    clients: RwLock<HashMap<String, Client>>,
    users: RwLock<HashMap<String, User>>,
    codes: RwLock<HashMap<String, AuthorizationCode>>,
    records: RwLock<HashMap<String, TokenRecord>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace a client.
    pub async fn insert_client(&self, client: Client) {
        self.clients
            .write()
            .await
            .insert(client.client_id.clone(), client);
    }

    /// Register or replace a user.
    pub async fn insert_user(&self, user: User) {
        self.users.write().await.insert(user.id.clone(), user);
    }

    /// Remove a client registration.
    pub async fn remove_client(&self, client_id: &str) -> bool {
        self.clients.write().await.remove(client_id).is_some()
    }

    /// All records issued to a client, oldest first.
    pub async fn records_for_client(&self, client_id: &str) -> Vec<TokenRecord> {
        let mut records: Vec<TokenRecord> = self
            .records
            .read()
            .await
            .values()
            .filter(|r| r.client_id == client_id)
            .cloned()
            .collect();
        records.sort_by_key(|r| r.created_at);
        records
    }
}

#[async_trait]
impl ClientStore for MemoryStore {
    async fn get_client(&self, client_id: &str) -> Result<Option<Client>, PlatformError> {
        Ok(self.clients.read().await.get(client_id).cloned())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn get_user(&self, id: &str) -> Result<Option<User>, PlatformError> {
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, PlatformError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }
}

#[async_trait]
impl AuthorizationCodeStore for MemoryStore {
    async fn create_code(&self, code: AuthorizationCode) -> Result<(), PlatformError> {
        let mut codes = self.codes.write().await;
        if codes.contains_key(&code.code) {
            return Err(PlatformError::duplicate("authorization code"));
        }
        codes.insert(code.code.clone(), code);
        Ok(())
    }

    async fn get_code(&self, code: &str) -> Result<Option<AuthorizationCode>, PlatformError> {
        Ok(self.codes.read().await.get(code).cloned())
    }

    async fn mark_code_used(&self, code: &str) -> Result<bool, PlatformError> {
        let mut codes = self.codes.write().await;
        match codes.get_mut(code) {
            Some(stored) if !stored.used => {
                stored.used = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl TokenStore for MemoryStore {
    async fn create_record(&self, record: TokenRecord) -> Result<(), PlatformError> {
        let mut records = self.records.write().await;
        if records.contains_key(&record.refresh_id) {
            return Err(PlatformError::duplicate("refresh identifier"));
        }
        records.insert(record.refresh_id.clone(), record);
        Ok(())
    }

    async fn get_by_refresh_id(&self, refresh_id: &str) -> Result<Option<TokenRecord>, PlatformError> {
        Ok(self.records.read().await.get(refresh_id).cloned())
    }

    async fn mark_rotated(&self, refresh_id: &str) -> Result<bool, PlatformError> {
        let mut records = self.records.write().await;
        match records.get_mut(refresh_id) {
            Some(record) if record.is_live() => {
                record.rotated = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn revoke_record(&self, record_id: &str) -> Result<bool, PlatformError> {
        let mut records = self.records.write().await;
        match records.values_mut().find(|r| r.id == record_id) {
            Some(record) if !record.revoked => {
                record.revoked = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn revoke_by_refresh_id(&self, refresh_id: &str) -> Result<bool, PlatformError> {
        let mut records = self.records.write().await;
        match records.get_mut(refresh_id) {
            Some(record) if !record.revoked => {
                record.revoked = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn revoke_chain(&self, refresh_id: &str) -> Result<usize, PlatformError> {
        let mut records = self.records.write().await;
        let mut pending = vec![refresh_id.to_string()];
        let mut visited = HashSet::new();
        let mut revoked = 0;

        while let Some(current) = pending.pop() {
            if !visited.insert(current.clone()) {
                continue;
            }
            if let Some(record) = records.get_mut(&current) {
                if !record.revoked {
                    record.revoked = true;
                    revoked += 1;
                }
            }
            pending.extend(
                records
                    .values()
                    .filter(|r| r.parent_refresh_id.as_deref() == Some(current.as_str()))
                    .map(|r| r.refresh_id.clone()),
            );
        }

        Ok(revoked)
    }
}
