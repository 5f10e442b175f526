//! Key ring: one active signing key plus retired keys still trusted for
//! verification.
//!
//! Readers share the lock; rotation takes the write lock only for the swap.
//! Key generation runs on a blocking thread outside the lock, so a slow RSA
//! generation never stalls concurrent signing or verification.

use crate::config::{Config, JwtAlgorithm};
use crate::error::TokenError;
use crate::jwks::Jwks;
use crate::keys::material::SigningKey;
use crate::metrics;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info};

#[derive(Debug)]
struct RetiredKey {
    key: Arc<SigningKey>,
    retired_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct RingState {
    active: Option<Arc<SigningKey>>,
    retired: Vec<RetiredKey>,
    last_rotation: Option<DateTime<Utc>>,
}

impl RingState {
    fn is_due(&self, now: DateTime<Utc>, period: Duration) -> bool {
        if self.active.is_none() {
            return true;
        }
        self.last_rotation
            .map_or(true, |last| elapsed(last, now).is_some_and(|e| e >= period))
    }

    fn evict_expired(&mut self, now: DateTime<Utc>, retention: Duration) -> usize {
        let before = self.retired.len();
        self.retired
            .retain(|r| elapsed(r.retired_at, now).map_or(true, |age| age < retention));
        before - self.retired.len()
    }
}

/// Elapsed wall time, `None` when `now` is before `since`.
fn elapsed(since: DateTime<Utc>, now: DateTime<Utc>) -> Option<Duration> {
    (now - since).to_std().ok()
}

/// Holder of the active and retired signing keys.
#[derive(Debug)]
pub struct KeyRing {
    algorithm: JwtAlgorithm,
    rotation_period: Duration,
    retired_retention: Option<Duration>,
    state: RwLock<RingState>,
}

impl KeyRing {
    /// Create an empty ring. [`KeyRing::initialize`] installs the first key.
    #[must_use]
    pub fn new(algorithm: JwtAlgorithm, rotation_period: Duration) -> Self {
        Self {
            algorithm,
            rotation_period,
            retired_retention: None,
            state: RwLock::new(RingState::default()),
        }
    }

    /// Create an empty ring from configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        let ring = Self::new(config.jwt_algorithm, config.key_rotation_period);
        match config.retired_key_retention {
            Some(retention) => ring.with_retired_retention(retention),
            None => ring,
        }
    }

    /// Evict retired keys once they have been retired longer than `retention`.
    #[must_use]
    pub const fn with_retired_retention(mut self, retention: Duration) -> Self {
        self.retired_retention = Some(retention);
        self
    }

    /// Algorithm of keys minted by this ring.
    #[must_use]
    pub const fn algorithm(&self) -> JwtAlgorithm {
        self.algorithm
    }

    /// Install the first active key if none exists. Returns the active kid.
    ///
    /// # Errors
    ///
    /// Returns `ServerError` if key generation fails.
    pub async fn initialize(&self, now: DateTime<Utc>) -> Result<String, TokenError> {
        if let Some(active) = self.state.read().await.active.as_ref() {
            return Ok(active.kid().to_string());
        }

        let key = self.generate_key(now).await?;

        let mut state = self.state.write().await;
        if let Some(active) = state.active.as_ref() {
            return Ok(active.kid().to_string());
        }
        let kid = key.kid().to_string();
        state.active = Some(Arc::new(key));
        state.last_rotation = Some(now);

        info!(kid = %kid, algorithm = self.algorithm.as_str(), "Key ring initialized");
        Ok(kid)
    }

    /// The active signing key.
    ///
    /// # Errors
    ///
    /// Returns `NoActiveKey` if the ring was never initialized.
    pub async fn current_signing_key(&self) -> Result<Arc<SigningKey>, TokenError> {
        self.state
            .read()
            .await
            .active
            .clone()
            .ok_or(TokenError::NoActiveKey)
    }

    /// Rotate if at least one rotation period elapsed since the last rotation.
    ///
    /// Returns `true` when this call installed a new key. Concurrent callers
    /// observe exactly one rotation per due period.
    ///
    /// # Errors
    ///
    /// Returns `ServerError` if key generation fails; the ring is unchanged.
    pub async fn rotate_if_due(&self, now: DateTime<Utc>) -> Result<bool, TokenError> {
        if !self.state.read().await.is_due(now, self.rotation_period) {
            return Ok(false);
        }

        let key = self.generate_key(now).await?;

        let mut state = self.state.write().await;
        // Another caller may have rotated while we were generating.
        if !state.is_due(now, self.rotation_period) {
            debug!("Rotation already performed by a concurrent caller");
            return Ok(false);
        }

        let kid = key.kid().to_string();
        if let Some(previous) = state.active.replace(Arc::new(key)) {
            state.retired.push(RetiredKey {
                key: previous,
                retired_at: now,
            });
        }
        state.last_rotation = Some(now);

        let evicted = self
            .retired_retention
            .map_or(0, |retention| state.evict_expired(now, retention));

        metrics::record_key_rotation();
        info!(
            kid = %kid,
            retired = state.retired.len(),
            evicted,
            "Rotated signing key"
        );
        Ok(true)
    }

    /// Public keys of the active key and every retained retired key.
    ///
    /// The active key is listed first, then retired keys newest first.
    pub async fn public_key_set(&self) -> Jwks {
        let state = self.state.read().await;
        let mut jwks = Jwks::new();

        if let Some(active) = state.active.as_ref() {
            jwks.add_key(active.jwk().clone());
        }
        for retired in state.retired.iter().rev() {
            jwks.add_key(retired.key.jwk().clone());
        }
        jwks
    }

    /// Key matching `kid` among the active and retired keys.
    ///
    /// # Errors
    ///
    /// Returns `UnknownKey` if no key carries this kid.
    pub async fn verification_key_for(&self, kid: &str) -> Result<Arc<SigningKey>, TokenError> {
        let state = self.state.read().await;

        state
            .active
            .iter()
            .chain(state.retired.iter().map(|r| &r.key))
            .find(|k| k.kid() == kid)
            .cloned()
            .ok_or_else(|| TokenError::UnknownKey(kid.to_string()))
    }

    /// Number of retired keys still trusted for verification.
    pub async fn retired_count(&self) -> usize {
        self.state.read().await.retired.len()
    }

    async fn generate_key(&self, now: DateTime<Utc>) -> Result<SigningKey, TokenError> {
        let algorithm = self.algorithm;
        tokio::task::spawn_blocking(move || SigningKey::generate(algorithm, now))
            .await
            .map_err(|e| TokenError::server(format!("key generation task failed: {e}")))?
    }
}
