//! Prometheus metrics for the token core.
//!
//! Counters are registered lazily on first use against the default registry.

use once_cell::sync::Lazy;
use prometheus::{register_counter, register_counter_vec, Counter, CounterVec};

/// Tokens issued counter.
pub static TOKENS_ISSUED: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "token_service_tokens_issued_total",
        "Total number of tokens issued",
        &["token_type", "algorithm"]
    )
    .expect("Failed to register tokens_issued metric")
});

/// Tokens refreshed counter.
pub static TOKENS_REFRESHED: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "token_service_tokens_refreshed_total",
        "Total number of refresh exchanges",
        &["status"]
    )
    .expect("Failed to register tokens_refreshed metric")
});

/// Tokens revoked counter.
pub static TOKENS_REVOKED: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "token_service_tokens_revoked_total",
        "Total number of token records revoked",
        &["reason"]
    )
    .expect("Failed to register tokens_revoked metric")
});

/// Authorization code operations counter.
pub static AUTH_CODES: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "token_service_authorization_codes_total",
        "Total number of authorization code operations",
        &["operation", "status"]
    )
    .expect("Failed to register authorization_codes metric")
});

/// Signing key rotations counter.
pub static KEY_ROTATIONS: Lazy<Counter> = Lazy::new(|| {
    register_counter!(
        "token_service_key_rotations_total",
        "Total number of signing key rotations"
    )
    .expect("Failed to register key_rotations metric")
});

/// Security events counter.
pub static SECURITY_EVENTS: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "token_service_security_events_total",
        "Total number of security events",
        &["event_type"]
    )
    .expect("Failed to register security_events metric")
});

/// Record a token issuance.
pub fn record_token_issued(token_type: &str, algorithm: &str) {
    TOKENS_ISSUED
        .with_label_values(&[token_type, algorithm])
        .inc();
}

/// Record a refresh exchange outcome.
pub fn record_token_refreshed(status: &str) {
    TOKENS_REFRESHED.with_label_values(&[status]).inc();
}

/// Record revoked token records.
#[allow(clippy::cast_precision_loss)]
pub fn record_tokens_revoked(reason: &str, count: usize) {
    TOKENS_REVOKED
        .with_label_values(&[reason])
        .inc_by(count as f64);
}

/// Record an authorization code operation.
pub fn record_auth_code(operation: &str, status: &str) {
    AUTH_CODES.with_label_values(&[operation, status]).inc();
}

/// Record a signing key rotation.
pub fn record_key_rotation() {
    KEY_ROTATIONS.inc();
}

/// Record a security event.
pub fn record_security_event(event_type: &str) {
    SECURITY_EVENTS.with_label_values(&[event_type]).inc();
}
