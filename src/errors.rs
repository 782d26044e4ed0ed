// Copyright (c) 2025 - Cowboy AI, Inc.
//! Error types for collaborator operations
//!
//! Failures of the collaborators around the topology core: messaging, the
//! event store, route-network resolution and configuration. Domain failures
//! are [`CommandError`](crate::aggregate::CommandError).

use thiserror::Error;

/// Failures outside the pure topology core
#[derive(Debug, Error)]
pub enum InfrastructureError {
    /// NATS connection error
    #[error("NATS connection error: {0}")]
    NatsConnection(String),

    /// NATS publish error
    #[error("NATS publish error: {0}")]
    NatsPublish(String),

    /// NATS subscribe error
    #[error("NATS subscribe error: {0}")]
    NatsSubscribe(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Collaborator call exceeded its time budget
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Route network could not resolve a request
    #[error("Route network error: {0}")]
    RouteNetwork(String),

    /// Event store append or read failed
    #[error("Event store error: {0}")]
    EventStore(String),

    /// Optimistic concurrency check failed on append
    #[error("Concurrency conflict: expected version {expected}, got {actual}")]
    ConcurrencyConflict { expected: u64, actual: u64 },
}

/// Result type for collaborator operations
pub type InfrastructureResult<T> = Result<T, InfrastructureError>;

impl InfrastructureError {
    /// Transient failures worth retrying by the caller's own policy
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            InfrastructureError::NatsConnection(_)
                | InfrastructureError::NatsPublish(_)
                | InfrastructureError::Timeout(_)
                | InfrastructureError::ConcurrencyConflict { .. }
        )
    }
}

impl From<async_nats::Error> for InfrastructureError {
    fn from(err: async_nats::Error) -> Self {
        InfrastructureError::NatsConnection(err.to_string())
    }
}

impl From<serde_json::Error> for InfrastructureError {
    fn from(err: serde_json::Error) -> Self {
        InfrastructureError::Serialization(err.to_string())
    }
}

impl From<tokio::time::error::Elapsed> for InfrastructureError {
    fn from(err: tokio::time::error::Elapsed) -> Self {
        InfrastructureError::Timeout(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(InfrastructureError::Timeout("route network".into()).is_retryable());
        assert!(InfrastructureError::ConcurrencyConflict { expected: 1, actual: 2 }.is_retryable());
        assert!(!InfrastructureError::Configuration("bad".into()).is_retryable());
    }

    #[test]
    fn test_serde_error_converts_to_serialization() {
        let err = serde_json::from_str::<u32>("nope").unwrap_err();
        let infra: InfrastructureError = err.into();
        assert!(matches!(infra, InfrastructureError::Serialization(_)));
    }
}
