// Copyright (c) 2025 - Cowboy AI, Inc.
//! NATS client for the outbound change stream

use async_nats::{Client, ConnectOptions, Subscriber};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use crate::errors::{InfrastructureError, InfrastructureResult};
use crate::subjects::SubjectBuilder;

/// Configuration for NATS connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NatsConfig {
    /// NATS server URLs
    pub servers: Vec<String>,
    /// Client name
    pub name: String,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
}

impl Default for NatsConfig {
    fn default() -> Self {
        Self {
            servers: vec!["nats://localhost:4222".to_string()],
            name: "utility-network-topology".to_string(),
            connect_timeout_secs: 10,
            request_timeout_secs: 5,
        }
    }
}

impl NatsConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Clone)]
pub struct NatsClient {
    client: Client,
}

impl NatsClient {
    pub async fn new(config: &NatsConfig) -> InfrastructureResult<Self> {
        if config.servers.is_empty() {
            return Err(InfrastructureError::Configuration("no NATS servers configured".into()));
        }
        let connect_options = ConnectOptions::new()
            .name(&config.name)
            .connection_timeout(config.connect_timeout())
            .request_timeout(Some(config.request_timeout()));

        let client = async_nats::connect_with_options(config.servers.join(","), connect_options)
            .await
            .map_err(|e| InfrastructureError::NatsConnection(e.to_string()))?;

        info!("Connected to NATS at {:?}", config.servers);

        Ok(Self { client })
    }

    /// Publish a JSON message to a subject
    pub async fn publish<T>(&self, subject: &str, message: &T) -> InfrastructureResult<()>
    where
        T: Serialize,
    {
        let payload = serde_json::to_vec(message)?;

        self.client
            .publish(subject.to_string(), payload.into())
            .await
            .map_err(|e| InfrastructureError::NatsPublish(e.to_string()))?;

        debug!("Published message to subject: {}", subject);
        Ok(())
    }

    /// Subscribe to every change published under `prefix`
    pub async fn subscribe_changes(&self, prefix: &str) -> InfrastructureResult<Subscriber> {
        let subject = SubjectBuilder::with_prefix(prefix).build_wildcard();
        let subscriber = self
            .client
            .subscribe(subject.clone())
            .await
            .map_err(|e| InfrastructureError::NatsSubscribe(e.to_string()))?;

        info!("Subscribed to subject: {}", subject);
        Ok(subscriber)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults_fill_missing_fields() {
        let config: NatsConfig = serde_json::from_str(r#"{"servers":["nats://10.0.0.1:4222"]}"#).unwrap();

        assert_eq!(config.servers, vec!["nats://10.0.0.1:4222".to_string()]);
        assert_eq!(config.connect_timeout(), Duration::from_secs(10));
        assert_eq!(config.name, "utility-network-topology");
    }

    #[tokio::test]
    async fn test_connect_without_servers_is_configuration_error() {
        let config = NatsConfig {
            servers: Vec::new(),
            ..NatsConfig::default()
        };

        let result = NatsClient::new(&config).await;

        assert!(matches!(result, Err(InfrastructureError::Configuration(_))));
    }
}
