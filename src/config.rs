// Copyright (c) 2025 - Cowboy AI, Inc.
//! Service Configuration
//!
//! Loaded from `TOPOLOGY_*` environment variables with defaults for
//! everything:
//!
//! | Variable | Meaning |
//! |---|---|
//! | `TOPOLOGY_COLLABORATOR_TIMEOUT_MS` | route network / store / notifier call budget |
//! | `TOPOLOGY_HISTORY_RETENTION` | versions of graph history kept for historical trace |
//! | `TOPOLOGY_SUBJECT_PREFIX` | root of the change-notification subjects |
//! | `TOPOLOGY_NATS_URL` | comma separated servers; enables NATS notifications |
//! | `TOPOLOGY_LOG_FILTER` | default tracing filter when `RUST_LOG` is unset |

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

use crate::errors::{InfrastructureError, InfrastructureResult};
use crate::nats::NatsConfig;
use crate::subjects::TOPOLOGY_ROOT;
use crate::telemetry::TelemetryConfig;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopologyConfig {
    pub collaborator_timeout_ms: u64,
    pub graph_history_retention: u64,
    pub notification_subject_prefix: String,
    pub nats: Option<NatsConfig>,
    pub telemetry: TelemetryConfig,
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            collaborator_timeout_ms: 5_000,
            graph_history_retention: 100,
            notification_subject_prefix: TOPOLOGY_ROOT.to_string(),
            nats: None,
            telemetry: TelemetryConfig::default(),
        }
    }
}

impl TopologyConfig {
    pub fn from_env() -> InfrastructureResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup
    pub fn from_lookup<F>(lookup: F) -> InfrastructureResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup("TOPOLOGY_COLLABORATOR_TIMEOUT_MS") {
            config.collaborator_timeout_ms = parse("TOPOLOGY_COLLABORATOR_TIMEOUT_MS", &value)?;
        }
        if let Some(value) = lookup("TOPOLOGY_HISTORY_RETENTION") {
            config.graph_history_retention = parse("TOPOLOGY_HISTORY_RETENTION", &value)?;
        }
        if let Some(value) = lookup("TOPOLOGY_SUBJECT_PREFIX") {
            if value.is_empty() || value.contains(['*', '>', ' ']) {
                return Err(InfrastructureError::Configuration(format!(
                    "TOPOLOGY_SUBJECT_PREFIX is not a valid subject prefix: {value:?}"
                )));
            }
            config.notification_subject_prefix = value;
        }
        if let Some(value) = lookup("TOPOLOGY_NATS_URL") {
            let servers: Vec<String> = value
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
            config.nats = Some(NatsConfig {
                servers,
                ..NatsConfig::default()
            });
        }
        if let Some(value) = lookup("TOPOLOGY_LOG_FILTER") {
            config.telemetry.default_filter = value;
        }

        Ok(config)
    }

    pub fn collaborator_timeout(&self) -> Duration {
        Duration::from_millis(self.collaborator_timeout_ms)
    }
}

fn parse<T: FromStr>(key: &str, value: &str) -> InfrastructureResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| InfrastructureError::Configuration(format!("{key} has invalid value {value:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_variables() {
        let config = TopologyConfig::from_lookup(lookup(&[])).unwrap();

        assert_eq!(config, TopologyConfig::default());
        assert_eq!(config.collaborator_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_variables_override_defaults() {
        let config = TopologyConfig::from_lookup(lookup(&[
            ("TOPOLOGY_COLLABORATOR_TIMEOUT_MS", "250"),
            ("TOPOLOGY_HISTORY_RETENTION", "8"),
            ("TOPOLOGY_SUBJECT_PREFIX", "fiber"),
            ("TOPOLOGY_NATS_URL", "nats://a:4222, nats://b:4222"),
        ]))
        .unwrap();

        assert_eq!(config.collaborator_timeout_ms, 250);
        assert_eq!(config.graph_history_retention, 8);
        assert_eq!(config.notification_subject_prefix, "fiber");
        assert_eq!(
            config.nats.map(|n| n.servers),
            Some(vec!["nats://a:4222".to_string(), "nats://b:4222".to_string()])
        );
    }

    #[test]
    fn test_invalid_number_is_configuration_error() {
        let result = TopologyConfig::from_lookup(lookup(&[("TOPOLOGY_HISTORY_RETENTION", "many")]));

        assert!(matches!(result, Err(InfrastructureError::Configuration(_))));
    }

    #[test]
    fn test_wildcard_prefix_rejected() {
        let result = TopologyConfig::from_lookup(lookup(&[("TOPOLOGY_SUBJECT_PREFIX", "a.>")]));

        assert!(result.is_err());
    }
}
