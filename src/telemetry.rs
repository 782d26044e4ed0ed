// Copyright (c) 2025 - Cowboy AI, Inc.
//! Tracing subscriber setup

use serde::{Deserialize, Serialize};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::errors::{InfrastructureError, InfrastructureResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Filter used when `RUST_LOG` is not set
    pub default_filter: String,
    /// Compact single-line output instead of the full format
    pub compact: bool,
    pub with_target: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            default_filter: "utility_network_topology=info".to_string(),
            compact: true,
            with_target: false,
        }
    }
}

impl TelemetryConfig {
    fn filter(&self) -> InfrastructureResult<EnvFilter> {
        match EnvFilter::try_from_default_env() {
            Ok(filter) => Ok(filter),
            Err(_) => EnvFilter::try_new(&self.default_filter)
                .map_err(|e| InfrastructureError::Configuration(format!("invalid log filter: {e}"))),
        }
    }
}

/// Install the global subscriber; fails if one is already installed
pub fn init_tracing(config: &TelemetryConfig) -> InfrastructureResult<()> {
    let filter = config.filter()?;
    let registry = tracing_subscriber::registry().with(filter);
    let fmt = tracing_subscriber::fmt::layer().with_target(config.with_target);

    let result = if config.compact {
        registry.with(fmt.compact()).try_init()
    } else {
        registry.with(fmt).try_init()
    };
    result.map_err(|e| InfrastructureError::Configuration(format!("tracing already initialised: {e}")))
}
