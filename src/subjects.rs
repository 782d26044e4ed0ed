// Copyright (c) 2025 - Cowboy AI, Inc.

//! NATS subject hierarchy for topology change notifications
//!
//! # Subject Pattern
//!
//! ```text
//! {prefix}.{aggregate}.{category}
//! ```
//!
//! With the default prefix this gives:
//! - Precise subscriptions (`utility-network.span_equipment.connectivity_modification`)
//! - Aggregate-level wildcards (`utility-network.span_equipment.>`)
//! - Global subscriptions (`utility-network.>`)
//!
//! # Examples
//!
//! ```rust
//! use utility_network_topology::subjects::{SubjectBuilder, AggregateType};
//! use utility_network_topology::notification::ChangeCategory;
//!
//! let subject = SubjectBuilder::new()
//!     .aggregate(AggregateType::SpanEquipment)
//!     .category(ChangeCategory::Merge)
//!     .build()
//!     .unwrap();
//! assert_eq!(subject, "utility-network.span_equipment.merge");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::{InfrastructureError, InfrastructureResult};
use crate::notification::ChangeCategory;

/// Default root namespace for all topology subjects
pub const TOPOLOGY_ROOT: &str = "utility-network";

/// Topology aggregate types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateType {
    /// Conduits and cables
    SpanEquipment,
    /// Enclosures at route nodes
    NodeContainer,
    /// Splice closures, patch panels, splitters
    TerminalEquipment,
}

impl fmt::Display for AggregateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AggregateType::SpanEquipment => write!(f, "span_equipment"),
            AggregateType::NodeContainer => write!(f, "node_container"),
            AggregateType::TerminalEquipment => write!(f, "terminal_equipment"),
        }
    }
}

/// Builder for topology NATS subjects
#[derive(Debug, Clone)]
pub struct SubjectBuilder {
    prefix: String,
    aggregate: Option<AggregateType>,
    category: Option<ChangeCategory>,
}

impl SubjectBuilder {
    pub fn new() -> Self {
        Self::with_prefix(TOPOLOGY_ROOT)
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            aggregate: None,
            category: None,
        }
    }

    pub fn aggregate(mut self, aggregate: AggregateType) -> Self {
        self.aggregate = Some(aggregate);
        self
    }

    pub fn category(mut self, category: ChangeCategory) -> Self {
        self.category = Some(category);
        self
    }

    /// Build the complete subject string
    pub fn build(self) -> InfrastructureResult<String> {
        let aggregate = self
            .aggregate
            .ok_or_else(|| InfrastructureError::Configuration("subject aggregate must be set".into()))?;
        let category = self
            .category
            .ok_or_else(|| InfrastructureError::Configuration("subject category must be set".into()))?;
        Ok(format!("{}.{}.{}", self.prefix, aggregate, category))
    }

    /// Wildcard for every category of the aggregate, or everything when no
    /// aggregate is set
    pub fn build_wildcard(self) -> String {
        match self.aggregate {
            Some(aggregate) => format!("{}.{}.>", self.prefix, aggregate),
            None => format!("{}.>", self.prefix),
        }
    }
}

impl Default for SubjectBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subject_builder() {
        let subject = SubjectBuilder::new()
            .aggregate(AggregateType::TerminalEquipment)
            .category(ChangeCategory::ConnectivityModification)
            .build()
            .unwrap();

        assert_eq!(subject, "utility-network.terminal_equipment.connectivity_modification");
    }

    #[test]
    fn test_missing_category_is_configuration_error() {
        let result = SubjectBuilder::new().aggregate(AggregateType::NodeContainer).build();
        assert!(matches!(result, Err(InfrastructureError::Configuration(_))));
    }

    #[test]
    fn test_wildcards() {
        assert_eq!(
            SubjectBuilder::new().aggregate(AggregateType::NodeContainer).build_wildcard(),
            "utility-network.node_container.>"
        );
        assert_eq!(SubjectBuilder::with_prefix("test").build_wildcard(), "test.>");
    }
}
