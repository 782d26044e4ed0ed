// Copyright (c) 2025 - Cowboy AI, Inc.
//! Stored Event Envelope
//!
//! Wraps a domain event with the metadata the event store assigns on append:
//! global sequence, commit version, correlation and causation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Event envelope as persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEvent<E> {
    /// Unique event ID (UUID v7 for time-ordering)
    pub event_id: Uuid,

    /// Aggregate this event belongs to
    pub aggregate_id: Uuid,

    /// Position in the global stream, starting at 1
    pub sequence: u64,

    /// Projection version the event was committed in
    pub version: u64,

    pub timestamp: DateTime<Utc>,

    /// Groups every event of one command
    pub correlation_id: Uuid,

    pub causation_id: Option<Uuid>,

    /// Actor that issued the command
    pub user_name: Option<String>,

    /// Event type name (for routing and diagnostics)
    pub event_type: String,

    pub data: E,
}

/// Metadata shared by all events of one committed command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMetadata {
    pub correlation_id: Uuid,
    pub causation_id: Option<Uuid>,
    pub user_name: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl EventMetadata {
    pub fn new(correlation_id: Uuid, timestamp: DateTime<Utc>) -> Self {
        Self {
            correlation_id,
            causation_id: None,
            user_name: None,
            timestamp,
        }
    }

    pub fn with_causation(mut self, causation_id: Uuid) -> Self {
        self.causation_id = Some(causation_id);
        self
    }

    pub fn with_user(mut self, user_name: impl Into<String>) -> Self {
        self.user_name = Some(user_name.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_metadata_builder() {
        let correlation_id = Uuid::now_v7();
        let causation_id = Uuid::now_v7();

        let metadata = EventMetadata::new(correlation_id, Utc::now())
            .with_causation(causation_id)
            .with_user("planner");

        assert_eq!(metadata.correlation_id, correlation_id);
        assert_eq!(metadata.causation_id, Some(causation_id));
        assert_eq!(metadata.user_name.as_deref(), Some("planner"));
    }
}
