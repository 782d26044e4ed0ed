// Copyright (c) 2025 - Cowboy AI, Inc.
//! Event Store Abstraction
//!
//! The topology is one consistency authority, so its events live in a single
//! ordered stream. Every committed command appends one batch that becomes
//! one projection version.
//!
//! # Architecture
//!
//! ```text
//! Command → Handler → Events → EventStore (version n+1)
//!                                  ↓
//!                        Topology::from_events (replay)
//! ```
//!
//! # Event Store Requirements
//!
//! 1. **Append-Only**: events are never updated or deleted
//! 2. **Ordered**: global sequence, batches tagged with their version
//! 3. **Correlation**: every event of a batch shares the command's correlation id
//! 4. **Optimistic concurrency**: append states the version it was decided against
//!
//! Durable backends implement [`EventStore`]; [`InMemoryEventStore`] serves
//! tests and embedded use.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::errors::{InfrastructureError, InfrastructureResult};
use crate::events::{EventMetadata, StoredEvent, TopologyEvent};

#[async_trait]
pub trait EventStore: Send + Sync {
    /// Append one committed batch
    ///
    /// Fails with `ConcurrencyConflict` when the stream is not at
    /// `expected_version`. Returns the new stream version.
    async fn append(
        &self,
        events: Vec<TopologyEvent>,
        metadata: &EventMetadata,
        expected_version: u64,
    ) -> InfrastructureResult<u64>;

    /// Every event in stream order
    async fn read_all(&self) -> InfrastructureResult<Vec<StoredEvent<TopologyEvent>>>;

    /// Events committed at `from_version` or later
    async fn read_from_version(&self, from_version: u64) -> InfrastructureResult<Vec<StoredEvent<TopologyEvent>>>;

    /// Events touching one aggregate
    async fn read_aggregate(&self, aggregate_id: Uuid) -> InfrastructureResult<Vec<StoredEvent<TopologyEvent>>>;

    async fn read_by_correlation(&self, correlation_id: Uuid) -> InfrastructureResult<Vec<StoredEvent<TopologyEvent>>>;

    async fn read_by_time_range(
        &self,
        from_time: DateTime<Utc>,
        to_time: DateTime<Utc>,
    ) -> InfrastructureResult<Vec<StoredEvent<TopologyEvent>>>;

    /// Last committed version, 0 for an empty stream
    async fn current_version(&self) -> InfrastructureResult<u64>;
}

#[derive(Debug, Default)]
struct StreamState {
    version: u64,
    events: Vec<StoredEvent<TopologyEvent>>,
}

#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    stream: RwLock<StreamState>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn filtered<F>(&self, predicate: F) -> InfrastructureResult<Vec<StoredEvent<TopologyEvent>>>
    where
        F: Fn(&StoredEvent<TopologyEvent>) -> bool + Send,
    {
        let stream = self.stream.read().await;
        Ok(stream.events.iter().filter(|e| predicate(e)).cloned().collect())
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn append(
        &self,
        events: Vec<TopologyEvent>,
        metadata: &EventMetadata,
        expected_version: u64,
    ) -> InfrastructureResult<u64> {
        let mut stream = self.stream.write().await;
        if stream.version != expected_version {
            return Err(InfrastructureError::ConcurrencyConflict {
                expected: expected_version,
                actual: stream.version,
            });
        }

        let version = stream.version + 1;
        let count = events.len();
        for data in events {
            let sequence = stream.events.len() as u64 + 1;
            stream.events.push(StoredEvent {
                event_id: Uuid::now_v7(),
                aggregate_id: data.aggregate_id(),
                sequence,
                version,
                timestamp: metadata.timestamp,
                correlation_id: metadata.correlation_id,
                causation_id: metadata.causation_id,
                user_name: metadata.user_name.clone(),
                event_type: data.event_type_name().to_string(),
                data,
            });
        }
        stream.version = version;

        debug!(version, events = count, "Appended event batch");
        Ok(version)
    }

    async fn read_all(&self) -> InfrastructureResult<Vec<StoredEvent<TopologyEvent>>> {
        self.filtered(|_| true).await
    }

    async fn read_from_version(&self, from_version: u64) -> InfrastructureResult<Vec<StoredEvent<TopologyEvent>>> {
        self.filtered(move |e| e.version >= from_version).await
    }

    async fn read_aggregate(&self, aggregate_id: Uuid) -> InfrastructureResult<Vec<StoredEvent<TopologyEvent>>> {
        self.filtered(move |e| e.data.affected_aggregate_ids().contains(&aggregate_id))
            .await
    }

    async fn read_by_correlation(&self, correlation_id: Uuid) -> InfrastructureResult<Vec<StoredEvent<TopologyEvent>>> {
        self.filtered(move |e| e.correlation_id == correlation_id).await
    }

    async fn read_by_time_range(
        &self,
        from_time: DateTime<Utc>,
        to_time: DateTime<Utc>,
    ) -> InfrastructureResult<Vec<StoredEvent<TopologyEvent>>> {
        self.filtered(move |e| e.timestamp >= from_time && e.timestamp <= to_time)
            .await
    }

    async fn current_version(&self) -> InfrastructureResult<u64> {
        Ok(self.stream.read().await.version)
    }
}
