// Copyright (c) 2025 - Cowboy AI, Inc.
//! Change Notifications
//!
//! After every commit the service publishes which aggregates and route
//! network elements changed, grouped per aggregate type and change category.
//! Delivery is best effort: a failed notification is logged and the commit
//! stands.

use async_trait::async_trait;
use futures::channel::mpsc;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::errors::InfrastructureResult;
use crate::events::TopologyEvent;
use crate::nats::NatsClient;
use crate::subjects::{AggregateType, SubjectBuilder};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeCategory {
    Creation,
    StructuralModification,
    ConnectivityModification,
    Deletion,
    Merge,
    Move,
}

impl fmt::Display for ChangeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChangeCategory::Creation => "creation",
            ChangeCategory::StructuralModification => "structural_modification",
            ChangeCategory::ConnectivityModification => "connectivity_modification",
            ChangeCategory::Deletion => "deletion",
            ChangeCategory::Merge => "merge",
            ChangeCategory::Move => "move",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorizedChange {
    pub aggregate_type: AggregateType,
    pub category: ChangeCategory,
    pub aggregate_ids: BTreeSet<Uuid>,
    pub route_network_element_ids: BTreeSet<Uuid>,
}

/// Everything one committed command changed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeNotification {
    pub version: u64,
    pub correlation_id: Uuid,
    pub changes: Vec<CategorizedChange>,
}

impl ChangeNotification {
    pub fn from_events(version: u64, correlation_id: Uuid, events: &[TopologyEvent]) -> Self {
        let mut grouped: BTreeMap<(AggregateType, ChangeCategory), CategorizedChange> = BTreeMap::new();
        for event in events {
            let aggregate_type = event.aggregate_type();
            let category = event.change_category();
            let change = grouped
                .entry((aggregate_type, category))
                .or_insert_with(|| CategorizedChange {
                    aggregate_type,
                    category,
                    aggregate_ids: BTreeSet::new(),
                    route_network_element_ids: BTreeSet::new(),
                });
            change.aggregate_ids.extend(event.affected_aggregate_ids());
            change
                .route_network_element_ids
                .extend(event.route_network_element_ids());
        }

        Self {
            version,
            correlation_id,
            changes: grouped.into_values().collect(),
        }
    }

    pub fn change(&self, aggregate_type: AggregateType, category: ChangeCategory) -> Option<&CategorizedChange> {
        self.changes
            .iter()
            .find(|c| c.aggregate_type == aggregate_type && c.category == category)
    }
}

#[async_trait]
pub trait ChangeNotifier: Send + Sync {
    async fn notify(&self, notification: &ChangeNotification) -> InfrastructureResult<()>;
}

/// Single published message: one category of one commit
#[derive(Debug, Serialize)]
struct ChangeMessage<'a> {
    version: u64,
    correlation_id: Uuid,
    change: &'a CategorizedChange,
}

/// Publishes each category on `{prefix}.{aggregate}.{category}`
pub struct NatsChangeNotifier {
    client: NatsClient,
    prefix: String,
}

impl NatsChangeNotifier {
    pub fn new(client: NatsClient, prefix: impl Into<String>) -> Self {
        Self {
            client,
            prefix: prefix.into(),
        }
    }
}

#[async_trait]
impl ChangeNotifier for NatsChangeNotifier {
    async fn notify(&self, notification: &ChangeNotification) -> InfrastructureResult<()> {
        for change in &notification.changes {
            let subject = SubjectBuilder::with_prefix(self.prefix.as_str())
                .aggregate(change.aggregate_type)
                .category(change.category)
                .build()?;
            let message = ChangeMessage {
                version: notification.version,
                correlation_id: notification.correlation_id,
                change,
            };
            self.client.publish(&subject, &message).await?;
        }
        Ok(())
    }
}

/// Records notifications and fans them out to subscribers
#[derive(Default)]
pub struct InMemoryChangeNotifier {
    published: Mutex<Vec<ChangeNotification>>,
    subscribers: Mutex<Vec<mpsc::UnboundedSender<ChangeNotification>>>,
}

impl InMemoryChangeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn published(&self) -> Vec<ChangeNotification> {
        self.published.lock().await.clone()
    }

    /// Stream of notifications published after this call
    pub async fn subscribe(&self) -> mpsc::UnboundedReceiver<ChangeNotification> {
        let (tx, rx) = mpsc::unbounded();
        self.subscribers.lock().await.push(tx);
        rx
    }
}

#[async_trait]
impl ChangeNotifier for InMemoryChangeNotifier {
    async fn notify(&self, notification: &ChangeNotification) -> InfrastructureResult<()> {
        self.published.lock().await.push(notification.clone());
        let mut subscribers = self.subscribers.lock().await;
        subscribers.retain(|tx| tx.unbounded_send(notification.clone()).is_ok());
        debug!(
            version = notification.version,
            subscribers = subscribers.len(),
            "Recorded change notification"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NodeContainerId, SpanEquipmentId};
    use crate::events::{NodeContainerEvent, NodeContainerRemoved, SpanEquipmentEvent, SpanEquipmentRemoved};
    use futures::StreamExt;

    #[test]
    fn test_category_display_is_snake_case() {
        assert_eq!(ChangeCategory::ConnectivityModification.to_string(), "connectivity_modification");
        assert_eq!(ChangeCategory::Move.to_string(), "move");
    }

    #[test]
    fn test_from_events_groups_by_aggregate_and_category() {
        // Arrange
        let (a, b) = (SpanEquipmentId::new(), SpanEquipmentId::new());
        let container = NodeContainerId::new();
        let events: Vec<TopologyEvent> = vec![
            SpanEquipmentEvent::SpanEquipmentRemoved(SpanEquipmentRemoved { span_equipment_id: a }).into(),
            SpanEquipmentEvent::SpanEquipmentRemoved(SpanEquipmentRemoved { span_equipment_id: b }).into(),
            NodeContainerEvent::NodeContainerRemoved(NodeContainerRemoved {
                node_container_id: container,
            })
            .into(),
        ];

        // Act
        let notification = ChangeNotification::from_events(3, Uuid::now_v7(), &events);

        // Assert
        assert_eq!(notification.changes.len(), 2);
        let spans = notification
            .change(AggregateType::SpanEquipment, ChangeCategory::Deletion)
            .unwrap();
        assert_eq!(spans.aggregate_ids, BTreeSet::from([a.as_uuid(), b.as_uuid()]));
        assert!(notification
            .change(AggregateType::NodeContainer, ChangeCategory::Deletion)
            .is_some());
    }

    #[tokio::test]
    async fn test_in_memory_notifier_streams_to_subscribers() {
        let notifier = InMemoryChangeNotifier::new();
        let mut stream = notifier.subscribe().await;
        let notification = ChangeNotification::from_events(1, Uuid::now_v7(), &[]);

        notifier.notify(&notification).await.unwrap();

        assert_eq!(stream.next().await, Some(notification.clone()));
        assert_eq!(notifier.published().await, vec![notification]);
    }
}
