// Copyright (c) 2025 - Cowboy AI, Inc.
//! Topology Domain Events
//!
//! Top-level event envelope for all utility network aggregates. This allows
//! polymorphic handling in the projection fold, the event store and the
//! notification builder while each aggregate keeps its own strongly typed
//! event family.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::node_container::NodeContainerEvent;
use super::span_equipment::SpanEquipmentEvent;
use super::terminal_equipment::TerminalEquipmentEvent;
use crate::notification::ChangeCategory;
use crate::subjects::AggregateType;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "aggregate_type", content = "event", rename_all = "snake_case")]
pub enum TopologyEvent {
    SpanEquipment(SpanEquipmentEvent),
    NodeContainer(NodeContainerEvent),
    TerminalEquipment(TerminalEquipmentEvent),
}

impl TopologyEvent {
    /// Id of the aggregate the event belongs to
    pub fn aggregate_id(&self) -> Uuid {
        match self {
            TopologyEvent::SpanEquipment(event) => event.span_equipment_id().as_uuid(),
            TopologyEvent::NodeContainer(event) => event.node_container_id().as_uuid(),
            TopologyEvent::TerminalEquipment(event) => event.terminal_equipment_id().as_uuid(),
        }
    }

    pub fn aggregate_type(&self) -> AggregateType {
        match self {
            TopologyEvent::SpanEquipment(_) => AggregateType::SpanEquipment,
            TopologyEvent::NodeContainer(_) => AggregateType::NodeContainer,
            TopologyEvent::TerminalEquipment(_) => AggregateType::TerminalEquipment,
        }
    }

    /// Every aggregate whose state the event changes
    pub fn affected_aggregate_ids(&self) -> Vec<Uuid> {
        match self {
            TopologyEvent::SpanEquipment(SpanEquipmentEvent::SpanEquipmentMerged(e)) => vec![
                e.span_equipment_id.as_uuid(),
                e.absorbed_span_equipment_id.as_uuid(),
            ],
            TopologyEvent::SpanEquipment(SpanEquipmentEvent::SpanEquipmentAffixedToContainer(e)) => {
                vec![e.span_equipment_id.as_uuid(), e.affix.node_container_id.as_uuid()]
            }
            TopologyEvent::SpanEquipment(SpanEquipmentEvent::SpanEquipmentDetachedFromContainer(e)) => {
                vec![e.span_equipment_id.as_uuid(), e.node_container_id.as_uuid()]
            }
            TopologyEvent::NodeContainer(NodeContainerEvent::TerminalEquipmentAddedToContainer(e)) => {
                vec![e.node_container_id.as_uuid(), e.terminal_equipment_id.as_uuid()]
            }
            TopologyEvent::TerminalEquipment(TerminalEquipmentEvent::TerminalsConnected(e)) => {
                vec![e.terminal_equipment_id.as_uuid()]
            }
            other => vec![other.aggregate_id()],
        }
    }

    /// Route nodes and segments the event touches
    pub fn route_network_element_ids(&self) -> Vec<Uuid> {
        use SpanEquipmentEvent as S;

        let walk_ids = |walk: &crate::domain::ValidatedWalk| -> Vec<Uuid> {
            walk.node_ids()
                .iter()
                .map(|id| id.as_uuid())
                .chain(walk.segment_ids().iter().map(|id| id.as_uuid()))
                .collect()
        };

        match self {
            TopologyEvent::SpanEquipment(event) => match event {
                S::SpanEquipmentPlaced(e) => walk_ids(&e.equipment.walk),
                S::SpanEquipmentAffixedToParent(e) => walk_ids(&e.walk),
                S::SpanEquipmentMoved(e) => walk_ids(&e.walk),
                S::SpanEquipmentRerouted(e) => walk_ids(&e.walk),
                S::SpanSegmentsCut(e) => vec![e.route_node_id.as_uuid()],
                S::SpanSegmentsConnectedToTerminals(e) => vec![e.route_node_id.as_uuid()],
                S::SpanSegmentsDisconnectedFromTerminals(e) => vec![e.route_node_id.as_uuid()],
                S::SpanEquipmentMerged(e) => vec![e.route_node_id.as_uuid()],
                S::SpanEquipmentAffixedToContainer(e) => vec![e.affix.route_node_id.as_uuid()],
                S::SpanEquipmentDetachedFromContainer(e) => vec![e.route_node_id.as_uuid()],
                S::AdditionalInnerSpanStructuresAdded(_)
                | S::SpanStructureRemoved(_)
                | S::SpanEquipmentRemoved(_)
                | S::SpanEquipmentNameChanged(_) => Vec::new(),
            },
            TopologyEvent::NodeContainer(NodeContainerEvent::NodeContainerPlaced(e)) => {
                vec![e.container.route_node_id.as_uuid()]
            }
            TopologyEvent::TerminalEquipment(TerminalEquipmentEvent::TerminalEquipmentPlaced(e)) => {
                vec![e.equipment.route_node_id.as_uuid()]
            }
            TopologyEvent::TerminalEquipment(TerminalEquipmentEvent::TerminalsConnected(e)) => {
                vec![e.link.route_node_id.as_uuid()]
            }
            _ => Vec::new(),
        }
    }

    /// Notification category of the change
    pub fn change_category(&self) -> ChangeCategory {
        use NodeContainerEvent as N;
        use SpanEquipmentEvent as S;
        use TerminalEquipmentEvent as T;

        match self {
            TopologyEvent::SpanEquipment(event) => match event {
                S::SpanEquipmentPlaced(_) => ChangeCategory::Creation,
                S::SpanSegmentsConnectedToTerminals(_) | S::SpanSegmentsDisconnectedFromTerminals(_) => {
                    ChangeCategory::ConnectivityModification
                }
                S::SpanEquipmentMerged(_) => ChangeCategory::Merge,
                S::SpanEquipmentMoved(_) | S::SpanEquipmentRerouted(_) => ChangeCategory::Move,
                S::SpanEquipmentRemoved(_) => ChangeCategory::Deletion,
                S::SpanEquipmentAffixedToParent(_)
                | S::SpanSegmentsCut(_)
                | S::SpanEquipmentAffixedToContainer(_)
                | S::SpanEquipmentDetachedFromContainer(_)
                | S::AdditionalInnerSpanStructuresAdded(_)
                | S::SpanStructureRemoved(_)
                | S::SpanEquipmentNameChanged(_) => ChangeCategory::StructuralModification,
            },
            TopologyEvent::NodeContainer(event) => match event {
                N::NodeContainerPlaced(_) | N::RackPlaced(_) | N::TerminalEquipmentAddedToContainer(_) => {
                    ChangeCategory::Creation
                }
                N::NodeContainerRemoved(_) | N::TerminalEquipmentRemovedFromContainer(_) => {
                    ChangeCategory::Deletion
                }
                N::RackEquipmentMoved(_) => ChangeCategory::StructuralModification,
            },
            TopologyEvent::TerminalEquipment(event) => match event {
                T::TerminalEquipmentPlaced(_) => ChangeCategory::Creation,
                T::TerminalEquipmentRemoved(_) => ChangeCategory::Deletion,
                T::TerminalsConnected(_) | T::TerminalsDisconnected(_) => {
                    ChangeCategory::ConnectivityModification
                }
                T::TerminalStructuresAdded(_)
                | T::TerminalStructureRemoved(_)
                | T::InterfaceInfoUpdated(_) => ChangeCategory::StructuralModification,
            },
        }
    }

    pub fn event_type_name(&self) -> &'static str {
        match self {
            TopologyEvent::SpanEquipment(event) => event.event_type_name(),
            TopologyEvent::NodeContainer(event) => event.event_type_name(),
            TopologyEvent::TerminalEquipment(event) => event.event_type_name(),
        }
    }
}

impl From<SpanEquipmentEvent> for TopologyEvent {
    fn from(event: SpanEquipmentEvent) -> Self {
        TopologyEvent::SpanEquipment(event)
    }
}

impl From<NodeContainerEvent> for TopologyEvent {
    fn from(event: NodeContainerEvent) -> Self {
        TopologyEvent::NodeContainer(event)
    }
}

impl From<TerminalEquipmentEvent> for TopologyEvent {
    fn from(event: TerminalEquipmentEvent) -> Self {
        TopologyEvent::TerminalEquipment(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SpanEquipmentId;
    use crate::events::span_equipment::SpanEquipmentRemoved;

    #[test]
    fn test_envelope_serializes_with_aggregate_tag() {
        // Arrange
        let id = SpanEquipmentId::new();
        let event: TopologyEvent = SpanEquipmentEvent::SpanEquipmentRemoved(SpanEquipmentRemoved {
            span_equipment_id: id,
        })
        .into();

        // Act
        let json = serde_json::to_value(&event).unwrap();
        let back: TopologyEvent = serde_json::from_value(json.clone()).unwrap();

        // Assert
        assert_eq!(json["aggregate_type"], "span_equipment");
        assert_eq!(json["event"]["type"], "span_equipment_removed");
        assert_eq!(back, event);
        assert_eq!(event.aggregate_id(), id.as_uuid());
        assert_eq!(event.change_category(), ChangeCategory::Deletion);
    }
}
