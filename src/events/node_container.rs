// Copyright (c) 2025 - Cowboy AI, Inc.
//! Node Container Domain Events

use serde::{Deserialize, Serialize};

use crate::domain::{NodeContainer, NodeContainerId, Rack, RackId, TerminalEquipmentId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeContainerEvent {
    NodeContainerPlaced(NodeContainerPlaced),
    NodeContainerRemoved(NodeContainerRemoved),
    RackPlaced(RackPlaced),

    /// Terminal equipment registered in the container, optionally rack mounted
    TerminalEquipmentAddedToContainer(TerminalEquipmentAddedToContainer),

    TerminalEquipmentRemovedFromContainer(TerminalEquipmentRemovedFromContainer),

    /// Rack equipment moved to a new rack and/or unit position
    RackEquipmentMoved(RackEquipmentMoved),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeContainerPlaced {
    pub container: NodeContainer,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeContainerRemoved {
    pub node_container_id: NodeContainerId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RackPlaced {
    pub node_container_id: NodeContainerId,
    pub rack: Rack,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RackMountPosition {
    pub rack_id: RackId,
    pub position_in_units: u16,
    pub height_in_units: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminalEquipmentAddedToContainer {
    pub node_container_id: NodeContainerId,
    pub terminal_equipment_id: TerminalEquipmentId,
    pub rack_mount: Option<RackMountPosition>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminalEquipmentRemovedFromContainer {
    pub node_container_id: NodeContainerId,
    pub terminal_equipment_id: TerminalEquipmentId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RackEquipmentMoved {
    pub node_container_id: NodeContainerId,
    pub terminal_equipment_id: TerminalEquipmentId,
    pub from_rack_id: RackId,
    pub to: RackMountPosition,
}

impl NodeContainerEvent {
    pub fn node_container_id(&self) -> NodeContainerId {
        use NodeContainerEvent::*;

        match self {
            NodeContainerPlaced(e) => e.container.id,
            NodeContainerRemoved(e) => e.node_container_id,
            RackPlaced(e) => e.node_container_id,
            TerminalEquipmentAddedToContainer(e) => e.node_container_id,
            TerminalEquipmentRemovedFromContainer(e) => e.node_container_id,
            RackEquipmentMoved(e) => e.node_container_id,
        }
    }

    pub fn event_type_name(&self) -> &'static str {
        use NodeContainerEvent::*;

        match self {
            NodeContainerPlaced(_) => "NodeContainerPlaced",
            NodeContainerRemoved(_) => "NodeContainerRemoved",
            RackPlaced(_) => "RackPlaced",
            TerminalEquipmentAddedToContainer(_) => "TerminalEquipmentAddedToContainer",
            TerminalEquipmentRemovedFromContainer(_) => "TerminalEquipmentRemovedFromContainer",
            RackEquipmentMoved(_) => "RackEquipmentMoved",
        }
    }
}
