// Copyright (c) 2025 - Cowboy AI, Inc.
//! Terminal Equipment Domain Events

use serde::{Deserialize, Serialize};

use crate::domain::{
    InterfaceInfo, TerminalEquipment, TerminalEquipmentId, TerminalLink, TerminalLinkId,
    TerminalStructure, TerminalStructureId,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TerminalEquipmentEvent {
    TerminalEquipmentPlaced(TerminalEquipmentPlaced),
    TerminalEquipmentRemoved(TerminalEquipmentRemoved),
    TerminalStructuresAdded(TerminalStructuresAdded),
    TerminalStructureRemoved(TerminalStructureRemoved),
    InterfaceInfoUpdated(InterfaceInfoUpdated),

    /// Terminal link created; owned by the equipment of the from terminal
    TerminalsConnected(TerminalsConnected),

    TerminalsDisconnected(TerminalsDisconnected),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminalEquipmentPlaced {
    pub equipment: TerminalEquipment,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminalEquipmentRemoved {
    pub terminal_equipment_id: TerminalEquipmentId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminalStructuresAdded {
    pub terminal_equipment_id: TerminalEquipmentId,
    pub structures: Vec<TerminalStructure>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminalStructureRemoved {
    pub terminal_equipment_id: TerminalEquipmentId,
    pub terminal_structure_id: TerminalStructureId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceInfoUpdated {
    pub terminal_equipment_id: TerminalEquipmentId,
    pub terminal_structure_id: TerminalStructureId,
    pub interface_info: Option<InterfaceInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerminalsConnected {
    pub terminal_equipment_id: TerminalEquipmentId,
    pub link: TerminalLink,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminalsDisconnected {
    pub terminal_equipment_id: TerminalEquipmentId,
    pub terminal_link_id: TerminalLinkId,
}

impl TerminalEquipmentEvent {
    pub fn terminal_equipment_id(&self) -> TerminalEquipmentId {
        use TerminalEquipmentEvent::*;

        match self {
            TerminalEquipmentPlaced(e) => e.equipment.id,
            TerminalEquipmentRemoved(e) => e.terminal_equipment_id,
            TerminalStructuresAdded(e) => e.terminal_equipment_id,
            TerminalStructureRemoved(e) => e.terminal_equipment_id,
            InterfaceInfoUpdated(e) => e.terminal_equipment_id,
            TerminalsConnected(e) => e.terminal_equipment_id,
            TerminalsDisconnected(e) => e.terminal_equipment_id,
        }
    }

    pub fn event_type_name(&self) -> &'static str {
        use TerminalEquipmentEvent::*;

        match self {
            TerminalEquipmentPlaced(_) => "TerminalEquipmentPlaced",
            TerminalEquipmentRemoved(_) => "TerminalEquipmentRemoved",
            TerminalStructuresAdded(_) => "TerminalStructuresAdded",
            TerminalStructureRemoved(_) => "TerminalStructureRemoved",
            InterfaceInfoUpdated(_) => "InterfaceInfoUpdated",
            TerminalsConnected(_) => "TerminalsConnected",
            TerminalsDisconnected(_) => "TerminalsDisconnected",
        }
    }
}
