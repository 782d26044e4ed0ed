// Copyright (c) 2025 - Cowboy AI, Inc.
//! Terminal Equipment Command Handlers

use super::commands::{
    PlaceAdditionalStructuresInTerminalEquipment, RemoveTerminalEquipment, RemoveTerminalStructure,
    UpdateTerminalStructureInterfaceInfo,
};
use super::error::CommandError;
use crate::domain::{
    CatalogError, SpecificationCatalog, TerminalEquipment, TerminalEquipmentId, TerminalStructure,
};
use crate::events::{
    InterfaceInfoUpdated, NodeContainerEvent, TerminalEquipmentEvent, TerminalEquipmentRemoved,
    TerminalEquipmentRemovedFromContainer, TerminalStructureRemoved, TerminalStructuresAdded,
    TopologyEvent,
};
use crate::projection::Topology;

fn live_terminal_equipment(
    topology: &Topology,
    id: TerminalEquipmentId,
) -> Result<&TerminalEquipment, CommandError> {
    topology
        .terminal_equipment(id)
        .ok_or(CommandError::TerminalEquipmentNotFound(id))
}

/// Remove terminal equipment and release its place in the container
pub fn handle_remove_terminal_equipment(
    topology: &Topology,
    command: &RemoveTerminalEquipment,
) -> Result<Vec<TopologyEvent>, CommandError> {
    let equipment = live_terminal_equipment(topology, command.terminal_equipment_id)?;
    if topology.is_terminal_equipment_connected(equipment) {
        return Err(CommandError::CannotRemoveConnectedTerminalEquipment(equipment.id));
    }

    let mut events: Vec<TopologyEvent> = vec![TerminalEquipmentEvent::TerminalEquipmentRemoved(
        TerminalEquipmentRemoved {
            terminal_equipment_id: equipment.id,
        },
    )
    .into()];
    if topology.node_container(equipment.node_container_id).is_some() {
        events.push(
            NodeContainerEvent::TerminalEquipmentRemovedFromContainer(TerminalEquipmentRemovedFromContainer {
                node_container_id: equipment.node_container_id,
                terminal_equipment_id: equipment.id,
            })
            .into(),
        );
    }
    Ok(events)
}

pub fn handle_place_additional_structures(
    topology: &Topology,
    catalog: &SpecificationCatalog,
    command: &PlaceAdditionalStructuresInTerminalEquipment,
) -> Result<Vec<TopologyEvent>, CommandError> {
    let equipment = live_terminal_equipment(topology, command.terminal_equipment_id)?;
    let spec = catalog
        .terminal_structure(command.structure_specification_id)
        .ok_or(CommandError::SpecificationNotFound(command.structure_specification_id))?;
    if command.number_of_structures == 0 {
        return Err(CommandError::NothingSpecified);
    }

    let start = command
        .position
        .unwrap_or_else(|| equipment.next_structure_position());
    let structures = (0..command.number_of_structures)
        .map(|i| {
            let position = start
                .checked_add(i)
                .ok_or(CatalogError::DuplicateStructurePosition(start))?;
            if equipment.has_structure_at(position) {
                return Err(CatalogError::DuplicateStructurePosition(position).into());
            }
            Ok(TerminalStructure::from_specification(spec, position))
        })
        .collect::<Result<Vec<_>, CommandError>>()?;

    Ok(vec![TerminalEquipmentEvent::TerminalStructuresAdded(TerminalStructuresAdded {
        terminal_equipment_id: equipment.id,
        structures,
    })
    .into()])
}

pub fn handle_remove_terminal_structure(
    topology: &Topology,
    command: &RemoveTerminalStructure,
) -> Result<Vec<TopologyEvent>, CommandError> {
    let equipment = live_terminal_equipment(topology, command.terminal_equipment_id)?;
    let structure = equipment
        .structure(command.terminal_structure_id)
        .ok_or(CommandError::TerminalStructureNotFound(command.terminal_structure_id))?;
    if topology.is_terminal_structure_connected(structure) {
        return Err(CommandError::CannotRemoveConnectedTerminalStructure(structure.id));
    }

    Ok(vec![TerminalEquipmentEvent::TerminalStructureRemoved(TerminalStructureRemoved {
        terminal_equipment_id: equipment.id,
        terminal_structure_id: structure.id,
    })
    .into()])
}

pub fn handle_update_interface_info(
    topology: &Topology,
    command: &UpdateTerminalStructureInterfaceInfo,
) -> Result<Vec<TopologyEvent>, CommandError> {
    let equipment = live_terminal_equipment(topology, command.terminal_equipment_id)?;
    let structure = equipment
        .structure(command.terminal_structure_id)
        .ok_or(CommandError::TerminalStructureNotFound(command.terminal_structure_id))?;

    Ok(vec![TerminalEquipmentEvent::InterfaceInfoUpdated(InterfaceInfoUpdated {
        terminal_equipment_id: equipment.id,
        terminal_structure_id: structure.id,
        interface_info: command.interface_info.clone(),
    })
    .into()])
}
