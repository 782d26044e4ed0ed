// Copyright (c) 2025 - Cowboy AI, Inc.
//! Node Container Command Handlers
//!
//! One container per route node. Racks are placed by unique name; terminal
//! equipment goes either directly into the container or onto a rack, where
//! it occupies `height_in_rack_units` consecutive units.

use super::commands::{
    ArrangeRackEquipmentInNodeContainer, MoveRackEquipmentInNodeContainer,
    PlaceNodeContainerInRouteNetwork, PlaceRackInNodeContainer, PlaceTerminalEquipmentInNodeContainer,
    RackArrangement, RemoveNodeContainer,
};
use super::error::CommandError;
use crate::domain::{
    CatalogError, NodeContainer, NodeContainerId, Rack, SubrackMount, SubrackPlacementMethod,
    SpecificationCatalog, TerminalEquipment, TerminalEquipmentId,
};
use crate::events::{
    NodeContainerEvent, NodeContainerPlaced, NodeContainerRemoved, RackEquipmentMoved,
    RackMountPosition, RackPlaced, TerminalEquipmentAddedToContainer, TerminalEquipmentEvent,
    TerminalEquipmentPlaced, TopologyEvent,
};
use crate::projection::Topology;

fn live_container(topology: &Topology, id: NodeContainerId) -> Result<&NodeContainer, CommandError> {
    topology
        .node_container(id)
        .ok_or(CommandError::NodeContainerNotFound(id))
}

pub fn handle_place_node_container(
    topology: &Topology,
    catalog: &SpecificationCatalog,
    command: &PlaceNodeContainerInRouteNetwork,
) -> Result<Vec<TopologyEvent>, CommandError> {
    if catalog.node_container(command.specification_id).is_none() {
        return Err(CommandError::SpecificationNotFound(command.specification_id));
    }
    if topology.node_container_at(command.route_node_id).is_some() {
        return Err(CommandError::NodeContainerAlreadyExistsInRouteNode(command.route_node_id));
    }
    if topology.node_container(command.node_container_id).is_some() {
        return Err(CommandError::IdAlreadyInUse(command.node_container_id.as_uuid()));
    }

    let container = NodeContainer::new(
        command.node_container_id,
        command.specification_id,
        command.route_node_id,
    );
    Ok(vec![NodeContainerEvent::NodeContainerPlaced(NodeContainerPlaced { container }).into()])
}

pub fn handle_remove_node_container(
    topology: &Topology,
    command: &RemoveNodeContainer,
) -> Result<Vec<TopologyEvent>, CommandError> {
    let container = live_container(topology, command.node_container_id)?;
    if !topology.affixed_to_container(container.id).is_empty() {
        return Err(CommandError::NodeContainerHasAffixedSpanEquipment(container.id));
    }
    if !container.is_empty() {
        return Err(CommandError::NodeContainerNotEmpty(container.id));
    }

    Ok(vec![NodeContainerEvent::NodeContainerRemoved(NodeContainerRemoved {
        node_container_id: container.id,
    })
    .into()])
}

pub fn handle_place_rack(
    topology: &Topology,
    catalog: &SpecificationCatalog,
    command: &PlaceRackInNodeContainer,
) -> Result<Vec<TopologyEvent>, CommandError> {
    let container = live_container(topology, command.node_container_id)?;
    if catalog.rack(command.specification_id).is_none() {
        return Err(CommandError::SpecificationNotFound(command.specification_id));
    }
    if command.height_in_units == 0 {
        return Err(CatalogError::ZeroRackHeight.into());
    }
    if container.has_rack_named(&command.name) {
        return Err(CommandError::RackNameAlreadyUsed(command.name.clone()));
    }
    if container.rack(command.rack_id).is_some() {
        return Err(CommandError::IdAlreadyInUse(command.rack_id.as_uuid()));
    }

    let rack = Rack {
        id: command.rack_id,
        name: command.name.clone(),
        position: container.next_rack_position(),
        specification_id: command.specification_id,
        height_in_units: command.height_in_units,
        subrack_mounts: Vec::new(),
    };
    Ok(vec![NodeContainerEvent::RackPlaced(RackPlaced {
        node_container_id: container.id,
        rack,
    })
    .into()])
}

fn ensure_units_available(
    rack: &Rack,
    position: u16,
    height: u16,
    ignoring: Option<TerminalEquipmentId>,
) -> Result<(), CommandError> {
    if !rack.fits(position, height) {
        return Err(CommandError::RackUnitsExceeded { position, height });
    }
    if !rack.is_free(position, height, ignoring) {
        return Err(CommandError::RackUnitsOccupied { position, height });
    }
    Ok(())
}

/// Place a batch of terminal equipment, named `{prefix}{start + i}`
pub fn handle_place_terminal_equipment(
    topology: &Topology,
    catalog: &SpecificationCatalog,
    command: &PlaceTerminalEquipmentInNodeContainer,
) -> Result<Vec<TopologyEvent>, CommandError> {
    let container = live_container(topology, command.node_container_id)?;
    let spec = catalog
        .terminal_equipment(command.specification_id)
        .ok_or(CommandError::SpecificationNotFound(command.specification_id))?;
    if command.number_of_equipments == 0 {
        return Err(CommandError::NothingSpecified);
    }

    let mut mounts: Vec<Option<RackMountPosition>> = vec![None; command.number_of_equipments as usize];
    if let Some(placement) = &command.subrack_placement {
        if !spec.is_rack_equipment {
            return Err(CommandError::NotRackEquipment(spec.id));
        }
        let rack = container
            .rack(placement.rack_id)
            .ok_or(CommandError::RackNotFound(placement.rack_id))?;
        let height = spec.height_in_rack_units;

        for (i, mount) in mounts.iter_mut().enumerate() {
            let step = u16::try_from(i)
                .ok()
                .and_then(|i| i.checked_mul(height))
                .ok_or(CommandError::RackUnitsExceeded {
                    position: placement.start_unit_position,
                    height,
                })?;
            let position = match placement.method {
                SubrackPlacementMethod::BottomUp => placement.start_unit_position.checked_add(step),
                SubrackPlacementMethod::TopDown => placement.start_unit_position.checked_sub(step),
            }
            .ok_or(CommandError::RackUnitsExceeded {
                position: placement.start_unit_position,
                height,
            })?;
            ensure_units_available(rack, position, height, None)?;
            *mount = Some(RackMountPosition {
                rack_id: rack.id,
                position_in_units: position,
                height_in_units: height,
            });
        }
    }

    let mut events = Vec::with_capacity(mounts.len() * 2);
    for (i, rack_mount) in mounts.into_iter().enumerate() {
        let name = command
            .name_prefix
            .as_ref()
            .map(|prefix| format!("{prefix}{}", command.start_sequence_number + i as u32));
        let equipment = TerminalEquipment::from_specification(
            TerminalEquipmentId::new(),
            spec,
            catalog,
            name,
            container.id,
            container.route_node_id,
        )?;
        let terminal_equipment_id = equipment.id;

        events.push(TerminalEquipmentEvent::TerminalEquipmentPlaced(TerminalEquipmentPlaced { equipment }).into());
        events.push(
            NodeContainerEvent::TerminalEquipmentAddedToContainer(TerminalEquipmentAddedToContainer {
                node_container_id: container.id,
                terminal_equipment_id,
                rack_mount,
            })
            .into(),
        );
    }
    Ok(events)
}

fn mounted<'a>(
    container: &'a NodeContainer,
    topology: &Topology,
    terminal_equipment_id: TerminalEquipmentId,
) -> Result<(&'a Rack, &'a SubrackMount), CommandError> {
    let equipment = topology
        .terminal_equipment(terminal_equipment_id)
        .filter(|_| container.contains_terminal_equipment(terminal_equipment_id))
        .ok_or(CommandError::TerminalEquipmentNotFound(terminal_equipment_id))?;
    let rack = container
        .rack_of(terminal_equipment_id)
        .ok_or(CommandError::NotRackEquipment(equipment.specification_id))?;
    let mount = rack
        .mount(terminal_equipment_id)
        .ok_or(CommandError::NotRackEquipment(equipment.specification_id))?;
    Ok((rack, mount))
}

pub fn handle_move_rack_equipment(
    topology: &Topology,
    command: &MoveRackEquipmentInNodeContainer,
) -> Result<Vec<TopologyEvent>, CommandError> {
    let container = live_container(topology, command.node_container_id)?;
    let (from_rack, mount) = mounted(container, topology, command.terminal_equipment_id)?;
    let to_rack = container
        .rack(command.to_rack_id)
        .ok_or(CommandError::RackNotFound(command.to_rack_id))?;

    ensure_units_available(
        to_rack,
        command.to_position_in_units,
        mount.height_in_units,
        Some(command.terminal_equipment_id),
    )?;

    Ok(vec![NodeContainerEvent::RackEquipmentMoved(RackEquipmentMoved {
        node_container_id: container.id,
        terminal_equipment_id: command.terminal_equipment_id,
        from_rack_id: from_rack.id,
        to: RackMountPosition {
            rack_id: to_rack.id,
            position_in_units: command.to_position_in_units,
            height_in_units: mount.height_in_units,
        },
    })
    .into()])
}

/// Shift one rack-mounted equipment up or down inside its rack
pub fn handle_arrange_rack_equipment(
    topology: &Topology,
    command: &ArrangeRackEquipmentInNodeContainer,
) -> Result<Vec<TopologyEvent>, CommandError> {
    let container = live_container(topology, command.node_container_id)?;
    let (rack, mount) = mounted(container, topology, command.terminal_equipment_id)?;
    if command.number_of_units == 0 {
        return Err(CommandError::NothingSpecified);
    }

    let exceeded = CommandError::RackUnitsExceeded {
        position: mount.position_in_units,
        height: mount.height_in_units,
    };
    let position = match command.arrangement {
        RackArrangement::MoveUp => mount.position_in_units.checked_add(command.number_of_units),
        RackArrangement::MoveDown => mount.position_in_units.checked_sub(command.number_of_units),
    }
    .ok_or(exceeded)?;

    ensure_units_available(
        rack,
        position,
        mount.height_in_units,
        Some(command.terminal_equipment_id),
    )?;

    Ok(vec![NodeContainerEvent::RackEquipmentMoved(RackEquipmentMoved {
        node_container_id: container.id,
        terminal_equipment_id: command.terminal_equipment_id,
        from_rack_id: rack.id,
        to: RackMountPosition {
            rack_id: rack.id,
            position_in_units: position,
            height_in_units: mount.height_in_units,
        },
    })
    .into()])
}
