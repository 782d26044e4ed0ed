// Copyright (c) 2025 - Cowboy AI, Inc.
//! Span Equipment Command Handlers
//!
//! Placement, cut, structural edits, container affixes and move. Each handler
//! validates against the committed [`Topology`] and returns the events that
//! describe the change; nothing is mutated here.
//!
//! Handlers that change a parent's segments or walk (cut, move) also return
//! `SpanEquipmentRerouted` events for every dependent utility-network child,
//! so the parent change and child recalculation commit together.

use super::commands::{
    AddAdditionalInnerSpanStructures, AffixSpanEquipmentToNodeContainer, AffixSpanEquipmentToParent,
    CutSpanSegmentsAtRouteNode, DetachSpanEquipmentFromNodeContainer, MoveSpanEquipment,
    PlaceSpanEquipmentInRouteNetwork, PlaceSpanEquipmentInUtilityNetwork, RemoveSpanEquipment,
    RemoveSpanStructure, UpdateSpanEquipmentName,
};
use super::error::CommandError;
use super::ResolvedWalk;
use crate::domain::{
    CatalogError, NodeContainerAffix, RouteNodeId, SpanEquipment, SpanEquipmentId,
    SpanEquipmentSpecification, SpanSegment, SpanSegmentId, SpanStructure, SpecificationCatalog,
    ValidatedWalk, WalkOfInterestId,
};
use crate::events::{
    AdditionalInnerSpanStructuresAdded, SpanEquipmentAffixedToContainer, SpanEquipmentAffixedToParent,
    SpanEquipmentDetachedFromContainer, SpanEquipmentEvent, SpanEquipmentMoved,
    SpanEquipmentNameChanged, SpanEquipmentPlaced, SpanEquipmentRemoved, SpanSegmentCut,
    SpanSegmentsCut, SpanStructureRemoved, TopologyEvent,
};
use crate::projection::Topology;
use crate::routing::{self, ParentChanges, ResolvedHop};

pub(crate) fn live_span_equipment(
    topology: &Topology,
    id: SpanEquipmentId,
) -> Result<&SpanEquipment, CommandError> {
    topology
        .span_equipment(id)
        .ok_or(CommandError::SpanEquipmentNotFound(id))
}

fn span_equipment_specification<'a>(
    catalog: &'a SpecificationCatalog,
    equipment: &SpanEquipment,
) -> Result<&'a SpanEquipmentSpecification, CommandError> {
    catalog
        .span_equipment(equipment.specification_id)
        .ok_or(CommandError::SpecificationNotFound(equipment.specification_id))
}

fn ensure_new_id(topology: &Topology, id: SpanEquipmentId) -> Result<(), CommandError> {
    if topology.span_equipment_including_deleted(id).is_some() {
        return Err(CommandError::IdAlreadyInUse(id.as_uuid()));
    }
    Ok(())
}

fn rerouted_events(
    topology: &Topology,
    changes: &ParentChanges,
) -> Result<Vec<TopologyEvent>, CommandError> {
    Ok(routing::reroute_dependents(topology, changes)?
        .into_iter()
        .map(|e| SpanEquipmentEvent::SpanEquipmentRerouted(e).into())
        .collect())
}

/// Place span equipment along a raw route network walk
pub fn handle_place_span_equipment_in_route_network(
    topology: &Topology,
    catalog: &SpecificationCatalog,
    command: &PlaceSpanEquipmentInRouteNetwork,
    resolved: ResolvedWalk,
) -> Result<Vec<TopologyEvent>, CommandError> {
    ensure_new_id(topology, command.span_equipment_id)?;
    let spec = catalog
        .span_equipment(command.specification_id)
        .ok_or(CommandError::SpecificationNotFound(command.specification_id))?;

    let equipment = SpanEquipment::from_specification(
        command.span_equipment_id,
        spec,
        resolved.walk_of_interest_id,
        resolved.walk,
        command.name.clone(),
    );

    Ok(vec![SpanEquipmentEvent::SpanEquipmentPlaced(SpanEquipmentPlaced { equipment }).into()])
}

/// Place span equipment through hops in other equipment
pub fn handle_place_span_equipment_in_utility_network(
    topology: &Topology,
    catalog: &SpecificationCatalog,
    command: &PlaceSpanEquipmentInUtilityNetwork,
    resolved_hops: &[ResolvedHop],
    walk_of_interest_id: WalkOfInterestId,
) -> Result<Vec<TopologyEvent>, CommandError> {
    ensure_new_id(topology, command.span_equipment_id)?;
    let spec = catalog
        .span_equipment(command.specification_id)
        .ok_or(CommandError::SpecificationNotFound(command.specification_id))?;

    let (walk, hops) = routing::build_hops(topology, resolved_hops)?;
    let mut equipment = SpanEquipment::from_specification(
        command.span_equipment_id,
        spec,
        walk_of_interest_id,
        walk,
        command.name.clone(),
    );
    equipment.utility_network_hops = hops;

    Ok(vec![SpanEquipmentEvent::SpanEquipmentPlaced(SpanEquipmentPlaced { equipment }).into()])
}

/// Re-express placed equipment as hops; the route itself must not change
pub fn handle_affix_span_equipment_to_parent(
    topology: &Topology,
    command: &AffixSpanEquipmentToParent,
    resolved_hops: &[ResolvedHop],
) -> Result<Vec<TopologyEvent>, CommandError> {
    let equipment = live_span_equipment(topology, command.span_equipment_id)?;
    let (walk, hops) = routing::build_hops(topology, resolved_hops)?;

    let (walk, hops) = if walk == equipment.walk {
        (walk, hops)
    } else if walk.reversed() == equipment.walk {
        let hops = hops.iter().rev().map(|hop| hop.reversed()).collect();
        (walk.reversed(), hops)
    } else {
        return Err(CommandError::ErrorCalculatingWalk(format!(
            "hops do not follow the walk of span equipment {}",
            equipment.id
        )));
    };

    Ok(vec![SpanEquipmentEvent::SpanEquipmentAffixedToParent(
        SpanEquipmentAffixedToParent {
            span_equipment_id: equipment.id,
            walk,
            node_of_interest_ids: equipment.node_of_interest_ids.clone(),
            hops,
        },
    )
    .into()])
}

/// Cut segments at a route node; segments of several equipments are grouped
/// into one cut event per equipment
pub fn handle_cut_span_segments(
    topology: &Topology,
    command: &CutSpanSegmentsAtRouteNode,
) -> Result<Vec<TopologyEvent>, CommandError> {
    if command.span_segment_ids.is_empty() {
        return Err(CommandError::NothingSpecified);
    }

    let mut grouped: Vec<(SpanEquipmentId, Vec<SpanSegmentId>)> = Vec::new();
    for segment_id in &command.span_segment_ids {
        let (equipment, _) = topology
            .span_segment(*segment_id)
            .ok_or(CommandError::SegmentNotFound(*segment_id))?;
        match grouped.iter_mut().find(|(id, _)| *id == equipment.id) {
            Some((_, ids)) if ids.contains(segment_id) => {}
            Some((_, ids)) => ids.push(*segment_id),
            None => grouped.push((equipment.id, vec![*segment_id])),
        }
    }

    let mut events = Vec::new();
    let mut changes = ParentChanges::default();
    for (equipment_id, segment_ids) in grouped {
        let equipment = live_span_equipment(topology, equipment_id)?;
        let (cut, after) = cut_equipment(equipment, command.route_node_id, &segment_ids)?;
        for c in &cut.cuts {
            changes
                .replaced_segments
                .insert(c.old_span_segment_id, c.new_span_segment_ids);
        }
        changes.parents.insert(equipment_id, after);
        events.push(SpanEquipmentEvent::SpanSegmentsCut(cut).into());
    }

    events.extend(rerouted_events(topology, &changes)?);
    Ok(events)
}

/// Validate a cut on one equipment; returns the event and the state after it
fn cut_equipment(
    equipment: &SpanEquipment,
    route_node_id: RouteNodeId,
    segment_ids: &[SpanSegmentId],
) -> Result<(SpanSegmentsCut, SpanEquipment), CommandError> {
    let first_segment = segment_ids[0];
    if equipment.is_end_node(route_node_id) {
        return Err(CommandError::CannotCutAtEquipmentEnd(first_segment));
    }
    let Some(walk_position) = equipment.walk.position_of(route_node_id) else {
        return Err(CommandError::SegmentNotRelatedToRouteNode {
            segment: first_segment,
            route_node: route_node_id,
        });
    };

    let segments: Vec<&SpanSegment> = segment_ids
        .iter()
        .map(|id| equipment.segment(*id).ok_or(CommandError::SegmentNotFound(*id)))
        .collect::<Result<_, _>>()?;

    let (index, inserted) = match equipment.node_of_interest_index(route_node_id) {
        Some(index) => {
            for segment in &segments {
                if segment.end_at_index(index).is_some() {
                    return Err(CommandError::SegmentAlreadyCut(segment.id));
                }
                if !segment.spans_index(index) {
                    return Err(CommandError::SegmentNotRelatedToRouteNode {
                        segment: segment.id,
                        route_node: route_node_id,
                    });
                }
            }
            (index, false)
        }
        None => {
            let positions = equipment.node_of_interest_walk_positions().ok_or_else(|| {
                CommandError::ErrorCalculatingWalk(format!(
                    "nodes of interest of {} are not on its walk",
                    equipment.id
                ))
            })?;
            let index = positions.iter().filter(|p| **p < walk_position).count() as u16;
            for segment in &segments {
                // old indices: the new node lands between from and to
                if !(segment.from_node_of_interest_index < index
                    && index <= segment.to_node_of_interest_index)
                {
                    return Err(CommandError::SegmentNotRelatedToRouteNode {
                        segment: segment.id,
                        route_node: route_node_id,
                    });
                }
            }
            (index, true)
        }
    };

    let cut = SpanSegmentsCut {
        span_equipment_id: equipment.id,
        route_node_id,
        node_of_interest_index: index,
        node_of_interest_inserted: inserted,
        cuts: segment_ids
            .iter()
            .map(|id| SpanSegmentCut {
                old_span_segment_id: *id,
                new_span_segment_ids: [SpanSegmentId::new(), SpanSegmentId::new()],
            })
            .collect(),
    };

    let mut after = equipment.clone();
    if inserted {
        after.insert_node_of_interest(index, route_node_id);
    }
    for c in &cut.cuts {
        after.split_segment(
            c.old_span_segment_id,
            index,
            c.new_span_segment_ids[0],
            c.new_span_segment_ids[1],
        );
    }

    Ok((cut, after))
}

pub fn handle_affix_span_equipment_to_node_container(
    topology: &Topology,
    command: &AffixSpanEquipmentToNodeContainer,
) -> Result<Vec<TopologyEvent>, CommandError> {
    let equipment = live_span_equipment(topology, command.span_equipment_id)?;
    let container = topology
        .node_container(command.node_container_id)
        .ok_or(CommandError::NodeContainerNotFound(command.node_container_id))?;
    let route_node_id = container.route_node_id;

    if !equipment.walk.contains_node(route_node_id) {
        return Err(CommandError::NodeContainerNotOnWalk(route_node_id));
    }
    if equipment.affix_at(route_node_id).is_some() {
        return Err(CommandError::AlreadyAffixed {
            span_equipment_id: equipment.id,
            route_node: route_node_id,
        });
    }

    Ok(vec![SpanEquipmentEvent::SpanEquipmentAffixedToContainer(
        SpanEquipmentAffixedToContainer {
            span_equipment_id: equipment.id,
            affix: NodeContainerAffix {
                node_container_id: container.id,
                route_node_id,
                ingoing_side: command.ingoing_side,
            },
        },
    )
    .into()])
}

pub fn handle_detach_span_equipment_from_node_container(
    topology: &Topology,
    command: &DetachSpanEquipmentFromNodeContainer,
) -> Result<Vec<TopologyEvent>, CommandError> {
    let equipment = live_span_equipment(topology, command.span_equipment_id)?;
    let affix = equipment
        .node_container_affixes
        .iter()
        .find(|affix| affix.node_container_id == command.node_container_id)
        .ok_or(CommandError::NotAffixedToNodeContainer(equipment.id))?;
    let route_node_id = affix.route_node_id;

    if equipment.is_cut_at(route_node_id) {
        return Err(CommandError::SegmentCutInsideContainer(equipment.id));
    }
    if equipment.is_connected_at(route_node_id) {
        return Err(CommandError::SegmentConnectedInsideContainer(equipment.id));
    }

    Ok(vec![SpanEquipmentEvent::SpanEquipmentDetachedFromContainer(
        SpanEquipmentDetachedFromContainer {
            span_equipment_id: equipment.id,
            node_container_id: command.node_container_id,
            route_node_id,
        },
    )
    .into()])
}

/// Append inner structures at level 2, after the last used position
pub fn handle_add_additional_inner_span_structures(
    topology: &Topology,
    catalog: &SpecificationCatalog,
    command: &AddAdditionalInnerSpanStructures,
) -> Result<Vec<TopologyEvent>, CommandError> {
    let equipment = live_span_equipment(topology, command.span_equipment_id)?;
    if span_equipment_specification(catalog, equipment)?.fixed {
        return Err(CommandError::CannotAddToFixedSpanEquipment(equipment.id));
    }
    if command.span_structure_specification_ids.is_empty() {
        return Err(CommandError::NothingSpecified);
    }

    let mut next_position = equipment
        .live_structures()
        .filter(|(_, s)| s.level == 2)
        .map(|(_, s)| s.position)
        .max()
        .unwrap_or(0)
        + 1;

    let mut structures = Vec::with_capacity(command.span_structure_specification_ids.len());
    for specification_id in &command.span_structure_specification_ids {
        if catalog.span_structure(*specification_id).is_none() {
            return Err(CatalogError::UnknownSpanStructureSpecification(*specification_id).into());
        }
        structures.push(SpanStructure::new(
            *specification_id,
            2,
            next_position,
            vec![SpanSegment::new(SpanSegmentId::new(), 0, equipment.last_index())],
        ));
        next_position += 1;
    }

    Ok(vec![SpanEquipmentEvent::AdditionalInnerSpanStructuresAdded(
        AdditionalInnerSpanStructuresAdded {
            span_equipment_id: equipment.id,
            structures,
        },
    )
    .into()])
}

fn has_children_through(
    topology: &Topology,
    equipment: &SpanEquipment,
    structure: Option<&SpanStructure>,
) -> bool {
    topology.dependent_children(equipment.id).iter().any(|child_id| {
        let Some(child) = topology.span_equipment(*child_id) else {
            return false;
        };
        child
            .utility_network_hops
            .iter()
            .flat_map(|hop| hop.parent_affixes.iter())
            .any(|affix| match structure {
                Some(s) => s.span_segments.iter().any(|seg| seg.id == affix.span_segment_id),
                None => equipment.segment(affix.span_segment_id).is_some(),
            })
    })
}

/// Remove a structure; removing the outer structure removes the equipment
pub fn handle_remove_span_structure(
    topology: &Topology,
    catalog: &SpecificationCatalog,
    command: &RemoveSpanStructure,
) -> Result<Vec<TopologyEvent>, CommandError> {
    let equipment = live_span_equipment(topology, command.span_equipment_id)?;
    let structure = equipment
        .live_structures()
        .map(|(_, s)| s)
        .find(|s| s.id == command.span_structure_id)
        .ok_or(CommandError::SpanStructureNotFound(command.span_structure_id))?;

    if structure.is_outer() {
        return remove_equipment(topology, equipment);
    }
    if span_equipment_specification(catalog, equipment)?.fixed {
        return Err(CommandError::CannotRemoveFromFixedSpanEquipment(equipment.id));
    }
    if structure.has_connected_segments() {
        return Err(CommandError::CannotRemoveConnectedStructure(structure.id));
    }
    if has_children_through(topology, equipment, Some(structure)) {
        return Err(CommandError::EquipmentHasDependentChildren(equipment.id));
    }

    Ok(vec![SpanEquipmentEvent::SpanStructureRemoved(SpanStructureRemoved {
        span_equipment_id: equipment.id,
        span_structure_id: structure.id,
    })
    .into()])
}

pub fn handle_remove_span_equipment(
    topology: &Topology,
    command: &RemoveSpanEquipment,
) -> Result<Vec<TopologyEvent>, CommandError> {
    let equipment = live_span_equipment(topology, command.span_equipment_id)?;
    remove_equipment(topology, equipment)
}

fn remove_equipment(
    topology: &Topology,
    equipment: &SpanEquipment,
) -> Result<Vec<TopologyEvent>, CommandError> {
    if equipment.has_connected_segments() {
        return Err(CommandError::CannotRemoveEquipmentWithConnectedSegments(equipment.id));
    }
    if !equipment.node_container_affixes.is_empty() {
        return Err(CommandError::CannotRemoveAffixedEquipment(equipment.id));
    }
    if has_children_through(topology, equipment, None) {
        return Err(CommandError::EquipmentHasDependentChildren(equipment.id));
    }

    Ok(vec![SpanEquipmentEvent::SpanEquipmentRemoved(SpanEquipmentRemoved {
        span_equipment_id: equipment.id,
    })
    .into()])
}

/// Orient a requested walk to keep as many ends as possible in place
fn orient_new_walk(current: &ValidatedWalk, requested: ValidatedWalk) -> ValidatedWalk {
    let keeps_an_end = requested.first_node() == current.first_node()
        || requested.last_node() == current.last_node();
    let keeps_reversed_end = requested.last_node() == current.first_node()
        || requested.first_node() == current.last_node();
    if !keeps_an_end && keeps_reversed_end {
        requested.reversed()
    } else {
        requested
    }
}

/// Move one or both ends of a span equipment to a new walk
pub fn handle_move_span_equipment(
    topology: &Topology,
    command: &MoveSpanEquipment,
    resolved: ResolvedWalk,
) -> Result<Vec<TopologyEvent>, CommandError> {
    let equipment = live_span_equipment(topology, command.span_equipment_id)?;
    if equipment.is_utility_network_routed() {
        return Err(CommandError::CannotMoveUtilityNetworkRoutedEquipment(equipment.id));
    }

    let new_walk = orient_new_walk(&equipment.walk, resolved.walk);
    if new_walk == equipment.walk {
        return Err(CommandError::NewWalkEqualsExistingWalk);
    }

    let last = equipment.last_index();
    let first_moved = new_walk.first_node() != equipment.first_node();
    let last_moved = new_walk.last_node() != equipment.last_node();

    if first_moved && last_moved && equipment.has_interior_cuts() {
        return Err(CommandError::CannotMoveBothEndsWithCuts(equipment.id));
    }

    for (moved, end_index, neighbour_index) in [
        (first_moved, 0u16, 1u16),
        (last_moved, last, last.saturating_sub(1)),
    ] {
        if !moved {
            continue;
        }
        let end_node = equipment.node_at(end_index);
        let neighbour_is_cut = neighbour_index != 0
            && neighbour_index != last
            && !equipment.segment_ends_at(neighbour_index).is_empty();
        if neighbour_is_cut && !new_walk.contains_node(equipment.node_at(neighbour_index)) {
            return Err(CommandError::CannotMoveFromEndWhereSegmentsAreCut(end_node));
        }
        if equipment.is_connected_at(end_node) {
            return Err(CommandError::CannotMoveFromEndWhereSegmentsAreConnected(end_node));
        }
        if equipment.affix_at(end_node).is_some() {
            return Err(CommandError::CannotMoveBecauseAffixedToContainer(end_node));
        }
    }

    for affix in &equipment.node_container_affixes {
        if !new_walk.contains_node(affix.route_node_id) {
            return Err(CommandError::CannotMoveBecauseAffixedToContainer(affix.route_node_id));
        }
    }

    let interior = &equipment.node_of_interest_ids[1..equipment.node_of_interest_ids.len() - 1];
    let inner_walk = &new_walk.node_ids()[1..new_walk.node_ids().len() - 1];
    let mut search_from = 0;
    for node in interior {
        match inner_walk[search_from..].iter().position(|n| n == node) {
            Some(offset) => search_from += offset + 1,
            None => return Err(CommandError::InteriorNodeNotOnNewWalk(*node)),
        }
    }

    let mut node_of_interest_ids = Vec::with_capacity(equipment.node_of_interest_ids.len());
    node_of_interest_ids.push(new_walk.first_node());
    node_of_interest_ids.extend_from_slice(interior);
    node_of_interest_ids.push(new_walk.last_node());

    let mut moved = equipment.clone();
    moved.walk_of_interest_id = resolved.walk_of_interest_id;
    moved.walk = new_walk.clone();
    moved.node_of_interest_ids = node_of_interest_ids.clone();

    let mut events: Vec<TopologyEvent> = vec![SpanEquipmentEvent::SpanEquipmentMoved(SpanEquipmentMoved {
        span_equipment_id: equipment.id,
        walk_of_interest_id: resolved.walk_of_interest_id,
        walk: new_walk,
        node_of_interest_ids,
    })
    .into()];
    events.extend(rerouted_events(topology, &ParentChanges::with_parent(moved))?);
    Ok(events)
}

pub fn handle_update_span_equipment_name(
    topology: &Topology,
    command: &UpdateSpanEquipmentName,
) -> Result<Vec<TopologyEvent>, CommandError> {
    let equipment = live_span_equipment(topology, command.span_equipment_id)?;
    Ok(vec![SpanEquipmentEvent::SpanEquipmentNameChanged(SpanEquipmentNameChanged {
        span_equipment_id: equipment.id,
        name: command.name.clone(),
    })
    .into()])
}

