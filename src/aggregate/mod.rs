// Copyright (c) 2025 - Cowboy AI, Inc.
//! Pure Functional Command Handlers
//!
//! Commands are decided against the last committed [`Topology`]:
//! - Handlers are pure functions: (Topology, Catalog, Command) → Result<[Event], Error>
//! - All validation happens before any event is produced
//! - No mutations, no I/O, no clock reads
//! - Route network answers (resolved walks) arrive as parameters
//!
//! # Event Sourcing Pattern
//!
//! ```text
//! Command → handle_command → Events → Event Store
//!    ↓            ↓            ↓
//! Intent     Validation      Facts ──fold──▶ Topology'
//! ```
//!
//! A command may produce several events (a cut plus the reroute of every
//! dependent child, a merge plus reroutes, a batch of placed terminal
//! equipment). They commit as one version or not at all.
//!
//! # Handler Modules
//!
//! - [`span_equipment`]: placement, cut, structural edits, container affix, move
//! - [`connectivity`]: connect / disconnect / merge, terminal links
//! - [`node_container`]: containers, racks, rack equipment placement
//! - [`terminal_equipment`]: terminal structures, interface info, removal

pub mod commands;
pub mod connectivity;
pub mod error;
pub mod node_container;
pub mod span_equipment;
pub mod terminal_equipment;

pub use commands::*;
pub use error::{CommandError, ErrorKind};

use crate::domain::{SpecificationCatalog, ValidatedWalk, WalkOfInterestId};
use crate::events::TopologyEvent;
use crate::projection::Topology;
use crate::routing::ResolvedHop;

/// Walk resolved by the route network, with the interest id it is
/// registered under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedWalk {
    pub walk_of_interest_id: WalkOfInterestId,
    pub walk: ValidatedWalk,
}

/// Collaborator answers a command needs before it can be decided
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Resolution {
    #[default]
    None,
    Walk(ResolvedWalk),
    Hops {
        walk_of_interest_id: WalkOfInterestId,
        hops: Vec<ResolvedHop>,
    },
}

fn unresolved(command: &TopologyCommand) -> CommandError {
    CommandError::ErrorCalculatingWalk(format!("{} requires a resolved route", command.name()))
}

/// Decide any topology command
pub fn handle_command(
    topology: &Topology,
    catalog: &SpecificationCatalog,
    command: &TopologyCommand,
    resolution: Resolution,
) -> Result<Vec<TopologyEvent>, CommandError> {
    use TopologyCommand as C;

    match (command, resolution) {
        (C::PlaceSpanEquipmentInRouteNetwork(c), Resolution::Walk(walk)) => {
            span_equipment::handle_place_span_equipment_in_route_network(topology, catalog, c, walk)
        }
        (
            C::PlaceSpanEquipmentInUtilityNetwork(c),
            Resolution::Hops {
                walk_of_interest_id,
                hops,
            },
        ) => span_equipment::handle_place_span_equipment_in_utility_network(
            topology,
            catalog,
            c,
            &hops,
            walk_of_interest_id,
        ),
        (C::AffixSpanEquipmentToParent(c), Resolution::Hops { hops, .. }) => {
            span_equipment::handle_affix_span_equipment_to_parent(topology, c, &hops)
        }
        (C::MoveSpanEquipment(c), Resolution::Walk(walk)) => {
            span_equipment::handle_move_span_equipment(topology, c, walk)
        }
        (
            C::PlaceSpanEquipmentInRouteNetwork(_)
            | C::PlaceSpanEquipmentInUtilityNetwork(_)
            | C::AffixSpanEquipmentToParent(_)
            | C::MoveSpanEquipment(_),
            _,
        ) => Err(unresolved(command)),

        (C::CutSpanSegmentsAtRouteNode(c), _) => span_equipment::handle_cut_span_segments(topology, c),
        (C::AffixSpanEquipmentToNodeContainer(c), _) => {
            span_equipment::handle_affix_span_equipment_to_node_container(topology, c)
        }
        (C::DetachSpanEquipmentFromNodeContainer(c), _) => {
            span_equipment::handle_detach_span_equipment_from_node_container(topology, c)
        }
        (C::AddAdditionalInnerSpanStructures(c), _) => {
            span_equipment::handle_add_additional_inner_span_structures(topology, catalog, c)
        }
        (C::RemoveSpanStructure(c), _) => span_equipment::handle_remove_span_structure(topology, catalog, c),
        (C::RemoveSpanEquipment(c), _) => span_equipment::handle_remove_span_equipment(topology, c),
        (C::UpdateSpanEquipmentName(c), _) => span_equipment::handle_update_span_equipment_name(topology, c),

        (C::ConnectSpanSegmentsAtRouteNode(c), _) => connectivity::handle_connect_span_segments(topology, c),
        (C::ConnectSpanSegmentsByIndexAtRouteNode(c), _) => {
            connectivity::handle_connect_span_segments_by_index(topology, c)
        }
        (C::DisconnectSpanSegmentsAtRouteNode(c), _) => {
            connectivity::handle_disconnect_span_segments(topology, c)
        }
        (C::ConnectTerminalsAtRouteNode(c), _) => connectivity::handle_connect_terminals(topology, c),
        (C::DisconnectTerminalsAtRouteNode(c), _) => connectivity::handle_disconnect_terminals(topology, c),

        (C::PlaceNodeContainerInRouteNetwork(c), _) => {
            node_container::handle_place_node_container(topology, catalog, c)
        }
        (C::RemoveNodeContainer(c), _) => node_container::handle_remove_node_container(topology, c),
        (C::PlaceRackInNodeContainer(c), _) => node_container::handle_place_rack(topology, catalog, c),
        (C::PlaceTerminalEquipmentInNodeContainer(c), _) => {
            node_container::handle_place_terminal_equipment(topology, catalog, c)
        }
        (C::MoveRackEquipmentInNodeContainer(c), _) => node_container::handle_move_rack_equipment(topology, c),
        (C::ArrangeRackEquipmentInNodeContainer(c), _) => {
            node_container::handle_arrange_rack_equipment(topology, c)
        }

        (C::RemoveTerminalEquipment(c), _) => {
            terminal_equipment::handle_remove_terminal_equipment(topology, c)
        }
        (C::PlaceAdditionalStructuresInTerminalEquipment(c), _) => {
            terminal_equipment::handle_place_additional_structures(topology, catalog, c)
        }
        (C::RemoveTerminalStructure(c), _) => {
            terminal_equipment::handle_remove_terminal_structure(topology, c)
        }
        (C::UpdateTerminalStructureInterfaceInfo(c), _) => {
            terminal_equipment::handle_update_interface_info(topology, c)
        }
    }
}
