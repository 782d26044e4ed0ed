// Copyright (c) 2025 - Cowboy AI, Inc.
//! Command Validation Errors
//!
//! Every rejected command yields one [`CommandError`]. Validation happens
//! before any state is touched, so a rejection never leaves partial state.
//! Each variant has a stable machine-readable [`code`](CommandError::code)
//! and belongs to one [`ErrorKind`] family. None are retryable: the same
//! command against the same state fails the same way.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{
    CatalogError, NodeContainerId, RackId, RouteNodeId, SpanEquipmentId, SpanSegmentId,
    SpanStructureId, SpecificationId, TerminalEquipmentId, TerminalId, TerminalLinkId,
    TerminalStructureId, WalkError,
};

/// Error family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    StructuralValidation,
    NotFound,
    GraphStateConflict,
    InvariantViolation,
    RoutingError,
}

/// Command validation error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    // Structural validation
    #[error("Specification catalog violation: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Invalid walk: {0}")]
    InvalidWalk(#[from] WalkError),

    #[error("Command names no segments or terminals")]
    NothingSpecified,

    #[error("Span equipment {a} and {b} do not share a specification")]
    SpecificationMismatch { a: SpanEquipmentId, b: SpanEquipmentId },

    #[error("Structure index {index} out of range on span equipment {span_equipment_id}")]
    StructureIndexOutOfRange { span_equipment_id: SpanEquipmentId, index: usize },

    #[error("Structure position {position} at level {level} is already used")]
    StructurePositionAlreadyUsed { level: u8, position: u16 },

    #[error("Terminal equipment specification {0} is not rack equipment")]
    NotRackEquipment(SpecificationId),

    #[error("Identifier {0} is already in use")]
    IdAlreadyInUse(uuid::Uuid),

    // Not found
    #[error("Span equipment {0} not found")]
    SpanEquipmentNotFound(SpanEquipmentId),

    #[error("Span segment {0} not found")]
    SegmentNotFound(SpanSegmentId),

    #[error("Span structure {0} not found")]
    SpanStructureNotFound(SpanStructureId),

    #[error("Terminal {0} not found")]
    TerminalNotFound(TerminalId),

    #[error("Terminal equipment {0} not found")]
    TerminalEquipmentNotFound(TerminalEquipmentId),

    #[error("Terminal structure {0} not found")]
    TerminalStructureNotFound(TerminalStructureId),

    #[error("Terminal link {0} not found")]
    TerminalLinkNotFound(TerminalLinkId),

    #[error("Node container {0} not found")]
    NodeContainerNotFound(NodeContainerId),

    #[error("No node container in route node {0}")]
    NoNodeContainerInRouteNode(RouteNodeId),

    #[error("Route node {0} not found in the route network")]
    RouteNodeNotFound(RouteNodeId),

    #[error("Rack {0} not found")]
    RackNotFound(RackId),

    #[error("Specification {0} not found")]
    SpecificationNotFound(SpecificationId),

    // Graph state conflicts
    #[error("Span segment {0} is already cut at the route node")]
    SegmentAlreadyCut(SpanSegmentId),

    #[error("Cannot cut span segment {0} at an end of the equipment")]
    CannotCutAtEquipmentEnd(SpanSegmentId),

    #[error("Element {0} cannot be connected to itself")]
    CannotConnectToItself(uuid::Uuid),

    #[error("Structures at different levels cannot be connected")]
    OuterAndInnerCannotBeConnected,

    #[error("Span segment {0} is already connected at the route node")]
    AlreadyConnected(SpanSegmentId),

    #[error("Terminal {0} has no free capacity")]
    TerminalAlreadyConnected(TerminalId),

    #[error("Element {0} cannot be disconnected from itself")]
    CannotDisconnectFromItself(uuid::Uuid),

    #[error("Elements {a} and {b} are not connected")]
    SegmentsNotConnected { a: uuid::Uuid, b: uuid::Uuid },

    #[error("Span segment {segment} has no end at route node {route_node}")]
    SegmentEndNotAtRouteNode { segment: SpanSegmentId, route_node: RouteNodeId },

    #[error("Terminal {terminal} is not located in route node {route_node}")]
    TerminalNotAtRouteNode { terminal: TerminalId, route_node: RouteNodeId },

    #[error("Span equipment {a} and {b} do not both end in route node {route_node}")]
    EndsNotColocated { a: SpanEquipmentId, b: SpanEquipmentId, route_node: RouteNodeId },

    #[error("A merge of outer structures must be the only connection in the command")]
    MergeMustBeSoleConnection,

    #[error("Span equipment {span_equipment_id} is already affixed in route node {route_node}")]
    AlreadyAffixed { span_equipment_id: SpanEquipmentId, route_node: RouteNodeId },

    #[error("Span equipment {0} is not affixed to the node container")]
    NotAffixedToNodeContainer(SpanEquipmentId),

    #[error("Node container route node {0} is not on the span equipment walk")]
    NodeContainerNotOnWalk(RouteNodeId),

    #[error("Span equipment {0} has segments cut inside the container")]
    SegmentCutInsideContainer(SpanEquipmentId),

    #[error("Span equipment {0} has segments connected inside the container")]
    SegmentConnectedInsideContainer(SpanEquipmentId),

    #[error("New walk equals the existing walk")]
    NewWalkEqualsExistingWalk,

    #[error("Route node {0} already holds a node container")]
    NodeContainerAlreadyExistsInRouteNode(RouteNodeId),

    #[error("Rack name {0} is already used in the container")]
    RackNameAlreadyUsed(String),

    #[error("Rack units from {position} height {height} are occupied")]
    RackUnitsOccupied { position: u16, height: u16 },

    #[error("Rack units from {position} height {height} exceed the rack")]
    RackUnitsExceeded { position: u16, height: u16 },

    // Invariant violations
    #[error("Span structure {0} has connected segments")]
    CannotRemoveConnectedStructure(SpanStructureId),

    #[error("Span equipment {0} has a fixed specification")]
    CannotRemoveFromFixedSpanEquipment(SpanEquipmentId),

    #[error("Span equipment {0} has a fixed specification")]
    CannotAddToFixedSpanEquipment(SpanEquipmentId),

    #[error("Span equipment {0} has connected segments")]
    CannotRemoveEquipmentWithConnectedSegments(SpanEquipmentId),

    #[error("Span equipment {0} is affixed to a node container")]
    CannotRemoveAffixedEquipment(SpanEquipmentId),

    #[error("Span equipment {0} has dependent children routed through it")]
    EquipmentHasDependentChildren(SpanEquipmentId),

    #[error("Cannot move end in route node {0}: segments are cut there")]
    CannotMoveFromEndWhereSegmentsAreCut(RouteNodeId),

    #[error("Cannot move end in route node {0}: segments are connected there")]
    CannotMoveFromEndWhereSegmentsAreConnected(RouteNodeId),

    #[error("Cannot move end in route node {0}: affixed to a node container")]
    CannotMoveBecauseAffixedToContainer(RouteNodeId),

    #[error("Cannot move both ends of span equipment {0} with interior cuts")]
    CannotMoveBothEndsWithCuts(SpanEquipmentId),

    #[error("Interior node of interest {0} is not on the new walk")]
    InteriorNodeNotOnNewWalk(RouteNodeId),

    #[error("Span equipment {0} is routed through the utility network and cannot be moved directly")]
    CannotMoveUtilityNetworkRoutedEquipment(SpanEquipmentId),

    #[error("Dependent span equipment {0} is connected at an end that would move")]
    DependentChildConnectedAtMovedEnd(SpanEquipmentId),

    #[error("Span equipment {0} is routed through the utility network and cannot be merged")]
    CannotMergeUtilityNetworkRoutedEquipment(SpanEquipmentId),

    #[error("Node container {0} has affixed span equipment")]
    NodeContainerHasAffixedSpanEquipment(NodeContainerId),

    #[error("Node container {0} is not empty")]
    NodeContainerNotEmpty(NodeContainerId),

    #[error("Terminal equipment {0} has connected terminals")]
    CannotRemoveConnectedTerminalEquipment(TerminalEquipmentId),

    #[error("Terminal structure {0} has connected terminals")]
    CannotRemoveConnectedTerminalStructure(TerminalStructureId),

    // Routing
    #[error("Span segment {segment} is not related to route node {route_node}")]
    SegmentNotRelatedToRouteNode { segment: SpanSegmentId, route_node: RouteNodeId },

    #[error("Error calculating walk: {0}")]
    ErrorCalculatingWalk(String),
}

impl CommandError {
    pub fn kind(&self) -> ErrorKind {
        use CommandError::*;

        match self {
            Catalog(_)
            | InvalidWalk(_)
            | NothingSpecified
            | SpecificationMismatch { .. }
            | StructureIndexOutOfRange { .. }
            | StructurePositionAlreadyUsed { .. }
            | NotRackEquipment(_)
            | IdAlreadyInUse(_) => ErrorKind::StructuralValidation,

            SpanEquipmentNotFound(_)
            | SegmentNotFound(_)
            | SpanStructureNotFound(_)
            | TerminalNotFound(_)
            | TerminalEquipmentNotFound(_)
            | TerminalStructureNotFound(_)
            | TerminalLinkNotFound(_)
            | NodeContainerNotFound(_)
            | NoNodeContainerInRouteNode(_)
            | RouteNodeNotFound(_)
            | RackNotFound(_)
            | SpecificationNotFound(_) => ErrorKind::NotFound,

            SegmentAlreadyCut(_)
            | CannotCutAtEquipmentEnd(_)
            | CannotConnectToItself(_)
            | OuterAndInnerCannotBeConnected
            | AlreadyConnected(_)
            | TerminalAlreadyConnected(_)
            | CannotDisconnectFromItself(_)
            | SegmentsNotConnected { .. }
            | SegmentEndNotAtRouteNode { .. }
            | TerminalNotAtRouteNode { .. }
            | EndsNotColocated { .. }
            | MergeMustBeSoleConnection
            | AlreadyAffixed { .. }
            | NotAffixedToNodeContainer(_)
            | NodeContainerNotOnWalk(_)
            | SegmentCutInsideContainer(_)
            | SegmentConnectedInsideContainer(_)
            | NewWalkEqualsExistingWalk
            | NodeContainerAlreadyExistsInRouteNode(_)
            | RackNameAlreadyUsed(_)
            | RackUnitsOccupied { .. }
            | RackUnitsExceeded { .. } => ErrorKind::GraphStateConflict,

            CannotRemoveConnectedStructure(_)
            | CannotRemoveFromFixedSpanEquipment(_)
            | CannotAddToFixedSpanEquipment(_)
            | CannotRemoveEquipmentWithConnectedSegments(_)
            | CannotRemoveAffixedEquipment(_)
            | EquipmentHasDependentChildren(_)
            | CannotMoveFromEndWhereSegmentsAreCut(_)
            | CannotMoveFromEndWhereSegmentsAreConnected(_)
            | CannotMoveBecauseAffixedToContainer(_)
            | CannotMoveBothEndsWithCuts(_)
            | InteriorNodeNotOnNewWalk(_)
            | CannotMoveUtilityNetworkRoutedEquipment(_)
            | DependentChildConnectedAtMovedEnd(_)
            | CannotMergeUtilityNetworkRoutedEquipment(_)
            | NodeContainerHasAffixedSpanEquipment(_)
            | NodeContainerNotEmpty(_)
            | CannotRemoveConnectedTerminalEquipment(_)
            | CannotRemoveConnectedTerminalStructure(_) => ErrorKind::InvariantViolation,

            SegmentNotRelatedToRouteNode { .. } | ErrorCalculatingWalk(_) => ErrorKind::RoutingError,
        }
    }

    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        use CommandError::*;

        match self {
            Catalog(_) => "SPECIFICATION_CATALOG_VIOLATION",
            InvalidWalk(_) => "INVALID_WALK",
            NothingSpecified => "NOTHING_SPECIFIED",
            SpecificationMismatch { .. } => "SPECIFICATION_MISMATCH",
            StructureIndexOutOfRange { .. } => "STRUCTURE_INDEX_OUT_OF_RANGE",
            StructurePositionAlreadyUsed { .. } => "STRUCTURE_POSITION_ALREADY_USED",
            NotRackEquipment(_) => "NOT_RACK_EQUIPMENT",
            IdAlreadyInUse(_) => "ID_ALREADY_IN_USE",
            SpanEquipmentNotFound(_) => "SPAN_EQUIPMENT_NOT_FOUND",
            SegmentNotFound(_) => "SEGMENT_NOT_FOUND",
            SpanStructureNotFound(_) => "SPAN_STRUCTURE_NOT_FOUND",
            TerminalNotFound(_) => "TERMINAL_NOT_FOUND",
            TerminalEquipmentNotFound(_) => "TERMINAL_EQUIPMENT_NOT_FOUND",
            TerminalStructureNotFound(_) => "TERMINAL_STRUCTURE_NOT_FOUND",
            TerminalLinkNotFound(_) => "TERMINAL_LINK_NOT_FOUND",
            NodeContainerNotFound(_) => "NODE_CONTAINER_NOT_FOUND",
            NoNodeContainerInRouteNode(_) => "NO_NODE_CONTAINER_IN_ROUTE_NODE",
            RouteNodeNotFound(_) => "ROUTE_NODE_NOT_FOUND",
            RackNotFound(_) => "RACK_NOT_FOUND",
            SpecificationNotFound(_) => "SPECIFICATION_NOT_FOUND",
            SegmentAlreadyCut(_) => "SEGMENT_ALREADY_CUT",
            CannotCutAtEquipmentEnd(_) => "CANNOT_CUT_AT_EQUIPMENT_END",
            CannotConnectToItself(_) => "CANNOT_CONNECT_TO_ITSELF",
            OuterAndInnerCannotBeConnected => "OUTER_AND_INNER_CANNOT_BE_CONNECTED",
            AlreadyConnected(_) => "ALREADY_CONNECTED",
            TerminalAlreadyConnected(_) => "TERMINAL_ALREADY_CONNECTED",
            CannotDisconnectFromItself(_) => "CANNOT_DISCONNECT_FROM_ITSELF",
            SegmentsNotConnected { .. } => "SEGMENTS_NOT_CONNECTED",
            SegmentEndNotAtRouteNode { .. } => "SEGMENT_END_NOT_AT_ROUTE_NODE",
            TerminalNotAtRouteNode { .. } => "TERMINAL_NOT_AT_ROUTE_NODE",
            EndsNotColocated { .. } => "ENDS_NOT_COLOCATED",
            MergeMustBeSoleConnection => "MERGE_MUST_BE_SOLE_CONNECTION",
            AlreadyAffixed { .. } => "ALREADY_AFFIXED",
            NotAffixedToNodeContainer(_) => "NOT_AFFIXED_TO_NODE_CONTAINER",
            NodeContainerNotOnWalk(_) => "NODE_CONTAINER_NOT_ON_WALK",
            SegmentCutInsideContainer(_) => "SEGMENT_CUT_INSIDE_CONTAINER",
            SegmentConnectedInsideContainer(_) => "SEGMENT_CONNECTED_INSIDE_CONTAINER",
            NewWalkEqualsExistingWalk => "NEW_WALK_EQUALS_EXISTING_WALK",
            NodeContainerAlreadyExistsInRouteNode(_) => "NODE_CONTAINER_ALREADY_EXISTS_IN_ROUTE_NODE",
            RackNameAlreadyUsed(_) => "RACK_NAME_ALREADY_USED",
            RackUnitsOccupied { .. } => "RACK_UNITS_OCCUPIED",
            RackUnitsExceeded { .. } => "RACK_UNITS_EXCEEDED",
            CannotRemoveConnectedStructure(_) => "CANNOT_REMOVE_CONNECTED_STRUCTURE",
            CannotRemoveFromFixedSpanEquipment(_) => "CANNOT_REMOVE_FROM_FIXED_SPAN_EQUIPMENT",
            CannotAddToFixedSpanEquipment(_) => "CANNOT_ADD_TO_FIXED_SPAN_EQUIPMENT",
            CannotRemoveEquipmentWithConnectedSegments(_) => "CANNOT_REMOVE_EQUIPMENT_WITH_CONNECTED_SEGMENTS",
            CannotRemoveAffixedEquipment(_) => "CANNOT_REMOVE_AFFIXED_EQUIPMENT",
            EquipmentHasDependentChildren(_) => "EQUIPMENT_HAS_DEPENDENT_CHILDREN",
            CannotMoveFromEndWhereSegmentsAreCut(_) => "CANNOT_MOVE_FROM_END_WHERE_SEGMENTS_ARE_CUT",
            CannotMoveFromEndWhereSegmentsAreConnected(_) => {
                "CANNOT_MOVE_FROM_END_WHERE_SEGMENTS_ARE_CONNECTED"
            }
            CannotMoveBecauseAffixedToContainer(_) => "CANNOT_MOVE_BECAUSE_AFFIXED_TO_CONTAINER",
            CannotMoveBothEndsWithCuts(_) => "CANNOT_MOVE_BOTH_ENDS_WITH_CUTS",
            InteriorNodeNotOnNewWalk(_) => "INTERIOR_NODE_NOT_ON_NEW_WALK",
            CannotMoveUtilityNetworkRoutedEquipment(_) => "CANNOT_MOVE_UTILITY_NETWORK_ROUTED_EQUIPMENT",
            DependentChildConnectedAtMovedEnd(_) => "DEPENDENT_CHILD_CONNECTED_AT_MOVED_END",
            CannotMergeUtilityNetworkRoutedEquipment(_) => "CANNOT_MERGE_UTILITY_NETWORK_ROUTED_EQUIPMENT",
            NodeContainerHasAffixedSpanEquipment(_) => "NODE_CONTAINER_HAS_AFFIXED_SPAN_EQUIPMENT",
            NodeContainerNotEmpty(_) => "NODE_CONTAINER_NOT_EMPTY",
            CannotRemoveConnectedTerminalEquipment(_) => "CANNOT_REMOVE_CONNECTED_TERMINAL_EQUIPMENT",
            CannotRemoveConnectedTerminalStructure(_) => "CANNOT_REMOVE_CONNECTED_TERMINAL_STRUCTURE",
            SegmentNotRelatedToRouteNode { .. } => "SEGMENT_NOT_RELATED_TO_ROUTE_NODE",
            ErrorCalculatingWalk(_) => "ERROR_CALCULATING_WALK",
        }
    }

    /// Command failures are deterministic given input and state
    pub fn is_retryable(&self) -> bool {
        false
    }
}
