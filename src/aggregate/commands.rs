// Copyright (c) 2025 - Cowboy AI, Inc.
//! Topology Commands
//!
//! Commands express user intent and can fail validation. They carry every
//! value the handler needs except collaborator answers (resolved walks),
//! which the service supplies.
//!
//! # Command Pattern
//!
//! ```text
//! Command → handle_x(&Topology, &Catalog, &Command) → Result<Vec<TopologyEvent>, CommandError>
//! ```
//!
//! # Time Handling
//!
//! Every command carries a [`CommandContext`] with an explicit timestamp.
//! Domain logic never reads the clock.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    InterfaceInfo, NodeContainerId, NodeContainerSide, RackId, RouteNodeId, RouteSegmentId,
    SpanEquipmentId, SpanSegmentId, SpanStructureId, SpecificationId, SubrackPlacementMethod,
    TerminalEquipmentId, TerminalId, TerminalStructureId,
};
use crate::routing::RoutingHop;

/// Request metadata shared by every command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandContext {
    /// Correlation ID for distributed tracing
    pub correlation_id: Uuid,

    /// Optional causation ID (event that caused this command)
    pub causation_id: Option<Uuid>,

    pub user_name: Option<String>,

    /// Timestamp when command was issued (explicit time parameter)
    pub timestamp: DateTime<Utc>,
}

impl CommandContext {
    pub fn new(correlation_id: Uuid, timestamp: DateTime<Utc>) -> Self {
        Self {
            correlation_id,
            causation_id: None,
            user_name: None,
            timestamp,
        }
    }

    pub fn with_user(mut self, user_name: impl Into<String>) -> Self {
        self.user_name = Some(user_name.into());
        self
    }
}

// ---- span equipment ----

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceSpanEquipmentInRouteNetwork {
    pub context: CommandContext,
    pub span_equipment_id: SpanEquipmentId,
    pub specification_id: SpecificationId,
    /// Route segments in walk order
    pub route_segment_ids: Vec<RouteSegmentId>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceSpanEquipmentInUtilityNetwork {
    pub context: CommandContext,
    pub span_equipment_id: SpanEquipmentId,
    pub specification_id: SpecificationId,
    pub hops: Vec<RoutingHop>,
    pub name: Option<String>,
}

/// Re-express already placed equipment as hops through parent segments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AffixSpanEquipmentToParent {
    pub context: CommandContext,
    pub span_equipment_id: SpanEquipmentId,
    pub hops: Vec<RoutingHop>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CutSpanSegmentsAtRouteNode {
    pub context: CommandContext,
    pub route_node_id: RouteNodeId,
    pub span_segment_ids: Vec<SpanSegmentId>,
}

/// One side of a connect/disconnect pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ConnectionEnd {
    Segment(SpanSegmentId),
    Terminal(TerminalId),
}

impl ConnectionEnd {
    pub fn as_uuid(&self) -> Uuid {
        match self {
            ConnectionEnd::Segment(id) => id.as_uuid(),
            ConnectionEnd::Terminal(id) => id.as_uuid(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionPair {
    pub from: ConnectionEnd,
    pub to: ConnectionEnd,
}

impl ConnectionPair {
    pub fn segments(from: SpanSegmentId, to: SpanSegmentId) -> Self {
        Self {
            from: ConnectionEnd::Segment(from),
            to: ConnectionEnd::Segment(to),
        }
    }

    pub fn segment_to_terminal(from: SpanSegmentId, to: TerminalId) -> Self {
        Self {
            from: ConnectionEnd::Segment(from),
            to: ConnectionEnd::Terminal(to),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectSpanSegmentsAtRouteNode {
    pub context: CommandContext,
    pub route_node_id: RouteNodeId,
    pub pairs: Vec<ConnectionPair>,
}

/// Bulk sibling connection by structure index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectSpanSegmentsByIndexAtRouteNode {
    pub context: CommandContext,
    pub route_node_id: RouteNodeId,
    pub from_span_equipment_id: SpanEquipmentId,
    pub from_structure_index: usize,
    pub to_span_equipment_id: SpanEquipmentId,
    pub to_structure_index: usize,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisconnectSpanSegmentsAtRouteNode {
    pub context: CommandContext,
    pub route_node_id: RouteNodeId,
    pub pairs: Vec<ConnectionPair>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AffixSpanEquipmentToNodeContainer {
    pub context: CommandContext,
    pub span_equipment_id: SpanEquipmentId,
    pub node_container_id: NodeContainerId,
    pub ingoing_side: NodeContainerSide,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetachSpanEquipmentFromNodeContainer {
    pub context: CommandContext,
    pub span_equipment_id: SpanEquipmentId,
    pub node_container_id: NodeContainerId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddAdditionalInnerSpanStructures {
    pub context: CommandContext,
    pub span_equipment_id: SpanEquipmentId,
    pub span_structure_specification_ids: Vec<SpecificationId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveSpanStructure {
    pub context: CommandContext,
    pub span_equipment_id: SpanEquipmentId,
    pub span_structure_id: SpanStructureId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveSpanEquipment {
    pub context: CommandContext,
    pub span_equipment_id: SpanEquipmentId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveSpanEquipment {
    pub context: CommandContext,
    pub span_equipment_id: SpanEquipmentId,
    pub route_segment_ids: Vec<RouteSegmentId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateSpanEquipmentName {
    pub context: CommandContext,
    pub span_equipment_id: SpanEquipmentId,
    pub name: Option<String>,
}

// ---- node containers ----

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceNodeContainerInRouteNetwork {
    pub context: CommandContext,
    pub node_container_id: NodeContainerId,
    pub specification_id: SpecificationId,
    pub route_node_id: RouteNodeId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveNodeContainer {
    pub context: CommandContext,
    pub node_container_id: NodeContainerId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceRackInNodeContainer {
    pub context: CommandContext,
    pub node_container_id: NodeContainerId,
    pub rack_id: RackId,
    pub specification_id: SpecificationId,
    pub name: String,
    pub height_in_units: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubrackPlacement {
    pub rack_id: RackId,
    pub start_unit_position: u16,
    pub method: SubrackPlacementMethod,
}

/// Place `number_of_equipments` terminal equipments named `{prefix}{start+i}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceTerminalEquipmentInNodeContainer {
    pub context: CommandContext,
    pub node_container_id: NodeContainerId,
    pub specification_id: SpecificationId,
    pub number_of_equipments: u32,
    pub name_prefix: Option<String>,
    pub start_sequence_number: u32,
    pub subrack_placement: Option<SubrackPlacement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRackEquipmentInNodeContainer {
    pub context: CommandContext,
    pub node_container_id: NodeContainerId,
    pub terminal_equipment_id: TerminalEquipmentId,
    pub to_rack_id: RackId,
    pub to_position_in_units: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RackArrangement {
    MoveUp,
    MoveDown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArrangeRackEquipmentInNodeContainer {
    pub context: CommandContext,
    pub node_container_id: NodeContainerId,
    pub terminal_equipment_id: TerminalEquipmentId,
    pub arrangement: RackArrangement,
    pub number_of_units: u16,
}

// ---- terminal equipment ----

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveTerminalEquipment {
    pub context: CommandContext,
    pub terminal_equipment_id: TerminalEquipmentId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceAdditionalStructuresInTerminalEquipment {
    pub context: CommandContext,
    pub terminal_equipment_id: TerminalEquipmentId,
    pub structure_specification_id: SpecificationId,
    /// First position; defaults to after the last structure
    pub position: Option<u16>,
    pub number_of_structures: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveTerminalStructure {
    pub context: CommandContext,
    pub terminal_equipment_id: TerminalEquipmentId,
    pub terminal_structure_id: TerminalStructureId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateTerminalStructureInterfaceInfo {
    pub context: CommandContext,
    pub terminal_equipment_id: TerminalEquipmentId,
    pub terminal_structure_id: TerminalStructureId,
    pub interface_info: Option<InterfaceInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectTerminalsAtRouteNode {
    pub context: CommandContext,
    pub route_node_id: RouteNodeId,
    pub from_terminal_id: TerminalId,
    pub to_terminal_id: TerminalId,
    pub fiber_coord_length: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisconnectTerminalsAtRouteNode {
    pub context: CommandContext,
    pub route_node_id: RouteNodeId,
    pub from_terminal_id: TerminalId,
    pub to_terminal_id: TerminalId,
}

/// Every command the topology accepts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum TopologyCommand {
    PlaceSpanEquipmentInRouteNetwork(PlaceSpanEquipmentInRouteNetwork),
    PlaceSpanEquipmentInUtilityNetwork(PlaceSpanEquipmentInUtilityNetwork),
    AffixSpanEquipmentToParent(AffixSpanEquipmentToParent),
    CutSpanSegmentsAtRouteNode(CutSpanSegmentsAtRouteNode),
    ConnectSpanSegmentsAtRouteNode(ConnectSpanSegmentsAtRouteNode),
    ConnectSpanSegmentsByIndexAtRouteNode(ConnectSpanSegmentsByIndexAtRouteNode),
    DisconnectSpanSegmentsAtRouteNode(DisconnectSpanSegmentsAtRouteNode),
    AffixSpanEquipmentToNodeContainer(AffixSpanEquipmentToNodeContainer),
    DetachSpanEquipmentFromNodeContainer(DetachSpanEquipmentFromNodeContainer),
    AddAdditionalInnerSpanStructures(AddAdditionalInnerSpanStructures),
    RemoveSpanStructure(RemoveSpanStructure),
    RemoveSpanEquipment(RemoveSpanEquipment),
    MoveSpanEquipment(MoveSpanEquipment),
    UpdateSpanEquipmentName(UpdateSpanEquipmentName),
    PlaceNodeContainerInRouteNetwork(PlaceNodeContainerInRouteNetwork),
    RemoveNodeContainer(RemoveNodeContainer),
    PlaceRackInNodeContainer(PlaceRackInNodeContainer),
    PlaceTerminalEquipmentInNodeContainer(PlaceTerminalEquipmentInNodeContainer),
    MoveRackEquipmentInNodeContainer(MoveRackEquipmentInNodeContainer),
    ArrangeRackEquipmentInNodeContainer(ArrangeRackEquipmentInNodeContainer),
    RemoveTerminalEquipment(RemoveTerminalEquipment),
    PlaceAdditionalStructuresInTerminalEquipment(PlaceAdditionalStructuresInTerminalEquipment),
    RemoveTerminalStructure(RemoveTerminalStructure),
    UpdateTerminalStructureInterfaceInfo(UpdateTerminalStructureInterfaceInfo),
    ConnectTerminalsAtRouteNode(ConnectTerminalsAtRouteNode),
    DisconnectTerminalsAtRouteNode(DisconnectTerminalsAtRouteNode),
}

impl TopologyCommand {
    pub fn context(&self) -> &CommandContext {
        use TopologyCommand::*;

        match self {
            PlaceSpanEquipmentInRouteNetwork(c) => &c.context,
            PlaceSpanEquipmentInUtilityNetwork(c) => &c.context,
            AffixSpanEquipmentToParent(c) => &c.context,
            CutSpanSegmentsAtRouteNode(c) => &c.context,
            ConnectSpanSegmentsAtRouteNode(c) => &c.context,
            ConnectSpanSegmentsByIndexAtRouteNode(c) => &c.context,
            DisconnectSpanSegmentsAtRouteNode(c) => &c.context,
            AffixSpanEquipmentToNodeContainer(c) => &c.context,
            DetachSpanEquipmentFromNodeContainer(c) => &c.context,
            AddAdditionalInnerSpanStructures(c) => &c.context,
            RemoveSpanStructure(c) => &c.context,
            RemoveSpanEquipment(c) => &c.context,
            MoveSpanEquipment(c) => &c.context,
            UpdateSpanEquipmentName(c) => &c.context,
            PlaceNodeContainerInRouteNetwork(c) => &c.context,
            RemoveNodeContainer(c) => &c.context,
            PlaceRackInNodeContainer(c) => &c.context,
            PlaceTerminalEquipmentInNodeContainer(c) => &c.context,
            MoveRackEquipmentInNodeContainer(c) => &c.context,
            ArrangeRackEquipmentInNodeContainer(c) => &c.context,
            RemoveTerminalEquipment(c) => &c.context,
            PlaceAdditionalStructuresInTerminalEquipment(c) => &c.context,
            RemoveTerminalStructure(c) => &c.context,
            UpdateTerminalStructureInterfaceInfo(c) => &c.context,
            ConnectTerminalsAtRouteNode(c) => &c.context,
            DisconnectTerminalsAtRouteNode(c) => &c.context,
        }
    }

    pub fn name(&self) -> &'static str {
        use TopologyCommand::*;

        match self {
            PlaceSpanEquipmentInRouteNetwork(_) => "PlaceSpanEquipmentInRouteNetwork",
            PlaceSpanEquipmentInUtilityNetwork(_) => "PlaceSpanEquipmentInUtilityNetwork",
            AffixSpanEquipmentToParent(_) => "AffixSpanEquipmentToParent",
            CutSpanSegmentsAtRouteNode(_) => "CutSpanSegmentsAtRouteNode",
            ConnectSpanSegmentsAtRouteNode(_) => "ConnectSpanSegmentsAtRouteNode",
            ConnectSpanSegmentsByIndexAtRouteNode(_) => "ConnectSpanSegmentsByIndexAtRouteNode",
            DisconnectSpanSegmentsAtRouteNode(_) => "DisconnectSpanSegmentsAtRouteNode",
            AffixSpanEquipmentToNodeContainer(_) => "AffixSpanEquipmentToNodeContainer",
            DetachSpanEquipmentFromNodeContainer(_) => "DetachSpanEquipmentFromNodeContainer",
            AddAdditionalInnerSpanStructures(_) => "AddAdditionalInnerSpanStructures",
            RemoveSpanStructure(_) => "RemoveSpanStructure",
            RemoveSpanEquipment(_) => "RemoveSpanEquipment",
            MoveSpanEquipment(_) => "MoveSpanEquipment",
            UpdateSpanEquipmentName(_) => "UpdateSpanEquipmentName",
            PlaceNodeContainerInRouteNetwork(_) => "PlaceNodeContainerInRouteNetwork",
            RemoveNodeContainer(_) => "RemoveNodeContainer",
            PlaceRackInNodeContainer(_) => "PlaceRackInNodeContainer",
            PlaceTerminalEquipmentInNodeContainer(_) => "PlaceTerminalEquipmentInNodeContainer",
            MoveRackEquipmentInNodeContainer(_) => "MoveRackEquipmentInNodeContainer",
            ArrangeRackEquipmentInNodeContainer(_) => "ArrangeRackEquipmentInNodeContainer",
            RemoveTerminalEquipment(_) => "RemoveTerminalEquipment",
            PlaceAdditionalStructuresInTerminalEquipment(_) => {
                "PlaceAdditionalStructuresInTerminalEquipment"
            }
            RemoveTerminalStructure(_) => "RemoveTerminalStructure",
            UpdateTerminalStructureInterfaceInfo(_) => "UpdateTerminalStructureInterfaceInfo",
            ConnectTerminalsAtRouteNode(_) => "ConnectTerminalsAtRouteNode",
            DisconnectTerminalsAtRouteNode(_) => "DisconnectTerminalsAtRouteNode",
        }
    }
}
