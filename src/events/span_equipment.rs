// Copyright (c) 2025 - Cowboy AI, Inc.
//! Span Equipment Domain Events
//!
//! Facts emitted by span equipment commands. Events carry every value the
//! fold needs (generated ids, insertion indices, full merged state) so replay
//! never re-runs validation or id generation.

use serde::{Deserialize, Serialize};

use crate::domain::{
    NodeContainerAffix, NodeContainerId, RouteNodeId, SegmentEnd, SpanEquipment, SpanEquipmentId,
    SpanSegmentId, SpanStructure, SpanStructureId, TerminalId, UtilityNetworkHop, ValidatedWalk,
    WalkOfInterestId,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SpanEquipmentEvent {
    /// Equipment placed, directly in the route network or through hops
    SpanEquipmentPlaced(SpanEquipmentPlaced),

    /// Existing equipment re-expressed as hops through parent segments
    SpanEquipmentAffixedToParent(SpanEquipmentAffixedToParent),

    SpanSegmentsCut(SpanSegmentsCut),

    /// Segment ends bound to terminals (real or virtual)
    SpanSegmentsConnectedToTerminals(SpanSegmentsConnectedToTerminals),

    SpanSegmentsDisconnectedFromTerminals(SpanSegmentsDisconnectedFromTerminals),

    /// Two equipments fused; the absorbed one is deleted
    SpanEquipmentMerged(SpanEquipmentMerged),

    SpanEquipmentAffixedToContainer(SpanEquipmentAffixedToContainer),

    SpanEquipmentDetachedFromContainer(SpanEquipmentDetachedFromContainer),

    AdditionalInnerSpanStructuresAdded(AdditionalInnerSpanStructuresAdded),

    SpanStructureRemoved(SpanStructureRemoved),

    SpanEquipmentRemoved(SpanEquipmentRemoved),

    SpanEquipmentMoved(SpanEquipmentMoved),

    /// Dependent child recalculated after a parent change
    SpanEquipmentRerouted(SpanEquipmentRerouted),

    SpanEquipmentNameChanged(SpanEquipmentNameChanged),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanEquipmentPlaced {
    pub equipment: SpanEquipment,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanEquipmentAffixedToParent {
    pub span_equipment_id: SpanEquipmentId,
    pub walk: ValidatedWalk,
    pub node_of_interest_ids: Vec<RouteNodeId>,
    pub hops: Vec<UtilityNetworkHop>,
}

/// One replaced segment; halves ordered in node-of-interest direction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanSegmentCut {
    pub old_span_segment_id: SpanSegmentId,
    pub new_span_segment_ids: [SpanSegmentId; 2],
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanSegmentsCut {
    pub span_equipment_id: SpanEquipmentId,
    pub route_node_id: RouteNodeId,
    /// Index of the cut node after the cut
    pub node_of_interest_index: u16,
    /// Whether the cut node was inserted into the node-of-interest list
    pub node_of_interest_inserted: bool,
    pub cuts: Vec<SpanSegmentCut>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentTerminalBinding {
    pub span_segment_id: SpanSegmentId,
    pub end: SegmentEnd,
    pub terminal_id: TerminalId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanSegmentsConnectedToTerminals {
    pub span_equipment_id: SpanEquipmentId,
    pub route_node_id: RouteNodeId,
    pub bindings: Vec<SegmentTerminalBinding>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanSegmentsDisconnectedFromTerminals {
    pub span_equipment_id: SpanEquipmentId,
    pub route_node_id: RouteNodeId,
    pub bindings: Vec<SegmentTerminalBinding>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanEquipmentMerged {
    pub span_equipment_id: SpanEquipmentId,
    pub absorbed_span_equipment_id: SpanEquipmentId,
    pub route_node_id: RouteNodeId,
    /// Surviving equipment after the merge
    pub merged: SpanEquipment,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanEquipmentAffixedToContainer {
    pub span_equipment_id: SpanEquipmentId,
    pub affix: NodeContainerAffix,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanEquipmentDetachedFromContainer {
    pub span_equipment_id: SpanEquipmentId,
    pub node_container_id: NodeContainerId,
    pub route_node_id: RouteNodeId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdditionalInnerSpanStructuresAdded {
    pub span_equipment_id: SpanEquipmentId,
    pub structures: Vec<SpanStructure>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanStructureRemoved {
    pub span_equipment_id: SpanEquipmentId,
    pub span_structure_id: SpanStructureId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanEquipmentRemoved {
    pub span_equipment_id: SpanEquipmentId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanEquipmentMoved {
    pub span_equipment_id: SpanEquipmentId,
    pub walk_of_interest_id: WalkOfInterestId,
    pub walk: ValidatedWalk,
    pub node_of_interest_ids: Vec<RouteNodeId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanEquipmentRerouted {
    pub span_equipment_id: SpanEquipmentId,
    pub walk: ValidatedWalk,
    pub node_of_interest_ids: Vec<RouteNodeId>,
    pub hops: Vec<UtilityNetworkHop>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanEquipmentNameChanged {
    pub span_equipment_id: SpanEquipmentId,
    pub name: Option<String>,
}

impl SpanEquipmentEvent {
    pub fn span_equipment_id(&self) -> SpanEquipmentId {
        use SpanEquipmentEvent::*;

        match self {
            SpanEquipmentPlaced(e) => e.equipment.id,
            SpanEquipmentAffixedToParent(e) => e.span_equipment_id,
            SpanSegmentsCut(e) => e.span_equipment_id,
            SpanSegmentsConnectedToTerminals(e) => e.span_equipment_id,
            SpanSegmentsDisconnectedFromTerminals(e) => e.span_equipment_id,
            SpanEquipmentMerged(e) => e.span_equipment_id,
            SpanEquipmentAffixedToContainer(e) => e.span_equipment_id,
            SpanEquipmentDetachedFromContainer(e) => e.span_equipment_id,
            AdditionalInnerSpanStructuresAdded(e) => e.span_equipment_id,
            SpanStructureRemoved(e) => e.span_equipment_id,
            SpanEquipmentRemoved(e) => e.span_equipment_id,
            SpanEquipmentMoved(e) => e.span_equipment_id,
            SpanEquipmentRerouted(e) => e.span_equipment_id,
            SpanEquipmentNameChanged(e) => e.span_equipment_id,
        }
    }

    pub fn event_type_name(&self) -> &'static str {
        use SpanEquipmentEvent::*;

        match self {
            SpanEquipmentPlaced(_) => "SpanEquipmentPlaced",
            SpanEquipmentAffixedToParent(_) => "SpanEquipmentAffixedToParent",
            SpanSegmentsCut(_) => "SpanSegmentsCut",
            SpanSegmentsConnectedToTerminals(_) => "SpanSegmentsConnectedToTerminals",
            SpanSegmentsDisconnectedFromTerminals(_) => "SpanSegmentsDisconnectedFromTerminals",
            SpanEquipmentMerged(_) => "SpanEquipmentMerged",
            SpanEquipmentAffixedToContainer(_) => "SpanEquipmentAffixedToContainer",
            SpanEquipmentDetachedFromContainer(_) => "SpanEquipmentDetachedFromContainer",
            AdditionalInnerSpanStructuresAdded(_) => "AdditionalInnerSpanStructuresAdded",
            SpanStructureRemoved(_) => "SpanStructureRemoved",
            SpanEquipmentRemoved(_) => "SpanEquipmentRemoved",
            SpanEquipmentMoved(_) => "SpanEquipmentMoved",
            SpanEquipmentRerouted(_) => "SpanEquipmentRerouted",
            SpanEquipmentNameChanged(_) => "SpanEquipmentNameChanged",
        }
    }
}
