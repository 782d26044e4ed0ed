// Copyright (c) 2025 - Cowboy AI, Inc.
//! Read Side Queries
//!
//! Pure functions over one [`Topology`] snapshot. Every query sees the
//! version of the snapshot it was given; traces run at that version.
//!
//! - Details: [`span_equipment_details`], [`node_container_details`],
//!   [`terminal_equipment_details`], [`equipment_at_route_node`]
//! - Paths: [`span_equipment_passage_view`]
//! - Connectivity: faces, face connections, A/Z line views and the
//!   disconnect preview in [`connectivity`]

pub mod connectivity;

pub use connectivity::{
    connectivity_faces, describe_element, disconnect_preview, face_connections,
    span_equipment_connectivity_view, terminal_equipment_connectivity_view, ConnectivityFace,
    DisconnectPreview, DisconnectPreviewLine, FaceConnection, FaceDirection, FaceKind, LineEnd,
    SpanEquipmentConnectivityView, SpanSegmentLine, SpanStructureLine, TerminalEquipmentConnectivityView,
    TerminalLine, TerminalStructureLine,
};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use crate::domain::{
    NodeContainer, NodeContainerId, RouteNodeId, RouteSegmentId, SpanEquipment, SpanEquipmentId, SpanSegmentId,
    TerminalEquipment, TerminalEquipmentId, WalkOfInterestId,
};
use crate::projection::Topology;
use crate::trace::TraceError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("Span equipment {0} not found")]
    SpanEquipmentNotFound(SpanEquipmentId),

    #[error("Terminal equipment {0} not found")]
    TerminalEquipmentNotFound(TerminalEquipmentId),

    #[error("Span segment {0} not found")]
    SegmentNotFound(SpanSegmentId),

    #[error("Span segment {segment} has no end at route node {route_node}")]
    SegmentNotAtRouteNode { segment: SpanSegmentId, route_node: RouteNodeId },

    #[error("Trace failed: {0}")]
    Trace(#[from] TraceError),
}

pub type QueryResult<T> = Result<T, QueryError>;

/// Live span equipment for the given ids; unknown ids are skipped
pub fn span_equipment_details(topology: &Topology, ids: &[SpanEquipmentId]) -> Vec<SpanEquipment> {
    ids.iter()
        .filter_map(|id| topology.span_equipment(*id).cloned())
        .collect()
}

/// Live span equipment registered under a walk of interest
pub fn span_equipment_by_interest(topology: &Topology, walk_of_interest_id: WalkOfInterestId) -> Option<SpanEquipment> {
    topology
        .all_span_equipment()
        .find(|e| e.walk_of_interest_id == walk_of_interest_id)
        .cloned()
}

pub fn node_container_details(topology: &Topology, ids: &[NodeContainerId]) -> Vec<NodeContainer> {
    ids.iter()
        .filter_map(|id| topology.node_container(*id).cloned())
        .collect()
}

pub fn terminal_equipment_details(topology: &Topology, ids: &[TerminalEquipmentId]) -> Vec<TerminalEquipment> {
    ids.iter()
        .filter_map(|id| topology.terminal_equipment(*id).cloned())
        .collect()
}

/// Everything located in or passing through a route node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquipmentAtRouteNode {
    pub route_node_id: RouteNodeId,
    pub node_container_id: Option<NodeContainerId>,
    pub span_equipment_ids: Vec<SpanEquipmentId>,
    /// Subset of `span_equipment_ids` with a node of interest here
    pub span_equipment_with_node_of_interest: Vec<SpanEquipmentId>,
    pub terminal_equipment_ids: Vec<TerminalEquipmentId>,
}

pub fn equipment_at_route_node(topology: &Topology, route_node_id: RouteNodeId) -> EquipmentAtRouteNode {
    let span_equipment = topology.span_equipment_at_route_node(route_node_id);
    let container = topology.node_container_at(route_node_id);

    EquipmentAtRouteNode {
        route_node_id,
        node_container_id: container.map(|c| c.id),
        span_equipment_ids: span_equipment.iter().map(|e| e.id).collect(),
        span_equipment_with_node_of_interest: span_equipment
            .iter()
            .filter(|e| e.node_of_interest_index(route_node_id).is_some())
            .map(|e| e.id)
            .collect(),
        terminal_equipment_ids: container
            .map(|c| {
                c.all_terminal_equipment_ids()
                    .into_iter()
                    .filter(|id| topology.terminal_equipment(*id).is_some())
                    .collect()
            })
            .unwrap_or_default(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassageStep {
    pub route_node_id: RouteNodeId,
    pub node_of_interest_index: Option<u16>,
    /// Route segment towards the next step; `None` on the last node
    pub route_segment_id: Option<RouteSegmentId>,
    pub segment_length: Option<f64>,
    /// Length walked up to this node
    pub cumulative_length: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassageHop {
    pub from_node_id: RouteNodeId,
    pub to_node_id: RouteNodeId,
    /// Parent equipment the hop runs through; empty for raw route network
    pub parent_span_equipment_ids: Vec<SpanEquipmentId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassageView {
    pub span_equipment_id: SpanEquipmentId,
    pub name: Option<String>,
    pub total_length: f64,
    pub steps: Vec<PassageStep>,
    pub hops: Vec<PassageHop>,
}

/// Node-by-node path of span equipment
///
/// `lengths` comes from the route network; segments without a known length
/// count as zero.
pub fn span_equipment_passage_view(
    topology: &Topology,
    span_equipment_id: SpanEquipmentId,
    lengths: &HashMap<RouteSegmentId, f64>,
) -> QueryResult<PassageView> {
    let equipment = topology
        .span_equipment(span_equipment_id)
        .ok_or(QueryError::SpanEquipmentNotFound(span_equipment_id))?;

    let walk = &equipment.walk;
    let mut cumulative = 0.0;
    let mut steps = Vec::with_capacity(walk.node_ids().len());
    for (i, node_id) in walk.node_ids().iter().enumerate() {
        let route_segment_id = walk.segment_ids().get(i).copied();
        let segment_length = route_segment_id.and_then(|id| lengths.get(&id).copied());
        steps.push(PassageStep {
            route_node_id: *node_id,
            node_of_interest_index: equipment.node_of_interest_index(*node_id),
            route_segment_id,
            segment_length,
            cumulative_length: cumulative,
        });
        cumulative += segment_length.unwrap_or(0.0);
    }

    let hops = equipment
        .utility_network_hops
        .iter()
        .map(|hop| {
            let mut parents: Vec<SpanEquipmentId> = Vec::new();
            for affix in &hop.parent_affixes {
                if let Some((parent, _)) = topology.span_segment(affix.span_segment_id) {
                    if !parents.contains(&parent.id) {
                        parents.push(parent.id);
                    }
                }
            }
            PassageHop {
                from_node_id: hop.from_node_id,
                to_node_id: hop.to_node_id,
                parent_span_equipment_ids: parents,
            }
        })
        .collect();

    Ok(PassageView {
        span_equipment_id,
        name: equipment.name.clone(),
        total_length: cumulative,
        steps,
        hops,
    })
}
