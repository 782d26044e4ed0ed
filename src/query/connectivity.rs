// Copyright (c) 2025 - Cowboy AI, Inc.
//! Connectivity Views
//!
//! A *face* is one side of a piece of equipment at a route node: span
//! equipment arriving at (ingoing) or leaving (outgoing) the node, or
//! terminal equipment in the node's container. Face connections list, per
//! structure end or terminal, what it is connected to across the node and
//! where its line ends.

use serde::{Deserialize, Serialize};

use super::{QueryError, QueryResult};
use crate::aggregate::ConnectionPair;
use crate::domain::{
    RouteNodeId, SegmentEnd, SpanEquipment, SpanEquipmentId, SpanSegmentId, SpanStructureId,
    TerminalDirection, TerminalEquipmentId, TerminalId, TerminalStructureId,
};
use crate::projection::{EdgeRef, GraphElement, TerminalVertex, Topology};
use crate::trace::{simple_trace, TraceStart};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaceKind {
    SpanEquipment,
    TerminalEquipment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaceDirection {
    /// Segments ending in the node
    Ingoing,
    /// Segments starting in the node
    Outgoing,
}

impl FaceDirection {
    fn segment_end(&self) -> SegmentEnd {
        match self {
            FaceDirection::Ingoing => SegmentEnd::To,
            FaceDirection::Outgoing => SegmentEnd::From,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectivityFace {
    pub kind: FaceKind,
    pub equipment_id: uuid::Uuid,
    pub name: String,
    pub direction: Option<FaceDirection>,
}

/// Element described for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineEnd {
    pub element: GraphElement,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceConnection {
    pub element: GraphElement,
    pub label: String,
    pub terminal_id: Option<TerminalId>,
    /// Elements directly attached across the node
    pub connected_to: Vec<LineEnd>,
    /// Far end of the line on the other side of the face
    pub end: Option<LineEnd>,
}

fn span_equipment_label(equipment: &SpanEquipment) -> String {
    equipment
        .name
        .clone()
        .unwrap_or_else(|| equipment.id.to_string())
}

/// Human readable name of a graph element
pub fn describe_element(topology: &Topology, element: GraphElement) -> String {
    match element {
        GraphElement::SegmentRef {
            span_equipment_id,
            span_segment_id,
        } => match topology.span_equipment_including_deleted(span_equipment_id) {
            Some(equipment) => match equipment.find_segment(span_segment_id) {
                Some((si, _)) => {
                    let structure = &equipment.span_structures[si];
                    format!(
                        "{} ({}.{})",
                        span_equipment_label(equipment),
                        structure.level,
                        structure.position
                    )
                }
                None => span_equipment_label(equipment),
            },
            None => format!("segment {span_segment_id}"),
        },
        GraphElement::TerminalRef { terminal_id, .. } => match topology.terminal(terminal_id) {
            Some((equipment, structure, terminal)) => format!(
                "{} {}-{}",
                equipment.name.clone().unwrap_or_else(|| equipment.id.to_string()),
                structure.position,
                terminal.name
            ),
            None => format!("junction {terminal_id}"),
        },
        GraphElement::TerminalLink { terminal_link_id } => format!("patch {terminal_link_id}"),
    }
}

fn line_end(topology: &Topology, element: GraphElement) -> LineEnd {
    LineEnd {
        element,
        description: describe_element(topology, element),
    }
}

/// Faces of all equipment with a node of interest or container at the node
pub fn connectivity_faces(topology: &Topology, route_node_id: RouteNodeId) -> Vec<ConnectivityFace> {
    let mut faces = Vec::new();

    for equipment in topology.span_equipment_at_route_node(route_node_id) {
        let Some(index) = equipment.node_of_interest_index(route_node_id) else {
            continue;
        };
        for direction in [FaceDirection::Ingoing, FaceDirection::Outgoing] {
            let end = direction.segment_end();
            let present = equipment
                .live_segments()
                .any(|(_, segment)| segment.index_at(end) == index);
            if present {
                faces.push(ConnectivityFace {
                    kind: FaceKind::SpanEquipment,
                    equipment_id: equipment.id.as_uuid(),
                    name: span_equipment_label(equipment),
                    direction: Some(direction),
                });
            }
        }
    }

    if let Some(container) = topology.node_container_at(route_node_id) {
        for id in container.all_terminal_equipment_ids() {
            if let Some(equipment) = topology.terminal_equipment(id) {
                faces.push(ConnectivityFace {
                    kind: FaceKind::TerminalEquipment,
                    equipment_id: id.as_uuid(),
                    name: equipment.name.clone().unwrap_or_else(|| id.to_string()),
                    direction: None,
                });
            }
        }
    }

    faces
}

/// Elements attached to `terminal_id` other than `own`; links are described
/// by the terminal on their far side
fn attached_across(topology: &Topology, terminal_id: Option<TerminalId>, own: Option<EdgeRef>) -> Vec<LineEnd> {
    let Some(terminal_id) = terminal_id else {
        return Vec::new();
    };
    let graph = topology.graph();
    let version = topology.version();

    let mut out = Vec::new();
    if own.is_some() {
        if let Some(TerminalVertex::Real { .. }) = graph.terminal(terminal_id, version) {
            if let Some(element) = graph.element_of_terminal(terminal_id, version) {
                out.push(line_end(topology, element));
            }
        }
    }
    for edge in graph.attachments(terminal_id, version) {
        if Some(*edge) == own {
            continue;
        }
        let element = match edge {
            EdgeRef::Link(_) => graph
                .edge_terminals(*edge, version)
                .into_iter()
                .find(|t| *t != terminal_id)
                .and_then(|t| graph.element_of_terminal(t, version)),
            EdgeRef::Segment(_) => graph.element_of_edge(*edge, version),
        };
        if let Some(element) = element {
            out.push(line_end(topology, element));
        }
    }
    out
}

/// Outermost elements on either side; `None` where nothing is connected
fn trace_ends(topology: &Topology, start: TraceStart) -> QueryResult<(Option<LineEnd>, Option<LineEnd>)> {
    let trace = simple_trace(topology.graph(), start, topology.version())?;
    let a = (!trace.upstream.is_empty()).then(|| line_end(topology, trace.a_end()));
    let z = (!trace.downstream.is_empty()).then(|| line_end(topology, trace.z_end()));
    Ok((a, z))
}

/// Per structure end (span face) or terminal (terminal face), what it is
/// connected to across the node
pub fn face_connections(
    topology: &Topology,
    route_node_id: RouteNodeId,
    face: &ConnectivityFace,
) -> QueryResult<Vec<FaceConnection>> {
    match face.kind {
        FaceKind::SpanEquipment => {
            let id = SpanEquipmentId::from_uuid(face.equipment_id);
            let equipment = topology
                .span_equipment(id)
                .ok_or(QueryError::SpanEquipmentNotFound(id))?;
            let Some(index) = equipment.node_of_interest_index(route_node_id) else {
                return Ok(Vec::new());
            };
            let direction = face.direction.unwrap_or(FaceDirection::Outgoing);
            let end = direction.segment_end();

            let mut connections = Vec::new();
            for (_, structure) in equipment.live_structures() {
                for segment in structure.span_segments.iter().filter(|s| s.index_at(end) == index) {
                    let element = GraphElement::SegmentRef {
                        span_equipment_id: equipment.id,
                        span_segment_id: segment.id,
                    };
                    let terminal_id = segment.terminal_at(end);
                    let (a, z) = trace_ends(topology, TraceStart::Segment(segment.id))?;
                    // the far end lies away from the node
                    let far = match direction {
                        FaceDirection::Ingoing => a,
                        FaceDirection::Outgoing => z,
                    };
                    connections.push(FaceConnection {
                        element,
                        label: format!("{}.{}", structure.level, structure.position),
                        terminal_id,
                        connected_to: attached_across(topology, terminal_id, Some(EdgeRef::Segment(segment.id))),
                        end: far,
                    });
                }
            }
            Ok(connections)
        }
        FaceKind::TerminalEquipment => {
            let id = TerminalEquipmentId::from_uuid(face.equipment_id);
            let equipment = topology
                .terminal_equipment(id)
                .ok_or(QueryError::TerminalEquipmentNotFound(id))?;

            let mut connections = Vec::new();
            for structure in equipment.live_structures() {
                for terminal in &structure.terminals {
                    let (a, z) = trace_ends(topology, TraceStart::Terminal(terminal.id))?;
                    connections.push(FaceConnection {
                        element: GraphElement::TerminalRef {
                            terminal_id: terminal.id,
                            terminal_equipment_id: Some(equipment.id),
                        },
                        label: format!("{}-{}", structure.position, terminal.name),
                        terminal_id: Some(terminal.id),
                        connected_to: attached_across(topology, Some(terminal.id), None),
                        end: z.or(a),
                    });
                }
            }
            Ok(connections)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminalLine {
    pub terminal_id: TerminalId,
    pub name: String,
    pub direction: TerminalDirection,
    pub connected: bool,
    pub a_end: Option<LineEnd>,
    pub z_end: Option<LineEnd>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminalStructureLine {
    pub terminal_structure_id: TerminalStructureId,
    pub position: u16,
    pub terminals: Vec<TerminalLine>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminalEquipmentConnectivityView {
    pub terminal_equipment_id: TerminalEquipmentId,
    pub name: Option<String>,
    pub structures: Vec<TerminalStructureLine>,
}

pub fn terminal_equipment_connectivity_view(
    topology: &Topology,
    terminal_equipment_id: TerminalEquipmentId,
) -> QueryResult<TerminalEquipmentConnectivityView> {
    let equipment = topology
        .terminal_equipment(terminal_equipment_id)
        .ok_or(QueryError::TerminalEquipmentNotFound(terminal_equipment_id))?;

    let structures = equipment
        .live_structures()
        .map(|structure| {
            let terminals = structure
                .terminals
                .iter()
                .map(|terminal| {
                    let (a_end, z_end) = trace_ends(topology, TraceStart::Terminal(terminal.id))?;
                    Ok(TerminalLine {
                        terminal_id: terminal.id,
                        name: terminal.name.clone(),
                        direction: terminal.direction,
                        connected: topology.terminal_attachment_count(terminal.id) > 0,
                        a_end,
                        z_end,
                    })
                })
                .collect::<QueryResult<Vec<_>>>()?;
            Ok(TerminalStructureLine {
                terminal_structure_id: structure.id,
                position: structure.position,
                terminals,
            })
        })
        .collect::<QueryResult<Vec<_>>>()?;

    Ok(TerminalEquipmentConnectivityView {
        terminal_equipment_id,
        name: equipment.name.clone(),
        structures,
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanSegmentLine {
    pub span_segment_id: SpanSegmentId,
    pub from_node_id: RouteNodeId,
    pub to_node_id: RouteNodeId,
    pub a_end: Option<LineEnd>,
    pub z_end: Option<LineEnd>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanStructureLine {
    pub span_structure_id: SpanStructureId,
    pub level: u8,
    pub position: u16,
    pub segments: Vec<SpanSegmentLine>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanEquipmentConnectivityView {
    pub span_equipment_id: SpanEquipmentId,
    pub name: Option<String>,
    pub structures: Vec<SpanStructureLine>,
}

pub fn span_equipment_connectivity_view(
    topology: &Topology,
    span_equipment_id: SpanEquipmentId,
) -> QueryResult<SpanEquipmentConnectivityView> {
    let equipment = topology
        .span_equipment(span_equipment_id)
        .ok_or(QueryError::SpanEquipmentNotFound(span_equipment_id))?;

    let structures = equipment
        .live_structures()
        .map(|(_, structure)| {
            let segments = structure
                .span_segments
                .iter()
                .map(|segment| {
                    let (a_end, z_end) = trace_ends(topology, TraceStart::Segment(segment.id))?;
                    Ok(SpanSegmentLine {
                        span_segment_id: segment.id,
                        from_node_id: equipment.node_at(segment.from_node_of_interest_index),
                        to_node_id: equipment.node_at(segment.to_node_of_interest_index),
                        a_end,
                        z_end,
                    })
                })
                .collect::<QueryResult<Vec<_>>>()?;
            Ok(SpanStructureLine {
                span_structure_id: structure.id,
                level: structure.level,
                position: structure.position,
                segments,
            })
        })
        .collect::<QueryResult<Vec<_>>>()?;

    Ok(SpanEquipmentConnectivityView {
        span_equipment_id,
        name: equipment.name.clone(),
        structures,
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisconnectPreviewLine {
    pub connected_to: LineEnd,
    /// Pair to pass to a disconnect command to release this connection
    pub pair: ConnectionPair,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisconnectPreview {
    pub span_segment_id: SpanSegmentId,
    pub route_node_id: RouteNodeId,
    pub terminal_id: Option<TerminalId>,
    pub lines: Vec<DisconnectPreviewLine>,
}

/// What a segment end at a node is connected to, as disconnectable pairs
pub fn disconnect_preview(
    topology: &Topology,
    span_segment_id: SpanSegmentId,
    route_node_id: RouteNodeId,
) -> QueryResult<DisconnectPreview> {
    let (equipment, segment) = topology
        .span_segment(span_segment_id)
        .ok_or(QueryError::SegmentNotFound(span_segment_id))?;
    let not_here = || QueryError::SegmentNotAtRouteNode {
        segment: span_segment_id,
        route_node: route_node_id,
    };
    let index = equipment.node_of_interest_index(route_node_id).ok_or_else(not_here)?;
    let end = segment.end_at_index(index).ok_or_else(not_here)?;
    let terminal_id = segment.terminal_at(end);

    let graph = topology.graph();
    let version = topology.version();
    let mut lines = Vec::new();
    if let Some(terminal_id) = terminal_id {
        match graph.terminal(terminal_id, version) {
            Some(TerminalVertex::Real { .. }) => {
                if let Some(element) = graph.element_of_terminal(terminal_id, version) {
                    lines.push(DisconnectPreviewLine {
                        connected_to: line_end(topology, element),
                        pair: ConnectionPair::segment_to_terminal(span_segment_id, terminal_id),
                    });
                }
            }
            _ => {
                for edge in graph.attachments(terminal_id, version) {
                    let EdgeRef::Segment(other) = edge else {
                        continue;
                    };
                    if *other == span_segment_id {
                        continue;
                    }
                    if let Some(element) = graph.element_of_edge(*edge, version) {
                        lines.push(DisconnectPreviewLine {
                            connected_to: line_end(topology, element),
                            pair: ConnectionPair::segments(span_segment_id, *other),
                        });
                    }
                }
            }
        }
    }

    Ok(DisconnectPreview {
        span_segment_id,
        route_node_id,
        terminal_id,
        lines,
    })
}
