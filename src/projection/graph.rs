// Copyright (c) 2025 - Cowboy AI, Inc.
//! Connectivity Graph
//!
//! Vertices are terminals: real terminals of terminal equipment, or virtual
//! terminals materialised when two span segments are connected directly.
//! Span segments and terminal links are edges attaching to at most two
//! terminals. Every map is versioned, so neighbour lookups take the version
//! the reader is pinned to.
//!
//! # Structure
//!
//! ```text
//!   segment ──to──▶ (virtual T) ◀──from── segment
//!   segment ──to──▶ (real T, Bi) ◀──from── segment
//!   (real T) ◀── terminal link ──▶ (real T)
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::debug;

use super::versioned::VersionedMap;
use crate::domain::{
    SpanEquipment, SpanEquipmentId, SpanSegmentId, TerminalDirection, TerminalEquipment,
    TerminalEquipmentId, TerminalId, TerminalLink, TerminalLinkId, TerminalStructureId,
};

/// Graph element, as returned by trace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GraphElement {
    /// One span segment
    SegmentRef {
        span_equipment_id: SpanEquipmentId,
        span_segment_id: SpanSegmentId,
    },
    /// A terminal; virtual terminals carry no equipment
    TerminalRef {
        terminal_id: TerminalId,
        terminal_equipment_id: Option<TerminalEquipmentId>,
    },
    TerminalLink { terminal_link_id: TerminalLinkId },
}

/// Edge reference in a terminal's attachment list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeRef {
    Segment(SpanSegmentId),
    Link(TerminalLinkId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerminalVertex {
    Real {
        terminal_equipment_id: TerminalEquipmentId,
        terminal_structure_id: TerminalStructureId,
        direction: TerminalDirection,
        splitter: bool,
    },
    Virtual,
}

impl TerminalVertex {
    pub fn is_virtual(&self) -> bool {
        matches!(self, TerminalVertex::Virtual)
    }

    pub fn terminal_equipment_id(&self) -> Option<TerminalEquipmentId> {
        match self {
            TerminalVertex::Real { terminal_equipment_id, .. } => Some(*terminal_equipment_id),
            TerminalVertex::Virtual => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentEdge {
    pub span_equipment_id: SpanEquipmentId,
    pub level: u8,
    pub from_terminal_id: Option<TerminalId>,
    pub to_terminal_id: Option<TerminalId>,
}

impl SegmentEdge {
    fn terminals(&self) -> impl Iterator<Item = TerminalId> {
        self.from_terminal_id.into_iter().chain(self.to_terminal_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkEdge {
    pub from_terminal_id: TerminalId,
    pub to_terminal_id: TerminalId,
}

/// Versioned connectivity graph
#[derive(Debug, Clone, Default)]
pub struct ConnectivityGraph {
    terminals: VersionedMap<TerminalId, TerminalVertex>,
    segments: VersionedMap<SpanSegmentId, SegmentEdge>,
    links: VersionedMap<TerminalLinkId, LinkEdge>,
    attachments: VersionedMap<TerminalId, Vec<EdgeRef>>,
    structure_members: VersionedMap<TerminalStructureId, Vec<TerminalId>>,
    // current ownership, used only by the writer
    segments_by_equipment: HashMap<SpanEquipmentId, HashSet<SpanSegmentId>>,
    terminals_by_equipment: HashMap<TerminalEquipmentId, HashSet<TerminalId>>,
    structures_by_equipment: HashMap<TerminalEquipmentId, HashSet<TerminalStructureId>>,
}

impl ConnectivityGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn terminal(&self, terminal_id: TerminalId, version: u64) -> Option<&TerminalVertex> {
        self.terminals.get(&terminal_id, version)
    }

    pub fn segment(&self, segment_id: SpanSegmentId, version: u64) -> Option<&SegmentEdge> {
        self.segments.get(&segment_id, version)
    }

    pub fn link(&self, link_id: TerminalLinkId, version: u64) -> Option<&LinkEdge> {
        self.links.get(&link_id, version)
    }

    /// Edges attached to a terminal at `version`
    pub fn attachments(&self, terminal_id: TerminalId, version: u64) -> &[EdgeRef] {
        self.attachments
            .get(&terminal_id, version)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn structure_members(&self, structure_id: TerminalStructureId, version: u64) -> &[TerminalId] {
        self.structure_members
            .get(&structure_id, version)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Terminal ends of an edge
    pub fn edge_terminals(&self, edge: EdgeRef, version: u64) -> Vec<TerminalId> {
        match edge {
            EdgeRef::Segment(id) => self
                .segment(id, version)
                .map(|e| e.terminals().collect())
                .unwrap_or_default(),
            EdgeRef::Link(id) => self
                .link(id, version)
                .map(|e| vec![e.from_terminal_id, e.to_terminal_id])
                .unwrap_or_default(),
        }
    }

    pub fn element_of_edge(&self, edge: EdgeRef, version: u64) -> Option<GraphElement> {
        match edge {
            EdgeRef::Segment(id) => self.segment(id, version).map(|e| GraphElement::SegmentRef {
                span_equipment_id: e.span_equipment_id,
                span_segment_id: id,
            }),
            EdgeRef::Link(id) => self
                .link(id, version)
                .map(|_| GraphElement::TerminalLink { terminal_link_id: id }),
        }
    }

    pub fn element_of_terminal(&self, terminal_id: TerminalId, version: u64) -> Option<GraphElement> {
        self.terminal(terminal_id, version).map(|vertex| GraphElement::TerminalRef {
            terminal_id,
            terminal_equipment_id: vertex.terminal_equipment_id(),
        })
    }

    /// Bring the segments of one span equipment in line with its state
    pub fn sync_span_equipment(&mut self, equipment: &SpanEquipment, version: u64) {
        let live: HashMap<SpanSegmentId, SegmentEdge> = if equipment.deleted {
            HashMap::new()
        } else {
            equipment
                .live_structures()
                .flat_map(|(_, structure)| {
                    structure.span_segments.iter().map(move |segment| {
                        (
                            segment.id,
                            SegmentEdge {
                                span_equipment_id: equipment.id,
                                level: structure.level,
                                from_terminal_id: segment.from_terminal_id,
                                to_terminal_id: segment.to_terminal_id,
                            },
                        )
                    })
                })
                .collect()
        };

        let previous = self.segments_by_equipment.remove(&equipment.id).unwrap_or_default();
        for segment_id in previous {
            let owned = self
                .segments
                .latest(&segment_id)
                .is_some_and(|edge| edge.span_equipment_id == equipment.id);
            if owned && !live.contains_key(&segment_id) {
                self.detach_segment(segment_id, version);
            }
        }

        for (segment_id, edge) in &live {
            if self.segments.latest(segment_id) == Some(edge) {
                continue;
            }
            if self.segments.latest(segment_id).is_some() {
                self.detach_segment(*segment_id, version);
            }
            self.attach_segment(*segment_id, edge.clone(), version);
        }

        if !live.is_empty() {
            self.segments_by_equipment
                .insert(equipment.id, live.into_keys().collect());
        }
        debug!(span_equipment_id = %equipment.id, version, "Synced span equipment into graph");
    }

    fn attach_segment(&mut self, segment_id: SpanSegmentId, edge: SegmentEdge, version: u64) {
        for terminal_id in edge.terminals() {
            if self.terminals.latest(&terminal_id).is_none() {
                self.terminals.insert(terminal_id, TerminalVertex::Virtual, version);
            }
            self.push_attachment(terminal_id, EdgeRef::Segment(segment_id), version);
        }
        self.segments.insert(segment_id, edge, version);
    }

    fn detach_segment(&mut self, segment_id: SpanSegmentId, version: u64) {
        let Some(edge) = self.segments.latest(&segment_id).cloned() else {
            return;
        };
        for terminal_id in edge.terminals() {
            self.drop_attachment(terminal_id, EdgeRef::Segment(segment_id), version);
        }
        self.segments.remove(&segment_id, version);
    }

    fn push_attachment(&mut self, terminal_id: TerminalId, edge: EdgeRef, version: u64) {
        let mut attached = self.attachments.latest(&terminal_id).cloned().unwrap_or_default();
        if !attached.contains(&edge) {
            attached.push(edge);
        }
        self.attachments.insert(terminal_id, attached, version);
    }

    fn drop_attachment(&mut self, terminal_id: TerminalId, edge: EdgeRef, version: u64) {
        let mut attached = self.attachments.latest(&terminal_id).cloned().unwrap_or_default();
        attached.retain(|e| *e != edge);
        if attached.is_empty() {
            self.attachments.remove(&terminal_id, version);
            if self.terminals.latest(&terminal_id).is_some_and(TerminalVertex::is_virtual) {
                self.terminals.remove(&terminal_id, version);
            }
        } else {
            self.attachments.insert(terminal_id, attached, version);
        }
    }

    /// Bring the terminals of one terminal equipment in line with its state
    pub fn sync_terminal_equipment(&mut self, equipment: &TerminalEquipment, version: u64) {
        let mut live_terminals = HashSet::new();
        let mut live_structures = HashSet::new();
        if !equipment.deleted {
            for structure in equipment.live_structures() {
                live_structures.insert(structure.id);
                let members: Vec<TerminalId> = structure.terminals.iter().map(|t| t.id).collect();
                if self.structure_members.latest(&structure.id) != Some(&members) {
                    self.structure_members.insert(structure.id, members, version);
                }
                for terminal in &structure.terminals {
                    live_terminals.insert(terminal.id);
                    let vertex = TerminalVertex::Real {
                        terminal_equipment_id: equipment.id,
                        terminal_structure_id: structure.id,
                        direction: terminal.direction,
                        splitter: structure.is_splitter(),
                    };
                    if self.terminals.latest(&terminal.id) != Some(&vertex) {
                        self.terminals.insert(terminal.id, vertex, version);
                    }
                }
            }
        }

        let previous_terminals = self.terminals_by_equipment.remove(&equipment.id).unwrap_or_default();
        for terminal_id in previous_terminals.difference(&live_terminals) {
            self.terminals.remove(terminal_id, version);
        }
        let previous_structures = self.structures_by_equipment.remove(&equipment.id).unwrap_or_default();
        for structure_id in previous_structures.difference(&live_structures) {
            self.structure_members.remove(structure_id, version);
        }

        if !live_terminals.is_empty() {
            self.terminals_by_equipment.insert(equipment.id, live_terminals);
            self.structures_by_equipment.insert(equipment.id, live_structures);
        }
        debug!(terminal_equipment_id = %equipment.id, version, "Synced terminal equipment into graph");
    }

    pub fn add_link(&mut self, link: &TerminalLink, version: u64) {
        for terminal_id in [link.from_terminal_id, link.to_terminal_id] {
            self.push_attachment(terminal_id, EdgeRef::Link(link.id), version);
        }
        self.links.insert(
            link.id,
            LinkEdge {
                from_terminal_id: link.from_terminal_id,
                to_terminal_id: link.to_terminal_id,
            },
            version,
        );
    }

    pub fn remove_link(&mut self, link_id: TerminalLinkId, version: u64) {
        let Some(edge) = self.links.latest(&link_id).cloned() else {
            return;
        };
        for terminal_id in [edge.from_terminal_id, edge.to_terminal_id] {
            self.drop_attachment(terminal_id, EdgeRef::Link(link_id), version);
        }
        self.links.remove(&link_id, version);
    }

    /// Drop history older than `oldest_version`
    pub fn prune(&mut self, oldest_version: u64) {
        self.terminals.prune(oldest_version);
        self.segments.prune(oldest_version);
        self.links.prune(oldest_version);
        self.attachments.prune(oldest_version);
        self.structure_members.prune(oldest_version);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        RouteNodeId, RouteSegmentId, SpanEquipmentSpecification, SpanStructureTemplate,
        SpecificationId, ValidatedWalk, WalkOfInterestId,
    };

    fn equipment() -> SpanEquipment {
        let walk = ValidatedWalk::new(vec![RouteNodeId::new(), RouteNodeId::new()], vec![RouteSegmentId::new()])
            .unwrap();
        let spec = SpanEquipmentSpecification {
            id: SpecificationId::new(),
            category: "conduit".into(),
            name: "single".into(),
            fixed: false,
            is_cable: false,
            root_template: SpanStructureTemplate::new(SpecificationId::new(), 1, 1),
        };
        SpanEquipment::from_specification(SpanEquipmentId::new(), &spec, WalkOfInterestId::new(), walk, None)
    }

    #[test]
    fn test_virtual_terminal_lives_while_attached() {
        // Arrange
        let mut graph = ConnectivityGraph::new();
        let mut a = equipment();
        let mut b = equipment();
        let shared = TerminalId::new();
        graph.sync_span_equipment(&a, 1);
        graph.sync_span_equipment(&b, 1);

        // Act
        a.span_structures[0].span_segments[0].to_terminal_id = Some(shared);
        b.span_structures[0].span_segments[0].from_terminal_id = Some(shared);
        graph.sync_span_equipment(&a, 2);
        graph.sync_span_equipment(&b, 2);

        // Assert
        assert_eq!(graph.attachments(shared, 2).len(), 2);
        assert!(graph.terminal(shared, 2).unwrap().is_virtual());
        assert!(graph.terminal(shared, 1).is_none());

        a.span_structures[0].span_segments[0].to_terminal_id = None;
        b.span_structures[0].span_segments[0].from_terminal_id = None;
        graph.sync_span_equipment(&a, 3);
        graph.sync_span_equipment(&b, 3);
        assert!(graph.terminal(shared, 3).is_none());
        assert_eq!(graph.attachments(shared, 2).len(), 2);
    }

    #[test]
    fn test_deleted_equipment_leaves_graph() {
        let mut graph = ConnectivityGraph::new();
        let mut a = equipment();
        let segment_id = a.span_structures[0].span_segments[0].id;
        graph.sync_span_equipment(&a, 1);
        assert!(graph.segment(segment_id, 1).is_some());

        a.deleted = true;
        graph.sync_span_equipment(&a, 2);
        assert!(graph.segment(segment_id, 2).is_none());
        assert!(graph.segment(segment_id, 1).is_some());

        graph.prune(2);
        assert!(graph.segment(segment_id, 2).is_none());
    }
}
