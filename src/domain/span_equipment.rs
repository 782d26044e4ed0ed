// Copyright (c) 2025 - Cowboy AI, Inc.
//! Span Equipment Entities
//!
//! A span equipment (conduit, cable) is decomposed into structures (outer
//! jacket at level 1, nested inner structures below) and every structure into
//! segments. A segment is addressed by two indices into the equipment's
//! `node_of_interest_ids`, so cutting inserts a node and re-indexes instead of
//! touching geometry.
//!
//! # Invariants
//! - Segments of a live structure partition `[0, node_of_interest_ids.len()-1]`
//! - `from_node_of_interest_index < to_node_of_interest_index` for every segment
//! - `node_of_interest_ids` is a strictly ordered subset of the walk's nodes

use serde::{Deserialize, Serialize};

use super::ids::{
    NodeContainerId, RouteNodeId, SpanEquipmentId, SpanSegmentId, SpanStructureId,
    SpecificationId, TerminalId, WalkOfInterestId,
};
use super::specification::SpanEquipmentSpecification;
use super::walk::ValidatedWalk;

/// One end of a span segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SegmentEnd {
    From,
    To,
}

impl SegmentEnd {
    pub fn opposite(&self) -> SegmentEnd {
        match self {
            SegmentEnd::From => SegmentEnd::To,
            SegmentEnd::To => SegmentEnd::From,
        }
    }
}

/// Contiguous piece of a structure between two nodes of interest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanSegment {
    pub id: SpanSegmentId,
    pub from_node_of_interest_index: u16,
    pub to_node_of_interest_index: u16,
    /// `None` means the end is open
    pub from_terminal_id: Option<TerminalId>,
    pub to_terminal_id: Option<TerminalId>,
}

impl SpanSegment {
    pub fn new(id: SpanSegmentId, from: u16, to: u16) -> Self {
        Self {
            id,
            from_node_of_interest_index: from,
            to_node_of_interest_index: to,
            from_terminal_id: None,
            to_terminal_id: None,
        }
    }

    pub fn index_at(&self, end: SegmentEnd) -> u16 {
        match end {
            SegmentEnd::From => self.from_node_of_interest_index,
            SegmentEnd::To => self.to_node_of_interest_index,
        }
    }

    pub fn terminal_at(&self, end: SegmentEnd) -> Option<TerminalId> {
        match end {
            SegmentEnd::From => self.from_terminal_id,
            SegmentEnd::To => self.to_terminal_id,
        }
    }

    pub fn set_terminal(&mut self, end: SegmentEnd, terminal_id: Option<TerminalId>) {
        match end {
            SegmentEnd::From => self.from_terminal_id = terminal_id,
            SegmentEnd::To => self.to_terminal_id = terminal_id,
        }
    }

    /// Which end sits on the given node-of-interest index
    pub fn end_at_index(&self, index: u16) -> Option<SegmentEnd> {
        if self.from_node_of_interest_index == index {
            Some(SegmentEnd::From)
        } else if self.to_node_of_interest_index == index {
            Some(SegmentEnd::To)
        } else {
            None
        }
    }

    /// End bound to the given terminal, if any
    pub fn end_bound_to(&self, terminal_id: TerminalId) -> Option<SegmentEnd> {
        if self.from_terminal_id == Some(terminal_id) {
            Some(SegmentEnd::From)
        } else if self.to_terminal_id == Some(terminal_id) {
            Some(SegmentEnd::To)
        } else {
            None
        }
    }

    pub fn spans_index(&self, index: u16) -> bool {
        self.from_node_of_interest_index < index && index < self.to_node_of_interest_index
    }

    pub fn is_connected(&self) -> bool {
        self.from_terminal_id.is_some() || self.to_terminal_id.is_some()
    }
}

/// One level/position slot inside a span equipment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanStructure {
    pub id: SpanStructureId,
    pub specification_id: SpecificationId,
    pub level: u8,
    pub position: u16,
    pub span_segments: Vec<SpanSegment>,
    /// Soft delete flag; ids stay resolvable for audit
    pub deleted: bool,
}

impl SpanStructure {
    pub fn new(specification_id: SpecificationId, level: u8, position: u16, segments: Vec<SpanSegment>) -> Self {
        Self {
            id: SpanStructureId::new(),
            specification_id,
            level,
            position,
            span_segments: segments,
            deleted: false,
        }
    }

    pub fn is_outer(&self) -> bool {
        self.level == 1
    }

    pub fn has_connected_segments(&self) -> bool {
        self.span_segments.iter().any(SpanSegment::is_connected)
    }

    /// Segment having an end on the given node-of-interest index
    pub fn segment_with_end_at(&self, index: u16) -> impl Iterator<Item = (&SpanSegment, SegmentEnd)> {
        self.span_segments
            .iter()
            .filter_map(move |segment| segment.end_at_index(index).map(|end| (segment, end)))
    }
}

/// Side of a node container a span equipment enters through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeContainerSide {
    North,
    East,
    South,
    West,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeContainerAffix {
    pub node_container_id: NodeContainerId,
    pub route_node_id: RouteNodeId,
    pub ingoing_side: NodeContainerSide,
}

/// Direction a child traverses a parent segment, relative to the parent's
/// node-of-interest order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AffixDirection {
    Forward,
    Backward,
}

impl AffixDirection {
    pub fn flipped(&self) -> AffixDirection {
        match self {
            AffixDirection::Forward => AffixDirection::Backward,
            AffixDirection::Backward => AffixDirection::Forward,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentAffix {
    pub span_segment_id: SpanSegmentId,
    pub direction: AffixDirection,
}

/// Routing step of a child equipment through parent segments or raw route
/// network; `parent_affixes` is empty for raw hops
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtilityNetworkHop {
    pub from_node_id: RouteNodeId,
    pub to_node_id: RouteNodeId,
    pub parent_affixes: Vec<ParentAffix>,
    pub walk: ValidatedWalk,
}

impl UtilityNetworkHop {
    pub fn is_raw(&self) -> bool {
        self.parent_affixes.is_empty()
    }

    pub fn reversed(&self) -> UtilityNetworkHop {
        let mut parent_affixes: Vec<ParentAffix> = self
            .parent_affixes
            .iter()
            .map(|affix| ParentAffix {
                span_segment_id: affix.span_segment_id,
                direction: affix.direction.flipped(),
            })
            .collect();
        parent_affixes.reverse();
        UtilityNetworkHop {
            from_node_id: self.to_node_id,
            to_node_id: self.from_node_id,
            parent_affixes,
            walk: self.walk.reversed(),
        }
    }
}

/// Span equipment aggregate root state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanEquipment {
    pub id: SpanEquipmentId,
    pub specification_id: SpecificationId,
    pub walk_of_interest_id: WalkOfInterestId,
    pub name: Option<String>,
    pub is_cable: bool,
    pub walk: ValidatedWalk,
    pub node_of_interest_ids: Vec<RouteNodeId>,
    pub span_structures: Vec<SpanStructure>,
    pub node_container_affixes: Vec<NodeContainerAffix>,
    pub utility_network_hops: Vec<UtilityNetworkHop>,
    pub deleted: bool,
}

impl SpanEquipment {
    /// Expand a specification into structures, one segment each, spanning
    /// the whole walk
    pub fn from_specification(
        id: SpanEquipmentId,
        specification: &SpanEquipmentSpecification,
        walk_of_interest_id: WalkOfInterestId,
        walk: ValidatedWalk,
        name: Option<String>,
    ) -> Self {
        let span_structures = specification
            .root_template
            .flatten()
            .into_iter()
            .map(|template| {
                SpanStructure::new(
                    template.span_structure_specification_id,
                    template.level,
                    template.position,
                    vec![SpanSegment::new(SpanSegmentId::new(), 0, 1)],
                )
            })
            .collect();

        Self {
            id,
            specification_id: specification.id,
            walk_of_interest_id,
            name,
            is_cable: specification.is_cable,
            node_of_interest_ids: vec![walk.first_node(), walk.last_node()],
            walk,
            span_structures,
            node_container_affixes: Vec::new(),
            utility_network_hops: Vec::new(),
            deleted: false,
        }
    }

    pub fn first_node(&self) -> RouteNodeId {
        self.node_of_interest_ids[0]
    }

    pub fn last_node(&self) -> RouteNodeId {
        self.node_of_interest_ids[self.node_of_interest_ids.len() - 1]
    }

    pub fn last_index(&self) -> u16 {
        (self.node_of_interest_ids.len() - 1) as u16
    }

    pub fn is_end_node(&self, node_id: RouteNodeId) -> bool {
        self.first_node() == node_id || self.last_node() == node_id
    }

    pub fn is_utility_network_routed(&self) -> bool {
        !self.utility_network_hops.is_empty()
    }

    pub fn node_of_interest_index(&self, node_id: RouteNodeId) -> Option<u16> {
        self.node_of_interest_ids
            .iter()
            .position(|id| *id == node_id)
            .map(|pos| pos as u16)
    }

    pub fn node_at(&self, index: u16) -> RouteNodeId {
        self.node_of_interest_ids[index as usize]
    }

    pub fn outer_structure(&self) -> Option<&SpanStructure> {
        self.span_structures.iter().find(|s| s.is_outer() && !s.deleted)
    }

    pub fn live_structures(&self) -> impl Iterator<Item = (usize, &SpanStructure)> {
        self.span_structures
            .iter()
            .enumerate()
            .filter(|(_, structure)| !structure.deleted)
    }

    pub fn live_segments(&self) -> impl Iterator<Item = (usize, &SpanSegment)> {
        self.live_structures()
            .flat_map(|(index, structure)| structure.span_segments.iter().map(move |s| (index, s)))
    }

    /// Locate a live segment: `(structure index, segment index)`
    pub fn find_segment(&self, segment_id: SpanSegmentId) -> Option<(usize, usize)> {
        self.live_structures().find_map(|(structure_index, structure)| {
            structure
                .span_segments
                .iter()
                .position(|segment| segment.id == segment_id)
                .map(|segment_index| (structure_index, segment_index))
        })
    }

    pub fn segment(&self, segment_id: SpanSegmentId) -> Option<&SpanSegment> {
        self.find_segment(segment_id)
            .map(|(s, i)| &self.span_structures[s].span_segments[i])
    }

    pub fn segment_mut(&mut self, segment_id: SpanSegmentId) -> Option<&mut SpanSegment> {
        let (s, i) = self.find_segment(segment_id)?;
        Some(&mut self.span_structures[s].span_segments[i])
    }

    pub fn has_connected_segments(&self) -> bool {
        self.live_segments().any(|(_, segment)| segment.is_connected())
    }

    /// Any live segment boundary at an interior node of interest
    pub fn has_interior_cuts(&self) -> bool {
        let last = self.last_index();
        self.live_segments().any(|(_, segment)| {
            segment.from_node_of_interest_index != 0 || segment.to_node_of_interest_index != last
        })
    }

    /// Segment ends lying on the given node-of-interest index
    pub fn segment_ends_at(&self, index: u16) -> Vec<(usize, SpanSegmentId, SegmentEnd)> {
        self.live_structures()
            .flat_map(|(structure_index, structure)| {
                structure
                    .segment_with_end_at(index)
                    .map(move |(segment, end)| (structure_index, segment.id, end))
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    /// Whether a segment is cut (has a boundary) at a node that is not an
    /// equipment end
    pub fn is_cut_at(&self, node_id: RouteNodeId) -> bool {
        match self.node_of_interest_index(node_id) {
            Some(index) if index != 0 && index != self.last_index() => {
                !self.segment_ends_at(index).is_empty()
            }
            _ => false,
        }
    }

    pub fn is_connected_at(&self, node_id: RouteNodeId) -> bool {
        let Some(index) = self.node_of_interest_index(node_id) else {
            return false;
        };
        self.live_segments().any(|(_, segment)| {
            segment
                .end_at_index(index)
                .is_some_and(|end| segment.terminal_at(end).is_some())
        })
    }

    pub fn affix_at(&self, node_id: RouteNodeId) -> Option<&NodeContainerAffix> {
        self.node_container_affixes
            .iter()
            .find(|affix| affix.route_node_id == node_id)
    }

    /// Walk positions of every node of interest
    pub fn node_of_interest_walk_positions(&self) -> Option<Vec<usize>> {
        self.walk.positions_of(&self.node_of_interest_ids)
    }

    /// Route sub-walk covered by a segment, in the segment's own direction
    pub fn segment_walk(&self, segment: &SpanSegment) -> Option<ValidatedWalk> {
        let positions = self.node_of_interest_walk_positions()?;
        let from = positions[segment.from_node_of_interest_index as usize];
        let to = positions[segment.to_node_of_interest_index as usize];
        self.walk.sub_walk(from, to).ok()
    }

    /// Insert a node of interest at `position` and shift every index at or
    /// after it
    pub fn insert_node_of_interest(&mut self, position: u16, node_id: RouteNodeId) {
        self.node_of_interest_ids.insert(position as usize, node_id);
        for structure in &mut self.span_structures {
            for segment in &mut structure.span_segments {
                if segment.from_node_of_interest_index >= position {
                    segment.from_node_of_interest_index += 1;
                }
                if segment.to_node_of_interest_index >= position {
                    segment.to_node_of_interest_index += 1;
                }
            }
        }
    }

    /// Replace a segment with two halves meeting at `index`
    pub fn split_segment(
        &mut self,
        segment_id: SpanSegmentId,
        index: u16,
        first_id: SpanSegmentId,
        second_id: SpanSegmentId,
    ) -> bool {
        let Some((s, i)) = self.find_segment(segment_id) else {
            return false;
        };
        let segments = &mut self.span_structures[s].span_segments;
        let old = segments.remove(i);
        let first = SpanSegment {
            id: first_id,
            from_node_of_interest_index: old.from_node_of_interest_index,
            to_node_of_interest_index: index,
            from_terminal_id: old.from_terminal_id,
            to_terminal_id: None,
        };
        let second = SpanSegment {
            id: second_id,
            from_node_of_interest_index: index,
            to_node_of_interest_index: old.to_node_of_interest_index,
            from_terminal_id: None,
            to_terminal_id: old.to_terminal_id,
        };
        segments.insert(i, second);
        segments.insert(i, first);
        true
    }

    /// Same equipment described in the opposite direction
    pub fn reversed(&self) -> SpanEquipment {
        let last = self.last_index();
        let mut reversed = self.clone();
        reversed.walk = self.walk.reversed();
        reversed.node_of_interest_ids.reverse();
        for structure in &mut reversed.span_structures {
            for segment in &mut structure.span_segments {
                let from = segment.from_node_of_interest_index;
                let to = segment.to_node_of_interest_index;
                segment.from_node_of_interest_index = last - to;
                segment.to_node_of_interest_index = last - from;
                std::mem::swap(&mut segment.from_terminal_id, &mut segment.to_terminal_id);
            }
            structure.span_segments.reverse();
        }
        reversed.utility_network_hops = self
            .utility_network_hops
            .iter()
            .rev()
            .map(UtilityNetworkHop::reversed)
            .collect();
        reversed
    }

    /// Check the partition invariant on every live structure
    pub fn segments_partition_range(&self) -> bool {
        let last = self.last_index();
        self.live_structures().all(|(_, structure)| {
            let mut expected_from = 0;
            for segment in &structure.span_segments {
                if segment.from_node_of_interest_index != expected_from
                    || segment.from_node_of_interest_index >= segment.to_node_of_interest_index
                {
                    return false;
                }
                expected_from = segment.to_node_of_interest_index;
            }
            expected_from == last
        })
    }
}
