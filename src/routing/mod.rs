// Copyright (c) 2025 - Cowboy AI, Inc.
//! Utility Network Routing
//!
//! A child span equipment (typically a cable) can be routed through the
//! segments of already placed parent equipment (conduits) instead of raw
//! route network. The route is recorded as ordered [`UtilityNetworkHop`]s
//! whose parent affixes name the traversed parent segments and direction.
//!
//! # Hop Chain
//!
//! ```text
//!  start ──seg A (fwd)──▶ n1 ──seg B (bwd)──▶ n2 ──raw walk──▶ end
//!        └────────── hop 1 ──────────┘       └── hop 2 ──┘
//! ```
//!
//! Every affix must continue from the node the previous one ended in, and
//! consecutive hops must meet node to node. The child walk is the
//! concatenation of hop walks.
//!
//! # Reroute
//!
//! When a parent is cut, moved or merged, [`reroute_dependents`] rebuilds the
//! hops of every dependent child from the new parent state and emits one
//! [`SpanEquipmentRerouted`] per child whose route changed. Children that are
//! themselves parents propagate further down.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use tracing::debug;

use crate::aggregate::CommandError;
use crate::domain::{
    AffixDirection, ParentAffix, RouteNodeId, RouteSegmentId, SegmentEnd, SpanEquipment,
    SpanEquipmentId, SpanSegment, SpanSegmentId, UtilityNetworkHop, ValidatedWalk,
};
use crate::events::SpanEquipmentRerouted;
use crate::projection::Topology;

/// Hop as requested by a command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RoutingHop {
    /// Raw route network path
    RouteNetworkWalk { segment_ids: Vec<RouteSegmentId> },
    /// Through parent segments, starting at a route node
    ThroughSpanSegments {
        start_node_id: RouteNodeId,
        span_segment_ids: Vec<SpanSegmentId>,
    },
}

/// Hop with its raw walk already resolved by the route network
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedHop {
    RouteNetworkWalk(ValidatedWalk),
    ThroughSpanSegments {
        start_node_id: RouteNodeId,
        span_segment_ids: Vec<SpanSegmentId>,
    },
}

/// Parent states replacing the committed ones during reroute
#[derive(Debug, Clone, Default)]
pub struct ParentChanges {
    /// New state of each changed parent
    pub parents: HashMap<SpanEquipmentId, SpanEquipment>,
    /// Parents absorbed into one of `parents` by a merge
    pub absorbed: Vec<SpanEquipmentId>,
    /// Cut segment → the two halves in node-of-interest order
    pub replaced_segments: HashMap<SpanSegmentId, [SpanSegmentId; 2]>,
}

impl ParentChanges {
    pub fn with_parent(parent: SpanEquipment) -> Self {
        let mut changes = Self::default();
        changes.parents.insert(parent.id, parent);
        changes
    }

    fn segment<'a>(
        &'a self,
        topology: &'a Topology,
        segment_id: SpanSegmentId,
    ) -> Option<(&'a SpanEquipment, &'a SpanSegment)> {
        for parent in self.parents.values() {
            if let Some(segment) = parent.segment(segment_id) {
                return Some((parent, segment));
            }
        }
        topology
            .span_segment(segment_id)
            .filter(|(equipment, _)| !self.parents.contains_key(&equipment.id))
    }
}

fn segment_nodes(equipment: &SpanEquipment, segment: &SpanSegment) -> (RouteNodeId, RouteNodeId) {
    (
        equipment.node_at(segment.from_node_of_interest_index),
        equipment.node_at(segment.to_node_of_interest_index),
    )
}

fn directed_segment_walk(
    equipment: &SpanEquipment,
    segment: &SpanSegment,
    direction: AffixDirection,
) -> Result<ValidatedWalk, CommandError> {
    let walk = equipment.segment_walk(segment).ok_or_else(|| {
        CommandError::ErrorCalculatingWalk(format!(
            "span segment {} has no route on equipment {}",
            segment.id, equipment.id
        ))
    })?;
    Ok(match direction {
        AffixDirection::Forward => walk,
        AffixDirection::Backward => walk.reversed(),
    })
}

fn concat_walks(walks: &[ValidatedWalk]) -> Result<ValidatedWalk, CommandError> {
    let (first, rest) = walks
        .split_first()
        .ok_or_else(|| CommandError::ErrorCalculatingWalk("no hops".into()))?;
    rest.iter().try_fold(first.clone(), |acc, next| {
        acc.concat(next)
            .map_err(|e| CommandError::ErrorCalculatingWalk(e.to_string()))
    })
}

/// Follow parent segments from `start`, each continuing where the previous
/// one ended
fn through_segments<'a, F>(
    start: RouteNodeId,
    segment_ids: &[SpanSegmentId],
    lookup: F,
    missing: impl Fn(SpanSegmentId, RouteNodeId) -> CommandError,
) -> Result<UtilityNetworkHop, CommandError>
where
    F: Fn(SpanSegmentId) -> Result<(&'a SpanEquipment, &'a SpanSegment), CommandError>,
{
    if segment_ids.is_empty() {
        return Err(CommandError::NothingSpecified);
    }

    let mut current = start;
    let mut affixes = Vec::with_capacity(segment_ids.len());
    let mut walks = Vec::with_capacity(segment_ids.len());

    for segment_id in segment_ids {
        let (equipment, segment) = lookup(*segment_id)?;
        let (from, to) = segment_nodes(equipment, segment);
        let (direction, next) = if current == from {
            (AffixDirection::Forward, to)
        } else if current == to {
            (AffixDirection::Backward, from)
        } else {
            return Err(missing(*segment_id, current));
        };
        walks.push(directed_segment_walk(equipment, segment, direction)?);
        affixes.push(ParentAffix {
            span_segment_id: *segment_id,
            direction,
        });
        current = next;
    }

    Ok(UtilityNetworkHop {
        from_node_id: start,
        to_node_id: current,
        parent_affixes: affixes,
        walk: concat_walks(&walks)?,
    })
}

fn ensure_chained(hops: &[UtilityNetworkHop]) -> Result<(), CommandError> {
    for pair in hops.windows(2) {
        if pair[0].to_node_id != pair[1].from_node_id {
            return Err(CommandError::ErrorCalculatingWalk(format!(
                "hop ending in {} does not continue from {}",
                pair[0].to_node_id, pair[1].from_node_id
            )));
        }
    }
    Ok(())
}

/// Build hops and the resulting walk for a child equipment
pub fn build_hops(
    topology: &Topology,
    hops: &[ResolvedHop],
) -> Result<(ValidatedWalk, Vec<UtilityNetworkHop>), CommandError> {
    if hops.is_empty() {
        return Err(CommandError::NothingSpecified);
    }

    let mut built: Vec<UtilityNetworkHop> = Vec::with_capacity(hops.len());
    for hop in hops {
        match hop {
            ResolvedHop::RouteNetworkWalk(walk) => built.push(UtilityNetworkHop {
                from_node_id: walk.first_node(),
                to_node_id: walk.last_node(),
                parent_affixes: Vec::new(),
                walk: walk.clone(),
            }),
            ResolvedHop::ThroughSpanSegments {
                start_node_id,
                span_segment_ids,
            } => built.push(through_segments(
                *start_node_id,
                span_segment_ids,
                |id| topology.span_segment(id).ok_or(CommandError::SegmentNotFound(id)),
                |segment, route_node| CommandError::SegmentNotRelatedToRouteNode {
                    segment,
                    route_node,
                },
            )?),
        }
    }

    orient_raw_hops(&mut built);
    ensure_chained(&built)?;

    let walks: Vec<ValidatedWalk> = built.iter().map(|hop| hop.walk.clone()).collect();
    let walk = concat_walks(&walks)?;
    Ok((walk, built))
}

/// Raw walks may be given in either direction; flip them to meet their
/// neighbours
fn orient_raw_hops(hops: &mut [UtilityNetworkHop]) {
    for i in 0..hops.len() {
        if !hops[i].is_raw() {
            continue;
        }
        let flip = if i > 0 {
            let previous_end = hops[i - 1].to_node_id;
            hops[i].from_node_id != previous_end && hops[i].to_node_id == previous_end
        } else if let Some(next) = hops.get(1) {
            hops[0].to_node_id != next.from_node_id && hops[0].from_node_id == next.from_node_id
        } else {
            false
        };
        if flip {
            hops[i] = hops[i].reversed();
        }
    }
}

/// Re-derive one hop from changed parents
fn recalculate_hop(
    topology: &Topology,
    changes: &ParentChanges,
    hop: &UtilityNetworkHop,
) -> Result<UtilityNetworkHop, CommandError> {
    if hop.is_raw() {
        return Ok(hop.clone());
    }

    let mut affixes: Vec<ParentAffix> = Vec::with_capacity(hop.parent_affixes.len());
    for affix in &hop.parent_affixes {
        match changes.replaced_segments.get(&affix.span_segment_id) {
            Some([first, second]) => {
                let halves = match affix.direction {
                    AffixDirection::Forward => [*first, *second],
                    AffixDirection::Backward => [*second, *first],
                };
                affixes.extend(halves.into_iter().map(|span_segment_id| ParentAffix {
                    span_segment_id,
                    direction: affix.direction,
                }));
            }
            None => affixes.push(affix.clone()),
        }
    }

    let lookup = |id: SpanSegmentId| {
        changes
            .segment(topology, id)
            .ok_or(CommandError::SegmentNotFound(id))
    };

    // start node survives a merge that reverses the parent; direction only
    // decides it when a move took the start off the segment
    let (equipment, segment) = lookup(affixes[0].span_segment_id)?;
    let (from, to) = segment_nodes(equipment, segment);
    let start = if hop.from_node_id == from || hop.from_node_id == to {
        hop.from_node_id
    } else {
        let start_end = match affixes[0].direction {
            AffixDirection::Forward => SegmentEnd::From,
            AffixDirection::Backward => SegmentEnd::To,
        };
        equipment.node_at(segment.index_at(start_end))
    };

    let segment_ids: Vec<SpanSegmentId> = affixes.iter().map(|a| a.span_segment_id).collect();
    through_segments(start, &segment_ids, lookup, |segment, route_node| {
        CommandError::ErrorCalculatingWalk(format!(
            "parent segment {segment} no longer continues from {route_node}"
        ))
    })
}

/// New route of one child, or `None` when unchanged
fn reroute_child(
    topology: &Topology,
    changes: &ParentChanges,
    child: &SpanEquipment,
) -> Result<Option<SpanEquipment>, CommandError> {
    let hops = child
        .utility_network_hops
        .iter()
        .map(|hop| recalculate_hop(topology, changes, hop))
        .collect::<Result<Vec<_>, _>>()?;
    ensure_chained(&hops)?;

    let walks: Vec<ValidatedWalk> = hops.iter().map(|hop| hop.walk.clone()).collect();
    let walk = concat_walks(&walks)?;

    if hops == child.utility_network_hops && walk == child.walk {
        return Ok(None);
    }

    let old_first = child.first_node();
    let old_last = child.last_node();
    for (moved, old_end) in [
        (walk.first_node() != old_first, old_first),
        (walk.last_node() != old_last, old_last),
    ] {
        if moved && child.is_connected_at(old_end) {
            return Err(CommandError::DependentChildConnectedAtMovedEnd(child.id));
        }
    }

    let count = child.node_of_interest_ids.len();
    let interior = &child.node_of_interest_ids[1..count - 1];
    let inner_walk = &walk.node_ids()[1..walk.node_ids().len() - 1];
    let mut search_from = 0;
    for node in interior {
        match inner_walk[search_from..].iter().position(|n| n == node) {
            Some(offset) => search_from += offset + 1,
            None => return Err(CommandError::InteriorNodeNotOnNewWalk(*node)),
        }
    }

    let mut node_of_interest_ids = Vec::with_capacity(count);
    node_of_interest_ids.push(walk.first_node());
    node_of_interest_ids.extend_from_slice(interior);
    node_of_interest_ids.push(walk.last_node());

    let mut rerouted = child.clone();
    rerouted.walk = walk;
    rerouted.node_of_interest_ids = node_of_interest_ids;
    rerouted.utility_network_hops = hops;
    Ok(Some(rerouted))
}

/// Recalculate every child routed through a changed parent
pub fn reroute_dependents(
    topology: &Topology,
    changes: &ParentChanges,
) -> Result<Vec<SpanEquipmentRerouted>, CommandError> {
    let mut changes = changes.clone();
    let mut queue: VecDeque<SpanEquipmentId> = changes
        .parents
        .keys()
        .copied()
        .chain(changes.absorbed.iter().copied())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let mut visited: HashSet<SpanEquipmentId> = queue.iter().copied().collect();
    let mut rerouted = Vec::new();

    while let Some(parent_id) = queue.pop_front() {
        for child_id in topology.dependent_children(parent_id) {
            if !visited.insert(child_id) {
                continue;
            }
            let Some(child) = topology.span_equipment(child_id) else {
                continue;
            };
            if let Some(updated) = reroute_child(topology, &changes, child)? {
                debug!(
                    child = %child_id,
                    parent = %parent_id,
                    "Rerouting dependent span equipment"
                );
                rerouted.push(SpanEquipmentRerouted {
                    span_equipment_id: child_id,
                    walk: updated.walk.clone(),
                    node_of_interest_ids: updated.node_of_interest_ids.clone(),
                    hops: updated.utility_network_hops.clone(),
                });
                changes.parents.insert(child_id, updated);
                queue.push_back(child_id);
            }
        }
    }

    Ok(rerouted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::WalkOfInterestId;
    use crate::domain::{SpanEquipmentSpecification, SpanStructureTemplate, SpecificationId};
    use crate::events::{SpanEquipmentEvent, SpanEquipmentPlaced, TopologyEvent};

    fn walk(nodes: &[RouteNodeId]) -> ValidatedWalk {
        ValidatedWalk::new(
            nodes.to_vec(),
            (1..nodes.len()).map(|_| RouteSegmentId::new()).collect(),
        )
        .unwrap()
    }

    fn conduit(nodes: &[RouteNodeId]) -> SpanEquipment {
        let spec = SpanEquipmentSpecification {
            id: SpecificationId::new(),
            category: "conduit".into(),
            name: "single".into(),
            fixed: false,
            is_cable: false,
            root_template: SpanStructureTemplate::new(SpecificationId::new(), 1, 1),
        };
        SpanEquipment::from_specification(
            SpanEquipmentId::new(),
            &spec,
            WalkOfInterestId::new(),
            walk(nodes),
            None,
        )
    }

    fn topology_with(equipment: &[SpanEquipment]) -> Topology {
        let mut topology = Topology::new();
        let events: Vec<TopologyEvent> = equipment
            .iter()
            .map(|e| {
                SpanEquipmentEvent::SpanEquipmentPlaced(SpanEquipmentPlaced { equipment: e.clone() })
                    .into()
            })
            .collect();
        topology.apply(1, &events);
        topology
    }

    #[test]
    fn test_hops_follow_parent_segments_in_both_directions() {
        // Arrange
        let nodes: Vec<_> = (0..4).map(|_| RouteNodeId::new()).collect();
        let first = conduit(&nodes[0..3]);
        let second = conduit(&[nodes[3], nodes[2]]);
        let topology = topology_with(&[first.clone(), second.clone()]);
        let hops = vec![ResolvedHop::ThroughSpanSegments {
            start_node_id: nodes[0],
            span_segment_ids: vec![
                first.span_structures[0].span_segments[0].id,
                second.span_structures[0].span_segments[0].id,
            ],
        }];

        // Act
        let (child_walk, built) = build_hops(&topology, &hops).unwrap();

        // Assert
        assert_eq!(child_walk.node_ids(), &nodes[..]);
        assert_eq!(built[0].parent_affixes[0].direction, AffixDirection::Forward);
        assert_eq!(built[0].parent_affixes[1].direction, AffixDirection::Backward);
        assert_eq!(built[0].to_node_id, nodes[3]);
    }

    #[test]
    fn test_segment_not_starting_at_node_is_rejected() {
        let nodes: Vec<_> = (0..3).map(|_| RouteNodeId::new()).collect();
        let parent = conduit(&nodes);
        let topology = topology_with(&[parent.clone()]);
        let segment = parent.span_structures[0].span_segments[0].id;

        let result = build_hops(
            &topology,
            &[ResolvedHop::ThroughSpanSegments {
                start_node_id: nodes[1],
                span_segment_ids: vec![segment],
            }],
        );

        assert_eq!(
            result.unwrap_err(),
            CommandError::SegmentNotRelatedToRouteNode {
                segment,
                route_node: nodes[1]
            }
        );
    }

    #[test]
    fn test_raw_hops_must_chain() {
        let nodes: Vec<_> = (0..4).map(|_| RouteNodeId::new()).collect();
        let topology = Topology::new();

        let result = build_hops(
            &topology,
            &[
                ResolvedHop::RouteNetworkWalk(walk(&nodes[0..2])),
                ResolvedHop::RouteNetworkWalk(walk(&nodes[2..4])),
            ],
        );

        assert!(matches!(result, Err(CommandError::ErrorCalculatingWalk(_))));
    }

    #[test]
    fn test_reversed_raw_hop_is_oriented() {
        let nodes: Vec<_> = (0..3).map(|_| RouteNodeId::new()).collect();
        let topology = Topology::new();

        let (child_walk, _) = build_hops(
            &topology,
            &[
                ResolvedHop::RouteNetworkWalk(walk(&nodes[0..2])),
                ResolvedHop::RouteNetworkWalk(walk(&[nodes[2], nodes[1]])),
            ],
        )
        .unwrap();

        assert_eq!(child_walk.node_ids(), &nodes[..]);
    }
}
