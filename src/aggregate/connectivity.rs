// Copyright (c) 2025 - Cowboy AI, Inc.
//! Connectivity Command Handlers
//!
//! Connect and disconnect span segment ends and terminals at a route node,
//! including the implicit merge of two span equipments whose outer
//! structures are joined end to end.
//!
//! # Terminal Binding
//!
//! ```text
//! segment ─ segment     → fresh virtual terminal bound on both ends
//! segment ─ terminal    → segment end bound to the real terminal
//! terminal ─ terminal   → TerminalLink (jumper)
//! outer ─ outer (A ≠ B) → merge B into A
//! ```

use std::collections::{HashMap, HashSet};

use super::commands::{
    ConnectSpanSegmentsAtRouteNode, ConnectSpanSegmentsByIndexAtRouteNode, ConnectTerminalsAtRouteNode,
    ConnectionEnd, ConnectionPair, DisconnectSpanSegmentsAtRouteNode, DisconnectTerminalsAtRouteNode,
};
use super::error::CommandError;
use crate::domain::{
    RouteNodeId, SegmentEnd, SpanEquipment, SpanEquipmentId, SpanSegment, SpanSegmentId,
    TerminalEquipment, TerminalEquipmentId, TerminalId, TerminalLink, TerminalLinkId,
};
use crate::events::{
    SegmentTerminalBinding, SpanEquipmentEvent, SpanEquipmentMerged,
    SpanSegmentsConnectedToTerminals, SpanSegmentsDisconnectedFromTerminals, TerminalEquipmentEvent,
    TerminalsConnected, TerminalsDisconnected, TopologyEvent,
};
use crate::projection::Topology;
use crate::routing::{self, ParentChanges};

/// Segment end located at the command's route node
struct SegmentAtNode<'a> {
    equipment: &'a SpanEquipment,
    segment: &'a SpanSegment,
    end: SegmentEnd,
    level: u8,
}

impl SegmentAtNode<'_> {
    fn terminal(&self) -> Option<TerminalId> {
        self.segment.terminal_at(self.end)
    }
}

fn segment_at_node(
    topology: &Topology,
    segment_id: SpanSegmentId,
    route_node_id: RouteNodeId,
) -> Result<SegmentAtNode<'_>, CommandError> {
    let (equipment, segment) = topology
        .span_segment(segment_id)
        .ok_or(CommandError::SegmentNotFound(segment_id))?;
    let not_at_node = || CommandError::SegmentEndNotAtRouteNode {
        segment: segment_id,
        route_node: route_node_id,
    };
    let index = equipment
        .node_of_interest_index(route_node_id)
        .ok_or_else(not_at_node)?;
    let end = segment.end_at_index(index).ok_or_else(not_at_node)?;
    let level = equipment
        .live_structures()
        .find(|(_, s)| s.span_segments.iter().any(|seg| seg.id == segment_id))
        .map(|(_, s)| s.level)
        .ok_or(CommandError::SegmentNotFound(segment_id))?;

    Ok(SegmentAtNode {
        equipment,
        segment,
        end,
        level,
    })
}

fn terminal_at_node(
    topology: &Topology,
    terminal_id: TerminalId,
    route_node_id: RouteNodeId,
) -> Result<(&TerminalEquipment, usize), CommandError> {
    let (equipment, _, terminal) = topology
        .terminal(terminal_id)
        .ok_or(CommandError::TerminalNotFound(terminal_id))?;
    if equipment.route_node_id != route_node_id {
        return Err(CommandError::TerminalNotAtRouteNode {
            terminal: terminal_id,
            route_node: route_node_id,
        });
    }
    Ok((equipment, terminal.direction.capacity()))
}

/// Per-command bookkeeping so pairs in one command see each other
#[derive(Default)]
struct PendingConnections {
    bound_ends: HashSet<(SpanSegmentId, SegmentEnd)>,
    terminal_usage: HashMap<TerminalId, usize>,
    bindings: Vec<(SpanEquipmentId, SegmentTerminalBinding)>,
    links: Vec<(TerminalEquipmentId, TerminalLink)>,
}

impl PendingConnections {
    fn bind_segment(&mut self, at: &SegmentAtNode<'_>, terminal_id: TerminalId) -> Result<(), CommandError> {
        if at.terminal().is_some() || !self.bound_ends.insert((at.segment.id, at.end)) {
            return Err(CommandError::AlreadyConnected(at.segment.id));
        }
        self.bindings.push((
            at.equipment.id,
            SegmentTerminalBinding {
                span_segment_id: at.segment.id,
                end: at.end,
                terminal_id,
            },
        ));
        Ok(())
    }

    fn use_terminal(
        &mut self,
        topology: &Topology,
        terminal_id: TerminalId,
        capacity: usize,
    ) -> Result<(), CommandError> {
        let pending = self.terminal_usage.entry(terminal_id).or_insert(0);
        if topology.terminal_attachment_count(terminal_id) + *pending >= capacity {
            return Err(CommandError::TerminalAlreadyConnected(terminal_id));
        }
        *pending += 1;
        Ok(())
    }

    fn into_events(self, route_node_id: RouteNodeId) -> Vec<TopologyEvent> {
        let mut grouped: Vec<(SpanEquipmentId, Vec<SegmentTerminalBinding>)> = Vec::new();
        for (equipment_id, binding) in self.bindings {
            match grouped.iter_mut().find(|(id, _)| *id == equipment_id) {
                Some((_, bindings)) => bindings.push(binding),
                None => grouped.push((equipment_id, vec![binding])),
            }
        }

        let mut events: Vec<TopologyEvent> = grouped
            .into_iter()
            .map(|(span_equipment_id, bindings)| {
                SpanEquipmentEvent::SpanSegmentsConnectedToTerminals(SpanSegmentsConnectedToTerminals {
                    span_equipment_id,
                    route_node_id,
                    bindings,
                })
                .into()
            })
            .collect();
        events.extend(self.links.into_iter().map(|(terminal_equipment_id, link)| {
            TerminalEquipmentEvent::TerminalsConnected(TerminalsConnected {
                terminal_equipment_id,
                link,
            })
            .into()
        }));
        events
    }
}

pub fn handle_connect_span_segments(
    topology: &Topology,
    command: &ConnectSpanSegmentsAtRouteNode,
) -> Result<Vec<TopologyEvent>, CommandError> {
    connect_pairs(topology, command.route_node_id, &command.pairs)
}

/// Connect the `count` live structures starting at the given indices
pub fn handle_connect_span_segments_by_index(
    topology: &Topology,
    command: &ConnectSpanSegmentsByIndexAtRouteNode,
) -> Result<Vec<TopologyEvent>, CommandError> {
    if command.count == 0 {
        return Err(CommandError::NothingSpecified);
    }
    let from = super::span_equipment::live_span_equipment(topology, command.from_span_equipment_id)?;
    let to = super::span_equipment::live_span_equipment(topology, command.to_span_equipment_id)?;

    let from_ends = open_ends_by_index(from, command.route_node_id, command.from_structure_index, command.count)?;
    let to_ends = open_ends_by_index(to, command.route_node_id, command.to_structure_index, command.count)?;

    let pairs: Vec<ConnectionPair> = from_ends
        .into_iter()
        .zip(to_ends)
        .map(|(a, b)| ConnectionPair::segments(a, b))
        .collect();

    connect_pairs(topology, command.route_node_id, &pairs)
}

/// Segment with an open end at the route node, per live structure in range
fn open_ends_by_index(
    equipment: &SpanEquipment,
    route_node_id: RouteNodeId,
    start: usize,
    count: usize,
) -> Result<Vec<SpanSegmentId>, CommandError> {
    let structures: Vec<_> = equipment.live_structures().map(|(_, s)| s).collect();
    if start + count > structures.len() {
        return Err(CommandError::StructureIndexOutOfRange {
            span_equipment_id: equipment.id,
            index: start + count - 1,
        });
    }

    let index = equipment.node_of_interest_index(route_node_id);
    structures[start..start + count]
        .iter()
        .map(|structure| {
            let not_at_node = || CommandError::SegmentEndNotAtRouteNode {
                segment: structure.span_segments[0].id,
                route_node: route_node_id,
            };
            let index = index.ok_or_else(not_at_node)?;
            let mut ends = structure.segment_with_end_at(index).peekable();
            let first = ends.peek().map(|(segment, _)| segment.id).ok_or_else(not_at_node)?;
            Ok(ends
                .find(|(segment, end)| segment.terminal_at(*end).is_none())
                .map(|(segment, _)| segment.id)
                .unwrap_or(first))
        })
        .collect()
}

fn connect_pairs(
    topology: &Topology,
    route_node_id: RouteNodeId,
    pairs: &[ConnectionPair],
) -> Result<Vec<TopologyEvent>, CommandError> {
    if pairs.is_empty() {
        return Err(CommandError::NothingSpecified);
    }

    let mut pending = PendingConnections::default();
    for pair in pairs {
        if pair.from == pair.to {
            return Err(CommandError::CannotConnectToItself(pair.from.as_uuid()));
        }

        match (pair.from, pair.to) {
            (ConnectionEnd::Segment(a), ConnectionEnd::Segment(b)) => {
                let from = segment_at_node(topology, a, route_node_id)?;
                let to = segment_at_node(topology, b, route_node_id)?;
                if from.level != to.level {
                    return Err(CommandError::OuterAndInnerCannotBeConnected);
                }
                if from.level == 1 && to.level == 1 && from.equipment.id != to.equipment.id {
                    if pairs.len() != 1 {
                        return Err(CommandError::MergeMustBeSoleConnection);
                    }
                    return merge(topology, route_node_id, &from, &to);
                }
                let terminal_id = TerminalId::new();
                pending.bind_segment(&from, terminal_id)?;
                pending.bind_segment(&to, terminal_id)?;
            }
            (ConnectionEnd::Segment(s), ConnectionEnd::Terminal(t))
            | (ConnectionEnd::Terminal(t), ConnectionEnd::Segment(s)) => {
                let at = segment_at_node(topology, s, route_node_id)?;
                let (_, capacity) = terminal_at_node(topology, t, route_node_id)?;
                pending.bind_segment(&at, t)?;
                pending.use_terminal(topology, t, capacity)?;
            }
            (ConnectionEnd::Terminal(a), ConnectionEnd::Terminal(b)) => {
                let link = link_terminals(topology, &mut pending, route_node_id, a, b, None)?;
                pending.links.push(link);
            }
        }
    }

    Ok(pending.into_events(route_node_id))
}

fn link_terminals(
    topology: &Topology,
    pending: &mut PendingConnections,
    route_node_id: RouteNodeId,
    from: TerminalId,
    to: TerminalId,
    fiber_coord_length: Option<f64>,
) -> Result<(TerminalEquipmentId, TerminalLink), CommandError> {
    if from == to {
        return Err(CommandError::CannotConnectToItself(from.as_uuid()));
    }
    let (from_equipment, from_capacity) = terminal_at_node(topology, from, route_node_id)?;
    let (_, to_capacity) = terminal_at_node(topology, to, route_node_id)?;
    pending.use_terminal(topology, from, from_capacity)?;
    pending.use_terminal(topology, to, to_capacity)?;

    Ok((
        from_equipment.id,
        TerminalLink {
            id: TerminalLinkId::new(),
            from_terminal_id: from,
            to_terminal_id: to,
            route_node_id,
            fiber_coord_length,
        },
    ))
}

/// Join two span equipments meeting at `route_node_id`; `from` survives
fn merge(
    topology: &Topology,
    route_node_id: RouteNodeId,
    from: &SegmentAtNode<'_>,
    to: &SegmentAtNode<'_>,
) -> Result<Vec<TopologyEvent>, CommandError> {
    let survivor = from.equipment;
    let absorbed = to.equipment;

    if !survivor.is_end_node(route_node_id) || !absorbed.is_end_node(route_node_id) {
        return Err(CommandError::EndsNotColocated {
            a: survivor.id,
            b: absorbed.id,
            route_node: route_node_id,
        });
    }
    for equipment in [survivor, absorbed] {
        if equipment.is_utility_network_routed() {
            return Err(CommandError::CannotMergeUtilityNetworkRoutedEquipment(equipment.id));
        }
    }
    for at in [from, to] {
        if at.terminal().is_some() {
            return Err(CommandError::AlreadyConnected(at.segment.id));
        }
    }
    let mismatch = || CommandError::SpecificationMismatch {
        a: survivor.id,
        b: absorbed.id,
    };
    if survivor.specification_id != absorbed.specification_id {
        return Err(mismatch());
    }

    let left = if survivor.last_node() == route_node_id {
        survivor.clone()
    } else {
        survivor.reversed()
    };
    let right = if absorbed.first_node() == route_node_id {
        absorbed.clone()
    } else {
        absorbed.reversed()
    };

    let mut merged = left.clone();
    merged.walk = left.walk.concat(&right.walk)?;
    merged
        .node_of_interest_ids
        .extend_from_slice(&right.node_of_interest_ids[1..]);

    let offset = left.last_index();
    let left_slots: HashSet<(u8, u16)> = left
        .live_structures()
        .map(|(_, s)| (s.level, s.position))
        .collect();
    let right_slots: HashSet<(u8, u16)> = right
        .live_structures()
        .map(|(_, s)| (s.level, s.position))
        .collect();
    if left_slots != right_slots {
        return Err(mismatch());
    }

    for structure in merged.span_structures.iter_mut().filter(|s| !s.deleted) {
        let (_, right_structure) = right
            .live_structures()
            .find(|(_, s)| s.level == structure.level && s.position == structure.position)
            .ok_or_else(mismatch)?;
        structure
            .span_segments
            .extend(right_structure.span_segments.iter().map(|segment| SpanSegment {
                from_node_of_interest_index: segment.from_node_of_interest_index + offset,
                to_node_of_interest_index: segment.to_node_of_interest_index + offset,
                ..segment.clone()
            }));
    }

    for affix in &right.node_container_affixes {
        if merged.affix_at(affix.route_node_id).is_none() {
            merged.node_container_affixes.push(affix.clone());
        }
    }

    let changes = ParentChanges {
        parents: HashMap::from([(merged.id, merged.clone())]),
        absorbed: vec![absorbed.id],
        replaced_segments: HashMap::new(),
    };
    let rerouted = routing::reroute_dependents(topology, &changes)?;

    let mut events: Vec<TopologyEvent> = vec![SpanEquipmentEvent::SpanEquipmentMerged(SpanEquipmentMerged {
        span_equipment_id: survivor.id,
        absorbed_span_equipment_id: absorbed.id,
        route_node_id,
        merged,
    })
    .into()];
    events.extend(
        rerouted
            .into_iter()
            .map(|e| TopologyEvent::from(SpanEquipmentEvent::SpanEquipmentRerouted(e))),
    );
    Ok(events)
}

pub fn handle_disconnect_span_segments(
    topology: &Topology,
    command: &DisconnectSpanSegmentsAtRouteNode,
) -> Result<Vec<TopologyEvent>, CommandError> {
    if command.pairs.is_empty() {
        return Err(CommandError::NothingSpecified);
    }
    let route_node_id = command.route_node_id;

    let mut released: HashSet<(SpanSegmentId, SegmentEnd)> = HashSet::new();
    let mut bindings: Vec<(SpanEquipmentId, SegmentTerminalBinding)> = Vec::new();
    let mut unlinked: Vec<TopologyEvent> = Vec::new();

    let mut release = |at: &SegmentAtNode<'_>, terminal_id: TerminalId| {
        if released.insert((at.segment.id, at.end)) {
            bindings.push((
                at.equipment.id,
                SegmentTerminalBinding {
                    span_segment_id: at.segment.id,
                    end: at.end,
                    terminal_id,
                },
            ));
        }
    };

    for pair in &command.pairs {
        if pair.from == pair.to {
            return Err(CommandError::CannotDisconnectFromItself(pair.from.as_uuid()));
        }
        let not_connected = || CommandError::SegmentsNotConnected {
            a: pair.from.as_uuid(),
            b: pair.to.as_uuid(),
        };

        match (pair.from, pair.to) {
            (ConnectionEnd::Segment(a), ConnectionEnd::Segment(b)) => {
                let from = segment_at_node(topology, a, route_node_id)?;
                let to = segment_at_node(topology, b, route_node_id)?;
                match (from.terminal(), to.terminal()) {
                    (Some(x), Some(y)) if x == y => {
                        release(&from, x);
                        release(&to, y);
                    }
                    _ => return Err(not_connected()),
                }
            }
            (ConnectionEnd::Segment(s), ConnectionEnd::Terminal(t))
            | (ConnectionEnd::Terminal(t), ConnectionEnd::Segment(s)) => {
                let at = segment_at_node(topology, s, route_node_id)?;
                if at.terminal() != Some(t) {
                    return Err(not_connected());
                }
                release(&at, t);
            }
            (ConnectionEnd::Terminal(a), ConnectionEnd::Terminal(b)) => {
                unlinked.push(unlink_terminals(topology, route_node_id, a, b)?);
            }
        }
    }

    let mut grouped: Vec<(SpanEquipmentId, Vec<SegmentTerminalBinding>)> = Vec::new();
    for (equipment_id, binding) in bindings {
        match grouped.iter_mut().find(|(id, _)| *id == equipment_id) {
            Some((_, list)) => list.push(binding),
            None => grouped.push((equipment_id, vec![binding])),
        }
    }

    let mut events: Vec<TopologyEvent> = grouped
        .into_iter()
        .map(|(span_equipment_id, bindings)| {
            SpanEquipmentEvent::SpanSegmentsDisconnectedFromTerminals(SpanSegmentsDisconnectedFromTerminals {
                span_equipment_id,
                route_node_id,
                bindings,
            })
            .into()
        })
        .collect();
    events.extend(unlinked);
    Ok(events)
}

pub fn handle_connect_terminals(
    topology: &Topology,
    command: &ConnectTerminalsAtRouteNode,
) -> Result<Vec<TopologyEvent>, CommandError> {
    let mut pending = PendingConnections::default();
    let (terminal_equipment_id, link) = link_terminals(
        topology,
        &mut pending,
        command.route_node_id,
        command.from_terminal_id,
        command.to_terminal_id,
        command.fiber_coord_length,
    )?;
    Ok(vec![TerminalEquipmentEvent::TerminalsConnected(TerminalsConnected {
        terminal_equipment_id,
        link,
    })
    .into()])
}

pub fn handle_disconnect_terminals(
    topology: &Topology,
    command: &DisconnectTerminalsAtRouteNode,
) -> Result<Vec<TopologyEvent>, CommandError> {
    Ok(vec![unlink_terminals(
        topology,
        command.route_node_id,
        command.from_terminal_id,
        command.to_terminal_id,
    )?])
}

fn unlink_terminals(
    topology: &Topology,
    route_node_id: RouteNodeId,
    from: TerminalId,
    to: TerminalId,
) -> Result<TopologyEvent, CommandError> {
    if from == to {
        return Err(CommandError::CannotDisconnectFromItself(from.as_uuid()));
    }
    let (from_equipment, _) = terminal_at_node(topology, from, route_node_id)?;
    let link = topology
        .links_of_terminal(from)
        .into_iter()
        .find(|link| link.links(from, to))
        .ok_or(CommandError::SegmentsNotConnected {
            a: from.as_uuid(),
            b: to.as_uuid(),
        })?;

    Ok(TerminalEquipmentEvent::TerminalsDisconnected(TerminalsDisconnected {
        terminal_equipment_id: from_equipment.id,
        terminal_link_id: link.id,
    })
    .into())
}
