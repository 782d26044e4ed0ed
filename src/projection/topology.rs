// Copyright (c) 2025 - Cowboy AI, Inc.
//! Topology Projection
//!
//! Authoritative in-memory materialisation of all equipment plus the
//! connectivity graph, built by folding committed events. Entities live in
//! arenas keyed by id; every cross reference is an id lookup. Deleted
//! entities stay in the arena flagged `deleted` and are filtered by every
//! read path except the `_including_deleted` accessors.
//!
//! # Fold
//!
//! ```text
//! (Topology, version, [TopologyEvent]) ──apply──▶ Topology'
//!                                                   ├─ arenas updated
//!                                                   ├─ indexes refreshed
//!                                                   └─ graph synced at version
//! ```

use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

use super::graph::ConnectivityGraph;
use crate::domain::{
    NodeContainer, NodeContainerId, RouteNodeId, SpanEquipment, SpanEquipmentId, SpanSegment,
    SpanSegmentId, TerminalEquipment, TerminalEquipmentId, TerminalId, TerminalLink, TerminalLinkId,
    TerminalStructure,
};
use crate::events::{
    NodeContainerEvent, SpanEquipmentEvent, StoredEvent, TerminalEquipmentEvent, TopologyEvent,
};

/// Topology projection state
#[derive(Debug, Clone, Default)]
pub struct Topology {
    version: u64,
    span_equipment: HashMap<SpanEquipmentId, SpanEquipment>,
    node_containers: HashMap<NodeContainerId, NodeContainer>,
    terminal_equipment: HashMap<TerminalEquipmentId, TerminalEquipment>,
    terminal_links: HashMap<TerminalLinkId, TerminalLink>,

    segment_index: HashMap<SpanSegmentId, SpanEquipmentId>,
    terminal_index: HashMap<TerminalId, TerminalEquipmentId>,
    container_by_route_node: HashMap<RouteNodeId, NodeContainerId>,
    span_equipment_by_route_node: HashMap<RouteNodeId, HashSet<SpanEquipmentId>>,
    children_by_parent: HashMap<SpanEquipmentId, HashSet<SpanEquipmentId>>,
    parents_by_child: HashMap<SpanEquipmentId, HashSet<SpanEquipmentId>>,
    links_by_terminal: HashMap<TerminalId, Vec<TerminalLinkId>>,

    graph: ConnectivityGraph,
}

impl Topology {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a projection from a stored event stream
    pub fn from_events(events: &[StoredEvent<TopologyEvent>]) -> Self {
        let mut topology = Topology::new();
        for stored in events {
            topology.apply(stored.version, std::slice::from_ref(&stored.data));
        }
        topology
    }

    /// Last committed version
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn graph(&self) -> &ConnectivityGraph {
        &self.graph
    }

    // ---- span equipment ----

    pub fn span_equipment(&self, id: SpanEquipmentId) -> Option<&SpanEquipment> {
        self.span_equipment.get(&id).filter(|e| !e.deleted)
    }

    pub fn span_equipment_including_deleted(&self, id: SpanEquipmentId) -> Option<&SpanEquipment> {
        self.span_equipment.get(&id)
    }

    pub fn all_span_equipment(&self) -> impl Iterator<Item = &SpanEquipment> {
        self.span_equipment.values().filter(|e| !e.deleted)
    }

    /// Live equipment and live segment for a segment id
    pub fn span_segment(&self, segment_id: SpanSegmentId) -> Option<(&SpanEquipment, &SpanSegment)> {
        let equipment = self.span_equipment(*self.segment_index.get(&segment_id)?)?;
        let segment = equipment.segment(segment_id)?;
        Some((equipment, segment))
    }

    pub fn span_equipment_at_route_node(&self, route_node_id: RouteNodeId) -> Vec<&SpanEquipment> {
        let mut found: Vec<&SpanEquipment> = self
            .span_equipment_by_route_node
            .get(&route_node_id)
            .into_iter()
            .flatten()
            .filter_map(|id| self.span_equipment(*id))
            .collect();
        found.sort_by_key(|e| e.id);
        found
    }

    /// Utility-network children routed through the given equipment
    pub fn dependent_children(&self, parent_id: SpanEquipmentId) -> Vec<SpanEquipmentId> {
        let mut children: Vec<SpanEquipmentId> = self
            .children_by_parent
            .get(&parent_id)
            .into_iter()
            .flatten()
            .copied()
            .filter(|id| self.span_equipment(*id).is_some())
            .collect();
        children.sort();
        children
    }

    /// Span equipment affixed to a node container
    pub fn affixed_to_container(&self, container_id: NodeContainerId) -> Vec<&SpanEquipment> {
        let Some(container) = self.node_container(container_id) else {
            return Vec::new();
        };
        self.span_equipment_at_route_node(container.route_node_id)
            .into_iter()
            .filter(|e| {
                e.node_container_affixes
                    .iter()
                    .any(|affix| affix.node_container_id == container_id)
            })
            .collect()
    }

    // ---- node containers ----

    pub fn node_container(&self, id: NodeContainerId) -> Option<&NodeContainer> {
        self.node_containers.get(&id).filter(|c| !c.deleted)
    }

    pub fn node_container_at(&self, route_node_id: RouteNodeId) -> Option<&NodeContainer> {
        self.node_container(*self.container_by_route_node.get(&route_node_id)?)
    }

    // ---- terminal equipment ----

    pub fn terminal_equipment(&self, id: TerminalEquipmentId) -> Option<&TerminalEquipment> {
        self.terminal_equipment.get(&id).filter(|e| !e.deleted)
    }

    pub fn terminal_equipment_including_deleted(&self, id: TerminalEquipmentId) -> Option<&TerminalEquipment> {
        self.terminal_equipment.get(&id)
    }

    /// Live terminal with owning equipment and structure
    pub fn terminal(
        &self,
        terminal_id: TerminalId,
    ) -> Option<(&TerminalEquipment, &TerminalStructure, &crate::domain::Terminal)> {
        let equipment = self.terminal_equipment(*self.terminal_index.get(&terminal_id)?)?;
        let (structure, terminal) = equipment.terminal(terminal_id)?;
        Some((equipment, structure, terminal))
    }

    pub fn terminal_link(&self, id: TerminalLinkId) -> Option<&TerminalLink> {
        self.terminal_links.get(&id)
    }

    pub fn links_of_terminal(&self, terminal_id: TerminalId) -> Vec<&TerminalLink> {
        self.links_by_terminal
            .get(&terminal_id)
            .into_iter()
            .flatten()
            .filter_map(|id| self.terminal_links.get(id))
            .collect()
    }

    /// Graph attachments of a terminal at the current version
    pub fn terminal_attachment_count(&self, terminal_id: TerminalId) -> usize {
        self.graph.attachments(terminal_id, self.version).len()
    }

    pub fn is_terminal_equipment_connected(&self, equipment: &TerminalEquipment) -> bool {
        equipment
            .terminal_ids()
            .any(|terminal_id| self.terminal_attachment_count(terminal_id) > 0)
    }

    pub fn is_terminal_structure_connected(&self, structure: &TerminalStructure) -> bool {
        structure
            .terminals
            .iter()
            .any(|terminal| self.terminal_attachment_count(terminal.id) > 0)
    }

    // ---- fold ----

    /// Fold the events of one committed version
    pub fn apply(&mut self, version: u64, events: &[TopologyEvent]) {
        self.version = version;
        for event in events {
            debug!(version, event_type = event.event_type_name(), "Applying event");
            match event {
                TopologyEvent::SpanEquipment(e) => self.apply_span_equipment_event(e),
                TopologyEvent::NodeContainer(e) => self.apply_node_container_event(e),
                TopologyEvent::TerminalEquipment(e) => self.apply_terminal_equipment_event(e),
            }
        }
    }

    /// Drop graph history older than `retention` versions
    pub fn prune_history(&mut self, retention: u64) {
        self.graph.prune(self.version.saturating_sub(retention));
    }

    fn apply_span_equipment_event(&mut self, event: &SpanEquipmentEvent) {
        let id = event.span_equipment_id();
        let previous = self.span_equipment.get(&id).cloned();

        if let SpanEquipmentEvent::SpanEquipmentPlaced(e) = event {
            self.span_equipment.insert(id, e.equipment.clone());
        } else if let Some(equipment) = self.span_equipment.get_mut(&id) {
            mutate_span_equipment(equipment, event);
        } else {
            warn!(span_equipment_id = %id, "Event for unknown span equipment ignored");
            return;
        }

        let mut orphaned_children = Vec::new();
        if let SpanEquipmentEvent::SpanEquipmentMerged(e) = event {
            orphaned_children = self.dependent_children(e.absorbed_span_equipment_id);
            let absorbed_previous = self.span_equipment.get(&e.absorbed_span_equipment_id).cloned();
            if let Some(absorbed) = self.span_equipment.get_mut(&e.absorbed_span_equipment_id) {
                absorbed.deleted = true;
            }
            self.refresh_span_equipment(e.absorbed_span_equipment_id, absorbed_previous);
        }

        self.refresh_span_equipment(id, previous);

        // children of an absorbed parent now hang off the survivor
        for child_id in orphaned_children {
            let child = self.span_equipment.get(&child_id).cloned();
            self.refresh_span_equipment(child_id, child);
        }
    }

    fn refresh_span_equipment(&mut self, id: SpanEquipmentId, previous: Option<SpanEquipment>) {
        if let Some(previous) = previous {
            for structure in &previous.span_structures {
                for segment in &structure.span_segments {
                    if self.segment_index.get(&segment.id) == Some(&id) {
                        self.segment_index.remove(&segment.id);
                    }
                }
            }
            for node_id in previous.walk.node_ids() {
                if let Some(set) = self.span_equipment_by_route_node.get_mut(node_id) {
                    set.remove(&id);
                }
            }
        }
        for parent_id in self.parents_by_child.remove(&id).unwrap_or_default() {
            if let Some(children) = self.children_by_parent.get_mut(&parent_id) {
                children.remove(&id);
            }
        }

        let Some(current) = self.span_equipment.get(&id).cloned() else {
            return;
        };

        if !current.deleted {
            for (_, segment) in current.live_segments() {
                self.segment_index.insert(segment.id, id);
            }
            for node_id in current.walk.node_ids() {
                self.span_equipment_by_route_node
                    .entry(*node_id)
                    .or_default()
                    .insert(id);
            }
            let parents: HashSet<SpanEquipmentId> = current
                .utility_network_hops
                .iter()
                .flat_map(|hop| hop.parent_affixes.iter())
                .filter_map(|affix| self.segment_index.get(&affix.span_segment_id).copied())
                .collect();
            for parent_id in &parents {
                self.children_by_parent.entry(*parent_id).or_default().insert(id);
            }
            if !parents.is_empty() {
                self.parents_by_child.insert(id, parents);
            }
        }

        self.graph.sync_span_equipment(&current, self.version);
    }

    fn apply_node_container_event(&mut self, event: &NodeContainerEvent) {
        use NodeContainerEvent::*;

        let id = event.node_container_id();
        if let NodeContainerPlaced(e) = event {
            self.container_by_route_node.insert(e.container.route_node_id, id);
            self.node_containers.insert(id, e.container.clone());
            return;
        }

        let Some(container) = self.node_containers.get_mut(&id) else {
            warn!(node_container_id = %id, "Event for unknown node container ignored");
            return;
        };

        match event {
            NodeContainerPlaced(_) => {}
            NodeContainerRemoved(_) => {
                container.deleted = true;
                let route_node_id = container.route_node_id;
                self.container_by_route_node.remove(&route_node_id);
            }
            RackPlaced(e) => container.racks.push(e.rack.clone()),
            TerminalEquipmentAddedToContainer(e) => match &e.rack_mount {
                Some(mount) => {
                    if let Some(rack) = container.rack_mut(mount.rack_id) {
                        rack.subrack_mounts.push(crate::domain::SubrackMount {
                            terminal_equipment_id: e.terminal_equipment_id,
                            position_in_units: mount.position_in_units,
                            height_in_units: mount.height_in_units,
                        });
                    }
                }
                None => container.terminal_equipment_ids.push(e.terminal_equipment_id),
            },
            TerminalEquipmentRemovedFromContainer(e) => {
                container.remove_terminal_equipment(e.terminal_equipment_id)
            }
            RackEquipmentMoved(e) => {
                if let Some(rack) = container.rack_mut(e.from_rack_id) {
                    rack.subrack_mounts
                        .retain(|m| m.terminal_equipment_id != e.terminal_equipment_id);
                }
                if let Some(rack) = container.rack_mut(e.to.rack_id) {
                    rack.subrack_mounts.push(crate::domain::SubrackMount {
                        terminal_equipment_id: e.terminal_equipment_id,
                        position_in_units: e.to.position_in_units,
                        height_in_units: e.to.height_in_units,
                    });
                    rack.subrack_mounts.sort_by_key(|m| m.position_in_units);
                }
            }
        }
    }

    fn apply_terminal_equipment_event(&mut self, event: &TerminalEquipmentEvent) {
        use TerminalEquipmentEvent::*;

        let id = event.terminal_equipment_id();
        match event {
            TerminalsConnected(e) => {
                for terminal_id in [e.link.from_terminal_id, e.link.to_terminal_id] {
                    self.links_by_terminal.entry(terminal_id).or_default().push(e.link.id);
                }
                self.graph.add_link(&e.link, self.version);
                self.terminal_links.insert(e.link.id, e.link.clone());
                return;
            }
            TerminalsDisconnected(e) => {
                if let Some(link) = self.terminal_links.remove(&e.terminal_link_id) {
                    for terminal_id in [link.from_terminal_id, link.to_terminal_id] {
                        if let Some(links) = self.links_by_terminal.get_mut(&terminal_id) {
                            links.retain(|l| *l != link.id);
                        }
                    }
                }
                self.graph.remove_link(e.terminal_link_id, self.version);
                return;
            }
            _ => {}
        }

        let previous = self.terminal_equipment.get(&id).cloned();
        if let TerminalEquipmentPlaced(e) = event {
            self.terminal_equipment.insert(id, e.equipment.clone());
        } else if let Some(equipment) = self.terminal_equipment.get_mut(&id) {
            match event {
                TerminalEquipmentRemoved(_) => equipment.deleted = true,
                TerminalStructuresAdded(e) => {
                    equipment.terminal_structures.extend(e.structures.iter().cloned());
                    equipment.terminal_structures.sort_by_key(|s| s.position);
                }
                TerminalStructureRemoved(e) => {
                    if let Some(structure) = equipment.structure_mut(e.terminal_structure_id) {
                        structure.deleted = true;
                    }
                }
                InterfaceInfoUpdated(e) => {
                    if let Some(structure) = equipment.structure_mut(e.terminal_structure_id) {
                        structure.interface_info = e.interface_info.clone();
                    }
                }
                TerminalEquipmentPlaced(_) | TerminalsConnected(_) | TerminalsDisconnected(_) => {}
            }
        } else {
            warn!(terminal_equipment_id = %id, "Event for unknown terminal equipment ignored");
            return;
        }

        if let Some(previous) = previous {
            for terminal_id in previous.terminal_ids() {
                self.terminal_index.remove(&terminal_id);
            }
        }
        let Some(current) = self.terminal_equipment.get(&id).cloned() else {
            return;
        };
        if !current.deleted {
            for terminal_id in current.terminal_ids() {
                self.terminal_index.insert(terminal_id, id);
            }
        }
        self.graph.sync_terminal_equipment(&current, self.version);
    }
}

fn mutate_span_equipment(equipment: &mut SpanEquipment, event: &SpanEquipmentEvent) {
    use SpanEquipmentEvent::*;

    match event {
        SpanEquipmentPlaced(_) => {}
        SpanEquipmentAffixedToParent(e) => {
            equipment.walk = e.walk.clone();
            equipment.node_of_interest_ids = e.node_of_interest_ids.clone();
            equipment.utility_network_hops = e.hops.clone();
        }
        SpanSegmentsCut(e) => {
            if e.node_of_interest_inserted {
                equipment.insert_node_of_interest(e.node_of_interest_index, e.route_node_id);
            }
            for cut in &e.cuts {
                equipment.split_segment(
                    cut.old_span_segment_id,
                    e.node_of_interest_index,
                    cut.new_span_segment_ids[0],
                    cut.new_span_segment_ids[1],
                );
            }
        }
        SpanSegmentsConnectedToTerminals(e) => {
            for binding in &e.bindings {
                if let Some(segment) = equipment.segment_mut(binding.span_segment_id) {
                    segment.set_terminal(binding.end, Some(binding.terminal_id));
                }
            }
        }
        SpanSegmentsDisconnectedFromTerminals(e) => {
            for binding in &e.bindings {
                if let Some(segment) = equipment.segment_mut(binding.span_segment_id) {
                    segment.set_terminal(binding.end, None);
                }
            }
        }
        SpanEquipmentMerged(e) => *equipment = e.merged.clone(),
        SpanEquipmentAffixedToContainer(e) => equipment.node_container_affixes.push(e.affix.clone()),
        SpanEquipmentDetachedFromContainer(e) => equipment.node_container_affixes.retain(|affix| {
            !(affix.node_container_id == e.node_container_id && affix.route_node_id == e.route_node_id)
        }),
        AdditionalInnerSpanStructuresAdded(e) => {
            equipment.span_structures.extend(e.structures.iter().cloned())
        }
        SpanStructureRemoved(e) => {
            if let Some(structure) = equipment
                .span_structures
                .iter_mut()
                .find(|s| s.id == e.span_structure_id)
            {
                structure.deleted = true;
            }
        }
        SpanEquipmentRemoved(_) => equipment.deleted = true,
        SpanEquipmentMoved(e) => {
            equipment.walk_of_interest_id = e.walk_of_interest_id;
            equipment.walk = e.walk.clone();
            equipment.node_of_interest_ids = e.node_of_interest_ids.clone();
        }
        SpanEquipmentRerouted(e) => {
            equipment.walk = e.walk.clone();
            equipment.node_of_interest_ids = e.node_of_interest_ids.clone();
            equipment.utility_network_hops = e.hops.clone();
        }
        SpanEquipmentNameChanged(e) => equipment.name = e.name.clone(),
    }
}
