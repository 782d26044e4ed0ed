// Copyright (c) 2025 - Cowboy AI, Inc.
//! Test Fixtures for utility-network-topology
//!
//! Provides a specification catalog, route lines and a synchronous
//! [`World`] that decides commands with the pure handlers and folds the
//! result the same way the service does.
//!
//! # Design Principles
//! - Timestamps are fixed; ids are fresh per test
//! - Fixtures panic on unexpected rejections so tests read as scenarios
//! - No I/O outside the service builders
#![allow(dead_code)]

use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

use utility_network_topology::aggregate::{
    handle_command, CommandContext, CommandError, ConnectSpanSegmentsAtRouteNode, ConnectionPair,
    CutSpanSegmentsAtRouteNode, MoveSpanEquipment, PlaceNodeContainerInRouteNetwork, PlaceSpanEquipmentInRouteNetwork,
    PlaceSpanEquipmentInUtilityNetwork, PlaceTerminalEquipmentInNodeContainer, Resolution, ResolvedWalk,
    TopologyCommand,
};
use utility_network_topology::config::TopologyConfig;
use utility_network_topology::domain::{
    NodeContainerId, NodeContainerSpecification, RackSpecification, RouteNodeId, RouteSegmentId,
    SpanEquipment, SpanEquipmentId, SpanEquipmentSpecification, SpanSegmentId, SpanStructureSpecification,
    SpanStructureTemplate, SpecificationCatalog, SpecificationId, TerminalDirection, TerminalEquipment,
    TerminalEquipmentId, TerminalEquipmentSpecification, TerminalId, TerminalStructureKind,
    TerminalStructureSpecification, TerminalStructureTemplate, TerminalTemplate, ValidatedWalk,
    WalkOfInterestId,
};
use utility_network_topology::event_store::InMemoryEventStore;
use utility_network_topology::events::TopologyEvent;
use utility_network_topology::notification::InMemoryChangeNotifier;
use utility_network_topology::projection::Topology;
use utility_network_topology::route_network::InMemoryRouteNetwork;
use utility_network_topology::routing::{ResolvedHop, RoutingHop};
use utility_network_topology::service::TopologyService;

// Fixed test timestamp (2026-01-19T12:00:00Z)
pub const FIXED_TIMESTAMP: &str = "2026-01-19T12:00:00Z";

pub fn fixed_timestamp() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(FIXED_TIMESTAMP)
        .expect("Invalid timestamp in test fixture")
        .with_timezone(&Utc)
}

pub fn ctx() -> CommandContext {
    CommandContext::new(Uuid::now_v7(), fixed_timestamp()).with_user("planner")
}

/// Catalog ids used across the suite
#[derive(Debug, Clone)]
pub struct Specs {
    pub catalog: Arc<SpecificationCatalog>,
    /// Ø40 tube used for the outer jacket and inner tubes
    pub tube: SpecificationId,
    /// Multi conduit: 1 outer + 5 inner tubes
    pub conduit: SpecificationId,
    /// Same layout as `conduit`, but fixed
    pub fixed_conduit: SpecificationId,
    /// Cable: jacket + 2 fiber bundles
    pub cable: SpecificationId,
    /// Outer jacket, one tube, one micro duct inside the tube
    pub tiered_conduit: SpecificationId,
    pub container: SpecificationId,
    pub rack: SpecificationId,
    /// Splice closure: one splice tray of 4 Bi terminals, not rack mounted
    pub splice_closure: SpecificationId,
    pub splice_tray: SpecificationId,
    /// 1U patch panel with one structure of 4 Bi ports
    pub patch_panel: SpecificationId,
    /// 1x4 splitter shelf
    pub splitter: SpecificationId,
}

fn tube(name: &str) -> SpanStructureSpecification {
    SpanStructureSpecification {
        id: SpecificationId::new(),
        category: "conduit".into(),
        name: name.into(),
        color: Some("orange".into()),
        inner_diameter: Some(33),
        outer_diameter: Some(40),
    }
}

fn terminals(prefix: &str, count: usize, direction: TerminalDirection) -> Vec<TerminalTemplate> {
    (1..=count)
        .map(|i| TerminalTemplate {
            name: format!("{prefix}{i}"),
            direction,
            is_pigtail: false,
            is_splice: direction == TerminalDirection::Bi,
        })
        .collect()
}

pub fn specs() -> Specs {
    let mut catalog = SpecificationCatalog::new();

    let tube_spec = tube("Ø40");
    let bundle_spec = tube("12 fiber bundle");
    catalog.add_span_structure(tube_spec.clone()).expect("tube");
    catalog.add_span_structure(bundle_spec.clone()).expect("bundle");

    let five_way = (1..=5).fold(SpanStructureTemplate::new(tube_spec.id, 1, 1), |root, position| {
        root.with_child(SpanStructureTemplate::new(tube_spec.id, 2, position))
    });
    let conduit = SpanEquipmentSpecification {
        id: SpecificationId::new(),
        category: "conduit".into(),
        name: "Ø110 5x40".into(),
        fixed: false,
        is_cable: false,
        root_template: five_way.clone(),
    };
    let fixed_conduit = SpanEquipmentSpecification {
        id: SpecificationId::new(),
        name: "Ø110 5x40 fixed".into(),
        fixed: true,
        ..conduit.clone()
    };
    let cable = SpanEquipmentSpecification {
        id: SpecificationId::new(),
        category: "fiber cable".into(),
        name: "24 fiber".into(),
        fixed: true,
        is_cable: true,
        root_template: SpanStructureTemplate::new(tube_spec.id, 1, 1)
            .with_child(SpanStructureTemplate::new(bundle_spec.id, 2, 1))
            .with_child(SpanStructureTemplate::new(bundle_spec.id, 2, 2)),
    };
    catalog.add_span_equipment(conduit.clone()).expect("conduit");
    catalog.add_span_equipment(fixed_conduit.clone()).expect("fixed conduit");
    catalog.add_span_equipment(cable.clone()).expect("cable");
    let tiered_conduit = SpanEquipmentSpecification {
        id: SpecificationId::new(),
        category: "conduit".into(),
        name: "Ø110 tube in tube".into(),
        fixed: false,
        is_cable: false,
        root_template: SpanStructureTemplate::new(tube_spec.id, 1, 1).with_child(
            SpanStructureTemplate::new(tube_spec.id, 2, 1).with_child(SpanStructureTemplate::new(tube_spec.id, 3, 1)),
        ),
    };
    catalog.add_span_equipment(tiered_conduit.clone()).expect("tiered conduit");

    let container = NodeContainerSpecification {
        id: SpecificationId::new(),
        category: "well".into(),
        name: "Manhole".into(),
    };
    let rack = RackSpecification {
        id: SpecificationId::new(),
        name: "19\" rack".into(),
    };
    catalog.add_node_container(container.clone()).expect("container");
    catalog.add_rack(rack.clone()).expect("rack");

    let splice_tray = TerminalStructureSpecification {
        id: SpecificationId::new(),
        category: "splice".into(),
        name: "Tray 4".into(),
        kind: TerminalStructureKind::Splice,
        terminal_templates: terminals("s", 4, TerminalDirection::Bi),
    };
    let patch_ports = TerminalStructureSpecification {
        id: SpecificationId::new(),
        category: "patch".into(),
        name: "4 port".into(),
        kind: TerminalStructureKind::Patch,
        terminal_templates: terminals("p", 4, TerminalDirection::Bi),
    };
    let mut splitter_terminals = terminals("in", 1, TerminalDirection::In);
    splitter_terminals.extend(terminals("out", 4, TerminalDirection::Out));
    let splitter_structure = TerminalStructureSpecification {
        id: SpecificationId::new(),
        category: "splitter".into(),
        name: "1x4".into(),
        kind: TerminalStructureKind::Splitter,
        terminal_templates: splitter_terminals,
    };
    catalog.add_terminal_structure(splice_tray.clone()).expect("tray");
    catalog.add_terminal_structure(patch_ports.clone()).expect("ports");
    catalog.add_terminal_structure(splitter_structure.clone()).expect("splitter");

    let splice_closure = TerminalEquipmentSpecification {
        id: SpecificationId::new(),
        category: "closure".into(),
        name: "Splice closure".into(),
        is_rack_equipment: false,
        height_in_rack_units: 0,
        structure_templates: vec![TerminalStructureTemplate {
            terminal_structure_specification_id: splice_tray.id,
            position: 1,
        }],
    };
    let patch_panel = TerminalEquipmentSpecification {
        id: SpecificationId::new(),
        category: "panel".into(),
        name: "Patch panel 1U".into(),
        is_rack_equipment: true,
        height_in_rack_units: 1,
        structure_templates: vec![TerminalStructureTemplate {
            terminal_structure_specification_id: patch_ports.id,
            position: 1,
        }],
    };
    let splitter = TerminalEquipmentSpecification {
        id: SpecificationId::new(),
        category: "splitter".into(),
        name: "Splitter shelf".into(),
        is_rack_equipment: false,
        height_in_rack_units: 0,
        structure_templates: vec![TerminalStructureTemplate {
            terminal_structure_specification_id: splitter_structure.id,
            position: 1,
        }],
    };
    catalog.add_terminal_equipment(splice_closure.clone()).expect("closure");
    catalog.add_terminal_equipment(patch_panel.clone()).expect("panel");
    catalog.add_terminal_equipment(splitter.clone()).expect("splitter");

    Specs {
        catalog: Arc::new(catalog),
        tube: tube_spec.id,
        conduit: conduit.id,
        fixed_conduit: fixed_conduit.id,
        cable: cable.id,
        tiered_conduit: tiered_conduit.id,
        container: container.id,
        rack: rack.id,
        splice_closure: splice_closure.id,
        splice_tray: splice_tray.id,
        patch_panel: patch_panel.id,
        splitter: splitter.id,
    }
}

/// Straight run of route nodes `n[0] ─ n[1] ─ … ─ n[k]`
#[derive(Debug, Clone)]
pub struct RouteLine {
    pub nodes: Vec<RouteNodeId>,
    pub segments: Vec<RouteSegmentId>,
}

impl RouteLine {
    /// Ids only; for handler-level tests that never ask a route network
    pub fn detached(node_count: usize) -> Self {
        Self {
            nodes: (0..node_count).map(|_| RouteNodeId::new()).collect(),
            segments: (1..node_count).map(|_| RouteSegmentId::new()).collect(),
        }
    }

    /// Registered in the route network, every segment 100 m
    pub async fn registered(network: &InMemoryRouteNetwork, node_count: usize) -> Self {
        let mut nodes = Vec::with_capacity(node_count);
        for _ in 0..node_count {
            nodes.push(network.add_node().await);
        }
        let mut segments = Vec::with_capacity(node_count - 1);
        for pair in nodes.windows(2) {
            segments.push(network.add_segment(pair[0], pair[1], 100.0).await);
        }
        Self { nodes, segments }
    }

    pub fn node(&self, i: usize) -> RouteNodeId {
        self.nodes[i]
    }

    /// Walk from node `from` to node `to`; reversed when `from > to`
    pub fn walk(&self, from: usize, to: usize) -> ValidatedWalk {
        ValidatedWalk::new(self.nodes.clone(), self.segments.clone())
            .and_then(|full| full.sub_walk(from, to))
            .expect("walk on route line")
    }

    pub fn segment_ids(&self, from: usize, to: usize) -> Vec<RouteSegmentId> {
        self.walk(from, to).segment_ids().to_vec()
    }
}

/// One-segment walk leaving `from` for a fresh node
pub fn spur(from: RouteNodeId) -> ValidatedWalk {
    ValidatedWalk::new(vec![from, RouteNodeId::new()], vec![RouteSegmentId::new()]).expect("spur")
}

/// Synchronous command harness over the pure handlers
pub struct World {
    pub specs: Specs,
    pub topology: Topology,
}

impl World {
    pub fn new() -> Self {
        Self {
            specs: specs(),
            topology: Topology::new(),
        }
    }

    pub fn try_execute(
        &mut self,
        command: TopologyCommand,
        resolution: Resolution,
    ) -> Result<Vec<TopologyEvent>, CommandError> {
        let events = handle_command(&self.topology, &self.specs.catalog, &command, resolution)?;
        let version = self.topology.version() + 1;
        self.topology.apply(version, &events);
        Ok(events)
    }

    pub fn try_run(&mut self, command: TopologyCommand) -> Result<Vec<TopologyEvent>, CommandError> {
        self.try_execute(command, Resolution::None)
    }

    pub fn run(&mut self, command: TopologyCommand) -> Vec<TopologyEvent> {
        self.try_run(command).expect("command rejected")
    }

    pub fn try_place(
        &mut self,
        span_equipment_id: SpanEquipmentId,
        specification_id: SpecificationId,
        walk: ValidatedWalk,
    ) -> Result<Vec<TopologyEvent>, CommandError> {
        let command = TopologyCommand::PlaceSpanEquipmentInRouteNetwork(PlaceSpanEquipmentInRouteNetwork {
            context: ctx(),
            span_equipment_id,
            specification_id,
            route_segment_ids: walk.segment_ids().to_vec(),
            name: Some("K".into()),
        });
        self.try_execute(
            command,
            Resolution::Walk(ResolvedWalk {
                walk_of_interest_id: WalkOfInterestId::new(),
                walk,
            }),
        )
    }

    pub fn place(&mut self, specification_id: SpecificationId, walk: ValidatedWalk) -> SpanEquipmentId {
        let id = SpanEquipmentId::new();
        self.try_place(id, specification_id, walk).expect("placement rejected");
        id
    }

    pub fn place_conduit(&mut self, walk: ValidatedWalk) -> SpanEquipmentId {
        self.place(self.specs.conduit, walk)
    }

    pub fn try_move(
        &mut self,
        span_equipment_id: SpanEquipmentId,
        walk: ValidatedWalk,
    ) -> Result<Vec<TopologyEvent>, CommandError> {
        let walk_of_interest_id = self
            .topology
            .span_equipment(span_equipment_id)
            .map(|e| e.walk_of_interest_id)
            .unwrap_or_default();
        let command = TopologyCommand::MoveSpanEquipment(MoveSpanEquipment {
            context: ctx(),
            span_equipment_id,
            route_segment_ids: walk.segment_ids().to_vec(),
        });
        self.try_execute(
            command,
            Resolution::Walk(ResolvedWalk {
                walk_of_interest_id,
                walk,
            }),
        )
    }

    /// Route a cable through the given hops
    pub fn try_place_cable_through(
        &mut self,
        hops: Vec<ResolvedHop>,
    ) -> Result<(SpanEquipmentId, Vec<TopologyEvent>), CommandError> {
        let id = SpanEquipmentId::new();
        // requested hops are informational once resolved
        let command = TopologyCommand::PlaceSpanEquipmentInUtilityNetwork(PlaceSpanEquipmentInUtilityNetwork {
            context: ctx(),
            span_equipment_id: id,
            specification_id: self.specs.cable,
            hops: hops
                .iter()
                .map(|hop| match hop {
                    ResolvedHop::RouteNetworkWalk(walk) => RoutingHop::RouteNetworkWalk {
                        segment_ids: walk.segment_ids().to_vec(),
                    },
                    ResolvedHop::ThroughSpanSegments {
                        start_node_id,
                        span_segment_ids,
                    } => RoutingHop::ThroughSpanSegments {
                        start_node_id: *start_node_id,
                        span_segment_ids: span_segment_ids.clone(),
                    },
                })
                .collect(),
            name: Some("cable".into()),
        });
        let events = self.try_execute(
            command,
            Resolution::Hops {
                walk_of_interest_id: WalkOfInterestId::new(),
                hops,
            },
        )?;
        Ok((id, events))
    }

    pub fn place_container(&mut self, route_node_id: RouteNodeId) -> NodeContainerId {
        let id = NodeContainerId::new();
        self.run(TopologyCommand::PlaceNodeContainerInRouteNetwork(
            PlaceNodeContainerInRouteNetwork {
                context: ctx(),
                node_container_id: id,
                specification_id: self.specs.container,
                route_node_id,
            },
        ));
        id
    }

    /// Place one terminal equipment directly in the container
    pub fn place_terminal_equipment(
        &mut self,
        node_container_id: NodeContainerId,
        specification_id: SpecificationId,
    ) -> TerminalEquipmentId {
        let before = self.container_equipment(node_container_id);
        self.run(TopologyCommand::PlaceTerminalEquipmentInNodeContainer(
            PlaceTerminalEquipmentInNodeContainer {
                context: ctx(),
                node_container_id,
                specification_id,
                number_of_equipments: 1,
                name_prefix: Some("TE-".into()),
                start_sequence_number: 1,
                subrack_placement: None,
            },
        ));
        self.container_equipment(node_container_id)
            .into_iter()
            .find(|id| !before.contains(id))
            .expect("placed terminal equipment")
    }

    fn container_equipment(&self, node_container_id: NodeContainerId) -> Vec<TerminalEquipmentId> {
        self.topology
            .node_container(node_container_id)
            .map(|c| c.all_terminal_equipment_ids())
            .unwrap_or_default()
    }

    pub fn try_cut(
        &mut self,
        route_node_id: RouteNodeId,
        span_segment_ids: Vec<SpanSegmentId>,
    ) -> Result<Vec<TopologyEvent>, CommandError> {
        self.try_run(TopologyCommand::CutSpanSegmentsAtRouteNode(CutSpanSegmentsAtRouteNode {
            context: ctx(),
            route_node_id,
            span_segment_ids,
        }))
    }

    pub fn try_connect(
        &mut self,
        route_node_id: RouteNodeId,
        pairs: Vec<ConnectionPair>,
    ) -> Result<Vec<TopologyEvent>, CommandError> {
        self.try_run(TopologyCommand::ConnectSpanSegmentsAtRouteNode(ConnectSpanSegmentsAtRouteNode {
            context: ctx(),
            route_node_id,
            pairs,
        }))
    }

    pub fn equipment(&self, id: SpanEquipmentId) -> &SpanEquipment {
        self.topology.span_equipment(id).expect("live span equipment")
    }

    pub fn terminal_equipment(&self, id: TerminalEquipmentId) -> &TerminalEquipment {
        self.topology.terminal_equipment(id).expect("live terminal equipment")
    }

    /// Segments of a live structure, in node-of-interest order
    pub fn segments(&self, id: SpanEquipmentId, structure_index: usize) -> Vec<SpanSegmentId> {
        self.equipment(id).span_structures[structure_index]
            .span_segments
            .iter()
            .map(|s| s.id)
            .collect()
    }

    /// The only segment of a structure that has not been cut
    pub fn single_segment(&self, id: SpanEquipmentId, structure_index: usize) -> SpanSegmentId {
        let segments = self.segments(id, structure_index);
        assert_eq!(segments.len(), 1, "structure {structure_index} is cut");
        segments[0]
    }

    /// Terminal ids of the first structure of a terminal equipment
    pub fn terminals(&self, id: TerminalEquipmentId) -> Vec<TerminalId> {
        self.terminal_equipment(id)
            .live_structures()
            .next()
            .map(|s| s.terminals.iter().map(|t| t.id).collect())
            .unwrap_or_default()
    }

    pub fn version(&self) -> u64 {
        self.topology.version()
    }
}

/// Service wired to in-memory collaborators
pub struct Harness {
    pub specs: Specs,
    pub route_network: Arc<InMemoryRouteNetwork>,
    pub event_store: Arc<InMemoryEventStore>,
    pub notifier: Arc<InMemoryChangeNotifier>,
    pub service: TopologyService,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(TopologyConfig::default())
    }

    pub fn with_config(config: TopologyConfig) -> Self {
        let specs = specs();
        let route_network = Arc::new(InMemoryRouteNetwork::new());
        let event_store = Arc::new(InMemoryEventStore::new());
        let notifier = Arc::new(InMemoryChangeNotifier::new());
        let service = TopologyService::new(
            config,
            specs.catalog.clone(),
            route_network.clone(),
            event_store.clone(),
            notifier.clone(),
        );
        Self {
            specs,
            route_network,
            event_store,
            notifier,
            service,
        }
    }
}
