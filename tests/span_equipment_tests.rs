// Copyright (c) 2025 - Cowboy AI, Inc.
//! Integration tests for span equipment placement, cut and structural edits
//!
//! Commands are decided by the pure handlers and folded into the projection
//! the same way the service commits them.

mod fixtures;

use fixtures::*;
use pretty_assertions::assert_eq;
use test_case::test_case;

use utility_network_topology::aggregate::{
    AddAdditionalInnerSpanStructures, AffixSpanEquipmentToNodeContainer, CommandError, ConnectionPair,
    DetachSpanEquipmentFromNodeContainer, DisconnectSpanSegmentsAtRouteNode, RemoveSpanEquipment,
    RemoveSpanStructure, TopologyCommand, UpdateSpanEquipmentName,
};
use utility_network_topology::domain::{NodeContainerSide, SpanEquipmentId, SpanSegmentId, SpecificationId};
use utility_network_topology::events::{SpanEquipmentEvent, TopologyEvent};
use utility_network_topology::projection::GraphElement;
use utility_network_topology::trace::{simple_trace, TraceStart};

// A ── B ── C ── D ── E
const A: usize = 0;
const C: usize = 2;
const D: usize = 3;
const E: usize = 4;

fn line() -> RouteLine {
    RouteLine::detached(5)
}

fn cut_event(events: &[TopologyEvent]) -> &utility_network_topology::events::SpanSegmentsCut {
    events
        .iter()
        .find_map(|e| match e {
            TopologyEvent::SpanEquipment(SpanEquipmentEvent::SpanSegmentsCut(cut)) => Some(cut),
            _ => None,
        })
        .expect("cut event")
}

#[test]
fn test_placement_creates_one_segment_per_structure() {
    // Arrange
    let mut world = World::new();
    let line = line();

    // Act
    let id = world.place_conduit(line.walk(A, E));

    // Assert
    let equipment = world.equipment(id);
    assert_eq!(equipment.span_structures.len(), 6);
    assert_eq!(equipment.node_of_interest_ids, vec![line.node(A), line.node(E)]);
    for structure in &equipment.span_structures {
        assert_eq!(structure.span_segments.len(), 1);
        assert_eq!(structure.span_segments[0].from_node_of_interest_index, 0);
        assert_eq!(structure.span_segments[0].to_node_of_interest_index, 1);
    }
    assert!(equipment.span_structures[0].is_outer());
    assert_eq!(world.version(), 1);
}

#[test]
fn test_placement_rejects_reused_id() {
    let mut world = World::new();
    let line = line();
    let id = world.place_conduit(line.walk(A, C));

    let result = world.try_place(id, world.specs.conduit, line.walk(C, E));

    assert_eq!(result, Err(CommandError::IdAlreadyInUse(id.as_uuid())));
}

#[test]
fn test_placement_rejects_unknown_specification() {
    let mut world = World::new();
    let unknown = SpecificationId::new();

    let result = world.try_place(SpanEquipmentId::new(), unknown, line().walk(A, E));

    assert_eq!(result, Err(CommandError::SpecificationNotFound(unknown)));
}

/// Cut an inner tube mid-span, connect one half to a second conduit, trace
/// across the junction and disconnect again
#[test]
fn test_cut_connect_trace_disconnect_scenario() {
    // Arrange
    let mut world = World::new();
    let line = line();
    let k1 = world.place_conduit(line.walk(A, E));
    let k2 = world.place_conduit(spur(line.node(C)));
    let inner5 = world.single_segment(k1, 5);

    // Act: cut inner tube 5 at C
    let events = world.try_cut(line.node(C), vec![inner5]).expect("cut");

    // Assert
    assert_eq!(events.len(), 1);
    let cut = cut_event(&events);
    assert_eq!(cut.node_of_interest_index, 1);
    assert!(cut.node_of_interest_inserted);
    assert_eq!(cut.cuts.len(), 1);
    assert_eq!(cut.cuts[0].old_span_segment_id, inner5);

    let equipment = world.equipment(k1);
    assert_eq!(
        equipment.node_of_interest_ids,
        vec![line.node(A), line.node(C), line.node(E)]
    );
    assert!(equipment.segments_partition_range());
    let halves = world.segments(k1, 5);
    assert_eq!(halves, cut.cuts[0].new_span_segment_ids.to_vec());
    // uncut structures now span both node-of-interest intervals
    assert_eq!(world.equipment(k1).span_structures[1].span_segments[0].to_node_of_interest_index, 2);

    // Act: connect the A..C half to inner tube 4 of the spur conduit
    let k2_inner4 = world.single_segment(k2, 4);
    let events = world
        .try_connect(line.node(C), vec![ConnectionPair::segments(halves[0], k2_inner4)])
        .expect("connect");
    assert_eq!(events.len(), 2);

    // Assert: trace runs across the virtual junction
    let trace = simple_trace(
        world.topology.graph(),
        TraceStart::Segment(halves[0]),
        world.version(),
    )
    .expect("trace");
    assert_eq!(
        trace.chain(),
        vec![
            GraphElement::SegmentRef {
                span_equipment_id: k1,
                span_segment_id: halves[0],
            },
            GraphElement::SegmentRef {
                span_equipment_id: k2,
                span_segment_id: k2_inner4,
            },
        ]
    );

    // Connected equipment cannot be removed
    let result = world.try_run(TopologyCommand::RemoveSpanEquipment(RemoveSpanEquipment {
        context: ctx(),
        span_equipment_id: k1,
    }));
    assert_eq!(result, Err(CommandError::CannotRemoveEquipmentWithConnectedSegments(k1)));

    // Cutting at an equipment end is rejected
    let outer = world.single_segment(k1, 0);
    assert_eq!(
        world.try_cut(line.node(A), vec![outer]),
        Err(CommandError::CannotCutAtEquipmentEnd(outer))
    );

    // Act: disconnect
    world.run(TopologyCommand::DisconnectSpanSegmentsAtRouteNode(
        DisconnectSpanSegmentsAtRouteNode {
            context: ctx(),
            route_node_id: line.node(C),
            pairs: vec![ConnectionPair::segments(halves[0], k2_inner4)],
        },
    ));

    // Assert
    let trace = simple_trace(
        world.topology.graph(),
        TraceStart::Segment(halves[0]),
        world.version(),
    )
    .expect("trace");
    assert_eq!(trace.chain().len(), 1);
    assert!(!world.equipment(k1).has_connected_segments());
}

#[test]
fn test_disconnect_of_unconnected_pair_is_rejected() {
    let mut world = World::new();
    let line = line();
    let k1 = world.place_conduit(line.walk(A, C));
    let k2 = world.place_conduit(line.walk(C, E));
    let a = world.single_segment(k1, 1);
    let b = world.single_segment(k2, 1);

    let result = world.try_run(TopologyCommand::DisconnectSpanSegmentsAtRouteNode(
        DisconnectSpanSegmentsAtRouteNode {
            context: ctx(),
            route_node_id: line.node(C),
            pairs: vec![ConnectionPair::segments(a, b)],
        },
    ));

    assert_eq!(
        result,
        Err(CommandError::SegmentsNotConnected {
            a: a.as_uuid(),
            b: b.as_uuid()
        })
    );
}

#[test]
fn test_cut_twice_at_same_node_is_rejected() {
    let mut world = World::new();
    let line = line();
    let k1 = world.place_conduit(line.walk(A, E));
    let inner1 = world.single_segment(k1, 1);
    world.try_cut(line.node(C), vec![inner1]).expect("first cut");

    let halves = world.segments(k1, 1);
    let result = world.try_cut(line.node(C), vec![halves[0]]);

    assert_eq!(result, Err(CommandError::SegmentAlreadyCut(halves[0])));
}

#[test]
fn test_cut_outside_segment_range_is_rejected() {
    let mut world = World::new();
    let line = line();
    let k1 = world.place_conduit(line.walk(A, E));
    let inner1 = world.single_segment(k1, 1);
    world.try_cut(line.node(C), vec![inner1]).expect("cut at C");
    let a_to_c = world.segments(k1, 1)[0];

    let result = world.try_cut(line.node(D), vec![a_to_c]);

    assert_eq!(
        result,
        Err(CommandError::SegmentNotRelatedToRouteNode {
            segment: a_to_c,
            route_node: line.node(D),
        })
    );
}

#[test]
fn test_cut_groups_segments_per_equipment() {
    let mut world = World::new();
    let line = line();
    let k1 = world.place_conduit(line.walk(A, E));
    let k2 = world.place_conduit(line.walk(A, E));
    let segments = vec![
        world.single_segment(k1, 1),
        world.single_segment(k1, 2),
        world.single_segment(k2, 3),
    ];

    let events = world.try_cut(line.node(C), segments).expect("cut");

    assert_eq!(events.len(), 2);
    assert_eq!(cut_event(&events).cuts.len(), 2);
    assert_eq!(world.segments(k1, 1).len(), 2);
    assert_eq!(world.segments(k1, 2).len(), 2);
    assert_eq!(world.segments(k1, 3).len(), 1);
    assert_eq!(world.segments(k2, 3).len(), 2);
    assert_eq!(world.version(), 3);
}

#[test]
fn test_add_inner_structures_appends_after_last_position() {
    let mut world = World::new();
    let line = line();
    let k1 = world.place_conduit(line.walk(A, E));
    let tube = world.specs.tube;

    world.run(TopologyCommand::AddAdditionalInnerSpanStructures(
        AddAdditionalInnerSpanStructures {
            context: ctx(),
            span_equipment_id: k1,
            span_structure_specification_ids: vec![tube, tube],
        },
    ));

    let equipment = world.equipment(k1);
    let positions: Vec<u16> = equipment
        .live_structures()
        .filter(|(_, s)| s.level == 2)
        .map(|(_, s)| s.position)
        .collect();
    assert_eq!(positions, vec![1, 2, 3, 4, 5, 6, 7]);
    assert!(equipment.segments_partition_range());
}

#[test]
fn test_add_inner_structures_to_fixed_equipment_is_rejected() {
    let mut world = World::new();
    let fixed = world.place(world.specs.fixed_conduit, line().walk(A, E));

    let result = world.try_run(TopologyCommand::AddAdditionalInnerSpanStructures(
        AddAdditionalInnerSpanStructures {
            context: ctx(),
            span_equipment_id: fixed,
            span_structure_specification_ids: vec![world.specs.tube],
        },
    ));

    assert_eq!(result, Err(CommandError::CannotAddToFixedSpanEquipment(fixed)));
}

#[test]
fn test_remove_span_structure() {
    // Arrange
    let mut world = World::new();
    let line = line();
    let k1 = world.place_conduit(line.walk(A, C));
    let k2 = world.place_conduit(line.walk(C, E));
    let inner2 = world.equipment(k1).span_structures[2].id;
    let inner3 = world.equipment(k1).span_structures[3].id;
    world
        .try_connect(
            line.node(C),
            vec![ConnectionPair::segments(
                world.single_segment(k1, 3),
                world.single_segment(k2, 3),
            )],
        )
        .expect("connect");

    // Act
    world.run(TopologyCommand::RemoveSpanStructure(RemoveSpanStructure {
        context: ctx(),
        span_equipment_id: k1,
        span_structure_id: inner2,
    }));
    let connected = world.try_run(TopologyCommand::RemoveSpanStructure(RemoveSpanStructure {
        context: ctx(),
        span_equipment_id: k1,
        span_structure_id: inner3,
    }));

    // Assert
    assert_eq!(world.equipment(k1).live_structures().count(), 5);
    assert_eq!(connected, Err(CommandError::CannotRemoveConnectedStructure(inner3)));
}

#[test]
fn test_remove_outer_structure_removes_equipment() {
    let mut world = World::new();
    let k1 = world.place_conduit(line().walk(A, E));
    let outer = world.equipment(k1).span_structures[0].id;

    let events = world.run(TopologyCommand::RemoveSpanStructure(RemoveSpanStructure {
        context: ctx(),
        span_equipment_id: k1,
        span_structure_id: outer,
    }));

    assert!(matches!(
        events.as_slice(),
        [TopologyEvent::SpanEquipment(SpanEquipmentEvent::SpanEquipmentRemoved(_))]
    ));
    assert!(world.topology.span_equipment(k1).is_none());
    assert!(world
        .topology
        .span_equipment_including_deleted(k1)
        .is_some_and(|e| e.deleted));
}

#[test]
fn test_update_name() {
    let mut world = World::new();
    let k1 = world.place_conduit(line().walk(A, E));

    world.run(TopologyCommand::UpdateSpanEquipmentName(UpdateSpanEquipmentName {
        context: ctx(),
        span_equipment_id: k1,
        name: Some("K-101".into()),
    }));

    assert_eq!(world.equipment(k1).name.as_deref(), Some("K-101"));
}

fn affix(span_equipment_id: SpanEquipmentId, node_container_id: utility_network_topology::domain::NodeContainerId) -> TopologyCommand {
    TopologyCommand::AffixSpanEquipmentToNodeContainer(AffixSpanEquipmentToNodeContainer {
        context: ctx(),
        span_equipment_id,
        node_container_id,
        ingoing_side: NodeContainerSide::West,
    })
}

#[test]
fn test_affix_to_node_container() {
    // Arrange
    let mut world = World::new();
    let line = line();
    let k1 = world.place_conduit(line.walk(A, E));
    let at_c = world.place_container(line.node(C));
    let elsewhere = world.place_container(spur(line.node(E)).last_node());

    // Act
    world.run(affix(k1, at_c));

    // Assert
    let equipment = world.equipment(k1);
    assert_eq!(equipment.node_container_affixes.len(), 1);
    assert_eq!(equipment.node_container_affixes[0].route_node_id, line.node(C));
    assert_eq!(
        world.try_run(affix(k1, at_c)),
        Err(CommandError::AlreadyAffixed {
            span_equipment_id: k1,
            route_node: line.node(C),
        })
    );
    let elsewhere_node = world.topology.node_container(elsewhere).expect("container").route_node_id;
    assert_eq!(
        world.try_run(affix(k1, elsewhere)),
        Err(CommandError::NodeContainerNotOnWalk(elsewhere_node))
    );
    assert_eq!(
        world.try_run(TopologyCommand::RemoveSpanEquipment(RemoveSpanEquipment {
            context: ctx(),
            span_equipment_id: k1,
        })),
        Err(CommandError::CannotRemoveAffixedEquipment(k1))
    );
}

#[test]
fn test_detach_is_rejected_while_cut_inside_container() {
    // Arrange
    let mut world = World::new();
    let line = line();
    let k1 = world.place_conduit(line.walk(A, E));
    let at_c = world.place_container(line.node(C));
    world.run(affix(k1, at_c));
    let detach = || {
        TopologyCommand::DetachSpanEquipmentFromNodeContainer(DetachSpanEquipmentFromNodeContainer {
            context: ctx(),
            span_equipment_id: k1,
            node_container_id: at_c,
        })
    };

    // Act
    world.try_cut(line.node(C), vec![world.single_segment(k1, 1)]).expect("cut");
    let result = world.try_run(detach());

    // Assert
    assert_eq!(result, Err(CommandError::SegmentCutInsideContainer(k1)));
}

#[test]
fn test_detach_from_node_container() {
    let mut world = World::new();
    let line = line();
    let k1 = world.place_conduit(line.walk(A, E));
    let at_c = world.place_container(line.node(C));
    world.run(affix(k1, at_c));

    world.run(TopologyCommand::DetachSpanEquipmentFromNodeContainer(
        DetachSpanEquipmentFromNodeContainer {
            context: ctx(),
            span_equipment_id: k1,
            node_container_id: at_c,
        },
    ));

    assert!(world.equipment(k1).node_container_affixes.is_empty());
    assert!(world.topology.affixed_to_container(at_c).is_empty());
}

/// Commands that must be rejected before anything is folded
#[derive(Debug, Clone, Copy)]
enum Rejected {
    UnknownSegment,
    MergeAwayFromEquipmentEnd,
    DisconnectFromItself,
    RemoveFromFixedEquipment,
    DetachWhileConnectedInside,
}

fn provoke(world: &mut World, rejected: Rejected) -> CommandError {
    let line = line();
    let result = match rejected {
        Rejected::UnknownSegment => world.try_cut(line.node(C), vec![SpanSegmentId::new()]),
        Rejected::MergeAwayFromEquipmentEnd => {
            let k1 = world.place_conduit(line.walk(A, C));
            let k2 = world.place_conduit(line.walk(A, E));
            world.try_cut(line.node(C), vec![world.single_segment(k2, 0)]).expect("cut");
            let k2_outer = world.segments(k2, 0)[0];
            world.try_connect(
                line.node(C),
                vec![ConnectionPair::segments(world.single_segment(k1, 0), k2_outer)],
            )
        }
        Rejected::DisconnectFromItself => {
            let k1 = world.place_conduit(line.walk(A, C));
            let inner = world.single_segment(k1, 1);
            world.try_run(TopologyCommand::DisconnectSpanSegmentsAtRouteNode(
                DisconnectSpanSegmentsAtRouteNode {
                    context: ctx(),
                    route_node_id: line.node(C),
                    pairs: vec![ConnectionPair::segments(inner, inner)],
                },
            ))
        }
        Rejected::RemoveFromFixedEquipment => {
            let fixed = world.place(world.specs.fixed_conduit, line.walk(A, E));
            let inner = world.equipment(fixed).span_structures[1].id;
            world.try_run(TopologyCommand::RemoveSpanStructure(RemoveSpanStructure {
                context: ctx(),
                span_equipment_id: fixed,
                span_structure_id: inner,
            }))
        }
        Rejected::DetachWhileConnectedInside => {
            let container = world.place_container(line.node(C));
            let closure = world.place_terminal_equipment(container, world.specs.splice_closure);
            let k1 = world.place_conduit(line.walk(A, C));
            world.run(affix(k1, container));
            let s1 = world.terminals(closure)[0];
            world
                .try_connect(
                    line.node(C),
                    vec![ConnectionPair::segment_to_terminal(world.single_segment(k1, 1), s1)],
                )
                .expect("splice");
            world.try_run(TopologyCommand::DetachSpanEquipmentFromNodeContainer(
                DetachSpanEquipmentFromNodeContainer {
                    context: ctx(),
                    span_equipment_id: k1,
                    node_container_id: container,
                },
            ))
        }
    };
    match result {
        Err(error) => error,
        Ok(events) => panic!("{rejected:?} was accepted with {events:?}"),
    }
}

#[test_case(Rejected::UnknownSegment, "SEGMENT_NOT_FOUND" ; "unknown segment")]
#[test_case(Rejected::MergeAwayFromEquipmentEnd, "ENDS_NOT_COLOCATED" ; "merge away from equipment end")]
#[test_case(Rejected::DisconnectFromItself, "CANNOT_DISCONNECT_FROM_ITSELF" ; "disconnect from itself")]
#[test_case(Rejected::RemoveFromFixedEquipment, "CANNOT_REMOVE_FROM_FIXED_SPAN_EQUIPMENT" ; "remove from fixed equipment")]
#[test_case(Rejected::DetachWhileConnectedInside, "SEGMENT_CONNECTED_INSIDE_CONTAINER" ; "detach while connected inside")]
fn test_rejected_commands_report_stable_codes(rejected: Rejected, code: &str) {
    let mut world = World::new();

    let error = provoke(&mut world, rejected);

    assert_eq!(error.code(), code);
    assert!(!error.is_retryable());
}
