// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Linear Trace Symmetry
//!
//! A chain of conduits joined by segment junctions, splices and patch links
//! traces to the same chain from whichever element the trace starts.

use proptest::prelude::*;
use std::collections::BTreeSet;

use crate::fixtures::*;
use utility_network_topology::aggregate::{ConnectTerminalsAtRouteNode, ConnectionPair, TopologyCommand};
use utility_network_topology::domain::TerminalId;
use utility_network_topology::projection::GraphElement;
use utility_network_topology::trace::{simple_trace, SimpleTrace, TraceStart};

/// How two consecutive conduits are joined
#[derive(Debug, Clone, Copy)]
enum Joint {
    /// Segment to segment through a virtual terminal
    Junction,
    /// Both segments on one splice terminal
    Splice,
    /// Each segment on its own closure, closures patched together
    Patch,
}

fn joint() -> impl Strategy<Value = Joint> {
    prop_oneof![Just(Joint::Junction), Just(Joint::Splice), Just(Joint::Patch)]
}

/// Build the chain and return its segment-junction terminals
fn build_chain(world: &mut World, line: &RouteLine, joints: &[Joint]) -> (TraceStart, Vec<TerminalId>) {
    let conduits: Vec<_> = (0..=joints.len())
        .map(|i| world.place_conduit(line.walk(i, i + 1)))
        .collect();
    let segments: Vec<_> = conduits.iter().map(|k| world.single_segment(*k, 1)).collect();
    let mut junctions = Vec::new();

    for (i, joint) in joints.iter().enumerate() {
        let node = line.node(i + 1);
        let (left, right) = (segments[i], segments[i + 1]);
        match joint {
            Joint::Junction => {
                world
                    .try_connect(node, vec![ConnectionPair::segments(left, right)])
                    .expect("junction");
                let end = world
                    .equipment(conduits[i])
                    .segment(left)
                    .and_then(|segment| segment.to_terminal_id)
                    .expect("junction terminal");
                junctions.push(end);
            }
            Joint::Splice => {
                let container = world.place_container(node);
                let closure = world.place_terminal_equipment(container, world.specs.splice_closure);
                let s1 = world.terminals(closure)[0];
                world
                    .try_connect(
                        node,
                        vec![
                            ConnectionPair::segment_to_terminal(left, s1),
                            ConnectionPair::segment_to_terminal(right, s1),
                        ],
                    )
                    .expect("splice");
            }
            Joint::Patch => {
                let container = world.place_container(node);
                let a = world.place_terminal_equipment(container, world.specs.splice_closure);
                let b = world.place_terminal_equipment(container, world.specs.splice_closure);
                let (a1, b1) = (world.terminals(a)[0], world.terminals(b)[0]);
                world
                    .try_connect(
                        node,
                        vec![
                            ConnectionPair::segment_to_terminal(left, a1),
                            ConnectionPair::segment_to_terminal(right, b1),
                        ],
                    )
                    .expect("patch ends");
                world.run(TopologyCommand::ConnectTerminalsAtRouteNode(ConnectTerminalsAtRouteNode {
                    context: ctx(),
                    route_node_id: node,
                    from_terminal_id: a1,
                    to_terminal_id: b1,
                    fiber_coord_length: None,
                }));
            }
        }
    }

    (TraceStart::Segment(segments[0]), junctions)
}

fn is_junction(element: &GraphElement, junctions: &[TerminalId]) -> bool {
    matches!(element, GraphElement::TerminalRef { terminal_id, .. } if junctions.contains(terminal_id))
}

/// Reported chain without the start when the start is a segment junction
fn reported_chain(trace: &SimpleTrace, junctions: &[TerminalId]) -> Vec<GraphElement> {
    trace
        .chain()
        .into_iter()
        .filter(|e| !is_junction(e, junctions))
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// Property: every element of a chain traces to the same chain
    #[test]
    fn prop_trace_is_symmetric(joints in prop::collection::vec(joint(), 1..6)) {
        // Arrange
        let mut world = World::new();
        let line = RouteLine::detached(joints.len() + 2);
        let (first, junctions) = build_chain(&mut world, &line, &joints);
        let graph = world.topology.graph();
        let version = world.version();
        let reference = simple_trace(graph, first, version).expect("trace");
        let expected_chain = reference.chain();
        let expected_all: BTreeSet<GraphElement> = reference.all.clone();
        prop_assert!(expected_chain.iter().all(|e| !is_junction(e, &junctions)));

        let starts: Vec<TraceStart> = expected_chain
            .iter()
            .copied()
            .map(TraceStart::from)
            .chain(junctions.iter().copied().map(TraceStart::Terminal))
            .collect();

        for start in starts {
            // Act
            let trace = simple_trace(graph, start, version).expect("trace");

            // Assert
            let all: BTreeSet<GraphElement> =
                trace.all.iter().copied().filter(|e| !is_junction(e, &junctions)).collect();
            prop_assert_eq!(&all, &expected_all, "all differs from {:?}", start);
            let chain = reported_chain(&trace, &junctions);
            let reversed: Vec<GraphElement> = chain.iter().rev().copied().collect();
            prop_assert!(
                chain == expected_chain || reversed == expected_chain,
                "chain from {:?} is {:?}",
                start,
                chain
            );
        }
    }
}

