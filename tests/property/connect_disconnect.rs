// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Connecting and Disconnecting Segments
//!
//! Disconnecting the pairs a command connected restores every segment end,
//! while traces pinned to the connected version still see the junctions.

use proptest::prelude::*;

use crate::fixtures::*;
use utility_network_topology::aggregate::{ConnectionPair, DisconnectSpanSegmentsAtRouteNode, TopologyCommand};
use utility_network_topology::trace::{simple_trace, TraceStart};

fn inner_structures() -> impl Strategy<Value = Vec<usize>> {
    prop::sample::subsequence((1usize..6).collect::<Vec<_>>(), 1..=5)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Property: disconnect is the inverse of connect
    #[test]
    fn prop_disconnect_restores_open_ends(structures in inner_structures(), reverse_pairs in any::<bool>()) {
        // Arrange: K1 A─C and K2 C─E
        let mut world = World::new();
        let line = RouteLine::detached(5);
        let k1 = world.place_conduit(line.walk(0, 2));
        let k2 = world.place_conduit(line.walk(2, 4));
        let c = line.node(2);
        let pairs: Vec<ConnectionPair> = structures
            .iter()
            .map(|s| {
                let (a, b) = (world.single_segment(k1, *s), world.single_segment(k2, *s));
                if reverse_pairs { ConnectionPair::segments(b, a) } else { ConnectionPair::segments(a, b) }
            })
            .collect();

        // Act
        world.try_connect(c, pairs.clone()).expect("connect");
        let connected_at = world.version();
        world.run(TopologyCommand::DisconnectSpanSegmentsAtRouteNode(DisconnectSpanSegmentsAtRouteNode {
            context: ctx(),
            route_node_id: c,
            pairs,
        }));

        // Assert
        let graph = world.topology.graph();
        for s in &structures {
            let segment = world.single_segment(k1, *s);
            let before = simple_trace(graph, TraceStart::Segment(segment), connected_at).expect("trace");
            let after = simple_trace(graph, TraceStart::Segment(segment), world.version()).expect("trace");
            prop_assert_eq!(before.chain().len(), 2);
            prop_assert_eq!(after.chain().len(), 1);
        }
        for id in [k1, k2] {
            prop_assert!(!world.equipment(id).has_connected_segments());
        }
    }
}
