// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Cutting Span Segments
//!
//! Whatever cuts are made, every live structure keeps a gap-free, ordered
//! cover of the equipment's node-of-interest range, and a structure cut at
//! `k` distinct interior nodes has exactly `k + 1` segments.

use proptest::prelude::*;
use std::collections::{BTreeSet, HashMap};

use crate::fixtures::*;
use utility_network_topology::domain::{SpanEquipment, SpanSegmentId};
use utility_network_topology::events::{SpanEquipmentEvent, TopologyEvent};

/// Segment of the structure whose route passes through the walk position
/// without ending there
fn segment_through(equipment: &SpanEquipment, structure: usize, walk_position: usize) -> Option<SpanSegmentId> {
    let node = equipment.walk.node_ids()[walk_position];
    let (_, structure) = equipment.live_structures().nth(structure)?;
    structure
        .span_segments
        .iter()
        .find(|segment| {
            equipment
                .segment_walk(segment)
                .is_some_and(|walk| walk.contains_node(node) && !walk.is_end(node))
        })
        .map(|segment| segment.id)
}

/// Route length and a list of (structure, interior walk position) cuts
fn cut_plan() -> impl Strategy<Value = (usize, Vec<(usize, usize)>)> {
    (3usize..9).prop_flat_map(|nodes| {
        let cut = (0usize..6, 1..nodes - 1);
        (Just(nodes), prop::collection::vec(cut, 0..20))
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Property: cuts preserve the partition of every structure
    #[test]
    fn prop_cuts_preserve_partition((nodes, cuts) in cut_plan()) {
        let mut world = World::new();
        let line = RouteLine::detached(nodes);
        let conduit = world.place_conduit(line.walk(0, nodes - 1));
        let mut made: HashMap<usize, BTreeSet<usize>> = HashMap::new();

        for (structure, position) in cuts {
            let segment = segment_through(world.equipment(conduit), structure, position);
            match segment {
                Some(segment) => {
                    let result = world.try_cut(line.node(position), vec![segment]);
                    prop_assert!(result.is_ok(), "cut rejected: {:?}", result);
                    made.entry(structure).or_default().insert(position);
                }
                // already cut there
                None => prop_assert!(made.get(&structure).is_some_and(|p| p.contains(&position))),
            }
            prop_assert!(world.equipment(conduit).segments_partition_range());
        }

        for structure in 0..6 {
            let expected = made.get(&structure).map_or(0, |p| p.len()) + 1;
            prop_assert_eq!(world.segments(conduit, structure).len(), expected);
        }
    }

    /// Property: a cut replaces exactly the named segments with two halves
    /// meeting at the cut node
    #[test]
    fn prop_cut_halves_meet_at_cut_node(nodes in 3usize..9, structures in prop::sample::subsequence((0usize..6).collect::<Vec<_>>(), 1..=6), position_seed in any::<prop::sample::Index>()) {
        let mut world = World::new();
        let line = RouteLine::detached(nodes);
        let conduit = world.place_conduit(line.walk(0, nodes - 1));
        let position = 1 + position_seed.index(nodes - 2);
        let cut_node = line.node(position);
        let segments: Vec<SpanSegmentId> = structures.iter().map(|s| world.single_segment(conduit, *s)).collect();

        let events = world.try_cut(cut_node, segments.clone()).expect("cut");

        let cuts = match events.as_slice() {
            [TopologyEvent::SpanEquipment(SpanEquipmentEvent::SpanSegmentsCut(e)), ..] => e.cuts.clone(),
            other => return Err(TestCaseError::fail(format!("unexpected events {other:?}"))),
        };
        prop_assert_eq!(cuts.len(), segments.len());
        let equipment = world.equipment(conduit);
        let cut_index = equipment.node_of_interest_index(cut_node).expect("node of interest");
        for cut in cuts {
            prop_assert!(equipment.segment(cut.old_span_segment_id).is_none());
            let [first, second] = cut.new_span_segment_ids;
            prop_assert_eq!(equipment.segment(first).map(|s| s.to_node_of_interest_index), Some(cut_index));
            prop_assert_eq!(equipment.segment(second).map(|s| s.from_node_of_interest_index), Some(cut_index));
        }
    }
}
