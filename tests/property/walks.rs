// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Route Walks

use proptest::prelude::*;

use crate::fixtures::*;

/// Node count and a split position strictly inside the walk
fn split_walk() -> impl Strategy<Value = (usize, usize)> {
    (3usize..12).prop_flat_map(|nodes| (Just(nodes), 1..nodes - 1))
}

proptest! {
    /// Property: splitting a walk and joining the halves gives it back
    #[test]
    fn prop_sub_walks_concat_to_whole((nodes, split) in split_walk()) {
        let walk = RouteLine::detached(nodes).walk(0, nodes - 1);

        let left = walk.sub_walk(0, split).expect("left");
        let right = walk.sub_walk(split, nodes - 1).expect("right");

        prop_assert_eq!(left.concat(&right).expect("concat"), walk);
    }

    /// Property: a backwards sub-walk is the reversed forward sub-walk
    #[test]
    fn prop_backward_sub_walk_is_reversed((nodes, split) in split_walk()) {
        let walk = RouteLine::detached(nodes).walk(0, nodes - 1);

        let forward = walk.sub_walk(split, nodes - 1).expect("forward");
        let backward = walk.sub_walk(nodes - 1, split).expect("backward");

        prop_assert_eq!(backward.reversed(), forward);
        prop_assert_eq!(walk.reversed().reversed(), walk);
    }
}
