// Copyright (c) 2025 - Cowboy AI, Inc.
//! Walk of Interest Value Object
//!
//! A walk is the ordered path of route-network nodes (and the segments
//! between them) that anchors a piece of equipment to the physical network.
//!
//! # Invariants
//! - At least one route segment
//! - `node_ids.len() == segment_ids.len() + 1`
//! - No node repeats adjacently

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::ids::{RouteNodeId, RouteSegmentId};

/// Walk validation error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WalkError {
    #[error("Walk must contain at least one route segment")]
    Empty,

    #[error("Walk has {nodes} nodes but {segments} segments")]
    LengthMismatch { nodes: usize, segments: usize },

    #[error("Route node {0} repeats adjacently in walk")]
    AdjacentDuplicate(RouteNodeId),

    #[error("Walk ending in {left} cannot be joined with walk starting in {right}")]
    EndsDoNotMeet { left: RouteNodeId, right: RouteNodeId },

    #[error("Invalid walk range {from}..{to}")]
    InvalidRange { from: usize, to: usize },
}

/// Ordered, adjacently deduplicated route-network path
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValidatedWalk {
    node_ids: Vec<RouteNodeId>,
    segment_ids: Vec<RouteSegmentId>,
}

impl ValidatedWalk {
    pub fn new(
        node_ids: Vec<RouteNodeId>,
        segment_ids: Vec<RouteSegmentId>,
    ) -> Result<Self, WalkError> {
        if segment_ids.is_empty() {
            return Err(WalkError::Empty);
        }
        if node_ids.len() != segment_ids.len() + 1 {
            return Err(WalkError::LengthMismatch {
                nodes: node_ids.len(),
                segments: segment_ids.len(),
            });
        }
        if let Some(pair) = node_ids.windows(2).find(|pair| pair[0] == pair[1]) {
            return Err(WalkError::AdjacentDuplicate(pair[0]));
        }
        Ok(Self {
            node_ids,
            segment_ids,
        })
    }

    pub fn node_ids(&self) -> &[RouteNodeId] {
        &self.node_ids
    }

    pub fn segment_ids(&self) -> &[RouteSegmentId] {
        &self.segment_ids
    }

    pub fn first_node(&self) -> RouteNodeId {
        self.node_ids[0]
    }

    pub fn last_node(&self) -> RouteNodeId {
        self.node_ids[self.node_ids.len() - 1]
    }

    pub fn is_end(&self, node_id: RouteNodeId) -> bool {
        self.first_node() == node_id || self.last_node() == node_id
    }

    pub fn contains_node(&self, node_id: RouteNodeId) -> bool {
        self.node_ids.contains(&node_id)
    }

    /// First position of a node in the walk
    pub fn position_of(&self, node_id: RouteNodeId) -> Option<usize> {
        self.node_ids.iter().position(|id| *id == node_id)
    }

    /// Position of a node restricted to the inclusive range `from..=to`
    pub fn position_of_within(&self, node_id: RouteNodeId, from: usize, to: usize) -> Option<usize> {
        let to = to.min(self.node_ids.len() - 1);
        (from..=to).find(|pos| self.node_ids[*pos] == node_id)
    }

    /// Map an ordered list of nodes to strictly increasing walk positions.
    ///
    /// Returns `None` when a node is missing or out of order.
    pub fn positions_of(&self, nodes: &[RouteNodeId]) -> Option<Vec<usize>> {
        let mut positions = Vec::with_capacity(nodes.len());
        let mut start = 0;
        for node in nodes {
            if start >= self.node_ids.len() {
                return None;
            }
            let pos = self.position_of_within(*node, start, self.node_ids.len() - 1)?;
            positions.push(pos);
            start = pos + 1;
        }
        Some(positions)
    }

    /// Whether `node_id` lies strictly between `a` and `b` on this walk
    pub fn is_between(&self, node_id: RouteNodeId, a: RouteNodeId, b: RouteNodeId) -> bool {
        let (Some(pa), Some(pb)) = (self.position_of(a), self.position_of(b)) else {
            return false;
        };
        let (lo, hi) = if pa <= pb { (pa, pb) } else { (pb, pa) };
        if hi - lo < 2 {
            return false;
        }
        self.position_of_within(node_id, lo + 1, hi - 1).is_some()
    }

    /// Sub-walk between two node positions; reversed when `from > to`
    pub fn sub_walk(&self, from: usize, to: usize) -> Result<ValidatedWalk, WalkError> {
        if from == to || from.max(to) >= self.node_ids.len() {
            return Err(WalkError::InvalidRange { from, to });
        }
        if from < to {
            Ok(Self {
                node_ids: self.node_ids[from..=to].to_vec(),
                segment_ids: self.segment_ids[from..to].to_vec(),
            })
        } else {
            Ok(Self {
                node_ids: self.node_ids[to..=from].to_vec(),
                segment_ids: self.segment_ids[to..from].to_vec(),
            }
            .reversed())
        }
    }

    pub fn reversed(&self) -> ValidatedWalk {
        let mut node_ids = self.node_ids.clone();
        let mut segment_ids = self.segment_ids.clone();
        node_ids.reverse();
        segment_ids.reverse();
        Self {
            node_ids,
            segment_ids,
        }
    }

    /// Join two walks that meet end to start, collapsing the shared node
    pub fn concat(&self, other: &ValidatedWalk) -> Result<ValidatedWalk, WalkError> {
        if self.last_node() != other.first_node() {
            return Err(WalkError::EndsDoNotMeet {
                left: self.last_node(),
                right: other.first_node(),
            });
        }
        let mut node_ids = self.node_ids.clone();
        node_ids.extend_from_slice(&other.node_ids[1..]);
        let mut segment_ids = self.segment_ids.clone();
        segment_ids.extend_from_slice(&other.segment_ids);
        ValidatedWalk::new(node_ids, segment_ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nodes(n: usize) -> Vec<RouteNodeId> {
        (0..n).map(|_| RouteNodeId::new()).collect()
    }

    fn segments(n: usize) -> Vec<RouteSegmentId> {
        (0..n).map(|_| RouteSegmentId::new()).collect()
    }

    #[test]
    fn test_walk_validation() {
        assert_eq!(ValidatedWalk::new(nodes(1), vec![]), Err(WalkError::Empty));
        assert!(matches!(
            ValidatedWalk::new(nodes(3), segments(1)),
            Err(WalkError::LengthMismatch { .. })
        ));

        let a = RouteNodeId::new();
        assert_eq!(
            ValidatedWalk::new(vec![a, a], segments(1)),
            Err(WalkError::AdjacentDuplicate(a))
        );
    }

    #[test]
    fn test_is_between_is_strict() {
        let n = nodes(4);
        let walk = ValidatedWalk::new(n.clone(), segments(3)).unwrap();

        assert!(walk.is_between(n[1], n[0], n[3]));
        assert!(walk.is_between(n[2], n[3], n[0]));
        assert!(!walk.is_between(n[0], n[0], n[3]));
        assert!(!walk.is_between(n[3], n[0], n[3]));
        assert!(!walk.is_between(n[2], n[0], n[1]));
    }

    #[test]
    fn test_sub_walk_and_reverse() {
        let n = nodes(4);
        let s = segments(3);
        let walk = ValidatedWalk::new(n.clone(), s.clone()).unwrap();

        let forward = walk.sub_walk(1, 3).unwrap();
        assert_eq!(forward.node_ids(), &n[1..=3]);
        assert_eq!(forward.segment_ids(), &s[1..3]);

        let backward = walk.sub_walk(2, 0).unwrap();
        assert_eq!(backward.node_ids(), &[n[2], n[1], n[0]]);
        assert_eq!(backward.segment_ids(), &[s[1], s[0]]);
    }

    #[test]
    fn test_concat_collapses_shared_node() {
        let n = nodes(3);
        let s = segments(2);
        let left = ValidatedWalk::new(vec![n[0], n[1]], vec![s[0]]).unwrap();
        let right = ValidatedWalk::new(vec![n[1], n[2]], vec![s[1]]).unwrap();

        let joined = left.concat(&right).unwrap();
        assert_eq!(joined.node_ids(), &n[..]);
        assert!(right.concat(&right).is_err());
    }

    #[test]
    fn test_positions_of_requires_order() {
        let n = nodes(4);
        let walk = ValidatedWalk::new(n.clone(), segments(3)).unwrap();
        assert_eq!(walk.positions_of(&[n[0], n[2], n[3]]), Some(vec![0, 2, 3]));
        assert_eq!(walk.positions_of(&[n[2], n[1]]), None);
    }
}
