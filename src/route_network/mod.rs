// Copyright (c) 2025 - Cowboy AI, Inc.
//! Route Network Collaborator
//!
//! The route network (nodes and segments of the physical trench/duct graph)
//! is owned elsewhere. The topology only asks it three things:
//!
//! - resolve an ordered list of route segment ids into a [`ValidatedWalk`]
//! - register / unregister a walk of interest for committed equipment
//! - report route segment lengths for passage views
//!
//! Calls are async and the service bounds each with a timeout.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;

use crate::domain::{RouteNodeId, RouteSegmentId, ValidatedWalk, WalkError, WalkOfInterestId};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RouteNetworkError {
    #[error("Unknown route segment {0}")]
    UnknownSegment(RouteSegmentId),

    #[error("Route segment {0} is not adjacent to the previous segment")]
    Disconnected(RouteSegmentId),

    #[error("Invalid walk: {0}")]
    InvalidWalk(#[from] WalkError),

    #[error("Route network unavailable: {0}")]
    Unavailable(String),
}

impl RouteNetworkError {
    /// Whether the failure is about the request rather than the collaborator
    pub fn is_request_error(&self) -> bool {
        !matches!(self, RouteNetworkError::Unavailable(_))
    }
}

#[async_trait]
pub trait RouteNetwork: Send + Sync {
    /// Resolve segments, given in walking order, into a walk
    async fn resolve_walk(&self, segment_ids: &[RouteSegmentId]) -> Result<ValidatedWalk, RouteNetworkError>;

    async fn contains_node(&self, node_id: RouteNodeId) -> Result<bool, RouteNetworkError>;

    async fn register_walk_of_interest(
        &self,
        id: WalkOfInterestId,
        walk: &ValidatedWalk,
    ) -> Result<(), RouteNetworkError>;

    async fn unregister_walk_of_interest(&self, id: WalkOfInterestId) -> Result<(), RouteNetworkError>;

    /// Lengths in meters; unknown segments are left out
    async fn segment_lengths(
        &self,
        segment_ids: &[RouteSegmentId],
    ) -> Result<HashMap<RouteSegmentId, f64>, RouteNetworkError>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteSegment {
    pub from_node_id: RouteNodeId,
    pub to_node_id: RouteNodeId,
    pub length: f64,
}

#[derive(Debug, Default)]
struct RouteNetworkState {
    nodes: HashSet<RouteNodeId>,
    segments: HashMap<RouteSegmentId, RouteSegment>,
    interests: HashMap<WalkOfInterestId, ValidatedWalk>,
}

/// In-memory route network for tests and embedded use
#[derive(Debug, Default)]
pub struct InMemoryRouteNetwork {
    state: RwLock<RouteNetworkState>,
}

impl InMemoryRouteNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_node(&self) -> RouteNodeId {
        let id = RouteNodeId::new();
        self.state.write().await.nodes.insert(id);
        id
    }

    /// Add a segment between two nodes, registering the nodes if needed
    pub async fn add_segment(&self, from_node_id: RouteNodeId, to_node_id: RouteNodeId, length: f64) -> RouteSegmentId {
        let id = RouteSegmentId::new();
        let mut state = self.state.write().await;
        state.nodes.insert(from_node_id);
        state.nodes.insert(to_node_id);
        state.segments.insert(
            id,
            RouteSegment {
                from_node_id,
                to_node_id,
                length,
            },
        );
        id
    }

    pub async fn walk_of_interest(&self, id: WalkOfInterestId) -> Option<ValidatedWalk> {
        self.state.read().await.interests.get(&id).cloned()
    }

    pub async fn interest_count(&self) -> usize {
        self.state.read().await.interests.len()
    }
}

#[async_trait]
impl RouteNetwork for InMemoryRouteNetwork {
    async fn resolve_walk(&self, segment_ids: &[RouteSegmentId]) -> Result<ValidatedWalk, RouteNetworkError> {
        let state = self.state.read().await;
        let segments = segment_ids
            .iter()
            .map(|id| state.segments.get(id).copied().ok_or(RouteNetworkError::UnknownSegment(*id)))
            .collect::<Result<Vec<_>, _>>()?;

        let Some(first) = segments.first() else {
            return Err(WalkError::Empty.into());
        };
        // start at the end of the first segment not shared with the second
        let start = match segments.get(1) {
            Some(second) if [second.from_node_id, second.to_node_id].contains(&first.from_node_id) => {
                first.to_node_id
            }
            _ => first.from_node_id,
        };

        let mut node_ids = vec![start];
        let mut current = start;
        for (id, segment) in segment_ids.iter().zip(&segments) {
            current = if segment.from_node_id == current {
                segment.to_node_id
            } else if segment.to_node_id == current {
                segment.from_node_id
            } else {
                return Err(RouteNetworkError::Disconnected(*id));
            };
            node_ids.push(current);
        }

        Ok(ValidatedWalk::new(node_ids, segment_ids.to_vec())?)
    }

    async fn contains_node(&self, node_id: RouteNodeId) -> Result<bool, RouteNetworkError> {
        Ok(self.state.read().await.nodes.contains(&node_id))
    }

    async fn register_walk_of_interest(
        &self,
        id: WalkOfInterestId,
        walk: &ValidatedWalk,
    ) -> Result<(), RouteNetworkError> {
        debug!(walk_of_interest_id = %id, segments = walk.segment_ids().len(), "Registering walk of interest");
        self.state.write().await.interests.insert(id, walk.clone());
        Ok(())
    }

    async fn unregister_walk_of_interest(&self, id: WalkOfInterestId) -> Result<(), RouteNetworkError> {
        self.state.write().await.interests.remove(&id);
        Ok(())
    }

    async fn segment_lengths(
        &self,
        segment_ids: &[RouteSegmentId],
    ) -> Result<HashMap<RouteSegmentId, f64>, RouteNetworkError> {
        let state = self.state.read().await;
        Ok(segment_ids
            .iter()
            .filter_map(|id| state.segments.get(id).map(|s| (*id, s.length)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_resolve_walk_orients_first_segment() {
        // Arrange
        let network = InMemoryRouteNetwork::new();
        let a = network.add_node().await;
        let b = network.add_node().await;
        let c = network.add_node().await;
        // first segment stored against walking direction
        let s1 = network.add_segment(b, a, 10.0).await;
        let s2 = network.add_segment(b, c, 20.0).await;

        // Act
        let walk = tokio_test::assert_ok!(network.resolve_walk(&[s1, s2]).await);

        // Assert
        assert_eq!(walk.node_ids(), &[a, b, c]);
        assert_eq!(walk.segment_ids(), &[s1, s2]);
    }

    #[tokio::test]
    async fn test_resolve_walk_rejects_gap() {
        let network = InMemoryRouteNetwork::new();
        let a = network.add_node().await;
        let b = network.add_node().await;
        let c = network.add_node().await;
        let d = network.add_node().await;
        let s1 = network.add_segment(a, b, 1.0).await;
        let s2 = network.add_segment(c, d, 1.0).await;

        let result = network.resolve_walk(&[s1, s2]).await;

        assert!(matches!(result, Err(RouteNetworkError::Disconnected(id)) if id == s2));
    }

    #[tokio::test]
    async fn test_resolve_walk_unknown_and_empty() {
        let network = InMemoryRouteNetwork::new();

        let unknown = network.resolve_walk(&[RouteSegmentId::new()]).await;
        let empty = network.resolve_walk(&[]).await;

        assert!(matches!(unknown, Err(RouteNetworkError::UnknownSegment(_))));
        assert_eq!(empty, Err(RouteNetworkError::InvalidWalk(WalkError::Empty)));
    }

    #[tokio::test]
    async fn test_walk_of_interest_registration() {
        let network = InMemoryRouteNetwork::new();
        let a = network.add_node().await;
        let b = network.add_node().await;
        let s = network.add_segment(a, b, 5.0).await;
        let walk = network.resolve_walk(&[s]).await.unwrap();
        let id = WalkOfInterestId::new();

        network.register_walk_of_interest(id, &walk).await.unwrap();
        assert_eq!(network.walk_of_interest(id).await, Some(walk));

        network.unregister_walk_of_interest(id).await.unwrap();
        assert_eq!(network.interest_count().await, 0);
    }
}
