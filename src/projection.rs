// Copyright (c) 2025 - Cowboy AI, Inc.

//! Topology Projection and Connectivity Graph
//!
//! The projection is a pure fold `F: [TopologyEvent] → Topology`. Commands
//! validate against the last committed [`Topology`]; the service folds their
//! events into a clone and swaps it in, so readers never observe a partially
//! applied command.
//!
//! # Functoriality
//!
//! 1. **Identity**: an empty event list leaves the projection unchanged
//!    apart from its version marker
//! 2. **Composition**: folding `e1` then `e2` equals folding `[e1, e2]`
//!
//! Replaying the stored stream with [`Topology::from_events`] therefore
//! reproduces the live projection.
//!
//! # Versioning
//!
//! ```text
//! version:   1        2        3
//! graph:  ──●────────●────────●──▶  VersionedMap history per key
//!            ▲                 ▲
//!       historical trace   current trace
//! ```
//!
//! Graph lookups take the version the reader is pinned to. History older
//! than the configured retention is pruned after each commit.

pub mod graph;
pub mod topology;
pub mod versioned;

pub use graph::{ConnectivityGraph, EdgeRef, GraphElement, LinkEdge, SegmentEdge, TerminalVertex};
pub use topology::Topology;
pub use versioned::VersionedMap;
