// Copyright (c) 2025 - Cowboy AI, Inc.
//! Trace Engine
//!
//! Read-only traversal of the [`ConnectivityGraph`] at a pinned version.
//!
//! - [`simple_trace`]: linear trace following single 1:1 connections in both
//!   directions until an open end, a splitter or an ambiguous terminal
//! - [`outage_trace`]: fan-out trace producing a tree; splitter inputs
//!   expand into every output
//!
//! # Linear Trace
//!
//! ```text
//!   upstream ◀── … ── T ── seg ── [start] ── seg ── T ── … ──▶ downstream
//! ```
//!
//! Virtual terminals (segment-to-segment junctions) are crossed but not
//! reported. A revisit means the graph is inconsistent and yields
//! [`TraceError::CycleDetected`].

mod outage;
mod simple;

pub use outage::{outage_trace, OutageNode, OutageTrace};
pub use simple::{simple_trace, SimpleTrace};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{SpanSegmentId, TerminalId, TerminalLinkId};
use crate::projection::{ConnectivityGraph, EdgeRef, GraphElement};

/// Element a trace starts from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum TraceStart {
    Segment(SpanSegmentId),
    Terminal(TerminalId),
    TerminalLink(TerminalLinkId),
}

impl From<GraphElement> for TraceStart {
    fn from(element: GraphElement) -> Self {
        match element {
            GraphElement::SegmentRef { span_segment_id, .. } => TraceStart::Segment(span_segment_id),
            GraphElement::TerminalRef { terminal_id, .. } => TraceStart::Terminal(terminal_id),
            GraphElement::TerminalLink { terminal_link_id } => TraceStart::TerminalLink(terminal_link_id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TraceError {
    #[error("Trace start {start:?} does not exist at version {version}")]
    UnknownStart { start: TraceStart, version: u64 },

    #[error("Cycle detected at {0:?}")]
    CycleDetected(GraphElement),
}

/// Vertex or edge identity used for revisit detection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Visit {
    Terminal(TerminalId),
    Edge(EdgeRef),
}

/// Terminal on the far side of an edge; `None` when that end is open
fn far_terminal(graph: &ConnectivityGraph, edge: EdgeRef, near: TerminalId, version: u64) -> Option<TerminalId> {
    match graph.edge_terminals(edge, version).as_slice() {
        [a, b] if *a == near => Some(*b),
        [a, _] => Some(*a),
        _ => None,
    }
}

/// The start element and its two sides: (element, up side, down side)
fn resolve_start(
    graph: &ConnectivityGraph,
    start: TraceStart,
    version: u64,
) -> Result<(GraphElement, Side, Side), TraceError> {
    let unknown = || TraceError::UnknownStart { start, version };
    match start {
        TraceStart::Segment(id) => {
            let edge = graph.segment(id, version).ok_or_else(unknown)?;
            let element = GraphElement::SegmentRef {
                span_equipment_id: edge.span_equipment_id,
                span_segment_id: id,
            };
            let e = EdgeRef::Segment(id);
            Ok((
                element,
                Side::FromEdge(e, edge.from_terminal_id),
                Side::FromEdge(e, edge.to_terminal_id),
            ))
        }
        TraceStart::TerminalLink(id) => {
            let link = graph.link(id, version).ok_or_else(unknown)?;
            let e = EdgeRef::Link(id);
            Ok((
                GraphElement::TerminalLink { terminal_link_id: id },
                Side::FromEdge(e, Some(link.from_terminal_id)),
                Side::FromEdge(e, Some(link.to_terminal_id)),
            ))
        }
        TraceStart::Terminal(id) => {
            let element = graph.element_of_terminal(id, version).ok_or_else(unknown)?;
            let attachments = graph.attachments(id, version);
            let blocked = attachments.len() > 2
                || matches!(
                    graph.terminal(id, version),
                    Some(crate::projection::TerminalVertex::Real { splitter: true, .. })
                );
            if blocked {
                return Ok((element, Side::Closed, Side::Closed));
            }
            let side = |i: usize| match attachments.get(i) {
                Some(edge) => Side::FromTerminal(id, *edge),
                None => Side::Closed,
            };
            Ok((element, side(0), side(1)))
        }
    }
}

/// Where one direction of a linear trace begins
#[derive(Debug, Clone, Copy)]
enum Side {
    /// Leave an edge through the given terminal end
    FromEdge(EdgeRef, Option<TerminalId>),
    /// Leave a terminal along the given edge
    FromTerminal(TerminalId, EdgeRef),
    Closed,
}
