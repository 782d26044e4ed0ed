// Copyright (c) 2025 - Cowboy AI, Inc.
//! Linear trace

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use tracing::debug;

use super::{far_terminal, resolve_start, Side, TraceError, TraceStart, Visit};
use crate::projection::{ConnectivityGraph, EdgeRef, GraphElement, TerminalVertex};

/// Result of a linear trace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleTrace {
    pub start: GraphElement,
    /// Elements on the first side, ordered outward from the start
    pub upstream: Vec<GraphElement>,
    /// Elements on the second side, ordered outward from the start
    pub downstream: Vec<GraphElement>,
    /// Every element including the start
    pub all: BTreeSet<GraphElement>,
}

impl SimpleTrace {
    /// Whole chain from the far upstream end to the far downstream end
    pub fn chain(&self) -> Vec<GraphElement> {
        self.upstream
            .iter()
            .rev()
            .copied()
            .chain(std::iter::once(self.start))
            .chain(self.downstream.iter().copied())
            .collect()
    }

    /// Outermost element on the upstream side
    pub fn a_end(&self) -> GraphElement {
        self.upstream.last().copied().unwrap_or(self.start)
    }

    /// Outermost element on the downstream side
    pub fn z_end(&self) -> GraphElement {
        self.downstream.last().copied().unwrap_or(self.start)
    }

    /// Real terminals at the ends of the chain
    pub fn end_terminals(&self) -> (Option<GraphElement>, Option<GraphElement>) {
        let is_terminal = |e: &GraphElement| matches!(e, GraphElement::TerminalRef { .. });
        let chain = self.chain();
        (
            chain.iter().copied().find(is_terminal),
            chain.iter().rev().copied().find(is_terminal),
        )
    }
}

/// Trace outward in both directions from `start`
pub fn simple_trace(
    graph: &ConnectivityGraph,
    start: TraceStart,
    version: u64,
) -> Result<SimpleTrace, TraceError> {
    let (element, up, down) = resolve_start(graph, start, version)?;

    let mut visited: HashSet<Visit> = HashSet::new();
    match start {
        TraceStart::Segment(id) => visited.insert(Visit::Edge(EdgeRef::Segment(id))),
        TraceStart::TerminalLink(id) => visited.insert(Visit::Edge(EdgeRef::Link(id))),
        TraceStart::Terminal(id) => visited.insert(Visit::Terminal(id)),
    };

    let upstream = follow(graph, version, up, &mut visited)?;
    let downstream = follow(graph, version, down, &mut visited)?;

    let mut all: BTreeSet<GraphElement> = upstream.iter().chain(downstream.iter()).copied().collect();
    all.insert(element);

    debug!(
        ?start,
        version,
        upstream = upstream.len(),
        downstream = downstream.len(),
        "Simple trace complete"
    );

    Ok(SimpleTrace {
        start: element,
        upstream,
        downstream,
        all,
    })
}

fn follow(
    graph: &ConnectivityGraph,
    version: u64,
    side: Side,
    visited: &mut HashSet<Visit>,
) -> Result<Vec<GraphElement>, TraceError> {
    let mut out = Vec::new();

    let (mut came_from, mut terminal) = match side {
        Side::Closed => return Ok(out),
        Side::FromEdge(edge, terminal) => (edge, terminal),
        Side::FromTerminal(terminal, edge) => {
            enter_edge(graph, version, edge, visited, &mut out)?;
            (edge, far_terminal(graph, edge, terminal, version))
        }
    };

    while let Some(terminal_id) = terminal {
        let Some(vertex) = graph.terminal(terminal_id, version) else {
            break;
        };
        let element = graph
            .element_of_terminal(terminal_id, version)
            .unwrap_or(GraphElement::TerminalRef {
                terminal_id,
                terminal_equipment_id: None,
            });
        if !visited.insert(Visit::Terminal(terminal_id)) {
            return Err(TraceError::CycleDetected(element));
        }
        if !vertex.is_virtual() {
            out.push(element);
        }
        if matches!(vertex, TerminalVertex::Real { splitter: true, .. }) {
            break;
        }

        let attachments = graph.attachments(terminal_id, version);
        if attachments.len() > 2 {
            break;
        }
        let Some(next) = attachments.iter().copied().find(|edge| *edge != came_from) else {
            break;
        };

        enter_edge(graph, version, next, visited, &mut out)?;
        terminal = far_terminal(graph, next, terminal_id, version);
        came_from = next;
    }

    Ok(out)
}

fn enter_edge(
    graph: &ConnectivityGraph,
    version: u64,
    edge: EdgeRef,
    visited: &mut HashSet<Visit>,
    out: &mut Vec<GraphElement>,
) -> Result<(), TraceError> {
    let Some(element) = graph.element_of_edge(edge, version) else {
        return Ok(());
    };
    if !visited.insert(Visit::Edge(edge)) {
        return Err(TraceError::CycleDetected(element));
    }
    out.push(element);
    Ok(())
}
