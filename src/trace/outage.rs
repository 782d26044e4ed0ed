// Copyright (c) 2025 - Cowboy AI, Inc.
//! Fan-out (outage) trace
//!
//! Starting from one element, every reachable element is collected into a
//! tree. At a splitter the `In` terminal expands into all `Out` siblings,
//! while an `Out` terminal leads only back to the `In` terminal(s), so an
//! outage on one output does not spread to its siblings.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use tracing::debug;

use super::{far_terminal, TraceError, TraceStart, Visit};
use crate::domain::{SpanEquipmentId, TerminalDirection, TerminalEquipmentId, TerminalId};
use crate::projection::{ConnectivityGraph, EdgeRef, GraphElement, TerminalVertex};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutageNode {
    pub element: GraphElement,
    pub children: Vec<OutageNode>,
}

impl OutageNode {
    fn leaf(element: GraphElement) -> Self {
        Self {
            element,
            children: Vec::new(),
        }
    }

    /// Depth-first iteration over the tree
    pub fn elements(&self) -> Vec<GraphElement> {
        let mut out = vec![self.element];
        for child in &self.children {
            out.extend(child.elements());
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutageTrace {
    pub root: OutageNode,
    pub span_equipment_ids: BTreeSet<SpanEquipmentId>,
    pub terminal_equipment_ids: BTreeSet<TerminalEquipmentId>,
}

struct Walker<'g> {
    graph: &'g ConnectivityGraph,
    version: u64,
    visited: HashSet<Visit>,
}

impl Walker<'_> {
    /// Children reached from an edge, leaving through every end except `near`
    fn from_edge(&mut self, edge: EdgeRef, near: Option<TerminalId>) -> Vec<OutageNode> {
        let mut children = Vec::new();
        let terminals = self.graph.edge_terminals(edge, self.version);
        for terminal_id in terminals {
            if Some(terminal_id) == near {
                continue;
            }
            children.extend(self.enter_terminal(terminal_id, Some(edge), false));
        }
        children
    }

    /// Nodes for entering a terminal; virtual terminals are collapsed into
    /// their children
    fn enter_terminal(
        &mut self,
        terminal_id: TerminalId,
        came_from: Option<EdgeRef>,
        via_sibling: bool,
    ) -> Vec<OutageNode> {
        if !self.visited.insert(Visit::Terminal(terminal_id)) {
            return Vec::new();
        }
        let Some(vertex) = self.graph.terminal(terminal_id, self.version).copied() else {
            return Vec::new();
        };

        let mut children = Vec::new();
        for edge in self.graph.attachments(terminal_id, self.version).to_vec() {
            if Some(edge) == came_from {
                continue;
            }
            if let Some(node) = self.enter_edge(edge, terminal_id) {
                children.push(node);
            }
        }

        if let TerminalVertex::Real {
            terminal_structure_id,
            direction,
            splitter: true,
            ..
        } = vertex
        {
            let wanted = match direction {
                TerminalDirection::In if !via_sibling => Some(TerminalDirection::Out),
                TerminalDirection::Out => Some(TerminalDirection::In),
                _ => None,
            };
            if let Some(wanted) = wanted {
                let siblings = self
                    .graph
                    .structure_members(terminal_structure_id, self.version)
                    .to_vec();
                for sibling in siblings {
                    let matches = self
                        .graph
                        .terminal(sibling, self.version)
                        .is_some_and(|v| matches!(v, TerminalVertex::Real { direction: d, .. } if *d == wanted));
                    if sibling != terminal_id && matches {
                        children.extend(self.enter_terminal(sibling, None, true));
                    }
                }
            }
        }

        if vertex.is_virtual() {
            children
        } else {
            let element = GraphElement::TerminalRef {
                terminal_id,
                terminal_equipment_id: vertex.terminal_equipment_id(),
            };
            vec![OutageNode { element, children }]
        }
    }

    fn enter_edge(&mut self, edge: EdgeRef, near: TerminalId) -> Option<OutageNode> {
        if !self.visited.insert(Visit::Edge(edge)) {
            return None;
        }
        let element = self.graph.element_of_edge(edge, self.version)?;
        let mut node = OutageNode::leaf(element);
        if let Some(far) = far_terminal(self.graph, edge, near, self.version) {
            node.children = self.enter_terminal(far, Some(edge), false);
        }
        Some(node)
    }
}

/// Fan-out trace from `start`
pub fn outage_trace(
    graph: &ConnectivityGraph,
    start: TraceStart,
    version: u64,
) -> Result<OutageTrace, TraceError> {
    let unknown = || TraceError::UnknownStart { start, version };
    let mut walker = Walker {
        graph,
        version,
        visited: HashSet::new(),
    };

    let root = match start {
        TraceStart::Segment(id) => {
            let edge = EdgeRef::Segment(id);
            let element = graph.element_of_edge(edge, version).ok_or_else(unknown)?;
            walker.visited.insert(Visit::Edge(edge));
            OutageNode {
                element,
                children: walker.from_edge(edge, None),
            }
        }
        TraceStart::TerminalLink(id) => {
            let edge = EdgeRef::Link(id);
            let element = graph.element_of_edge(edge, version).ok_or_else(unknown)?;
            walker.visited.insert(Visit::Edge(edge));
            OutageNode {
                element,
                children: walker.from_edge(edge, None),
            }
        }
        TraceStart::Terminal(id) => {
            let element = graph.element_of_terminal(id, version).ok_or_else(unknown)?;
            let mut nodes = walker.enter_terminal(id, None, false);
            match nodes.pop() {
                Some(node) if nodes.is_empty() && node.element == element => node,
                // virtual start: its children hang directly off the start
                popped => OutageNode {
                    element,
                    children: nodes.into_iter().chain(popped).collect(),
                },
            }
        }
    };

    let mut span_equipment_ids = BTreeSet::new();
    let mut terminal_equipment_ids = BTreeSet::new();
    for element in root.elements() {
        match element {
            GraphElement::SegmentRef { span_equipment_id, .. } => {
                span_equipment_ids.insert(span_equipment_id);
            }
            GraphElement::TerminalRef {
                terminal_equipment_id: Some(id),
                ..
            } => {
                terminal_equipment_ids.insert(id);
            }
            _ => {}
        }
    }

    debug!(?start, version, elements = root.elements().len(), "Outage trace complete");

    Ok(OutageTrace {
        root,
        span_equipment_ids,
        terminal_equipment_ids,
    })
}
