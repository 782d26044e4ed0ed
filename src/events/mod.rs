// Copyright (c) 2025 - Cowboy AI, Inc.
//! Utility Network Domain Events
//!
//! Events are immutable facts representing state changes that have occurred.
//! They are produced by pure command handlers and folded into the topology
//! projection; replaying them rebuilds the projection exactly.
//!
//! # Event Flow
//!
//! ```text
//! Command → Handler → Events → EventStore
//!                        ↓
//!                 Topology fold → Connectivity graph (versioned)
//!                        ↓
//!                 Change notification
//! ```
//!
//! # Metadata
//!
//! Payloads carry domain data only. Correlation, causation, actor, time and
//! sequence live on the [`StoredEvent`] envelope assigned at append.
//!
//! # Module Organization
//!
//! - [`topology`] - polymorphic envelope over all aggregates
//! - [`span_equipment`] - conduits and cables
//! - [`node_container`] - containers and racks
//! - [`terminal_equipment`] - terminal equipment and terminal links
//! - [`stored`] - persisted envelope

pub mod node_container;
pub mod span_equipment;
pub mod stored;
pub mod terminal_equipment;
pub mod topology;

pub use node_container::{
    NodeContainerEvent, NodeContainerPlaced, NodeContainerRemoved, RackEquipmentMoved,
    RackMountPosition, RackPlaced, TerminalEquipmentAddedToContainer,
    TerminalEquipmentRemovedFromContainer,
};
pub use span_equipment::{
    AdditionalInnerSpanStructuresAdded, SegmentTerminalBinding, SpanEquipmentAffixedToContainer,
    SpanEquipmentAffixedToParent, SpanEquipmentDetachedFromContainer, SpanEquipmentEvent,
    SpanEquipmentMerged, SpanEquipmentMoved, SpanEquipmentNameChanged, SpanEquipmentPlaced,
    SpanEquipmentRemoved, SpanEquipmentRerouted, SpanSegmentCut, SpanSegmentsConnectedToTerminals,
    SpanSegmentsCut, SpanSegmentsDisconnectedFromTerminals, SpanStructureRemoved,
};
pub use stored::{EventMetadata, StoredEvent};
pub use terminal_equipment::{
    InterfaceInfoUpdated, TerminalEquipmentEvent, TerminalEquipmentPlaced, TerminalEquipmentRemoved,
    TerminalStructureRemoved, TerminalStructuresAdded, TerminalsConnected, TerminalsDisconnected,
};
pub use topology::TopologyEvent;
