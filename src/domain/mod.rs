// Copyright (c) 2025 - Cowboy AI, Inc.
//! Utility Network Domain Models
//!
//! Entities and value objects of the physical connectivity model. Every
//! cross reference is an id; the projection owns the arena that resolves them.
//!
//! # Value Objects
//!
//! - [`ValidatedWalk`] - ordered route-network path anchoring equipment
//! - Identity newtypes in [`ids`]
//! - Catalog templates in [`specification`]
//!
//! # Entities
//!
//! - [`SpanEquipment`] - conduit or cable: structures, segments, hops
//! - [`NodeContainer`] - enclosure at a route node with racks
//! - [`TerminalEquipment`] - terminal structures and their terminals
//! - [`TerminalLink`] - direct terminal-to-terminal patch
//!
//! # Relationships
//!
//! ```text
//! SpanEquipment ──affix──▶ NodeContainer ──hosts──▶ TerminalEquipment
//!      │                                                  │
//!   segments ──from/to terminal id──▶ Terminal ◀──────────┘
//!      ▲
//!   hops (child cable routed through parent conduit segments)
//! ```

pub mod ids;
pub mod node_container;
pub mod span_equipment;
pub mod specification;
pub mod terminal_equipment;
pub mod walk;

pub use ids::{
    NodeContainerId, RackId, RouteNodeId, RouteSegmentId, SpanEquipmentId, SpanSegmentId,
    SpanStructureId, SpecificationId, TerminalEquipmentId, TerminalId, TerminalLinkId,
    TerminalStructureId, WalkOfInterestId,
};
pub use node_container::{NodeContainer, Rack, SubrackMount, SubrackPlacementMethod};
pub use span_equipment::{
    AffixDirection, NodeContainerAffix, NodeContainerSide, ParentAffix, SegmentEnd, SpanEquipment,
    SpanSegment, SpanStructure, UtilityNetworkHop,
};
pub use specification::{
    CatalogError, NodeContainerSpecification, RackSpecification, SpanEquipmentSpecification,
    SpanStructureSpecification, SpanStructureTemplate, SpecificationCatalog, TerminalDirection,
    TerminalEquipmentSpecification, TerminalStructureKind, TerminalStructureSpecification,
    TerminalStructureTemplate, TerminalTemplate,
};
pub use terminal_equipment::{InterfaceInfo, Terminal, TerminalEquipment, TerminalLink, TerminalStructure};
pub use walk::{ValidatedWalk, WalkError};
