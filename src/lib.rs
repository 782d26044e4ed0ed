// Copyright (c) 2025 - Cowboy AI, Inc.
//! Utility network topology
//!
//! Event-sourced model of the physical connectivity of a telecom utility
//! network: conduits and cables (span equipment), enclosures and racks
//! (node containers), splice/patch/splitter equipment (terminal equipment),
//! the versioned connectivity graph between them and the traces over it.
//!
//! - [`aggregate`]: commands and pure handlers
//! - [`events`], [`projection`]: facts and their fold
//! - [`trace`], [`query`]: read side
//! - [`service`]: transaction boundary with the collaborators
//!   ([`route_network`], [`event_store`], [`notification`])

pub mod aggregate;
pub mod config;
pub mod domain;
pub mod errors;
pub mod event_store;
pub mod events;
pub mod nats;
pub mod notification;
pub mod projection;
pub mod query;
pub mod route_network;
pub mod routing;
pub mod service;
pub mod subjects;
pub mod telemetry;
pub mod trace;

// Re-export commonly used types
pub use aggregate::{handle_command, CommandContext, CommandError, ErrorKind, TopologyCommand};
pub use config::TopologyConfig;
pub use errors::{InfrastructureError, InfrastructureResult};
pub use events::TopologyEvent;
pub use nats::{NatsClient, NatsConfig};
pub use projection::Topology;
pub use service::{CommandOutcome, ServiceError, TopologyService};
