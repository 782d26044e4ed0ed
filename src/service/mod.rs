// Copyright (c) 2025 - Cowboy AI, Inc.
//! Service Layer for Topology Management
//!
//! The application service is the transaction boundary around the pure
//! command handlers. It orchestrates the collaborators and owns the
//! last committed projection.
//!
//! # Architecture
//!
//! ```text
//! Client Command
//!     ↓
//! TopologyService (write gate)
//!     ↓                 ↘
//! handle_command      RouteNetwork (walk resolution)
//!     ↓
//! EventStore (append, expected version)
//!     ↓
//! Snapshot swap ──▶ queries / trace (non-blocking)
//!     ↓
//! ChangeNotifier (NATS or in-memory)
//! ```
//!
//! # Design Principles
//!
//! 1. **Single writer**: commands are serialized by the write gate
//! 2. **Command/Query Separation**: readers take an `Arc<Topology>` snapshot
//! 3. **Pure Domain Logic**: the service only calls pure handlers
//! 4. **Bounded collaborators**: every external call has a timeout and no retry
//!
//! # Example
//!
//! ```rust,ignore
//! let service = TopologyService::new(config, catalog, route_network, store, notifier);
//! service.replay().await?;
//!
//! let outcome = service.execute(TopologyCommand::CutSpanSegmentsAtRouteNode(cut)).await?;
//! let snapshot = service.snapshot().await;
//! ```

pub mod topology;

pub use topology::{CommandOutcome, ServiceError, ServiceResult, TopologyService};
