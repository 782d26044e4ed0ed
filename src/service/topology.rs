// Copyright (c) 2025 - Cowboy AI, Inc.
//! Topology Service
//!
//! # Transaction Semantics
//!
//! Each [`TopologyService::execute`] call is one transaction:
//! 1. Acquire the write gate
//! 2. Take the last committed snapshot
//! 3. Resolve walks with the route network (timeout bounded)
//! 4. Handle the command (pure function)
//! 5. Fold the events into a clone of the snapshot
//! 6. Append to the event store (optimistic concurrency)
//! 7. Swap the snapshot in
//! 8. Register walks of interest and publish the change notification
//!
//! Steps 1-7 succeed or fail as a unit. Failures in step 8 are logged and the
//! commit stands.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use crate::aggregate::{handle_command, CommandError, Resolution, ResolvedWalk, TopologyCommand};
use crate::config::TopologyConfig;
use crate::domain::{RouteSegmentId, SpanEquipmentId, SpecificationCatalog, ValidatedWalk, WalkOfInterestId};
use crate::errors::{InfrastructureError, InfrastructureResult};
use crate::event_store::EventStore;
use crate::events::{EventMetadata, SpanEquipmentEvent, TopologyEvent};
use crate::notification::{ChangeNotification, ChangeNotifier};
use crate::projection::Topology;
use crate::query::{self, PassageView, QueryError};
use crate::route_network::{RouteNetwork, RouteNetworkError};
use crate::routing::{ResolvedHop, RoutingHop};
use crate::trace::{outage_trace, simple_trace, OutageTrace, SimpleTrace, TraceError, TraceStart};

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Command validation failed
    #[error("Command error: {0}")]
    Command(#[from] CommandError),

    #[error("Infrastructure error: {0}")]
    Infrastructure(#[from] InfrastructureError),

    #[error("Query error: {0}")]
    Query(#[from] QueryError),

    #[error("Trace error: {0}")]
    Trace(#[from] TraceError),
}

impl ServiceError {
    pub fn is_retryable(&self) -> bool {
        match self {
            ServiceError::Infrastructure(e) => e.is_retryable(),
            _ => false,
        }
    }
}

/// Result of a committed command
#[derive(Debug, Clone, PartialEq)]
pub struct CommandOutcome {
    pub version: u64,
    pub events: Vec<TopologyEvent>,
    pub notification: ChangeNotification,
}

pub struct TopologyService {
    config: TopologyConfig,
    catalog: Arc<SpecificationCatalog>,
    route_network: Arc<dyn RouteNetwork>,
    event_store: Arc<dyn EventStore>,
    notifier: Arc<dyn ChangeNotifier>,
    snapshot: RwLock<Arc<Topology>>,
    write_gate: Mutex<()>,
}

impl TopologyService {
    pub fn new(
        config: TopologyConfig,
        catalog: Arc<SpecificationCatalog>,
        route_network: Arc<dyn RouteNetwork>,
        event_store: Arc<dyn EventStore>,
        notifier: Arc<dyn ChangeNotifier>,
    ) -> Self {
        Self {
            config,
            catalog,
            route_network,
            event_store,
            notifier,
            snapshot: RwLock::new(Arc::new(Topology::new())),
            write_gate: Mutex::new(()),
        }
    }

    /// Last committed projection; never waits on a running command
    pub async fn snapshot(&self) -> Arc<Topology> {
        self.snapshot.read().await.clone()
    }

    pub fn catalog(&self) -> &SpecificationCatalog {
        &self.catalog
    }

    /// Rebuild the projection from the event store
    pub async fn replay(&self) -> ServiceResult<u64> {
        let _gate = self.write_gate.lock().await;
        let events = self.bounded(self.event_store.read_all()).await??;
        let mut topology = Topology::from_events(&events);
        topology.prune_history(self.config.graph_history_retention);
        let version = topology.version();
        *self.snapshot.write().await = Arc::new(topology);

        info!(version, events = events.len(), "Replayed topology");
        Ok(version)
    }

    pub async fn execute(&self, command: TopologyCommand) -> ServiceResult<CommandOutcome> {
        let _gate = self.write_gate.lock().await;
        let current = self.snapshot().await;
        let context = command.context().clone();

        let resolution = self.resolve(&current, &command).await?;
        let events = match handle_command(&current, &self.catalog, &command, resolution) {
            Ok(events) => events,
            Err(e) => {
                warn!(
                    command = command.name(),
                    correlation_id = %context.correlation_id,
                    code = e.code(),
                    "Command rejected: {}",
                    e
                );
                return Err(e.into());
            }
        };

        let version = current.version() + 1;
        let mut next = (*current).clone();
        next.apply(version, &events);
        next.prune_history(self.config.graph_history_retention);

        let metadata = EventMetadata {
            correlation_id: context.correlation_id,
            causation_id: context.causation_id,
            user_name: context.user_name.clone(),
            timestamp: context.timestamp,
        };
        let stored_version = self
            .bounded(self.event_store.append(events.clone(), &metadata, current.version()))
            .await??;
        if stored_version != version {
            return Err(InfrastructureError::EventStore(format!(
                "store committed version {stored_version}, projection expected {version}"
            ))
            .into());
        }

        let next = Arc::new(next);
        *self.snapshot.write().await = next.clone();

        info!(
            command = command.name(),
            correlation_id = %context.correlation_id,
            version,
            events = events.len(),
            "Command committed"
        );

        self.register_interests(&current, &next, &events).await;

        let notification = ChangeNotification::from_events(version, context.correlation_id, &events);
        if let Err(e) = self.bounded(self.notifier.notify(&notification)).await.and_then(|r| r) {
            warn!(version, "Change notification failed: {}", e);
        }

        Ok(CommandOutcome {
            version,
            events,
            notification,
        })
    }

    /// Linear trace at the current version
    pub async fn trace(&self, start: TraceStart) -> ServiceResult<SimpleTrace> {
        let topology = self.snapshot().await;
        Ok(simple_trace(topology.graph(), start, topology.version())?)
    }

    /// Linear trace at an earlier version still within the retention window
    pub async fn trace_at(&self, start: TraceStart, version: u64) -> ServiceResult<SimpleTrace> {
        let topology = self.snapshot().await;
        Ok(simple_trace(topology.graph(), start, version)?)
    }

    pub async fn outage_trace(&self, start: TraceStart) -> ServiceResult<OutageTrace> {
        let topology = self.snapshot().await;
        Ok(outage_trace(topology.graph(), start, topology.version())?)
    }

    /// Passage view with route segment lengths from the route network
    pub async fn passage_view(&self, span_equipment_id: SpanEquipmentId) -> ServiceResult<PassageView> {
        let topology = self.snapshot().await;
        let segment_ids: Vec<RouteSegmentId> = topology
            .span_equipment(span_equipment_id)
            .map(|e| e.walk.segment_ids().to_vec())
            .unwrap_or_default();
        let lengths = if segment_ids.is_empty() {
            HashMap::new()
        } else {
            self.bounded(self.route_network.segment_lengths(&segment_ids))
                .await?
                .map_err(route_network_failure)?
        };
        Ok(query::span_equipment_passage_view(&topology, span_equipment_id, &lengths)?)
    }

    async fn bounded<F, T>(&self, future: F) -> InfrastructureResult<T>
    where
        F: Future<Output = T>,
    {
        let timeout: Duration = self.config.collaborator_timeout();
        Ok(tokio::time::timeout(timeout, future).await?)
    }

    async fn resolve_walk(&self, segment_ids: &[RouteSegmentId]) -> ServiceResult<ValidatedWalk> {
        match self.bounded(self.route_network.resolve_walk(segment_ids)).await? {
            Ok(walk) => Ok(walk),
            Err(e) if e.is_request_error() => Err(CommandError::ErrorCalculatingWalk(e.to_string()).into()),
            Err(e) => Err(route_network_failure(e).into()),
        }
    }

    async fn resolve_hops(&self, hops: &[RoutingHop]) -> ServiceResult<Vec<ResolvedHop>> {
        let mut resolved = Vec::with_capacity(hops.len());
        for hop in hops {
            resolved.push(match hop {
                RoutingHop::RouteNetworkWalk { segment_ids } => {
                    ResolvedHop::RouteNetworkWalk(self.resolve_walk(segment_ids).await?)
                }
                RoutingHop::ThroughSpanSegments {
                    start_node_id,
                    span_segment_ids,
                } => ResolvedHop::ThroughSpanSegments {
                    start_node_id: *start_node_id,
                    span_segment_ids: span_segment_ids.clone(),
                },
            });
        }
        Ok(resolved)
    }

    /// Collaborator answers the command needs before it can be decided
    async fn resolve(&self, topology: &Topology, command: &TopologyCommand) -> ServiceResult<Resolution> {
        use TopologyCommand as C;

        match command {
            C::PlaceSpanEquipmentInRouteNetwork(c) => Ok(Resolution::Walk(ResolvedWalk {
                walk_of_interest_id: WalkOfInterestId::new(),
                walk: self.resolve_walk(&c.route_segment_ids).await?,
            })),
            C::MoveSpanEquipment(c) => {
                // unknown equipment is reported by the handler
                let walk_of_interest_id = topology
                    .span_equipment(c.span_equipment_id)
                    .map(|e| e.walk_of_interest_id)
                    .unwrap_or_default();
                Ok(Resolution::Walk(ResolvedWalk {
                    walk_of_interest_id,
                    walk: self.resolve_walk(&c.route_segment_ids).await?,
                }))
            }
            C::PlaceSpanEquipmentInUtilityNetwork(c) => Ok(Resolution::Hops {
                walk_of_interest_id: WalkOfInterestId::new(),
                hops: self.resolve_hops(&c.hops).await?,
            }),
            C::AffixSpanEquipmentToParent(c) => Ok(Resolution::Hops {
                walk_of_interest_id: topology
                    .span_equipment(c.span_equipment_id)
                    .map(|e| e.walk_of_interest_id)
                    .unwrap_or_default(),
                hops: self.resolve_hops(&c.hops).await?,
            }),
            C::PlaceNodeContainerInRouteNetwork(c) => {
                let exists = self
                    .bounded(self.route_network.contains_node(c.route_node_id))
                    .await?
                    .map_err(route_network_failure)?;
                if !exists {
                    return Err(CommandError::RouteNodeNotFound(c.route_node_id).into());
                }
                Ok(Resolution::None)
            }
            _ => Ok(Resolution::None),
        }
    }

    /// Keep the route network's walks of interest in step with the commit
    async fn register_interests(&self, before: &Topology, after: &Topology, events: &[TopologyEvent]) {
        let mut register: Vec<(WalkOfInterestId, ValidatedWalk)> = Vec::new();
        let mut unregister: Vec<WalkOfInterestId> = Vec::new();

        for event in events {
            let TopologyEvent::SpanEquipment(event) = event else {
                continue;
            };
            let id = event.span_equipment_id();
            match event {
                SpanEquipmentEvent::SpanEquipmentRemoved(_) => {
                    if let Some(equipment) = before.span_equipment(id) {
                        unregister.push(equipment.walk_of_interest_id);
                    }
                }
                SpanEquipmentEvent::SpanEquipmentMerged(e) => {
                    if let Some(absorbed) = before.span_equipment(e.absorbed_span_equipment_id) {
                        unregister.push(absorbed.walk_of_interest_id);
                    }
                    register.push((e.merged.walk_of_interest_id, e.merged.walk.clone()));
                }
                SpanEquipmentEvent::SpanEquipmentPlaced(_)
                | SpanEquipmentEvent::SpanEquipmentMoved(_)
                | SpanEquipmentEvent::SpanEquipmentRerouted(_)
                | SpanEquipmentEvent::SpanEquipmentAffixedToParent(_) => {
                    if let Some(equipment) = after.span_equipment(id) {
                        register.push((equipment.walk_of_interest_id, equipment.walk.clone()));
                    }
                }
                _ => {}
            }
        }

        for (id, walk) in register {
            let result = self
                .bounded(self.route_network.register_walk_of_interest(id, &walk))
                .await
                .and_then(|r| r.map_err(route_network_failure));
            if let Err(e) = result {
                warn!(walk_of_interest_id = %id, "Walk of interest registration failed: {}", e);
            }
        }
        for id in unregister {
            let result = self
                .bounded(self.route_network.unregister_walk_of_interest(id))
                .await
                .and_then(|r| r.map_err(route_network_failure));
            if let Err(e) = result {
                warn!(walk_of_interest_id = %id, "Walk of interest removal failed: {}", e);
            }
        }
    }
}

fn route_network_failure(e: RouteNetworkError) -> InfrastructureError {
    InfrastructureError::RouteNetwork(e.to_string())
}
