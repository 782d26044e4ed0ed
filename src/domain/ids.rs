// Copyright (c) 2025 - Cowboy AI, Inc.
//! Identity Value Objects
//!
//! Every entity in the topology is addressed by a stable UUID wrapped in a
//! dedicated newtype, so a segment id can never be passed where a terminal
//! id is expected. All cross references in the projection are id lookups.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generate a fresh time-ordered id
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

uuid_id!(
    /// Span equipment aggregate id (conduit, cable)
    SpanEquipmentId
);
uuid_id!(
    /// One level/position slot inside a span equipment
    SpanStructureId
);
uuid_id!(
    /// One cut piece of a span structure
    SpanSegmentId
);
uuid_id!(
    /// Node container aggregate id
    NodeContainerId
);
uuid_id!(RackId);
uuid_id!(
    /// Terminal equipment aggregate id
    TerminalEquipmentId
);
uuid_id!(TerminalStructureId);
uuid_id!(
    /// Atomic connection point; also used for virtual terminals created by
    /// span-to-span connects
    TerminalId
);
uuid_id!(
    /// Direct terminal-to-terminal patch (jumper)
    TerminalLinkId
);
uuid_id!(RouteNodeId);
uuid_id!(RouteSegmentId);
uuid_id!(
    /// Interest registered with the route network for a walk
    WalkOfInterestId
);
uuid_id!(
    /// Catalog entry id (span, terminal, rack and container specifications)
    SpecificationId
);
