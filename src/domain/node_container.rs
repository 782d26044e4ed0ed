// Copyright (c) 2025 - Cowboy AI, Inc.
//! Node Container Entities
//!
//! A node container is the enclosure (cabinet, manhole, building) at one
//! route node. It owns racks with subrack mounts, plus terminal equipment
//! placed directly in the container without a rack.

use serde::{Deserialize, Serialize};

use super::ids::{NodeContainerId, RackId, RouteNodeId, SpecificationId, TerminalEquipmentId};

/// Rack-mounted terminal equipment; occupies `[position_in_units, position_in_units + height_in_units)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubrackMount {
    pub terminal_equipment_id: TerminalEquipmentId,
    pub position_in_units: u16,
    pub height_in_units: u16,
}

impl SubrackMount {
    pub fn top(&self) -> u16 {
        self.position_in_units + self.height_in_units
    }

    fn overlaps(&self, position: u16, height: u16) -> bool {
        position < self.top() && self.position_in_units < position + height
    }
}

/// Order in which a batch of rack equipment is stacked from the start unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubrackPlacementMethod {
    TopDown,
    BottomUp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rack {
    pub id: RackId,
    pub name: String,
    pub position: u16,
    pub specification_id: SpecificationId,
    pub height_in_units: u16,
    pub subrack_mounts: Vec<SubrackMount>,
}

impl Rack {
    pub fn fits(&self, position: u16, height: u16) -> bool {
        u32::from(position) + u32::from(height) <= u32::from(self.height_in_units)
    }

    /// Whether the unit range is free, optionally ignoring one mount being moved
    pub fn is_free(&self, position: u16, height: u16, ignoring: Option<TerminalEquipmentId>) -> bool {
        self.subrack_mounts
            .iter()
            .filter(|mount| Some(mount.terminal_equipment_id) != ignoring)
            .all(|mount| !mount.overlaps(position, height))
    }

    pub fn mount(&self, terminal_equipment_id: TerminalEquipmentId) -> Option<&SubrackMount> {
        self.subrack_mounts
            .iter()
            .find(|mount| mount.terminal_equipment_id == terminal_equipment_id)
    }
}

/// Node container aggregate state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeContainer {
    pub id: NodeContainerId,
    pub specification_id: SpecificationId,
    pub route_node_id: RouteNodeId,
    pub racks: Vec<Rack>,
    /// Terminal equipment placed directly in the container, not in a rack
    pub terminal_equipment_ids: Vec<TerminalEquipmentId>,
    pub deleted: bool,
}

impl NodeContainer {
    pub fn new(id: NodeContainerId, specification_id: SpecificationId, route_node_id: RouteNodeId) -> Self {
        Self {
            id,
            specification_id,
            route_node_id,
            racks: Vec::new(),
            terminal_equipment_ids: Vec::new(),
            deleted: false,
        }
    }

    pub fn rack(&self, rack_id: RackId) -> Option<&Rack> {
        self.racks.iter().find(|rack| rack.id == rack_id)
    }

    pub fn rack_mut(&mut self, rack_id: RackId) -> Option<&mut Rack> {
        self.racks.iter_mut().find(|rack| rack.id == rack_id)
    }

    pub fn has_rack_named(&self, name: &str) -> bool {
        self.racks.iter().any(|rack| rack.name == name)
    }

    pub fn next_rack_position(&self) -> u16 {
        self.racks.iter().map(|rack| rack.position).max().map_or(1, |p| p + 1)
    }

    /// Rack holding the given terminal equipment
    pub fn rack_of(&self, terminal_equipment_id: TerminalEquipmentId) -> Option<&Rack> {
        self.racks
            .iter()
            .find(|rack| rack.mount(terminal_equipment_id).is_some())
    }

    /// Every terminal equipment in the container, racked or not
    pub fn all_terminal_equipment_ids(&self) -> Vec<TerminalEquipmentId> {
        let mut ids = self.terminal_equipment_ids.clone();
        for rack in &self.racks {
            ids.extend(rack.subrack_mounts.iter().map(|m| m.terminal_equipment_id));
        }
        ids
    }

    pub fn contains_terminal_equipment(&self, terminal_equipment_id: TerminalEquipmentId) -> bool {
        self.terminal_equipment_ids.contains(&terminal_equipment_id)
            || self.rack_of(terminal_equipment_id).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.terminal_equipment_ids.is_empty()
            && self.racks.iter().all(|rack| rack.subrack_mounts.is_empty())
    }

    pub fn remove_terminal_equipment(&mut self, terminal_equipment_id: TerminalEquipmentId) {
        self.terminal_equipment_ids.retain(|id| *id != terminal_equipment_id);
        for rack in &mut self.racks {
            rack.subrack_mounts
                .retain(|mount| mount.terminal_equipment_id != terminal_equipment_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rack(height: u16) -> Rack {
        Rack {
            id: RackId::new(),
            name: "R1".into(),
            position: 1,
            specification_id: SpecificationId::new(),
            height_in_units: height,
            subrack_mounts: vec![],
        }
    }

    #[test]
    fn test_rack_unit_occupancy() {
        let mut rack = rack(10);
        let te = TerminalEquipmentId::new();
        rack.subrack_mounts.push(SubrackMount {
            terminal_equipment_id: te,
            position_in_units: 2,
            height_in_units: 2,
        });

        assert!(!rack.is_free(3, 1, None));
        assert!(rack.is_free(4, 2, None));
        assert!(rack.is_free(0, 2, None));
        assert!(rack.is_free(3, 1, Some(te)));
        assert!(rack.fits(8, 2));
        assert!(!rack.fits(9, 2));
    }

    #[test]
    fn test_container_emptiness_covers_racks() {
        let mut container = NodeContainer::new(NodeContainerId::new(), SpecificationId::new(), RouteNodeId::new());
        assert!(container.is_empty());

        let te = TerminalEquipmentId::new();
        let mut r = rack(42);
        r.subrack_mounts.push(SubrackMount {
            terminal_equipment_id: te,
            position_in_units: 0,
            height_in_units: 1,
        });
        container.racks.push(r);

        assert!(!container.is_empty());
        assert!(container.contains_terminal_equipment(te));
        container.remove_terminal_equipment(te);
        assert!(container.is_empty());
    }
}
