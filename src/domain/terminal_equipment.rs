// Copyright (c) 2025 - Cowboy AI, Inc.
//! Terminal Equipment Entities
//!
//! Splice closures, patch panels, splitter shelves and active equipment.
//! Terminals are the individually addressable connection points of the
//! connectivity graph; terminal links are direct terminal-to-terminal patches.

use serde::{Deserialize, Serialize};

use super::ids::{
    NodeContainerId, RouteNodeId, SpecificationId, TerminalEquipmentId, TerminalId,
    TerminalLinkId, TerminalStructureId,
};
use super::specification::{
    CatalogError, SpecificationCatalog, TerminalDirection, TerminalEquipmentSpecification,
    TerminalStructureKind, TerminalStructureSpecification,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Terminal {
    pub id: TerminalId,
    pub name: String,
    pub direction: TerminalDirection,
    pub is_pigtail: bool,
    pub is_splice: bool,
}

/// Physical network interface identity carried by an interface card
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceInfo {
    pub interface_name: Option<String>,
    pub slot_number: Option<u16>,
    pub sub_slot_number: Option<u16>,
    pub port_number: Option<u16>,
    pub circuit_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminalStructure {
    pub id: TerminalStructureId,
    pub specification_id: SpecificationId,
    pub position: u16,
    pub kind: TerminalStructureKind,
    pub terminals: Vec<Terminal>,
    pub interface_info: Option<InterfaceInfo>,
    pub deleted: bool,
}

impl TerminalStructure {
    /// Instantiate a structure with fresh terminal ids
    pub fn from_specification(spec: &TerminalStructureSpecification, position: u16) -> Self {
        Self {
            id: TerminalStructureId::new(),
            specification_id: spec.id,
            position,
            kind: spec.kind,
            terminals: spec
                .terminal_templates
                .iter()
                .map(|template| Terminal {
                    id: TerminalId::new(),
                    name: template.name.clone(),
                    direction: template.direction,
                    is_pigtail: template.is_pigtail,
                    is_splice: template.is_splice,
                })
                .collect(),
            interface_info: None,
            deleted: false,
        }
    }

    pub fn is_splitter(&self) -> bool {
        self.kind == TerminalStructureKind::Splitter
    }

    pub fn terminal(&self, terminal_id: TerminalId) -> Option<&Terminal> {
        self.terminals.iter().find(|t| t.id == terminal_id)
    }
}

/// Terminal equipment aggregate state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminalEquipment {
    pub id: TerminalEquipmentId,
    pub specification_id: SpecificationId,
    pub name: Option<String>,
    pub node_container_id: NodeContainerId,
    pub route_node_id: RouteNodeId,
    pub terminal_structures: Vec<TerminalStructure>,
    pub deleted: bool,
}

impl TerminalEquipment {
    pub fn from_specification(
        id: TerminalEquipmentId,
        spec: &TerminalEquipmentSpecification,
        catalog: &SpecificationCatalog,
        name: Option<String>,
        node_container_id: NodeContainerId,
        route_node_id: RouteNodeId,
    ) -> Result<Self, CatalogError> {
        let mut terminal_structures = Vec::with_capacity(spec.structure_templates.len());
        for template in &spec.structure_templates {
            let structure_spec = catalog
                .terminal_structure(template.terminal_structure_specification_id)
                .ok_or(CatalogError::UnknownTerminalStructureSpecification(
                    template.terminal_structure_specification_id,
                ))?;
            terminal_structures.push(TerminalStructure::from_specification(structure_spec, template.position));
        }
        terminal_structures.sort_by_key(|s| s.position);

        Ok(Self {
            id,
            specification_id: spec.id,
            name,
            node_container_id,
            route_node_id,
            terminal_structures,
            deleted: false,
        })
    }

    pub fn live_structures(&self) -> impl Iterator<Item = &TerminalStructure> {
        self.terminal_structures.iter().filter(|s| !s.deleted)
    }

    pub fn structure(&self, structure_id: TerminalStructureId) -> Option<&TerminalStructure> {
        self.live_structures().find(|s| s.id == structure_id)
    }

    pub fn structure_mut(&mut self, structure_id: TerminalStructureId) -> Option<&mut TerminalStructure> {
        self.terminal_structures
            .iter_mut()
            .find(|s| s.id == structure_id && !s.deleted)
    }

    /// Live terminal with its owning structure
    pub fn terminal(&self, terminal_id: TerminalId) -> Option<(&TerminalStructure, &Terminal)> {
        self.live_structures()
            .find_map(|structure| structure.terminal(terminal_id).map(|t| (structure, t)))
    }

    pub fn terminal_ids(&self) -> impl Iterator<Item = TerminalId> + '_ {
        self.live_structures()
            .flat_map(|structure| structure.terminals.iter().map(|t| t.id))
    }

    pub fn next_structure_position(&self) -> u16 {
        self.terminal_structures
            .iter()
            .filter(|s| !s.deleted)
            .map(|s| s.position)
            .max()
            .map_or(1, |p| p + 1)
    }

    pub fn has_structure_at(&self, position: u16) -> bool {
        self.live_structures().any(|s| s.position == position)
    }
}

/// Direct terminal-to-terminal patch (jumper)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerminalLink {
    pub id: TerminalLinkId,
    pub from_terminal_id: TerminalId,
    pub to_terminal_id: TerminalId,
    pub route_node_id: RouteNodeId,
    /// Fiber length in meters, when known
    pub fiber_coord_length: Option<f64>,
}

impl TerminalLink {
    pub fn other_end(&self, terminal_id: TerminalId) -> Option<TerminalId> {
        if self.from_terminal_id == terminal_id {
            Some(self.to_terminal_id)
        } else if self.to_terminal_id == terminal_id {
            Some(self.from_terminal_id)
        } else {
            None
        }
    }

    pub fn links(&self, a: TerminalId, b: TerminalId) -> bool {
        (self.from_terminal_id == a && self.to_terminal_id == b)
            || (self.from_terminal_id == b && self.to_terminal_id == a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::specification::{TerminalStructureTemplate, TerminalTemplate};

    fn splitter_spec() -> TerminalStructureSpecification {
        let mut templates = vec![TerminalTemplate {
            name: "in".into(),
            direction: TerminalDirection::In,
            is_pigtail: false,
            is_splice: true,
        }];
        templates.extend((1..=4).map(|i| TerminalTemplate {
            name: format!("out{i}"),
            direction: TerminalDirection::Out,
            is_pigtail: false,
            is_splice: true,
        }));
        TerminalStructureSpecification {
            id: SpecificationId::new(),
            category: "splitter".into(),
            name: "1:4".into(),
            kind: TerminalStructureKind::Splitter,
            terminal_templates: templates,
        }
    }

    #[test]
    fn test_terminal_equipment_from_specification() {
        let mut catalog = SpecificationCatalog::new();
        let structure = splitter_spec();
        catalog.add_terminal_structure(structure.clone()).unwrap();
        let spec = TerminalEquipmentSpecification {
            id: SpecificationId::new(),
            category: "splitter shelf".into(),
            name: "2x 1:4".into(),
            is_rack_equipment: true,
            height_in_rack_units: 1,
            structure_templates: vec![
                TerminalStructureTemplate { terminal_structure_specification_id: structure.id, position: 2 },
                TerminalStructureTemplate { terminal_structure_specification_id: structure.id, position: 1 },
            ],
        };

        let equipment = TerminalEquipment::from_specification(
            TerminalEquipmentId::new(),
            &spec,
            &catalog,
            Some("S1".into()),
            NodeContainerId::new(),
            RouteNodeId::new(),
        )
        .unwrap();

        assert_eq!(equipment.terminal_structures.len(), 2);
        assert_eq!(equipment.terminal_structures[0].position, 1);
        assert_eq!(equipment.terminal_ids().count(), 10);
        assert_eq!(equipment.next_structure_position(), 3);

        let first = equipment.terminal_structures[0].terminals[0].id;
        let (owner, terminal) = equipment.terminal(first).unwrap();
        assert!(owner.is_splitter());
        assert_eq!(terminal.direction, TerminalDirection::In);
    }

    #[test]
    fn test_terminal_link_other_end() {
        let a = TerminalId::new();
        let b = TerminalId::new();
        let link = TerminalLink {
            id: TerminalLinkId::new(),
            from_terminal_id: a,
            to_terminal_id: b,
            route_node_id: RouteNodeId::new(),
            fiber_coord_length: None,
        };
        assert_eq!(link.other_end(a), Some(b));
        assert_eq!(link.other_end(b), Some(a));
        assert!(link.links(b, a));
        assert_eq!(link.other_end(TerminalId::new()), None);
    }
}
