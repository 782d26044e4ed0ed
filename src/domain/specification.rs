// Copyright (c) 2025 - Cowboy AI, Inc.
//! Equipment Specification Catalog
//!
//! Read-only templates describing how equipment is built: the structure tree
//! of span equipment (outer jacket at level 1, inner tubes below) and the
//! terminal layout of terminal equipment. The catalog validates structural
//! hierarchy rules when specifications are registered, so placement commands
//! can trust every template they expand.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

use super::ids::SpecificationId;

/// Catalog validation error (structural validation family)
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Specification {0} is already registered")]
    DuplicateSpecification(SpecificationId),

    #[error("Root structure must be at level 1, found level {0}")]
    InvalidRootLevel(u8),

    #[error("Structure at level {child} cannot be nested under level {parent}")]
    InvalidChildLevel { parent: u8, child: u8 },

    #[error("Duplicate structure at level {level} position {position}")]
    DuplicateLevelAndPosition { level: u8, position: u16 },

    #[error("Unknown span structure specification {0}")]
    UnknownSpanStructureSpecification(SpecificationId),

    #[error("Unknown terminal structure specification {0}")]
    UnknownTerminalStructureSpecification(SpecificationId),

    #[error("Duplicate terminal structure position {0}")]
    DuplicateStructurePosition(u16),

    #[error("Rack equipment must occupy at least one rack unit")]
    ZeroRackHeight,
}

/// Spec of a single span structure (tube, jacket, fiber bundle)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanStructureSpecification {
    pub id: SpecificationId,
    pub category: String,
    pub name: String,
    pub color: Option<String>,
    pub inner_diameter: Option<u32>,
    pub outer_diameter: Option<u32>,
}

/// Node in a span equipment's structure tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanStructureTemplate {
    pub span_structure_specification_id: SpecificationId,
    pub level: u8,
    pub position: u16,
    pub children: Vec<SpanStructureTemplate>,
}

impl SpanStructureTemplate {
    pub fn new(span_structure_specification_id: SpecificationId, level: u8, position: u16) -> Self {
        Self {
            span_structure_specification_id,
            level,
            position,
            children: Vec::new(),
        }
    }

    pub fn with_child(mut self, child: SpanStructureTemplate) -> Self {
        self.children.push(child);
        self
    }

    /// All templates of the tree ordered by level, then position
    pub fn flatten(&self) -> Vec<&SpanStructureTemplate> {
        let mut all = Vec::new();
        let mut stack = vec![self];
        while let Some(template) = stack.pop() {
            all.push(template);
            stack.extend(template.children.iter());
        }
        all.sort_by_key(|t| (t.level, t.position));
        all
    }
}

/// Conduit or cable specification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanEquipmentSpecification {
    pub id: SpecificationId,
    pub category: String,
    pub name: String,
    /// Fixed equipment cannot have structures added or removed
    pub fixed: bool,
    pub is_cable: bool,
    pub root_template: SpanStructureTemplate,
}

/// Terminal direction; bi-directional terminals pass signal through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TerminalDirection {
    Bi,
    In,
    Out,
}

impl TerminalDirection {
    /// How many connectivity elements may attach to a terminal
    pub fn capacity(&self) -> usize {
        match self {
            TerminalDirection::Bi => 2,
            TerminalDirection::In | TerminalDirection::Out => 1,
        }
    }
}

/// What a terminal structure does with the signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TerminalStructureKind {
    Splice,
    /// Passive splitter: every `In` terminal feeds every `Out` terminal
    Splitter,
    Patch,
    Interface,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminalTemplate {
    pub name: String,
    pub direction: TerminalDirection,
    pub is_pigtail: bool,
    pub is_splice: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminalStructureSpecification {
    pub id: SpecificationId,
    pub category: String,
    pub name: String,
    pub kind: TerminalStructureKind,
    pub terminal_templates: Vec<TerminalTemplate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminalStructureTemplate {
    pub terminal_structure_specification_id: SpecificationId,
    pub position: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminalEquipmentSpecification {
    pub id: SpecificationId,
    pub category: String,
    pub name: String,
    pub is_rack_equipment: bool,
    pub height_in_rack_units: u16,
    pub structure_templates: Vec<TerminalStructureTemplate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeContainerSpecification {
    pub id: SpecificationId,
    pub category: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RackSpecification {
    pub id: SpecificationId,
    pub name: String,
}

/// In-memory specification catalog
#[derive(Debug, Clone, Default)]
pub struct SpecificationCatalog {
    span_structures: HashMap<SpecificationId, SpanStructureSpecification>,
    span_equipment: HashMap<SpecificationId, SpanEquipmentSpecification>,
    terminal_structures: HashMap<SpecificationId, TerminalStructureSpecification>,
    terminal_equipment: HashMap<SpecificationId, TerminalEquipmentSpecification>,
    node_containers: HashMap<SpecificationId, NodeContainerSpecification>,
    racks: HashMap<SpecificationId, RackSpecification>,
}

impl SpecificationCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_span_structure(&mut self, spec: SpanStructureSpecification) -> Result<(), CatalogError> {
        if self.span_structures.contains_key(&spec.id) {
            return Err(CatalogError::DuplicateSpecification(spec.id));
        }
        self.span_structures.insert(spec.id, spec);
        Ok(())
    }

    /// Register a span equipment specification after validating its tree
    pub fn add_span_equipment(&mut self, spec: SpanEquipmentSpecification) -> Result<(), CatalogError> {
        if self.span_equipment.contains_key(&spec.id) {
            return Err(CatalogError::DuplicateSpecification(spec.id));
        }
        self.validate_structure_tree(&spec.root_template)?;
        self.span_equipment.insert(spec.id, spec);
        Ok(())
    }

    pub fn add_terminal_structure(
        &mut self,
        spec: TerminalStructureSpecification,
    ) -> Result<(), CatalogError> {
        if self.terminal_structures.contains_key(&spec.id) {
            return Err(CatalogError::DuplicateSpecification(spec.id));
        }
        self.terminal_structures.insert(spec.id, spec);
        Ok(())
    }

    pub fn add_terminal_equipment(
        &mut self,
        spec: TerminalEquipmentSpecification,
    ) -> Result<(), CatalogError> {
        if self.terminal_equipment.contains_key(&spec.id) {
            return Err(CatalogError::DuplicateSpecification(spec.id));
        }
        if spec.is_rack_equipment && spec.height_in_rack_units == 0 {
            return Err(CatalogError::ZeroRackHeight);
        }
        let mut positions = HashSet::new();
        for template in &spec.structure_templates {
            if !self
                .terminal_structures
                .contains_key(&template.terminal_structure_specification_id)
            {
                return Err(CatalogError::UnknownTerminalStructureSpecification(
                    template.terminal_structure_specification_id,
                ));
            }
            if !positions.insert(template.position) {
                return Err(CatalogError::DuplicateStructurePosition(template.position));
            }
        }
        self.terminal_equipment.insert(spec.id, spec);
        Ok(())
    }

    pub fn add_node_container(&mut self, spec: NodeContainerSpecification) -> Result<(), CatalogError> {
        if self.node_containers.contains_key(&spec.id) {
            return Err(CatalogError::DuplicateSpecification(spec.id));
        }
        self.node_containers.insert(spec.id, spec);
        Ok(())
    }

    pub fn add_rack(&mut self, spec: RackSpecification) -> Result<(), CatalogError> {
        if self.racks.contains_key(&spec.id) {
            return Err(CatalogError::DuplicateSpecification(spec.id));
        }
        self.racks.insert(spec.id, spec);
        Ok(())
    }

    pub fn span_structure(&self, id: SpecificationId) -> Option<&SpanStructureSpecification> {
        self.span_structures.get(&id)
    }

    pub fn span_equipment(&self, id: SpecificationId) -> Option<&SpanEquipmentSpecification> {
        self.span_equipment.get(&id)
    }

    pub fn terminal_structure(&self, id: SpecificationId) -> Option<&TerminalStructureSpecification> {
        self.terminal_structures.get(&id)
    }

    pub fn terminal_equipment(&self, id: SpecificationId) -> Option<&TerminalEquipmentSpecification> {
        self.terminal_equipment.get(&id)
    }

    pub fn node_container(&self, id: SpecificationId) -> Option<&NodeContainerSpecification> {
        self.node_containers.get(&id)
    }

    pub fn rack(&self, id: SpecificationId) -> Option<&RackSpecification> {
        self.racks.get(&id)
    }

    fn validate_structure_tree(&self, root: &SpanStructureTemplate) -> Result<(), CatalogError> {
        if root.level != 1 {
            return Err(CatalogError::InvalidRootLevel(root.level));
        }

        let mut seen = HashSet::new();
        let mut stack = vec![(root, None::<u8>)];
        while let Some((template, parent_level)) = stack.pop() {
            if let Some(parent) = parent_level {
                if template.level != parent + 1 {
                    return Err(CatalogError::InvalidChildLevel {
                        parent,
                        child: template.level,
                    });
                }
            }
            if !self
                .span_structures
                .contains_key(&template.span_structure_specification_id)
            {
                return Err(CatalogError::UnknownSpanStructureSpecification(
                    template.span_structure_specification_id,
                ));
            }
            if !seen.insert((template.level, template.position)) {
                return Err(CatalogError::DuplicateLevelAndPosition {
                    level: template.level,
                    position: template.position,
                });
            }
            for child in &template.children {
                stack.push((child, Some(template.level)));
            }
        }
        Ok(())
    }
}
