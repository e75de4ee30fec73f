use crate::core::utils::hash::{hash1, hash2};
use crate::engine::error::EngineError;
use crate::engine::structure::element::ElementSet;
use crate::engine::structure::structure::{Structure, StructureBuilder};
use crate::engine::structure::unit::Unit;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};

/// Units sharing one element set and differing only by their operator.
#[derive(Debug, Clone)]
pub struct SymmetryGroup {
    pub elements: ElementSet,
    pub units: Vec<Arc<Unit>>,
    pub hash_code: i32,
}

impl SymmetryGroup {
    fn new(units: Vec<Arc<Unit>>) -> Self {
        let elements = units
            .first()
            .map(|u| u.elements().clone())
            .unwrap_or_default();
        let mut hash: i32 = 23;
        for u in &units {
            hash = hash.wrapping_mul(31).wrapping_add(u.id() as i32);
        }
        let hash_code = hash2(hash1(hash), elements.hash_code());
        Self {
            elements,
            units,
            hash_code,
        }
    }

    pub fn invariant_id(&self) -> Option<u32> {
        self.units.first().map(|u| u.invariant_id())
    }
}

/// Groups units by invariant id, in order of first appearance.
pub(crate) fn compute_transform_groups(structure: &Structure) -> Vec<SymmetryGroup> {
    let mut order: Vec<u32> = Vec::new();
    let mut groups: HashMap<u32, Vec<Arc<Unit>>> = HashMap::new();
    for unit in structure.units() {
        groups
            .entry(unit.invariant_id())
            .or_insert_with(|| {
                order.push(unit.invariant_id());
                Vec::new()
            })
            .push(unit.clone());
    }
    order
        .into_iter()
        .filter_map(|id| groups.remove(&id))
        .map(SymmetryGroup::new)
        .collect()
}

/// Replicates the structure's units under every operator of the named assembly.
///
/// Each operator group applies to the units whose chain is listed in the group.
/// Copies get fresh ids and keep the invariant id of their source unit.
#[instrument(skip_all, name = "build_assembly", fields(assembly = %assembly_id))]
pub fn build_assembly(structure: &Structure, assembly_id: &str) -> Result<Structure, EngineError> {
    let assembly = structure
        .models()
        .first()
        .and_then(|m| m.assembly(assembly_id))
        .ok_or_else(|| EngineError::AssemblyNotFound {
            id: assembly_id.to_string(),
        })?;

    let mut builder = StructureBuilder::with_config((**structure.config()).clone());
    for group in &assembly.operator_groups {
        let units: Vec<&Arc<Unit>> = structure
            .units()
            .iter()
            .filter(|u| group.contains_asym_id(u.asym_id()))
            .collect();
        if units.is_empty() {
            continue;
        }
        for operator in &group.operators {
            for unit in &units {
                builder.add_with_operator(unit, operator);
            }
        }
    }

    let assembled = builder.into_structure();
    info!(
        units = assembled.units().len(),
        elements = assembled.element_count(),
        "Assembly built."
    );
    Ok(assembled)
}
