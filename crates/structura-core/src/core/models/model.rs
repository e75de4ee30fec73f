use super::assembly::Assembly;
use super::component_bond::{ComponentBondTable, ComponentBonds};
use super::conformation::Conformation;
use super::cross_link::CrossLinkRestraintTable;
use super::entity::Entities;
use super::hierarchy::{AtomicHierarchy, CoarseHierarchy};
use super::ids::ModelId;
use std::sync::OnceLock;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoarseConformations {
    pub spheres: Conformation,
    pub gaussians: Conformation,
}

/// An immutable macromolecular model, shared between structures as `Arc<Model>`.
///
/// The only mutation allowed after construction is attaching the component-bond
/// table, which happens at most once.
#[derive(Debug)]
pub struct Model {
    pub(crate) id: ModelId,
    pub label: String,
    pub model_num: i32,
    pub entities: Entities,
    pub atomic_hierarchy: AtomicHierarchy,
    pub atomic_conformation: Conformation,
    pub coarse_hierarchy: CoarseHierarchy,
    pub coarse_conformations: CoarseConformations,
    pub assemblies: Vec<Assembly>,
    pub cross_link_restraints: CrossLinkRestraintTable,
    pub(crate) component_bond_table: OnceLock<ComponentBondTable>,
    pub(crate) component_bonds: OnceLock<ComponentBonds>,
}

impl Model {
    pub fn id(&self) -> ModelId {
        self.id
    }

    /// Atom count plus coarse element count.
    pub fn element_count(&self) -> usize {
        self.atomic_hierarchy.atom_count()
            + self.coarse_hierarchy.spheres.count()
            + self.coarse_hierarchy.gaussians.count()
    }

    pub fn assembly(&self, id: &str) -> Option<&Assembly> {
        self.assemblies.iter().find(|a| a.id == id)
    }

    /// Attaches the `chem_comp_bond` table. Returns `false` when the table is empty
    /// or a table is already attached.
    pub fn attach_component_bond_table(&self, table: ComponentBondTable) -> bool {
        if table.is_empty() {
            return false;
        }
        self.component_bond_table.set(table).is_ok()
    }

    pub fn component_bond_table(&self) -> Option<&ComponentBondTable> {
        self.component_bond_table.get()
    }

    /// Component bond lookup, built from the attached table on first access.
    pub fn component_bonds(&self) -> Option<&ComponentBonds> {
        let table = self.component_bond_table.get()?;
        Some(
            self.component_bonds
                .get_or_init(|| ComponentBonds::from_table(table)),
        )
    }
}
