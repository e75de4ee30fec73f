use super::ModelError;
use super::assembly::Assembly;
use super::column::Column;
use super::component_bond::ComponentBondTable;
use super::conformation::Conformation;
use super::cross_link::{CrossLinkRestraintTable, CrossLinkRow};
use super::entity::{Entities, EntityRow, EntityType};
use super::hierarchy::{AtomTable, AtomicHierarchy, ChainTable, CoarseElements, CoarseHierarchy, ResidueTable};
use super::ids::ModelId;
use super::model::{CoarseConformations, Model};
use super::segmentation::Segmentation;
use crate::core::utils::identifiers::vdw_radius;
use nalgebra::Point3;
use std::sync::OnceLock;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResidueRow {
    pub comp_id: String,
    pub seq_id: Option<i64>,
    pub auth_seq_id: Option<i64>,
    pub auth_comp_id: Option<String>,
    pub ins_code: Option<String>,
    /// `ATOM` or `HETATM`; derived from the chain's entity type when absent.
    pub group_pdb: Option<String>,
}

impl ResidueRow {
    pub fn new(comp_id: &str, seq_id: i64) -> Self {
        Self {
            comp_id: comp_id.to_string(),
            seq_id: Some(seq_id),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AtomRow {
    /// Serial id; defaults to the 1-based atom index.
    pub id: Option<i64>,
    pub type_symbol: String,
    pub label_atom_id: String,
    pub auth_atom_id: Option<String>,
    pub alt_id: Option<String>,
    pub position: Point3<f64>,
    pub occupancy: Option<f64>,
    pub b_factor: Option<f64>,
    pub formal_charge: Option<i64>,
}

impl AtomRow {
    pub fn new(label_atom_id: &str, type_symbol: &str, position: Point3<f64>) -> Self {
        Self {
            id: None,
            type_symbol: type_symbol.to_string(),
            label_atom_id: label_atom_id.to_string(),
            auth_atom_id: None,
            alt_id: None,
            position,
            occupancy: None,
            b_factor: None,
            formal_charge: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoarseRow {
    pub seq_id_begin: i64,
    pub seq_id_end: i64,
    pub position: Point3<f64>,
    pub radius: f64,
}

#[derive(Default)]
struct CoarseAccumulator {
    entity_id: Column<String>,
    asym_id: Column<String>,
    seq_id_begin: Column<i64>,
    seq_id_end: Column<i64>,
    chain_starts: Vec<usize>,
    positions: Vec<Point3<f64>>,
    radii: Vec<f64>,
}

impl CoarseAccumulator {
    fn add_chain(&mut self, entity_id: &str, asym_id: &str, rows: impl IntoIterator<Item = CoarseRow>) {
        self.chain_starts.push(self.asym_id.len());
        for row in rows {
            self.entity_id.push(entity_id.to_string());
            self.asym_id.push(asym_id.to_string());
            self.seq_id_begin.push(row.seq_id_begin);
            self.seq_id_end.push(row.seq_id_end);
            self.positions.push(row.position);
            self.radii.push(row.radius);
        }
    }

    fn finish(self, entities: &Entities) -> Result<(CoarseElements, Conformation), ModelError> {
        let mut offsets = self.chain_starts;
        offsets.push(self.asym_id.len());
        let entity_index = self
            .entity_id
            .values()
            .iter()
            .map(|id| entities.index_of(id))
            .collect();
        let elements = CoarseElements {
            entity_id: self.entity_id,
            asym_id: self.asym_id,
            seq_id_begin: self.seq_id_begin,
            seq_id_end: self.seq_id_end,
            chain_element_segments: Segmentation::from_offsets(offsets)?,
            entity_index,
        };
        let conformation = Conformation::from_positions(&self.positions, self.radii)?;
        Ok((elements, conformation))
    }
}

/// Incremental construction of a [`Model`], chain by chain and residue by residue.
///
/// Structural misuse (atoms before a residue, empty chains) is recorded and
/// reported by [`ModelBuilder::build`].
pub struct ModelBuilder {
    label: String,
    model_num: i32,
    entities: Entities,
    atoms: AtomTable,
    residues: ResidueTable,
    chains: ChainTable,
    residue_starts: Vec<usize>,
    chain_starts: Vec<usize>,
    positions: Vec<Point3<f64>>,
    radii: Vec<f64>,
    spheres: CoarseAccumulator,
    gaussians: CoarseAccumulator,
    assemblies: Vec<Assembly>,
    cross_links: CrossLinkRestraintTable,
    component_bonds: ComponentBondTable,
    chain_open: bool,
    residue_open: bool,
    current_chain_type: EntityType,
    error: Option<ModelError>,
}

impl ModelBuilder {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            model_num: 1,
            entities: Entities::default(),
            atoms: AtomTable::default(),
            residues: ResidueTable::default(),
            chains: ChainTable::default(),
            residue_starts: Vec::new(),
            chain_starts: Vec::new(),
            positions: Vec::new(),
            radii: Vec::new(),
            spheres: CoarseAccumulator::default(),
            gaussians: CoarseAccumulator::default(),
            assemblies: Vec::new(),
            cross_links: CrossLinkRestraintTable::default(),
            component_bonds: ComponentBondTable::default(),
            chain_open: false,
            residue_open: false,
            current_chain_type: EntityType::Unknown,
            error: None,
        }
    }

    fn fail(&mut self, error: ModelError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    pub fn model_num(&mut self, model_num: i32) -> &mut Self {
        self.model_num = model_num;
        self
    }

    pub fn add_entity(&mut self, id: &str, entity_type: EntityType) -> &mut Self {
        self.add_entity_row(EntityRow {
            id: id.to_string(),
            entity_type,
            ..Default::default()
        })
    }

    pub fn add_entity_row(&mut self, row: EntityRow) -> &mut Self {
        let id = row.id.clone();
        if self.entities.push(row).is_none() {
            self.fail(ModelError::InvalidValue(format!("duplicate entity id '{id}'")));
        }
        self
    }

    pub fn start_chain(&mut self, label_asym_id: &str, auth_asym_id: &str, entity_id: &str) -> &mut Self {
        self.chains.label_asym_id.push(label_asym_id.to_string());
        self.chains.auth_asym_id.push(auth_asym_id.to_string());
        self.chains.label_entity_id.push(entity_id.to_string());
        self.chain_starts.push(self.positions.len());
        self.current_chain_type = self
            .entities
            .index_of(entity_id)
            .map_or(EntityType::Unknown, |e| self.entities.type_of(e));
        self.chain_open = true;
        self.residue_open = false;
        self
    }

    pub fn start_residue(&mut self, comp_id: &str, seq_id: i64) -> &mut Self {
        self.start_residue_row(ResidueRow::new(comp_id, seq_id))
    }

    pub fn start_residue_row(&mut self, row: ResidueRow) -> &mut Self {
        if !self.chain_open {
            self.fail(ModelError::MalformedSegmentation(format!(
                "residue '{}' started outside of a chain",
                row.comp_id
            )));
            return self;
        }
        let group = row.group_pdb.unwrap_or_else(|| {
            match self.current_chain_type {
                EntityType::Polymer => "ATOM",
                _ => "HETATM",
            }
            .to_string()
        });
        let r = &mut self.residues;
        r.group_pdb.push(group);
        r.auth_comp_id
            .push(row.auth_comp_id.unwrap_or_else(|| row.comp_id.clone()));
        r.label_comp_id.push(row.comp_id);
        r.label_seq_id.push_option(row.seq_id);
        r.auth_seq_id.push_option(row.auth_seq_id.or(row.seq_id));
        r.pdbx_pdb_ins_code.push_option(row.ins_code);
        self.residue_starts.push(self.positions.len());
        self.residue_open = true;
        self
    }

    pub fn add_atom(&mut self, label_atom_id: &str, type_symbol: &str, position: Point3<f64>) -> &mut Self {
        self.add_atom_row(AtomRow::new(label_atom_id, type_symbol, position))
    }

    pub fn add_atom_row(&mut self, row: AtomRow) -> &mut Self {
        if !self.residue_open {
            self.fail(ModelError::MalformedSegmentation(format!(
                "atom '{}' added outside of a residue",
                row.label_atom_id
            )));
            return self;
        }
        let index = self.positions.len();
        let a = &mut self.atoms;
        a.id.push(row.id.unwrap_or(index as i64 + 1));
        a.auth_atom_id
            .push(row.auth_atom_id.unwrap_or_else(|| row.label_atom_id.clone()));
        a.label_atom_id.push(row.label_atom_id);
        a.label_alt_id.push_option(row.alt_id);
        a.occupancy.push(row.occupancy.unwrap_or(1.0));
        a.b_iso_or_equiv.push_option(row.b_factor);
        a.pdbx_formal_charge.push_option(row.formal_charge);
        self.radii.push(vdw_radius(&row.type_symbol));
        a.type_symbol.push(row.type_symbol);
        self.positions.push(row.position);
        self
    }

    pub fn add_spheres(
        &mut self,
        entity_id: &str,
        asym_id: &str,
        rows: impl IntoIterator<Item = CoarseRow>,
    ) -> &mut Self {
        self.spheres.add_chain(entity_id, asym_id, rows);
        self
    }

    pub fn add_gaussians(
        &mut self,
        entity_id: &str,
        asym_id: &str,
        rows: impl IntoIterator<Item = CoarseRow>,
    ) -> &mut Self {
        self.gaussians.add_chain(entity_id, asym_id, rows);
        self
    }

    pub fn add_assembly(&mut self, assembly: Assembly) -> &mut Self {
        self.assemblies.push(assembly);
        self
    }

    pub fn add_cross_link(&mut self, row: CrossLinkRow) -> &mut Self {
        self.cross_links.push(row);
        self
    }

    pub fn add_component_bond(
        &mut self,
        comp_id: &str,
        atom_a: &str,
        atom_b: &str,
        value_order: &str,
        aromatic: bool,
    ) -> &mut Self {
        self.component_bonds
            .push(comp_id, atom_a, atom_b, value_order, aromatic);
        self
    }

    pub fn build(self) -> Result<Model, ModelError> {
        if let Some(error) = self.error {
            return Err(error);
        }

        let atom_count = self.positions.len();
        let mut residue_offsets = self.residue_starts;
        residue_offsets.push(atom_count);
        let mut chain_offsets = self.chain_starts;
        chain_offsets.push(atom_count);

        let residue_atom_segments = Segmentation::from_offsets(residue_offsets)?;
        let chain_atom_segments = Segmentation::from_offsets(chain_offsets)?;
        let chain_entity = self
            .chains
            .label_entity_id
            .values()
            .iter()
            .map(|id| self.entities.index_of(id))
            .collect();

        let atomic_conformation = Conformation::from_positions(&self.positions, self.radii)?;
        let (spheres, sphere_conformation) = self.spheres.finish(&self.entities)?;
        let (gaussians, gaussian_conformation) = self.gaussians.finish(&self.entities)?;

        let component_bond_table = OnceLock::new();
        if !self.component_bonds.is_empty() {
            let _ = component_bond_table.set(self.component_bonds);
        }

        Ok(Model {
            id: ModelId::next(),
            label: self.label,
            model_num: self.model_num,
            entities: self.entities,
            atomic_hierarchy: AtomicHierarchy {
                atoms: self.atoms,
                residues: self.residues,
                chains: self.chains,
                residue_atom_segments,
                chain_atom_segments,
                chain_entity,
            },
            atomic_conformation,
            coarse_hierarchy: CoarseHierarchy { spheres, gaussians },
            coarse_conformations: CoarseConformations {
                spheres: sphere_conformation,
                gaussians: gaussian_conformation,
            },
            assemblies: self.assemblies,
            cross_link_restraints: self.cross_links,
            component_bond_table,
            component_bonds: OnceLock::new(),
        })
    }
}
