//! Loads a [`Model`] from a TOML manifest plus a CSV `atom_site` table.
//!
//! ```toml
//! label = "1abc"
//! atom-site = "atoms.csv"
//!
//! [[entity]]
//! id = "1"
//! type = "polymer"
//!
//! [[assembly]]
//! id = "1"
//! [[assembly.group]]
//! asym-ids = ["A"]
//! [[assembly.group.operator]]
//! name = "2"
//! translation = [10.0, 0.0, 0.0]
//! ```
//!
//! CSV headers use mmCIF `atom_site` field names. Empty cells as well as `.`
//! and `?` are treated as missing.

use crate::core::models::ModelError;
use crate::core::models::assembly::{Assembly, OperatorGroup};
use crate::core::models::builder::{AtomRow, CoarseRow, ModelBuilder, ResidueRow};
use crate::core::models::cross_link::{CrossLinkRow, RestraintEnd};
use crate::core::models::entity::{EntityRow, EntityType};
use crate::core::models::model::Model;
use crate::core::models::operator::{AssemblyInfo, SymmetryOperator};
use crate::core::utils::identifiers::is_water_component;
use nalgebra::{Matrix3, Matrix4, Point3, Vector3};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, instrument};

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("CSV parsing error for '{path}': {source}")]
    Csv { path: String, source: csv::Error },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
    #[error("Invalid model in '{path}': {source}")]
    Model { path: String, source: ModelError },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct Manifest {
    label: Option<String>,
    model_num: Option<i32>,
    atom_site: Option<PathBuf>,
    #[serde(default, rename = "entity")]
    entities: Vec<EntitySpec>,
    #[serde(default, rename = "assembly")]
    assemblies: Vec<AssemblySpec>,
    #[serde(default, rename = "chem-comp-bond")]
    component_bonds: Vec<ComponentBondSpec>,
    #[serde(default, rename = "cross-link")]
    cross_links: Vec<CrossLinkSpec>,
    #[serde(default, rename = "sphere")]
    spheres: Vec<CoarseSpec>,
    #[serde(default, rename = "gaussian")]
    gaussians: Vec<CoarseSpec>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct EntitySpec {
    id: String,
    #[serde(rename = "type")]
    entity_type: Option<String>,
    src_method: Option<String>,
    description: Option<String>,
    formula_weight: Option<f64>,
    number_of_molecules: Option<i64>,
    details: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct AssemblySpec {
    id: String,
    #[serde(default)]
    details: String,
    #[serde(default, rename = "group")]
    groups: Vec<OperatorGroupSpec>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct OperatorGroupSpec {
    asym_ids: Vec<String>,
    #[serde(default, rename = "operator")]
    operators: Vec<OperatorSpec>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct OperatorSpec {
    name: String,
    /// Row-major 3x3 rotation; identity when omitted.
    rotation: Option<[[f64; 3]; 3]>,
    #[serde(default)]
    translation: [f64; 3],
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct ComponentBondSpec {
    comp_id: String,
    atom_1: String,
    atom_2: String,
    #[serde(default = "default_bond_order")]
    order: String,
    #[serde(default)]
    aromatic: bool,
}

fn default_bond_order() -> String {
    "sing".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct CrossLinkSpec {
    asym_id_1: String,
    seq_id_1: i64,
    atom_id_1: Option<String>,
    asym_id_2: String,
    seq_id_2: i64,
    atom_id_2: Option<String>,
    #[serde(rename = "type")]
    restraint_type: String,
    distance_threshold: f64,
    psi: Option<f64>,
    sigma_1: Option<f64>,
    sigma_2: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct CoarseSpec {
    entity_id: String,
    asym_id: String,
    seq_begin: i64,
    seq_end: i64,
    x: f64,
    y: f64,
    z: f64,
    #[serde(default = "default_coarse_radius")]
    radius: f64,
}

fn default_coarse_radius() -> f64 {
    1.0
}

/// One CSV row of `atom_site`.
#[derive(Debug, Clone, Deserialize)]
struct AtomSiteRecord {
    #[serde(rename = "group_PDB", default)]
    group_pdb: Option<String>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    id: Option<i64>,
    type_symbol: String,
    label_atom_id: String,
    #[serde(default)]
    label_alt_id: Option<String>,
    label_comp_id: String,
    label_asym_id: String,
    #[serde(default)]
    label_entity_id: Option<String>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    label_seq_id: Option<i64>,
    #[serde(rename = "pdbx_PDB_ins_code", default)]
    ins_code: Option<String>,
    #[serde(rename = "Cartn_x")]
    x: f64,
    #[serde(rename = "Cartn_y")]
    y: f64,
    #[serde(rename = "Cartn_z")]
    z: f64,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    occupancy: Option<f64>,
    #[serde(rename = "B_iso_or_equiv", default, deserialize_with = "csv::invalid_option")]
    b_factor: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pdbx_formal_charge: Option<i64>,
    #[serde(default)]
    auth_atom_id: Option<String>,
    #[serde(default)]
    auth_comp_id: Option<String>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    auth_seq_id: Option<i64>,
    #[serde(default)]
    auth_asym_id: Option<String>,
}

/// `None` for empty cells and the CIF missing-value markers.
fn cell(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty() && *v != "." && *v != "?")
        .map(str::to_string)
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

/// Reads the manifest at `path` and the files it references.
#[instrument(skip_all, name = "model_source", fields(path = %path.display()))]
pub fn load_model(path: &Path) -> Result<Model, SourceError> {
    let content = std::fs::read_to_string(path).map_err(|e| SourceError::Io {
        path: path_string(path),
        source: e,
    })?;
    let manifest: Manifest = toml::from_str(&content).map_err(|e| SourceError::Toml {
        path: path_string(path),
        source: e,
    })?;

    let base = path.parent().unwrap_or_else(|| Path::new("."));
    let records = match &manifest.atom_site {
        Some(csv_path) => read_atom_site(&base.join(csv_path))?,
        None => Vec::new(),
    };
    debug!(atoms = records.len(), "Read atom_site table.");

    let default_label = path
        .file_stem()
        .map_or_else(|| "model".to_string(), |s| s.to_string_lossy().to_string());
    let model = build_model(manifest, &records, default_label).map_err(|e| SourceError::Model {
        path: path_string(path),
        source: e,
    })?;
    info!(
        label = %model.label,
        atoms = model.atomic_hierarchy.atom_count(),
        chains = model.atomic_hierarchy.chain_count(),
        "Model loaded."
    );
    Ok(model)
}

fn read_atom_site(path: &Path) -> Result<Vec<AtomSiteRecord>, SourceError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| SourceError::Csv {
            path: path_string(path),
            source: e,
        })?;
    reader
        .deserialize::<AtomSiteRecord>()
        .map(|r| {
            r.map_err(|e| SourceError::Csv {
                path: path_string(path),
                source: e,
            })
        })
        .collect()
}

/// Entity type for entities declared without one: water when every residue
/// referencing it is a water component, polymer when all have sequence ids.
fn infer_entity_type(entity_id: &str, records: &[AtomSiteRecord]) -> EntityType {
    let mut rows = records
        .iter()
        .filter(|r| cell(&r.label_entity_id).as_deref() == Some(entity_id))
        .peekable();
    if rows.peek().is_none() {
        return EntityType::Unknown;
    }
    let (mut all_water, mut all_sequenced) = (true, true);
    for r in rows {
        all_water &= is_water_component(&r.label_comp_id);
        all_sequenced &= r.label_seq_id.is_some();
    }
    if all_water {
        EntityType::Water
    } else if all_sequenced {
        EntityType::Polymer
    } else {
        EntityType::NonPolymer
    }
}

fn operator(spec: &OperatorSpec, assembly_id: &str, index: usize) -> SymmetryOperator {
    let mut matrix = Matrix4::identity();
    if let Some(r) = spec.rotation {
        let rotation = Matrix3::from_fn(|i, j| r[i][j]);
        matrix.fixed_view_mut::<3, 3>(0, 0).copy_from(&rotation);
    }
    matrix
        .fixed_view_mut::<3, 1>(0, 3)
        .copy_from(&Vector3::from(spec.translation));
    SymmetryOperator::create(
        spec.name.clone(),
        matrix,
        Some(AssemblyInfo {
            id: assembly_id.to_string(),
            oper_id: index + 1,
            oper_list: vec![spec.name.clone()],
        }),
    )
}

fn build_model(manifest: Manifest, records: &[AtomSiteRecord], default_label: String) -> Result<Model, ModelError> {
    let mut builder = ModelBuilder::new(manifest.label.as_deref().unwrap_or(&default_label));
    builder.model_num(manifest.model_num.unwrap_or(1));

    for e in manifest.entities {
        let entity_type = match &e.entity_type {
            Some(t) => t.parse().unwrap_or_default(),
            None => infer_entity_type(&e.id, records),
        };
        builder.add_entity_row(EntityRow {
            id: e.id,
            entity_type,
            src_method: e.src_method,
            description: e.description,
            formula_weight: e.formula_weight,
            number_of_molecules: e.number_of_molecules,
            details: e.details,
        });
    }

    let mut chain: Option<&str> = None;
    let mut residue: Option<(Option<i64>, &str, Option<String>)> = None;
    for r in records {
        if chain != Some(r.label_asym_id.as_str()) {
            let auth_asym = cell(&r.auth_asym_id).unwrap_or_else(|| r.label_asym_id.clone());
            let entity = cell(&r.label_entity_id).unwrap_or_default();
            builder.start_chain(&r.label_asym_id, &auth_asym, &entity);
            chain = Some(r.label_asym_id.as_str());
            residue = None;
        }
        let key = (r.label_seq_id, r.label_comp_id.as_str(), cell(&r.ins_code));
        if residue.as_ref() != Some(&key) {
            builder.start_residue_row(ResidueRow {
                comp_id: r.label_comp_id.clone(),
                seq_id: r.label_seq_id,
                auth_seq_id: r.auth_seq_id,
                auth_comp_id: cell(&r.auth_comp_id),
                ins_code: key.2.clone(),
                group_pdb: cell(&r.group_pdb),
            });
            residue = Some(key);
        }
        builder.add_atom_row(AtomRow {
            id: r.id,
            type_symbol: r.type_symbol.clone(),
            label_atom_id: r.label_atom_id.clone(),
            auth_atom_id: cell(&r.auth_atom_id),
            alt_id: cell(&r.label_alt_id),
            position: Point3::new(r.x, r.y, r.z),
            occupancy: r.occupancy,
            b_factor: r.b_factor,
            formal_charge: r.pdbx_formal_charge,
        });
    }

    for (entity, asym, rows) in group_coarse(manifest.spheres) {
        builder.add_spheres(&entity, &asym, rows);
    }
    for (entity, asym, rows) in group_coarse(manifest.gaussians) {
        builder.add_gaussians(&entity, &asym, rows);
    }

    for a in manifest.assemblies {
        let operator_groups = a
            .groups
            .iter()
            .map(|g| OperatorGroup {
                asym_ids: g.asym_ids.clone(),
                operators: g
                    .operators
                    .iter()
                    .enumerate()
                    .map(|(i, op)| operator(op, &a.id, i))
                    .collect(),
            })
            .collect();
        builder.add_assembly(Assembly {
            id: a.id,
            details: a.details,
            operator_groups,
        });
    }

    for b in &manifest.component_bonds {
        builder.add_component_bond(&b.comp_id, &b.atom_1, &b.atom_2, &b.order, b.aromatic);
    }

    for c in manifest.cross_links {
        builder.add_cross_link(CrossLinkRow {
            end_1: RestraintEnd {
                asym_id: c.asym_id_1,
                seq_id: c.seq_id_1,
                atom_id: c.atom_id_1,
            },
            end_2: RestraintEnd {
                asym_id: c.asym_id_2,
                seq_id: c.seq_id_2,
                atom_id: c.atom_id_2,
            },
            restraint_type: c.restraint_type,
            distance_threshold: c.distance_threshold,
            psi: c.psi,
            sigma_1: c.sigma_1,
            sigma_2: c.sigma_2,
        });
    }

    builder.build()
}

/// Groups consecutive rows of the same chain into one coarse chain segment.
fn group_coarse(specs: Vec<CoarseSpec>) -> Vec<(String, String, Vec<CoarseRow>)> {
    let mut chains: Vec<(String, String, Vec<CoarseRow>)> = Vec::new();
    for s in specs {
        let row = CoarseRow {
            seq_id_begin: s.seq_begin,
            seq_id_end: s.seq_end,
            position: Point3::new(s.x, s.y, s.z),
            radius: s.radius,
        };
        match chains.last_mut() {
            Some((entity, asym, rows)) if *entity == s.entity_id && *asym == s.asym_id => rows.push(row),
            _ => chains.push((s.entity_id, s.asym_id, vec![row])),
        }
    }
    chains
}

/// Entity ids referenced by the atom table but not declared in the manifest.
pub fn undeclared_entities(model: &Model) -> Vec<String> {
    let chains = &model.atomic_hierarchy.chains;
    let missing: BTreeSet<&str> = model
        .atomic_hierarchy
        .chain_entity
        .iter()
        .enumerate()
        .filter(|(_, entity)| entity.is_none())
        .map(|(chain, _)| chains.label_entity_id.value(chain).as_str())
        .collect();
    missing.into_iter().map(str::to_string).collect()
}
