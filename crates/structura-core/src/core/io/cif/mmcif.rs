use super::CifExportError;
use super::encoder::{CategoryDefinition, CategoryInstance, CifEncoder, FieldDefinition};
use crate::core::models::component_bond::ComponentBondTable;
use crate::core::models::column::ValueKind;
use crate::core::models::entity::{Entities, EntityType};
use crate::core::models::hierarchy::{AtomTable, AtomicHierarchy, ChainTable, ResidueTable};
use crate::core::models::ModelError;
use crate::core::models::ids::{ChainIndex, ElementIndex, ResidueIndex};
use crate::core::models::model::Model;
use crate::engine::error::EngineError;
use crate::engine::structure::structure::Structure;
use crate::engine::structure::unit::Unit;
use std::collections::HashSet;
use std::io::Write;
use tracing::{debug, info, instrument};

/// Row key of `atom_site`: a unit position in the structure, a model element,
/// and the element's residue and chain rows.
#[derive(Debug, Clone, Copy, PartialEq)]
struct AtomKey {
    unit: usize,
    element: ElementIndex,
    residue: ResidueIndex,
    chain: ChainIndex,
}

fn atom_key(h: &AtomicHierarchy, unit: usize, element: ElementIndex) -> Result<AtomKey, CifExportError> {
    let out_of_range = || {
        EngineError::from(ModelError::IndexOutOfRange {
            index: element,
            len: h.atom_count(),
        })
    };
    let residue = h.residue_index(element).ok_or_else(out_of_range)?;
    let chain = h.chain_index(element).ok_or_else(out_of_range)?;
    Ok(AtomKey {
        unit,
        element,
        residue,
        chain,
    })
}

type EntityField = FieldDefinition<usize, Entities>;
type AtomField = FieldDefinition<AtomKey, Structure>;
type BondField = FieldDefinition<usize, ComponentBondTable>;

fn entity_category() -> CategoryDefinition<usize, Entities> {
    CategoryDefinition {
        name: "entity",
        fields: vec![
            EntityField::str("id", |&i, e| e.id.value(i).clone()),
            EntityField::str("type", |&i, e| e.entity_type.value(i).as_str().to_string())
                .with_value_kind(|&i, e| match e.entity_type.value(i) {
                    EntityType::Unknown => ValueKind::Unknown,
                    _ => e.entity_type.value_kind(i),
                }),
            EntityField::str("src_method", |&i, e| e.src_method.value(i).clone())
                .with_value_kind(|&i, e| e.src_method.value_kind(i)),
            EntityField::str("pdbx_description", |&i, e| e.pdbx_description.value(i).clone())
                .with_value_kind(|&i, e| e.pdbx_description.value_kind(i)),
            EntityField::float("formula_weight", |&i, e| *e.formula_weight.value(i))
                .with_value_kind(|&i, e| e.formula_weight.value_kind(i)),
            EntityField::int("pdbx_number_of_molecules", |&i, e| *e.pdbx_number_of_molecules.value(i))
                .with_value_kind(|&i, e| e.pdbx_number_of_molecules.value_kind(i)),
            EntityField::str("details", |&i, e| e.details.value(i).clone())
                .with_value_kind(|&i, e| e.details.value_kind(i)),
        ],
    }
}

fn unit<'s>(k: &AtomKey, s: &'s Structure) -> &'s Unit {
    &s.units()[k.unit]
}

fn hierarchy<'s>(k: &AtomKey, s: &'s Structure) -> &'s AtomicHierarchy {
    &unit(k, s).model().atomic_hierarchy
}

fn atoms<'s>(k: &AtomKey, s: &'s Structure) -> &'s AtomTable {
    &hierarchy(k, s).atoms
}

/// Residue table and the key's residue row.
fn residue<'s>(k: &AtomKey, s: &'s Structure) -> (&'s ResidueTable, usize) {
    (&hierarchy(k, s).residues, k.residue)
}

fn chain<'s>(k: &AtomKey, s: &'s Structure) -> (&'s ChainTable, usize) {
    (&hierarchy(k, s).chains, k.chain)
}

fn atom_site_category() -> CategoryDefinition<AtomKey, Structure> {
    CategoryDefinition {
        name: "atom_site",
        fields: vec![
            AtomField::str("group_PDB", |k, s| {
                let (r, i) = residue(k, s);
                r.group_pdb.value(i).clone()
            }),
            AtomField::int("id", |k, s| *atoms(k, s).id.value(k.element)),
            AtomField::str("type_symbol", |k, s| atoms(k, s).type_symbol.value(k.element).clone()),
            AtomField::str("label_atom_id", |k, s| atoms(k, s).label_atom_id.value(k.element).clone()),
            AtomField::str("label_alt_id", |k, s| atoms(k, s).label_alt_id.value(k.element).clone())
                .with_value_kind(|k, s| atoms(k, s).label_alt_id.value_kind(k.element)),
            AtomField::str("label_comp_id", |k, s| {
                let (r, i) = residue(k, s);
                r.label_comp_id.value(i).clone()
            }),
            AtomField::int("label_seq_id", |k, s| {
                let (r, i) = residue(k, s);
                *r.label_seq_id.value(i)
            })
            .with_value_kind(|k, s| {
                let (r, i) = residue(k, s);
                r.label_seq_id.value_kind(i)
            }),
            AtomField::str("pdbx_PDB_ins_code", |k, s| {
                let (r, i) = residue(k, s);
                r.pdbx_pdb_ins_code.value(i).clone()
            })
            .with_value_kind(|k, s| {
                let (r, i) = residue(k, s);
                r.pdbx_pdb_ins_code.value_kind(i)
            }),
            AtomField::str("label_asym_id", |k, s| {
                let (c, i) = chain(k, s);
                c.label_asym_id.value(i).clone()
            }),
            AtomField::str("label_entity_id", |k, s| {
                let (c, i) = chain(k, s);
                c.label_entity_id.value(i).clone()
            }),
            AtomField::float("Cartn_x", |k, s| unit(k, s).position(k.element).x),
            AtomField::float("Cartn_y", |k, s| unit(k, s).position(k.element).y),
            AtomField::float("Cartn_z", |k, s| unit(k, s).position(k.element).z),
            AtomField::float_with_precision("occupancy", 2, |k, s| *atoms(k, s).occupancy.value(k.element)),
            AtomField::int("pdbx_formal_charge", |k, s| *atoms(k, s).pdbx_formal_charge.value(k.element))
                .with_value_kind(|k, s| atoms(k, s).pdbx_formal_charge.value_kind(k.element)),
            AtomField::str("auth_atom_id", |k, s| atoms(k, s).auth_atom_id.value(k.element).clone()),
            AtomField::str("auth_comp_id", |k, s| {
                let (r, i) = residue(k, s);
                r.auth_comp_id.value(i).clone()
            }),
            AtomField::int("auth_seq_id", |k, s| {
                let (r, i) = residue(k, s);
                *r.auth_seq_id.value(i)
            })
            .with_value_kind(|k, s| {
                let (r, i) = residue(k, s);
                r.auth_seq_id.value_kind(i)
            }),
            AtomField::str("auth_asym_id", |k, s| {
                let (c, i) = chain(k, s);
                c.auth_asym_id.value(i).clone()
            }),
            AtomField::int("pdbx_PDB_model_num", |k, s| i64::from(unit(k, s).model().model_num)),
            AtomField::str("pdbx_operator_name", |k, s| unit(k, s).operator().name.clone()),
        ],
    }
}

fn chem_comp_bond_category() -> CategoryDefinition<usize, ComponentBondTable> {
    CategoryDefinition {
        name: "chem_comp_bond",
        fields: vec![
            BondField::str("comp_id", |&i, t| t.comp_id.value(i).clone()),
            BondField::str("atom_id_1", |&i, t| t.atom_id_1.value(i).clone()),
            BondField::str("atom_id_2", |&i, t| t.atom_id_2.value(i).clone()),
            BondField::str("value_order", |&i, t| t.value_order.value(i).clone())
                .with_value_kind(|&i, t| t.value_order.value_kind(i)),
            BondField::str("pdbx_aromatic_flag", |&i, t| t.pdbx_aromatic_flag.value(i).clone())
                .with_value_kind(|&i, t| t.pdbx_aromatic_flag.value_kind(i)),
        ],
    }
}

fn single_model(structure: &Structure) -> Result<&Model, CifExportError> {
    match structure.models() {
        [] => Err(CifExportError::EmptyStructure),
        [model] => Ok(model.as_ref()),
        models => Err(CifExportError::UnsupportedMultiModel {
            count: models.len(),
        }),
    }
}

/// Component bond rows whose residue name occurs in the structure.
fn component_bond_rows(structure: &Structure, model: &Model, table: &ComponentBondTable) -> Vec<usize> {
    let h = &model.atomic_hierarchy;
    let present: HashSet<&str> = structure
        .unique_atomic_residue_indices(model)
        .into_iter()
        .map(|r| h.comp_id_of_residue(r))
        .collect();
    (0..table.len())
        .filter(|&row| present.contains(table.comp_id.value(row).as_str()))
        .collect()
}

/// Serializes a single-model structure as one mmCIF data block.
///
/// Writes `entity` and `atom_site` (atomic units only, ascending unit id then
/// element index), followed by `chem_comp_bond` when the model carries component
/// bonds for residues present in the structure.
///
/// # Errors
///
/// Fails with [`CifExportError::UnsupportedMultiModel`] when units reference more
/// than one model and with [`CifExportError::EmptyStructure`] when there are no units.
#[instrument(skip_all, name = "cif_export", fields(block = name))]
pub fn to_cif_string(name: &str, structure: &Structure) -> Result<String, CifExportError> {
    let model = single_model(structure)?;

    let mut encoder = CifEncoder::new();
    encoder.start_data_block(name);

    let entity = entity_category();
    encoder.write_category(CategoryInstance {
        definition: &entity,
        data: &model.entities,
        keys: Box::new(0..model.entities.len()),
        row_count: model.entities.len(),
    })?;

    let atom_site = atom_site_category();
    let atom_count = structure
        .units()
        .iter()
        .filter(|u| u.is_atomic())
        .map(|u| u.elements().len())
        .sum();
    let keys = structure
        .element_locations()
        .filter(|l| l.unit.is_atomic())
        .map(|l| {
            let unit = structure.unit_index(l.unit_id()).ok_or_else(|| {
                EngineError::Internal(format!("unit {} is not part of the structure", l.unit_id()))
            })?;
            atom_key(&l.unit.model().atomic_hierarchy, unit, l.element)
        })
        .collect::<Result<Vec<_>, CifExportError>>()?;
    encoder.write_category(CategoryInstance {
        definition: &atom_site,
        data: structure,
        keys: Box::new(keys.into_iter()),
        row_count: atom_count,
    })?;
    debug!(atoms = atom_count, entities = model.entities.len(), "Wrote atom_site and entity.");

    if let Some(table) = model.component_bond_table() {
        let rows = component_bond_rows(structure, model, table);
        let chem_comp_bond = chem_comp_bond_category();
        debug!(rows = rows.len(), "Writing chem_comp_bond.");
        encoder.write_category(CategoryInstance {
            definition: &chem_comp_bond,
            data: table,
            row_count: rows.len(),
            keys: Box::new(rows.into_iter()),
        })?;
    }

    let out = encoder.into_string();
    info!(bytes = out.len(), "mmCIF export complete.");
    Ok(out)
}

/// Like [`to_cif_string`], writing the block to `writer`.
pub fn write_cif<W: Write>(writer: &mut W, name: &str, structure: &Structure) -> Result<(), CifExportError> {
    let data = to_cif_string(name, structure)?;
    writer.write_all(data.as_bytes())?;
    writer.flush()?;
    Ok(())
}
