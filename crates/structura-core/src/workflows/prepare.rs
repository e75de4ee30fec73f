use crate::core::models::model::Model;
use crate::engine::config::StructureConfig;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::structure::structure::Structure;
use crate::engine::tasks::symmetry::build_assembly;
use std::sync::Arc;
use tracing::{info, instrument};

/// Counts and hashes of a fully prepared structure.
#[derive(Debug, Clone, PartialEq)]
pub struct StructureSummary {
    pub unit_count: usize,
    pub element_count: usize,
    pub polymer_residue_count: usize,
    pub is_coarse: bool,
    pub symmetry_group_count: usize,
    pub intra_unit_bond_count: usize,
    pub inter_unit_bond_count: usize,
    pub cross_link_count: usize,
    pub carbohydrate_count: usize,
    pub carbohydrate_link_count: usize,
    pub carbohydrate_terminal_link_count: usize,
    pub hash_code: i32,
    pub conformation_hash: i32,
}

#[derive(Debug)]
pub struct PreparedStructure {
    pub structure: Structure,
    pub summary: StructureSummary,
}

/// Builds the structure of `model`, expands `assembly` when given, and computes
/// bonds, cross-link restraints, carbohydrates and symmetry groups up front.
#[instrument(skip_all, name = "prepare_workflow")]
pub fn run(
    model: &Arc<Model>,
    assembly: Option<&str>,
    config: &StructureConfig,
    reporter: &ProgressReporter,
) -> Result<PreparedStructure, EngineError> {
    reporter.report(Progress::PhaseStart { name: "Partitioning" });
    let mut structure = Structure::of_model_with_config(model, config.clone())?;
    info!(
        units = structure.units().len(),
        elements = structure.element_count(),
        "Model partitioned into units."
    );
    reporter.report(Progress::PhaseFinish);

    if let Some(id) = assembly {
        reporter.report(Progress::PhaseStart { name: "Assembly" });
        structure = build_assembly(&structure, id)?;
        reporter.report(Progress::Message(format!(
            "Assembly '{id}' has {} units",
            structure.units().len()
        )));
        reporter.report(Progress::PhaseFinish);
    }

    reporter.report(Progress::PhaseStart {
        name: "Intra-Unit Bonds",
    });
    let mut intra_unit_bond_count = 0;
    reporter.run_task(structure.units(), |unit| {
        intra_unit_bond_count += unit.bonds().edge_count();
        Ok::<(), EngineError>(())
    })?;
    reporter.report(Progress::PhaseFinish);

    reporter.report(Progress::PhaseStart {
        name: "Derived Properties",
    });
    let inter_unit_bond_count = structure.links().edge_count();
    let cross_link_count = structure.cross_link_restraints()?.count();
    let carbohydrates = structure.carbohydrates()?;
    let symmetry_group_count = structure.unit_symmetry_groups().len();
    reporter.report(Progress::PhaseFinish);

    let summary = StructureSummary {
        unit_count: structure.units().len(),
        element_count: structure.element_count(),
        polymer_residue_count: structure.polymer_residue_count(),
        is_coarse: structure.is_coarse(),
        symmetry_group_count,
        intra_unit_bond_count,
        inter_unit_bond_count,
        cross_link_count,
        carbohydrate_count: carbohydrates.len(),
        carbohydrate_link_count: carbohydrates.links().len(),
        carbohydrate_terminal_link_count: carbohydrates.terminal_links().len(),
        hash_code: structure.hash_code(),
        conformation_hash: structure.conformation_hash(),
    };
    info!(
        intra_bonds = summary.intra_unit_bond_count,
        inter_bonds = summary.inter_unit_bond_count,
        cross_links = summary.cross_link_count,
        carbohydrates = summary.carbohydrate_count,
        "Structure prepared."
    );

    Ok(PreparedStructure { structure, summary })
}
