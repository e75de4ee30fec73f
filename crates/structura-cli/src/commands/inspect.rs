use super::prepare_structure;
use crate::cli::InspectArgs;
use crate::error::Result;
use crate::utils::progress::PhaseProgress;
use std::fmt::Write;
use structura::engine::structure::unit::UnitKind;
use structura::workflows::prepare::PreparedStructure;
use tracing::info;

pub fn run(args: InspectArgs, progress: PhaseProgress) -> Result<()> {
    let (model, prepared) = prepare_structure(&args.structure, &progress)?;
    info!(label = %model.label, "Rendering structure report.");
    print!("{}", render_report(&model.label, &prepared, args.units));
    Ok(())
}

fn kind_name(kind: UnitKind) -> &'static str {
    match kind {
        UnitKind::Atomic => "atomic",
        UnitKind::Spheres => "spheres",
        UnitKind::Gaussians => "gaussians",
    }
}

pub fn render_report(label: &str, prepared: &PreparedStructure, list_units: bool) -> String {
    let s = &prepared.summary;
    let mut out = String::new();
    let _ = writeln!(out, "Structure '{label}'");
    let rows: [(&str, String); 12] = [
        ("units", s.unit_count.to_string()),
        ("elements", s.element_count.to_string()),
        ("polymer residues", s.polymer_residue_count.to_string()),
        ("coarse", s.is_coarse.to_string()),
        ("symmetry groups", s.symmetry_group_count.to_string()),
        ("intra-unit bonds", s.intra_unit_bond_count.to_string()),
        ("inter-unit bonds", s.inter_unit_bond_count.to_string()),
        ("cross-links", s.cross_link_count.to_string()),
        ("carbohydrates", s.carbohydrate_count.to_string()),
        (
            "carbohydrate links",
            format!(
                "{} ({} terminal)",
                s.carbohydrate_link_count, s.carbohydrate_terminal_link_count
            ),
        ),
        ("hash", format!("{:#010x}", s.hash_code)),
        ("conformation hash", format!("{:#010x}", s.conformation_hash)),
    ];
    for (name, value) in rows {
        let _ = writeln!(out, "  {name:<20}{value}");
    }

    if list_units {
        let _ = writeln!(out, "Units");
        for unit in prepared.structure.units() {
            let _ = writeln!(
                out,
                "  {:>4}  {:<9} {:<6} {:>8}  {}",
                unit.id(),
                kind_name(unit.kind()),
                unit.asym_id(),
                unit.elements().len(),
                unit.operator().name
            );
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::StructureArgs;
    use crate::commands::fixtures::write_model;

    fn prepared(assembly: Option<&str>) -> (tempfile::TempDir, PreparedStructure) {
        let (dir, path) = write_model();
        let args = StructureArgs {
            model: path,
            assembly: assembly.map(str::to_string),
            config: None,
            set_values: Vec::new(),
        };
        let (_, prepared) = prepare_structure(&args, &PhaseProgress::hidden()).unwrap();
        (dir, prepared)
    }

    #[test]
    fn report_lists_the_summary_counts() {
        let (_dir, prepared) = prepared(None);
        let report = render_report("demo", &prepared, false);
        assert!(report.starts_with("Structure 'demo'\n"));
        assert!(report.contains("  units               2\n"));
        assert!(report.contains("  elements            4\n"));
        assert!(report.contains("  intra-unit bonds    1\n"));
        assert!(!report.contains("Units\n"));
    }

    #[test]
    fn unit_listing_shows_operators() {
        let (_dir, prepared) = prepared(Some("1"));
        let report = render_report("demo", &prepared, true);
        let units: Vec<&str> = report
            .lines()
            .skip_while(|l| *l != "Units")
            .skip(1)
            .collect();
        assert_eq!(units.len(), 2);
        assert!(units.iter().all(|l| l.contains("atomic") && l.contains(" A ")));
        assert!(units[1].ends_with(" 2"));
    }
}
