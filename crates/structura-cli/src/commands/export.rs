use super::prepare_structure;
use crate::cli::ExportArgs;
use crate::error::Result;
use crate::utils::progress::PhaseProgress;
use structura::engine::progress::ProgressReporter;
use structura::workflows::export;
use tracing::info;

pub fn run(args: ExportArgs, progress: PhaseProgress) -> Result<()> {
    let (model, prepared) = prepare_structure(&args.structure, &progress)?;
    let block = args.block.as_deref().unwrap_or(&model.label);

    info!("Writing data block '{}' to {:?}", block, &args.output);
    let reporter = ProgressReporter::with_callback(progress.callback());
    export::run_to_path(&prepared.structure, block, &args.output, &reporter)?;

    println!(
        "Wrote {} units ({} elements) to {}",
        prepared.summary.unit_count,
        prepared.summary.element_count,
        args.output.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::StructureArgs;
    use crate::commands::fixtures::write_model;
    use crate::error::CliError;
    use std::fs;

    fn args(model: std::path::PathBuf, output: std::path::PathBuf, block: Option<&str>) -> ExportArgs {
        ExportArgs {
            structure: StructureArgs {
                model,
                assembly: Some("1".to_string()),
                config: None,
                set_values: Vec::new(),
            },
            output,
            block: block.map(str::to_string),
        }
    }

    #[test]
    fn block_name_defaults_to_the_model_label() {
        let (dir, path) = write_model();
        let output = dir.path().join("out.cif");
        run(args(path, output.clone(), None), PhaseProgress::hidden()).unwrap();
        let text = fs::read_to_string(&output).unwrap();
        assert!(text.starts_with("data_demo\n"));
        assert!(text.contains("loop_\n_atom_site."));
    }

    #[test]
    fn explicit_block_name_is_used() {
        let (dir, path) = write_model();
        let output = dir.path().join("named.cif");
        run(args(path, output.clone(), Some("dimer")), PhaseProgress::hidden()).unwrap();
        assert!(fs::read_to_string(&output).unwrap().starts_with("data_dimer\n"));
    }

    #[test]
    fn missing_model_is_a_source_error() {
        let (dir, _) = write_model();
        let result = run(
            args(dir.path().join("absent.toml"), dir.path().join("out.cif"), None),
            PhaseProgress::hidden(),
        );
        assert!(matches!(result, Err(CliError::Source(_))));
    }
}
