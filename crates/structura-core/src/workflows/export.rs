use crate::core::io::cif::{CifExportError, to_cif_string};
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::structure::structure::Structure;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{info, instrument};

/// Serializes `structure` as a single mmCIF data block named `block_name`.
#[instrument(skip_all, name = "export_workflow")]
pub fn run(
    structure: &Structure,
    block_name: &str,
    reporter: &ProgressReporter,
) -> Result<String, CifExportError> {
    reporter.report(Progress::PhaseStart { name: "Export" });
    let data = to_cif_string(block_name, structure)?;
    reporter.report(Progress::PhaseFinish);
    Ok(data)
}

/// Like [`run`], writing the result to `path`.
pub fn run_to_path(
    structure: &Structure,
    block_name: &str,
    path: &Path,
    reporter: &ProgressReporter,
) -> Result<(), CifExportError> {
    let data = run(structure, block_name, reporter)?;
    let mut writer = BufWriter::new(File::create(path)?);
    writer.write_all(data.as_bytes())?;
    writer.flush()?;
    info!(path = %path.display(), bytes = data.len(), "mmCIF written.");
    Ok(())
}
