pub mod export;
pub mod inspect;

use crate::cli::StructureArgs;
use crate::config::PartialStructureConfig;
use crate::error::Result;
use crate::utils::progress::PhaseProgress;
use std::sync::Arc;
use structura::core::io::source::{load_model, undeclared_entities};
use structura::core::models::model::Model;
use structura::engine::progress::ProgressReporter;
use structura::workflows::prepare::{self, PreparedStructure};
use tracing::{info, warn};

/// Loads the model named by `args` and runs the prepare workflow on it.
pub(crate) fn prepare_structure(
    args: &StructureArgs,
    progress: &PhaseProgress,
) -> Result<(Arc<Model>, PreparedStructure)> {
    let config = PartialStructureConfig::resolve(args)?;

    info!("Loading model from {:?}", &args.model);
    let model = Arc::new(load_model(&args.model)?);
    for entity in undeclared_entities(&model) {
        warn!(entity = %entity, "Entity referenced by atom_site has no [[entity]] entry; its type was inferred.");
    }

    let reporter = ProgressReporter::with_callback(progress.callback());
    let prepared = prepare::run(&model, args.assembly.as_deref(), &config, &reporter)?;
    Ok((model, prepared))
}
