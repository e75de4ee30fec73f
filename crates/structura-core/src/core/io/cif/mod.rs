//! Text mmCIF export of single-model structures.

use crate::engine::error::EngineError;
use thiserror::Error;

pub mod encoder;
pub mod mmcif;

pub use mmcif::{to_cif_string, write_cif};

#[derive(Debug, Error)]
pub enum CifExportError {
    #[error("Cannot export a structure composed of {count} models")]
    UnsupportedMultiModel { count: usize },

    #[error("Cannot export an empty structure")]
    EmptyStructure,

    #[error("Category '{category}' declared {expected} rows but produced {actual}")]
    RowCountMismatch {
        category: String,
        expected: usize,
        actual: usize,
    },

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
