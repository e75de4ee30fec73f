use crate::core::models::ModelError;
use crate::core::models::ids::UnitId;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("Chain {chain_index} has no resolvable entity")]
    MissingEntity { chain_index: usize },

    #[error("Assembly '{id}' is not defined by the model")]
    AssemblyNotFound { id: String },

    #[error("Duplicate unit id {id}")]
    DuplicateUnit { id: UnitId },

    #[error("Invalid element set: {0}")]
    InvalidElementSet(String),

    #[error("Internal logic error: {0}")]
    Internal(String),
}
