//! Immutable model data: column tables, chain/residue/atom segmentation,
//! coarse elements, conformations, assemblies and auxiliary restraint tables.

use thiserror::Error;

pub mod assembly;
pub mod builder;
pub mod column;
pub mod component_bond;
pub mod conformation;
pub mod cross_link;
pub mod entity;
pub mod hierarchy;
pub mod ids;
pub mod model;
pub mod operator;
pub mod segmentation;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModelError {
    #[error("Malformed segmentation: {0}")]
    MalformedSegmentation(String),

    #[error("Element index {index} is out of range for {len} elements")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Invalid value: {0}")]
    InvalidValue(String),
}
