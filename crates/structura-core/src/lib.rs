//! # Structura Core Library
//!
//! Structural representation of macromolecular models: a [`core::models::model::Model`]
//! is partitioned into rigid units, combined into immutable structures with lazily
//! derived properties (spatial lookup, bonds, cross-link restraints, carbohydrates,
//! symmetry groups), and exported as mmCIF.
//!
//! ## Layers
//!
//! - **[`core`]** holds the immutable model tables, spatial grids, hashing and
//!   element identifiers, plus the model loader and the mmCIF writer.
//!
//! - **[`engine`]** builds structures from models. It owns units, the partitioner,
//!   the per-structure caches and the tasks computing derived properties.
//!
//! - **[`workflows`]** is the entry point for applications: prepare a structure
//!   with progress reporting, then export it.

pub mod core;
pub mod engine;
pub mod workflows;
