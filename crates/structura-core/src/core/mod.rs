//! # Core Module
//!
//! Stateless building blocks: the immutable [`models::model::Model`] and its
//! tables, spatial grids and boundaries, hashing and element identifiers, and
//! the mmCIF writer plus the model source loader.

pub mod io;
pub mod models;
pub mod spatial;
pub mod utils;
