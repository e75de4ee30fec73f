//! # Workflows Module
//!
//! Top-level entry points tying [`crate::core`] and [`crate::engine`] together.
//!
//! - **Prepare** ([`prepare`]) partitions a model into a structure, optionally
//!   expands an assembly, and eagerly computes every derived property while
//!   reporting progress.
//! - **Export** ([`export`]) serializes a prepared single-model structure as mmCIF.

pub mod export;
pub mod prepare;
