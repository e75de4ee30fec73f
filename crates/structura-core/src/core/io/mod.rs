//! Model input from TOML/CSV sources and mmCIF text output.

pub mod cif;
pub mod source;
