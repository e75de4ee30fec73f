pub mod boundary;
pub mod grid;
