pub mod geometry;
pub mod hash;
pub mod identifiers;
pub mod saccharides;
