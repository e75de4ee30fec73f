pub mod carbohydrates;
pub mod cross_links;
pub mod inter_unit_bonds;
pub mod intra_unit_bonds;
pub mod symmetry;
