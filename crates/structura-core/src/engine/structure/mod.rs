pub mod element;
pub mod lookup;
mod partition;
pub mod structure;
pub mod unit;
