pub mod generator;
pub mod selection;
pub mod walker;
