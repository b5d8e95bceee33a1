pub mod rules;
pub mod tile;
