pub mod labels;
pub mod orbits;
pub mod spatial_grid;
pub mod trails;
