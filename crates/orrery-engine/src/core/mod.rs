pub mod orbit;
pub mod rng;
pub mod scale;
pub mod scene;
