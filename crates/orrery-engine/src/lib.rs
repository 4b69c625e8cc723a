pub mod api;
pub mod bodies;
pub mod core;
pub mod input;
pub mod renderer;
pub mod systems;

// Re-export key types at crate root for convenience
pub use api::config::EngineConfig;
pub use api::sim::{EngineContext, Simulation};
pub use api::types::{BodyId, BodyKind, BodyMeta};
pub use bodies::belt::{sample_belt, BeltDistribution};
pub use bodies::config::{BodyConfig, ConfigError, RingConfig, SystemConfig, VisualConfig};
pub use core::orbit::{orbital_position, orbital_position_into, solve_kepler, OrbitalElements};
pub use core::rng::Rng;
pub use core::scale::{DistanceScaler, ScaleConfig};
pub use core::scene::{Scene, SceneNode, TransformSource};
pub use input::queue::{InputEvent, InputQueue};
pub use renderer::camera::{Camera3D, CameraConfig, Viewport};
pub use renderer::frustum::Frustum;
pub use renderer::instance::{
    GeometryId, InstanceAggregator, InstanceGroup, InstanceMeta, InstanceRaw, MaterialId,
};
pub use systems::labels::{LabelConfig, LabelElement, LabelPlacementEngine};
pub use systems::orbits::OrbitSystem;
pub use systems::spatial_grid::{ScreenRect, SpatialGrid};
pub use systems::trails::{TrailAggregator, TrailConfig, TrailHandle};
