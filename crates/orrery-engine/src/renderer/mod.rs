pub mod camera;
pub mod frustum;
pub mod instance;

// Re-export key types for convenient access
pub use camera::{Camera3D, CameraConfig, CameraUniform, ScreenPoint, Viewport};
pub use frustum::Frustum;
pub use instance::{
    GeometryId, InstanceAggregator, InstanceGroup, InstanceMeta, InstanceRaw, MaterialId,
};
